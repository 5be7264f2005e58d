use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::models::{JobApplication, JobStatus};

/// Days. Not derived from data.
pub const AVG_RESPONSE_TIME_DAYS: u32 = 7;
pub const TOP_COMPANIES: usize = 5;
pub const TREND_MONTHS: u32 = 6;

const SALARY_BUCKETS: [(&str, i64, i64); 5] = [
    ("<50k", i64::MIN, 50_000),
    ("50k-75k", 50_000, 75_000),
    ("75k-100k", 75_000, 100_000),
    ("100k-150k", 100_000, 150_000),
    ("150k+", 150_000, i64::MAX),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: JobStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthPoint {
    /// Short month name, e.g. "Jan".
    pub month: String,
    pub year: i32,
    pub month_number: u32,
    pub applications: usize,
    pub interviews: usize,
    pub offers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRange {
    pub range: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_applications: usize,
    pub applications_this_month: usize,
    pub interview_rate: f64,
    pub offer_rate: f64,
    pub avg_response_time: u32,
    pub top_companies: Vec<CompanyCount>,
    pub status_distribution: Vec<StatusCount>,
    pub monthly_trend: Vec<MonthPoint>,
    pub salary_trends: Vec<SalaryRange>,
}

/// Half-open `[start, end)` bounds of the calendar month `offset` months from `now`.
fn month_bounds(now: DateTime<Utc>, offset: i32) -> (DateTime<Utc>, DateTime<Utc>) {
    let index = now.year() * 12 + now.month0() as i32 + offset;
    let start = first_of_month(index);
    let end = first_of_month(index + 1);
    (start, end)
}

fn first_of_month(index: i32) -> DateTime<Utc> {
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let date = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN);
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn in_range(ts: &DateTime<Utc>, (start, end): (DateTime<Utc>, DateTime<Utc>)) -> bool {
    *ts >= start && *ts < end
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Groups by key keeping first-seen order.
fn count_by<K: PartialEq, I: IntoIterator<Item = K>>(keys: I) -> Vec<(K, usize)> {
    let mut counts: Vec<(K, usize)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts
}

/// Folds the applications into a snapshot. Pure in `applications` and `now`;
/// calendar months are UTC months.
pub fn compute(applications: &[JobApplication], now: DateTime<Utc>) -> Analytics {
    let total = applications.len();
    let this_month = month_bounds(now, 0);

    let applications_this_month = applications
        .iter()
        .filter(|app| in_range(&app.created_at, this_month))
        .count();

    let interviewed = applications
        .iter()
        .filter(|app| app.status.is_interview_stage())
        .count();
    let offered = applications
        .iter()
        .filter(|app| app.status.is_offer_stage())
        .count();

    let mut companies = count_by(applications.iter().map(|app| app.company.as_str()));
    // Stable: equal counts keep first-seen order.
    companies.sort_by(|a, b| b.1.cmp(&a.1));
    let top_companies = companies
        .into_iter()
        .take(TOP_COMPANIES)
        .map(|(name, count)| CompanyCount {
            name: name.to_string(),
            count,
        })
        .collect();

    let status_distribution = count_by(applications.iter().map(|app| app.status))
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();

    let monthly_trend = (0..TREND_MONTHS as i32)
        .rev()
        .map(|i| {
            let bounds = month_bounds(now, -i);
            let in_month: Vec<&JobApplication> = applications
                .iter()
                .filter(|app| in_range(&app.created_at, bounds))
                .collect();
            MonthPoint {
                month: bounds.0.format("%b").to_string(),
                year: bounds.0.year(),
                month_number: bounds.0.month(),
                applications: in_month.len(),
                interviews: in_month.iter().filter(|a| a.status.is_interview_stage()).count(),
                offers: in_month.iter().filter(|a| a.status.is_offer_stage()).count(),
            }
        })
        .collect();

    Analytics {
        total_applications: total,
        applications_this_month,
        interview_rate: percentage(interviewed, total),
        offer_rate: percentage(offered, total),
        avg_response_time: AVG_RESPONSE_TIME_DAYS,
        top_companies,
        status_distribution,
        monthly_trend,
        salary_trends: salary_trends(applications),
    }
}

fn salary_trends(applications: &[JobApplication]) -> Vec<SalaryRange> {
    SALARY_BUCKETS
        .iter()
        .map(|(label, low, high)| SalaryRange {
            range: label.to_string(),
            count: applications
                .iter()
                .filter_map(|app| app.salary)
                .filter(|s| s >= low && s < high)
                .count(),
        })
        .filter(|bucket| bucket.count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewApplication;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn app(company: &str, status: JobStatus, created_at: DateTime<Utc>) -> JobApplication {
        let new = NewApplication::new("Engineer", company, "Remote");
        JobApplication {
            id: format!("{}-{}", company, created_at.timestamp()),
            user_id: "u".to_string(),
            job_title: new.job_title,
            company: new.company,
            location: new.location,
            salary: None,
            salary_max: None,
            job_url: None,
            description: None,
            status,
            applied_date: None,
            deadline_date: None,
            notes: String::new(),
            tags: Vec::new(),
            resume_id: None,
            cover_letter_id: None,
            contact_person: None,
            contact_email: None,
            follow_up_date: None,
            interview_dates: Vec::new(),
            ai_match_score: None,
            skill_gaps: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_empty_collection() {
        let analytics = compute(&[], at(2024, 3, 15));
        assert_eq!(analytics.total_applications, 0);
        assert_eq!(analytics.applications_this_month, 0);
        assert_eq!(analytics.interview_rate, 0.0);
        assert_eq!(analytics.offer_rate, 0.0);
        assert_eq!(analytics.avg_response_time, 7);
        assert!(analytics.top_companies.is_empty());
        assert!(analytics.status_distribution.is_empty());
        assert_eq!(analytics.monthly_trend.len(), 6);
        assert!(analytics
            .monthly_trend
            .iter()
            .all(|p| p.applications == 0 && p.interviews == 0 && p.offers == 0));
    }

    #[test]
    fn test_single_hired_application() {
        let now = at(2024, 3, 15);
        let analytics = compute(&[app("Acme", JobStatus::Hired, now)], now);
        assert_eq!(analytics.interview_rate, 100.0);
        assert_eq!(analytics.offer_rate, 100.0);
        assert_eq!(analytics.applications_this_month, 1);
        let last = analytics.monthly_trend.last().unwrap();
        assert_eq!((last.applications, last.interviews, last.offers), (1, 1, 1));
    }

    #[test]
    fn test_rates_stay_in_bounds() {
        let now = at(2024, 3, 15);
        let apps = vec![
            app("Acme", JobStatus::Applied, now),
            app("Acme", JobStatus::Interviewing, now),
            app("Globex", JobStatus::Offer, now),
            app("Initech", JobStatus::Rejected, now),
        ];
        let analytics = compute(&apps, now);
        assert_eq!(analytics.interview_rate, 50.0);
        assert_eq!(analytics.offer_rate, 25.0);
        for rate in [analytics.interview_rate, analytics.offer_rate] {
            assert!((0.0..=100.0).contains(&rate));
        }
    }

    #[test]
    fn test_trend_covers_six_months_oldest_first() {
        let now = at(2024, 2, 10);
        let apps = vec![
            app("Acme", JobStatus::Applied, at(2023, 9, 1)),
            app("Acme", JobStatus::Offer, at(2023, 12, 31)),
            app("Acme", JobStatus::Interviewing, at(2024, 2, 1)),
            // Before the window.
            app("Acme", JobStatus::Applied, at(2023, 8, 31)),
        ];
        let trend = compute(&apps, now).monthly_trend;

        let labels: Vec<&str> = trend.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(labels, vec!["Sep", "Oct", "Nov", "Dec", "Jan", "Feb"]);
        assert_eq!(trend[0].year, 2023);
        assert_eq!(trend[5].year, 2024);
        for pair in trend.windows(2) {
            assert!((pair[0].year, pair[0].month_number) < (pair[1].year, pair[1].month_number));
        }
        assert_eq!(trend[0].applications, 1);
        assert_eq!(trend[3].offers, 1);
        assert_eq!(trend[5].interviews, 1);
        assert_eq!(trend.iter().map(|p| p.applications).sum::<usize>(), 3);
    }

    #[test]
    fn test_month_boundaries() {
        let now = at(2024, 3, 15);
        let first_instant = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let last_instant = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let next_month = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let apps = vec![
            app("A", JobStatus::Saved, first_instant),
            app("B", JobStatus::Saved, last_instant),
            app("C", JobStatus::Saved, next_month),
        ];
        assert_eq!(compute(&apps, now).applications_this_month, 2);
    }

    #[test]
    fn test_top_companies_sorted_and_capped() {
        let now = at(2024, 3, 15);
        let mut apps = Vec::new();
        for (company, n) in [("A", 1), ("B", 3), ("C", 2), ("D", 2), ("E", 1), ("F", 4), ("G", 1)] {
            for _ in 0..n {
                apps.push(app(company, JobStatus::Applied, now));
            }
        }
        let top = compute(&apps, now).top_companies;
        assert_eq!(top.len(), 5);
        let names: Vec<&str> = top.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["F", "B", "C", "D", "A"]);
        for pair in top.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
    }

    #[test]
    fn test_status_distribution_omits_missing() {
        let now = at(2024, 3, 15);
        let apps = vec![
            app("A", JobStatus::Rejected, now),
            app("B", JobStatus::Applied, now),
            app("C", JobStatus::Rejected, now),
        ];
        let dist = compute(&apps, now).status_distribution;
        assert_eq!(
            dist,
            vec![
                StatusCount { status: JobStatus::Rejected, count: 2 },
                StatusCount { status: JobStatus::Applied, count: 1 },
            ]
        );
    }

    #[test]
    fn test_salary_buckets() {
        let now = at(2024, 3, 15);
        let mut low = app("A", JobStatus::Applied, now);
        low.salary = Some(45_000);
        let mut mid = app("B", JobStatus::Applied, now);
        mid.salary = Some(100_000);
        let mut also_mid = app("C", JobStatus::Applied, now);
        also_mid.salary = Some(149_999);
        let none = app("D", JobStatus::Applied, now);

        let trends = compute(&[low, mid, also_mid, none], now).salary_trends;
        assert_eq!(
            trends,
            vec![
                SalaryRange { range: "<50k".to_string(), count: 1 },
                SalaryRange { range: "100k-150k".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_january_wraps_to_previous_year() {
        let (start, end) = month_bounds(at(2024, 1, 20), -1);
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }
}
