use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::analytics::{self, Analytics};
use crate::models::{ApplicationUpdate, JobApplication, JobStatus};
use crate::repository::ApplicationRepository;

struct AppState {
    /// Ids shown in the list, in repository order.
    ids: Vec<String>,
    search: Option<String>,
    status: Option<JobStatus>,
    selected: usize,
    scroll_offset: u16,
    analytics: Analytics,
    message: Option<String>,
}

impl AppState {
    fn new(repo: &ApplicationRepository, search: Option<String>, status: Option<JobStatus>) -> Self {
        let mut state = Self {
            ids: Vec::new(),
            search,
            status,
            selected: 0,
            scroll_offset: 0,
            analytics: analytics::compute(repo.list(), Utc::now()),
            message: None,
        };
        state.reload(repo);
        state
    }

    /// Re-reads the visible ids and summary after the cache changes.
    fn reload(&mut self, repo: &ApplicationRepository) {
        self.ids = repo
            .filter(self.search.as_deref(), self.status)
            .into_iter()
            .map(|app| app.id.clone())
            .collect();
        self.analytics = analytics::compute(repo.list(), Utc::now());
        if self.selected >= self.ids.len() {
            self.selected = self.ids.len().saturating_sub(1);
        }
    }

    fn current_id(&self) -> Option<&str> {
        self.ids.get(self.selected).map(String::as_str)
    }

    fn next(&mut self) {
        if !self.ids.is_empty() && self.selected < self.ids.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

fn status_for_key(code: KeyCode) -> Option<JobStatus> {
    match code {
        KeyCode::Char('s') => Some(JobStatus::Saved),
        KeyCode::Char('a') => Some(JobStatus::Applied),
        KeyCode::Char('i') => Some(JobStatus::Interviewing),
        KeyCode::Char('x') => Some(JobStatus::Rejected),
        KeyCode::Char('o') => Some(JobStatus::Offer),
        KeyCode::Char('h') => Some(JobStatus::Hired),
        _ => None,
    }
}

fn status_style(status: JobStatus) -> Style {
    match status {
        JobStatus::Saved => Style::default().fg(Color::Gray),
        JobStatus::Applied => Style::default().fg(Color::Cyan),
        JobStatus::Interviewing => Style::default().fg(Color::Yellow),
        JobStatus::Rejected => Style::default().fg(Color::Red),
        JobStatus::Offer => Style::default().fg(Color::Green),
        JobStatus::Hired => Style::default().fg(Color::Magenta),
    }
}

pub fn run_browse(
    repo: &mut ApplicationRepository,
    search: Option<String>,
    status: Option<JobStatus>,
) -> Result<()> {
    let mut state = AppState::new(repo, search, status);
    if state.ids.is_empty() {
        println!("No applications found.");
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, repo);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    repo: &mut ApplicationRepository,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, repo, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                code => {
                    if let (Some(status), Some(id)) = (status_for_key(code), state.current_id()) {
                        let id = id.to_string();
                        let update = ApplicationUpdate {
                            status: Some(status),
                            ..Default::default()
                        };
                        state.message = Some(match repo.update(&id, &update) {
                            Ok(()) => format!("Marked as {}", status),
                            Err(e) => format!("Update failed: {:#}", e),
                        });
                        state.reload(repo);
                    }
                }
            }
            list_state.select(Some(state.selected));
        }
    }
    Ok(())
}

fn draw(
    frame: &mut Frame,
    state: &AppState,
    repo: &ApplicationRepository,
    list_state: &mut ListState,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Header: summary numbers
    let a = &state.analytics;
    let summary = format!(
        " Total {}  |  This month {}  |  Interview rate {:.0}%  |  Offer rate {:.0}%  |  Avg response {}d",
        a.total_applications,
        a.applications_this_month,
        a.interview_rate,
        a.offer_rate,
        a.avg_response_time
    );
    let header = Paragraph::new(summary)
        .block(Block::default().borders(Borders::ALL).title(" Job Tracker "));
    frame.render_widget(header, rows[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    // Left panel: application list
    let items: Vec<ListItem> = state
        .ids
        .iter()
        .filter_map(|id| repo.get(id))
        .map(|app| {
            let line = Line::from(vec![
                Span::styled(format!("{:<13}", app.status.as_str()), status_style(app.status)),
                Span::raw(format!("{} | {}", crate::truncate(&app.job_title, 30), app.company)),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Applications ({}) ", state.ids.len())),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: application detail
    let detail = match state.current_id().and_then(|id| repo.get(id)) {
        Some(app) => build_detail(app),
        None => Text::raw("No application selected"),
    };
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Footer: last action or help
    let footer = match &state.message {
        Some(message) => Paragraph::new(format!(" {}", message)).style(Style::default().fg(Color::Yellow)),
        None => Paragraph::new(
            " j/k:navigate  J/K:scroll  s:saved a:applied i:interviewing x:rejected o:offer h:hired  q:quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, rows[2]);
}

fn build_detail(app: &JobApplication) -> Text<'_> {
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &app.job_title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {} ({})", app.company, app.location)));
    lines.push(Line::from(Span::styled(
        format!("Status: {}", app.status),
        status_style(app.status),
    )));

    if let Some(pay) = crate::format_salary(app.salary, app.salary_max) {
        lines.push(Line::from(format!("Salary: {}", pay)));
    }
    if let Some(url) = &app.job_url {
        lines.push(Line::from(format!("URL: {}", url)));
    }
    if let Some(date) = app.applied_date {
        lines.push(Line::from(format!("Applied: {}", date.format("%Y-%m-%d"))));
    }
    if let Some(date) = app.deadline_date {
        lines.push(Line::from(format!("Deadline: {}", date.format("%Y-%m-%d"))));
    }
    if let Some(date) = app.follow_up_date {
        lines.push(Line::from(format!("Follow up: {}", date.format("%Y-%m-%d"))));
    }
    match (&app.contact_person, &app.contact_email) {
        (Some(person), Some(email)) => lines.push(Line::from(format!("Contact: {} <{}>", person, email))),
        (Some(person), None) => lines.push(Line::from(format!("Contact: {}", person))),
        (None, Some(email)) => lines.push(Line::from(format!("Contact: {}", email))),
        (None, None) => {}
    }
    if let Some(score) = app.ai_match_score {
        lines.push(Line::from(format!("Match score: {:.0}", score)));
    }
    if !app.tags.is_empty() {
        lines.push(Line::from(format!("Tags: {}", app.tags.join(", "))));
    }
    if !app.interview_dates.is_empty() {
        let dates: Vec<String> = app
            .interview_dates
            .iter()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .collect();
        lines.push(Line::from(format!("Interviews: {}", dates.join(", "))));
    }
    if !app.skill_gaps.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Skill gaps: {}", app.skill_gaps.join(", ")),
            Style::default().fg(Color::Red),
        )));
    }

    lines.push(Line::from(""));

    if !app.notes.is_empty() {
        lines.push(Line::from(Span::styled(
            "NOTES",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in textwrap::fill(&app.notes, 70).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
        lines.push(Line::from(""));
    }

    match &app.description {
        Some(description) => {
            lines.push(Line::from(Span::styled(
                "Description",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for line in description.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "(No description)",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::NewApplication;

    fn seeded(db: &Database) -> ApplicationRepository<'_> {
        let mut repo = ApplicationRepository::load(db, "u1").unwrap();
        repo.create(&NewApplication::new("Rust Engineer", "Acme", "Remote")).unwrap();
        let mut other = NewApplication::new("Data Analyst", "Globex", "Berlin");
        other.status = JobStatus::Applied;
        repo.create(&other).unwrap();
        repo
    }

    #[test]
    fn test_state_filters_and_clamps_selection() {
        let db = Database::in_memory().unwrap();
        let repo = seeded(&db);
        let mut state = AppState::new(&repo, None, None);
        assert_eq!(state.ids.len(), 2);
        assert_eq!(state.analytics.total_applications, 2);

        state.next();
        state.next();
        assert_eq!(state.selected, 1);

        state.status = Some(JobStatus::Applied);
        state.reload(&repo);
        assert_eq!(state.ids.len(), 1);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_status_keys() {
        assert_eq!(status_for_key(KeyCode::Char('o')), Some(JobStatus::Offer));
        assert_eq!(status_for_key(KeyCode::Char('q')), None);
    }

    #[test]
    fn test_detail_lists_key_fields() {
        let db = Database::in_memory().unwrap();
        let repo = seeded(&db);
        let app = &repo.list()[0];
        let text = build_detail(app);
        let rendered: Vec<String> = text.lines.iter().map(|l| l.to_string()).collect();
        assert!(rendered.iter().any(|l| l.starts_with("Status:")));
        assert!(rendered.iter().any(|l| l == "(No description)"));
    }
}
