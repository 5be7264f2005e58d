mod achievements;
mod ai;
mod analytics;
mod auth;
mod community;
mod config;
mod db;
mod documents;
mod export;
mod journal;
mod models;
mod notifications;
mod remote;
mod repository;
mod storage;
mod tui;
mod validation;

use achievements::{AchievementBook, UserStats};
use ai::{AiTools, CoverLetterRequest, Difficulty};
use anyhow::{anyhow, Context, Result};
use auth::{Authenticator, Registration, Session};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use community::{CommunityStore, NewPost};
use config::Config;
use db::Database;
use documents::{DocumentStore, DocumentUpdate, NewCoverLetter, NewResume};
use export::DataExport;
use journal::{JournalStore, NewEntry};
use models::{
    split_tags, ApplicationUpdate, CommunityPost, EntryKind, JobApplication, JobStatus,
    JournalEntry, Mood, NewApplication, PostKind, ProfileUpdate, Theme, Tone, UserProfile,
};
use notifications::{NotificationStore, ReadFilter};
use remote::{RemoteStore, RestStore};
use repository::{ApplicationRepository, ProfileRepository};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Job application tracker - log applications, follow progress, and prepare")]
struct Cli {
    /// Use the local demo account instead of a signed-in session
    #[arg(long, global = true)]
    demo: bool,

    /// Show info-level logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the local database
    Init,

    /// Sign in to the hosted backend
    Login {
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Create an account on the hosted backend
    Register {
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        password: String,
    },

    /// Sign out and forget the saved session
    Logout,

    /// Show the current session
    Whoami,

    /// Add a job application
    Add {
        /// Job title
        title: String,

        /// Company name
        company: String,

        #[command(flatten)]
        fields: ApplicationFields,
    },

    /// List applications
    List {
        /// Filter by status (saved, applied, interviewing, rejected, offer, hired)
        #[arg(short, long)]
        status: Option<String>,

        /// Match title or company
        #[arg(short = 'q', long)]
        search: Option<String>,
    },

    /// Show application details
    Show {
        /// Application ID or unique prefix
        id: String,
    },

    /// Change fields of an application
    Update {
        /// Application ID or unique prefix
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[command(flatten)]
        fields: ApplicationFields,
    },

    /// Delete an application
    Delete {
        /// Application ID or unique prefix
        id: String,
    },

    /// Copy an application as a new saved entry
    Duplicate {
        /// Application ID or unique prefix
        id: String,
    },

    /// Show search statistics
    Stats {
        /// Print the raw numbers as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check and list achievements
    Achievements,

    /// Browse applications interactively
    Browse {
        #[arg(short, long)]
        status: Option<String>,

        #[arg(short = 'q', long)]
        search: Option<String>,
    },

    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommands>,
    },

    /// Manage resumes and cover letters
    Documents {
        #[command(subcommand)]
        command: Option<DocumentCommands>,
    },

    /// List notifications
    Notifications {
        /// all, unread or read
        #[arg(short, long, default_value = "all")]
        filter: String,

        /// Mark one notification as read first
        #[arg(long)]
        mark_read: Option<String>,

        /// Mark everything as read first
        #[arg(long)]
        mark_all_read: bool,

        /// Delete one notification first
        #[arg(long)]
        delete: Option<String>,
    },

    /// Keep a career journal
    Journal {
        #[command(subcommand)]
        command: Option<JournalCommands>,
    },

    /// Read and post on the community board
    Community {
        #[command(subcommand)]
        command: Option<CommunityCommands>,
    },

    /// Export your profile, applications and documents as JSON
    Export {
        #[arg(short, long, default_value = export::DEFAULT_FILE_NAME)]
        output: PathBuf,
    },

    /// AI-assisted preparation tools
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Args)]
struct ApplicationFields {
    #[arg(short, long)]
    location: Option<String>,

    /// Minimum salary
    #[arg(long)]
    salary: Option<i64>,

    #[arg(long)]
    salary_max: Option<i64>,

    #[arg(short, long)]
    url: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    #[arg(short, long)]
    status: Option<String>,

    /// YYYY-MM-DD or RFC 3339
    #[arg(long)]
    applied: Option<String>,

    #[arg(long)]
    deadline: Option<String>,

    #[arg(long)]
    follow_up: Option<String>,

    /// Interview date; repeat for several
    #[arg(long)]
    interview: Vec<String>,

    #[arg(short, long)]
    notes: Option<String>,

    /// Comma-separated
    #[arg(short, long)]
    tags: Option<String>,

    #[arg(long)]
    contact: Option<String>,

    #[arg(long)]
    contact_email: Option<String>,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the profile
    Show,

    /// Change profile fields
    Set {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        goals: Option<String>,

        /// Comma-separated
        #[arg(long)]
        industries: Option<String>,

        /// light or dark
        #[arg(long)]
        theme: Option<String>,
    },

    /// Manage skills
    Skills {
        #[command(subcommand)]
        command: SkillCommands,
    },
}

#[derive(Subcommand)]
enum SkillCommands {
    Add { skill: String },
    Remove { skill: String },
}

#[derive(Subcommand)]
enum DocumentCommands {
    /// List resumes, or cover letters with --letters
    List {
        #[arg(long)]
        letters: bool,
    },

    /// Add a resume from a text file
    AddResume {
        name: String,

        #[arg(short, long)]
        file: PathBuf,

        /// Comma-separated
        #[arg(short, long)]
        tags: Option<String>,

        /// Make it the active resume
        #[arg(long)]
        active: bool,
    },

    /// Add a cover letter from a text file
    AddLetter {
        name: String,

        #[arg(short, long)]
        file: PathBuf,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        company: Option<String>,

        /// professional, friendly or bold
        #[arg(long, default_value = "professional")]
        tone: String,

        /// Comma-separated
        #[arg(short, long)]
        tags: Option<String>,

        #[arg(long)]
        template: bool,
    },

    /// Change a resume, or a cover letter with --letter
    Update {
        id: String,

        #[arg(long)]
        letter: bool,

        #[arg(long)]
        name: Option<String>,

        /// New content; a resume gets a new version
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Comma-separated
        #[arg(short, long)]
        tags: Option<String>,

        /// Resumes only
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete a resume, or a cover letter with --letter
    Delete {
        id: String,

        #[arg(long)]
        letter: bool,
    },
}

#[derive(Subcommand)]
enum JournalCommands {
    /// Search entries
    List {
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// reflection, goal, achievement, learning or networking
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Write an entry
    Add {
        title: String,

        #[arg(short, long)]
        content: String,

        #[arg(short, long, default_value = "reflection")]
        kind: String,

        /// excited, confident, neutral, frustrated or motivated
        #[arg(short, long, default_value = "neutral")]
        mood: String,

        /// Comma-separated
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Delete an entry
    Delete { id: String },
}

#[derive(Subcommand)]
enum CommunityCommands {
    /// List posts with per-type counts
    List {
        /// success, question, advice or resource
        #[arg(short, long)]
        kind: Option<String>,

        #[arg(short = 'q', long)]
        search: Option<String>,
    },

    /// Like a post
    Like { id: String },

    /// Write a post
    Post {
        title: String,

        #[arg(short, long)]
        content: String,

        #[arg(short, long, default_value = "question")]
        kind: String,

        /// Comma-separated
        #[arg(short, long)]
        tags: Option<String>,

        /// Hide your name
        #[arg(long)]
        anonymous: bool,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Score a resume against a job description
    Match {
        /// Resume file; defaults to your active resume
        #[arg(short, long)]
        resume: Option<PathBuf>,

        /// Job description file
        #[arg(short, long)]
        job: PathBuf,

        /// Store the score and missing keywords on this application
        #[arg(long)]
        save_to: Option<String>,
    },

    /// Draft a cover letter
    CoverLetter {
        #[arg(long)]
        title: String,

        #[arg(long)]
        company: String,

        #[arg(long)]
        manager: Option<String>,

        /// Extra points to mention
        #[arg(long)]
        points: Option<String>,
    },

    /// Practice interview questions
    Interview {
        #[arg(long, default_value = "frontend-developer")]
        role: String,

        #[arg(long, default_value = "medium")]
        difficulty: String,

        /// Get feedback on an answer
        #[arg(long)]
        answer: Option<String>,
    },

    /// Compare your skills with a target role
    SkillGap {
        #[arg(long)]
        role: String,

        /// Comma-separated; defaults to the skills on your profile
        #[arg(long)]
        skills: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_filter));

    let config = Config::load()?;
    let demo = cli.demo;

    match cli.command {
        Commands::Init => {
            let db = Database::open(&config.db_path)?;
            db.init()?;
            println!("Database initialized at {}", db.path().display());
        }

        Commands::Login { email, password } => {
            let auth = authenticator(&config)?;
            let session = auth.login(&email, &password)?;
            session.save(&config.session_path())?;

            let store = open_store(&config, &session)?;
            let mut profiles = ProfileRepository::new(store.as_ref());
            if profiles.load(session.user_id())?.is_some() {
                let update = ProfileUpdate {
                    last_login: Some(Utc::now()),
                    ..Default::default()
                };
                profiles.update(session.user_id(), &update)?;
            } else {
                let name = email.split('@').next().unwrap_or(&email).to_string();
                profiles.save(&auth::new_profile(session.user_id(), &email, &name, Utc::now()))?;
            }
            println!("Signed in as {}", session.email());
        }

        Commands::Register { email, name, password } => {
            let auth = authenticator(&config)?;
            match auth.register(&email, &password)? {
                Registration::SignedIn(session) => {
                    session.save(&config.session_path())?;
                    let store = open_store(&config, &session)?;
                    ProfileRepository::new(store.as_ref())
                        .save(&auth::new_profile(session.user_id(), &email, &name, Utc::now()))?;
                    println!("Account created. Signed in as {}", email);
                }
                Registration::ConfirmationPending { user_id } => {
                    log::info!("signup for {} awaits confirmation", user_id);
                    println!("Account created. Confirm your email, then run 'jobtrack login {}'.", email);
                }
            }
        }

        Commands::Logout => {
            let path = config.session_path();
            match Session::load(&path)? {
                Some(session) => {
                    if !session.is_demo() {
                        authenticator(&config)?.logout(&session)?;
                    }
                    Session::clear(&path)?;
                    println!("Signed out.");
                }
                None => println!("Not signed in."),
            }
        }

        Commands::Ai { command } => run_ai(&config, demo, command)?,

        command => {
            let session = resolve_session(&config, demo)?;
            let store = open_store(&config, &session)?;
            run_command(command, &session, store.as_ref())?;
        }
    }

    Ok(())
}

fn authenticator(config: &Config) -> Result<Authenticator> {
    match (&config.backend_url, &config.anon_key) {
        (Some(url), Some(key)) => Ok(Authenticator::new(url, key)),
        _ => Err(anyhow!(
            "No backend configured. Set JOBTRACK_BACKEND_URL and JOBTRACK_ANON_KEY, or use --demo."
        )),
    }
}

fn resolve_session(config: &Config, demo: bool) -> Result<Session> {
    if demo || config.demo_mode {
        return Ok(auth::demo_session());
    }
    Session::load(&config.session_path())?.ok_or_else(|| {
        anyhow!("Not signed in. Run 'jobtrack login <email> --password <password>' or pass --demo.")
    })
}

/// Signed-in users talk to the hosted backend; demo users get the local database.
fn open_store(config: &Config, session: &Session) -> Result<Box<dyn RemoteStore>> {
    match session {
        Session::Authenticated { access_token, .. } => match (&config.backend_url, &config.anon_key) {
            (Some(url), Some(key)) => Ok(Box::new(RestStore::new(url, key, access_token))),
            _ => Err(anyhow!(
                "Saved session needs a backend. Set JOBTRACK_BACKEND_URL and JOBTRACK_ANON_KEY, or use --demo."
            )),
        },
        Session::Demo => {
            let db = Database::open(&config.db_path)?;
            db.ensure_initialized()?;
            let mut profiles = ProfileRepository::new(&db);
            if profiles.load(auth::DEMO_USER_ID)?.is_none() {
                profiles.save(&auth::demo_profile(Utc::now()))?;
                log::info!("Seeded demo profile in {}", db.path().display());
            }
            Ok(Box::new(db))
        }
    }
}

fn load_profile(store: &dyn RemoteStore, session: &Session) -> Result<UserProfile> {
    ProfileRepository::new(store)
        .load(session.user_id())?
        .cloned()
        .ok_or_else(|| anyhow!("No profile found for {}", session.email()))
}

fn run_command(command: Commands, session: &Session, store: &dyn RemoteStore) -> Result<()> {
    let user_id = session.user_id();

    match command {
        Commands::Whoami => {
            let mode = if session.is_demo() { "demo" } else { "signed in" };
            println!("{} ({})", session.email(), mode);
            println!("User ID: {}", user_id);
            if let Some(profile) = ProfileRepository::new(store).load(user_id)? {
                println!("Name: {}", profile.name);
            }
        }

        Commands::Add { title, company, fields } => {
            let mut repo = ApplicationRepository::load(store, user_id)?;
            let application = new_application(&title, &company, fields)?;
            let created = repo.create(&application)?;
            println!("Added application {} ({} at {})", short_id(&created.id), created.job_title, created.company);
        }

        Commands::List { status, search } => {
            let repo = ApplicationRepository::load(store, user_id)?;
            let status = status.map(|s| s.parse::<JobStatus>()).transpose()?;
            let apps = repo.filter(search.as_deref(), status);
            if apps.is_empty() {
                println!("No applications found.");
            } else {
                println!("{:<10} {:<13} {:<30} {:<20} {:>18}", "ID", "STATUS", "TITLE", "COMPANY", "SALARY");
                println!("{}", "-".repeat(95));
                for app in apps {
                    println!(
                        "{:<10} {:<13} {:<30} {:<20} {:>18}",
                        short_id(&app.id),
                        app.status,
                        truncate(&app.job_title, 28),
                        truncate(&app.company, 18),
                        format_salary(app.salary, app.salary_max).unwrap_or_else(|| "-".to_string())
                    );
                }
            }
            let counts: Vec<String> = repo
                .status_counts()
                .iter()
                .map(|(status, n)| format!("{} {}", n, status))
                .collect();
            if !counts.is_empty() {
                println!("\n{} total: {}", repo.list().len(), counts.join(", "));
            }
        }

        Commands::Show { id } => {
            let repo = ApplicationRepository::load(store, user_id)?;
            print_application(repo.resolve(&id)?);
        }

        Commands::Update { id, title, company, fields } => {
            let mut repo = ApplicationRepository::load(store, user_id)?;
            let id = repo.resolve(&id)?.id.clone();
            let mut update = application_update(fields)?;
            update.job_title = title;
            update.company = company;
            if update.is_empty() {
                println!("Nothing to update.");
            } else {
                repo.update(&id, &update)?;
                println!("Updated application {}", short_id(&id));
            }
        }

        Commands::Delete { id } => {
            let mut repo = ApplicationRepository::load(store, user_id)?;
            let app = repo.resolve(&id)?;
            let (id, label) = (app.id.clone(), format!("{} at {}", app.job_title, app.company));
            repo.delete(&id)?;
            println!("Deleted application {} ({})", short_id(&id), label);
        }

        Commands::Duplicate { id } => {
            let mut repo = ApplicationRepository::load(store, user_id)?;
            let id = repo.resolve(&id)?.id.clone();
            let copy = repo.duplicate(&id)?;
            println!("Created {} ({})", short_id(&copy.id), copy.job_title);
        }

        Commands::Stats { json } => {
            let repo = ApplicationRepository::load(store, user_id)?;
            let stats = analytics::compute(repo.list(), Utc::now());
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }

        Commands::Achievements => {
            let repo = ApplicationRepository::load(store, user_id)?;
            let mut profiles = ProfileRepository::new(store);
            let profile = load_profile(store, session)?;
            let now = Utc::now();

            let mut book = AchievementBook::from_profile(&profile.achievements, now);
            let stats = UserStats {
                streak_count: profile.streak_count,
            };
            let unlocked = book.evaluate(repo.list(), &stats, &profile.skills, now);

            if !unlocked.is_empty() {
                let mut earned = profile.achievements.clone();
                for id in book.earned_ids() {
                    if !earned.contains(&id) {
                        earned.push(id);
                    }
                }
                let gained: u32 = unlocked.iter().map(|a| a.def.points).sum();
                let update = ProfileUpdate {
                    achievements: Some(earned),
                    total_points: Some(profile.total_points + gained),
                    ..Default::default()
                };
                profiles.update(&profile.id, &update)?;
                for a in &unlocked {
                    println!("Unlocked: {} (+{} points)", a.def.name, a.def.points);
                }
                println!();
            }

            println!("{:<4} {:<18} {:<20} {:<10} {:>6}", "", "ID", "NAME", "CATEGORY", "POINTS");
            println!("{}", "-".repeat(62));
            for entry in book.entries() {
                println!(
                    "{:<4} {:<18} {:<20} {:<10} {:>6}",
                    if entry.is_earned() { "[x]" } else { "[ ]" },
                    entry.id(),
                    truncate(entry.def.name, 18),
                    entry.def.category.as_str(),
                    entry.def.points
                );
            }
            println!(
                "\n{} of {} earned ({}%), {} points",
                book.earned_count(),
                book.entries().len(),
                book.completion_percent(),
                book.total_points()
            );
            for (category, earned, total) in book.by_category() {
                println!("  {:<10} {}/{}", category.as_str(), earned, total);
            }
        }

        Commands::Browse { status, search } => {
            let mut repo = ApplicationRepository::load(store, user_id)?;
            let status = status.map(|s| s.parse::<JobStatus>()).transpose()?;
            tui::run_browse(&mut repo, search, status)?;
        }

        Commands::Profile { command } => {
            let mut profiles = ProfileRepository::new(store);
            let profile = profiles
                .load(user_id)?
                .cloned()
                .ok_or_else(|| anyhow!("No profile found for {}", session.email()))?;
            match command.unwrap_or(ProfileCommands::Show) {
                ProfileCommands::Show => print_profile(&profile),

                ProfileCommands::Set { name, location, goals, industries, theme } => {
                    let update = ProfileUpdate {
                        name,
                        location,
                        career_goals: goals,
                        preferred_industries: industries.as_deref().map(split_tags),
                        theme: theme.as_deref().map(Theme::parse),
                        ..Default::default()
                    };
                    if update == ProfileUpdate::default() {
                        println!("Nothing to update.");
                    } else {
                        profiles.update(&profile.id, &update)?;
                        println!("Profile updated.\n");
                        if let Some(updated) = profiles.current() {
                            print_profile(updated);
                        }
                    }
                }

                ProfileCommands::Skills { command } => {
                    let mut skills = profile.skills.clone();
                    match command {
                        SkillCommands::Add { skill } => {
                            let skill = skill.trim().to_string();
                            if skills.iter().any(|s| s.eq_ignore_ascii_case(&skill)) {
                                println!("'{}' is already listed.", skill);
                                return Ok(());
                            }
                            skills.push(skill);
                        }
                        SkillCommands::Remove { skill } => {
                            let before = skills.len();
                            skills.retain(|s| !s.eq_ignore_ascii_case(skill.trim()));
                            if skills.len() == before {
                                println!("'{}' is not listed.", skill);
                                return Ok(());
                            }
                        }
                    }
                    let update = ProfileUpdate {
                        skills: Some(skills.clone()),
                        ..Default::default()
                    };
                    profiles.update(&profile.id, &update)?;
                    println!("Skills: {}", skills.join(", "));
                }
            }
        }

        Commands::Documents { command } => {
            let mut docs = DocumentStore::with_samples(user_id);
            let letters = match command.unwrap_or(DocumentCommands::List { letters: false }) {
                DocumentCommands::List { letters } => letters,

                DocumentCommands::AddResume { name, file, tags, active } => {
                    let resume = NewResume {
                        name,
                        file_name: file_name(&file),
                        content: read_text(&file)?,
                        tags: tags.as_deref().map(split_tags).unwrap_or_default(),
                        is_active: active,
                    };
                    let added = docs.add_resume(resume);
                    println!("Added resume {} ({})\n", added.id, added.name);
                    false
                }

                DocumentCommands::AddLetter { name, file, title, company, tone, tags, template } => {
                    let letter = NewCoverLetter {
                        name,
                        content: read_text(&file)?,
                        job_title: title,
                        company,
                        tags: tags.as_deref().map(split_tags).unwrap_or_default(),
                        is_template: template,
                        tone: tone.parse::<Tone>()?,
                    };
                    let added = docs.add_cover_letter(letter);
                    println!("Added cover letter {} ({})\n", added.id, added.name);
                    true
                }

                DocumentCommands::Update { id, letter, name, file, tags, active } => {
                    let update = DocumentUpdate {
                        name,
                        content: file.as_deref().map(read_text).transpose()?,
                        tags: tags.as_deref().map(split_tags),
                        is_active: active,
                    };
                    if letter {
                        docs.update_cover_letter(&id, &update)?;
                    } else {
                        docs.update_resume(&id, &update)?;
                    }
                    println!("Updated {}\n", id);
                    letter
                }

                DocumentCommands::Delete { id, letter } => {
                    let removed = if letter {
                        docs.delete_cover_letter(&id)
                    } else {
                        docs.delete_resume(&id)
                    };
                    if !removed {
                        return Err(anyhow!("Document '{}' not found", id));
                    }
                    println!("Deleted {}\n", id);
                    letter
                }
            };

            if letters {
                print_cover_letters(&docs);
            } else {
                print_resumes(&docs);
            }
            println!("\nDocuments are sample data and are not saved between runs.");
        }

        Commands::Notifications { filter, mark_read, mark_all_read, delete } => {
            let filter: ReadFilter = filter.parse()?;
            let mut feed = NotificationStore::with_samples(user_id, Utc::now());
            if let Some(id) = delete {
                if !feed.delete(&id) {
                    return Err(anyhow!("Notification '{}' not found", id));
                }
            }
            if let Some(id) = mark_read {
                if !feed.mark_read(&id) {
                    return Err(anyhow!("Notification '{}' not found", id));
                }
            }
            if mark_all_read {
                feed.mark_all_read();
            }

            let items = feed.list(filter);
            if items.is_empty() {
                println!("No notifications.");
            } else {
                for n in items {
                    println!(
                        "{} [{}] {} - {}",
                        if n.read { " " } else { "*" },
                        n.kind.as_str(),
                        n.title,
                        n.created_at.format("%Y-%m-%d %H:%M")
                    );
                    for line in textwrap::wrap(&n.message, 76) {
                        println!("    {}", line);
                    }
                }
            }
            println!("\n{} unread", feed.unread_count());
        }

        Commands::Journal { command } => {
            let mut journal = JournalStore::with_samples();
            let now = Utc::now();
            let (search, kind) = match command.unwrap_or(JournalCommands::List { search: None, kind: None }) {
                JournalCommands::List { search, kind } => {
                    (search, kind.map(|k| k.parse::<EntryKind>()).transpose()?)
                }
                JournalCommands::Add { title, content, kind, mood, tags } => {
                    let entry = NewEntry {
                        title,
                        content,
                        kind: kind.parse::<EntryKind>()?,
                        mood: mood.parse::<Mood>()?,
                        tags: tags.as_deref().map(split_tags).unwrap_or_default(),
                    };
                    let added = journal.add(entry, now);
                    println!("Added entry {} ({})\n", added.id, added.title);
                    (None, None)
                }
                JournalCommands::Delete { id } => {
                    if !journal.delete(&id) {
                        return Err(anyhow!("Journal entry '{}' not found", id));
                    }
                    println!("Deleted entry {}\n", id);
                    (None, None)
                }
            };

            let stats = journal.stats(now);
            println!(
                "Entries: {}  This week: {}  Goals: {}  Achievements: {}\n",
                stats.total_entries, stats.this_week, stats.goals, stats.achievements
            );
            let entries = journal.search(search.as_deref().unwrap_or(""), kind);
            if entries.is_empty() {
                println!("No journal entries found.");
            }
            for entry in entries {
                print_journal_entry(entry);
            }
        }

        Commands::Community { command } => {
            let mut board = CommunityStore::with_samples();
            let (search, kind) = match command.unwrap_or(CommunityCommands::List { kind: None, search: None }) {
                CommunityCommands::List { kind, search } => {
                    (search, kind.map(|k| k.parse::<PostKind>()).transpose()?)
                }
                CommunityCommands::Like { id } => {
                    let likes = board.like(&id)?;
                    println!("Liked post {} ({} likes)\n", id, likes);
                    (None, None)
                }
                CommunityCommands::Post { title, content, kind, tags, anonymous } => {
                    let profile = load_profile(store, session)?;
                    let post = NewPost {
                        title,
                        content,
                        kind: kind.parse::<PostKind>()?,
                        tags: tags.as_deref().map(split_tags).unwrap_or_default(),
                        is_anonymous: anonymous,
                    };
                    let added = board.add(post, user_id, &profile.name, Utc::now())?;
                    println!("Posted {} ({})\n", added.id, added.title);
                    (None, None)
                }
            };

            let tabs: Vec<String> = board
                .tab_counts()
                .iter()
                .map(|(kind, n)| format!("{} ({})", kind.map_or("All Posts", |k| k.label()), n))
                .collect();
            println!("{}\n", tabs.join("  "));
            let posts = board.search(search.as_deref().unwrap_or(""), kind);
            if posts.is_empty() {
                println!("No posts found.");
            }
            for post in posts {
                print_post(post);
            }
        }

        Commands::Export { output } => {
            let repo = ApplicationRepository::load(store, user_id)?;
            let profile = load_profile(store, session)?;
            let docs = DocumentStore::with_samples(user_id);
            DataExport::new(&profile, repo.list(), &docs, Utc::now()).write_to(&output)?;
            println!(
                "Exported {} applications and {} documents to {}",
                repo.list().len(),
                docs.resumes().len() + docs.cover_letters().len(),
                output.display()
            );
        }

        Commands::Init
        | Commands::Login { .. }
        | Commands::Register { .. }
        | Commands::Logout
        | Commands::Ai { .. } => return Err(anyhow!("This command runs without a session")),
    }

    Ok(())
}

fn run_ai(config: &Config, demo: bool, command: AiCommands) -> Result<()> {
    let tools = AiTools::new(config.ai_delay_scale);

    match command {
        AiCommands::Match { resume, job, save_to } => {
            let job_text = std::fs::read_to_string(&job)
                .with_context(|| format!("Failed to read job description: {}", job.display()))?;

            // The session is only needed for the default resume or to save results.
            let session = if resume.is_none() || save_to.is_some() {
                Some(resolve_session(config, demo)?)
            } else {
                None
            };

            let resume_text = match &resume {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read resume: {}", path.display()))?,
                None => {
                    let user_id = session.as_ref().map_or(auth::DEMO_USER_ID, |s| s.user_id());
                    DocumentStore::with_samples(user_id)
                        .active_resume()
                        .map(|r| r.content.clone())
                        .ok_or_else(|| anyhow!("No active resume. Pass --resume <file>."))?
                }
            };

            println!("Analyzing...");
            let analysis = ai::block_on(tools.match_resume(&resume_text, &job_text))??;

            println!("\nMatch score: {}%", analysis.match_score);
            print_list("Strengths", &analysis.strengths);
            print_list("Improvements", &analysis.improvements);
            println!("\nMissing keywords: {}", analysis.missing_keywords.join(", "));
            print_list("Recommendations", &analysis.recommendations);

            if let (Some(target), Some(session)) = (save_to, &session) {
                let store = open_store(config, session)?;
                let mut repo = ApplicationRepository::load(store.as_ref(), session.user_id())?;
                let id = repo.resolve(&target)?.id.clone();
                let update = ApplicationUpdate {
                    ai_match_score: Some(f64::from(analysis.match_score)),
                    skill_gaps: Some(analysis.missing_keywords.clone()),
                    ..Default::default()
                };
                repo.update(&id, &update)?;
                println!("\nSaved score to application {}", short_id(&id));
            }
        }

        AiCommands::CoverLetter { title, company, manager, points } => {
            let request = CoverLetterRequest {
                job_title: title,
                company,
                hiring_manager: manager,
                key_points: points,
            };
            println!("Generating...\n");
            let letter = ai::block_on(tools.generate_cover_letter(&request))??;
            println!("{}", letter);
        }

        AiCommands::Interview { role, difficulty, answer } => {
            let difficulty: Difficulty = difficulty.parse()?;
            let questions = ai::block_on(tools.interview_questions(&role, difficulty))??;
            println!("{:<4} {:<11} {:<7} {:<16} {}", "#", "TYPE", "LEVEL", "CATEGORY", "QUESTION");
            println!("{}", "-".repeat(90));
            for q in &questions {
                println!(
                    "{:<4} {:<11} {:<7} {:<16} {}",
                    q.id,
                    q.kind.as_str(),
                    q.difficulty.as_str(),
                    truncate(&q.category, 15),
                    q.question
                );
            }
            if let Some(answer) = answer {
                println!("\nFeedback: {}", tools.answer_feedback(&answer)?);
            }
        }

        AiCommands::SkillGap { role, skills } => {
            let skills = match skills {
                Some(skills) => skills,
                None => {
                    let session = resolve_session(config, demo)?;
                    let store = open_store(config, &session)?;
                    load_profile(store.as_ref(), &session)?.skills.join(", ")
                }
            };
            println!("Analyzing...");
            let analysis = ai::block_on(tools.analyze_skill_gap(&role, &skills))??;

            println!("\nSkills to develop:");
            for m in &analysis.missing_skills {
                println!(
                    "  {:<12} {:<7} {}",
                    m.skill,
                    m.priority.as_str(),
                    m.resources.join(", ")
                );
            }
            println!("\nStrengths: {}", analysis.strength_skills.join(", "));
            print_list("Recommendations", &analysis.recommendations);
            println!("\nLearning path:");
            for week in &analysis.learning_path {
                println!("  Week {}: {} ({} resources)", week.week, week.focus, week.resources);
            }
        }
    }

    Ok(())
}

fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", value))?;
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

fn parse_opt_date(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_date).transpose()
}

fn new_application(title: &str, company: &str, fields: ApplicationFields) -> Result<NewApplication> {
    let mut app = NewApplication::new(title, company, fields.location.as_deref().unwrap_or(""));
    app.salary = fields.salary;
    app.salary_max = fields.salary_max;
    app.job_url = fields.url;
    app.description = fields.description;
    if let Some(status) = fields.status {
        app.status = status.parse()?;
    }
    app.applied_date = parse_opt_date(fields.applied)?;
    app.deadline_date = parse_opt_date(fields.deadline)?;
    app.follow_up_date = parse_opt_date(fields.follow_up)?;
    app.interview_dates = fields
        .interview
        .iter()
        .map(|d| parse_date(d))
        .collect::<Result<_>>()?;
    app.notes = fields.notes.unwrap_or_default();
    app.tags = fields.tags.as_deref().map(split_tags).unwrap_or_default();
    app.contact_person = fields.contact;
    app.contact_email = fields.contact_email;
    Ok(app)
}

fn application_update(fields: ApplicationFields) -> Result<ApplicationUpdate> {
    let interview_dates = if fields.interview.is_empty() {
        None
    } else {
        Some(
            fields
                .interview
                .iter()
                .map(|d| parse_date(d))
                .collect::<Result<Vec<_>>>()?,
        )
    };
    Ok(ApplicationUpdate {
        location: fields.location,
        salary: fields.salary,
        salary_max: fields.salary_max,
        job_url: fields.url,
        description: fields.description,
        status: fields.status.map(|s| s.parse()).transpose()?,
        applied_date: parse_opt_date(fields.applied)?,
        deadline_date: parse_opt_date(fields.deadline)?,
        follow_up_date: parse_opt_date(fields.follow_up)?,
        interview_dates,
        notes: fields.notes,
        tags: fields.tags.as_deref().map(split_tags),
        contact_person: fields.contact,
        contact_email: fields.contact_email,
        ..Default::default()
    })
}

fn print_application(app: &JobApplication) {
    println!("Application {}", app.id);
    println!("Title: {}", app.job_title);
    println!("Company: {}", app.company);
    if !app.location.is_empty() {
        println!("Location: {}", app.location);
    }
    println!("Status: {}", app.status);
    if let Some(pay) = format_salary(app.salary, app.salary_max) {
        println!("Salary: {}", pay);
    }
    if let Some(url) = &app.job_url {
        println!("URL: {}", url);
    }
    for (label, date) in [
        ("Applied", app.applied_date),
        ("Deadline", app.deadline_date),
        ("Follow up", app.follow_up_date),
    ] {
        if let Some(date) = date {
            println!("{}: {}", label, date.format("%Y-%m-%d"));
        }
    }
    for date in &app.interview_dates {
        println!("Interview: {}", date.format("%Y-%m-%d %H:%M"));
    }
    if let Some(person) = &app.contact_person {
        println!("Contact: {}", person);
    }
    if let Some(email) = &app.contact_email {
        println!("Contact email: {}", email);
    }
    if !app.tags.is_empty() {
        println!("Tags: {}", app.tags.join(", "));
    }
    if let Some(score) = app.ai_match_score {
        println!("Match score: {:.0}", score);
    }
    if !app.skill_gaps.is_empty() {
        println!("Skill gaps: {}", app.skill_gaps.join(", "));
    }
    println!("Created: {}", app.created_at.format("%Y-%m-%d %H:%M"));
    println!("Updated: {}", app.updated_at.format("%Y-%m-%d %H:%M"));
    if !app.notes.is_empty() {
        println!("\n--- Notes ---\n{}", textwrap::fill(&app.notes, 80));
    }
    if let Some(description) = &app.description {
        println!("\n--- Description ---\n{}", description);
    }
}

fn print_stats(stats: &analytics::Analytics) {
    println!("Total applications:  {}", stats.total_applications);
    println!("This month:          {}", stats.applications_this_month);
    println!("Interview rate:      {:.1}%", stats.interview_rate);
    println!("Offer rate:          {:.1}%", stats.offer_rate);
    println!("Avg response time:   {} days", stats.avg_response_time);

    if !stats.top_companies.is_empty() {
        println!("\nTop companies:");
        for c in &stats.top_companies {
            println!("  {:<24} {:>4}", truncate(&c.name, 22), c.count);
        }
    }

    if !stats.status_distribution.is_empty() {
        println!("\nBy status:");
        for s in &stats.status_distribution {
            println!("  {:<24} {:>4}", s.status.as_str(), s.count);
        }
    }

    println!("\n{:<10} {:>6} {:>11} {:>7}", "MONTH", "APPS", "INTERVIEWS", "OFFERS");
    println!("{}", "-".repeat(37));
    for m in &stats.monthly_trend {
        println!(
            "{:<10} {:>6} {:>11} {:>7}",
            format!("{} {}", m.month, m.year),
            m.applications,
            m.interviews,
            m.offers
        );
    }

    if !stats.salary_trends.is_empty() {
        println!("\nSalary ranges:");
        for r in &stats.salary_trends {
            println!("  {:<12} {:>4}", r.range, r.count);
        }
    }
}

fn print_profile(profile: &UserProfile) {
    println!("{} <{}>", profile.name, profile.email);
    println!("Role: {}", profile.role.as_str());
    if let Some(location) = &profile.location {
        println!("Location: {}", location);
    }
    if let Some(goals) = &profile.career_goals {
        println!("Career goals: {}", goals);
    }
    if !profile.preferred_industries.is_empty() {
        println!("Industries: {}", profile.preferred_industries.join(", "));
    }
    if !profile.skills.is_empty() {
        println!("Skills: {}", profile.skills.join(", "));
    }
    println!("Theme: {}", profile.theme.as_str());
    println!("Streak: {} days", profile.streak_count);
    println!("Points: {}", profile.total_points);
    println!("Member since: {}", profile.created_at.format("%Y-%m-%d"));
    println!("Last login: {}", profile.last_login.format("%Y-%m-%d %H:%M"));
}

fn print_resumes(docs: &DocumentStore) {
    println!("{:<10} {:<30} {:<8} {:<7} {:<8} {:<10}", "ID", "NAME", "VERSION", "ACTIVE", "SCORE", "UPDATED");
    println!("{}", "-".repeat(78));
    for resume in docs.resumes() {
        println!(
            "{:<10} {:<30} {:<8} {:<7} {:<8} {:<10}",
            resume.id,
            truncate(&resume.name, 28),
            format!("v{}", resume.version),
            if resume.is_active { "*" } else { "" },
            resume.ai_score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            resume.updated_at.format("%Y-%m-%d")
        );
    }
}

fn print_cover_letters(docs: &DocumentStore) {
    println!("{:<10} {:<30} {:<14} {:<10} {:<10}", "ID", "NAME", "TONE", "TEMPLATE", "UPDATED");
    println!("{}", "-".repeat(78));
    for letter in docs.cover_letters() {
        println!(
            "{:<10} {:<30} {:<14} {:<10} {:<10}",
            letter.id,
            truncate(&letter.name, 28),
            letter.tone.as_str(),
            if letter.is_template { "yes" } else { "no" },
            letter.updated_at.format("%Y-%m-%d")
        );
    }
}

fn print_journal_entry(entry: &JournalEntry) {
    println!(
        "[{}] {}  {} ({}, {})",
        entry.id,
        entry.created_at.format("%Y-%m-%d"),
        entry.title,
        entry.kind.as_str(),
        entry.mood.as_str()
    );
    for line in textwrap::wrap(&entry.content, 76) {
        println!("    {}", line);
    }
    if !entry.tags.is_empty() {
        println!("    #{}", entry.tags.join(" #"));
    }
    println!();
}

fn print_post(post: &CommunityPost) {
    println!(
        "[{}] {}  {} ({}, by {})",
        post.id,
        post.created_at.format("%Y-%m-%d"),
        post.title,
        post.kind.as_str(),
        post.user_name
    );
    for line in textwrap::wrap(&post.content, 76) {
        println!("    {}", line);
    }
    if !post.tags.is_empty() {
        println!("    #{}", post.tags.join(" #"));
    }
    println!("    {} likes, {} replies\n", post.likes, post.replies);
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_list(heading: &str, items: &[String]) {
    println!("\n{}:", heading);
    for item in items {
        println!("  - {}", item);
    }
}

fn format_salary(min: Option<i64>, max: Option<i64>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) => Some(format!("${} - ${}", min, max)),
        (Some(min), None) => Some(format!("${}+", min)),
        (None, Some(max)) => Some(format!("up to ${}", max)),
        (None, None) => None,
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Senior Platform Engineer", 10), "Senior ...");
        assert_eq!(truncate("Ingénieur logiciel", 8), "Ingén...");
    }

    #[test]
    fn test_parse_date_formats() {
        let day = parse_date("2024-03-05").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
        let ts = parse_date("2024-03-05T10:30:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap());
        assert!(parse_date("05/03/2024").is_err());
    }

    #[test]
    fn test_format_salary() {
        assert_eq!(format_salary(Some(90000), Some(120000)).unwrap(), "$90000 - $120000");
        assert_eq!(format_salary(None, Some(80000)).unwrap(), "up to $80000");
        assert_eq!(format_salary(None, None), None);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0b7c1d2e-aaaa-bbbb"), "0b7c1d2e");
        assert_eq!(short_id("1"), "1");
    }

    #[test]
    fn test_cli_parses_add_fields() {
        let cli = Cli::try_parse_from([
            "jobtrack", "--demo", "add", "Rust Engineer", "Acme", "--salary", "90000",
            "--tags", "rust, remote", "--interview", "2024-05-01", "--interview", "2024-05-08",
        ])
        .unwrap();
        assert!(cli.demo);
        let Commands::Add { title, company, fields } = cli.command else {
            panic!("expected add");
        };
        let app = new_application(&title, &company, fields).unwrap();
        assert_eq!(app.salary, Some(90000));
        assert_eq!(app.tags, vec!["rust", "remote"]);
        assert_eq!(app.interview_dates.len(), 2);
        assert_eq!(app.status, JobStatus::Saved);
    }

    #[test]
    fn test_update_fields_only_set_what_was_given() {
        let cli = Cli::try_parse_from(["jobtrack", "update", "abc", "--status", "offer"]).unwrap();
        let Commands::Update { fields, title, .. } = cli.command else {
            panic!("expected update");
        };
        assert!(title.is_none());
        let update = application_update(fields).unwrap();
        assert_eq!(
            update,
            ApplicationUpdate {
                status: Some(JobStatus::Offer),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_bad_status_is_rejected() {
        let cli = Cli::try_parse_from(["jobtrack", "add", "T", "C", "--status", "ghosted"]).unwrap();
        let Commands::Add { title, company, fields } = cli.command else {
            panic!("expected add");
        };
        assert!(new_application(&title, &company, fields).is_err());
    }

    #[test]
    fn test_cli_parses_local_store_commands() {
        let cli = Cli::try_parse_from([
            "jobtrack", "journal", "add", "Offer!", "--content", "Signed today", "--kind",
            "achievement", "--mood", "excited",
        ])
        .unwrap();
        let Commands::Journal { command: Some(JournalCommands::Add { kind, mood, .. }) } = cli.command
        else {
            panic!("expected journal add");
        };
        assert_eq!(kind.parse::<EntryKind>().unwrap(), EntryKind::Achievement);
        assert_eq!(mood.parse::<Mood>().unwrap(), Mood::Excited);

        let cli = Cli::try_parse_from(["jobtrack", "documents", "update", "1", "--active", "false"])
            .unwrap();
        let Commands::Documents { command: Some(DocumentCommands::Update { active, letter, .. }) } =
            cli.command
        else {
            panic!("expected documents update");
        };
        assert_eq!(active, Some(false));
        assert!(!letter);

        let cli = Cli::try_parse_from(["jobtrack", "community", "post", "Hi", "-c", "Hello", "--anonymous"])
            .unwrap();
        let Commands::Community { command: Some(CommunityCommands::Post { kind, anonymous, .. }) } =
            cli.command
        else {
            panic!("expected community post");
        };
        assert_eq!(kind, "question");
        assert!(anonymous);

        let cli = Cli::try_parse_from(["jobtrack", "notifications", "--delete", "3"]).unwrap();
        let Commands::Notifications { delete, filter, .. } = cli.command else {
            panic!("expected notifications");
        };
        assert_eq!(delete.as_deref(), Some("3"));
        assert_eq!(filter, "all");
    }

    #[test]
    fn test_export_defaults_to_named_file() {
        let cli = Cli::try_parse_from(["jobtrack", "export"]).unwrap();
        let Commands::Export { output } = cli.command else {
            panic!("expected export");
        };
        assert_eq!(output, PathBuf::from("job-tracker-data-export.json"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("/tmp/cv/resume_v4.txt")), "resume_v4.txt");
    }

    #[test]
    fn test_demo_store_seeds_profile() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::resolve(
            config::FileConfig::default(),
            |_| None,
            dir.path().to_path_buf(),
        )
        .unwrap();
        Database::open(&config.db_path).unwrap().init().unwrap();

        let session = resolve_session(&config, true).unwrap();
        let store = open_store(&config, &session).unwrap();
        let profile = load_profile(store.as_ref(), &session).unwrap();
        assert_eq!(profile.email, auth::DEMO_EMAIL);
        assert_eq!(profile.streak_count, 5);
    }

    #[test]
    fn test_signed_out_without_demo_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::resolve(
            config::FileConfig::default(),
            |_| None,
            dir.path().to_path_buf(),
        )
        .unwrap();
        assert!(resolve_session(&config, false).is_err());
    }
}
