use std::path::PathBuf;
use std::rc::Rc;
use std::slice;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use resilience_config::{ResilienceConfig, clear_session, persist_session};
use resilience_core::{
    ProfileStore, RitualCatalog, StoreError, SystemClipboard, Toast, progress_text,
    share_progress, stats,
};
use resilience_store::{Backend, SqliteBackend};
use resilience_types::{
    Difficulty, Frequency, MoodLevel, NewRitual, NewUser, NonEmptyString, NotificationSettings,
    ReminderTime, RitualCategory, RitualId, RitualPatch, SessionInput, SessionNotes, User,
    UserId, UserPatch, ValidationError, ritual_templates,
};

use crate::render;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in, creating the profile on first use
    Login {
        user_id: String,
        #[arg(long)]
        farcaster_id: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show points, streak and badges
    Profile,
    /// List the built-in ritual templates
    Templates,
    /// Manage rituals
    #[command(subcommand)]
    Ritual(RitualCommand),
    /// Recent completions, newest first
    History {
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,
    },
    /// All badges and which ones are unlocked
    Badges,
    /// Progress summary
    Stats,
    /// Set the streak back to zero
    ResetStreak,
    /// Copy a progress summary to the clipboard
    Share,
    /// Reminder and sharing preferences
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Subcommand)]
pub enum RitualCommand {
    /// Active rituals, newest first
    List,
    /// Create a ritual
    Add(AddArgs),
    /// Create a ritual from a built-in template
    FromTemplate { template_id: String },
    /// Change fields of a ritual
    Update(UpdateArgs),
    /// Remove a ritual
    Delete { id: RitualId },
    /// Record a completion and collect points
    Complete(CompleteArgs),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    name: String,
    #[arg(long)]
    category: RitualCategory,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    frequency: Option<Frequency>,
    /// Reminder time as HH:MM
    #[arg(long, value_parser = parse_time)]
    start_time: Option<ReminderTime>,
    #[arg(long)]
    difficulty: Option<Difficulty>,
    /// Minutes
    #[arg(long)]
    duration: Option<u32>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    id: RitualId,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    frequency: Option<Frequency>,
    #[arg(long, value_parser = parse_time)]
    start_time: Option<ReminderTime>,
    /// Remove the reminder time
    #[arg(long, conflicts_with = "start_time")]
    clear_start_time: bool,
    #[arg(long)]
    category: Option<RitualCategory>,
    #[arg(long)]
    difficulty: Option<Difficulty>,
    #[arg(long)]
    duration: Option<u32>,
}

#[derive(Debug, Args)]
pub struct CompleteArgs {
    id: RitualId,
    /// Mood before, 1 (very low) to 5 (excellent)
    #[arg(long, value_parser = parse_mood)]
    before: Option<MoodLevel>,
    /// Mood after, 1 (very low) to 5 (excellent)
    #[arg(long, value_parser = parse_mood)]
    after: Option<MoodLevel>,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Show,
    Set(SettingsArgs),
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[arg(long)]
    daily_reminders: Option<bool>,
    #[arg(long, value_parser = parse_time)]
    reminder_time: Option<ReminderTime>,
    #[arg(long)]
    streak_reminders: Option<bool>,
    #[arg(long)]
    badge_notifications: Option<bool>,
    #[arg(long)]
    social_sharing: Option<bool>,
}

fn parse_time(raw: &str) -> Result<ReminderTime, ValidationError> {
    ReminderTime::parse(raw)
}

fn parse_mood(raw: &str) -> Result<MoodLevel, String> {
    let value: u8 = raw
        .trim()
        .parse()
        .map_err(|_| format!("mood must be a number from 1 to 5 (got {raw:?})"))?;
    MoodLevel::new(value).map_err(|err| err.to_string())
}

/// Everything a command needs: the loaded config, the database and both stores.
pub struct Workspace {
    config_path: Option<PathBuf>,
    config: ResilienceConfig,
    backend: Rc<SqliteBackend>,
    profile: ProfileStore,
    catalog: RitualCatalog,
}

impl Workspace {
    pub fn open(config_path: Option<PathBuf>, database: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path.or_else(resilience_config::config_path);
        let config = match &config_path {
            Some(path) => ResilienceConfig::load_from(path)?.unwrap_or_default(),
            None => ResilienceConfig::default(),
        };

        let database = database
            .or_else(|| config.database_path())
            .or_else(resilience_config::default_database_path)
            .context("cannot locate a home directory; pass --database")?;
        let backend = Rc::new(SqliteBackend::open(&database)?);
        tracing::debug!(path = %database.display(), "Opened database");

        Ok(Self {
            config_path,
            config,
            profile: ProfileStore::new(backend.clone()),
            catalog: RitualCatalog::new(backend.clone()),
            backend,
        })
    }

    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        let mut toasts = self.profile.drain_toasts();
        toasts.extend(self.catalog.drain_toasts());
        toasts
    }

    fn config_path(&self) -> Result<&PathBuf> {
        self.config_path
            .as_ref()
            .context("cannot locate a home directory; pass --config")
    }

    /// Load the profile of the user recorded by `login`.
    fn signed_in(&mut self) -> Result<User> {
        let Some(raw) = self.config.session_user() else {
            bail!("not signed in; run `resilience login <user-id>` first");
        };
        let id = UserId::new(raw)?;
        match self.profile.fetch_user(&id)? {
            Some(user) => Ok(user.clone()),
            None => bail!("no profile for {id}; run `resilience login {id}` to create one"),
        }
    }

    /// Load the signed-in user and their rituals.
    fn signed_in_with_rituals(&mut self) -> Result<User> {
        let user = self.signed_in()?;
        self.catalog.fetch_rituals(&user.user_id)?;
        Ok(user)
    }

    fn require_ritual(&self, id: RitualId) -> Result<(), StoreError> {
        match self.catalog.ritual(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::UnknownRitual(id)),
        }
    }
}

pub fn run(ws: &mut Workspace, command: Command) -> Result<()> {
    match command {
        Command::Login {
            user_id,
            farcaster_id,
        } => login(ws, user_id, farcaster_id),
        Command::Logout => logout(ws),
        Command::Profile => {
            let user = ws.signed_in()?;
            render::profile(&user);
            Ok(())
        }
        Command::Templates => {
            render::templates(ritual_templates());
            Ok(())
        }
        Command::Ritual(command) => ritual(ws, command),
        Command::History { limit } => {
            let user = ws.signed_in()?;
            let sessions = ws.backend.sessions_for_user(&user.user_id, Some(limit))?;
            render::history(&sessions, Utc::now().date_naive());
            Ok(())
        }
        Command::Badges => {
            let user = ws.signed_in()?;
            let catalog = ws.backend.all_badges()?;
            let unlocked = ws.backend.user_badges(&user.user_id)?;
            render::badges(&catalog, &unlocked);
            Ok(())
        }
        Command::Stats => show_stats(ws),
        Command::ResetStreak => {
            ws.signed_in()?;
            ws.profile.reset_streak()?;
            Ok(())
        }
        Command::Share => share(ws),
        Command::Settings(command) => settings(ws, command),
    }
}

fn login(ws: &mut Workspace, user_id: String, farcaster_id: Option<String>) -> Result<()> {
    let id = UserId::new(user_id)?;
    let existing = ws.profile.fetch_user(&id)?.cloned();

    let user = match existing {
        None => ws
            .profile
            .create_user(&NewUser {
                user_id: id.clone(),
                farcaster_id,
                active_rituals: Vec::new(),
            })?
            .clone(),
        Some(user) if farcaster_id.is_some() && user.farcaster_id != farcaster_id => ws
            .profile
            .update_user(&UserPatch {
                farcaster_id: Some(farcaster_id),
                ..UserPatch::default()
            })?
            .clone(),
        Some(user) => {
            println!("Welcome back, {}!", user.user_id);
            user
        }
    };

    let path = ws.config_path()?.clone();
    persist_session(&path, user.user_id.as_str(), user.farcaster_id.as_deref())?;
    tracing::info!(user = %user.user_id, "Signed in");
    render::profile(&user);
    Ok(())
}

fn logout(ws: &mut Workspace) -> Result<()> {
    ws.profile.logout();
    let path = ws.config_path()?.clone();
    clear_session(&path)?;
    Ok(())
}

fn ritual(ws: &mut Workspace, command: RitualCommand) -> Result<()> {
    match command {
        RitualCommand::List => {
            ws.signed_in_with_rituals()?;
            render::rituals(ws.catalog.rituals());
        }
        RitualCommand::Add(args) => {
            let user = ws.signed_in()?;
            let new = new_ritual(user.user_id, args)?;
            let ritual = ws.catalog.create_ritual(&new, &mut ws.profile)?;
            render::ritual_created(ritual);
        }
        RitualCommand::FromTemplate { template_id } => {
            let user = ws.signed_in()?;
            let ritual =
                ws.catalog
                    .create_from_template(&user.user_id, &template_id, &mut ws.profile)?;
            render::ritual_created(ritual);
        }
        RitualCommand::Update(args) => {
            ws.signed_in_with_rituals()?;
            ws.require_ritual(args.id)?;
            let id = args.id;
            let patch = ritual_patch(args)?;
            if patch.is_empty() {
                bail!("nothing to update; pass at least one field to change");
            }
            let ritual = ws.catalog.update_ritual(id, &patch)?;
            render::rituals(slice::from_ref(&ritual));
        }
        RitualCommand::Delete { id } => {
            ws.signed_in_with_rituals()?;
            ws.require_ritual(id)?;
            ws.catalog.delete_ritual(id, &mut ws.profile)?;
        }
        RitualCommand::Complete(args) => {
            ws.signed_in_with_rituals()?;
            let notes = args.notes.map(SessionNotes::new).transpose()?;
            let input = SessionInput {
                mood_before: args.before,
                mood_after: args.after,
                notes,
            };
            let completion = ws.catalog.complete_ritual(args.id, input, &mut ws.profile)?;
            tracing::debug!(session = %completion.session.session_id, "Completion recorded");
            if let Some(user) = ws.profile.user() {
                render::progress(user);
            }
        }
    }
    Ok(())
}

fn new_ritual(user_id: UserId, args: AddArgs) -> Result<NewRitual, ValidationError> {
    let mut ritual = NewRitual::new(user_id, &args.name, args.category)?;
    if let Some(description) = args.description {
        ritual.description = description;
    }
    if let Some(frequency) = args.frequency {
        ritual.frequency = frequency;
    }
    if let Some(difficulty) = args.difficulty {
        ritual.difficulty = difficulty;
    }
    ritual.start_time = args.start_time;
    match args.duration {
        Some(minutes) => ritual.with_duration(minutes),
        None => Ok(ritual),
    }
}

fn ritual_patch(args: UpdateArgs) -> Result<RitualPatch, ValidationError> {
    let name = args
        .name
        .map(|name| {
            NonEmptyString::new(name.trim()).map_err(|_| ValidationError::EmptyText {
                field: "name",
            })
        })
        .transpose()?;
    if args.duration == Some(0) {
        return Err(ValidationError::ZeroDuration);
    }
    Ok(RitualPatch {
        name,
        description: args.description,
        frequency: args.frequency,
        start_time: if args.clear_start_time {
            Some(None)
        } else {
            args.start_time.map(Some)
        },
        category: args.category,
        difficulty: args.difficulty,
        estimated_duration: args.duration,
        ..RitualPatch::default()
    })
}

fn show_stats(ws: &mut Workspace) -> Result<()> {
    let user = ws.signed_in()?;
    let totals = ws.backend.user_stats(&user.user_id)?;
    let sessions = ws.backend.sessions_for_user(&user.user_id, None)?;

    let today = Utc::now().date_naive();
    let timestamps: Vec<_> = sessions.iter().map(|s| s.session.timestamp).collect();
    let mut active_days: Vec<_> = timestamps.iter().map(DateTime::date_naive).collect();
    active_days.sort_unstable();
    active_days.dedup();
    let days_since_joined = (today - user.created_at.date_naive()).num_days().max(0) as u32 + 1;

    render::stats(&render::StatsView {
        user: &user,
        totals,
        day_streak: stats::consecutive_day_streak(&timestamps, today),
        completion_rate: stats::completion_rate(days_since_joined, active_days.len() as u32),
    });
    Ok(())
}

fn share(ws: &mut Workspace) -> Result<()> {
    let user = ws.signed_in()?;
    if !ws.config.clipboard_enabled() {
        println!("{}", progress_text(user.streak_count));
        return Ok(());
    }
    if let Some(text) = share_progress(&mut ws.profile, &mut SystemClipboard)? {
        println!("{text}");
    }
    Ok(())
}

fn settings(ws: &mut Workspace, command: SettingsCommand) -> Result<()> {
    let user = ws.signed_in()?;
    let current = ws
        .backend
        .notification_settings(&user.user_id)?
        .unwrap_or_else(|| NotificationSettings::defaults_for(user.user_id.clone()));

    match command {
        SettingsCommand::Show => render::settings(&current),
        SettingsCommand::Set(args) => {
            let updated = NotificationSettings {
                daily_reminders: args.daily_reminders.unwrap_or(current.daily_reminders),
                reminder_time: args.reminder_time.unwrap_or(current.reminder_time),
                streak_reminders: args.streak_reminders.unwrap_or(current.streak_reminders),
                badge_notifications: args
                    .badge_notifications
                    .unwrap_or(current.badge_notifications),
                social_sharing: args.social_sharing.unwrap_or(current.social_sharing),
                ..current
            };
            let saved = ws.backend.save_notification_settings(&updated)?;
            tracing::info!(user = %user.user_id, "Saved notification settings");
            render::settings(&saved);
        }
    }
    Ok(())
}
