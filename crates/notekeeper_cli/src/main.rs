//! Notekeeper command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration, logging and the acting user.
//! - Run one note use-case per invocation and print the result as JSON.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use notekeeper_core::db::{open_db, Connection};
use notekeeper_core::policy::slug;
use notekeeper_core::{
    init_logging, CoreConfig, CurrentUser, NoteForm, NoteService, NoteServiceError, NoteStore,
    SqliteNoteStore, SqliteUserStore, User, UserStore,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "notekeeper")]
#[command(about = "Keep private notes addressed by unique slugs", long_about = None)]
struct Cli {
    /// SQLite database file (overrides NOTEKEEPER_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Act as this registered user
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Log level (overrides NOTEKEEPER_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Rolling log directory (overrides NOTEKEEPER_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a user who can own notes
    UserAdd { username: String },
    /// Print the slug a title would get
    Slugify { title: String },
    #[command(flatten)]
    Note(NoteCommand),
}

/// Commands acting on the caller's own notes.
#[derive(Subcommand)]
enum NoteCommand {
    /// List your notes
    List,
    /// Create a note
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        text: String,
        /// Explicit slug; derived from the title when omitted
        #[arg(long)]
        slug: Option<String>,
    },
    /// Show one of your notes
    Show { slug: String },
    /// Replace title, text and slug of one of your notes
    Edit {
        slug: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        text: String,
        /// New slug; derived from the new title when omitted
        #[arg(long = "new-slug")]
        new_slug: Option<String>,
    },
    /// Delete one of your notes
    Delete { slug: String },
}

#[derive(Serialize)]
struct Deleted<'a> {
    deleted: &'a str,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = CoreConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }
    if let Some(dir) = config.log_dir.as_deref() {
        let dir = std::path::absolute(dir)
            .with_context(|| format!("cannot resolve log directory `{}`", dir.display()))?;
        init_logging(&config.log_level, &dir).context("logging setup failed")?;
    }

    let command = match cli.command {
        Command::Slugify { title } => return print_json(&slug::derive(&title)),
        Command::UserAdd { username } => return add_user(&config, &username),
        Command::Note(command) => command,
    };

    let conn = open_database(&config)?;
    let users = SqliteUserStore::try_new(&conn)?;
    let current = resolve_user(&users, cli.user.as_deref())?;
    let Some(user) = current.user() else {
        bail!("login required: pass --user <name>");
    };
    let service = NoteService::new(SqliteNoteStore::try_new(&conn)?);
    execute(&service, user, command)
}

fn open_database(config: &CoreConfig) -> Result<Connection> {
    open_db(&config.db_path)
        .with_context(|| format!("cannot open `{}`", config.db_path.display()))
}

fn add_user(config: &CoreConfig, username: &str) -> Result<()> {
    let conn = open_database(config)?;
    let users = SqliteUserStore::try_new(&conn)?;
    let user = users.insert(&User::new(username))?;
    info!("event=user_add module=cli status=ok user_id={}", user.id);
    print_json(&user)
}

fn resolve_user(users: &impl UserStore, username: Option<&str>) -> Result<CurrentUser> {
    let Some(name) = username else {
        return Ok(CurrentUser::Anonymous);
    };
    let user = users
        .get_by_username(name)?
        .ok_or_else(|| anyhow!("unknown user `{name}`"))?;
    Ok(CurrentUser::Identified(user))
}

fn execute<S: NoteStore>(
    service: &NoteService<S>,
    user: &User,
    command: NoteCommand,
) -> Result<()> {
    match command {
        NoteCommand::List => print_json(&service.list_notes(user)?),
        NoteCommand::Add { title, text, slug } => {
            let form = checked_form(title, text, slug)?;
            print_json(&service.create_note(user, &form).map_err(describe)?)
        }
        NoteCommand::Show { slug } => {
            print_json(&service.note_detail(user, &slug).map_err(describe)?)
        }
        NoteCommand::Edit {
            slug,
            title,
            text,
            new_slug,
        } => {
            let form = checked_form(title, text, new_slug)?;
            print_json(&service.edit_note(user, &slug, &form).map_err(describe)?)
        }
        NoteCommand::Delete { slug } => {
            service.delete_note(user, &slug).map_err(describe)?;
            print_json(&Deleted { deleted: &slug })
        }
    }
}

/// Builds a form and applies the same field checks as the web form.
fn checked_form(title: String, text: String, slug: Option<String>) -> Result<NoteForm> {
    let form = NoteForm { title, text, slug };
    if let Some(err) = form.validate().into_iter().next() {
        bail!("{}: {}", err.field, err.message);
    }
    Ok(form)
}

fn describe(err: NoteServiceError) -> anyhow::Error {
    match err {
        NoteServiceError::NotFound => anyhow!("note not found"),
        other => anyhow::Error::new(other),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
