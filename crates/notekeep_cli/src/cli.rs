use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "notekeep", version, about = "Local note store: list, export, back up and import notes")]
pub struct Cli {
    /// SQLite file holding notes and settings.
    #[arg(long, global = true, default_value = "notekeep.db")]
    pub db: PathBuf,

    /// Absolute directory for rotating log files; logging is off without it.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error; falls back to NOTEKEEP_LOG_LEVEL.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List notes, pinned first, ordered by the saved sort setting
    List {
        #[arg(long)]
        folder: Option<String>,
        /// Case-insensitive substring over title and content
        #[arg(long, short)]
        query: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// Print full records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a note
    New {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        folder: Option<String>,
    },
    /// Export one note (html, pdf, docx, markdown, txt)
    Export {
        id: String,
        #[arg(long, short, default_value = "markdown")]
        format: String,
        #[arg(long, short, default_value = ".")]
        out: PathBuf,
        /// Leave out the created/updated header
        #[arg(long)]
        no_metadata: bool,
    },
    /// Write a full JSON backup
    Backup {
        #[arg(long, short, default_value = ".")]
        out: PathBuf,
    },
    /// Merge a JSON backup; existing ids are kept
    Import { file: PathBuf },
    /// Fire due reminders and clear expired ones
    RemindCheck,
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print the settings record as JSON
    Show,
    /// Set one key; VALUE is parsed as JSON, else taken as a string
    Set { key: String, value: String },
    /// Restore defaults
    Reset,
}
