//! NoteKeep command-line host.
//!
//! # Responsibility
//! - Drive `notekeep_core` operations against one SQLite file.
//! - Keep output plain and deterministic for scripting.

mod cli;

use clap::Parser;
use cli::{Cli, Command, SettingsAction};
use log::error;
use notekeep_core::export::{DirectorySink, ExportFormat, ExportOptions};
use notekeep_core::model::note::NewNote;
use notekeep_core::{
    init_logging, resolve_log_level, NotesStore, NotificationCenter, SettingsStore, SqliteKvStore,
    SystemClock,
};
use serde_json::Value;
use std::error::Error;

type CliResult = Result<(), Box<dyn Error>>;

fn main() {
    let cli = Cli::parse();
    if let Some(log_dir) = &cli.log_dir {
        if let Err(err) = init_logging(resolve_log_level(cli.log_level.as_deref()), log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    if let Err(err) = run(cli) {
        error!("event=cli_command module=cli status=error error={err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    let settings = SettingsStore::open(SqliteKvStore::open(&cli.db)?)?;
    let mut store = NotesStore::open(SqliteKvStore::open(&cli.db)?, Box::new(SystemClock))?;

    match cli.command {
        Command::List {
            folder,
            query,
            tag,
            json,
        } => {
            store.set_current_folder(folder);
            store.set_search_query(query.unwrap_or_default());
            let mut notes = store.sorted_notes(settings.settings().sort_config());
            if let Some(tag) = tag {
                let tagged = store.notes_with_tag(&tag);
                notes.retain(|note| tagged.iter().any(|other| other.id == note.id));
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&notes)?);
            } else {
                for note in notes {
                    let pin = if note.is_pinned { "*" } else { " " };
                    let lock = if note.is_encrypted { " [locked]" } else { "" };
                    println!(
                        "{pin} {}  {}  {}{lock}",
                        note.id,
                        note.updated_at.format("%Y-%m-%d %H:%M"),
                        note.title
                    );
                }
            }
        }
        Command::New {
            title,
            content,
            folder,
        } => {
            let note = store.create_note(
                folder,
                NewNote {
                    title,
                    content,
                    kind: Some(settings.settings().default_note_type),
                },
            )?;
            println!("{}", note.id);
        }
        Command::Export {
            id,
            format,
            out,
            no_metadata,
        } => {
            let format = format.parse::<ExportFormat>()?;
            let options = ExportOptions {
                include_metadata: !no_metadata,
            };
            let mut sink = DirectorySink::new(&out);
            if !store.export_note(&id, format, &options, &mut sink)? {
                return Err(format!("note not found: {id}").into());
            }
            println!("exported {id} as {format} into {}", out.display());
        }
        Command::Backup { out } => {
            let file = store.export_data(&mut DirectorySink::new(&out))?;
            println!("{}", out.join(&file.filename).display());
        }
        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let summary = store.import_data(raw)?;
            println!(
                "notes: {} added, {} skipped; folders: {} added, {} skipped",
                summary.notes_added,
                summary.notes_skipped,
                summary.folders_added,
                summary.folders_skipped
            );
        }
        Command::RemindCheck => {
            let mut center = NotificationCenter::new(Box::new(SystemClock));
            center.set_alerts_enabled(settings.settings().enable_notifications);
            let fired = store.run_due_reminders(&mut center)
                + store.alert_missed_reminders(&mut center);
            for notification in center.notifications() {
                println!(
                    "{}: {}",
                    notification.title.as_deref().unwrap_or_default(),
                    notification.message
                );
            }
            let cleared = store.cleanup_expired_reminders()?;
            println!("fired {fired}, cleared {cleared}");
            center.shutdown();
        }
        Command::Settings { action } => run_settings(settings, action)?,
    }
    Ok(())
}

fn run_settings(mut settings: SettingsStore<SqliteKvStore>, action: SettingsAction) -> CliResult {
    match action {
        SettingsAction::Show => {}
        SettingsAction::Set { key, value } => {
            let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            settings.update_by_name(&key, value)?;
        }
        SettingsAction::Reset => settings.reset()?,
    }
    println!("{}", serde_json::to_string_pretty(settings.settings())?);
    Ok(())
}
