//! Quire - Main Entry Point
//!
//! Command-line access to the persisted document: print it as Markdown,
//! import a Markdown file into it, export it to a `.md` file or copy it to the
//! clipboard.

use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use quire::config::{load_config, save_config_silent, Settings};
use quire::editor::Editor;
use quire::error::{Error, Result};
use quire::export::{copy_markdown_to_clipboard, export_markdown_file};
use quire::markdown::parse_markdown;
use quire::model::Metadata;
use quire::storage::{DocumentStorage, FileStore, SaveStatus};

/// Application name constant.
const APP_NAME: &str = "Quire";

/// Command-line access to the persisted Quire document
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the document as Markdown (default)
    Show,
    /// Print word count and reading time
    Stats,
    /// Replace the document with an imported Markdown file
    Import {
        /// Path to markdown file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Write the document to a `.md` file named after its title
    Export {
        /// Target directory, defaults to the last export directory
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Copy the document as Markdown to the clipboard
    Copy,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting {}", APP_NAME);
    match run(args.command.unwrap_or(Command::Show)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    let mut settings = load_config();
    let store = FileStore::open_default(settings.storage_dir.as_deref())?;
    let mut storage = DocumentStorage::new(store);
    let state = storage.load();
    let mut metadata = state.metadata;
    let mut editor = Editor::new(state.document).with_settings(&settings);

    match command {
        Command::Show => println!("{}", export_text(&editor, &metadata, &settings)),
        Command::Stats => println!("{}", editor.stats().format_compact()),
        Command::Import { file: path } => {
            let source = std::fs::read_to_string(&path)?;
            let imported = parse_markdown(&source)?;
            if let Some(imported_metadata) = imported.metadata {
                metadata = imported_metadata;
            }
            editor.load(imported.document);
            match storage.save(editor.document(), &metadata) {
                SaveStatus::Saved { .. } => {
                    editor.mark_saved();
                    info!("Imported {}", path.display());
                }
                SaveStatus::Failed { message, .. } => return Err(Error::Application(message)),
            }
        }
        Command::Export { dir } => {
            let dir = match dir.or_else(|| settings.last_export_directory.clone()) {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            let markdown = export_text(&editor, &metadata, &settings);
            let path = export_markdown_file(&dir, &metadata.title, &markdown)?;
            println!("{}", path.display());
            settings.last_export_directory = Some(dir);
            save_config_silent(&settings);
        }
        Command::Copy => {
            let markdown = export_text(&editor, &metadata, &settings);
            if !copy_markdown_to_clipboard(&markdown) {
                return Err(Error::Application("Could not copy to clipboard".to_string()));
            }
        }
    }
    Ok(())
}

fn export_text(editor: &Editor, metadata: &Metadata, settings: &Settings) -> String {
    let front_matter = settings.front_matter_on_export && !metadata.is_empty();
    editor.to_markdown(front_matter.then_some(metadata))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_show() {
        let args = Args::try_parse_from(["quire"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn test_import_requires_file() {
        assert!(Args::try_parse_from(["quire", "import"]).is_err());
        let args = Args::try_parse_from(["quire", "import", "notes.md"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Import { file }) if file == PathBuf::from("notes.md")
        ));
    }

    #[test]
    fn test_export_directory_is_optional() {
        let args = Args::try_parse_from(["quire", "export"]).unwrap();
        assert!(matches!(args.command, Some(Command::Export { dir: None })));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Args::try_parse_from(["quire", "publish"]).is_err());
    }
}
