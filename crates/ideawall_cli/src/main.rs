//! Local command-line front end for an idea wall.
//!
//! # Responsibility
//! - Drive `ideawall_core::Board` against the configured SQLite store.
//! - Keep output deterministic: one line per note, or JSON with `--json`.
//!
//! Cloud sync is not exposed here; the CLI works on the local copy only.

use clap::{Parser, Subcommand};
use ideawall_core::{
    init_from_config, Board, Note, NoteColor, NoteDraft, NoteId, NotePatch, Position, WallConfig,
};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_DB_FILE: &str = "ideawall.sqlite3";

#[derive(Parser, Debug)]
#[command(name = "ideawall")]
#[command(version, about = "Sticky notes on a wall, from the terminal")]
struct Cli {
    /// JSON config file; missing files fall back to defaults
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List notes in wall order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pin a new note to the wall
    Add {
        title: String,
        content: Option<String>,
        /// Hex (#rrggbb) or hsl() color
        #[arg(long)]
        color: Option<String>,
    },
    /// Move a note to new wall coordinates
    Move {
        id: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Change a note's color
    Color { id: String, color: String },
    /// Replace a note's title and optionally its content
    Edit {
        id: String,
        title: String,
        content: Option<String>,
    },
    /// Remove one note
    Delete { id: String },
    /// Remove every note from the local wall
    Reset,
    /// Print the core version
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_command module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Command::Version = cli.command {
        println!("ideawall_core version={}", ideawall_core::core_version());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => WallConfig::load(path),
        None => Ok(WallConfig::default()),
    }
    .map_err(|err| err.to_string())?;
    if config.storage.db_path.is_none() {
        config.storage.db_path = Some(PathBuf::from(DEFAULT_DB_FILE));
    }
    if let Err(err) = init_from_config(&config.logging) {
        eprintln!("warning: logging disabled: {err}");
    }

    let mut board = Board::open(&config).map_err(|err| err.to_string())?;
    match cli.command {
        Command::List { json } => {
            let notes: Vec<&Note> = board.notes().collect();
            if json {
                let rendered = serde_json::to_string_pretty(&notes).map_err(|err| err.to_string())?;
                println!("{rendered}");
            } else {
                notes.iter().for_each(|note| println!("{}", render(note)));
            }
        }
        Command::Add {
            title,
            content,
            color,
        } => {
            let mut draft = NoteDraft::new(title, content.unwrap_or_default());
            if let Some(color) = color {
                draft = draft.with_color(parse_color(&color)?);
            }
            let note = board
                .add_note(draft)
                .ok_or_else(|| "note title cannot be empty".to_string())?;
            println!("{}", render(&note));
        }
        Command::Move { id, x, y } => {
            let note = board
                .move_note(parse_id(&id)?, Position::new(x, y))
                .ok_or_else(|| not_changed(&id))?;
            println!("{}", render(&note));
        }
        Command::Color { id, color } => {
            let note = board
                .recolor_note(parse_id(&id)?, parse_color(&color)?)
                .ok_or_else(|| not_changed(&id))?;
            println!("{}", render(&note));
        }
        Command::Edit { id, title, content } => {
            let mut patch = NotePatch::default().title(title);
            if let Some(content) = content {
                patch = patch.content(content);
            }
            let note = board
                .update_note(parse_id(&id)?, patch)
                .ok_or_else(|| not_changed(&id))?;
            println!("{}", render(&note));
        }
        Command::Delete { id } => {
            let note = board
                .delete_note(parse_id(&id)?)
                .ok_or_else(|| format!("note not found: {id}"))?;
            println!("deleted {}", note.id);
        }
        Command::Reset => {
            let count = board.len();
            board.reset();
            println!("removed {count} notes");
        }
        Command::Version => {}
    }
    Ok(())
}

fn render(note: &Note) -> String {
    format!(
        "{}\t{}\t({:.0}, {:.0})\t{}",
        note.id, note.color, note.position.x, note.position.y, note.title
    )
}

fn parse_id(raw: &str) -> Result<NoteId, String> {
    NoteId::parse_str(raw.trim()).map_err(|err| format!("invalid note id `{raw}`: {err}"))
}

fn parse_color(raw: &str) -> Result<NoteColor, String> {
    NoteColor::parse(raw).map_err(|err| err.to_string())
}

fn not_changed(id: &str) -> String {
    format!("note not found or unchanged: {id}")
}
