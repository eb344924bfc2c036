use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use scribepad_core::{Document, FindReplaceSession, Notice, NoticeKind, Notifier};
use scribepad_highlight::{annotate, default_palette, parse_match_palette, MarkerSet, MatchPalette};
use serde_json::json;

#[derive(Parser)]
#[command(
    name = "scribepad-cli",
    about = "Find/replace utility commands for ScribePad documents",
    author,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a document and report every match.
    Find(FindArgs),
    /// Replace matches in a document.
    Replace(ReplaceArgs),
}

#[derive(Args)]
struct FindArgs {
    /// Literal text to search for (regex metacharacters are escaped).
    term: String,

    /// Document to search.
    file: PathBuf,

    /// Emit the matches as a JSON array.
    #[arg(long)]
    json: bool,

    /// Print the whole buffer with highlight markers around matches.
    #[arg(long)]
    annotate: bool,

    /// Use ANSI colors instead of bracket markers (implies --annotate).
    #[arg(long)]
    color: bool,

    /// Palette JSON file used with --color.
    #[arg(long, value_name = "FILE")]
    palette: Option<PathBuf>,
}

#[derive(Args)]
struct ReplaceArgs {
    /// Literal text to search for.
    term: String,

    /// Replacement text.
    replacement: String,

    /// Document to rewrite.
    file: PathBuf,

    /// Replace only the first match instead of every match.
    #[arg(long)]
    first: bool,

    /// Persist the rewrite to the input file.
    #[arg(long)]
    apply: bool,

    /// Write the rewritten document to another path.
    #[arg(long, value_name = "FILE", conflicts_with = "apply")]
    output: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match Cli::parse().command {
        Commands::Find(args) => execute_find(args),
        Commands::Replace(args) => execute_replace(args),
    }
}

/// Forwards engine notices to the terminal: successes to stdout, warnings to
/// stderr.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&mut self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.message),
            NoticeKind::Warning => eprintln!("warning: {}", notice.message),
        }
    }
}

fn execute_find(args: FindArgs) -> Result<()> {
    if args.term.is_empty() {
        bail!("search term is empty");
    }
    let document = Document::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let mut session = FindReplaceSession::new(document, (), TerminalNotifier);
    session.set_term(args.term.as_str());

    if args.json {
        let entries: Vec<_> = session
            .matches()
            .iter()
            .map(|m| {
                json!({
                    "start": m.start,
                    "end": m.end,
                    "text": m.text,
                    "line": m.line,
                    "column": m.column,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::Value::Array(entries))?
        );
        return Ok(());
    }

    if session.matches().is_empty() {
        return Ok(());
    }

    println!(
        "Search \"{}\" ({} hits)",
        session.term(),
        session.matches().len()
    );
    let contents = session.document().contents().to_string();
    let lines: Vec<&str> = contents.lines().collect();
    for m in session.matches() {
        let line_text = lines.get(m.line - 1).copied().unwrap_or_default();
        println!("  Line {} (Col {}): {}", m.line, m.column, line_text);
    }

    if args.annotate || args.color {
        let markers = if args.color {
            let palette = load_palette(args.palette.as_deref())?;
            MarkerSet::ansi(&palette)
        } else {
            MarkerSet::brackets()
        };
        println!(
            "{}",
            annotate(
                &contents,
                session.matches(),
                session.current_index(),
                &markers
            )
        );
    }

    Ok(())
}

fn execute_replace(args: ReplaceArgs) -> Result<()> {
    if args.term.is_empty() {
        bail!("search term is empty");
    }
    let document = Document::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let mut session = FindReplaceSession::new(document, (), TerminalNotifier);
    session.set_term(args.term.as_str());
    session.set_replacement(args.replacement.as_str());

    let replaced = if args.first {
        usize::from(session.replace_current().is_some())
    } else {
        session.replace_all()
    };

    if replaced == 0 {
        return Ok(());
    }

    let mut document = session.into_document();
    if args.apply {
        document
            .save()
            .with_context(|| format!("failed to write {}", args.file.display()))?;
        println!("Applied {} replacements to {}", replaced, args.file.display());
    } else if let Some(output) = &args.output {
        document
            .save_as(output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("Wrote rewritten document to {}", output.display());
    } else {
        println!("Dry run only; re-run with --apply to write changes.");
    }

    Ok(())
}

fn load_palette(path: Option<&Path>) -> Result<MatchPalette> {
    let Some(path) = path else {
        return Ok(default_palette().clone());
    };
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse palette file {}", path.display()))?;
    parse_match_palette(&value)
        .map_err(|err| anyhow!("invalid palette {}: {err}", path.display()))
}
