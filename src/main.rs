//! Sylvan - a structural tree editor engine.
//!
//! # Usage
//!
//! ```bash
//! sylvan doc.json -e '"plus" insert-parent' -k 'jd'
//! sylvan --language lisp.json -k 'ild' --format sexpr
//! sylvan doc.json -k '0y l0p' -o edited.json
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use sylvan::command::command_names;
use sylvan::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use sylvan::document::{Document, Format, JsonStore, Persistence};
use sylvan::keymap::{Key, Keymap};
use sylvan::session::Session;
use sylvan::tree::Language;

/// Edit a tree document with commands and key strokes
#[derive(Parser, Debug)]
#[command(name = "sylvan", version, about, long_about = None)]
struct Cli {
    /// Document to load (JSON); starts from an empty root when absent
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Language definition (JSON); defaults to the built-in example language
    #[arg(long, value_name = "PATH")]
    language: Option<PathBuf>,

    /// Command string to run as one top-level command (repeatable)
    #[arg(short, long, value_name = "COMMANDS")]
    eval: Vec<String>,

    /// Key strokes to feed after the --eval commands, e.g. 'jd{C-r}' (repeatable)
    #[arg(short, long, value_name = "KEYS")]
    keys: Vec<String>,

    /// Extra key bindings layered over the defaults
    #[arg(long, value_name = "PATH")]
    keymap: Option<PathBuf>,

    /// Maximum nesting of macros, key literals and eval
    #[arg(long, value_name = "N")]
    macro_depth: Option<usize>,

    /// Maximum iterations of one loop
    #[arg(long, value_name = "N")]
    loop_limit: Option<usize>,

    /// Maximum undo records kept
    #[arg(long, value_name = "N")]
    history_limit: Option<usize>,

    /// Write the result here instead of printing it
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Log every command
    #[arg(short, long)]
    verbose: bool,

    /// List every command name and exit
    #[arg(long)]
    list_commands: bool,

    /// Save current command-line flags as defaults in the global config
    #[arg(long)]
    save_config: bool,

    /// Clear saved defaults in the global config
    #[arg(long)]
    clear_config: bool,
}

fn load_language(path: Option<&PathBuf>) -> Result<Language> {
    let Some(path) = path else {
        return Ok(Language::example());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read language {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid language {}", path.display()))
}

fn load_keymap(path: Option<&PathBuf>) -> Result<Keymap> {
    let mut keymap = Keymap::default();
    if let Some(path) = path {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read keymap {}", path.display()))?;
        keymap
            .extend_from(&text)
            .with_context(|| format!("Invalid keymap {}", path.display()))?;
    }
    Ok(keymap)
}

fn load_document(file: Option<&PathBuf>, lang: &Arc<Language>) -> Result<Document> {
    match file {
        Some(path) if path.exists() => JsonStore::new(path, Arc::clone(lang))
            .load()
            .with_context(|| format!("Failed to load {}", path.display())),
        _ => Document::empty(Arc::clone(lang)).context("Language has no usable root"),
    }
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear_config {
        clear_config_flags(&global_path)?;
    }
    if cli.save_config {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear_config {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    // Initialize logging
    let level = if effective.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if cli.list_commands {
        for name in command_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let lang = Arc::new(load_language(cli.language.as_ref())?);
    let keymap = load_keymap(effective.keymap.as_ref())?;
    let doc = load_document(cli.file.as_ref(), &lang)?;
    let mut session = Session::with_limits(doc, effective.limits()).with_keymap(keymap);

    // A failing command does not stop the remaining input.
    for source in &cli.eval {
        if let Err(err) = session.eval(source) {
            eprintln!("[warn] {source}: {err}");
        }
    }
    for typed in &cli.keys {
        let keys = Key::parse_sequence(typed).with_context(|| format!("Invalid keys '{typed}'"))?;
        for key in keys {
            if let Err(err) = session.handle_key(key) {
                eprintln!("[warn] {key}: {err}");
            }
        }
    }

    let doc = session.into_document();
    let cursor = doc.cursor().path().clone();
    match &cli.output {
        Some(path) if cli.format == Format::Json => {
            JsonStore::new(path, Arc::clone(&lang))
                .save(&doc)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Some(path) => {
            let bytes = JsonStore::new(path, Arc::clone(&lang)).export(&doc, cli.format)?;
            fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let store = JsonStore::new(cli.file.clone().unwrap_or_default(), Arc::clone(&lang));
            let bytes = store.export(&doc, cli.format)?;
            print!("{}", String::from_utf8_lossy(&bytes));
            println!("cursor: {cursor}");
        }
    }
    Ok(())
}
