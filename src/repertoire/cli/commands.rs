//! # CLI Layer
//!
//! This module is **one possible UI client** for repertoire. It is the only
//! place in the codebase that:
//! - Knows about terminal I/O (stdin, stdout, stderr)
//! - Sleeps to pace opponent replies
//! - Asks for confirmation before destructive commands
//! - Formats output for human consumption
//!
//! Handlers call the matching `TrainerApi` method and hand the `CmdResult` to
//! `render`. They hold no business logic; that lives in the command layer.
//!
//! ## Structure
//!
//! - `run()`: Main dispatch logic (called by `main.rs`)
//! - `init_context()`: Builds `AppContext` around the file-backed API
//! - `handle_*()`: Per-command handlers that call the API and print the result

use super::drill::DrillLoop;
use super::logging::init_logging;
use super::render::{
    print_messages, render_facets, render_full_openings, render_opening_list, render_status,
    render_text_list,
};
use super::setup::{
    print_grouped_help, print_help_for_command, print_subcommand_help, Cli, Commands,
    DataCommands, DrillCommands, FilterArgs, LineCommands, MiscCommands,
};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use repertoire::api::TrainerApi;
use repertoire::commands::backup::backup_file_name;
use repertoire::commands::config::ConfigAction;
use repertoire::commands::edit::OpeningUpdate;
use repertoire::commands::pgn::clean_movetext;
use repertoire::commands::save::SaveRequest;
use repertoire::drill::{Advance, DrillMode};
use repertoire::error::Result;
use repertoire::facets::OpeningFilter;
use repertoire::init::initialize;
use repertoire::model::Color;
use repertoire::store::fs::FileStore;
use std::io::{BufRead, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

struct AppContext {
    api: TrainerApi<FileStore>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.help {
        if cli.command.is_none() {
            print_grouped_help();
        } else {
            print_subcommand_help(&cli.command);
        }
        return Ok(());
    }

    init_logging(cli.verbose);

    if let Some(Commands::Misc(MiscCommands::Help { command })) = &cli.command {
        return handle_help(command.clone());
    }

    let mut ctx = init_context()?;

    match cli.command {
        Some(Commands::Lines(cmd)) => match cmd {
            LineCommands::Add {
                name,
                moves,
                playing_as,
                category,
                force,
            } => handle_add(&mut ctx, name, moves, playing_as, category, force),
            LineCommands::List {
                search,
                due,
                filter,
            } => handle_list(&mut ctx, search, due, filter),
            LineCommands::Show { keys } => handle_show(&mut ctx, keys),
            LineCommands::Edit {
                key,
                name,
                category,
                playing_as,
            } => handle_edit(&mut ctx, key, name, category, playing_as),
            LineCommands::Delete { keys } => handle_delete(&mut ctx, keys),
        },
        Some(Commands::Drill(cmd)) => match cmd {
            DrillCommands::Review => handle_review(&mut ctx),
            DrillCommands::Practice { filter } => handle_practice(&mut ctx, filter),
            DrillCommands::Learn { key } => handle_learn(&mut ctx, key),
        },
        Some(Commands::Data(cmd)) => match cmd {
            DataCommands::ImportPgn { path } => handle_import_pgn(&mut ctx, path),
            DataCommands::Export { output, stdout } => handle_export(&mut ctx, output, stdout),
            DataCommands::Import { path } => handle_import(&mut ctx, path),
            DataCommands::Migrate => handle_migrate(&mut ctx),
            DataCommands::ResetProgress { yes } => handle_reset_progress(&mut ctx, yes),
            DataCommands::Wipe { yes } => handle_wipe(&mut ctx, yes),
        },
        Some(Commands::Misc(cmd)) => match cmd {
            MiscCommands::Facets => handle_facets(&mut ctx),
            MiscCommands::Status => handle_status(&mut ctx),
            MiscCommands::Config { key, value } => handle_config(&mut ctx, key, value),
            MiscCommands::Help { command } => handle_help(command),
        },
        None => handle_list(&mut ctx, None, false, FilterArgs::default()),
    }
}

fn init_context() -> Result<AppContext> {
    let ctx = initialize()?;
    debug!(data_dir = %ctx.data_dir.display(), "context ready");
    Ok(AppContext { api: ctx.api })
}

fn to_filter(args: FilterArgs) -> OpeningFilter {
    OpeningFilter {
        color: args.color,
        category: args.category,
        first_move: args.first_move,
    }
}

fn handle_add(
    ctx: &mut AppContext,
    name: String,
    moves: Vec<String>,
    playing_as: Color,
    category: Option<String>,
    force: bool,
) -> Result<()> {
    // Accept `1. e4 e5`, `e4,e5` and `e4 e5 +` alike
    let moves = clean_movetext(&moves.join(" ").replace(',', " "));
    let result = ctx.api.save_opening(SaveRequest {
        name,
        category,
        playing_as,
        moves,
        overwrite: force,
    })?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_list(
    ctx: &mut AppContext,
    search: Option<String>,
    due: bool,
    filter: FilterArgs,
) -> Result<()> {
    let result = ctx
        .api
        .list_openings(&to_filter(filter), search.as_deref(), due)?;
    print!("{}", render_opening_list(&result.listed_openings, Utc::now()));
    print_messages(&result.messages);
    Ok(())
}

fn handle_show(ctx: &mut AppContext, keys: Vec<String>) -> Result<()> {
    let result = ctx.api.view_openings(&keys)?;
    print!("{}", render_full_openings(&result.listed_openings));
    print_messages(&result.messages);
    Ok(())
}

fn handle_edit(
    ctx: &mut AppContext,
    key: String,
    name: Option<String>,
    category: Option<String>,
    playing_as: Option<Color>,
) -> Result<()> {
    let update = OpeningUpdate {
        name,
        category,
        playing_as,
    };
    let result = ctx.api.edit_opening(&key, update)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_delete(ctx: &mut AppContext, keys: Vec<String>) -> Result<()> {
    let result = ctx.api.delete_openings(&keys)?;
    print_messages(&result.messages);
    Ok(())
}

/// Replies are paced in real time only when a person is typing.
fn run_drill(ctx: &mut AppContext, mode: DrillMode, start: Advance) -> Result<()> {
    let pace = std::io::stdin().is_terminal();
    DrillLoop::new(&mut ctx.api, mode, std::io::stdout(), pace).run(start, std::io::stdin().lock())
}

fn handle_review(ctx: &mut AppContext) -> Result<()> {
    let start = ctx.api.enter_review()?;
    run_drill(ctx, DrillMode::Spaced, start)
}

fn handle_practice(ctx: &mut AppContext, filter: FilterArgs) -> Result<()> {
    let start = ctx.api.enter_practice(&to_filter(filter))?;
    run_drill(ctx, DrillMode::Practice, start)
}

fn handle_learn(ctx: &mut AppContext, key: String) -> Result<()> {
    let start = ctx.api.enter_learn(&key)?;
    run_drill(ctx, DrillMode::Learn, start)
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    Ok(std::fs::read_to_string(path)?)
}

fn handle_import_pgn(ctx: &mut AppContext, path: PathBuf) -> Result<()> {
    let text = read_input(&path)?;
    let result = ctx.api.import_pgn(&text)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_export(ctx: &mut AppContext, output: Option<PathBuf>, stdout: bool) -> Result<()> {
    let result = ctx.api.export_backup()?;
    let backup = result.backup.unwrap_or_default();

    if stdout {
        println!("{}", backup);
        return Ok(());
    }

    let path = output.unwrap_or_else(|| PathBuf::from(backup_file_name(Utc::now())));
    std::fs::write(&path, backup)?;
    print_messages(&result.messages);
    println!("Backup written to {}", path.display());
    Ok(())
}

fn handle_import(ctx: &mut AppContext, path: PathBuf) -> Result<()> {
    let content = read_input(&path)?;
    let result = ctx.api.import_backup(&content)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_migrate(ctx: &mut AppContext) -> Result<()> {
    let result = ctx.api.migrate()?;
    print_messages(&result.messages);
    Ok(())
}

/// Asks a yes/no question on stdout and reads the answer from `input`.
/// Anything but an explicit yes, including end of input, is a no.
fn confirm<R: BufRead, W: Write>(question: &str, input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "{} [y/N] ", question)?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn handle_reset_progress(ctx: &mut AppContext, yes: bool) -> Result<()> {
    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout();
    if !yes
        && !confirm(
            "Reset review progress for every opening?",
            &mut stdin,
            &mut stdout,
        )?
    {
        println!("Aborted.");
        return Ok(());
    }
    let result = ctx.api.reset_progress()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_wipe(ctx: &mut AppContext, yes: bool) -> Result<()> {
    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout();
    if !yes {
        let first = confirm(
            "Delete ALL openings and settings?",
            &mut stdin,
            &mut stdout,
        )?;
        if !first
            || !confirm(
                &"This cannot be undone. Really delete everything?"
                    .red()
                    .to_string(),
                &mut stdin,
                &mut stdout,
            )?
        {
            println!("Aborted.");
            return Ok(());
        }
    }
    let result = ctx.api.wipe()?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_facets(ctx: &mut AppContext) -> Result<()> {
    let result = ctx.api.facets()?;
    if let Some(facets) = &result.facets {
        print!("{}", render_facets(facets));
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_status(ctx: &mut AppContext) -> Result<()> {
    let result = ctx.api.status()?;
    if let Some(status) = &result.status {
        print!("{}", render_status(status));
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(ctx: &mut AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let result = ctx.api.config(action)?;
    let lines: Vec<String> = result
        .messages
        .iter()
        .map(|m| m.content.clone())
        .collect();
    print!("{}", render_text_list(&lines, "No configuration values."));
    Ok(())
}

fn handle_help(command: Option<String>) -> Result<()> {
    match command {
        Some(cmd) => print_help_for_command(&cmd),
        None => print_grouped_help(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn confirm_accepts_only_yes() {
        for (answer, expected) in [("y\n", true), ("YES\n", true), ("n\n", false), ("", false)] {
            let mut input = Cursor::new(answer.to_string());
            let mut out = Vec::new();
            assert_eq!(confirm("Sure?", &mut input, &mut out).unwrap(), expected, "{answer:?}");
            assert_eq!(String::from_utf8(out).unwrap(), "Sure? [y/N] ");
        }
    }

    #[test]
    fn filter_args_map_one_to_one() {
        let filter = to_filter(FilterArgs {
            color: Some(Color::Black),
            category: Some("Sicilian".into()),
            first_move: None,
        });
        assert_eq!(filter.color, Some(Color::Black));
        assert_eq!(filter.category.as_deref(), Some("Sicilian"));
        assert!(filter.first_move.is_none());
    }
}
