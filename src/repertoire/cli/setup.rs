use clap::{Args, CommandFactory, Parser, Subcommand};
use repertoire::model::Color;
use std::path::PathBuf;

/// Returns the version string, with the git hash appended for non-release builds.
/// Format: "0.3.2" for releases, "0.3.2@abc1234" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{}", VERSION, GIT_HASH)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "repertoire",
    bin_name = "repertoire",
    version = get_version(),
    disable_help_flag = true,
    disable_help_subcommand = true
)]
#[command(about = "Spaced-repetition trainer for your chess openings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose logging on stderr
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Print help
    #[arg(short, long, global = true)]
    pub help: bool,
}

/// Command group definitions for help output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Lines,
    Drill,
    Data,
    Misc,
}

impl CommandGroup {
    pub fn heading(&self) -> &'static str {
        match self {
            CommandGroup::Lines => "Line Commands:",
            CommandGroup::Drill => "Drill Commands:",
            CommandGroup::Data => "Data Commands:",
            CommandGroup::Misc => "Miscellaneous:",
        }
    }

    pub fn for_command(name: &str) -> Option<Self> {
        match name {
            "add" | "list" | "show" | "edit" | "delete" => Some(CommandGroup::Lines),
            "review" | "practice" | "learn" => Some(CommandGroup::Drill),
            "import-pgn" | "export" | "import" | "migrate" | "reset-progress" | "wipe" => {
                Some(CommandGroup::Data)
            }
            "facets" | "status" | "config" | "help" => Some(CommandGroup::Misc),
            _ => None,
        }
    }

    pub fn all() -> &'static [CommandGroup] {
        &[
            CommandGroup::Lines,
            CommandGroup::Drill,
            CommandGroup::Data,
            CommandGroup::Misc,
        ]
    }
}

pub fn get_grouped_help() -> String {
    let cmd = Cli::command();
    let version = cmd.get_version().unwrap_or("unknown");

    let mut output = String::new();
    output.push_str(&format!("repertoire {version}\n"));
    output.push_str("Spaced-repetition trainer for your chess openings\n");
    output.push('\n');
    output.push_str("Usage: repertoire [OPTIONS] [COMMAND]\n");

    let subcommands: Vec<_> = cmd.get_subcommands().collect();

    for group in CommandGroup::all() {
        let group_cmds: Vec<_> = subcommands
            .iter()
            .filter(|sc| {
                !sc.is_hide_set() && CommandGroup::for_command(sc.get_name()) == Some(*group)
            })
            .collect();

        if !group_cmds.is_empty() {
            output.push('\n');
            output.push_str(&format!("{}\n", group.heading()));
            for sc in group_cmds {
                let name = sc.get_name();
                let about = sc.get_about().map(|s| s.to_string()).unwrap_or_default();
                output.push_str(&format!("  {:<15} {}\n", name, about));
            }
        }
    }

    output.push('\n');
    output.push_str("Options:\n");
    output.push_str("  -v, --verbose    Verbose logging on stderr\n");
    output.push_str("  -h, --help       Print help\n");
    output.push_str("  -V, --version    Print version\n");

    output
}

pub fn print_grouped_help() {
    print!("{}", get_grouped_help());
}

/// Prints help for a specific subcommand using clap's built-in rendering
pub fn print_subcommand_help(command: &Option<Commands>) {
    match command {
        Some(command) => print_help_for_command(command.name()),
        None => print_grouped_help(),
    }
}

pub fn print_help_for_command(name: &str) {
    let mut cmd = Cli::command();

    for subcmd in cmd.get_subcommands_mut() {
        if subcmd.get_name() == name {
            print!("{}", subcmd.render_help());
            return;
        }
    }

    eprintln!("Unknown command: {}", name);
    eprintln!();
    print_grouped_help();
}

/// Narrowing options shared by `list` and `practice`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only lines played as this color (white or black)
    #[arg(long)]
    pub color: Option<Color>,

    /// Only lines in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Only lines starting with this move
    #[arg(long)]
    pub first_move: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Lines(LineCommands),

    #[command(flatten)]
    Drill(DrillCommands),

    #[command(flatten)]
    Data(DataCommands),

    #[command(flatten)]
    Misc(MiscCommands),
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Lines(c) => match c {
                LineCommands::Add { .. } => "add",
                LineCommands::List { .. } => "list",
                LineCommands::Show { .. } => "show",
                LineCommands::Edit { .. } => "edit",
                LineCommands::Delete { .. } => "delete",
            },
            Commands::Drill(c) => match c {
                DrillCommands::Review => "review",
                DrillCommands::Practice { .. } => "practice",
                DrillCommands::Learn { .. } => "learn",
            },
            Commands::Data(c) => match c {
                DataCommands::ImportPgn { .. } => "import-pgn",
                DataCommands::Export { .. } => "export",
                DataCommands::Import { .. } => "import",
                DataCommands::Migrate => "migrate",
                DataCommands::ResetProgress { .. } => "reset-progress",
                DataCommands::Wipe { .. } => "wipe",
            },
            Commands::Misc(c) => match c {
                MiscCommands::Facets => "facets",
                MiscCommands::Status => "status",
                MiscCommands::Config { .. } => "config",
                MiscCommands::Help { .. } => "help",
            },
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum LineCommands {
    /// Save a new line
    #[command(alias = "a", display_order = 1)]
    Add {
        /// Name of the variation
        name: String,

        /// Moves in SAN or coordinates, e.g. `e4 e5 Nf3` or `1. e4 e5 2. Nf3`
        #[arg(required = true, num_args = 1..)]
        moves: Vec<String>,

        /// Side you play in this line
        #[arg(long = "as", value_name = "COLOR", default_value = "white")]
        playing_as: Color,

        /// Category to group the line under
        #[arg(short, long)]
        category: Option<String>,

        /// Replace an existing line with the same name
        #[arg(long)]
        force: bool,
    },

    /// List saved lines
    #[command(alias = "ls", display_order = 2)]
    List {
        /// Case-insensitive search over name and category
        #[arg(short, long)]
        search: Option<String>,

        /// Only lines due for review
        #[arg(long)]
        due: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show one or more lines in full
    #[command(alias = "v", display_order = 3)]
    Show {
        #[arg(required = true, num_args = 1..)]
        keys: Vec<String>,
    },

    /// Rename, recategorize or change the side of a line
    #[command(alias = "e", display_order = 4)]
    Edit {
        key: String,

        #[arg(long)]
        name: Option<String>,

        /// New category (empty resets to Uncategorized)
        #[arg(short, long)]
        category: Option<String>,

        #[arg(long = "as", value_name = "COLOR")]
        playing_as: Option<Color>,
    },

    /// Delete one or more lines
    #[command(alias = "rm", display_order = 5)]
    Delete {
        #[arg(required = true, num_args = 1..)]
        keys: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DrillCommands {
    /// Review every line that is due
    #[command(alias = "r", display_order = 10)]
    Review,

    /// Drill lines in random order without scheduling
    #[command(alias = "p", display_order = 11)]
    Practice {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Step through one line with the answer shown on mistakes
    #[command(display_order = 12)]
    Learn { key: String },
}

#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Import games from a PGN file (`-` reads stdin)
    #[command(name = "import-pgn", display_order = 20)]
    ImportPgn { path: PathBuf },

    /// Export every line and setting as a JSON backup
    #[command(display_order = 21)]
    Export {
        /// File to write (defaults to a dated file in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the backup to stdout instead
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Restore a JSON backup, replacing every line
    #[command(display_order = 22)]
    Import { path: PathBuf },

    /// Backfill fields on lines saved by older versions
    #[command(display_order = 23)]
    Migrate,

    /// Forget all review history
    #[command(name = "reset-progress", display_order = 24)]
    ResetProgress {
        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Delete every line and setting
    #[command(display_order = 25)]
    Wipe {
        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum MiscCommands {
    /// Show the categories, first moves and colors in use
    #[command(display_order = 30)]
    Facets,

    /// Show how many lines are due and how full storage is
    #[command(display_order = 31)]
    Status,

    /// Get or set board preferences
    #[command(display_order = 32)]
    Config {
        /// Configuration key (boardTheme, darkMode, clickToMove)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },

    /// Print help for repertoire or a subcommand
    #[command(display_order = 33)]
    Help { command: Option<String> },
}
