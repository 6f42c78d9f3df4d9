use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};

use file_batch::fs_op::{
    rename_extensions_with, resolve_root, rewrite_text_when_with, BatchReport, Rewrite,
    TraversalMode, WalkOptions, WriteBack,
};
use file_batch::logging::{init_logging, level_for};
use file_batch::os_util::{create_shortcut, executable_path, UrlShortcut};
use file_batch::settings::{default_settings_path, load_settings, save_settings, Settings};

/// Exit code when the batch ran but some entries failed.
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser)]
#[command(name = "filebatch", version, about = "Batch rename and rewrite files in a directory tree")]
struct Cli {
    /// Settings file to use instead of the per-user default
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Also append logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
    /// Print batch reports as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Change the extension of every matching file
    RenameExt(RenameExtArgs),
    /// Replace literal text in every file that contains it
    Replace(ReplaceArgs),
    /// Print the path of this executable
    ExePath,
    /// Write a Windows .url shortcut
    Shortcut(ShortcutArgs),
    /// Show or create the settings file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct WalkArgs {
    /// Descend into subdirectories
    #[arg(short, long, overrides_with = "no_recursive")]
    recursive: bool,
    /// Stay in the root directory even if the settings say otherwise
    #[arg(long, overrides_with = "recursive")]
    no_recursive: bool,
    /// Follow symlinked directories
    #[arg(long)]
    follow_links: bool,
}

impl WalkArgs {
    /// Layer the command-line flags over options taken from the settings.
    fn apply(&self, options: &mut WalkOptions) {
        if self.recursive {
            options.mode = TraversalMode::Recursive;
        } else if self.no_recursive {
            options.mode = TraversalMode::Shallow;
        }
        options.follow_links |= self.follow_links;
    }
}

#[derive(Args)]
struct RenameExtArgs {
    root: String,
    /// Extension to match, with its dot (e.g. `.txt`)
    from: String,
    /// New extension with its dot; an empty string strips the extension
    to: String,
    #[command(flatten)]
    walk: WalkArgs,
}

#[derive(Args)]
struct ReplaceArgs {
    root: String,
    #[arg(long, value_name = "TEXT")]
    find: String,
    #[arg(long = "with", value_name = "TEXT")]
    replacement: String,
    #[command(flatten)]
    walk: WalkArgs,
    /// Write through a temp file and rename instead of truncating
    #[arg(long)]
    atomic: bool,
    /// Skip files larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    max_size: Option<u64>,
}

#[derive(Args)]
struct ShortcutArgs {
    dest: PathBuf,
    #[arg(long)]
    url: String,
    #[arg(long, default_value = "")]
    icon: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    notes: String,
    /// Star rating, 1 to 5
    #[arg(long, default_value_t = 1)]
    rating: u32,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings
    Show,
    /// Write a settings file with the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = load_settings(cli.config.as_deref()).context("loading settings")?;
    let level = level_for(cli.verbose, settings.log_level.as_deref());
    let _guard = init_logging(&level, cli.log_file.as_deref()).context("opening log file")?;

    match cli.command {
        Commands::RenameExt(args) => {
            let root = root_arg(&args.root)?;
            let mut options = settings.walk_options();
            args.walk.apply(&mut options);
            let report = rename_extensions_with(&root, &args.from, &args.to, &options)
                .with_context(|| format!("renaming {} files under {}", args.from, root.display()))?;
            emit_report(&report, cli.json)
        }
        Commands::Replace(args) => {
            if args.find.is_empty() {
                bail!("--find must not be empty");
            }
            let root = root_arg(&args.root)?;
            let mut options = settings.rewrite_options();
            args.walk.apply(&mut options.walk);
            if args.atomic {
                options.write_back = WriteBack::Atomic;
            }
            options.max_file_size = args.max_size.or(settings.max_file_size);

            let report = rewrite_text_when_with(&root, &options, |_, text| {
                if text.contains(&args.find) {
                    Rewrite::Changed(text.replace(&args.find, &args.replacement))
                } else {
                    Rewrite::NoChange
                }
            })
            .with_context(|| format!("rewriting files under {}", root.display()))?;
            emit_report(&report, cli.json)
        }
        Commands::ExePath => {
            println!("{}", executable_path()?.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Shortcut(args) => {
            let shortcut = UrlShortcut {
                url: args.url,
                icon_path: args.icon,
                description: args.description,
                notes: args.notes,
                rating: args.rating,
            };
            create_shortcut(&args.dest, &shortcut)
                .with_context(|| format!("creating {}", args.dest.display()))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(ConfigCommand::Show) => {
            print!("{}", toml::to_string_pretty(&settings)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(ConfigCommand::Init { force }) => {
            let path = match cli.config {
                Some(path) => path,
                None => default_settings_path()?,
            };
            init_settings(&path, force)?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn root_arg(input: &str) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    Ok(resolve_root(input, &cwd)?)
}

fn init_settings(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    save_settings(path, &Settings::default())?;
    Ok(())
}

fn emit_report(report: &BatchReport, json: bool) -> Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report}");
        for failure in &report.failures {
            eprintln!("  {}: {}", failure.path.display(), failure.message);
        }
    }
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_PARTIAL)
    })
}
