use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use command::{
    BuildPayload, CommandHandler, CommandRequest, NavigatePayload, OptionEntry, SuggestPayload,
};
use drilldown_protocol::{serialize_json, PageRequest};
use drilldown_tree::{Path, TreeBuilder, TreeProfile, TreeSource};
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path as FsPath, PathBuf};

mod command;

const PROFILE_ENV: &str = "DRILLDOWN_PROFILE";

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "drilldown")]
#[command(about = "Drill-down trees, chart series and autocomplete ranking", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Tree profile: builtin name (default, grievances) or path to a JSON profile
    #[arg(long, global = true)]
    profile: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a JSON Command API request
    Command(CommandArgs),

    /// Build a tree from a backend response and print it
    Build(TreeArgs),

    /// Build a tree, descend along a path and print breadcrumbs + series
    Navigate(NavigateArgs),

    /// Rank an option list against a query
    Suggest(SuggestArgs),
}

#[derive(Args)]
struct CommandArgs {
    /// Inline JSON payload (mutually exclusive with --file)
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to file containing JSON payload
    #[arg(long)]
    file: Option<PathBuf>,

    /// Pretty-print JSON response
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputMode {
    Nested,
    Flat,
}

#[derive(Args)]
struct TreeArgs {
    /// Backend response (JSON file)
    #[arg(long)]
    input: PathBuf,

    /// Payload shape
    #[arg(long, value_enum, default_value = "flat")]
    mode: InputMode,

    /// Root title for nested payloads
    #[arg(long, default_value = "All")]
    root_title: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct NavigateArgs {
    #[command(flatten)]
    tree: TreeArgs,

    /// Dot-joined child indices, e.g. `1.0`
    #[arg(long, default_value = "")]
    path: String,

    /// Include this page of record ids for the selected node
    #[arg(long)]
    page: Option<usize>,

    #[arg(long, default_value_t = drilldown_protocol::DEFAULT_PAGE_SIZE)]
    page_size: usize,
}

#[derive(Args)]
struct SuggestArgs {
    /// JSON array of strings or `{text, value}` objects
    #[arg(long)]
    options: PathBuf,

    /// Free-text query
    #[arg(long)]
    query: String,

    /// Keep only the first N suggestions
    #[arg(long)]
    limit: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

pub fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // stdout carries JSON for the command API; keep stderr quiet too.
    if matches!(cli.command, Commands::Command(_)) {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let profile_name = cli
        .profile
        .clone()
        .or_else(|| env::var(PROFILE_ENV).ok())
        .unwrap_or_else(|| "default".to_string());

    match cli.command {
        Commands::Command(args) => run_command(args, &profile_name),
        Commands::Build(args) => run_build(args, load_profile(&profile_name)?),
        Commands::Navigate(args) => run_navigate(args, load_profile(&profile_name)?),
        Commands::Suggest(args) => run_suggest(args),
    }
}

fn load_profile(name: &str) -> Result<TreeProfile> {
    TreeProfile::resolve(name).with_context(|| format!("Failed to load profile '{name}'"))
}

fn run_command(args: CommandArgs, profile_name: &str) -> Result<()> {
    let profile = match load_profile(profile_name) {
        Ok(profile) => profile,
        Err(err) => {
            let envelope = drilldown_protocol::ErrorEnvelope {
                code: drilldown_protocol::ErrorCode::InvalidProfile,
                message: format!("{err:#}"),
                hint: Some(format!("Set --profile or {PROFILE_ENV} to a valid profile.")),
            };
            let response = command::CommandResponse::error(envelope, Default::default());
            print_stdout(&serialize_json(&response)?)?;
            std::process::exit(1);
        }
    };

    let raw = read_payload(&args)?;
    let request: CommandRequest =
        serde_json::from_str(&raw).context("Invalid JSON passed to --json/--file")?;

    let response = CommandHandler::new(profile).execute(request);

    let output = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serialize_json(&response)?
    };
    print_stdout(&output)?;

    if response.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn read_payload(args: &CommandArgs) -> Result<String> {
    if let Some(raw) = &args.json {
        return Ok(raw.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON from {}", path.display()));
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read JSON from stdin")?;

    if buffer.trim().is_empty() {
        anyhow::bail!("Command request is empty. Provide --json, --file, or pipe JSON via stdin.");
    }

    Ok(buffer)
}

fn read_json(path: &FsPath) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn tree_source(args: &TreeArgs) -> Result<TreeSource> {
    let data = read_json(&args.input)?;
    Ok(match args.mode {
        InputMode::Nested => TreeSource::Nested {
            root_title: args.root_title.clone(),
            data,
        },
        InputMode::Flat => TreeSource::Flat { data },
    })
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serialize_json(value)?
    };
    print_stdout(&output)
}

fn run_build(args: TreeArgs, profile: TreeProfile) -> Result<()> {
    let payload = BuildPayload {
        source: tree_source(&args)?,
    };
    let output = command::build(&TreeBuilder::new(profile), payload)?;
    emit(&output, args.pretty)
}

fn run_navigate(args: NavigateArgs, profile: TreeProfile) -> Result<()> {
    let path: Path = args
        .path
        .parse()
        .with_context(|| format!("Invalid --path '{}'", args.path))?;
    let payload = NavigatePayload {
        source: tree_source(&args.tree)?,
        path,
        ops: Vec::new(),
        records: args.page.map(|page| PageRequest {
            page,
            page_size: args.page_size,
        }),
    };
    let output = command::navigate(&TreeBuilder::new(profile), payload)?;
    emit(&output, args.tree.pretty)
}

fn run_suggest(args: SuggestArgs) -> Result<()> {
    let options: Vec<OptionEntry> = serde_json::from_value(read_json(&args.options)?)
        .context("Options must be a JSON array of strings or {text, value} objects")?;
    let payload = SuggestPayload {
        options,
        query: Value::String(args.query),
        previous: Vec::new(),
        limit: args.limit,
    };
    emit(&command::suggest(payload), args.pretty)
}
