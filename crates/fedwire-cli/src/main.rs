use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fedwire_core::{
    DispatchError, DispatchResult, KeyStore, LocalUser, Payload, ProtocolError, ReceiveContext,
    default_registry, handle_receive, identify_payload,
};
use glob::glob;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FEDWIRE_LOG";
const STDIN_INPUT: &str = "-";
const EXAMPLES: &str = "Examples:\n  fedwire payload receive message.json --keys keys.json -o result.json\n  fedwire payload receive - --stdout --skip-author-verification < message.txt\n  fedwire payload identify message.json\n  fedwire protocols";

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FEDWIRE_BUILD_COMMIT"),
    " ",
    env!("FEDWIRE_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "fedwire")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Identify and dispatch inbound federated messaging payloads.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Log dispatch events to stderr (overrides FEDWIRE_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on a single inbound payload.
    Payload {
        #[command(subcommand)]
        command: PayloadCommands,
    },
    /// List registered protocols in identification order.
    Protocols,
}

#[derive(Subcommand, Debug)]
enum PayloadCommands {
    /// Dispatch a payload and write the result as JSON.
    #[command(after_help = EXAMPLES)]
    Receive {
        /// Payload file, glob matching one file, or '-' for stdin
        input: PathBuf,

        /// Output result path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write JSON result to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Local user handle the payload may be addressed to
        #[arg(long, value_name = "HANDLE")]
        user: Option<String>,

        /// JSON file mapping sender handles to hex public keys
        #[arg(long, value_name = "FILE")]
        keys: Option<PathBuf>,

        /// Accept payloads without checking the author's signature
        #[arg(long)]
        skip_author_verification: bool,
    },
    /// Print the protocol that claims a payload.
    Identify {
        /// Payload file, glob matching one file, or '-' for stdin
        input: PathBuf,
    },
}

struct ReceiveArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
    user: Option<String>,
    keys: Option<PathBuf>,
    skip_author_verification: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Payload { command } => match command {
            PayloadCommands::Receive {
                input,
                output,
                stdout,
                pretty,
                compact,
                quiet,
                user,
                keys,
                skip_author_verification,
            } => cmd_payload_receive(ReceiveArgs {
                input,
                output,
                stdout,
                pretty,
                compact,
                quiet,
                user,
                keys,
                skip_author_verification,
            }),
            PayloadCommands::Identify { input } => cmd_payload_identify(input),
        },
        Commands::Protocols => cmd_protocols(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

impl From<DispatchError> for CliError {
    fn from(err: DispatchError) -> Self {
        let hint = match &err {
            DispatchError::NoSuitableProtocolFound => Some(registered_hint()),
            DispatchError::Protocol(ProtocolError::MissingRecipient) => {
                Some("pass --user with the local recipient handle".to_string())
            }
            DispatchError::Protocol(ProtocolError::SenderKeyNotFound { .. }) => Some(
                "pass --keys with the sender's public key, or --skip-author-verification"
                    .to_string(),
            ),
            DispatchError::Protocol(ProtocolError::VerificationFailed { .. }) => {
                Some("check the sender key in the --keys file".to_string())
            }
            _ => None,
        };
        CliError::new(err.to_string(), hint)
    }
}

fn registered_hint() -> String {
    let ids: Vec<&str> = default_registry()
        .ids()
        .into_iter()
        .map(|id| id.as_str())
        .collect();
    format!("registered protocols: {}", ids.join(", "))
}

fn cmd_payload_receive(args: ReceiveArgs) -> Result<(), CliError> {
    let output = if args.stdout {
        None
    } else {
        Some(args.output.clone().ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--output or --stdout".to_string()),
            )
        })?)
    };

    let resolved_input = resolve_input_path(&args.input)?;
    if let (Some(input), Some(output)) = (resolved_input.as_ref(), output.as_ref()) {
        ensure_distinct_paths(input, output)?;
    }
    let payload = read_payload(resolved_input.as_deref())?;

    let keys = args
        .keys
        .as_ref()
        .map(|path| {
            KeyStore::load(path).map_err(|err| {
                CliError::new(
                    format!("failed to load key store {}: {}", path.display(), err),
                    Some("expected a JSON object of handle -> hex public key".to_string()),
                )
            })
        })
        .transpose()?;
    let user = args.user.map(LocalUser::new);

    let mut context =
        ReceiveContext::new().with_author_verification_skipped(args.skip_author_verification);
    if let Some(user) = user.as_ref() {
        context = context.with_user(user);
    }
    if let Some(keys) = keys.as_ref() {
        debug!(keys = keys.len(), "sender key store loaded");
        context = context.with_sender_key_fetcher(keys);
    }

    let result = handle_receive(&payload, &context)?;
    let json = serialize_result(&result, args.pretty, args.compact)?;

    let Some(output) = output else {
        println!("{}", json);
        return Ok(());
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&output, json)
        .with_context(|| format!("Failed to write result: {}", output.display()))?;

    if !args.quiet {
        eprintln!(
            "OK: {} payload from {} ({} entities) -> {}",
            result.protocol,
            result.sender,
            result.entities.len(),
            output.display()
        );
    }
    Ok(())
}

fn cmd_payload_identify(input: PathBuf) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    let payload = read_payload(resolved_input.as_deref())?;
    let protocol = identify_payload(&payload).ok_or_else(|| {
        CliError::new(
            DispatchError::NoSuitableProtocolFound.to_string(),
            Some(registered_hint()),
        )
    })?;
    println!("{}", protocol);
    Ok(())
}

fn cmd_protocols() -> Result<(), CliError> {
    for id in default_registry().ids() {
        println!("{}", id);
    }
    Ok(())
}

fn serialize_result(
    result: &DispatchResult,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(result)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(result)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

/// `None` means stdin.
fn read_payload(input: Option<&Path>) -> Result<Payload, CliError> {
    let Some(input) = input else {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read payload from stdin")?;
        return Ok(Payload::from(bytes));
    };

    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a payload file, or '-' to read stdin".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a payload file, or '-' to read stdin".to_string()),
        ));
    }
    let bytes = fs::read(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    Ok(Payload::from(bytes))
}

fn ensure_distinct_paths(input: &Path, output: &Path) -> Result<(), CliError> {
    let Ok(input_abs) = fs::canonicalize(input) else {
        return Ok(());
    };
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let (Ok(output_dir), Some(file_name)) = (fs::canonicalize(parent), output.file_name()) else {
        return Ok(());
    };
    if output_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

/// Resolve `input` to a single file path, or `None` for stdin.
fn resolve_input_path(input: &Path) -> Result<Option<PathBuf>, CliError> {
    let pattern = input.to_string_lossy();
    if pattern == STDIN_INPUT {
        return Ok(None);
    }
    if !is_glob_pattern(&pattern) {
        return Ok(Some(input.to_path_buf()));
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches)",
            pattern,
            matches.len()
        );
        let listed: Vec<String> = matches
            .iter()
            .take(3)
            .map(|path| path.display().to_string())
            .collect();
        message.push_str("; matches: ");
        message.push_str(&listed.join(", "));
        if matches.len() > 3 {
            message.push_str(", ...");
        }
        return Err(CliError::new(
            message,
            Some("pass a single payload file, or run once per file".to_string()),
        ));
    }

    Ok(matches.pop())
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
