//! mdbridge CLI - format Markdown with mdformat from any Python environment

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mdbridge_core::config::{KEY_END_OF_LINE, KEY_EXTRA_ARGS, KEY_NO_VALIDATE, KEY_WRAP};
use mdbridge_core::tui::{CheckArgs, CliclackSink};
use mdbridge_core::{
    ConfigSource, ConsoleSink, ContextHint, DocumentSurface, EndOfLine, FormatError,
    FormatOrchestrator, NotificationSink, RuntimeResolver, StringDocument, ToolConfig,
    ToolInvoker, VirtualEnvSource, WrapMode, YamlConfig,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Exit code used when the user interrupts a run
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "mdbridge")]
#[command(about = "Format Markdown with mdformat from any Python environment")]
#[command(version)]
pub struct Args {
    /// Settings file (defaults to .mdbridge.yaml in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Python interpreter to use (overrides settings and MDBRIDGE_PYTHON)
    #[arg(long, global = true)]
    pub python: Option<String>,

    /// Print debug logs (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Format a Markdown file, or stdin when no file is given
    Format(FormatArgs),
    /// Locate Python and verify that mdformat is installed
    Check(CliCheckArgs),
}

#[derive(Parser, Debug)]
pub struct FormatArgs {
    /// Markdown file to format ("-" or omitted reads stdin)
    pub file: Option<PathBuf>,

    /// Write the result back to the file instead of stdout
    #[arg(short, long)]
    pub write: bool,

    /// Exit with status 1 if the file would change; write nothing
    #[arg(long, conflicts_with = "write")]
    pub check: bool,

    /// Paragraph wrapping: keep, no, or a line width
    #[arg(long)]
    pub wrap: Option<WrapMode>,

    /// Line endings: keep, lf, or crlf
    #[arg(long = "end-of-line")]
    pub end_of_line: Option<EndOfLine>,

    /// Skip mdformat's check that the rendered HTML is unchanged
    #[arg(long = "no-validate")]
    pub no_validate: bool,

    /// Extra arguments passed to mdformat before the stdin marker
    #[arg(last = true)]
    pub extra: Vec<String>,
}

impl FormatArgs {
    /// File path, unless input comes from stdin
    fn path(&self) -> Option<&Path> {
        self.file.as_deref().filter(|p| p.as_os_str() != "-")
    }
}

#[derive(Parser, Debug)]
pub struct CliCheckArgs {
    /// Never prompt; report and exit (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CliCheckArgs> for CheckArgs {
    fn from(args: CliCheckArgs) -> Self {
        CheckArgs { yes: args.yes }
    }
}

/// Layer command-line format flags over the loaded settings
fn apply_format_overrides(config: &mut YamlConfig, args: &FormatArgs) {
    if let Some(wrap) = args.wrap {
        config.set(KEY_WRAP, wrap.as_arg());
    }
    if let Some(end_of_line) = args.end_of_line {
        config.set(KEY_END_OF_LINE, end_of_line.as_str());
    }
    if args.no_validate {
        config.set(KEY_NO_VALIDATE, true);
    }
    if !args.extra.is_empty() {
        let extra = args
            .extra
            .iter()
            .cloned()
            .map(serde_yaml::Value::String)
            .collect();
        config.set(KEY_EXTRA_ARGS, serde_yaml::Value::Sequence(extra));
    }
}

fn build_orchestrator(config: YamlConfig, notifier: Arc<dyn NotificationSink>) -> FormatOrchestrator {
    let config: Arc<dyn ConfigSource> = Arc::new(config);
    let tool = ToolConfig::default();
    let resolver = RuntimeResolver::new(config.clone(), &tool)
        .with_plugin(Arc::new(VirtualEnvSource::from_env()));
    FormatOrchestrator::with_parts(tool, config, resolver, Arc::new(ToolInvoker::new()), notifier)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

async fn run_format(
    mut config: YamlConfig,
    args: FormatArgs,
    cancel: &CancellationToken,
) -> Result<ExitCode> {
    if args.write && args.path().is_none() {
        anyhow::bail!("--write needs a file path");
    }

    apply_format_overrides(&mut config, &args);
    let orchestrator = build_orchestrator(config, Arc::new(ConsoleSink));

    let path = args.path();
    let input = read_input(path).await?;
    let hint = path.map(ContextHint::for_path).unwrap_or_default();
    let display_name = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());

    let mut document = StringDocument::new(input);
    let changed = match orchestrator
        .format_document(&mut document, &hint, cancel)
        .await
    {
        Ok(changed) => changed,
        Err(FormatError::Cancelled) => return Ok(ExitCode::from(EXIT_INTERRUPTED)),
        // Already reported by the orchestrator
        Err(_) => return Ok(ExitCode::FAILURE),
    };

    if args.check {
        if changed {
            eprintln!("would reformat {}", display_name);
            return Ok(ExitCode::FAILURE);
        }
        return Ok(ExitCode::SUCCESS);
    }

    if args.write {
        if let Some(path) = path.filter(|_| changed) {
            tokio::fs::write(path, document.text())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("reformatted {}", display_name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(document.into_text().as_bytes())
        .await
        .context("Failed to write stdout")?;
    stdout.flush().await?;
    Ok(ExitCode::SUCCESS)
}

async fn run_check(config: YamlConfig, args: CliCheckArgs) -> Result<ExitCode> {
    let orchestrator = build_orchestrator(config, Arc::new(CliclackSink));
    let result = mdbridge_core::run_check(&orchestrator, &ContextHint::default(), args.into()).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result.map(|_| ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // First Ctrl+C cancels the running request; a second one exits
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        if handler_token.is_cancelled() {
            std::process::exit(EXIT_INTERRUPTED as i32);
        }
        handler_token.cancel();
    })
    .ok();

    let config = YamlConfig::load(args.config.as_deref())?.with_python_override(args.python);
    log::debug!("Running {:?}", args.command);

    match args.command {
        Command::Format(format_args) => run_format(config, format_args, &cancel).await,
        Command::Check(check_args) => run_check(config, check_args).await,
    }
}
