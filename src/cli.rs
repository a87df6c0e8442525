//! `drive-i18n` command line.

use std::io::Write;
use std::path::{
    Path,
    PathBuf,
};

use clap::{
    Args,
    Parser,
    Subcommand,
    ValueEnum,
};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

use crate::builtin;
use crate::catalog::{
    Catalog,
    LookupError,
};
use crate::check::{
    self,
    Report,
};
use crate::config::{
    ConfigError,
    ConfigManager,
    I18nSettings,
    Severity,
};
use crate::indexer::{
    IndexerError,
    LoadFailure,
    WorkspaceIndexer,
};
use crate::input::error::ResourceError;
use crate::key::is_child_key;
use crate::template::Args as TemplateArgs;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Indexer(#[from] IndexerError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("check failed with {errors} error(s)")]
    CheckFailed { errors: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => 2,
            Self::Lookup(_) => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "drive-i18n",
    about = "Check and query the locale resources of the drive web UI",
    version
)]
pub struct Cli {
    /// Also write logs to daily files in this directory.
    #[arg(long = "log-dir", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check every locale against the reference locale.
    Check(CheckArgs),

    /// Print the string for a key.
    Get(GetArgs),

    /// List leaf keys of a locale.
    Keys(KeysArgs),

    /// Print a locale resource as JSON or as a JS module.
    Export(ExportArgs),
}

/// Where locale resources come from.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Workspace to scan for locale files. The embedded locales are used when omitted.
    #[arg(long, short = 'w')]
    pub workspace: Option<PathBuf>,

    /// Settings file to use instead of `<workspace>/.drive-i18n.json`.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct GetArgs {
    pub key: String,

    /// Locale to look up. Defaults to the reference locale.
    #[arg(long, short = 'l')]
    pub locale: Option<String>,

    /// Placeholder value as `name=value`. May be repeated.
    #[arg(long = "arg", short = 'a', value_name = "NAME=VALUE")]
    pub args: Vec<String>,

    /// Fail on missing keys and on placeholders without a value.
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Clone, Args)]
pub struct KeysArgs {
    /// Locale to list. Defaults to the reference locale.
    #[arg(long, short = 'l')]
    pub locale: Option<String>,

    /// Only keys at or below this path.
    #[arg(long)]
    pub prefix: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Js,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    pub locale: String,

    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    pub format: ExportFormat,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Installs the global tracing subscriber.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `info`). With `log_dir`
/// they also go to a daily-rotated file; keep the returned guard alive until
/// exit so buffered lines are flushed.
#[must_use]
pub fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (subscriber, guard) = build_subscriber(log_dir);
    subscriber.init();
    guard
}

fn build_subscriber(
    log_dir: Option<&Path>,
) -> (impl tracing::Subscriber + Send + Sync + 'static, Option<WorkerGuard>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "drive-i18n.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer);
    (subscriber, guard)
}

/// Runs a parsed command, writing its output to `out`.
///
/// # Errors
/// Returns a [`CliError`]; its [`CliError::exit_code`] is the process exit status.
pub async fn run(cli: Cli, out: &mut impl Write) -> Result<(), CliError> {
    match cli.command {
        Commands::Check(args) => run_check(&args, out).await,
        Commands::Get(args) => run_get(&args, out).await,
        Commands::Keys(args) => run_keys(&args, out).await,
        Commands::Export(args) => run_export(&args, out).await,
    }
}

/// Resources and settings a command works on.
struct Loaded {
    catalog: Catalog,
    settings: I18nSettings,
    failures: Vec<LoadFailure>,
}

async fn load(source: &SourceArgs) -> Result<Loaded, CliError> {
    let mut config_manager = ConfigManager::new();
    match (&source.config, &source.workspace) {
        (Some(config), workspace) => {
            config_manager.load_settings_from_file(config, workspace.clone())?;
        }
        (None, Some(workspace)) => config_manager.load_settings(Some(workspace.clone()))?,
        (None, None) => {
            let settings = I18nSettings {
                reference_locale: builtin::REFERENCE_LOCALE.to_string(),
                ..I18nSettings::default()
            };
            config_manager.update_settings(settings)?;
        }
    }

    let Some(workspace) = &source.workspace else {
        let settings = config_manager.get_settings().clone();
        let catalog = builtin::try_catalog_with_settings(&settings)?;
        return Ok(Loaded { catalog, settings, failures: Vec::new() });
    };

    let index = WorkspaceIndexer::new()
        .index_workspace(workspace, &config_manager, None::<fn(u32, u32)>)
        .await?;
    tracing::info!(
        files = index.loaded.len(),
        failures = index.failures.len(),
        "Loaded locale files from {}",
        workspace.display()
    );

    Ok(Loaded {
        catalog: index.catalog,
        settings: config_manager.get_settings().clone(),
        failures: index.failures,
    })
}

fn locale_or_reference<'a>(locale: Option<&'a str>, settings: &'a I18nSettings) -> &'a str {
    locale.unwrap_or(&settings.reference_locale)
}

fn parse_template_args(raw: &[String]) -> Result<TemplateArgs, CliError> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=').filter(|(name, _)| !name.is_empty()).ok_or_else(|| {
                CliError::InvalidArgument { message: format!("expected NAME=VALUE, got '{pair}'") }
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|pairs| pairs.into_iter().collect())
}

async fn run_check(args: &CheckArgs, out: &mut impl Write) -> Result<(), CliError> {
    let loaded = load(&args.source).await?;
    let report = check::run(&loaded.catalog, &loaded.settings)?;
    let errors = report.count(Severity::Error) + loaded.failures.len();

    if args.json {
        let failures: Vec<_> = loaded
            .failures
            .iter()
            .map(|f| serde_json::json!({ "path": f.path, "error": f.error.to_string() }))
            .collect();
        let value = serde_json::json!({ "report": report, "failures": failures });
        serde_json::to_writer_pretty(&mut *out, &value)?;
        writeln!(out)?;
    } else {
        write_report(&report, &loaded.failures, out)?;
    }

    if errors > 0 {
        return Err(CliError::CheckFailed { errors });
    }
    Ok(())
}

fn write_report(report: &Report, failures: &[LoadFailure], out: &mut impl Write) -> Result<(), CliError> {
    for failure in failures {
        writeln!(out, "error[load] {}: {}", failure.path.display(), failure.error)?;
    }
    for diagnostic in &report.diagnostics {
        writeln!(out, "{diagnostic}")?;
    }
    writeln!(
        out,
        "checked {} locale(s) against {}: {} error(s), {} warning(s), {} info",
        report.locales.len(),
        report.reference_locale,
        report.count(Severity::Error) + failures.len(),
        report.count(Severity::Warning),
        report.count(Severity::Info),
    )?;
    Ok(())
}

async fn run_get(args: &GetArgs, out: &mut impl Write) -> Result<(), CliError> {
    let loaded = load(&args.source).await?;
    let locale = locale_or_reference(args.locale.as_deref(), &loaded.settings);
    let template_args = parse_template_args(&args.args)?;

    let value = if args.strict {
        loaded.catalog.translate(locale, &args.key, &template_args)?
    } else {
        loaded.catalog.lookup(locale, &args.key, &template_args)?
    };
    writeln!(out, "{value}")?;
    Ok(())
}

async fn run_keys(args: &KeysArgs, out: &mut impl Write) -> Result<(), CliError> {
    let loaded = load(&args.source).await?;
    let locale = locale_or_reference(args.locale.as_deref(), &loaded.settings);
    let resource = loaded
        .catalog
        .resource(locale)
        .ok_or_else(|| LookupError::UnknownLocale { locale: locale.to_string() })?;
    let separator = loaded.catalog.separator();

    for key in resource.key_paths(separator) {
        let selected = args
            .prefix
            .as_deref()
            .is_none_or(|prefix| key == prefix || is_child_key(&key, prefix, separator));
        if selected {
            writeln!(out, "{key}")?;
        }
    }
    Ok(())
}

async fn run_export(args: &ExportArgs, out: &mut impl Write) -> Result<(), CliError> {
    let loaded = load(&args.source).await?;
    let resource = loaded
        .catalog
        .resource(&args.locale)
        .ok_or_else(|| LookupError::UnknownLocale { locale: args.locale.clone() })?;

    let text = match args.format {
        ExportFormat::Json => resource.to_json_string()?,
        ExportFormat::Js => resource.to_js_module(),
    };
    out.write_all(text.as_bytes())?;
    Ok(())
}
