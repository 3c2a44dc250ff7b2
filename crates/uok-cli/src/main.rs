mod config;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, EnvFilter};

use uok_core::Checker;

use config::{AppConfig, Overrides};
use render::Presenter;

/// u ok? Probe a list of URLs and report the ones that are down.
///
/// With a notification token, failures not seen in the previous run are sent
/// to the notification endpoint.
#[derive(Parser)]
#[command(name = "uok", version, about)]
struct Cli {
    /// Notification token. Without it no notifications are sent.
    #[arg(short, long)]
    token: Option<String>,

    /// File with one URL per line [default: uok-urls].
    #[arg(short, long)]
    urls: Option<PathBuf>,

    /// Failure snapshot written after every run [default: .uok_state.bin].
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Notification endpoint; the token is appended as `?token=`.
    #[arg(long)]
    notify_url: Option<String>,

    /// Path to TOML config file. Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of URLs probed at once.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request timeout in milliseconds. Unset means no timeout.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Treat any status text containing "200" as healthy instead of requiring a 2xx code.
    #[arg(long, default_value_t = false)]
    lenient_status: bool,

    /// Log format on stderr: pretty or json.
    #[arg(long)]
    log_format: Option<String>,

    /// Print the run report as JSON instead of the colored listing.
    #[arg(long, default_value_t = false)]
    json: bool,

    #[arg(long, default_value_t = false)]
    no_banner: bool,

    #[arg(long, default_value_t = false)]
    no_color: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            token: self.token.clone(),
            urls: self.urls.clone(),
            state: self.state.clone(),
            notify_url: self.notify_url.clone(),
            concurrency: self.concurrency,
            request_timeout_ms: self.timeout_ms,
            lenient_status: self.lenient_status,
            log_format: self.log_format.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let app_config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => return fatal(&e),
    };

    init_tracing(&app_config.log.format);
    if let Some(ref path) = cli.config {
        tracing::debug!(path = %path.display(), "Loaded config file");
    }

    match run(&cli, app_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fatal(&e),
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig, config::ConfigError> {
    let file_config = match cli.config {
        Some(ref path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    file_config.merge(cli.overrides())
}

async fn run(cli: &Cli, app_config: AppConfig) -> Result<(), uok_core::RunError> {
    let check_config = app_config.to_check_config();
    let checker = Checker::from_config(check_config)?;
    let presenter = Presenter::new(!cli.no_color && console::colors_enabled());

    let urls = checker.targets()?;
    if urls.is_empty() {
        tracing::warn!(
            path = %checker.config().urls_path.display(),
            "URL list is empty, nothing to probe"
        );
    }

    let progress = if cli.json || !console::Term::stderr().is_term() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(urls.len() as u64).with_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")
                .expect("valid template"),
        )
    };

    let classification = checker
        .probe_and_classify(&urls, |result| {
            progress.set_message(result.url.clone());
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    if !cli.json {
        if !cli.no_banner {
            println!("{}", presenter.banner());
        }
        for line in presenter.report_lines(&classification) {
            println!("{}", line);
        }
        println!();
    }

    let settlement = checker.settle(&classification).await?;

    if cli.json {
        let report = uok_core::RunReport {
            classification,
            settlement,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!(error = %e, "Failed to serialize run report"),
        }
    } else {
        println!("{}", presenter.summary(&classification));
        if let Some(line) = presenter.notify_line(&settlement) {
            println!("{}", line);
            for failure in presenter.new_failure_lines(&settlement) {
                println!("{}", failure);
            }
        }
    }

    Ok(())
}

fn fatal(err: &dyn std::error::Error) -> ExitCode {
    eprintln!("{} {}", style("error:").red().bold(), err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  {} {}", style("caused by:").dim(), cause);
        source = cause.source();
    }
    ExitCode::FAILURE
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_format {
        "json" => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn token_flag_enables_notifications() {
        let cli = Cli::parse_from(["uok", "-t", "AbC", "--urls", "list.txt"]);
        let config = AppConfig::default().merge(cli.overrides()).unwrap();
        let check = config.to_check_config();
        assert_eq!(check.notify.unwrap().token, "AbC");
        assert_eq!(check.urls_path, PathBuf::from("list.txt"));
    }

    #[test]
    fn no_flags_is_report_only() {
        let cli = Cli::parse_from(["uok"]);
        let config = AppConfig::default().merge(cli.overrides()).unwrap();
        assert!(!config.to_check_config().notify_enabled());
    }

    #[test]
    fn lenient_flag_switches_policy() {
        let cli = Cli::parse_from(["uok", "--lenient-status", "--concurrency", "4"]);
        let check = AppConfig::default()
            .merge(cli.overrides())
            .unwrap()
            .to_check_config();
        assert_eq!(check.success_policy, uok_core::SuccessPolicy::Contains200);
        assert_eq!(check.concurrency, 4);
    }
}
