mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use console::style;
use tracing_subscriber::{fmt, EnvFilter};

use health_core::{
    CancellationToken, HttpProber, JsonSink, LineSink, Monitor, MonitorConfig, ReportSink,
};

use crate::config::{AppConfig, LogFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// HTTP endpoint health checker: probe endpoints and report per-domain availability.
#[derive(Parser)]
#[command(name = "health-check", version, about)]
struct Cli {
    /// Path to the YAML (or .toml) endpoint config file.
    config: PathBuf,

    /// Seconds between cycles. Overrides config file.
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Per-request transport timeout in milliseconds. Overrides config file.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Responses must arrive strictly faster than this to count as UP. Overrides config file.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    latency_ms: Option<u64>,

    /// Stop after this many cycles instead of running until interrupted.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    cycles: Option<u64>,

    /// Report format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Log format written to stderr. Overrides config file.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn monitor_config(&self, app_config: &AppConfig) -> MonitorConfig {
        let mut c = app_config.monitor.to_monitor_config();
        if let Some(secs) = self.interval_secs {
            c = c.with_interval_secs(secs);
        }
        if let Some(ms) = self.timeout_ms {
            c = c.with_request_timeout_ms(ms);
        }
        if let Some(ms) = self.latency_ms {
            c = c.with_latency_threshold_ms(ms);
        }
        if let Some(n) = self.cycles {
            c = c.with_max_cycles(n);
        }
        c
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app_config = match AppConfig::load(&cli.config) {
        Ok(c) => {
            init_tracing(cli.log_format.unwrap_or(c.logging.format));
            tracing::info!(path = %cli.config.display(), "Loaded config file");
            c
        }
        Err(e) => {
            init_tracing(cli.log_format.unwrap_or_default());
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let config = cli.monitor_config(&app_config);
    let prober = Arc::new(HttpProber::from_config(&config));
    let endpoint_count = app_config.endpoint.len();

    let mut monitor = match Monitor::new(app_config.endpoint, config.clone(), prober) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    eprintln!(
        "{} {}",
        style("health-check").bold().for_stderr(),
        style(env!("CARGO_PKG_VERSION")).dim().for_stderr()
    );
    eprintln!(
        "Monitoring {} endpoints in an interval of {} seconds... {}",
        style(endpoint_count).bold().for_stderr(),
        config.interval.as_secs(),
        style("Press Ctrl+C to stop.").dim().for_stderr()
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        on_signal.cancel();
    });

    let mut sink: Box<dyn ReportSink> = match cli.output {
        OutputFormat::Text => Box::new(LineSink::stdout()),
        OutputFormat::Json => Box::new(JsonSink::stdout()),
    };

    let summary = monitor.run(sink.as_mut(), cancel).await;

    eprintln!(
        "\n{}",
        style(format!("Monitor stopped after {} cycles.", summary.cycles))
            .dim()
            .for_stderr()
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing(log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        LogFormat::Json => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
