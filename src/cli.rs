use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;

use crate::core::board::FieldBoard;
use crate::core::endpoints::{Endpoints, JobAction};
use crate::core::error::StatusError;
use crate::core::formatter::{format_board_lines, format_in_progress};
use crate::core::render::render_fields;
use crate::core::source::{HttpStatusSource, StatusSource};
use crate::core::widget::{StatusWidget, WidgetConfig};
use crate::logging::{init_logging, LogTarget};
use crate::tui;

/// Web script path under the app base when `--script-url` is not given.
pub const DEFAULT_SCRIPT_PATH: &str = "/service";

#[derive(Debug, Parser)]
#[command(name = "bulkexport-status", version, about = "Live status monitor for bulk export jobs")]
pub struct Cli {
    /// Write JSON logs to this file
    #[arg(long = "log-file", env = "BULKEXPORT_LOG", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open the live dashboard
    Watch(WatchArgs),
    /// Fetch the status once and print it
    Show(ShowArgs),
    /// Ask the running export to pause
    Pause(ConnectionArgs),
    /// Ask a paused export to resume
    Resume(ConnectionArgs),
    /// Ask the running export to stop
    Stop(ConnectionArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Base URL of the web application
    #[arg(long = "app-url", env = "BULKEXPORT_APP_URL")]
    pub app_url: String,
    /// Base URL of the web scripts (defaults to <app-url>/service)
    #[arg(long = "script-url", env = "BULKEXPORT_SCRIPT_URL")]
    pub script_url: Option<String>,
}

impl ConnectionArgs {
    pub fn endpoints(&self) -> Endpoints {
        let script_url = self.script_url.clone().unwrap_or_else(|| {
            format!("{}{DEFAULT_SCRIPT_PATH}", self.app_url.trim_end_matches('/'))
        });
        Endpoints::new(&self.app_url, &script_url)
    }
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    #[arg(long = "poll-interval-ms", default_value_t = 1000)]
    pub poll_interval_ms: u64,
    #[arg(long = "render-interval-ms", default_value_t = 2000)]
    pub render_interval_ms: u64,
}

impl WatchArgs {
    pub fn widget_config(&self) -> WidgetConfig {
        WidgetConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            render_interval: Duration::from_millis(self.render_interval_ms.max(1)),
            ..WidgetConfig::new(self.connection.endpoints())
        }
    }
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Print the raw snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(cli: Cli) -> Result<(), StatusError> {
    match cli.command {
        Commands::Watch(args) => {
            init_logging(LogTarget::File(cli.log_file));
            watch(args).await
        }
        Commands::Show(args) => {
            init_logging(LogTarget::Stderr);
            show(args).await
        }
        Commands::Pause(args) => {
            init_logging(LogTarget::Stderr);
            send_action(args, JobAction::Pause).await
        }
        Commands::Resume(args) => {
            init_logging(LogTarget::Stderr);
            send_action(args, JobAction::Resume).await
        }
        Commands::Stop(args) => {
            init_logging(LogTarget::Stderr);
            send_action(args, JobAction::Stop).await
        }
    }
}

async fn watch(args: WatchArgs) -> Result<(), StatusError> {
    let config = args.widget_config();
    let source = HttpStatusSource::new(config.endpoints.clone())?;
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let widget = StatusWidget::new(config, source, FieldBoard::new(), Some(event_tx));
    let runtime = tokio::runtime::Handle::current();

    tokio::task::spawn_blocking(move || tui::run(widget, event_rx, runtime))
        .await
        .map_err(|e| StatusError::Runtime {
            message: e.to_string(),
        })?
}

async fn show(args: ShowArgs) -> Result<(), StatusError> {
    let source = HttpStatusSource::new(args.connection.endpoints())?;
    let snapshot = source.fetch_status().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let Some(snapshot) = snapshot else {
        println!("No data received from server.");
        return Ok(());
    };

    let mut board = FieldBoard::new();
    render_fields(&mut board, Some(&snapshot));
    for line in format_board_lines(&board) {
        println!("{line}");
    }
    println!("Running  : {}", format_in_progress(&snapshot.in_progress));
    Ok(())
}

async fn send_action(args: ConnectionArgs, action: JobAction) -> Result<(), StatusError> {
    let source = HttpStatusSource::new(args.endpoints())?;
    source.post_action(action).await?;
    println!("{} requested.", action.name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_url_defaults_under_app_url() {
        let cli = Cli::try_parse_from(["bulkexport-status", "show", "--app-url", "http://h/alfresco/"])
            .unwrap();
        let Commands::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(
            args.connection.endpoints().status,
            "http://h/alfresco/service/bulk/export/status.json"
        );
        assert!(!args.json);
    }

    #[test]
    fn watch_intervals_default_to_one_and_two_seconds() {
        let cli = Cli::try_parse_from([
            "bulkexport-status",
            "watch",
            "--app-url",
            "http://h/a",
            "--script-url",
            "http://h/a/s",
        ])
        .unwrap();
        let Commands::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        let config = args.widget_config();
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.render_interval, Duration::from_millis(2000));
        assert_eq!(config.endpoints.stop, "http://h/a/s/bulk/export/stop");
    }

    #[test]
    fn log_file_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bulkexport-status",
            "pause",
            "--app-url",
            "http://h/a",
            "--log-file",
            "/tmp/status.log",
        ])
        .unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/status.log")));
        assert!(matches!(cli.command, Commands::Pause(_)));
    }
}
