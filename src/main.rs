use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use param_cascade::commands::{Command, parse_command};
use param_cascade::config::CascadeConfig;
use param_cascade::effects::DialogCloser;
use param_cascade::facade::{ConfigurationFacade, DateFormatSamples};
use param_cascade::persistence::JsonFileSettings;
use param_cascade::workbook::Workbook;

/// Closes the "dialog" by printing the worksheet the extension should render.
struct StdoutCloser;

impl DialogCloser for StdoutCloser {
    type Error = std::io::Error;

    async fn close(&self, payload: &str) -> std::io::Result<()> {
        println!("{}", payload);
        Ok(())
    }
}

fn path_arg(position: usize, var: &str, default: Option<&str>) -> Result<PathBuf> {
    std::env::args()
        .nth(position)
        .or_else(|| std::env::var(var).ok())
        .or_else(|| default.map(str::to_string))
        .map(PathBuf::from)
        .with_context(|| format!("missing path: pass it as argument {} or set {}", position, var))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "param_cascade=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let workbook_path = path_arg(1, "PARAM_CASCADE_WORKBOOK", None)?;
    let settings_path = path_arg(2, "PARAM_CASCADE_SETTINGS", Some("settings.json"))?;

    let workbook = Workbook::load(&workbook_path)
        .with_context(|| format!("loading workbook {}", workbook_path.display()))?;
    let settings = JsonFileSettings::open(&settings_path)
        .with_context(|| format!("opening settings {}", settings_path.display()))?;
    info!(
        workbook = %workbook_path.display(),
        settings = %settings_path.display(),
        "starting configuration session"
    );

    let mut facade =
        ConfigurationFacade::new(workbook, settings, StdoutCloser, CascadeConfig::from_env());
    print_json(&facade.initialize().await?)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            warn!(line = %line, "unrecognised command");
            continue;
        };

        let result = match command {
            Command::Show => Ok(facade.snapshot()),
            Command::Select { step, value } => facade.select(step, &value).await,
            Command::Lock(step) => facade.lock(step).await,
            Command::Unlock(step) => facade.unlock(step).await,
            Command::Reset => facade.reset().await,
            Command::Set(change) => facade.set_option(change),
            Command::Dates => {
                let samples: DateFormatSamples =
                    facade.date_format_samples(Local::now().date_naive());
                print_json(&samples)?;
                continue;
            }
            Command::Finalize => match facade.finalize().await {
                Ok(worksheet) => {
                    info!(worksheet = %worksheet, "dialog closed");
                    return Ok(());
                }
                Err(e) => Err(e),
            },
            Command::Quit => {
                info!("dialog cancelled");
                return Ok(());
            }
        };

        match result {
            Ok(snapshot) => print_json(&snapshot)?,
            Err(e) => warn!(error = %e, "command rejected"),
        }
    }

    Ok(())
}
