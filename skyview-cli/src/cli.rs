use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use skyview_core::{
    AppState, Config, ProviderId, WeatherStore,
    provider::{default_provider_from_config, provider_from_config},
};

use crate::render::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyview", version, about = "Current weather and forecast in your terminal")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "visualcrossing" or "openweather".
        provider: String,
    },

    /// Show weather for a place or coordinates.
    Show {
        #[command(flatten)]
        target: TargetArgs,

        /// Provider to use instead of the configured default.
        #[arg(long)]
        provider: Option<String>,

        /// Print the view model as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Keep showing weather, refreshing periodically until interrupted.
    Watch {
        #[command(flatten)]
        target: TargetArgs,

        /// Provider to use instead of the configured default.
        #[arg(long)]
        provider: Option<String>,

        /// Seconds between refreshes.
        #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u64).range(10..))]
        interval: u64,
    },
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Place name; defaults to the configured city.
    #[arg(conflicts_with_all = ["lat", "lon"])]
    pub city: Option<String>,

    /// Latitude in degrees.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in degrees.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
enum Target {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl TargetArgs {
    fn resolve(self, config: &Config) -> Target {
        match (self.city, self.lat, self.lon) {
            (_, Some(lat), Some(lon)) => Target::Coordinates { lat, lon },
            (Some(city), _, _) => Target::City(city),
            _ => Target::City(config.default_city().to_string()),
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let config = Config::load_from(&config_path)?;
        tracing::debug!(path = %config_path.display(), "loaded configuration");

        match self.command {
            Command::Configure { provider } => configure(config, &config_path, &provider),
            Command::Show {
                target,
                provider,
                json,
            } => {
                let store = build_store(&config, provider.as_deref())?;
                let target = target.resolve(&config);
                load(&store, &target).await;
                show(&store.state(), &config, json)
            }
            Command::Watch {
                target,
                provider,
                interval,
            } => {
                let store = build_store(&config, provider.as_deref())?;
                watch(store, target.resolve(&config), &config, Duration::from_secs(interval)).await
            }
        }
    }
}

fn configure(mut config: Config, path: &std::path::Path, provider: &str) -> Result<()> {
    let id = ProviderId::try_from(provider)?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    let previous_default = config.default_provider_id().ok();
    config.upsert_provider_api_key(id, api_key);

    if let Some(current) = previous_default.filter(|current| *current != id) {
        let make_default = Confirm::new(&format!(
            "Use {id} instead of {current} as the default provider?"
        ))
        .with_default(false)
        .prompt()
        .context("Failed to read answer")?;

        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save_to(path)?;
    println!("Saved {id} credentials to {}", path.display());
    Ok(())
}

fn build_store(config: &Config, provider: Option<&str>) -> Result<WeatherStore> {
    let provider = match provider {
        Some(name) => provider_from_config(ProviderId::try_from(name)?, config)?,
        None => default_provider_from_config(config)?,
    };
    Ok(WeatherStore::new(provider))
}

async fn load(store: &WeatherStore, target: &Target) {
    match target {
        Target::City(city) => store.fetch(city).await,
        Target::Coordinates { lat, lon } => store.fetch_by_coordinates(*lat, *lon).await,
    }
}

fn show(state: &AppState, config: &Config, json: bool) -> Result<()> {
    match state {
        AppState::Success(vm) if json => {
            let out = serde_json::to_string_pretty(vm).context("Failed to serialize weather")?;
            println!("{out}");
            Ok(())
        }
        AppState::Success(vm) => {
            println!("{}", render(vm, config.units));
            Ok(())
        }
        AppState::Error(message) => Err(anyhow!("{message}")),
        AppState::Loading => Err(anyhow!("No weather data loaded")),
    }
}

async fn watch(store: WeatherStore, target: Target, config: &Config, every: Duration) -> Result<()> {
    let mut notices = store.subscribe_notifications();
    let notice_printer = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            eprintln!("! {notice}");
        }
    });

    let mut refreshing = store.subscribe_refreshing();
    let status_printer = tokio::spawn(async move {
        while refreshing.changed().await.is_ok() {
            if *refreshing.borrow_and_update() {
                tracing::info!("refreshing weather");
            }
        }
    });

    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                tick(&store, &target).await;

                let state = store.state();
                println!("── {} ──", chrono::Local::now().format("%H:%M"));
                match &state {
                    AppState::Success(vm) => println!("{}\n", render(vm, config.units)),
                    AppState::Error(message) => eprintln!("{message}"),
                    AppState::Loading => {}
                }
            }
        }
    }

    notice_printer.abort();
    status_printer.abort();
    Ok(())
}

/// One `watch` round. Anything already on screen survives a failed refresh.
async fn tick(store: &WeatherStore, target: &Target) {
    match target {
        Target::City(city) => {
            let city = store.current_city().unwrap_or_else(|| city.clone());
            store.refresh(&city).await;
        }
        Target::Coordinates { lat, lon } => store.refresh_by_coordinates(*lat, *lon).await,
    }
}
