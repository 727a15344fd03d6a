use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use log::{debug, warn};
use std::path::Path;
use std::time::Instant;

use photo_matting::cli::{Args, Command, SettingsAction};
use photo_matting::config::AppConfig;
use photo_matting::settings::{Settings, SettingsStore};
use photo_matting::utils::{create_spinner, format_duration, mask_api_key};
use photo_matting::view::{cutout_request, ViewError, API_KEY_REQUIRED, SAVE_PATH_REQUIRED};
use photo_matting::RemoveBgClient;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_stored_settings(store: &dyn SettingsStore) -> Settings {
    match store.load() {
        Ok(settings) => settings.unwrap_or_default(),
        Err(err) => {
            warn!("Ignoring unreadable settings: {}", err);
            Settings::default()
        }
    }
}

fn handle_cutout(
    config: &AppConfig,
    input: &Path,
    save_path: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let stored = load_stored_settings(config.settings_store().as_ref());
    let settings = Settings {
        save_path: save_path.unwrap_or(stored.save_path),
        api_key: api_key.unwrap_or(stored.api_key),
    };

    let request = cutout_request(&input.display().to_string(), Some(settings))?;
    debug!("Matting request for {}", request.file_path);

    let client = RemoveBgClient::new(config.api_endpoint.clone(), config.request_timeout())
        .context("Failed to create HTTP client")?;
    debug!("Matting endpoint: {}", client.endpoint());

    let start_time = Instant::now();
    let spinner = create_spinner(&format!("Cutting out {}", input.display()));
    let result = client.remove_background(&request);
    spinner.finish_and_clear();

    let record = result.context(ViewError::CutoutFailed)?;
    println!(
        "{} {} ({})",
        style("✓").green().bold(),
        record.image_path,
        style(format_duration(start_time.elapsed())).dim()
    );
    Ok(())
}

fn handle_settings(config: &AppConfig, action: &SettingsAction) -> Result<()> {
    let store = config.settings_store();

    match action {
        SettingsAction::Show => {
            let settings = store
                .load()
                .context("Failed to read stored settings")?;
            match settings {
                Some(settings) => {
                    println!("{}: {}", style("Save path").bold(), settings.save_path);
                    println!("{}: {}", style("API key").bold(), mask_api_key(&settings.api_key));
                }
                None => println!("{}", style("No settings stored").yellow()),
            }
            if let Some(path) = config.resolved_storage_path() {
                println!("{}", style(format!("Storage: {}", path.display())).dim());
            }
        }
        SettingsAction::Set { save_path, api_key } => {
            if save_path.is_empty() {
                anyhow::bail!(SAVE_PATH_REQUIRED);
            }
            if api_key.is_empty() {
                anyhow::bail!(API_KEY_REQUIRED);
            }
            store
                .save(&Settings::new(save_path.as_str(), api_key.as_str()))
                .context("Failed to save settings")?;
            println!("{} Settings saved", style("✓").green().bold());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    args.apply_to(&mut config);
    debug!("Effective configuration: {:?}", config);

    match &args.command {
        Command::Cutout {
            input,
            save_path,
            api_key,
        } => handle_cutout(&config, input, save_path.clone(), api_key.clone()),
        Command::Settings { action } => handle_settings(&config, action),
    }
}
