use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "photo-matting",
    about = "Remove image backgrounds with the remove.bg API",
    long_about = "
Photo Matting - command line companion of the desktop app

Shares the settings (save path and API key) saved from the desktop app's
Settings dialog, so a configured machine can cut out images headlessly.

Example Usage:
  # Store the output directory and API key once
  photo-matting settings set --save-path ~/cutouts --api-key YOUR_KEY

  # Cut out an image using the stored settings
  photo-matting cutout ~/Photos/cat.png

  # One-off run with explicit values
  photo-matting cutout ~/Photos/cat.jpg --save-path /tmp --api-key YOUR_KEY
"
)]
pub struct Args {
    /// Configuration file (defaults to config.json in the app config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Matting service endpoint
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Settings storage file
    #[arg(long, global = true, value_name = "FILE")]
    pub storage: Option<PathBuf>,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Remove the background of one image
    Cutout {
        /// Source image (png, jpeg, jpg)
        input: PathBuf,

        /// Output directory (overrides the stored setting)
        #[arg(long)]
        save_path: Option<String>,

        /// remove.bg API key (overrides the stored setting)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Inspect or change the stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SettingsAction {
    /// Print the stored settings
    Show,
    /// Store a new save path and API key
    Set {
        #[arg(long)]
        save_path: String,
        #[arg(long)]
        api_key: String,
    },
}

impl Args {
    /// Command-line values take precedence over the config file
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.api_endpoint = endpoint.clone();
        }
        if let Some(storage) = &self.storage {
            config.storage_path = Some(storage.clone());
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = Some(timeout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cutout() {
        let args = Args::try_parse_from([
            "photo-matting",
            "cutout",
            "/tmp/a.png",
            "--save-path",
            "/out",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Cutout {
                input: PathBuf::from("/tmp/a.png"),
                save_path: Some("/out".to_string()),
                api_key: None,
            }
        );
    }

    #[test]
    fn test_parse_settings_set_requires_both_fields() {
        let args = Args::try_parse_from([
            "photo-matting",
            "settings",
            "set",
            "--save-path",
            "/out",
            "--api-key",
            "k1",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Settings {
                action: SettingsAction::Set {
                    save_path: "/out".to_string(),
                    api_key: "k1".to_string(),
                }
            }
        );

        assert!(Args::try_parse_from(["photo-matting", "settings", "set", "--api-key", "k1"]).is_err());
    }

    #[test]
    fn test_cli_flags_override_config() {
        let args = Args::try_parse_from([
            "photo-matting",
            "settings",
            "show",
            "--endpoint",
            "http://localhost:8080/removebg",
            "--timeout",
            "30",
        ])
        .unwrap();

        let mut config = AppConfig {
            storage_path: Some(PathBuf::from("/keep/storage.json")),
            ..Default::default()
        };
        args.apply_to(&mut config);

        assert_eq!(config.api_endpoint, "http://localhost:8080/removebg");
        assert_eq!(config.request_timeout_secs, Some(30));
        assert_eq!(config.storage_path, Some(PathBuf::from("/keep/storage.json")));
    }
}
