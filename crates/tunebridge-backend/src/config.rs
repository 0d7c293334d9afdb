use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tokio::{
    fs::{OpenOptions, create_dir_all, read_to_string},
    io::AsyncWriteExt,
};
use tunebridge_bridge::config::Config;

/// Errors that can occur while loading or resolving application configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to determine the user's configuration directory. This usually
    /// occurs when required environment variables are missing (e.g., `$HOME`
    /// on Unix or `%APPDATA%` on Windows).
    #[error("failed to obtain user's directories")]
    DirectoriesNotFound,
    /// An I/O error occurred while reading or writing the configuration file.
    #[error("failed to read config: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file contains invalid TOML or does not match the expected structure.
    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),
    /// Failed to serialize the configuration to TOML.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Location of `config.toml` in the user's configuration directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("dev", "tunebridge", "tunebridge")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .ok_or(ConfigError::DirectoriesNotFound)
}

/// Loads the application configuration from the user's configuration
/// directory, writing the defaults there on first run.
pub async fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path()?).await
}

/// Loads the configuration stored at `path`. A missing file is created with
/// the default configuration.
pub async fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    log::info!("Loading configuration from {path:?}");
    if path.exists() {
        let contents = read_to_string(path).await?;
        return Ok(toml::from_str(&contents)?);
    }

    let config = Config::default();
    if let Some(parent) = path.parent() {
        create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(&config)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;

    Ok(config)
}

/// Saves the configuration to `config.toml` in the user's configuration
/// directory, overwriting any existing file.
pub async fn save_config(config: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path()?, config).await
}

pub async fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent).await?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await?;

    let contents = toml::to_string_pretty(config)?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn first_load_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = load_config_from(&path).await.unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[embed]"));
        assert!(written.contains("autoplay_delay_ms = 100"));
    }

    #[tokio::test]
    async fn saved_changes_are_loaded_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.embed.autoplay_after_load = false;
        config.playback.position_epsilon_seconds = 0.25;
        save_config_to(&path, &config).await.unwrap();

        assert_eq!(load_config_from(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn partial_files_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nchannel_buffer = 8\n").unwrap();

        let config = load_config_from(&path).await.unwrap();
        assert_eq!(config.session.channel_buffer, 8);
        assert_eq!(config.embed, Default::default());
    }

    #[tokio::test]
    async fn invalid_toml_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[embed\nwidget_height = ").unwrap();

        assert!(matches!(
            load_config_from(&path).await,
            Err(ConfigError::DeserializeError(_))
        ));
    }
}
