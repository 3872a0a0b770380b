use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// External program that rewrites submitted urls into playable ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformAgentConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    /// Lower bound of the random pause between a finished seek and the capture
    pub seek_delay_min_ms: u64,
    pub seek_delay_max_ms: u64,
    pub transform_agent: Option<TransformAgentConfig>,
    /// No timeout unless configured; the running agent can always be cancelled
    pub transform_timeout_secs: Option<u64>,
    pub last_local_directory: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            seek_delay_min_ms: 50,
            seek_delay_max_ms: 150,
            transform_agent: None,
            transform_timeout_secs: None,
            last_local_directory: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e))?;

            match serde_json::from_str::<Self>(&content) {
                Ok(config) => {
                    log::info!("Loaded existing config from {}", config_path.display());
                    Ok(config)
                }
                Err(e) => {
                    log::warn!("Config file exists but has issues ({}), creating new one with defaults", e);
                    let new_config = Self::default();
                    new_config.save()
                        .map_err(|save_err| anyhow::anyhow!("Failed to save new config: {}", save_err))?;
                    Ok(new_config)
                }
            }
        } else {
            log::info!("No config file found, creating default config");
            let config = Self::default();
            config.save()
                .map_err(|e| anyhow::anyhow!("Failed to save default config: {}", e))?;
            log::info!("Created new config file at {}", config_path.display());
            Ok(config)
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("frame-strip")
            .join("config.json")
    }

    pub fn transform_timeout(&self) -> Option<Duration> {
        self.transform_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Seek delay bounds, swapped into order if configured backwards
    pub fn seek_delay_bounds(&self) -> (u64, u64) {
        let min = self.seek_delay_min_ms.min(self.seek_delay_max_ms);
        let max = self.seek_delay_min_ms.max(self.seek_delay_max_ms);
        (min, max)
    }
}
