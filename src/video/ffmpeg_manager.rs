use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use anyhow::Context;

use crate::core::AppConfig;
use crate::video::media_element::MediaError;

/// Locations of the ffmpeg binaries plus a count of running processes for logging.
///
/// Concurrent processes are not capped; rows spread their work with the seek delay.
pub struct FfmpegTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    active_count: AtomicUsize,
}

impl FfmpegTools {
    pub fn new(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            active_count: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.ffmpeg_path.clone().unwrap_or_else(|| PathBuf::from("ffmpeg")),
            config.ffprobe_path.clone().unwrap_or_else(|| PathBuf::from("ffprobe")),
        )
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe
    }

    pub fn ffmpeg_command(&self) -> Command {
        Command::new(&self.ffmpeg)
    }

    pub fn ffprobe_command(&self) -> Command {
        Command::new(&self.ffprobe)
    }

    /// Both tools must answer `-version` before any row starts
    pub fn ensure_available(&self) -> anyhow::Result<()> {
        for tool in [&self.ffmpeg, &self.ffprobe] {
            let output = Command::new(tool)
                .arg("-version")
                .output()
                .with_context(|| format!("failed to run {} -version", tool.display()))?;
            if !output.status.success() {
                anyhow::bail!("{} exists but returned non-zero on -version", tool.display());
            }
        }
        Ok(())
    }

    pub fn execute(&self, mut command: Command) -> Result<Output, MediaError> {
        let tool = command.get_program().to_string_lossy().to_string();

        self.active_count.fetch_add(1, Ordering::SeqCst);
        log::debug!("Executing {} process, active count: {}", tool, self.active_count());

        let result = command.output();

        self.active_count.fetch_sub(1, Ordering::SeqCst);
        log::debug!("{} process completed, active count: {}", tool, self.active_count());

        result.map_err(|e| MediaError::Spawn { tool, message: e.to_string() })
    }

    pub fn active_count(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }
}

static FFMPEG_TOOLS: OnceLock<FfmpegTools> = OnceLock::new();

/// Install the tool locations; only the first call wins
pub fn configure(tools: FfmpegTools) {
    if FFMPEG_TOOLS.set(tools).is_err() {
        log::warn!("ffmpeg tools were already configured, keeping the first configuration");
    }
}

/// Global tool locations, defaulting to binaries on `PATH`
pub fn tools() -> &'static FfmpegTools {
    FFMPEG_TOOLS.get_or_init(|| FfmpegTools::new(PathBuf::from("ffmpeg"), PathBuf::from("ffprobe")))
}

/// Convenience function to execute a command through the global tools
pub fn execute_ffmpeg(command: Command) -> Result<Output, MediaError> {
    tools().execute(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_from_config_defaults() {
        let tools = FfmpegTools::from_config(&AppConfig::default());
        assert_eq!(tools.ffmpeg_path(), Path::new("ffmpeg"));
        assert_eq!(tools.ffprobe_path(), Path::new("ffprobe"));
    }

    #[test]
    fn test_tools_from_config_overrides() {
        let mut config = AppConfig::default();
        config.ffmpeg_path = Some(PathBuf::from("/opt/ff/ffmpeg"));
        let tools = FfmpegTools::from_config(&config);
        assert_eq!(tools.ffmpeg_path(), Path::new("/opt/ff/ffmpeg"));
        assert_eq!(tools.ffprobe_path(), Path::new("ffprobe"));
    }

    #[test]
    fn test_missing_binary_is_a_spawn_error() {
        let tools = FfmpegTools::new(
            PathBuf::from("/nonexistent/frame-strip-ffmpeg"),
            PathBuf::from("/nonexistent/frame-strip-ffprobe"),
        );

        let result = tools.execute(tools.ffmpeg_command());
        assert!(matches!(result, Err(MediaError::Spawn { .. })));
        assert_eq!(tools.active_count(), 0);
        assert!(tools.ensure_available().is_err());
    }
}
