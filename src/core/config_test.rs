#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;
    use crate::core::{AppConfig, TransformAgentConfig};

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(config.ffmpeg_path.is_none());
        assert!(config.ffprobe_path.is_none());
        assert_eq!(config.seek_delay_bounds(), (50, 150));
        assert!(config.transform_agent.is_none());
        assert!(config.transform_timeout().is_none());
    }

    #[test]
    fn test_app_config_serialization() {
        let mut config = AppConfig::default();
        config.ffmpeg_path = Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        config.transform_agent = Some(TransformAgentConfig {
            program: PathBuf::from("yt-dlp"),
            args: vec!["-g".to_string()],
        });
        config.transform_timeout_secs = Some(30);

        let serialized = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: AppConfig = serde_json::from_str(&serialized).expect("Failed to deserialize config");

        assert_eq!(config.ffmpeg_path, deserialized.ffmpeg_path);
        assert_eq!(config.transform_agent, deserialized.transform_agent);
        assert_eq!(deserialized.transform_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_config_backward_compatibility() {
        // Older files only carried the tool paths
        let old_config_json = r#"{
            "ffmpeg_path": null,
            "ffprobe_path": "/usr/bin/ffprobe"
        }"#;

        let config: AppConfig = serde_json::from_str(old_config_json).expect("Failed to parse old config");

        assert_eq!(config.ffprobe_path, Some(PathBuf::from("/usr/bin/ffprobe")));
        assert_eq!(config.seek_delay_min_ms, 50);
        assert_eq!(config.seek_delay_max_ms, 150);
        assert!(config.transform_agent.is_none());
    }

    #[test]
    fn test_transform_agent_args_optional() {
        let json = r#"{ "transform_agent": { "program": "resolver" } }"#;
        let config: AppConfig = serde_json::from_str(json).expect("Failed to parse config");

        let agent = config.transform_agent.expect("agent should be present");
        assert_eq!(agent.program, PathBuf::from("resolver"));
        assert!(agent.args.is_empty());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let mut config = AppConfig::default();
        config.transform_timeout_secs = Some(0);
        assert!(config.transform_timeout().is_none());
    }

    #[test]
    fn test_seek_delay_bounds_are_ordered() {
        let mut config = AppConfig::default();
        config.seek_delay_min_ms = 200;
        config.seek_delay_max_ms = 20;
        assert_eq!(config.seek_delay_bounds(), (20, 200));
    }
}
