mod core;
mod gui;
mod transform;
mod video;

use clap::Parser;
use eframe::egui;

use crate::core::{parse_interval, parse_width, AppConfig, StartupParams};
use crate::gui::FrameStripApp;
use crate::video::{configure, FfmpegTools};

#[derive(Parser, Debug)]
#[command(
    name = "frame-strip",
    version,
    about = "Still frames of every video at a fixed interval, side by side"
)]
struct Cli {
    /// Startup parameters as a query string, e.g. "url=a.mp4&width=200&interval=2&vertical"
    #[arg(long)]
    query: Option<String>,

    /// Video url or path; repeat for several videos
    #[arg(long = "url")]
    urls: Vec<String>,

    /// Frame width in pixels (never upscaled)
    #[arg(long, value_parser = width_arg)]
    width: Option<u32>,

    /// Seconds between frames
    #[arg(long, value_parser = interval_arg)]
    interval: Option<f64>,

    /// One column per video instead of one row per video
    #[arg(long, default_value_t = false)]
    vertical: bool,

    #[arg(long, default_value_t = false)]
    hide_header: bool,

    #[arg(long, default_value_t = false)]
    hide_form: bool,
}

impl Cli {
    /// Flags take precedence over the query string; urls from both are kept
    fn into_params(self) -> StartupParams {
        let mut params = self
            .query
            .as_deref()
            .map(StartupParams::from_query)
            .unwrap_or_default();

        params.urls.extend(self.urls);
        if let Some(width) = self.width {
            params.width = width;
        }
        if let Some(interval) = self.interval {
            params.interval = interval;
        }
        params.display_vertical |= self.vertical;
        params.hide_header |= self.hide_header;
        params.hide_form |= self.hide_form;
        params
    }
}

fn width_arg(value: &str) -> Result<u32, String> {
    parse_width(value).ok_or_else(|| format!("`{}` is not a positive pixel width", value))
}

fn interval_arg(value: &str) -> Result<f64, String> {
    parse_interval(value).ok_or_else(|| format!("`{}` is not a positive number of seconds", value))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let params = Cli::parse().into_params();
    log::info!(
        "Startup parameters: {} urls, width {}px, interval {}s",
        params.urls.len(),
        params.width,
        params.interval
    );

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::error!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let tools = FfmpegTools::from_config(&config);
    log::info!(
        "Using {} and {}",
        tools.ffmpeg_path().display(),
        tools.ffprobe_path().display()
    );
    if let Err(e) = tools.ensure_available() {
        log::warn!("ffmpeg is not usable, every video will fail to load: {:#}", e);
    }
    configure(tools);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Frame Strip"),
        ..Default::default()
    };

    eframe::run_native(
        "Frame Strip",
        options,
        Box::new(|cc| {
            match FrameStripApp::new(cc, config, params) {
                Ok(app) => Ok(Box::new(app)),
                Err(e) => {
                    eprintln!("Failed to initialize app: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
