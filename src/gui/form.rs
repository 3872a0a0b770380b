use std::path::{Path, PathBuf};

use crate::core::{
    parse_interval, parse_source_list, parse_width, LocalFileRegistry, StartupParams, VideoSource,
};

/// Everything the list needs to (re)build its rows
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub videos: Vec<VideoSource>,
    pub interval: f64,
    pub width: u32,
    pub display_vertical: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitAction {
    Generate(GenerateRequest),
    /// Url entries go to the transform agent first; generation waits for its answer
    Transform { entries: Vec<VideoSource> },
    Invalid(String),
    /// Nothing to generate
    Nothing,
}

/// What the user did with the form during one frame
#[derive(Debug, Default)]
pub struct FormResponse {
    pub submitted: bool,
    pub cleared: bool,
    pub picked_files: Option<Vec<PathBuf>>,
}

/// Request held back while the agent rewrites the url entries
#[derive(Debug, Clone)]
struct AwaitingTransform {
    local_files: Vec<VideoSource>,
    interval: f64,
    width: u32,
    display_vertical: bool,
}

pub struct FormState {
    pub urls_text: String,
    pub interval_text: String,
    pub width_text: String,
    pub display_vertical: bool,
    local_files: Vec<VideoSource>,
    awaiting: Option<AwaitingTransform>,
}

impl FormState {
    pub fn from_params(params: &StartupParams) -> Self {
        Self {
            urls_text: params.urls.join("\n"),
            interval_text: params.interval.to_string(),
            width_text: params.width.to_string(),
            display_vertical: params.display_vertical,
            local_files: Vec::new(),
            awaiting: None,
        }
    }

    pub fn local_files(&self) -> &[VideoSource] {
        &self.local_files
    }

    pub fn is_awaiting_transform(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Replace the selected local files, releasing the references of the previous selection
    pub fn set_local_files(&mut self, registry: &LocalFileRegistry, paths: &[PathBuf]) {
        self.local_files = registry.replace_selection(&self.local_files, paths);
        log::info!("Selected {} local files", self.local_files.len());
    }

    pub fn submit(&mut self, transform_available: bool) -> SubmitAction {
        let Some(interval) = parse_interval(&self.interval_text) else {
            return SubmitAction::Invalid(format!("Invalid interval: {}", self.interval_text.trim()));
        };
        let Some(width) = parse_width(&self.width_text) else {
            return SubmitAction::Invalid(format!("Invalid width: {}", self.width_text.trim()));
        };

        let entries = parse_source_list(&self.urls_text);
        if entries.is_empty() && self.local_files.is_empty() {
            return SubmitAction::Nothing;
        }

        if transform_available && !entries.is_empty() {
            self.awaiting = Some(AwaitingTransform {
                local_files: self.local_files.clone(),
                interval,
                width,
                display_vertical: self.display_vertical,
            });
            return SubmitAction::Transform { entries };
        }

        // Local files are listed after the url entries
        let mut videos = entries;
        videos.extend(self.local_files.iter().cloned());
        SubmitAction::Generate(GenerateRequest {
            videos,
            interval,
            width,
            display_vertical: self.display_vertical,
        })
    }

    /// Complete a held back submit with the agent's sources
    pub fn finish_transform(&mut self, sources: Vec<VideoSource>) -> Option<GenerateRequest> {
        let awaiting = self.awaiting.take()?;
        let mut videos = sources;
        videos.extend(awaiting.local_files);
        Some(GenerateRequest {
            videos,
            interval: awaiting.interval,
            width: awaiting.width,
            display_vertical: awaiting.display_vertical,
        })
    }

    pub fn cancel_transform(&mut self) {
        self.awaiting = None;
    }

    pub fn show(&mut self, ui: &mut egui::Ui, start_directory: Option<&Path>, busy: bool) -> FormResponse {
        let mut response = FormResponse::default();

        ui.label("Video urls (one per line, url;thumbnail;label):");
        ui.add(
            egui::TextEdit::multiline(&mut self.urls_text)
                .desired_rows(4)
                .desired_width(f32::INFINITY)
                .hint_text("https://example.com/video.mp4"),
        );

        ui.horizontal(|ui| {
            if ui.button("📁 Local files...").clicked() {
                let mut dialog = rfd::FileDialog::new()
                    .add_filter("Video", &["mp4", "webm", "mkv", "mov", "avi", "m4v", "ogv"]);
                if let Some(dir) = start_directory {
                    dialog = dialog.set_directory(dir);
                }
                if let Some(files) = dialog.pick_files() {
                    response.picked_files = Some(files);
                }
            }

            match self.local_files.len() {
                0 => ui.label("No local files selected"),
                1 => ui.label(self.local_files[0].display_label().to_string()),
                n => ui.label(format!("{} local files selected", n)),
            };
        });

        ui.horizontal(|ui| {
            ui.label("Interval (sec):");
            ui.add(egui::TextEdit::singleline(&mut self.interval_text).desired_width(60.0));
            ui.label("Width (px):");
            ui.add(egui::TextEdit::singleline(&mut self.width_text).desired_width(60.0));

            if ui.checkbox(&mut self.display_vertical, "Vertical").changed() {
                response.submitted = true;
            }

            ui.add_enabled_ui(!busy, |ui| {
                if ui.button("Generate").clicked() {
                    response.submitted = true;
                }
                if ui.button("Clear").clicked() {
                    response.cleared = true;
                }
            });
        });

        response
    }
}
