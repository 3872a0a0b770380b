use std::time::{Duration, Instant};

use crate::core::{RowId, VideoSource};
use crate::video::{
    CaptureSettings, CaptureState, FrameCapture, MediaElement, RowUpdate, SeekDelay, ThumbnailCache,
};

const LABEL_CELL_WIDTH: f32 = 160.0;
const PREVIEW_STEP: Duration = Duration::from_millis(500);

/// One video of the list: its media element, its capture sequence and the
/// textures uploaded for the frames captured so far.
pub struct ListRow {
    id: RowId,
    source: VideoSource,
    element: Box<dyn MediaElement>,
    capture: FrameCapture,
    textures: Vec<egui::TextureHandle>,
    playing_since: Option<Instant>,
}

impl ListRow {
    pub fn new(id: RowId, source: VideoSource, mut element: Box<dyn MediaElement>, delay: SeekDelay) -> Self {
        element.set_muted(true);
        Self {
            id,
            source,
            element,
            capture: FrameCapture::new(delay),
            textures: Vec::new(),
            playing_since: None,
        }
    }

    pub fn id(&self) -> &RowId {
        &self.id
    }

    pub fn source(&self) -> &VideoSource {
        &self.source
    }

    pub fn capture(&self) -> &FrameCapture {
        &self.capture
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Label and thumbnail changes of a reused row
    pub fn set_source(&mut self, source: VideoSource) {
        self.source = source;
    }

    /// Returns `true` when the capture sequence was restarted
    pub fn start(&mut self, settings: CaptureSettings) -> bool {
        let restarted = self.capture.start(
            self.element.as_mut(),
            &self.source.url,
            self.source.display_label(),
            settings,
        );
        if restarted {
            self.textures.clear();
        }
        restarted
    }

    /// Drain media events and run a due capture
    pub fn update(&mut self, now: Instant) -> Vec<RowUpdate> {
        let mut updates = Vec::new();
        for event in self.element.poll_events() {
            updates.extend(self.capture.handle_event(&event, now));
        }
        updates.extend(self.capture.tick(self.element.as_mut(), now));
        updates
    }

    /// Upload frames appended since the last call; each frame becomes a texture once
    pub fn sync_textures(&mut self, ctx: &egui::Context) {
        let frames = self.capture.frames();
        if self.textures.len() > frames.len() {
            self.textures.truncate(frames.len());
        }

        for (idx, frame) in frames.iter().enumerate().skip(self.textures.len()) {
            let size = [frame.image.width() as usize, frame.image.height() as usize];
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, frame.image.as_raw());
            let texture = ctx.load_texture(
                format!("frame_{}_{}", self.id, idx),
                color_image,
                egui::TextureOptions::LINEAR,
            );
            self.textures.push(texture);
        }
    }

    pub fn apply_playback(&mut self, playing: bool, now: Instant) {
        self.element.set_muted(true);
        if playing {
            self.element.play();
            self.playing_since.get_or_insert(now);
        } else {
            self.element.pause();
            self.playing_since = None;
        }
    }

    pub fn is_playing(&self) -> bool {
        !self.element.is_paused()
    }

    pub fn is_muted(&self) -> bool {
        self.element.is_muted()
    }

    /// Frame shown in the label cell: cycles through the captures while playing
    pub fn preview_index(&self, now: Instant) -> Option<usize> {
        if self.textures.is_empty() {
            return None;
        }
        let Some(since) = self.playing_since else {
            return Some(0);
        };
        let steps = now.saturating_duration_since(since).as_millis() / PREVIEW_STEP.as_millis();
        Some(steps as usize % self.textures.len())
    }

    pub fn show_label_cell(&self, ui: &mut egui::Ui, thumbnails: &mut ThumbnailCache, now: Instant) {
        ui.vertical(|ui| {
            ui.set_max_width(LABEL_CELL_WIDTH);

            let custom = self
                .source
                .custom_thumbnail
                .as_deref()
                .and_then(|url| thumbnails.request(url));

            let playing_frame = self
                .playing_since
                .and_then(|_| self.preview_index(now))
                .and_then(|idx| self.textures.get(idx));

            if let Some(texture) = playing_frame {
                Self::show_scaled(ui, texture, LABEL_CELL_WIDTH);
            } else if let Some(texture) = custom {
                Self::show_scaled(ui, &texture, LABEL_CELL_WIDTH);
            } else if let Some(texture) = self.textures.first() {
                Self::show_scaled(ui, texture, LABEL_CELL_WIDTH);
            } else if self
                .source
                .custom_thumbnail
                .as_deref()
                .is_some_and(|url| thumbnails.is_pending(url))
            {
                ui.spinner();
            }

            ui.label(egui::RichText::new(self.source.display_label()).strong())
                .on_hover_text(&self.source.url);
            if let Some(duration) = self.element.duration() {
                ui.small(format!("{:.1} sec", duration));
            }

            match self.capture.state() {
                CaptureState::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.small("Loading...");
                    });
                }
                CaptureState::Seeking => {
                    ui.small(format!(
                        "{}/{} frames",
                        self.capture.frames().len(),
                        self.capture.expected_frames()
                    ));
                }
                CaptureState::Done | CaptureState::Error | CaptureState::Idle => {}
            }
        });
    }

    /// Cell of frame column `column`; empty until that frame is captured
    pub fn show_frame_cell(&self, ui: &mut egui::Ui, column: usize, width: u32) {
        if let (Some(texture), Some(frame)) = (self.textures.get(column), self.capture.frames().get(column)) {
            Self::show_scaled(ui, texture, width as f32).on_hover_text(&frame.label);
        } else {
            ui.allocate_space(egui::vec2(width as f32, 1.0));
        }
    }

    pub fn show_error_cell(&self, ui: &mut egui::Ui) {
        let message = match self.capture.error() {
            Some(error) => format!("Unable to load video: {}", error),
            None => "Unable to load video".to_string(),
        };
        let color = ui.visuals().error_fg_color;
        ui.colored_label(color, message);
    }

    fn show_scaled(ui: &mut egui::Ui, texture: &egui::TextureHandle, max_width: f32) -> egui::Response {
        let size = texture.size_vec2();
        let scale = if size.x > max_width { max_width / size.x } else { 1.0 };
        ui.image((texture.id(), size * scale))
    }
}
