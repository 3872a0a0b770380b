use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;

use crate::core::expected_frame_count;
use crate::video::media_element::{
    MediaElement, MediaError, MediaEvent, MediaEventKind, SeekDelay, SourceToken,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Loading,
    Seeking,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureSettings {
    /// Seconds between capture positions
    pub interval: f64,
    /// Requested frame width in pixels, never upscaled past the native width
    pub width: u32,
}

#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub position: f64,
    pub label: String,
    pub image: Arc<RgbaImage>,
}

/// Reported upward to the list after events and captures
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowUpdate {
    Duration(f64),
    Progress(f64),
}

/// Per-row frame capture: drives one media element through
/// `load → seek(interval) → capture → seek(2 * interval) → ...` until the
/// source runs out, collecting one frame per stop.
///
/// The frame log is append-only while a source is active and only the
/// seek-completion path writes to it.
pub struct FrameCapture {
    state: CaptureState,
    settings: Option<CaptureSettings>,
    source_url: String,
    label: String,
    token: Option<SourceToken>,
    frames: Vec<CapturedFrame>,
    duration: Option<f64>,
    capture_due: Option<Instant>,
    delay: SeekDelay,
    error: Option<MediaError>,
}

impl FrameCapture {
    pub fn new(delay: SeekDelay) -> Self {
        Self {
            state: CaptureState::Idle,
            settings: None,
            source_url: String::new(),
            label: String::new(),
            token: None,
            frames: Vec::new(),
            duration: None,
            capture_due: None,
            delay,
            error: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    pub fn is_error(&self) -> bool {
        self.state == CaptureState::Error
    }

    pub fn error(&self) -> Option<&MediaError> {
        self.error.as_ref()
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CaptureState::Loading | CaptureState::Seeking)
    }

    pub fn expected_frames(&self) -> usize {
        match (self.duration, self.settings) {
            (Some(duration), Some(settings)) => expected_frame_count(duration, settings.interval),
            _ => 0,
        }
    }

    /// Captured share of the expected frames; 1 once finished or failed
    pub fn progress(&self) -> f64 {
        match self.state {
            CaptureState::Done | CaptureState::Error => 1.0,
            CaptureState::Idle | CaptureState::Loading => 0.0,
            CaptureState::Seeking => {
                let expected = self.expected_frames();
                if expected == 0 {
                    0.0
                } else {
                    (self.frames.len() as f64 / expected as f64).min(1.0)
                }
            }
        }
    }

    /// Begin capturing `source_url`. Returns `false` when nothing changed and
    /// the running or finished sequence was kept.
    pub fn start(
        &mut self,
        element: &mut dyn MediaElement,
        source_url: &str,
        label: &str,
        settings: CaptureSettings,
    ) -> bool {
        let unchanged = self.state != CaptureState::Idle
            && self.source_url == source_url
            && self.label == label
            && self.settings == Some(settings);
        if unchanged {
            return false;
        }

        log::info!("Frame capture start: [{}]", source_url);

        self.frames.clear();
        self.error = None;
        self.duration = None;
        self.capture_due = None;
        self.source_url = source_url.to_string();
        self.label = label.to_string();
        self.settings = Some(settings);

        self.token = Some(element.set_source(source_url));
        element.load();
        element.set_current_time(settings.interval);
        self.state = CaptureState::Loading;
        true
    }

    pub fn handle_event(&mut self, event: &MediaEvent, now: Instant) -> Vec<RowUpdate> {
        if Some(event.token) != self.token {
            log::trace!("Dropping event of an abandoned source: {:?}", event.kind);
            return Vec::new();
        }

        match &event.kind {
            MediaEventKind::LoadedData { duration, .. } => {
                if self.state != CaptureState::Loading {
                    return Vec::new();
                }
                if !duration.is_finite() || *duration <= 0.0 {
                    return self.fail(MediaError::InvalidDuration(*duration));
                }

                self.duration = Some(*duration);
                let mut updates = vec![RowUpdate::Duration(*duration)];
                if self.expected_frames() == 0 {
                    // Shorter than one interval: nothing to capture
                    log::debug!("{} is shorter than the interval, no frames", self.source_url);
                    self.state = CaptureState::Done;
                    self.capture_due = None;
                    updates.push(RowUpdate::Progress(1.0));
                } else {
                    self.state = CaptureState::Seeking;
                    updates.push(RowUpdate::Progress(self.progress()));
                }
                updates
            }
            MediaEventKind::Seeked { position } => {
                // A seek may finish before the metadata event; the capture then waits for Seeking
                let accepting = matches!(self.state, CaptureState::Loading | CaptureState::Seeking);
                if accepting && self.capture_due.is_none() {
                    log::debug!("Seeked {} to {:.3}s", self.source_url, position);
                    self.capture_due = Some(now + self.delay.sample());
                }
                Vec::new()
            }
            MediaEventKind::Error(error) => {
                if self.is_active() {
                    self.fail(error.clone())
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Perform a capture whose delay has elapsed, then move on to the next position
    pub fn tick(&mut self, element: &mut dyn MediaElement, now: Instant) -> Vec<RowUpdate> {
        if self.state != CaptureState::Seeking {
            return Vec::new();
        }
        match self.capture_due {
            Some(due) if due <= now => self.capture_due = None,
            _ => return Vec::new(),
        }
        let Some(settings) = self.settings else {
            return Vec::new();
        };

        let position = element.current_time();
        let image = match element.capture_frame(settings.width) {
            Ok(image) => image,
            Err(e) => return self.fail(e),
        };

        self.frames.push(CapturedFrame {
            position,
            label: format!("{} [{:.1} sec]", self.label, position),
            image,
        });

        if self.frames.len() >= self.expected_frames() {
            self.state = CaptureState::Done;
            log::info!(
                "Frame capture finished: [{}] ({} frames)",
                self.source_url,
                self.frames.len()
            );
        } else {
            // Positions are derived from the frame count so repeated additions cannot drift
            let next = (self.frames.len() + 1) as f64 * settings.interval;
            element.set_current_time(next);
        }

        vec![RowUpdate::Progress(self.progress())]
    }

    fn fail(&mut self, error: MediaError) -> Vec<RowUpdate> {
        log::warn!("Frame capture failed for [{}]: {}", self.source_url, error);
        self.state = CaptureState::Error;
        self.frames.clear();
        self.capture_due = None;
        self.error = Some(error);
        // Unblock the list: a failed row counts as fully loaded and finished
        vec![RowUpdate::Duration(1.0), RowUpdate::Progress(1.0)]
    }
}
