use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use rand::Rng;

/// Issued by every `set_source` call; events of an older source carry an older token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceToken(pub u64);

impl SourceToken {
    pub fn next(self) -> Self {
        SourceToken(self.0.wrapping_add(1))
    }
}

/// The one error kind a media element reports: the source could not be loaded or decoded
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MediaError {
    #[error("source is not available: {0}")]
    SourceUnavailable(String),
    #[error("failed to probe source: {0}")]
    Probe(String),
    #[error("source has no video stream")]
    NoVideoStream,
    #[error("source reported an invalid duration: {0}")]
    InvalidDuration(f64),
    #[error("failed to decode frame: {0}")]
    Decode(String),
    #[error("no frame available at the current position")]
    NoFrame,
    #[error("failed to run {tool}: {message}")]
    Spawn { tool: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    /// Metadata and the first frame are available
    LoadedData { duration: f64, width: u32, height: u32 },
    /// A position change finished; the frame at `position` can be captured
    Seeked { position: f64 },
    Error(MediaError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub token: SourceToken,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(token: SourceToken, kind: MediaEventKind) -> Self {
        Self { token, kind }
    }
}

/// A seekable video source whose loads and seeks complete asynchronously.
///
/// Completion is reported through `poll_events`; the frame returned by
/// `capture_frame` is always the one decoded for the most recent finished seek.
pub trait MediaElement {
    /// Replace the source; any in-flight work for the previous source is abandoned
    fn set_source(&mut self, src: &str) -> SourceToken;
    fn load(&mut self);
    fn set_current_time(&mut self, position: f64);
    fn current_time(&self) -> f64;
    fn duration(&self) -> Option<f64>;
    fn poll_events(&mut self) -> Vec<MediaEvent>;
    /// Render the current frame at `min(width, native width)` keeping the aspect ratio
    fn capture_frame(&self, width: u32) -> Result<Arc<RgbaImage>, MediaError>;

    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    fn is_muted(&self) -> bool;
}

/// Creates media elements for new rows
pub trait MediaBackend {
    fn create_element(&self) -> Box<dyn MediaElement>;
}

/// Random pause between a finished seek and the capture, spreading decode load across rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekDelay {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for SeekDelay {
    fn default() -> Self {
        Self { min_ms: 50, max_ms: 150 }
    }
}

impl SeekDelay {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }
}
