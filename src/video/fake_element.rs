//! Scripted media element used by the state machine and list tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::video::media_element::{
    MediaBackend, MediaElement, MediaError, MediaEvent, MediaEventKind, SourceToken,
};
use crate::video::processor::frame_size;

#[derive(Debug, Clone)]
pub struct FakeSource {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Seeking to this position (or later) fails with a decode error
    pub fail_from: Option<f64>,
    pub color: [u8; 3],
}

impl FakeSource {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            width: 640,
            height: 360,
            fail_from: None,
            color: [10, 20, 30],
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn failing_from(mut self, position: f64) -> Self {
        self.fail_from = Some(position);
        self
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }
}

pub type FakeCatalog = Rc<RefCell<HashMap<String, FakeSource>>>;

/// Answers loads and seeks from a catalog of known sources.
///
/// Events stay queued across `set_source` calls, so a test can observe what
/// happens when completions of an abandoned source arrive late.
pub struct FakeMediaElement {
    catalog: FakeCatalog,
    token: SourceToken,
    src: String,
    loaded: Option<FakeSource>,
    load_failed: bool,
    current_time: f64,
    frame: Option<(FakeSource, f64)>,
    queue: VecDeque<MediaEvent>,
    pub seeks: Vec<f64>,
    paused: bool,
    muted: bool,
}

impl FakeMediaElement {
    pub fn new(catalog: FakeCatalog) -> Self {
        Self {
            catalog,
            token: SourceToken::default(),
            src: String::new(),
            loaded: None,
            load_failed: false,
            current_time: 0.0,
            frame: None,
            queue: VecDeque::new(),
            seeks: Vec::new(),
            paused: true,
            muted: false,
        }
    }

    pub fn with_sources(sources: Vec<(&str, FakeSource)>) -> Self {
        let catalog: FakeCatalog = Rc::new(RefCell::new(
            sources.into_iter().map(|(url, source)| (url.to_string(), source)).collect(),
        ));
        Self::new(catalog)
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    fn lookup(&self) -> Option<FakeSource> {
        self.catalog.borrow().get(&self.src).cloned()
    }
}

impl MediaElement for FakeMediaElement {
    fn set_source(&mut self, src: &str) -> SourceToken {
        self.token = self.token.next();
        self.src = src.to_string();
        self.loaded = None;
        self.load_failed = false;
        self.current_time = 0.0;
        self.frame = None;
        self.token
    }

    fn load(&mut self) {
        match self.lookup() {
            Some(source) => {
                self.queue.push_back(MediaEvent::new(
                    self.token,
                    MediaEventKind::LoadedData {
                        duration: source.duration,
                        width: source.width,
                        height: source.height,
                    },
                ));
                self.loaded = Some(source);
            }
            None => {
                self.load_failed = true;
                self.queue.push_back(MediaEvent::new(
                    self.token,
                    MediaEventKind::Error(MediaError::SourceUnavailable(self.src.clone())),
                ));
            }
        }
    }

    fn set_current_time(&mut self, position: f64) {
        if self.load_failed {
            return;
        }
        let Some(source) = self.loaded.clone() else {
            return;
        };

        let position = position.clamp(0.0, source.duration.max(0.0));
        self.current_time = position;
        self.seeks.push(position);

        let kind = match source.fail_from {
            Some(fail_from) if position >= fail_from => {
                MediaEventKind::Error(MediaError::Decode(format!("corrupt data at {:.1}", position)))
            }
            _ => MediaEventKind::Seeked { position },
        };
        self.queue.push_back(MediaEvent::new(self.token, kind));
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn duration(&self) -> Option<f64> {
        self.loaded.as_ref().map(|source| source.duration)
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let events: Vec<MediaEvent> = self.queue.drain(..).collect();
        for event in &events {
            if event.token != self.token {
                continue;
            }
            if let MediaEventKind::Seeked { position } = event.kind {
                if let Some(source) = self.loaded.clone() {
                    self.frame = Some((source, position));
                }
            }
        }
        events
    }

    fn capture_frame(&self, width: u32) -> Result<Arc<RgbaImage>, MediaError> {
        let (source, position) = self.frame.clone().ok_or(MediaError::NoFrame)?;
        let (frame_width, frame_height) = frame_size(width, source.width, source.height);
        // Red channel records the position the frame was decoded at
        let pixel = Rgba([(position * 10.0) as u8, source.color[1], source.color[2], 255]);
        Ok(Arc::new(RgbaImage::from_pixel(frame_width, frame_height, pixel)))
    }

    fn play(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}

/// Backend handing out fake elements that share one catalog
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub catalog: FakeCatalog,
}

impl FakeBackend {
    pub fn with_sources(sources: Vec<(&str, FakeSource)>) -> Self {
        Self {
            catalog: Rc::new(RefCell::new(
                sources.into_iter().map(|(url, source)| (url.to_string(), source)).collect(),
            )),
        }
    }
}

impl MediaBackend for FakeBackend {
    fn create_element(&self) -> Box<dyn MediaElement> {
        Box::new(FakeMediaElement::new(self.catalog.clone()))
    }
}
