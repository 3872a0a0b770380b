use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::imageops::FilterType;
use image::RgbaImage;
use tokio::sync::mpsc;

use crate::core::LocalFileRegistry;
use crate::video::media_element::{
    MediaBackend, MediaElement, MediaError, MediaEvent, MediaEventKind, SourceToken,
};
use crate::video::processor::{frame_size, VideoInfo, VideoProcessor};

/// Seeks this close to the end retry slightly earlier, ffmpeg yields no frame at the very end
const END_TOLERANCE: f64 = 0.5;

#[derive(Debug)]
enum WorkerCommand {
    Load { token: SourceToken, src: String },
    Seek { token: SourceToken, position: f64 },
}

#[derive(Debug)]
enum WorkerReply {
    Loaded { token: SourceToken, info: VideoInfo },
    Seeked { token: SourceToken, position: f64, frame: RgbaImage },
    Failed { token: SourceToken, error: MediaError },
}

/// Hands out ffmpeg-backed elements that share one async runtime
pub struct FfmpegBackend {
    runtime: Arc<tokio::runtime::Runtime>,
    registry: LocalFileRegistry,
}

impl FfmpegBackend {
    pub fn new(registry: LocalFileRegistry) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("frame-strip-media")
            .build()?;

        Ok(Self {
            runtime: Arc::new(runtime),
            registry,
        })
    }
}

impl MediaBackend for FfmpegBackend {
    fn create_element(&self) -> Box<dyn MediaElement> {
        Box::new(FfmpegMediaElement::spawn(self.runtime.handle(), self.registry.clone()))
    }
}

/// Media element that probes with ffprobe and decodes seek targets with ffmpeg.
///
/// Commands run one after another on a worker task, so a seek issued right
/// after `load` completes after the metadata. Dropping the element ends the worker.
pub struct FfmpegMediaElement {
    commands: mpsc::UnboundedSender<WorkerCommand>,
    replies: mpsc::UnboundedReceiver<WorkerReply>,
    current: Arc<AtomicU64>,
    registry: LocalFileRegistry,
    token: SourceToken,
    src: String,
    current_time: f64,
    info: Option<VideoInfo>,
    frame: Option<Arc<RgbaImage>>,
    local_events: Vec<MediaEvent>,
    paused: bool,
    muted: bool,
}

impl FfmpegMediaElement {
    pub fn spawn(runtime: &tokio::runtime::Handle, registry: LocalFileRegistry) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel::<WorkerCommand>();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel::<WorkerReply>();
        let current = Arc::new(AtomicU64::new(0));

        runtime.spawn(run_worker(command_rx, reply_tx, current.clone()));

        Self {
            commands: command_tx,
            replies: reply_rx,
            current,
            registry,
            token: SourceToken::default(),
            src: String::new(),
            current_time: 0.0,
            info: None,
            frame: None,
            local_events: Vec::new(),
            paused: true,
            muted: true,
        }
    }

    fn send(&mut self, command: WorkerCommand) {
        if let Err(e) = self.commands.send(command) {
            log::error!("Media worker is gone: {}", e);
            self.local_events.push(MediaEvent::new(
                self.token,
                MediaEventKind::Error(MediaError::SourceUnavailable(self.src.clone())),
            ));
        }
    }

    /// Local references resolve to a path at load time; a revoked one fails the load
    fn resolve_source(&self) -> Option<String> {
        if LocalFileRegistry::is_local_url(&self.src) {
            self.registry
                .resolve(&self.src)
                .map(|path| path.to_string_lossy().to_string())
        } else {
            Some(self.src.clone())
        }
    }
}

impl MediaElement for FfmpegMediaElement {
    fn set_source(&mut self, src: &str) -> SourceToken {
        self.token = self.token.next();
        self.current.store(self.token.0, Ordering::SeqCst);
        self.src = src.to_string();
        self.current_time = 0.0;
        self.info = None;
        self.frame = None;
        self.local_events.clear();
        self.token
    }

    fn load(&mut self) {
        match self.resolve_source() {
            Some(src) => {
                log::debug!("Loading media source {}", src);
                self.send(WorkerCommand::Load { token: self.token, src });
            }
            None => {
                log::warn!("Local reference {} is no longer available", self.src);
                self.local_events.push(MediaEvent::new(
                    self.token,
                    MediaEventKind::Error(MediaError::SourceUnavailable(self.src.clone())),
                ));
            }
        }
    }

    fn set_current_time(&mut self, position: f64) {
        let position = match self.info {
            Some(info) => position.clamp(0.0, info.duration),
            None => position.max(0.0),
        };
        self.current_time = position;
        self.send(WorkerCommand::Seek { token: self.token, position });
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn duration(&self) -> Option<f64> {
        self.info.map(|info| info.duration)
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let mut events: Vec<MediaEvent> = self.local_events.drain(..).collect();

        while let Ok(reply) = self.replies.try_recv() {
            let event = match reply {
                WorkerReply::Loaded { token, info } => {
                    if token == self.token {
                        self.info = Some(info);
                    }
                    MediaEvent::new(
                        token,
                        MediaEventKind::LoadedData {
                            duration: info.duration,
                            width: info.width,
                            height: info.height,
                        },
                    )
                }
                WorkerReply::Seeked { token, position, frame } => {
                    if token == self.token {
                        self.current_time = position;
                        self.frame = Some(Arc::new(frame));
                    }
                    MediaEvent::new(token, MediaEventKind::Seeked { position })
                }
                WorkerReply::Failed { token, error } => {
                    MediaEvent::new(token, MediaEventKind::Error(error))
                }
            };

            if event.token == self.token {
                events.push(event);
            } else {
                log::trace!("Dropping reply for abandoned source: {:?}", event.kind);
            }
        }

        events
    }

    fn capture_frame(&self, width: u32) -> Result<Arc<RgbaImage>, MediaError> {
        let frame = self.frame.as_ref().ok_or(MediaError::NoFrame)?;
        let (native_width, native_height) = frame.dimensions();
        let (target_width, target_height) = frame_size(width, native_width, native_height);

        if (target_width, target_height) == (native_width, native_height) {
            return Ok(frame.clone());
        }
        Ok(Arc::new(image::imageops::resize(
            frame.as_ref(),
            target_width,
            target_height,
            FilterType::Triangle,
        )))
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

async fn run_worker(
    mut commands: mpsc::UnboundedReceiver<WorkerCommand>,
    replies: mpsc::UnboundedSender<WorkerReply>,
    current: Arc<AtomicU64>,
) {
    let mut loaded: Option<(SourceToken, String, VideoInfo)> = None;

    while let Some(command) = commands.recv().await {
        let reply = match command {
            WorkerCommand::Load { token, src } => {
                if token.0 != current.load(Ordering::SeqCst) {
                    continue;
                }

                let probe_src = src.clone();
                let result = tokio::task::spawn_blocking(move || VideoProcessor::probe(&probe_src))
                    .await
                    .unwrap_or_else(|e| Err(MediaError::Probe(format!("probe task failed: {}", e))));

                match result {
                    Ok(info) => {
                        log::debug!("Loaded {} (duration: {:.2}s, {}x{})", src, info.duration, info.width, info.height);
                        loaded = Some((token, src, info));
                        WorkerReply::Loaded { token, info }
                    }
                    Err(error) => {
                        loaded = None;
                        WorkerReply::Failed { token, error }
                    }
                }
            }
            WorkerCommand::Seek { token, position } => {
                if token.0 != current.load(Ordering::SeqCst) {
                    continue;
                }
                // Seeks of a source that never loaded are dropped, as after a media error
                let Some((loaded_token, src, info)) = loaded.clone() else {
                    continue;
                };
                if loaded_token != token {
                    continue;
                }

                let position = position.clamp(0.0, info.duration);
                let result = tokio::task::spawn_blocking(move || {
                    VideoProcessor::extract_frame(&src, position).or_else(|e| {
                        if position >= info.duration - END_TOLERANCE {
                            VideoProcessor::extract_frame(&src, (info.duration - END_TOLERANCE).max(0.0))
                        } else {
                            Err(e)
                        }
                    })
                })
                .await
                .unwrap_or_else(|e| Err(MediaError::Decode(format!("decode task failed: {}", e))));

                match result {
                    Ok(frame) => WorkerReply::Seeked { token, position, frame },
                    Err(error) => WorkerReply::Failed { token, error },
                }
            }
        };

        if let Err(e) = replies.send(reply) {
            log::debug!("Media element dropped before reply could be delivered: {}", e);
            break;
        }
    }
}
