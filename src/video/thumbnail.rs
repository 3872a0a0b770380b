use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::mpsc;
use std::thread;

use image::RgbaImage;
use lru::LruCache;

use crate::core::LocalFileRegistry;
use crate::video::media_element::MediaError;
use crate::video::processor::VideoProcessor;

const THUMBNAIL_CACHE_SIZE: usize = 64;

#[derive(Debug)]
struct ThumbnailJob {
    url: String,
    src: String,
}

#[derive(Debug)]
struct ThumbnailResult {
    url: String,
    image: Result<RgbaImage, MediaError>,
}

/// Custom label-cell thumbnails, loaded in the background and kept as textures
pub struct ThumbnailCache {
    textures: LruCache<String, egui::TextureHandle>,
    /// Requested but not yet delivered
    pending: HashSet<String>,
    /// Loads that failed are not retried until the cache is cleared
    failed: HashSet<String>,
    registry: LocalFileRegistry,
    job_sender: mpsc::Sender<ThumbnailJob>,
    result_receiver: mpsc::Receiver<ThumbnailResult>,
}

impl ThumbnailCache {
    pub fn new(registry: LocalFileRegistry) -> Self {
        let (job_sender, job_receiver) = mpsc::channel::<ThumbnailJob>();
        let (result_sender, result_receiver) = mpsc::channel::<ThumbnailResult>();

        thread::spawn(move || Self::thumbnail_worker(job_receiver, result_sender));

        Self {
            textures: LruCache::new(
                NonZeroUsize::new(THUMBNAIL_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            ),
            pending: HashSet::new(),
            failed: HashSet::new(),
            registry,
            job_sender,
            result_receiver,
        }
    }

    /// Returns the texture when loaded, otherwise starts loading it
    pub fn request(&mut self, url: &str) -> Option<egui::TextureHandle> {
        if let Some(texture) = self.textures.get(url) {
            return Some(texture.clone());
        }
        if self.pending.contains(url) || self.failed.contains(url) {
            return None;
        }

        let src = if LocalFileRegistry::is_local_url(url) {
            match self.registry.resolve(url) {
                Some(path) => path.to_string_lossy().to_string(),
                None => {
                    log::warn!("Thumbnail reference {} is no longer available", url);
                    self.failed.insert(url.to_string());
                    return None;
                }
            }
        } else {
            url.to_string()
        };

        self.pending.insert(url.to_string());
        let job = ThumbnailJob { url: url.to_string(), src };
        if self.job_sender.send(job).is_err() {
            log::error!("Thumbnail worker is gone, cannot load {}", url);
            self.pending.remove(url);
            self.failed.insert(url.to_string());
        }
        None
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.pending.contains(url)
    }

    #[cfg(test)]
    pub fn has_failed(&self, url: &str) -> bool {
        self.failed.contains(url)
    }

    /// Upload finished loads as textures (call from the UI thread)
    pub fn process_completed(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.result_receiver.try_recv() {
            self.pending.remove(&result.url);

            match result.image {
                Ok(image) => {
                    let size = [image.width() as usize, image.height() as usize];
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                    let texture = ctx.load_texture(
                        format!("thumbnail_{}", result.url),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.textures.put(result.url, texture);
                }
                Err(e) => {
                    log::error!("Failed to load thumbnail {}: {}", result.url, e);
                    self.failed.insert(result.url);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.failed.clear();
    }

    fn thumbnail_worker(
        job_receiver: mpsc::Receiver<ThumbnailJob>,
        result_sender: mpsc::Sender<ThumbnailResult>,
    ) {
        while let Ok(job) = job_receiver.recv() {
            let image = VideoProcessor::load_image(&job.src);
            if result_sender.send(ThumbnailResult { url: job.url, image }).is_err() {
                break;
            }
        }
    }
}
