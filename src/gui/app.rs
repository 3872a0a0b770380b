use eframe::egui;
use std::sync::Arc;
use std::time::Instant;

use crate::core::{AppConfig, LocalFileRegistry, StartupParams};
use crate::gui::form::{FormState, SubmitAction};
use crate::gui::list::ListView;
use crate::transform::{
    CommandTransformAgent, TransformAgent, TransformBridge, TransformError, TransformPoll,
};
use crate::video::{FfmpegBackend, MediaBackend, SeekDelay, ThumbnailCache};

pub struct FrameStripApp {
    pub config: AppConfig,
    pub params: StartupParams,
    pub form: FormState,
    pub list: ListView,
    pub bridge: TransformBridge,
    pub registry: LocalFileRegistry,
    pub thumbnails: ThumbnailCache,
    pub status_message: String,
    backend: Box<dyn MediaBackend>,
}

impl FrameStripApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        params: StartupParams,
    ) -> anyhow::Result<Self> {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let registry = LocalFileRegistry::new();
        let backend = FfmpegBackend::new(registry.clone())?;

        let agent = config
            .transform_agent
            .as_ref()
            .and_then(CommandTransformAgent::detect)
            .map(|agent| Arc::new(agent) as Arc<dyn TransformAgent>);

        Ok(Self::with_backend(config, params, Box::new(backend), agent, registry))
    }

    pub fn with_backend(
        config: AppConfig,
        params: StartupParams,
        backend: Box<dyn MediaBackend>,
        agent: Option<Arc<dyn TransformAgent>>,
        registry: LocalFileRegistry,
    ) -> Self {
        let (min_ms, max_ms) = config.seek_delay_bounds();
        let bridge = TransformBridge::new(agent, config.transform_timeout());

        let mut app = Self {
            form: FormState::from_params(&params),
            list: ListView::new(SeekDelay::new(min_ms, max_ms)),
            bridge,
            thumbnails: ThumbnailCache::new(registry.clone()),
            registry,
            status_message: String::new(),
            backend,
            config,
            params,
        };

        if !app.params.urls.is_empty() {
            log::info!("Starting with {} urls from the startup parameters", app.params.urls.len());
            app.submit_form(Instant::now());
        }

        app
    }

    pub fn submit_form(&mut self, now: Instant) {
        match self.form.submit(self.bridge.is_available()) {
            SubmitAction::Generate(request) => {
                self.status_message.clear();
                self.list.set_request(&request, self.backend.as_ref(), now);
            }
            SubmitAction::Transform { entries } => match self.bridge.submit(entries) {
                Ok(_) => self.status_message.clear(),
                Err(e) => {
                    self.form.cancel_transform();
                    self.status_message = e.to_string();
                }
            },
            SubmitAction::Invalid(reason) => {
                log::warn!("Form rejected: {}", reason);
                self.status_message = reason;
            }
            SubmitAction::Nothing => {}
        }
    }

    pub fn poll_transform(&mut self, now: Instant) {
        match self.bridge.poll(now) {
            TransformPoll::Finished(Ok(sources)) => {
                if let Some(request) = self.form.finish_transform(sources) {
                    self.list.set_request(&request, self.backend.as_ref(), now);
                }
            }
            TransformPoll::Finished(Err(e)) => {
                self.form.cancel_transform();
                self.status_message = e.to_string();
            }
            TransformPoll::Idle | TransformPoll::Running => {}
        }
    }

    pub fn cancel_transform(&mut self) {
        if self.bridge.cancel() {
            self.form.cancel_transform();
            self.status_message = TransformError::Cancelled.to_string();
        }
    }

    /// Drop every row with its frames and the loaded thumbnails
    pub fn clear_list(&mut self) {
        log::info!("Clearing {} rows", self.list.rows().len());
        self.list.clear();
        self.thumbnails.clear();
        self.status_message.clear();
    }

    /// Everything that does not need a UI context
    pub fn update_state(&mut self, now: Instant) {
        self.poll_transform(now);
        self.list.update(now);
    }

    fn pick_local_files(&mut self, paths: Vec<std::path::PathBuf>) {
        self.form.set_local_files(&self.registry, &paths);

        let directory = paths.first().and_then(|path| path.parent()).map(|dir| dir.to_path_buf());
        if directory.is_some() && directory != self.config.last_local_directory {
            self.config.last_local_directory = directory;
            if let Err(e) = self.config.save() {
                log::error!("Failed to save config: {}", e);
            }
        }
    }

    fn show_header(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Frame Strip");
            ui.label("Still frames of every video at a fixed interval");
            if let Some(name) = self.bridge.agent_name() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.small(format!("Url transform: {}", name));
                });
            }
        });
    }
}

impl eframe::App for FrameStripApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.update_state(now);
        self.thumbnails.process_completed(ctx);
        self.list.sync_textures(ctx);

        if !self.params.hide_header {
            egui::TopBottomPanel::top("header").show(ctx, |ui| {
                self.show_header(ui);
            });
        }

        if !self.params.hide_form {
            egui::TopBottomPanel::top("form").show(ctx, |ui| {
                let busy = self.bridge.is_running();
                let response = self.form.show(ui, self.config.last_local_directory.as_deref(), busy);

                if let Some(paths) = response.picked_files {
                    self.pick_local_files(paths);
                }
                if response.submitted {
                    self.submit_form(now);
                }
                if response.cleared {
                    self.clear_list();
                }

                if !self.status_message.is_empty() {
                    let color = ui.visuals().warn_fg_color;
                    ui.colored_label(color, &self.status_message);
                }
            });
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            if self.list.show_status(ui, self.bridge.elapsed(now)) {
                self.cancel_transform();
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.list.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label("Enter video urls or pick local files, then press Generate");
                });
            } else {
                self.list.show(ui, &mut self.thumbnails, now);
            }
        });

        // Captures are due on timers, keep frames coming
        ctx.request_repaint();
    }
}
