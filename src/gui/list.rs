use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::core::{ListAggregator, RowId};
use crate::gui::form::GenerateRequest;
use crate::gui::list_row::ListRow;
use crate::video::{CaptureSettings, MediaBackend, RowUpdate, SeekDelay, ThumbnailCache};

/// The generated frame table: one row per submitted video, sharing one column layout
pub struct ListView {
    rows: Vec<ListRow>,
    aggregator: ListAggregator,
    settings: Option<CaptureSettings>,
    display_vertical: bool,
    playing: bool,
    delay: SeekDelay,
}

impl ListView {
    pub fn new(delay: SeekDelay) -> Self {
        Self {
            rows: Vec::new(),
            aggregator: ListAggregator::new(Vec::new(), 1.0),
            settings: None,
            display_vertical: false,
            playing: false,
            delay,
        }
    }

    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn aggregator(&self) -> &ListAggregator {
        &self.aggregator
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn display_vertical(&self) -> bool {
        self.display_vertical
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rebuild the rows for a new request. Rows whose id (url and position)
    /// is still present are kept, and keep their frames if nothing else changed.
    pub fn set_request(&mut self, request: &GenerateRequest, backend: &dyn MediaBackend, now: Instant) {
        let settings = CaptureSettings {
            interval: request.interval,
            width: request.width,
        };

        let mut previous: HashMap<RowId, ListRow> = self
            .rows
            .drain(..)
            .map(|row| (row.id().clone(), row))
            .collect();

        let ids: Vec<RowId> = request
            .videos
            .iter()
            .enumerate()
            .map(|(idx, video)| RowId::new(&video.url, idx))
            .collect();
        let mut aggregator = ListAggregator::new(ids.clone(), request.interval);

        for (id, video) in ids.into_iter().zip(&request.videos) {
            let mut row = match previous.remove(&id) {
                Some(mut row) => {
                    row.set_source(video.clone());
                    row
                }
                None => ListRow::new(id.clone(), video.clone(), backend.create_element(), self.delay),
            };

            if row.start(settings) {
                aggregator.reset_row(&id);
            } else {
                // Unchanged row: carry over what it already reported
                let capture = row.capture();
                if capture.is_error() {
                    aggregator.report_duration(&id, 1.0);
                } else if let Some(duration) = capture.duration() {
                    aggregator.report_duration(&id, duration);
                }
                aggregator.report_progress(&id, capture.progress());
            }

            row.apply_playback(self.playing, now);
            self.rows.push(row);
        }

        if !previous.is_empty() {
            log::debug!("Dropped {} rows no longer in the list", previous.len());
        }

        log::info!(
            "Generating frames for {} videos every {}s at {}px",
            self.rows.len(),
            request.interval,
            request.width
        );

        self.aggregator = aggregator;
        self.settings = Some(settings);
        self.display_vertical = request.display_vertical;
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.aggregator = ListAggregator::new(Vec::new(), self.aggregator.interval());
        self.settings = None;
    }

    /// Advance every row and fold their reports into the aggregator
    pub fn update(&mut self, now: Instant) {
        for row in &mut self.rows {
            for update in row.update(now) {
                match update {
                    RowUpdate::Duration(duration) => self.aggregator.report_duration(row.id(), duration),
                    RowUpdate::Progress(progress) => self.aggregator.report_progress(row.id(), progress),
                }
            }
        }
    }

    pub fn set_playing(&mut self, playing: bool, now: Instant) {
        self.playing = playing;
        for row in &mut self.rows {
            row.apply_playback(playing, now);
        }
    }

    pub fn toggle_playback(&mut self, now: Instant) {
        self.set_playing(!self.playing, now);
    }

    pub fn sync_textures(&mut self, ctx: &egui::Context) {
        for row in &mut self.rows {
            row.sync_textures(ctx);
        }
    }

    /// Agent indicator, metadata and generation progress. Returns `true` when
    /// the user asked to cancel the running transform.
    /// Stage and progress shown in the status bar; nothing once generation is complete
    pub fn progress_indicator(&self) -> Option<(&'static str, f64)> {
        match self.aggregator.overall_progress() {
            Some(progress) => (progress < 1.0).then_some(("Generating", progress)),
            None => self
                .aggregator
                .metadata_progress()
                .filter(|progress| *progress < 1.0)
                .map(|progress| ("Loading metadata", progress)),
        }
    }

    pub fn show_status(&mut self, ui: &mut egui::Ui, transform_elapsed: Option<Duration>) -> bool {
        let mut cancel = false;

        ui.horizontal(|ui| {
            if let Some(elapsed) = transform_elapsed {
                ui.spinner();
                ui.label(format!("Resolving urls... {}s", elapsed.as_secs()));
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
                ui.separator();
            }

            if self.rows.is_empty() {
                return;
            }

            let label = if self.playing { "⏸ Pause" } else { "▶ Play" };
            if ui.button(label).clicked() {
                self.toggle_playback(Instant::now());
            }

            if let Some((stage, progress)) = self.progress_indicator() {
                ui.add(
                    egui::ProgressBar::new(progress as f32)
                        .desired_width(200.0)
                        .text(format!("{}: {:.0}%", stage, progress * 100.0)),
                );
            }
        });

        cancel
    }

    pub fn show(&self, ui: &mut egui::Ui, thumbnails: &mut ThumbnailCache, now: Instant) {
        let Some(settings) = self.settings else {
            return;
        };
        let headers = self.aggregator.column_headers();

        egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
            egui::Grid::new("frame_table")
                .striped(true)
                .spacing([6.0, 6.0])
                .show(ui, |ui| {
                    if self.display_vertical {
                        self.show_vertical(ui, thumbnails, &headers, settings, now);
                    } else {
                        self.show_horizontal(ui, thumbnails, &headers, settings, now);
                    }
                });
        });
    }

    fn show_horizontal(
        &self,
        ui: &mut egui::Ui,
        thumbnails: &mut ThumbnailCache,
        headers: &[String],
        settings: CaptureSettings,
        now: Instant,
    ) {
        ui.strong("Video");
        for header in headers {
            ui.strong(header);
        }
        ui.end_row();

        for row in &self.rows {
            row.show_label_cell(ui, thumbnails, now);
            if row.capture().is_error() {
                row.show_error_cell(ui);
            } else {
                for column in 0..headers.len() {
                    row.show_frame_cell(ui, column, settings.width);
                }
            }
            ui.end_row();
        }
    }

    /// Transposed table: one column per video, one row per capture position
    fn show_vertical(
        &self,
        ui: &mut egui::Ui,
        thumbnails: &mut ThumbnailCache,
        headers: &[String],
        settings: CaptureSettings,
        now: Instant,
    ) {
        ui.label("");
        for row in &self.rows {
            row.show_label_cell(ui, thumbnails, now);
        }
        ui.end_row();

        let any_error = self.rows.iter().any(|row| row.capture().is_error());
        let lines = headers.len().max(usize::from(any_error));

        for line in 0..lines {
            match headers.get(line) {
                Some(header) => ui.strong(header),
                None => ui.label(""),
            };
            for row in &self.rows {
                if row.capture().is_error() {
                    if line == 0 {
                        row.show_error_cell(ui);
                    } else {
                        ui.label("");
                    }
                } else {
                    row.show_frame_cell(ui, line, settings.width);
                }
            }
            ui.end_row();
        }
    }
}
