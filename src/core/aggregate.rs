use std::collections::HashMap;

use crate::core::RowId;

/// What one row has reported so far
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RowReport {
    pub duration: Option<f64>,
    pub progress: f64,
}

/// Collects duration and progress reports from every row of one list.
///
/// Rows only ever write their own slice; the list reads the totals to decide
/// how many frame columns to lay out.
#[derive(Debug, Clone)]
pub struct ListAggregator {
    row_ids: Vec<RowId>,
    reports: HashMap<RowId, RowReport>,
    interval: f64,
}

impl ListAggregator {
    pub fn new(row_ids: Vec<RowId>, interval: f64) -> Self {
        Self {
            row_ids,
            reports: HashMap::new(),
            interval,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn row_count(&self) -> usize {
        self.row_ids.len()
    }

    pub fn report(&self, id: &RowId) -> RowReport {
        self.reports.get(id).copied().unwrap_or_default()
    }

    pub fn report_duration(&mut self, id: &RowId, duration: f64) {
        if !self.row_ids.contains(id) {
            log::debug!("Ignoring duration report for unknown row {}", id);
            return;
        }
        self.reports.entry(id.clone()).or_default().duration = Some(duration);
    }

    pub fn report_progress(&mut self, id: &RowId, progress: f64) {
        if !self.row_ids.contains(id) {
            log::debug!("Ignoring progress report for unknown row {}", id);
            return;
        }
        self.reports.entry(id.clone()).or_default().progress = progress.clamp(0.0, 1.0);
    }

    /// Forget what a row reported, used when it restarts with new parameters
    pub fn reset_row(&mut self, id: &RowId) {
        self.reports.remove(id);
    }

    fn durations(&self) -> Vec<f64> {
        self.row_ids
            .iter()
            .filter_map(|id| self.reports.get(id).and_then(|report| report.duration))
            .filter(|duration| *duration > 0.0)
            .collect()
    }

    pub fn all_metadata_loaded(&self) -> bool {
        self.durations().len() == self.row_ids.len()
    }

    /// Fraction of rows whose duration is known, `None` for an empty list
    pub fn metadata_progress(&self) -> Option<f64> {
        if self.row_ids.is_empty() {
            return None;
        }
        Some(self.durations().len() as f64 / self.row_ids.len() as f64)
    }

    /// Shared column count; zero until every row knows its duration
    pub fn frame_columns(&self) -> usize {
        if self.row_ids.is_empty() || !self.all_metadata_loaded() || self.interval <= 0.0 {
            return 0;
        }

        let longest = self.durations().into_iter().fold(0.0_f64, f64::max);
        expected_frame_count(longest, self.interval)
    }

    /// Average progress over all rows, available once every duration is known
    pub fn overall_progress(&self) -> Option<f64> {
        if self.row_ids.is_empty() || !self.all_metadata_loaded() {
            return None;
        }

        let total: f64 = self.row_ids.iter().map(|id| self.report(id).progress).sum();
        Some(total / self.row_ids.len() as f64)
    }

    pub fn column_headers(&self) -> Vec<String> {
        (0..self.frame_columns())
            .map(|idx| format!("{:.1} sec", (idx + 1) as f64 * self.interval))
            .collect()
    }
}

/// `floor(duration / interval)`, tolerant of float noise such as `0.3 / 0.1`
pub fn expected_frame_count(duration: f64, interval: f64) -> usize {
    if !duration.is_finite() || !interval.is_finite() || duration <= 0.0 || interval <= 0.0 {
        return 0;
    }
    (duration / interval + 1e-9).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(count: usize) -> Vec<RowId> {
        (0..count).map(|idx| RowId::new("v.mp4", idx)).collect()
    }

    #[test]
    fn test_no_columns_until_all_durations_known() {
        let rows = ids(3);
        let mut aggregator = ListAggregator::new(rows.clone(), 2.0);

        aggregator.report_duration(&rows[0], 9.0);
        aggregator.report_duration(&rows[1], 13.0);
        assert!(!aggregator.all_metadata_loaded());
        assert_eq!(aggregator.frame_columns(), 0);
        assert!(aggregator.overall_progress().is_none());
        assert_eq!(aggregator.metadata_progress(), Some(2.0 / 3.0));

        aggregator.report_duration(&rows[2], 5.0);
        assert!(aggregator.all_metadata_loaded());
        assert_eq!(aggregator.frame_columns(), 6);
        assert_eq!(aggregator.metadata_progress(), Some(1.0));
    }

    #[test]
    fn test_overall_progress_is_average() {
        let rows = ids(2);
        let mut aggregator = ListAggregator::new(rows.clone(), 1.0);
        aggregator.report_duration(&rows[0], 4.0);
        aggregator.report_duration(&rows[1], 4.0);

        aggregator.report_progress(&rows[0], 1.0);
        aggregator.report_progress(&rows[1], 0.5);
        assert_eq!(aggregator.overall_progress(), Some(0.75));
    }

    #[test]
    fn test_column_headers() {
        let rows = ids(1);
        let mut aggregator = ListAggregator::new(rows.clone(), 2.0);
        aggregator.report_duration(&rows[0], 9.0);
        assert_eq!(
            aggregator.column_headers(),
            vec!["2.0 sec", "4.0 sec", "6.0 sec", "8.0 sec"]
        );
    }

    #[test]
    fn test_unknown_rows_are_ignored() {
        let rows = ids(1);
        let mut aggregator = ListAggregator::new(rows.clone(), 1.0);
        let stranger = RowId::new("other.mp4", 0);

        aggregator.report_duration(&stranger, 100.0);
        aggregator.report_progress(&stranger, 1.0);
        assert!(!aggregator.all_metadata_loaded());
        assert_eq!(aggregator.report(&stranger), RowReport::default());
    }

    #[test]
    fn test_reset_row_blocks_columns_again() {
        let rows = ids(1);
        let mut aggregator = ListAggregator::new(rows.clone(), 1.0);
        aggregator.report_duration(&rows[0], 3.0);
        assert_eq!(aggregator.frame_columns(), 3);

        aggregator.reset_row(&rows[0]);
        assert_eq!(aggregator.frame_columns(), 0);
    }

    #[test]
    fn test_empty_list() {
        let aggregator = ListAggregator::new(Vec::new(), 1.0);
        assert_eq!(aggregator.frame_columns(), 0);
        assert!(aggregator.overall_progress().is_none());
        assert!(aggregator.metadata_progress().is_none());
    }

    #[test]
    fn test_expected_frame_count() {
        assert_eq!(expected_frame_count(9.0, 2.0), 4);
        assert_eq!(expected_frame_count(8.0, 2.0), 4);
        assert_eq!(expected_frame_count(0.3, 0.1), 3);
        assert_eq!(expected_frame_count(1.5, 2.0), 0);
        assert_eq!(expected_frame_count(f64::NAN, 1.0), 0);
        assert_eq!(expected_frame_count(10.0, 0.0), 0);
    }
}
