use serde::{Deserialize, Serialize};
use std::fmt;

/// A video entry as typed into the form or selected from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    pub url: String,
    pub label: String,
    pub custom_thumbnail: Option<String>,
}

impl VideoSource {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            custom_thumbnail: None,
        }
    }

    /// Parse a single `url;thumbnail;label` entry. Only the url is required.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.trim().splitn(3, ';');

        let url = fields.next().map(str::trim).unwrap_or_default();
        if url.is_empty() {
            return None;
        }

        let custom_thumbnail = fields
            .next()
            .map(str::trim)
            .filter(|thumb| !thumb.is_empty())
            .map(str::to_string);
        let label = fields.next().map(str::trim).unwrap_or_default();

        Some(Self {
            url: url.to_string(),
            label: label.to_string(),
            custom_thumbnail,
        })
    }

    /// Label shown next to the frames; falls back to the url when no label was given
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.url
        } else {
            &self.label
        }
    }
}

/// Parse the newline separated url list from the form
pub fn parse_source_list(text: &str) -> Vec<VideoSource> {
    text.lines().filter_map(VideoSource::parse).collect()
}

/// Identity of a row: the same url may appear several times in one list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowId(String);

impl RowId {
    pub fn new(url: &str, index: usize) -> Self {
        Self(format!("{}-idx_{}", url, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
