pub mod bridge;
pub mod command_agent;

pub use bridge::*;
pub use command_agent::*;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::VideoSource;

/// One answer of the agent, paired by position with the submitted url
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedUrl {
    pub original: String,
    pub transformed: String,
}

/// External collaborator that rewrites submitted urls (e.g. a page url into a playable stream)
pub trait TransformAgent: Send + Sync {
    fn name(&self) -> &str;
    fn transform(&self, urls: &[String]) -> anyhow::Result<Vec<TransformedUrl>>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("transform agent failed: {0}")]
    Agent(String),
    #[error("transform agent returned {got} urls for {expected} submitted")]
    LengthMismatch { expected: usize, got: usize },
    #[error("transform agent did not answer within {}s", .0.as_secs())]
    TimedOut(Duration),
    #[error("transform was cancelled")]
    Cancelled,
    #[error("transform agent stopped without answering")]
    Disconnected,
}

/// Substitute the agent's urls into the submitted entries.
///
/// The transformed url becomes the playback source and the original url the
/// label, unless the entry already carried its own label.
pub fn merge_transformed(
    entries: &[VideoSource],
    transformed: &[TransformedUrl],
) -> Result<Vec<VideoSource>, TransformError> {
    if entries.len() != transformed.len() {
        return Err(TransformError::LengthMismatch {
            expected: entries.len(),
            got: transformed.len(),
        });
    }

    let merged = entries
        .iter()
        .zip(transformed)
        .map(|(entry, result)| {
            if result.original != entry.url {
                log::warn!(
                    "Transform agent answered for {} at the position of {}",
                    result.original,
                    entry.url
                );
            }

            let url = if result.transformed.trim().is_empty() {
                log::warn!("Transform agent returned an empty url for {}, using it as is", entry.url);
                entry.url.clone()
            } else {
                result.transformed.trim().to_string()
            };

            VideoSource {
                url,
                label: entry.display_label().to_string(),
                custom_thumbnail: entry.custom_thumbnail.clone(),
            }
        })
        .collect();

    Ok(merged)
}
