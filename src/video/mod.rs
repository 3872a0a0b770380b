pub mod capture;
pub mod ffmpeg_element;
pub mod ffmpeg_manager;
pub mod media_element;
pub mod processor;
pub mod thumbnail;

#[cfg(test)]
pub mod fake_element;

pub use capture::*;
pub use ffmpeg_element::*;
pub use ffmpeg_manager::{configure, FfmpegTools};
pub use media_element::*;
pub use thumbnail::*;
