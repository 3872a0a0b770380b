use image::RgbaImage;

use crate::video::ffmpeg_manager::{execute_ffmpeg, tools};
use crate::video::media_element::MediaError;

pub struct VideoProcessor;

impl VideoProcessor {
    pub fn probe(src: &str) -> Result<VideoInfo, MediaError> {
        let mut command = tools().ffprobe_command();
        command
            .arg("-v").arg("quiet")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(src);

        let output = execute_ffmpeg(command)?;
        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Probe(format!("ffprobe exited with {}: {}", output.status, error.trim())));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| MediaError::Probe(format!("unreadable ffprobe output: {}", e)))?;
        VideoInfo::from_ffprobe_json(&info)
    }

    /// Decode the frame shown at `timestamp`, at native resolution
    pub fn extract_frame(src: &str, timestamp: f64) -> Result<RgbaImage, MediaError> {
        let mut command = tools().ffmpeg_command();
        command
            .arg("-v").arg("error")
            .arg("-ss").arg(format!("{:.3}", timestamp)) // Seek before input for faster positioning
            .arg("-i").arg(src)
            .arg("-frames:v").arg("1")
            .arg("-f").arg("image2pipe")
            .arg("-vcodec").arg("png")
            .arg("-");

        Self::decode_png_output(command, &format!("{} at {:.3}s", src, timestamp))
    }

    /// Load a still image (custom thumbnails); anything ffmpeg can read works
    pub fn load_image(src: &str) -> Result<RgbaImage, MediaError> {
        let mut command = tools().ffmpeg_command();
        command
            .arg("-v").arg("error")
            .arg("-i").arg(src)
            .arg("-frames:v").arg("1")
            .arg("-f").arg("image2pipe")
            .arg("-vcodec").arg("png")
            .arg("-");

        Self::decode_png_output(command, src)
    }

    fn decode_png_output(command: std::process::Command, what: &str) -> Result<RgbaImage, MediaError> {
        let output = execute_ffmpeg(command)?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Decode(format!("{}: {}", what, error.trim())));
        }
        if output.stdout.is_empty() {
            // ffmpeg exits cleanly when seeking past the last frame
            return Err(MediaError::Decode(format!("{}: no frame produced", what)));
        }

        let image = image::load_from_memory(&output.stdout)
            .map_err(|e| MediaError::Decode(format!("{}: {}", what, e)))?;
        Ok(image.to_rgba8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoInfo {
    pub fn from_ffprobe_json(info: &serde_json::Value) -> Result<Self, MediaError> {
        let empty_vec = vec![];
        let streams = info["streams"].as_array().unwrap_or(&empty_vec);
        let video = streams
            .iter()
            .find(|stream| stream["codec_type"].as_str() == Some("video"))
            .ok_or(MediaError::NoVideoStream)?;

        let width = video["width"].as_u64().unwrap_or(0) as u32;
        let height = video["height"].as_u64().unwrap_or(0) as u32;
        if width == 0 || height == 0 {
            return Err(MediaError::Probe("video stream has no dimensions".to_string()));
        }

        // Container duration first, stream duration as a fallback
        let duration = [&info["format"]["duration"], &video["duration"]]
            .iter()
            .find_map(|value| value.as_str().and_then(|s| s.parse::<f64>().ok()))
            .ok_or_else(|| MediaError::Probe("no duration reported".to_string()))?;

        Ok(Self { duration, width, height })
    }
}

/// Output size for a captured frame: `min(target, native)` wide, native aspect ratio
pub fn frame_size(target_width: u32, native_width: u32, native_height: u32) -> (u32, u32) {
    if native_width == 0 || native_height == 0 {
        return (target_width.max(1), target_width.max(1));
    }

    let width = target_width.min(native_width).max(1);
    let height = (width as f64 * native_height as f64 / native_width as f64).round() as u32;
    (width, height.max(1))
}
