use std::io::Cursor;

use async_trait::async_trait;

use crate::errors::{AgentError, AgentResult};

/// Fixed resolution the decision model reasons over, independent of the
/// actual device resolution.
pub const ANALYSIS_WIDTH: u32 = 1280;
pub const ANALYSIS_HEIGHT: u32 = 720;

#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    pub width: u32,
    pub height: u32,
}

impl CaptureOptions {
    pub fn analysis() -> Self {
        Self {
            width: ANALYSIS_WIDTH,
            height: ANALYSIS_HEIGHT,
        }
    }
}

/// One captured frame, PNG-encoded at the requested resolution. The dedup
/// heuristic relies on visually similar frames producing comparably sized
/// payloads.
#[derive(Debug, Clone)]
pub struct Frame {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self, options: CaptureOptions) -> AgentResult<Frame>;

    /// Full physical bounds of the primary display, for coordinate
    /// scaling. Not the usable/work area.
    fn device_resolution(&self) -> AgentResult<(u32, u32)>;
}

/// Captures the primary monitor via xcap and downscales to the analysis
/// resolution.
pub struct XcapFrameSource;

impl XcapFrameSource {
    pub fn new() -> Self {
        Self
    }

    fn primary_monitor() -> AgentResult<xcap::Monitor> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| AgentError::Perception(format!("failed to enumerate monitors: {e}")))?;
        for monitor in monitors {
            match monitor.is_primary() {
                Ok(true) => return Ok(monitor),
                Ok(false) => continue,
                Err(e) => {
                    return Err(AgentError::Perception(format!(
                        "failed to query monitor: {e}"
                    )))
                }
            }
        }
        Err(AgentError::Perception("no primary monitor found".into()))
    }
}

impl Default for XcapFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameSource for XcapFrameSource {
    async fn capture(&self, options: CaptureOptions) -> AgentResult<Frame> {
        let monitor = Self::primary_monitor()?;
        let image = monitor
            .capture_image()
            .map_err(|e| AgentError::Perception(format!("screen capture failed: {e}")))?;

        let scaled = image::imageops::resize(
            &image,
            options.width,
            options.height,
            image::imageops::FilterType::Triangle,
        );

        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(scaled)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| AgentError::Perception(format!("PNG encoding failed: {e}")))?;

        tracing::debug!(
            bytes = png.len(),
            width = options.width,
            height = options.height,
            "frame captured"
        );

        Ok(Frame {
            png,
            width: options.width,
            height: options.height,
        })
    }

    fn device_resolution(&self) -> AgentResult<(u32, u32)> {
        let monitor = Self::primary_monitor()?;
        let width = monitor
            .width()
            .map_err(|e| AgentError::Perception(format!("failed to read monitor width: {e}")))?;
        let height = monitor
            .height()
            .map_err(|e| AgentError::Perception(format!("failed to read monitor height: {e}")))?;
        Ok((width, height))
    }
}
