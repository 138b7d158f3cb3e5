/// An open top-level window, as presented to the decision model.
#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub title: String,
    pub id: u32,
}

pub trait WindowLister: Send + Sync {
    fn list(&self) -> Vec<WindowInfo>;
}

/// Enumerates top-level windows via xcap. Untitled windows are skipped;
/// enumeration failures yield an empty list (the prompt simply omits the
/// section).
pub struct XcapWindowLister;

impl XcapWindowLister {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XcapWindowLister {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowLister for XcapWindowLister {
    fn list(&self) -> Vec<WindowInfo> {
        let windows = match xcap::Window::all() {
            Ok(w) => w,
            Err(e) => {
                tracing::debug!(error = %e, "window enumeration failed");
                return Vec::new();
            }
        };

        windows
            .iter()
            .filter_map(|w| {
                let title = w.title().ok()?;
                if title.trim().is_empty() {
                    return None;
                }
                Some(WindowInfo {
                    title,
                    id: w.id().unwrap_or(0),
                })
            })
            .collect()
    }
}
