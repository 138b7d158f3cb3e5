/// Ordered model candidates with the currently active index. The static
/// fallback list stays as the safety net; catalog discovery prepends its
/// preferred candidate so it is tried first.
#[derive(Debug, Clone)]
pub struct ModelRoster {
    candidates: Vec<String>,
    active: usize,
}

/// Name-substring preference order, most capable/fastest family first,
/// generic "flash" next, generic "pro" last.
const PREFERENCE: [&str; 5] = ["2.5-flash", "2.0-flash", "1.5-flash", "flash", "pro"];

impl ModelRoster {
    pub fn new(fallback: Vec<String>) -> Self {
        Self {
            candidates: fallback,
            active: 0,
        }
    }

    /// Picks the preferred candidate out of a discovered catalog and
    /// prepends it to the fallback list. A catalog with no recognizable
    /// vision model leaves the roster unchanged.
    pub fn adopt_catalog(&mut self, catalog: &[String]) {
        let preferred = PREFERENCE
            .iter()
            .find_map(|pat| catalog.iter().find(|name| name.contains(pat)));

        match preferred {
            Some(name) => {
                tracing::info!(model = %name, "switching to discovered model");
                self.candidates.insert(0, name.clone());
                self.active = 0;
            }
            None => {
                tracing::warn!("no obvious vision model in catalog, keeping fallback list");
            }
        }
    }

    pub fn active_model(&self) -> Option<&str> {
        self.candidates.get(self.active).map(String::as_str)
    }

    /// Moves to the next candidate, returning it, or `None` once the
    /// list is exhausted.
    pub fn advance(&mut self) -> Option<&str> {
        self.active += 1;
        self.active_model()
    }

    pub fn remaining(&self) -> usize {
        self.candidates.len().saturating_sub(self.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback() -> Vec<String> {
        vec![
            "gemini-1.5-flash".to_string(),
            "gemini-1.5-flash-latest".to_string(),
            "gemini-1.5-pro".to_string(),
            "gemini-pro-vision".to_string(),
        ]
    }

    #[test]
    fn test_discovery_prefers_newest_flash_family() {
        let mut roster = ModelRoster::new(fallback());
        let catalog = vec![
            "gemini-1.5-pro".to_string(),
            "gemini-2.0-flash".to_string(),
            "gemini-2.5-flash".to_string(),
        ];
        roster.adopt_catalog(&catalog);
        assert_eq!(roster.active_model(), Some("gemini-2.5-flash"));
        // Static list is still behind the discovered candidate.
        assert_eq!(roster.remaining(), 5);
    }

    #[test]
    fn test_discovery_falls_back_to_generic_pro() {
        let mut roster = ModelRoster::new(fallback());
        roster.adopt_catalog(&["gemini-exp-pro".to_string()]);
        assert_eq!(roster.active_model(), Some("gemini-exp-pro"));
    }

    #[test]
    fn test_unrecognized_catalog_keeps_fallback() {
        let mut roster = ModelRoster::new(fallback());
        roster.adopt_catalog(&["text-embedder-004".to_string()]);
        assert_eq!(roster.active_model(), Some("gemini-1.5-flash"));
    }

    #[test]
    fn test_advance_walks_list_then_exhausts() {
        let mut roster = ModelRoster::new(fallback());
        assert_eq!(roster.advance(), Some("gemini-1.5-flash-latest"));
        assert_eq!(roster.advance(), Some("gemini-1.5-pro"));
        assert_eq!(roster.advance(), Some("gemini-pro-vision"));
        assert_eq!(roster.advance(), None);
        assert_eq!(roster.active_model(), None);
        assert_eq!(roster.remaining(), 0);
    }
}
