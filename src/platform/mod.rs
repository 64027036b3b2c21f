//! Host platform surface: alert dialogs and color-scheme media queries
//!
//! The submission client never talks to a window directly; the host supplies
//! these ports. No-op and in-memory implementations are provided for tests
//! and for headless use.

pub mod alert;
pub mod media;

pub use alert::{Alerter, NoopAlerter, RecordingAlerter, StderrAlerter};
pub use media::{ColorScheme, MediaQuery, StaticMediaQuery};

use std::sync::Arc;

/// Composite trait giving typed access to the host primitives.
pub trait PlatformApi: Send + Sync {
    fn alerter(&self) -> Box<dyn Alerter>;
    fn media_query(&self) -> Box<dyn MediaQuery>;
}

/// Headless platform: alerts are dropped and the color scheme is fixed at
/// construction time.
pub struct NoopPlatform {
    scheme: Option<ColorScheme>,
}

impl NoopPlatform {
    pub fn new() -> Self {
        NoopPlatform { scheme: None }
    }

    pub fn with_color_scheme(scheme: ColorScheme) -> Self {
        NoopPlatform { scheme: Some(scheme) }
    }
}

impl Default for NoopPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformApi for NoopPlatform {
    fn alerter(&self) -> Box<dyn Alerter> {
        Box::new(NoopAlerter::new())
    }

    fn media_query(&self) -> Box<dyn MediaQuery> {
        Box::new(StaticMediaQuery::new(self.scheme))
    }
}

/// Platform that records alerts so callers can inspect them afterwards.
pub struct RecordingPlatform {
    alerts: Arc<RecordingAlerter>,
    scheme: Option<ColorScheme>,
}

impl RecordingPlatform {
    pub fn new(scheme: Option<ColorScheme>) -> Self {
        RecordingPlatform { alerts: Arc::new(RecordingAlerter::new()), scheme }
    }

    /// Shared handle to the alerts shown through this platform
    pub fn alerts(&self) -> Arc<RecordingAlerter> {
        self.alerts.clone()
    }
}

impl PlatformApi for RecordingPlatform {
    fn alerter(&self) -> Box<dyn Alerter> {
        Box::new(self.alerts.clone())
    }

    fn media_query(&self) -> Box<dyn MediaQuery> {
        Box::new(StaticMediaQuery::new(self.scheme))
    }
}

/// Terminal platform used by the CLI: alerts go to stderr.
pub struct TerminalPlatform {
    scheme: Option<ColorScheme>,
}

impl TerminalPlatform {
    pub fn new(scheme: Option<ColorScheme>) -> Self {
        TerminalPlatform { scheme }
    }
}

impl PlatformApi for TerminalPlatform {
    fn alerter(&self) -> Box<dyn Alerter> {
        Box::new(StderrAlerter)
    }

    fn media_query(&self) -> Box<dyn MediaQuery> {
        Box::new(StaticMediaQuery::new(self.scheme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_platform_provides_noop_surfaces() {
        let p = NoopPlatform::new();
        p.alerter().alert("ignored");
        assert_eq!(p.media_query().prefers_color_scheme(), None);

        let dark = NoopPlatform::with_color_scheme(ColorScheme::Dark);
        assert!(dark.media_query().prefers_dark());
    }

    #[test]
    fn recording_platform_shares_alerts() {
        let p = RecordingPlatform::new(None);
        p.alerter().alert("boom");
        assert_eq!(p.alerts().take_messages(), vec!["boom".to_string()]);
    }
}
