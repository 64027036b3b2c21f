/// Color-scheme media query (`prefers-color-scheme`)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
    Dark,
}

pub trait MediaQuery: Send + Sync {
    /// Color scheme the host reports, `None` when media queries are unsupported
    fn prefers_color_scheme(&self) -> Option<ColorScheme>;

    fn prefers_dark(&self) -> bool {
        self.prefers_color_scheme() == Some(ColorScheme::Dark)
    }
}

/// Media query answering from in-memory state; hosts and tests set it directly
pub struct StaticMediaQuery {
    scheme: std::sync::Mutex<Option<ColorScheme>>,
}

impl StaticMediaQuery {
    pub fn new(scheme: Option<ColorScheme>) -> Self {
        StaticMediaQuery { scheme: std::sync::Mutex::new(scheme) }
    }

    pub fn set(&self, scheme: Option<ColorScheme>) {
        let mut s = self.scheme.lock().unwrap();
        *s = scheme;
    }
}

impl Default for StaticMediaQuery {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MediaQuery for StaticMediaQuery {
    fn prefers_color_scheme(&self) -> Option<ColorScheme> {
        *self.scheme.lock().unwrap()
    }
}
