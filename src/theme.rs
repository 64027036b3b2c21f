//! Light/dark presentation mode.
//!
//! The mode lives in an explicit [`ThemeState`]; the `dark` class on the
//! document root and the glyph on the toggle control are derived from it.

use crate::dom::Document;
use crate::platform::MediaQuery;

/// Class set on the document root while dark mode is active
pub const DARK_CLASS: &str = "dark";
pub const SUN_GLYPH: &str = "☀️";
pub const MOON_GLYPH: &str = "🌙";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Glyph shown on the toggle control in this mode
    pub fn glyph(self) -> &'static str {
        match self {
            Theme::Light => SUN_GLYPH,
            Theme::Dark => MOON_GLYPH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThemeState {
    mode: Theme,
}

impl ThemeState {
    /// Initial state from the host's color-scheme preference
    pub fn from_preference(query: &dyn MediaQuery) -> Self {
        let mode = if query.prefers_dark() { Theme::Dark } else { Theme::Light };
        Self { mode }
    }

    pub fn mode(&self) -> Theme {
        self.mode
    }

    /// Apply the load-time state. Only dark mode touches the page; light is
    /// the markup's own default.
    pub fn apply_initial(&self, document: &mut Document, control_id: &str) {
        if self.mode == Theme::Dark {
            document.add_root_class(DARK_CLASS);
            document.set_text_content(control_id, MOON_GLYPH);
        }
    }

    /// Flip the mode and reflect it on the document and the toggle control.
    /// A missing control only skips the glyph update.
    pub fn switch_mode(&mut self, document: &mut Document, control_id: &str) -> Theme {
        self.mode = self.mode.toggled();
        match self.mode {
            Theme::Dark => document.add_root_class(DARK_CLASS),
            Theme::Light => document.remove_root_class(DARK_CLASS),
        }
        document.set_text_content(control_id, self.mode.glyph());
        log::debug!("theme switched to {:?}", self.mode);
        self.mode
    }
}
