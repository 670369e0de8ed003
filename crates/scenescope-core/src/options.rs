//! Configuration options for scenescope.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration options for a scenescope session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Window title.
    pub program_name: String,

    /// Logging verbosity; 0 suppresses informational messages.
    pub verbosity: u32,

    /// Prefix prepended to user-facing error messages.
    pub print_prefix: String,

    /// Whether failed operations return errors (`true`) or are logged and
    /// ignored (`false`).
    pub error_on_failure: bool,

    /// Whether the main view shows the pick buffer instead of the scene.
    pub debug_draw_pick_buffer: bool,

    /// Background color.
    pub background_color: Vec3,

    /// Accumulated drag distance, in window-normalized units, below which a
    /// press-release pair counts as a click.
    pub click_drag_threshold: f32,

    /// Default point radius, relative to the scene length scale.
    pub point_radius: f32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            program_name: "scenescope".to_string(),
            verbosity: 2,
            print_prefix: "[scenescope] ".to_string(),
            error_on_failure: true,
            debug_draw_pick_buffer: false,
            background_color: Vec3::new(1.0, 1.0, 1.0),
            click_drag_threshold: 0.01,
            point_radius: 0.005,
        }
    }
}

impl Options {
    /// Loads options from a JSON file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Returns whether informational messages are logged.
    #[must_use]
    pub fn logs_info(&self) -> bool {
        self.verbosity > 0
    }

    /// Saves options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
