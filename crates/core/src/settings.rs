//! Worker launch options.
//!
//! [`Settings`] is a small set of boolean toggles translated into the exact
//! command-line flags the headless-browser worker expects.

use serde::{Deserialize, Serialize};

/// Immutable worker launch options.
///
/// The default disables image loading and tolerates TLS certificate errors,
/// which is what a crawler usually wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether the browser downloads images while rendering.
    pub load_images: bool,
    /// Whether TLS certificate errors are ignored.
    pub ignore_tls_errors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            load_images: false,
            ignore_tls_errors: true,
        }
    }
}

impl Settings {
    /// Translate into worker CLI flags, always in the same order:
    /// `--load-images=<bool>` then `--ignore-ssl-errors=<bool>`.
    pub fn to_args(&self) -> [String; 2] {
        [
            format!("--load-images={}", self.load_images),
            format!("--ignore-ssl-errors={}", self.ignore_tls_errors),
        ]
    }
}
