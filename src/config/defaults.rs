//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn manifest() -> PathBuf {
        "manifest.yaml".into()
    }

    pub fn layout() -> PathBuf {
        "templates/layouts/base.html".into()
    }

    pub fn pages() -> PathBuf {
        "pages".into()
    }

    pub fn static_dir() -> PathBuf {
        "static".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        9010
    }

    pub fn workers() -> usize {
        4
    }
}
