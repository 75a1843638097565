//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    use std::path::PathBuf;

    pub fn data_path() -> PathBuf {
        "sitedata".into()
    }

    pub fn readme() -> PathBuf {
        "README.md".into()
    }

    pub fn static_dir() -> PathBuf {
        "static".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
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
        5000
    }
}

// ============================================================================
// [export] Section Defaults
// ============================================================================

pub mod export {
    use std::path::PathBuf;

    pub fn output() -> PathBuf {
        "build".into()
    }
}
