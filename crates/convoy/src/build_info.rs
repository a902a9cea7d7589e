//! Build metadata, constructed at startup and handed to CLI assembly
//! rather than living in module globals.

use std::sync::OnceLock;

#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            // Injected by release builds; local builds just say so.
            commit: option_env!("CONVOY_BUILD_COMMIT").unwrap_or("unknown"),
        }
    }
}

/// Version string shown by `--version`.
pub fn long_version() -> &'static str {
    static LONG: OnceLock<String> = OnceLock::new();

    LONG.get_or_init(|| {
        let info = BuildInfo::current();
        format!("{} (commit {})", info.version, info.commit)
    })
}
