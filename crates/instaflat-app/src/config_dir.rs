// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration file discovery.

use std::path::{Path, PathBuf};

use instaflat_core::EngineConfig;
use instaflat_core::error::Result;
use tracing::{debug, info};

const CONFIG_FILE: &str = "config.json";

/// Conventional location of the config file, if a base directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    config_base(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
    .map(|base| base.join("instaflat").join(CONFIG_FILE))
}

fn config_base(xdg: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    // Try the XDG config dir, then fall back to ~/.config
    xdg.filter(|p| !p.as_os_str().is_empty())
        .or_else(|| home.map(|h| h.join(".config")))
}

/// Load the engine configuration.
///
/// An explicit path must exist. Without one, the default location is used
/// when present, otherwise built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = explicit {
        info!(path = %path.display(), "Loading config");
        return EngineConfig::load(path);
    }
    match default_config_path().filter(|p| p.is_file()) {
        Some(path) => {
            info!(path = %path.display(), "Loading config");
            EngineConfig::load(path)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(EngineConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_wins_over_home() {
        let base = config_base(Some("/xdg".into()), Some("/home/u".into()));
        assert_eq!(base, Some(PathBuf::from("/xdg")));
    }

    #[test]
    fn home_fallback_uses_dot_config() {
        let base = config_base(None, Some("/home/u".into()));
        assert_eq!(base, Some(PathBuf::from("/home/u/.config")));
        let base = config_base(Some("".into()), Some("/home/u".into()));
        assert_eq!(base, Some(PathBuf::from("/home/u/.config")));
    }

    #[test]
    fn no_base_without_env() {
        assert_eq!(config_base(None, None), None);
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{"output":{"width":640}}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.output.width, 640);
        assert_eq!(config.output.jpeg_quality, 92);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.json"))).is_err());
    }
}
