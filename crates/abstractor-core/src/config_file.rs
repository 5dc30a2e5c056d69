use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineConfig;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub model: Option<ModelConfig>,
    pub locator: Option<LocatorFileConfig>,
    pub sanitizer: Option<SanitizerFileConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the OpenAI-compatible completion API.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocatorFileConfig {
    pub start_markers: Option<Vec<String>>,
    pub end_markers: Option<Vec<String>>,
    pub fallback_window: Option<usize>,
    pub hard_cap: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SanitizerFileConfig {
    /// Hallucination marker regexes, in detection-priority order.
    pub markers: Option<Vec<String>>,
    pub max_bytes: Option<usize>,
    pub min_bytes: Option<usize>,
}

/// Platform config directory path: `<config_dir>/abstractor/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("abstractor").join("config.toml"))
}

/// Load config by cascading CWD `.abstractor.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".abstractor.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        model: Some(ModelConfig {
            api_url: pick(&overlay.model, &base.model, |m| m.api_url.clone()),
            api_key: pick(&overlay.model, &base.model, |m| m.api_key.clone()),
            model: pick(&overlay.model, &base.model, |m| m.model.clone()),
            max_tokens: pick(&overlay.model, &base.model, |m| m.max_tokens),
            timeout_secs: pick(&overlay.model, &base.model, |m| m.timeout_secs),
        }),
        locator: Some(LocatorFileConfig {
            start_markers: pick(&overlay.locator, &base.locator, |l| l.start_markers.clone()),
            end_markers: pick(&overlay.locator, &base.locator, |l| l.end_markers.clone()),
            fallback_window: pick(&overlay.locator, &base.locator, |l| l.fallback_window),
            hard_cap: pick(&overlay.locator, &base.locator, |l| l.hard_cap),
        }),
        sanitizer: Some(SanitizerFileConfig {
            markers: pick(&overlay.sanitizer, &base.sanitizer, |s| s.markers.clone()),
            max_bytes: pick(&overlay.sanitizer, &base.sanitizer, |s| s.max_bytes),
            min_bytes: pick(&overlay.sanitizer, &base.sanitizer, |s| s.min_bytes),
        }),
    }
}

fn pick<S, T>(overlay: &Option<S>, base: &Option<S>, get: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&get)
        .or_else(|| base.as_ref().and_then(&get))
}

impl ConfigFile {
    /// Apply file values over a [`PipelineConfig`]'s defaults.
    ///
    /// Only sanitizer marker patterns can fail (regex compilation).
    pub fn apply(&self, config: &mut PipelineConfig) -> Result<(), regex::Error> {
        if let Some(ref model) = self.model {
            if let Some(max_tokens) = model.max_tokens {
                config.max_tokens = max_tokens;
            }
            if let Some(secs) = model.timeout_secs {
                config.summarize_timeout = Duration::from_secs(secs);
            }
        }
        if let Some(ref locator) = self.locator {
            if let Some(ref markers) = locator.start_markers {
                config.locator.start_markers = markers.clone();
            }
            if let Some(ref markers) = locator.end_markers {
                config.locator.end_markers = markers.clone();
            }
            if let Some(window) = locator.fallback_window {
                config.locator.fallback_window = window;
            }
            if let Some(cap) = locator.hard_cap {
                config.locator.hard_cap = cap;
            }
        }
        if let Some(ref sanitizer) = self.sanitizer {
            if let Some(ref markers) = sanitizer.markers {
                config.sanitizer.set_markers(markers)?;
            }
            if let Some(max) = sanitizer.max_bytes {
                config.sanitizer.max_bytes = max;
            }
            if let Some(min) = sanitizer.min_bytes {
                config.sanitizer.min_bytes = min;
            }
        }
        Ok(())
    }
}
