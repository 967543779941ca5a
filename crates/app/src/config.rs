use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use spectraplot_core::constants::NYQUIST_HZ;
use spectraplot_core::{SpectrumPipeline, Weighting};
use std::fs;
use std::path::PathBuf;

/// Persisted display preferences.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub last_input: String,
    #[serde(default = "default_min_freq")]
    pub min_freq: f32,
    #[serde(default = "default_max_freq")]
    pub max_freq: f32,
    #[serde(default = "default_min_db")]
    pub min_db: f32,
    #[serde(default = "default_max_db")]
    pub max_db: f32,
    #[serde(default = "default_true")]
    pub log_scale: bool,
    #[serde(default = "default_true")]
    pub peaks_enabled: bool,
    #[serde(default = "default_weighting")]
    pub weighting: String,
    /// Bottom of the bars, in dB.
    #[serde(default = "default_min_db")]
    pub baseline_db: f32,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
}

fn default_min_freq() -> f32 {
    20.0
}

fn default_max_freq() -> f32 {
    NYQUIST_HZ
}

fn default_min_db() -> f32 {
    -100.0
}

fn default_max_db() -> f32 {
    0.0
}

fn default_true() -> bool {
    true
}

fn default_weighting() -> String {
    Weighting::Z.label().to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_input: String::new(),
            min_freq: default_min_freq(),
            max_freq: default_max_freq(),
            min_db: default_min_db(),
            max_db: default_max_db(),
            log_scale: true,
            peaks_enabled: true,
            weighting: default_weighting(),
            baseline_db: default_min_db(),
            dark_mode: true,
        }
    }
}

impl AppConfig {
    /// Loads configuration from disk, or returns default if not found.
    pub fn load() -> Self {
        if let Some(path) = config_path() {
            if let Ok(content) = fs::read_to_string(path) {
                match serde_json::from_str(&content) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Ignoring malformed config: {}", e),
                }
            }
        }
        Self::default()
    }

    /// Saves configuration to disk in JSON format.
    pub fn save(&self) {
        if let Some(path) = config_path() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(json) = serde_json::to_string_pretty(self) {
                let _ = fs::write(path, json);
            }
        }
    }

    /// Unknown labels fall back to no weighting.
    pub fn weighting(&self) -> Weighting {
        Weighting::from_label(&self.weighting).unwrap_or_default()
    }

    /// Pushes every display setting into `pipeline`.
    pub fn apply_to(&self, pipeline: &mut SpectrumPipeline) {
        if self.log_scale {
            pipeline.set_log_frequency_scale();
        } else {
            pipeline.set_linear_frequency_scale();
        }
        pipeline.set_frequency_range(self.min_freq, self.max_freq);
        pipeline.set_magnitude_range(self.min_db, self.max_db);
        pipeline.set_peaks_enabled(self.peaks_enabled);
        pipeline.set_baseline_data_units(self.baseline_db);
        pipeline.set_weighting(self.weighting());
    }
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "spectraplot", "spectraplot")
        .map(|dirs| dirs.config_dir().join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.min_freq, 20.0);
        assert_eq!(config.max_freq, 24000.0);
        assert_eq!(config.min_db, -100.0);
        assert!(config.log_scale);
        assert!(config.peaks_enabled);
        assert_eq!(config.weighting(), Weighting::Z);
    }

    #[test]
    fn test_config_deserialization_with_defaults() {
        // Minimal JSON - should fill in defaults
        let json = r#"{"last_input":"Mic","log_scale":false}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.last_input, "Mic");
        assert!(!config.log_scale);
        assert_eq!(config.max_db, 0.0);
        assert_eq!(config.baseline_db, -100.0);
        assert!(config.dark_mode);
    }

    #[test]
    fn test_config_roundtrip() {
        let original = AppConfig {
            last_input: "USB Audio".to_string(),
            min_freq: 50.0,
            max_freq: 16000.0,
            min_db: -120.0,
            max_db: -10.0,
            log_scale: false,
            peaks_enabled: false,
            weighting: "A".to_string(),
            baseline_db: -90.0,
            dark_mode: false,
        };

        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains("\"weighting\":\"A\""));
        let restored: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_unknown_weighting_falls_back() {
        let config = AppConfig {
            weighting: "K".to_string(),
            ..Default::default()
        };
        assert_eq!(config.weighting(), Weighting::Z);
    }

    #[test]
    fn test_apply_to_pipeline() {
        let config = AppConfig {
            log_scale: false,
            peaks_enabled: false,
            weighting: "C".to_string(),
            min_freq: 0.0,
            max_freq: 12000.0,
            ..Default::default()
        };
        let mut pipeline = SpectrumPipeline::new(24000.0);
        config.apply_to(&mut pipeline);

        assert!(!pipeline.is_log_scale());
        assert!(!pipeline.peaks_enabled());
        assert!(pipeline.needs_transform());
        assert_eq!(pipeline.magnitude_title(), "PSD (dB C)");
        assert_eq!(pipeline.horizontal().range(), (0.0, 12000.0));
    }
}
