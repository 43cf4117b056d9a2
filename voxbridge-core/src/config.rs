//! Persistent monitor settings (JSON file in the user data directory).
//!
//! Loading never fails: a missing or unreadable file yields defaults, and
//! out-of-range values are clamped by [`MonitorSettings::normalize`].
//! Environment variables override the file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `VOXBRIDGE_SIGNAL_THRESHOLD` | `detector.signalThreshold` |
//! | `VOXBRIDGE_DEBOUNCE_MS` | `detector.signalOffDebounceMs` |
//! | `VOXBRIDGE_CONFIRM_MS` | `detector.signalOnConfirmMs` |
//! | `VOXBRIDGE_INPUT_DEVICE` | `preferredInputDevice` |

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    analyzer::{
        fft::{MAX_FFT_SIZE, MIN_FFT_SIZE},
        AnalyzerConfig,
    },
    detector::{DetectorConfig, MAX_SIGNAL_THRESHOLD, MAX_WINDOW_MS},
    error::Result,
    monitor::DEFAULT_REFRESH_HZ,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct MonitorSettings {
    pub detector: DetectorConfig,
    pub analyzer: AnalyzerConfig,
    /// Frame cadence of the monitoring loop.
    pub refresh_hz: u32,
    pub preferred_input_device: Option<String>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            analyzer: AnalyzerConfig::default(),
            refresh_hz: DEFAULT_REFRESH_HZ,
            preferred_input_device: None,
        }
    }
}

impl MonitorSettings {
    /// Clamp every field into its accepted range.
    pub fn normalize(&mut self) {
        let d = &mut self.detector;
        d.signal_threshold = d.signal_threshold.min(MAX_SIGNAL_THRESHOLD);
        d.signal_off_debounce_ms = d.signal_off_debounce_ms.min(MAX_WINDOW_MS);
        d.signal_on_confirm_ms = d.signal_on_confirm_ms.min(MAX_WINDOW_MS);

        let a = &mut self.analyzer;
        a.fft_size = a
            .fft_size
            .clamp(MIN_FFT_SIZE, MAX_FFT_SIZE)
            .next_power_of_two()
            .min(MAX_FFT_SIZE);
        if !a.smoothing_time_constant.is_finite() {
            a.smoothing_time_constant = AnalyzerConfig::default().smoothing_time_constant;
        }
        a.smoothing_time_constant = a.smoothing_time_constant.clamp(0.0, 0.99);
        if !(a.min_decibels.is_finite() && a.max_decibels.is_finite())
            || a.min_decibels >= a.max_decibels
        {
            let defaults = AnalyzerConfig::default();
            a.min_decibels = defaults.min_decibels;
            a.max_decibels = defaults.max_decibels;
        }

        self.refresh_hz = self.refresh_hz.clamp(1, 240);
        self.preferred_input_device = self
            .preferred_input_device
            .as_ref()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
    }

    /// Apply overrides from `lookup` (normally `std::env::var`). Unparseable
    /// values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override(&lookup, "VOXBRIDGE_SIGNAL_THRESHOLD") {
            self.detector.signal_threshold = v;
        }
        if let Some(v) = parse_override(&lookup, "VOXBRIDGE_DEBOUNCE_MS") {
            self.detector.signal_off_debounce_ms = v;
        }
        if let Some(v) = parse_override(&lookup, "VOXBRIDGE_CONFIRM_MS") {
            self.detector.signal_on_confirm_ms = v;
        }
        if let Some(device) = lookup("VOXBRIDGE_INPUT_DEVICE") {
            self.preferred_input_device = Some(device);
        }
    }
}

fn parse_override<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = raw.as_str(), "ignoring unparseable override");
            None
        }
    }
}

pub fn default_settings_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Voxbridge")
            .join("monitor.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".config")
            })
            .join("voxbridge")
            .join("monitor.json")
    }
}

/// Read settings from `path`, falling back to defaults, then normalize.
pub fn load_settings(path: &Path) -> MonitorSettings {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str::<MonitorSettings>(&raw).unwrap_or_else(|e| {
            warn!(path = %path.display(), "invalid settings file, using defaults: {e}");
            MonitorSettings::default()
        }),
        Err(_) => MonitorSettings::default(),
    };
    settings.normalize();
    settings
}

pub fn save_settings(path: &Path, settings: &MonitorSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("voxbridge-settings-{}-{name}", std::process::id()))
            .join("monitor.json")
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = load_settings(&scratch_path("missing"));
        assert_eq!(settings, MonitorSettings::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let path = scratch_path("saved");
        let mut settings = MonitorSettings::default();
        settings.detector = DetectorConfig::conservative();
        settings.refresh_hz = 30;
        save_settings(&path, &settings).expect("save settings");

        assert_eq!(load_settings(&path), settings);
        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: MonitorSettings =
            serde_json::from_str(r#"{"detector":{"signalThreshold":25}}"#).expect("parse");
        assert_eq!(settings.detector.signal_threshold, 25);
        assert_eq!(settings.detector.signal_off_debounce_ms, 1_000);
        assert_eq!(settings.analyzer.fft_size, 2048);
    }

    #[test]
    fn invalid_json_falls_back_to_defaults() {
        let path = scratch_path("invalid");
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "{ not json").expect("write");

        assert_eq!(load_settings(&path), MonitorSettings::default());
        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn normalize_clamps_out_of_range_values() {
        let mut settings = MonitorSettings::default();
        settings.detector.signal_threshold = 200;
        settings.detector.signal_off_debounce_ms = 10 * MAX_WINDOW_MS;
        settings.analyzer.fft_size = 1000;
        settings.analyzer.smoothing_time_constant = 3.0;
        settings.analyzer.min_decibels = 0.0;
        settings.analyzer.max_decibels = -10.0;
        settings.refresh_hz = 0;
        settings.preferred_input_device = Some("   ".into());
        settings.normalize();

        assert_eq!(settings.detector.signal_threshold, MAX_SIGNAL_THRESHOLD);
        assert_eq!(settings.detector.signal_off_debounce_ms, MAX_WINDOW_MS);
        assert_eq!(settings.analyzer.fft_size, 1024);
        assert!(settings.analyzer.validate().is_ok());
        assert!(settings.detector.validate().is_ok());
        assert_eq!(settings.refresh_hz, 1);
        assert!(settings.preferred_input_device.is_none());
    }

    #[test]
    fn overrides_replace_parseable_values_only() {
        let env: HashMap<&str, &str> = [
            ("VOXBRIDGE_SIGNAL_THRESHOLD", "22"),
            ("VOXBRIDGE_DEBOUNCE_MS", "soon"),
            ("VOXBRIDGE_INPUT_DEVICE", "USB Mic"),
        ]
        .into_iter()
        .collect();

        let mut settings = MonitorSettings::default();
        settings.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.detector.signal_threshold, 22);
        assert_eq!(settings.detector.signal_off_debounce_ms, 1_000);
        assert_eq!(settings.preferred_input_device.as_deref(), Some("USB Mic"));
    }
}
