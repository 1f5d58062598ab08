/*
 * This file is part of Smcmon.
 *
 * Copyright (C) 2025 Smcmon contributors
 *
 * Smcmon is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Smcmon is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Smcmon. If not, see <https://www.gnu.org/licenses/>.
 */

//! Demo-binary configuration: sample interval, temperature sensor key,
//! logging toggle. JSON on disk, defaults when absent.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Milliseconds between snapshots in loop mode.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Which temperature sensor key to read.
    #[serde(default = "default_cpu_temp_key")]
    pub cpu_temp_key: String,
    /// Write JSON event lines to the log file.
    #[serde(default)]
    pub logging: bool,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_cpu_temp_key() -> String {
    crate::smc::KEY_CPU_TEMP.to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            cpu_temp_key: default_cpu_temp_key(),
            logging: false,
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join("smcmon").join("config.json");
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join("smcmon")
            .join("config.json");
    }
    PathBuf::from("/etc/smcmon/config.json")
}

/// Loads the user config, or None when it is missing or unreadable.
pub fn load_config() -> Option<MonitorConfig> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Option<MonitorConfig> {
    let data = fs::read_to_string(path).ok()?;
    let cfg: MonitorConfig = serde_json::from_str(&data).ok()?;
    validate_config(&cfg).ok()?;
    Some(cfg)
}

pub fn save_config(cfg: &MonitorConfig) -> io::Result<()> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &MonitorConfig, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = serde_json::to_string_pretty(cfg).unwrap_or_else(|_| "{}".to_string());
    fs::write(path, json)
}

pub fn validate_config(cfg: &MonitorConfig) -> Result<(), String> {
    if cfg.interval_ms == 0 {
        return Err("interval_ms must be greater than zero".to_string());
    }
    if cfg.interval_ms > 3_600_000 {
        return Err("interval_ms too large (max one hour)".to_string());
    }
    if cfg.cpu_temp_key.len() != 4 || !cfg.cpu_temp_key.is_ascii() {
        return Err(format!(
            "cpu_temp_key '{}' must be exactly 4 ASCII characters",
            cfg.cpu_temp_key
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = MonitorConfig::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.interval_ms, 1000);
        assert_eq!(cfg.cpu_temp_key, "TC0F");
        assert!(!cfg.logging);
    }

    #[test]
    fn test_round_trip_through_json() {
        let cfg = MonitorConfig {
            interval_ms: 2500,
            cpu_temp_key: "TC0P".to_string(),
            logging: true,
        };
        let file = NamedTempFile::new().unwrap();
        save_config_to(&cfg, file.path()).unwrap();
        let loaded = load_config_from(file.path()).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();
        file.flush().unwrap();
        let loaded = load_config_from(file.path()).unwrap();
        assert_eq!(loaded, MonitorConfig::default());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"interval_ms\": 100, \"bogus\": true}}").unwrap();
        file.flush().unwrap();
        assert!(load_config_from(file.path()).is_none());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let cfg = MonitorConfig { interval_ms: 0, ..Default::default() };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_short_temp_key() {
        let cfg = MonitorConfig { cpu_temp_key: "TC0".to_string(), ..Default::default() };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_rejects_non_ascii_temp_key() {
        let cfg = MonitorConfig { cpu_temp_key: "TC0°".to_string(), ..Default::default() };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_invalid_config_on_disk_is_ignored() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"interval_ms\": 0}}").unwrap();
        file.flush().unwrap();
        assert!(load_config_from(file.path()).is_none());
    }
}
