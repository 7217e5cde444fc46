// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for the looper.
//!
//! Loaded from a YAML file. Every field has a default, so a missing file
//! or a partial file is valid.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::midi::CHANNEL_COUNT;

/// Looper configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LooperConfig {
    /// Exact name of the MIDI input port
    #[serde(default = "default_port")]
    pub input_port: String,
    /// Exact name of the MIDI output port
    #[serde(default = "default_port")]
    pub output_port: String,
    /// Input channel that is recorded (0-15, "Right 1" is 0)
    #[serde(default)]
    pub monitored_channel: u8,
    /// Sequence length in quarter notes (16 = 4 bars of 4/4)
    #[serde(default = "default_quarter_notes")]
    pub quarter_notes_per_sequence: u32,
    /// Semitones applied while the Effect button is on
    #[serde(default = "default_transpose_shift")]
    pub transpose_shift: i8,
    /// Channel carrying Registration Memory changes (0-15)
    #[serde(default = "default_registration_channel")]
    pub registration_channel: u8,
    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> String {
    "Digital Workstation 1".to_string()
}
fn default_quarter_notes() -> u32 {
    16
}
fn default_transpose_shift() -> i8 {
    12
}
fn default_registration_channel() -> u8 {
    13
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            input_port: default_port(),
            output_port: default_port(),
            monitored_channel: 0,
            quarter_notes_per_sequence: default_quarter_notes(),
            transpose_shift: default_transpose_shift(),
            registration_channel: default_registration_channel(),
            log_level: default_log_level(),
        }
    }
}

impl LooperConfig {
    /// Load configuration from a YAML file; a missing file gives defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.monitored_channel >= CHANNEL_COUNT {
            bail!("monitored_channel must be 0-15, got {}", self.monitored_channel);
        }
        if self.registration_channel >= CHANNEL_COUNT {
            bail!("registration_channel must be 0-15, got {}", self.registration_channel);
        }
        if self.quarter_notes_per_sequence == 0 {
            bail!("quarter_notes_per_sequence must be at least 1");
        }
        if self.input_port.is_empty() || self.output_port.is_empty() {
            bail!("input_port and output_port must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = LooperConfig::default();
        assert_eq!(config.monitored_channel, 0);
        assert_eq!(config.quarter_notes_per_sequence, 16);
        assert_eq!(config.transpose_shift, 12);
        assert_eq!(config.registration_channel, 13);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
input_port: "Tyros In"
quarter_notes_per_sequence: 8
"#;
        let config = LooperConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.input_port, "Tyros In");
        assert_eq!(config.output_port, "Digital Workstation 1");
        assert_eq!(config.quarter_notes_per_sequence, 8);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(LooperConfig::from_yaml("monitored_channel: 16").is_err());
        assert!(LooperConfig::from_yaml("quarter_notes_per_sequence: 0").is_err());
        assert!(LooperConfig::from_yaml("input_port: \"\"").is_err());
        assert!(LooperConfig::from_yaml("transpose_shift: 300").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("looper.yaml");

        let config = LooperConfig {
            output_port: "IAC Bus 1".to_string(),
            transpose_shift: -5,
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(LooperConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = LooperConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, LooperConfig::default());
    }
}
