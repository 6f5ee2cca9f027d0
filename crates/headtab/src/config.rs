//! Container configuration
//!
//! Every option can come from a TOML file (`headtab.toml`), from code through
//! the `with_*` setters, or both. Missing keys fall back to the defaults below.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration of a [`GestureContainer`](crate::GestureContainer)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContainerConfig {
    /// Pull distance that triggers a refresh
    #[serde(default = "default_refresh_height")]
    pub refresh_height: f64,
    /// Damping applied to the pull beyond `refresh_height + overflow_pull`
    #[serde(default = "default_pull_extended_coefficient")]
    pub pull_extended_coefficient: f64,
    /// Undamped pull allowed beyond `refresh_height`
    #[serde(default = "default_overflow_pull")]
    pub overflow_pull: f64,
    /// Part of the header that overlaps the tab bar
    #[serde(default)]
    pub overflow_height: f64,
    #[serde(default = "default_true")]
    pub scroll_enabled: bool,
    /// Height the header keeps when fully collapsed
    #[serde(default)]
    pub min_header_height: f64,
    #[serde(default)]
    pub initial_page: i32,
    #[serde(default = "default_tabbar_height")]
    pub init_tabbar_height: f64,
    #[serde(default)]
    pub init_header_height: f64,
    /// Upper bound for header dragging; defaults to the full collapse range
    #[serde(default)]
    pub pan_header_max_offset: Option<f64>,
    #[serde(default)]
    pub refresh_control_color: Option<String>,
    #[serde(default)]
    pub refresh_control_top: f64,
    /// External recognizers the header recognizer runs simultaneously with
    #[serde(default)]
    pub header_simultaneous_with_external_gesture: Vec<u32>,
    /// Initial value of the externally owned refreshing flag
    #[serde(default)]
    pub is_refreshing: bool,
    /// Window width; bounds the outer recognizer's horizontal envelope
    #[serde(default = "default_window_width")]
    pub window_width: f64,
}

fn default_refresh_height() -> f64 {
    80.0
}

fn default_pull_extended_coefficient() -> f64 {
    0.1
}

fn default_overflow_pull() -> f64 {
    50.0
}

fn default_tabbar_height() -> f64 {
    49.0
}

fn default_window_width() -> f64 {
    390.0
}

fn default_true() -> bool {
    true
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            refresh_height: default_refresh_height(),
            pull_extended_coefficient: default_pull_extended_coefficient(),
            overflow_pull: default_overflow_pull(),
            overflow_height: 0.0,
            scroll_enabled: true,
            min_header_height: 0.0,
            initial_page: 0,
            init_tabbar_height: default_tabbar_height(),
            init_header_height: 0.0,
            pan_header_max_offset: None,
            refresh_control_color: None,
            refresh_control_top: 0.0,
            header_simultaneous_with_external_gesture: Vec::new(),
            is_refreshing: false,
            window_width: default_window_width(),
        }
    }
}

impl ContainerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ContainerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or from `headtab.toml` inside a directory
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = if path.is_dir() {
            path.join("headtab.toml")
        } else {
            path.to_path_buf()
        };

        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values no layout could produce
    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("refresh_height", self.refresh_height),
            ("overflow_pull", self.overflow_pull),
            ("overflow_height", self.overflow_height),
            ("min_header_height", self.min_header_height),
            ("init_tabbar_height", self.init_tabbar_height),
            ("init_header_height", self.init_header_height),
            ("window_width", self.window_width),
        ];
        for (field, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected a finite, non-negative length, got {value}"),
                });
            }
        }

        if !(0.0..=1.0).contains(&self.pull_extended_coefficient) {
            return Err(ConfigError::Invalid {
                field: "pull_extended_coefficient",
                reason: format!("expected a value in [0, 1], got {}", self.pull_extended_coefficient),
            });
        }

        if let Some(max) = self.pan_header_max_offset {
            if !max.is_finite() || max < 0.0 {
                return Err(ConfigError::Invalid {
                    field: "pan_header_max_offset",
                    reason: format!("expected a finite, non-negative offset, got {max}"),
                });
            }
        }

        if self.refresh_height == 0.0 {
            return Err(ConfigError::Invalid {
                field: "refresh_height",
                reason: "refresh height must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_refresh_height(mut self, height: f64) -> Self {
        self.refresh_height = height;
        self
    }

    pub fn with_overflow_height(mut self, height: f64) -> Self {
        self.overflow_height = height;
        self
    }

    pub fn with_min_header_height(mut self, height: f64) -> Self {
        self.min_header_height = height;
        self
    }

    pub fn with_initial_page(mut self, page: i32) -> Self {
        self.initial_page = page;
        self
    }

    pub fn with_header_height(mut self, height: f64) -> Self {
        self.init_header_height = height;
        self
    }

    pub fn with_tabbar_height(mut self, height: f64) -> Self {
        self.init_tabbar_height = height;
        self
    }

    pub fn with_pan_header_max_offset(mut self, offset: f64) -> Self {
        self.pan_header_max_offset = Some(offset);
        self
    }

    pub fn with_scroll_enabled(mut self, enabled: bool) -> Self {
        self.scroll_enabled = enabled;
        self
    }

    pub fn with_refreshing(mut self, refreshing: bool) -> Self {
        self.is_refreshing = refreshing;
        self
    }

    pub fn with_external_gesture(mut self, id: u32) -> Self {
        if !self.header_simultaneous_with_external_gesture.contains(&id) {
            self.header_simultaneous_with_external_gesture.push(id);
        }
        self
    }
}
