//! Graph Configuration
//!
//! Optional TOML file; every field has a default.
//!
//! ```toml
//! [layout]
//! node_width = 250.0
//! node_height = 80.0
//!
//! [palette]
//! node_error = "#FF4D6A"
//!
//! [identity]
//! policy = "strict"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::identity::IdentityPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub layout: LayoutConfig,
    pub palette: Palette,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between sibling subtrees
    pub node_spacing: f64,
    /// Vertical gap between tree levels
    pub layer_spacing: f64,
    pub edge_arrow_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 250.0,
            node_height: 80.0,
            node_spacing: 60.0,
            layer_spacing: 120.0,
            edge_arrow_size: 20.0,
        }
    }
}

/// Colors handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub node_normal: String,
    pub node_error: String,
    pub edge_normal: String,
    pub edge_error: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            node_normal: "#9D9DA8".to_string(),
            node_error: "#FF4D6A".to_string(),
            edge_normal: "#C5C6D2".to_string(),
            edge_error: "#FF4D6A".to_string(),
        }
    }
}

impl Palette {
    pub fn node_color(&self, has_error: bool) -> &str {
        if has_error {
            &self.node_error
        } else {
            &self.node_normal
        }
    }

    pub fn edge_color(&self, has_error: bool) -> &str {
        if has_error {
            &self.edge_error
        } else {
            &self.edge_normal
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub policy: IdentityPolicy,
}

impl GraphConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
