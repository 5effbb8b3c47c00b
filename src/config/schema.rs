//! Configuration schema types for `card.toml`
//!
//! Defines the structure and validation rules for a card project.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::icons::{IconCatalog, IconSlot};
use crate::renderer::{RenderOptions, DEFAULT_ICON_GRID_CLASS};

/// Project metadata section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Directory holding `.hbs` / `.html` templates
    #[serde(default = "default_templates")]
    pub templates: PathBuf,
    /// Output directory for rendered cards
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

fn default_templates() -> PathBuf {
    PathBuf::from("templates")
}

fn default_out() -> PathBuf {
    PathBuf::from("build")
}

/// Rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Treat render warnings as errors
    #[serde(default)]
    pub strict: bool,
    /// CSS class of the `{{icon_grid}}` wrapper
    #[serde(default = "default_icon_grid_class")]
    pub icon_grid_class: String,
}

fn default_icon_grid_class() -> String {
    DEFAULT_ICON_GRID_CLASS.to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { strict: false, icon_grid_class: default_icon_grid_class() }
    }
}

impl RenderConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions { icon_grid_class: self.icon_grid_class.clone() }
    }
}

/// Complete card.toml configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    /// Project metadata (required)
    pub project: ProjectConfig,
    /// Rendering settings
    #[serde(default)]
    pub render: RenderConfig,
    /// Ordered icon catalog; the built-in catalog is used when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<IconSlot>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "icons[2]")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "card.toml: '{}' {}", self.field, self.message)
    }
}

impl CardConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.project.name.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "project.name".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.render.icon_grid_class.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "render.icon_grid_class".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        let catalog = IconCatalog::new(self.icons.clone());
        errors.extend(catalog.validate().into_iter().map(|issue| ConfigValidationError {
            field: format!("icons[{}]", issue.index),
            message: issue.message,
        }));

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// The icon catalog to resolve against.
    pub fn catalog(&self) -> IconCatalog {
        if self.icons.is_empty() {
            IconCatalog::default_catalog()
        } else {
            IconCatalog::new(self.icons.clone())
        }
    }
}
