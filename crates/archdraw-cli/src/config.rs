//! Optional TOML drawing configuration.
//!
//! ```toml
//! [drawing]
//! scale = 50.0
//!
//! [drawing.hatch]
//! angle = 30.0
//! materials = { cork = "crosshatch" }
//!
//! [plan]
//! view_depth = 1.2
//! include_furniture = false
//!
//! [section]
//! view_depth = 8.0
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use archdraw_drafting::{DrawingSettings, PlanRequest};
use serde::Deserialize;

/// Settings shared by every command.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    /// Drafting conventions.
    pub drawing: DrawingSettings,
    /// Plan parameters.
    pub plan: PlanConfig,
    /// Section parameters.
    pub section: SectionConfig,
}

/// `[plan]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub view_depth: f64,
    pub include_furniture: bool,
}

impl Default for PlanConfig {
    fn default() -> Self {
        let request = PlanRequest::default();
        Self {
            view_depth: request.view_depth,
            include_furniture: request.include_furniture,
        }
    }
}

/// `[section]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    pub view_depth: Option<f64>,
}

impl DrawingConfig {
    /// Load from `path`, or use defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.drawing.validate()?;
        tracing::debug!(path = %path.display(), scale = config.drawing.scale, "loaded config");
        Ok(config)
    }

    /// Plan request template; the cut level is set per level.
    pub fn plan_request(&self) -> PlanRequest {
        PlanRequest {
            view_depth: self.plan.view_depth,
            include_furniture: self.plan.include_furniture,
            settings: self.drawing.clone(),
            ..PlanRequest::default()
        }
    }
}
