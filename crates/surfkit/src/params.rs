//! Per-surface display overrides.

use std::collections::HashMap;

use serde::Deserialize;
use surfkit_mesh::SurfaceMesh;

/// Display overrides for one surface.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SurfaceParams {
    /// Solid RGB color, channels in `[0, 1]`.
    #[serde(default)]
    pub color: Option<[f32; 3]>,
    /// Surface opacity, clamped into `[0, 1]` when applied.
    #[serde(default)]
    pub alpha: Option<f32>,
    /// Icon shown for the surface.
    #[serde(default)]
    pub icon: Option<String>,
}

impl SurfaceParams {
    /// Copy the set overrides onto `mesh`.
    pub fn apply(&self, mesh: &mut SurfaceMesh) {
        if let Some(color) = self.color {
            mesh.solid_color = Some(color);
        }
        if let Some(alpha) = self.alpha {
            mesh.opacity = alpha.clamp(0.0, 1.0);
        }
        if let Some(icon) = &self.icon {
            mesh.icon = Some(icon.clone());
        }
    }
}

/// Overrides keyed by surface name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ParamsMap(HashMap<String, SurfaceParams>);

impl ParamsMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `name -> { color, alpha, icon }`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn insert(&mut self, name: impl Into<String>, params: SurfaceParams) {
        self.0.insert(name.into(), params);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SurfaceParams> {
        self.0.get(name)
    }
}
