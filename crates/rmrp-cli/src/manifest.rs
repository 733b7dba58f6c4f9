//! TOML scene manifest.
//!
//! ```toml
//! name = "Blobs"
//! source = "blobs.hlsl"
//! skybox = "sky.hlsl"        # optional
//!
//! [render]                   # optional, defaults shown
//! steps = 256
//! resolution = 1.0
//! thread_group_size = 8
//!
//! [camera]                   # optional, used by --preview
//! eye = [0.0, 3.0, 8.0]
//! target = [0.0, 1.0, 0.0]
//! fov = 60.0                 # vertical, degrees
//!
//! [[parameters]]
//! name = "radius"
//! value = 1.0
//!
//! [[parameters]]
//! name = "center"
//! value = [0.0, 1.0, 0.0]
//! ```
//!
//! Source paths are relative to the manifest's directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use glam::Vec3;

use rmrp_compiler::{ParamValue, ParameterDeclaration, RenderConfig};
use rmrp_engine::trace::Camera;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub name: String,
    pub source: PathBuf,
    #[serde(default)]
    pub skybox: Option<PathBuf>,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub camera: CameraSection,
    #[serde(default)]
    pub parameters: Vec<ParameterEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub steps: u32,
    pub resolution: f32,
    pub thread_group_size: u32,
}

impl Default for RenderSection {
    fn default() -> Self {
        let d = RenderConfig::default();
        Self {
            steps: d.step_budget,
            resolution: d.resolution_scale,
            thread_group_size: d.thread_group_size,
        }
    }
}

impl From<&RenderSection> for RenderConfig {
    fn from(r: &RenderSection) -> Self {
        RenderConfig {
            step_budget: r.steps,
            resolution_scale: r.resolution,
            thread_group_size: r.thread_group_size,
        }
    }
}

/// Preview camera.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSection {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub fov: f32,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self { eye: [0.0, 3.0, 8.0], target: [0.0, 1.0, 0.0], fov: 60.0 }
    }
}

impl CameraSection {
    pub fn to_camera(&self, aspect: f32) -> Camera {
        Camera::look_at(
            Vec3::from_array(self.eye),
            Vec3::from_array(self.target),
            Vec3::Y,
            self.fov.to_radians(),
            aspect,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterEntry {
    pub name: String,
    pub value: EntryValue,
}

/// `1.0` or `[x, y, ...]` with one to four components.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntryValue {
    Scalar(f32),
    Vector(Vec<f32>),
}

impl ParameterEntry {
    pub fn to_declaration(&self) -> Result<ParameterDeclaration> {
        let value = match &self.value {
            EntryValue::Scalar(v) => ParamValue::Scalar(*v),
            EntryValue::Vector(v) => match ParamValue::from_words(v) {
                Some(value) => value,
                None => bail!(
                    "parameter {:?} has {} components; expected 1 to 4",
                    self.name,
                    v.len()
                ),
            },
        };
        Ok(ParameterDeclaration { name: self.name.clone(), value })
    }
}

/// A manifest with its source files read.
#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub name: String,
    pub source: String,
    pub skybox: Option<String>,
    pub parameters: Vec<ParameterDeclaration>,
    pub config: RenderConfig,
    pub camera: CameraSection,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid scene manifest")
    }

    /// Reads the manifest at `path` and the files it references.
    pub fn load(path: &Path) -> Result<LoadedScene> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let manifest = Self::parse(&text)
            .with_context(|| format!("parsing manifest {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        manifest.resolve(base)
    }

    /// Reads source files relative to `base` and converts parameters.
    pub fn resolve(&self, base: &Path) -> Result<LoadedScene> {
        let read = |rel: &Path| -> Result<String> {
            let full = base.join(rel);
            fs::read_to_string(&full).with_context(|| format!("reading {}", full.display()))
        };

        let source = read(&self.source)?;
        let skybox = self.skybox.as_deref().map(read).transpose()?;
        let parameters = self
            .parameters
            .iter()
            .map(ParameterEntry::to_declaration)
            .collect::<Result<Vec<_>>>()?;

        Ok(LoadedScene {
            name: self.name.clone(),
            source,
            skybox,
            parameters,
            config: RenderConfig::from(&self.render),
            camera: self.camera.clone(),
        })
    }
}
