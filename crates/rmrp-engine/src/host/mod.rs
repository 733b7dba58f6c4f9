//! Host target: a compiled scene evaluated on the CPU.
//!
//! [`HostScene`] interprets the host programs of a compiled artifact (see
//! `rmrp_compiler::host`) against the current parameter values, and
//! implements [`SceneFunctions`] so the CPU tracer can render the scene
//! exactly as written instead of through hand-ported closures.
//!
//! Scene code has no branches or loops, so whether it evaluates depends on
//! types only. [`HostScene::new`] runs every section once; a scene that
//! passes that check evaluates at every sample.

mod eval;
mod prelude;
mod value;

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Vec3, Vec4};
use thiserror::Error;

use rmrp_compiler::{
    BufferLayout, CompiledArtifact, HostParseError, HostProgram, ParameterStore, Section,
};

use crate::trace::SceneFunctions;
use eval::Evaluator;

pub use prelude::{
    box_sd, lit_material, plane_sd, repeat, smooth_union, smooth_union_m, sphere_sd,
    transform_modifier,
};
pub use value::Value;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("scene has not been compiled")]
    NotCompiled,

    #[error(transparent)]
    Parse(#[from] HostParseError),

    #[error("{section} code: {message}")]
    Evaluation { section: Section, message: String },

    /// The store was built for another compile of the scene.
    #[error("parameter store layout differs from the compiled layout")]
    LayoutMismatch,
}

/// A compiled scene runnable on the host.
#[derive(Debug, Clone)]
pub struct HostScene {
    program: HostProgram,
    layout: Arc<BufferLayout>,
    globals: HashMap<String, Value>,
}

impl HostScene {
    /// Parses the artifact's host programs, binds `store`'s values and
    /// evaluates each section once.
    pub fn new(artifact: &CompiledArtifact, store: &ParameterStore) -> Result<Self, HostError> {
        let program = HostProgram::from_artifact(artifact)?;
        let mut scene = Self {
            program,
            layout: Arc::clone(&artifact.layout),
            globals: HashMap::new(),
        };
        scene.sync(store)?;
        scene.check()?;
        log::debug!("host scene {:?} ready", artifact.scene_name);
        Ok(scene)
    }

    /// Rebinds parameter values after edits. The store must belong to the
    /// same compile.
    pub fn sync(&mut self, store: &ParameterStore) -> Result<(), HostError> {
        if !Arc::ptr_eq(store.layout(), &self.layout) && **store.layout() != *self.layout {
            return Err(HostError::LayoutMismatch);
        }
        self.globals = self
            .layout
            .slots()
            .iter()
            .filter_map(|slot| {
                let value = store.get(&slot.name)?;
                Some((slot.name.clone(), Value::from_param(&value)))
            })
            .collect();
        Ok(())
    }

    /// Current value of a parameter as the host sees it.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    fn check(&self) -> Result<(), HostError> {
        self.try_distance(Vec3::ZERO, 0)?;
        self.try_material(Vec3::ZERO, 0)?;
        self.try_skybox(0)?;
        Ok(())
    }

    fn run(&self, section: Section, position: Vec3, step: u32) -> Result<Value, HostError> {
        Evaluator::new(self, section, position, step)
            .run()
            .map_err(|message| HostError::Evaluation { section, message })
    }

    pub fn try_distance(&self, position: Vec3, step: u32) -> Result<f32, HostError> {
        Ok(self.run(Section::Distance, position, step)?.x())
    }

    pub fn try_material(&self, position: Vec3, step: u32) -> Result<Vec4, HostError> {
        Ok(self.run(Section::Material, position, step)?.lanes())
    }

    pub fn try_skybox(&self, step: u32) -> Result<Vec4, HostError> {
        Ok(self.run(Section::Skybox, Vec3::ZERO, step)?.lanes())
    }
}

/// Evaluation cannot fail after [`HostScene::new`]; the fallbacks are a miss
/// and transparent black.
impl SceneFunctions for HostScene {
    fn distance(&self, position: Vec3, step: u32) -> f32 {
        self.try_distance(position, step).unwrap_or(f32::INFINITY)
    }

    fn material(&self, position: Vec3, step: u32) -> Vec4 {
        self.try_material(position, step).unwrap_or(Vec4::ZERO)
    }

    fn skybox(&self, step: u32) -> Vec4 {
        self.try_skybox(step).unwrap_or(Vec4::ZERO)
    }
}
