//! Scene ownership: source, declarations, current artifact and store.
//!
//! Responsibilities:
//! - recompile atomically (a failed compile keeps the previous artifact)
//! - rebuild the parameter store wholesale on every successful compile
//! - route parameter edits to both the store and the declarations
//!
//! Recompiling and setting parameters both take `&mut self`, so they are
//! mutually exclusive by construction. Share a scene across threads as
//! `Arc<Mutex<Scene>>`; renderers hold on to the `Arc<CompiledArtifact>`
//! snapshot they were handed.

use std::sync::Arc;

use rmrp_compiler::{
    compile, CompileError, CompiledArtifact, ParamValue, ParameterDeclaration, ParameterError,
    ParameterStore, RenderConfig,
};

use crate::host::{HostError, HostScene};

struct Compiled {
    artifact: Arc<CompiledArtifact>,
    store: ParameterStore,
}

/// A named scene and everything compiled from it.
pub struct Scene {
    name: String,
    source: String,
    skybox: Option<String>,
    parameters: Vec<ParameterDeclaration>,
    compiled: Option<Compiled>,
}

impl Scene {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            skybox: None,
            parameters: Vec::new(),
            compiled: None,
        }
    }

    /// Builder-style skybox body.
    pub fn skybox(mut self, body: impl Into<String>) -> Self {
        self.skybox = Some(body.into());
        self
    }

    /// Builder-style parameter declaration. Validation happens on compile.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.push(ParameterDeclaration::new(name, value));
        self
    }

    // ── editing ───────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replaces the scene body. Takes effect on the next recompile.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    pub fn set_skybox(&mut self, body: Option<String>) {
        self.skybox = body;
    }

    pub fn parameters(&self) -> &[ParameterDeclaration] {
        &self.parameters
    }

    /// Direct access to the declarations, for adding, removing or
    /// reordering. Takes effect on the next recompile.
    pub fn parameters_mut(&mut self) -> &mut Vec<ParameterDeclaration> {
        &mut self.parameters
    }

    // ── compile ───────────────────────────────────────────────────────────

    /// Compiles the current source and declarations.
    ///
    /// On success the artifact and the parameter store are replaced
    /// together; the store is seeded from the declarations' current values.
    /// On failure both stay exactly as they were.
    pub fn recompile(&mut self, config: &RenderConfig) -> Result<Arc<CompiledArtifact>, CompileError> {
        let artifact = match compile(
            &self.name,
            &self.parameters,
            &self.source,
            self.skybox.as_deref(),
            config,
        ) {
            Ok(artifact) => Arc::new(artifact),
            Err(e) => {
                log::warn!("scene {:?}: compile failed, keeping previous kernel: {e}", self.name);
                return Err(e);
            }
        };

        let store = ParameterStore::from_artifact(&artifact);
        self.compiled = Some(Compiled { artifact: Arc::clone(&artifact), store });
        log::info!(
            "scene {:?}: compiled ({} parameter(s), {} buffer bytes)",
            self.name,
            artifact.layout.slots().len(),
            artifact.layout.byte_size()
        );
        Ok(artifact)
    }

    /// Snapshot of the most recent successful compile.
    pub fn artifact(&self) -> Option<Arc<CompiledArtifact>> {
        self.compiled.as_ref().map(|c| Arc::clone(&c.artifact))
    }

    pub fn store(&self) -> Option<&ParameterStore> {
        self.compiled.as_ref().map(|c| &c.store)
    }

    /// Store access for upload bookkeeping (`clear_dirty`).
    pub fn store_mut(&mut self) -> Option<&mut ParameterStore> {
        self.compiled.as_mut().map(|c| &mut c.store)
    }

    /// `true` when the declared names or kinds no longer match the compiled
    /// layout, i.e. value edits alone cannot be applied and a recompile is
    /// required.
    pub fn is_layout_stale(&self) -> bool {
        let Some(compiled) = &self.compiled else { return true };
        let slots = compiled.artifact.layout.slots();
        slots.len() != self.parameters.len()
            || slots
                .iter()
                .zip(&self.parameters)
                .any(|(slot, decl)| slot.name != decl.name || slot.kind != decl.kind())
    }

    // ── parameters ────────────────────────────────────────────────────────

    /// Sets a parameter value without recompiling.
    ///
    /// The value must match the kind of its declaration and, once compiled,
    /// name a slot of the current layout with that same kind. Store and
    /// declaration are updated together so the value survives the next
    /// recompile; on error neither changes. A declaration whose kind was
    /// edited since the last compile rejects every value until the scene is
    /// recompiled.
    pub fn set_parameter(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), ParameterError> {
        let value = value.into();
        let decl = self.parameters.iter().position(|d| d.name == name);

        if let Some(i) = decl {
            let expected = self.parameters[i].kind();
            if expected != value.kind() {
                return Err(ParameterError::TypeMismatch {
                    name: name.to_string(),
                    expected,
                    found: value.kind(),
                });
            }
        }

        match &mut self.compiled {
            Some(compiled) => compiled.store.set(name, value)?,
            None if decl.is_none() => {
                return Err(ParameterError::UnknownParameterName(name.to_string()));
            }
            None => {}
        }

        if let Some(i) = decl {
            self.parameters[i].value = value;
        }
        Ok(())
    }

    // ── host ──────────────────────────────────────────────────────────────

    /// The compiled scene as a host program bound to the current store.
    /// Parameter edits made later need [`HostScene::sync`].
    pub fn host_scene(&self) -> Result<HostScene, HostError> {
        let compiled = self.compiled.as_ref().ok_or(HostError::NotCompiled)?;
        HostScene::new(&compiled.artifact, &compiled.store)
    }

    /// Current value of a parameter, from the store when compiled.
    pub fn parameter_value(&self, name: &str) -> Option<ParamValue> {
        match &self.compiled {
            Some(compiled) => compiled.store.get(name),
            None => self.parameters.iter().find(|d| d.name == name).map(|d| d.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use rmrp_compiler::ParamKind;

    use super::*;

    const BODY: &str = "\tfloat distance = sphereSD(position, radius);\n@\tfloat4 color = tint;@";

    fn scene() -> Scene {
        Scene::new("unit", BODY)
            .parameter("radius", 1.0_f32)
            .parameter("tint", [1.0_f32, 1.0, 1.0, 1.0])
    }

    #[test]
    fn nothing_compiled_initially() {
        let s = scene();
        assert!(s.artifact().is_none());
        assert!(s.store().is_none());
        assert!(s.is_layout_stale());
    }

    #[test]
    fn recompile_installs_artifact_and_store() {
        let mut s = scene();
        let a = s.recompile(&RenderConfig::default()).unwrap();
        assert!(Arc::ptr_eq(&a, &s.artifact().unwrap()));
        assert_eq!(s.store().unwrap().values().len(), a.layout.total_words() as usize);
        assert!(!s.is_layout_stale());
    }

    #[test]
    fn set_before_compile_checks_declarations() {
        let mut s = scene();
        s.set_parameter("radius", 3.0_f32).unwrap();
        assert_eq!(s.parameter_value("radius"), Some(ParamValue::Scalar(3.0)));
        assert!(matches!(
            s.set_parameter("radius", [1.0_f32, 2.0]),
            Err(ParameterError::TypeMismatch { .. })
        ));
        assert_eq!(
            s.set_parameter("missing", 1.0_f32),
            Err(ParameterError::UnknownParameterName("missing".into()))
        );
    }

    #[test]
    fn set_value_survives_recompile() {
        let mut s = scene();
        s.recompile(&RenderConfig::default()).unwrap();
        s.set_parameter("radius", 4.5_f32).unwrap();
        s.recompile(&RenderConfig::default()).unwrap();
        assert_eq!(s.store().unwrap().values()[0], 4.5);
    }

    #[test]
    fn kind_change_blocks_edits_until_recompile() {
        let mut s = scene();
        s.recompile(&RenderConfig::default()).unwrap();
        s.parameters_mut()[0].value = ParamValue::Vector2([0.0, 0.0]);
        assert!(s.is_layout_stale());
        let store_before = s.store().unwrap().clone();

        // The store still holds a scalar, the declaration now wants a float2.
        assert_eq!(
            s.set_parameter("radius", 2.0_f32),
            Err(ParameterError::TypeMismatch {
                name: "radius".into(),
                expected: ParamKind::Vector2,
                found: ParamKind::Scalar,
            })
        );
        assert!(matches!(
            s.set_parameter("radius", [1.0_f32, 2.0]),
            Err(ParameterError::TypeMismatch { expected: ParamKind::Scalar, .. })
        ));
        assert_eq!(s.store().unwrap(), &store_before);
        assert_eq!(s.parameters()[0].value, ParamValue::Vector2([0.0, 0.0]));

        s.recompile(&RenderConfig::default()).unwrap();
        s.set_parameter("radius", [1.0_f32, 2.0]).unwrap();
        assert_eq!(s.parameter_value("radius"), Some(ParamValue::Vector2([1.0, 2.0])));
    }

    #[test]
    fn host_scene_follows_the_compiled_store() {
        let mut s = scene();
        assert_eq!(s.host_scene().unwrap_err(), HostError::NotCompiled);

        s.recompile(&RenderConfig::default()).unwrap();
        s.set_parameter("radius", 2.0_f32).unwrap();
        let host = s.host_scene().unwrap();
        assert_eq!(host.try_distance(glam::Vec3::ZERO, 0).unwrap(), -2.0);
    }

    #[test]
    fn stale_after_declaration_change() {
        let mut s = scene();
        s.recompile(&RenderConfig::default()).unwrap();
        s.parameters_mut().push(ParameterDeclaration::new("extra", 0.0_f32));
        assert!(s.is_layout_stale());
        // The live store still only knows the compiled layout.
        assert_eq!(
            s.set_parameter("extra", 1.0_f32),
            Err(ParameterError::UnknownParameterName("extra".into()))
        );
    }
}
