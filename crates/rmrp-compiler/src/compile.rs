use std::sync::Arc;

use crate::assembler::{assemble, bake, buffer_block};
use crate::config::RenderConfig;
use crate::error::CompileError;
use crate::layout::{allocate, BufferLayout};
use crate::params::ParameterDeclaration;
use crate::templates::{
    DEFAULT_SKYBOX, DISPATCH, DISPATCH_ENTRY, DISTANCE_ENTRY, MATERIAL_ENTRY, PRELUDE,
};
use crate::variants::split_scene;

/// Result of one successful compile. Immutable once built.
///
/// A scene replaces its artifact as a whole; nothing ever observes a
/// partially written one.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArtifact {
    pub scene_name: String,
    pub kernel_source: String,
    pub layout: Arc<BufferLayout>,
    /// Packed default values, `layout.total_words()` long.
    pub defaults: Vec<f32>,
    /// Scene body for the host target: `#` regions kept, `@` markers intact.
    pub host_body: String,
    /// Skybox body as emitted into the kernel.
    pub skybox_body: String,
    pub distance_entry: &'static str,
    pub material_entry: &'static str,
    pub dispatch_entry: &'static str,
}

impl CompiledArtifact {
    /// File name a persistence layer should use, e.g. `rmrp_my_scene.compute`.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .scene_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("rmrp_{stem}.compute")
    }
}

/// Compiles a scene into kernel source and buffer layout.
///
/// Stages run in order and the first failure aborts the whole compile:
/// render config check, declaration validation and layout, variant split,
/// assembly. `skybox_body` of `None` falls back to an opaque black sky.
pub fn compile(
    scene_name: &str,
    parameters: &[ParameterDeclaration],
    main_body: &str,
    skybox_body: Option<&str>,
    config: &RenderConfig,
) -> Result<CompiledArtifact, CompileError> {
    config.validate()?;

    let allocation = allocate(parameters)?;
    let bodies = split_scene(main_body)?;

    let prelude = bake(PRELUDE, config);
    let dispatch = bake(DISPATCH, config);
    let block = buffer_block(&allocation.layout);

    let skybox_body = skybox_body.unwrap_or(DEFAULT_SKYBOX);

    let kernel_source = assemble(
        &prelude,
        &block,
        &bodies.distance,
        &bodies.material,
        &dispatch,
        skybox_body,
    );

    log::debug!(
        "compiled scene {scene_name:?}: {} bytes of kernel, {} buffer words",
        kernel_source.len(),
        allocation.layout.total_words()
    );

    Ok(CompiledArtifact {
        scene_name: scene_name.to_string(),
        kernel_source,
        layout: Arc::new(allocation.layout),
        defaults: allocation.defaults,
        host_body: bodies.host,
        skybox_body: skybox_body.to_string(),
        distance_entry: DISTANCE_ENTRY,
        material_entry: MATERIAL_ENTRY,
        dispatch_entry: DISPATCH_ENTRY,
    })
}
