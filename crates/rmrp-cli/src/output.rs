//! Files written for a compiled scene.
//!
//! - `<stem>.compute`     kernel source
//! - `<stem>.bin`         packed default buffer, native-endian f32 words
//! - `<stem>.layout.json` name → offset table
//! - `<stem>.png`         CPU preview, with `--preview`

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde_json::json;

use rmrp_compiler::{CompiledArtifact, ParameterStore, RenderConfig};
use rmrp_engine::trace::{render_preview, to_rgba8, Camera};
use rmrp_engine::HostScene;

/// Paths of everything [`write_artifact`] produced.
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub kernel: PathBuf,
    pub buffer: PathBuf,
    pub layout: PathBuf,
}

/// JSON description of the buffer layout.
pub fn layout_json(artifact: &CompiledArtifact) -> serde_json::Value {
    let slots: Vec<_> = artifact
        .layout
        .slots()
        .iter()
        .map(|s| {
            json!({
                "name": s.name,
                "kind": s.kind.hlsl_type(),
                "word_offset": s.word_offset,
                "word_count": s.word_count,
                "byte_offset": s.byte_offset(),
            })
        })
        .collect();

    json!({
        "scene": artifact.scene_name,
        "buffer": rmrp_compiler::templates::BUFFER_BLOCK_NAME,
        "total_words": artifact.layout.total_words(),
        "byte_size": artifact.layout.byte_size(),
        "entries": {
            "distance": artifact.distance_entry,
            "material": artifact.material_entry,
            "dispatch": artifact.dispatch_entry,
        },
        "slots": slots,
    })
}

/// Writes kernel, buffer image and layout table into `dir`.
pub fn write_artifact(
    dir: &Path,
    artifact: &CompiledArtifact,
    store: &ParameterStore,
) -> Result<WrittenFiles> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let kernel = dir.join(artifact.file_name());
    let buffer = kernel.with_extension("bin");
    let layout = kernel.with_extension("layout.json");

    fs::write(&kernel, &artifact.kernel_source)
        .with_context(|| format!("writing {}", kernel.display()))?;
    fs::write(&buffer, store.as_bytes())
        .with_context(|| format!("writing {}", buffer.display()))?;
    let text = serde_json::to_string_pretty(&layout_json(artifact))?;
    fs::write(&layout, text).with_context(|| format!("writing {}", layout.display()))?;

    Ok(WrittenFiles { kernel, buffer, layout })
}

/// `WIDTHxHEIGHT`, e.g. `320x180`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PreviewSize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for PreviewSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let dim = |t: &str| match t.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("invalid preview dimension {t:?}")),
        };
        Ok(Self { width: dim(w)?, height: dim(h)? })
    }
}

impl PreviewSize {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Traces `scene` on the CPU and writes the image as `<stem>.png`.
pub fn write_preview(
    dir: &Path,
    artifact: &CompiledArtifact,
    scene: &HostScene,
    camera: &Camera,
    size: PreviewSize,
    config: &RenderConfig,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(artifact.file_name()).with_extension("png");

    let pixels = render_preview(scene, camera, size.width, size.height, config);
    // Texture row 0 is the bottom of the view; PNG row 0 is the top.
    let rgba: Vec<u8> = to_rgba8(&pixels)
        .chunks_exact(size.width as usize * 4)
        .rev()
        .flatten()
        .copied()
        .collect();

    image::save_buffer(&path, &rgba, size.width, size.height, image::ColorType::Rgba8)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
