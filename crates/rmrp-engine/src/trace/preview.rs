use glam::{UVec2, Vec2, Vec4};
use rayon::prelude::*;

use rmrp_compiler::templates::HIT_EPSILON;
use rmrp_compiler::RenderConfig;

use super::camera::{Camera, Ray};
use super::march::{march, SceneFunctions};

/// Traces a `width` × `height` image on the CPU, one ray per pixel.
///
/// Pixels are row-major from the top-left, as the kernel writes
/// `output[id.xy]`. Each pixel is traced independently on the rayon pool.
pub fn render_preview<S>(
    scene: &S,
    camera: &Camera,
    width: u32,
    height: u32,
    config: &RenderConfig,
) -> Vec<Vec4>
where
    S: SceneFunctions + Sync + ?Sized,
{
    let dimensions = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    let resolution_factor = 1.0 / config.resolution_scale;
    let max_steps = config.step_budget;

    log::debug!("cpu preview {width}x{height}, {max_steps} steps");

    let mut image = vec![Vec4::ZERO; pixel_count(width, height)];
    if image.is_empty() {
        return image;
    }

    image
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for (x, pixel) in (0..width).zip(row.iter_mut()) {
                let ray = Ray::from_screen(UVec2::new(x, y), dimensions, resolution_factor, camera);
                *pixel = march(scene, &ray, max_steps, HIT_EPSILON).color;
            }
        });
    image
}

/// Pixels in a `width` × `height` image, computed in `usize`.
fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Clamps linear colours to 8-bit RGBA.
pub fn to_rgba8(pixels: &[Vec4]) -> Vec<u8> {
    pixels
        .iter()
        .flat_map(|c| {
            let c = c.clamp(Vec4::ZERO, Vec4::ONE) * 255.0 + 0.5;
            [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
        })
        .collect()
}
