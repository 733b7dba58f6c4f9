//! Geometry and material helpers every kernel includes, on `glam` types.

use glam::{Vec3, Vec4};

pub fn plane_sd(p: Vec3) -> f32 {
    p.y
}

pub fn sphere_sd(p: Vec3, radius: f32) -> f32 {
    p.length() - radius
}

pub fn box_sd(p: Vec3, b: Vec3) -> f32 {
    let q = p.abs() - b;
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
}

/// Domain repetition with cell size `cell`, centred on the origin.
pub fn repeat(p: Vec3, cell: Vec3) -> Vec3 {
    // `%` truncates like HLSL `fmod`.
    (p + 0.5 * cell).abs() % cell - 0.5 * cell
}

/// Polynomial smooth minimum; `blend` is the width of the blend region.
pub fn smooth_union(a: f32, b: f32, blend: f32) -> f32 {
    let h = (blend - (a - b).abs()).max(0.0) / blend;
    a.min(b) - h * h * blend * 0.25
}

/// [`smooth_union`] that also blends `color_a` toward `color_b`.
pub fn smooth_union_m(a: f32, b: f32, color_a: &mut Vec4, color_b: Vec4, blend: f32) -> f32 {
    let m = smooth_union(a, b, blend);
    *color_a = color_a.lerp(color_b, (a - m).clamp(0.0, 1.0));
    m
}

pub fn transform_modifier(p: Vec3, offset: Vec3) -> Vec3 {
    p - offset
}

pub fn lit_material(normal: Vec3, light_direction: Vec3, color: Vec4) -> Vec4 {
    (-light_direction.normalize()).dot(normal).clamp(0.0, 1.0) * color
}
