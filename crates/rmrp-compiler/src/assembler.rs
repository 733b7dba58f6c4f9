//! Kernel text composition.
//!
//! Everything here is plain string building: the DSL inside the bodies is
//! not parsed or checked. Output order is fixed:
//!
//! 1. prelude
//! 2. constant-buffer block
//! 3. distance function (strip-mode body)
//! 4. material function (keep-mode body)
//! 5. dispatch template
//! 6. skybox function

use std::fmt::Write as _;

use crate::config::RenderConfig;
use crate::layout::BufferLayout;
use crate::templates::{
    BUFFER_BLOCK_NAME, DISTANCE_ENTRY, EPSILON_TOKEN, GROUP_SIZE_TOKEN, HIT_EPSILON,
    MATERIAL_ENTRY, NORMAL_EPSILON, NORMAL_H_TOKEN, RESOLUTION_TOKEN, SKYBOX_ENTRY, STEPS_TOKEN,
};

// ── buffer block ──────────────────────────────────────────────────────────

/// `cbuffer` declaration listing every slot in layout order.
///
/// Each member carries an explicit `packoffset` so the device-side layout
/// cannot drift from the allocator's. An empty layout yields an empty
/// string: there is nothing to bind.
pub fn buffer_block(layout: &BufferLayout) -> String {
    if layout.is_empty() {
        return String::new();
    }

    let mut s = String::new();
    let _ = writeln!(s, "\n// BUFFERS ({} bytes)", layout.byte_size());
    let _ = writeln!(s, "cbuffer {BUFFER_BLOCK_NAME}");
    s.push_str("{\n");
    for slot in layout.slots() {
        let _ = writeln!(
            s,
            "\t{} {} : packoffset({});",
            slot.kind.hlsl_type(),
            slot.name,
            slot.register()
        );
    }
    s.push_str("};\n");
    s
}

// ── function wrappers ─────────────────────────────────────────────────────

/// Wraps the distance body. The body must assign `distance`.
pub fn distance_function(body: &str) -> String {
    format!(
        "\n// USER SHADER\nfloat {DISTANCE_ENTRY}(float3 position, int step)\n{{\n{body}\n\treturn distance;\n}}\n"
    )
}

/// Wraps the material body. The body must assign `color`.
pub fn material_function(body: &str) -> String {
    format!(
        "\nfloat4 {MATERIAL_ENTRY}(float3 position, int step)\n{{\n{body}\n\treturn color;\n}}\n"
    )
}

/// Wraps the skybox body verbatim. The body must assign `color`.
pub fn skybox_function(body: &str) -> String {
    format!("\nfloat4 {SKYBOX_ENTRY}(int step)\n{{\n{body}\n\treturn color;\n}}\n")
}

// ── numeric templating ────────────────────────────────────────────────────

/// Kernel spelling of a float constant: always carries a decimal point.
pub fn float_literal(value: f32) -> String {
    let s = value.to_string();
    if s.contains(['.', 'e', 'E']) { s } else { format!("{s}.0") }
}

/// Substitutes the per-compile literals and the integrator constants into a
/// template.
pub fn bake(template: &str, config: &RenderConfig) -> String {
    template
        .replace(RESOLUTION_TOKEN, &config.resolution_literal())
        .replace(STEPS_TOKEN, &config.step_budget.to_string())
        .replace(GROUP_SIZE_TOKEN, &config.thread_group_size.to_string())
        .replace(EPSILON_TOKEN, &float_literal(HIT_EPSILON))
        .replace(NORMAL_H_TOKEN, &float_literal(NORMAL_EPSILON))
}

// ── assemble ──────────────────────────────────────────────────────────────

/// Concatenates the six kernel parts in their fixed order.
///
/// Deterministic and side-effect free; writing the result anywhere is up to
/// the caller.
pub fn assemble(
    prelude: &str,
    buffer_block: &str,
    distance_body: &str,
    material_body: &str,
    dispatch_template: &str,
    skybox_body: &str,
) -> String {
    let distance = distance_function(distance_body);
    let material = material_function(material_body);
    let skybox = skybox_function(skybox_body);

    let mut s = String::with_capacity(
        prelude.len()
            + buffer_block.len()
            + distance.len()
            + material.len()
            + dispatch_template.len()
            + skybox.len(),
    );
    s.push_str(prelude);
    s.push_str(buffer_block);
    s.push_str(&distance);
    s.push_str(&material);
    s.push_str(dispatch_template);
    s.push_str(&skybox);
    s
}
