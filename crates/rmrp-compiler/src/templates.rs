//! Static HLSL text stitched around the generated parts of a kernel.
//!
//! Placeholders of the form `__name` are replaced with literals by the
//! assembler before the text is emitted.

/// Replaced by `1 / resolution_scale`, three fractional digits.
pub const RESOLUTION_TOKEN: &str = "__resolution";
/// Replaced by the step budget.
pub const STEPS_TOKEN: &str = "__steps";
/// Replaced by the thread-group edge length.
pub const GROUP_SIZE_TOKEN: &str = "__group_size";
/// Replaced by [`HIT_EPSILON`].
pub const EPSILON_TOKEN: &str = "__epsilon";
/// Replaced by [`NORMAL_EPSILON`].
pub const NORMAL_H_TOKEN: &str = "__normal_h";

pub const DISTANCE_ENTRY: &str = "rm_sceneSDF";
pub const MATERIAL_ENTRY: &str = "rm_materialSceneSDF";
pub const SKYBOX_ENTRY: &str = "skybox_color";
pub const DISPATCH_ENTRY: &str = "CSMain";

/// Name of the generated constant buffer.
pub const BUFFER_BLOCK_NAME: &str = "SDFBuffers";

/// Identifiers the generated kernel already defines, at global scope or as
/// locals and arguments of the generated functions. A parameter with one of
/// these names would collide with or be shadowed by kernel code.
pub const KERNEL_SYMBOLS: &[&str] = &[
    // generated functions and their arguments and locals
    DISTANCE_ENTRY,
    MATERIAL_ENTRY,
    SKYBOX_ENTRY,
    DISPATCH_ENTRY,
    BUFFER_BLOCK_NAME,
    "position",
    "step",
    "distance",
    "color",
    // prelude globals and functions
    "camera_to_world",
    "inverse_projection",
    "output",
    "Ray",
    "getOutputDimensions",
    "calculateRay",
    "calculate_normal",
    "raymarch",
    "planeSD",
    "sphereSD",
    "boxSD",
    "repeat",
    "smoothUnion_m",
    "smoothUnion",
    "transformModifier",
    "unlitMaterial",
    "litMaterial",
];

/// Surface hit threshold of the march loop.
pub const HIT_EPSILON: f32 = 1e-4;
/// Offset magnitude of the tetrahedral normal estimate.
pub const NORMAL_EPSILON: f32 = 1e-4;

/// Kernel pragma, forward declarations, camera globals, ray construction,
/// normal estimation and the fixed geometry/material helpers.
pub const PRELUDE: &str = r#"// MAIN
#pragma kernel CSMain

float rm_sceneSDF(float3 position, int step);
float4 rm_materialSceneSDF(float3 position, int step);
float4 skybox_color(int step);

float4x4 camera_to_world;
float4x4 inverse_projection;
uniform RWTexture2D<float4> output;

struct Ray
{
    float3 origin;
    float3 direction;
};

float2 getOutputDimensions()
{
    float2 dimension;
    output.GetDimensions(dimension.x, dimension.y);
    return dimension;
}

Ray calculateRay(uint2 screen_pos)
{
    Ray r;

    float2 uv = (screen_pos.xy * __resolution) / getOutputDimensions() * 2 - 1;

    r.origin = mul(camera_to_world, float4(0,0,0,1)).xyz;
    r.direction = mul(inverse_projection, float4(uv.xy,0,1)).xyz;

    r.direction /= abs(r.direction.z);

    r.direction = mul(camera_to_world, float4(r.direction,0)).xyz;
    r.direction = normalize(r.direction);

    return r;
}

// Tetrahedral central difference: four samples instead of six.
float3 calculate_normal(float3 pos)
{
    const float h = __normal_h;
    const float2 k = float2(h,-h);
    return normalize( k.xyy * rm_sceneSDF( pos + k.xyy, 0) +
                      k.yyx * rm_sceneSDF( pos + k.yyx, 0) +
                      k.yxy * rm_sceneSDF( pos + k.yxy, 0) +
                      k.xxx * rm_sceneSDF( pos + k.xxx, 0) );
}

// INCLUDE
float planeSD(float3 position)
{
    return position.y;
}

float sphereSD(float3 position, float radius)
{
    return length(position) - radius;
}

float boxSD(float3 p, float3 b)
{
    float3 q = abs(p) - b;
    return length(max(q,0.0)) + min(max(q.x,max(q.y,q.z)), 0.0);
}

float3 repeat(float3 position, float3 repeat)
{
    return fmod(abs(position+0.5*repeat), repeat)-0.5*repeat;
}

float smoothUnion_m(float a, float b, inout float4 color_a, float4 color_b, float blend)
{
    float m = min(a, b);

    float h_dist = max(blend - abs(a - b), 0.0) / blend;
    m -= h_dist*h_dist*blend*(1.0/4.0);

    color_a = lerp(color_a, color_b, saturate(a - m));

    return m;
}

float smoothUnion(float a, float b, float blend)
{
    float m = min(a, b);

    float h_dist = max(blend - abs(a - b), 0.0) / blend;
    m -= h_dist*h_dist*blend*(1.0/4.0);

    return m;
}

float3 transformModifier(float3 position, float3 transform)
{
    return position - transform;
}

float4 unlitMaterial(float4 color)
{
    return color;
}

float4 litMaterial(float3 normal, float3 light_direction, float4 color)
{
    return saturate(dot(-normalize(light_direction), normal)) * color;
}
"#;

/// March loop and dispatch entry point.
///
/// `current_distance < min_dist` ends the march with the material colour at
/// the advanced point; running out of steps yields the skybox.
pub const DISPATCH: &str = r#"
// DISPATCH
float4 raymarch(Ray r)
{
    float dist = 0;
    float min_dist = __epsilon;
    for (int i = 0; i < __steps; i++)
    {
        float current_distance = rm_sceneSDF(r.origin + r.direction * dist, i);
        dist += current_distance;
        if (current_distance < min_dist)
        {
            return rm_materialSceneSDF(r.origin + r.direction * dist, i);
        }
    }

    return skybox_color(__steps);
}

[numthreads(__group_size,__group_size,1)]
void CSMain (uint3 id : SV_DispatchThreadID)
{
    Ray r = calculateRay(id.xy);
    output[id.xy] = raymarch(r);
}
"#;

/// Skybox body used when a scene supplies none.
pub const DEFAULT_SKYBOX: &str = "\tfloat4 color = float4(0, 0, 0, 1);";

#[cfg(test)]
mod tests {
    use super::*;

    /// Names following a return type at the start of a prelude line.
    fn defined_functions(text: &str) -> Vec<&str> {
        text.lines()
            .filter_map(|line| {
                let rest = ["float4 ", "float3 ", "float2 ", "float ", "Ray "]
                    .iter()
                    .find_map(|ty| line.strip_prefix(ty))?;
                let name = rest.split('(').next()?;
                rest.contains('(').then_some(name.trim())
            })
            .collect()
    }

    #[test]
    fn every_prelude_function_is_a_kernel_symbol() {
        let names = defined_functions(PRELUDE);
        assert!(names.contains(&"sphereSD"));
        for name in names {
            assert!(KERNEL_SYMBOLS.contains(&name), "{name} is not reserved");
        }
    }

    #[test]
    fn dispatch_functions_are_kernel_symbols() {
        for name in defined_functions(DISPATCH) {
            assert!(KERNEL_SYMBOLS.contains(&name), "{name} is not reserved");
        }
    }
}
