//! Compiler for ray-marched SDF scenes.
//!
//! Turns a scene body, its named parameters and a render configuration into
//! an HLSL sphere-tracing compute kernel plus the packed constant-buffer
//! layout that feeds it.
//!
//! This crate does no I/O and keeps no global state; every call is
//! independent, so scenes may be compiled concurrently.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`variants`] | marker-delimited region splitting (`#` host, `@` material) |
//! | [`params`] | `ParamKind`, `ParamValue`, `ParameterDeclaration` |
//! | [`layout`] | straddle-free constant-buffer allocation |
//! | [`store`] | `ParameterStore`, the flattened upload image |
//! | [`assembler`] | kernel text composition and literal baking |
//! | [`templates`] | static prelude and dispatch HLSL |
//! | [`config`] | `RenderConfig` |
//! | [`compile`] | `compile` entry point, `CompiledArtifact` |
//! | [`host`] | host target: parses scene code for CPU evaluation |
//! | [`error`] | `CompileError`, `ParameterError`, `HostParseError` |
//!
//! # Quick start
//!
//! ```rust
//! use rmrp_compiler::{compile, ParameterDeclaration, ParameterStore, RenderConfig};
//!
//! let params = [
//!     ParameterDeclaration::new("radius", 1.0_f32),
//!     ParameterDeclaration::new("tint", [1.0_f32, 0.5, 0.2, 1.0]),
//! ];
//! let body = "\tfloat distance = sphereSD(position, radius);\n\
//!             @\tfloat4 color = unlitMaterial(tint);@";
//!
//! let artifact = compile("demo", &params, body, None, &RenderConfig::default()).unwrap();
//! assert!(artifact.kernel_source.contains("float rm_sceneSDF(float3 position, int step)"));
//!
//! let mut store = ParameterStore::from_artifact(&artifact);
//! store.set("radius", 2.0_f32).unwrap();
//! assert_eq!(store.values()[0], 2.0);
//! ```

pub mod assembler;
pub mod compile;
pub mod config;
pub mod error;
pub mod host;
pub mod layout;
pub mod params;
pub mod store;
pub mod templates;
pub mod variants;

pub use compile::{compile, CompiledArtifact};
pub use config::RenderConfig;
pub use error::{CompileError, HostParseError, ParameterError};
pub use host::{HostProgram, Section};
pub use layout::{BufferLayout, BufferSlot};
pub use params::{ParamKind, ParamValue, ParameterDeclaration};
pub use store::ParameterStore;
pub use variants::{split, VariantSplit};

#[cfg(test)]
mod compile_tests {
    use super::*;

    const BODY: &str = "\tfloat distance = sphereSD(transformModifier(position, center), radius);\n\
                        @\tfloat4 color = unlitMaterial(tint);@\n\
                        #\tpreview_hook(position);#";

    fn params() -> Vec<ParameterDeclaration> {
        vec![
            ParameterDeclaration::new("radius", 1.0_f32),
            ParameterDeclaration::new("center", [0.0_f32, 1.0, 0.0]),
            ParameterDeclaration::new("tint", [1.0_f32, 0.0, 0.0, 1.0]),
        ]
    }

    fn ok(body: &str) -> CompiledArtifact {
        compile("test", &params(), body, None, &RenderConfig::default()).unwrap()
    }

    fn err(params: &[ParameterDeclaration], body: &str) -> CompileError {
        compile("test", params, body, None, &RenderConfig::default()).unwrap_err()
    }

    fn function<'k>(kernel: &'k str, signature: &str) -> &'k str {
        let start = kernel.find(signature).unwrap();
        let end = start + kernel[start..].find("\n}\n").unwrap();
        &kernel[start..end]
    }

    #[test]
    fn distance_function_excludes_material_lines() {
        let a = ok(BODY);
        let f = function(&a.kernel_source, "float rm_sceneSDF(float3 position, int step)\n{");
        assert!(f.contains("sphereSD(transformModifier(position, center), radius)"));
        assert!(!f.contains("unlitMaterial"));
        assert!(f.ends_with("return distance;"));
    }

    #[test]
    fn material_function_keeps_material_lines() {
        let a = ok(BODY);
        let f = function(
            &a.kernel_source,
            "float4 rm_materialSceneSDF(float3 position, int step)\n{",
        );
        assert!(f.contains("float4 color = unlitMaterial(tint);"));
        assert!(f.contains("sphereSD("));
        assert!(f.ends_with("return color;"));
    }

    #[test]
    fn no_markers_or_host_code_reach_the_kernel() {
        let a = ok(BODY);
        let user = &a.kernel_source[a.kernel_source.find("// USER SHADER").unwrap()..];
        assert!(!user.contains('@'));
        assert!(!user.contains("preview_hook"));
    }

    #[test]
    fn literals_are_baked() {
        let config = RenderConfig { step_budget: 96, resolution_scale: 0.5, thread_group_size: 16 };
        let a = compile("t", &params(), BODY, None, &config).unwrap();
        let k = &a.kernel_source;
        assert!(k.contains("for (int i = 0; i < 96; i++)"));
        assert!(k.contains("return skybox_color(96);"));
        assert!(k.contains("(screen_pos.xy * 2.000)"));
        assert!(k.contains("[numthreads(16,16,1)]"));
        assert!(!k.contains("__"));
    }

    #[test]
    fn integrator_constants_are_baked_from_the_shared_values() {
        let k = ok(BODY).kernel_source;
        let epsilon = assembler::float_literal(templates::HIT_EPSILON);
        let h = assembler::float_literal(templates::NORMAL_EPSILON);
        assert!(k.contains(&format!("float min_dist = {epsilon};")), "hit epsilon not baked");
        assert!(k.contains(&format!("const float h = {h};")), "normal offset not baked");
        assert_eq!(epsilon, "0.0001");
    }

    #[test]
    fn buffer_block_follows_layout() {
        let a = ok(BODY);
        assert_eq!(a.layout.total_words(), 12);
        assert!(a.kernel_source.contains("cbuffer SDFBuffers"));
        assert!(a.kernel_source.contains("\tfloat3 center : packoffset(c1.x);"));
        assert!(a.kernel_source.contains("\tfloat4 tint : packoffset(c2.x);"));
        assert_eq!(a.defaults.len(), 12);
    }

    #[test]
    fn skybox_is_last_and_verbatim() {
        let sky = "\tfloat4 color = float4(0.2, 0.3, 0.9, 1) * step;";
        let a = compile("t", &params(), BODY, Some(sky), &RenderConfig::default()).unwrap();
        let tail = &a.kernel_source[a.kernel_source.rfind("float4 skybox_color(int step)\n{").unwrap()..];
        assert!(tail.contains(sky));
        assert!(a.kernel_source.trim_end().ends_with('}'));
    }

    #[test]
    fn entry_names_are_exposed() {
        let a = ok(BODY);
        for entry in [a.distance_entry, a.material_entry, a.dispatch_entry] {
            assert!(a.kernel_source.contains(entry), "{entry} missing");
        }
    }

    #[test]
    fn compile_is_deterministic() {
        assert_eq!(ok(BODY), ok(BODY));
    }

    #[test]
    fn file_name_is_sanitized() {
        let a = compile("My Scene!", &[], "float distance = 1;", None, &RenderConfig::default())
            .unwrap();
        assert_eq!(a.file_name(), "rmrp_My_Scene_.compute");
        assert!(!a.kernel_source.contains("cbuffer"));
    }

    #[test] fn err_unbalanced_material() {
        assert_eq!(err(&params(), "float distance = 1; @x"), CompileError::MalformedVariantMarkers('@'));
    }
    #[test] fn err_unbalanced_host() {
        assert_eq!(err(&params(), "# float distance = 1;"), CompileError::MalformedVariantMarkers('#'));
    }
    #[test] fn err_duplicate_name() {
        let mut p = params();
        p.push(ParameterDeclaration::new("radius", 3.0_f32));
        assert_eq!(err(&p, BODY), CompileError::DuplicateParameterName("radius".into()));
    }
    #[test] fn err_empty_name() {
        let p = [ParameterDeclaration::new("", 3.0_f32)];
        assert_eq!(err(&p, BODY), CompileError::InvalidParameterName(String::new()));
    }
    #[test] fn err_bad_config() {
        let config = RenderConfig { resolution_scale: 0.0, ..Default::default() };
        assert!(matches!(
            compile("t", &params(), BODY, None, &config),
            Err(CompileError::InvalidRenderConfig(_))
        ));
    }
}
