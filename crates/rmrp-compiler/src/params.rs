use std::collections::HashSet;
use std::fmt;

use crate::error::CompileError;
use crate::templates::KERNEL_SYMBOLS;

/// HLSL keywords and the intrinsics the prelude relies on. None of them can
/// name a buffer member.
const HLSL_RESERVED: &[&str] = &[
    "bool", "break", "case", "cbuffer", "centroid", "class", "column_major", "compile",
    "const", "continue", "default", "discard", "do", "double", "else", "export", "extern",
    "false", "float", "float2", "float3", "float4", "float2x2", "float3x3", "float4x4", "for",
    "groupshared", "half", "if", "in", "inline", "inout", "int", "int2", "int3", "int4",
    "interface", "line", "linear", "matrix", "min16float", "namespace", "nointerpolation",
    "noperspective", "out", "packoffset", "point", "precise", "register", "return",
    "row_major", "sampler", "shared", "static", "string", "struct", "switch", "tbuffer",
    "texture", "triangle", "true", "typedef", "uint", "uint2", "uint3", "uint4", "uniform",
    "vector", "void", "volatile", "while", "RWTexture2D", "Texture2D", "SamplerState",
    // intrinsics
    "abs", "ceil", "clamp", "cos", "cross", "dot", "exp", "floor", "fmod", "frac", "length",
    "lerp", "log", "max", "min", "mul", "normalize", "pow", "saturate", "sign", "sin",
    "smoothstep", "sqrt", "tan",
];

// ── ParamKind ─────────────────────────────────────────────────────────────

/// Shape of a named parameter, as seen by the kernel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Scalar,
    Vector2,
    Vector3,
    Vector4,
}

impl ParamKind {
    /// Number of 32-bit words the parameter occupies in the constant buffer.
    #[inline]
    pub const fn word_count(self) -> u32 {
        match self {
            ParamKind::Scalar => 1,
            ParamKind::Vector2 => 2,
            ParamKind::Vector3 => 3,
            ParamKind::Vector4 => 4,
        }
    }

    /// HLSL type name used in the generated buffer block.
    pub const fn hlsl_type(self) -> &'static str {
        match self {
            ParamKind::Scalar => "float",
            ParamKind::Vector2 => "float2",
            ParamKind::Vector3 => "float3",
            ParamKind::Vector4 => "float4",
        }
    }

    /// Kind for a given word count, if it is one of 1..=4.
    pub const fn from_word_count(words: usize) -> Option<Self> {
        match words {
            1 => Some(ParamKind::Scalar),
            2 => Some(ParamKind::Vector2),
            3 => Some(ParamKind::Vector3),
            4 => Some(ParamKind::Vector4),
            _ => None,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hlsl_type())
    }
}

// ── ParamValue ────────────────────────────────────────────────────────────

/// A parameter value. The variant is the parameter's kind.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ParamValue {
    Scalar(f32),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    Vector4([f32; 4]),
}

impl ParamValue {
    pub const fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Scalar(_) => ParamKind::Scalar,
            ParamValue::Vector2(_) => ParamKind::Vector2,
            ParamValue::Vector3(_) => ParamKind::Vector3,
            ParamValue::Vector4(_) => ParamKind::Vector4,
        }
    }

    #[inline]
    pub const fn word_count(&self) -> u32 {
        self.kind().word_count()
    }

    /// Buffer words in component order.
    pub fn words(&self) -> &[f32] {
        match self {
            ParamValue::Scalar(v) => std::slice::from_ref(v),
            ParamValue::Vector2(v) => v,
            ParamValue::Vector3(v) => v,
            ParamValue::Vector4(v) => v,
        }
    }

    /// Rebuilds a value from 1..=4 words. Returns `None` for any other length.
    pub fn from_words(words: &[f32]) -> Option<Self> {
        Some(match words {
            &[x] => ParamValue::Scalar(x),
            &[x, y] => ParamValue::Vector2([x, y]),
            &[x, y, z] => ParamValue::Vector3([x, y, z]),
            &[x, y, z, w] => ParamValue::Vector4([x, y, z, w]),
            _ => return None,
        })
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Scalar(v)
    }
}

impl From<[f32; 2]> for ParamValue {
    fn from(v: [f32; 2]) -> Self {
        ParamValue::Vector2(v)
    }
}

impl From<[f32; 3]> for ParamValue {
    fn from(v: [f32; 3]) -> Self {
        ParamValue::Vector3(v)
    }
}

impl From<[f32; 4]> for ParamValue {
    fn from(v: [f32; 4]) -> Self {
        ParamValue::Vector4(v)
    }
}

// ── ParameterDeclaration ──────────────────────────────────────────────────

/// A named scene parameter together with its default (current) value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDeclaration {
    pub name: String,
    pub value: ParamValue,
}

impl ParameterDeclaration {
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    #[inline]
    pub fn kind(&self) -> ParamKind {
        self.value.kind()
    }
}

/// Returns `true` when `name` can be emitted as a kernel identifier.
///
/// The name must be an identifier, must not start with the `__` template
/// placeholder prefix, and must not be a keyword or a symbol the kernel
/// already defines.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !is_reserved(name)
}

/// Keyword, intrinsic, kernel symbol or placeholder-like name.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with("__") || HLSL_RESERVED.contains(&name) || KERNEL_SYMBOLS.contains(&name)
}

/// Declaration-time validation: every name valid, no name repeated.
///
/// Runs before any layout work so a bad declaration list never reaches the
/// allocator.
pub fn validate_declarations(decls: &[ParameterDeclaration]) -> Result<(), CompileError> {
    let mut seen = HashSet::with_capacity(decls.len());
    for decl in decls {
        if !is_valid_name(&decl.name) {
            return Err(CompileError::InvalidParameterName(decl.name.clone()));
        }
        if !seen.insert(decl.name.as_str()) {
            return Err(CompileError::DuplicateParameterName(decl.name.clone()));
        }
    }
    Ok(())
}
