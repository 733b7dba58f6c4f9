//! Host target: scene code as a program the CPU can run.
//!
//! The kernel is built from the device cut of a scene body (`#` regions
//! removed). The host target takes the opposite cut: `#` regions kept, so
//! code that only makes sense on the host may live there. From that text
//! the `@` pass derives a distance program (material statements removed)
//! and a material program (kept). The skybox body is a third program.
//!
//! Scene bodies are straight-line code, and that is all the host language
//! accepts:
//!
//! - declarations `[const] floatN name [= expr];` (`half*`, `int*`, `uint*`
//!   also accepted)
//! - assignments to a local or a swizzle of one, with `=`, `+=`, `-=`, `*=`,
//!   `/=`
//! - expression statements
//!
//! Expressions are float literals, variables, calls, `floatN(...)`
//! constructors, swizzles, unary minus, `* / + -`, comparisons and `?:`.
//! Without branches or loops every statement runs on every evaluation.
//!
//! Parsing happens here; evaluation lives in `rmrp-engine`.

mod ast;
mod lexer;
mod parser;

use std::fmt;

pub use ast::{AssignOp, BinOp, Expr, Place, Stmt, Swizzle, TypeName};
pub use parser::parse_body;

use crate::compile::CompiledArtifact;
use crate::error::HostParseError;
use crate::variants::{split, VariantSplit, MATERIAL_MARKER};

/// One of the three host programs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Section {
    Distance,
    Material,
    Skybox,
}

impl Section {
    /// Local the program must assign: the value it returns.
    pub const fn result(self) -> &'static str {
        match self {
            Section::Distance => "distance",
            Section::Material | Section::Skybox => "color",
        }
    }

    /// Width of the returned value.
    pub const fn result_width(self) -> u8 {
        match self {
            Section::Distance => 1,
            Section::Material | Section::Skybox => 4,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Section::Distance => "distance",
            Section::Material => "material",
            Section::Skybox => "skybox",
        })
    }
}

/// Parsed host programs of one compiled scene.
#[derive(Debug, Clone, PartialEq)]
pub struct HostProgram {
    pub distance: Vec<Stmt>,
    pub material: Vec<Stmt>,
    pub skybox: Vec<Stmt>,
}

impl HostProgram {
    /// Parses a host body (`#` already resolved, `@` markers in place) and a
    /// skybox body.
    pub fn parse(host_body: &str, skybox_body: &str) -> Result<Self, HostParseError> {
        let VariantSplit { keep, strip } = split(host_body, MATERIAL_MARKER)
            .map_err(|_| HostParseError::MalformedVariantMarkers(MATERIAL_MARKER))?;
        Ok(Self {
            distance: parse_body(&strip, Section::Distance)?,
            material: parse_body(&keep, Section::Material)?,
            skybox: parse_body(skybox_body, Section::Skybox)?,
        })
    }

    pub fn from_artifact(artifact: &CompiledArtifact) -> Result<Self, HostParseError> {
        let program = Self::parse(&artifact.host_body, &artifact.skybox_body)?;
        log::debug!(
            "host program for {:?}: {}/{}/{} statements",
            artifact.scene_name,
            program.distance.len(),
            program.material.len(),
            program.skybox.len()
        );
        Ok(program)
    }

    pub fn section(&self, section: Section) -> &[Stmt] {
        match section {
            Section::Distance => &self.distance,
            Section::Material => &self.material,
            Section::Skybox => &self.skybox,
        }
    }
}
