//! Runtime side of the ray-marching scene compiler.
//!
//! `rmrp-compiler` turns text into kernels; this crate owns what lives
//! between compiles: the per-scene artifact and parameter store, logger
//! setup, a CPU reference of the sphere tracer the kernel runs, and the
//! host target that evaluates scene code for that tracer.

pub mod host;
pub mod logging;
pub mod scene;
pub mod trace;

pub use host::{HostError, HostScene};
pub use scene::Scene;
