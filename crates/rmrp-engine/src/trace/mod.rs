//! CPU reference of the sphere tracer baked into generated kernels.
//!
//! The kernel cannot be run on the host, but its integration policy can.
//! Everything here mirrors the dispatch template line for line in intent:
//! ray construction, the march loop with its two terminal states, and the
//! tetrahedral normal estimate. Scene functions are supplied through
//! [`SceneFunctions`]: as Rust closures, or as the scene's own code via
//! [`HostScene`](crate::host::HostScene).
//!
//! Rays are independent: no call here shares mutable state between rays,
//! which is what lets [`render_preview`] trace pixels in parallel.

mod camera;
mod march;
mod preview;

pub use camera::{Camera, Ray};
pub use march::{estimate_normal, march, ClosureScene, SceneFunctions, TraceOutcome};
pub use preview::{render_preview, to_rgba8};
