//! Linear-algebra kernel for GPU-facing code: vectors, a row-stored 4×4
//! matrix and quaternions, all plain `f32` values ready for upload.
//!
//! # Invariants
//! - Values are immutable under arithmetic; only `set` mutates.
//! - `Mat4 * v` treats `v` as a column vector; translation sits in column 3.
//! - Projections follow the right-handed OpenGL clip convention.
//! - Normalizing or inverting degenerate input is unchecked and yields
//!   NaN or infinite components.

pub mod mat;
pub mod quat;
pub mod vec;

pub use mat::Mat4;
pub use quat::Quat;
pub use vec::{Vec2, Vec3, Vec4};
