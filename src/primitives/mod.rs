//! Core compute primitives.
//!
//! Feature matrices and probability estimates are stored as dense,
//! row-major `Matrix<f32>` values.

mod matrix;

pub use matrix::Matrix;
