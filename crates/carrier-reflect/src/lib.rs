//! Construct values from a type identifier without runtime reflection.
//!
//! This crate provides:
//! - `TypeRegistry` - explicit map from type identifier to constructor
//! - `InstantiationError` - strict construction failure with the type and cause

mod error;
mod registry;

pub use error::*;
pub use registry::*;
