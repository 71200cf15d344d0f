//! parsers-lib: Core types and logic for building grammar parsers
//!
//! This crate provides the pieces behind the `parsers` CLI:
//! - `Platform`: normalized OS/architecture labels and library extensions
//! - `Catalog`: the language -> source repository table
//! - `matrix`: expansion of language/platform selectors into build jobs
//! - `build`: clone, generate, compile and lay out one grammar repository
//! - `sign` / `upload`: the macOS signing and artifact publishing steps

pub mod build;
pub mod catalog;
pub mod consts;
pub mod fetch;
pub mod matrix;
pub mod platform;
pub mod sign;
pub mod tool;
pub mod upload;
pub mod util;
