//! typeinfo: inventory the exported fields and methods of Rust structs.
//!
//! Source tree -> [`parser::Parser`] (per-directory packages, comments) ->
//! [`model::Struct`] -> [`describe::describe`] -> [`render::Renderer`] ->
//! output stream. The [`walker::Walker`] drives the pipeline for a run.

pub mod config;
pub mod describe;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;
pub mod render;
pub mod types;
pub mod walker;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};
