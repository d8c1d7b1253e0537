//! lambgo-lib: manifest resolution and parallel builds for lambgo
//!
//! This crate holds everything behind the `lambgo` binary:
//! - `flags`: shell-style splitting and variable expansion of build flags
//! - `manifest`: locating, parsing, and normalizing `.lambgo.yml`
//! - `select`: narrowing a resolved manifest and sizing the worker pool
//! - `execute`: compiling and zipping units across a bounded worker pool
//! - `init`: scaffolding a manifest for an existing module

pub mod consts;
pub mod execute;
pub mod flags;
pub mod init;
pub mod manifest;
pub mod select;
