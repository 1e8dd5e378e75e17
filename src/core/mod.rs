//! Core cross-cutting pieces: configuration and coded errors.

pub mod config;
pub mod errors;
