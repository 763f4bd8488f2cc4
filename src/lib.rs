//! Valentine relay library
//!
//! Exposes modules for integration testing and binary reuse.

pub mod domain;
pub mod game;
pub mod infra;
pub mod io;
pub mod services;
