//! Backend runtime entry point and public API surface.
//!
//! This crate owns the bridge controller state machine, the sandbox surface
//! abstraction and the per-player session tasks that connect the two.

pub mod config;
pub mod controller;
mod runtime;
pub mod sandbox;
pub mod session;

pub use crate::runtime::run;
