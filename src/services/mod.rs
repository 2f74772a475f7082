// src/services/mod.rs

//! Upstream API services beyond single-thread state.

pub mod boards;

pub use boards::{BoardClient, BoardScope};
