// src/models/mod.rs

//! Domain data structures.

pub mod media;
pub mod thread;

pub use media::MediaDescriptor;
pub use thread::{LocalFlags, Post, ThreadRef, ThreadSnapshot};
