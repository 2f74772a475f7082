// src/lib.rs

//! archive-chan library

pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod services;
pub mod shutdown;
pub mod storage;
pub mod verify;
