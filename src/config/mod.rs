//! Configuration module
//!
//! Handles executor settings, presets and JSON loading.

pub mod settings;

pub use settings::{ConfigError, MotionConfig, Settings};
