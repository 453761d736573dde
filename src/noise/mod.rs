//! Noise generation module
//!
//! Colored noise, physiological tremor and the combined motor noise pipeline,
//! plus gradient noise for smooth path deviation.

pub mod colored;
pub mod motor;
pub mod perlin;
pub mod tremor;

#[cfg(test)]
pub(crate) mod spectral;

pub use colored::ColoredNoise;
pub use motor::{lowpass_alpha, MotorNoise, MovementContext, MovementPhase, NoiseModel};
pub use perlin::PerlinNoise;
pub use tremor::TremorOscillator;
