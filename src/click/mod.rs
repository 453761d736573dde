//! Click placement module

pub mod sampler;

pub use sampler::{adaptive_std_dev, ClickPointSampler, EDGE_PADDING};
