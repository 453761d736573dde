//! Path and velocity planning module

pub mod bezier;
pub mod planner;
pub mod timing;

pub use bezier::BezierPath;
pub use planner::PathPlanner;
pub use timing::{warp_progress, DEFAULT_TARGET_WIDTH};
