//! Steering methods
//!
//! A steering method builds a [`LocalPath`](crate::common::LocalPath)
//! between two poses. Three families are provided, each with its factory:
//!
//! - `linear`: straight-line interpolation, ignores the car constraints
//! - `rs`: Reeds-Shepp curves with a fixed turning radius
//! - `flic`: cubic Bezier curves tangent to both headings

pub mod flic;
pub mod linear;
pub mod reeds_shepp;

pub use flic::{FlicSteeringMethod, FlicSteeringMethodFactory};
pub use linear::{LinearSteeringMethod, LinearSteeringMethodFactory};
pub use reeds_shepp::{ReedsSheppSteeringMethod, ReedsSheppSteeringMethodFactory};

/// Default spacing between two samples of a local path [m]
pub const DEFAULT_STEP_SIZE: f64 = 0.1;
