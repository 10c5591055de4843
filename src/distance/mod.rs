//! Distance functions between poses
//!
//! Built-in families mirror the steering methods: `linear`, `rs` and
//! `flic`, the last one approximating the length of the flat-output curve.

pub mod flic;
pub mod linear;
pub mod reeds_shepp;

pub use flic::{ApproxFlicDistance, ApproxFlicDistanceFactory};
pub use linear::{LinearDistance, LinearDistanceFactory};
pub use reeds_shepp::{ReedsSheppDistance, ReedsSheppDistanceFactory};
