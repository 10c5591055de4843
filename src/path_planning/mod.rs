// Path geometry used by the steering methods and distance functions

pub mod bezier_path;
pub mod reeds_shepp_path;

pub use reeds_shepp_path::ReedsSheppPath;
