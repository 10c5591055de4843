//! Common types used throughout planner_server

use nalgebra::{Vector2, Vector3};
use std::f64::consts::PI;

/// Normalize an angle to [-pi, pi]
///
/// Non-finite input gives NaN.
pub fn normalize_angle(angle: f64) -> f64 {
    if (-PI..=PI).contains(&angle) {
        return angle;
    }
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Upper bound on the number of samples in one local path
pub const MAX_PATH_SAMPLES: usize = 100_000;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// 2D pose (position + orientation), the configuration of a car-like robot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    /// Number of degrees of freedom of a pose.
    pub const DOF: usize = 3;

    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Unit vector pointing along the heading
    pub fn heading(&self) -> Vector2<f64> {
        Vector2::new(self.yaw.cos(), self.yaw.sin())
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.yaw)
    }

    /// Same position, heading turned by pi
    pub fn flipped(&self) -> Self {
        Self::new(self.x, self.y, normalize_angle(self.yaw + PI))
    }

    /// Build a pose from a degree-of-freedom slice `[x, y, yaw]`
    pub fn from_slice(dofs: &[f64]) -> Option<Self> {
        match dofs {
            [x, y, yaw] => Some(Self::new(*x, *y, *yaw)),
            _ => None,
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![self.x, self.y, self.yaw]
    }

    /// Normalize yaw to [-pi, pi]
    pub fn normalize_yaw(&mut self) {
        self.yaw = normalize_angle(self.yaw);
    }
}

impl From<Vector3<f64>> for Pose2D {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], yaw: v[2] }
    }
}

/// Driving direction of a local path sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gear {
    Forward,
    Reverse,
}

impl Gear {
    pub fn reversed(self) -> Self {
        match self {
            Gear::Forward => Gear::Reverse,
            Gear::Reverse => Gear::Forward,
        }
    }
}

/// Path produced by a steering method between two poses.
///
/// Samples are ordered from the start pose to the goal pose and are
/// parameterized by arc length.
#[derive(Debug, Clone)]
pub struct LocalPath {
    poses: Vec<Pose2D>,
    gears: Vec<Gear>,
    arc_lengths: Vec<f64>,
}

impl LocalPath {
    /// Build a local path from poses and their driving direction.
    ///
    /// Returns `None` when the input is empty or the vectors disagree in size.
    pub fn new(poses: Vec<Pose2D>, gears: Vec<Gear>) -> Option<Self> {
        if poses.is_empty() || poses.len() != gears.len() {
            return None;
        }
        let mut arc_lengths = Vec::with_capacity(poses.len());
        let mut total = 0.0;
        arc_lengths.push(0.0);
        for w in poses.windows(2) {
            total += w[0].position().distance(&w[1].position());
            arc_lengths.push(total);
        }
        Some(Self { poses, gears, arc_lengths })
    }

    /// Path driven entirely forward
    pub fn forward(poses: Vec<Pose2D>) -> Option<Self> {
        let gears = vec![Gear::Forward; poses.len()];
        Self::new(poses, gears)
    }

    pub fn poses(&self) -> &[Pose2D] {
        &self.poses
    }

    pub fn gears(&self) -> &[Gear] {
        &self.gears
    }

    pub fn start(&self) -> Pose2D {
        self.poses[0]
    }

    pub fn end(&self) -> Pose2D {
        self.poses[self.poses.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Total arc length
    pub fn length(&self) -> f64 {
        self.arc_lengths[self.arc_lengths.len() - 1]
    }

    /// True when every sample is driven forward
    pub fn is_forward_only(&self) -> bool {
        self.gears.iter().all(|g| *g == Gear::Forward)
    }

    /// Same path traversed from the goal back to the start
    pub fn reversed(&self) -> Self {
        let poses: Vec<Pose2D> = self.poses.iter().rev().cloned().collect();
        let gears: Vec<Gear> = self.gears.iter().rev().map(|g| g.reversed()).collect();
        // Non-empty by construction
        Self::new(poses, gears).unwrap_or_else(|| self.clone())
    }

    /// Append `other`, whose first sample is assumed to be this path's end
    pub fn append(&mut self, other: &LocalPath) {
        let mut total = self.length();
        let mut last = self.end().position();
        for (pose, gear) in other.poses.iter().zip(&other.gears).skip(1) {
            total += last.distance(&pose.position());
            last = pose.position();
            self.poses.push(*pose);
            self.gears.push(*gear);
            self.arc_lengths.push(total);
        }
    }

    /// Pose at arc length `s`, clamped to the path bounds
    pub fn config_at_param(&self, s: f64) -> Pose2D {
        // NaN maps to the start
        if !(s > 0.0) || self.poses.len() == 1 {
            return self.start();
        }
        if s >= self.length() {
            return self.end();
        }
        let idx = self.arc_lengths.partition_point(|&l| l <= s);
        let (i0, i1) = (idx - 1, idx);
        let seg = self.arc_lengths[i1] - self.arc_lengths[i0];
        if seg <= f64::EPSILON {
            return self.poses[i0];
        }
        let t = (s - self.arc_lengths[i0]) / seg;
        let p0 = self.poses[i0];
        let p1 = self.poses[i1];
        Pose2D::new(
            p0.x + t * (p1.x - p0.x),
            p0.y + t * (p1.y - p0.y),
            normalize_angle(p0.yaw + t * normalize_angle(p1.yaw - p0.yaw)),
        )
    }
}

/// Circular obstacle (x, y, radius)
#[derive(Debug, Clone, PartialEq)]
pub struct CircleObstacle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl CircleObstacle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    pub fn contains(&self, point: &Point2D) -> bool {
        Point2D::new(self.x, self.y).distance(point) <= self.radius
    }
}
