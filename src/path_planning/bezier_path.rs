// Cubic Bezier curves through two oriented poses.
//
// Author: Atsushi Sakai(@Atsushi_twi)
//         Rust implementation

use itertools::Itertools;

use crate::common::{Point2D, Pose2D};

/// Ratio between the start-goal distance and the control point offset
pub const DEFAULT_OFFSET: f64 = 3.0;

// Binomial coefficient calculation (replacement for scipy.special.comb)
fn binomial_coefficient(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    if k == 0 || k == n {
        return 1.0;
    }

    let k = if k > n - k { n - k } else { k }; // Take advantage of symmetry

    let mut result = 1.0;
    for i in 0..k {
        result *= (n - i) as f64;
        result /= (i + 1) as f64;
    }
    result
}

// Bernstein polynomial
fn bernstein_poly(n: usize, i: usize, t: f64) -> f64 {
    binomial_coefficient(n, i) * t.powi(i as i32) * (1.0 - t).powi((n - i) as i32)
}

/// Return one point on the bezier curve
pub fn bezier(t: f64, control_points: &[Point2D]) -> Point2D {
    let n = control_points.len() - 1;
    control_points
        .iter()
        .enumerate()
        .fold(Point2D::origin(), |acc, (i, p)| {
            let basis = bernstein_poly(n, i, t);
            Point2D::new(acc.x + basis * p.x, acc.y + basis * p.y)
        })
}

/// Control points of the first derivative of a bezier curve
pub fn derivative_control_points(control_points: &[Point2D]) -> Vec<Point2D> {
    let n = control_points.len() - 1;
    control_points
        .iter()
        .tuple_windows()
        .map(|(a, b)| Point2D::new(n as f64 * (b.x - a.x), n as f64 * (b.y - a.y)))
        .collect()
}

/// Control points of the cubic curve leaving `start` along its heading and
/// reaching `end` along its heading
pub fn four_control_points(start: &Pose2D, end: &Pose2D, offset: f64) -> [Point2D; 4] {
    let dist = start.position().distance(&end.position()) / offset;
    let ts = start.heading();
    let te = end.heading();
    [
        start.position(),
        Point2D::new(start.x + dist * ts[0], start.y + dist * ts[1]),
        Point2D::new(end.x - dist * te[0], end.y - dist * te[1]),
        end.position(),
    ]
}

/// Sample the curve into `n_points` poses; the yaw follows the tangent
pub fn calc_bezier_poses(control_points: &[Point2D], start_yaw: f64, n_points: usize) -> Vec<Pose2D> {
    let n_points = n_points.max(2);
    let derivative = derivative_control_points(control_points);
    let mut last_yaw = start_yaw;
    (0..n_points)
        .map(|i| {
            let t = i as f64 / (n_points - 1) as f64;
            let p = bezier(t, control_points);
            let d = bezier(t, &derivative);
            // Keep the previous heading where the tangent vanishes
            if d.x.hypot(d.y) > 1e-9 {
                last_yaw = d.y.atan2(d.x);
            }
            Pose2D::new(p.x, p.y, last_yaw)
        })
        .collect()
}

/// Arc length approximation: mean of the chord and the control polygon
pub fn approx_length(control_points: &[Point2D]) -> f64 {
    let (Some(first), Some(last)) = (control_points.first(), control_points.last()) else {
        return 0.0;
    };
    let chord = first.distance(last);
    let polygon: f64 = control_points
        .iter()
        .tuple_windows()
        .map(|(a, b)| a.distance(b))
        .sum();
    0.5 * (chord + polygon)
}

/// Curvature at parameter t
pub fn calc_curvature(control_points: &[Point2D], t: f64) -> f64 {
    let first = derivative_control_points(control_points);
    if first.len() < 2 {
        return 0.0;
    }
    let second = derivative_control_points(&first);
    let d = bezier(t, &first);
    let dd = bezier(t, &second);

    let denominator = (d.x * d.x + d.y * d.y).powf(1.5);
    if denominator < 1e-12 {
        return 0.0;
    }
    (d.x * dd.y - d.y * dd.x) / denominator
}
