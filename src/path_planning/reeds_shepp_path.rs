// Reeds-Shepp path generation
//
// Author: Atsushi Sakai(@Atsushi_twi)
//         Videh Patel(@videh25) : Added the missing RS paths
//         Rust implementation

use ordered_float::OrderedFloat;
use std::f64::consts::PI;

use crate::common::{normalize_angle, Gear, Pose2D, MAX_PATH_SAMPLES};

/// One Reeds-Shepp candidate: segment lengths, steering letters and samples
#[derive(Debug, Clone)]
pub struct ReedsSheppPath {
    pub lengths: Vec<f64>,
    pub ctypes: Vec<char>,
    pub l: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub yaw: Vec<f64>,
    pub directions: Vec<Gear>,
}

impl ReedsSheppPath {
    fn new(lengths: Vec<f64>, ctypes: Vec<char>) -> Self {
        let l = lengths.iter().map(|x| x.abs()).sum();
        ReedsSheppPath {
            lengths,
            ctypes,
            l,
            x: Vec::new(),
            y: Vec::new(),
            yaw: Vec::new(),
            directions: Vec::new(),
        }
    }

    /// True when no segment is driven in reverse
    pub fn is_forward_only(&self) -> bool {
        self.lengths.iter().all(|&l| l >= 0.0)
    }

    pub fn poses(&self) -> Vec<Pose2D> {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.yaw)
            .map(|((&x, &y), &yaw)| Pose2D::new(x, y, yaw))
            .collect()
    }
}

type Word = (Vec<f64>, Vec<char>);

fn mod2pi(x: f64) -> f64 {
    let v = x % (2.0 * PI);
    if v < -PI {
        v + 2.0 * PI
    } else if v > PI {
        v - 2.0 * PI
    } else {
        v
    }
}

fn polar(x: f64, y: f64) -> (f64, f64) {
    let r = (x * x + y * y).sqrt();
    let theta = y.atan2(x);
    (r, theta)
}

fn left_straight_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u, t) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if (0.0..=PI).contains(&t) {
        let v = mod2pi(phi - t);
        if (0.0..=PI).contains(&v) {
            return Some((vec![t, u, v], vec!['L', 'S', 'L']));
        }
    }
    None
}

fn left_straight_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let (u1, t1) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    let u1_sq = u1 * u1;
    if u1_sq >= 4.0 {
        let u = (u1_sq - 4.0).sqrt();
        let theta = (2.0_f64).atan2(u);
        let t = mod2pi(t1 + theta);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, v], vec!['L', 'S', 'R']));
        }
    }
    None
}

fn left_x_right_x_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let zeta = x - phi.sin();
    let eeta = y - 1.0 + phi.cos();
    let (u1, theta) = polar(zeta, eeta);
    if u1 <= 4.0 {
        let a = (0.25 * u1).acos();
        let t = mod2pi(a + theta + PI / 2.0);
        let u = mod2pi(PI - 2.0 * a);
        let v = mod2pi(phi - t - u);
        return Some((vec![t, -u, v], vec!['L', 'R', 'L']));
    }
    None
}

fn left_x_right_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let zeta = x - phi.sin();
    let eeta = y - 1.0 + phi.cos();
    let (u1, theta) = polar(zeta, eeta);
    if u1 <= 4.0 {
        let a = (0.25 * u1).acos();
        let t = mod2pi(a + theta + PI / 2.0);
        let u = mod2pi(PI - 2.0 * a);
        let v = mod2pi(-phi + t + u);
        return Some((vec![t, -u, -v], vec!['L', 'R', 'L']));
    }
    None
}

fn left_right_x_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let zeta = x - phi.sin();
    let eeta = y - 1.0 + phi.cos();
    let (u1, theta) = polar(zeta, eeta);
    if u1 <= 4.0 {
        let u = (1.0 - u1 * u1 * 0.125).acos();
        let a = (2.0 * u.sin() / u1).asin();
        let t = mod2pi(-a + theta + PI / 2.0);
        let v = mod2pi(t - u - phi);
        return Some((vec![t, u, -v], vec!['L', 'R', 'L']));
    }
    None
}

fn left_right_x_left_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let zeta = x + phi.sin();
    let eeta = y - 1.0 - phi.cos();
    let (u1, theta) = polar(zeta, eeta);
    if u1 <= 2.0 {
        let a = ((u1 + 2.0) * 0.25).acos();
        let t = mod2pi(theta + a + PI / 2.0);
        let u = mod2pi(a);
        let v = mod2pi(phi - t + 2.0 * u);
        if t >= 0.0 && u >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, -u, -v], vec!['L', 'R', 'L', 'R']));
        }
    }
    None
}

fn left_x_right_left_x_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let zeta = x + phi.sin();
    let eeta = y - 1.0 - phi.cos();
    let (u1, theta) = polar(zeta, eeta);
    let u2 = (20.0 - u1 * u1) / 16.0;
    if (0.0..=1.0).contains(&u2) {
        let u = u2.acos();
        let a = (2.0 * u.sin() / u1).asin();
        let t = mod2pi(theta + a + PI / 2.0);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -u, -u, v], vec!['L', 'R', 'L', 'R']));
        }
    }
    None
}

fn left_x_right90_straight_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let zeta = x - phi.sin();
    let eeta = y - 1.0 + phi.cos();
    let (u1, theta) = polar(zeta, eeta);
    if u1 >= 2.0 {
        let u = (u1 * u1 - 4.0).sqrt() - 2.0;
        let a = (2.0_f64).atan2((u1 * u1 - 4.0).sqrt());
        let t = mod2pi(theta + a + PI / 2.0);
        let v = mod2pi(t - phi + PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -PI / 2.0, -u, -v], vec!['L', 'R', 'S', 'L']));
        }
    }
    None
}

fn left_straight_right90_x_left(x: f64, y: f64, phi: f64) -> Option<Word> {
    let zeta = x - phi.sin();
    let eeta = y - 1.0 + phi.cos();
    let (u1, theta) = polar(zeta, eeta);
    if u1 >= 2.0 {
        let u = (u1 * u1 - 4.0).sqrt() - 2.0;
        let a = ((u1 * u1 - 4.0).sqrt()).atan2(2.0);
        let t = mod2pi(theta - a + PI / 2.0);
        let v = mod2pi(t - phi - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, PI / 2.0, -v], vec!['L', 'S', 'R', 'L']));
        }
    }
    None
}

fn left_x_right90_straight_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let zeta = x + phi.sin();
    let eeta = y - 1.0 - phi.cos();
    let (u1, theta) = polar(zeta, eeta);
    if u1 >= 2.0 {
        let t = mod2pi(theta + PI / 2.0);
        let u = u1 - 2.0;
        let v = mod2pi(phi - t - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -PI / 2.0, -u, -v], vec!['L', 'R', 'S', 'R']));
        }
    }
    None
}

fn left_straight_left90_x_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let zeta = x + phi.sin();
    let eeta = y - 1.0 - phi.cos();
    let (u1, theta) = polar(zeta, eeta);
    if u1 >= 2.0 {
        let t = mod2pi(theta);
        let u = u1 - 2.0;
        let v = mod2pi(phi - t - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, PI / 2.0, -v], vec!['L', 'S', 'L', 'R']));
        }
    }
    None
}

fn left_x_right90_straight_left90_x_right(x: f64, y: f64, phi: f64) -> Option<Word> {
    let zeta = x + phi.sin();
    let eeta = y - 1.0 - phi.cos();
    let (u1, theta) = polar(zeta, eeta);
    if u1 >= 4.0 {
        let u = (u1 * u1 - 4.0).sqrt() - 4.0;
        let a = (2.0_f64).atan2((u1 * u1 - 4.0).sqrt());
        let t = mod2pi(theta + a + PI / 2.0);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -PI / 2.0, -u, -PI / 2.0, v], vec!['L', 'R', 'S', 'L', 'R']));
        }
    }
    None
}

const WORDS: [fn(f64, f64, f64) -> Option<Word>; 12] = [
    left_straight_left,
    left_straight_right,
    left_x_right_x_left,
    left_x_right_left,
    left_right_x_left,
    left_right_x_left_right,
    left_x_right_left_x_right,
    left_x_right90_straight_left,
    left_x_right90_straight_right,
    left_straight_right90_x_left,
    left_straight_left90_x_right,
    left_x_right90_straight_left90_x_right,
];

fn timeflip(travel_distances: Vec<f64>) -> Vec<f64> {
    travel_distances.iter().map(|x| -x).collect()
}

fn reflect(steering_directions: Vec<char>) -> Vec<char> {
    steering_directions
        .iter()
        .map(|&dirn| match dirn {
            'L' => 'R',
            'R' => 'L',
            _ => 'S',
        })
        .collect()
}

// Segments shorter than this are dropped from a word
const NEGLIGIBLE_SEGMENT: f64 = 1e-6;

fn is_valid_word(travel_distances: &[f64], step_size: f64) -> bool {
    let min_dist = 0.1 * travel_distances.iter().map(|d| d.abs()).sum::<f64>();
    travel_distances
        .iter()
        .all(|&d| d.abs() >= min_dist || d.abs() >= step_size)
}

fn set_path(paths: &mut Vec<ReedsSheppPath>, lengths: Vec<f64>, ctypes: Vec<char>, step_size: f64) {
    let (lengths, ctypes): (Vec<f64>, Vec<char>) = lengths
        .into_iter()
        .zip(ctypes)
        .filter(|(d, _)| d.abs() > NEGLIGIBLE_SEGMENT)
        .unzip();
    if !is_valid_word(&lengths, step_size) {
        return;
    }
    let path = ReedsSheppPath::new(lengths, ctypes);

    // Same word with the same length already found
    let duplicate = paths
        .iter()
        .any(|p| p.ctypes == path.ctypes && (p.l - path.l).abs() <= step_size);
    if duplicate || path.l <= step_size {
        return;
    }
    paths.push(path);
}

fn generate_path(q0: &Pose2D, q1: &Pose2D, max_curvature: f64, step_size: f64) -> Vec<ReedsSheppPath> {
    let dx = q1.x - q0.x;
    let dy = q1.y - q0.y;
    let dth = q1.yaw - q0.yaw;
    let c = q0.yaw.cos();
    let s = q0.yaw.sin();
    let x = (c * dx + s * dy) * max_curvature;
    let y = (-s * dx + c * dy) * max_curvature;
    let step_size = step_size * max_curvature;

    let mut paths = Vec::new();
    for word in WORDS {
        if let Some((d, m)) = word(x, y, dth) {
            set_path(&mut paths, d, m, step_size);
        }
        if let Some((d, m)) = word(-x, y, -dth) {
            set_path(&mut paths, timeflip(d), m, step_size);
        }
        if let Some((d, m)) = word(x, -y, -dth) {
            set_path(&mut paths, d, reflect(m), step_size);
        }
        if let Some((d, m)) = word(-x, -y, dth) {
            set_path(&mut paths, timeflip(d), reflect(m), step_size);
        }
    }
    paths
}

fn calc_interpolate_dists_list(lengths: &[f64], step_size: f64) -> Vec<Vec<f64>> {
    lengths
        .iter()
        .map(|&length| {
            let d_dist = if length >= 0.0 { step_size } else { -step_size };
            let n = (length.abs() / step_size).ceil() as usize;
            let mut interp_dists: Vec<f64> = (0..n).map(|i| i as f64 * d_dist).collect();
            interp_dists.push(length);
            interp_dists
        })
        .collect()
}

fn interpolate(dist: f64, length: f64, mode: char, max_curvature: f64, origin: &Pose2D) -> (Pose2D, Gear) {
    let gear = if length > 0.0 { Gear::Forward } else { Gear::Reverse };
    if mode == 'S' {
        let x = origin.x + dist / max_curvature * origin.yaw.cos();
        let y = origin.y + dist / max_curvature * origin.yaw.sin();
        return (Pose2D::new(x, y, origin.yaw), gear);
    }

    let ldx = dist.sin() / max_curvature;
    let (ldy, yaw) = if mode == 'L' {
        ((1.0 - dist.cos()) / max_curvature, origin.yaw + dist)
    } else {
        ((1.0 - dist.cos()) / -max_curvature, origin.yaw - dist)
    };
    let gdx = (-origin.yaw).cos() * ldx + (-origin.yaw).sin() * ldy;
    let gdy = -(-origin.yaw).sin() * ldx + (-origin.yaw).cos() * ldy;
    (Pose2D::new(origin.x + gdx, origin.y + gdy, yaw), gear)
}

fn generate_local_course(
    lengths: &[f64],
    modes: &[char],
    max_curvature: f64,
    step_size: f64,
) -> (Vec<Pose2D>, Vec<Gear>) {
    let interpolate_dists_list = calc_interpolate_dists_list(lengths, step_size * max_curvature);

    let mut origin = Pose2D::origin();
    let mut poses = Vec::new();
    let mut gears = Vec::new();

    for ((interp_dists, &mode), &length) in interpolate_dists_list.iter().zip(modes).zip(lengths) {
        for &dist in interp_dists {
            let (pose, gear) = interpolate(dist, length, mode, max_curvature, &origin);
            poses.push(pose);
            gears.push(gear);
        }
        if let Some(last) = poses.last() {
            origin = *last;
        }
    }
    (poses, gears)
}

fn sample(path: &mut ReedsSheppPath, start: &Pose2D, max_curvature: f64, step_size: f64) {
    let (local, gears) = generate_local_course(&path.lengths, &path.ctypes, max_curvature, step_size);
    let (c, s) = ((-start.yaw).cos(), (-start.yaw).sin());

    // Convert to global coordinate
    path.x = local.iter().map(|p| c * p.x + s * p.y + start.x).collect();
    path.y = local.iter().map(|p| -s * p.x + c * p.y + start.y).collect();
    path.yaw = local.iter().map(|p| normalize_angle(p.yaw + start.yaw)).collect();
    path.directions = gears;
    path.lengths = path.lengths.iter().map(|&length| length / max_curvature).collect();
    path.l /= max_curvature;
}

// Sample count of a candidate whose length is still in curvature units
fn within_sample_limit(path: &ReedsSheppPath, max_curvature: f64, step_size: f64) -> bool {
    let samples = path.l / (step_size * max_curvature) + path.lengths.len() as f64;
    samples <= MAX_PATH_SAMPLES as f64
}

/// All Reeds-Shepp candidates from `start` to `goal`, sampled every
/// `step_size` and expressed in the world frame.
///
/// Candidates needing more than [`MAX_PATH_SAMPLES`] samples are left out.
pub fn calc_paths(start: &Pose2D, goal: &Pose2D, max_curvature: f64, step_size: f64) -> Vec<ReedsSheppPath> {
    let mut paths = generate_path(start, goal, max_curvature, step_size);
    paths.retain(|p| within_sample_limit(p, max_curvature, step_size));
    for path in &mut paths {
        sample(path, start, max_curvature, step_size);
    }
    paths
}

fn shortest_candidate(
    start: &Pose2D,
    goal: &Pose2D,
    max_curvature: f64,
    step_size: f64,
    forward_only: bool,
) -> Option<ReedsSheppPath> {
    generate_path(start, goal, max_curvature, step_size)
        .into_iter()
        .filter(|p| !forward_only || p.is_forward_only())
        .min_by_key(|p| OrderedFloat(p.l))
}

/// Shortest candidate, optionally restricted to forward-only words.
///
/// Only the winner is sampled; `None` when it would need more than
/// [`MAX_PATH_SAMPLES`] samples.
pub fn shortest_path(
    start: &Pose2D,
    goal: &Pose2D,
    max_curvature: f64,
    step_size: f64,
    forward_only: bool,
) -> Option<ReedsSheppPath> {
    let mut path = shortest_candidate(start, goal, max_curvature, step_size, forward_only)?;
    if !within_sample_limit(&path, max_curvature, step_size) {
        return None;
    }
    sample(&mut path, start, max_curvature, step_size);
    Some(path)
}

/// Length of the shortest candidate without sampling it
pub fn shortest_length(
    start: &Pose2D,
    goal: &Pose2D,
    max_curvature: f64,
    step_size: f64,
    forward_only: bool,
) -> Option<f64> {
    shortest_candidate(start, goal, max_curvature, step_size, forward_only).map(|p| p.l / max_curvature)
}
