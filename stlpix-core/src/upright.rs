//! Auto-upright: find the rotation that rests the mesh on its broadest base.
//!
//! Large faces are the likeliest resting faces, so their normals (and the
//! negations, since STL winding is not trustworthy) are tried as the "down"
//! side. Each candidate is scored by the area lying flat on the lowest
//! plane after rotation, and the best score wins. Candidates are scored in
//! parallel; equal scores resolve to the earliest candidate so the result
//! matches a sequential scan.

use nalgebra::{Matrix3, Point3, Vector3};
use rayon::prelude::*;
use std::collections::HashSet;

use crate::geometry::{Bounds, Triangle};
use crate::transform::Transform;

/// Only the largest triangles contribute candidate directions.
pub const MAX_CANDIDATE_FACES: usize = 250;
/// Directions are bucketed at 1/20 per axis before deduplication.
const QUANTIZATION: f64 = 20.0;
/// Triangles at or below this area are ignored.
const MIN_AREA: f64 = 1e-10;
/// Height tolerance for "on the ground", as a fraction of the radius.
const CONTACT_TOLERANCE: f64 = 0.01;

/// Chosen orientation and its support score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Upright {
    pub rotation: Matrix3<f64>,
    /// Total area of triangles resting on the ground plane.
    pub support_area: f64,
}

impl Upright {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            support_area: 0.0,
        }
    }
}

/// Pick the rotation that maximizes ground contact area.
///
/// With no usable faces the identity is returned.
pub fn solve(triangles: &[Triangle], bounds: &Bounds) -> Upright {
    let center = bounds.center();
    let tolerance = CONTACT_TOLERANCE * bounds.radius();
    let directions = candidate_directions(triangles);
    log::debug!("upright search over {} directions", directions.len());

    let best = directions
        .par_iter()
        .enumerate()
        .map(|(i, d)| {
            let rotation = Transform::rotation_between(d, &Vector3::z());
            let support_area = support_area(triangles, &center, tolerance, &rotation);
            (i, Upright { rotation, support_area })
        })
        .reduce(
            || (usize::MAX, Upright::identity()),
            |a, b| {
                let b_wins = b.1.support_area > a.1.support_area
                    || (b.1.support_area == a.1.support_area && b.0 < a.0);
                if b_wins {
                    b
                } else {
                    a
                }
            },
        );

    best.1
}

/// Directions to test, in evaluation order: each unique quantized normal of
/// the largest faces, followed by its negation.
pub fn candidate_directions(triangles: &[Triangle]) -> Vec<Vector3<f64>> {
    let mut scored: Vec<(f64, Vector3<f64>)> = triangles
        .iter()
        .map(|t| (t.area(), t))
        .filter(|(area, _)| *area > MIN_AREA)
        .map(|(area, t)| (area, t.normal()))
        .collect();
    // Stable, so equal areas keep source order.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut seen = HashSet::new();
    let mut directions = Vec::new();
    for (_, n) in scored.into_iter().take(MAX_CANDIDATE_FACES) {
        let key = [
            (n.x * QUANTIZATION).round_ties_even() as i64,
            (n.y * QUANTIZATION).round_ties_even() as i64,
            (n.z * QUANTIZATION).round_ties_even() as i64,
        ];
        if seen.insert(key) {
            directions.push(n);
            directions.push(-n);
        }
    }
    directions
}

/// Area of the triangles that lie on the lowest plane once `rotation` is
/// applied about `center`.
///
/// A triangle counts when its highest vertex is within `tolerance` of the
/// lowest vertex of the whole mesh.
pub fn support_area(
    triangles: &[Triangle],
    center: &Point3<f64>,
    tolerance: f64,
    rotation: &Matrix3<f64>,
) -> f64 {
    let height = |p: &Point3<f64>| (rotation * (p - center)).z;

    let floor = triangles
        .iter()
        .flat_map(|t| t.vertices.iter())
        .map(height)
        .fold(f64::INFINITY, f64::min);

    triangles
        .iter()
        .filter_map(|t| {
            let area = t.area();
            if area <= MIN_AREA {
                return None;
            }
            let top = t.vertices.iter().map(height).fold(f64::NEG_INFINITY, f64::max);
            (top <= floor + tolerance).then_some(area)
        })
        .sum()
}
