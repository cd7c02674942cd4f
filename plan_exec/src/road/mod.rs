//! # Road module
//!
//! The road is described by a closed loop of waypoints on its centerline. Each waypoint carries
//! its arc length `s` from the first waypoint, so that any world position can be described in
//! road-relative (Frenet) coordinates: `s` along the centerline and `d` across it.
//!
//! The waypoint table is loaded once at start up and never changes, so a [`Road`] can be freely
//! shared.
//!
//! Both conversions are approximations which treat the road as straight between waypoints. They
//! are exact on straight sections and drift slightly on curves, which is good enough since `s`
//! is only used to order and space vehicles.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod frames;
mod lane;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, StringRecord};
use log::debug;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use util::maths::{get_ang_dist, rem_euclid};

pub use frames::*;
pub use lane::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum divergence between the vehicle heading and the direction to the closest waypoint
/// before the waypoint is considered to be behind the vehicle.
const MAX_WAYPOINT_DIVERGENCE_RAD: f64 = std::f64::consts::FRAC_PI_4;

/// Default `d` sign reference point, inside the loop of the simulator's highway map.
pub const DEFAULT_D_SIGN_REF: (f64, f64) = (1000.0, 2000.0);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point on the road centerline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// World position of the waypoint
    pub x_m: f64,
    pub y_m: f64,

    /// Arc length along the centerline from the first waypoint
    pub s_m: f64,

    /// Unit normal to the centerline, pointing towards increasing `d`
    pub normal_x: f64,
    pub normal_y: f64,
}

/// The road model, an immutable loop of centerline waypoints.
#[derive(Debug, Clone)]
pub struct Road {
    waypoints: Vec<Waypoint>,

    /// Length of the whole loop, including the closing segment from the last waypoint back to
    /// the first.
    track_length_m: f64,

    /// Fixed point off the road used to decide the sign of `d`.
    d_sign_ref: Point2<f64>,
}

/// A position projected onto one centerline segment, relative to the segment start.
#[derive(Debug, Clone, Copy)]
struct SegmentProjection {
    rel: Vector2<f64>,
    foot: Vector2<f64>,

    /// Signed distance of the foot along the segment, negative before the start
    along_m: f64,
    length_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while loading the road.
#[derive(Debug, thiserror::Error)]
pub enum RoadError {
    #[error("Could not open the road map file: {0}")]
    FileError(std::io::Error),

    #[error("Could not read record {record} of the road map: {source}")]
    ParseError {
        record: u64,
        source: csv::Error
    },

    #[error("The road map must contain at least two waypoints, found {0}")]
    TooFewWaypoints(usize),

    #[error("Waypoint {0} does not have a greater s than the waypoint before it")]
    NotAscending(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    /// World position of the waypoint.
    pub fn position(&self) -> WorldPoint {
        WorldPoint::new(self.x_m, self.y_m)
    }
}

impl Road {
    /// Build a road from a list of waypoints.
    ///
    /// The waypoints must be in ascending `s` order. `d_sign_ref` is a point off the road, see
    /// [`Road::to_frenet`].
    pub fn new(waypoints: Vec<Waypoint>, d_sign_ref: WorldPoint) -> Result<Self, RoadError> {
        if waypoints.len() < 2 {
            return Err(RoadError::TooFewWaypoints(waypoints.len()));
        }

        if let Some(i) = waypoints.windows(2).position(|w| w[1].s_m <= w[0].s_m) {
            return Err(RoadError::NotAscending(i + 1));
        }

        let first = waypoints[0];
        let last = waypoints[waypoints.len() - 1];
        let track_length_m = last.s_m + last.position().distance(&first.position());

        Ok(Self {
            waypoints,
            track_length_m,
            d_sign_ref: d_sign_ref.0,
        })
    }

    /// Load the road from a map file.
    ///
    /// The file contains one waypoint per line, as whitespace separated `x y s normal_x normal_y`.
    pub fn load<P: AsRef<Path>>(path: P, d_sign_ref: WorldPoint) -> Result<Self, RoadError> {
        let file = File::open(path).map_err(RoadError::FileError)?;
        Self::from_reader(file, d_sign_ref)
    }

    /// Load the road from any reader providing the map file format, see [`Road::load`].
    pub fn from_reader<R: Read>(reader: R, d_sign_ref: WorldPoint) -> Result<Self, RoadError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b' ')
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut waypoints = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let record_num = i as u64 + 1;
            let raw = result
                .map_err(|source| RoadError::ParseError { record: record_num, source })?;

            // Repeated separators produce empty fields, drop them
            let record: StringRecord = raw.iter().filter(|f| !f.is_empty()).collect();
            if record.is_empty() {
                continue;
            }

            let waypoint: Waypoint = record
                .deserialize(None)
                .map_err(|source| RoadError::ParseError { record: record_num, source })?;
            waypoints.push(waypoint);
        }

        let road = Self::new(waypoints, d_sign_ref)?;

        debug!(
            "Loaded road with {} waypoints, track length {:.3} m",
            road.waypoints.len(),
            road.track_length_m
        );

        Ok(road)
    }

    /// The waypoints making up the road.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Length of the loop.
    pub fn track_length_m(&self) -> f64 {
        self.track_length_m
    }

    /// Convert a world position into road-relative coordinates.
    ///
    /// The position is projected onto the centerline segment leading up to the next waypoint
    /// ahead of the vehicle (as given by `yaw_rad`). The sign of `d` is found by comparing how
    /// far the raw and projected positions are from the road's `d` sign reference point: if the
    /// raw position is no further away `d` is negative.
    ///
    /// The sign test assumes the reference point is on the inside of the loop. Positions close
    /// to the reference point, or on a road which doesn't loop around it, can get the wrong
    /// sign.
    pub fn to_frenet(&self, point: &WorldPoint, yaw_rad: f64) -> FrenetPoint {
        let next = self.next_waypoint(point, yaw_rad);
        let mut prev = self.prev_index(next);
        let mut proj = self.project(prev, point);

        // A position just before the segment start belongs to the previous segment. On the
        // outside of a bend it can be past the end of that one too, in which case it sits level
        // with the waypoint between them.
        let mut along_m = proj.along_m;
        if along_m < 0.0 {
            let before = self.project(self.prev_index(prev), point);
            if before.along_m <= before.length_m {
                prev = self.prev_index(prev);
                along_m = before.along_m;
                proj = before;
            }
            else {
                along_m = 0.0;
            }
        }

        let mut d_m = (proj.rel - proj.foot).norm();

        let center = self.d_sign_ref - self.waypoints[prev].position().0;
        if (center - proj.rel).norm() <= (center - proj.foot).norm() {
            d_m *= -1.0;
        }

        let s_m = rem_euclid(self.waypoints[prev].s_m + along_m, self.track_length_m);

        FrenetPoint { s_m, d_m }
    }

    /// Convert a road-relative position into the world frame.
    ///
    /// `s` may be outside of the loop's range, in which case it is wrapped onto the loop.
    pub fn to_cartesian(&self, frenet: &FrenetPoint) -> WorldPoint {
        let s_m = rem_euclid(frenet.s_m, self.track_length_m);

        // Last waypoint at or before s, wrapping to the last waypoint if s is before the first
        let num_before = self.waypoints.partition_point(|wp| wp.s_m <= s_m);
        let prev = match num_before {
            0 => self.waypoints.len() - 1,
            n => n - 1
        };
        let next = (prev + 1) % self.waypoints.len();

        let prev_wp = &self.waypoints[prev];
        let heading_rad = prev_wp.position().heading_to(&self.waypoints[next].position());

        let mut seg_s_m = s_m - prev_wp.s_m;
        if seg_s_m < 0.0 {
            seg_s_m += self.track_length_m;
        }

        // d is measured to the right of the direction of travel
        let perp_heading_rad = heading_rad - std::f64::consts::FRAC_PI_2;

        prev_wp
            .position()
            .offset(heading_rad, seg_s_m)
            .offset(perp_heading_rad, frenet.d_m)
    }

    /// Index of the waypoint closest to the point.
    fn closest_waypoint(&self, point: &WorldPoint) -> usize {
        self.waypoints
            .iter()
            .map(|wp| wp.position().distance(point))
            .enumerate()
            .fold((0, std::f64::INFINITY), |best, (i, dist)| {
                if dist < best.1 { (i, dist) } else { best }
            })
            .0
    }

    /// Index of the closest waypoint which is ahead of a vehicle at `point` facing `yaw_rad`.
    fn next_waypoint(&self, point: &WorldPoint, yaw_rad: f64) -> usize {
        let closest = self.closest_waypoint(point);

        let heading_rad = point.heading_to(&self.waypoints[closest].position());

        if get_ang_dist(yaw_rad, heading_rad).abs() > MAX_WAYPOINT_DIVERGENCE_RAD {
            (closest + 1) % self.waypoints.len()
        }
        else {
            closest
        }
    }

    /// Project the point onto the segment starting at waypoint `start`.
    fn project(&self, start: usize, point: &WorldPoint) -> SegmentProjection {
        let start_pos = self.waypoints[start].position().0;
        let n = self.waypoints[(start + 1) % self.waypoints.len()].position().0 - start_pos;
        let rel = point.0 - start_pos;

        let length_m = n.norm();
        if length_m <= std::f64::EPSILON {
            return SegmentProjection {
                rel,
                foot: Vector2::zeros(),
                along_m: 0.0,
                length_m
            };
        }

        let along_m = rel.dot(&n) / length_m;

        SegmentProjection {
            rel,
            foot: n * (along_m / length_m),
            along_m,
            length_m
        }
    }

    fn prev_index(&self, index: usize) -> usize {
        match index {
            0 => self.waypoints.len() - 1,
            i => i - 1
        }
    }
}

// ---------------------------------------------------------------------------
// TEST HELPERS
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_roads {
    use super::*;

    /// A circular loop, driven anticlockwise around the default `d` sign reference point.
    pub fn circle(radius_m: f64, num_waypoints: usize) -> Road {
        let (cx, cy) = DEFAULT_D_SIGN_REF;
        let dtheta = std::f64::consts::TAU / num_waypoints as f64;
        let chord_m = 2.0 * radius_m * (0.5 * dtheta).sin();

        let waypoints = (0..num_waypoints)
            .map(|i| {
                let theta = i as f64 * dtheta;
                Waypoint {
                    x_m: cx + radius_m * theta.cos(),
                    y_m: cy + radius_m * theta.sin(),
                    s_m: i as f64 * chord_m,
                    normal_x: theta.cos(),
                    normal_y: theta.sin(),
                }
            })
            .collect();

        Road::new(waypoints, WorldPoint::new(cx, cy)).unwrap()
    }

    /// A long straight road along the world x axis, well below the `d` sign reference point.
    ///
    /// The closing segment runs back along the same line, which is fine as long as tests stay
    /// away from the far end.
    pub fn straight(length_m: f64, spacing_m: f64) -> Road {
        let num = (length_m / spacing_m) as usize + 1;
        let waypoints = (0..num)
            .map(|i| Waypoint {
                x_m: i as f64 * spacing_m,
                y_m: 0.0,
                s_m: i as f64 * spacing_m,
                normal_x: 0.0,
                normal_y: -1.0,
            })
            .collect();

        let (rx, ry) = DEFAULT_D_SIGN_REF;
        Road::new(waypoints, WorldPoint::new(rx, ry)).unwrap()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::test_roads::*;

    const MAP: &str = "\
784.6001 1135.571 0 -0.02359831 -0.9997216
815.2679 1134.93 30.6744785308838 -0.01099479 -0.9999396
844.6398  1134.911 60.0463714599609 -0.002048373 -0.9999979

875.0436 1134.808 90.4504146575928 -0.001847863 -0.9999983
";

    #[test]
    fn test_load_from_reader() {
        let road = Road::from_reader(MAP.as_bytes(), WorldPoint::new(1000.0, 2000.0)).unwrap();

        assert_eq!(road.waypoints().len(), 4);
        assert_eq!(road.waypoints()[2].x_m, 844.6398);
        assert_eq!(road.waypoints()[3].normal_y, -0.9999983);

        // Closing segment runs back from the last waypoint to the first
        let closing = road.waypoints()[3].position().distance(&road.waypoints()[0].position());
        assert!((road.track_length_m() - 90.4504146575928 - closing).abs() < 1e-9);
    }

    #[test]
    fn test_load_errors() {
        let reference = WorldPoint::new(1000.0, 2000.0);

        assert!(matches!(
            Road::from_reader("".as_bytes(), reference),
            Err(RoadError::TooFewWaypoints(0))
        ));
        assert!(matches!(
            Road::from_reader("1 2 0 0 1\n1 2 abc 0 1\n".as_bytes(), reference),
            Err(RoadError::ParseError { record: 2, .. })
        ));
        assert!(matches!(
            Road::from_reader("0 0 0 0 1\n1 0 1 0 1\n2 0 1 0 1\n".as_bytes(), reference),
            Err(RoadError::NotAscending(2))
        ));
        assert!(matches!(
            Road::load("/definitely/not/a/map.csv", reference),
            Err(RoadError::FileError(_))
        ));
    }

    #[test]
    fn test_round_trip_straight() {
        let road = straight(1000.0, 30.0);

        for &(x, y) in &[(100.0, -6.0), (215.5, -2.0), (452.3, -10.0), (700.0, -1.3)] {
            let frenet = road.to_frenet(&WorldPoint::new(x, y), 0.0);
            assert!((frenet.s_m - x).abs() < 1e-9, "s = {}", frenet.s_m);
            assert!((frenet.d_m + y).abs() < 1e-9, "d = {}", frenet.d_m);

            let back = road.to_cartesian(&frenet);
            assert!((back.x() - x).abs() < 1e-9);
            assert!((back.y() - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_round_trip_curved() {
        let radius_m = 300.0;
        let road = circle(radius_m, 360);
        let (cx, cy) = DEFAULT_D_SIGN_REF;

        // Points in the middle lane, just off the waypoints
        for i in 0..36 {
            let theta = (i as f64 * 10.0 + 0.37).to_radians();
            let r = radius_m + 6.0;
            let point = WorldPoint::new(cx + r * theta.cos(), cy + r * theta.sin());
            let yaw = theta + std::f64::consts::FRAC_PI_2;

            let frenet = road.to_frenet(&point, yaw);
            assert!((frenet.d_m - 6.0).abs() < 0.1, "d = {}", frenet.d_m);

            let back = road.to_cartesian(&frenet);
            assert!(back.distance(&point) < 0.1, "error = {}", back.distance(&point));
        }
    }

    #[test]
    fn test_s_monotonic_along_travel() {
        let radius_m = 300.0;
        let road = circle(radius_m, 180);
        let (cx, cy) = DEFAULT_D_SIGN_REF;

        let mut prev_s = None;
        for i in 0..200 {
            let theta = i as f64 * 0.0123;
            let r = radius_m;
            let point = WorldPoint::new(cx + r * theta.cos(), cy + r * theta.sin());
            let frenet = road.to_frenet(&point, theta + std::f64::consts::FRAC_PI_2);

            if let Some(p) = prev_s {
                assert!(frenet.s_m >= p, "s went backwards: {} -> {}", p, frenet.s_m);
            }
            prev_s = Some(frenet.s_m);
        }
    }

    #[test]
    fn test_off_center_lanes_cross_waypoints_straight() {
        let road = straight(990.0, 30.0);

        for &d in &[6.0, 10.0] {
            let mut prev_s = None;
            for i in 0..=160 {
                // Crosses the waypoints at 450 and 480
                let x = 440.0 + i as f64 * 0.25;
                let point = WorldPoint::new(x, -d);

                let frenet = road.to_frenet(&point, 0.0);
                assert!((frenet.s_m - x).abs() < 1e-6, "x = {}, s = {}", x, frenet.s_m);
                assert!((frenet.d_m - d).abs() < 1e-6, "x = {}, d = {}", x, frenet.d_m);

                let back = road.to_cartesian(&frenet);
                assert!(back.distance(&point) < 1e-6, "x = {}, error = {}", x, back.distance(&point));

                if let Some(p) = prev_s {
                    assert!(frenet.s_m >= p, "s went backwards at x = {}: {} -> {}", x, p, frenet.s_m);
                }
                prev_s = Some(frenet.s_m);
            }
        }
    }

    #[test]
    fn test_off_center_lanes_cross_waypoints_curved() {
        let radius_m = 300.0;
        let road = circle(radius_m, 360);
        let (cx, cy) = DEFAULT_D_SIGN_REF;

        for &d in &[6.0, 10.0] {
            let r = radius_m + d;
            let mut prev_s = None;
            for i in 0..600 {
                // Steps of about 0.1 m, crossing ten waypoints
                let theta = 0.05 + i as f64 * 0.0003;
                let point = WorldPoint::new(cx + r * theta.cos(), cy + r * theta.sin());

                let frenet = road.to_frenet(&point, theta + std::f64::consts::FRAC_PI_2);
                assert!((frenet.d_m - d).abs() < 0.1, "theta = {}, d = {}", theta, frenet.d_m);

                let back = road.to_cartesian(&frenet);
                assert!(
                    back.distance(&point) < 0.2,
                    "theta = {}, error = {}",
                    theta,
                    back.distance(&point)
                );

                if let Some(p) = prev_s {
                    assert!(
                        frenet.s_m >= p - 1e-9,
                        "s went backwards at theta = {}: {} -> {}",
                        theta,
                        p,
                        frenet.s_m
                    );
                }
                prev_s = Some(frenet.s_m);
            }
        }
    }

    #[test]
    fn test_d_sign_inside_loop() {
        let road = circle(300.0, 360);
        let (cx, cy) = DEFAULT_D_SIGN_REF;

        // Inside the centerline (towards the reference point) d is negative
        let frenet = road.to_frenet(&WorldPoint::new(cx + 297.0, cy + 10.0), 1.6);
        assert!(frenet.d_m < 0.0);
    }

    #[test]
    fn test_to_cartesian_wraps() {
        let road = straight(300.0, 30.0);
        let len = road.track_length_m();

        let a = road.to_cartesian(&FrenetPoint::new(45.0, 2.0));
        let b = road.to_cartesian(&FrenetPoint::new(45.0 + len, 2.0));
        let c = road.to_cartesian(&FrenetPoint::new(45.0 - len, 2.0));

        assert!(a.distance(&b) < 1e-9);
        assert!(a.distance(&c) < 1e-9);
        assert!((a.x() - 45.0).abs() < 1e-9);
        assert!((a.y() + 2.0).abs() < 1e-9);
    }
}
