//! # Trajectory module
//!
//! Builds the smooth curve which the new part of the path is sampled from.
//!
//! The curve is anchored on the end of the current path tail (so the new path continues it
//! without a kink) and on a few points ahead along the centre of the target lane. All anchors
//! are moved into a vehicle-local frame placed at the end of the tail, with its x axis along the
//! direction of travel, before the spline is fitted. In that frame the anchors are ordered in x
//! even when the road runs back along the world axes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod spline;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use crate::{
    loc::{PathTail, Pose},
    planner::Params,
    road::{FrenetPoint, Lane, LocalFrame, LocalPoint, Road, WorldPoint},
};

pub use spline::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Minimum number of tail points needed to continue the tail rather than start from the pose.
const MIN_WARM_START_POINTS: usize = 3;

/// Distance behind the reference point of the synthetic anchor used on a cold start.
const COLD_START_BACK_M: f64 = 1.0;

/// Two tail points closer than this can't give a heading.
const MIN_HEADING_SEPARATION_M: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A fitted trajectory, expressed in its own vehicle-local frame.
#[derive(Debug, Clone)]
pub struct Trajectory {
    frame: LocalFrame,
    spline: CubicSpline,
    anchors: Vec<LocalPoint>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrajError {
    #[error("Could not fit the trajectory spline: {0}")]
    SplineError(#[from] SplineError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    /// The frame in which the trajectory is defined. Its origin is the reference point, the last
    /// point of the tail or the vehicle's position.
    pub fn frame(&self) -> &LocalFrame {
        &self.frame
    }

    /// The anchor points the spline passes through, in the trajectory frame.
    pub fn anchors(&self) -> &[LocalPoint] {
        &self.anchors
    }

    /// Point on the trajectory at local `x`.
    pub fn local_point_at(&self, x_m: f64) -> LocalPoint {
        LocalPoint::new(x_m, self.spline.eval(x_m))
    }

    /// World position of the point on the trajectory at local `x`.
    pub fn world_point_at(&self, x_m: f64) -> WorldPoint {
        self.frame.to_world(&self.local_point_at(x_m))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Fit a trajectory which continues the path tail into the centre of `lane`.
///
/// The lookahead anchors are spaced `safety_zone_m` apart, starting one safety zone past the end
/// of the tail.
pub fn synthesise(
    road: &Road,
    pose: &Pose,
    tail: &PathTail,
    lane: Lane,
    safety_zone_m: f64,
    params: &Params,
) -> Result<Trajectory, TrajError> {
    let (reference, heading_rad, behind) = reference_point(pose, tail);

    let frame = LocalFrame::new(reference, heading_rad);

    let mut world_anchors = vec![behind, reference];
    world_anchors.extend((1..=params.num_lookahead_anchors).map(|k| {
        road.to_cartesian(&FrenetPoint::new(
            tail.end.s_m + k as f64 * safety_zone_m,
            lane.center_d_m(),
        ))
    }));

    let anchors: Vec<LocalPoint> = world_anchors.iter().map(|p| frame.to_local(p)).collect();

    trace!("Trajectory anchors (local): {:?}", anchors);

    let x: Vec<f64> = anchors.iter().map(|p| p.x()).collect();
    let y: Vec<f64> = anchors.iter().map(|p| p.y()).collect();
    let spline = CubicSpline::new(&x, &y)?;

    Ok(Trajectory {
        frame,
        spline,
        anchors,
    })
}

/// Find the reference point, the heading there, and the anchor just behind it.
///
/// With enough tail the reference is the end of the tail and the heading is that of its last
/// segment. Otherwise the reference is the vehicle itself, and a synthetic anchor is placed just
/// behind it.
fn reference_point(pose: &Pose, tail: &PathTail) -> (WorldPoint, f64, WorldPoint) {
    let n = tail.len();

    if n >= MIN_WARM_START_POINTS {
        let last = tail.points[n - 1];
        let prev = tail.points[n - 2];

        if prev.distance(&last) > MIN_HEADING_SEPARATION_M {
            return (last, prev.heading_to(&last), prev);
        }

        // A stationary tail has no heading of its own
        let behind = last.offset(pose.yaw_rad, -COLD_START_BACK_M);
        return (last, pose.yaw_rad, behind);
    }

    let behind = pose.position.offset(pose.yaw_rad, -COLD_START_BACK_M);
    (pose.position, pose.yaw_rad, behind)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::road::test_roads::straight;

    fn pose_at(x_m: f64, y_m: f64, yaw_rad: f64, s_m: f64, d_m: f64) -> Pose {
        Pose {
            position: WorldPoint::new(x_m, y_m),
            yaw_rad,
            speed_mph: 0.0,
            frenet: FrenetPoint::new(s_m, d_m),
        }
    }

    #[test]
    fn test_cold_start_anchors() {
        let road = straight(1000.0, 30.0);
        let params = Params::default();
        let pose = pose_at(100.0, -6.0, 0.0, 100.0, 6.0);
        let tail = PathTail { points: vec![], end: pose.frenet };

        let traj = synthesise(&road, &pose, &tail, Lane::INITIAL, 5.0, &params).unwrap();
        let anchors = traj.anchors();

        assert_eq!(anchors.len(), 5);
        assert!((anchors[0].x() + 1.0).abs() < 1e-9);
        assert!(anchors[1].x().abs() < 1e-9);
        for (k, a) in anchors[2..].iter().enumerate() {
            assert!((a.x() - 5.0 * (k + 1) as f64).abs() < 1e-9);
            assert!(a.y().abs() < 1e-9);
        }

        // Straight ahead in the middle lane
        let p = traj.world_point_at(7.5);
        assert!((p.x() - 107.5).abs() < 1e-9);
        assert!((p.y() + 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_warm_start_continues_tail() {
        let road = straight(1000.0, 30.0);
        let params = Params::default();
        let pose = pose_at(100.0, -6.0, 0.0, 100.0, 6.0);
        let tail = PathTail {
            points: vec![
                WorldPoint::new(100.4, -6.0),
                WorldPoint::new(100.8, -6.0),
                WorldPoint::new(101.2, -6.0),
            ],
            end: FrenetPoint::new(101.2, 6.0),
        };

        let traj = synthesise(&road, &pose, &tail, Lane::INITIAL, 10.0, &params).unwrap();

        assert_eq!(traj.frame().origin(), WorldPoint::new(101.2, -6.0));
        assert!(traj.frame().heading_rad().abs() < 1e-9);
        assert!((traj.anchors()[0].x() + 0.4).abs() < 1e-9);
        assert!((traj.anchors()[4].x() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_lane_change_bends_towards_target() {
        let road = straight(1000.0, 30.0);
        let params = Params::default();
        let pose = pose_at(100.0, -6.0, 0.0, 100.0, 6.0);
        let tail = PathTail { points: vec![], end: pose.frenet };

        let left = Lane::new(0).unwrap();
        let traj = synthesise(&road, &pose, &tail, left, 20.0, &params).unwrap();

        // Ends up in the left lane, which is towards +y in the vehicle frame
        let end = traj.local_point_at(60.0);
        assert!((end.y() - 4.0).abs() < 1e-9);
        assert!(traj.local_point_at(10.0).y() > 0.0);
    }

    #[test]
    fn test_stationary_tail_uses_pose_heading() {
        let road = straight(1000.0, 30.0);
        let params = Params::default();
        let pose = pose_at(100.0, -6.0, 0.0, 100.0, 6.0);
        let tail = PathTail {
            points: vec![WorldPoint::new(100.0, -6.0); 5],
            end: pose.frenet,
        };

        let traj = synthesise(&road, &pose, &tail, Lane::INITIAL, 5.0, &params).unwrap();
        assert!((traj.anchors()[0].x() + 1.0).abs() < 1e-9);
    }
}
