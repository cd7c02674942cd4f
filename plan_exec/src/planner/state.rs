//! Implementations for the planner state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::sim::{PathDems, Telemetry};
use log::{debug, info};
use serde::Serialize;

// Internal
use super::{Params, PlannerError};
use crate::{
    behav::{self, LaneDecision},
    loc::{PathTail, Pose},
    road::{Lane, Road, WorldPoint},
    traffic::{self, Detection},
    traj,
    vel_ctrl,
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State carried from one cycle to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlannerState {
    /// The lane the vehicle is driving in, or moving into.
    pub current_lane: Lane,

    /// Units: miles per hour
    pub ref_speed_mph: f64,

    /// Number of cycles committed so far
    pub cycle: u64,
}

/// Input data for one planning cycle.
#[derive(Debug, Clone)]
pub struct InputData {
    pub pose: Pose,
    pub tail: PathTail,
    pub detections: Vec<Detection>,
}

/// Result of a planning cycle.
#[derive(Debug, Clone)]
pub struct CycleOutput {
    /// The full path to send to the simulator
    pub path: Vec<WorldPoint>,

    /// The state to use for the next cycle
    pub next_state: PlannerState,

    pub report: StatusReport,
}

/// Status report for one planning cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusReport {
    pub cycle: u64,
    pub lane: Lane,
    pub decision: LaneDecision,

    pub forward_hazard: bool,
    pub left_feasible: bool,
    pub right_feasible: bool,
    pub left_gap_m: f64,
    pub right_gap_m: f64,

    pub safety_zone_m: f64,
    pub ref_speed_mph: f64,
    pub target_speed_mph: f64,

    pub num_detections: usize,
    pub tail_len: usize,
    pub num_new_points: usize,
}

/// Data required to initialise the planner.
pub struct InitData {
    pub params: Params,
    pub road: Road,
}

/// The planner module.
pub struct Planner {
    params: Params,
    road: Road,

    state: PlannerState,

    report: Option<StatusReport>,
    arch_report: Archiver,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PlannerState {
    fn default() -> Self {
        Self {
            current_lane: Lane::INITIAL,
            ref_speed_mph: 0.0,
            cycle: 0,
        }
    }
}

impl InputData {
    pub fn from_telemetry(tm: &Telemetry) -> Self {
        Self {
            pose: Pose::from_telemetry(tm),
            tail: PathTail::from_telemetry(tm),
            detections: tm.sensor_fusion.iter().map(Detection::from).collect(),
        }
    }
}

impl Planner {
    /// Create a planner which doesn't archive its status reports.
    pub fn new(params: Params, road: Road) -> Self {
        Self {
            params,
            road,
            state: PlannerState::default(),
            report: None,
            arch_report: Archiver::default(),
        }
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }
}

impl State for Planner {
    type InitData = InitData;
    type InitError = ArchiveError;

    type InputData = InputData;
    type OutputData = Vec<WorldPoint>;
    type StatusReport = StatusReport;
    type ProcError = PlannerError;

    /// Initialise the planner, archiving status reports into the session.
    fn init(init_data: Self::InitData, session: &Session) -> Result<Self, Self::InitError> {
        let mut planner = Self::new(init_data.params, init_data.road);
        planner.arch_report = Archiver::from_path(session, "planner/status_report.csv")?;

        Ok(planner)
    }

    /// Run one planning cycle and commit the resulting state.
    ///
    /// If the cycle fails the state is left untouched.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let out = plan_cycle(&self.road, &self.params, &self.state, input_data)?;

        if out.next_state.current_lane != self.state.current_lane {
            info!(
                "Changing lane {} -> {}",
                self.state.current_lane, out.next_state.current_lane
            );
        }

        self.state = out.next_state;
        self.report = Some(out.report);

        Ok((out.path, out.report))
    }
}

impl Archived for Planner {
    fn write(&mut self) -> Result<(), ArchiveError> {
        match self.report {
            Some(report) => self.arch_report.serialise(report),
            None => Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Plan the path for one cycle.
///
/// This doesn't modify `state`, the state for the next cycle is returned in the output.
pub fn plan_cycle(
    road: &Road,
    params: &Params,
    state: &PlannerState,
    input: &InputData,
) -> Result<CycleOutput, PlannerError> {
    let safety_zone_m = params.safety_zone_m(state.ref_speed_mph);

    let traffic = traffic::analyse(
        &input.detections,
        &input.pose,
        &input.tail,
        state.current_lane,
        state.ref_speed_mph,
        road.track_length_m(),
        params,
    );

    let decision = behav::decide(&traffic);
    let lane = decision.apply(state.current_lane);

    let trajectory = traj::synthesise(
        road,
        &input.pose,
        &input.tail,
        lane,
        safety_zone_m,
        params,
    )?;

    let vel = vel_ctrl::fill_path(
        &input.tail,
        &trajectory,
        &vel_ctrl::InputData {
            forward_hazard: traffic.forward_hazard,
            ref_speed_mph: state.ref_speed_mph,
            lookahead_m: safety_zone_m,
        },
        params,
    );

    let next_state = PlannerState {
        current_lane: lane,
        ref_speed_mph: vel.ref_speed_mph,
        cycle: state.cycle + 1,
    };

    let report = StatusReport {
        cycle: next_state.cycle,
        lane,
        decision,
        forward_hazard: traffic.forward_hazard,
        left_feasible: traffic.left_feasible,
        right_feasible: traffic.right_feasible,
        left_gap_m: traffic.left_gap_m,
        right_gap_m: traffic.right_gap_m,
        safety_zone_m,
        ref_speed_mph: vel.ref_speed_mph,
        target_speed_mph: vel.target_speed_mph,
        num_detections: input.detections.len(),
        tail_len: input.tail.len(),
        num_new_points: vel.num_new_points,
    };

    debug!(
        "Cycle {}: lane {} ({:?}), hazard {}, ref speed {:.3} mph",
        report.cycle, lane, decision, traffic.forward_hazard, vel.ref_speed_mph
    );

    Ok(CycleOutput {
        path: vel.path,
        next_state,
        report,
    })
}

/// Convert a path into the demands sent to the simulator.
pub fn to_path_dems(path: &[WorldPoint]) -> PathDems {
    PathDems {
        next_x: path.iter().map(|p| p.x()).collect(),
        next_y: path.iter().map(|p| p.y()).collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::road::{
        test_roads::{circle, straight},
        FrenetPoint, DEFAULT_D_SIGN_REF,
    };

    /// Input for a vehicle which has driven the first `consumed` points of `path`.
    fn drive_along(road: &Road, path: &[WorldPoint], consumed: usize) -> InputData {
        let pos = path[consumed - 1];
        let yaw_rad = path[consumed - 2].heading_to(&pos);

        let points = path[consumed..].to_vec();
        let n = points.len();
        let end_yaw_rad = points[n - 2].heading_to(&points[n - 1]);
        let end = road.to_frenet(&points[n - 1], end_yaw_rad);

        InputData {
            pose: Pose {
                position: pos,
                yaw_rad,
                speed_mph: 0.0,
                frenet: road.to_frenet(&pos, yaw_rad),
            },
            tail: PathTail { points, end },
            detections: vec![],
        }
    }

    fn at_rest_on_straight(ref_speed_mph: f64) -> (Road, PlannerState, InputData) {
        let road = straight(2000.0, 30.0);
        let state = PlannerState {
            current_lane: Lane::INITIAL,
            ref_speed_mph,
            cycle: 0,
        };
        let pose = Pose {
            position: WorldPoint::new(100.0, -6.0),
            yaw_rad: 0.0,
            speed_mph: ref_speed_mph,
            frenet: FrenetPoint::new(100.0, 6.0),
        };
        let input = InputData {
            pose,
            tail: PathTail { points: vec![], end: pose.frenet },
            detections: vec![],
        };

        (road, state, input)
    }

    fn stopped_car(id: u32, s_m: f64, d_m: f64) -> Detection {
        Detection {
            id,
            x_m: s_m,
            y_m: -d_m,
            vx_ms: 0.0,
            vy_ms: 0.0,
            s_m,
            d_m,
        }
    }

    #[test]
    fn test_free_road_accelerates() {
        let params = Params::default();
        let road = circle(300.0, 360);
        let (cx, cy) = DEFAULT_D_SIGN_REF;

        let theta: f64 = 0.1;
        let position = WorldPoint::new(cx + 306.0 * theta.cos(), cy + 306.0 * theta.sin());
        let yaw_rad = theta + std::f64::consts::FRAC_PI_2;
        let frenet = road.to_frenet(&position, yaw_rad);

        let mut planner = Planner::new(params.clone(), road.clone());
        let mut input = InputData {
            pose: Pose { position, yaw_rad, speed_mph: 0.0, frenet },
            tail: PathTail { points: vec![], end: frenet },
            detections: vec![],
        };

        let mut prev_speed = 0.0;
        for _ in 0..60 {
            let (path, report) = planner.proc(&input).unwrap();

            assert_eq!(path.len(), params.planning_horizon);
            assert_eq!(&path[..input.tail.len()], &input.tail.points[..]);
            assert_eq!(report.decision, LaneDecision::Hold);
            assert_eq!(planner.state().current_lane, Lane::INITIAL);

            let speed = planner.state().ref_speed_mph;
            assert!(speed >= prev_speed);
            assert!(speed <= params.speed_limit_mph);
            assert!(
                speed - prev_speed
                    <= report.num_new_points as f64 * params.speed_increment_mph + 1e-9
            );
            prev_speed = speed;

            input = drive_along(&road, &path, 5);
        }

        assert_eq!(planner.state().cycle, 60);
        assert_eq!(planner.state().ref_speed_mph, params.speed_limit_mph);

        // The vehicle stays in the middle lane
        let d_m = input.pose.frenet.d_m;
        assert!((d_m - 6.0).abs() < 0.5, "d = {}", d_m);
    }

    #[test]
    fn test_blocked_lane_moves_left() {
        let params = Params::default();
        let (road, state, mut input) = at_rest_on_straight(30.0);
        input.detections = vec![stopped_car(1, 110.0, 6.0)];

        let out = plan_cycle(&road, &params, &state, &input).unwrap();

        assert_eq!(out.report.decision, LaneDecision::MoveLeft);
        assert_eq!(out.next_state.current_lane, Lane::new(0).unwrap());
        assert!(out.report.forward_hazard);
        assert!(out.next_state.ref_speed_mph < state.ref_speed_mph);

        // The path bends towards the left lane
        let last = out.path[out.path.len() - 1];
        assert!(last.y() > -6.0);
    }

    #[test]
    fn test_right_lane_taken_when_left_blocked() {
        let params = Params::default();
        let (road, state, mut input) = at_rest_on_straight(30.0);
        input.detections = vec![
            stopped_car(1, 110.0, 6.0),
            stopped_car(2, 112.0, 2.0),
        ];

        let out = plan_cycle(&road, &params, &state, &input).unwrap();
        assert_eq!(out.report.decision, LaneDecision::MoveRight);
        assert_eq!(out.next_state.current_lane, Lane::new(2).unwrap());
    }

    #[test]
    fn test_boxed_in_slows_down() {
        let params = Params::default();
        let (road, state, mut input) = at_rest_on_straight(30.0);
        input.detections = vec![
            stopped_car(1, 110.0, 6.0),
            stopped_car(2, 112.0, 2.0),
            stopped_car(3, 108.0, 10.0),
        ];

        let out = plan_cycle(&road, &params, &state, &input).unwrap();

        assert_eq!(out.report.decision, LaneDecision::Hold);
        assert_eq!(out.next_state.current_lane, Lane::INITIAL);
        let expected = 30.0 - 30.0 * params.speed_increment_mph;
        assert!((out.next_state.ref_speed_mph - expected).abs() < 1e-9);
        assert_eq!(out.path.len(), 30);
    }

    #[test]
    fn test_state_not_committed_by_plan_cycle() {
        let params = Params::default();
        let (road, state, input) = at_rest_on_straight(0.0);

        let a = plan_cycle(&road, &params, &state, &input).unwrap();
        let b = plan_cycle(&road, &params, &state, &input).unwrap();

        assert_eq!(a.next_state, b.next_state);
        assert_eq!(a.path, b.path);
        assert_eq!(a.next_state.cycle, 1);
    }

    #[test]
    fn test_init_archives_reports() {
        let dir = std::env::temp_dir().join(format!("plan_exec_test_{}", std::process::id()));
        let session = Session::new_in("plan_exec", dir.clone()).unwrap();

        let (road, _, input) = at_rest_on_straight(0.0);
        let init_data = InitData { params: Params::default(), road };
        let mut planner = Planner::init(init_data, &session).unwrap();

        // Nothing to archive before the first cycle
        planner.write().unwrap();

        planner.proc(&input).unwrap();
        planner.write().unwrap();

        let archive = session.arch_root.join("planner/status_report.csv");
        let contents = std::fs::read_to_string(archive).unwrap();
        assert!(contents.starts_with("cycle,lane,decision,forward_hazard"));
        assert_eq!(contents.lines().count(), 2);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_path_dems() {
        let dems = to_path_dems(&[WorldPoint::new(1.0, 2.0), WorldPoint::new(3.0, 4.0)]);

        assert_eq!(dems.next_x, vec![1.0, 3.0]);
        assert_eq!(dems.next_y, vec![2.0, 4.0]);
    }
}
