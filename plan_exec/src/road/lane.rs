//! Lane indexing
//!
//! Lanes are numbered from the road centerline outwards, lane 0 being the one adjacent to the
//! centerline. Each lane is [`LANE_WIDTH_M`] wide, so lane `L` is centred on
//! `d = LANE_WIDTH_M * L + LANE_WIDTH_M / 2`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Width of a single lane.
///
/// Units: meters
pub const LANE_WIDTH_M: f64 = 4.0;

/// Number of lanes on our side of the road.
pub const NUM_LANES: u8 = 3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Index of a lane, guaranteed to be in `0..NUM_LANES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Lane(u8);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Lane {
    /// The lane the vehicle starts the session in.
    pub const INITIAL: Lane = Lane(1);

    /// Get the lane with the given index, or `None` if there is no such lane.
    pub fn new(index: u8) -> Option<Self> {
        if index < NUM_LANES {
            Some(Self(index))
        }
        else {
            None
        }
    }

    /// Classify a lateral offset into a lane.
    ///
    /// Lane boundaries belong to the inner lane, so `d = 4` is lane 0 and `d = 8` is lane 1.
    /// Offsets beyond either edge of the road saturate to the nearest lane.
    pub fn from_d(d_m: f64) -> Self {
        let index = (d_m / LANE_WIDTH_M).ceil() - 1.0;
        let max_index = (NUM_LANES - 1) as f64;

        Self(index.max(0.0).min(max_index) as u8)
    }

    /// Index of the lane.
    pub fn index(&self) -> u8 {
        self.0
    }

    /// Lateral offset of the centre of the lane.
    pub fn center_d_m(&self) -> f64 {
        LANE_WIDTH_M * (self.0 as f64) + 0.5 * LANE_WIDTH_M
    }

    /// The adjacent lane closer to the centerline, if there is one.
    pub fn left(&self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    /// The adjacent lane further from the centerline, if there is one.
    pub fn right(&self) -> Option<Self> {
        Self::new(self.0 + 1)
    }
}

impl Default for Lane {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl std::convert::TryFrom<u8> for Lane {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Lane::new(index).ok_or_else(|| format!("Lane index {} out of range", index))
    }
}

impl From<Lane> for u8 {
    fn from(lane: Lane) -> Self {
        lane.0
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lane_from_d() {
        assert_eq!(Lane::from_d(0.0).index(), 0);
        assert_eq!(Lane::from_d(5.0).index(), 1);
        assert_eq!(Lane::from_d(10.0).index(), 2);

        // Boundaries belong to exactly one lane
        assert_eq!(Lane::from_d(4.0).index(), 0);
        assert_eq!(Lane::from_d(4.0 + 1e-9).index(), 1);
        assert_eq!(Lane::from_d(8.0).index(), 1);
        assert_eq!(Lane::from_d(8.0 + 1e-9).index(), 2);

        // Off the road
        assert_eq!(Lane::from_d(-3.0).index(), 0);
        assert_eq!(Lane::from_d(40.0).index(), 2);
    }

    #[test]
    fn test_lane_neighbours() {
        let outer = Lane::new(2).unwrap();
        assert_eq!(outer.right(), None);
        assert_eq!(outer.left(), Lane::new(1));
        assert_eq!(Lane::new(0).unwrap().left(), None);
        assert_eq!(Lane::new(3), None);
        assert_eq!(Lane::INITIAL.center_d_m(), 6.0);
    }
}
