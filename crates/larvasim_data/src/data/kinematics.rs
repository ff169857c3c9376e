use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw stimulus values keyed by source or sensor id.
///
/// Ordered so that summing over gains is reproducible.
pub type Stimulus = BTreeMap<String, f64>;

/// Position and heading of an agent in arena coordinates (m, rad).
#[derive(
    Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub orientation: f64,
}

impl Pose {
    #[must_use]
    pub fn new(x: f64, y: f64, orientation: f64) -> Self {
        Self { x, y, orientation }
    }

    /// Maps a body-relative offset (forward, left) to arena coordinates.
    #[must_use]
    pub fn project(&self, forward: f64, left: f64) -> (f64, f64) {
        let (s, c) = self.orientation.sin_cos();
        (
            self.x + forward * c - left * s,
            self.y + forward * s + left * c,
        )
    }
}
