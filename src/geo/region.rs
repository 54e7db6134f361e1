//! Rectangular latitude/longitude regions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rectangular geographic area in decimal degrees.
///
/// Invariant: `south < north` and `west < east`. [`Region::new`] validates
/// the bounds; code that assembles regions field by field (the tiler) is
/// responsible for keeping them ordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

/// Bounds that do not describe a region.
#[derive(Debug, Error)]
#[error("invalid region bounds: south={south} north={north} west={west} east={east}")]
pub struct InvalidRegion {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl Region {
    /// Build a region, rejecting inverted or degenerate bounds.
    pub fn new(south: f64, north: f64, west: f64, east: f64) -> Result<Self, InvalidRegion> {
        if !(south < north && west < east)
            || !south.is_finite()
            || !north.is_finite()
            || !west.is_finite()
            || !east.is_finite()
        {
            return Err(InvalidRegion {
                south,
                north,
                west,
                east,
            });
        }
        Ok(Self {
            south,
            north,
            west,
            east,
        })
    }

    /// Area in square degrees. A rough size heuristic, not a surface area.
    pub fn area_sq_deg(&self) -> f64 {
        (self.north - self.south) * (self.east - self.west)
    }
}
