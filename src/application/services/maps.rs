//! Named maps selectable from the command line.

use std::fmt;
use std::str::FromStr;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{skew_tent_map, tent_map, Branch};

/// Maps known by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKind {
    Tent,
    SkewTent,
}

impl FromStr for MapKind {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tent" => Ok(MapKind::Tent),
            "skew-tent" | "skew_tent" => Ok(MapKind::SkewTent),
            _ => Err(ApplicationError::UnknownMap(s.to_string())),
        }
    }
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKind::Tent => write!(f, "tent"),
            MapKind::SkewTent => write!(f, "skew-tent"),
        }
    }
}

/// A map name with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSpec {
    pub kind: MapKind,
    /// Slope of the symmetric tent
    pub slope: f64,
    /// Peak location of the skew tent
    pub peak: f64,
    /// Peak height of the skew tent
    pub height: f64,
}

impl MapSpec {
    pub fn tent(slope: f64) -> Self {
        Self {
            kind: MapKind::Tent,
            slope,
            peak: 0.5,
            height: 1.0,
        }
    }

    pub fn branches(&self) -> ApplicationResult<Vec<Branch>> {
        let branches = match self.kind {
            MapKind::Tent => tent_map(self.slope)?,
            MapKind::SkewTent => skew_tent_map(self.peak, self.height)?,
        };
        Ok(branches)
    }
}

impl fmt::Display for MapSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MapKind::Tent => write!(f, "tent(a={})", self.slope),
            MapKind::SkewTent => write!(f, "skew-tent(c={}, h={})", self.peak, self.height),
        }
    }
}
