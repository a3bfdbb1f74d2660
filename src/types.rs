//! Shared types and enums used across lakepro.
//! Includes `BandRole`, `Connectivity` and `VectorizeMode`.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Logical spectral role of a band, independent of the platform's band identifiers.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandRole {
    Blue,
    Green,
    Red,
    /// General shortwave infrared (Sentinel-2 B11)
    Swir,
    /// Cirrus-class shortwave band (Sentinel-2 B10)
    Cirrus,
}

impl std::fmt::Display for BandRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BandRole::Blue => "Blue",
            BandRole::Green => "Green",
            BandRole::Red => "Red",
            BandRole::Swir => "Swir",
            BandRole::Cirrus => "Cirrus",
        };
        write!(f, "{}", s)
    }
}

/// Pixel adjacency used when grouping lake pixels into regions.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Edge neighbours only
    Four,
    /// Edge and corner neighbours
    Eight,
}

impl Connectivity {
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        const FOUR: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const EIGHT: [(isize, isize); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        match self {
            Connectivity::Four => &FOUR,
            Connectivity::Eight => &EIGHT,
        }
    }
}

impl std::fmt::Display for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connectivity::Four => write!(f, "Four"),
            Connectivity::Eight => write!(f, "Eight"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorizeMode {
    /// Pixel-boundary polygons; fails when the pixel budget is exceeded
    Exact,
    /// Best effort: coarsen resolution over budget and simplify rings
    Approximate,
}

impl std::fmt::Display for VectorizeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorizeMode::Exact => write!(f, "Exact"),
            VectorizeMode::Approximate => write!(f, "Approximate"),
        }
    }
}
