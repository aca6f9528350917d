//! Detection-zone geometry
//!
//! Everything is in normalized screen-height units: 0 at the top of the
//! screen, 100 at the bottom, used consistently for positions, zone bounds,
//! and trigger offsets.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Capture quality, by distance from the zone center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Perfect,
    Good,
    Bad,
}

impl Grade {
    /// Base score before combo and doubling
    pub fn base_score(self) -> u64 {
        match self {
            Grade::Perfect => PERFECT_SCORE,
            Grade::Good => GOOD_SCORE,
            Grade::Bad => BAD_SCORE,
        }
    }
}

/// The active detection band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub top: f32,
    pub bottom: f32,
}

impl Zone {
    /// Zone of `height` units ending at `bottom`
    pub fn new(bottom: f32, height: f32) -> Self {
        Self {
            top: bottom - height,
            bottom,
        }
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn center(&self) -> f32 {
        self.top + self.height() / 2.0
    }

    /// Strictly inside the band
    pub fn contains(&self, y: f32) -> bool {
        y > self.top && y < self.bottom
    }

    /// Inside the band widened by the tap tolerance
    pub fn admits(&self, y: f32) -> bool {
        y > self.top - ZONE_TOLERANCE && y < self.bottom + ZONE_TOLERANCE
    }

    /// Normalized distance from the zone center: 0 at the center,
    /// 1 at either edge
    pub fn offset_ratio(&self, y: f32) -> f32 {
        let half = self.height() / 2.0;
        if half <= 0.0 {
            return 1.0;
        }
        (y - self.center()).abs() / half
    }

    /// Grade a capture at position `y`
    pub fn grade(&self, y: f32) -> Grade {
        let ratio = self.offset_ratio(y);
        if ratio <= PERFECT_RATIO {
            Grade::Perfect
        } else if ratio <= GOOD_RATIO {
            Grade::Good
        } else {
            Grade::Bad
        }
    }
}
