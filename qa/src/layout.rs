//! Static focal-plane layout reference data.
//!
//! Maps each fiber id to its physical (x, y) position on the focal plane.
//! The layout is supplied by an external reference-data provider and is
//! read-only after construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One fiber's fixed position on the focal plane, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiberPosition {
    pub fiber: u32,
    pub x: f64,
    pub y: f64,
}

/// Fiber id → (x, y) lookup, read-only after construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocalPlaneLayout {
    positions: BTreeMap<u32, (f64, f64)>,
}

impl FocalPlaneLayout {
    pub fn from_positions<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = FiberPosition>,
    {
        Self {
            positions: positions
                .into_iter()
                .map(|p| (p.fiber, (p.x, p.y)))
                .collect(),
        }
    }

    pub fn position(&self, fiber: u32) -> Option<(f64, f64)> {
        self.positions.get(&fiber).copied()
    }

    pub fn contains(&self, fiber: u32) -> bool {
        self.positions.contains_key(&fiber)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = FiberPosition> + '_ {
        self.positions.iter().map(|(&fiber, &(x, y))| FiberPosition { fiber, x, y })
    }

    /// Bounding box of all fiber positions as ((x_min, x_max), (y_min, y_max)),
    /// or None for an empty layout. Used to share spatial axis ranges across
    /// per-camera panels.
    pub fn envelope(&self) -> Option<((f64, f64), (f64, f64))> {
        let mut iter = self.positions.values();
        let &(x0, y0) = iter.next()?;
        let mut bounds = ((x0, x0), (y0, y0));
        for &(x, y) in iter {
            bounds.0 .0 = bounds.0 .0.min(x);
            bounds.0 .1 = bounds.0 .1.max(x);
            bounds.1 .0 = bounds.1 .0.min(y);
            bounds.1 .1 = bounds.1 .1.max(y);
        }
        Some(bounds)
    }
}
