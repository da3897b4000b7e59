//! Extracted fiber spectra supplied for display sampling.
//!
//! When a spectral-extraction output is available for an exposure, the
//! caller materializes a small per-fiber spectrum collection from it. The
//! summary assembly samples a handful of these for visual inspection; no
//! file I/O happens here.

use ndarray::Array1;
use std::collections::BTreeMap;

/// One fiber's extracted spectrum: flux sampled on a wavelength grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumTrace {
    /// Wavelength grid in Angstroms.
    pub wavelength: Array1<f64>,
    /// Extracted flux per wavelength sample.
    pub flux: Array1<f64>,
}

impl SpectrumTrace {
    pub fn new(wavelength: Array1<f64>, flux: Array1<f64>) -> Self {
        debug_assert_eq!(wavelength.len(), flux.len());
        Self { wavelength, flux }
    }

    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }
}

/// Per-fiber spectrum collection for one exposure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiberSpectra {
    traces: BTreeMap<u32, SpectrumTrace>,
}

impl FiberSpectra {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fiber: u32, trace: SpectrumTrace) {
        self.traces.insert(fiber, trace);
    }

    pub fn trace(&self, fiber: u32) -> Option<&SpectrumTrace> {
        self.traces.get(&fiber)
    }

    /// Fiber ids with a spectrum, in ascending order.
    pub fn fibers(&self) -> Vec<u32> {
        self.traces.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_insert_and_lookup() {
        let mut spectra = FiberSpectra::new();
        spectra.insert(
            7,
            SpectrumTrace::new(array![3600.0, 3601.0], array![1.0, 2.0]),
        );
        spectra.insert(
            3,
            SpectrumTrace::new(array![3600.0, 3601.0], array![0.5, 0.4]),
        );

        assert_eq!(spectra.fibers(), vec![3, 7]);
        assert_eq!(spectra.trace(7).unwrap().len(), 2);
        assert!(spectra.trace(42).is_none());
    }
}
