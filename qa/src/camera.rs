//! Camera channel enumeration.
//!
//! Each spectrograph carries three wavelength channels, B, R and Z. The
//! channel letter shows up throughout the QA inputs (unit log names, table
//! key columns), so the enum carries its own display color and label as data
//! rather than re-deriving them from string positions at call sites.

use crate::QaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display color as an (r, g, b) triple.
pub type Rgb = (u8, u8, u8);

/// One of the three wavelength channels of a spectrograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Camera {
    /// Blue channel, ~360-590 nm.
    B,
    /// Red channel, ~570-770 nm.
    R,
    /// Near-infrared channel, ~750-980 nm.
    Z,
}

impl Camera {
    /// All cameras in canonical B, R, Z order.
    pub const ALL: [Camera; 3] = [Camera::B, Camera::R, Camera::Z];

    /// Upper-case channel letter.
    pub const fn letter(self) -> char {
        match self {
            Camera::B => 'B',
            Camera::R => 'R',
            Camera::Z => 'Z',
        }
    }

    /// Fixed per-camera display color used for panel frames and labels:
    /// B steel-blue, R firebrick, Z gray.
    pub const fn display_color(self) -> Rgb {
        match self {
            Camera::B => (70, 130, 180),
            Camera::R => (178, 34, 34),
            Camera::Z => (128, 128, 128),
        }
    }

    /// Parse a channel letter, case-insensitively.
    pub fn from_letter(letter: char) -> crate::Result<Self> {
        match letter.to_ascii_uppercase() {
            'B' => Ok(Camera::B),
            'R' => Ok(Camera::R),
            'Z' => Ok(Camera::Z),
            _ => Err(QaError::MalformedIdentifier {
                token: letter.to_string(),
            }),
        }
    }
}

impl FromStr for Camera {
    type Err = QaError;

    fn from_str(s: &str) -> crate::Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Camera::from_letter(letter),
            _ => Err(QaError::MalformedIdentifier {
                token: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}
