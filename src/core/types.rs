use serde::{Deserialize, Serialize};

use crate::error::{DashError, DashResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn validate(self) -> DashResult<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(DashError::InvalidViewport {
                width: self.width,
                height: self.height,
            })
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800, 500)
    }
}

/// Two distinct 0-based dimensions plotted against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisPair {
    pub x: usize,
    pub y: usize,
}

impl AxisPair {
    /// Validates that both axes are distinct and below `dimensions`.
    pub fn new(x: usize, y: usize, dimensions: usize) -> DashResult<Self> {
        if x == y {
            return Err(DashError::InvalidData(format!(
                "axes must be distinct, both are {x}"
            )));
        }
        if x >= dimensions || y >= dimensions {
            return Err(DashError::InvalidData(format!(
                "axes ({x}, {y}) must be below the model dimensionality {dimensions}"
            )));
        }
        Ok(Self { x, y })
    }
}

impl Default for AxisPair {
    fn default() -> Self {
        Self { x: 0, y: 1 }
    }
}
