//! Viewport and quality-tier selectors.
//!
//! Both are plain classification values: the renderer re-evaluates them every
//! frame from its own policy (head tracking, distance, frame budget) and this
//! crate never stores or mutates them.

use serde::{Deserialize, Serialize};

/// Eye targeted by a stereo render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Viewport {
    Left,
    Right,
}

impl Viewport {
    pub const ALL: [Viewport; 2] = [Viewport::Left, Viewport::Right];
    pub const COUNT: usize = Self::ALL.len();

    pub const fn index(self) -> usize {
        match self {
            Viewport::Left => 0,
            Viewport::Right => 1,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Viewport::Left),
            1 => Some(Viewport::Right),
            _ => None,
        }
    }
}

/// Level-of-detail tier. Ordered from highest to lowest fidelity, so
/// `High < Medium < Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [QualityTier::High, QualityTier::Medium, QualityTier::Low];
    pub const COUNT: usize = Self::ALL.len();

    pub const fn index(self) -> usize {
        match self {
            QualityTier::High => 0,
            QualityTier::Medium => 1,
            QualityTier::Low => 2,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(QualityTier::High),
            1 => Some(QualityTier::Medium),
            2 => Some(QualityTier::Low),
            _ => None,
        }
    }

    /// Next tier down in fidelity, saturating at `Low`.
    pub const fn lower(self) -> Self {
        match self {
            QualityTier::High => QualityTier::Medium,
            QualityTier::Medium | QualityTier::Low => QualityTier::Low,
        }
    }

    /// Next tier up in fidelity, saturating at `High`.
    pub const fn higher(self) -> Self {
        match self {
            QualityTier::Low => QualityTier::Medium,
            QualityTier::Medium | QualityTier::High => QualityTier::High,
        }
    }
}

const _: () = {
    let mut i = 0;
    while i < Viewport::COUNT {
        assert!(Viewport::ALL[i].index() == i);
        i += 1;
    }
    let mut i = 0;
    while i < QualityTier::COUNT {
        assert!(QualityTier::ALL[i].index() == i);
        i += 1;
    }
};
