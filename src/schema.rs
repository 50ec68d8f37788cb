// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Keypoint schema: joint names, left/right flip correspondence, and the
//! per-joint OKS falloff table.
//!
//! The COCO 17-joint convention is built in via [`KeypointSchema::coco`];
//! other annotation conventions can be expressed with
//! [`KeypointSchema::new`].

use crate::error::{PoseError, Result};

/// COCO keypoint names, in annotation order.
const COCO_NAMES: [&str; 17] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
];

/// COCO left/right joint index pairs. Unpaired joints (nose) are
/// flip-invariant.
const COCO_FLIP_PAIRS: [(usize, usize); 8] = [
    (1, 2),   // eyes
    (3, 4),   // ears
    (5, 6),   // shoulders
    (7, 8),   // elbows
    (9, 10),  // wrists
    (11, 12), // hips
    (13, 14), // knees
    (15, 16), // ankles
];

/// COCO per-joint OKS sigmas. Smaller sigma = stricter match required
/// (eyes stricter than hips).
const COCO_SIGMAS: [f32; 17] = [
    0.026, 0.025, 0.025, 0.035, 0.035, 0.079, 0.079, 0.072, 0.072, 0.062, 0.062, 0.107, 0.107,
    0.087, 0.087, 0.089, 0.089,
];

/// An ordered keypoint schema with left/right flip correspondence and
/// per-joint OKS sigmas.
///
/// The flip pairs are disjoint by construction, so applying the pair swap
/// twice is the identity.
#[derive(Debug, Clone)]
pub struct KeypointSchema {
    names: Vec<String>,
    flip_pairs: Vec<(usize, usize)>,
    sigmas: Vec<f32>,
}

impl KeypointSchema {
    /// Create a custom keypoint schema.
    ///
    /// # Arguments
    ///
    /// * `names` - Joint names in annotation order.
    /// * `flip_pairs` - (left, right) index pairs for bilateral joints.
    /// * `sigmas` - Per-joint OKS falloff scales, one per joint.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::ConfigError`] if the sigma count does not match
    /// the joint count, a pair index is out of range, a joint is paired with
    /// itself, or a joint appears in more than one pair.
    pub fn new(
        names: Vec<String>,
        flip_pairs: Vec<(usize, usize)>,
        sigmas: Vec<f32>,
    ) -> Result<Self> {
        if sigmas.len() != names.len() {
            return Err(PoseError::ConfigError(format!(
                "expected {} sigmas, got {}",
                names.len(),
                sigmas.len()
            )));
        }

        let mut seen = vec![false; names.len()];
        for &(left, right) in &flip_pairs {
            if left >= names.len() || right >= names.len() {
                return Err(PoseError::ConfigError(format!(
                    "flip pair ({left}, {right}) out of range for {} joints",
                    names.len()
                )));
            }
            if left == right {
                return Err(PoseError::ConfigError(format!(
                    "joint {left} is paired with itself"
                )));
            }
            if seen[left] || seen[right] {
                return Err(PoseError::ConfigError(format!(
                    "flip pair ({left}, {right}) reuses an already-paired joint"
                )));
            }
            seen[left] = true;
            seen[right] = true;
        }

        Ok(Self {
            names,
            flip_pairs,
            sigmas,
        })
    }

    /// The COCO 17-joint schema with its left/right flip correspondence and
    /// sigma table.
    #[must_use]
    pub fn coco() -> Self {
        Self {
            names: COCO_NAMES.iter().map(|s| (*s).to_string()).collect(),
            flip_pairs: COCO_FLIP_PAIRS.to_vec(),
            sigmas: COCO_SIGMAS.to_vec(),
        }
    }

    /// Number of joints (K).
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the schema has no joints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Joint names in annotation order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// (left, right) bilateral joint index pairs.
    #[must_use]
    pub fn flip_pairs(&self) -> &[(usize, usize)] {
        &self.flip_pairs
    }

    /// Per-joint OKS sigmas.
    #[must_use]
    pub fn sigmas(&self) -> &[f32] {
        &self.sigmas
    }

    /// Index of the named joint, if present.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl Default for KeypointSchema {
    fn default() -> Self {
        Self::coco()
    }
}
