// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Configuration for heatmap encoding and decoding.
//!
//! This module defines the [`HeatmapConfig`] struct, which carries the
//! parameters shared between the heatmap-label encoder and the argmax
//! decoder: keypoint count, target heatmap resolution, and the optional
//! minimum inference resolution. All values are injected by the caller;
//! nothing is read from global state.

/// Configuration for heatmap encoding and decoding.
///
/// Uses a builder pattern for convenient construction.
///
/// # Example
///
/// ```rust
/// use pose_heatmaps::HeatmapConfig;
///
/// let config = HeatmapConfig::new()
///     .with_heatmap_size(56)
///     .with_num_keypoints(17)
///     .with_min_inference_size(0);
/// ```
#[derive(Debug, Clone)]
pub struct HeatmapConfig {
    /// Side length of the square ground-truth heatmap grid.
    pub heatmap_size: usize,
    /// Number of keypoints per instance (K). Inputs whose joint dimension
    /// does not match this value are rejected.
    pub num_keypoints: usize,
    /// Minimum working resolution for argmax decoding. Each per-ROI resize
    /// target is floored up to at least this many pixels per side.
    /// A value of 0 disables the floor.
    pub min_inference_size: usize,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            heatmap_size: 56,
            num_keypoints: 17,
            min_inference_size: 0,
        }
    }
}

impl HeatmapConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ground-truth heatmap side length.
    ///
    /// # Arguments
    ///
    /// * `size` - Side length of the square heatmap grid.
    #[must_use]
    pub const fn with_heatmap_size(mut self, size: usize) -> Self {
        self.heatmap_size = size;
        self
    }

    /// Set the number of keypoints per instance.
    ///
    /// # Arguments
    ///
    /// * `num` - Keypoint count (K), e.g. 17 for the COCO schema.
    #[must_use]
    pub const fn with_num_keypoints(mut self, num: usize) -> Self {
        self.num_keypoints = num;
        self
    }

    /// Set the minimum working resolution for argmax decoding.
    ///
    /// Each ROI's resize target is floored up to this many pixels per side,
    /// decoupling decoding resolution from small ROIs. Set to 0 to disable.
    ///
    /// # Arguments
    ///
    /// * `size` - Minimum per-side resolution in pixels, or 0.
    #[must_use]
    pub const fn with_min_inference_size(mut self, size: usize) -> Self {
        self.min_inference_size = size;
        self
    }
}
