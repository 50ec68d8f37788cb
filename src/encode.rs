// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Ground-truth heatmap label encoding.
//!
//! Maps continuous keypoint coordinates into discrete cells of a
//! `heatmap_size` x `heatmap_size` grid per ROI, producing linearized index
//! labels and a validity weight mask suitable for a masked softmax loss.
//!
//! Continuous and discrete coordinates follow the Heckbert 1990 convention
//! ("What is the coordinate of a pixel?"): `d = floor(c)` and `c = d + 0.5`.
//! The decoder applies the inverse, so encode/decode round trips are
//! consistent.

use ndarray::{Array2, Array3};

use crate::config::HeatmapConfig;
use crate::error::{PoseError, Result};

/// Encode keypoint locations as discrete heatmap labels.
///
/// Maps keypoints from the half-open interval `[x1, x2)` in continuous image
/// coordinates to the closed interval `[0, heatmap_size - 1]` in discrete
/// grid coordinates. A keypoint lying exactly on the ROI's right or bottom
/// edge is clamped to `heatmap_size - 1` rather than excluded.
///
/// # Arguments
///
/// * `keypoints` - Ground-truth keypoints of shape (N, C, K) with channels
///   (x, y, visibility, ...), C >= 3. Visibility 0 marks an unannotated joint.
/// * `rois` - Regions of interest of shape (N, 4), columns (x1, y1, x2, y2).
/// * `config` - Heatmap configuration (`heatmap_size`, `num_keypoints`).
///
/// # Returns
///
/// `(labels, weights)`, each of shape (N, K). `labels[i, k]` is the
/// linearized index `dy * heatmap_size + dx`; `weights[i, k]` is 1.0 for
/// valid entries and 0.0 otherwise. Invalid entries have label forced to 0
/// so they are zero-cost under a masked loss.
///
/// # Errors
///
/// Returns [`PoseError::ShapeMismatch`] if the joint dimension does not
/// match `config.num_keypoints`, fewer than 3 channels are present, the ROI
/// array is not (N, 4), or the instance counts disagree.
pub fn encode_heatmap_labels(
    keypoints: &Array3<f32>,
    rois: &Array2<f32>,
    config: &HeatmapConfig,
) -> Result<(Array2<f32>, Array2<f32>)> {
    let (num_instances, channels, num_joints) = keypoints.dim();
    if num_joints != config.num_keypoints {
        return Err(PoseError::ShapeMismatch(format!(
            "keypoints have {num_joints} joints, config expects {}",
            config.num_keypoints
        )));
    }
    if channels < 3 {
        return Err(PoseError::ShapeMismatch(format!(
            "keypoints need at least (x, y, visibility) channels, got {channels}"
        )));
    }
    validate_rois(rois, num_instances)?;

    let size = config.heatmap_size as f32;
    let mut labels = Array2::<f32>::zeros((num_instances, num_joints));
    let mut weights = Array2::<f32>::zeros((num_instances, num_joints));

    for i in 0..num_instances {
        let x1 = rois[[i, 0]];
        let y1 = rois[[i, 1]];
        let x2 = rois[[i, 2]];
        let y2 = rois[[i, 3]];
        // Degenerate ROIs are clamped to unit extent before scaling.
        let scale_x = size / (x2 - x1).max(1.0);
        let scale_y = size / (y2 - y1).max(1.0);

        for k in 0..num_joints {
            let x = keypoints[[i, 0, k]];
            let y = keypoints[[i, 1, k]];
            let visible = keypoints[[i, 2, k]] > 0.0;

            let mut dx = ((x - x1) * scale_x).floor();
            let mut dy = ((y - y1) * scale_y).floor();
            // Boundary-exact keypoints stay inside the grid.
            if x == x2 {
                dx = size - 1.0;
            }
            if y == y2 {
                dy = size - 1.0;
            }

            let valid = visible && dx >= 0.0 && dy >= 0.0 && dx < size && dy < size;
            if valid {
                labels[[i, k]] = dy * size + dx;
                weights[[i, k]] = 1.0;
            }
        }
    }

    Ok((labels, weights))
}

/// Validate an (N, 4) ROI array against an expected instance count.
pub(crate) fn validate_rois(rois: &Array2<f32>, num_instances: usize) -> Result<()> {
    let (n, cols) = rois.dim();
    if cols != 4 {
        return Err(PoseError::ShapeMismatch(format!(
            "rois must have 4 columns (x1, y1, x2, y2), got {cols}"
        )));
    }
    if n != num_instances {
        return Err(PoseError::ShapeMismatch(format!(
            "rois have {n} instances, keypoints/heatmaps have {num_instances}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn config() -> HeatmapConfig {
        HeatmapConfig::new().with_heatmap_size(8).with_num_keypoints(2)
    }

    #[test]
    fn test_encode_basic() {
        let mut keypoints = Array3::<f32>::zeros((1, 4, 2));
        // Joint 0 at image (4.5, 2.5) inside an 8x8 ROI at origin -> cell (4, 2)
        keypoints[[0, 0, 0]] = 4.5;
        keypoints[[0, 1, 0]] = 2.5;
        keypoints[[0, 2, 0]] = 2.0;
        // Joint 1 invisible
        keypoints[[0, 2, 1]] = 0.0;

        let rois = array![[0.0_f32, 0.0, 8.0, 8.0]];
        let (labels, weights) = encode_heatmap_labels(&keypoints, &rois, &config()).unwrap();

        assert_eq!(labels[[0, 0]], 2.0 * 8.0 + 4.0);
        assert_eq!(weights[[0, 0]], 1.0);
        assert_eq!(labels[[0, 1]], 0.0);
        assert_eq!(weights[[0, 1]], 0.0);
    }

    #[test]
    fn test_encode_roi_offset_and_scale() {
        let mut keypoints = Array3::<f32>::zeros((1, 4, 2));
        // ROI spans [10, 26) in x -> scale 8/16 = 0.5; x = 15 maps to cell 2
        keypoints[[0, 0, 0]] = 15.0;
        keypoints[[0, 1, 0]] = 10.0;
        keypoints[[0, 2, 0]] = 1.0;

        let rois = array![[10.0_f32, 10.0, 26.0, 26.0]];
        let (labels, weights) = encode_heatmap_labels(&keypoints, &rois, &config()).unwrap();
        assert_eq!(labels[[0, 0]], 2.0);
        assert_eq!(weights[[0, 0]], 1.0);
    }

    #[test]
    fn test_encode_boundary_clamp() {
        let mut keypoints = Array3::<f32>::zeros((1, 4, 2));
        // Exactly on the right and bottom edges
        keypoints[[0, 0, 0]] = 8.0;
        keypoints[[0, 1, 0]] = 8.0;
        keypoints[[0, 2, 0]] = 1.0;

        let rois = array![[0.0_f32, 0.0, 8.0, 8.0]];
        let (labels, weights) = encode_heatmap_labels(&keypoints, &rois, &config()).unwrap();
        assert_eq!(labels[[0, 0]], 7.0 * 8.0 + 7.0);
        assert_eq!(weights[[0, 0]], 1.0);
    }

    #[test]
    fn test_encode_out_of_roi_is_invalid() {
        let mut keypoints = Array3::<f32>::zeros((1, 4, 2));
        keypoints[[0, 0, 0]] = -3.0;
        keypoints[[0, 1, 0]] = 2.0;
        keypoints[[0, 2, 0]] = 1.0;
        keypoints[[0, 0, 1]] = 9.5;
        keypoints[[0, 1, 1]] = 2.0;
        keypoints[[0, 2, 1]] = 1.0;

        let rois = array![[0.0_f32, 0.0, 8.0, 8.0]];
        let (labels, weights) = encode_heatmap_labels(&keypoints, &rois, &config()).unwrap();
        assert_eq!(weights[[0, 0]], 0.0);
        assert_eq!(labels[[0, 0]], 0.0);
        assert_eq!(weights[[0, 1]], 0.0);
        assert_eq!(labels[[0, 1]], 0.0);
    }

    #[test]
    fn test_encode_degenerate_roi_clamped() {
        let mut keypoints = Array3::<f32>::zeros((1, 4, 2));
        keypoints[[0, 0, 0]] = 5.0;
        keypoints[[0, 1, 0]] = 5.0;
        keypoints[[0, 2, 0]] = 1.0;

        // Zero-extent ROI must not divide by zero
        let rois = array![[5.0_f32, 5.0, 5.0, 5.0]];
        let result = encode_heatmap_labels(&keypoints, &rois, &config());
        assert!(result.is_ok());
    }

    #[test]
    fn test_encode_shape_mismatch() {
        let keypoints = Array3::<f32>::zeros((1, 4, 3));
        let rois = array![[0.0_f32, 0.0, 8.0, 8.0]];
        assert!(encode_heatmap_labels(&keypoints, &rois, &config()).is_err());

        let keypoints = Array3::<f32>::zeros((2, 4, 2));
        assert!(encode_heatmap_labels(&keypoints, &rois, &config()).is_err());
    }
}
