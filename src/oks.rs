// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Object Keypoint Similarity (OKS) and greedy pose suppression.
//!
//! OKS is a Gaussian-falloff similarity between two pose estimates, scaled
//! by the source ROI area and a per-joint tolerance. [`oks_nms`] uses it to
//! greedily drop duplicate detections of the same person, the pose
//! counterpart of box IoU NMS.

#![allow(clippy::cast_precision_loss)]

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};

use crate::error::{PoseError, Result};

/// Compute OKS between a source pose and a set of candidate poses.
///
/// For each candidate `i`:
/// `oks_i = mean_k exp(-(dx_k^2 + dy_k^2) / ((2 * sigma_k)^2 * 2 * (area + eps)))`
/// where `area = (x2 - x1 + 1) * (y2 - y1 + 1)` of the source ROI. The
/// candidate ROIs are shape-validated but do not enter the formula; the
/// metric is normalized by the source area only.
///
/// # Arguments
///
/// * `src_pred` - Source pose of shape (C, K) with rows (x, y, ...), C >= 2.
/// * `src_roi` - Source ROI (x1, y1, x2, y2), length 4.
/// * `dst_preds` - Candidate poses of shape (M, C, K).
/// * `dst_rois` - Candidate ROIs of shape (M, 4).
/// * `sigmas` - Per-joint falloff scales, length K (smaller = stricter).
///
/// # Returns
///
/// Similarities of shape (M,), each in (0, 1].
///
/// # Errors
///
/// Returns [`PoseError::ShapeMismatch`] if joint counts, sigma count, ROI
/// shapes, or instance counts disagree.
pub fn compute_oks(
    src_pred: ArrayView2<f32>,
    src_roi: ArrayView1<f32>,
    dst_preds: ArrayView3<f32>,
    dst_rois: ArrayView2<f32>,
    sigmas: &[f32],
) -> Result<Array1<f32>> {
    let (src_channels, num_joints) = src_pred.dim();
    let (num_candidates, dst_channels, dst_joints) = dst_preds.dim();
    if src_channels < 2 || dst_channels < 2 {
        return Err(PoseError::ShapeMismatch(format!(
            "poses need at least (x, y) channels, got {src_channels} and {dst_channels}"
        )));
    }
    if dst_joints != num_joints {
        return Err(PoseError::ShapeMismatch(format!(
            "candidate poses have {dst_joints} joints, source has {num_joints}"
        )));
    }
    if sigmas.len() != num_joints {
        return Err(PoseError::ShapeMismatch(format!(
            "got {} sigmas for {num_joints} joints",
            sigmas.len()
        )));
    }
    if src_roi.len() != 4 {
        return Err(PoseError::ShapeMismatch(format!(
            "source roi must have 4 elements, got {}",
            src_roi.len()
        )));
    }
    if dst_rois.dim() != (num_candidates, 4) {
        return Err(PoseError::ShapeMismatch(format!(
            "candidate rois must be ({num_candidates}, 4), got {:?}",
            dst_rois.dim()
        )));
    }

    let src_area =
        (src_roi[2] - src_roi[0] + 1.0) * (src_roi[3] - src_roi[1] + 1.0) + f32::EPSILON;

    let mut similarities = Array1::<f32>::zeros(num_candidates);
    for i in 0..num_candidates {
        let mut acc = 0.0_f32;
        for k in 0..num_joints {
            let dx = dst_preds[[i, 0, k]] - src_pred[[0, k]];
            let dy = dst_preds[[i, 1, k]] - src_pred[[1, k]];
            let var = (2.0 * sigmas[k]).powi(2);
            let e = (dx * dx + dy * dy) / var / src_area / 2.0;
            acc += (-e).exp();
        }
        similarities[i] = acc / num_joints as f32;
    }

    Ok(similarities)
}

/// Greedy OKS-based non-max suppression over pose detections.
///
/// Instances are ranked by their mean per-joint score (channel 2)
/// descending. The best remaining instance is kept, every pending instance
/// with OKS above `threshold` against it is dropped, and the process
/// repeats until none remain.
///
/// # Arguments
///
/// * `preds` - Pose predictions of shape (N, C, K) with channels
///   (x, y, score, ...), C >= 3.
/// * `rois` - Regions of interest of shape (N, 4).
/// * `sigmas` - Per-joint falloff scales, length K.
/// * `threshold` - OKS above which a pending instance is suppressed.
///
/// # Returns
///
/// Indices of kept instances, in acceptance order (highest score first).
///
/// # Errors
///
/// Returns [`PoseError::ShapeMismatch`] on malformed inputs.
pub fn oks_nms(
    preds: &Array3<f32>,
    rois: &Array2<f32>,
    sigmas: &[f32],
    threshold: f32,
) -> Result<Vec<usize>> {
    let (num_instances, channels, num_joints) = preds.dim();
    if channels < 3 {
        return Err(PoseError::ShapeMismatch(format!(
            "predictions need at least (x, y, score) channels, got {channels}"
        )));
    }
    if sigmas.len() != num_joints {
        return Err(PoseError::ShapeMismatch(format!(
            "got {} sigmas for {num_joints} joints",
            sigmas.len()
        )));
    }
    crate::encode::validate_rois(rois, num_instances)?;

    // Mean per-joint score, descending (NaN sorts last).
    let scores: Vec<f32> = (0..num_instances)
        .map(|i| preds.index_axis(Axis(0), i).row(2).mean().unwrap_or(0.0))
        .collect();
    let mut order: Vec<usize> = (0..num_instances).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Less)
    });

    let mut keep = Vec::new();
    while let Some(&best) = order.first() {
        keep.push(best);
        let rest: Vec<usize> = order[1..].to_vec();
        if rest.is_empty() {
            break;
        }

        let mut dst_preds = Array3::<f32>::zeros((rest.len(), channels, num_joints));
        let mut dst_rois = Array2::<f32>::zeros((rest.len(), 4));
        for (j, &idx) in rest.iter().enumerate() {
            dst_preds
                .index_axis_mut(Axis(0), j)
                .assign(&preds.index_axis(Axis(0), idx));
            dst_rois.row_mut(j).assign(&rois.row(idx));
        }

        let similarities = compute_oks(
            preds.index_axis(Axis(0), best),
            rois.row(best),
            dst_preds.view(),
            dst_rois.view(),
            sigmas,
        )?;

        order = rest
            .into_iter()
            .zip(similarities.iter())
            .filter(|&(_, &sim)| sim <= threshold)
            .map(|(idx, _)| idx)
            .collect();
    }

    Ok(keep)
}
