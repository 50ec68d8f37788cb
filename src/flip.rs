// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Left/right flip transforms for keypoint arrays and heatmap stacks.
//!
//! Used for test-time augmentation: predictions on a horizontally mirrored
//! image are mapped back by swapping bilateral joints and mirroring the
//! spatial axis.

use ndarray::{s, Array3, Array4, Axis};

use crate::error::{PoseError, Result};
use crate::schema::KeypointSchema;

/// Left/right flip a keypoint array.
///
/// Swaps the channel columns of every bilateral joint pair, mirrors the
/// x-coordinate as `x' = width - x - 1` for every joint (paired or not),
/// then re-applies the COCO convention that joints with visibility 0 have
/// x forced to 0. The input is never mutated.
///
/// # Arguments
///
/// * `schema` - Keypoint schema providing the flip correspondence.
/// * `keypoints` - Keypoint array of shape (N, C, K) with channels
///   (x, y, visibility, ...), C >= 3.
/// * `width` - Image width in pixels.
///
/// # Returns
///
/// A new array of identical shape.
///
/// # Errors
///
/// Returns [`PoseError::ShapeMismatch`] if the joint dimension does not
/// match the schema or fewer than 3 channels are present.
pub fn flip_keypoints(
    schema: &KeypointSchema,
    keypoints: &Array3<f32>,
    width: f32,
) -> Result<Array3<f32>> {
    let (num_instances, channels, num_joints) = keypoints.dim();
    if num_joints != schema.len() {
        return Err(PoseError::ShapeMismatch(format!(
            "keypoints have {num_joints} joints, schema has {}",
            schema.len()
        )));
    }
    if channels < 3 {
        return Err(PoseError::ShapeMismatch(format!(
            "keypoints need at least (x, y, visibility) channels, got {channels}"
        )));
    }

    let mut flipped = keypoints.clone();
    for &(left, right) in schema.flip_pairs() {
        flipped
            .slice_mut(s![.., .., left])
            .assign(&keypoints.slice(s![.., .., right]));
        flipped
            .slice_mut(s![.., .., right])
            .assign(&keypoints.slice(s![.., .., left]));
    }

    flipped
        .slice_mut(s![.., 0, ..])
        .mapv_inplace(|x| width - x - 1.0);

    // COCO convention: invisible joints carry no coordinate.
    for n in 0..num_instances {
        for k in 0..num_joints {
            if flipped[[n, 2, k]] == 0.0 {
                flipped[[n, 0, k]] = 0.0;
            }
        }
    }

    Ok(flipped)
}

/// Horizontally flip a heatmap stack.
///
/// Swaps the joint planes of every bilateral pair, then reverses the last
/// spatial axis. This is a raw spatial mirror: unlike [`flip_keypoints`],
/// no pixel-convention correction or visibility rule is applied, and
/// downstream consumers depend on that. The input is never mutated.
///
/// # Arguments
///
/// * `schema` - Keypoint schema providing the flip correspondence.
/// * `heatmaps` - Heatmap stack of shape (N, K, H, W).
///
/// # Returns
///
/// A new array of identical shape.
///
/// # Errors
///
/// Returns [`PoseError::ShapeMismatch`] if the joint dimension does not
/// match the schema.
pub fn flip_heatmaps(schema: &KeypointSchema, heatmaps: &Array4<f32>) -> Result<Array4<f32>> {
    let num_joints = heatmaps.dim().1;
    if num_joints != schema.len() {
        return Err(PoseError::ShapeMismatch(format!(
            "heatmaps have {num_joints} joints, schema has {}",
            schema.len()
        )));
    }

    let mut flipped = heatmaps.clone();
    for &(left, right) in schema.flip_pairs() {
        flipped
            .slice_mut(s![.., left, .., ..])
            .assign(&heatmaps.slice(s![.., right, .., ..]));
        flipped
            .slice_mut(s![.., right, .., ..])
            .assign(&heatmaps.slice(s![.., left, .., ..]));
    }

    flipped.invert_axis(Axis(3));
    Ok(flipped)
}
