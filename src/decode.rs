// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Argmax heatmap decoding.
//!
//! Extracts predicted keypoint locations from raw heatmap stacks. Each
//! instance's joint planes are resized (cubic interpolation) to a working
//! resolution derived from its ROI, scores are converted to per-joint
//! spatial probabilities, and the argmax cell is mapped back to continuous
//! image coordinates with the `c = d + 0.5` convention.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use ndarray::{s, Array2, Array3, Array4};

use crate::config::HeatmapConfig;
use crate::encode::validate_rois;
use crate::error::{PoseError, Result};

/// Convert per-joint score planes to spatial probabilities.
///
/// Applies a softmax over all spatial positions of each joint plane,
/// numerically stabilized by subtracting the per-joint maximum before
/// exponentiating. Sums run in row-major order; results are reproducible
/// for a fixed input but comparisons should use a tolerance.
///
/// # Arguments
///
/// * `maps` - Score planes of shape (K, H, W).
///
/// # Returns
///
/// Probability planes of the same shape, each summing to 1.
#[must_use]
pub fn spatial_softmax(maps: &Array3<f32>) -> Array3<f32> {
    let mut probs = maps.clone();
    for mut plane in probs.outer_iter_mut() {
        let max = plane.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        plane.mapv_inplace(|v| (v - max).exp());
        let sum: f32 = plane.iter().sum();
        if sum > 0.0 {
            plane.mapv_inplace(|v| v / sum);
        }
    }
    probs
}

/// Extract predicted keypoint locations from heatmaps.
///
/// Per instance, the joint planes are resized with cubic interpolation to
/// `ceil(roi_width) x ceil(roi_height)` (each floored up to
/// `config.min_inference_size` when that is > 0), decoupling decoding
/// resolution from both the raw heatmap resolution and the ROI's native
/// size. The argmax is taken over raw scores; the softmax probability at
/// the same cell is reported alongside. The input heatmaps are never
/// mutated.
///
/// # Arguments
///
/// * `heatmaps` - Raw score heatmaps of shape (N, K, H, W).
/// * `rois` - Regions of interest of shape (N, 4), columns (x1, y1, x2, y2).
/// * `config` - Heatmap configuration (`num_keypoints`, `min_inference_size`).
///
/// # Returns
///
/// Predictions of shape (N, 4, K) with channels (x, y, score, probability)
/// in original image coordinates. Position `i` refers to input instance `i`.
///
/// # Errors
///
/// Returns [`PoseError::ShapeMismatch`] on malformed inputs, or
/// [`PoseError::ResizeError`] if a joint plane cannot be resized.
pub fn decode_heatmaps(
    heatmaps: &Array4<f32>,
    rois: &Array2<f32>,
    config: &HeatmapConfig,
) -> Result<Array3<f32>> {
    let (num_instances, num_joints, height, width) = heatmaps.dim();
    if num_joints != config.num_keypoints {
        return Err(PoseError::ShapeMismatch(format!(
            "heatmaps have {num_joints} joints, config expects {}",
            config.num_keypoints
        )));
    }
    if height == 0 || width == 0 {
        return Err(PoseError::ShapeMismatch(format!(
            "heatmaps have empty spatial extent ({height}x{width})"
        )));
    }
    validate_rois(rois, num_instances)?;

    let mut preds = Array3::<f32>::zeros((num_instances, 4, num_joints));
    let mut resizer = Resizer::new();

    for i in 0..num_instances {
        let offset_x = rois[[i, 0]];
        let offset_y = rois[[i, 1]];
        // Degenerate ROIs are clamped to unit extent before scaling.
        let roi_width = (rois[[i, 2]] - offset_x).max(1.0);
        let roi_height = (rois[[i, 3]] - offset_y).max(1.0);

        let mut map_width = roi_width.ceil() as usize;
        let mut map_height = roi_height.ceil() as usize;
        if config.min_inference_size > 0 {
            map_width = map_width.max(config.min_inference_size);
            map_height = map_height.max(config.min_inference_size);
        }
        let width_correction = roi_width / map_width as f32;
        let height_correction = roi_height / map_height as f32;

        let mut resized = Array3::<f32>::zeros((num_joints, map_height, map_width));
        for k in 0..num_joints {
            let plane = heatmaps.slice(s![i, k, .., ..]);
            let data: Vec<f32> = plane.iter().copied().collect();
            let out = resize_plane(&mut resizer, &data, width, height, map_width, map_height)?;
            resized
                .slice_mut(s![k, .., ..])
                .assign(&Array2::from_shape_vec((map_height, map_width), out).map_err(
                    |e| PoseError::ResizeError(e.to_string()),
                )?);
        }

        let probs = spatial_softmax(&resized);

        for k in 0..num_joints {
            let plane = resized.slice(s![k, .., ..]);
            let mut best = f32::NEG_INFINITY;
            let mut best_x = 0;
            let mut best_y = 0;
            for y in 0..map_height {
                for x in 0..map_width {
                    let v = plane[[y, x]];
                    if v > best {
                        best = v;
                        best_x = x;
                        best_y = y;
                    }
                }
            }

            // Heckbert convention: c = d + 0.5.
            preds[[i, 0, k]] = (best_x as f32 + 0.5) * width_correction + offset_x;
            preds[[i, 1, k]] = (best_y as f32 + 0.5) * height_correction + offset_y;
            preds[[i, 2, k]] = best;
            preds[[i, 3, k]] = probs[[k, best_y, best_x]];
        }
    }

    Ok(preds)
}

/// Resize a single f32 plane with cubic (Catmull-Rom) interpolation.
fn resize_plane(
    resizer: &mut Resizer,
    data: &[f32],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
) -> Result<Vec<f32>> {
    let src_bytes: &[u8] = bytemuck::cast_slice(data);
    let src = Image::from_vec_u8(
        src_width as u32,
        src_height as u32,
        src_bytes.to_vec(),
        PixelType::F32,
    )?;
    let mut dst = Image::new(dst_width as u32, dst_height as u32, PixelType::F32);

    let options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::CatmullRom));
    resizer.resize(&src, &mut dst, &options)?;

    Ok(bytemuck::cast_slice(dst.buffer()).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn config(k: usize) -> HeatmapConfig {
        HeatmapConfig::new().with_num_keypoints(k)
    }

    #[test]
    fn test_spatial_softmax_sums_to_one() {
        let mut maps = Array3::<f32>::zeros((2, 3, 3));
        maps[[0, 1, 1]] = 5.0;
        maps[[1, 0, 2]] = -3.0;
        let probs = spatial_softmax(&maps);
        for k in 0..2 {
            let sum: f32 = probs.slice(s![k, .., ..]).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
        // Peak position preserved
        let peak: f32 = probs[[0, 1, 1]];
        assert!(probs.slice(s![0, .., ..]).iter().all(|&p| p <= peak));
    }

    #[test]
    fn test_spatial_softmax_large_scores_stable() {
        let mut maps = Array3::<f32>::zeros((1, 2, 2));
        maps[[0, 0, 0]] = 1000.0;
        maps[[0, 1, 1]] = 999.0;
        let probs = spatial_softmax(&maps);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_decode_peak_position() {
        // 8x8 heatmap over an 8x8 ROI at the origin: no resize distortion,
        // cell (x=5, y=3) decodes to (5.5, 3.5).
        let mut heatmaps = Array4::<f32>::zeros((1, 2, 8, 8));
        heatmaps[[0, 0, 3, 5]] = 10.0;
        heatmaps[[0, 1, 0, 0]] = 10.0;
        let rois = array![[0.0_f32, 0.0, 8.0, 8.0]];

        let preds = decode_heatmaps(&heatmaps, &rois, &config(2)).unwrap();
        assert!((preds[[0, 0, 0]] - 5.5).abs() < 1e-4);
        assert!((preds[[0, 1, 0]] - 3.5).abs() < 1e-4);
        assert!((preds[[0, 0, 1]] - 0.5).abs() < 1e-4);
        assert!((preds[[0, 1, 1]] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_decode_roi_offset() {
        let mut heatmaps = Array4::<f32>::zeros((1, 1, 4, 4));
        heatmaps[[0, 0, 1, 2]] = 7.0;
        // ROI of size 4 at offset (10, 20)
        let rois = array![[10.0_f32, 20.0, 14.0, 24.0]];

        let preds = decode_heatmaps(&heatmaps, &rois, &config(1)).unwrap();
        assert!((preds[[0, 0, 0]] - 12.5).abs() < 1e-4);
        assert!((preds[[0, 1, 0]] - 21.5).abs() < 1e-4);
    }

    #[test]
    fn test_decode_score_and_prob_at_argmax() {
        let mut heatmaps = Array4::<f32>::zeros((1, 1, 4, 4));
        heatmaps[[0, 0, 2, 2]] = 9.0;
        let rois = array![[0.0_f32, 0.0, 4.0, 4.0]];

        let preds = decode_heatmaps(&heatmaps, &rois, &config(1)).unwrap();
        // Raw score at the peak
        assert!((preds[[0, 2, 0]] - 9.0).abs() < 1e-3);
        // Probability is a valid softmax value and dominates the plane:
        // softmax is monotone, so score-argmax and prob-argmax coincide
        let prob = preds[[0, 3, 0]];
        assert!(prob > 1.0 / 16.0 && prob <= 1.0);
    }

    #[test]
    fn test_decode_min_inference_size_floor() {
        let mut heatmaps = Array4::<f32>::zeros((1, 1, 4, 4));
        heatmaps[[0, 0, 1, 1]] = 5.0;
        // Tiny ROI; working resolution floored up to 8
        let rois = array![[0.0_f32, 0.0, 2.0, 2.0]];
        let cfg = config(1).with_min_inference_size(8);

        let preds = decode_heatmaps(&heatmaps, &rois, &cfg).unwrap();
        // Peak at cell (1, 1) of 4 -> relative 0.375 of the ROI extent;
        // decoded coordinate stays inside the 2x2 ROI
        assert!(preds[[0, 0, 0]] >= 0.0 && preds[[0, 0, 0]] <= 2.0);
        assert!(preds[[0, 1, 0]] >= 0.0 && preds[[0, 1, 0]] <= 2.0);
    }

    #[test]
    fn test_decode_degenerate_roi() {
        let mut heatmaps = Array4::<f32>::zeros((1, 1, 4, 4));
        heatmaps[[0, 0, 0, 0]] = 1.0;
        let rois = array![[3.0_f32, 3.0, 3.0, 3.0]];
        assert!(decode_heatmaps(&heatmaps, &rois, &config(1)).is_ok());
    }

    #[test]
    fn test_decode_shape_mismatch() {
        let heatmaps = Array4::<f32>::zeros((1, 3, 4, 4));
        let rois = array![[0.0_f32, 0.0, 4.0, 4.0]];
        assert!(decode_heatmaps(&heatmaps, &rois, &config(2)).is_err());

        let heatmaps = Array4::<f32>::zeros((2, 2, 4, 4));
        assert!(decode_heatmaps(&heatmaps, &rois, &config(2)).is_err());
    }

    #[test]
    fn test_decode_does_not_mutate_input() {
        let mut heatmaps = Array4::<f32>::zeros((1, 1, 4, 4));
        heatmaps[[0, 0, 2, 1]] = 4.0;
        let original = heatmaps.clone();
        let rois = array![[0.0_f32, 0.0, 4.0, 4.0]];
        let _ = decode_heatmaps(&heatmaps, &rois, &config(1)).unwrap();
        assert_eq!(heatmaps, original);
    }
}
