// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Soft-integral (integral regression) heatmap decoding.
//!
//! Decodes each joint as the expectation of its discrete position under a
//! softmax-normalized heatmap, yielding sub-pixel, differentiable
//! coordinates. Unlike the argmax decoder, no ROI remapping is performed:
//! outputs stay in heatmap index units, and ROI correction is an external
//! concern.

#![allow(clippy::cast_precision_loss)]

use ndarray::{s, Array2, Array3};

use crate::error::{PoseError, Result};

/// Decode keypoints as softmax-weighted positional expectations.
///
/// Each joint's flattened map is softmax-normalized over its full spatial
/// (or spatial + depth) extent, forming a probability mass function over
/// discrete positions. Each coordinate axis is then the expectation of that
/// axis's index: the other axes are marginalized first, and the marginal is
/// integrated against index values `0..extent-1`. 2D and 3D share the same
/// expectation algorithm; 3D additionally marginalizes and integrates a
/// depth axis.
///
/// Sums run in row-major order; compare results within a numeric tolerance
/// rather than exactly.
///
/// # Arguments
///
/// * `preds` - Raw per-joint maps of shape (N, K * E) where
///   `E = width * height` (2D) or `width * height * depth` (3D), laid out
///   depth-major then row-major: `((z *) y * width + x)`.
/// * `num_joints` - Number of joints (K).
/// * `width` - Heatmap width.
/// * `height` - Heatmap height.
/// * `depth` - Heatmap depth for 3D decoding, or `None` for 2D.
///
/// # Returns
///
/// Coordinates of shape (N, K, dims) with dims 2 for (x, y) or 3 for
/// (x, y, z), in heatmap index units.
///
/// # Errors
///
/// Returns [`PoseError::ShapeMismatch`] if the flattened extent does not
/// equal `num_joints * width * height * depth`, or
/// [`PoseError::ConfigError`] if any extent is zero.
pub fn decode_integral(
    preds: &Array2<f32>,
    num_joints: usize,
    width: usize,
    height: usize,
    depth: Option<usize>,
) -> Result<Array3<f32>> {
    if num_joints == 0 || width == 0 || height == 0 || depth == Some(0) {
        return Err(PoseError::ConfigError(
            "num_joints, width, height, and depth must be non-zero".to_string(),
        ));
    }

    let extent = width * height * depth.unwrap_or(1);
    let (num_instances, cols) = preds.dim();
    if cols != num_joints * extent {
        return Err(PoseError::ShapeMismatch(format!(
            "preds have {cols} columns, expected {num_joints} joints x {extent} cells"
        )));
    }

    let dims = if depth.is_some() { 3 } else { 2 };
    let mut coords = Array3::<f32>::zeros((num_instances, num_joints, dims));

    for i in 0..num_instances {
        for k in 0..num_joints {
            let map = preds.slice(s![i, k * extent..(k + 1) * extent]);

            // Stabilized softmax over the full extent.
            let max = map.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mut probs: Vec<f32> = map.iter().map(|&v| (v - max).exp()).collect();
            let sum: f32 = probs.iter().sum();
            if sum > 0.0 {
                for p in &mut probs {
                    *p /= sum;
                }
            }

            match depth {
                None => {
                    let mut ex = 0.0_f32;
                    let mut ey = 0.0_f32;
                    for y in 0..height {
                        for x in 0..width {
                            let p = probs[y * width + x];
                            ex += p * x as f32;
                            ey += p * y as f32;
                        }
                    }
                    coords[[i, k, 0]] = ex;
                    coords[[i, k, 1]] = ey;
                }
                Some(d) => {
                    let mut ex = 0.0_f32;
                    let mut ey = 0.0_f32;
                    let mut ez = 0.0_f32;
                    for z in 0..d {
                        for y in 0..height {
                            for x in 0..width {
                                let p = probs[(z * height + y) * width + x];
                                ex += p * x as f32;
                                ey += p * y as f32;
                                ez += p * z as f32;
                            }
                        }
                    }
                    coords[[i, k, 0]] = ex;
                    coords[[i, k, 1]] = ey;
                    coords[[i, k, 2]] = ez;
                }
            }
        }
    }

    Ok(coords)
}
