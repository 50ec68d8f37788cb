// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Pose Heatmap Utilities
//!
//! Conversions between discrete spatial heatmaps and continuous 2D/3D
//! keypoint coordinates for human-pose estimation: ground-truth label
//! encoding, argmax and soft-integral decoding, left/right flipping for
//! test-time augmentation, and OKS-based non-max suppression.
//!
//! All operations are stateless pure functions over [`ndarray`] arrays.
//! Nothing is read from global configuration: keypoint count, heatmap size,
//! and decode resolution are injected through [`HeatmapConfig`], and the
//! joint schema (names, flip correspondence, OKS sigmas) through
//! [`KeypointSchema`]. Every function returns a new array; caller-supplied
//! inputs are never mutated.
//!
//! Continuous and discrete coordinates follow the Heckbert 1990 convention
//! (`d = floor(c)`, `c = d + 0.5`) consistently across encoding and
//! decoding, so round trips stay within one cell of sub-grid error.
//!
//! ## Quick Start
//!
//! ```rust
//! use ndarray::{Array2, Array4};
//! use pose_heatmaps::{decode_heatmaps, HeatmapConfig, KeypointSchema};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = KeypointSchema::coco();
//!     let config = HeatmapConfig::new().with_num_keypoints(schema.len());
//!
//!     // One instance, 17 joints, 56x56 raw heatmaps over a 100x100 ROI
//!     let heatmaps = Array4::<f32>::zeros((1, 17, 56, 56));
//!     let rois = Array2::from_shape_vec((1, 4), vec![0.0, 0.0, 100.0, 100.0])?;
//!
//!     let preds = decode_heatmaps(&heatmaps, &rois, &config)?;
//!     assert_eq!(preds.shape(), &[1, 4, 17]); // (x, y, score, prob) per joint
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`schema`] | [`KeypointSchema`]: joint names, flip pairs, OKS sigmas |
//! | [`config`] | [`HeatmapConfig`] for encode/decode parameters |
//! | [`encode`] | Ground-truth heatmap label encoding |
//! | [`decode`] | Argmax decoding with per-ROI cubic resize |
//! | [`integral`] | Soft-integral (differentiable) decoding, 2D/3D |
//! | [`flip`] | Left/right flips of keypoints and heatmaps |
//! | [`oks`] | OKS similarity and greedy suppression |
//! | [`error`] | Error types ([`PoseError`], [`Result`]) |

// Modules
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod flip;
pub mod integral;
pub mod oks;
pub mod schema;

// Re-export main types and operations for convenience
pub use config::HeatmapConfig;
pub use decode::{decode_heatmaps, spatial_softmax};
pub use encode::encode_heatmap_labels;
pub use error::{PoseError, Result};
pub use flip::{flip_heatmaps, flip_keypoints};
pub use integral::decode_integral;
pub use oks::{compute_oks, oks_nms};
pub use schema::KeypointSchema;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
