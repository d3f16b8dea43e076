//! Face matching: the `FaceMatcher`.
//!
//! Wraps the external detector/encoder (a [`FaceEncoderPort`]) and provides
//! the two operations the control state machine needs:
//!
//! - [`FaceMatcher::detect_and_encode`]: turn a frame into at most one
//!   [`FaceEmbedding`] (the primary face) plus every detected box.
//! - [`compare`]: Euclidean distance against a threshold.
//!
//! ## Primary face policy
//!
//! When several faces are detected the first one in detector order is the
//! subject ([`select_primary_face`]).  Nothing here picks the largest or
//! most central face; the remaining faces only contribute their boxes.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::FaceEncoderPort;
use crate::drivers::camera::Frame;
use crate::error::EncoderError;

/// Face box in source-image pixels, in detector order `(top, right, bottom, left)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl From<[i32; 4]> for BoundingBox {
    fn from([top, right, bottom, left]: [i32; 4]) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// One face as reported by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFace {
    pub embedding: Vec<f64>,
    pub bounding_box: BoundingBox,
}

/// The primary face's embedding plus every box detected in the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceEmbedding {
    pub vector: Vec<f64>,
    pub boxes: Vec<BoundingBox>,
}

impl FaceEmbedding {
    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Outcome of checking one live frame against the enrolled identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    Match,
    NoMatch,
    NoFaceDetected,
}

/// The subject is the first face the detector reports.
pub fn select_primary_face(faces: &[EncodedFace]) -> Option<&EncodedFace> {
    faces.first()
}

/// Euclidean distance between two embeddings.
///
/// Returns `None` when the dimensions differ; such embeddings cannot
/// belong to the same encoder and never match.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    Some(sum.sqrt())
}

/// Compare `candidate` against `reference`: a match iff `distance < threshold`.
///
/// Also returns the distance for reporting (`None` on dimension mismatch).
pub fn compare(
    reference: &FaceEmbedding,
    candidate: &FaceEmbedding,
    threshold: f64,
) -> (MatchDecision, Option<f64>) {
    match euclidean_distance(&reference.vector, &candidate.vector) {
        Some(distance) => {
            debug!("Face distance {:.4} (threshold {:.2})", distance, threshold);
            let decision = if distance < threshold {
                MatchDecision::Match
            } else {
                MatchDecision::NoMatch
            };
            (decision, Some(distance))
        }
        None => {
            warn!(
                "Embedding dimensions differ ({} vs {}); treating as no match",
                reference.dimensions(),
                candidate.dimensions()
            );
            (MatchDecision::NoMatch, None)
        }
    }
}

/// Detector/encoder wrapper.
pub struct FaceMatcher<F: FaceEncoderPort> {
    encoder: F,
}

impl<F: FaceEncoderPort> FaceMatcher<F> {
    pub fn new(encoder: F) -> Self {
        Self { encoder }
    }

    /// Encode the primary face of `frame`.
    ///
    /// `Ok(None)` means the frame holds no face.  Encoder failures are
    /// returned as errors so the caller can tell them apart from an empty
    /// frame.
    pub fn detect_and_encode(&mut self, frame: &Frame) -> Result<Option<FaceEmbedding>, EncoderError> {
        let faces = self.encoder.encode(frame)?;
        let boxes: Vec<BoundingBox> = faces.iter().map(|f| f.bounding_box).collect();
        info!("Face locations: {:?}", boxes);

        let Some(primary) = select_primary_face(&faces) else {
            info!("No face detected");
            return Ok(None);
        };
        if primary.embedding.is_empty() {
            return Err(EncoderError::Malformed("empty embedding".into()));
        }
        if faces.len() > 1 {
            debug!("{} faces detected; using the first", faces.len());
        }

        Ok(Some(FaceEmbedding {
            vector: primary.embedding.clone(),
            boxes,
        }))
    }

    pub fn encoder(&self) -> &F {
        &self.encoder
    }
}
