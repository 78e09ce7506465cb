//! Similarity and confidence arithmetic.

use crate::models::Label;

/// Cosine similarity in [-1, 1]. Zero-length or zero-norm vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let denom = na.sqrt() * nb.sqrt();
    if denom <= f32::EPSILON || !denom.is_finite() {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Phishing confidence from the two signals:
/// `clamp((1 - semantic) * (1 + boost * keyword), 0, 1)`.
///
/// Non-decreasing in `keyword_score` and non-increasing in `semantic_score`.
pub fn phishing_confidence(semantic_score: f32, keyword_score: f32, boost_factor: f32) -> f32 {
    let semantic = sanitize(semantic_score);
    let keyword = sanitize(keyword_score);
    let boost = if boost_factor.is_finite() {
        boost_factor.max(0.0)
    } else {
        0.0
    };
    ((1.0 - semantic) * (1.0 + boost * keyword)).clamp(0.0, 1.0)
}

fn sanitize(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

pub fn label_for(confidence: f32, low_threshold: f32, high_threshold: f32) -> Label {
    if confidence >= high_threshold {
        Label::Phishing
    } else if confidence >= low_threshold {
        Label::Suspicious
    } else {
        Label::Safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_fully_similar() {
        let v = [0.3, -0.2, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_and_orthogonal_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 2.0]), 0.0);
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn known_safe_content_has_no_confidence() {
        assert_eq!(phishing_confidence(1.0, 1.0, 3.0), 0.0);
    }

    #[test]
    fn keywords_amplify_low_similarity() {
        let base = phishing_confidence(0.6, 0.0, 1.0);
        let boosted = phishing_confidence(0.6, 0.2, 1.0);
        assert!((base - 0.4).abs() < 1e-6);
        assert!((boosted - 0.48).abs() < 1e-6);
    }

    #[test]
    fn confidence_saturates_at_one() {
        assert_eq!(phishing_confidence(0.0, 1.0, 2.0), 1.0);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        assert_eq!(phishing_confidence(-0.5, 0.0, 1.0), 1.0);
        assert_eq!(phishing_confidence(f32::NAN, f32::NAN, f32::INFINITY), 1.0);
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(label_for(0.75, 0.45, 0.75), Label::Phishing);
        assert_eq!(label_for(0.45, 0.45, 0.75), Label::Suspicious);
        assert_eq!(label_for(0.449, 0.45, 0.75), Label::Safe);
    }
}
