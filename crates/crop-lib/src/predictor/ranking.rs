//! Ranking of per-class probabilities into the top crop recommendations

use crate::error::{PredictError, PredictResult};
use crate::models::CropScore;

/// Number of crops returned per prediction
pub const TOP_K: usize = 4;

/// Decimal places kept in returned probabilities
pub const PROBABILITY_DECIMALS: i32 = 4;

/// Tolerance for probabilities slightly outside [0, 1] from float error
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Round a probability to [`PROBABILITY_DECIMALS`] places
pub fn round_probability(p: f64) -> f64 {
    let scale = 10f64.powi(PROBABILITY_DECIMALS);
    (p * scale).round() / scale
}

/// Select the `k` most probable classes.
///
/// Sorting is stable, so equal probabilities keep the model's class order.
/// Ranking uses raw probabilities; rounding happens afterwards and the
/// result is not renormalized.
pub fn top_k(classes: &[String], probabilities: &[f64], k: usize) -> PredictResult<Vec<CropScore>> {
    if probabilities.len() != classes.len() {
        return Err(PredictError::model_unavailable(format!(
            "model returned {} probabilities for {} classes",
            probabilities.len(),
            classes.len()
        )));
    }

    let mut scored = Vec::with_capacity(probabilities.len());
    for (i, &p) in probabilities.iter().enumerate() {
        if !p.is_finite()
            || p < -PROBABILITY_TOLERANCE
            || p > 1.0 + PROBABILITY_TOLERANCE
        {
            return Err(PredictError::model_unavailable(format!(
                "model returned invalid probability {} for class {}",
                p, classes[i]
            )));
        }
        scored.push((i, p.clamp(0.0, 1.0)));
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(scored
        .into_iter()
        .take(k)
        .map(|(i, p)| CropScore {
            crop: classes[i].clone(),
            probability: round_probability(p),
        })
        .collect())
}
