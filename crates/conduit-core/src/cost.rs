//! Request cost calculation

/// Cost of a request given token counts and per-1000-token prices
///
/// No rounding is applied; presentation is the caller's concern.
#[allow(clippy::cast_precision_loss)]
pub fn cost(prompt_tokens: u64, completion_tokens: u64, cost_per_k_in: f64, cost_per_k_out: f64) -> f64 {
    let input = prompt_tokens as f64 / 1000.0 * cost_per_k_in;
    let output = completion_tokens as f64 / 1000.0 * cost_per_k_out;
    input + output
}
