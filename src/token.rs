//! Token count estimation.
//!
//! A length heuristic, not a tokenizer: roughly four bytes of English text
//! per token. Callers must not assume the count matches any real model.

use crate::constants::CHARS_PER_TOKEN;

/// Estimate the number of tokens in `text` as `ceil(utf8_len / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(CHARS_PER_TOKEN)
}

/// Fraction of `original_tokens` removed by a candidate with `tokens` tokens.
///
/// Negative when the candidate is longer than the original.
pub fn token_reduction(original_tokens: usize, tokens: usize) -> f64 {
    if original_tokens == 0 {
        return 0.0;
    }
    (original_tokens as f64 - tokens as f64) / original_tokens as f64
}
