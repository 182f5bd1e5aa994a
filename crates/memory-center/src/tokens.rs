//! Prompt-size estimation.
//!
//! An exact tokenizer is not required; the word/char blend below tracks real
//! tokenizers closely enough for budget enforcement.

/// Estimate the token count of a prompt fragment.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count() as f64;
    let chars = text.chars().count() as f64;
    (words * 1.3 + chars / 4.5).ceil() as usize
}
