use super::*;
use crate::tokenizer::{Tokenizer, TokenizerExt, MASK_TOKEN};
use std::ops::Range;

/// Mask caption tokens in place and produce the language model labels.
///
/// The returned labels run parallel to `tokens`. A selected position is
/// labeled with the vocabulary id of its original token, while the token
/// itself becomes the mask marker (80%), a random vocabulary token (10%) or
/// stays unchanged (10%). Other positions are labeled [IGNORE_LABEL].
///
/// Selection never happens in per-token mode when `visualization` is set.
pub fn mask_tokens<T, R>(
    tokens: &mut [String],
    tokenizer: &T,
    policy: MaskPolicy,
    visualization: bool,
    rng: &mut R,
) -> Result<Vec<i64>>
where
    T: Tokenizer + ?Sized,
    R: Rng + ?Sized,
{
    match policy {
        MaskPolicy::Conditional => Ok(vec![IGNORE_LABEL; tokens.len()]),
        MaskPolicy::Span => {
            let span = sample_token_span(tokens.len(), rng);

            tokens
                .iter_mut()
                .enumerate()
                .map(|(index, token)| {
                    if span.contains(&index) {
                        let prob: f64 = rng.gen();
                        corrupt_token(token, prob, tokenizer, rng)
                    } else {
                        Ok(IGNORE_LABEL)
                    }
                })
                .try_collect()
        }
        MaskPolicy::Random => tokens
            .iter_mut()
            .map(|token| {
                let prob: f64 = rng.gen();

                if prob < TOKEN_MASK_PROB && !visualization {
                    corrupt_token(token, prob / TOKEN_MASK_PROB, tokenizer, rng)
                } else {
                    Ok(IGNORE_LABEL)
                }
            })
            .try_collect(),
    }
}

/// Sample the masked span of a caption with `len` tokens.
///
/// The start is drawn from `0..=len` and the length from
/// `1..=floor(len * TOKEN_SPAN_RATIO)`. Positions past the end of the caption
/// are dropped, so the span may be shorter than drawn or empty. Captions too
/// short to have a positive span length get an empty span without consuming
/// randomness.
pub fn sample_token_span<R>(len: usize, rng: &mut R) -> Range<usize>
where
    R: Rng + ?Sized,
{
    let span_range = (len as f64 * TOKEN_SPAN_RATIO) as usize;
    if span_range == 0 {
        return 0..0;
    }

    let start = rng.gen_range(0..=len);
    let span_len = rng.gen_range(1..=span_range);
    start.min(len)..(start + span_len).min(len)
}

/// Replace a selected token according to `prob` and return its label.
fn corrupt_token<T, R>(token: &mut String, prob: f64, tokenizer: &T, rng: &mut R) -> Result<i64>
where
    T: Tokenizer + ?Sized,
    R: Rng + ?Sized,
{
    let label = tokenizer.token_to_id_or_unk(token)?;

    if prob < REPLACE_WITH_MASK_PROB {
        *token = MASK_TOKEN.to_string();
    } else if prob < REPLACE_WITH_RANDOM_PROB {
        *token = tokenizer.random_token(rng)?;
    }

    Ok(label as i64)
}
