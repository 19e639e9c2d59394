use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{Encoding, Tokenizer, TruncationParams, TruncationStrategy};

/// XLM-RoBERTa `<pad>` id.
pub const PAD_ID: u32 = 1;

/// Truncate every encoding (single text or pair) to `max_len` tokens,
/// shortening the longest member of a pair first.
pub fn configure_truncation(tokenizer: &mut Tokenizer, max_len: usize) -> Result<()> {
    let tp = TruncationParams { max_length: max_len, strategy: TruncationStrategy::LongestFirst, ..Default::default() };
    tokenizer.with_truncation(Some(tp)).map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
    Ok(())
}

pub fn tokenize_batch_on_device(tokenizer: &Tokenizer, texts: &[String], device: &Device) -> Result<(Tensor, Tensor)> {
    let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let encodings = tokenizer.encode_batch(inputs, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    pad_to_tensors(&encodings, device)
}

/// Encode `(query, passage)` pairs the way cross-encoders expect them.
pub fn tokenize_pairs_on_device(tokenizer: &Tokenizer, pairs: &[(String, String)], device: &Device) -> Result<(Tensor, Tensor)> {
    let inputs: Vec<(&str, &str)> = pairs.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    let encodings = tokenizer.encode_batch(inputs, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    pad_to_tensors(&encodings, device)
}

/// Right-pad a batch to its longest member; returns `(input_ids, attention_mask)`, both `[B,T]`.
pub fn pad_to_tensors(encodings: &[Encoding], device: &Device) -> Result<(Tensor, Tensor)> {
    let (ids, mask, t) = pad_batch(encodings.iter().map(|e| (e.get_ids(), e.get_attention_mask())));
    let b = encodings.len();
    let input_ids = Tensor::from_vec(ids, (b, t), device)?;
    let attention_mask = Tensor::from_vec(mask, (b, t), device)?;
    Ok((input_ids, attention_mask))
}

pub(crate) fn pad_batch<'a, I>(rows: I) -> (Vec<u32>, Vec<u32>, usize)
where
    I: Iterator<Item = (&'a [u32], &'a [u32])> + Clone,
{
    let t = rows.clone().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut ids = Vec::new();
    let mut mask = Vec::new();
    for (row_ids, row_mask) in rows {
        let pad = t - row_ids.len();
        ids.extend_from_slice(row_ids);
        ids.extend(std::iter::repeat(PAD_ID).take(pad));
        mask.extend_from_slice(row_mask);
        mask.extend(std::iter::repeat(0).take(pad));
    }
    (ids, mask, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_rows_to_longest() {
        let a_ids = [0u32, 10, 2];
        let a_mask = [1u32, 1, 1];
        let b_ids = [0u32, 2];
        let b_mask = [1u32, 1];
        let rows = vec![(&a_ids[..], &a_mask[..]), (&b_ids[..], &b_mask[..])];
        let (ids, mask, t) = pad_batch(rows.into_iter());
        assert_eq!(t, 3);
        assert_eq!(ids, [0, 10, 2, 0, 2, PAD_ID]);
        assert_eq!(mask, [1, 1, 1, 1, 1, 0]);
    }
}
