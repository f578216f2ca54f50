// Abbreviated count normalization ("3.74M subscribers" -> 3740000)

use super::errors::DownloadError;

/// Convert a human-readable abbreviated count into an exact integer.
///
/// Only the first whitespace-delimited token is consulted, so trailing
/// words like "subscribers" are ignored. A trailing `K`, `M` or `B`
/// (either case) multiplies the decimal prefix by 1e3, 1e6 or 1e9; the
/// result is truncated to an integer.
pub fn normalize_count(raw: &str) -> Result<u64, DownloadError> {
    let token = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| DownloadError::InvalidCountFormat(raw.to_string()))?;

    let (prefix, multiplier) = match token.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => (&token[..token.len() - 1], 1e3),
        Some('M') => (&token[..token.len() - 1], 1e6),
        Some('B') => (&token[..token.len() - 1], 1e9),
        _ => (token, 1.0),
    };

    let value: f64 = prefix
        .parse()
        .map_err(|_| DownloadError::InvalidCountFormat(raw.to_string()))?;

    Ok((value * multiplier) as u64)
}
