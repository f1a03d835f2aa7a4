//! Portable Gray Map decoding.
//!
//! Supports the plain (`P2`) and raw (`P5`) variants with 8-bit or 16-bit
//! samples. Output is always one byte per pixel: 16-bit samples and all
//! ASCII samples are rescaled to 0-255 against the declared `maxval`, raw
//! 8-bit samples pass through untouched.

#[cfg(test)]
#[path = "pgm_test.rs"]
mod pgm_test;

use crate::consts::PGM_MAX_MAXVAL;
use crate::error::FormatError;

/// Which PGM encoding the stream uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgmKind {
    /// `P2`: whitespace-separated decimal samples.
    Ascii,
    /// `P5`: big-endian binary samples.
    Binary,
}

/// A decoded single-channel image, row-major from the top row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    pub kind: PgmKind,
    pub width: u32,
    pub height: u32,
    /// Maximum sample value declared in the header.
    pub maxval: u32,
    /// `width * height` display intensities.
    pub pixels: Vec<u8>,
}

/// Decode a PGM byte stream.
///
/// # Errors
///
/// Returns [`FormatError`] when the magic is not `P2`/`P5`, a header field is
/// missing or not a positive integer, or the pixel data is shorter than the
/// header promises.
pub fn decode(bytes: &[u8]) -> Result<GrayImage, FormatError> {
    let mut tokens = Tokens::new(bytes);

    let magic = tokens.next_token().ok_or(FormatError::MissingHeaderField("magic"))?;
    let kind = match magic {
        b"P2" => PgmKind::Ascii,
        b"P5" => PgmKind::Binary,
        other => return Err(FormatError::UnsupportedMagic(String::from_utf8_lossy(other).into_owned())),
    };

    let width = header_field(&mut tokens, "width", u32::MAX)?;
    let height = header_field(&mut tokens, "height", u32::MAX)?;
    let maxval = header_field(&mut tokens, "maxval", PGM_MAX_MAXVAL)?;

    let count = usize::try_from(width)
        .map_err(|_| FormatError::DimensionsOverflow)?
        .checked_mul(usize::try_from(height).map_err(|_| FormatError::DimensionsOverflow)?)
        .ok_or(FormatError::DimensionsOverflow)?;

    let pixels = match kind {
        PgmKind::Binary => read_binary(&mut tokens, count, maxval)?,
        PgmKind::Ascii => read_ascii(&mut tokens, count, maxval)?,
    };

    Ok(GrayImage { kind, width, height, maxval, pixels })
}

/// Rescale a raw sample to 0-255 as `round(value / maxval * 255)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rescale(value: u32, maxval: u32) -> u8 {
    if maxval == 0 {
        return 0;
    }
    let scaled = (f64::from(value) / f64::from(maxval) * 255.0).round();
    scaled.clamp(0.0, 255.0) as u8
}

fn header_field(tokens: &mut Tokens<'_>, field: &'static str, max: u32) -> Result<u32, FormatError> {
    let token = tokens.next_token().ok_or(FormatError::MissingHeaderField(field))?;
    let invalid = || FormatError::InvalidHeaderField { field, value: String::from_utf8_lossy(token).into_owned() };
    let value = std::str::from_utf8(token)
        .map_err(|_| invalid())?
        .parse::<u32>()
        .map_err(|_| invalid())?;
    if value == 0 || value > max {
        return Err(invalid());
    }
    Ok(value)
}

fn read_binary(tokens: &mut Tokens<'_>, count: usize, maxval: u32) -> Result<Vec<u8>, FormatError> {
    // Exactly one whitespace byte separates maxval from the raster; sample
    // bytes that happen to look like whitespace belong to the raster.
    let data = tokens.rest_after_single_separator();
    let wide = maxval > 255;
    let bytes_per_sample = if wide { 2 } else { 1 };
    let expected = count.checked_mul(bytes_per_sample).ok_or(FormatError::DimensionsOverflow)?;
    if data.len() < expected {
        return Err(FormatError::Truncated { expected, available: data.len() });
    }

    if !wide {
        return Ok(data[..expected].to_vec());
    }
    Ok(data[..expected]
        .chunks_exact(2)
        .map(|pair| rescale(u32::from(u16::from_be_bytes([pair[0], pair[1]])), maxval))
        .collect())
}

fn read_ascii(tokens: &mut Tokens<'_>, count: usize, maxval: u32) -> Result<Vec<u8>, FormatError> {
    // Every sample but the last needs a digit and a separator, so the
    // remaining input bounds the reservation regardless of the header.
    let mut out = Vec::with_capacity(count.min(tokens.remaining() / 2 + 1));
    for index in 0..count {
        let token = tokens
            .next_token()
            .ok_or(FormatError::Truncated { expected: count, available: index })?;
        let invalid = || FormatError::InvalidSample { index, token: String::from_utf8_lossy(token).into_owned() };
        let value = std::str::from_utf8(token)
            .map_err(|_| invalid())?
            .parse::<u32>()
            .map_err(|_| invalid())?;
        out.push(rescale(value, maxval));
    }
    Ok(out)
}

fn is_separator(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Header tokenizer: whitespace-delimited words with `#` comments running to end of line.
struct Tokens<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn skip_separators(&mut self) {
        while let Some(&byte) = self.bytes.get(self.pos) {
            if byte == b'#' {
                while self.bytes.get(self.pos).is_some_and(|&b| b != b'\n') {
                    self.pos += 1;
                }
            } else if is_separator(byte) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Option<&'a [u8]> {
        self.skip_separators();
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|&b| !is_separator(b)) {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.bytes[start..self.pos])
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn rest_after_single_separator(&mut self) -> &'a [u8] {
        if self.bytes.get(self.pos).is_some_and(|&b| is_separator(b)) {
            self.pos += 1;
        }
        &self.bytes[self.pos.min(self.bytes.len())..]
    }
}
