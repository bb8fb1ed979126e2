//! Typed container mapping between reported numeric representations and the
//! raw PRNG word stream.

use crate::error::{DerandomError, Result};
use crate::number_type::NumberType;

/// A sequence of reported numbers plus the type tag that says how to read
/// them. Internally everything is stored as 64-bit words:
/// - INTEGER: sign-extended into the high 32 bits.
/// - UNSIGNED_INTEGER: high 32 bits zero.
/// - LONG/UNSIGNED_LONG: the full 64-bit value.
/// - FLOAT: IEEE-754 `f32` bits, zero-extended.
/// - DOUBLE: IEEE-754 `f64` bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberSequence {
    ty: NumberType,
    words: Vec<u64>,
}

impl NumberSequence {
    pub fn empty(ty: NumberType) -> Self {
        NumberSequence { ty, words: Vec::new() }
    }

    pub fn from_words(words: Vec<u64>, ty: NumberType) -> Self {
        NumberSequence { ty, words }
    }

    pub fn ty(&self) -> NumberType {
        self.ty
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn has_truncated_output(&self) -> bool {
        self.ty.has_truncated_output()
    }

    /// Parses `lines` under the auto-widening rules: a string containing `.`
    /// becomes FLOAT if its value round-trips exactly through `f32`, else
    /// DOUBLE; integer strings pick the narrowest of
    /// {INTEGER, UNSIGNED_INTEGER, LONG, UNSIGNED_LONG} that fits, widening
    /// monotonically across the whole parse (see
    /// [`NumberType::narrowest_for`]). `hint` seeds the starting type (RAW
    /// behaves as "no preference yet").
    pub fn parse(lines: &[String], hint: NumberType) -> Result<Self> {
        let mut ty = hint;
        let mut values_int: Vec<i128> = Vec::with_capacity(lines.len());
        let mut is_float_track = hint == NumberType::Float || hint == NumberType::Double;
        let mut float_values: Vec<f64> = Vec::new();

        for line in lines {
            let trimmed = line.trim();
            if trimmed.contains('.') {
                let value: f64 = trimmed
                    .parse()
                    .map_err(|_| DerandomError::NumberFormat(format!("cannot parse '{trimmed}' as a float")))?;
                if !is_float_track {
                    // Switch tracks: any integers parsed so far are folded in
                    // as doubles/floats below.
                    is_float_track = true;
                    for v in &values_int {
                        float_values.push(*v as f64);
                    }
                }
                let roundtrips_f32 = (value as f32) as f64 == value;
                ty = if roundtrips_f32 && ty != NumberType::Double {
                    NumberType::Float
                } else {
                    NumberType::Double
                };
                float_values.push(value);
            } else if is_float_track {
                let value: f64 = trimmed
                    .parse()
                    .map_err(|_| DerandomError::NumberFormat(format!("cannot parse '{trimmed}' as a number")))?;
                float_values.push(value);
            } else {
                let value: i128 = trimmed
                    .parse()
                    .map_err(|_| DerandomError::NumberFormat(format!("cannot parse '{trimmed}' as an integer")))?;
                ty = NumberType::narrowest_for(value, ty).map_err(DerandomError::NumberFormat)?;
                values_int.push(value);
            }
        }

        if is_float_track {
            let words = float_values
                .iter()
                .map(|&v| {
                    if ty == NumberType::Float {
                        (v as f32).to_bits() as u64
                    } else {
                        v.to_bits()
                    }
                })
                .collect();
            return Ok(NumberSequence { ty, words });
        }

        if ty == NumberType::Raw {
            // Only reached when `lines` is empty and no hint narrowed it.
            ty = NumberType::Integer;
        }
        let words = values_int.iter().map(|&v| pack_int(v, ty)).collect();
        Ok(NumberSequence { ty, words })
    }

    /// Reformats this sequence into `new_type`, projecting through the raw
    /// PRNG word stream implied by `word_size` (see [`Self::get_sequence_words`]).
    pub fn format_numbers(&self, new_type: NumberType, word_size: u32) -> Result<NumberSequence> {
        if new_type == self.ty {
            return Ok(self.clone());
        }
        let raw = self.get_sequence_words(word_size);
        Ok(NumberSequence::from_raw_words(&raw, word_size, new_type))
    }

    /// Builds a typed sequence forward from a raw PRNG word stream: the same
    /// packing `formatNumbers` performs internally, exposed so generators can
    /// turn freshly produced words into reported values.
    pub fn from_raw_words(raw: &[u64], word_size: u32, new_type: NumberType) -> NumberSequence {
        let per_number = new_type.words_per_number(word_size);
        let mut words = Vec::with_capacity(raw.len() / per_number.max(1) + 1);
        for chunk in raw.chunks(per_number) {
            if chunk.len() < per_number {
                break;
            }
            words.push(pack_raw_chunk(chunk, word_size, new_type));
        }
        NumberSequence { ty: new_type, words }
    }

    /// The strict inverse of the forward packing above: reconstructs the raw
    /// PRNG output words that must have been emitted to yield these reported
    /// numbers, given a generator of `word_size` bits. For FLOAT/DOUBLE this
    /// only recovers the observed top bits; the rest read back as zero (see
    /// [`Self::get_observed_word_bits`] for which bits that is).
    pub fn get_sequence_words(&self, word_size: u32) -> Vec<u64> {
        let word_mask = word_mask(word_size);
        match self.ty {
            NumberType::Raw => self.words.iter().map(|&w| w & word_mask).collect(),
            NumberType::Integer | NumberType::UnsignedInteger => {
                self.words.iter().map(|&w| (w as u32) as u64 & word_mask).collect()
            }
            NumberType::Long | NumberType::UnsignedLong => {
                if word_size > 32 {
                    self.words.iter().map(|&w| w & word_mask).collect()
                } else {
                    let mut out = Vec::with_capacity(self.words.len() * 2);
                    for &w in &self.words {
                        out.push(((w >> 32) as u32) as u64 & word_mask);
                        out.push((w as u32) as u64 & word_mask);
                    }
                    out
                }
            }
            NumberType::Float => self
                .words
                .iter()
                .map(|&w| {
                    let value = f32::from_bits(w as u32);
                    let top24 = (value * (1u64 << 24) as f32).round() as u64;
                    (top24 << (word_size.saturating_sub(24))) & word_mask
                })
                .collect(),
            NumberType::Double => {
                if word_size > 32 {
                    self.words
                        .iter()
                        .map(|&w| {
                            let value = f64::from_bits(w);
                            let top53 = (value * (1u64 << 53) as f64).round() as u64;
                            (top53 << (word_size.saturating_sub(53))) & word_mask
                        })
                        .collect()
                } else {
                    let mut out = Vec::with_capacity(self.words.len() * 2);
                    for &w in &self.words {
                        let value = f64::from_bits(w);
                        let top53 = (value * (1u64 << 53) as f64).round() as u64;
                        let upper27 = top53 >> 26;
                        let lower26 = top53 & ((1u64 << 26) - 1);
                        out.push((upper27 << (word_size.saturating_sub(27))) & word_mask);
                        out.push((lower26 << (word_size.saturating_sub(26))) & word_mask);
                    }
                    out
                }
            }
        }
    }

    /// Per-raw-word bitmask of which bits were actually observed: all
    /// `word_size` bits for integer/long types, the top 24/27/26 bits for
    /// FLOAT/DOUBLE. Drives the MT truncated-output solver.
    pub fn get_observed_word_bits(&self, word_size: u32) -> Vec<u64> {
        let word_mask = word_mask(word_size);
        let count = self.get_sequence_words(word_size).len();
        match self.ty {
            NumberType::Float => vec![top_bits_mask(word_size, 24); count],
            NumberType::Double => {
                if word_size > 32 {
                    vec![top_bits_mask(word_size, 53); count]
                } else {
                    (0..count)
                        .map(|i| {
                            if i % 2 == 0 {
                                top_bits_mask(word_size, 27)
                            } else {
                                top_bits_mask(word_size, 26)
                            }
                        })
                        .collect()
                }
            }
            _ => vec![word_mask; count],
        }
    }

    /// Whether `raw_words`, packed forward as `self.ty`, equal this sequence.
    /// Used for peek-vs-incoming comparisons instead of comparing raw words
    /// directly, since truncated types lose information on the way to raw.
    pub fn matches_raw_words(&self, raw_words: &[u64], word_size: u32) -> bool {
        NumberSequence::from_raw_words(raw_words, word_size, self.ty) == *self
    }

    pub fn count_matches_with(&self, other: &NumberSequence) -> usize {
        self.words
            .iter()
            .zip(other.words.iter())
            .filter(|(a, b)| a == b)
            .count()
    }
}

fn pack_int(value: i128, ty: NumberType) -> u64 {
    match ty {
        NumberType::Integer => (value as i32 as i64) as u64,
        NumberType::UnsignedInteger => (value as u32) as u64,
        NumberType::Long => value as i64 as u64,
        NumberType::UnsignedLong => value as u64,
        _ => value as u64,
    }
}

fn pack_raw_chunk(chunk: &[u64], word_size: u32, ty: NumberType) -> u64 {
    match ty {
        NumberType::Raw => chunk[0] & word_mask(word_size),
        NumberType::Integer => {
            let low32 = chunk[0] as u32;
            (low32 as i32) as i64 as u64
        }
        NumberType::UnsignedInteger => chunk[0] as u32 as u64,
        NumberType::Long | NumberType::UnsignedLong => {
            if chunk.len() == 1 {
                chunk[0]
            } else {
                (chunk[0] << 32) | (chunk[1] & 0xFFFF_FFFF)
            }
        }
        NumberType::Float => {
            let value = (chunk[0] >> word_size.saturating_sub(24)) as f32 / (1u64 << 24) as f32;
            value.to_bits() as u64
        }
        NumberType::Double => {
            if chunk.len() == 1 {
                let value = (chunk[0] >> word_size.saturating_sub(53)) as f64 / (1u64 << 53) as f64;
                value.to_bits()
            } else {
                let upper = chunk[0] >> word_size.saturating_sub(27);
                let lower = chunk[1] >> word_size.saturating_sub(26);
                let value = (upper as f64 * (1u64 << 26) as f64 + lower as f64) / (1u64 << 53) as f64;
                value.to_bits()
            }
        }
    }
}

pub(crate) fn word_mask(word_size: u32) -> u64 {
    if word_size >= 64 {
        u64::MAX
    } else {
        (1u64 << word_size) - 1
    }
}

fn top_bits_mask(word_size: u32, top_bits: u32) -> u64 {
    let top_bits = top_bits.min(word_size);
    let shift = word_size - top_bits;
    word_mask(top_bits) << shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_widens_to_unsigned_integer_then_rejects_negative() {
        let seq = NumberSequence::parse(&["3000000000".to_string()], NumberType::Raw).unwrap();
        assert_eq!(seq.ty(), NumberType::UnsignedInteger);
        assert_eq!(seq.words()[0], 3_000_000_000u64);

        let err = NumberSequence::parse(&["-1".to_string()], seq.ty());
        assert!(err.is_err());
    }

    #[test]
    fn raw_roundtrip_is_identity_for_integer_types() {
        let original = NumberSequence::from_words(vec![42, u32::MAX as u64], NumberType::UnsignedInteger);
        let raw = original.format_numbers(NumberType::Raw, 32).unwrap();
        let back = raw.format_numbers(NumberType::UnsignedInteger, 32).unwrap();
        assert_eq!(original, back);
    }

    #[test]
    fn long_splits_into_two_32_bit_words() {
        let seq = NumberSequence::from_words(vec![0x1122_3344_5566_7788], NumberType::Long);
        let raw = seq.get_sequence_words(32);
        assert_eq!(raw, vec![0x1122_3344, 0x5566_7788]);
    }

    #[test]
    fn float_observed_bits_are_top_24() {
        let seq = NumberSequence::from_words(vec![0], NumberType::Float);
        let mask = seq.get_observed_word_bits(32)[0];
        assert_eq!(mask, 0xFFFF_FF00);
    }
}
