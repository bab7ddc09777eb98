//! Format codec — pure byte-array-to-scalar conversion (spec §4.1).
//!
//! A [`FormatTag`] fixes a raw width in 16-bit words and a permutation of
//! the source bytes; decoding always reorders into a big-endian canonical
//! buffer first, then interprets the bit pattern. This keeps the four-way
//! word/byte-swap math in one place instead of duplicating
//! endian-dependent reads per numeric type, and matches the byte-order
//! tables this crate was grounded on (`ByteOrder`-style permutation, see
//! DESIGN.md).

use gw_errors::{GatewayError, Result};

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOrder4 {
    AbCd,
    CdAb,
    BaDc,
    DcBa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOrder8 {
    AbCdEfGh,
    GhEfCdAb,
    BaDcFeHg,
    HgFeDcBa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    Int,
    UInt,
    Long(WordOrder4),
    Float(WordOrder4),
    Double(WordOrder8),
}

impl FormatTag {
    /// Raw width in 16-bit words, per spec §4.1 step 2.
    pub fn word_width(&self) -> usize {
        match self {
            FormatTag::Int | FormatTag::UInt => 1,
            FormatTag::Long(_) | FormatTag::Float(_) => 2,
            FormatTag::Double(_) => 4,
        }
    }

    /// Parses the exact tag spellings from spec §3: `INT`, `UINT`,
    /// `Long AB CD`, `Float CD AB`, `Double HG FE DC BA`, etc.
    pub fn parse(tag: &str) -> Result<Self> {
        let tag = tag.trim();
        match tag {
            "INT" => return Ok(FormatTag::Int),
            "UINT" => return Ok(FormatTag::UInt),
            _ => {}
        }

        let mut parts = tag.split_whitespace();
        let kind = parts.next().unwrap_or_default();
        let order: Vec<&str> = parts.collect();
        let order_str = order.join("");

        match kind {
            "Long" => parse_word_order4(&order_str).map(FormatTag::Long),
            "Float" => parse_word_order4(&order_str).map(FormatTag::Float),
            "Double" => parse_word_order8(&order_str).map(FormatTag::Double),
            _ => Err(GatewayError::UnknownFormat(tag.to_string())),
        }
        .map_err(|_| GatewayError::UnknownFormat(tag.to_string()))
    }
}

fn parse_word_order4(order: &str) -> Result<WordOrder4> {
    match order {
        "ABCD" => Ok(WordOrder4::AbCd),
        "CDAB" => Ok(WordOrder4::CdAb),
        "BADC" => Ok(WordOrder4::BaDc),
        "DCBA" => Ok(WordOrder4::DcBa),
        other => Err(GatewayError::UnknownFormat(other.to_string())),
    }
}

fn parse_word_order8(order: &str) -> Result<WordOrder8> {
    match order {
        "ABCDEFGH" => Ok(WordOrder8::AbCdEfGh),
        "GHEFCDAB" => Ok(WordOrder8::GhEfCdAb),
        "BADCFEHG" => Ok(WordOrder8::BaDcFeHg),
        "HGFEDCBA" => Ok(WordOrder8::HgFeDcBa),
        other => Err(GatewayError::UnknownFormat(other.to_string())),
    }
}

fn permute4(raw: &[u8; 4], order: WordOrder4) -> [u8; 4] {
    let [a, b, c, d] = *raw;
    match order {
        WordOrder4::AbCd => [a, b, c, d],
        WordOrder4::CdAb => [c, d, a, b],
        WordOrder4::BaDc => [b, a, d, c],
        WordOrder4::DcBa => [d, c, b, a],
    }
}

fn permute8(raw: &[u8; 8], order: WordOrder8) -> [u8; 8] {
    let [a, b, c, d, e, f, g, h] = *raw;
    match order {
        WordOrder8::AbCdEfGh => [a, b, c, d, e, f, g, h],
        WordOrder8::GhEfCdAb => [g, h, e, f, c, d, a, b],
        WordOrder8::BaDcFeHg => [b, a, d, c, f, e, h, g],
        WordOrder8::HgFeDcBa => [h, g, f, e, d, c, b, a],
    }
}

fn require_len(raw: &[u8], needed: usize) -> Result<()> {
    if raw.len() < needed {
        Err(GatewayError::ShortBuffer {
            needed,
            have: raw.len(),
        })
    } else {
        Ok(())
    }
}

/// Decodes `raw` bytes according to `tag`, per spec §4.1.
pub fn decode(tag: FormatTag, raw: &[u8]) -> Result<Value> {
    match tag {
        FormatTag::Int => {
            require_len(raw, 2)?;
            Ok(Value::Int64(i16::from_be_bytes([raw[0], raw[1]]) as i64))
        }
        FormatTag::UInt => {
            require_len(raw, 2)?;
            Ok(Value::UInt16(u16::from_be_bytes([raw[0], raw[1]])))
        }
        FormatTag::Long(order) => {
            require_len(raw, 4)?;
            let natural = [raw[0], raw[1], raw[2], raw[3]];
            let canon = permute4(&natural, order);
            Ok(Value::Int64(i32::from_be_bytes(canon) as i64))
        }
        FormatTag::Float(order) => {
            require_len(raw, 4)?;
            let natural = [raw[0], raw[1], raw[2], raw[3]];
            let canon = permute4(&natural, order);
            Ok(Value::Float64(f32::from_be_bytes(canon) as f64))
        }
        FormatTag::Double(order) => {
            require_len(raw, 8)?;
            let natural = [raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7]];
            let canon = permute8(&natural, order);
            Ok(Value::Float64(f64::from_be_bytes(canon)))
        }
    }
}

/// Packs 16-bit register words into the canonical byte buffer the same
/// word order would produce on the wire (big-endian within each word),
/// used by the point mapper before decoding a multi-word reading.
pub fn words_to_be_bytes(words: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * 2);
    for w in words {
        bytes.extend_from_slice(&w.to_be_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_cdab_decodes_123_2() {
        // Scenario 1 from spec §8: Tag `Float CD AB`, bytes
        // [0x66, 0x66, 0x42, 0xF6] -> 123.2
        let tag = FormatTag::parse("Float CD AB").unwrap();
        let v = decode(tag, &[0x66, 0x66, 0x42, 0xF6]).unwrap();
        let f = v.as_f64().unwrap();
        assert!((f - 123.2).abs() < 1e-4, "got {f}");
    }

    #[test]
    fn float_abcd_decodes_same_value() {
        let tag = FormatTag::parse("Float AB CD").unwrap();
        let v = decode(tag, &[0x42, 0xF6, 0x66, 0x66]).unwrap();
        let f = v.as_f64().unwrap();
        assert!((f - 123.2).abs() < 1e-4, "got {f}");
    }

    #[test]
    fn int_and_uint_are_two_bytes() {
        assert_eq!(FormatTag::Int.word_width(), 1);
        assert_eq!(FormatTag::UInt.word_width(), 1);
        let v = decode(FormatTag::UInt, &[0x00, 0x05]).unwrap();
        assert_eq!(v, Value::UInt16(5));
        let v = decode(FormatTag::Int, &[0xFF, 0xFF]).unwrap();
        assert_eq!(v, Value::Int64(-1));
    }

    #[test]
    fn short_buffer_is_an_error() {
        let tag = FormatTag::parse("Float AB CD").unwrap();
        let err = decode(tag, &[0x00, 0x01]).unwrap_err();
        assert!(matches!(err, GatewayError::ShortBuffer { .. }));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        assert!(FormatTag::parse("Banana").is_err());
    }

    #[test]
    fn roundtrip_double_all_orders() {
        let value = 12345.6789_f64;
        let be = value.to_be_bytes();
        for (order, expect_identity) in [
            (WordOrder8::AbCdEfGh, true),
            (WordOrder8::GhEfCdAb, false),
            (WordOrder8::BaDcFeHg, false),
            (WordOrder8::HgFeDcBa, false),
        ] {
            // Build raw bytes that, once permuted back to canonical order,
            // reproduce `be`.
            let raw = match order {
                WordOrder8::AbCdEfGh => be,
                WordOrder8::GhEfCdAb => [be[6], be[7], be[4], be[5], be[2], be[3], be[0], be[1]],
                WordOrder8::BaDcFeHg => [be[1], be[0], be[3], be[2], be[5], be[4], be[7], be[6]],
                WordOrder8::HgFeDcBa => [be[7], be[6], be[5], be[4], be[3], be[2], be[1], be[0]],
            };
            let v = decode(FormatTag::Double(order), &raw).unwrap();
            assert_eq!(v, Value::Float64(value));
            let _ = expect_identity;
        }
    }
}
