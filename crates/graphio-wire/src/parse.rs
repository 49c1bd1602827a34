//! Decoder for the framed export stream.
//!
//! Mirrors the downstream consumer's reading discipline: locate the
//! document markers, collect every `STX .. ETX` frame between them
//! (ignoring any bytes outside frames), then interpret frames
//! positionally. Exists for round-trip testing and for tooling that wants
//! the stream back as typed values.

use crate::frame::{DOC_END, DOC_START, STRING_END, STRING_START};
use graphio_core::prototype::{AllowedEffects, LocalisedString};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("stream is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("no document start marker in stream")]
    MissingStartMarker,
    #[error("no document end marker in stream")]
    MissingEndMarker,
    #[error("unexpected end of document")]
    UnexpectedEnd,
    #[error("expected a number, got {0:?}")]
    InvalidNumber(String),
    #[error("expected a count, got {0:?}")]
    InvalidCount(String),
    #[error("expected a 0/1 flag, got {0:?}")]
    InvalidFlag(String),
    #[error("localised string frame does not have exactly two parts: {0:?}")]
    MalformedLocalised(String),
    #[error("expected four effect bits, got {0:?}")]
    InvalidEffectBits(String),
}

/// Iterates the frames of one document, front to back.
pub struct FramedReader {
    frames: std::vec::IntoIter<String>,
}

impl FramedReader {
    /// Extract the document between the first start marker and the last
    /// end marker of `bytes` and split it into frames.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(bytes)?;
        let start = text
            .find(DOC_START as char)
            .ok_or(ParseError::MissingStartMarker)?;
        let end = text
            .rfind(DOC_END as char)
            .ok_or(ParseError::MissingEndMarker)?;
        // An end marker before the start marker means the document never
        // closed; a stray 0x04 earlier in the stream is not a terminator.
        if end <= start {
            return Err(ParseError::MissingEndMarker);
        }
        let document = &text[start + 1..end];

        let mut frames = Vec::new();
        let mut buffer = String::new();
        let mut in_frame = false;
        for ch in document.chars() {
            if in_frame {
                if ch == STRING_END as char {
                    frames.push(std::mem::take(&mut buffer));
                    in_frame = false;
                } else {
                    buffer.push(ch);
                }
            } else if ch == STRING_START as char {
                in_frame = true;
            }
            // Bytes between frames carry no meaning.
        }
        Ok(Self {
            frames: frames.into_iter(),
        })
    }

    pub fn read_scalar(&mut self) -> Result<String, ParseError> {
        self.frames.next().ok_or(ParseError::UnexpectedEnd)
    }

    /// A plain decimal number; scientific notation is rejected, matching
    /// the consumer.
    pub fn read_number(&mut self) -> Result<f64, ParseError> {
        let text = self.read_scalar()?;
        if text.contains(['e', 'E']) {
            return Err(ParseError::InvalidNumber(text));
        }
        text.parse().map_err(|_| ParseError::InvalidNumber(text))
    }

    pub fn read_count(&mut self) -> Result<usize, ParseError> {
        let text = self.read_scalar()?;
        text.parse().map_err(|_| ParseError::InvalidCount(text))
    }

    pub fn read_flag(&mut self) -> Result<bool, ParseError> {
        let text = self.read_scalar()?;
        match text.as_str() {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(ParseError::InvalidFlag(text)),
        }
    }

    /// A localised string frame: `key US value`, where an unresolved value
    /// is the sentinel `Unknown key: "<key>"`.
    pub fn read_localised(&mut self) -> Result<LocalisedString, ParseError> {
        let text = self.read_scalar()?;
        let mut parts = text.split('\u{1f}');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseError::MalformedLocalised(text));
        };

        let unresolved = value == format!("Unknown key: \"{key}\"");
        Ok(if unresolved {
            LocalisedString::key_only(key)
        } else {
            LocalisedString::resolved(key, value)
        })
    }

    pub fn read_allowed_effects(&mut self) -> Result<AllowedEffects, ParseError> {
        let text = self.read_scalar()?;
        let bytes = text.as_bytes();
        if bytes.len() != 4 || bytes.iter().any(|b| !matches!(b, b'0' | b'1')) {
            return Err(ParseError::InvalidEffectBits(text));
        }
        Ok(AllowedEffects {
            consumption: bytes[0] == b'1',
            speed: bytes[1] == b'1',
            productivity: bytes[2] == b'1',
            pollution: bytes[3] == b'1',
        })
    }

    /// Frames not yet consumed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_between_markers_only() {
        let stream = b"noise\x01junk\x02one\x03more junk\x02two\x03\x04trailing";
        let mut reader = FramedReader::from_bytes(stream).unwrap();
        assert_eq!(reader.read_scalar().unwrap(), "one");
        assert_eq!(reader.read_scalar().unwrap(), "two");
        assert!(matches!(
            reader.read_scalar(),
            Err(ParseError::UnexpectedEnd)
        ));
    }

    #[test]
    fn missing_markers_rejected() {
        assert!(matches!(
            FramedReader::from_bytes(b"\x02a\x03\x04"),
            Err(ParseError::MissingStartMarker)
        ));
        assert!(matches!(
            FramedReader::from_bytes(b"\x01\x02a\x03"),
            Err(ParseError::MissingEndMarker)
        ));
    }

    #[test]
    fn end_marker_before_start_rejected() {
        assert!(matches!(
            FramedReader::from_bytes(b"\x04junk\x01"),
            Err(ParseError::MissingEndMarker)
        ));
        assert!(matches!(
            FramedReader::from_bytes(b"\x04\x02a\x03\x01\x02b\x03"),
            Err(ParseError::MissingEndMarker)
        ));
    }

    #[test]
    fn scientific_notation_rejected() {
        let mut reader = FramedReader::from_bytes(b"\x01\x021.5e3\x03\x04").unwrap();
        assert!(matches!(
            reader.read_number(),
            Err(ParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn localised_sentinel_maps_to_unresolved() {
        let stream = "\x01\x02k\u{1f}Unknown key: \"k\"\x03\x02k\u{1f}Value\x03\x04";
        let mut reader = FramedReader::from_bytes(stream.as_bytes()).unwrap();
        assert_eq!(reader.read_localised().unwrap(), LocalisedString::key_only("k"));
        assert_eq!(
            reader.read_localised().unwrap(),
            LocalisedString::resolved("k", "Value")
        );
    }

    #[test]
    fn localised_with_extra_parts_rejected() {
        let stream = "\x01\x02a\u{1f}b\u{1f}c\x03\x04";
        let mut reader = FramedReader::from_bytes(stream.as_bytes()).unwrap();
        assert!(matches!(
            reader.read_localised(),
            Err(ParseError::MalformedLocalised(_))
        ));
    }

    #[test]
    fn effect_bits_decode() {
        let mut reader = FramedReader::from_bytes(b"\x01\x021010\x03\x02abcd\x03\x04").unwrap();
        let effects = reader.read_allowed_effects().unwrap();
        assert!(effects.consumption && effects.productivity);
        assert!(!effects.speed && !effects.pollution);
        assert!(matches!(
            reader.read_allowed_effects(),
            Err(ParseError::InvalidEffectBits(_))
        ));
    }
}
