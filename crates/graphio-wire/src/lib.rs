//! The control-byte framed export stream.
//!
//! The export format is a flat sequence of text frames inside a single
//! document. A frame is `STX payload ETX`; the document is bracketed by
//! `SOH` and `EOT` so a consumer can fish it out of a noisy stdout
//! capture. Bytes between frames are ignored. The only structure inside a
//! payload is the unit separator, used by localised strings and the
//! header record.
//!
//! [`frame`] holds the byte-level writer, [`emit`] the document schema
//! over a [`graphio_core::view::PrunedView`], and [`parse`] a decoder
//! that mirrors the downstream consumer, used for round-trip testing.

pub mod emit;
pub mod frame;
pub mod parse;
