//! Byte-level framing: control bytes and the [`FramedWriter`].

use graphio_core::prototype::LocalisedString;
use std::io::{self, Write};

/// Opens the document.
pub const DOC_START: u8 = 0x01;
/// Opens a frame.
pub const STRING_START: u8 = 0x02;
/// Closes a frame.
pub const STRING_END: u8 = 0x03;
/// Closes the document. Its presence is the "run completed" signal.
pub const DOC_END: u8 = 0x04;
/// Separates the parts of a localised string and of the header record.
pub const FIELD_SEP: u8 = 0x1f;

/// Bytes that may never appear inside payload text.
pub const RESERVED: [u8; 5] = [DOC_START, STRING_START, STRING_END, DOC_END, FIELD_SEP];

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Payload text contained one of the protocol's control bytes. There is
    /// no escaping mechanism, so this is unrepresentable and fatal.
    #[error("reserved control byte {byte:#04x} in payload {text:?}")]
    ReservedByte { byte: u8, text: String },
    /// NaN and infinities have no decimal rendering the consumer accepts.
    #[error("non-finite number in export data")]
    NonFiniteNumber,
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn check_payload(text: &str) -> Result<(), WireError> {
    match text.bytes().find(|byte| RESERVED.contains(byte)) {
        Some(byte) => Err(WireError::ReservedByte {
            byte,
            text: text.to_string(),
        }),
        None => Ok(()),
    }
}

/// Renders an `f64` the way the consumer can read it back: plain decimal
/// notation. Rust's `Display` for floats never produces an exponent, so
/// only non-finite values need rejecting.
fn render_number(value: f64) -> Result<String, WireError> {
    if !value.is_finite() {
        return Err(WireError::NonFiniteNumber);
    }
    Ok(value.to_string())
}

/// Writes one framed document to an underlying byte sink.
///
/// Typed write methods frame each value; the caller is responsible for
/// field order. Nothing is buffered here, so wrap the sink in a
/// `BufWriter` when it is a file.
pub struct FramedWriter<W: Write> {
    inner: W,
}

impl<W: Write> FramedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn begin_document(&mut self) -> Result<(), WireError> {
        self.inner.write_all(&[DOC_START])?;
        Ok(())
    }

    /// Write the terminal marker and flush. Only call once everything else
    /// has been written; a missing marker tells the consumer the run died.
    pub fn end_document(&mut self) -> Result<(), WireError> {
        self.inner.write_all(&[DOC_END])?;
        self.inner.flush()?;
        Ok(())
    }

    fn frame(&mut self, payload: &str) -> Result<(), WireError> {
        self.inner.write_all(&[STRING_START])?;
        self.inner.write_all(payload.as_bytes())?;
        self.inner.write_all(&[STRING_END])?;
        Ok(())
    }

    /// One text value in its own frame.
    pub fn write_str(&mut self, text: &str) -> Result<(), WireError> {
        check_payload(text)?;
        self.frame(text)
    }

    /// One finite number in plain decimal notation.
    pub fn write_number(&mut self, value: f64) -> Result<(), WireError> {
        let rendered = render_number(value)?;
        self.frame(&rendered)
    }

    /// One non-negative count.
    pub fn write_count(&mut self, count: usize) -> Result<(), WireError> {
        self.frame(&count.to_string())
    }

    /// One boolean as `1` or `0`.
    pub fn write_flag(&mut self, flag: bool) -> Result<(), WireError> {
        self.frame(if flag { "1" } else { "0" })
    }

    /// A localised string as `key US value` in a single frame. An
    /// unresolved value is rendered as the consumer's unresolved-lookup
    /// sentinel, `Unknown key: "<key>"`.
    pub fn write_localised(&mut self, localised: &LocalisedString) -> Result<(), WireError> {
        check_payload(&localised.key)?;
        let value = match &localised.value {
            Some(value) => {
                check_payload(value)?;
                value.clone()
            }
            None => format!("Unknown key: \"{}\"", localised.key),
        };
        let payload = format!("{}\u{1f}{}", localised.key, value);
        self.frame(&payload)
    }

    /// The header record: counts joined by the field separator in a single
    /// frame.
    pub fn write_counts(&mut self, counts: &[usize]) -> Result<(), WireError> {
        let payload = counts
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join("\u{1f}");
        self.frame(&payload)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
