use std::borrow::Cow;

use thiserror::Error;

/// Errors produced while turning hex text into bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HexError {
    /// A character outside `[0-9a-fA-F]` was found at `index`.
    #[error("invalid hex character {ch:?} at index {index}")]
    InvalidHexCharacter {
        /// The offending character.
        ch: char,
        /// Character offset in the original (unpadded) text.
        index: usize,
    },
    /// The decoded bytes would not fit in the caller's capacity.
    #[error("decoded length {needed} exceeds capacity {capacity}")]
    BufferTooSmall {
        /// Number of bytes the text decodes to.
        needed: usize,
        /// Number of bytes the caller accepts.
        capacity: usize,
    },
}

impl From<hex::FromHexError> for HexError {
    fn from(err: hex::FromHexError) -> Self {
        match err {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                HexError::InvalidHexCharacter { ch: c, index }
            }
            // decode() pads odd input and sizes the output itself, so the
            // length variants cannot reach this point.
            _ => HexError::InvalidHexCharacter { ch: '?', index: 0 },
        }
    }
}

/// decode converts hex text into at most `capacity` bytes.
///
/// Odd-length text is read as if a leading `'0'` were present, so `"abc"`
/// decodes to `[0x0a, 0xbc]`.
pub fn decode(text: &str, capacity: usize) -> Result<Vec<u8>, HexError> {
    if let Some((index, ch)) = text.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(HexError::InvalidHexCharacter { ch, index });
    }

    let padded: Cow<str> = if text.len() % 2 != 0 {
        Cow::Owned(format!("0{}", text))
    } else {
        Cow::Borrowed(text)
    };

    let needed = padded.len() / 2;
    if needed > capacity {
        return Err(HexError::BufferTooSmall { needed, capacity });
    }

    let mut out = vec![0u8; needed];
    hex::decode_to_slice(padded.as_bytes(), &mut out)?;
    Ok(out)
}

/// encode returns the lowercase hex form of `bytes`, two characters per byte.
pub fn encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
