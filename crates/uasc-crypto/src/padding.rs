//! Block-cipher padding footer
//!
//! ```text
//! Single:   [P; P][P]             P = padding size, last byte is the length field
//! Extended: [P & 0xFF; P][P & 0xFF][P >> 8]
//! ```
//!
//! `body || footer || signature` is always a multiple of the block size.

use uasc_core::{UascError, UascResult};

/// Width of the padding-length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingScheme {
    /// One length byte
    Single,
    /// Two length bytes, little-endian; for asymmetric keys above 2048 bits
    Extended,
}

impl PaddingScheme {
    /// Pick the scheme for an asymmetric key of `key_bits` bits.
    pub fn for_key_size(key_bits: usize) -> Self {
        if key_bits > 2048 {
            PaddingScheme::Extended
        } else {
            PaddingScheme::Single
        }
    }

    pub fn length_field_size(self) -> usize {
        match self {
            PaddingScheme::Single => 1,
            PaddingScheme::Extended => 2,
        }
    }

    /// Largest block size whose padding counts fit the length field
    pub fn max_block_size(self) -> usize {
        match self {
            PaddingScheme::Single => 1 << 8,
            PaddingScheme::Extended => 1 << 16,
        }
    }
}

/// Padding bytes plus the length field, ready to append to a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddingFooter {
    padding_size: usize,
    bytes: Vec<u8>,
}

impl PaddingFooter {
    /// Number of padding bytes, not counting the length field
    pub fn padding_size(&self) -> usize {
        self.padding_size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Number of padding bytes (length field excluded) that aligns
/// `body || footer || signature` to `block_size`.
pub fn padding_size(
    plain_body_len: usize,
    block_size: usize,
    signature_len: usize,
    scheme: PaddingScheme,
) -> usize {
    if block_size == 0 {
        return 0;
    }
    let unpadded = plain_body_len + scheme.length_field_size() + signature_len;
    (block_size - unpadded % block_size) % block_size
}

/// Compute the footer for a body of `plain_body_len` bytes that will be
/// followed by a `signature_len`-byte signature.
///
/// Fails with `CorruptPadding` if the block size is too large for the
/// scheme's length field.
pub fn compute_padding_footer(
    plain_body_len: usize,
    block_size: usize,
    signature_len: usize,
    scheme: PaddingScheme,
) -> UascResult<PaddingFooter> {
    check_block_size(block_size, scheme)?;
    let field_size = scheme.length_field_size();
    let padding_size = padding_size(plain_body_len, block_size, signature_len, scheme);

    let low = (padding_size & 0xFF) as u8;
    let mut bytes = Vec::with_capacity(padding_size + field_size);
    bytes.resize(padding_size + 1, low);
    if scheme == PaddingScheme::Extended {
        bytes.push((padding_size >> 8) as u8);
    }

    Ok(PaddingFooter {
        padding_size,
        bytes,
    })
}

/// Append the padding footer to `body`.
pub fn pad(
    body: &[u8],
    block_size: usize,
    signature_len: usize,
    scheme: PaddingScheme,
) -> UascResult<Vec<u8>> {
    let footer = compute_padding_footer(body.len(), block_size, signature_len, scheme)?;
    let mut padded = Vec::with_capacity(body.len() + footer.len());
    padded.extend_from_slice(body);
    padded.extend_from_slice(footer.as_bytes());
    Ok(padded)
}

/// Strip the padding footer from `bytes` (signature already removed).
///
/// A padding size of exactly one block is accepted: some peers add a whole
/// block when the data is already aligned. Block alignment of the buffer
/// itself is not checked here; once the signature is stripped it is the
/// caller's job (the cipher rejects misaligned ciphertext).
pub fn remove_padding(bytes: &[u8], block_size: usize, scheme: PaddingScheme) -> UascResult<&[u8]> {
    check_block_size(block_size, scheme)?;
    let field_size = scheme.length_field_size();
    if bytes.len() < field_size {
        return Err(UascError::CorruptPadding(format!(
            "{} bytes cannot hold a {field_size}-byte length field",
            bytes.len()
        )));
    }

    let (rest, field) = bytes.split_at(bytes.len() - field_size);
    let padding_size = match scheme {
        PaddingScheme::Single => usize::from(field[0]),
        PaddingScheme::Extended => usize::from(u16::from_le_bytes([field[0], field[1]])),
    };

    if padding_size > block_size {
        return Err(UascError::CorruptPadding(format!(
            "padding size {padding_size} exceeds block size {block_size}"
        )));
    }
    if padding_size > rest.len() {
        return Err(UascError::CorruptPadding(format!(
            "padding size {padding_size} exceeds buffer of {} bytes",
            rest.len()
        )));
    }

    let (body, padding) = rest.split_at(rest.len() - padding_size);
    let expected = field[0];
    if padding.iter().any(|&b| b != expected) {
        return Err(UascError::CorruptPadding("padding bytes do not match length field".into()));
    }

    Ok(body)
}

/// Every padding count below `block_size` must fit the length field.
fn check_block_size(block_size: usize, scheme: PaddingScheme) -> UascResult<()> {
    if block_size > scheme.max_block_size() {
        return Err(UascError::CorruptPadding(format!(
            "block size {block_size} needs a wider padding length field than {scheme:?}"
        )));
    }
    Ok(())
}
