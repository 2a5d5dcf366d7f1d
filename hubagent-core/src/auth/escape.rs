//! URL component escaping into bounded buffers
//!
//! RFC 3986 unreserved characters (`A-Z a-z 0-9 - _ . ~`) pass through;
//! every other byte becomes `%XX` with upper-case hex. This is the escaping
//! the hub applies when it recomputes the signature, so it must match byte
//! for byte.

use heapless::String;

use crate::errors::SignError;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

/// Append the escaped form of `input` to `out`
pub(crate) fn escape_into<const N: usize>(input: &[u8], out: &mut String<N>) -> Result<(), SignError> {
    for &byte in input {
        if is_unreserved(byte) {
            push(out, byte)?;
        } else {
            push(out, b'%')?;
            push(out, HEX[usize::from(byte >> 4)])?;
            push(out, HEX[usize::from(byte & 0x0F)])?;
        }
    }
    Ok(())
}

fn push<const N: usize>(out: &mut String<N>, byte: u8) -> Result<(), SignError> {
    out.push(char::from(byte))
        .map_err(|_| SignError::SignatureBufferTooSmall)
}
