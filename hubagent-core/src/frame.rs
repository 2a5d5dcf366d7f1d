//! Serial line assembly
//!
//! The serial link delivers bytes in arbitrary chunks. [`FrameAssembler`]
//! accumulates them in a fixed buffer and yields each complete `\n`
//! terminated line. A line longer than the buffer is discarded up to its
//! terminator instead of being truncated into something that might still
//! decode; lines that are not UTF-8 are dropped the same way.

use heapless::Vec;

use crate::constants::FRAME_CAPACITY;

/// Incremental, bounded line framer for the serial link
#[derive(Debug, Clone, Default)]
pub struct FrameAssembler<const N: usize = FRAME_CAPACITY> {
    buf: Vec<u8, N>,
    /// Current line overran the buffer; skip to the next terminator
    overflowed: bool,
    dropped: u32,
}

impl<const N: usize> FrameAssembler<N> {
    /// Empty assembler
    pub const fn new() -> Self {
        Self { buf: Vec::new(), overflowed: false, dropped: 0 }
    }

    /// Feed a chunk of serial bytes, calling `on_line` for every complete
    /// line (terminator excluded)
    pub fn feed<F: FnMut(&str)>(&mut self, bytes: &[u8], mut on_line: F) {
        for &byte in bytes {
            if byte != b'\n' {
                if !self.overflowed && self.buf.push(byte).is_err() {
                    self.overflowed = true;
                }
                continue;
            }

            if self.overflowed {
                self.dropped = self.dropped.wrapping_add(1);
                log_warn!("Dropping serial line longer than {} bytes", N);
            } else {
                match core::str::from_utf8(&self.buf) {
                    Ok(line) => on_line(line),
                    Err(_) => {
                        self.dropped = self.dropped.wrapping_add(1);
                        log_warn!("Dropping non-UTF-8 serial line");
                    }
                }
            }
            self.buf.clear();
            self.overflowed = false;
        }
    }

    /// Lines discarded for overflow or bad encoding since start-up
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Bytes of the current, unterminated line
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
