//! Serial frame source
//!
//! The sensor controller streams one CSV frame per line. Reads on a serial
//! device (or stdin) block, while the session loop must not, so a reader
//! thread forwards raw chunks over a channel and [`SerialFeed::drain`]
//! applies whatever has arrived at the top of each tick.

use std::io::{ErrorKind, Read};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use log::{debug, warn};

use hubagent_core::{FrameAssembler, StateRecord};

const READ_CHUNK: usize = 128;

/// What one drain did to the record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Frames decoded into the record
    pub applied: u32,
    /// Complete lines that failed to decode
    pub rejected: u32,
}

/// Non-blocking view of a line-oriented serial stream
pub struct SerialFeed {
    chunks: Option<Receiver<Vec<u8>>>,
    assembler: FrameAssembler,
}

impl SerialFeed {
    /// Start a reader thread over `reader`
    pub fn spawn<R: Read + Send + 'static>(reader: R) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("serial-reader".into())
            .spawn(move || read_loop(reader, tx))?;

        Ok(Self { chunks: Some(rx), assembler: FrameAssembler::new() })
    }

    /// Feed with no reader attached; bytes arrive through [`Self::apply`]
    pub fn detached() -> Self {
        Self { chunks: None, assembler: FrameAssembler::new() }
    }

    /// Whether the reader thread is still delivering
    pub fn is_open(&self) -> bool {
        self.chunks.is_some()
    }

    /// Lines dropped by the assembler (overlong or not UTF-8)
    pub fn dropped(&self) -> u32 {
        self.assembler.dropped()
    }

    /// Apply every chunk received so far to `record`
    pub fn drain(&mut self, record: &mut StateRecord) -> FeedSummary {
        let mut summary = FeedSummary::default();

        while let Some(rx) = &self.chunks {
            match rx.try_recv() {
                Ok(chunk) => {
                    let step = self.apply(&chunk, record);
                    summary.applied += step.applied;
                    summary.rejected += step.rejected;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Serial reader finished");
                    self.chunks = None;
                }
            }
        }
        summary
    }

    /// Assemble `bytes` into lines and decode each complete one into `record`
    ///
    /// A bad line is logged and skipped; the record keeps the last good frame.
    pub fn apply(&mut self, bytes: &[u8], record: &mut StateRecord) -> FeedSummary {
        let mut summary = FeedSummary::default();

        self.assembler.feed(bytes, |line| {
            if line.trim().is_empty() {
                return;
            }
            match record.update_from_frame(line) {
                Ok(()) => summary.applied += 1,
                Err(err) => {
                    warn!("Ignoring serial frame: {}", err);
                    summary.rejected += 1;
                }
            }
        });
        summary
    }
}

fn read_loop<R: Read>(mut reader: R, tx: mpsc::Sender<Vec<u8>>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    return;
                }
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => {
                warn!("Serial read failed: {}", err);
                return;
            }
        }
    }
}
