mod decoder;
mod units;

pub use self::decoder::Utf8Decoder;

use std::io;
use std::ops::ControlFlow;

/// How a call to [`Utf8Decoder::consume`] ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeStatus {
    /// Input was consumed and all of it was valid UTF-8.
    Done,
    /// Input was consumed, but at least one invalid byte run was reported.
    DoneWithInvalidBytes,
    /// An I/O operation failed. Input may be partially consumed.
    Failed,
    /// A sink asked the decoder to stop.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unable to determine the position of the input: {0}")]
    Position(#[source] io::Error),
    #[error("error recovery failed at offset {offset}: {source}")]
    Recovery {
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error("reading input failed at offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },
}

impl DecodeError {
    /// Absolute offset in the input at which the failure happened, if known.
    pub fn offset(&self) -> Option<u64> {
        match self {
            DecodeError::Position(_) => None,
            DecodeError::Recovery { offset, .. } | DecodeError::Read { offset, .. } => {
                Some(*offset)
            }
        }
    }
}

/// A maximal run of bytes which could not be decoded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InvalidBytes {
    pub bytes: Vec<u8>,
    /// Offset relative to the position the input had when decoding started
    pub relative_offset: u64,
    pub absolute_offset: u64,
}

/// Receives everything the [`Utf8Decoder`] finds, in input order.
///
/// Characters are delivered as UTF-16 code units. Characters outside of the
/// Basic Multilingual Plane arrive as a correlated surrogate pair through
/// [`DecodeSink::pair`], in the order the halves were encountered.
///
/// Returning [`ControlFlow::Break`] from any of the data callbacks stops the
/// decoder, which then finishes with [`DecodeStatus::Cancelled`].
pub trait DecodeSink {
    fn character(&mut self, unit: u16) -> ControlFlow<()>;

    fn pair(&mut self, first: u16, second: u16) -> ControlFlow<()>;

    fn invalid_bytes(
        &mut self,
        _bytes: &[u8],
        _relative_offset: u64,
        _absolute_offset: u64,
    ) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called when seeking or re-reading the input during error recovery fails,
    /// right before `finished(Failed)`.
    fn recovery_error(&mut self, _offset: u64) {}

    fn finished(&mut self, _status: DecodeStatus) {}
}

impl<S: DecodeSink + ?Sized> DecodeSink for &mut S {
    fn character(&mut self, unit: u16) -> ControlFlow<()> {
        (**self).character(unit)
    }

    fn pair(&mut self, first: u16, second: u16) -> ControlFlow<()> {
        (**self).pair(first, second)
    }

    fn invalid_bytes(
        &mut self,
        bytes: &[u8],
        relative_offset: u64,
        absolute_offset: u64,
    ) -> ControlFlow<()> {
        (**self).invalid_bytes(bytes, relative_offset, absolute_offset)
    }

    fn recovery_error(&mut self, offset: u64) {
        (**self).recovery_error(offset)
    }

    fn finished(&mut self, status: DecodeStatus) {
        (**self).finished(status)
    }
}
