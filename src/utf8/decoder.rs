use log::{debug, warn};

use std::io::{Read, Seek};
use std::ops::ControlFlow;

use super::units::{UnitStream, Utf8Units, REPLACEMENT_CHARACTER};
use super::{DecodeError, DecodeSink, DecodeStatus};

/// Number of bytes a valid UTF-8 encoding of `scalar` takes up.
///
/// `None` means the decoding primitive gave up on the input: either it
/// produced the replacement character or something outside of Unicode.
fn sequence_length(scalar: u32) -> Option<u64> {
    match scalar {
        s if s == u32::from(REPLACEMENT_CHARACTER) => None,
        0..=0x7F => Some(1),
        0x80..=0x7FF => Some(2),
        0x800..=0xFFFF => Some(3),
        0x1_0000..=0x10_FFFF => Some(4),
        _ => None,
    }
}

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

fn combine_surrogates(high: u16, low: u16) -> u32 {
    0x1_0000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Assembly {
    Clear,
    High,
    Low,
    SurrogatePair,
}

impl Assembly {
    fn has_high(self) -> bool {
        matches!(self, Assembly::High | Assembly::SurrogatePair)
    }

    fn has_low(self) -> bool {
        matches!(self, Assembly::Low | Assembly::SurrogatePair)
    }
}

enum Step {
    Continue,
    Malformed,
    Cancel,
}

/// Validating UTF-8 decoder.
///
/// Unlike a lossy decoder it never substitutes or drops bytes: every byte of
/// the input is either part of a character handed to the sink, or part of
/// exactly one reported invalid run.
#[derive(Debug)]
pub struct Utf8Decoder;

impl Utf8Decoder {
    /// Reads UTF-8 encoded text from `input` until it is exhausted.
    ///
    /// Offsets reported to the sink are relative to the position `input` has
    /// when handed over. Running into malformed UTF-8 is not an error; an
    /// `Err` is only returned when seeking or reading `input` fails.
    pub fn consume<R, S>(input: R, sink: &mut S) -> Result<DecodeStatus, DecodeError>
    where
        R: Read + Seek,
        S: DecodeSink + ?Sized,
    {
        Decoding::new(Utf8Units::new(input)).run(sink)
    }
}

struct Decoding<U> {
    units: U,
    /// Position of the input when decoding started
    offset: u64,
    /// Bytes consumed so far, invalid runs are only accounted for once flushed
    count: u64,
    invalid: Vec<u8>,
    saw_invalid: bool,
    assembly: Assembly,
    high: u16,
    low: u16,
}

impl<U: UnitStream> Decoding<U> {
    fn new(units: U) -> Self {
        Self {
            units,
            offset: 0,
            count: 0,
            invalid: Vec::new(),
            saw_invalid: false,
            assembly: Assembly::Clear,
            high: 0,
            low: 0,
        }
    }

    fn run<S>(mut self, sink: &mut S) -> Result<DecodeStatus, DecodeError>
    where
        S: DecodeSink + ?Sized,
    {
        self.offset = match self.units.position() {
            Ok(offset) => offset,
            Err(e) => {
                warn!("unable to determine input position: {e}");
                sink.finished(DecodeStatus::Failed);
                return Err(DecodeError::Position(e));
            }
        };

        loop {
            let location = self.location();

            let step = match self.units.next_unit() {
                Ok(Some(unit)) => self.assemble(unit, sink),
                Ok(None) if self.assembly == Assembly::Clear => break,
                // a dangling surrogate half at the end of input
                Ok(None) => Step::Malformed,
                Err(source) => {
                    return Err(self.fail(sink, DecodeError::Read { offset: location, source }))
                }
            };

            match step {
                Step::Continue => continue,
                Step::Cancel => return Ok(Self::cancel(sink, location)),
                Step::Malformed => {
                    if let Err(e) = self.recover(location) {
                        return Err(self.fail(sink, e));
                    }
                }
            }
        }

        // input may end with an invalid run
        let location = self.location();
        if self.flush_invalid(sink).is_break() {
            return Ok(Self::cancel(sink, location));
        }

        let status = if self.saw_invalid {
            DecodeStatus::DoneWithInvalidBytes
        } else {
            DecodeStatus::Done
        };
        sink.finished(status);

        Ok(status)
    }

    fn cancel<S>(sink: &mut S, location: u64) -> DecodeStatus
    where
        S: DecodeSink + ?Sized,
    {
        debug!("decoding cancelled at offset {location}");
        sink.finished(DecodeStatus::Cancelled);
        DecodeStatus::Cancelled
    }

    /// Absolute offset of the first byte not yet accounted for.
    fn location(&self) -> u64 {
        self.offset + self.count + self.invalid.len() as u64
    }

    fn assemble<S>(&mut self, unit: u16, sink: &mut S) -> Step
    where
        S: DecodeSink + ?Sized,
    {
        let previous = self.assembly;

        if is_high_surrogate(unit) && !self.assembly.has_high() {
            self.assembly = match self.assembly {
                Assembly::Clear => Assembly::High,
                _ => Assembly::SurrogatePair,
            };
            self.high = unit;
        }
        if is_low_surrogate(unit) && !self.assembly.has_low() {
            self.assembly = match self.assembly {
                Assembly::Clear => Assembly::Low,
                _ => Assembly::SurrogatePair,
            };
            self.low = unit;
        }

        match self.assembly {
            Assembly::SurrogatePair => {
                let Some(size) = sequence_length(combine_surrogates(self.high, self.low)) else {
                    return Step::Malformed;
                };
                if self.flush_invalid(sink).is_break() {
                    return Step::Cancel;
                }

                let (first, second) = if previous == Assembly::High {
                    debug!("pushing high-low surrogate pair");
                    (self.high, self.low)
                } else {
                    debug!("pushing low-high surrogate pair");
                    (self.low, self.high)
                };
                self.assembly = Assembly::Clear;
                self.count += size;

                match sink.pair(first, second) {
                    ControlFlow::Continue(()) => Step::Continue,
                    ControlFlow::Break(()) => Step::Cancel,
                }
            }
            Assembly::Clear => {
                let Some(size) = sequence_length(u32::from(unit)) else {
                    return Step::Malformed;
                };
                if self.flush_invalid(sink).is_break() {
                    return Step::Cancel;
                }
                self.count += size;

                match sink.character(unit) {
                    ControlFlow::Continue(()) => Step::Continue,
                    ControlFlow::Break(()) => Step::Cancel,
                }
            }
            // only half of a pair so far, the next unit should complete it
            _ if previous == Assembly::Clear => Step::Continue,
            // two halves of the same kind in a row
            _ => Step::Malformed,
        }
    }

    /// Moves the byte at `location` into the pending invalid run and resumes
    /// decoding right after it.
    fn recover(&mut self, location: u64) -> Result<(), DecodeError> {
        self.assembly = Assembly::Clear;

        let byte = self
            .units
            .byte_at(location)
            .map_err(|source| DecodeError::Recovery { offset: location, source })?;
        self.invalid.push(byte);
        self.saw_invalid = true;

        self.units
            .resync(location + 1)
            .map_err(|source| DecodeError::Recovery { offset: location + 1, source })
    }

    fn flush_invalid<S>(&mut self, sink: &mut S) -> ControlFlow<()>
    where
        S: DecodeSink + ?Sized,
    {
        if self.invalid.is_empty() {
            return ControlFlow::Continue(());
        }

        let relative = self.count;
        let absolute = self.offset + self.count;
        debug!(
            "found {} invalid byte(s) at offset {absolute}",
            self.invalid.len()
        );

        let flow = sink.invalid_bytes(&self.invalid, relative, absolute);
        self.count += self.invalid.len() as u64;
        self.invalid.clear();
        flow
    }

    fn fail<S>(&mut self, sink: &mut S, error: DecodeError) -> DecodeError
    where
        S: DecodeSink + ?Sized,
    {
        warn!("{error}");
        if let DecodeError::Recovery { offset, .. } = &error {
            sink.recovery_error(*offset);
        }
        sink.finished(DecodeStatus::Failed);
        error
    }
}
