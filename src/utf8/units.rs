use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

pub(crate) const REPLACEMENT_CHARACTER: u16 = 0xFFFD;

/// A source of UTF-16 code units which can be rewound to a byte offset.
///
/// This is the seam between the validating [`super::Utf8Decoder`] and whatever
/// does the actual decoding work. Malformed input shows up as
/// [`REPLACEMENT_CHARACTER`], never as an error.
pub(crate) trait UnitStream {
    /// Byte offset the next unit will be decoded from.
    fn position(&mut self) -> io::Result<u64>;

    fn next_unit(&mut self) -> io::Result<Option<u16>>;

    /// Reads the single raw byte at `at`.
    fn byte_at(&mut self, at: u64) -> io::Result<u8>;

    /// Drops all decoding state and continues decoding from `at`.
    fn resync(&mut self, at: u64) -> io::Result<()>;
}

/// Strict UTF-8 to UTF-16 decoding on top of a seekable byte source.
///
/// Overlong forms, encoded surrogates, values past U+10FFFF, stray
/// continuation bytes and truncated sequences all decode to U+FFFD.
pub(crate) struct Utf8Units<R> {
    inner: BufReader<R>,
    low: Option<u16>,
}

impl<R: Read + Seek> Utf8Units<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            low: None,
        }
    }

    fn peek(&mut self) -> io::Result<Option<u8>> {
        Ok(self.inner.fill_buf()?.first().copied())
    }

    fn next_scalar(&mut self) -> io::Result<Option<u32>> {
        let Some(lead) = self.peek()? else {
            return Ok(None);
        };
        self.inner.consume(1);

        let (len, mut scalar) = match lead {
            0x00..=0x7F => return Ok(Some(u32::from(lead))),
            0xC2..=0xDF => (2, u32::from(lead & 0x1F)),
            0xE0..=0xEF => (3, u32::from(lead & 0x0F)),
            0xF0..=0xF4 => (4, u32::from(lead & 0x07)),
            _ => return Ok(Some(u32::from(REPLACEMENT_CHARACTER))),
        };

        for i in 1..len {
            // the second byte rules out overlong forms, surrogates and anything past U+10FFFF
            let accepted = match (i, lead) {
                (1, 0xE0) => 0xA0..=0xBF,
                (1, 0xED) => 0x80..=0x9F,
                (1, 0xF0) => 0x90..=0xBF,
                (1, 0xF4) => 0x80..=0x8F,
                _ => 0x80..=0xBF,
            };
            match self.peek()? {
                Some(byte) if accepted.contains(&byte) => {
                    self.inner.consume(1);
                    scalar = (scalar << 6) | u32::from(byte & 0x3F);
                }
                _ => return Ok(Some(u32::from(REPLACEMENT_CHARACTER))),
            }
        }

        Ok(Some(scalar))
    }
}

impl<R: Read + Seek> UnitStream for Utf8Units<R> {
    fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    fn next_unit(&mut self) -> io::Result<Option<u16>> {
        if let Some(low) = self.low.take() {
            return Ok(Some(low));
        }

        let Some(scalar) = self.next_scalar()? else {
            return Ok(None);
        };

        if scalar < 0x1_0000 {
            return Ok(Some(scalar as u16));
        }

        let supplementary = scalar - 0x1_0000;
        self.low = Some(0xDC00 | (supplementary & 0x3FF) as u16);
        Ok(Some(0xD800 | (supplementary >> 10) as u16))
    }

    fn byte_at(&mut self, at: u64) -> io::Result<u8> {
        self.low = None;
        self.inner.seek(SeekFrom::Start(at))?;
        let mut byte = [0u8; 1];
        self.inner.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn resync(&mut self, at: u64) -> io::Result<()> {
        self.low = None;
        self.inner.seek(SeekFrom::Start(at))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn all_units(data: &[u8]) -> Vec<u16> {
        let mut units = Utf8Units::new(Cursor::new(data));
        let mut result = Vec::new();
        while let Some(unit) = units.next_unit().unwrap() {
            result.push(unit);
        }
        result
    }

    mod next_unit {
        use super::*;

        #[test]
        fn test_decodes_bmp_characters() {
            let expected: Vec<u16> = "aé€".encode_utf16().collect();
            assert_eq!(all_units("aé€".as_bytes()), expected);
        }

        #[test]
        fn test_splits_supplementary_characters_into_surrogates() {
            assert_eq!(all_units("😀".as_bytes()), vec![0xD83D, 0xDE00]);
        }

        #[test]
        fn test_overlong_encoding_is_replaced() {
            assert_eq!(
                all_units(&[b'a', 0xC0, 0xA0, b'b']),
                vec![u16::from(b'a'), REPLACEMENT_CHARACTER, REPLACEMENT_CHARACTER, u16::from(b'b')]
            );
        }

        #[test]
        fn test_truncated_sequence_is_replaced_once() {
            assert_eq!(
                all_units(&[b'a', 0xE2, 0x82, b'b']),
                vec![u16::from(b'a'), REPLACEMENT_CHARACTER, u16::from(b'b')]
            );
        }

        #[test]
        fn test_encoded_surrogate_is_rejected() {
            assert_eq!(all_units(&[0xED, 0xA0, 0x80])[0], REPLACEMENT_CHARACTER);
        }

        #[test]
        fn test_values_past_unicode_range_are_rejected() {
            assert_eq!(all_units(&[0xF4, 0x90, 0x80, 0x80])[0], REPLACEMENT_CHARACTER);
            assert_eq!(all_units(&[0xF5])[0], REPLACEMENT_CHARACTER);
        }
    }

    mod recovery {
        use super::*;

        #[test]
        fn test_byte_at_reads_raw_byte() {
            let mut units = Utf8Units::new(Cursor::new(vec![b'a', 0xC0, b'b']));
            assert_eq!(units.next_unit().unwrap(), Some(u16::from(b'a')));
            assert_eq!(units.byte_at(1).unwrap(), 0xC0);
        }

        #[test]
        fn test_byte_at_past_end_fails() {
            let mut units = Utf8Units::new(Cursor::new(vec![b'a']));
            assert!(units.byte_at(1).is_err());
        }

        #[test]
        fn test_resync_restarts_decoding_and_drops_pending_half() {
            let mut units = Utf8Units::new(Cursor::new("😀x".as_bytes()));
            assert_eq!(units.next_unit().unwrap(), Some(0xD83D));
            units.resync(4).unwrap();
            assert_eq!(units.position().unwrap(), 4);
            assert_eq!(units.next_unit().unwrap(), Some(u16::from(b'x')));
            assert_eq!(units.next_unit().unwrap(), None);
        }
    }
}
