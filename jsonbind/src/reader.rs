use std::fmt::Debug;
use std::io::{BufReader, ErrorKind, Read};

use crate::Error;

/// A byte source that can look one byte ahead.
pub trait Reader {
    /// Returns the next byte without consuming it, or `None` at the end of
    /// the input.
    fn peek_byte(&mut self) -> Result<Option<u8>, Error>;

    /// Consumes and returns the next byte, or `None` at the end of the input.
    fn next_byte(&mut self) -> Result<Option<u8>, Error>;

    /// The number of bytes consumed so far.
    fn offset(&self) -> usize;
}

/// Reads data from a slice.
#[allow(clippy::module_name_repetitions)]
pub struct SliceReader<'a> {
    pub(crate) data: &'a [u8],
    consumed: usize,
}

impl<'a> Debug for SliceReader<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceReader")
            .field(
                "preview",
                &String::from_utf8_lossy(&self.data[..16.min(self.data.len())]),
            )
            .field("consumed", &self.consumed)
            .finish()
    }
}

impl<'a> From<&'a [u8]> for SliceReader<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self { data, consumed: 0 }
    }
}

impl<'a> From<&'a str> for SliceReader<'a> {
    fn from(data: &'a str) -> Self {
        Self::from(data.as_bytes())
    }
}

impl<'a> Reader for SliceReader<'a> {
    #[inline]
    fn peek_byte(&mut self) -> Result<Option<u8>, Error> {
        Ok(self.data.first().copied())
    }

    #[inline]
    fn next_byte(&mut self) -> Result<Option<u8>, Error> {
        if let Some((first, remaining)) = self.data.split_first() {
            self.data = remaining;
            self.consumed += 1;
            Ok(Some(*first))
        } else {
            Ok(None)
        }
    }

    #[inline]
    fn offset(&self) -> usize {
        self.consumed
    }
}

/// A reader over [`Read`].
#[allow(clippy::module_name_repetitions)]
pub struct IoReader<R: Read> {
    reader: BufReader<R>,
    peeked: Option<u8>,
    consumed: usize,
}

impl<R: Read> IoReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            peeked: None,
            consumed: 0,
        }
    }

    fn read_one(&mut self) -> Result<Option<u8>, Error> {
        let mut byte = [0_u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::from(err)),
            }
        }
    }
}

impl<R: Read> Debug for IoReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoReader")
            .field("peeked", &self.peeked)
            .field("consumed", &self.consumed)
            .finish()
    }
}

impl<R: Read> Reader for IoReader<R> {
    fn peek_byte(&mut self) -> Result<Option<u8>, Error> {
        if self.peeked.is_none() {
            self.peeked = self.read_one()?;
        }
        Ok(self.peeked)
    }

    fn next_byte(&mut self) -> Result<Option<u8>, Error> {
        let byte = match self.peeked.take() {
            Some(byte) => Some(byte),
            None => self.read_one()?,
        };
        if byte.is_some() {
            self.consumed += 1;
        }
        Ok(byte)
    }

    fn offset(&self) -> usize {
        self.consumed
    }
}
