use std::fmt::{self, Display};

use crate::reader::Reader;
use crate::{Error, Result};

/// A single token of a JSON document.
///
/// Events carry no payload. The text of the most recent [`Event::Key`],
/// [`Event::String`] or [`Event::Number`] is available from
/// [`TokenSource::text`] until the next event is read.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Event {
    /// `{`
    StartObject,
    /// `}`
    EndObject,
    /// `[`
    StartArray,
    /// `]`
    EndArray,
    /// An object member name.
    Key,
    /// A string value.
    String,
    /// A number value.
    Number,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
}

impl Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StartObject => "start of object",
            Self::EndObject => "end of object",
            Self::StartArray => "start of array",
            Self::EndArray => "end of array",
            Self::Key => "object key",
            Self::String => "string",
            Self::Number => "number",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
        })
    }
}

/// A pull-based source of JSON events.
pub trait TokenSource {
    /// Reads the next event. Returns `None` once the top-level value has been
    /// fully read.
    fn next_event(&mut self) -> Result<Option<Event>>;

    /// The text of the most recent key, string or number event.
    fn text(&self) -> &str;

    /// The number of input bytes consumed so far.
    fn offset(&self) -> usize;
}

impl<T: TokenSource + ?Sized> TokenSource for &mut T {
    fn next_event(&mut self) -> Result<Option<Event>> {
        (**self).next_event()
    }

    fn text(&self) -> &str {
        (**self).text()
    }

    fn offset(&self) -> usize {
        (**self).offset()
    }
}

/// Reads the next event, treating the end of the stream as an error.
pub fn expect_event(source: &mut dyn TokenSource) -> Result<Event> {
    source.next_event()?.ok_or(Error::Eof)
}

/// Consumes the remainder of a value whose first event was `first`.
pub fn skip_value(source: &mut dyn TokenSource, first: Event) -> Result<()> {
    let mut depth = match first {
        Event::StartObject | Event::StartArray => 1_usize,
        _ => return Ok(()),
    };
    while depth > 0 {
        match expect_event(source)? {
            Event::StartObject | Event::StartArray => depth += 1,
            Event::EndObject | Event::EndArray => depth -= 1,
            _ => {}
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Frame {
    Object,
    Array,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Expect {
    Value,
    ValueOrEnd,
    Key,
    KeyOrEnd,
    CommaOrEnd,
    Done,
}

/// A streaming JSON tokenizer over a [`Reader`].
#[derive(Debug)]
pub struct Parser<R: Reader> {
    reader: R,
    text: String,
    scratch: Vec<u8>,
    frames: Vec<Frame>,
    expect: Expect,
}

impl<R: Reader> Parser<R> {
    /// Returns a parser positioned before the first value in `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            text: String::new(),
            scratch: Vec::new(),
            frames: Vec::new(),
            expect: Expect::Value,
        }
    }

    /// Verifies that only whitespace follows the top-level value.
    pub fn finish(&mut self) -> Result<()> {
        if self.expect != Expect::Done {
            return Err(Error::Eof);
        }
        match self.next_significant()? {
            None => Ok(()),
            Some(_) => Err(Error::TrailingData),
        }
    }

    fn syntax<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(Error::Syntax {
            offset: self.reader.offset(),
            message: message.into(),
        })
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.reader.peek_byte()? {
            self.reader.next_byte()?;
        }
        Ok(())
    }

    fn next_significant(&mut self) -> Result<Option<u8>> {
        self.skip_whitespace()?;
        self.reader.next_byte()
    }

    fn value_finished(&mut self) {
        self.expect = if self.frames.is_empty() {
            Expect::Done
        } else {
            Expect::CommaOrEnd
        };
    }

    fn close(&mut self, frame: Frame) -> Result<Event> {
        if self.frames.pop() != Some(frame) {
            return self.syntax("mismatched closing bracket");
        }
        self.value_finished();
        Ok(match frame {
            Frame::Object => Event::EndObject,
            Frame::Array => Event::EndArray,
        })
    }

    fn read_value(&mut self, first: u8) -> Result<Event> {
        match first {
            b'{' => {
                self.frames.push(Frame::Object);
                self.expect = Expect::KeyOrEnd;
                Ok(Event::StartObject)
            }
            b'[' => {
                self.frames.push(Frame::Array);
                self.expect = Expect::ValueOrEnd;
                Ok(Event::StartArray)
            }
            b'"' => {
                self.read_string()?;
                self.value_finished();
                Ok(Event::String)
            }
            b'-' | b'0'..=b'9' => {
                self.read_number(first)?;
                self.value_finished();
                Ok(Event::Number)
            }
            b't' => self.read_literal(b"rue", Event::True),
            b'f' => self.read_literal(b"alse", Event::False),
            b'n' => self.read_literal(b"ull", Event::Null),
            other => self.syntax(format!("unexpected character {:?}", char::from(other))),
        }
    }

    fn read_literal(&mut self, rest: &[u8], event: Event) -> Result<Event> {
        for expected in rest {
            match self.reader.next_byte()? {
                Some(byte) if byte == *expected => {}
                Some(_) => return self.syntax(format!("invalid literal, expected {event}")),
                None => return Err(Error::Eof),
            }
        }
        self.value_finished();
        Ok(event)
    }

    fn read_digits(&mut self) -> Result<usize> {
        let mut count = 0;
        while let Some(byte @ b'0'..=b'9') = self.reader.peek_byte()? {
            self.reader.next_byte()?;
            self.text.push(char::from(byte));
            count += 1;
        }
        Ok(count)
    }

    fn read_number(&mut self, first: u8) -> Result<()> {
        self.text.clear();
        self.text.push(char::from(first));
        let leading = if first == b'-' {
            match self.reader.next_byte()? {
                Some(digit @ b'0'..=b'9') => {
                    self.text.push(char::from(digit));
                    digit
                }
                Some(_) => return self.syntax("expected digit after minus sign"),
                None => return Err(Error::Eof),
            }
        } else {
            first
        };
        if leading == b'0' {
            if let Some(b'0'..=b'9') = self.reader.peek_byte()? {
                return self.syntax("leading zeros are not allowed");
            }
        } else {
            self.read_digits()?;
        }
        if let Some(b'.') = self.reader.peek_byte()? {
            self.reader.next_byte()?;
            self.text.push('.');
            if self.read_digits()? == 0 {
                return self.syntax("expected digit after decimal point");
            }
        }
        if let Some(exponent @ (b'e' | b'E')) = self.reader.peek_byte()? {
            self.reader.next_byte()?;
            self.text.push(char::from(exponent));
            if let Some(sign @ (b'+' | b'-')) = self.reader.peek_byte()? {
                self.reader.next_byte()?;
                self.text.push(char::from(sign));
            }
            if self.read_digits()? == 0 {
                return self.syntax("expected digit in exponent");
            }
        }
        Ok(())
    }

    fn read_hex_escape(&mut self) -> Result<u16> {
        let mut value = 0_u16;
        for _ in 0..4 {
            let digit = match self.reader.next_byte()? {
                Some(byte @ b'0'..=b'9') => byte - b'0',
                Some(byte @ b'a'..=b'f') => byte - b'a' + 10,
                Some(byte @ b'A'..=b'F') => byte - b'A' + 10,
                Some(_) => return self.syntax("invalid unicode escape"),
                None => return Err(Error::Eof),
            };
            value = (value << 4) | u16::from(digit);
        }
        Ok(value)
    }

    fn read_unicode_escape(&mut self) -> Result<char> {
        let first = self.read_hex_escape()?;
        let code_point = match first {
            0xD800..=0xDBFF => {
                if self.reader.next_byte()? != Some(b'\\') || self.reader.next_byte()? != Some(b'u')
                {
                    return self.syntax("unpaired surrogate in unicode escape");
                }
                let second = self.read_hex_escape()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return self.syntax("invalid low surrogate in unicode escape");
                }
                0x1_0000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00)
            }
            0xDC00..=0xDFFF => return self.syntax("unpaired surrogate in unicode escape"),
            other => u32::from(other),
        };
        match char::from_u32(code_point) {
            Some(ch) => Ok(ch),
            None => self.syntax("invalid unicode escape"),
        }
    }

    fn read_string(&mut self) -> Result<()> {
        self.scratch.clear();
        loop {
            match self.reader.next_byte()? {
                None => return Err(Error::Eof),
                Some(b'"') => break,
                Some(b'\\') => {
                    let unescaped = match self.reader.next_byte()? {
                        Some(b'"') => '"',
                        Some(b'\\') => '\\',
                        Some(b'/') => '/',
                        Some(b'b') => '\u{8}',
                        Some(b'f') => '\u{c}',
                        Some(b'n') => '\n',
                        Some(b'r') => '\r',
                        Some(b't') => '\t',
                        Some(b'u') => self.read_unicode_escape()?,
                        Some(_) => return self.syntax("invalid escape sequence"),
                        None => return Err(Error::Eof),
                    };
                    let mut buffer = [0_u8; 4];
                    self.scratch
                        .extend_from_slice(unescaped.encode_utf8(&mut buffer).as_bytes());
                }
                Some(byte) if byte < 0x20 => {
                    return self.syntax("control character in string");
                }
                Some(byte) => self.scratch.push(byte),
            }
        }
        match std::str::from_utf8(&self.scratch) {
            Ok(text) => {
                self.text.clear();
                self.text.push_str(text);
                Ok(())
            }
            Err(err) => self.syntax(format!("invalid utf-8 in string: {err}")),
        }
    }
}

impl<R: Reader> TokenSource for Parser<R> {
    fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            match self.expect {
                Expect::Done => return Ok(None),
                Expect::Value => match self.next_significant()? {
                    Some(byte) => return self.read_value(byte).map(Some),
                    None => return Err(Error::Eof),
                },
                Expect::ValueOrEnd => match self.next_significant()? {
                    Some(b']') => return self.close(Frame::Array).map(Some),
                    Some(byte) => return self.read_value(byte).map(Some),
                    None => return Err(Error::Eof),
                },
                Expect::Key | Expect::KeyOrEnd => match self.next_significant()? {
                    Some(b'}') if self.expect == Expect::KeyOrEnd => {
                        return self.close(Frame::Object).map(Some);
                    }
                    Some(b'"') => {
                        self.read_string()?;
                        match self.next_significant()? {
                            Some(b':') => {}
                            Some(_) => return self.syntax("expected ':' after object key"),
                            None => return Err(Error::Eof),
                        }
                        self.expect = Expect::Value;
                        return Ok(Some(Event::Key));
                    }
                    Some(_) => return self.syntax("expected object key"),
                    None => return Err(Error::Eof),
                },
                Expect::CommaOrEnd => {
                    let frame = match self.frames.last() {
                        Some(frame) => *frame,
                        None => return self.syntax("value outside of a container"),
                    };
                    match (frame, self.next_significant()?) {
                        (Frame::Object, Some(b',')) => self.expect = Expect::Key,
                        (Frame::Array, Some(b',')) => self.expect = Expect::Value,
                        (Frame::Object, Some(b'}')) => return self.close(Frame::Object).map(Some),
                        (Frame::Array, Some(b']')) => return self.close(Frame::Array).map(Some),
                        (_, Some(_)) => return self.syntax("expected ',' or closing bracket"),
                        (_, None) => return Err(Error::Eof),
                    }
                }
            }
        }
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn offset(&self) -> usize {
        self.reader.offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::SliceReader;

    fn events(json: &str) -> Result<Vec<(Event, String)>> {
        let mut parser = Parser::new(SliceReader::from(json));
        let mut events = Vec::new();
        while let Some(event) = parser.next_event()? {
            let text = match event {
                Event::Key | Event::String | Event::Number => parser.text().to_string(),
                _ => String::new(),
            };
            events.push((event, text));
        }
        parser.finish()?;
        Ok(events)
    }

    #[test]
    fn tokenizes_nested_document() {
        let events = events(r#" {"a": [1, -2.5e3, true], "b": {"c": null}, "d": "x"} "#).unwrap();
        let kinds: Vec<Event> = events.iter().map(|(event, _)| *event).collect();
        assert_eq!(
            kinds,
            vec![
                Event::StartObject,
                Event::Key,
                Event::StartArray,
                Event::Number,
                Event::Number,
                Event::True,
                Event::EndArray,
                Event::Key,
                Event::StartObject,
                Event::Key,
                Event::Null,
                Event::EndObject,
                Event::Key,
                Event::String,
                Event::EndObject,
            ]
        );
        assert_eq!(events[1].1, "a");
        assert_eq!(events[4].1, "-2.5e3");
        assert_eq!(events[13].1, "x");
    }

    #[test]
    fn empty_containers() {
        let kinds: Vec<Event> = events("[{}, []]")
            .unwrap()
            .into_iter()
            .map(|(event, _)| event)
            .collect();
        assert_eq!(
            kinds,
            vec![
                Event::StartArray,
                Event::StartObject,
                Event::EndObject,
                Event::StartArray,
                Event::EndArray,
                Event::EndArray,
            ]
        );
    }

    #[test]
    fn string_escapes() {
        let events = events(r#""a\"b\\c\/\n\u00e9\ud83d\ude00""#).unwrap();
        assert_eq!(events[0].1, "a\"b\\c/\n\u{e9}\u{1f600}");
    }

    #[test]
    fn rejects_malformed_input() {
        for json in [
            "[1,]",
            "{\"a\" 1}",
            "01",
            "-",
            "1.",
            "1e",
            "tru",
            "\"\\x\"",
            "\"\\ud800\"",
            "[1}",
            "{,}",
        ] {
            assert!(
                matches!(events(json), Err(Error::Syntax { .. } | Error::Eof)),
                "{json} should be rejected"
            );
        }
    }

    #[test]
    fn detects_trailing_data_and_truncation() {
        assert!(matches!(events("1 2"), Err(Error::TrailingData)));
        assert!(matches!(events("[1, 2"), Err(Error::Eof)));
        assert!(matches!(events(""), Err(Error::Eof)));
    }

    #[test]
    fn skips_whole_values() {
        let mut parser = Parser::new(SliceReader::from(r#"[{"a": [1, {"b": 2}]}, 3]"#));
        assert_eq!(parser.next_event().unwrap(), Some(Event::StartArray));
        let first = parser.next_event().unwrap().unwrap();
        skip_value(&mut parser, first).unwrap();
        assert_eq!(parser.next_event().unwrap(), Some(Event::Number));
        assert_eq!(parser.text(), "3");
        assert_eq!(parser.next_event().unwrap(), Some(Event::EndArray));
        assert_eq!(parser.next_event().unwrap(), None);
    }
}
