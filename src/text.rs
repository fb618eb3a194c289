//! Text decoding on top of a byte stream.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::progress::ProgressIO;
use crate::stream::Stream;

/// Text encodings understood by `TextIO`. All of them are ASCII
/// compatible, so lines can be split on the raw `\n` byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
    Ascii,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
            Self::Ascii => "ascii",
        }
    }

    pub fn decode_into(&self, bytes: &[u8], out: &mut String) -> io::Result<()> {
        match self {
            Self::Utf8 => {
                let s = std::str::from_utf8(bytes).map_err(|e| invalid_data(e.to_string()))?;
                out.push_str(s);
            }
            Self::Latin1 => out.extend(bytes.iter().map(|&b| char::from(b))),
            Self::Ascii => {
                if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(invalid_data(format!(
                        "byte {:#04x} at offset {} is not ascii",
                        bytes[pos], pos
                    )));
                }
                // all ascii, so also valid utf-8
                out.extend(bytes.iter().map(|&b| char::from(b)));
            }
        }
        Ok(())
    }

    pub fn encode<'a>(&self, s: &'a str) -> io::Result<Cow<'a, [u8]>> {
        let limit = match self {
            Self::Utf8 => return Ok(s.as_bytes().into()),
            Self::Latin1 => 0xff,
            Self::Ascii => 0x7f,
        };
        if s.is_ascii() {
            return Ok(s.as_bytes().into());
        }
        s.chars()
            .map(|c| {
                u8::try_from(u32::from(c))
                    .ok()
                    .filter(|&b| u32::from(b) <= limit)
                    .ok_or_else(|| {
                        invalid_data(format!("{:?} cannot be encoded as {}", c, self.name()))
                    })
            })
            .collect::<io::Result<Vec<u8>>>()
            .map(Into::into)
    }
}

impl FromStr for Encoding {
    type Err = io::Error;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => Ok(Self::Latin1),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unknown encoding: {}", label),
            )),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Maps \r\n and lone \r to \n. Safe on the raw bytes because every
// supported encoding is ASCII compatible.
fn translate_newlines(bytes: &[u8]) -> Cow<'_, [u8]> {
    if !bytes.contains(&b'\r') {
        return Cow::Borrowed(bytes);
    }
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        if b == b'\r' {
            iter.next_if_eq(&&b'\n');
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Reads and writes text through a byte stream.
///
/// Bytes are moved by the inner stream, so when it is a `ProgressIO` the
/// progress counts encoded bytes, not characters.
pub struct TextIO<B> {
    inner: B,
    encoding: Encoding,
    buf: Vec<u8>,
}

impl<B> TextIO<B> {
    pub fn new(inner: B, encoding: Encoding) -> Self {
        Self {
            inner,
            encoding,
            buf: Vec::new(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn get_ref(&self) -> &B {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: BufRead> TextIO<B> {
    /// Appends the next line to `out`. A line ends at `\n`, `\r\n` or a
    /// lone `\r`, and its ending is appended as `\n`. Returns the number of
    /// raw bytes consumed from the inner stream; 0 means end of stream.
    pub fn read_line(&mut self, out: &mut String) -> io::Result<usize> {
        let n = self.read_raw_line()?;
        self.encoding.decode_into(&translate_newlines(&self.buf), out)?;
        Ok(n)
    }

    /// Appends everything left to `out`, with line endings translated to
    /// `\n`, and returns the number of raw bytes consumed.
    pub fn read_to_string(&mut self, out: &mut String) -> io::Result<usize> {
        self.buf.clear();
        let n = self.inner.read_to_end(&mut self.buf)?;
        self.encoding.decode_into(&translate_newlines(&self.buf), out)?;
        Ok(n)
    }

    fn read_raw_line(&mut self) -> io::Result<usize> {
        self.buf.clear();
        let mut n = 0;
        loop {
            let (done, used) = {
                let available = self.inner.fill_buf()?;
                if available.is_empty() {
                    return Ok(n);
                }
                match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                    Some(i) => {
                        self.buf.extend_from_slice(&available[..=i]);
                        (true, i + 1)
                    }
                    None => {
                        self.buf.extend_from_slice(available);
                        (false, available.len())
                    }
                }
            };
            self.inner.consume(used);
            n += used;
            if done {
                break;
            }
        }

        // A \r\n pair can straddle two buffer fills.
        if self.buf.last() == Some(&b'\r') && self.inner.fill_buf()?.first() == Some(&b'\n') {
            self.inner.consume(1);
            self.buf.push(b'\n');
            n += 1;
        }
        Ok(n)
    }

    /// Iterates over the remaining lines without their line ending.
    pub fn lines(&mut self) -> TextLines<'_, B> {
        TextLines { text: self }
    }
}

impl<B: Write> TextIO<B> {
    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        let bytes = self.encoding.encode(s)?;
        self.inner.write_all(&bytes)
    }

    /// Writes every line in order. No separators are added.
    pub fn writelines<I, T>(&mut self, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        for line in lines {
            self.write_str(line.as_ref())?;
        }
        Ok(())
    }

    /// Lets `write!` and `writeln!` target a `TextIO`.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        match args.as_str() {
            Some(s) => self.write_str(s),
            None => self.write_str(&args.to_string()),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Stream> TextIO<ProgressIO<S>> {
    pub fn progress_bar(&self) -> &indicatif::ProgressBar {
        self.inner.progress_bar()
    }

    pub fn close(self) -> io::Result<()> {
        self.inner.close()
    }
}

pub struct TextLines<'a, B> {
    text: &'a mut TextIO<B>,
}

impl<B: BufRead> Iterator for TextLines<'_, B> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        match self.text.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                }
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
