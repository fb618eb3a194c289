use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};

#[cfg(unix)]
use std::os::unix::io::RawFd;

use indicatif::ProgressBar;
use log::debug;

use crate::options::ProgressOptions;
use crate::size::{size_of, ByteSize};
use crate::stream::Stream;

/// Wraps a stream and advances a progress bar by every byte moved through
/// it.
///
/// Reads, writes and line operations are forwarded to the wrapped stream
/// and counted. Everything else (seeking, flushing, capability queries) is
/// forwarded untouched. The stream and the bar are closed together, either
/// through `close` or when the wrapper is dropped.
pub struct ProgressIO<S: Stream> {
    pb: ProgressBar,
    stream: S,
    leave: bool,
    closed: bool,
}

impl<S: Stream> ProgressIO<S> {
    pub fn new(stream: S, options: &ProgressOptions) -> Self {
        let mut io = Self::with_progress_bar(stream, options.progress_bar());
        io.leave = options.leave;
        io
    }

    pub fn with_progress_bar(stream: S, pb: ProgressBar) -> Self {
        Self {
            pb,
            stream,
            leave: true,
            closed: false,
        }
    }

    pub fn progress_bar(&self) -> &ProgressBar {
        &self.pb
    }

    pub fn position(&self) -> u64 {
        self.pb.position()
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn readable(&self) -> bool {
        self.stream.readable()
    }

    pub fn writable(&self) -> bool {
        self.stream.writable()
    }

    pub fn seekable(&self) -> bool {
        self.stream.seekable()
    }

    pub fn is_terminal(&self) -> bool {
        self.stream.is_terminal()
    }

    #[cfg(unix)]
    pub fn fileno(&self) -> io::Result<RawFd> {
        self.stream.fileno()
    }

    pub fn truncate(&mut self, size: Option<u64>) -> io::Result<u64> {
        self.stream.truncate(size)
    }

    pub fn close(mut self) -> io::Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let ret = self.stream.close();
        if self.leave {
            self.pb.abandon();
        } else {
            self.pb.finish_and_clear();
        }
        debug!("closed stream after {} bytes", self.pb.position());

        ret.and(io::stdout().flush())
    }

    fn advance<T: ByteSize + ?Sized>(&self, data: &T) {
        self.pb.inc(size_of(data));
    }
}

impl<S: Stream> Drop for ProgressIO<S> {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

impl<S: Stream + Read> ProgressIO<S> {
    /// Reads up to `size` bytes, or everything left when `size` is `None`
    /// or zero.
    pub fn read_bytes(&mut self, size: Option<usize>) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        match size {
            Some(n) if n > 0 => {
                (&mut self.stream).take(n as u64).read_to_end(&mut buf)?;
            }
            _ => {
                self.stream.read_to_end(&mut buf)?;
            }
        }
        self.advance(&buf);
        Ok(buf)
    }
}

impl<S: Stream + BufRead> ProgressIO<S> {
    /// Reads one line including its `\n`. At most `limit` bytes are read
    /// when a limit is given. Returns an empty vector at end of stream.
    pub fn readline(&mut self, limit: Option<usize>) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        match limit {
            Some(n) if n > 0 => {
                (&mut self.stream).take(n as u64).read_until(b'\n', &mut line)?;
            }
            _ => {
                self.stream.read_until(b'\n', &mut line)?;
            }
        }
        self.advance(&line);
        Ok(line)
    }

    /// Reads lines until the stream ends or, when `hint` is given, until
    /// the lines read so far add up to at least `hint` bytes.
    pub fn readlines(&mut self, hint: Option<usize>) -> io::Result<Vec<Vec<u8>>> {
        let hint = hint.filter(|&n| n > 0);
        let mut lines = Vec::new();
        let mut total = 0;
        loop {
            let mut line = Vec::new();
            if self.stream.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            total += line.len();
            lines.push(line);
            if hint.map_or(false, |h| total >= h) {
                break;
            }
        }
        self.advance(&lines);
        Ok(lines)
    }

    /// Iterates over the remaining lines, each including its `\n`.
    pub fn raw_lines(&mut self) -> RawLines<'_, S> {
        RawLines { io: self }
    }
}

impl<S: Stream + Write> ProgressIO<S> {
    /// Writes every line in order. No separators are added.
    pub fn writelines<T>(&mut self, lines: &[T]) -> io::Result<()>
    where
        T: AsRef<[u8]> + ByteSize,
    {
        for line in lines {
            self.stream.write_all(line.as_ref())?;
        }
        self.advance(lines);
        Ok(())
    }
}

impl<S: Stream + Read> Read for ProgressIO<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.stream.read(buf)?;
        self.pb.inc(n as u64);
        Ok(n)
    }
}

// Line reads from std (read_line, read_until, lines) go through consume, so
// they are counted here exactly once.
impl<S: Stream + BufRead> BufRead for ProgressIO<S> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.stream.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.stream.consume(amt);
        self.pb.inc(amt as u64);
    }
}

impl<S: Stream + Write> Write for ProgressIO<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.stream.write(buf)?;
        self.pb.inc(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl<S: Stream + Seek> Seek for ProgressIO<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.stream.seek(pos)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        self.stream.stream_position()
    }
}

pub struct RawLines<'a, S: Stream> {
    io: &'a mut ProgressIO<S>,
}

impl<S: Stream + BufRead> Iterator for RawLines<'_, S> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.io.readline(None) {
            Ok(line) if line.is_empty() => None,
            ret => Some(ret),
        }
    }
}
