use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Read, Seek, SeekFrom, Write};

#[cfg(unix)]
use std::os::unix::io::{AsRawFd, RawFd};

use crate::stream::{truncate_target, unsupported, Stream};

pub const BUFFER_SIZE: usize = 1 << 16;

/// A buffered file opened either for reading or for writing.
pub enum FileHandle {
    Reader(BufReader<fs::File>),
    Writer(BufWriter<fs::File>),
}

impl FileHandle {
    pub fn reader(f: fs::File) -> Self {
        Self::Reader(BufReader::with_capacity(BUFFER_SIZE, f))
    }

    pub fn writer(f: fs::File) -> Self {
        Self::Writer(BufWriter::with_capacity(BUFFER_SIZE, f))
    }

    pub fn file(&self) -> &fs::File {
        match self {
            Self::Reader(r) => r.get_ref(),
            Self::Writer(w) => w.get_ref(),
        }
    }
}

impl Stream for FileHandle {
    fn readable(&self) -> bool {
        matches!(self, Self::Reader(_))
    }

    fn writable(&self) -> bool {
        matches!(self, Self::Writer(_))
    }

    fn seekable(&self) -> bool {
        true
    }

    fn is_terminal(&self) -> bool {
        IsTerminal::is_terminal(self.file())
    }

    fn truncate(&mut self, size: Option<u64>) -> io::Result<u64> {
        let n = truncate_target(self, size)?;
        match self {
            Self::Reader(r) => r.get_ref().set_len(n)?,
            Self::Writer(w) => {
                w.flush()?;
                w.get_ref().set_len(n)?;
            }
        }
        Ok(n)
    }

    // BufWriter swallows errors when dropped, so flush here where they can
    // still be reported.
    fn close(&mut self) -> io::Result<()> {
        match self {
            Self::Reader(_) => Ok(()),
            Self::Writer(w) => w.flush(),
        }
    }

    #[cfg(unix)]
    fn fileno(&self) -> io::Result<RawFd> {
        Ok(self.file().as_raw_fd())
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Reader(r) => r.read(buf),
            Self::Writer(_) => Err(unsupported("read")),
        }
    }
}

impl BufRead for FileHandle {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            Self::Reader(r) => r.fill_buf(),
            Self::Writer(_) => Err(unsupported("read")),
        }
    }

    fn consume(&mut self, amt: usize) {
        if let Self::Reader(r) = self {
            r.consume(amt);
        }
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Reader(_) => Err(unsupported("write")),
            Self::Writer(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Reader(_) => Ok(()),
            Self::Writer(w) => w.flush(),
        }
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::Reader(r) => r.seek(pos),
            Self::Writer(w) => w.seek(pos),
        }
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        match self {
            Self::Reader(r) => r.stream_position(),
            Self::Writer(w) => w.stream_position(),
        }
    }
}
