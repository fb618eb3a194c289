use std::fs;
use std::io::{self, Cursor, IsTerminal, Seek};

#[cfg(unix)]
use std::os::unix::io::{AsRawFd, RawFd};

/// The capabilities `ProgressIO` needs from a wrapped stream beyond the
/// std I/O traits.
///
/// Every method has a conservative default so a new stream type only has
/// to override what it actually supports.
pub trait Stream {
    fn readable(&self) -> bool {
        false
    }

    fn writable(&self) -> bool {
        false
    }

    fn seekable(&self) -> bool {
        false
    }

    fn is_terminal(&self) -> bool {
        false
    }

    /// Resizes the stream to `size` bytes, or to the current position when
    /// `size` is `None`. Returns the new size.
    fn truncate(&mut self, _size: Option<u64>) -> io::Result<u64> {
        Err(unsupported("truncate"))
    }

    /// Releases whatever the stream holds on to. Called exactly once, when
    /// the owning `ProgressIO` is closed or dropped.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn fileno(&self) -> io::Result<RawFd> {
        Err(unsupported("fileno"))
    }
}

pub(crate) fn unsupported(op: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{} is not supported by this stream", op),
    )
}

// Resolves the target length of a truncate call on a seekable stream.
pub(crate) fn truncate_target<T: Seek>(s: &mut T, size: Option<u64>) -> io::Result<u64> {
    match size {
        Some(n) => Ok(n),
        None => s.stream_position(),
    }
}

impl Stream for fs::File {
    // A bare File does not remember its open mode.
    fn readable(&self) -> bool {
        true
    }

    fn writable(&self) -> bool {
        true
    }

    fn seekable(&self) -> bool {
        true
    }

    fn is_terminal(&self) -> bool {
        IsTerminal::is_terminal(self)
    }

    fn truncate(&mut self, size: Option<u64>) -> io::Result<u64> {
        let n = truncate_target(self, size)?;
        self.set_len(n)?;
        Ok(n)
    }

    #[cfg(unix)]
    fn fileno(&self) -> io::Result<RawFd> {
        Ok(self.as_raw_fd())
    }
}

impl Stream for Cursor<Vec<u8>> {
    fn readable(&self) -> bool {
        true
    }

    fn writable(&self) -> bool {
        true
    }

    fn seekable(&self) -> bool {
        true
    }

    fn truncate(&mut self, size: Option<u64>) -> io::Result<u64> {
        let n = truncate_target(self, size)?;
        let len = usize::try_from(n).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "truncate size out of range")
        })?;
        // Growing pads with zeros, like a file would.
        self.get_mut().resize(len, 0);
        Ok(n)
    }
}

impl Stream for Cursor<&[u8]> {
    fn readable(&self) -> bool {
        true
    }

    fn seekable(&self) -> bool {
        true
    }
}

impl Stream for &[u8] {
    fn readable(&self) -> bool {
        true
    }
}
