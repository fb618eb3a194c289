use std::fs;
use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::str::FromStr;

use log::debug;

use crate::ioutil::FileHandle;
use crate::options::ProgressOptions;
use crate::progress::ProgressIO;
use crate::text::{Encoding, TextIO};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    /// Create or truncate.
    Write,
    Append,
    /// Create, failing if the file exists.
    CreateNew,
}

/// A parsed open mode such as `"rt"` or `"wb"`.
///
/// Exactly one of `r`, `w`, `a`, `x` selects the access. `t` selects text
/// and `b` binary; without either the file is opened in binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mode {
    pub access: Access,
    pub text: bool,
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            access: Access::Read,
            text: true,
        }
    }
}

impl FromStr for Mode {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid mode: {:?}", s),
            )
        };

        let mut access = None;
        let (mut text, mut binary) = (false, false);
        for c in s.chars() {
            let a = match c {
                'r' => Access::Read,
                'w' => Access::Write,
                'a' => Access::Append,
                'x' => Access::CreateNew,
                't' if !text => {
                    text = true;
                    continue;
                }
                'b' if !binary => {
                    binary = true;
                    continue;
                }
                _ => return Err(invalid()),
            };
            if access.replace(a).is_some() {
                return Err(invalid());
            }
        }

        match access {
            Some(access) if !(text && binary) => Ok(Self { access, text }),
            _ => Err(invalid()),
        }
    }
}

/// A file opened by `open`, in binary or text form depending on the mode.
pub enum ProgressFile {
    Binary(ProgressIO<FileHandle>),
    Text(TextIO<ProgressIO<FileHandle>>),
}

impl ProgressFile {
    pub fn progress_bar(&self) -> &indicatif::ProgressBar {
        match self {
            Self::Binary(io) => io.progress_bar(),
            Self::Text(text) => text.progress_bar(),
        }
    }

    pub fn close(self) -> io::Result<()> {
        match self {
            Self::Binary(io) => io.close(),
            Self::Text(text) => text.close(),
        }
    }

    pub fn read_line(&mut self, out: &mut String) -> io::Result<usize> {
        match self {
            Self::Binary(io) => io.read_line(out),
            Self::Text(text) => text.read_line(out),
        }
    }

    pub fn read_to_string(&mut self, out: &mut String) -> io::Result<usize> {
        match self {
            Self::Binary(io) => Read::read_to_string(io, out),
            Self::Text(text) => text.read_to_string(out),
        }
    }

    /// Writes `s` as UTF-8 in binary mode, or in the file's encoding in
    /// text mode.
    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        match self {
            Self::Binary(io) => io.write_all(s.as_bytes()),
            Self::Text(text) => text.write_str(s),
        }
    }
}

fn text_mode(op: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot {} raw bytes on a file opened in text mode", op),
    )
}

// Raw byte I/O is only available in binary mode; text mode goes through
// read_line, read_to_string and write_str.
impl Read for ProgressFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Binary(io) => io.read(buf),
            Self::Text(_) => Err(text_mode("read")),
        }
    }
}

impl Write for ProgressFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Binary(io) => io.write(buf),
            Self::Text(_) => Err(text_mode("write")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Binary(io) => io.flush(),
            Self::Text(text) => text.flush(),
        }
    }
}

impl Seek for ProgressFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::Binary(io) => io.seek(pos),
            Self::Text(text) => text.get_mut().seek(pos),
        }
    }
}

/// Opens `path` with `mode` and wraps it in a `ProgressIO`.
///
/// Read modes use the file size as progress total, unless `options`
/// already has one. Text modes decode with `encoding`.
pub fn open<P: AsRef<Path>>(
    path: P,
    mode: &str,
    encoding: &str,
    options: &ProgressOptions,
) -> io::Result<ProgressFile> {
    let mode: Mode = mode.parse()?;
    if mode.text {
        let encoding: Encoding = encoding.parse()?;
        open_text(path, mode.access, encoding, options).map(ProgressFile::Text)
    } else {
        open_binary(path, mode.access, options).map(ProgressFile::Binary)
    }
}

pub fn open_binary<P: AsRef<Path>>(
    path: P,
    access: Access,
    options: &ProgressOptions,
) -> io::Result<ProgressIO<FileHandle>> {
    let path = path.as_ref();

    let (handle, total) = match access {
        Access::Read => {
            let f = fs::File::open(path)?;
            let total = match options.total {
                Some(n) => Some(n),
                None => Some(f.metadata()?.len()),
            };
            (FileHandle::reader(f), total)
        }
        _ => {
            let mut opts = fs::OpenOptions::new();
            match access {
                Access::Append => opts.append(true).create(true),
                Access::CreateNew => opts.write(true).create_new(true),
                _ => opts.write(true).create(true).truncate(true),
            };
            (FileHandle::writer(opts.open(path)?), options.total)
        }
    };
    debug!("opened {} ({:?}), total: {:?}", path.display(), access, total);

    let mut options = options.clone();
    options.total = total;
    Ok(ProgressIO::new(handle, &options))
}

pub fn open_text<P: AsRef<Path>>(
    path: P,
    access: Access,
    encoding: Encoding,
    options: &ProgressOptions,
) -> io::Result<TextIO<ProgressIO<FileHandle>>> {
    let io = open_binary(path, access, options)?;
    Ok(TextIO::new(io, encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden() -> ProgressOptions {
        ProgressOptions::new().with_disable(true)
    }

    #[test]
    fn parse_mode() {
        let tests = [
            ("r", Access::Read, false),
            ("rb", Access::Read, false),
            ("rt", Access::Read, true),
            ("tr", Access::Read, true),
            ("w", Access::Write, false),
            ("wt", Access::Write, true),
            ("ab", Access::Append, false),
            ("xt", Access::CreateNew, true),
        ];
        for (s, access, text) in tests {
            assert_eq!(s.parse::<Mode>().unwrap(), Mode { access, text }, "{}", s);
        }

        for s in ["", "t", "rw", "rtb", "rr", "rz", "wbb"] {
            assert_eq!(
                s.parse::<Mode>().unwrap_err().kind(),
                io::ErrorKind::InvalidInput,
                "{}",
                s
            );
        }

        assert_eq!(
            Mode::default(),
            Mode {
                access: Access::Read,
                text: true
            }
        );
    }

    #[test]
    fn read_sets_total_to_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, vec![1u8; 1234]).unwrap();

        let mut io = open_binary(&path, Access::Read, &hidden()).unwrap();
        assert_eq!(io.progress_bar().length(), Some(1234));
        assert!(io.readable());
        assert!(!io.writable());
        assert!(!io.is_terminal());
        #[cfg(unix)]
        assert_eq!(
            io.fileno().unwrap(),
            std::os::unix::io::AsRawFd::as_raw_fd(io.get_ref().file())
        );

        let mut buf = Vec::new();
        io.read_to_end(&mut buf).unwrap();
        assert_eq!(buf.len(), 1234);
        assert_eq!(io.position(), 1234);
        io.close().unwrap();
    }

    #[test]
    fn explicit_total_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"abc").unwrap();

        let f = open(&path, "rb", "utf-8", &hidden().with_total(99)).unwrap();
        assert_eq!(f.progress_bar().length(), Some(99));
    }

    #[test]
    fn empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();

        let mut io = open_binary(&path, Access::Read, &hidden()).unwrap();
        assert_eq!(io.progress_bar().length(), Some(0));
        assert!(io.read_bytes(Some(10)).unwrap().is_empty());
        assert!(io.read_bytes(None).unwrap().is_empty());
        assert!(io.readline(None).unwrap().is_empty());
        assert_eq!(io.position(), 0);
    }

    #[test]
    fn write_leaves_total_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let mut io = open_binary(&path, Access::Write, &hidden()).unwrap();
        assert_eq!(io.progress_bar().length(), None);
        assert!(io.writable());

        let lines = ["first line\n", "second\n", "drittes ß\n"];
        io.writelines(&lines).unwrap();
        assert_eq!(io.position(), 11 + 7 + 11);
        io.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), lines.concat());
    }

    #[test]
    fn append_and_create_new() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, b"one\n").unwrap();

        let mut io = open_binary(&path, Access::Append, &hidden()).unwrap();
        io.write_all(b"two\n").unwrap();
        io.close().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"one\ntwo\n");

        let err = open_binary(&path, Access::CreateNew, &hidden()).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn text_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.txt");

        match open(&path, "wt", "latin-1", &hidden()).unwrap() {
            ProgressFile::Text(mut text) => {
                text.writelines(["grüße\n", "à bientôt\n"]).unwrap();
                assert_eq!(text.progress_bar().position(), 6 + 10);
                text.close().unwrap();
            }
            ProgressFile::Binary(_) => panic!("expected a text file"),
        }
        assert_eq!(fs::metadata(&path).unwrap().len(), 16);

        let mut text = open_text(&path, Access::Read, Encoding::Latin1, &hidden()).unwrap();
        assert_eq!(text.progress_bar().length(), Some(16));
        let lines: Vec<String> = text.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, ["grüße", "à bientôt"]);
        assert_eq!(text.progress_bar().position(), 16);
    }

    #[test]
    fn default_mode_is_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "x\ny\n").unwrap();

        let mode = Mode::default();
        let f = open_text(&path, mode.access, Encoding::default(), &hidden()).unwrap();
        let mut io = f.into_inner();
        let mut line = String::new();
        io.read_line(&mut line).unwrap();
        assert_eq!(line, "x\n");
        assert_eq!(io.position(), 2);
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope");
        let err = open(&path, "rt", "utf-8", &hidden()).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let path = dir.path().join("missing-dir").join("out");
        let err = open(&path, "wb", "utf-8", &hidden()).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn bad_encoding_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "x").unwrap();
        let err = open(&path, "rt", "klingon", &hidden()).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        // binary modes ignore the encoding
        assert!(open(&path, "rb", "klingon", &hidden()).is_ok());
    }

    #[test]
    fn binary_file_from_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");

        let mut f = open(&path, "wb", "utf-8", &hidden()).unwrap();
        f.write_all(b"head\n").unwrap();
        f.write_str("tail\n").unwrap();
        assert_eq!(f.progress_bar().position(), 10);
        f.close().unwrap();

        let mut f = open(&path, "rb", "utf-8", &hidden()).unwrap();
        let mut line = String::new();
        assert_eq!(f.read_line(&mut line).unwrap(), 5);
        assert_eq!(line, "head\n");
        let mut rest = Vec::new();
        f.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"tail\n");
        assert_eq!(f.progress_bar().position(), 10);

        f.seek(SeekFrom::Start(2)).unwrap();
        let mut s = String::new();
        f.read_to_string(&mut s).unwrap();
        assert_eq!(s, "ad\ntail\n");
        assert_eq!(f.progress_bar().position(), 18);
    }

    #[test]
    fn text_file_from_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.txt");

        let mut f = open(&path, "wt", "utf-8", &hidden()).unwrap();
        f.write_str("één\r\ntwee\n").unwrap();
        assert_eq!(
            f.write(b"raw").unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
        f.flush().unwrap();
        assert_eq!(f.progress_bar().position(), 12);
        f.close().unwrap();

        let mut f = open(&path, "rt", "utf-8", &hidden()).unwrap();
        let mut buf = [0; 4];
        assert_eq!(
            f.read(&mut buf).unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
        let mut line = String::new();
        assert_eq!(f.read_line(&mut line).unwrap(), 7);
        assert_eq!(line, "één\n");
        let mut rest = String::new();
        f.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "twee\n");
        assert_eq!(f.progress_bar().position(), 12);
    }
}
