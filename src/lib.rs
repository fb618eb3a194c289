//! Byte streams that report their progress on a terminal progress bar.
//!
//! `ProgressIO` wraps any stream and counts the bytes read from or written
//! to it. `open` opens a file, sizes the bar from the file length when
//! reading, and optionally layers text decoding on top.
//!
//! ```no_run
//! use std::io::Read;
//! use progress_io::{open_binary, Access, ProgressOptions};
//!
//! let mut f = open_binary("dump.sql", Access::Read, &ProgressOptions::new())?;
//! let mut buf = Vec::new();
//! f.read_to_end(&mut buf)?;
//! f.close()?;
//! # Ok::<(), std::io::Error>(())
//! ```

mod ioutil;
mod open;
mod options;
mod progress;
mod size;
mod stream;
mod text;

pub use ioutil::{FileHandle, BUFFER_SIZE};
pub use open::{open, open_binary, open_text, Access, Mode, ProgressFile};
pub use options::ProgressOptions;
pub use progress::{ProgressIO, RawLines};
pub use size::{size_of, ByteSize};
pub use stream::Stream;
pub use text::{Encoding, TextIO, TextLines};

pub use indicatif::{ProgressBar, ProgressStyle};
