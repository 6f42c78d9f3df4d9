//! Scoped file streams.
//!
//! [`FileHandle`] is the empty state: it owns nothing and exposes no I/O.
//! The only way to get a usable stream is a successful
//! [`FileHandle::open`], which returns an [`OpenFile`]. An `OpenFile` owns
//! exactly one file descriptor and releases it when dropped, on every exit
//! path. Pending buffered writes are flushed on drop; use
//! [`OpenFile::close`] when the caller needs to see a flush failure.
//!
//! Reads and writes follow stdio conventions: element-count transfers
//! return short counts instead of failing, and the sticky [`OpenFile::eof`]
//! and [`OpenFile::error`] indicators tell end-of-stream apart from an I/O
//! fault.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::fs_op::error::FsOpError;

/// Pending writes are handed to the OS once this many bytes accumulate.
const WRITE_CAPACITY: usize = 8 * 1024;

/// Primary access of an [`OpenMode`]: the first character of a mode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `r`: the file must exist; reading starts at the beginning.
    Read,
    /// `w`: the file is created or truncated.
    Write,
    /// `a`: the file is created if needed; every write goes to the end.
    Append,
}

/// A stream open mode, parsed from the platform mode strings
/// (`r`, `w`, `a`, `r+`, `w+`, `a+`, with optional `b` and, for `w`, `x`).
///
/// Text and binary modes behave identically on the supported platforms;
/// the flag is kept so a parsed mode displays the way it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    access: Access,
    update: bool,
    binary: bool,
    exclusive: bool,
}

impl OpenMode {
    pub const READ: OpenMode = OpenMode::new(Access::Read);
    pub const WRITE: OpenMode = OpenMode::new(Access::Write);
    pub const APPEND: OpenMode = OpenMode::new(Access::Append);
    pub const READ_BINARY: OpenMode = OpenMode::new(Access::Read).binary();
    pub const WRITE_BINARY: OpenMode = OpenMode::new(Access::Write).binary();

    pub const fn new(access: Access) -> Self {
        OpenMode {
            access,
            update: false,
            binary: false,
            exclusive: false,
        }
    }

    /// The `+` variant: open for both reading and writing.
    pub const fn update(self) -> Self {
        OpenMode {
            update: true,
            ..self
        }
    }

    pub const fn binary(self) -> Self {
        OpenMode {
            binary: true,
            ..self
        }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn is_update(&self) -> bool {
        self.update
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn can_read(&self) -> bool {
        self.access == Access::Read || self.update
    }

    pub fn can_write(&self) -> bool {
        self.access != Access::Read || self.update
    }

    fn options(&self) -> OpenOptions {
        let mut o = OpenOptions::new();
        match self.access {
            Access::Read => {
                o.read(true).write(self.update);
            }
            Access::Write => {
                o.write(true).truncate(true).read(self.update);
                if self.exclusive {
                    o.create_new(true);
                } else {
                    o.create(true);
                }
            }
            Access::Append => {
                o.append(true).create(true).read(self.update);
            }
        }
        o
    }
}

impl FromStr for OpenMode {
    type Err = FsOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FsOpError::InvalidMode(s.to_string());
        let mut chars = s.chars();
        let access = match chars.next() {
            Some('r') => Access::Read,
            Some('w') => Access::Write,
            Some('a') => Access::Append,
            _ => return Err(invalid()),
        };
        let mut mode = OpenMode::new(access);
        for c in chars {
            match c {
                '+' if !mode.update => mode.update = true,
                'b' if !mode.binary => mode.binary = true,
                'x' if access == Access::Write && !mode.exclusive => mode.exclusive = true,
                _ => return Err(invalid()),
            }
        }
        Ok(mode)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.access {
            Access::Read => 'r',
            Access::Write => 'w',
            Access::Append => 'a',
        };
        write!(f, "{access}")?;
        if self.binary {
            write!(f, "b")?;
        }
        if self.update {
            write!(f, "+")?;
        }
        if self.exclusive {
            write!(f, "x")?;
        }
        Ok(())
    }
}

/// Opaque stream position saved by [`OpenFile::get_pos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StreamPos(u64);

impl StreamPos {
    pub fn offset(&self) -> u64 {
        self.0
    }
}

/// A closed stream. Exposes no I/O; [`FileHandle::open`] is the only way
/// to obtain an [`OpenFile`]. A failed open leaves the handle as it was, so
/// it can be retried or dropped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle;

impl FileHandle {
    pub fn new() -> Self {
        FileHandle
    }

    pub fn open<P: AsRef<Path>>(&self, path: P, mode: OpenMode) -> Result<OpenFile, FsOpError> {
        OpenFile::open(path, mode)
    }
}

/// An open, buffered file stream that owns its descriptor.
pub struct OpenFile {
    path: PathBuf,
    mode: OpenMode,
    reader: BufReader<File>,
    pending: Vec<u8>,
    error: bool,
    eof: bool,
}

impl fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenFile")
            .field("path", &self.path)
            .field("mode", &self.mode.to_string())
            .field("pending", &self.pending.len())
            .field("error", &self.error)
            .field("eof", &self.eof)
            .finish()
    }
}

impl OpenFile {
    /// Open `path` with `mode`.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self, FsOpError> {
        let path = path.as_ref();
        let file = mode.options().open(path).map_err(|source| FsOpError::Open {
            path: path.to_path_buf(),
            mode: mode.to_string(),
            source,
        })?;
        tracing::trace!(path = %path.display(), %mode, "opened stream");
        Ok(OpenFile {
            path: path.to_path_buf(),
            mode,
            reader: BufReader::new(file),
            pending: Vec::new(),
            error: false,
            eof: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Sticky I/O error indicator.
    pub fn error(&self) -> bool {
        self.error
    }

    /// Sticky end-of-file indicator.
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// Reset both sticky indicators.
    pub fn clear_error(&mut self) {
        self.error = false;
        self.eof = false;
    }

    /// Read up to `buf.len() / elem_size` elements of `elem_size` bytes.
    /// Returns the number of complete elements read.
    pub fn read_elements(&mut self, buf: &mut [u8], elem_size: usize) -> usize {
        if elem_size == 0 || buf.len() < elem_size || !self.begin_read() {
            return 0;
        }
        let wanted = buf.len() / elem_size * elem_size;
        let mut filled = 0;
        while filled < wanted {
            match self.reader.read(&mut buf[filled..wanted]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.fail(&e);
                    break;
                }
            }
        }
        filled / elem_size
    }

    /// Write `buf.len() / elem_size` elements of `elem_size` bytes.
    /// Returns the number of elements accepted by the stream.
    pub fn write_elements(&mut self, buf: &[u8], elem_size: usize) -> usize {
        if elem_size == 0 || buf.len() < elem_size {
            return 0;
        }
        let count = buf.len() / elem_size;
        match self.push(&buf[..count * elem_size]) {
            Ok(()) => count,
            Err(e) => {
                self.fail(&e);
                0
            }
        }
    }

    /// Read one byte; `None` at end of file or on error.
    pub fn get_char(&mut self) -> Option<u8> {
        let byte = self.peek().ok()??;
        self.reader.consume(1);
        Some(byte)
    }

    /// Read a line of at most `max_len - 1` bytes, keeping the trailing
    /// newline when it fits. Returns `None` when nothing could be read.
    /// Invalid UTF-8 is replaced.
    pub fn read_line(&mut self, max_len: usize) -> Option<String> {
        let limit = max_len.checked_sub(1)?;
        let mut line = Vec::new();
        while line.len() < limit {
            match self.get_char() {
                Some(b) => {
                    line.push(b);
                    if b == b'\n' {
                        break;
                    }
                }
                None => break,
            }
        }
        if line.is_empty() && limit > 0 {
            return None;
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    pub fn put_char(&mut self, byte: u8) -> Result<(), FsOpError> {
        self.write_bytes(&[byte])
    }

    pub fn put_str(&mut self, s: &str) -> Result<(), FsOpError> {
        self.write_bytes(s.as_bytes())
    }

    /// Formatted write. Returns the number of bytes written.
    ///
    /// ```no_run
    /// use file_batch::fs_op::handle::{OpenFile, OpenMode};
    /// let mut f = OpenFile::open("hello.txt", OpenMode::WRITE).unwrap();
    /// f.print(format_args!("{} {}\n", "hello", 42)).unwrap();
    /// ```
    pub fn print(&mut self, args: fmt::Arguments<'_>) -> Result<usize, FsOpError> {
        let text = fmt::format(args);
        self.write_bytes(text.as_bytes())?;
        Ok(text.len())
    }

    /// Queue all of `data` for writing, reporting failure directly.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), FsOpError> {
        self.push(data).map_err(|source| {
            self.fail(&source);
            FsOpError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// Read everything from the current position to end of file.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, FsOpError> {
        let mut buf = Vec::new();
        let res = self
            .check_access(self.mode.can_read(), "reading")
            .and_then(|_| self.flush_pending())
            .and_then(|_| self.reader.read_to_end(&mut buf));
        match res {
            Ok(_) => {
                self.eof = true;
                Ok(buf)
            }
            Err(source) => Err(self.read_error(source)),
        }
    }

    /// Hand pending writes to the OS and flush it.
    pub fn flush(&mut self) -> Result<(), FsOpError> {
        self.flush_pending()
            .and_then(|_| self.reader.get_mut().flush())
            .map_err(|source| {
                self.fail(&source);
                FsOpError::Write {
                    path: self.path.clone(),
                    source,
                }
            })
    }

    /// Reposition the stream. Clears the end-of-file indicator.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, FsOpError> {
        match self.flush_pending().and_then(|_| self.reader.seek(pos)) {
            Ok(offset) => {
                self.eof = false;
                Ok(offset)
            }
            Err(source) => Err(self.read_error(source)),
        }
    }

    /// Current offset from the start of the file.
    pub fn tell(&mut self) -> Result<u64, FsOpError> {
        match self.flush_pending().and_then(|_| self.reader.stream_position()) {
            Ok(offset) => Ok(offset),
            Err(source) => Err(self.read_error(source)),
        }
    }

    /// Seek to the start and clear both indicators.
    pub fn rewind(&mut self) -> Result<(), FsOpError> {
        self.seek(SeekFrom::Start(0))?;
        self.clear_error();
        Ok(())
    }

    pub fn get_pos(&mut self) -> Result<StreamPos, FsOpError> {
        self.tell().map(StreamPos)
    }

    pub fn set_pos(&mut self, pos: StreamPos) -> Result<(), FsOpError> {
        self.seek(SeekFrom::Start(pos.0)).map(|_| ())
    }

    /// Flush and release the stream, reporting a flush failure. The
    /// descriptor is released either way.
    pub fn close(mut self) -> Result<FileHandle, FsOpError> {
        let flushed = self.flush();
        drop(self);
        flushed.map(|_| FileHandle::new())
    }

    /// Close this stream and open `path` with `mode` in its place.
    pub fn reopen<P: AsRef<Path>>(self, path: P, mode: OpenMode) -> Result<OpenFile, FsOpError> {
        self.close()?.open(path, mode)
    }

    /// Look at the next byte without consuming it. Sets the end-of-file
    /// indicator when there is none.
    pub(crate) fn peek(&mut self) -> io::Result<Option<u8>> {
        if let Err(e) = self
            .check_access(self.mode.can_read(), "reading")
            .and_then(|_| self.flush_pending())
        {
            self.fail(&e);
            return Err(e);
        }
        loop {
            let next = match self.reader.fill_buf() {
                Ok(buf) => Ok(buf.first().copied()),
                Err(e) => Err(e),
            };
            match next {
                Ok(Some(b)) => return Ok(Some(b)),
                Ok(None) => {
                    self.eof = true;
                    return Ok(None);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.fail(&e);
                    return Err(e);
                }
            }
        }
    }

    /// Consume the byte last returned by [`peek`](Self::peek).
    pub(crate) fn consume_peeked(&mut self) {
        self.reader.consume(1);
    }

    pub(crate) fn read_error(&mut self, source: io::Error) -> FsOpError {
        self.fail(&source);
        FsOpError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn begin_read(&mut self) -> bool {
        match self
            .check_access(self.mode.can_read(), "reading")
            .and_then(|_| self.flush_pending())
        {
            Ok(()) => true,
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    fn push(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.check_access(self.mode.can_write(), "writing")?;
        if !self.reader.buffer().is_empty() {
            // Drop read-ahead so the OS offset matches the logical one.
            self.reader.seek(SeekFrom::Current(0))?;
        }
        self.pending.extend_from_slice(bytes);
        if self.pending.len() >= WRITE_CAPACITY {
            self.flush_pending()?;
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let res = self.reader.get_mut().write_all(&self.pending);
        self.pending.clear();
        res
    }

    fn check_access(&self, allowed: bool, what: &str) -> io::Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("stream opened with mode \"{}\" does not allow {}", self.mode, what),
            ))
        }
    }

    fn fail(&mut self, e: &io::Error) {
        self.error = true;
        tracing::debug!(path = %self.path.display(), error = %e, "stream error");
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        if let Err(e) = self.flush_pending() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to flush stream on close");
        }
    }
}

impl Read for OpenFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let res = self
            .check_access(self.mode.can_read(), "reading")
            .and_then(|_| self.flush_pending())
            .and_then(|_| self.reader.read(buf));
        match res {
            Ok(n) => {
                if n == 0 && !buf.is_empty() {
                    self.eof = true;
                }
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }
}

impl Write for OpenFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_pending()?;
        self.reader.get_mut().flush()
    }
}

impl Seek for OpenFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.flush_pending()?;
        let offset = self.reader.seek(pos)?;
        self.eof = false;
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_and_display_modes() {
        for s in ["r", "w", "a", "r+", "w+", "a+", "rb", "wb+", "ab", "wx", "wb+x"] {
            let mode: OpenMode = s.parse().unwrap();
            assert_eq!(mode.to_string(), s);
        }
        let mode: OpenMode = "r+b".parse().unwrap();
        assert!(mode.is_update() && mode.is_binary());
        assert_eq!(mode.to_string(), "rb+");
    }

    #[test]
    fn reject_bad_modes() {
        for s in ["", "q", "rr", "r++", "rx", "ax", "wbb"] {
            assert!(
                matches!(s.parse::<OpenMode>(), Err(FsOpError::InvalidMode(ref m)) if m == s),
                "mode {s:?} should be rejected"
            );
        }
    }

    #[test]
    fn failed_open_leaves_handle_reusable() {
        let td = tempdir().unwrap();
        let handle = FileHandle::new();
        let missing = td.path().join("missing.txt");
        let err = handle.open(&missing, OpenMode::READ).unwrap_err();
        assert!(matches!(err, FsOpError::Open { ref path, .. } if *path == missing));

        fs::write(&missing, b"now here").unwrap();
        let mut f = handle.open(&missing, OpenMode::READ).unwrap();
        assert_eq!(f.read_to_end().unwrap(), b"now here");
    }

    #[test]
    fn drop_flushes_pending_writes() {
        let td = tempdir().unwrap();
        let p = td.path().join("out.txt");
        {
            let mut f = OpenFile::open(&p, OpenMode::WRITE).unwrap();
            f.put_str("hello").unwrap();
            assert_eq!(fs::read(&p).unwrap(), b"", "write should still be buffered");
        }
        assert_eq!(fs::read_to_string(&p).unwrap(), "hello");
    }

    #[test]
    fn element_reads_count_complete_elements() {
        let td = tempdir().unwrap();
        let p = td.path().join("data.bin");
        fs::write(&p, [1u8, 2, 3, 4, 5, 6, 7]).unwrap();
        let mut f = OpenFile::open(&p, OpenMode::READ_BINARY).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(f.read_elements(&mut buf, 2), 3);
        assert!(f.eof());
        assert!(!f.error());
        assert_eq!(&buf[..6], &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn writing_a_read_only_stream_sets_error() {
        let td = tempdir().unwrap();
        let p = td.path().join("ro.txt");
        fs::write(&p, b"abc").unwrap();
        let mut f = OpenFile::open(&p, OpenMode::READ).unwrap();
        assert_eq!(f.write_elements(b"xyz", 1), 0);
        assert!(f.error());
        assert!(!f.eof());
        f.clear_error();
        assert!(!f.error());
        assert!(matches!(f.put_char(b'x'), Err(FsOpError::Write { .. })));
    }

    #[test]
    fn io_read_on_a_write_only_stream_sets_error() {
        let td = tempdir().unwrap();
        let p = td.path().join("wo.txt");
        let mut f = OpenFile::open(&p, OpenMode::WRITE).unwrap();
        let mut buf = [0u8; 4];
        let err = f.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(f.error());
        assert!(!f.eof());
    }

    #[test]
    fn update_mode_interleaves_reads_and_writes() {
        let td = tempdir().unwrap();
        let p = td.path().join("rw.txt");
        fs::write(&p, b"abcdef").unwrap();
        let mut f = OpenFile::open(&p, "r+".parse().unwrap()).unwrap();
        assert_eq!(f.get_char(), Some(b'a'));
        f.put_char(b'X').unwrap();
        assert_eq!(f.get_char(), Some(b'c'));
        assert_eq!(f.tell().unwrap(), 3);
        f.close().unwrap();
        assert_eq!(fs::read(&p).unwrap(), b"aXcdef");
    }

    #[test]
    fn read_line_respects_limit_and_newline() {
        let td = tempdir().unwrap();
        let p = td.path().join("lines.txt");
        fs::write(&p, "first\nsecond line\n").unwrap();
        let mut f = OpenFile::open(&p, OpenMode::READ).unwrap();
        assert_eq!(f.read_line(64).as_deref(), Some("first\n"));
        assert_eq!(f.read_line(4).as_deref(), Some("sec"));
        assert_eq!(f.read_line(64).as_deref(), Some("ond line\n"));
        assert_eq!(f.read_line(64), None);
        assert!(f.eof());
    }
}
