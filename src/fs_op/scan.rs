//! Formatted input for [`OpenFile`].
//!
//! A [`ScanFormat`] is a pattern of literal bytes, whitespace and `{}`
//! fields. Whitespace in the pattern matches any run of whitespace in the
//! input (including none). A field skips leading whitespace and captures a
//! token up to the next whitespace byte, or up to the literal that follows
//! it in the pattern. `{{` and `}}` match literal braces.
//!
//! Captured fields are kept as text and converted on demand with
//! [`Scanned::get`], so a wrong target type is a typed error instead of
//! undefined behaviour.

use std::fmt;
use std::str::FromStr;

use crate::fs_op::error::FsOpError;
use crate::fs_op::handle::OpenFile;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(u8),
    Whitespace,
    Field,
}

/// A parsed scan pattern, e.g. `"{} = {}"` or `"{},{},{}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFormat {
    pieces: Vec<Piece>,
}

impl ScanFormat {
    /// Number of `{}` fields in the pattern.
    pub fn field_count(&self) -> usize {
        self.pieces.iter().filter(|p| **p == Piece::Field).count()
    }
}

impl FromStr for ScanFormat {
    type Err = FsOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let mut pieces = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            match (bytes[i], bytes.get(i + 1)) {
                (b, _) if b.is_ascii_whitespace() => {
                    if pieces.last() != Some(&Piece::Whitespace) {
                        pieces.push(Piece::Whitespace);
                    }
                    i += 1;
                }
                (b'{', Some(b'}')) => {
                    pieces.push(Piece::Field);
                    i += 2;
                }
                (b'{', Some(b'{')) | (b'}', Some(b'}')) => {
                    pieces.push(Piece::Literal(bytes[i]));
                    i += 2;
                }
                (b'{', _) | (b'}', _) => {
                    return Err(FsOpError::InvalidScanFormat(s.to_string()));
                }
                (b, _) => {
                    pieces.push(Piece::Literal(b));
                    i += 1;
                }
            }
        }
        Ok(ScanFormat { pieces })
    }
}

/// Fields captured by one [`OpenFile::scan`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scanned {
    fields: Vec<String>,
    eof: bool,
}

impl Scanned {
    /// Number of fields matched.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Input ended before the first field was matched.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Parse field `index` as `T`.
    pub fn get<T>(&self, index: usize) -> Result<T, FsOpError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self.fields.get(index).ok_or_else(|| FsOpError::Parse {
            index,
            value: String::new(),
            msg: format!("only {} field(s) matched", self.fields.len()),
        })?;
        value.parse::<T>().map_err(|e| FsOpError::Parse {
            index,
            value: value.clone(),
            msg: e.to_string(),
        })
    }
}

impl OpenFile {
    /// Match `format` against the stream, stopping at the first mismatch.
    ///
    /// Input consumed up to the mismatch stays consumed. Returns an error
    /// only for an I/O fault; a short match is reported through
    /// [`Scanned::len`].
    pub fn scan(&mut self, format: &ScanFormat) -> Result<Scanned, FsOpError> {
        let mut fields = Vec::new();
        for (i, piece) in format.pieces.iter().enumerate() {
            match piece {
                Piece::Whitespace => self.skip_whitespace()?,
                Piece::Literal(expected) => match self.next_byte()? {
                    Some(b) if b == *expected => self.consume_peeked(),
                    _ => break,
                },
                Piece::Field => {
                    self.skip_whitespace()?;
                    let stop = match format.pieces.get(i + 1) {
                        Some(Piece::Literal(b)) => Some(*b),
                        _ => None,
                    };
                    let mut token = Vec::new();
                    while let Some(b) = self.next_byte()? {
                        if b.is_ascii_whitespace() || Some(b) == stop {
                            break;
                        }
                        token.push(b);
                        self.consume_peeked();
                    }
                    if token.is_empty() {
                        break;
                    }
                    fields.push(String::from_utf8_lossy(&token).into_owned());
                }
            }
        }
        let eof = fields.is_empty() && self.eof();
        Ok(Scanned { fields, eof })
    }

    fn next_byte(&mut self) -> Result<Option<u8>, FsOpError> {
        self.peek().map_err(|source| FsOpError::Read {
            path: self.path().to_path_buf(),
            source,
        })
    }

    fn skip_whitespace(&mut self) -> Result<(), FsOpError> {
        while let Some(b) = self.next_byte()? {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.consume_peeked();
        }
        Ok(())
    }
}
