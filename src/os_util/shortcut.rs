//! Windows Internet Shortcut (`.url`) files.

use std::fmt;
use std::path::Path;

use crate::fs_op::{FsOpError, OpenFile};
use crate::os_util::PlatformError;

const DESCRIPTION_SECTION: &str = "[{5CBF2787-48CF-4208-B90E-EE5E5D420294}]";
const NOTES_SECTION: &str = "[{B9B4B3FC-2B51-4A42-B5D8-324146AFCF25}]";
const RATING_SECTION: &str = "[{64440492-4C8B-11D1-8B70-080036B11A03}]";
const ICON_INDEX: u32 = 0;

/// Contents of a `.url` shortcut. `Display` renders the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlShortcut {
    /// Where the shortcut points: a web address, a file path, ...
    pub url: String,
    pub icon_path: String,
    pub description: String,
    pub notes: String,
    /// Stars, 1 to 5.
    pub rating: u32,
}

/// Explorer's property value for a star rating. Out-of-range ratings map
/// to one star.
pub fn rating_value(stars: u32) -> &'static str {
    match stars {
        2 => "25",
        3 => "50",
        4 => "75",
        5 => "99",
        _ => "1",
    }
}

impl UrlShortcut {
    pub fn new(url: impl Into<String>) -> Self {
        UrlShortcut {
            url: url.into(),
            rating: 1,
            ..Default::default()
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Write the rendered shortcut to an open stream.
    pub fn write_to(&self, out: &mut OpenFile) -> Result<usize, FsOpError> {
        out.print(format_args!("{}", self))
    }
}

impl fmt::Display for UrlShortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[InternetShortcut]")?;
        writeln!(f, "URL={}", self.url)?;
        writeln!(f, "IconFile={}", self.icon_path)?;
        writeln!(f, "IconIndex={ICON_INDEX}")?;
        writeln!(f, "{DESCRIPTION_SECTION}")?;
        writeln!(f, "Prop21=31,\"{}\"", self.description)?;
        writeln!(f, "{NOTES_SECTION}")?;
        writeln!(f, "Prop5=31,\"{}\"", self.notes)?;
        writeln!(f, "{RATING_SECTION}")?;
        writeln!(f, "Prop9=19,{}", rating_value(self.rating))
    }
}

/// Create (or truncate) `dest` and write `shortcut` into it.
#[cfg(windows)]
pub fn create_shortcut(dest: &Path, shortcut: &UrlShortcut) -> Result<(), PlatformError> {
    let mut out = OpenFile::open(dest, crate::fs_op::OpenMode::WRITE)?;
    shortcut.write_to(&mut out)?;
    out.close()?;
    tracing::info!(dest = %dest.display(), url = %shortcut.url, "created shortcut");
    Ok(())
}

/// `.url` shortcuts are only understood by Windows.
#[cfg(not(windows))]
pub fn create_shortcut(dest: &Path, _shortcut: &UrlShortcut) -> Result<(), PlatformError> {
    tracing::debug!(dest = %dest.display(), "shortcut creation skipped");
    Err(PlatformError::Unsupported("creating .url shortcuts"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_op::OpenMode;
    use tempfile::tempdir;

    fn sample() -> UrlShortcut {
        UrlShortcut {
            url: "https://example.com".into(),
            icon_path: r"C:\icons\site.ico".into(),
            description: "Example".into(),
            notes: "bookmark".into(),
            rating: 3,
        }
    }

    #[test]
    fn renders_all_sections_in_order() {
        let expected = "[InternetShortcut]\n\
URL=https://example.com\n\
IconFile=C:\\icons\\site.ico\n\
IconIndex=0\n\
[{5CBF2787-48CF-4208-B90E-EE5E5D420294}]\n\
Prop21=31,\"Example\"\n\
[{B9B4B3FC-2B51-4A42-B5D8-324146AFCF25}]\n\
Prop5=31,\"bookmark\"\n\
[{64440492-4C8B-11D1-8B70-080036B11A03}]\n\
Prop9=19,50\n";
        assert_eq!(sample().render(), expected);
    }

    #[test]
    fn rating_mapping() {
        let got: Vec<_> = (0..=6).map(rating_value).collect();
        assert_eq!(got, ["1", "1", "25", "50", "75", "99", "1"]);
    }

    #[test]
    fn write_to_goes_through_the_stream() {
        let td = tempdir().unwrap();
        let p = td.path().join("site.url");
        let mut out = OpenFile::open(&p, OpenMode::WRITE).unwrap();
        let n = sample().write_to(&mut out).unwrap();
        out.close().unwrap();
        let written = std::fs::read_to_string(&p).unwrap();
        assert_eq!(n, written.len());
        assert_eq!(written, sample().render());
    }

    #[cfg(not(windows))]
    #[test]
    fn create_is_unsupported_off_windows() {
        let td = tempdir().unwrap();
        let dest = td.path().join("site.url");
        let err = create_shortcut(&dest, &sample()).unwrap_err();
        assert!(matches!(err, PlatformError::Unsupported(_)));
        assert!(!dest.exists());
    }
}
