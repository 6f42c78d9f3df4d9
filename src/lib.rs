pub mod fs_op;
pub mod logging;
pub mod os_util;
pub mod settings;

pub use crate::fs_op::{
    rename_extensions, rewrite_text_when, rewrite_when, BatchReport, FileHandle, FsOpError,
    OpenFile, OpenMode, Rewrite, TraversalMode,
};
