pub mod error;
pub mod handle;
pub mod helpers;
pub mod path;
pub mod rename_ext;
pub mod report;
pub mod rewrite;
pub mod scan;
pub mod stat;
pub mod test_hooks;
pub mod walk;

// Re-export commonly used types/functions for convenience
pub use error::FsOpError;
pub use handle::{Access, FileHandle, OpenFile, OpenMode, StreamPos};
pub use path::{resolve_root, validate_root};
pub use rename_ext::{rename_entry, rename_extensions, rename_extensions_with, Extension};
pub use report::{BatchReport, EntryFailure, FailureKind};
pub use rewrite::{
    rewrite_text_when, rewrite_text_when_with, rewrite_when, rewrite_when_with, Rewrite,
    RewriteOptions, WriteBack,
};
pub use scan::{ScanFormat, Scanned};
pub use stat::EntryKind;
pub use walk::{walk, walk_with, Files, TraversalMode, Walk, WalkEntry, WalkOptions};
