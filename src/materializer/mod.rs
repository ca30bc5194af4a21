pub mod copy_report;
pub mod file_copier;

pub use copy_report::{CopyReport, KeyWindow};
pub use file_copier::{
    relative_target, strip_relative_prefix, CopiedFile, CopyEvent, CopyProgress, FileOperations,
};
