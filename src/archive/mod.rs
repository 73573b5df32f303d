mod split;
mod writer;


use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use crate::{error::Result, storage::join_remote};

pub use self::{split::ArchiveSplitter, writer::VolumeWriter};

pub const ARCHIVE_EXTENSION: &str = "tar.zst";

pub type BoxedCompressor = Box<dyn Compressor + Sync + Send + 'static>;

/// Turns a directory into archive volumes inside a scratch directory.
pub trait Compressor: Debug {
    /// Writes the volumes for `source_dir` under `scratch_dir` and returns them
    /// in index order. On failure nothing is left behind.
    fn split(
        &self,
        source_dir: &Path,
        scratch_dir: &Path,
        max_volume_bytes: u64,
    ) -> Result<Vec<ArchiveVolume>>;
}

/// One part of a multi-volume archive. Indices start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveVolume {
    pub path: PathBuf,
    pub directory_name: String,
    pub index: usize,
    pub size: u64,
}

impl ArchiveVolume {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn remote_path(&self, destination_base: &str) -> String {
        let remote_dir = join_remote(destination_base, &self.directory_name);
        join_remote(&remote_dir, &self.file_name())
    }
}

pub fn volume_file_name(directory_name: &str, index: usize) -> String {
    format!("{directory_name}.{ARCHIVE_EXTENSION}.{index:04}")
}
