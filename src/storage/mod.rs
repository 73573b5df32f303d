mod local;
mod s3;
mod url;
mod webdav;

use std::{fmt::Debug, path::Path};

use async_trait::async_trait;

use crate::error::Result;

pub use {local::LocalStorage, s3::S3Storage, url::StorageUrl, webdav::WebDavStorage};

pub type BoxedStorage = Box<dyn Storage + Sync + Send + 'static>;

/// A remote file tree that archive volumes are uploaded into. Remote paths are
/// `/`-separated and relative to the root of the storage.
#[async_trait]
pub trait Storage: Debug {
    /// Creates `path` and any missing parents. Succeeds if it already exists.
    async fn ensure_dir(&self, path: &str) -> Result<()>;

    /// Puts the contents of `local_path` at `remote_path` in a single request.
    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<()>;
}

pub fn join_remote(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        name.to_owned()
    } else {
        format!("{base}/{name}")
    }
}

pub(crate) fn remote_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{join_remote, remote_segments};

    #[test]
    fn join_remote_trims_separators() {
        assert_eq!(join_remote("backup/main/", "/docs"), "backup/main/docs");
        assert_eq!(join_remote("", "docs"), "docs");
    }

    #[test]
    fn remote_segments_skip_empty_parts() {
        let segments = remote_segments("/backup//main/").collect::<Vec<_>>();
        assert_eq!(segments, vec!["backup", "main"]);
    }
}
