use std::{fmt, path::Path};

use async_trait::async_trait;
use log::trace;
use reqwest::{header::CONTENT_LENGTH, Client, Method, StatusCode, Url};
use tokio::fs::File;

use crate::error::{Error, Result};

use super::{remote_segments, Storage};

const DAV_FILES_PATH: &str = "remote.php/dav/files";

/// Nextcloud-style WebDAV file tree. Every request carries basic auth.
pub struct WebDavStorage {
    client: Client,
    root: Url,
    username: String,
    password: String,
}

impl fmt::Debug for WebDavStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDavStorage")
            .field("root", &self.root.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl WebDavStorage {
    pub fn new(base_url: &str, username: String, password: String) -> Result<Self> {
        let mut root =
            Url::parse(base_url).map_err(|_| Error::InvalidStorageUrl(base_url.to_owned()))?;
        root.path_segments_mut()
            .map_err(|()| Error::InvalidStorageUrl(base_url.to_owned()))?
            .pop_if_empty()
            .extend(DAV_FILES_PATH.split('/'))
            .push(&username);

        let client = Client::builder().build()?;
        Ok(WebDavStorage {
            client,
            root,
            username,
            password,
        })
    }

    fn url<'a, I: IntoIterator<Item = &'a str>>(&self, segments: I) -> Url {
        let mut url = self.root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    async fn make_collection(&self, url: Url) -> Result<StatusCode> {
        let method = Method::from_bytes(b"MKCOL").map_err(Error::other)?;
        let response = self
            .client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        Ok(response.status())
    }
}

#[async_trait]
impl Storage for WebDavStorage {
    async fn ensure_dir(&self, path: &str) -> Result<()> {
        let segments = remote_segments(path).collect::<Vec<_>>();
        for depth in 1..=segments.len() {
            let url = self.url(segments[..depth].iter().copied());
            let status = self.make_collection(url).await?;
            trace!("MKCOL {} -> {status}", segments[..depth].join("/"));

            // 405 means the collection is already there
            if !(status.is_success() || status == StatusCode::METHOD_NOT_ALLOWED) {
                return Err(Error::RemoteDirectory {
                    path: path.to_owned(),
                    status: status.as_u16(),
                });
            }
        }

        Ok(())
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let file = File::open(local_path).await?;
        let size = file.metadata().await?.len();
        let url = self.url(remote_segments(remote_path));

        let response = self
            .client
            .put(url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_LENGTH, size)
            .body(file)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::UploadRejected {
                path: remote_path.to_owned(),
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WebDavStorage;

    #[test]
    fn urls_are_rooted_at_user_files() {
        let storage = WebDavStorage::new(
            "https://cloud.example.com",
            "alice".to_owned(),
            "secret".to_owned(),
        )
        .unwrap();

        let url = storage.url(["backup", "my docs", "docs.tar.zst.0001"]);
        assert_eq!(
            url.as_str(),
            "https://cloud.example.com/remote.php/dav/files/alice/backup/my%20docs/docs.tar.zst.0001"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let storage = WebDavStorage::new(
            "https://example.com/nextcloud",
            "bob".to_owned(),
            "secret".to_owned(),
        )
        .unwrap();

        assert_eq!(
            storage.url(["x"]).as_str(),
            "https://example.com/nextcloud/remote.php/dav/files/bob/x"
        );
    }

    #[test]
    fn debug_hides_password() {
        let storage = WebDavStorage::new(
            "https://cloud.example.com",
            "alice".to_owned(),
            "hunter2".to_owned(),
        )
        .unwrap();

        let debug = format!("{storage:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }
}
