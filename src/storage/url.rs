use std::{path::PathBuf, str::FromStr};

use crate::error::Error;

pub const S3_PREFIX: &str = "s3://";
pub const LOCAL_PREFIX: &str = "file://";
pub const HTTP_PREFIX: &str = "http://";
pub const HTTPS_PREFIX: &str = "https://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageUrl {
    S3(String),
    Local(PathBuf),
    WebDav(String),
}

impl FromStr for StorageUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(bucket) = s.strip_prefix(S3_PREFIX).filter(|b| !b.is_empty()) {
            Ok(StorageUrl::S3(bucket.to_owned()))
        } else if let Some(path_str) = s.strip_prefix(LOCAL_PREFIX).filter(|p| !p.is_empty()) {
            Ok(StorageUrl::Local(path_str.into()))
        } else if s.starts_with(HTTP_PREFIX) || s.starts_with(HTTPS_PREFIX) {
            Ok(StorageUrl::WebDav(s.trim_end_matches('/').to_owned()))
        } else {
            Err(Error::InvalidStorageUrl(s.to_owned()))
        }
    }
}
