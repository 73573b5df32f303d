use std::{fs::File, io, path::Path};

use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, Client};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use tokio::task::spawn_blocking;

use crate::error::Result;

use super::Storage;

#[derive(Debug)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub async fn new(bucket: String) -> Self {
        let s3_config = aws_config::load_from_env().await;
        let client = Client::new(&s3_config);
        S3Storage { client, bucket }
    }
}

#[async_trait]
impl Storage for S3Storage {
    // keys are flat, prefixes don't need to exist
    async fn ensure_dir(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let digest_path = local_path.to_owned();
        let encoded_digest = spawn_blocking(move || md5_base64(&digest_path)).await??;
        let body = ByteStream::from_path(local_path).await?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(remote_path.trim_start_matches('/'))
            .body(body)
            .content_md5(encoded_digest)
            .send()
            .await?;
        Ok(())
    }
}

fn md5_base64(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut context = md5::Context::new();
    io::copy(&mut file, &mut context)?;
    let digest = context.compute();
    Ok(BASE64_STANDARD.encode(digest.0))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::md5_base64;

    #[test]
    fn digest_matches_known_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("part");
        fs::write(&path, b"hello").unwrap();
        assert_eq!(md5_base64(&path).unwrap(), "XUFAKrxLKna5cZ2REBfFkg==");
    }
}
