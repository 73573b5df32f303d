use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::{
    error::{Error, Result},
    format::{format_path, format_size},
};

use super::{ArchiveVolume, Compressor, VolumeWriter};

/// Streams a directory into a tar archive, compresses it with zstd and cuts
/// the compressed stream into volumes. The concatenation of all volumes in
/// index order is one `.tar.zst` stream.
#[derive(Debug, Clone)]
pub struct ArchiveSplitter {
    compression_level: i32,
}

impl ArchiveSplitter {
    pub fn new(compression_level: u8) -> Self {
        ArchiveSplitter {
            compression_level: compression_level.into(),
        }
    }

    fn write_volumes(
        &self,
        source_dir: &Path,
        directory_name: &str,
        output_dir: &Path,
        max_volume_bytes: u64,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)?;
        let writer = VolumeWriter::new(
            output_dir.to_owned(),
            directory_name.to_owned(),
            max_volume_bytes,
        );
        let mut encoder = zstd::Encoder::new(writer, self.compression_level)?;

        {
            let mut builder = tar::Builder::new(&mut encoder);
            builder.follow_symlinks(false);
            builder.append_dir_all(directory_name, source_dir)?;
            builder.finish()?;
        }

        let writer = encoder.finish()?;
        let paths = writer.finish()?;
        Ok(paths)
    }
}

impl Compressor for ArchiveSplitter {
    fn split(
        &self,
        source_dir: &Path,
        scratch_dir: &Path,
        max_volume_bytes: u64,
    ) -> Result<Vec<ArchiveVolume>> {
        if max_volume_bytes == 0 {
            return Err(Error::Compression {
                path: source_dir.to_owned(),
                message: "volume size must be positive".to_owned(),
            });
        }

        if !source_dir.exists() {
            let err = Error::FileDoesNotExist(source_dir.to_owned());
            return Err(Error::compression(source_dir, err));
        }

        if !source_dir.is_dir() {
            let err = Error::FileIsNotDirectory(source_dir.to_owned());
            return Err(Error::compression(source_dir, err));
        }

        let directory_name = directory_name(source_dir)?;
        let output_dir = scratch_dir.join(&directory_name);

        let result = self
            .write_volumes(source_dir, &directory_name, &output_dir, max_volume_bytes)
            .and_then(|paths| to_volumes(paths, &directory_name));

        match result {
            Ok(volumes) => {
                let total_size = volumes.iter().map(|volume| volume.size).sum::<u64>();
                debug!(
                    "compressed {} into {} volume(s) ({})",
                    format_path(source_dir),
                    volumes.len(),
                    format_size(total_size)
                );
                Ok(volumes)
            }
            Err(err) => {
                if let Err(cleanup_err) = remove_output_dir(&output_dir) {
                    warn!(
                        "failed to remove partial volumes in {} ({cleanup_err})",
                        format_path(&output_dir)
                    );
                }

                Err(Error::compression(source_dir, err))
            }
        }
    }
}

fn directory_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::FileIsNotDirectory(path.to_owned()))
}

fn to_volumes(paths: Vec<PathBuf>, directory_name: &str) -> Result<Vec<ArchiveVolume>> {
    if paths.is_empty() {
        return Err(Error::Compression {
            path: directory_name.into(),
            message: "no volumes were produced".to_owned(),
        });
    }

    paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| {
            let size = fs::metadata(&path)?.len();
            Ok(ArchiveVolume {
                path,
                directory_name: directory_name.to_owned(),
                index: i + 1,
                size,
            })
        })
        .collect()
}

fn remove_output_dir(path: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}
