use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use super::volume_file_name;

/// Sink that cuts a byte stream into files of exactly `max_volume_bytes`,
/// except for the last one. A file is only created once there is a byte to
/// put in it.
#[derive(Debug)]
pub struct VolumeWriter {
    dir: PathBuf,
    directory_name: String,
    max_volume_bytes: u64,
    current: Option<BufWriter<File>>,
    current_len: u64,
    volumes: Vec<PathBuf>,
}

impl VolumeWriter {
    pub fn new(dir: PathBuf, directory_name: String, max_volume_bytes: u64) -> Self {
        VolumeWriter {
            dir,
            directory_name,
            max_volume_bytes,
            current: None,
            current_len: 0,
            volumes: vec![],
        }
    }

    pub fn finish(mut self) -> io::Result<Vec<PathBuf>> {
        if let Some(file) = self.current.take() {
            file.into_inner()?.sync_all()?;
        }

        Ok(self.volumes)
    }

    fn next_volume(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.current.take() {
            file.flush()?;
        }

        let index = self.volumes.len() + 1;
        let path = self.dir.join(volume_file_name(&self.directory_name, index));
        let file = File::create(&path)?;
        self.volumes.push(path);
        self.current = Some(BufWriter::new(file));
        self.current_len = 0;
        Ok(())
    }
}

impl Write for VolumeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.current.is_none() || self.current_len >= self.max_volume_bytes {
            self.next_volume()?;
        }

        let Some(file) = self.current.as_mut() else {
            return Err(io::Error::other("no open volume"));
        };

        let remaining = self.max_volume_bytes - self.current_len;
        let len = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let written = file.write(&buf[..len])?;
        self.current_len += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.current.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}
