use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::sleep;

use crate::{
    archive::{volume_file_name, ArchiveVolume, Compressor},
    error::{Error, Result},
    notify::Notifier,
    storage::Storage,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub silent: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<Message>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.text).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str, silent: bool) -> Result<()> {
        self.messages.lock().unwrap().push(Message {
            text: message.to_owned(),
            silent,
        });
        Ok(())
    }
}

#[derive(Debug)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _message: &str, _silent: bool) -> Result<()> {
        Err(Error::Notification("channel is down".to_owned()))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    dirs: HashSet<String>,
    uploads: Vec<String>,
    attempts: HashMap<String, usize>,
    active: usize,
    max_active: usize,
}

/// In-memory remote tree. Uploads into a directory that was never ensured
/// fail, as do uploads of files whose name is in `failing`. Uploads of names
/// in `panicking` panic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
    failing: Arc<HashSet<String>>,
    panicking: Arc<HashSet<String>>,
    delays: Arc<HashMap<String, Duration>>,
    delay: Duration,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.failing = Arc::new(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn panicking<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.panicking = Arc::new(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn delays<I: IntoIterator<Item = (S, Duration)>, S: Into<String>>(mut self, delays: I) -> Self {
        self.delays = Arc::new(delays.into_iter().map(|(n, d)| (n.into(), d)).collect());
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn uploads(&self) -> Vec<String> {
        let mut uploads = self.state.lock().unwrap().uploads.clone();
        uploads.sort();
        uploads
    }

    pub fn attempts(&self, remote_path: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.attempts.get(remote_path).copied().unwrap_or(0)
    }

    pub fn max_active(&self) -> usize {
        self.state.lock().unwrap().max_active
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state.lock().unwrap().dirs.contains(path)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ensure_dir(&self, path: &str) -> Result<()> {
        self.state.lock().unwrap().dirs.insert(path.to_owned());
        Ok(())
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let name = remote_path.rsplit('/').next().unwrap_or_default().to_owned();
        let parent = remote_path.rsplit_once('/').map(|(p, _)| p).unwrap_or_default();

        {
            let mut state = self.state.lock().unwrap();
            *state.attempts.entry(remote_path.to_owned()).or_default() += 1;
            state.active += 1;
            state.max_active = state.max_active.max(state.active);
        }

        let delay = self.delays.get(&name).copied().unwrap_or(self.delay);
        sleep(delay).await;

        if self.panicking.contains(&name) {
            panic!("storage crashed while uploading {name}");
        }

        let exists = tokio::fs::try_exists(local_path).await.unwrap_or(false);
        let mut state = self.state.lock().unwrap();
        state.active -= 1;

        if !exists {
            return Err(Error::FileDoesNotExist(local_path.to_owned()));
        }

        if !state.dirs.contains(parent) || self.failing.contains(&name) {
            return Err(Error::UploadRejected {
                path: remote_path.to_owned(),
                status: 507,
            });
        }

        state.uploads.push(remote_path.to_owned());
        Ok(())
    }
}

/// Writes two small volumes per directory, or a partial volume followed by an
/// error for directories named in `failing`.
#[derive(Debug, Clone, Default)]
pub struct FakeCompressor {
    failing: Arc<HashSet<String>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.failing = Arc::new(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Compressor for FakeCompressor {
    fn split(
        &self,
        source_dir: &Path,
        scratch_dir: &Path,
        _max_volume_bytes: u64,
    ) -> Result<Vec<ArchiveVolume>> {
        let name = source_dir.file_name().unwrap().to_string_lossy().into_owned();
        self.calls.lock().unwrap().push(name.clone());

        let output_dir = scratch_dir.join(&name);
        fs::create_dir_all(&output_dir)?;

        if self.failing.contains(&name) {
            fs::write(output_dir.join(volume_file_name(&name, 1)), b"partial")?;
            return Err(Error::Compression {
                path: source_dir.to_owned(),
                message: "codec fault".to_owned(),
            });
        }

        (1..=2)
            .map(|index| {
                let path = output_dir.join(volume_file_name(&name, index));
                fs::write(&path, b"volume")?;
                Ok(ArchiveVolume {
                    path,
                    directory_name: name.clone(),
                    index,
                    size: 6,
                })
            })
            .collect()
    }
}

pub fn write_volumes(dir: &Path, directory_name: &str, count: usize) -> Vec<ArchiveVolume> {
    fs::create_dir_all(dir).unwrap();
    (1..=count)
        .map(|index| {
            let path = dir.join(volume_file_name(directory_name, index));
            fs::write(&path, vec![b'x'; index]).unwrap();
            ArchiveVolume {
                path,
                directory_name: directory_name.to_owned(),
                index,
                size: index as u64,
            }
        })
        .collect()
}
