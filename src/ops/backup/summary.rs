use std::time::Duration;

use crate::{
    format::{format_duration, format_size},
    ops::upload::{failed_volume_names, UploadResult},
};

/// What happened to one source directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryOutcome {
    pub name: String,
    pub size: u64,
    pub volumes: usize,
    pub uploaded: usize,
    pub bytes_uploaded: u64,
    pub failed_volumes: Vec<String>,
    /// Set when the directory could not be processed at all.
    pub error: Option<String>,
}

impl DirectoryOutcome {
    pub fn failed(name: &str, size: u64, error: String) -> Self {
        DirectoryOutcome {
            name: name.to_owned(),
            size,
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn from_results(name: &str, size: u64, results: &[UploadResult]) -> Self {
        let succeeded = results.iter().filter(|result| result.is_success());
        DirectoryOutcome {
            name: name.to_owned(),
            size,
            volumes: results.len(),
            uploaded: succeeded.clone().count(),
            bytes_uploaded: succeeded.map(|result| result.volume.size).sum(),
            failed_volumes: failed_volume_names(results),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed_volumes.is_empty()
    }

    pub fn message(&self) -> String {
        let name = &self.name;
        if let Some(error) = &self.error {
            format!("Failed to backup {name}: {error}")
        } else if self.failed_volumes.is_empty() {
            format!("Completed {name}: {} part(s) uploaded", self.uploaded)
        } else {
            format!(
                "Completed {name} with errors: {} succeeded, {} failed ({})",
                self.uploaded,
                self.failed_volumes.len(),
                self.failed_volumes.join(", ")
            )
        }
    }
}

/// Totals for one run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub directories_processed: usize,
    pub directories_failed: usize,
    pub volumes_uploaded: usize,
    pub volumes_failed: usize,
    pub bytes_uploaded: u64,
    pub outcomes: Vec<DirectoryOutcome>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record(&mut self, outcome: DirectoryOutcome) {
        self.directories_processed += 1;
        if !outcome.is_success() {
            self.directories_failed += 1;
        }

        self.volumes_uploaded += outcome.uploaded;
        self.volumes_failed += outcome.failed_volumes.len();
        self.bytes_uploaded += outcome.bytes_uploaded;
        self.outcomes.push(outcome);
    }

    pub fn failed_volumes(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .flat_map(|outcome| outcome.failed_volumes.iter().map(String::as_str))
    }

    pub fn is_success(&self) -> bool {
        self.directories_failed == 0
    }

    pub fn message(&self) -> String {
        format!(
            "🎉 Backup process completed!\n\
             Directories: {} processed, {} failed\n\
             Total uploads: {} succeeded, {} failed ({})\n\
             Elapsed: {}",
            self.directories_processed,
            self.directories_failed,
            self.volumes_uploaded,
            self.volumes_failed,
            format_size(self.bytes_uploaded),
            format_duration(self.elapsed),
        )
    }
}
