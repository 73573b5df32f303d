use std::{
    collections::HashSet,
    fs,
    path::{self, Path, PathBuf},
};

use log::debug;
use walkdir::WalkDir;

use crate::{error::Result, format::format_path};

pub type ExclusionSet = HashSet<PathBuf>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDirectory {
    pub path: PathBuf,
    pub name: String,
}

/// Reads one path per line. Relative entries are resolved against
/// `base_dir`, so a bare directory name excludes that child of the base. A
/// missing file means nothing is excluded.
pub fn load_exclusions(path: &Path, base_dir: &Path) -> Result<ExclusionSet> {
    if !path.exists() {
        debug!("no exclusion list at {}", format_path(path));
        return Ok(ExclusionSet::new());
    }

    let base_dir = path::absolute(base_dir)?;
    let contents = fs::read_to_string(path)?;
    let exclusions = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| path::absolute(base_dir.join(line)))
        .collect::<std::io::Result<_>>()?;
    Ok(exclusions)
}

/// Immediate subdirectories of `base_dir` that are neither excluded by
/// absolute path nor skipped by name, sorted by path.
pub fn list_source_directories(
    base_dir: &Path,
    exclusions: &ExclusionSet,
    skip: &[String],
) -> Result<Vec<SourceDirectory>> {
    let base_dir = path::absolute(base_dir)?;
    let mut directories = vec![];

    for entry in fs::read_dir(&base_dir)? {
        let entry = entry?;
        let path = base_dir.join(entry.file_name());
        if !path.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if exclusions.contains(&path) || skip.contains(&name) {
            debug!("skipped excluded directory {}", format_path(&path));
            continue;
        }

        directories.push(SourceDirectory { path, name });
    }

    directories.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(directories)
}

/// Total size of the regular files under `path`. Entries that can't be read
/// are left out.
pub fn directory_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}
