mod backup;
mod upload;

pub use self::backup::Backup;
