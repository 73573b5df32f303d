use std::{borrow::Cow, path::Path, time::Duration};

use humansize::{ToF64, Unsigned, BINARY};

pub fn format_path(path: &Path) -> String {
    let path_str = path.to_string_lossy();
    let escaped_path = snailquote::escape(&path_str);
    if let Cow::Owned(owned_path) = escaped_path {
        owned_path
    } else {
        path_str.to_string()
    }
}

pub fn format_size<T: ToF64 + Unsigned>(input: T) -> String {
    humansize::format_size(input, BINARY)
}

/// Rounds to whole seconds so progress messages stay short.
pub fn format_duration(duration: Duration) -> String {
    let rounded = Duration::from_secs(duration.as_secs());
    humantime::format_duration(rounded).to_string()
}

#[cfg(test)]
mod tests {
    use std::{path::Path, time::Duration};

    use super::{format_duration, format_path, format_size};

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size(512u64), "512 B");
        assert_eq!(format_size(1536u64), "1.50 KiB");
        assert_eq!(format_size(3u64 << 30), "3 GiB");
    }

    #[test]
    fn plain_paths_are_not_quoted() {
        assert_eq!(format_path(Path::new("/srv/docs")), "/srv/docs");
    }

    #[test]
    fn paths_with_spaces_are_quoted() {
        let formatted = format_path(Path::new("/srv/my docs"));
        assert_ne!(formatted, "/srv/my docs");
        assert!(formatted.contains("/srv/my docs"));
    }

    #[test]
    fn durations_drop_subseconds() {
        assert_eq!(format_duration(Duration::from_millis(61_500)), "1m 1s");
    }
}
