//! Device-node discovery.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use crate::device::Device;

/// Pattern matching every evdev node on a standard system.
pub const DEFAULT_DEVICE_GLOB: &str = "/dev/input/event*";

/// Whether `path` exists and is a character device.
pub fn is_event_device(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.file_type().is_char_device())
        .unwrap_or(false)
}

/// Expands a pattern with at most one `*` wildcard into the matching
/// paths, sorted. A pattern without a wildcard matches at most itself;
/// a missing directory matches nothing.
fn expand_pattern(pattern: &str) -> io::Result<Vec<PathBuf>> {
    let Some(star) = pattern.find('*') else {
        let path = PathBuf::from(pattern);
        return Ok(if path.exists() { vec![path] } else { Vec::new() });
    };

    let (head, tail) = (&pattern[..star], &pattern[star + 1..]);
    let (dir, prefix) = match head.rfind('/') {
        Some(slash) => (&head[..slash + 1], &head[slash + 1..]),
        None => (".", head),
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.len() >= prefix.len() + tail.len()
            && name.starts_with(prefix)
            && name.ends_with(tail)
        {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Paths matching `pattern` that are character devices, in the
/// pattern's natural (sorted) order.
///
/// Matches that are regular files, or that vanish between expansion
/// and the stat call, are left out rather than reported as errors.
pub fn list_device_paths(pattern: &str) -> io::Result<Vec<PathBuf>> {
    Ok(expand_pattern(pattern)?
        .into_iter()
        .filter(|p| is_event_device(p))
        .collect())
}

/// Opens every device matched by `pattern`.
///
/// A node that refuses to open (vanished mid-enumeration, or not
/// readable by this user) is skipped, not fatal to the enumeration
/// as a whole.
pub fn list_devices(pattern: &str) -> io::Result<Vec<Device>> {
    let mut devices = Vec::new();
    for path in list_device_paths(pattern)? {
        match Device::open(&path) {
            Ok(device) => devices.push(device),
            Err(e) => log::debug!("skipping {}: {e}", path.display()),
        }
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TempDir(PathBuf);

    impl TempDir {
        fn new(label: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("evmon-{label}-{}", std::process::id()));
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn touch(&self, name: &str) {
            fs::write(self.0.join(name), b"").unwrap();
        }

        fn pattern(&self, pat: &str) -> String {
            format!("{}/{pat}", self.0.display())
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn expansion_matches_prefix_and_sorts() {
        let dir = TempDir::new("expand");
        dir.touch("event2");
        dir.touch("event0");
        dir.touch("event1");
        dir.touch("mouse0");

        let paths = expand_pattern(&dir.pattern("event*")).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["event0", "event1", "event2"]);
    }

    #[test]
    fn missing_directory_matches_nothing() {
        let paths = expand_pattern("/definitely/not/here/event*").unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn regular_files_are_not_devices() {
        let dir = TempDir::new("filter");
        dir.touch("event0");
        dir.touch("event1");

        assert!(!is_event_device(&dir.0.join("event0")));
        assert!(
            list_device_paths(&dir.pattern("event*"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn nonexistent_path_is_not_a_device() {
        assert!(!is_event_device(Path::new("/definitely/not/here")));
    }

    #[test]
    fn character_devices_pass_the_filter() {
        // /dev/null is the one character device every environment has.
        assert!(is_event_device(Path::new("/dev/null")));
        let paths = list_device_paths("/dev/null").unwrap();
        assert_eq!(paths, vec![PathBuf::from("/dev/null")]);
    }
}
