//! Finding audio files under a root path

use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions picked up when walking a directory (compared case-insensitively).
pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "flac"];

pub fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// Lazily enumerate audio files under `root`.
///
/// A directory is walked recursively in file-name order and only `.mp3`,
/// `.wav` and `.flac` files are yielded. A root that is not a directory is
/// yielded as-is whatever its extension, so a single file can always be
/// checked explicitly. Unreadable entries are logged and skipped.
pub fn audio_files<P: AsRef<Path>>(root: P) -> Box<dyn Iterator<Item = PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Box::new(std::iter::once(root.to_path_buf()));
    }

    let entries = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_audio_extension(entry.path()))
        .map(|entry| entry.into_path());

    Box::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_extension_filter() {
        assert!(has_audio_extension(Path::new("a.mp3")));
        assert!(has_audio_extension(Path::new("a.WAV")));
        assert!(has_audio_extension(Path::new("dir/a.Flac")));
        assert!(!has_audio_extension(Path::new("a.ogg")));
        assert!(!has_audio_extension(Path::new("flac")));
        assert!(!has_audio_extension(Path::new("notes.txt")));
    }

    #[test]
    fn test_walks_recursively_in_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.wav"));
        touch(&dir.path().join("a.mp3"));
        touch(&dir.path().join("cover.jpg"));
        touch(&dir.path().join("disc2/c.FLAC"));
        touch(&dir.path().join("disc2/d.ogg"));

        let found: Vec<PathBuf> = audio_files(dir.path())
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("a.mp3"),
                PathBuf::from("b.wav"),
                PathBuf::from("disc2").join("c.FLAC"),
            ]
        );
    }

    #[test]
    fn test_file_root_is_yielded_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.ogg");
        touch(&path);

        let found: Vec<PathBuf> = audio_files(&path).collect();
        assert_eq!(found, vec![path]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(audio_files(dir.path()).count(), 0);
    }
}
