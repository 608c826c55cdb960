use std::path::{Path, PathBuf};

/// Segment where the media asset tree begins. Everything from here on is the object key.
pub const ASSET_ROOT_MARKER: &str = "wp-content";

/// Converts a local or virtual path into the key used against the backend.
///
/// Paths without the marker pass through verbatim. Applying this to its own output
/// returns the same key.
pub fn to_object_key(path: &str) -> &str {
    match path.find(ASSET_ROOT_MARKER) {
        Some(pos) => &path[pos..],
        None => path,
    }
}

/// Joins `path` onto `base` unless `path` is already absolute.
pub fn path_join(base: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}
