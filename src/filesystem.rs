use std::{path::PathBuf, time::SystemTime};

use tracing::{error, info, span, Level};

use crate::{fs, model};

/// What a backend can and cannot model, so callers can special-case it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// `false`: directories are never stored. `is_dir` reports every non-file as a directory.
    pub directories: bool,
    /// `false`: `move_file` is copy then delete and can leave both paths present.
    pub atomic_move: bool,
}

/// Filesystem contract consumed by the host's dispatcher.
///
/// Failures are reported as `false` / `None`. Callers treat these as authoritative
/// and never see a cause; causes are logged instead.
pub trait Filesystem {
    fn capabilities(&self) -> Capabilities;

    fn connect(&mut self) -> bool;
    fn get_contents(&self, path: &str) -> Option<Vec<u8>>;
    fn get_contents_array(&self, path: &str) -> Option<Vec<String>>;
    fn put_contents(&self, path: &str, contents: &[u8], mode: Option<u32>) -> bool;
    fn cwd(&self) -> Option<PathBuf>;
    fn chdir(&mut self, dir: &str) -> bool;
    fn chgrp(&self, path: &str, group: &str, recursive: bool) -> bool;
    fn chmod(&self, path: &str, mode: Option<u32>, recursive: bool) -> bool;
    fn chown(&self, path: &str, owner: &str, recursive: bool) -> bool;
    fn owner(&self, path: &str) -> Option<String>;
    fn group(&self, path: &str) -> Option<String>;
    fn getchmod(&self, path: &str) -> Option<u32>;
    fn copy(&self, src: &str, dest: &str, overwrite: bool) -> bool;
    fn move_file(&self, src: &str, dest: &str, overwrite: bool) -> bool;
    fn delete(&self, path: &str, recursive: bool) -> bool;
    fn exists(&self, path: &str) -> bool;
    fn is_file(&self, path: &str) -> bool;
    fn is_dir(&self, path: &str) -> bool;
    fn is_readable(&self, path: &str) -> bool;
    fn is_writable(&self, path: &str) -> bool;
    fn atime(&self, path: &str) -> Option<SystemTime>;
    fn mtime(&self, path: &str) -> Option<SystemTime>;
    fn size(&self, path: &str) -> Option<i64>;
    fn touch(&self, path: &str, mtime: Option<SystemTime>, atime: Option<SystemTime>) -> bool;
    fn mkdir(&self, path: &str, mode: Option<u32>) -> bool;
    fn rmdir(&self, path: &str, recursive: bool) -> bool;
    fn dirlist(&self, path: &str, include_hidden: bool, recursive: bool) -> Option<Vec<String>>;
}

/// Logs the failure cause and collapses the result into the sentinel form.
fn settle<T>(result: Result<T, model::fs::FSError>) -> Option<T> {
    match result {
        Err(err) => {
            error!(error_message=%err, error_group=err.group());
            None
        }
        Ok(value) => Some(value),
    }
}

impl Filesystem for fs::ObjectFS {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            directories: false,
            atomic_move: false,
        }
    }

    fn connect(&mut self) -> bool {
        let span = span!(Level::INFO, "connect", context = "connect");
        let _e = span.enter();
        info!("called");

        settle(self.session()).is_some()
    }

    fn get_contents(&self, path: &str) -> Option<Vec<u8>> {
        let span = span!(Level::INFO, "get_contents", context = "get_contents");
        let _e = span.enter();
        info!(path = path, "called");

        settle(self.try_read_all(path))
    }

    fn get_contents_array(&self, path: &str) -> Option<Vec<String>> {
        let span = span!(Level::INFO, "get_contents_array", context = "get_contents_array");
        let _e = span.enter();
        info!(path = path, "called");

        settle(self.try_read_lines(path))
    }

    fn put_contents(&self, path: &str, contents: &[u8], mode: Option<u32>) -> bool {
        let span = span!(Level::INFO, "put_contents", context = "put_contents");
        let _e = span.enter();
        info!(path = path, size = contents.len(), mode = mode, "called");

        settle(self.try_write_all(path, contents, mode)).is_some()
    }

    fn cwd(&self) -> Option<PathBuf> {
        Some(self.staging_dir.clone())
    }

    fn chdir(&mut self, _dir: &str) -> bool {
        true
    }

    fn chgrp(&self, _path: &str, _group: &str, _recursive: bool) -> bool {
        true
    }

    fn chmod(&self, path: &str, mode: Option<u32>, recursive: bool) -> bool {
        let span = span!(Level::INFO, "chmod", context = "chmod");
        let _e = span.enter();
        info!(path = path, mode = mode, recursive = recursive, "called");

        settle(self.try_chmod(path, mode)).is_some()
    }

    fn chown(&self, _path: &str, _owner: &str, _recursive: bool) -> bool {
        true
    }

    fn owner(&self, path: &str) -> Option<String> {
        let span = span!(Level::INFO, "owner", context = "owner");
        let _e = span.enter();
        info!(path = path, "called");

        settle(self.try_owner())
    }

    fn group(&self, path: &str) -> Option<String> {
        let span = span!(Level::INFO, "group", context = "group");
        let _e = span.enter();
        info!(path = path, "called");

        settle(self.try_owner())
    }

    fn getchmod(&self, path: &str) -> Option<u32> {
        let span = span!(Level::INFO, "getchmod", context = "getchmod");
        let _e = span.enter();
        info!(path = path, "called");

        settle(self.try_getchmod(path))
    }

    fn copy(&self, src: &str, dest: &str, overwrite: bool) -> bool {
        let span = span!(Level::INFO, "copy", context = "copy");
        let _e = span.enter();
        info!(src = src, dest = dest, overwrite = overwrite, "called");

        settle(self.try_copy(src, dest, overwrite)).is_some()
    }

    fn move_file(&self, src: &str, dest: &str, overwrite: bool) -> bool {
        let span = span!(Level::INFO, "move", context = "move");
        let _e = span.enter();
        info!(src = src, dest = dest, overwrite = overwrite, "called");

        settle(self.try_move(src, dest, overwrite)).is_some()
    }

    fn delete(&self, path: &str, recursive: bool) -> bool {
        let span = span!(Level::INFO, "delete", context = "delete");
        let _e = span.enter();
        info!(path = path, recursive = recursive, "called");

        settle(self.try_delete(path, recursive)).is_some()
    }

    fn exists(&self, path: &str) -> bool {
        let span = span!(Level::INFO, "exists", context = "exists");
        let _e = span.enter();
        info!(path = path, "called");

        settle(self.try_exists(path)).unwrap_or(false)
    }

    fn is_file(&self, path: &str) -> bool {
        self.exists(path)
    }

    fn is_dir(&self, path: &str) -> bool {
        // A path that is not a file becomes a directory once a nested key is written.
        !self.is_file(path)
    }

    fn is_readable(&self, path: &str) -> bool {
        let span = span!(Level::INFO, "is_readable", context = "is_readable");
        let _e = span.enter();
        info!(path = path, "called");

        settle(self.try_is_readable(path)).unwrap_or(false)
    }

    fn is_writable(&self, path: &str) -> bool {
        self.is_file(path)
    }

    fn atime(&self, path: &str) -> Option<SystemTime> {
        self.mtime(path)
    }

    fn mtime(&self, path: &str) -> Option<SystemTime> {
        let span = span!(Level::INFO, "mtime", context = "mtime");
        let _e = span.enter();
        info!(path = path, "called");

        settle(self.try_modified_time(path))
    }

    fn size(&self, path: &str) -> Option<i64> {
        let span = span!(Level::INFO, "size", context = "size");
        let _e = span.enter();
        info!(path = path, "called");

        settle(self.try_size(path))
    }

    fn touch(&self, _path: &str, _mtime: Option<SystemTime>, _atime: Option<SystemTime>) -> bool {
        true
    }

    fn mkdir(&self, _path: &str, _mode: Option<u32>) -> bool {
        true
    }

    fn rmdir(&self, _path: &str, _recursive: bool) -> bool {
        true
    }

    fn dirlist(&self, path: &str, include_hidden: bool, recursive: bool) -> Option<Vec<String>> {
        let span = span!(Level::INFO, "dirlist", context = "dirlist");
        let _e = span.enter();
        info!(path = path, include_hidden = include_hidden, recursive = recursive, "called");

        settle(self.try_list_directory(path))
    }
}
