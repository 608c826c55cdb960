use crate::model::fs::AccessLevel;

/// Bits of a mode that apply to everyone outside the owner's group.
const OTHER_BITS: u32 = 0o7;
const OTHER_WRITE: u32 = 0o2;

/// Maps a POSIX mode onto the coarser backend access level.
///
/// Only the "other" permission digit matters: none means private, read without
/// write means public-read, any write bit means public-read-write. A missing or
/// zero mode falls back to public-read.
pub fn to_access_level(mode: Option<u32>) -> AccessLevel {
    let mode = match mode {
        None | Some(0) => return AccessLevel::PublicRead,
        Some(mode) => mode,
    };

    let other = mode & OTHER_BITS;
    if other == 0 {
        AccessLevel::Private
    } else if other & OTHER_WRITE == 0 {
        AccessLevel::PublicRead
    } else {
        AccessLevel::PublicReadWrite
    }
}

/// Canonical mode for an access level. Not an inverse of `to_access_level`.
pub fn to_posix_mode(level: AccessLevel) -> u32 {
    match level {
        AccessLevel::Private => 0o600,
        AccessLevel::PublicRead => 0o644,
        AccessLevel::PublicReadWrite => 0o666,
    }
}
