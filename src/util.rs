pub mod mime;
pub mod object;
pub mod path;
pub mod perms;
pub mod poll;
