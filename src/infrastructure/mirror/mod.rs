//! Mirror Infrastructure - 远端对象镜像

pub mod manifest;
pub mod remote_mirror;

pub use remote_mirror::{MirrorError, RemoteMirror};
