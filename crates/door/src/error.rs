use thiserror::Error;

/// User-facing rejections. Anything else in this layer degrades to a
/// logged no-op rather than an error.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DoorActionError {
    #[error("no control button is linked to this door")]
    NoLinkedButton,
    #[error("no power")]
    Unpowered,
    #[error("this door has no remote lock")]
    NotRemote,
}
