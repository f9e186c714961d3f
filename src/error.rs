//! Error types for device access.

use std::io;

use thiserror::Error;

/// Errors produced while opening a device node and discovering its
/// identity and capabilities.
///
/// Construction is all-or-nothing: when any mandatory query fails, no
/// handle is returned.
#[derive(Debug, Error)]
pub enum OpenError {
    /// The device node does not exist.
    #[error("no such device node: {0}")]
    NotFound(String),

    /// The device node exists but cannot be opened by this user.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A mandatory identity query (protocol version, hardware id or
    /// device name) failed.
    #[error("identity query failed: {0}")]
    Identity(#[source] io::Error),

    /// A capability bitmask query failed with something other than the
    /// tolerated invalid-argument cause.
    #[error("capability query failed: {0}")]
    Capability(#[source] io::Error),

    /// Any other operating-system failure while opening the node.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors produced while reading the event stream.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The underlying read failed, or the stream ended.
    #[error("device read failed: {0}")]
    Io(#[from] io::Error),

    /// The byte count was not a multiple of the wire record width.
    #[error("read {len} bytes, not a multiple of the event record width")]
    Decode { len: usize },

    /// The handle was closed before the read.
    #[error("device handle is closed")]
    Closed,
}

/// Errors produced while acquiring or releasing an exclusive grab.
#[derive(Debug, Error)]
pub enum GrabError {
    /// Another client already holds the grab.
    #[error("device is grabbed by another client")]
    AlreadyGrabbed,

    /// The device does not support exclusive access.
    #[error("device does not support exclusive grab")]
    Unsupported,

    /// The handle was closed before the request.
    #[error("device handle is closed")]
    Closed,

    /// Any other failure of the grab ioctl.
    #[error("grab request failed: {0}")]
    Io(#[from] io::Error),
}
