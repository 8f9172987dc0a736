// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistence errors.

use crate::graph::ConnectionError;
use crate::port::PortId;
use thiserror::Error;

/// Error while writing a graph
#[derive(Debug, Error)]
pub enum SaveError {
    /// Record could not be encoded or written
    #[error("Failed to encode record: {0}")]
    Encode(#[from] bincode::Error),

    /// A connection references a port that is not in the store
    #[error("Connection references unknown port: {0:?}")]
    DanglingPort(PortId),
}

/// Error while reading a graph. The store is left empty.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading the stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown tag, truncated record or malformed payload
    #[error("Corrupt record: {0}")]
    Decode(#[from] bincode::Error),

    /// Two ports were declared with the same key
    #[error("Port key {0} declared twice")]
    DuplicatePortKey(u64),

    /// A connection references a port key no earlier block declared
    #[error("Connection references undeclared port key {0}")]
    UnresolvedPort(u64),

    /// A connection record joins ports that may not be joined
    #[error("Invalid connection record: {0}")]
    InvalidConnection(#[source] ConnectionError),
}
