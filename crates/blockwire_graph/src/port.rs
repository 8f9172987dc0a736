// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for block inputs/outputs.

use crate::block::BlockId;
use crate::connection::ConnectionId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl PortDirection {
    /// The direction a compatible peer must have
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }

    /// Whether this is an output port
    pub fn is_output(self) -> bool {
        self == Self::Output
    }
}

/// A port on a block.
///
/// The owning block and the set of connections are back-references only;
/// the [`Graph`](crate::graph::Graph) keeps them in sync.
#[derive(Debug, Clone)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    pub(crate) block: BlockId,
    pub(crate) connections: IndexSet<ConnectionId>,
}

impl Port {
    pub(crate) fn new(block: BlockId, name: impl Into<String>, direction: PortDirection) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction,
            block,
            connections: IndexSet::new(),
        }
    }

    /// Block that owns this port
    pub fn block(&self) -> BlockId {
        self.block
    }

    /// Whether this is an output port
    pub fn is_output(&self) -> bool {
        self.direction.is_output()
    }

    /// Connections currently attached to this port, in attach order
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.connections.iter().copied()
    }

    /// Number of attached connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Check whether the two ports may be joined, ignoring existing edges.
    ///
    /// Direction inequality is symmetric: either side may be the output.
    pub fn can_pair_with(&self, other: &Port) -> bool {
        self.block != other.block && self.direction != other.direction
    }
}
