// SPDX-License-Identifier: MIT OR Apache-2.0
//! Block graph editing core for Blockwire.
//!
//! Blocks own ordered, directional ports; connections join an output port
//! to an input port on a different block. The crate provides:
//! - The graph store with cascading deletion and hit-testing
//! - The interaction controller that turns pointer/keyboard events into
//!   connection creation, selection and deletion
//! - A binary record stream for saving and loading graphs
//! - A read-only inspection pass over all ports
//!
//! Rendering and windowing stay outside: geometry is exposed as bounds and
//! polylines for a host to draw.

pub mod block;
pub mod connection;
pub mod editor;
pub mod error;
pub mod graph;
pub mod inspection;
pub mod port;
pub mod serialization;
pub mod settings;

pub use block::{Block, BlockId};
pub use connection::{Connection, ConnectionId, Endpoint, ProvisionalConnection};
pub use editor::{EventDisposition, InputEvent, InteractionState, NodesEditor};
pub use error::{LoadError, SaveError};
pub use graph::{ConnectionError, Graph, HitTarget};
pub use inspection::{InspectionReport, PortReport};
pub use port::{Port, PortDirection, PortId};
pub use settings::{EditorSettings, SettingsError};
