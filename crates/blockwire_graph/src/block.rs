// SPDX-License-Identifier: MIT OR Apache-2.0
//! Block definitions and port layout.

use crate::port::{Port, PortDirection, PortId};
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Block visual dimensions
pub const BLOCK_WIDTH: f32 = 180.0;
/// Height of the title row
pub const BLOCK_HEADER_HEIGHT: f32 = 24.0;
/// Height of a single port row
pub const PORT_HEIGHT: f32 = 22.0;
/// Radius of the port handle
pub const PORT_RADIUS: f32 = 6.0;
const BLOCK_BOTTOM_PADDING: f32 = 8.0;

/// Unique identifier for a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub Uuid);

impl BlockId {
    /// Create a new random block ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

/// A block instance: a named container owning an ordered list of ports.
#[derive(Debug, Clone)]
pub struct Block {
    /// Unique instance ID
    pub id: BlockId,
    /// Display name
    pub name: String,
    /// Top-left corner in scene space
    pub position: Pos2,
    ports: Vec<Port>,
}

impl Block {
    /// Create a new block without ports
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: BlockId::new(),
            name: name.into(),
            position: Pos2::ZERO,
            ports: Vec::new(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Pos2::new(x, y);
        self
    }

    /// Builder form of [`Block::add_input`]
    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.add_input(name);
        self
    }

    /// Builder form of [`Block::add_output`]
    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.add_output(name);
        self
    }

    /// Append a port; ports keep creation order
    pub fn add_port(&mut self, name: impl Into<String>, direction: PortDirection) -> PortId {
        let port = Port::new(self.id, name, direction);
        let id = port.id;
        self.ports.push(port);
        id
    }

    /// Append an input port
    pub fn add_input(&mut self, name: impl Into<String>) -> PortId {
        self.add_port(name, PortDirection::Input)
    }

    /// Append an output port
    pub fn add_output(&mut self, name: impl Into<String>) -> PortId {
        self.add_port(name, PortDirection::Output)
    }

    /// All ports in creation order
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub(crate) fn ports_mut(&mut self) -> &mut [Port] {
        &mut self.ports
    }

    /// Get a port by ID
    pub fn port(&self, port_id: PortId) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == port_id)
    }

    pub(crate) fn port_mut(&mut self, port_id: PortId) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.id == port_id)
    }

    /// Find the first port with the given name
    pub fn port_named(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Position of a port in creation order
    pub fn port_index(&self, port_id: PortId) -> Option<usize> {
        self.ports.iter().position(|p| p.id == port_id)
    }

    /// Bounding rectangle in scene space
    pub fn rect(&self) -> Rect {
        let height =
            BLOCK_HEADER_HEIGHT + self.ports.len() as f32 * PORT_HEIGHT + BLOCK_BOTTOM_PADDING;
        Rect::from_min_size(self.position, Vec2::new(BLOCK_WIDTH, height))
    }

    /// Centre of the port handle at `index`.
    ///
    /// Each port owns one row; inputs sit on the left edge, outputs on the right.
    pub fn port_center(&self, index: usize) -> Option<Pos2> {
        let port = self.ports.get(index)?;
        let y = self.position.y
            + BLOCK_HEADER_HEIGHT
            + index as f32 * PORT_HEIGHT
            + PORT_HEIGHT / 2.0;
        let x = match port.direction {
            PortDirection::Input => self.position.x,
            PortDirection::Output => self.position.x + BLOCK_WIDTH,
        };
        Some(Pos2::new(x, y))
    }

    /// Scene position of a port by ID
    pub fn port_position(&self, port_id: PortId) -> Option<Pos2> {
        self.port_index(port_id).and_then(|i| self.port_center(i))
    }

    /// Bounding square of the port handle at `index`
    pub fn port_rect(&self, index: usize) -> Option<Rect> {
        self.port_center(index)
            .map(|c| Rect::from_center_size(c, Vec2::splat(PORT_RADIUS * 2.0)))
    }
}
