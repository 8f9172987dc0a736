// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph store containing blocks and connections.

use crate::block::{Block, BlockId};
use crate::connection::{
    wire_path, Connection, ConnectionId, ProvisionalConnection, DEFAULT_CURVATURE,
};
use crate::port::{Port, PortDirection, PortId};
use egui::{Pos2, Rect, Vec2};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Side of the square searched around a hit-test point
pub const DEFAULT_HIT_TOLERANCE: f32 = 3.0;

/// A graph entity found under a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitTarget {
    /// A port handle
    Port(PortId),
    /// A block body
    Block(BlockId),
    /// A connection curve
    Connection(ConnectionId),
}

/// The authoritative set of live blocks and connections.
///
/// Both collections keep insertion order, which drives save order and
/// hit-test stacking.
#[derive(Debug, Clone)]
pub struct Graph {
    blocks: IndexMap<BlockId, Block>,
    connections: IndexMap<ConnectionId, Connection>,
    /// Owning block of every live port
    port_owners: HashMap<PortId, BlockId>,
    curvature: f32,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            blocks: IndexMap::new(),
            connections: IndexMap::new(),
            port_owners: HashMap::new(),
            curvature: DEFAULT_CURVATURE,
        }
    }

    /// Horizontal control offset used for connection curves
    pub fn curvature(&self) -> f32 {
        self.curvature
    }

    /// Change the curve offset and recompute every path
    pub fn set_curvature(&mut self, curvature: f32) {
        self.curvature = curvature;
        let ids: Vec<_> = self.connections.keys().copied().collect();
        for id in ids {
            self.update_path(id);
        }
    }

    /// Add a block to the graph.
    ///
    /// Ids already present in the store are reissued, so a cloned block
    /// becomes a distinct entity.
    pub fn add_block(&mut self, mut block: Block) -> BlockId {
        if self.blocks.contains_key(&block.id) {
            block.id = BlockId::new();
        }
        let id = block.id;
        for port in block.ports_mut() {
            if self.port_owners.contains_key(&port.id) {
                port.id = PortId::new();
            }
            port.block = id;
            port.connections.clear();
            self.port_owners.insert(port.id, id);
        }
        self.blocks.insert(id, block);
        id
    }

    /// Append a port to a block already in the graph
    pub fn add_port(
        &mut self,
        block_id: BlockId,
        name: impl Into<String>,
        direction: PortDirection,
    ) -> Option<PortId> {
        let block = self.blocks.get_mut(&block_id)?;
        let port_id = block.add_port(name, direction);
        self.port_owners.insert(port_id, block_id);
        Some(port_id)
    }

    /// Remove a block, its ports and every connection touching them
    pub fn remove_block(&mut self, block_id: BlockId) -> Option<Block> {
        let attached: Vec<ConnectionId> = self
            .blocks
            .get(&block_id)?
            .ports()
            .iter()
            .flat_map(Port::connections)
            .collect();
        for conn_id in &attached {
            self.disconnect(*conn_id);
        }

        let block = self.blocks.shift_remove(&block_id)?;
        for port in block.ports() {
            self.port_owners.remove(&port.id);
        }
        tracing::debug!(
            block = %block.name,
            ports = block.ports().len(),
            connections = attached.len(),
            "removed block"
        );
        Some(block)
    }

    /// Get a block by ID
    pub fn block(&self, block_id: BlockId) -> Option<&Block> {
        self.blocks.get(&block_id)
    }

    /// Get all blocks in insertion order
    pub fn blocks(&self) -> impl DoubleEndedIterator<Item = &Block> {
        self.blocks.values()
    }

    /// Get all block IDs
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.keys().copied()
    }

    /// Get the number of blocks
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Rename a block
    pub fn rename_block(&mut self, block_id: BlockId, name: impl Into<String>) -> bool {
        match self.blocks.get_mut(&block_id) {
            Some(block) => {
                block.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Move a block and re-route every connection attached to it
    pub fn move_block(&mut self, block_id: BlockId, position: Pos2) -> bool {
        let Some(block) = self.blocks.get_mut(&block_id) else {
            return false;
        };
        block.position = position;
        let attached: Vec<ConnectionId> =
            block.ports().iter().flat_map(Port::connections).collect();
        for conn_id in attached {
            self.update_path(conn_id);
        }
        true
    }

    /// Get a port by ID
    pub fn port(&self, port_id: PortId) -> Option<&Port> {
        let owner = self.port_owners.get(&port_id)?;
        self.blocks.get(owner)?.port(port_id)
    }

    /// Scene position of a port handle
    pub fn port_position(&self, port_id: PortId) -> Option<Pos2> {
        let owner = self.port_owners.get(&port_id)?;
        self.blocks.get(owner)?.port_position(port_id)
    }

    /// Total number of ports across all blocks
    pub fn port_count(&self) -> usize {
        self.port_owners.len()
    }

    /// Check that two ports may be joined by a new connection
    pub fn can_connect(&self, a: PortId, b: PortId) -> Result<(), ConnectionError> {
        let port_a = self.port(a).ok_or(ConnectionError::PortNotFound(a))?;
        let port_b = self.port(b).ok_or(ConnectionError::PortNotFound(b))?;

        if port_a.block == port_b.block {
            return Err(ConnectionError::SelfLoop);
        }
        if port_a.direction == port_b.direction {
            return Err(ConnectionError::SameDirection);
        }
        if self.is_connected(a, b) {
            return Err(ConnectionError::AlreadyConnected);
        }
        Ok(())
    }

    /// Add a connection between two ports, in either direction order
    pub fn connect(&mut self, a: PortId, b: PortId) -> Result<ConnectionId, ConnectionError> {
        self.can_connect(a, b)?;

        let connection = Connection::new(a, b);
        let id = connection.id;
        self.connections.insert(id, connection);
        for port_id in [a, b] {
            if let Some(port) = self.port_mut(port_id) {
                port.connections.insert(id);
            }
        }
        self.update_path(id);
        Ok(id)
    }

    /// Promote a provisional connection whose loose end has been bound
    pub fn commit(
        &mut self,
        provisional: &ProvisionalConnection,
    ) -> Result<ConnectionId, ConnectionError> {
        let (a, b) = provisional.bound_ports().ok_or(ConnectionError::Unbound)?;
        self.connect(a, b)
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.shift_remove(&connection_id)?;
        for port_id in [connection.port_a, connection.port_b] {
            if let Some(port) = self.port_mut(port_id) {
                port.connections.shift_remove(&connection_id);
            }
        }
        Some(connection)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections in insertion order
    pub fn connections(&self) -> impl DoubleEndedIterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get connections attached to a port
    pub fn connections_for_port(&self, port_id: PortId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.involves_port(port_id))
    }

    /// Get connections touching any port of a block
    pub fn connections_for_block(&self, block_id: BlockId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| {
            self.port_owners.get(&c.port_a) == Some(&block_id)
                || self.port_owners.get(&c.port_b) == Some(&block_id)
        })
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether a connection already joins the two ports, in either order
    pub fn is_connected(&self, a: PortId, b: PortId) -> bool {
        self.port(a).is_some_and(|port| {
            port.connections()
                .filter_map(|id| self.connections.get(&id))
                .any(|c| c.joins(a, b))
        })
    }

    /// Remove every block and connection
    pub fn clear(&mut self) {
        self.connections.clear();
        self.blocks.clear();
        self.port_owners.clear();
    }

    /// Whether the graph holds nothing
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.connections.is_empty()
    }

    /// Recompute the rendered path of a connection from its port positions
    pub fn update_path(&mut self, connection_id: ConnectionId) {
        let Some(connection) = self.connections.get(&connection_id) else {
            return;
        };
        let (Some(port_a), Some(pos_a), Some(pos_b)) = (
            self.port(connection.port_a),
            self.port_position(connection.port_a),
            self.port_position(connection.port_b),
        ) else {
            return;
        };
        let path = if port_a.is_output() {
            wire_path(pos_a, pos_b, self.curvature)
        } else {
            wire_path(pos_b, pos_a, self.curvature)
        };
        if let Some(connection) = self.connections.get_mut(&connection_id) {
            connection.set_path(path);
        }
    }

    /// Find the topmost graph entity within a `tolerance`-sided square
    /// around `pos`.
    ///
    /// Later blocks stack above earlier ones and a block's ports above its
    /// body; connections lie beneath all blocks.
    pub fn hit_test(&self, pos: Pos2, tolerance: f32) -> Option<HitTarget> {
        let probe = Rect::from_center_size(pos, Vec2::splat(tolerance));

        for block in self.blocks.values().rev() {
            let port_hit = (0..block.ports().len()).rev().find(|&i| {
                block.port_rect(i).is_some_and(|rect| rect.intersects(probe))
            });
            if let Some(i) = port_hit {
                return Some(HitTarget::Port(block.ports()[i].id));
            }
            if block.rect().intersects(probe) {
                return Some(HitTarget::Block(block.id));
            }
        }

        self.connections
            .values()
            .rev()
            .find(|c| c.hit(pos, tolerance / 2.0))
            .map(|c| HitTarget::Connection(c.id))
    }

    fn port_mut(&mut self, port_id: PortId) -> Option<&mut Port> {
        let owner = self.port_owners.get(&port_id)?;
        self.blocks.get_mut(owner)?.port_mut(port_id)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Error when creating a connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// Both ports belong to the same block
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// Both ports are inputs or both are outputs
    #[error("Ports have the same direction")]
    SameDirection,

    /// The ports are already joined
    #[error("Ports are already connected")]
    AlreadyConnected,

    /// The loose end was never attached to a port
    #[error("Connection has a floating endpoint")]
    Unbound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BLOCK_HEADER_HEIGHT, BLOCK_WIDTH, PORT_HEIGHT};

    /// B1(in, out) at the origin, B2(x) to its right.
    fn two_blocks() -> (Graph, BlockId, BlockId) {
        let mut graph = Graph::new();
        let b1 = graph.add_block(Block::new("B1").with_input("in").with_output("out"));
        let b2 = graph.add_block(Block::new("B2").with_position(300.0, 0.0).with_input("x"));
        (graph, b1, b2)
    }

    fn port(graph: &Graph, block: BlockId, name: &str) -> PortId {
        graph.block(block).unwrap().port_named(name).unwrap().id
    }

    #[test]
    fn test_connect_valid() {
        let (mut graph, b1, b2) = two_blocks();
        let out = port(&graph, b1, "out");
        let x = port(&graph, b2, "x");

        let id = graph.connect(out, x).unwrap();
        assert_eq!(graph.connection_count(), 1);
        assert!(graph.is_connected(out, x));
        assert!(graph.is_connected(x, out));
        assert_eq!(graph.port(out).unwrap().connection_count(), 1);
        assert_eq!(graph.port(x).unwrap().connections().next(), Some(id));
        assert_eq!(
            graph.connection(id).unwrap().path().len(),
            crate::connection::PATH_SEGMENTS + 1
        );
    }

    #[test]
    fn test_input_first_connect_is_allowed() {
        let (mut graph, b1, b2) = two_blocks();
        let out = port(&graph, b1, "out");
        let x = port(&graph, b2, "x");
        assert!(graph.connect(x, out).is_ok());
    }

    #[test]
    fn test_reject_self_loop() {
        let (mut graph, b1, _) = two_blocks();
        let input = port(&graph, b1, "in");
        let out = port(&graph, b1, "out");
        assert_eq!(graph.connect(out, input), Err(ConnectionError::SelfLoop));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_reject_same_direction() {
        let (mut graph, b1, b2) = two_blocks();
        let input = port(&graph, b1, "in");
        let x = port(&graph, b2, "x");
        assert_eq!(graph.connect(input, x), Err(ConnectionError::SameDirection));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_reject_duplicate_either_order() {
        let (mut graph, b1, b2) = two_blocks();
        let out = port(&graph, b1, "out");
        let x = port(&graph, b2, "x");
        graph.connect(out, x).unwrap();
        assert_eq!(graph.connect(out, x), Err(ConnectionError::AlreadyConnected));
        assert_eq!(graph.connect(x, out), Err(ConnectionError::AlreadyConnected));
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_multiple_connections_per_port() {
        let (mut graph, b1, b2) = two_blocks();
        let b3 = graph.add_block(Block::new("B3").with_position(300.0, 200.0).with_input("y"));
        let out = port(&graph, b1, "out");
        graph.connect(out, port(&graph, b2, "x")).unwrap();
        graph.connect(out, port(&graph, b3, "y")).unwrap();
        assert_eq!(graph.port(out).unwrap().connection_count(), 2);
    }

    #[test]
    fn test_remove_block_cascades() {
        let (mut graph, b1, b2) = two_blocks();
        let b3 = graph.add_block(Block::new("B3").with_position(0.0, 200.0).with_output("o"));
        let b4 = graph.add_block(Block::new("B4").with_position(300.0, 200.0).with_input("i"));
        let out = port(&graph, b1, "out");
        let x = port(&graph, b2, "x");
        let o = port(&graph, b3, "o");
        graph.connect(out, x).unwrap();
        graph.connect(o, x).unwrap();
        graph.connect(o, port(&graph, b4, "i")).unwrap();
        graph.connect(port(&graph, b4, "i"), out).unwrap();

        let removed = graph.remove_block(b1).unwrap();
        assert_eq!(removed.ports().len(), 2);
        assert!(graph.block(b1).is_none());
        assert!(graph.port(out).is_none());
        assert_eq!(graph.connections_for_port(out).count(), 0);
        // o->x and o->i survive
        assert_eq!(graph.connection_count(), 2);
        assert_eq!(graph.port(x).unwrap().connection_count(), 1);
        assert_eq!(graph.block_count(), 3);
        assert_eq!(graph.port_count(), 3);
    }

    #[test]
    fn test_remove_missing_block() {
        let (mut graph, _, _) = two_blocks();
        assert!(graph.remove_block(BlockId::new()).is_none());
        assert_eq!(graph.block_count(), 2);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut graph = Graph::new();
        let ids: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|n| graph.add_block(Block::new(n)))
            .collect();
        graph.remove_block(ids[1]);
        let names: Vec<_> = graph.blocks().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["a", "c", "d"]);
    }

    #[test]
    fn test_cloned_block_gets_fresh_ids() {
        let mut graph = Graph::new();
        let block = Block::new("A").with_output("out");
        let first = graph.add_block(block.clone());
        let second = graph.add_block(block);
        assert_ne!(first, second);
        assert_eq!(graph.port_count(), 2);
        let a = graph.block(first).unwrap().ports()[0].id;
        let b = graph.block(second).unwrap().ports()[0].id;
        assert_ne!(a, b);
        assert_eq!(graph.port(b).unwrap().block(), second);
    }

    #[test]
    fn test_move_block_reroutes() {
        let (mut graph, b1, b2) = two_blocks();
        let out = port(&graph, b1, "out");
        let x = port(&graph, b2, "x");
        let id = graph.connect(out, x).unwrap();

        assert!(graph.move_block(b2, Pos2::new(400.0, 100.0)));
        let end = *graph.connection(id).unwrap().path().last().unwrap();
        assert!(end.distance(graph.port_position(x).unwrap()) < 1e-3);
        assert!(!graph.move_block(BlockId::new(), Pos2::ZERO));
    }

    #[test]
    fn test_hit_test_priority() {
        let (mut graph, b1, b2) = two_blocks();
        let out = port(&graph, b1, "out");
        let x = port(&graph, b2, "x");
        let id = graph.connect(out, x).unwrap();

        let port_pos = graph.port_position(out).unwrap();
        assert_eq!(graph.hit_test(port_pos, DEFAULT_HIT_TOLERANCE), Some(HitTarget::Port(out)));

        let body = Pos2::new(BLOCK_WIDTH / 2.0, BLOCK_HEADER_HEIGHT / 2.0);
        assert_eq!(graph.hit_test(body, DEFAULT_HIT_TOLERANCE), Some(HitTarget::Block(b1)));

        let mid = graph.connection(id).unwrap().path()[16];
        assert_eq!(graph.hit_test(mid, DEFAULT_HIT_TOLERANCE), Some(HitTarget::Connection(id)));

        assert_eq!(graph.hit_test(Pos2::new(-500.0, -500.0), DEFAULT_HIT_TOLERANCE), None);
    }

    #[test]
    fn test_hit_test_topmost_block_wins() {
        let mut graph = Graph::new();
        let lower = graph.add_block(Block::new("lower").with_output("out"));
        let upper = graph.add_block(Block::new("upper").with_position(100.0, 0.0).with_input("a"));

        // Overlap region belongs to the later block
        let overlap = Pos2::new(150.0, 10.0);
        assert_eq!(graph.hit_test(overlap, DEFAULT_HIT_TOLERANCE), Some(HitTarget::Block(upper)));

        // The lower block's output handle is covered by the upper block
        let out_pos = graph.block(lower).unwrap().port_center(0).unwrap();
        assert_eq!(
            graph.hit_test(out_pos, DEFAULT_HIT_TOLERANCE),
            Some(HitTarget::Block(upper))
        );
        assert_eq!(out_pos.y, BLOCK_HEADER_HEIGHT + PORT_HEIGHT / 2.0);
    }

    #[test]
    fn test_commit_requires_bound_end() {
        let (mut graph, b1, b2) = two_blocks();
        let out = port(&graph, b1, "out");
        let x = port(&graph, b2, "x");
        let anchor = graph.port_position(out).unwrap();
        let mut pending =
            ProvisionalConnection::new(out, PortDirection::Output, anchor, Pos2::new(250.0, 0.0));
        assert_eq!(graph.commit(&pending), Err(ConnectionError::Unbound));

        pending.bind(x);
        assert!(graph.commit(&pending).is_ok());
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_edit_live_block() {
        let (mut graph, b1, b2) = two_blocks();
        assert!(graph.rename_block(b2, "Sink"));
        assert_eq!(graph.block(b2).unwrap().name, "Sink");

        let extra = graph.add_port(b2, "extra", PortDirection::Output).unwrap();
        assert_eq!(graph.port(extra).unwrap().block(), b2);
        assert_eq!(graph.port_count(), 4);
        assert!(graph.add_port(BlockId::new(), "lost", PortDirection::Input).is_none());

        graph.connect(port(&graph, b1, "in"), extra).unwrap();
        assert_eq!(graph.connections_for_block(b2).count(), 1);
        assert_eq!(graph.connections_for_block(b1).count(), 1);

        graph.set_curvature(10.0);
        assert_eq!(graph.curvature(), 10.0);
    }

    #[test]
    fn test_clear() {
        let (mut graph, b1, b2) = two_blocks();
        graph.connect(port(&graph, b1, "out"), port(&graph, b2, "x")).unwrap();
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.port_count(), 0);
    }
}
