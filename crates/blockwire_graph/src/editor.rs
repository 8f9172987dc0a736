// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interaction controller: turns raw input events into graph edits.
//!
//! Gestures:
//! - Primary press on a port starts a connection drag
//! - Pointer move drags the loose end
//! - Primary release on a compatible port completes the connection
//! - Primary press on a block selects it, anywhere else clears selection
//! - Secondary press on a connection deletes it
//! - Delete key removes the selected block
//! - Scroll adjusts the view zoom

use crate::block::BlockId;
use crate::connection::ProvisionalConnection;
use crate::error::{LoadError, SaveError};
use crate::graph::{Graph, HitTarget};
use crate::inspection::InspectionReport;
use crate::port::PortId;
use crate::settings::{EditorSettings, SettingsError};
use egui::{Key, PointerButton, Pos2};
use std::io::{Read, Write};

/// A discrete input event in scene space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A pointer button went down
    PointerPressed {
        /// Button
        button: PointerButton,
        /// Scene position
        pos: Pos2,
    },
    /// A pointer button went up
    PointerReleased {
        /// Button
        button: PointerButton,
        /// Scene position
        pos: Pos2,
    },
    /// The pointer moved
    PointerMoved {
        /// Scene position
        pos: Pos2,
    },
    /// A key was pressed
    KeyPressed(Key),
    /// The wheel was scrolled
    Scrolled {
        /// Vertical scroll amount, positive away from the user
        delta: f32,
        /// Scene position
        pos: Pos2,
    },
}

/// Whether the host should still process an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// The editor handled the event exclusively
    Consumed,
    /// The host may handle the event as well
    Propagate,
}

/// Interaction state of the editor
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    /// Nothing selected, no gesture in progress
    #[default]
    Idle,
    /// One block is selected
    BlockSelected(BlockId),
    /// A connection is being dragged out of a port
    Dragging {
        /// The connection under construction
        connection: ProvisionalConnection,
        /// Selection when the drag began, restored afterwards
        selection: Option<BlockId>,
    },
}

impl InteractionState {
    /// The selected block, including one selected before a drag began
    pub fn selection(&self) -> Option<BlockId> {
        match self {
            Self::Idle => None,
            Self::BlockSelected(id) => Some(*id),
            Self::Dragging { selection, .. } => *selection,
        }
    }

    fn resting(selection: Option<BlockId>) -> Self {
        selection.map_or(Self::Idle, Self::BlockSelected)
    }
}

/// Node editor: a graph store plus the state driving it from input
pub struct NodesEditor {
    graph: Graph,
    state: InteractionState,
    zoom: f32,
    settings: EditorSettings,
}

impl NodesEditor {
    /// Create an editor over an empty graph with default settings
    pub fn new() -> Self {
        Self::build(EditorSettings::default())
    }

    /// Create an editor over an empty graph; settings are validated first
    pub fn with_settings(settings: EditorSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self::build(settings))
    }

    fn build(settings: EditorSettings) -> Self {
        let mut graph = Graph::new();
        graph.set_curvature(settings.connection_curvature);
        Self {
            graph,
            state: InteractionState::Idle,
            zoom: settings.min_zoom,
            settings,
        }
    }

    /// Take over an existing graph
    pub fn with_graph(mut self, mut graph: Graph) -> Self {
        graph.set_curvature(self.settings.connection_curvature);
        self.graph = graph;
        self.state = InteractionState::Idle;
        self
    }

    /// The graph being edited
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access for programmatic edits (adding blocks, moving them)
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Current interaction state
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Active settings
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// The currently selected block, if it is still alive
    pub fn selected_block(&self) -> Option<BlockId> {
        self.state
            .selection()
            .filter(|id| self.graph.block(*id).is_some())
    }

    /// The connection being dragged, if any
    pub fn provisional(&self) -> Option<&ProvisionalConnection> {
        match &self.state {
            InteractionState::Dragging { connection, .. } => Some(connection),
            _ => None,
        }
    }

    /// Whether a connection drag is in progress
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging { .. })
    }

    /// Current view scale
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Topmost graph entity under `pos`
    pub fn item_at(&self, pos: Pos2) -> Option<HitTarget> {
        self.graph.hit_test(pos, self.settings.hit_tolerance)
    }

    /// Feed one input event through the state machine
    pub fn handle_event(&mut self, event: InputEvent) -> EventDisposition {
        match event {
            InputEvent::PointerPressed { button: PointerButton::Primary, pos } => {
                self.primary_pressed(pos)
            }
            InputEvent::PointerPressed { button: PointerButton::Secondary, pos } => {
                self.secondary_pressed(pos)
            }
            InputEvent::PointerMoved { pos } => self.pointer_moved(pos),
            InputEvent::PointerReleased { button: PointerButton::Primary, pos } => {
                self.primary_released(pos)
            }
            InputEvent::KeyPressed(key) if self.settings.is_delete_key(key) => {
                if self.delete_selected() {
                    EventDisposition::Consumed
                } else {
                    EventDisposition::Propagate
                }
            }
            InputEvent::Scrolled { delta, .. } => {
                self.scroll(delta);
                EventDisposition::Consumed
            }
            _ => EventDisposition::Propagate,
        }
    }

    fn primary_pressed(&mut self, pos: Pos2) -> EventDisposition {
        let previous = std::mem::take(&mut self.state);
        if matches!(previous, InteractionState::Dragging { .. }) {
            tracing::debug!("discarding stale connection drag");
        }
        let selection = previous.selection();

        match self.item_at(pos) {
            Some(HitTarget::Port(port_id)) => {
                if let Some(connection) = self.start_drag(port_id, pos) {
                    tracing::debug!(?port_id, "connection drag started");
                    self.state = InteractionState::Dragging { connection, selection };
                    return EventDisposition::Consumed;
                }
                self.state = InteractionState::resting(selection);
                EventDisposition::Propagate
            }
            Some(HitTarget::Block(block_id)) => {
                tracing::debug!(?block_id, "block selected");
                self.state = InteractionState::BlockSelected(block_id);
                EventDisposition::Propagate
            }
            Some(HitTarget::Connection(_)) | None => {
                self.state = InteractionState::Idle;
                EventDisposition::Propagate
            }
        }
    }

    fn start_drag(&self, port_id: PortId, pos: Pos2) -> Option<ProvisionalConnection> {
        let port = self.graph.port(port_id)?;
        let anchor = self.graph.port_position(port_id)?;
        let mut connection = ProvisionalConnection::new(port_id, port.direction, anchor, pos);
        connection.update_path(self.graph.curvature());
        Some(connection)
    }

    fn pointer_moved(&mut self, pos: Pos2) -> EventDisposition {
        let curvature = self.graph.curvature();
        match &mut self.state {
            InteractionState::Dragging { connection, .. } => {
                connection.set_floating(pos);
                connection.update_path(curvature);
                EventDisposition::Consumed
            }
            _ => EventDisposition::Propagate,
        }
    }

    fn primary_released(&mut self, pos: Pos2) -> EventDisposition {
        if !self.is_dragging() {
            return EventDisposition::Propagate;
        }
        let InteractionState::Dragging { mut connection, selection } =
            std::mem::take(&mut self.state)
        else {
            return EventDisposition::Propagate;
        };

        match self.item_at(pos) {
            Some(HitTarget::Port(target)) => {
                connection.bind(target);
                match self.graph.commit(&connection) {
                    Ok(id) => tracing::debug!(?id, "connection created"),
                    Err(err) => tracing::debug!(error = %err, "connection rejected"),
                }
            }
            _ => tracing::debug!("connection drag abandoned"),
        }

        self.state = InteractionState::resting(selection);
        EventDisposition::Consumed
    }

    fn secondary_pressed(&mut self, pos: Pos2) -> EventDisposition {
        if let Some(HitTarget::Connection(id)) = self.item_at(pos) {
            self.graph.disconnect(id);
            tracing::debug!(?id, "connection deleted");
        }
        EventDisposition::Consumed
    }

    fn scroll(&mut self, delta: f32) {
        let factor = 1.0 + delta * self.settings.zoom_speed;
        self.zoom = (self.zoom * factor).clamp(self.settings.min_zoom, self.settings.max_zoom);
    }

    /// Remove the selected block with its ports and connections.
    ///
    /// Returns whether a block was removed.
    pub fn delete_selected(&mut self) -> bool {
        let Some(block_id) = self.selected_block() else {
            return false;
        };

        let drag_origin = self
            .provisional()
            .and_then(|c| self.graph.port(c.fixed_port()))
            .map(|p| p.block());

        self.graph.remove_block(block_id);

        self.state = match std::mem::take(&mut self.state) {
            InteractionState::Dragging { connection, .. } if drag_origin != Some(block_id) => {
                InteractionState::Dragging { connection, selection: None }
            }
            _ => InteractionState::Idle,
        };
        true
    }

    /// Clear the selection without touching the graph
    pub fn clear_selection(&mut self) {
        if let InteractionState::Dragging { selection, .. } = &mut self.state {
            *selection = None;
        } else {
            self.state = InteractionState::Idle;
        }
    }

    /// Write the graph to `writer`
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        self.graph.save(writer)
    }

    /// Replace the graph with the contents of `reader`; any gesture or
    /// selection is dropped
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), LoadError> {
        self.state = InteractionState::Idle;
        self.graph.load(reader)
    }

    /// Run the inspection pass over the graph
    pub fn execute(&self) -> InspectionReport {
        self.graph.execute()
    }
}

impl Default for NodesEditor {
    fn default() -> Self {
        Self::new()
    }
}
