// SPDX-License-Identifier: MIT OR Apache-2.0
//! Gesture scripts for the `replay` command.
//!
//! A script is a RON list of steps, e.g.
//! `[Drag(from: (180.0, 57.0), to: (300.0, 35.0)), Click(x: 90.0, y: 12.0), Delete]`.

use blockwire_graph::{InputEvent, NodesEditor};
use egui::{Key, PointerButton, Pos2};
use serde::Deserialize;

/// One scripted gesture
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum Step {
    /// Primary press and release at the same point
    Click {
        /// Scene x
        x: f32,
        /// Scene y
        y: f32,
    },
    /// Primary press, move, release
    Drag {
        /// Press position
        from: (f32, f32),
        /// Release position
        to: (f32, f32),
    },
    /// Secondary press
    RightClick {
        /// Scene x
        x: f32,
        /// Scene y
        y: f32,
    },
    /// Press the delete key
    Delete,
    /// Scroll the wheel
    Scroll {
        /// Scroll amount
        delta: f32,
    },
}

impl Step {
    /// Raw events making up this gesture
    pub fn events(&self) -> Vec<InputEvent> {
        let primary = PointerButton::Primary;
        match *self {
            Self::Click { x, y } => {
                let pos = Pos2::new(x, y);
                vec![
                    InputEvent::PointerPressed { button: primary, pos },
                    InputEvent::PointerReleased { button: primary, pos },
                ]
            }
            Self::Drag { from, to } => {
                let from = Pos2::new(from.0, from.1);
                let to = Pos2::new(to.0, to.1);
                vec![
                    InputEvent::PointerPressed { button: primary, pos: from },
                    InputEvent::PointerMoved { pos: to },
                    InputEvent::PointerReleased { button: primary, pos: to },
                ]
            }
            Self::RightClick { x, y } => vec![InputEvent::PointerPressed {
                button: PointerButton::Secondary,
                pos: Pos2::new(x, y),
            }],
            Self::Delete => vec![InputEvent::KeyPressed(Key::Delete)],
            Self::Scroll { delta } => vec![InputEvent::Scrolled { delta, pos: Pos2::ZERO }],
        }
    }
}

/// Parse a RON step list
pub fn parse(text: &str) -> Result<Vec<Step>, ron::error::SpannedError> {
    ron::from_str(text)
}

/// Feed every step through the editor
pub fn replay(editor: &mut NodesEditor, steps: &[Step]) {
    for step in steps {
        for event in step.events() {
            editor.handle_event(event);
        }
        tracing::debug!(?step, "replayed step");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_graph;

    #[test]
    fn test_parse() {
        let steps = parse("[Click(x: 1.0, y: 2.0), Delete, Scroll(delta: 120.0)]").unwrap();
        assert_eq!(
            steps,
            [Step::Click { x: 1.0, y: 2.0 }, Step::Delete, Step::Scroll { delta: 120.0 }]
        );
        assert!(parse("[Teleport]").is_err());
    }

    #[test]
    fn test_replay_select_and_delete() {
        let mut editor = NodesEditor::new().with_graph(demo_graph());
        let steps = parse("[Click(x: 90.0, y: 12.0), Delete]").unwrap();
        replay(&mut editor, &steps);
        assert_eq!(editor.graph().block_count(), 1);
        assert_eq!(editor.graph().connection_count(), 0);
    }

    #[test]
    fn test_replay_drag_duplicate_is_rejected() {
        let mut editor = NodesEditor::new().with_graph(demo_graph());
        let steps = parse("[Drag(from: (180.0, 57.0), to: (300.0, 35.0))]").unwrap();
        replay(&mut editor, &steps);
        assert_eq!(editor.graph().connection_count(), 1);
    }
}
