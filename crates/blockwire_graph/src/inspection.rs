// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read-only inspection pass over blocks and their ports.

use crate::block::BlockId;
use crate::graph::Graph;
use crate::port::{PortDirection, PortId};
use serde::Serialize;
use std::fmt;

/// One port as seen by the inspection pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortReport {
    /// Owning block
    pub block: BlockId,
    /// Owning block's name
    pub block_name: String,
    /// Port ID
    pub port: PortId,
    /// Port name
    pub port_name: String,
    /// Port direction
    pub direction: PortDirection,
}

/// Every port of every block, in store order
#[derive(Debug, Clone, Default, Serialize)]
pub struct InspectionReport {
    /// Port entries
    pub ports: Vec<PortReport>,
}

impl InspectionReport {
    /// Entries for input ports
    pub fn inputs(&self) -> impl Iterator<Item = &PortReport> {
        self.ports.iter().filter(|p| p.direction == PortDirection::Input)
    }

    /// Entries for output ports
    pub fn outputs(&self) -> impl Iterator<Item = &PortReport> {
        self.ports.iter().filter(|p| p.direction == PortDirection::Output)
    }
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for port in &self.ports {
            let label = match port.direction {
                PortDirection::Output => "[OUTPUT]",
                PortDirection::Input => "[INPUT ]",
            };
            writeln!(f, "{label} = {}", port.port_name)?;
        }
        Ok(())
    }
}

impl Graph {
    /// Classify every port by direction.
    ///
    /// Visits each block once and each of its ports once, in stored order.
    pub fn execute(&self) -> InspectionReport {
        let mut report = InspectionReport::default();
        for block in self.blocks() {
            for port in block.ports() {
                tracing::debug!(
                    block = %block.name,
                    port = %port.name,
                    output = port.is_output(),
                    "inspect port"
                );
                report.ports.push(PortReport {
                    block: block.id,
                    block_name: block.name.clone(),
                    port: port.id,
                    port_name: port.name.clone(),
                    direction: port.direction,
                });
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;

    #[test]
    fn test_execute_visits_in_order() {
        let mut graph = Graph::new();
        graph.add_block(Block::new("B1").with_input("in").with_output("out"));
        graph.add_block(Block::new("B2").with_input("x"));
        graph.add_block(Block::new("Empty"));

        let report = graph.execute();
        let names: Vec<_> = report
            .ports
            .iter()
            .map(|p| (p.block_name.as_str(), p.port_name.as_str()))
            .collect();
        assert_eq!(names, [("B1", "in"), ("B1", "out"), ("B2", "x")]);
        assert_eq!(report.inputs().count(), 2);
        assert_eq!(report.outputs().count(), 1);
    }

    #[test]
    fn test_display() {
        let mut graph = Graph::new();
        graph.add_block(Block::new("B1").with_input("in").with_output("out"));
        let text = graph.execute().to_string();
        assert_eq!(text, "[INPUT ] = in\n[OUTPUT] = out\n");
    }

    #[test]
    fn test_execute_does_not_mutate() {
        let mut graph = Graph::new();
        graph.add_block(Block::new("B1").with_output("out"));
        let _ = graph.execute();
        assert_eq!(graph.block_count(), 1);
        assert_eq!(graph.port_count(), 1);
    }
}
