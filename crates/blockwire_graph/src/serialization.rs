// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binary save/load of the graph store.
//!
//! The stream is a plain sequence of records with no header: every block
//! record first, then every connection record. Ports are referenced by keys
//! issued in block/port order at save time, so runtime ids never reach disk.

use crate::block::Block;
use crate::error::{LoadError, SaveError};
use crate::graph::Graph;
use crate::port::{PortDirection, PortId};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};

/// Upper bound on the encoded size of a single record
pub const MAX_RECORD_BYTES: u64 = 1 << 20;

#[derive(Debug, Serialize, Deserialize)]
enum Record {
    Block(BlockRecord),
    Connection(ConnectionRecord),
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockRecord {
    name: String,
    position: [f32; 2],
    ports: Vec<PortRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PortRecord {
    key: u64,
    name: String,
    direction: PortDirection,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConnectionRecord {
    port_a: u64,
    port_b: u64,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_RECORD_BYTES)
}

impl Graph {
    /// Write every block, then every connection, in store order
    pub fn save<W: Write>(&self, mut writer: W) -> Result<(), SaveError> {
        let mut keys: HashMap<PortId, u64> = HashMap::with_capacity(self.port_count());
        let mut next_key = 0u64;

        for block in self.blocks() {
            let ports = block
                .ports()
                .iter()
                .map(|port| {
                    let key = next_key;
                    next_key += 1;
                    keys.insert(port.id, key);
                    PortRecord {
                        key,
                        name: port.name.clone(),
                        direction: port.direction,
                    }
                })
                .collect();
            let record = Record::Block(BlockRecord {
                name: block.name.clone(),
                position: [block.position.x, block.position.y],
                ports,
            });
            codec().serialize_into(&mut writer, &record)?;
        }

        for connection in self.connections() {
            let key_of = |id: PortId| keys.get(&id).copied().ok_or(SaveError::DanglingPort(id));
            let record = Record::Connection(ConnectionRecord {
                port_a: key_of(connection.port_a)?,
                port_b: key_of(connection.port_b)?,
            });
            codec().serialize_into(&mut writer, &record)?;
        }

        tracing::info!(
            blocks = self.block_count(),
            connections = self.connection_count(),
            "saved graph"
        );
        Ok(())
    }

    /// Replace the contents of the graph with the records in `reader`.
    ///
    /// The graph is cleared first and stays empty if the stream is corrupt.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), LoadError> {
        let curvature = self.curvature();
        self.clear();

        match Self::read_records(reader, curvature) {
            Ok(loaded) => {
                *self = loaded;
                tracing::info!(
                    blocks = self.block_count(),
                    connections = self.connection_count(),
                    "loaded graph"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "graph load failed");
                Err(err)
            }
        }
    }

    /// Build a new graph from a record stream
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut graph = Self::new();
        graph.load(reader)?;
        Ok(graph)
    }

    fn read_records<R: Read>(reader: R, curvature: f32) -> Result<Self, LoadError> {
        let mut reader = BufReader::new(reader);
        let mut graph = Self::new();
        graph.set_curvature(curvature);
        let mut port_map: HashMap<u64, PortId> = HashMap::new();

        while !reader.fill_buf()?.is_empty() {
            let record: Record = codec().deserialize_from(&mut reader)?;
            match record {
                Record::Block(record) => {
                    let [x, y] = record.position;
                    let mut block = Block::new(record.name).with_position(x, y);
                    for port in record.ports {
                        if port_map.contains_key(&port.key) {
                            return Err(LoadError::DuplicatePortKey(port.key));
                        }
                        let id = block.add_port(port.name, port.direction);
                        port_map.insert(port.key, id);
                    }
                    graph.add_block(block);
                }
                Record::Connection(record) => {
                    let resolve = |key: u64| {
                        port_map.get(&key).copied().ok_or(LoadError::UnresolvedPort(key))
                    };
                    let a = resolve(record.port_a)?;
                    let b = resolve(record.port_b)?;
                    graph.connect(a, b).map_err(LoadError::InvalidConnection)?;
                }
            }
        }

        Ok(graph)
    }
}
