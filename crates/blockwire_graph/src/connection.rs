// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions for the graph.

use crate::port::{PortDirection, PortId};
use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of segments used to approximate a connection curve
pub const PATH_SEGMENTS: usize = 32;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One end of a connection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint {
    /// Attached to a port
    Bound(PortId),
    /// Following the pointer during a drag
    Floating(Pos2),
}

impl Endpoint {
    /// The bound port, if any
    pub fn port(&self) -> Option<PortId> {
        match self {
            Self::Bound(id) => Some(*id),
            Self::Floating(_) => None,
        }
    }
}

/// A fully bound connection between two ports
#[derive(Debug, Clone)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// First port (the one the gesture started from)
    pub port_a: PortId,
    /// Second port
    pub port_b: PortId,
    path: Vec<Pos2>,
}

impl Connection {
    pub(crate) fn new(port_a: PortId, port_b: PortId) -> Self {
        Self {
            id: ConnectionId::new(),
            port_a,
            port_b,
            path: Vec::new(),
        }
    }

    /// Check if this connection involves a specific port
    pub fn involves_port(&self, port_id: PortId) -> bool {
        self.port_a == port_id || self.port_b == port_id
    }

    /// Check if this connection joins the two ports, in either order
    pub fn joins(&self, a: PortId, b: PortId) -> bool {
        (self.port_a == a && self.port_b == b) || (self.port_a == b && self.port_b == a)
    }

    /// The port on the other side of `port_id`
    pub fn other_end(&self, port_id: PortId) -> Option<PortId> {
        if self.port_a == port_id {
            Some(self.port_b)
        } else if self.port_b == port_id {
            Some(self.port_a)
        } else {
            None
        }
    }

    /// Rendered path as a polyline
    pub fn path(&self) -> &[Pos2] {
        &self.path
    }

    pub(crate) fn set_path(&mut self, path: Vec<Pos2>) {
        self.path = path;
    }

    /// Bounding rectangle of the rendered path
    pub fn bounds(&self) -> Rect {
        path_bounds(&self.path)
    }

    /// Whether any path segment passes within `radius` of `pos`
    pub fn hit(&self, pos: Pos2, radius: f32) -> bool {
        polyline_hit(&self.path, pos, radius)
    }
}

/// A connection under construction: one end fixed on a port, the other
/// tracking the pointer until the gesture resolves.
#[derive(Debug, Clone)]
pub struct ProvisionalConnection {
    port_a: PortId,
    direction_a: PortDirection,
    anchor: Pos2,
    port_b: Endpoint,
    path: Vec<Pos2>,
}

impl ProvisionalConnection {
    /// Start a connection from `port` (located at `anchor`) with the loose
    /// end floating at `pos`
    pub fn new(port: PortId, direction: PortDirection, anchor: Pos2, pos: Pos2) -> Self {
        Self {
            port_a: port,
            direction_a: direction,
            anchor,
            port_b: Endpoint::Floating(pos),
            path: Vec::new(),
        }
    }

    /// Port the gesture started from
    pub fn fixed_port(&self) -> PortId {
        self.port_a
    }

    /// Direction of the fixed port
    pub fn fixed_direction(&self) -> PortDirection {
        self.direction_a
    }

    /// The loose end
    pub fn loose_end(&self) -> Endpoint {
        self.port_b
    }

    /// Move the floating end
    pub fn set_floating(&mut self, pos: Pos2) {
        self.port_b = Endpoint::Floating(pos);
    }

    /// Attach the loose end to a port
    pub fn bind(&mut self, port: PortId) {
        self.port_b = Endpoint::Bound(port);
    }

    /// Both ports, when the loose end has been bound
    pub fn bound_ports(&self) -> Option<(PortId, PortId)> {
        self.port_b.port().map(|b| (self.port_a, b))
    }

    /// Recompute the path towards the floating end
    pub fn update_path(&mut self, curvature: f32) {
        if let Endpoint::Floating(pos) = self.port_b {
            self.update_path_to(pos, curvature);
        }
    }

    fn update_path_to(&mut self, loose: Pos2, curvature: f32) {
        self.path = match self.direction_a {
            PortDirection::Output => wire_path(self.anchor, loose, curvature),
            PortDirection::Input => wire_path(loose, self.anchor, curvature),
        };
    }

    /// Rendered path as a polyline
    pub fn path(&self) -> &[Pos2] {
        &self.path
    }
}

/// Default horizontal control-point offset
pub const DEFAULT_CURVATURE: f32 = 50.0;

/// Curve from an output handle to an input handle.
///
/// The output side bends right and the input side bends left.
pub fn wire_path(output_end: Pos2, input_end: Pos2, curvature: f32) -> Vec<Pos2> {
    let distance = (input_end.x - output_end.x).abs();
    let curvature = curvature.min(distance * 0.5);

    let ctrl1 = Pos2::new(output_end.x + curvature, output_end.y);
    let ctrl2 = Pos2::new(input_end.x - curvature, input_end.y);

    bezier_points(output_end, ctrl1, ctrl2, input_end, PATH_SEGMENTS)
}

/// Generate points along a cubic bezier curve
fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x;
        let y = mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y;

        points.push(Pos2::new(x, y));
    }
    points
}

fn path_bounds(path: &[Pos2]) -> Rect {
    let mut iter = path.iter();
    let Some(first) = iter.next() else {
        return Rect::NOTHING;
    };
    iter.fold(Rect::from_min_max(*first, *first), |rect, p| rect.union(Rect::from_min_max(*p, *p)))
}

fn polyline_hit(path: &[Pos2], pos: Pos2, radius: f32) -> bool {
    match path {
        [] => false,
        [single] => single.distance(pos) <= radius,
        _ => path
            .windows(2)
            .any(|seg| segment_distance(seg[0], seg[1], pos) <= radius),
    }
}

fn segment_distance(a: Pos2, b: Pos2, p: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq == 0.0 {
        return a.distance(p);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t).distance(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_path_endpoints() {
        let from = Pos2::new(0.0, 0.0);
        let to = Pos2::new(200.0, 50.0);
        let path = wire_path(from, to, DEFAULT_CURVATURE);
        assert_eq!(path.len(), PATH_SEGMENTS + 1);
        assert_eq!(path[0], from);
        assert!(path[PATH_SEGMENTS].distance(to) < 1e-3);
    }

    #[test]
    fn test_hit_along_path() {
        let mut conn = Connection::new(PortId::new(), PortId::new());
        conn.set_path(wire_path(Pos2::new(0.0, 0.0), Pos2::new(100.0, 0.0), DEFAULT_CURVATURE));

        assert!(conn.hit(Pos2::new(50.0, 0.5), 1.5));
        assert!(!conn.hit(Pos2::new(50.0, 10.0), 1.5));
        assert!(conn.bounds().contains(Pos2::new(50.0, 0.0)));
    }

    #[test]
    fn test_joins_is_direction_agnostic() {
        let a = PortId::new();
        let b = PortId::new();
        let conn = Connection::new(a, b);
        assert!(conn.joins(a, b));
        assert!(conn.joins(b, a));
        assert!(!conn.joins(a, PortId::new()));
        assert_eq!(conn.other_end(a), Some(b));
        assert_eq!(conn.other_end(PortId::new()), None);
    }

    #[test]
    fn test_provisional_binding() {
        let a = PortId::new();
        let b = PortId::new();
        let mut pending = ProvisionalConnection::new(
            a,
            PortDirection::Input,
            Pos2::new(0.0, 0.0),
            Pos2::new(5.0, 5.0),
        );
        assert!(pending.bound_ports().is_none());
        assert_eq!(pending.loose_end(), Endpoint::Floating(Pos2::new(5.0, 5.0)));

        pending.set_floating(Pos2::new(-80.0, 10.0));
        pending.update_path(DEFAULT_CURVATURE);
        // Input side is the curve's end
        assert_eq!(pending.path()[0], Pos2::new(-80.0, 10.0));

        pending.bind(b);
        assert_eq!(pending.bound_ports(), Some((a, b)));
    }
}
