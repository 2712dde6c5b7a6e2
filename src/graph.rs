//! Arena-backed directed overlap graph.
//!
//! Vertices and edges live in contiguous vectors addressed by stable indices.
//! Removal tombstones the slot instead of shifting later entries, so every
//! index handed out stays meaningful for the lifetime of the graph and is
//! checked against liveness on use. Vertex indices coincide with read labels:
//! vertex `i` is created for read `i` and merges never allocate new vertices.

use serde::{Deserialize, Serialize};

/// Index of a vertex slot (equal to the originating read's label).
pub type VertexId = usize;

/// Index of an edge slot, assigned in insertion order.
pub type EdgeId = usize;

/// Errors raised when the arena is addressed through a stale or invalid index.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("vertex {0} does not exist")]
    UnknownVertex(VertexId),
    #[error("vertex {0} has already been removed")]
    DeadVertex(VertexId),
    #[error("edge {0} does not exist")]
    UnknownEdge(EdgeId),
    #[error("edge {0} has already been removed")]
    DeadEdge(EdgeId),
    #[error("self-loop on vertex {0} is not allowed")]
    SelfLoop(VertexId),
}

#[derive(Debug, Clone)]
pub struct Vertex {
    label: usize,
    name: String,
    live: bool,
}

impl Vertex {
    pub fn label(&self) -> usize {
        self.label
    }

    /// Current sequence carried by the vertex.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_live(&self) -> bool {
        self.live
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Edge {
    source: VertexId,
    target: VertexId,
    weight: usize,
    live: bool,
}

impl Edge {
    pub fn source(&self) -> VertexId {
        self.source
    }

    pub fn target(&self) -> VertexId {
        self.target
    }

    /// Overlap length between source suffix and target prefix.
    pub fn weight(&self) -> usize {
        self.weight
    }

    pub fn is_live(&self) -> bool {
        self.live
    }
}

/// A vertex as seen by external reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub label: usize,
    pub name: String,
}

/// An edge as seen by external reporting; endpoints are vertex labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: usize,
    pub target: usize,
    pub weight: usize,
}

/// Point-in-time copy of the live vertex and edge sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub vertices: Vec<VertexRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct OverlapGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    /// Edge slots leaving each vertex, including tombstoned ones.
    outgoing: Vec<Vec<EdgeId>>,
    /// Edge slots entering each vertex, including tombstoned ones.
    incoming: Vec<Vec<EdgeId>>,
    live_vertices: usize,
    live_edges: usize,
}

impl OverlapGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, edges: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            edges: Vec::with_capacity(edges),
            outgoing: Vec::with_capacity(vertices),
            incoming: Vec::with_capacity(vertices),
            live_vertices: 0,
            live_edges: 0,
        }
    }

    /// Append a vertex; its label is its slot index.
    pub fn add_vertex(&mut self, name: String) -> VertexId {
        let id = self.vertices.len();
        self.vertices.push(Vertex {
            label: id,
            name,
            live: true,
        });
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.live_vertices += 1;
        id
    }

    pub fn add_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        weight: usize,
    ) -> Result<EdgeId, GraphError> {
        self.vertex(source)?;
        self.vertex(target)?;
        if source == target {
            return Err(GraphError::SelfLoop(source));
        }

        let id = self.edges.len();
        self.edges.push(Edge {
            source,
            target,
            weight,
            live: true,
        });
        self.outgoing[source].push(id);
        self.incoming[target].push(id);
        self.live_edges += 1;
        Ok(id)
    }

    /// Live vertex at `id`.
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, GraphError> {
        match self.vertices.get(id) {
            None => Err(GraphError::UnknownVertex(id)),
            Some(vertex) if !vertex.live => Err(GraphError::DeadVertex(id)),
            Some(vertex) => Ok(vertex),
        }
    }

    /// Live edge at `id`.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge, GraphError> {
        match self.edges.get(id) {
            None => Err(GraphError::UnknownEdge(id)),
            Some(edge) if !edge.live => Err(GraphError::DeadEdge(id)),
            Some(edge) => Ok(edge),
        }
    }

    pub fn rename_vertex(&mut self, id: VertexId, name: String) -> Result<(), GraphError> {
        self.vertex(id)?;
        self.vertices[id].name = name;
        Ok(())
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<(), GraphError> {
        self.edge(id)?;
        self.edges[id].live = false;
        self.live_edges -= 1;
        Ok(())
    }

    /// Remove a vertex together with every live edge touching it.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<(), GraphError> {
        self.vertex(id)?;
        let incident: Vec<EdgeId> = self.outgoing[id]
            .iter()
            .chain(self.incoming[id].iter())
            .copied()
            .filter(|&edge_id| self.edges[edge_id].live)
            .collect();
        for edge_id in incident {
            // A self-loop cannot exist, so no edge appears twice.
            self.remove_edge(edge_id)?;
        }
        self.outgoing[id].clear();
        self.incoming[id].clear();
        self.vertices[id].live = false;
        self.live_vertices -= 1;
        Ok(())
    }

    /// Live edges leaving `id`, in insertion order.
    pub fn outgoing_edges(&self, id: VertexId) -> Result<Vec<EdgeId>, GraphError> {
        self.vertex(id)?;
        Ok(self.outgoing[id]
            .iter()
            .copied()
            .filter(|&edge_id| self.edges[edge_id].live)
            .collect())
    }

    /// Live vertices in slot (label) order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, vertex)| vertex.live)
    }

    /// Live edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter().enumerate().filter(|(_, edge)| edge.live)
    }

    pub fn vertex_count(&self) -> usize {
        self.live_vertices
    }

    pub fn edge_count(&self) -> usize {
        self.live_edges
    }

    /// All live edges sharing the current maximum weight, in insertion order.
    pub fn heaviest_edges(&self) -> Vec<EdgeId> {
        let Some(max_weight) = self.edges().map(|(_, edge)| edge.weight).max() else {
            return Vec::new();
        };
        self.edges()
            .filter(|(_, edge)| edge.weight == max_weight)
            .map(|(id, _)| id)
            .collect()
    }

    /// Sequences of the live vertices in label order.
    pub fn names(&self) -> Vec<String> {
        self.vertices()
            .map(|(_, vertex)| vertex.name.clone())
            .collect()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let vertices = self
            .vertices()
            .map(|(_, vertex)| VertexRecord {
                label: vertex.label,
                name: vertex.name.clone(),
            })
            .collect();
        let edges = self
            .edges()
            .map(|(_, edge)| EdgeRecord {
                source: self.vertices[edge.source].label,
                target: self.vertices[edge.target].label,
                weight: edge.weight,
            })
            .collect();
        GraphSnapshot { vertices, edges }
    }
}
