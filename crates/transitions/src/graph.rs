use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use shared::domain::Screen;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionEdge {
    pub from: Screen,
    pub to: Screen,
}

impl TransitionEdge {
    pub fn new(from: Screen, to: Screen) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for TransitionEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// The animation authored for one edge of the graph.
///
/// Returning from `run` is the completion signal: the future must resolve
/// exactly when the visual change is finished. A future that never resolves
/// stalls whoever is driving the display.
#[async_trait]
pub trait TransitionOperation: Send + Sync {
    async fn run(&self, edge: TransitionEdge);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphDefect {
    #[error("missing hub edge {0}")]
    MissingHubEdge(TransitionEdge),
    #[error("edge {0} authored more than once")]
    DuplicateEdge(TransitionEdge),
    #[error("self edge on {0}")]
    SelfEdge(Screen),
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid transition graph: {}", describe_defects(.0))]
    InvalidGraph(Vec<GraphDefect>),
    #[error("no route from {from} to {to}")]
    NoRoute { from: Screen, to: Screen },
}

fn describe_defects(defects: &[GraphDefect]) -> String {
    defects
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone)]
pub struct Hop {
    pub edge: TransitionEdge,
    pub operation: Arc<dyn TransitionOperation>,
}

impl fmt::Debug for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hop").field("edge", &self.edge).finish()
    }
}

/// Ordered hops from the current screen to a requested one.
///
/// Empty when the two screens are equal, one hop for an authored edge, two
/// hops through the hub otherwise.
#[derive(Debug, Clone, Default)]
pub struct Route {
    hops: Vec<Hop>,
}

impl Route {
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn edges(&self) -> impl Iterator<Item = TransitionEdge> + '_ {
        self.hops.iter().map(|hop| hop.edge)
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn is_direct(&self) -> bool {
        self.hops.len() == 1
    }
}

pub struct TransitionGraphBuilder {
    hub: Screen,
    edges: HashMap<TransitionEdge, Arc<dyn TransitionOperation>>,
    defects: Vec<GraphDefect>,
}

impl TransitionGraphBuilder {
    pub fn new(hub: Screen) -> Self {
        Self {
            hub,
            edges: HashMap::new(),
            defects: Vec::new(),
        }
    }

    pub fn edge(
        self,
        from: Screen,
        to: Screen,
        operation: impl TransitionOperation + 'static,
    ) -> Self {
        self.shared_edge(from, to, Arc::new(operation))
    }

    pub fn shared_edge(
        mut self,
        from: Screen,
        to: Screen,
        operation: Arc<dyn TransitionOperation>,
    ) -> Self {
        if from == to {
            self.defects.push(GraphDefect::SelfEdge(from));
            return self;
        }
        let edge = TransitionEdge::new(from, to);
        if self.edges.insert(edge, operation).is_some() {
            self.defects.push(GraphDefect::DuplicateEdge(edge));
        }
        self
    }

    /// Validates the hub invariant: every non-hub screen has an authored edge
    /// to the hub and one back from it. All defects are reported at once.
    pub fn build(self) -> Result<TransitionGraph, GraphError> {
        let hub = self.hub;
        let mut defects = self.defects;
        for screen in Screen::ALL.into_iter().filter(|screen| *screen != hub) {
            for edge in [TransitionEdge::new(screen, hub), TransitionEdge::new(hub, screen)] {
                if !self.edges.contains_key(&edge) {
                    defects.push(GraphDefect::MissingHubEdge(edge));
                }
            }
        }
        if !defects.is_empty() {
            return Err(GraphError::InvalidGraph(defects));
        }

        debug!(hub = %hub, edges = self.edges.len(), "transition graph validated");
        Ok(TransitionGraph {
            hub,
            edges: self.edges,
        })
    }
}

/// Static lookup table of authored transitions, validated at construction.
pub struct TransitionGraph {
    hub: Screen,
    edges: HashMap<TransitionEdge, Arc<dyn TransitionOperation>>,
}

impl TransitionGraph {
    pub fn builder(hub: Screen) -> TransitionGraphBuilder {
        TransitionGraphBuilder::new(hub)
    }

    pub fn hub(&self) -> Screen {
        self.hub
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, from: Screen, to: Screen) -> bool {
        self.edges.contains_key(&TransitionEdge::new(from, to))
    }

    pub fn operation(&self, from: Screen, to: Screen) -> Option<Arc<dyn TransitionOperation>> {
        self.edges.get(&TransitionEdge::new(from, to)).cloned()
    }

    /// Authored edges in a stable order.
    pub fn edges(&self) -> Vec<TransitionEdge> {
        let mut edges: Vec<_> = self.edges.keys().copied().collect();
        edges.sort();
        edges
    }

    pub fn resolve(&self, from: Screen, to: Screen) -> Result<Route, GraphError> {
        if from == to {
            return Ok(Route::default());
        }
        if let Some(hop) = self.hop(from, to) {
            return Ok(Route { hops: vec![hop] });
        }

        let no_route = || GraphError::NoRoute { from, to };
        let to_hub = self.hop(from, self.hub).ok_or_else(no_route)?;
        let from_hub = self.hop(self.hub, to).ok_or_else(no_route)?;
        Ok(Route {
            hops: vec![to_hub, from_hub],
        })
    }

    fn hop(&self, from: Screen, to: Screen) -> Option<Hop> {
        let edge = TransitionEdge::new(from, to);
        self.edges.get(&edge).map(|operation| Hop {
            edge,
            operation: Arc::clone(operation),
        })
    }
}

#[cfg(test)]
#[path = "tests/graph_tests.rs"]
mod tests;
