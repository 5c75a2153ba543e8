//! Transition graph for the audience display: which animation moves the
//! display from one screen to another, and how to route between screens
//! that have no directly authored animation.

pub mod choreography;
pub mod completion;
pub mod graph;

pub use choreography::{
    audience_graph, authored_choreographies, Choreography, Phase, Stage, Staged, TracingStage,
    MAX_TIME_SCALE,
};
pub use completion::{CallbackTransition, Completion};
pub use graph::{
    GraphDefect, GraphError, Hop, Route, TransitionEdge, TransitionGraph, TransitionGraphBuilder,
    TransitionOperation,
};
