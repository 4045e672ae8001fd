//! Render module - Text dumps and graph views of a validated program

pub mod graph;
pub mod text;

// Re-export key types
pub use graph::{AutomatonGraph, GraphStats, TransitionClass, transition_classes};
pub use text::{render_text, write_text};

use crate::Result;
use crate::describe::ClassDescriber;
use crate::program::Program;

/// Build the graph view of a program
pub fn build_graph(program: &Program<'_>, class: &dyn ClassDescriber) -> Result<AutomatonGraph> {
    AutomatonGraph::build(program, class)
}
