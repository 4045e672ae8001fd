//! Graph model of a program and its DOT export
//!
//! Per-symbol transitions of each state are merged into one edge per target
//! state, labelled with the class of symbols leading there. The sentinel state
//! and every transition into it are left out.

use crate::describe::{ByteSet, ClassDescriber, ClassMode};
use crate::program::{Program, StateId};
use crate::Result;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// Default DOT graph name.
pub const DEFAULT_GRAPH_NAME: &str = "DFA";

/// Symbols of one state sharing a transition target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionClass {
    pub target: StateId,
    pub symbols: ByteSet,
}

/// Partition the alphabet of `state` by next state, first-seen order over
/// symbols `0..=255`. The class leading to the sentinel is dropped.
pub fn transition_classes(program: &Program<'_>, state: StateId) -> Result<Vec<TransitionClass>> {
    let mut classes: Vec<TransitionClass> = Vec::new();
    let mut slot_of_target: [Option<usize>; crate::program::LANES] = Default::default();

    for symbol in 0..=u8::MAX {
        let target = program.decode(state, symbol)?.state;
        if target == 0 {
            continue;
        }

        match slot_of_target[usize::from(target)] {
            Some(idx) => classes[idx].symbols.insert(symbol),
            None => {
                slot_of_target[usize::from(target)] = Some(classes.len());
                let mut symbols = ByteSet::new();
                symbols.insert(symbol);
                classes.push(TransitionClass { target, symbols });
            }
        }
    }
    Ok(classes)
}

/// Which start a placeholder node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StartKind {
    Anchored,
    Floating,
}

impl StartKind {
    pub fn placeholder(&self) -> &'static str {
        match self {
            StartKind::Anchored => "STARTA",
            StartKind::Floating => "STARTF",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            StartKind::Anchored => "blue",
            StartKind::Floating => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphNode {
    State {
        id: StateId,
        accepting: bool,
        eod_accepting: bool,
    },
    /// Invisible source of a start edge, not an automaton state
    Start(StartKind),
}

impl GraphNode {
    pub fn dot_id(&self) -> String {
        match self {
            GraphNode::State { id, .. } => id.to_string(),
            GraphNode::Start(kind) => kind.placeholder().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEdge {
    Start(StartKind),
    Top,
    Symbols { symbols: ByteSet, label: String },
}

/// Directed graph of the live, non-sentinel states of a program
pub struct AutomatonGraph {
    /// Nodes are states and start placeholders, edges are start, top and
    /// consolidated symbol transitions, both in insertion order.
    pub graph: StableGraph<GraphNode, GraphEdge>,

    /// Node of each rendered state
    pub state_index: HashMap<StateId, NodeIndex>,

    pub name: String,
}

impl AutomatonGraph {
    pub fn build(program: &Program<'_>, class: &dyn ClassDescriber) -> Result<Self> {
        let mut graph = StableGraph::new();
        let mut state_index = HashMap::new();
        let header = program.header();

        let mut placeholders = Vec::new();
        for (kind, start) in [
            (StartKind::Anchored, header.anchored.state),
            (StartKind::Floating, header.floating.state),
        ] {
            if start != 0 {
                placeholders.push((kind, start, graph.add_node(GraphNode::Start(kind))));
            }
        }

        for state in program.states().skip(1) {
            let aux = program.auxiliary(state)?;
            let node = graph.add_node(GraphNode::State {
                id: state,
                accepting: aux.is_accepting(),
                eod_accepting: aux.is_eod_accepting(),
            });
            state_index.insert(state, node);
        }

        for state in program.states().skip(1) {
            let from = state_index[&state];

            for &(kind, start, placeholder) in &placeholders {
                if start == state {
                    graph.add_edge(placeholder, from, GraphEdge::Start(kind));
                }
            }

            if let Some(top) = program.auxiliary(state)?.visible_top(state) {
                graph.add_edge(from, state_index[&top], GraphEdge::Top);
            }

            for TransitionClass { target, symbols } in transition_classes(program, state)? {
                let label = class.describe(&symbols, ClassMode::DotLabel);
                graph.add_edge(from, state_index[&target], GraphEdge::Symbols { symbols, label });
            }
        }

        tracing::debug!(
            "Built automaton graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            graph,
            state_index,
            name: DEFAULT_GRAPH_NAME.to_string(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Export to DOT format for Graphviz
    pub fn to_dot(&self) -> String {
        let mut dot = format!("digraph {} {{\n", dot_name(&self.name));
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  size=\"11.5\";\n");
        dot.push_str("  node [ shape = circle ];\n\n");

        for node_idx in self.graph.node_indices() {
            match &self.graph[node_idx] {
                GraphNode::Start(kind) => {
                    dot.push_str(&format!("  {} [ style = invis ];\n", kind.placeholder()));
                }
                GraphNode::State {
                    id,
                    accepting,
                    eod_accepting,
                } => {
                    let mut attrs = format!(
                        "width = 1, fixedsize = true, fontsize = 12, label = \"{}\"",
                        id
                    );
                    if *eod_accepting {
                        attrs.push_str(", color = darkorchid");
                    }
                    if *accepting {
                        attrs.push_str(", shape = doublecircle");
                    }
                    dot.push_str(&format!("  {} [ {} ];\n", id, attrs));
                }
            }
        }

        dot.push('\n');

        for edge_idx in self.graph.edge_indices() {
            let Some((from_idx, to_idx)) = self.graph.edge_endpoints(edge_idx) else {
                continue;
            };
            let from = self.graph[from_idx].dot_id();
            let to = self.graph[to_idx].dot_id();
            let attrs = match &self.graph[edge_idx] {
                GraphEdge::Start(kind) => format!("color = {}", kind.color()),
                GraphEdge::Top => "color = darkgoldenrod, weight = 0.1".to_string(),
                GraphEdge::Symbols { label, .. } => format!("label = \"{}\"", label),
            };
            dot.push_str(&format!("  {} -> {} [ {} ];\n", from, to, attrs));
        }

        dot.push_str("}\n");
        dot
    }

    pub fn write_dot(&self, w: &mut impl Write) -> Result<()> {
        w.write_all(self.to_dot().as_bytes())?;
        Ok(())
    }

    /// Consolidated symbol edges leaving `state`, in emission order
    pub fn symbol_edges(&self, state: StateId) -> Vec<(StateId, &ByteSet)> {
        let Some(&node) = self.state_index.get(&state) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .filter_map(|edge| match (edge.weight(), &self.graph[edge.target()]) {
                (GraphEdge::Symbols { symbols, .. }, GraphNode::State { id, .. }) => {
                    Some((edge.id(), *id, symbols))
                }
                _ => None,
            })
            .collect();
        edges.sort_by_key(|(idx, _, _)| *idx);
        edges.into_iter().map(|(_, id, symbols)| (id, symbols)).collect()
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats::default();

        for node_idx in self.graph.node_indices() {
            if let GraphNode::State {
                accepting,
                eod_accepting,
                ..
            } = &self.graph[node_idx]
            {
                stats.states += 1;
                stats.accepting_states += usize::from(*accepting);
                stats.eod_accepting_states += usize::from(*eod_accepting);
            }
        }

        for edge_idx in self.graph.edge_indices() {
            match &self.graph[edge_idx] {
                GraphEdge::Start(_) => stats.start_edges += 1,
                GraphEdge::Top => stats.top_edges += 1,
                GraphEdge::Symbols { .. } => stats.transition_edges += 1,
            }
        }

        stats.has_cycles = petgraph::algo::is_cyclic_directed(&self.graph);
        stats
    }
}

/// Quote a graph name unless it is a plain identifier
fn dot_name(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", crate::describe::charclass::escape_dot(name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub states: usize,
    pub transition_edges: usize,
    pub top_edges: usize,
    pub start_edges: usize,
    pub accepting_states: usize,
    pub eod_accepting_states: usize,
    pub has_cycles: bool,
}
