//! Directed grammar graph over token types (C6): which token type may
//! legally follow another, plus the conditional (drum-only/instrument-only)
//! and generation-mode (autoregressive/bar-infill) variants built from it.

pub mod base_spec;
pub mod error;
pub mod graph;

pub use error::GrammarError;
pub use graph::{Graph, Node};

use tok_controls::control_for_token_type;
use tok_vocab::{Representation, TokenType};

/// Which generation mode a [`Grammar`] has been trimmed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelMode {
    /// Autoregressive, whole-track generation: fill-in tokens are unreachable.
    Track,
    /// Bar infilling: only the note-level token subset is reachable, entered
    /// at `FILL_IN_END` so the first legal move is `FILL_IN_START`.
    BarInfill,
}

const NOTE_LEVEL_TOKENS: &[TokenType] = &[
    TokenType::VelocityLevel,
    TokenType::NoteOnset,
    TokenType::NoteDuration,
    TokenType::Delta,
    TokenType::DeltaDirection,
    TokenType::TimeAbsolutePos,
    TokenType::FillInStart,
    TokenType::FillInEnd,
];

const FILL_IN_TOKENS: &[TokenType] =
    &[TokenType::FillInPlaceholder, TokenType::FillInStart, TokenType::FillInEnd];

/// Builds the base graph (literal edges + C4-generated attribute paths),
/// shared by every [`Grammar`] before mode- and vocabulary-specific trimming.
fn build_base_graph() -> Graph {
    let mut graph = Graph::new();
    for path in base_spec::def_graph() {
        let nodes: Vec<Node> = path.into_iter().map(|tt| (tt, 0)).collect();
        graph.add_path(&nodes);
    }
    graph.add_path(&base_spec::track_attribute_path());
    graph.add_path(&base_spec::bar_attribute_path());
    graph
}

/// The constrained-generation grammar: a [`Graph`] trimmed to an active
/// vocabulary and generation mode.
#[derive(Debug, Clone)]
pub struct Grammar {
    graph: Graph,
    mode: ModelMode,
}

impl Grammar {
    /// Builds the base graph, drops every node whose token type the active
    /// representation doesn't carry, then trims for `mode`.
    #[must_use]
    pub fn initialize(rep: &Representation, mode: ModelMode) -> Self {
        let mut graph = build_base_graph();
        let to_remove: Vec<Node> =
            graph.node_keys().filter(|(tt, _)| !rep.has_token_type(*tt)).collect();
        graph.remove_nodes(&to_remove);

        match mode {
            ModelMode::Track => {
                let fill_in: Vec<Node> = FILL_IN_TOKENS.iter().map(|tt| (*tt, 0)).collect();
                graph.remove_nodes_wo_connecting(&fill_in);
            }
            ModelMode::BarInfill => {
                let to_drop: Vec<Node> = graph
                    .node_keys()
                    .filter(|(tt, _)| !NOTE_LEVEL_TOKENS.contains(tt))
                    .collect();
                graph.remove_nodes_wo_connecting(&to_drop);
                let _ = graph.traverse((TokenType::FillInEnd, 0));
            }
        }

        Self { graph, mode }
    }

    /// Removes every attribute-control token whose `applies_to` excludes
    /// `is_drum`, without rerouting (§4.5 instrument-only / drum-only
    /// variants). A no-op for controls with `TrackApplicability::BOTH`.
    pub fn restrict_to_track_kind(&mut self, is_drum: bool) {
        let to_drop: Vec<Node> = self
            .graph
            .node_keys()
            .filter(|(tt, _)| {
                control_for_token_type(*tt).is_some_and(|c| !c.applies_to().check_valid_track(is_drum))
            })
            .collect();
        self.graph.remove_nodes_wo_connecting(&to_drop);
    }

    /// Which generation mode this grammar was trimmed for.
    #[must_use]
    pub fn mode(&self) -> ModelMode {
        self.mode
    }

    /// Whether `token_type` survived this grammar's mode trimming. A
    /// `BarInfill` grammar drops every structural (non note-level) token
    /// type, so the structural prefix of an infill prompt is not a node
    /// here at all.
    #[must_use]
    pub fn contains_token_type(&self, token_type: TokenType) -> bool {
        self.graph.contains((token_type, 0))
    }

    /// The current traversal position, if traversal has started.
    #[must_use]
    pub fn current(&self) -> Option<Node> {
        self.graph.current()
    }

    /// See [`Graph::infer_node`].
    pub fn infer_node(&self, token_type: TokenType) -> Result<Node, GrammarError> {
        self.graph.infer_node(token_type)
    }

    /// See [`Graph::next_nodes`].
    #[must_use]
    pub fn next_nodes(&self, node: Node) -> Vec<Node> {
        self.graph.next_nodes(node)
    }

    /// See [`Graph::previous_nodes`].
    #[must_use]
    pub fn previous_nodes(&self, node: Node) -> Vec<Node> {
        self.graph.previous_nodes(node)
    }

    /// See [`Graph::traverse`].
    pub fn traverse(&mut self, node: Node) -> Result<(), GrammarError> {
        self.graph.traverse(node)
    }

    /// See [`Graph::skip`].
    pub fn skip(&mut self, node: Node) -> Result<(), GrammarError> {
        self.graph.skip(node)
    }

    /// Fast-forwards past disabled attribute-control nodes one edge at a
    /// time, stopping at the first node whose token type is in `rep`'s
    /// active vocabulary. Used when the live stream lands on a track kind
    /// that does not carry the current node's attribute token (e.g. a
    /// drum-only control encountered on an instrument track). Capped at 100
    /// iterations; exceeding the cap means the graph has a cycle reachable
    /// entirely through nodes not present in `rep`.
    pub fn possibly_skip(&mut self, rep: &Representation) -> Result<Node, GrammarError> {
        let mut current = self.graph.current().ok_or(GrammarError::NotStarted)?;
        for _ in 0..100 {
            if rep.has_token_type(current.0) {
                return Ok(current);
            }
            let next = self.graph.next_nodes(current);
            let Some(&candidate) = next.first() else {
                return Err(GrammarError::CannotInferNode { token_type: current.0 });
            };
            self.graph.traverse(candidate)?;
            current = candidate;
        }
        Err(GrammarError::InfiniteLoop)
    }
}

#[cfg(test)]
mod tests {
    use tok_vocab::build_default_representation;

    use super::*;

    #[test]
    fn initialize_track_mode_removes_fill_in_tokens() {
        let rep = build_default_representation().unwrap();
        let grammar = Grammar::initialize(&rep, ModelMode::Track);
        assert!(!grammar.graph.contains((TokenType::FillInStart, 0)));
        assert!(!grammar.graph.contains((TokenType::FillInEnd, 0)));
    }

    #[test]
    fn initialize_bar_infill_keeps_only_note_level_tokens() {
        let rep = build_default_representation().unwrap();
        let grammar = Grammar::initialize(&rep, ModelMode::BarInfill);
        assert!(!grammar.graph.contains((TokenType::Track, 0)));
        assert!(grammar.graph.contains((TokenType::NoteOnset, 0)));
        assert_eq!(grammar.graph.current(), Some((TokenType::FillInEnd, 0)));
    }

    #[test]
    fn infer_node_piece_start_always_succeeds() {
        let rep = build_default_representation().unwrap();
        let grammar = Grammar::initialize(&rep, ModelMode::Track);
        assert_eq!(grammar.infer_node(TokenType::PieceStart).unwrap(), (TokenType::PieceStart, 0));
    }

    #[test]
    fn base_graph_connects_track_to_instrument_through_attribute_tokens() {
        let rep = build_default_representation().unwrap();
        let mut grammar = Grammar::initialize(&rep, ModelMode::Track);
        grammar.traverse((TokenType::PieceStart, 0)).unwrap();
        grammar.traverse((TokenType::Track, 0)).unwrap();
        let next = grammar.next_nodes((TokenType::Track, 0));
        assert!(!next.is_empty());
    }
}
