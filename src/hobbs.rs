//! Hobbs tree search for pronoun antecedents
//!
//! Starting from the constituent that dominates the pronoun, the search:
//! 1. Climbs to the nearest ancestor whose label matches the target class
//!    or is "S", recording the climbed path
//! 2. Searches that ancestor's subtree breadth-first for a matching node
//!    left of the path, first with the dense-subtree guard, then (at the
//!    root) the sibling directly left of the path, then without the guard
//! 3. Under an "S" ancestor, checks the nearest matching node right of the
//!    path
//! 4. At the root, falls back to earlier sentences, most recent first,
//!    taking the first matching node in breadth-first order
//! 5. Otherwise climbs again
//!
//! Every round either climbs strictly upward or ends the search, so it
//! terminates after at most depth + sentence count steps.

use log::trace;

use crate::tree::{NodeId, ParseTree, Position, SentenceForest, Target};

/// Open target nodes a subtree needs before left proposals must be
/// preceded by another one
const DENSE_SUBTREE: usize = 3;

/// An accepted antecedent node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proposal {
    /// Sentence the node belongs to
    pub sentence: usize,
    pub node: NodeId,
}

impl Proposal {
    pub fn position<'a>(&self, forest: &'a SentenceForest) -> Option<&'a Position> {
        forest
            .get(self.sentence)
            .and_then(|tree| tree.get_node(self.node))
            .map(|node| &node.position)
    }

    /// Surface form of the proposal: its leftmost token
    pub fn surface<'a>(&self, forest: &'a SentenceForest) -> Option<&'a str> {
        forest.get(self.sentence)?.first_token(self.node)
    }
}

/// Positions visited while climbing from the pronoun
struct ClimbPath {
    /// Where the climb started; left and right are relative to it
    anchor: Position,
    visited: Vec<NodeId>,
}

impl ClimbPath {
    fn new(tree: &ParseTree, start: NodeId) -> Self {
        Self {
            anchor: tree.position(start).clone(),
            visited: vec![start],
        }
    }

    fn contains(&self, id: NodeId) -> bool {
        self.visited.contains(&id)
    }

    fn is_left(&self, tree: &ParseTree, id: NodeId) -> bool {
        !self.contains(id) && tree.position(id).is_left_of(&self.anchor)
    }

    fn is_right(&self, tree: &ParseTree, id: NodeId) -> bool {
        !self.contains(id) && tree.position(id).is_right_of(&self.anchor)
    }
}

/// Find the leaf of a pronoun in its sentence tree
///
/// Looks at the leaf for `token_index` first; if that leaf carries another
/// surface form, falls back to the first leaf carrying `token`.
pub fn locate_pronoun(tree: &ParseTree, token_index: usize, token: &str) -> Option<NodeId> {
    tree.leaf(token_index)
        .filter(|&id| tree.node(id).token.as_deref() == Some(token))
        .or_else(|| tree.find_leaf(token))
}

/// Run the search for the pronoun at `pronoun_leaf` in sentence `sentence`
///
/// Only trees up to and including `sentence` are consulted.
pub fn hobbs(
    forest: &SentenceForest,
    sentence: usize,
    pronoun_leaf: NodeId,
    target: Target,
) -> Option<Proposal> {
    let tree = forest.get(sentence)?;
    let start = tree.parent(pronoun_leaf)?;
    let mut path = ClimbPath::new(tree, start);
    let mut current = start;

    loop {
        current = climb(tree, current, target, &mut path);
        trace!(
            "hobbs[{}]: sentence {} at {} ({})",
            target,
            sentence,
            tree.position(current),
            tree.node(current).label
        );

        let found = guarded_left(tree, current, &path, target)
            .or_else(|| root_left_sibling(tree, current, &path, target))
            .or_else(|| first_left(tree, current, &path, target))
            .or_else(|| first_right(tree, current, &path, target));
        if let Some(node) = found {
            return Some(Proposal { sentence, node });
        }

        if current == tree.root() {
            return previous_sentences(forest, sentence, target);
        }
    }
}

/// Move up to the next ancestor that matches `target` or is "S"
///
/// Stops at the root. Every visited node is added to the path.
fn climb(tree: &ParseTree, mut current: NodeId, target: Target, path: &mut ClimbPath) -> NodeId {
    while let Some(parent) = tree.parent(current) {
        current = parent;
        path.visited.push(current);
        let node = tree.node(current);
        if node.matches(target) || node.is_sentence() {
            break;
        }
    }
    current
}

/// Left search that only proposes open target nodes
///
/// When the subtree holds `DENSE_SUBTREE` or more open target nodes, a
/// proposal is accepted only if another open target node precedes it.
fn guarded_left(tree: &ParseTree, current: NodeId, path: &ClimbPath, target: Target) -> Option<NodeId> {
    let open: Vec<NodeId> = tree
        .bfs(current)
        .filter(|&id| tree.node(id).is_open_target(target))
        .collect();
    let dense = open.len() >= DENSE_SUBTREE;

    tree.bfs(current)
        .filter(|&id| path.is_left(tree, id) && tree.node(id).is_open_target(target))
        .find(|&id| {
            !dense
                || open
                    .iter()
                    .any(|&other| other != id && tree.position(other) < tree.position(id))
        })
}

/// At the root, the child directly left of the path, if it matches and
/// holds a nominal child off the path
fn root_left_sibling(tree: &ParseTree, current: NodeId, path: &ClimbPath, target: Target) -> Option<NodeId> {
    if current != tree.root() {
        return None;
    }

    let &on_path = path.anchor.indices().first()?;
    let sibling = *tree.node(current).children.get(on_path.checked_sub(1)?)?;
    let node = tree.node(sibling);
    let has_nominal = node
        .children
        .iter()
        .any(|&child| tree.node(child).is_nominal() && !path.contains(child));

    (node.matches(target) && has_nominal).then_some(sibling)
}

/// First matching node left of the path, with no further restriction
fn first_left(tree: &ParseTree, current: NodeId, path: &ClimbPath, target: Target) -> Option<NodeId> {
    tree.bfs(current)
        .find(|&id| path.is_left(tree, id) && tree.node(id).matches(target))
}

/// Under an "S" ancestor, the nearest matching or "S" node right of the
/// path, accepted only if it is an open target
///
/// The scan never looks past the first such node.
fn first_right(tree: &ParseTree, current: NodeId, path: &ClimbPath, target: Target) -> Option<NodeId> {
    if !tree.node(current).is_sentence() {
        return None;
    }

    let id = tree.bfs(current).find(|&id| {
        let node = tree.node(id);
        path.is_right(tree, id) && (node.matches(target) || node.is_sentence())
    })?;

    tree.node(id).is_open_target(target).then_some(id)
}

/// First matching node of the closest earlier sentence that has one
fn previous_sentences(forest: &SentenceForest, sentence: usize, target: Target) -> Option<Proposal> {
    (0..sentence).rev().find_map(|index| {
        let tree = forest.get(index)?;
        trace!("hobbs[{}]: searching sentence {}", target, index);
        tree.bfs(tree.root())
            .find(|&id| tree.node(id).matches(target))
            .map(|node| Proposal {
                sentence: index,
                node,
            })
    })
}
