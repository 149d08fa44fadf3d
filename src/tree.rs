//! Constituent tree data structures
//!
//! Trees are stored as an arena of nodes indexed by `NodeId`, with the root
//! at id 0. Every node also records its `Position`, the path of child
//! indices leading to it from the root, which is what the Hobbs search
//! compares when it needs "left of" and "right of".

use std::collections::VecDeque;
use std::fmt;

/// Unique identifier for a node within one tree
pub type NodeId = usize;

/// Labels treated as terminal nominals: never proposed as a noun phrase
/// that is still open to attachment
pub const NOMINAL_TAGS: [&str; 5] = ["PRP", "NNPS", "NNP", "NNS", "NN"];

/// Label of the root constituent
pub const SENTENCE_LABEL: &str = "S";

/// Label of a chunk constituent
pub const CHUNK_LABEL: &str = "CHUNK";

/// Location of a node as child indices from the root
///
/// Ordering is lexicographic on the index sequence, so an ancestor sorts
/// before all of its descendants and left siblings sort before right ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position(Vec<usize>);

impl Position {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn child(&self, index: usize) -> Position {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// True if `self` is a proper ancestor of `other`
    pub fn is_ancestor_of(&self, other: &Position) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Strictly precedes `anchor` and does not dominate it
    pub fn is_left_of(&self, anchor: &Position) -> bool {
        self < anchor && !self.is_ancestor_of(anchor)
    }

    /// Strictly follows `anchor` and is not dominated by it
    pub fn is_right_of(&self, anchor: &Position) -> bool {
        self > anchor && !anchor.is_ancestor_of(self)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", index)?;
        }
        write!(f, ")")
    }
}

/// Coarse classification of a node label, computed once at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Exactly "S"
    Sentence,
    /// Exactly "CHUNK"
    Chunk,
    /// One of `NOMINAL_TAGS`
    Nominal,
    Other,
}

impl Label {
    pub fn classify(label: &str) -> Self {
        if label == SENTENCE_LABEL {
            Label::Sentence
        } else if label == CHUNK_LABEL {
            Label::Chunk
        } else if NOMINAL_TAGS.contains(&label) {
            Label::Nominal
        } else {
            Label::Other
        }
    }
}

/// Label class a search is looking for
///
/// A node matches when its label contains the class name as a substring,
/// so "NNP" matches both `NounPhrase` and `Noun`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    NounPhrase,
    Noun,
    Locative,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::NounPhrase, Target::Noun, Target::Locative];

    /// Substring a label must contain to match
    pub fn needle(self) -> &'static str {
        match self {
            Target::NounPhrase => "NP",
            Target::Noun => "NN",
            Target::Locative => "LOCATIVE",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Target::NounPhrase => 1,
            Target::Noun => 1 << 1,
            Target::Locative => 1 << 2,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.needle())
    }
}

/// Set of targets a label matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetSet(u8);

impl TargetSet {
    pub fn of(label: &str) -> Self {
        let mut set = Self::default();
        for target in Target::ALL {
            if label.contains(target.needle()) {
                set.0 |= target.bit();
            }
        }
        set
    }

    pub fn contains(self, target: Target) -> bool {
        self.0 & target.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A node in a constituent tree
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: Label,
    pub targets: TargetSet,
    /// Surface token, present only on leaves
    pub token: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub position: Position,
}

impl Node {
    pub fn new(id: NodeId, label: &str, position: Position) -> Self {
        Self {
            id,
            label: label.to_string(),
            kind: Label::classify(label),
            targets: TargetSet::of(label),
            token: None,
            parent: None,
            children: Vec::new(),
            position,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.token.is_some()
    }

    pub fn matches(&self, target: Target) -> bool {
        self.targets.contains(target)
    }

    pub fn is_nominal(&self) -> bool {
        self.kind == Label::Nominal
    }

    pub fn is_sentence(&self) -> bool {
        self.kind == Label::Sentence
    }

    /// Matches the target without being a terminal nominal
    pub fn is_open_target(&self, target: Target) -> bool {
        self.matches(target) && !self.is_nominal()
    }
}

/// A constituent tree for one sentence
#[derive(Debug, Clone)]
pub struct ParseTree {
    pub nodes: Vec<Node>,
    leaves: Vec<NodeId>,
}

impl ParseTree {
    /// Create a tree holding only its root
    pub fn new(root_label: &str) -> Self {
        Self {
            nodes: vec![Node::new(0, root_label, Position::root())],
            leaves: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    /// Append a constituent under `parent`
    pub fn add_child(&mut self, parent: NodeId, label: &str) -> NodeId {
        let id = self.nodes.len();
        let position = self.nodes[parent].position.child(self.nodes[parent].children.len());
        let mut node = Node::new(id, label, position);
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        id
    }

    /// Append a leaf carrying a surface token under `parent`
    ///
    /// Leaves must be added in token order.
    pub fn add_leaf(&mut self, parent: NodeId, label: &str, token: &str) -> NodeId {
        let id = self.add_child(parent, label);
        self.nodes[id].token = Some(token.to_string());
        self.leaves.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|node| node.parent)
    }

    pub fn position(&self, id: NodeId) -> &Position {
        &self.nodes[id].position
    }

    /// Leaf nodes in token order
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Leaf for the token at `index`
    pub fn leaf(&self, index: usize) -> Option<NodeId> {
        self.leaves.get(index).copied()
    }

    /// First leaf carrying `token`
    pub fn find_leaf(&self, token: &str) -> Option<NodeId> {
        self.leaves
            .iter()
            .copied()
            .find(|&id| self.nodes[id].token.as_deref() == Some(token))
    }

    /// Surface tokens in order
    pub fn tokens(&self) -> Vec<&str> {
        self.leaves
            .iter()
            .filter_map(|&id| self.nodes[id].token.as_deref())
            .collect()
    }

    /// Surface token of the leftmost leaf under `id`
    pub fn first_token(&self, id: NodeId) -> Option<&str> {
        let mut current = self.get_node(id)?;
        loop {
            if let Some(token) = current.token.as_deref() {
                return Some(token);
            }
            current = self.get_node(*current.children.first()?)?;
        }
    }

    /// Breadth-first walk of the subtree rooted at `from`
    pub fn bfs(&self, from: NodeId) -> Bfs<'_> {
        let mut queue = VecDeque::new();
        if from < self.nodes.len() {
            queue.push_back(from);
        }
        Bfs { tree: self, queue }
    }

    /// Render back to bracket text
    pub fn to_bracketed(&self) -> String {
        let mut out = String::new();
        self.write_bracketed(self.root(), &mut out);
        out
    }

    fn write_bracketed(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        out.push_str("( ");
        out.push_str(&node.label);
        if let Some(token) = &node.token {
            out.push(' ');
            out.push_str(&escape_token(token));
        }
        for &child in &node.children {
            out.push(' ');
            self.write_bracketed(child, out);
        }
        out.push_str(" )");
    }
}

/// Breadth-first iterator over node ids
pub struct Bfs<'a> {
    tree: &'a ParseTree,
    queue: VecDeque<NodeId>,
}

impl Iterator for Bfs<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.queue.pop_front()?;
        self.queue.extend(self.tree.nodes[id].children.iter().copied());
        Some(id)
    }
}

/// Escape bracket characters inside a token
///
/// Backslash is the escape character: `(` becomes `\l`, `)` becomes `\r`
/// and `\` itself becomes `\\`, so every token survives the round trip.
pub fn escape_token(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\l"),
            ')' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Undo `escape_token`
///
/// A backslash before any other character is kept as is.
pub fn unescape_token(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('l') => out.push('('),
            Some('r') => out.push(')'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Per-document sequence of sentence trees
///
/// Append-only. A sentence whose tree could not be built keeps its index
/// as a gap so later indices stay aligned with the document.
#[derive(Debug, Clone, Default)]
pub struct SentenceForest {
    trees: Vec<Option<ParseTree>>,
}

impl SentenceForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tree, returning its sentence index
    pub fn push(&mut self, tree: ParseTree) -> usize {
        self.trees.push(Some(tree));
        self.trees.len() - 1
    }

    /// Reserve an index for a sentence that has no tree
    pub fn push_gap(&mut self) -> usize {
        self.trees.push(None);
        self.trees.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ParseTree> {
        self.trees.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&ParseTree>> {
        self.trees.iter().map(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ( S ( CHUNK ( N ( NN cat ) ) ) ( CHUNK ( V ( VM sleeps ) ) ) )
    fn create_test_tree() -> ParseTree {
        let mut tree = ParseTree::new("S");
        let c1 = tree.add_child(0, "CHUNK");
        let n = tree.add_child(c1, "N");
        tree.add_leaf(n, "NN", "cat");
        let c2 = tree.add_child(0, "CHUNK");
        let v = tree.add_child(c2, "V");
        tree.add_leaf(v, "VM", "sleeps");
        tree
    }

    #[test]
    fn test_tree_creation() {
        let tree = create_test_tree();

        assert_eq!(tree.nodes.len(), 7);
        assert_eq!(tree.leaves().len(), 2);
        assert_eq!(tree.tokens(), vec!["cat", "sleeps"]);
        assert_eq!(tree.parent(3), Some(2));
        assert_eq!(tree.position(3), &Position::from_indices(vec![0, 0, 0]));
        assert_eq!(tree.position(6), &Position::from_indices(vec![1, 0, 0]));
    }

    #[test]
    fn test_label_classification() {
        let tree = create_test_tree();

        assert!(tree.node(0).is_sentence());
        assert_eq!(tree.node(1).kind, Label::Chunk);
        assert_eq!(tree.node(2).kind, Label::Other);
        assert!(tree.node(3).is_nominal());
        assert!(tree.node(3).matches(Target::Noun));
        assert!(!tree.node(3).matches(Target::NounPhrase));
        assert!(!tree.node(3).is_open_target(Target::Noun));
    }

    #[test]
    fn test_target_set_substring_match() {
        let nnp = TargetSet::of("NNP");
        assert!(nnp.contains(Target::NounPhrase));
        assert!(nnp.contains(Target::Noun));
        assert!(!nnp.contains(Target::Locative));

        assert!(TargetSet::of("N_LOCATIVE").contains(Target::Locative));
        assert!(TargetSet::of("CHUNK").is_empty());
        assert!(TargetSet::of("N").is_empty());
    }

    #[test]
    fn test_position_ordering() {
        let root = Position::root();
        let a = Position::from_indices(vec![0]);
        let a0 = Position::from_indices(vec![0, 0]);
        let b = Position::from_indices(vec![1]);

        assert!(root < a);
        assert!(a < a0);
        assert!(a0 < b);

        assert!(a.is_ancestor_of(&a0));
        assert!(!a.is_ancestor_of(&a));
        assert!(a0.is_left_of(&b));
        assert!(!a.is_left_of(&a0));
        assert!(!a0.is_left_of(&a0));
        assert!(b.is_right_of(&a0));
        assert!(!a0.is_right_of(&a));
        assert_eq!(a0.to_string(), "(0, 0)");
    }

    #[test]
    fn test_bfs_order() {
        let tree = create_test_tree();
        let order: Vec<NodeId> = tree.bfs(tree.root()).collect();
        let labels: Vec<&str> = order.iter().map(|&id| tree.node(id).label.as_str()).collect();

        assert_eq!(labels, vec!["S", "CHUNK", "CHUNK", "N", "V", "NN", "VM"]);

        let sub: Vec<NodeId> = tree.bfs(4).collect();
        assert_eq!(sub, vec![4, 5, 6]);
    }

    #[test]
    fn test_first_token_and_find_leaf() {
        let tree = create_test_tree();

        assert_eq!(tree.first_token(0), Some("cat"));
        assert_eq!(tree.first_token(4), Some("sleeps"));
        assert_eq!(tree.find_leaf("sleeps"), Some(6));
        assert_eq!(tree.find_leaf("dog"), None);
        assert_eq!(tree.leaf(1), Some(6));
        assert_eq!(tree.leaf(2), None);
    }

    #[test]
    fn test_to_bracketed() {
        let tree = create_test_tree();
        assert_eq!(
            tree.to_bracketed(),
            "( S ( CHUNK ( N ( NN cat ) ) ) ( CHUNK ( V ( VM sleeps ) ) ) )"
        );
    }

    #[test]
    fn test_escape_roundtrip() {
        assert_eq!(escape_token("(a)"), r"\la\r");
        assert_eq!(unescape_token(r"\la\r"), "(a)");

        for token in ["-LRB-", "-RRB-", r"\l", r"a\", "((", "plain", r"\\"] {
            let escaped = escape_token(token);
            assert!(!escaped.contains('(') && !escaped.contains(')'));
            assert_eq!(unescape_token(&escaped), token);
        }

        // Unknown escapes pass through
        assert_eq!(unescape_token(r"a\xb\"), r"a\xb\");
    }

    #[test]
    fn test_forest_gaps() {
        let mut forest = SentenceForest::new();
        assert!(forest.is_empty());

        assert_eq!(forest.push(create_test_tree()), 0);
        assert_eq!(forest.push_gap(), 1);
        assert_eq!(forest.push(create_test_tree()), 2);

        assert_eq!(forest.len(), 3);
        assert!(forest.get(0).is_some());
        assert!(forest.get(1).is_none());
        assert!(forest.get(2).is_some());
        assert!(forest.get(3).is_none());
        assert_eq!(forest.iter().filter(Option::is_some).count(), 2);
    }
}
