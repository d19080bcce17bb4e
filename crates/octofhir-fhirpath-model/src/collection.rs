//! Ordered node collections, the value type of every expression

use crate::node::Node;
use octofhir_fhirpath_types::SystemValue;
use smallvec::SmallVec;
use std::fmt;

/// Ordered, possibly repeating sequence of nodes
///
/// Equality is size-aware and pairwise structural, in order.
#[derive(Clone, Default, PartialEq)]
pub struct Collection(SmallVec<[Node; 1]>);

impl Collection {
    pub fn empty() -> Self {
        Self(SmallVec::new())
    }

    pub fn singleton(node: Node) -> Self {
        let mut items = SmallVec::new();
        items.push(node);
        Self(items)
    }

    pub fn from_value(value: impl Into<SystemValue>) -> Self {
        Self::singleton(Node::from_value(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::from_value(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.0.len() == 1
    }

    /// The only node, when there is exactly one
    pub fn singleton_node(&self) -> Option<&Node> {
        match self.0.as_slice() {
            [node] => Some(node),
            _ => None,
        }
    }

    /// Value of the only node
    pub fn singleton_value(&self) -> Option<&SystemValue> {
        self.singleton_node().and_then(Node::value)
    }

    /// Boolean of a singleton boolean collection
    pub fn as_boolean(&self) -> Option<bool> {
        self.singleton_value().and_then(SystemValue::as_boolean)
    }

    pub fn is_true(&self) -> bool {
        self.as_boolean() == Some(true)
    }

    pub fn is_false(&self) -> bool {
        self.as_boolean() == Some(false)
    }

    pub fn first(&self) -> Option<&Node> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Node> {
        self.0.last()
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Node] {
        self.0.as_slice()
    }

    pub fn push(&mut self, node: Node) {
        self.0.push(node);
    }

    pub fn extend(&mut self, other: Collection) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.0.iter().any(|n| n == node)
    }

    /// Every node of `other` has a structural match here
    pub fn contains_all(&self, other: &Collection) -> bool {
        other.iter().all(|node| self.contains(node))
    }

    /// Duplicates removed, first occurrence kept
    pub fn distinct(&self) -> Collection {
        self.union(&Collection::empty())
    }

    /// Left-then-right merge with structural duplicates removed
    pub fn union(&self, other: &Collection) -> Collection {
        let mut out = Collection::empty();
        for node in self.iter().chain(other.iter()) {
            if !out.contains(node) {
                out.push(node.clone());
            }
        }
        out
    }

    /// Concatenation without deduplication
    pub fn combine(&self, other: &Collection) -> Collection {
        self.iter().chain(other.iter()).cloned().collect()
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.0.into_vec()
    }
}

impl FromIterator<Node> for Collection {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Collection {
    type Item = Node;
    type IntoIter = smallvec::IntoIter<[Node; 1]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Node> for Collection {
    fn from(node: Node) -> Self {
        Self::singleton(node)
    }
}

impl From<Vec<Node>> for Collection {
    fn from(nodes: Vec<Node>) -> Self {
        Self(SmallVec::from_vec(nodes))
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", node)?;
        }
        f.write_str("]")
    }
}
