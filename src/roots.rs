//! Ordered root index
//!
//! An AVL tree keyed by root text. Each node owns its children exclusively,
//! so rotations only move boxed links around. Key order is the code-point
//! order of the root letters, which is what `str::cmp` gives for UTF-8.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A word derived from a root, with the number of times it was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivative {
    pub word: String,
    pub frequency: u32,
}

/// A triliteral root and the derivatives observed for it so far
#[derive(Debug, Clone, Serialize)]
pub struct Root {
    pub text: String,
    pub derivatives: Vec<Derivative>,
}

impl Root {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            derivatives: Vec::new(),
        }
    }

    /// Bump the frequency of `word`, or append it with frequency 1.
    /// Returns the resulting frequency.
    fn record(&mut self, word: &str) -> u32 {
        if let Some(existing) = self.derivatives.iter_mut().find(|d| d.word == word) {
            existing.frequency += 1;
            return existing.frequency;
        }
        self.derivatives.push(Derivative {
            word: word.to_string(),
            frequency: 1,
        });
        1
    }
}

type Link = Option<Box<Node>>;

struct Node {
    root: Root,
    height: i32,
    left: Link,
    right: Link,
}

fn height(link: &Link) -> i32 {
    link.as_ref().map_or(0, |n| n.height)
}

impl Node {
    fn new(text: &str) -> Box<Self> {
        Box::new(Self {
            root: Root::new(text),
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance_factor(&self) -> i32 {
        height(&self.left) - height(&self.right)
    }
}

fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

fn rebalance(mut node: Box<Node>) -> Box<Node> {
    node.update_height();
    let balance = node.balance_factor();

    if balance > 1 {
        // LR: straighten the left child first
        if node.left.as_ref().map_or(0, |l| l.balance_factor()) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }

    if balance < -1 {
        // RL
        if node.right.as_ref().map_or(0, |r| r.balance_factor()) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }

    node
}

fn insert_node(link: Link, text: &str, inserted: &mut bool) -> Box<Node> {
    let Some(mut node) = link else {
        *inserted = true;
        return Node::new(text);
    };

    match text.cmp(node.root.text.as_str()) {
        Ordering::Less => node.left = Some(insert_node(node.left.take(), text, inserted)),
        Ordering::Greater => node.right = Some(insert_node(node.right.take(), text, inserted)),
        Ordering::Equal => return node,
    }

    rebalance(node)
}

/// Recursive view of the tree shape, used by the debug surface
#[derive(Debug, Clone, Serialize)]
pub struct TreeView {
    pub root: String,
    pub height: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<TreeView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<TreeView>>,
}

impl TreeView {
    fn of(node: &Node) -> Self {
        Self {
            root: node.root.text.clone(),
            height: node.height,
            left: node.left.as_deref().map(|n| Box::new(Self::of(n))),
            right: node.right.as_deref().map(|n| Box::new(Self::of(n))),
        }
    }
}

#[derive(Default)]
pub struct RootIndex {
    root: Link,
    len: usize,
}

impl RootIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root. Returns `false` when it was already present.
    pub fn insert(&mut self, text: &str) -> bool {
        let mut inserted = false;
        self.root = Some(insert_node(self.root.take(), text, &mut inserted));
        if inserted {
            self.len += 1;
        }
        debug_assert!(self.is_balanced(), "AVL balance violated after inserting {text}");
        inserted
    }

    pub fn contains(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    pub fn find(&self, text: &str) -> Option<&Root> {
        let mut cursor = self.root.as_deref();
        while let Some(node) = cursor {
            match text.cmp(node.root.text.as_str()) {
                Ordering::Less => cursor = node.left.as_deref(),
                Ordering::Greater => cursor = node.right.as_deref(),
                Ordering::Equal => return Some(&node.root),
            }
        }
        None
    }

    fn find_mut(&mut self, text: &str) -> Option<&mut Root> {
        let mut cursor = self.root.as_deref_mut();
        while let Some(node) = cursor {
            match text.cmp(node.root.text.as_str()) {
                Ordering::Less => cursor = node.left.as_deref_mut(),
                Ordering::Greater => cursor = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.root),
            }
        }
        None
    }

    /// Record `word` as a derivative of `text`, creating the root if needed.
    /// Returns the word's frequency after recording.
    pub fn append_derivative(&mut self, text: &str, word: &str) -> u32 {
        self.insert(text);
        match self.find_mut(text) {
            Some(root) => root.record(word),
            None => unreachable!("root {text} missing right after insert"),
        }
    }

    /// Insert a root together with a previously persisted derivative list.
    pub fn restore(&mut self, text: &str, derivatives: Vec<Derivative>) {
        self.insert(text);
        if let Some(root) = self.find_mut(text) {
            root.derivatives = derivatives;
        }
    }

    /// In-order (lexicographic) traversal
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.root.as_deref())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn height(&self) -> i32 {
        height(&self.root)
    }

    pub fn snapshot(&self) -> Option<TreeView> {
        self.root.as_deref().map(TreeView::of)
    }

    /// Every node's subtrees differ in height by at most one and stored
    /// heights are accurate.
    pub fn is_balanced(&self) -> bool {
        fn check(link: &Link) -> Option<i32> {
            let Some(node) = link else { return Some(0) };
            let left = check(&node.left)?;
            let right = check(&node.right)?;
            let h = 1 + left.max(right);
            ((left - right).abs() <= 1 && h == node.height).then_some(h)
        }
        check(&self.root).is_some()
    }
}

pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn new(root: Option<&'a Node>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left(root);
        iter
    }

    fn push_left(&mut self, mut link: Option<&'a Node>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Root;

    fn next(&mut self) -> Option<&'a Root> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some(&node.root)
    }
}
