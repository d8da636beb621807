//! Comment reply-tree builder.
//!
//! Rebuilds the reply hierarchy of one post from its flat, chronologically
//! ordered comment list. Every input comment lands in the forest exactly
//! once: under its parent when the parent is present, otherwise as a root.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

/// Nesting depth the renderer shows before flattening further replies.
///
/// The builder never truncates; this is exported for presentation code.
pub const MAX_RENDER_DEPTH: usize = 3;

/// A comment-like item that can be placed in a reply tree.
pub trait ThreadItem {
    /// This item's id.
    fn thread_id(&self) -> &str;
    /// Id of the item it replies to, if any.
    fn parent_thread_id(&self) -> Option<&str>;
}

/// A comment together with its direct replies, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentThread<T> {
    #[serde(flatten)]
    pub item: T,
    pub replies: Vec<CommentThread<T>>,
}

impl<T> CommentThread<T> {
    /// Number of comments in this subtree, itself included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.replies.iter());
        }
        count
    }

    /// Depth of this subtree; a comment without replies has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.replies.iter().map(|r| (r, depth + 1)));
        }
        deepest
    }
}

/// Total comments across a forest.
#[must_use]
pub fn forest_size<T>(forest: &[CommentThread<T>]) -> usize {
    forest.iter().map(CommentThread::node_count).sum()
}

/// Build the reply forest for one post.
///
/// `items` must be ordered oldest first. Roots and every reply list keep
/// that order. A comment whose parent is absent from `items`, or that names
/// itself as parent, becomes a root. Parent references forming a cycle are
/// cut at the earliest comment of the cycle, which becomes a root.
///
/// Runs in O(n) without recursion.
pub fn build_threads<T: ThreadItem>(items: Vec<T>) -> Vec<CommentThread<T>> {
    let n = items.len();

    let parents: Vec<Option<usize>> = {
        let index: HashMap<&str, usize> = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.thread_id(), i))
            .collect();

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.parent_thread_id()
                    .and_then(|parent| index.get(parent).copied())
                    .filter(|&parent| parent != i)
            })
            .collect()
    };

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, parent) in parents.iter().enumerate() {
        if let Some(parent) = parent {
            children[*parent].push(i);
        }
    }

    let mut placement = Placement::new(n);
    let mut roots: Vec<usize> = Vec::new();

    for (i, parent) in parents.iter().enumerate() {
        if parent.is_none() {
            roots.push(i);
            placement.place(i, &children);
        }
    }

    // Anything still unplaced hangs off a parent cycle with no way to a root.
    // Walk up to the cycle, cut it at its earliest member, and place from there.
    let mut walked = vec![false; n];
    for i in 0..n {
        if placement.placed[i] {
            continue;
        }

        let mut node = i;
        while !walked[node] {
            walked[node] = true;
            match parents[node] {
                Some(parent) => node = parent,
                None => break,
            }
        }

        let mut earliest = node;
        let mut member = node;
        while let Some(parent) = parents[member] {
            if parent == node {
                break;
            }
            earliest = earliest.min(parent);
            member = parent;
        }

        debug!(comment_id = %items[earliest].thread_id(), "Breaking comment parent cycle");
        roots.push(earliest);
        placement.place(earliest, &children);
    }
    roots.sort_unstable();

    // Pre-order puts parents before children, so walking it backwards
    // finishes every reply list before its parent is assembled.
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentThread<T>>> = (0..n).map(|_| None).collect();

    for &node in placement.order.iter().rev() {
        let replies = placement.tree_children[node]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        if let Some(item) = slots[node].take() {
            built[node] = Some(CommentThread { item, replies });
        }
    }

    roots
        .into_iter()
        .filter_map(|root| built[root].take())
        .collect()
}

/// Iterative walk assigning each node to exactly one tree position.
struct Placement {
    placed: Vec<bool>,
    order: Vec<usize>,
    tree_children: Vec<Vec<usize>>,
}

impl Placement {
    fn new(n: usize) -> Self {
        Self {
            placed: vec![false; n],
            order: Vec::with_capacity(n),
            tree_children: vec![Vec::new(); n],
        }
    }

    fn place(&mut self, start: usize, children: &[Vec<usize>]) {
        self.placed[start] = true;
        let mut stack = vec![start];

        while let Some(node) = stack.pop() {
            self.order.push(node);
            for &child in &children[node] {
                if !self.placed[child] {
                    self.placed[child] = true;
                    self.tree_children[node].push(child);
                    stack.push(child);
                }
            }
        }
    }
}
