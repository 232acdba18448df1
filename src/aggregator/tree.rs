//! Call tree built from reconstructed frames.
//!
//! Frames arrive most-recently-completed first and carry the depth they closed
//! at. Depth alone is enough to re-parent them: a deeper frame nests under the
//! previous one, a shallower or equal one climbs back up the parent chain.
//!
//! Children are always inserted at the front and walked in stored order, so
//! the reverse arrival order cancels out and a pre-order walk yields frames in
//! the order they were entered.

use super::method_item::MethodItem;
use log::error;
use std::collections::VecDeque;

/// Index of a node inside its [`TraceTree`]
pub type NodeId = usize;

/// Arena slot for one frame
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// `None` only for the synthetic root
    pub item: Option<MethodItem>,

    /// Traversal link only; nodes are owned by the arena
    pub parent: Option<NodeId>,

    /// Reverse attachment order
    pub children: VecDeque<NodeId>,
}

impl TreeNode {
    fn new(item: Option<MethodItem>, parent: Option<NodeId>) -> Self {
        Self {
            item,
            parent,
            children: VecDeque::new(),
        }
    }

    /// Root counts as depth 0
    pub fn depth(&self) -> u32 {
        self.item.as_ref().map_or(0, |item| item.depth)
    }
}

/// Arena-backed call tree
#[derive(Debug, Clone)]
pub struct TraceTree {
    nodes: Vec<TreeNode>,
}

impl Default for TraceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceTree {
    /// Id of the synthetic root
    pub const ROOT: NodeId = 0;

    /// Empty tree holding only the root
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::new(None, None)],
        }
    }

    /// Build a tree from frames in reconstruction order
    ///
    /// **Public** - main entry point for tree construction
    ///
    /// # Returns
    /// The tree and the number of nodes created. A count of 0 means the first
    /// frame was not at depth 0; the returned tree is then empty and the caller
    /// should keep using the flat list.
    pub fn build(items: &[MethodItem]) -> (Self, usize) {
        let mut tree = Self::new();
        let mut last: Option<NodeId> = None;

        for item in items {
            let depth = item.depth;

            if last.is_none() && depth != 0 {
                error!(
                    "[stack_to_tree] begin error! first node's depth is not 0, first item: {}",
                    item
                );
                return (Self::new(), 0);
            }

            let parent = match last {
                Some(prev) if depth != 0 => {
                    if tree.nodes[prev].depth() >= depth {
                        let mut cursor = prev;
                        while tree.nodes[cursor].depth() > depth {
                            match tree.nodes[cursor].parent {
                                Some(up) => cursor = up,
                                None => break,
                            }
                        }
                        tree.nodes[cursor].parent.unwrap_or(Self::ROOT)
                    } else {
                        prev
                    }
                }
                _ => Self::ROOT,
            };

            last = Some(tree.attach(parent, item.clone()));
        }

        let count = tree.len();
        (tree, count)
    }

    fn attach(&mut self, parent: NodeId, item: MethodItem) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode::new(Some(item), Some(parent)));
        self.nodes[parent].children.push_front(id);
        id
    }

    /// Number of frame nodes, root excluded
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[Self::ROOT]
    }

    /// Pre-order frames, children in stored order
    ///
    /// **Public** - restores chronological order after [`TraceTree::build`]
    pub fn flatten(&self) -> Vec<MethodItem> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.root().children.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if let Some(item) = &node.item {
                out.push(item.clone());
            }
            stack.extend(node.children.iter().rev().copied());
        }

        out
    }

    /// Number of descendants below `id`
    pub fn count_nodes(&self, id: NodeId) -> usize {
        let Some(node) = self.nodes.get(id) else {
            return 0;
        };

        let mut count = 0;
        let mut stack: Vec<NodeId> = node.children.iter().copied().collect();
        while let Some(child) = stack.pop() {
            count += 1;
            stack.extend(self.nodes[child].children.iter().copied());
        }

        count
    }

    /// Indented `methodId[duration]` listing
    pub fn render(&self) -> String {
        let mut out = String::from("|*   TraceStack: \n");
        let mut stack: Vec<(NodeId, usize)> = self
            .root()
            .children
            .iter()
            .rev()
            .map(|child| (*child, 1))
            .collect();

        while let Some((id, level)) = stack.pop() {
            let node = &self.nodes[id];
            if let Some(item) = &node.item {
                out.push_str(&format!(
                    "|*        {}{}[{}]\n",
                    "    ".repeat(level),
                    item.method_id,
                    item.duration
                ));
            }
            stack.extend(node.children.iter().rev().map(|child| (*child, level + 1)));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(spec: &[(u32, u32)]) -> Vec<MethodItem> {
        spec.iter()
            .map(|(id, depth)| MethodItem::new(*id, 10, *depth))
            .collect()
    }

    fn ids(items: &[MethodItem]) -> Vec<u32> {
        items.iter().map(|i| i.method_id).collect()
    }

    #[test]
    fn test_parent_child() {
        let (tree, count) = TraceTree::build(&items(&[(1, 0), (2, 1)]));

        assert_eq!(count, 2);
        assert_eq!(tree.root().children, VecDeque::from(vec![1]));
        assert_eq!(tree.node(2).unwrap().parent, Some(1));
        assert_eq!(tree.node(1).unwrap().children, VecDeque::from(vec![2]));
    }

    #[test]
    fn test_first_item_must_be_top_level() {
        let (tree, count) = TraceTree::build(&items(&[(1, 1), (2, 0)]));

        assert_eq!(count, 0);
        assert!(tree.is_empty());
        assert!(tree.flatten().is_empty());
    }

    #[test]
    fn test_siblings_inserted_at_front() {
        // reconstruction order of 1 { 2, 3 }
        let (tree, _) = TraceTree::build(&items(&[(1, 0), (3, 1), (2, 1)]));

        let parent = tree.node(1).unwrap();
        assert_eq!(parent.children, VecDeque::from(vec![3, 2]));
        assert_eq!(ids(&tree.flatten()), vec![1, 2, 3]);
    }

    #[test]
    fn test_climbs_back_up() {
        // reconstruction order of 1 { 2 { 4 }, 3 { 5 } }
        let (tree, count) = TraceTree::build(&items(&[(1, 0), (3, 1), (5, 2), (2, 1), (4, 2)]));

        assert_eq!(count, 5);
        assert_eq!(tree.node(4).unwrap().parent, Some(1));
        assert_eq!(ids(&tree.flatten()), vec![1, 2, 4, 3, 5]);
    }

    #[test]
    fn test_depth_gap_climbs_to_root() {
        let (tree, count) = TraceTree::build(&items(&[(1, 0), (3, 2), (2, 1)]));

        assert_eq!(count, 3);
        // 3 skipped a level; 2 climbs past 1 to the root
        assert_eq!(tree.node(2).unwrap().parent, Some(1));
        assert_eq!(tree.node(3).unwrap().parent, Some(TraceTree::ROOT));
        assert_eq!(tree.root().children, VecDeque::from(vec![3, 1]));
    }

    #[test]
    fn test_multiple_top_level_frames() {
        let (tree, _) = TraceTree::build(&items(&[(3, 0), (4, 1), (1, 0), (2, 1)]));
        assert_eq!(ids(&tree.flatten()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_count_nodes() {
        let (tree, count) = TraceTree::build(&items(&[(1, 0), (3, 1), (5, 2), (2, 1)]));

        assert_eq!(tree.count_nodes(TraceTree::ROOT), count);
        assert_eq!(tree.count_nodes(1), 3);
        assert_eq!(tree.count_nodes(99), 0);
    }

    #[test]
    fn test_render() {
        let (tree, _) = TraceTree::build(&items(&[(1, 0), (2, 1)]));
        let rendered = tree.render();

        assert!(rendered.starts_with("|*   TraceStack: \n"));
        assert!(rendered.contains("|*            1[10]\n"));
        assert!(rendered.contains("|*                2[10]\n"));
    }

    #[test]
    fn test_deep_chain_flattens_without_recursion() {
        let chain: Vec<MethodItem> = (0..50_000u32)
            .map(|depth| MethodItem::new(depth, 1, depth))
            .collect();

        let (tree, count) = TraceTree::build(&chain);
        assert_eq!(count, 50_000);
        assert_eq!(tree.flatten(), chain);
    }

    fn chain(len: u32) -> Vec<MethodItem> {
        (0..len).map(|depth| MethodItem::new(depth, 1, depth)).collect()
    }

    #[test]
    fn test_deep_chain_counts_and_renders() {
        let (deep, count) = TraceTree::build(&chain(50_000));
        let (shallow, _) = TraceTree::build(&chain(3_000));

        // small stack so a per-level recursion would overflow
        let handle = std::thread::Builder::new()
            .stack_size(256 << 10)
            .spawn(move || (deep.count_nodes(TraceTree::ROOT), shallow.render()))
            .unwrap();
        let (counted, rendered) = handle.join().unwrap();

        assert_eq!(counted, count);
        assert_eq!(rendered.lines().count(), 3_001);
        assert!(rendered.ends_with(&format!("{}2999[1]\n", "    ".repeat(3_000))));
    }

    #[test]
    fn test_render_keeps_pre_order() {
        // reconstruction order of 1 { 2 { 4 }, 3 }
        let (tree, _) = TraceTree::build(&items(&[(1, 0), (3, 1), (2, 1), (4, 2)]));
        let rendered = tree.render();

        let ids: Vec<&str> = rendered
            .lines()
            .skip(1)
            .map(|line| line.trim_start_matches("|*").trim())
            .collect();
        assert_eq!(ids, vec!["1[10]", "2[10]", "4[10]", "3[10]"]);
    }
}
