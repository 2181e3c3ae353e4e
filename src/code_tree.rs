//! Huffman tree construction and its self-delimiting bit serialization.
//!
//! Serialized form, pre-order: an internal node is a `0` bit followed by its
//! left and right subtrees; a leaf is a `1` bit followed by the 8 bits of its
//! symbol, most significant first. No node or symbol count is stored.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, trace};

use crate::bit_channel::BitChannel;
use crate::code_table::{Code, CodeTable};
use crate::error::{HuffError, Result};
use crate::frequency::FrequencyTable;

const SYMBOL_BITS: u8 = 8;

/// A full binary tree over at most 256 distinct symbols is never deeper than this.
const MAX_DEPTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeNode {
    Leaf {
        symbol: u8,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: Box<CodeNode>,
        right: Box<CodeNode>,
    },
}

impl CodeNode {
    /// Occurrence count covered by this subtree. Trees read back from a
    /// compressed stream carry no frequencies and report 0 everywhere.
    pub fn weight(&self) -> u64 {
        match self {
            CodeNode::Leaf { weight, .. } | CodeNode::Internal { weight, .. } => *weight,
        }
    }

    fn merge(left: CodeNode, right: CodeNode) -> CodeNode {
        CodeNode::Internal {
            weight: left.weight() + right.weight(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn collect_codes(&self, prefix: &mut Code, table: &mut CodeTable) {
        match self {
            CodeNode::Leaf { symbol, .. } => table.insert(*symbol, prefix.clone()),
            CodeNode::Internal { left, right, .. } => {
                prefix.push(false);
                left.collect_codes(prefix, table);
                prefix.pop();
                prefix.push(true);
                right.collect_codes(prefix, table);
                prefix.pop();
            }
        }
    }

    fn write_to(&self, channel: &mut BitChannel) -> Result<()> {
        match self {
            CodeNode::Leaf { symbol, .. } => {
                channel.write_bit(true)?;
                channel.write_bits(u32::from(*symbol), SYMBOL_BITS)
            }
            CodeNode::Internal { left, right, .. } => {
                channel.write_bit(false)?;
                left.write_to(channel)?;
                right.write_to(channel)
            }
        }
    }

    fn read_from(channel: &mut BitChannel, depth: usize, seen: &mut [bool; 256]) -> Result<CodeNode> {
        if depth > MAX_DEPTH {
            return Err(HuffError::malformed(format!("nesting deeper than {} levels", MAX_DEPTH)));
        }
        let is_leaf = channel.read_bit()?.ok_or(TRUNCATED_TREE)?;
        if is_leaf {
            let symbol = channel.read_bits(SYMBOL_BITS)?.ok_or(TRUNCATED_TREE)? as u8;
            if std::mem::replace(&mut seen[usize::from(symbol)], true) {
                return Err(HuffError::malformed(format!("symbol {} appears in two leaves", symbol)));
            }
            Ok(CodeNode::Leaf { symbol, weight: 0 })
        } else {
            let left = CodeNode::read_from(channel, depth + 1, seen)?;
            let right = CodeNode::read_from(channel, depth + 1, seen)?;
            Ok(CodeNode::Internal {
                weight: 0,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
    }

    fn count(&self) -> (u64, u64) {
        match self {
            CodeNode::Leaf { .. } => (1, 1),
            CodeNode::Internal { left, right, .. } => {
                let (left_nodes, left_leaves) = left.count();
                let (right_nodes, right_leaves) = right.count();
                (1 + left_nodes + right_nodes, left_leaves + right_leaves)
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            CodeNode::Leaf { .. } => 0,
            CodeNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

const TRUNCATED_TREE: HuffError = HuffError::TruncatedStream { context: "code tree" };

/// Node waiting in the build queue. Lower weight pops first; among equal
/// weights the node created earlier pops first.
struct Pending {
    weight: u64,
    order: usize,
    node: CodeNode,
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: BinaryHeap is a max-heap
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.order == other.order
    }
}

impl Eq for Pending {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTree {
    root: CodeNode,
}

impl CodeTree {
    /// Builds the Huffman tree for `frequencies`.
    ///
    /// Leaves enter the queue in ascending symbol order and merged nodes are
    /// numbered after them, so equal weights always resolve the same way and
    /// identical inputs give identical trees. The first node popped becomes
    /// the left child.
    ///
    /// A table with a single symbol yields a root whose left child is that
    /// symbol and whose right child is an unused zero-weight leaf, so the
    /// symbol still gets the one-bit code `0`. An empty table yields the same
    /// shape over symbols 0 and 1.
    pub fn from_frequencies(frequencies: &FrequencyTable) -> CodeTree {
        let mut queue: BinaryHeap<Pending> = frequencies
            .iter()
            .enumerate()
            .map(|(order, (symbol, weight))| Pending {
                weight,
                order,
                node: CodeNode::Leaf { symbol, weight },
            })
            .collect();
        let mut next_order = queue.len();

        while let Some(left) = queue.pop() {
            match queue.pop() {
                Some(right) => {
                    trace!("merging weights {} and {}", left.weight, right.weight);
                    queue.push(Pending {
                        weight: left.weight + right.weight,
                        order: next_order,
                        node: CodeNode::merge(left.node, right.node),
                    });
                    next_order += 1;
                }
                None => return CodeTree::with_root(left.node),
            }
        }
        CodeTree::single(0, 0)
    }

    fn with_root(root: CodeNode) -> CodeTree {
        match root {
            CodeNode::Leaf { symbol, weight } => CodeTree::single(symbol, weight),
            internal => CodeTree { root: internal },
        }
    }

    fn single(symbol: u8, weight: u64) -> CodeTree {
        CodeTree {
            root: CodeNode::merge(
                CodeNode::Leaf { symbol, weight },
                CodeNode::Leaf {
                    symbol: symbol.wrapping_add(1),
                    weight: 0,
                },
            ),
        }
    }

    pub fn root(&self) -> &CodeNode {
        &self.root
    }

    /// Root-to-leaf path of every leaf symbol.
    pub fn code_table(&self) -> CodeTable {
        let mut table = CodeTable::default();
        self.root.collect_codes(&mut Code::default(), &mut table);
        table
    }

    /// Bits occupied by the serialized tree: one per node plus eight per leaf.
    pub fn size(&self) -> u64 {
        let (nodes, leaves) = self.root.count();
        nodes + u64::from(SYMBOL_BITS) * leaves
    }

    pub fn leaf_count(&self) -> u64 {
        self.root.count().1
    }

    /// Length of the longest code.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Writes the tree through `channel` and returns the number of bits written.
    pub fn serialize(&self, channel: &mut BitChannel) -> Result<u64> {
        self.root.write_to(channel)?;
        let bits = self.size();
        debug!("wrote code tree: {} leaves, depth {}, {} bits", self.leaf_count(), self.depth(), bits);
        Ok(bits)
    }

    /// Reads a tree written by [`CodeTree::serialize`].
    pub fn deserialize(channel: &mut BitChannel) -> Result<CodeTree> {
        let mut seen = [false; 256];
        let root = CodeNode::read_from(channel, 0, &mut seen)?;
        if let CodeNode::Leaf { symbol, .. } = root {
            return Err(HuffError::malformed(format!("root is the lone leaf {}", symbol)));
        }
        let tree = CodeTree { root };
        debug!("read code tree: {} leaves, depth {}", tree.leaf_count(), tree.depth());
        Ok(tree)
    }
}
