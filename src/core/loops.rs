// This module implements loop-nest discovery for a single function. LoopAnalysis walks the
// control-flow graph exposed by an IrAdaptor in three steps: 1) a reverse post-order (RPO)
// traversal from the entry block gives every reachable block a stable position, 2) the
// iterative Cooper-Harvey-Kennedy algorithm computes immediate dominators over that order,
// and 3) back edges (tail -> header where the header dominates the tail) are grouped per
// header into natural loops whose bodies are collected by a backwards walk from the tails.
// Loops are then nested by containment. The resulting LoopForest uses LLVM LoopInfo's
// discovery order: top-level loops by header post-order (the last loop in program order
// comes first) and sub-loops by header RPO. The DFS visits successors in the order the
// adaptor reports them, so the numbering that loop selection relies on is deterministic
// for a given function. LoopIds are dense indices that are only meaningful for the forest
// that produced them.

//! Natural loop discovery and the loop forest.

use super::adaptor::IrAdaptor;
use core::marker::PhantomData;
use hashbrown::{HashMap, HashSet};

/// Position of a loop inside one [`LoopForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopId(pub u32);

impl LoopId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A natural loop.
#[derive(Debug, Clone)]
pub struct Loop<B> {
    header: B,
    /// Every block of the body, sub-loop blocks included, in RPO.
    blocks: Vec<B>,
    /// Blocks whose innermost loop is this one, in RPO.
    own_blocks: Vec<B>,
    sub_loops: Vec<LoopId>,
    parent: Option<LoopId>,
    depth: u32,
}

impl<B: Copy + Eq> Loop<B> {
    /// Header block, the single entry of the loop.
    pub fn header(&self) -> B {
        self.header
    }

    /// All blocks of the loop including those of nested loops.
    pub fn blocks(&self) -> &[B] {
        &self.blocks
    }

    /// Blocks that belong to this loop but to none of its sub-loops.
    pub fn own_blocks(&self) -> &[B] {
        &self.own_blocks
    }

    /// Immediate sub-loops in header order.
    pub fn sub_loops(&self) -> &[LoopId] {
        &self.sub_loops
    }

    pub fn parent(&self) -> Option<LoopId> {
        self.parent
    }

    /// Nesting depth; top-level loops have depth 1.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_innermost(&self) -> bool {
        self.sub_loops.is_empty()
    }
}

/// The loop nest of one function.
#[derive(Debug, Clone)]
pub struct LoopForest<B: Eq + core::hash::Hash> {
    loops: Vec<Loop<B>>,
    top_level: Vec<LoopId>,
    innermost: HashMap<B, LoopId>,
}

impl<B: Copy + Eq + core::hash::Hash> Default for LoopForest<B> {
    fn default() -> Self {
        Self {
            loops: Vec::new(),
            top_level: Vec::new(),
            innermost: HashMap::new(),
        }
    }
}

impl<B: Copy + Eq + core::hash::Hash> LoopForest<B> {
    /// Total number of loops at every depth.
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Outermost loops, last header first.
    pub fn top_level_loops(&self) -> &[LoopId] {
        &self.top_level
    }

    pub fn get(&self, id: LoopId) -> &Loop<B> {
        &self.loops[id.index()]
    }

    /// All loops, parents before children, in discovery order.
    pub fn loops_in_preorder(&self) -> Vec<LoopId> {
        let mut out = Vec::with_capacity(self.loops.len());
        let mut stack: Vec<LoopId> = self.top_level.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.get(id).sub_loops.iter().rev().copied());
        }
        out
    }

    /// Innermost loop containing the block.
    pub fn loop_for(&self, block: B) -> Option<LoopId> {
        self.innermost.get(&block).copied()
    }

    /// Loop depth of a block (0 for blocks outside any loop).
    pub fn loop_depth(&self, block: B) -> u32 {
        self.loop_for(block).map_or(0, |id| self.get(id).depth)
    }

    pub fn is_loop_header(&self, block: B) -> bool {
        self.loop_for(block)
            .is_some_and(|id| self.get(id).header == block)
    }
}

/// Computes block order, dominators and the loop forest for a function.
pub struct LoopAnalysis<A: IrAdaptor> {
    order: Vec<A::BlockRef>,
    block_map: HashMap<A::BlockRef, usize>,
    preds: Vec<Vec<usize>>,
    idom: Vec<usize>,
    _marker: PhantomData<A>,
}

impl<A: IrAdaptor> Default for LoopAnalysis<A> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            block_map: HashMap::new(),
            preds: Vec::new(),
            idom: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<A: IrAdaptor> LoopAnalysis<A> {
    /// Create a new analysis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reachable blocks in reverse post order.
    pub fn order(&self) -> &[A::BlockRef] {
        &self.order
    }

    /// Immediate dominator of a reachable block; `None` for the entry block
    /// and for unreachable blocks.
    pub fn idom(&self, block: A::BlockRef) -> Option<A::BlockRef> {
        let idx = *self.block_map.get(&block)?;
        if idx == 0 {
            return None;
        }
        Some(self.order[self.idom[idx]])
    }

    /// Does `a` dominate `b`? Both must be reachable.
    pub fn dominates(&self, a: A::BlockRef, b: A::BlockRef) -> bool {
        match (self.block_map.get(&a), self.block_map.get(&b)) {
            (Some(&a), Some(&b)) => self.dominates_idx(a, b),
            _ => false,
        }
    }

    /// Switch the adaptor to `func` and build its loop forest. Functions
    /// without a body have no loops.
    pub fn switch_func(&mut self, adaptor: &mut A, func: A::FuncRef) -> LoopForest<A::BlockRef> {
        self.order.clear();
        self.block_map.clear();
        self.preds.clear();
        self.idom.clear();

        if !adaptor.switch_func(func) {
            return LoopForest::default();
        }
        self.analyze(adaptor)
    }

    /// Build the loop forest of the adaptor's current function.
    pub fn analyze(&mut self, adaptor: &A) -> LoopForest<A::BlockRef> {
        self.compute_rpo(adaptor);
        self.compute_preds(adaptor);
        self.compute_dominators();
        let forest = self.build_forest();
        log::debug!(
            "Loop analysis: {} reachable blocks, {} loops ({} top-level)",
            self.order.len(),
            forest.len(),
            forest.top_level_loops().len()
        );
        forest
    }

    fn compute_rpo(&mut self, adaptor: &A) {
        self.order.clear();
        self.block_map.clear();

        // Depth-first, successors visited in the order the adaptor reports them.
        let entry = adaptor.entry_block();
        let mut post = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(entry);
        let mut stack = vec![(entry, adaptor.block_succs(entry).collect::<Vec<_>>(), 0usize)];
        while let Some((block, succs, next)) = stack.last_mut() {
            if let Some(&succ) = succs.get(*next) {
                *next += 1;
                if visited.insert(succ) {
                    let succ_succs = adaptor.block_succs(succ).collect();
                    stack.push((succ, succ_succs, 0));
                }
            } else {
                post.push(*block);
                stack.pop();
            }
        }
        post.reverse();
        self.order = post;
        for (idx, b) in self.order.iter().enumerate() {
            self.block_map.insert(*b, idx);
        }
    }

    fn compute_preds(&mut self, adaptor: &A) {
        self.preds = vec![Vec::new(); self.order.len()];
        for (idx, &block) in self.order.iter().enumerate() {
            for succ in adaptor.block_succs(block) {
                if let Some(&succ_idx) = self.block_map.get(&succ) {
                    if !self.preds[succ_idx].contains(&idx) {
                        self.preds[succ_idx].push(idx);
                    }
                }
            }
        }
    }

    fn compute_dominators(&mut self) {
        const UNDEF: usize = usize::MAX;
        let n = self.order.len();
        self.idom = vec![UNDEF; n];
        if n == 0 {
            return;
        }
        self.idom[0] = 0;

        let mut changed = true;
        while changed {
            changed = false;
            for b in 1..n {
                let mut new_idom = UNDEF;
                for &p in &self.preds[b] {
                    if self.idom[p] == UNDEF {
                        continue;
                    }
                    new_idom = if new_idom == UNDEF {
                        p
                    } else {
                        self.intersect(p, new_idom)
                    };
                }
                if new_idom != UNDEF && self.idom[b] != new_idom {
                    self.idom[b] = new_idom;
                    changed = true;
                }
            }
        }
    }

    fn intersect(&self, mut a: usize, mut b: usize) -> usize {
        while a != b {
            while a > b {
                a = self.idom[a];
            }
            while b > a {
                b = self.idom[b];
            }
        }
        a
    }

    fn dominates_idx(&self, a: usize, mut b: usize) -> bool {
        loop {
            if a == b {
                return true;
            }
            if b == 0 || self.idom[b] == usize::MAX {
                return false;
            }
            b = self.idom[b];
        }
    }

    fn build_forest(&self) -> LoopForest<A::BlockRef> {
        // Natural loops keyed by header, headers visited in RPO.
        let mut bodies: Vec<(usize, Vec<bool>, usize)> = Vec::new();
        for header in 0..self.order.len() {
            let tails: Vec<usize> = self.preds[header]
                .iter()
                .copied()
                .filter(|&p| self.dominates_idx(header, p))
                .collect();
            if tails.is_empty() {
                continue;
            }

            let mut in_body = vec![false; self.order.len()];
            in_body[header] = true;
            let mut size = 1;
            let mut worklist = Vec::new();
            for tail in tails {
                if !in_body[tail] {
                    in_body[tail] = true;
                    size += 1;
                    worklist.push(tail);
                }
            }
            while let Some(block) = worklist.pop() {
                for &pred in &self.preds[block] {
                    if !in_body[pred] {
                        in_body[pred] = true;
                        size += 1;
                        worklist.push(pred);
                    }
                }
            }
            log::trace!(
                "Natural loop at {:?} with {} blocks",
                self.order[header],
                size
            );
            bodies.push((header, in_body, size));
        }

        // Parent is the smallest other loop whose body holds our header.
        let parents: Vec<Option<usize>> = (0..bodies.len())
            .map(|i| {
                let (header_i, ref body_i, _) = bodies[i];
                (0..bodies.len())
                    .filter(|&j| j != i)
                    .filter(|&j| bodies[j].1[header_i] && !body_i[bodies[j].0])
                    .min_by_key(|&j| bodies[j].2)
            })
            .collect();

        let mut loops: Vec<Loop<A::BlockRef>> = bodies
            .iter()
            .map(|(header, _, size)| Loop {
                header: self.order[*header],
                blocks: Vec::with_capacity(*size),
                own_blocks: Vec::new(),
                sub_loops: Vec::new(),
                parent: None,
                depth: 1,
            })
            .collect();
        let mut top_level = Vec::new();

        // Parents have smaller header RPO indices, so depth is ready in time.
        for i in 0..loops.len() {
            let id = LoopId(i as u32);
            match parents[i] {
                Some(p) => {
                    loops[i].parent = Some(LoopId(p as u32));
                    loops[i].depth = loops[p].depth + 1;
                    loops[p].sub_loops.push(id);
                }
                None => top_level.push(id),
            }
        }
        // Top-level loops are numbered by header post-order, the way LLVM's
        // LoopInfo lists them; sub-loops stay in header order.
        top_level.reverse();

        let mut innermost = HashMap::new();
        for block in 0..self.order.len() {
            let owner = (0..bodies.len())
                .filter(|&i| bodies[i].1[block])
                .min_by_key(|&i| bodies[i].2);
            for (i, (_, in_body, _)) in bodies.iter().enumerate() {
                if in_body[block] {
                    loops[i].blocks.push(self.order[block]);
                }
            }
            if let Some(owner) = owner {
                loops[owner].own_blocks.push(self.order[block]);
                innermost.insert(self.order[block], LoopId(owner as u32));
            }
        }

        LoopForest {
            loops,
            top_level,
            innermost,
        }
    }
}
