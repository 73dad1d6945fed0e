// This module implements the loop selector, the decision stage between loop analysis and
// data-flow-graph construction. For a function that is a configured kernel it performs a
// single deterministic pass: 1) top-level loops (and, with targetNested, the immediate
// sub-loops of each, right after their parent) are classified and appended to a vectorized
// or a scalar list in discovery order, 2) the two lists are concatenated vectorized-first to
// form the combined candidate list whose positions are the indices param.json refers to,
// 3) explicitly configured indices pick candidates in combined order, and 4) if nothing was
// picked, every vectorized loop is selected, or every scalar loop when there are none. The
// selector never fails; empty results are ordinary outcomes. Each selected loop produces
// one SelectionEvent that is logged and returned to the caller.

//! Vectorization-aware loop selection.

use super::adaptor::IrAdaptor;
use super::classifier::{ClassifyScope, LoopClass, VectorOpClassifier};
use super::loops::{LoopForest, LoopId};
use crate::config::TargetConfig;
use std::fmt;

/// Loops of one function ordered for selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList {
    pub vectorized: Vec<LoopId>,
    pub scalar: Vec<LoopId>,
}

impl CandidateList {
    /// Vectorized loops first, then scalar loops. A loop's position in this
    /// sequence is its selection index.
    pub fn combined(&self) -> impl Iterator<Item = LoopId> + '_ {
        self.vectorized.iter().chain(self.scalar.iter()).copied()
    }

    pub fn len(&self) -> usize {
        self.vectorized.len() + self.scalar.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectorized.is_empty() && self.scalar.is_empty()
    }

    /// Class of the candidate at combined position `index`.
    pub fn class_at(&self, index: usize) -> Option<LoopClass> {
        if index < self.vectorized.len() {
            Some(LoopClass::Vectorized)
        } else if index < self.len() {
            Some(LoopClass::Scalar)
        } else {
            None
        }
    }
}

/// One progress notice per selected loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Picked through an explicit index.
    Selected { index: usize, class: LoopClass },
    /// Picked by the automatic policy.
    AutoSelected { class: LoopClass },
}

impl fmt::Display for SelectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionEvent::Selected { index, class } => write!(
                f,
                "[Loop Selection] Selected loop {} (vectorized: {})",
                index,
                if class.is_vectorized() { "yes" } else { "no" }
            ),
            SelectionEvent::AutoSelected { class: LoopClass::Vectorized } => {
                write!(f, "[Loop Selection] Auto-selected vectorized loop")
            }
            SelectionEvent::AutoSelected { class: LoopClass::Scalar } => write!(
                f,
                "[Loop Selection] Auto-selected scalar loop (no vectorized loops found)"
            ),
        }
    }
}

/// A loop chosen for mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedLoop {
    pub id: LoopId,
    /// Position in the combined candidate list.
    pub candidate_index: usize,
    pub class: LoopClass,
}

/// Outcome of [`LoopSelector::select`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub loops: Vec<SelectedLoop>,
    pub events: Vec<SelectionEvent>,
    /// Configured indices with no candidate at that position.
    pub unmatched_ids: Vec<usize>,
    /// True if the automatic policy produced `loops`.
    pub auto_selected: bool,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn loop_ids(&self) -> impl Iterator<Item = LoopId> + '_ {
        self.loops.iter().map(|l| l.id)
    }
}

/// Chooses the loops of a kernel to hand to the mapper.
pub struct LoopSelector<'cfg> {
    config: &'cfg TargetConfig,
    classifier: VectorOpClassifier,
}

impl<'cfg> LoopSelector<'cfg> {
    pub fn new(config: &'cfg TargetConfig) -> Self {
        let scope = if config.classify_sub_loop_blocks {
            ClassifyScope::WithSubLoops
        } else {
            ClassifyScope::OwnBlocks
        };
        Self {
            config,
            classifier: VectorOpClassifier::new(scope),
        }
    }

    pub fn classifier(&self) -> &VectorOpClassifier {
        &self.classifier
    }

    /// Classify the loop nest into vectorized and scalar candidates.
    ///
    /// With `target_nested`, only the immediate sub-loops of top-level loops
    /// are considered; deeper loops are never candidates.
    pub fn candidates<A: IrAdaptor>(
        &self,
        adaptor: &A,
        forest: &LoopForest<A::BlockRef>,
    ) -> CandidateList {
        let mut list = CandidateList::default();
        for &top in forest.top_level_loops() {
            self.push_candidate(adaptor, forest, top, &mut list);
            if self.config.target_nested {
                for &sub in forest.get(top).sub_loops() {
                    self.push_candidate(adaptor, forest, sub, &mut list);
                }
            }
        }
        list
    }

    fn push_candidate<A: IrAdaptor>(
        &self,
        adaptor: &A,
        forest: &LoopForest<A::BlockRef>,
        id: LoopId,
        list: &mut CandidateList,
    ) {
        let class = self.classifier.classify(adaptor, forest, id);
        log::debug!(
            "Loop at {} (depth {}) is {}",
            adaptor.block_name(forest.get(id).header()),
            forest.get(id).depth(),
            class
        );
        match class {
            LoopClass::Vectorized => list.vectorized.push(id),
            LoopClass::Scalar => list.scalar.push(id),
        }
    }

    /// Select the loops of `func_name` to target.
    ///
    /// Returns an empty selection immediately if the function is not a
    /// configured kernel.
    pub fn select<A: IrAdaptor>(
        &self,
        func_name: &str,
        adaptor: &A,
        forest: &LoopForest<A::BlockRef>,
    ) -> Selection {
        let Some(target_ids) = self.config.kernels.loop_ids(func_name) else {
            return Selection::default();
        };

        let candidates = self.candidates(adaptor, forest);
        let mut selection = Selection::default();

        for (index, id) in candidates.combined().enumerate() {
            if !target_ids.contains(&index) {
                continue;
            }
            let class = if index < candidates.vectorized.len() {
                LoopClass::Vectorized
            } else {
                LoopClass::Scalar
            };
            record(
                &mut selection,
                SelectedLoop { id, candidate_index: index, class },
                SelectionEvent::Selected { index, class },
            );
        }

        selection.unmatched_ids = target_ids
            .iter()
            .copied()
            .filter(|&idx| idx >= candidates.len())
            .collect();
        for idx in &selection.unmatched_ids {
            log::warn!(
                "{}: targetLoopsID {} matches no loop ({} candidates)",
                func_name,
                idx,
                candidates.len()
            );
        }

        if selection.loops.is_empty() {
            let (ids, offset, class) = if !candidates.vectorized.is_empty() {
                (&candidates.vectorized, 0, LoopClass::Vectorized)
            } else {
                (&candidates.scalar, candidates.vectorized.len(), LoopClass::Scalar)
            };
            for (pos, &id) in ids.iter().enumerate() {
                record(
                    &mut selection,
                    SelectedLoop { id, candidate_index: offset + pos, class },
                    SelectionEvent::AutoSelected { class },
                );
            }
            selection.auto_selected = !selection.loops.is_empty();
        }

        selection
    }
}

fn record(selection: &mut Selection, selected: SelectedLoop, event: SelectionEvent) {
    log::debug!("{}", event);
    selection.loops.push(selected);
    selection.events.push(event);
}
