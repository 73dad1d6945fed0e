//! Vector-operation classifier.
//!
//! A loop is *vectorized* if any instruction in its blocks produces a vector
//! value or consumes a vector operand, and *scalar* otherwise. The check is a
//! pure read of the IR: calling it twice on the same loop gives the same
//! answer, and disjoint loops may be classified from different threads.

use super::adaptor::IrAdaptor;
use super::loops::{Loop, LoopForest, LoopId};
use serde::Serialize;
use std::fmt;

/// Result of classifying one loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopClass {
    Vectorized,
    Scalar,
}

impl LoopClass {
    pub fn is_vectorized(self) -> bool {
        self == LoopClass::Vectorized
    }
}

impl fmt::Display for LoopClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopClass::Vectorized => write!(f, "vectorized"),
            LoopClass::Scalar => write!(f, "scalar"),
        }
    }
}

/// Which blocks of a loop are inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifyScope {
    /// Only blocks not owned by a sub-loop.
    #[default]
    OwnBlocks,
    /// Every block of the body, sub-loops included.
    WithSubLoops,
}

/// Classifies loops by the value types their instructions touch.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorOpClassifier {
    scope: ClassifyScope,
}

impl VectorOpClassifier {
    pub fn new(scope: ClassifyScope) -> Self {
        Self { scope }
    }

    /// Classify the loop `id` of `forest`.
    pub fn classify<A: IrAdaptor>(
        &self,
        adaptor: &A,
        forest: &LoopForest<A::BlockRef>,
        id: LoopId,
    ) -> LoopClass {
        self.classify_loop(adaptor, forest.get(id))
    }

    /// Classify a single loop. A loop without blocks is scalar.
    pub fn classify_loop<A: IrAdaptor>(&self, adaptor: &A, lp: &Loop<A::BlockRef>) -> LoopClass {
        let blocks = match self.scope {
            ClassifyScope::OwnBlocks => lp.own_blocks(),
            ClassifyScope::WithSubLoops => lp.blocks(),
        };
        if blocks_contain_vector_ops(adaptor, blocks) {
            LoopClass::Vectorized
        } else {
            LoopClass::Scalar
        }
    }
}

/// True as soon as one instruction in `blocks` has a vector result or operand.
pub fn blocks_contain_vector_ops<A: IrAdaptor>(adaptor: &A, blocks: &[A::BlockRef]) -> bool {
    for &block in blocks {
        for inst in adaptor.block_insts(block) {
            if adaptor.inst_result_type(inst).is_vector() {
                log::trace!(
                    "Vector result from '{}' in block {}",
                    adaptor.inst_opcode(inst),
                    adaptor.block_name(block)
                );
                return true;
            }
            // Stores and reductions only consume vectors.
            if adaptor.inst_operand_types(inst).any(|ty| ty.is_vector()) {
                log::trace!(
                    "Vector operand to '{}' in block {}",
                    adaptor.inst_opcode(inst),
                    adaptor.block_name(block)
                );
                return true;
            }
        }
    }
    false
}
