// This module defines the IrAdaptor trait, which serves as the bridge between loopsel and
// the host compiler's intermediate representation. The selector never owns or mutates the
// IR; it only needs to enumerate functions, walk the blocks of the current function and
// their control-flow successors, and ask for the type class of every instruction result
// and operand. Associated reference types keep the trait independent of any concrete IR so
// the same loop analysis, classifier and selector run over the in-crate Test IR and over
// LLVM modules loaded through inkwell.

//! IrAdaptor responsibilities.
//!
//! The adaptor is the glue between loopsel and the host IR. The framework
//! assumes:
//! - Each function with a body has a single entry block.
//! - Basic blocks contain an ordered list of instructions; control flow
//!   leaves a block through its successors.
//! - Every instruction reports one result type (possibly void) and one type
//!   per operand.
//!
//! Implementations may preprocess data in `switch_func` to speed up later calls.

use super::types::TypeClass;

/// Bridge between a host IR and loopsel.
///
/// All block and instruction queries refer to the function most recently
/// passed to [`IrAdaptor::switch_func`].
pub trait IrAdaptor {
    type InstRef: Copy + Eq;
    type BlockRef: Copy + Eq + core::hash::Hash + core::fmt::Debug;
    type FuncRef: Copy + Eq;

    /// Number of functions contained in the module.
    fn func_count(&self) -> u32;

    /// Iterator over all functions in the module.
    fn funcs(&self) -> Box<dyn Iterator<Item = Self::FuncRef> + '_>;

    /// Linkage name of the function.
    fn func_link_name(&self, func: Self::FuncRef) -> &str;

    /// True for external declarations without a body.
    fn func_is_declaration(&self, func: Self::FuncRef) -> bool;

    /// Switch to the given function. Returns false if it has no body.
    fn switch_func(&mut self, func: Self::FuncRef) -> bool;

    /// Entry block of the currently selected function.
    fn entry_block(&self) -> Self::BlockRef;

    /// Iterator over blocks in the current function, in layout order.
    fn blocks(&self) -> Box<dyn Iterator<Item = Self::BlockRef> + '_>;

    /// Successor blocks of a given block.
    fn block_succs(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::BlockRef> + '_>;

    /// Iterator over instructions of the given block.
    fn block_insts(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::InstRef> + '_>;

    /// Type class of the value produced by an instruction.
    fn inst_result_type(&self, inst: Self::InstRef) -> TypeClass;

    /// Type classes of the instruction's operands, in operand order.
    fn inst_operand_types(&self, inst: Self::InstRef) -> Box<dyn Iterator<Item = TypeClass> + '_>;

    /// Opcode mnemonic, for diagnostics only.
    fn inst_opcode(&self, _inst: Self::InstRef) -> String {
        String::new()
    }

    /// Get the name of a block (for printing).
    fn block_name(&self, _block: Self::BlockRef) -> &str {
        ""
    }
}
