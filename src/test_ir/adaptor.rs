//! TestIR adaptor implementation.
//!
//! This adaptor lets the loop analysis, classifier and selector run over
//! TestIR, so the whole pipeline can be tested with small text fixtures.

use super::{TestIR, ValueType};
use crate::core::{IrAdaptor, TypeClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncRef(pub u32);

/// Adaptor that implements IrAdaptor for TestIR
pub struct TestIRAdaptor<'ir> {
    ir: &'ir TestIR,
    cur_func: u32,
}

impl<'ir> TestIRAdaptor<'ir> {
    pub fn new(ir: &'ir TestIR) -> Self {
        Self { ir, cur_func: 0 }
    }

    /// Get the current function index
    pub fn cur_func(&self) -> FuncRef {
        FuncRef(self.cur_func)
    }

    /// Get the name of a value
    pub fn value_name(&self, inst: InstRef) -> &str {
        &self.ir.values[inst.0 as usize].name
    }

    /// Find a function by name.
    pub fn func_by_name(&self, name: &str) -> Option<FuncRef> {
        self.ir
            .functions
            .iter()
            .position(|f| f.name == name)
            .map(|i| FuncRef(i as u32))
    }
}

impl<'ir> IrAdaptor for TestIRAdaptor<'ir> {
    type InstRef = InstRef;
    type BlockRef = BlockRef;
    type FuncRef = FuncRef;

    fn func_count(&self) -> u32 {
        self.ir.functions.len() as u32
    }

    fn funcs(&self) -> Box<dyn Iterator<Item = Self::FuncRef> + '_> {
        Box::new((0..self.ir.functions.len()).map(|i| FuncRef(i as u32)))
    }

    fn func_link_name(&self, func: Self::FuncRef) -> &str {
        &self.ir.functions[func.0 as usize].name
    }

    fn func_is_declaration(&self, func: Self::FuncRef) -> bool {
        self.ir.functions[func.0 as usize].declaration
    }

    fn switch_func(&mut self, func: Self::FuncRef) -> bool {
        self.cur_func = func.0;
        !self.func_is_declaration(func)
    }

    fn entry_block(&self) -> Self::BlockRef {
        let func = &self.ir.functions[self.cur_func as usize];
        assert!(func.block_begin_idx != func.block_end_idx);
        BlockRef(func.block_begin_idx)
    }

    fn blocks(&self) -> Box<dyn Iterator<Item = Self::BlockRef> + '_> {
        let func = &self.ir.functions[self.cur_func as usize];
        Box::new((func.block_begin_idx..func.block_end_idx).map(BlockRef))
    }

    fn block_succs(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::BlockRef> + '_> {
        let block_info = &self.ir.blocks[block.0 as usize];
        Box::new(
            (block_info.succ_begin_idx..block_info.succ_end_idx)
                .map(move |idx| BlockRef(self.ir.block_succs[idx as usize])),
        )
    }

    fn block_insts(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::InstRef> + '_> {
        let block_info = &self.ir.blocks[block.0 as usize];
        Box::new((block_info.inst_begin_idx..block_info.inst_end_idx).map(InstRef))
    }

    fn inst_result_type(&self, inst: Self::InstRef) -> TypeClass {
        let info = &self.ir.values[inst.0 as usize];
        debug_assert_eq!(info.value_type, ValueType::Inst);
        info.ty
    }

    fn inst_operand_types(&self, inst: Self::InstRef) -> Box<dyn Iterator<Item = TypeClass> + '_> {
        let info = &self.ir.values[inst.0 as usize];
        Box::new(
            self.ir.value_operands[info.op_begin_idx as usize..info.op_end_idx as usize]
                .iter()
                .map(move |&op| self.ir.values[op as usize].ty),
        )
    }

    fn inst_opcode(&self, inst: Self::InstRef) -> String {
        self.ir.values[inst.0 as usize].opcode.clone()
    }

    fn block_name(&self, block: Self::BlockRef) -> &str {
        &self.ir.blocks[block.0 as usize].name
    }
}
