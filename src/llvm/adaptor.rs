// This module implements IrAdaptor for LLVM modules loaded through inkwell. On construction
// the adaptor records every function of the module together with its linkage name. When
// a function is selected with switch_func, its basic blocks are collected in layout order,
// named (unnamed blocks get a positional "bbN" name), and their successor lists are built
// from the basic-block operands of each terminator (br, switch, indirectbr, invoke and
// friends all expose their targets that way), in LLVM successor order. Instruction result types and operand types
// are folded into TypeClass: fixed-width vector types become Vector with their lane count,
// arrays and structs become Aggregate, block operands are Label, and everything else is
// Scalar. The module is only read; nothing is mutated.

//! inkwell-backed [`IrAdaptor`].

use crate::core::{IrAdaptor, TypeClass};
use hashbrown::HashMap;
use inkwell::basic_block::BasicBlock;
use inkwell::context::Context;
use inkwell::memory_buffer::MemoryBuffer;
use inkwell::module::Module;
use inkwell::types::{AnyTypeEnum, BasicTypeEnum};
use inkwell::values::{FunctionValue, InstructionOpcode, InstructionValue};
use std::path::Path;

/// Parse a textual (`.ll`) or bitcode (`.bc`) LLVM module.
pub fn load_module<'ctx>(context: &'ctx Context, path: &Path) -> Result<Module<'ctx>, String> {
    let buffer = MemoryBuffer::create_from_file(path).map_err(|e| e.to_string())?;
    let is_bitcode = path.extension().is_some_and(|ext| ext == "bc");
    if is_bitcode {
        Module::parse_bitcode_from_buffer(&buffer, context).map_err(|e| e.to_string())
    } else {
        context.create_module_from_ir(buffer).map_err(|e| e.to_string())
    }
}

/// Index of a block within the current function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LlvmBlockRef(pub u32);

/// Index of a function within the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LlvmFuncRef(pub u32);

pub struct LlvmAdaptor<'ctx> {
    /// All functions in the module.
    functions: Vec<FunctionValue<'ctx>>,
    /// Function names for lookup and reporting.
    function_names: Vec<String>,
    /// Blocks of the current function in layout order.
    blocks: Vec<BasicBlock<'ctx>>,
    block_names: Vec<String>,
    block_successors: Vec<Vec<u32>>,
}

impl<'ctx> LlvmAdaptor<'ctx> {
    pub fn new(module: &Module<'ctx>) -> Self {
        let functions: Vec<_> = module.get_functions().collect();
        let function_names = functions
            .iter()
            .map(|f| f.get_name().to_str().unwrap_or("").to_string())
            .collect();

        Self {
            functions,
            function_names,
            blocks: Vec::new(),
            block_names: Vec::new(),
            block_successors: Vec::new(),
        }
    }

    /// Find a function by name.
    pub fn func_by_name(&self, name: &str) -> Option<LlvmFuncRef> {
        self.function_names
            .iter()
            .position(|n| n == name)
            .map(|i| LlvmFuncRef(i as u32))
    }

    fn build_block_successors(&mut self) {
        let index: HashMap<BasicBlock<'ctx>, u32> = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, &b)| (b, i as u32))
            .collect();

        self.block_successors = self
            .blocks
            .iter()
            .map(|block| {
                let Some(terminator) = block.get_terminator() else {
                    return Vec::new();
                };
                let mut succs: Vec<u32> = (0..terminator.get_num_operands())
                    .filter_map(|i| terminator.get_operand(i).and_then(|op| op.right()))
                    .filter_map(|target| index.get(&target).copied())
                    .collect();
                // A conditional br stores its false target before the true one;
                // successor order is true target first.
                if terminator.get_opcode() == InstructionOpcode::Br {
                    succs.reverse();
                }
                succs
            })
            .collect();
    }
}

fn any_type_class(ty: AnyTypeEnum<'_>) -> TypeClass {
    match ty {
        AnyTypeEnum::VectorType(v) => TypeClass::Vector { lanes: v.get_size() },
        AnyTypeEnum::VoidType(_) => TypeClass::Void,
        AnyTypeEnum::ArrayType(_) | AnyTypeEnum::StructType(_) => TypeClass::Aggregate,
        _ => TypeClass::Scalar,
    }
}

fn basic_type_class(ty: BasicTypeEnum<'_>) -> TypeClass {
    match ty {
        BasicTypeEnum::VectorType(v) => TypeClass::Vector { lanes: v.get_size() },
        BasicTypeEnum::ArrayType(_) | BasicTypeEnum::StructType(_) => TypeClass::Aggregate,
        _ => TypeClass::Scalar,
    }
}

impl<'ctx> IrAdaptor for LlvmAdaptor<'ctx> {
    type InstRef = InstructionValue<'ctx>;
    type BlockRef = LlvmBlockRef;
    type FuncRef = LlvmFuncRef;

    fn func_count(&self) -> u32 {
        self.functions.len() as u32
    }

    fn funcs(&self) -> Box<dyn Iterator<Item = Self::FuncRef> + '_> {
        Box::new((0..self.functions.len()).map(|i| LlvmFuncRef(i as u32)))
    }

    fn func_link_name(&self, func: Self::FuncRef) -> &str {
        &self.function_names[func.0 as usize]
    }

    fn func_is_declaration(&self, func: Self::FuncRef) -> bool {
        self.functions[func.0 as usize].count_basic_blocks() == 0
    }

    fn switch_func(&mut self, func: Self::FuncRef) -> bool {
        let function = self.functions[func.0 as usize];
        self.blocks = function.get_basic_blocks();
        self.block_names = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| match b.get_name().to_str() {
                Ok(name) if !name.is_empty() => name.to_string(),
                _ => format!("bb{}", i),
            })
            .collect();
        self.build_block_successors();
        !self.blocks.is_empty()
    }

    fn entry_block(&self) -> Self::BlockRef {
        LlvmBlockRef(0)
    }

    fn blocks(&self) -> Box<dyn Iterator<Item = Self::BlockRef> + '_> {
        Box::new((0..self.blocks.len()).map(|i| LlvmBlockRef(i as u32)))
    }

    fn block_succs(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::BlockRef> + '_> {
        Box::new(
            self.block_successors[block.0 as usize]
                .iter()
                .map(|&idx| LlvmBlockRef(idx)),
        )
    }

    fn block_insts(&self, block: Self::BlockRef) -> Box<dyn Iterator<Item = Self::InstRef> + '_> {
        Box::new(self.blocks[block.0 as usize].get_instructions())
    }

    fn inst_result_type(&self, inst: Self::InstRef) -> TypeClass {
        any_type_class(inst.get_type())
    }

    fn inst_operand_types(&self, inst: Self::InstRef) -> Box<dyn Iterator<Item = TypeClass> + '_> {
        Box::new(
            (0..inst.get_num_operands())
                .filter_map(move |i| inst.get_operand(i))
                .map(|op| match op.left() {
                    Some(value) => basic_type_class(value.get_type()),
                    None => TypeClass::Label,
                }),
        )
    }

    fn inst_opcode(&self, inst: Self::InstRef) -> String {
        format!("{:?}", inst.get_opcode())
    }

    fn block_name(&self, block: Self::BlockRef) -> &str {
        &self.block_names[block.0 as usize]
    }
}
