//! Test IR (TIR) parser and data structures for exercising loop selection.
//!
//! This module provides a small typed IR format for writing tests and CLI
//! inputs without depending on LLVM. The format is designed to be:
//! - Human-readable and writable
//! - Easy to parse
//! - Expressive enough for control flow and value types
//!
//! # TIR Format
//!
//! ```text
//! ; Comments start with semicolon
//! kernel(%n, %a:v4i32) {
//! entry:
//!     br ^loop
//! loop:
//!     %v:v4i32 = add %a, %a
//!     store %v
//!     condbr %n, ^loop, ^exit
//! exit:
//!     ret
//! }
//! ext(%x)!
//! ```
//!
//! Values may carry a type after a colon: `i1`..`i64`, `f32`, `f64`, `ptr`
//! are scalars, `v<lanes><elem>` (e.g. `v4i32`) is a fixed-width vector, and
//! `agg` is an aggregate. Unannotated values are scalars. Instructions
//! without a `%name =` produce no value. Every `^block` operand is a
//! control-flow successor of the enclosing block. A function header ending
//! in `!` declares an external function without a body.

use crate::core::TypeClass;
use std::fmt::Write as _;

pub mod adaptor;
pub mod parser;

pub use adaptor::{BlockRef, FuncRef, InstRef, TestIRAdaptor};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestIR {
    pub functions: Vec<Function>,
    pub blocks: Vec<Block>,
    pub values: Vec<Value>,
    /// Value indices referenced by instructions.
    pub value_operands: Vec<u32>,
    /// Block indices referenced as successors.
    pub block_succs: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub declaration: bool,
    pub block_begin_idx: u32,
    pub block_end_idx: u32,
    pub arg_begin_idx: u32,
    pub arg_end_idx: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub succ_begin_idx: u32,
    pub succ_end_idx: u32,
    pub inst_begin_idx: u32,
    pub inst_end_idx: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    /// Empty for instructions that produce nothing.
    pub name: String,
    pub value_type: ValueType,
    /// Opcode mnemonic; empty for arguments.
    pub opcode: String,
    pub ty: TypeClass,
    pub op_begin_idx: u32,
    pub op_end_idx: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Arg,
    Inst,
}

/// Parse a type annotation such as `i32`, `ptr` or `v4f32`.
pub fn parse_type(text: &str) -> Option<TypeClass> {
    match text {
        "i1" | "i8" | "i16" | "i32" | "i64" | "f16" | "f32" | "f64" | "ptr" => {
            return Some(TypeClass::Scalar)
        }
        "void" => return Some(TypeClass::Void),
        "agg" => return Some(TypeClass::Aggregate),
        _ => {}
    }

    let rest = text.strip_prefix('v')?;
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let lanes: u32 = rest[..digits].parse().ok()?;
    match &rest[digits..] {
        "i1" | "i8" | "i16" | "i32" | "i64" | "f16" | "f32" | "f64" | "ptr" if lanes > 0 => {
            Some(TypeClass::Vector { lanes })
        }
        _ => None,
    }
}

impl TestIR {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        parser::parse_ir(text)
    }

    pub fn print(&self) -> String {
        let mut output = String::new();
        output.push_str("Printing IR\n");

        for func in &self.functions {
            if func.declaration {
                let _ = write!(output, "Extern function {}", func.name);
            } else {
                let _ = write!(output, "Function {}", func.name);
            }

            for arg in &self.values[func.arg_begin_idx as usize..func.arg_end_idx as usize] {
                let _ = write!(output, "\nArgument {} : {}", arg.name, arg.ty);
            }

            for block in &self.blocks[func.block_begin_idx as usize..func.block_end_idx as usize] {
                let _ = write!(output, "\nBlock {}", block.name);

                for &succ in &self.block_succs[block.succ_begin_idx as usize..block.succ_end_idx as usize] {
                    let _ = write!(output, "\nSucc {}", self.blocks[succ as usize].name);
                }

                for inst in &self.values[block.inst_begin_idx as usize..block.inst_end_idx as usize] {
                    if inst.name.is_empty() {
                        let _ = write!(output, "\nValue ({})", inst.opcode);
                    } else {
                        let _ = write!(output, "\nValue {} ({}) : {}", inst.name, inst.opcode, inst.ty);
                    }
                    for &op in &self.value_operands[inst.op_begin_idx as usize..inst.op_end_idx as usize] {
                        let _ = write!(output, "\nOp {}", self.values[op as usize].name);
                    }
                }
            }
            output.push('\n');
        }

        output
    }
}

impl std::fmt::Display for TestIR {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.print())
    }
}
