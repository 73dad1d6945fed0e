//! TIR (Test IR) parser implementation.

use super::*;
use std::collections::HashMap;

pub fn parse_ir(text: &str) -> Result<TestIR, String> {
    let parser = Parser::new(text);
    parser.parse()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    ir: TestIR,

    funcs: HashMap<&'a str, u32>,

    // Per-function maps
    blocks: HashMap<&'a str, u32>,
    values: HashMap<&'a str, u32>,
    block_resolves: Vec<Resolve<'a>>,
    value_resolves: Vec<Resolve<'a>>,
}

/// A forward reference patched once the function has been read.
#[derive(Debug)]
struct Resolve<'a> {
    name: &'a str,
    index: u32,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            ir: TestIR::new(),
            funcs: HashMap::new(),
            blocks: HashMap::new(),
            values: HashMap::new(),
            block_resolves: Vec::new(),
            value_resolves: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<TestIR, String> {
        self.skip_whitespace(true);

        while !self.is_eof() {
            if let Err(e) = self.parse_function() {
                let line = self.text[..self.pos].matches('\n').count() + 1;
                return Err(format!("line {}: {}", line, e));
            }
            self.skip_whitespace(true);
        }

        Ok(self.ir)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn current_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self, skip_newlines: bool) {
        while let Some(ch) = self.current_char() {
            if ch == ';' {
                // Comment runs to the end of the line; the newline stays.
                while let Some(ch) = self.current_char() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else if ch.is_whitespace() {
                if ch == '\n' && !skip_newlines {
                    break;
                }
                self.advance();
            } else {
                break;
            }
        }
    }

    fn try_read(&mut self, ch: char) -> bool {
        self.skip_whitespace(true);
        if self.current_char() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), String> {
        if !self.try_read(ch) {
            return Err(format!(
                "Expected '{}' but found {:?}",
                ch,
                self.current_char()
            ));
        }
        Ok(())
    }

    /// Identifier at the current position, without skipping whitespace.
    fn read_identifier_here(&mut self) -> Result<&'a str, String> {
        let start = self.pos;
        match self.current_char() {
            Some(ch) if ch.is_alphabetic() || ch == '_' => {}
            Some(ch) => return Err(format!("Expected identifier but found '{}'", ch)),
            None => return Err("Expected identifier but found EOF".to_string()),
        }

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                self.advance();
            } else {
                break;
            }
        }

        Ok(&self.text[start..self.pos])
    }

    fn read_identifier(&mut self) -> Result<&'a str, String> {
        self.skip_whitespace(true);
        self.read_identifier_here()
    }

    /// `%name` with an optional `:type` suffix.
    fn read_value_def(&mut self) -> Result<(&'a str, Option<TypeClass>), String> {
        self.expect('%')?;
        let name = self.read_identifier_here()?;
        let ty = if self.current_char() == Some(':') {
            self.advance();
            let ty_name = self.read_identifier_here()?;
            Some(parse_type(ty_name).ok_or_else(|| format!("Unknown type '{}'", ty_name))?)
        } else {
            None
        };
        Ok((name, ty))
    }

    fn parse_function(&mut self) -> Result<(), String> {
        let func_name = self.read_identifier()?;
        let func_idx = self.ir.functions.len() as u32;

        if self.funcs.contains_key(func_name) {
            return Err(format!("Duplicate function definition: '{}'", func_name));
        }

        self.blocks.clear();
        self.values.clear();
        self.block_resolves.clear();
        self.value_resolves.clear();

        // Arguments
        self.expect('(')?;
        let arg_begin_idx = self.ir.values.len() as u32;
        while !self.try_read(')') {
            self.skip_whitespace(true);
            let (arg_name, ty) = self.read_value_def()?;
            let arg_idx = self.ir.values.len() as u32;
            if self.values.insert(arg_name, arg_idx).is_some() {
                return Err(format!("Duplicate argument '%{}'", arg_name));
            }
            self.ir.values.push(Value {
                name: arg_name.to_string(),
                value_type: ValueType::Arg,
                opcode: String::new(),
                ty: ty.unwrap_or(TypeClass::Scalar),
                op_begin_idx: 0,
                op_end_idx: 0,
            });

            if !self.try_read(',') {
                self.skip_whitespace(true);
                if self.current_char() != Some(')') {
                    return Err("Expected ',' or ')' in argument list".to_string());
                }
            }
        }
        let arg_end_idx = self.ir.values.len() as u32;

        let declaration = self.try_read('!');
        let block_begin_idx = self.ir.blocks.len() as u32;
        if !declaration {
            self.expect('{')?;
            while !self.try_read('}') {
                if self.is_eof() {
                    return Err(format!("Unterminated body of '{}'", func_name));
                }
                self.parse_block()?;
            }
            if self.ir.blocks.len() as u32 == block_begin_idx {
                return Err(format!("Function '{}' has no blocks", func_name));
            }
            self.resolve_function_references()?;
        }
        let block_end_idx = self.ir.blocks.len() as u32;

        self.funcs.insert(func_name, func_idx);
        self.ir.functions.push(Function {
            name: func_name.to_string(),
            declaration,
            block_begin_idx,
            block_end_idx,
            arg_begin_idx,
            arg_end_idx,
        });

        Ok(())
    }

    fn parse_block(&mut self) -> Result<(), String> {
        let block_name = self.read_identifier()?;
        if self.current_char() != Some(':') {
            return Err(format!("Expected block label but found '{}'", block_name));
        }
        self.advance();

        let block_idx = self.ir.blocks.len() as u32;
        if self.blocks.insert(block_name, block_idx).is_some() {
            return Err(format!("Duplicate block '{}'", block_name));
        }

        let inst_begin_idx = self.ir.values.len() as u32;
        let mut successors = Vec::new();
        while !self.is_at_block_end() {
            self.parse_instruction(&mut successors)?;
        }
        let inst_end_idx = self.ir.values.len() as u32;

        let succ_begin_idx = self.ir.block_succs.len() as u32;
        for name in successors {
            self.block_resolves.push(Resolve {
                name,
                index: self.ir.block_succs.len() as u32,
            });
            self.ir.block_succs.push(0); // Placeholder
        }
        let succ_end_idx = self.ir.block_succs.len() as u32;

        self.ir.blocks.push(Block {
            name: block_name.to_string(),
            succ_begin_idx,
            succ_end_idx,
            inst_begin_idx,
            inst_end_idx,
        });

        Ok(())
    }

    /// End of function, EOF, or the next `label:` line.
    fn is_at_block_end(&mut self) -> bool {
        self.skip_whitespace(true);
        match self.current_char() {
            None | Some('}') => true,
            Some('%') => false,
            Some(_) => {
                let saved = self.pos;
                let is_label = self.read_identifier_here().is_ok() && self.current_char() == Some(':');
                self.pos = saved;
                is_label
            }
        }
    }

    fn parse_instruction(&mut self, successors: &mut Vec<&'a str>) -> Result<(), String> {
        self.skip_whitespace(true);

        let mut def = None;
        if self.current_char() == Some('%') {
            def = Some(self.read_value_def()?);
            self.expect('=')?;
        }
        let opcode = self.read_identifier()?;

        let op_begin_idx = self.ir.value_operands.len() as u32;
        loop {
            self.skip_whitespace(false);
            match self.current_char() {
                Some('%') => {
                    self.advance();
                    let name = self.read_identifier_here()?;
                    self.value_resolves.push(Resolve {
                        name,
                        index: self.ir.value_operands.len() as u32,
                    });
                    self.ir.value_operands.push(0); // Placeholder
                }
                Some('^') => {
                    self.advance();
                    successors.push(self.read_identifier_here()?);
                }
                Some(',') => self.advance(),
                None | Some('\n') | Some('}') => break,
                Some(ch) => {
                    return Err(format!("Unexpected '{}' in operands of '{}'", ch, opcode));
                }
            }
        }
        let op_end_idx = self.ir.value_operands.len() as u32;

        let inst_idx = self.ir.values.len() as u32;
        let (name, ty) = match def {
            Some((name, ty)) => {
                if self.values.insert(name, inst_idx).is_some() {
                    return Err(format!("Redefinition of '%{}'", name));
                }
                (name.to_string(), ty.unwrap_or(TypeClass::Scalar))
            }
            None => (String::new(), TypeClass::Void),
        };

        self.ir.values.push(Value {
            name,
            value_type: ValueType::Inst,
            opcode: opcode.to_string(),
            ty,
            op_begin_idx,
            op_end_idx,
        });

        Ok(())
    }

    fn resolve_function_references(&mut self) -> Result<(), String> {
        for resolve in self.value_resolves.drain(..) {
            let idx = self
                .values
                .get(resolve.name)
                .ok_or_else(|| format!("Undefined value '%{}'", resolve.name))?;
            self.ir.value_operands[resolve.index as usize] = *idx;
        }

        for resolve in self.block_resolves.drain(..) {
            let idx = self
                .blocks
                .get(resolve.name)
                .ok_or_else(|| format!("Undefined block '^{}'", resolve.name))?;
            self.ir.block_succs[resolve.index as usize] = *idx;
        }

        Ok(())
    }
}
