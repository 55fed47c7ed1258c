use std::collections::HashMap;
use std::fmt;

use crate::cpu::{
    encode, OP_ADD, OP_ADDI, OP_BEQ, OP_BNE, OP_HALT, OP_J, OP_LI, OP_LW, OP_MV, OP_PRINT,
    OP_SUB, OP_SW, REGISTER_COUNT,
};

/// Assembly failure with the 1-based source line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleError {
    pub line: usize,
    pub message: String,
}

impl AssembleError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for AssembleError {}

struct Statement<'a> {
    line: usize,
    mnemonic: &'a str,
    operands: Vec<&'a str>,
    // word address of this statement within the program
    addr: i64,
}

/// Assemble source text into instruction words.
///
/// Syntax: one statement per line, `#` starts a comment, labels end in
/// `:` and may share a line with an instruction. `.word` emits its
/// operands as literal data words. Immediates are decimal or `0x` hex,
/// or a label name (resolved to the label's byte address; branch and
/// jump operands resolve to an offset relative to the instruction).
pub fn assemble(source: &str) -> Result<Vec<u32>, AssembleError> {
    let mut labels: HashMap<&str, i64> = HashMap::new();
    let mut statements: Vec<Statement<'_>> = Vec::new();
    let mut addr: i64 = 0;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let mut rest = raw.split('#').next().unwrap_or("").trim();

        // Leading labels, possibly several on one line.
        while let Some((head, tail)) = rest.split_once(':') {
            let name = head.trim();
            if !is_identifier(name) {
                break;
            }
            if labels.insert(name, addr).is_some() {
                return Err(AssembleError::new(
                    line,
                    format!("duplicate label '{}'", name),
                ));
            }
            rest = tail.trim();
        }

        if rest.is_empty() {
            continue;
        }

        let (mnemonic, operand_text) = match rest.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, rest.trim()),
            None => (rest, ""),
        };
        let operands: Vec<&str> = if operand_text.is_empty() {
            Vec::new()
        } else {
            operand_text.split(',').map(str::trim).collect()
        };

        let words = match mnemonic {
            ".word" => operands.len().max(1) as i64,
            _ => 1,
        };
        statements.push(Statement {
            line,
            mnemonic,
            operands,
            addr,
        });
        addr += words * 4;
    }

    let mut program = Vec::new();
    for stmt in &statements {
        encode_statement(stmt, &labels, &mut program)?;
    }
    Ok(program)
}

fn encode_statement(
    stmt: &Statement<'_>,
    labels: &HashMap<&str, i64>,
    out: &mut Vec<u32>,
) -> Result<(), AssembleError> {
    let line = stmt.line;
    let ops = &stmt.operands;

    match stmt.mnemonic {
        ".word" => {
            if ops.is_empty() {
                return Err(AssembleError::new(line, ".word needs at least one value"));
            }
            for op in ops {
                let value = integer(op, line)?;
                out.push(value as u32);
            }
        }
        "halt" => {
            let code = match ops.len() {
                0 => 0,
                1 => immediate(ops[0], labels, line)?,
                _ => return Err(AssembleError::new(line, "halt takes at most one operand")),
            };
            out.push(encode(OP_HALT, 0, 0, 0, code));
        }
        "li" => {
            arity(ops, 2, line)?;
            let rd = register(ops[0], line)?;
            let imm = immediate(ops[1], labels, line)?;
            out.push(encode(OP_LI, rd, 0, 0, imm));
        }
        "mv" => {
            arity(ops, 2, line)?;
            let rd = register(ops[0], line)?;
            let rs1 = register(ops[1], line)?;
            out.push(encode(OP_MV, rd, rs1, 0, 0));
        }
        "add" | "sub" => {
            arity(ops, 3, line)?;
            let opcode = if stmt.mnemonic == "add" { OP_ADD } else { OP_SUB };
            let rd = register(ops[0], line)?;
            let rs1 = register(ops[1], line)?;
            let rs2 = register(ops[2], line)?;
            out.push(encode(opcode, rd, rs1, rs2, 0));
        }
        "addi" => {
            arity(ops, 3, line)?;
            let rd = register(ops[0], line)?;
            let rs1 = register(ops[1], line)?;
            let imm = immediate(ops[2], labels, line)?;
            out.push(encode(OP_ADDI, rd, rs1, 0, imm));
        }
        "lw" => {
            arity(ops, 2, line)?;
            let rd = register(ops[0], line)?;
            let (imm, rs1) = memory_operand(ops[1], labels, line)?;
            out.push(encode(OP_LW, rd, rs1, 0, imm));
        }
        "sw" => {
            arity(ops, 2, line)?;
            let rs2 = register(ops[0], line)?;
            let (imm, rs1) = memory_operand(ops[1], labels, line)?;
            out.push(encode(OP_SW, 0, rs1, rs2, imm));
        }
        "beq" | "bne" => {
            arity(ops, 3, line)?;
            let opcode = if stmt.mnemonic == "beq" { OP_BEQ } else { OP_BNE };
            let rs1 = register(ops[0], line)?;
            let rs2 = register(ops[1], line)?;
            let offset = branch_offset(ops[2], labels, stmt.addr, line)?;
            out.push(encode(opcode, 0, rs1, rs2, offset));
        }
        "j" => {
            arity(ops, 1, line)?;
            let offset = branch_offset(ops[0], labels, stmt.addr, line)?;
            out.push(encode(OP_J, 0, 0, 0, offset));
        }
        "print" => {
            arity(ops, 1, line)?;
            let rs1 = register(ops[0], line)?;
            out.push(encode(OP_PRINT, 0, rs1, 0, 0));
        }
        other => {
            return Err(AssembleError::new(
                line,
                format!("unknown instruction '{}'", other),
            ));
        }
    }
    Ok(())
}

fn arity(ops: &[&str], expected: usize, line: usize) -> Result<(), AssembleError> {
    if ops.len() != expected {
        return Err(AssembleError::new(
            line,
            format!("expected {} operands, found {}", expected, ops.len()),
        ));
    }
    Ok(())
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !text.starts_with(|c: char| c.is_ascii_digit())
}

fn register(text: &str, line: usize) -> Result<u8, AssembleError> {
    let number = text
        .strip_prefix('r')
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n < REGISTER_COUNT);
    match number {
        Some(n) => Ok(n as u8),
        None => Err(AssembleError::new(
            line,
            format!("expected register r0..r{}, found '{}'", REGISTER_COUNT - 1, text),
        )),
    }
}

fn integer(text: &str, line: usize) -> Result<i64, AssembleError> {
    let parsed = if let Some(hex) = text.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(hex) = text.strip_prefix("-0x") {
        i64::from_str_radix(hex, 16).map(|v| -v)
    } else {
        text.parse::<i64>()
    };
    parsed.map_err(|_| AssembleError::new(line, format!("invalid number '{}'", text)))
}

fn immediate(
    text: &str,
    labels: &HashMap<&str, i64>,
    line: usize,
) -> Result<i16, AssembleError> {
    let value = if let Some(addr) = labels.get(text) {
        *addr
    } else {
        integer(text, line)?
    };
    narrow(value, line)
}

fn branch_offset(
    text: &str,
    labels: &HashMap<&str, i64>,
    from: i64,
    line: usize,
) -> Result<i16, AssembleError> {
    let offset = if let Some(target) = labels.get(text) {
        target - from
    } else {
        integer(text, line)?
    };
    narrow(offset, line)
}

fn memory_operand(
    text: &str,
    labels: &HashMap<&str, i64>,
    line: usize,
) -> Result<(i16, u8), AssembleError> {
    // `imm(rN)` with an optional immediate: `(r2)` means offset 0.
    let Some((imm_text, rest)) = text.split_once('(') else {
        return Err(AssembleError::new(
            line,
            format!("expected memory operand 'offset(rN)', found '{}'", text),
        ));
    };
    let Some(reg_text) = rest.strip_suffix(')') else {
        return Err(AssembleError::new(line, "missing ')' in memory operand"));
    };
    let imm_text = imm_text.trim();
    let imm = if imm_text.is_empty() {
        0
    } else {
        immediate(imm_text, labels, line)?
    };
    Ok((imm, register(reg_text.trim(), line)?))
}

fn narrow(value: i64, line: usize) -> Result<i16, AssembleError> {
    i16::try_from(value).map_err(|_| {
        AssembleError::new(line, format!("value {} does not fit in 16 bits", value))
    })
}
