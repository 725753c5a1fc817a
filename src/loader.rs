//! Assembly loader: turns program text into the instruction store

use std::collections::HashMap;
use std::path::Path;

use crate::error::LoadError;
use crate::error::SimulatorResult;
use crate::instruction::parse_helper::*;
use crate::instruction::Instruction;
use crate::instruction::InstructionClass;
use crate::instruction::Opcode;

/// A parsed program with branch offsets resolved
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    /// Label name to instruction index
    pub labels: HashMap<String, usize>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction at the given index; past the end reads as a NOP
    pub fn fetch(&self, index: usize) -> Instruction {
        self.instructions.get(index).copied().unwrap_or_default()
    }
}

/// Loads the program in the given file
pub fn load_program(path: impl AsRef<Path>) -> SimulatorResult<Program> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .map_err(|e| LoadError::FileReadError(path.to_path_buf(), e))?;
    let program = parse_program(&source)?;
    tracing::debug!(
        path = %path.display(),
        instructions = program.len(),
        labels = program.labels.len(),
        "program loaded"
    );
    Ok(program)
}

/// Branch waiting for its label to be resolved
struct PendingBranch {
    index: usize,
    line: usize,
    label: String,
}

/// Parses program text, one instruction per line.
/// A line may start with `label:`; a label alone on a line names the
/// next instruction. Text after `//` is ignored.
pub fn parse_program(source: &str) -> Result<Program, LoadError> {
    let mut program = Program::default();
    let mut pending: Vec<PendingBranch> = Vec::new();
    let mut open_labels: Vec<(usize, String)> = Vec::new();

    for (line_num, raw_line) in source.lines().enumerate() {
        let line = line_num + 1;
        let text = match raw_line.split_once("//") {
            Some((code, _)) => code,
            None => raw_line,
        };
        let mut tokens = text.split_whitespace().peekable();
        let Some(&first) = tokens.peek() else {
            continue;
        };

        if first.parse::<Opcode>().is_err() {
            let Some(label) = split_label(first) else {
                return Err(LoadError::UnknownOpcode {
                    line,
                    token: first.to_string(),
                });
            };
            open_labels.push((line, label.to_string()));
            tokens.next();
        }

        let Some(mnemonic) = tokens.next() else {
            continue;
        };
        let opcode = mnemonic.parse::<Opcode>().map_err(|_| {
            LoadError::UnknownOpcode { line, token: mnemonic.to_string() }
        })?;

        let index = program.instructions.len();
        for (label_line, label) in open_labels.drain(..) {
            if program.labels.insert(label.clone(), index).is_some() {
                return Err(LoadError::DuplicateLabel {
                    line: label_line,
                    label,
                });
            }
        }

        let mut operands = OperandReader { tokens, line, opcode };
        let mut inst = Instruction { opcode, ..Instruction::nop() };
        match opcode.class() {
            InstructionClass::RegisterOp => {
                inst.dest = Some(operands.register()?);
                inst.src1 = Some(operands.register()?);
                inst.src2 = Some(operands.register()?);
            }
            InstructionClass::ImmediateOp => {
                inst.dest = Some(operands.register()?);
                inst.src1 = Some(operands.register()?);
                inst.immediate = Some(operands.immediate()?);
            }
            InstructionClass::Memory => {
                let target = operands.register()?;
                let (imm, base) = operands.displacement()?;
                if opcode == Opcode::Sw {
                    inst.src2 = Some(target);
                } else {
                    inst.dest = Some(target);
                }
                inst.src1 = Some(base);
                inst.immediate = Some(imm);
            }
            InstructionClass::Branch => {
                if opcode != Opcode::Jump {
                    inst.src1 = Some(operands.register()?);
                }
                let label = operands.next()?.to_string();
                pending.push(PendingBranch { index, line, label });
            }
            InstructionClass::EndOfProgram | InstructionClass::NoOp => {}
        }
        program.instructions.push(inst);
    }

    // Labels trailing the last instruction point one past the end
    let end = program.instructions.len();
    for (label_line, label) in open_labels {
        if program.labels.insert(label.clone(), end).is_some() {
            return Err(LoadError::DuplicateLabel { line: label_line, label });
        }
    }

    for branch in pending {
        let target = *program.labels.get(&branch.label).ok_or_else(|| {
            LoadError::UndefinedLabel {
                line: branch.line,
                label: branch.label.clone(),
            }
        })?;
        let offset = (target as i64 - branch.index as i64 - 1) << 2;
        program.instructions[branch.index].immediate = Some(offset as i32);
    }

    Ok(program)
}

/// Pulls typed operands off the remaining tokens of a line
struct OperandReader<'a, I: Iterator<Item = &'a str>> {
    tokens: I,
    line: usize,
    opcode: Opcode,
}

impl<'a, I: Iterator<Item = &'a str>> OperandReader<'a, I> {
    fn next(&mut self) -> Result<&'a str, LoadError> {
        self.tokens.next().ok_or_else(|| LoadError::MissingOperand {
            line: self.line,
            opcode: self.opcode.to_string(),
        })
    }

    fn register(&mut self) -> Result<usize, LoadError> {
        let token = self.next()?;
        self.checked(token, parse_register(token))
    }

    fn immediate(&mut self) -> Result<i32, LoadError> {
        let token = self.next()?;
        parse_immediate(token).ok_or_else(|| self.malformed(token))
    }

    fn displacement(&mut self) -> Result<(i32, usize), LoadError> {
        let token = self.next()?;
        let (imm, base) =
            parse_displacement(token).ok_or_else(|| self.malformed(token))?;
        Ok((imm, self.checked(token, base)?))
    }

    fn checked(
        &self,
        token: &str,
        operand: RegisterOperand,
    ) -> Result<usize, LoadError> {
        match operand {
            RegisterOperand::Valid(index) => Ok(index),
            RegisterOperand::OutOfRange(index) => {
                Err(LoadError::RegisterOutOfRange { line: self.line, index })
            }
            RegisterOperand::Malformed => Err(self.malformed(token)),
        }
    }

    fn malformed(&self, token: &str) -> LoadError {
        LoadError::MalformedOperand {
            line: self.line,
            token: token.to_string(),
        }
    }
}
