// Program decoding: JSON opcode lists into instructions with interned function names

use super::error::ProgramError;
use super::instruction::{Condition, FunctionId, Instruction};
use serde_json::Value;
use std::collections::HashMap;

/// An immutable, linked instruction list plus its function-name table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    functions: Vec<String>,
}

// Decoding context for one program
#[derive(Default)]
struct Decoder {
    functions: Vec<String>,
    ids: HashMap<String, FunctionId>,
}

impl Decoder {
    fn intern(&mut self, name: &str) -> FunctionId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.functions.len();
        self.functions.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    fn decode(&mut self, index: usize, entry: &Value) -> Result<Instruction, ProgramError> {
        let items = entry
            .as_array()
            .filter(|items| !items.is_empty())
            .ok_or(ProgramError::Malformed { index })?;
        let mnemonic = items[0].as_str().ok_or(ProgramError::Malformed { index })?;
        let operands = &items[1..];

        let arity = |expected: usize| {
            if operands.len() == expected {
                Ok(())
            } else {
                Err(ProgramError::Arity {
                    index,
                    mnemonic: mnemonic.to_string(),
                    expected,
                    actual: operands.len(),
                })
            }
        };
        let bad_operand = |operand: &Value| ProgramError::Operand {
            index,
            mnemonic: mnemonic.to_string(),
            operand: operand.to_string(),
        };
        let int = |operand: &Value| {
            operand
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| bad_operand(operand))
        };

        let nullary = |instruction: Instruction| arity(0).map(|()| instruction);

        match mnemonic {
            "HALT" => nullary(Instruction::Halt),
            "LEFT" => nullary(Instruction::Left),
            "FORWARD" => nullary(Instruction::Forward),
            "PICKBUZZER" => nullary(Instruction::PickBuzzer),
            "LEAVEBUZZER" => nullary(Instruction::LeaveBuzzer),
            "WORLDWALLS" => nullary(Instruction::WorldWalls),
            "ORIENTATION" => nullary(Instruction::Orientation),
            "WORLDBUZZERS" => nullary(Instruction::WorldBuzzers),
            "BAGBUZZERS" => nullary(Instruction::BagBuzzers),
            "ROTL" => nullary(Instruction::Rotl),
            "ROTR" => nullary(Instruction::Rotr),
            "MASK" => nullary(Instruction::Mask),
            "NOT" => nullary(Instruction::Not),
            "AND" => nullary(Instruction::And),
            "OR" => nullary(Instruction::Or),
            "EQ" => nullary(Instruction::Eq),
            "POP" => nullary(Instruction::Pop),
            "DUP" => nullary(Instruction::Dup),
            "DEC" => nullary(Instruction::Dec),
            "INC" => nullary(Instruction::Inc),
            "RET" => nullary(Instruction::Ret),
            "LINE" => {
                arity(1)?;
                Ok(Instruction::Line(int(&operands[0])?))
            }
            "LOAD" => {
                arity(1)?;
                Ok(Instruction::Load(int(&operands[0])?))
            }
            "JZ" => {
                arity(1)?;
                Ok(Instruction::Jz(int(&operands[0])?))
            }
            "JMP" => {
                arity(1)?;
                Ok(Instruction::Jmp(int(&operands[0])?))
            }
            "PARAM" => {
                arity(1)?;
                let k = int(&operands[0])?;
                u32::try_from(k)
                    .map(Instruction::Param)
                    .map_err(|_| bad_operand(&operands[0]))
            }
            "EZ" => {
                arity(1)?;
                operands[0]
                    .as_str()
                    .and_then(Condition::from_mnemonic)
                    .map(Instruction::Ez)
                    .ok_or_else(|| bad_operand(&operands[0]))
            }
            "CALL" => {
                arity(2)?;
                let target = operands[0]
                    .as_u64()
                    .and_then(|t| usize::try_from(t).ok())
                    .ok_or_else(|| bad_operand(&operands[0]))?;
                let name = operands[1]
                    .as_str()
                    .ok_or_else(|| bad_operand(&operands[1]))?;
                let function = self.intern(name);
                Ok(Instruction::Call { target, function })
            }
            other => Ok(Instruction::Unknown(other.to_string())),
        }
    }
}

impl Program {
    pub fn new(instructions: Vec<Instruction>, functions: Vec<String>) -> Self {
        Program {
            instructions,
            functions,
        }
    }

    /// Decodes a JSON list of `[mnemonic, operand...]` records.
    pub fn from_json(text: &str) -> Result<Self, ProgramError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, ProgramError> {
        let entries = value.as_array().ok_or(ProgramError::NotAList)?;
        let mut decoder = Decoder::default();
        let instructions = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| decoder.decode(index, entry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Program {
            instructions,
            functions: decoder.functions,
        })
    }

    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn function_name(&self, id: FunctionId) -> &str {
        self.functions.get(id).map_or("?", String::as_str)
    }
}

impl From<Vec<Instruction>> for Program {
    fn from(instructions: Vec<Instruction>) -> Self {
        Program::new(instructions, Vec::new())
    }
}
