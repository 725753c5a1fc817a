//! ALU implementation

use crate::instruction::InstructionClass;
use crate::instruction::Opcode;

/// Performs an atomic ALU operation
/// Operands arrive as raw latch values; an unset latch reads as all ones.
/// Returns `None` for opcodes the ALU does not handle.
pub fn alu(opcode: Opcode, a: u32, b: u32, imm: u32, npc: u32) -> Option<u32> {
    use Opcode::*;
    Some(match opcode {
        Add => a.wrapping_add(b),
        Sub => a.wrapping_sub(b),
        Xor => a ^ b,
        Addi | Lw | Sw => a.wrapping_add(imm),
        Subi => a.wrapping_sub(imm),
        Beqz | Bnez | Bltz | Bgtz | Blez | Bgez | Jump => {
            npc.wrapping_add(imm)
        }
        Eop | Nop => return None,
    })
}

/// Branch outcome given the value of the tested register
pub fn taken(opcode: Opcode, a: u32) -> bool {
    use Opcode::*;
    let a = a as i32;
    match opcode {
        Beqz => a == 0,
        Bnez => a != 0,
        Bltz => a < 0,
        Bgtz => a > 0,
        Blez => a <= 0,
        Bgez => a >= 0,
        Jump => true,
        _ => {
            debug_assert!(opcode.class() != InstructionClass::Branch);
            false
        }
    }
}
