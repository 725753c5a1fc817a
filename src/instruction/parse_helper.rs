//! Operand parsing helpers for the assembly loader

use super::NUM_GP_REGISTERS;

/// Outcome of parsing a register operand
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterOperand {
    Valid(usize),
    OutOfRange(u32),
    Malformed,
}

/// Parses `R<n>`; a trailing comma is tolerated
pub fn parse_register(token: &str) -> RegisterOperand {
    let token = token.trim_end_matches(',');
    let Some(digits) = token.strip_prefix(|c: char| c == 'R' || c == 'r') else {
        return RegisterOperand::Malformed;
    };
    match digits.parse::<u32>() {
        Ok(index) if (index as usize) < NUM_GP_REGISTERS => {
            RegisterOperand::Valid(index as usize)
        }
        Ok(index) => RegisterOperand::OutOfRange(index),
        Err(_) => RegisterOperand::Malformed,
    }
}

/// Parses an immediate the way `strtoul(_, _, 0)` reads it:
/// `0x` prefix for hex, a leading zero for octal, decimal otherwise.
/// A leading minus wraps to the two's complement value.
pub fn parse_immediate(token: &str) -> Option<i32> {
    let token = token.trim_end_matches(',');
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };

    let magnitude = if let Some(hex) =
        body.strip_prefix("0x").or_else(|| body.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16).ok()?
    } else if body.len() > 1 && body.starts_with('0') {
        u32::from_str_radix(&body[1..], 8).ok()?
    } else {
        body.parse::<u32>().ok()?
    };

    let value = magnitude as i32;
    Some(if negative { value.wrapping_neg() } else { value })
}

/// Parses a displacement operand `imm(Rn)` into (imm, base register)
pub fn parse_displacement(token: &str) -> Option<(i32, RegisterOperand)> {
    let token = token.trim_end_matches(',');
    let (imm, rest) = token.split_once('(')?;
    let base = rest.strip_suffix(')')?;
    let imm = if imm.is_empty() { 0 } else { parse_immediate(imm)? };
    Some((imm, parse_register(base)))
}

/// Splits an optional `label:` prefix from the instruction tokens
pub fn split_label(token: &str) -> Option<&str> {
    token.strip_suffix(':').filter(|label| !label.is_empty())
}
