//! Per-instruction rewrites of `BinOp` instructions.
//!
//! Each rewrite inspects a single instruction and reports whether it fired.
//! Rewrites only ever turn a `BinOp` into a simpler `BinOp` or into an
//! `Assign`, so no rewrite can undo another.

use crate::tac::{BinaryOp, Instruction, Operand};

/// Apply the first rewrite that fires to `instruction`.
pub fn rewrite(instruction: &mut Instruction) -> bool {
    simplify_identity(instruction) || fold_constants(instruction) || reduce_strength(instruction)
}

/// Apply [`rewrite`] to every instruction of the list.
pub fn rewrite_all(instructions: &mut [Instruction]) -> bool {
    let mut changed = false;
    for instruction in instructions.iter_mut() {
        if rewrite(instruction) {
            log::trace!("peephole -> {}", instruction);
            changed = true;
        }
    }
    changed
}

/// `x + 0`, `0 + x`, `x - 0`, `x * 1`, `x / 1`, `1 * x` become `x`.
pub fn simplify_identity(instruction: &mut Instruction) -> bool {
    let Instruction::BinOp { dest, op, lhs, rhs } = instruction else {
        return false;
    };

    let kept = match (*op, lhs.value(), rhs.value()) {
        (BinaryOp::Add | BinaryOp::Sub, _, Some(0)) if lhs.is_variable() => lhs.clone(),
        (BinaryOp::Mul | BinaryOp::Div, _, Some(1)) if lhs.is_variable() => lhs.clone(),
        (BinaryOp::Add, Some(0), _) if rhs.is_variable() => rhs.clone(),
        (BinaryOp::Mul, Some(1), _) if rhs.is_variable() => rhs.clone(),
        _ => return false,
    };

    let dest = dest.clone();
    *instruction = Instruction::Assign { dest, src: kept };
    true
}

/// Both operands constant: compute the result now.
pub fn fold_constants(instruction: &mut Instruction) -> bool {
    let Instruction::BinOp { dest, op, lhs, rhs } = instruction else {
        return false;
    };
    let (Some(a), Some(b)) = (lhs.value(), rhs.value()) else {
        return false;
    };
    let Some(result) = op.evaluate(a, b) else {
        log::debug!("not folding {} {} {}: would trap", a, op, b);
        return false;
    };

    let dest = dest.clone();
    *instruction = Instruction::Assign {
        dest,
        src: Operand::constant(result),
    };
    true
}

/// `x * 2` and `2 * x` become `x + x`.
pub fn reduce_strength(instruction: &mut Instruction) -> bool {
    let Instruction::BinOp { op, lhs, rhs, .. } = instruction else {
        return false;
    };
    if *op != BinaryOp::Mul {
        return false;
    }

    if lhs.is_variable() && rhs.value() == Some(2) {
        *rhs = lhs.clone();
    } else if rhs.is_variable() && lhs.value() == Some(2) {
        *lhs = rhs.clone();
    } else {
        return false;
    }
    *op = BinaryOp::Add;
    true
}
