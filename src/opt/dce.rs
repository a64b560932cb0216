//! Dead assignment removal.
//!
//! An `Assign` is dead when its destination is overwritten before any read on
//! every path, or when the destination is never read again in its function.
//! Branches only ever jump forward, so a forward scan sees every later read;
//! once an `IfGoto` has been passed a later write may be skipped at run time
//! and no longer proves the value dead.

use crate::tac::Instruction;

/// Remove every dead `Assign` in one sweep.
pub fn eliminate_dead_code(instructions: &mut Vec<Instruction>) -> bool {
    let dead: Vec<bool> = (0..instructions.len())
        .map(|index| is_dead(instructions, index))
        .collect();

    let before = instructions.len();
    let mut flags = dead.into_iter();
    instructions.retain(|instruction| {
        let remove = flags.next().unwrap_or(false);
        if remove {
            log::trace!("dce removed {}", instruction);
        }
        !remove
    });
    instructions.len() != before
}

fn is_dead(instructions: &[Instruction], index: usize) -> bool {
    let Instruction::Assign { dest, src } = &instructions[index] else {
        return false;
    };
    if !dest.is_variable() {
        return false;
    }
    if dest == src {
        return true;
    }

    let mut past_branch = false;
    for later in &instructions[index + 1..] {
        if later.reads_operand(dest) {
            return false;
        }
        if later.is_function_boundary() {
            return true;
        }
        if later.writes_operand(dest) && !past_branch {
            return true;
        }
        if matches!(later, Instruction::IfGoto { .. }) {
            past_branch = true;
        }
    }
    true
}
