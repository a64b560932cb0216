//! Copy propagation.
//!
//! For each `d := s`, later reads of `d` in `BinOp` operands and `Assign`
//! sources are replaced by `s` until either name is written again or a label
//! or function boundary is reached. The instruction doing the write still has
//! its reads replaced; the scan stops after it.
//!
//! `print`, `return`, `arg` and `!if` operands are left as they are, so a copy
//! feeding only those stays live.

use crate::tac::{Instruction, Operand};

pub fn propagate_copies(instructions: &mut [Instruction]) -> bool {
    let mut changed = false;

    for index in 0..instructions.len() {
        let (dest, src) = match &instructions[index] {
            Instruction::Assign { dest, src } if dest.is_variable() && dest != src => {
                (dest.clone(), src.clone())
            }
            _ => continue,
        };

        for later in &mut instructions[index + 1..] {
            if matches!(later, Instruction::Label { .. }) || later.is_function_boundary() {
                break;
            }
            if substitute_reads(later, &dest, &src) {
                log::trace!("copy {} -> {}: {}", dest, src, later);
                changed = true;
            }
            if later.writes_operand(&dest) || later.writes_operand(&src) {
                break;
            }
        }
    }

    changed
}

fn substitute_reads(instruction: &mut Instruction, from: &Operand, to: &Operand) -> bool {
    let mut changed = false;
    let slots: Vec<&mut Operand> = match instruction {
        Instruction::BinOp { lhs, rhs, .. } => vec![lhs, rhs],
        Instruction::Assign { src, .. } => vec![src],
        _ => Vec::new(),
    };
    for slot in slots {
        if *slot == *from {
            *slot = to.clone();
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tac::{render, BinaryOp, Label};

    fn assign(dest: &str, src: &str) -> Instruction {
        Instruction::Assign {
            dest: dest.into(),
            src: src.into(),
        }
    }

    fn add(dest: &str, lhs: &str, rhs: &str) -> Instruction {
        Instruction::BinOp {
            dest: dest.into(),
            op: BinaryOp::Add,
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    #[test]
    fn test_constants_flow_into_binops() {
        let mut list = vec![assign("a", "2"), assign("b", "3"), add("t0", "a", "b")];
        assert!(propagate_copies(&mut list));
        assert_eq!(render(&list), vec!["a := 2", "b := 3", "t0 := 2 + 3"]);
    }

    #[test]
    fn test_print_operand_is_not_rewritten() {
        let mut list = vec![assign("t0", "5"), Instruction::Print { value: "t0".into() }];
        assert!(!propagate_copies(&mut list));
    }

    #[test]
    fn test_stops_after_redefinition_of_dest() {
        let mut list = vec![
            assign("x", "y"),
            add("x", "x", "1"),
            add("t0", "x", "x"),
        ];
        assert!(propagate_copies(&mut list));
        assert_eq!(render(&list), vec!["x := y", "x := y + 1", "t0 := x + x"]);
    }

    #[test]
    fn test_stops_after_redefinition_of_source() {
        let mut list = vec![assign("x", "y"), assign("y", "7"), add("t0", "x", "1")];
        assert!(!propagate_copies(&mut list));
        assert_eq!(render(&list)[2], "t0 := x + 1");
    }

    #[test]
    fn test_stops_at_labels() {
        let mut list = vec![
            assign("x", "1"),
            Instruction::Label { name: Label::new("L0") },
            add("t0", "x", "x"),
        ];
        assert!(!propagate_copies(&mut list));
    }

    #[test]
    fn test_identical_spelling_is_not_a_change() {
        let mut list = vec![assign("x", "x"), add("t0", "x", "1")];
        assert!(!propagate_copies(&mut list));
    }
}
