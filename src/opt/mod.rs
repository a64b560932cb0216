//! Fixpoint optimizer over a TAC list.
//!
//! A round runs, in order, [`peephole`] rewriting, [`dce`] dead assignment
//! removal and [`copy_prop`] copy propagation. Rounds repeat until none of
//! the passes changes the list, so the result is a fixpoint: optimizing it
//! again yields the same list.

pub mod copy_prop;
pub mod dce;
pub mod peephole;

use crate::tac::Instruction;

/// Optimizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Whether the pipeline runs the optimizer at all.
    pub enabled: bool,
    /// Upper bound on rounds. The passes converge well before this on any
    /// real input; hitting it is logged.
    pub max_rounds: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_rounds: 1000,
        }
    }
}

/// Result of [`optimize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimized {
    pub instructions: Vec<Instruction>,
    /// Rounds run, including the final one that changed nothing.
    pub rounds: usize,
}

/// Run all passes to a fixpoint.
pub fn optimize(mut instructions: Vec<Instruction>, config: &OptimizerConfig) -> Optimized {
    let initial = instructions.len();
    let mut rounds = 0;

    loop {
        if rounds >= config.max_rounds {
            log::warn!(
                "optimizer stopped after {} rounds without reaching a fixpoint",
                rounds
            );
            break;
        }
        rounds += 1;

        let rewritten = peephole::rewrite_all(&mut instructions);
        let removed = dce::eliminate_dead_code(&mut instructions);
        let propagated = copy_prop::propagate_copies(&mut instructions);
        log::trace!(
            "round {}: peephole={} dce={} copy_prop={} ({} instructions)",
            rounds,
            rewritten,
            removed,
            propagated,
            instructions.len()
        );

        if !(rewritten || removed || propagated) {
            break;
        }
    }

    log::debug!(
        "optimized {} -> {} TAC instructions in {} rounds",
        initial,
        instructions.len(),
        rounds
    );
    Optimized {
        instructions,
        rounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tac::{render, BinaryOp, Label, Operand};

    fn assign(dest: &str, src: &str) -> Instruction {
        Instruction::Assign {
            dest: dest.into(),
            src: src.into(),
        }
    }

    fn sum_program() -> Vec<Instruction> {
        vec![
            assign("a", "2"),
            assign("b", "3"),
            Instruction::BinOp {
                dest: Operand::temporary(0),
                op: BinaryOp::Add,
                lhs: "a".into(),
                rhs: "b".into(),
            },
            Instruction::Print {
                value: Operand::temporary(0),
            },
        ]
    }

    #[test]
    fn test_constant_program_collapses() {
        let _ = env_logger::builder().is_test(true).try_init();

        let result = optimize(sum_program(), &OptimizerConfig::default());
        assert_eq!(render(&result.instructions), vec!["t0 := 5", "print t0"]);
        assert!(result.rounds >= 2);
    }

    #[test]
    fn test_fixpoint_is_idempotent() {
        let config = OptimizerConfig::default();
        let once = optimize(sum_program(), &config);
        let twice = optimize(once.instructions.clone(), &config);
        assert_eq!(once.instructions, twice.instructions);
        assert_eq!(twice.rounds, 1);
    }

    #[test]
    fn test_round_cap_is_respected() {
        let config = OptimizerConfig {
            max_rounds: 1,
            ..OptimizerConfig::default()
        };
        let result = optimize(sum_program(), &config);
        assert_eq!(result.rounds, 1);
        assert_eq!(
            render(&result.instructions),
            vec!["a := 2", "b := 3", "t0 := 2 + 3", "print t0"]
        );
    }

    #[test]
    fn test_empty_list() {
        let result = optimize(Vec::new(), &OptimizerConfig::default());
        assert!(result.instructions.is_empty());
        assert_eq!(result.rounds, 1);
    }

    #[test]
    fn test_branch_keeps_conditional_value() {
        let list = vec![
            Instruction::StartFunc { label: Label::new("main") },
            assign("x", "1"),
            Instruction::IfGoto { pred: "c".into(), label: Label::new("L0") },
            assign("x", "2"),
            Instruction::Label { name: Label::new("L0") },
            Instruction::Print { value: "x".into() },
            Instruction::EndFunc { label: Label::new("main") },
        ];
        let result = optimize(list.clone(), &OptimizerConfig::default());
        assert_eq!(result.instructions, list);
    }
}
