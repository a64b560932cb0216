//! Property tests for the optimizer.
//!
//! Programs are generated over a handful of identifiers and single-assignment
//! temporaries, with forward branches skipping runs of steps, then run on a
//! small TAC interpreter before and after optimization.

use cmmc::{optimize, BinaryOp, Instruction, Label, Operand, OptimizerConfig};
use proptest::prelude::*;
use std::collections::HashMap;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

const NAMES: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Clone)]
enum Src {
    Const(i32),
    Name(usize),
    Temp(usize),
}

#[derive(Debug, Clone)]
enum Step {
    Assign(usize, Src),
    Bin(BinaryOp, Src, Src),
    Print(Src),
}

fn binary_op() -> impl Strategy<Value = BinaryOp> {
    prop::sample::select(BinaryOp::ALL.to_vec())
}

fn src() -> impl Strategy<Value = Src> {
    prop_oneof![
        prop_oneof![Just(0i32), Just(1i32), Just(2i32), -50i32..50].prop_map(Src::Const),
        (0..NAMES.len()).prop_map(Src::Name),
        (0usize..16).prop_map(Src::Temp),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        ((0..NAMES.len()), src()).prop_map(|(name, value)| Step::Assign(name, value)),
        (binary_op(), src(), src()).prop_map(|(op, lhs, rhs)| Step::Bin(op, lhs, rhs)),
        src().prop_map(Step::Print),
    ]
}

/// One step, or a run of steps guarded by a forward branch:
/// `!if pred goto Lk`, the steps, `Lk`.
#[derive(Debug, Clone)]
enum Block {
    Plain(Step),
    Guarded(Src, Vec<Step>),
}

fn block() -> impl Strategy<Value = Block> {
    prop_oneof![
        4 => step().prop_map(Block::Plain),
        1 => (src(), prop::collection::vec(step(), 0..6))
            .prop_map(|(pred, body)| Block::Guarded(pred, body)),
    ]
}

fn program() -> impl Strategy<Value = Vec<Block>> {
    prop::collection::vec(block(), 0..30)
}

/// Builds a program in which every read name is written on every path that
/// reaches the read.
#[derive(Default)]
struct ProgramBuilder {
    defined: [bool; NAMES.len()],
    visible_temps: Vec<u32>,
    next_temp: u32,
    next_label: u32,
    list: Vec<Instruction>,
}

impl ProgramBuilder {
    fn operand(&self, src: &Src) -> Operand {
        match src {
            Src::Const(value) => Operand::constant(*value),
            Src::Name(index) if self.defined[*index] => Operand::parse(NAMES[*index]),
            Src::Temp(index) if !self.visible_temps.is_empty() => {
                Operand::temporary(self.visible_temps[*index % self.visible_temps.len()])
            }
            Src::Name(index) | Src::Temp(index) => Operand::constant(*index as i32),
        }
    }

    fn push_step(&mut self, step: &Step) {
        match step {
            Step::Assign(name, value) => {
                let src = self.operand(value);
                self.list.push(Instruction::Assign {
                    dest: Operand::parse(NAMES[*name]),
                    src,
                });
                self.defined[*name] = true;
            }
            Step::Bin(op, lhs, rhs) => {
                let lhs = self.operand(lhs);
                let rhs = self.operand(rhs);
                self.list.push(Instruction::BinOp {
                    dest: Operand::temporary(self.next_temp),
                    op: *op,
                    lhs,
                    rhs,
                });
                self.visible_temps.push(self.next_temp);
                self.next_temp += 1;
            }
            Step::Print(value) => {
                let value = self.operand(value);
                self.list.push(Instruction::Print { value });
            }
        }
    }

    fn push_block(&mut self, block: &Block) {
        match block {
            Block::Plain(step) => self.push_step(step),
            Block::Guarded(pred, body) => {
                let label = Label::new(format!("L{}", self.next_label));
                self.next_label += 1;
                let pred = self.operand(pred);
                self.list.push(Instruction::IfGoto {
                    pred,
                    label: label.clone(),
                });

                // Writes inside the body may be skipped.
                let defined = self.defined;
                let visible = self.visible_temps.len();
                for step in body {
                    self.push_step(step);
                }
                self.defined = defined;
                self.visible_temps.truncate(visible);

                self.list.push(Instruction::Label { name: label });
            }
        }
    }
}

fn build_program(blocks: &[Block]) -> Vec<Instruction> {
    let mut builder = ProgramBuilder::default();
    for block in blocks {
        builder.push_block(block);
    }
    builder.list
}

/// Printed values, or `None` if the program traps.
fn run(list: &[Instruction]) -> Option<Vec<i32>> {
    let targets: HashMap<&Label, usize> = list
        .iter()
        .enumerate()
        .filter_map(|(index, instruction)| match instruction {
            Instruction::Label { name } => Some((name, index)),
            _ => None,
        })
        .collect();
    let mut env: HashMap<Operand, i32> = HashMap::new();
    let mut printed = Vec::new();
    let read = |env: &HashMap<Operand, i32>, operand: &Operand| -> i32 {
        operand
            .value()
            .unwrap_or_else(|| *env.get(operand).expect("read of an unwritten name"))
    };

    let mut pc = 0;
    while let Some(instruction) = list.get(pc) {
        pc += 1;
        match instruction {
            Instruction::Assign { dest, src } => {
                let value = read(&env, src);
                env.insert(dest.clone(), value);
            }
            Instruction::BinOp { dest, op, lhs, rhs } => {
                let value = op.evaluate(read(&env, lhs), read(&env, rhs))?;
                env.insert(dest.clone(), value);
            }
            Instruction::Print { value } => printed.push(read(&env, value)),
            Instruction::IfGoto { pred, label } => {
                if read(&env, pred) == 0 {
                    pc = targets[label];
                }
            }
            Instruction::Label { .. } => {}
            other => panic!("unexpected instruction {other}"),
        }
    }
    Some(printed)
}

fn config() -> OptimizerConfig {
    OptimizerConfig {
        enabled: true,
        ..OptimizerConfig::default()
    }
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// Folding computes what the target would, and leaves trapping
    /// operations alone.
    #[test]
    fn folding_matches_evaluation(a in any::<i32>(), b in any::<i32>(), op in binary_op()) {
        let list = vec![
            Instruction::BinOp {
                dest: Operand::temporary(0),
                op,
                lhs: Operand::constant(a),
                rhs: Operand::constant(b),
            },
            Instruction::Print { value: Operand::temporary(0) },
        ];
        let result = optimize(list.clone(), &config());

        match op.evaluate(a, b) {
            Some(value) => prop_assert_eq!(
                &result.instructions[0],
                &Instruction::Assign { dest: Operand::temporary(0), src: Operand::constant(value) }
            ),
            None => prop_assert_eq!(result.instructions, list),
        }
    }

    /// Identity operations reduce to a plain copy of the variable.
    #[test]
    fn identities_reduce_to_copies(
        name in "[a-z]{1,6}",
        case in 0usize..6,
    ) {
        prop_assume!(Operand::parse(&name).is_identifier());
        let x = Operand::parse(&name);
        let (op, lhs, rhs) = match case {
            0 => (BinaryOp::Add, x.clone(), Operand::constant(0)),
            1 => (BinaryOp::Add, Operand::constant(0), x.clone()),
            2 => (BinaryOp::Sub, x.clone(), Operand::constant(0)),
            3 => (BinaryOp::Mul, x.clone(), Operand::constant(1)),
            4 => (BinaryOp::Mul, Operand::constant(1), x.clone()),
            _ => (BinaryOp::Div, x.clone(), Operand::constant(1)),
        };
        let mut instruction = Instruction::BinOp { dest: Operand::temporary(0), op, lhs, rhs };
        prop_assert!(cmmc::opt::peephole::rewrite(&mut instruction));
        prop_assert_eq!(instruction, Instruction::Assign { dest: Operand::temporary(0), src: x });
    }

    /// Doubling becomes an addition of the variable to itself.
    #[test]
    fn doubling_becomes_addition(index in 0u32..100, swapped in any::<bool>()) {
        let x = Operand::temporary(index + 1);
        let (lhs, rhs) = if swapped {
            (Operand::constant(2), x.clone())
        } else {
            (x.clone(), Operand::constant(2))
        };
        let mut instruction = Instruction::BinOp { dest: Operand::temporary(0), op: BinaryOp::Mul, lhs, rhs };
        prop_assert!(cmmc::opt::peephole::rewrite(&mut instruction));
        prop_assert_eq!(
            instruction,
            Instruction::BinOp { dest: Operand::temporary(0), op: BinaryOp::Add, lhs: x.clone(), rhs: x }
        );
    }

    /// Optimization preserves what the program prints on every path.
    #[test]
    fn optimization_preserves_output(blocks in program()) {
        let list = build_program(&blocks);
        let optimized = optimize(list.clone(), &config());
        prop_assert_eq!(run(&optimized.instructions), run(&list));
    }

    /// The optimizer's result is a fixpoint.
    #[test]
    fn optimization_is_idempotent(blocks in program()) {
        let once = optimize(build_program(&blocks), &config());
        let twice = optimize(once.instructions.clone(), &config());
        prop_assert_eq!(twice.rounds, 1);
        prop_assert_eq!(twice.instructions, once.instructions);
    }

    /// Optimization never makes a program longer.
    #[test]
    fn optimization_never_grows(blocks in program()) {
        let list = build_program(&blocks);
        let optimized = optimize(list.clone(), &config());
        prop_assert!(optimized.instructions.len() <= list.len());
    }
}
