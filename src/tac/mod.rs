//! Three-address code.
//!
//! The IR is one flat, ordered list of [`Instruction`]s. There are no basic
//! blocks: control flow is expressed with explicit [`Instruction::Label`]
//! entries and forward [`Instruction::IfGoto`] branches.
//!
//! Every instruction has a canonical one-line text form (its `Display`
//! implementation). The golden files under `tests/filetest` compare against
//! that form, so it must stay stable.
//!
//! ```text
//! func main
//! a := 2
//! t0 := a + b
//! !if t0 goto L0
//! print t0
//! L0
//! endfunc
//! ```

use std::fmt;

pub mod builder;

pub use builder::{build_tac, TacBuilder};

/// A typed operand. The class is derived once from the spelling and never
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Constant(i32),
    Identifier(String),
    /// IR temporary `t<N>`.
    Temporary(u32),
    /// Saved register spelled directly, `s<N>`.
    Saved(u32),
    /// Argument register spelled directly, `a<N>`.
    Argument(u32),
    /// Raw assembly text used verbatim, e.g. `$zero`.
    Literal(String),
}

impl Operand {
    /// Classify a spelling.
    pub fn parse(spelling: &str) -> Operand {
        if let Some(value) = parse_constant(spelling) {
            return Operand::Constant(value);
        }
        if let Some(register) = parse_register(spelling) {
            return register;
        }
        if is_identifier(spelling) {
            return Operand::Identifier(spelling.to_string());
        }
        Operand::Literal(spelling.to_string())
    }

    pub fn constant(value: i32) -> Operand {
        Operand::Constant(value)
    }

    pub fn temporary(index: u32) -> Operand {
        Operand::Temporary(index)
    }

    /// Constant value, if this is a constant.
    pub fn value(&self) -> Option<i32> {
        match self {
            Operand::Constant(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Operand::Constant(_))
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, Operand::Identifier(_))
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Operand::Temporary(_))
    }

    /// Identifiers and temporaries: the names the IR binds and reads.
    pub fn is_variable(&self) -> bool {
        self.is_identifier() || self.is_temporary()
    }
}

/// Whether `spelling` is an optionally negated run of decimal digits.
pub(crate) fn is_numeric(spelling: &str) -> bool {
    let digits = spelling.strip_prefix('-').unwrap_or(spelling);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_constant(spelling: &str) -> Option<i32> {
    if !is_numeric(spelling) {
        return None;
    }
    spelling.parse().ok()
}

fn parse_register(spelling: &str) -> Option<Operand> {
    let mut chars = spelling.chars();
    let class = chars.next()?;
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u32 = digits.parse().ok()?;
    match class {
        't' => Some(Operand::Temporary(index)),
        's' => Some(Operand::Saved(index)),
        'a' => Some(Operand::Argument(index)),
        _ => None,
    }
}

fn is_identifier(spelling: &str) -> bool {
    let mut chars = spelling.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

impl From<&str> for Operand {
    fn from(spelling: &str) -> Self {
        Operand::parse(spelling)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Constant(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(v) => write!(f, "{}", v),
            Operand::Identifier(name) => f.write_str(name),
            Operand::Temporary(n) => write!(f, "t{}", n),
            Operand::Saved(n) => write!(f, "s{}", n),
            Operand::Argument(n) => write!(f, "a{}", n),
            Operand::Literal(raw) => f.write_str(raw),
        }
    }
}

/// Branch target or function name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Label(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Arithmetic and comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 11] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Rem,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Gt,
        BinaryOp::Lt,
        BinaryOp::Ge,
        BinaryOp::Le,
    ];

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use BinaryOp::*;
        match symbol {
            "+" => Some(Add),
            "-" => Some(Sub),
            "*" => Some(Mul),
            "/" => Some(Div),
            "%" => Some(Rem),
            "==" => Some(Eq),
            "!=" => Some(Ne),
            ">" => Some(Gt),
            "<" => Some(Lt),
            ">=" => Some(Ge),
            "<=" => Some(Le),
            _ => None,
        }
    }

    pub const fn symbol(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Rem => "%",
            Eq => "==",
            Ne => "!=",
            Gt => ">",
            Lt => "<",
            Ge => ">=",
            Le => "<=",
        }
    }

    /// Evaluate on 32-bit target integers. Arithmetic wraps, division and
    /// remainder truncate toward zero, comparisons yield 0 or 1. Returns
    /// `None` where the target would trap (division by zero, `MIN / -1`).
    pub fn evaluate(self, lhs: i32, rhs: i32) -> Option<i32> {
        use BinaryOp::*;
        let value = match self {
            Add => lhs.wrapping_add(rhs),
            Sub => lhs.wrapping_sub(rhs),
            Mul => lhs.wrapping_mul(rhs),
            Div => lhs.checked_div(rhs)?,
            Rem => lhs.checked_rem(rhs)?,
            Eq => (lhs == rhs) as i32,
            Ne => (lhs != rhs) as i32,
            Gt => (lhs > rhs) as i32,
            Lt => (lhs < rhs) as i32,
            Ge => (lhs >= rhs) as i32,
            Le => (lhs <= rhs) as i32,
        };
        Some(value)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single TAC instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Function entry; allocates the activation frame.
    StartFunc { label: Label },
    /// Number of incoming parameters.
    ParamCount { count: usize },
    /// Bind a formal parameter to the next incoming argument slot.
    Param { ty: Operand, name: Operand },
    EndFunc { label: Label },
    BinOp {
        dest: Operand,
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },
    Assign { dest: Operand, src: Operand },
    /// Branch to `label` when `pred` is zero.
    IfGoto { pred: Operand, label: Label },
    Label { name: Label },
    Call { dest: Operand, label: Label },
    /// Push one outgoing argument.
    Arg { value: Operand },
    Return { value: Operand },
    Print { value: Operand },
}

impl Instruction {
    /// Short name used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Instruction::StartFunc { .. } => "func",
            Instruction::ParamCount { .. } => "params",
            Instruction::Param { .. } => "param",
            Instruction::EndFunc { .. } => "endfunc",
            Instruction::BinOp { .. } => "binop",
            Instruction::Assign { .. } => "assign",
            Instruction::IfGoto { .. } => "ifgoto",
            Instruction::Label { .. } => "label",
            Instruction::Call { .. } => "call",
            Instruction::Arg { .. } => "arg",
            Instruction::Return { .. } => "return",
            Instruction::Print { .. } => "print",
        }
    }

    /// The name this instruction writes, if any.
    pub fn dest(&self) -> Option<&Operand> {
        match self {
            Instruction::BinOp { dest, .. }
            | Instruction::Assign { dest, .. }
            | Instruction::Call { dest, .. } => Some(dest),
            Instruction::Param { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Every operand this instruction reads.
    pub fn reads(&self) -> impl Iterator<Item = &Operand> {
        let (first, second) = match self {
            Instruction::BinOp { lhs, rhs, .. } => (Some(lhs), Some(rhs)),
            Instruction::Assign { src, .. } => (Some(src), None),
            Instruction::IfGoto { pred, .. } => (Some(pred), None),
            Instruction::Arg { value }
            | Instruction::Return { value }
            | Instruction::Print { value } => (Some(value), None),
            _ => (None, None),
        };
        first.into_iter().chain(second)
    }

    pub fn reads_operand(&self, operand: &Operand) -> bool {
        self.reads().any(|read| read == operand)
    }

    pub fn writes_operand(&self, operand: &Operand) -> bool {
        self.dest() == Some(operand)
    }

    /// Start or end of a function body.
    pub fn is_function_boundary(&self) -> bool {
        matches!(
            self,
            Instruction::StartFunc { .. } | Instruction::EndFunc { .. }
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::StartFunc { label } => write!(f, "func {}", label),
            Instruction::ParamCount { count } => write!(f, "params {}", count),
            Instruction::Param { ty, name } => write!(f, "param {} {}", ty, name),
            Instruction::EndFunc { .. } => f.write_str("endfunc"),
            Instruction::BinOp { dest, op, lhs, rhs } => {
                write!(f, "{} := {} {} {}", dest, lhs, op, rhs)
            }
            Instruction::Assign { dest, src } => write!(f, "{} := {}", dest, src),
            Instruction::IfGoto { pred, label } => write!(f, "!if {} goto {}", pred, label),
            Instruction::Label { name } => write!(f, "{}", name),
            Instruction::Call { dest, label } => write!(f, "{} := call {}", dest, label),
            Instruction::Arg { value } => write!(f, "arg {}", value),
            Instruction::Return { value } => write!(f, "return {}", value),
            Instruction::Print { value } => write!(f, "print {}", value),
        }
    }
}

/// Render a TAC list, one instruction per line.
pub fn render(instructions: &[Instruction]) -> Vec<String> {
    instructions.iter().map(ToString::to_string).collect()
}
