// This module describes the SPIM calling convention the generated code follows. Every function
// call allocates a fresh activation record on the heap through the sbrk syscall: the record
// holds the caller's frame pointer at offset 0 and the return address at offset 4, and $fp is
// moved to the new record. Arguments travel on the stack, one word per argument, pushed in
// source order by the caller. The callee first moves $sp back above the pushed words and then
// walks down again, loading one parameter per word, so parameters arrive in declaration order.
// The result comes back in $v1. After `jal` the caller restores $fp and $ra from the frame
// records and pops the argument words. Printing an integer uses syscall 1 followed by syscall
// 11 with a newline character. The program entry zeroes $fp, calls `main` and exits with
// syscall 10.

//! SPIM calling convention: frames, argument passing and fixed registers.

use std::fmt;

/// Bytes per stack slot.
pub const WORD_SIZE: u32 = 4;

/// Offset of the saved frame pointer inside a frame record.
pub const SAVED_FP_OFFSET: u32 = 0;
/// Offset of the saved return address inside a frame record.
pub const SAVED_RA_OFFSET: u32 = 4;

/// Registers with a fixed role. They never come from an allocation pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedReg {
    Zero,
    FramePointer,
    StackPointer,
    ReturnAddress,
    /// Syscall number and sbrk result.
    V0,
    /// Function result.
    V1,
    /// Syscall argument.
    A0,
}

impl FixedReg {
    pub const fn name(self) -> &'static str {
        match self {
            FixedReg::Zero => "$0",
            FixedReg::FramePointer => "$fp",
            FixedReg::StackPointer => "$sp",
            FixedReg::ReturnAddress => "$ra",
            FixedReg::V0 => "$v0",
            FixedReg::V1 => "$v1",
            FixedReg::A0 => "$a0",
        }
    }
}

impl fmt::Display for FixedReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SPIM syscall numbers used by generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Syscall {
    PrintInt = 1,
    Sbrk = 9,
    Exit = 10,
    PrintChar = 11,
}

/// Where a value to be moved into a fixed register comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Immediate(i32),
    Register(String),
}

impl Source {
    /// `li`/`move` of this source into `target`.
    pub fn load_into(&self, target: FixedReg) -> String {
        match self {
            Source::Immediate(value) => format!("li {}, {}", target, value),
            Source::Register(reg) => format!("move {}, {}", target, reg),
        }
    }
}

/// Instruction sequences of the convention for a given frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpimConvention {
    frame_size: u32,
}

impl SpimConvention {
    pub fn new(frame_size: u32) -> Self {
        Self { frame_size }
    }

    /// Entry label plus allocation and linking of a new frame.
    pub fn prologue(&self, label: &str) -> Vec<String> {
        vec![
            format!("{}:", label),
            format!("li {}, {}", FixedReg::A0, self.frame_size),
            format!("li {}, {}", FixedReg::V0, Syscall::Sbrk as u8),
            "syscall".to_string(),
            format!("sw {}, {}({})", FixedReg::FramePointer, SAVED_FP_OFFSET, FixedReg::V0),
            format!("move {}, {}", FixedReg::FramePointer, FixedReg::V0),
            format!("sw {}, {}({})", FixedReg::ReturnAddress, SAVED_RA_OFFSET, FixedReg::V0),
        ]
    }

    /// Move `$sp` back above the `count` argument words the caller pushed.
    pub fn rewind_params(&self, count: usize) -> Vec<String> {
        vec![
            "# Increment stack pointer by the number of args".to_string(),
            adjust_stack(words(count)),
        ]
    }

    /// Load the next incoming argument word into `reg`.
    pub fn load_param(&self, reg: &str) -> Vec<String> {
        vec![
            adjust_stack(-(WORD_SIZE as i64)),
            format!("lw {}, 0({})", reg, FixedReg::StackPointer),
        ]
    }

    /// Push `reg` as one outgoing argument.
    pub fn push_arg(&self, reg: &str) -> Vec<String> {
        vec![
            adjust_stack(-(WORD_SIZE as i64)),
            format!("sw {}, 0({})", reg, FixedReg::StackPointer),
        ]
    }

    /// Call `label`, restore the caller's frame, pop `pushed` argument words
    /// and copy the result into `dest`.
    pub fn call(&self, label: &str, pushed: usize, dest: &str) -> Vec<String> {
        let mut lines = vec![
            format!("jal {}", label),
            format!("lw {fp}, {}({fp})", SAVED_FP_OFFSET, fp = FixedReg::FramePointer),
            format!("lw {}, {}({})", FixedReg::ReturnAddress, SAVED_RA_OFFSET, FixedReg::FramePointer),
        ];
        if pushed > 0 {
            lines.push(adjust_stack(words(pushed)));
        }
        lines.push(format!("move {}, {}", dest, FixedReg::V1));
        lines
    }

    pub fn ret(&self, value: &Source) -> Vec<String> {
        vec![value.load_into(FixedReg::V1), self.jump_return()]
    }

    pub fn jump_return(&self) -> String {
        format!("jr {}", FixedReg::ReturnAddress)
    }

    /// Print `value` followed by a newline.
    pub fn print(&self, value: &Source) -> Vec<String> {
        vec![
            value.load_into(FixedReg::A0),
            format!("li {}, {}", FixedReg::V0, Syscall::PrintInt as u8),
            "syscall".to_string(),
            format!("addi {}, {}, 0xA", FixedReg::A0, FixedReg::Zero),
            format!("addi {}, {}, 0x{:X}", FixedReg::V0, FixedReg::Zero, Syscall::PrintChar as u8),
            "syscall".to_string(),
        ]
    }

    /// Program entry: clear the frame chain and run `main`.
    pub fn bootstrap(&self) -> Vec<String> {
        vec![
            format!("li {}, 0", FixedReg::FramePointer),
            "jal main".to_string(),
            "j end".to_string(),
        ]
    }

    pub fn exit(&self) -> Vec<String> {
        vec![
            "end:".to_string(),
            "# Exit the program".to_string(),
            format!("li {}, {}", FixedReg::V0, Syscall::Exit as u8),
            "syscall".to_string(),
        ]
    }
}

fn words(count: usize) -> i64 {
    count as i64 * WORD_SIZE as i64
}

fn adjust_stack(bytes: i64) -> String {
    format!(
        "addi {sp}, {sp}, {}",
        bytes,
        sp = FixedReg::StackPointer
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prologue_links_a_new_frame() {
        let convention = SpimConvention::new(48);
        assert_eq!(
            convention.prologue("main"),
            vec![
                "main:",
                "li $a0, 48",
                "li $v0, 9",
                "syscall",
                "sw $fp, 0($v0)",
                "move $fp, $v0",
                "sw $ra, 4($v0)",
            ]
        );
    }

    #[test]
    fn test_call_pops_pushed_arguments() {
        let convention = SpimConvention::new(48);
        assert_eq!(
            convention.call("add", 2, "$t1"),
            vec![
                "jal add",
                "lw $fp, 0($fp)",
                "lw $ra, 4($fp)",
                "addi $sp, $sp, 8",
                "move $t1, $v1",
            ]
        );
        assert_eq!(convention.call("f", 0, "$t0").len(), 4);
    }

    #[test]
    fn test_print_appends_newline() {
        let convention = SpimConvention::new(48);
        assert_eq!(
            convention.print(&Source::Immediate(5)),
            vec![
                "li $a0, 5",
                "li $v0, 1",
                "syscall",
                "addi $a0, $0, 0xA",
                "addi $v0, $0, 0xB",
                "syscall",
            ]
        );
    }

    #[test]
    fn test_param_and_arg_words() {
        let convention = SpimConvention::new(48);
        assert_eq!(
            convention.rewind_params(3),
            vec!["# Increment stack pointer by the number of args", "addi $sp, $sp, 12"]
        );
        assert_eq!(convention.load_param("$s0"), vec!["addi $sp, $sp, -4", "lw $s0, 0($sp)"]);
        assert_eq!(convention.push_arg("$a1"), vec!["addi $sp, $sp, -4", "sw $a1, 0($sp)"]);
    }

    #[test]
    fn test_return_moves_result() {
        let convention = SpimConvention::new(48);
        let source = Source::Register("$t2".to_string());
        assert_eq!(convention.ret(&source), vec!["move $v1, $t2", "jr $ra"]);
    }
}
