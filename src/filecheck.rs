//! FileCheck-style golden tests for AST files.
//!
//! A test file is AST text interleaved with `//` directive lines:
//!
//! ```text
//! // RUN: cmmc --optimize --tac-only %s
//! // CHECK-LABEL: func main
//! // CHECK-NEXT: t0 := 5
//! // CHECK-NOT: a := 2
//! ```
//!
//! Every `RUN` line compiles the AST once with its flags and the output is
//! matched against all `CHECK` directives in file order. A `RUN` line starting
//! with `not` expects the compilation to fail; its output is the error
//! message.

use crate::ast::ParseConfig;
use crate::driver::{compile, CompileOptions};

/// Line prefix of every directive. AST tokens never start with it.
const DIRECTIVE_PREFIX: &str = "//";

/// A check directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckDirective {
    /// Pattern on some later line.
    Check(String),
    /// Like `Check`, marks the start of a section.
    CheckLabel(String),
    /// Pattern on the line right after the previous match.
    CheckNext(String),
    /// Pattern absent up to the next match (or the end of output).
    CheckNot(String),
    Comment(String),
}

/// One `RUN` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirective {
    pub command: String,
    pub args: Vec<String>,
    pub expect_failure: bool,
}

/// A parsed test file.
#[derive(Debug)]
pub struct TestSpec {
    pub run_directives: Vec<RunDirective>,
    pub check_directives: Vec<CheckDirective>,
    pub ast_content: String,
}

impl TestSpec {
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut run_directives = Vec::new();
        let mut check_directives = Vec::new();
        let mut ast_lines = Vec::new();

        for (lineno, line) in content.lines().enumerate() {
            let Some(directive) = line.trim().strip_prefix(DIRECTIVE_PREFIX) else {
                ast_lines.push(line);
                continue;
            };
            let directive = directive.trim();

            if let Some(run) = directive.strip_prefix("RUN:") {
                let (expect_failure, run) = match run.trim().strip_prefix("not ") {
                    Some(rest) => (true, rest),
                    None => (false, run),
                };
                let mut parts = run.split_whitespace().map(str::to_string);
                let command = parts
                    .next()
                    .ok_or_else(|| format!("line {}: empty RUN directive", lineno + 1))?;
                run_directives.push(RunDirective {
                    command,
                    args: parts.collect(),
                    expect_failure,
                });
            } else if let Some(pattern) = directive.strip_prefix("CHECK-LABEL:") {
                check_directives.push(CheckDirective::CheckLabel(pattern.trim().to_string()));
            } else if let Some(pattern) = directive.strip_prefix("CHECK-NEXT:") {
                check_directives.push(CheckDirective::CheckNext(pattern.trim().to_string()));
            } else if let Some(pattern) = directive.strip_prefix("CHECK-NOT:") {
                check_directives.push(CheckDirective::CheckNot(pattern.trim().to_string()));
            } else if let Some(pattern) = directive.strip_prefix("CHECK:") {
                check_directives.push(CheckDirective::Check(pattern.trim().to_string()));
            } else if let Some(comment) = directive.strip_prefix("COM:") {
                check_directives.push(CheckDirective::Comment(comment.trim().to_string()));
            } else {
                return Err(format!(
                    "line {}: unknown directive '{}'",
                    lineno + 1,
                    directive
                ));
            }
        }

        if run_directives.is_empty() {
            return Err("no RUN directive".to_string());
        }

        Ok(TestSpec {
            run_directives,
            check_directives,
            ast_content: ast_lines.join("\n"),
        })
    }
}

/// Runs parsed test files.
pub struct TestRunner {
    verbose: bool,
}

impl TestRunner {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_test(&self, spec: &TestSpec) -> Result<(), String> {
        for run in &spec.run_directives {
            let output = self.execute(&spec.ast_content, run)?;
            self.validate_output(&output, &spec.check_directives)?;
        }
        Ok(())
    }

    /// Compile `ast` with the flags of `run` and return the text to check.
    fn execute(&self, ast: &str, run: &RunDirective) -> Result<String, String> {
        if run.command != "cmmc" {
            return Err(format!("unknown RUN command '{}'", run.command));
        }
        let options = parse_run_args(&run.args)?;

        match (compile(ast, &options), run.expect_failure) {
            (Ok(output), false) => Ok(match &output.program {
                Some(program) => program.to_string(),
                None => output.tac_lines().join("\n"),
            }),
            (Err(err), true) => Ok(err.to_string()),
            (Ok(_), true) => Err("expected compilation to fail, but it succeeded".to_string()),
            (Err(err), false) => Err(format!("compilation failed: {}", err)),
        }
    }

    /// Match `output` against `directives` in order.
    pub fn validate_output(
        &self,
        output: &str,
        directives: &[CheckDirective],
    ) -> Result<(), String> {
        let lines: Vec<&str> = output.lines().collect();
        let mut next_line = 0;
        let mut pending_not: Vec<&str> = Vec::new();

        for directive in directives {
            match directive {
                CheckDirective::Comment(_) => {}

                CheckDirective::CheckNot(pattern) => pending_not.push(pattern.as_str()),

                CheckDirective::Check(pattern) | CheckDirective::CheckLabel(pattern) => {
                    let found = lines[next_line..]
                        .iter()
                        .position(|line| line.contains(pattern.as_str()))
                        .map(|offset| next_line + offset)
                        .ok_or_else(|| format!("CHECK: pattern '{}' not found in output", pattern))?;
                    ensure_absent(&lines[next_line..found], &pending_not)?;
                    pending_not.clear();
                    if self.verbose {
                        println!("CHECK: '{}' found at line {}", pattern, found);
                    }
                    next_line = found + 1;
                }

                CheckDirective::CheckNext(pattern) => {
                    let line = lines
                        .get(next_line)
                        .ok_or_else(|| format!("CHECK-NEXT: no more lines, expected '{}'", pattern))?;
                    if !line.contains(pattern.as_str()) {
                        return Err(format!(
                            "CHECK-NEXT: expected '{}' but got '{}'",
                            pattern, line
                        ));
                    }
                    pending_not.clear();
                    if self.verbose {
                        println!("CHECK-NEXT: '{}' matches at line {}", pattern, next_line);
                    }
                    next_line += 1;
                }
            }
        }

        ensure_absent(&lines[next_line.min(lines.len())..], &pending_not)
    }
}

fn ensure_absent(lines: &[&str], patterns: &[&str]) -> Result<(), String> {
    for pattern in patterns {
        if let Some(line) = lines.iter().find(|line| line.contains(*pattern)) {
            return Err(format!("CHECK-NOT: '{}' found in '{}'", pattern, line));
        }
    }
    Ok(())
}

/// Map `cmmc` flags onto compile options. `%s` stands for the test file.
fn parse_run_args(args: &[String]) -> Result<CompileOptions, String> {
    let mut options = CompileOptions::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "%s" => {}
            "--optimize" => options.optimizer.enabled = true,
            "--tac-only" => options.tac_only = true,
            "--no-bootstrap" => options.codegen.bootstrap = false,
            "--indent" => {
                let step = iter
                    .next()
                    .and_then(|value| value.parse().ok())
                    .ok_or("--indent needs a number")?;
                options.parse = ParseConfig { indent_step: step };
            }
            other => return Err(format!("unsupported RUN flag '{}'", other)),
        }
    }

    Ok(options)
}
