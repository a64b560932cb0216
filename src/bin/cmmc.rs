//! cmmc command line driver.
//!
//! Reads AST text from a file or stdin and writes TAC (`--tac-only`) or MIPS
//! assembly to `--out` or stdout. Diagnostics go to stderr.

use clap::Parser;
use cmmc::{compile, CodegenConfig, CompileOptions, CompileOutput, OptimizerConfig, ParseConfig};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cmmc", version, about = "Compile a C-- syntax tree to MIPS assembly")]
struct Cli {
    /// AST file; stdin when absent.
    file: Option<PathBuf>,

    /// Output file; stdout when absent.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Run the optimizer.
    #[arg(long)]
    optimize: bool,

    /// Stop after three-address code and print it.
    #[arg(long)]
    tac_only: bool,

    /// Echo the AST input to stderr.
    #[arg(long)]
    ast: bool,

    /// Print the TAC and numbered assembly to stderr and enable debug logs.
    #[arg(long)]
    debug: bool,

    /// Print session statistics to stderr.
    #[arg(long)]
    stats: bool,

    /// Columns per AST depth level.
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Omit the program entry and exit sequence.
    #[arg(long)]
    no_bootstrap: bool,
}

impl Cli {
    fn options(&self) -> CompileOptions {
        CompileOptions {
            parse: ParseConfig {
                indent_step: self.indent,
            },
            optimizer: OptimizerConfig {
                enabled: self.optimize,
                ..OptimizerConfig::default()
            },
            codegen: CodegenConfig {
                bootstrap: !self.no_bootstrap,
                ..CodegenConfig::default()
            },
            tac_only: self.tac_only,
        }
    }
}

fn read_input(file: Option<&PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn render(output: &CompileOutput) -> String {
    match &output.program {
        Some(program) => program.to_string(),
        None => {
            let mut text = output.tac_lines().join("\n");
            text.push('\n');
            text
        }
    }
}

fn print_debug(output: &CompileOutput) {
    eprintln!("TAC");
    for line in output.tac_lines() {
        eprintln!("{}", line);
    }
    if let Some(program) = &output.program {
        eprintln!("MIPS");
        let width = program.lines().len().to_string().len();
        for (lineno, line) in program.lines().iter().enumerate() {
            let indent = if line.ends_with(':') { "" } else { "\t" };
            eprintln!("{:<width$} | {}{}", lineno + 1, indent, line, width = width);
        }
    }
}

fn run(cli: &Cli) -> cmmc::CompileResult<()> {
    let input = read_input(cli.file.as_ref())?;
    if cli.ast {
        eprint!("{}", input);
    }

    let output = compile(&input, &cli.options())?;
    if cli.debug {
        print_debug(&output);
    }
    if cli.stats {
        eprint!("{}", output.stats);
    }

    let text = render(&output);
    match &cli.out {
        Some(path) => fs::write(path, text)?,
        None => io::stdout().write_all(text.as_bytes())?,
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
