// Sprig program runner: loads a JSON-encoded AST from disk and evaluates
// it. Programs produce output through builtins; the final value is not
// printed.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use yansi::Paint;

use sprig::ast::Node;
use sprig::runtime::{Runtime, StdHost};

#[derive(Parser)]
#[command(name = "sprig")]
#[command(about = "Run a sprig program (a JSON-encoded AST)")]
#[command(version)]
struct Args {
    /// Program file produced by the parser
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{} {}: {}", "error:".red().bold(), args.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let program = match Node::from_json(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let host = Rc::new(StdHost::with_source_path(args.input));
    let runtime = Runtime::new(host);

    match runtime.run(&program) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
