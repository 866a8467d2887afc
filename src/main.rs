mod ast;
mod callable;
mod class;
mod config;
mod env;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod value;

use clap::Parser as ClapParser;
use config::{
    EXIT_DATA_ERROR, EXIT_IO_ERROR, EXIT_OK, EXIT_USAGE, HISTORY_FILE, REPL_EXIT_COMMAND,
    SOURCE_EXTENSION, WELCOME_MESSAGE, WELCOME_SUBTITLE,
};
use interpreter::Interpreter;
use parser::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use std::process::ExitCode;

/// A tree-walking interpreter for a small class-based scripting language
#[derive(ClapParser, Debug)]
#[command(name = "gkg")]
#[command(version = config::VERSION)]
#[command(about = "A tree-walking interpreter for a small class-based scripting language")]
struct CliArgs {
    /// Script file to run (omit to start the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    // clap's own usage-error exit code (2) doesn't match this language's
    // external-interface contract (64), so the parse failure is caught and
    // remapped here rather than letting `CliArgs::parse()` call `exit` itself.
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            err.print().ok();
            return ExitCode::from(EXIT_USAGE as u8);
        }
    };

    match args.script {
        Some(path) => run_script(&path),
        None => {
            run_repl();
            ExitCode::from(EXIT_OK as u8)
        }
    }
}

fn run_script(path: &PathBuf) -> ExitCode {
    if path.extension().and_then(|ext| ext.to_str()) != Some(SOURCE_EXTENSION) {
        eprintln!(
            "Error: expected a .{} source file, got '{}'.",
            SOURCE_EXTENSION,
            path.display()
        );
        return ExitCode::from(EXIT_IO_ERROR as u8);
    }

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: cannot read '{}': {}", path.display(), err);
            return ExitCode::from(EXIT_IO_ERROR as u8);
        }
    };

    let tokens = match lexer::scan(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(EXIT_DATA_ERROR as u8);
        }
    };

    let statements = match Parser::new(tokens).parse() {
        Ok(statements) => statements,
        Err(errors) => {
            for err in &errors {
                eprintln!("{}", err);
            }
            return ExitCode::from(EXIT_DATA_ERROR as u8);
        }
    };

    let mut interpreter = Interpreter::new();
    match interpreter.run(&statements) {
        Ok(()) => ExitCode::from(EXIT_OK as u8),
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::from(EXIT_DATA_ERROR as u8)
        }
    }
}

fn run_repl() {
    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_SUBTITLE);

    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), rustyline::history::DefaultHistory> = match Editor::with_config(config) {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Failed to initialize REPL: {}", err);
            return;
        }
    };
    let _ = rl.load_history(HISTORY_FILE);

    let mut interpreter = Interpreter::new();

    loop {
        let readline = rl.readline("gkg> ");
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if line.trim() == REPL_EXIT_COMMAND {
                    break;
                }

                match lexer::scan(&line) {
                    Ok(tokens) => match Parser::new(tokens).parse() {
                        Ok(statements) => {
                            if let Err(err) = interpreter.run(&statements) {
                                eprintln!("{}", err);
                            }
                        }
                        Err(errors) => {
                            for err in &errors {
                                eprintln!("{}", err);
                            }
                        }
                    },
                    Err(err) => eprintln!("{}", err),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_args_accept_no_script() {
        let args = CliArgs::try_parse_from(["gkg"]).unwrap();
        assert!(args.script.is_none());
    }

    #[test]
    fn cli_args_accept_one_script_path() {
        let args = CliArgs::try_parse_from(["gkg", "main.gkg"]).unwrap();
        assert_eq!(args.script, Some(PathBuf::from("main.gkg")));
    }

    #[test]
    fn cli_args_reject_two_positional_args() {
        assert!(CliArgs::try_parse_from(["gkg", "a.gkg", "b.gkg"]).is_err());
    }
}
