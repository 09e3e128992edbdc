use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use quill::ast::Program;
use quill::ast_printer::AstPrinter;
use quill::interpreter::Interpreter;
use quill::parser::Parser;
use quill::resolver::Resolver;
use quill::scanner::Scanner;
use quill::token::Token;
use quill::translator;

/// Exit status when no program could be produced.
const EXIT_SYNTAX: i32 = 65;

#[derive(ClapParser, Debug)]
#[command(version, about = "Quill language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to quill.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prints every token in a source file, one per line
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints its syntax tree
    Parse {
        filename: Option<PathBuf>,

        /// Print the tree as JSON instead of prefix notation
        #[arg(long)]
        json: bool,
    },

    /// Reports undefined names, duplicate definitions and constant assignments
    Check { filename: Option<PathBuf> },

    /// Prints a C++ rendering of the program
    Translate { filename: Option<PathBuf> },

    /// Runs input from a file as a Quill program
    Run {
        filename: Option<PathBuf>,

        /// Skip the scope check before running
        #[arg(long)]
        no_check: bool,

        /// Print the C++ rendering before running
        #[arg(long)]
        emit_cpp: bool,
    },
}

/// Reads the contents of a file into a String.  A missing path is an error.
fn read_file(filename: Option<PathBuf>) -> Result<String> {
    let filename: PathBuf = filename.context("No source file given")?;

    let file = File::open(&filename).with_context(|| format!("Cannot open {:?}", filename))?;

    let mut buf = Vec::new();
    let bytes = BufReader::new(file)
        .read_to_end(&mut buf)
        .with_context(|| format!("Cannot read {:?}", filename))?;

    info!("Loaded {} bytes of source from {:?}", bytes, filename);

    String::from_utf8(buf).with_context(|| format!("{:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("quill.log").context("Failed to create quill.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'quill::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("quill::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to quill.log");
    Ok(())
}

/// Parse `source`, reporting every lexical/syntax error and exiting with 65
/// if there were any.
fn parse_or_exit(source: &str) -> Program {
    let mut parser = Parser::new(Scanner::new(source));

    match parser.parse() {
        Ok(program) => {
            info!("Program parsed successfully");
            program
        }

        Err(errors) => {
            for e in &errors {
                debug!("Parse debug: {}", e);
                eprintln!("{}", e);
            }

            debug!("Parsing failed, exiting with code {}", EXIT_SYNTAX);
            std::process::exit(EXIT_SYNTAX);
        }
    }
}

/// Print scope diagnostics to stderr.  Never fatal.
fn report_scope_issues(program: &Program) {
    for diagnostic in Resolver::new().check(program) {
        debug!("Scope debug: {}", diagnostic);
        eprintln!("{}", diagnostic);
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("Invoked with {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            let source = read_file(filename)?;
            let tokens: Vec<Token> = Scanner::new(&source).collect();
            let mut tokenized = true;

            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            }

            for token in &tokens {
                if token.is_unknown() {
                    tokenized = false;

                    let message = if token.lexeme.is_empty() {
                        "Unterminated string.".to_string()
                    } else {
                        format!("Unexpected character: {}", token.lexeme)
                    };

                    eprintln!("[line {}] Error: {}", token.line, message);
                } else if !json {
                    println!("{}", token);
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code {}", EXIT_SYNTAX);
                std::process::exit(EXIT_SYNTAX);
            }

            info!("Scanned {} tokens", tokens.len());
        }

        Commands::Parse { filename, json } => {
            let source = read_file(filename)?;
            let program = parse_or_exit(&source);

            if json {
                println!("{}", serde_json::to_string_pretty(&program)?);
            } else {
                let tree = AstPrinter.print_program(&program);
                debug!("AST: {}", tree);
                println!("{}", tree);
            }
        }

        Commands::Check { filename } => {
            let source = read_file(filename)?;
            let program = parse_or_exit(&source);

            report_scope_issues(&program);
        }

        Commands::Translate { filename } => {
            let source = read_file(filename)?;
            let program = parse_or_exit(&source);

            print!("{}", translator::translate(&program));
        }

        Commands::Run {
            filename,
            no_check,
            emit_cpp,
        } => {
            let source = read_file(filename)?;
            let program = parse_or_exit(&source);

            info!("Parsed {} declarations", program.declarations.len());

            if !no_check {
                report_scope_issues(&program);
            }

            if emit_cpp {
                print!("{}", translator::translate(&program));
            }

            let mut interpreter = Interpreter::new();

            match interpreter.execute(&program) {
                Ok(()) => info!("Run finished"),

                // Reported, but the run itself was still carried out.
                Err(e) => {
                    debug!("Run aborted: {}", e);
                    eprintln!("{}", e);
                }
            }
        }
    }

    Ok(())
}
