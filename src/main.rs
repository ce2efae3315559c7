use clap::{App, Arg};
use fossil::{AstPrinter, Error, Interpreter, Parser, Scanner, TokenStream, Value};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy)]
struct Options {
    echo: bool,
    ast: bool,
    keep_going: bool,
}

fn main() {
    let matches = App::new("fossil")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs Fossil scripts, or starts an interactive prompt")
        .arg(
            Arg::with_name("SCRIPT")
                .help("Script to run; without one, statements are read from a prompt")
                .index(1),
        )
        .arg(
            Arg::with_name("echo")
                .short("e")
                .long("echo")
                .help("Prints the value of every top-level statement"),
        )
        .arg(
            Arg::with_name("ast")
                .long("ast")
                .help("Prints each parsed statement instead of running it"),
        )
        .arg(
            Arg::with_name("keep-going")
                .short("k")
                .long("keep-going")
                .help("Reports a failing statement and continues with the next one"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Raises the log level; RUST_LOG takes precedence"),
        )
        .get_matches();

    init_tracing(matches.occurrences_of("verbose"));

    let interpreter = Interpreter::new();
    if let Err(e) = interpreter.define_native("print", print) {
        eprintln!("{}", e);
        process::exit(70);
    }

    let options = Options {
        echo: matches.is_present("echo"),
        ast: matches.is_present("ast"),
        keep_going: matches.is_present("keep-going"),
    };
    let code = match matches.value_of("SCRIPT") {
        Some(path) => run_file(&interpreter, path, options),
        None => run_prompt(&interpreter, options),
    };
    process::exit(code);
}

fn init_tracing(verbosity: u64) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print(args: &[Value]) -> Option<Value> {
    let words: Vec<String> = args.iter().map(Value::to_string).collect();
    println!("{}", words.join(" "));
    None
}

fn exit_code(error: &Error) -> i32 {
    match error {
        Error::Syntax { .. } => 65,
        Error::Runtime { .. } | Error::Arithmetic { .. } => 70,
        Error::Io(_) => 74,
    }
}

fn run_file(interpreter: &Interpreter, path: &str, options: Options) -> i32 {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("{}: {}", path, Error::from(e));
            return 74;
        }
    };
    let mut parser = Parser::new(Scanner::new(BufReader::new(file)));
    run(interpreter, &mut parser, options)
}

// Every line typed at the prompt is a small program of its own; the globals
// carry over from one line to the next.
fn run_prompt(interpreter: &Interpreter, options: Options) -> i32 {
    let options = Options {
        echo: true,
        keep_going: true,
        ..options
    };
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        if let Err(e) = io::stdout().flush() {
            eprintln!("{}", Error::from(e));
            return 74;
        }
        match lines.next() {
            None => {
                println!();
                return 0;
            }
            Some(Err(e)) => {
                eprintln!("{}", Error::from(e));
                return 74;
            }
            Some(Ok(line)) => {
                let mut parser = Parser::new(Scanner::from_source(&line));
                run(interpreter, &mut parser, options);
            }
        }
    }
}

// Returns the exit code of the last failure, or 0.
fn run<S: TokenStream>(
    interpreter: &Interpreter,
    parser: &mut Parser<S>,
    options: Options,
) -> i32 {
    let mut status = 0;
    loop {
        let statement = match parser.read() {
            Ok(Some(statement)) => statement,
            Ok(None) => return status,
            Err(e) => {
                eprintln!("{}", e);
                status = exit_code(&e);
                if !options.keep_going || !e.is_syntax() {
                    return status;
                }
                if let Err(e) = parser.synchronize() {
                    eprintln!("{}", e);
                    return exit_code(&e);
                }
                continue;
            }
        };
        if options.ast {
            println!("{}", AstPrinter::print(&statement));
            continue;
        }
        match interpreter.execute(&statement) {
            Ok(value) => {
                if options.echo {
                    println!("{:?}", value);
                }
            }
            Err(e) => {
                eprintln!("{}", e);
                status = exit_code(&e);
                if !options.keep_going {
                    return status;
                }
            }
        }
    }
}
