use std::fs;
use std::io;

use anyhow::Context;
use clap::{App, Arg};
use log::{info, LevelFilter};

use kaleidoscope::backend::Listing;
use kaleidoscope::lexer::Lexer;
use kaleidoscope::source::{decode, LineChars};
use kaleidoscope::{Driver, Outcome};

const PROMPT: &str = "ready> ";

fn dump_tokens(input: impl Iterator<Item = char>) {
    for token in Lexer::new(input) {
        match token {
            Ok(token) => println!("{}", token),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
}

fn compile(input: impl Iterator<Item = char>, check: bool) {
    let backend = if check {
        Listing::new()
    } else {
        Listing::unchecked()
    };

    let mut driver = Driver::new(input, backend);
    let summary = driver.run(|outcome| match outcome {
        Outcome::Accepted(listing) => println!("{}", listing),
        Outcome::Rejected(e) => eprintln!("Error: {}", e),
        Outcome::Failed(e) => eprintln!("Error: {}", e),
    });

    info!(
        "{} accepted, {} rejected, {} failed",
        summary.accepted, summary.rejected, summary.failed
    );
}

fn main() -> anyhow::Result<()> {
    let matches = App::new("kaleidoscope")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::with_name("FILE")
                .help("source file, standard input if omitted")
                .index(1),
        )
        .arg(
            Arg::with_name("tokens")
                .long("tokens")
                .help("print the token stream instead of parsing"),
        )
        .arg(
            Arg::with_name("no-check")
                .long("no-check")
                .help("list constructs without resolving names"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("raise log verbosity, repeatable"),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let tokens = matches.is_present("tokens");
    let check = !matches.is_present("no-check");

    match matches.value_of("FILE") {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read source file {}", path))?;
            let source = decode(&bytes);
            if tokens {
                dump_tokens(source.chars());
            } else {
                compile(source.chars(), check);
            }
        }
        None => {
            let stdin = io::stdin();
            let input = LineChars::new(stdin.lock()).with_prompt(PROMPT);
            if tokens {
                dump_tokens(input);
            } else {
                compile(input, check);
            }
        }
    }

    Ok(())
}
