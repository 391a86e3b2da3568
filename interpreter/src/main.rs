use std::io::{self, BufWriter, Read, Write};
use std::process::ExitCode;
use std::{env, fs};

use interpreter::selftest;
use tracing::error;

const USAGE: &str = "\
usage: mython [OPTION | FILE]

Runs a Mython program read from FILE, or from standard input when no file is
given, and writes what it prints to standard output.

options:
  -h, --help    print this help and exit
  -t, --test    run the bundled sample programs and report the results

Set RUST_LOG (for example RUST_LOG=debug) to trace the interpreter on stderr.
";

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn read_source(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut src = String::new();
            io::stdin().read_to_string(&mut src)?;
            Ok(src)
        }
    }
}

fn self_test() -> ExitCode {
    let stdout = io::stdout();
    match selftest::run_all(&mut stdout.lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("mython: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let path = match args.as_slice() {
        [] => None,
        [flag] if flag == "-h" || flag == "--help" || flag == "-help" => {
            print!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        [flag] if flag == "-t" || flag == "--test" || flag == "-test" => return self_test(),
        [path] if !path.starts_with('-') => Some(path.as_str()),
        _ => {
            eprint!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    let src = match read_source(path) {
        Ok(src) => src,
        Err(err) => {
            eprintln!("mython: cannot read program: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = interpreter::run(&src, &mut out);
    // Whatever ran before a failure is still shown, ahead of the error
    let flushed = out.flush();

    match result.and(flushed.map_err(Into::into)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "program failed");
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
