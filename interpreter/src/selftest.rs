//! Sample programs compiled into the binary and run by `mython --test`.

use std::io::{self, Write};

pub struct Sample {
    pub name: &'static str,
    pub source: &'static str,
    pub expected: &'static str,
}

macro_rules! sample {
    ($name:literal) => {
        Sample {
            name: $name,
            source: include_str!(concat!("../data/", $name, ".my")),
            expected: include_str!(concat!("../data/", $name, ".my.out")),
        }
    };
}

pub const SAMPLES: &[Sample] = &[
    sample!("basics"),
    sample!("classes"),
    sample!("inheritance"),
    sample!("operators"),
    sample!("control"),
    sample!("runtime_error"),
    sample!("parse_error"),
    sample!("deep_recursion"),
    sample!("bench/fib"),
    sample!("bench/instances"),
];

/// Runs `src` and returns everything it printed. A failing program's error message is appended
/// as a final line, which is how the expected outputs of failing samples are written.
pub fn transcript(src: &str) -> String {
    let mut output = Vec::new();
    if let Err(err) = crate::run(src, &mut output) {
        output.extend_from_slice(format!("{}\n", err).as_bytes());
    }
    String::from_utf8_lossy(&output).into_owned()
}

/// Runs every bundled sample, reporting each result to `out`. Returns whether all of them passed.
pub fn run_all(out: &mut dyn Write) -> io::Result<bool> {
    let mut failed = 0;
    for sample in SAMPLES {
        let actual = transcript(sample.source);
        if actual == sample.expected {
            writeln!(out, "ok      {}", sample.name)?;
        } else {
            failed += 1;
            writeln!(out, "FAILED  {}", sample.name)?;
            writeln!(out, "--- expected\n{}--- actual\n{}---", sample.expected, actual)?;
        }
    }

    writeln!(out, "{} passed, {} failed", SAMPLES.len() - failed, failed)?;
    Ok(failed == 0)
}

#[cfg(test)]
mod tests {
    use crate::selftest::{run_all, transcript};

    #[test]
    fn test_bundled_samples_pass() {
        let mut report = Vec::new();
        let passed = run_all(&mut report).unwrap();
        assert!(passed, "{}", String::from_utf8_lossy(&report));
    }

    #[test]
    fn test_transcript_appends_error() {
        assert_eq!(transcript("print 1\nprint 1 / 0\n"), "1\ndivision by zero\n");
        assert_eq!(
            transcript("x = $\n"),
            "[line 1] lexical error: unexpected character '$' at column 5\n"
        );
    }
}
