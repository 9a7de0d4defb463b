use std::io::{self, Write};
use std::time::Duration;

use crate::outcome::{Outcome, TerminationRecord};
use crate::registry::TestCase;

const GREEN: &str = "\x1b[0;32m";
const RED: &str = "\x1b[0;31m";
const NC: &str = "\x1b[0m";

/// Turns termination records into verdict lines.
pub struct Reporter {
    out: Box<dyn Write + Send>,
    silent: bool,
    verbose: bool,
    color: bool,
}

impl Reporter {
    /// Reporter writing to standard output.
    pub fn new(silent: bool, verbose: bool) -> Self {
        Self::with_writer(io::stdout(), silent, verbose)
    }

    pub fn with_writer(out: impl Write + Send + 'static, silent: bool, verbose: bool) -> Self {
        Self {
            out: Box::new(out),
            silent,
            verbose,
            color: false,
        }
    }

    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Banner printed before a test starts, in verbose mode only.
    pub fn announce(&mut self, test: &TestCase) -> io::Result<()> {
        if self.silent || !self.verbose {
            return Ok(());
        }
        writeln!(
            self.out,
            "******************** RUN TEST \"{}\" ********************",
            test.full_name()
        )?;
        self.out.flush()
    }

    /// Classifies `record` and prints its verdict line unless silenced.
    pub fn report(
        &mut self,
        test: &TestCase,
        record: TerminationRecord,
        elapsed: Duration,
    ) -> io::Result<Outcome> {
        let outcome = record.outcome();
        if !self.silent {
            let line = self.format_line(test, &outcome, elapsed);
            writeln!(self.out, "{line}")?;
            self.out.flush()?;
        }
        Ok(outcome)
    }

    fn format_line(&self, test: &TestCase, outcome: &Outcome, elapsed: Duration) -> String {
        let tag = format!("[{}]", outcome.verdict());
        let tag = if self.color {
            let color = if outcome.is_success() { GREEN } else { RED };
            format!("{color}{tag}{NC}")
        } else {
            tag
        };
        format!(
            "{} run test \"{}\" in {:.2} ms ({})",
            tag,
            test.full_name(),
            elapsed.as_secs_f64() * 1000.0,
            outcome.detail()
        )
    }
}
