use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::report::Report;

pub struct App<R: Report> {
    pub config: Config,
    pub reporter: R,
}

impl<R: Report> App<R> {
    pub fn new(config: Config, reporter: R) -> Self {
        Self { config, reporter }
    }

    /// Reject blank required inputs before any component runs.
    ///
    /// Returns false (after reporting) when one of them is blank.
    pub(crate) fn require(&self, inputs: &[(&str, &str)]) -> bool {
        match inputs.iter().find(|(value, _)| value.trim().is_empty()) {
            Some((_, message)) => {
                self.reporter.error(message);
                false
            }
            None => true,
        }
    }
}

/// Write `value` as a single line of JSON.
pub(crate) fn write_json(stdout: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer(&mut *stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
