//! Batch outcome reports.

use crate::migration::DocumentOutcome;
use csv::WriterBuilder;
use std::io;

const HEADER: [&str; 4] = ["id", "status", "succeeded_steps", "errors"];

/// Writes one CSV row per outcome. Steps and errors are joined with `"; "`.
pub fn write_outcomes_csv<W: io::Write>(
    writer: W,
    outcomes: &[DocumentOutcome],
) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(HEADER)?;
    for outcome in outcomes {
        let status = if outcome.is_success() { "success" } else { "failed" };
        writer.write_record([
            outcome.id.as_str(),
            status,
            outcome.succeeded_steps.join("; ").as_str(),
            outcome.errors.join("; ").as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
