//! Tab-separated output: the session log and per-trial gaze recordings.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use legere_core::{TrialRecord, LOG_COLUMNS};

use crate::station::RecordedSample;

pub const SAMPLE_COLUMNS: [&str; 5] = ["TimeTag", "LeftEyeX", "LeftEyeY", "RightEyeX", "RightEyeY"];

/// Writes a header row and data rows. Tabs and newlines inside cells are
/// replaced by spaces so every record stays on one line.
pub fn write_table<I>(path: &Path, header: &[&str], rows: I) -> std::io::Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", header.join("\t"))?;
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| c.replace(['\t', '\n', '\r'], " ")).collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    out.flush()
}

/// Session log: one row per record, navigation pages dropped.
pub fn write_session_log(path: &Path, records: &[TrialRecord]) -> std::io::Result<()> {
    write_table(
        path,
        &LOG_COLUMNS,
        records
            .iter()
            .filter(|r| !r.trial_type.is_navigation())
            .map(TrialRecord::to_row),
    )
}

pub fn write_samples(path: &Path, samples: &[RecordedSample]) -> std::io::Result<()> {
    write_table(
        path,
        &SAMPLE_COLUMNS,
        samples.iter().map(|s| {
            vec![
                format!("{:.6}", s.time_tag),
                s.gaze.left.0.to_string(),
                s.gaze.left.1.to_string(),
                s.gaze.right.0.to_string(),
                s.gaze.right.1.to_string(),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use legere_core::TrialKind;

    #[test]
    fn navigation_rows_are_dropped_and_cells_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.tsv");

        let mut reading = TrialRecord::new(TrialKind::ReadingTrial);
        reading.pno = Some(1);
        reading.start_time = Some(0.5);
        reading.end_time = Some(2.25);
        reading.stimulus = Some("two\tparts".into());
        let mut next = TrialRecord::new(TrialKind::Next);
        next.pno = Some(2);

        write_session_log(&path, &[reading, next]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], LOG_COLUMNS.join("\t"));
        assert_eq!(lines[1], "1\tReadingTrial\t0.500\t2.250\t\t\ttwo parts\t\t\t\t");
    }
}
