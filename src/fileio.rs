//! Tabular data file I/O.
//!
//! The format is a header line followed by one row per sample, each holding
//! at least `num_inputs + num_outputs` whitespace- or comma-separated floats
//! (extra trailing values are ignored). A row with too few values fails the
//! whole file; no partial dataset is ever produced.

use std::fmt::Write as _;
use std::path::Path;

use crate::{Dataset, Error, Result};

/// Parse a data file into a dataset plus its header line.
pub fn read_dataset(path: &Path, num_inputs: usize, num_outputs: usize) -> Result<(Dataset, String)> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::InvalidData(format!("failed to read {}: {e}", path.display())))?;

    let mut lines = contents.lines();
    let header = match lines.next() {
        Some(line) => line.to_owned(),
        None => {
            return Err(Error::InvalidData(format!(
                "data file {} is empty",
                path.display()
            )))
        }
    };

    let mut inputs = Vec::new();
    let mut targets = Vec::new();
    let mut rows = 0_usize;

    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let values = line.replace(',', " ");
        let mut fields = values.split_whitespace();

        for col in 0..num_inputs + num_outputs {
            let field = fields.next().ok_or_else(|| {
                Error::InvalidData(format!(
                    "line {} of {} has {col} values, expected {}",
                    line_no + 2,
                    path.display(),
                    num_inputs + num_outputs
                ))
            })?;
            let value: f32 = field.parse().map_err(|_| {
                Error::InvalidData(format!(
                    "line {} of {}: could not parse {field:?} as a number",
                    line_no + 2,
                    path.display()
                ))
            })?;

            if col < num_inputs {
                inputs.push(value);
            } else {
                targets.push(value);
            }
        }
        rows += 1;
    }

    if rows == 0 {
        return Err(Error::InvalidData(format!(
            "data file {} holds no samples",
            path.display()
        )));
    }

    let data = Dataset::from_flat(inputs, targets, num_inputs, num_outputs)?;
    Ok((data, header))
}

/// Write a dataset as header + one space-separated row per sample.
///
/// `header` is reused verbatim when given; otherwise a `x1 .. y1 ..` header is
/// generated from the dataset's dimensions.
pub fn write_dataset(path: &Path, data: &Dataset, header: Option<&str>) -> Result<()> {
    let mut out = String::new();

    match header {
        Some(h) => out.push_str(h),
        None => {
            for x in 1..=data.input_dim() {
                if x > 1 {
                    out.push(' ');
                }
                let _ = write!(out, "x{x}");
            }
            for y in 1..=data.target_dim() {
                let _ = write!(out, " y{y}");
            }
        }
    }
    out.push('\n');

    for idx in 0..data.len() {
        out.push_str(&format_row(data.input(idx)));
        out.push(' ');
        out.push_str(&format_row(data.target(idx)));
        out.push('\n');
    }

    std::fs::write(path, out)
        .map_err(|e| Error::InvalidData(format!("failed to write {}: {e}", path.display())))
}

/// Space-join a row of values for console and file output.
pub(crate) fn format_row(values: &[f32]) -> String {
    let mut out = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{v}");
    }
    out
}
