//! Interactive single-sample inference.
//!
//! A blocking read-eval loop over an input stream: the user fills one input
//! vector slot per line, a full vector triggers one inference, and the cursor
//! resets for the next query. A line that fails to parse is reported and the
//! same slot is prompted again; [`QUIT_TOKEN`] (or end of input) ends the
//! session.
//!
//! The loop is generic over `BufRead`/`Write` so tests can script it; the
//! orchestrator passes locked stdin/stdout.

use std::io::{BufRead, Write};

use crate::scaling::{self, DatasetBounds};
use crate::{Error, Network, Result};

/// Reserved input line that terminates the session.
pub const QUIT_TOKEN: &str = "q";

/// Run the interactive loop until the quit token or end of input.
///
/// `bounds` are the min-max trackers captured when the training data was
/// normalized into `[new_min, new_max]`; entered vectors are normalized with
/// the input bounds, predictions denormalized (clamped) with the output
/// bounds and log-unscaled.
pub fn run_session<R: BufRead, W: Write>(
    network: &Network,
    bounds: &DatasetBounds,
    new_min: f32,
    new_max: f32,
    input: R,
    mut output: W,
) -> Result<()> {
    session_loop(network, bounds, new_min, new_max, input, &mut output)
        .map_err(|e| Error::InvalidData(format!("interactive session i/o failed: {e}")))
}

fn session_loop<R: BufRead, W: Write>(
    network: &Network,
    bounds: &DatasetBounds,
    new_min: f32,
    new_max: f32,
    input: R,
    output: &mut W,
) -> std::io::Result<()> {
    let num_inputs = network.input_dim();
    let mut slots = vec![0.0_f32; num_inputs];
    let mut cursor = 0_usize;
    let mut scratch = network.scratch();

    writeln!(
        output,
        "Interactive mode: enter {num_inputs} value(s) per query, \"{QUIT_TOKEN}\" to quit."
    )?;
    write!(output, "x{}> ", cursor + 1)?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        let token = line.trim();

        if token == QUIT_TOKEN {
            writeln!(output, "Leaving interactive mode.")?;
            return Ok(());
        }

        match token.parse::<f32>() {
            Ok(value) => {
                slots[cursor] = value;
                cursor += 1;
            }
            Err(_) => {
                writeln!(
                    output,
                    "Could not parse {token:?} as a number; please enter value {} again.",
                    cursor + 1
                )?;
            }
        }

        if cursor == num_inputs {
            cursor = 0;
            infer_and_print(network, bounds, new_min, new_max, &slots, &mut scratch, output)?;
        }

        write!(output, "x{}> ", cursor + 1)?;
        output.flush()?;
    }

    // End of input behaves like a quit.
    writeln!(output, "Leaving interactive mode.")?;
    Ok(())
}

fn infer_and_print<W: Write>(
    network: &Network,
    bounds: &DatasetBounds,
    new_min: f32,
    new_max: f32,
    slots: &[f32],
    scratch: &mut crate::Scratch,
    output: &mut W,
) -> std::io::Result<()> {
    let mut normalized = slots.to_vec();
    scaling::normalize_vec(&mut normalized, &bounds.inputs, new_min, new_max);

    let prediction = network.forward(&normalized, scratch).to_vec();

    let mut denormalized = prediction.clone();
    if let Err(e) = scaling::denormalize_vec(&mut denormalized, &bounds.outputs, new_min, new_max, true)
    {
        writeln!(output, "Cannot denormalize the prediction: {e}")?;
        return Ok(());
    }
    scaling::unscale_log(&mut denormalized);

    writeln!(
        output,
        "input: {} (normalized: {})",
        crate::fileio::format_row(slots),
        crate::fileio::format_row(&normalized)
    )?;
    writeln!(
        output,
        "prediction: {} (normalized: {})",
        crate::fileio::format_row(&denormalized),
        crate::fileio::format_row(&prediction)
    )?;

    Ok(())
}
