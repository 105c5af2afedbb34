//! Plain-text dumps: one configuration or one probability per line.
//!
//! Both files are derived data and can be regenerated from the blob.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use arw_graph::Configuration;

use crate::error::PersistError;
use crate::types::StoredDistribution;

/// Paths of the two dumps written by [`write_text_dumps`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextDumps {
    /// `<name>-states.txt`
    pub states: PathBuf,
    /// `<name>-distribution.txt`
    pub distribution: PathBuf,
}

/// One configuration per line, in `[0, s, 2]` notation.
pub fn write_states(w: &mut dyn Write, states: &[Configuration]) -> Result<(), PersistError> {
    for s in states {
        writeln!(w, "{s}")?;
    }
    Ok(())
}

/// One probability per line, with 17 significant digits so the value
/// reads back bit for bit.
pub fn write_probabilities(w: &mut dyn Write, probabilities: &[f64]) -> Result<(), PersistError> {
    for p in probabilities {
        writeln!(w, "{p:.16e}")?;
    }
    Ok(())
}

/// Write `<name>-states.txt` and `<name>-distribution.txt` into `dir`.
pub fn write_text_dumps(
    dir: &Path,
    name: &str,
    dist: &StoredDistribution,
) -> Result<TextDumps, PersistError> {
    let dumps = TextDumps {
        states: dir.join(format!("{name}-states.txt")),
        distribution: dir.join(format!("{name}-distribution.txt")),
    };

    let mut w = BufWriter::new(File::create(&dumps.states)?);
    write_states(&mut w, &dist.states)?;
    w.flush()?;

    let mut w = BufWriter::new(File::create(&dumps.distribution)?);
    write_probabilities(&mut w, &dist.probabilities)?;
    w.flush()?;

    log::info!(
        "wrote {} and {}",
        dumps.states.display(),
        dumps.distribution.display()
    );
    Ok(dumps)
}
