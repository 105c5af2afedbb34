//! Binary encode/decode for stored distributions.
//!
//! All integers are little-endian. Arrays are prefixed with a `u32`
//! element count.

use std::io::{Read, Write};

use arw_graph::{Configuration, Counts};

use crate::error::PersistError;
use crate::types::StoredDistribution;
use crate::{FORMAT_VERSION, MAGIC};

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), PersistError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f64.
pub fn write_f64_le(w: &mut dyn Write, v: f64) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_len(w: &mut dyn Write, len: usize) -> Result<(), PersistError> {
    let len = u32::try_from(len).map_err(|_| PersistError::Malformed {
        detail: format!("array of {len} elements exceeds u32::MAX"),
    })?;
    write_u32_le(w, len)
}

/// Write a length-prefixed f64 array.
pub fn write_f64_array(w: &mut dyn Write, values: &[f64]) -> Result<(), PersistError> {
    write_len(w, values.len())?;
    for &v in values {
        write_f64_le(w, v)?;
    }
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, PersistError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, PersistError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, PersistError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian f64.
pub fn read_f64_le(r: &mut dyn Read) -> Result<f64, PersistError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

/// Read a length-prefixed f64 array.
pub fn read_f64_array(r: &mut dyn Read) -> Result<Vec<f64>, PersistError> {
    let len = read_u32_le(r)? as usize;
    // Do not trust the prefix for the allocation size.
    let mut out = Vec::with_capacity(len.min(1 << 16));
    for _ in 0..len {
        out.push(read_f64_le(r)?);
    }
    Ok(out)
}

// ── Distribution encode/decode ──────────────────────────────────

/// Write `dist` as a complete blob.
pub fn write_distribution(w: &mut dyn Write, dist: &StoredDistribution) -> Result<(), PersistError> {
    if dist.states.len() != dist.probabilities.len() {
        return Err(PersistError::Malformed {
            detail: format!(
                "{} states but {} probabilities",
                dist.states.len(),
                dist.probabilities.len()
            ),
        });
    }
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;

    write_u64_le(w, dist.topology_hash)?;
    write_u32_le(w, dist.vertex_count)?;
    write_u32_le(w, dist.sink)?;
    write_f64_array(w, &dist.sleep)?;

    write_len(w, dist.states.len())?;
    for state in &dist.states {
        write_len(w, state.len())?;
        for &c in state.counts() {
            write_u32_le(w, c)?;
        }
    }
    write_f64_array(w, &dist.probabilities)?;
    Ok(())
}

/// Read a complete blob.
pub fn read_distribution(r: &mut dyn Read) -> Result<StoredDistribution, PersistError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(PersistError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion { found: version });
    }

    let topology_hash = read_u64_le(r)?;
    let vertex_count = read_u32_le(r)?;
    let sink = read_u32_le(r)?;
    if vertex_count == 0 || sink >= vertex_count {
        return Err(PersistError::Malformed {
            detail: format!("sink {sink} out of range for {vertex_count} vertices"),
        });
    }
    let sites = vertex_count as usize - 1;
    let sleep = read_f64_array(r)?;
    if sleep.len() != sites {
        return Err(PersistError::Malformed {
            detail: format!("{} sleep probabilities for {sites} sites", sleep.len()),
        });
    }

    let count = read_u32_le(r)? as usize;
    let mut states = Vec::with_capacity(count.min(1 << 16));
    for i in 0..count {
        let len = read_u32_le(r)? as usize;
        if len != sites {
            return Err(PersistError::Malformed {
                detail: format!("state {i} has {len} sites, expected {sites}"),
            });
        }
        let mut counts = Counts::with_capacity(len);
        for _ in 0..len {
            counts.push(read_u32_le(r)?);
        }
        states.push(Configuration::from_ranked(counts));
    }

    let probabilities = read_f64_array(r)?;
    if probabilities.len() != states.len() {
        return Err(PersistError::Malformed {
            detail: format!(
                "{} states but {} probabilities",
                states.len(),
                probabilities.len()
            ),
        });
    }
    log::debug!("read distribution over {} configurations", states.len());
    Ok(StoredDistribution {
        topology_hash,
        vertex_count,
        sink,
        sleep,
        states,
        probabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::SmallVec;

    fn sample() -> StoredDistribution {
        StoredDistribution {
            topology_hash: 0xdead_beef,
            vertex_count: 3,
            sink: 2,
            sleep: vec![0.5, 0.25],
            states: vec![
                Configuration::from_ranked(SmallVec::from_slice(&[0, 0])),
                Configuration::from_ranked(SmallVec::from_slice(&[1, 0])),
            ],
            probabilities: vec![0.4, 0.6],
        }
    }

    fn encode(dist: &StoredDistribution) -> Vec<u8> {
        let mut buf = Vec::new();
        write_distribution(&mut buf, dist).unwrap();
        buf
    }

    #[test]
    fn header_layout() {
        let buf = encode(&sample());
        assert_eq!(&buf[..4], b"ARWD");
        assert_eq!(buf[4], FORMAT_VERSION);
        assert_eq!(&buf[5..13], &0xdead_beefu64.to_le_bytes());
        // magic + version + hash + vertex_count + sink
        // + sleep (4 + 16) + states (4 + 2 * (4 + 8)) + probabilities (4 + 16)
        assert_eq!(buf.len(), 4 + 1 + 8 + 4 + 4 + 20 + 28 + 20);
    }

    #[test]
    fn decode_restores_everything() {
        let dist = sample();
        let back = read_distribution(&mut encode(&dist).as_slice()).unwrap();
        assert_eq!(back, dist);
    }

    #[test]
    fn bad_magic_and_version_rejected() {
        let mut buf = encode(&sample());
        buf[0] = b'X';
        assert!(matches!(
            read_distribution(&mut buf.as_slice()),
            Err(PersistError::InvalidMagic)
        ));

        let mut buf = encode(&sample());
        buf[4] = 99;
        assert!(matches!(
            read_distribution(&mut buf.as_slice()),
            Err(PersistError::UnsupportedVersion { found: 99 })
        ));
    }

    #[test]
    fn truncation_is_an_io_error() {
        let buf = encode(&sample());
        let err = read_distribution(&mut &buf[..buf.len() - 3]).unwrap_err();
        assert!(matches!(err, PersistError::Io(_)));
    }

    #[test]
    fn mismatched_lengths_rejected_on_write() {
        let mut dist = sample();
        dist.probabilities.pop();
        let mut buf = Vec::new();
        assert!(matches!(
            write_distribution(&mut buf, &dist),
            Err(PersistError::Malformed { .. })
        ));
    }

    #[test]
    fn wrong_state_width_rejected_on_read() {
        let mut dist = sample();
        dist.states[1] = Configuration::from_ranked(SmallVec::from_slice(&[1, 0, 0]));
        let buf = encode(&dist);
        assert!(matches!(
            read_distribution(&mut buf.as_slice()),
            Err(PersistError::Malformed { .. })
        ));
    }
}
