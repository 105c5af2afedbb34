//! Persistence of solved stationary distributions.
//!
//! A solved distribution is stored as a small binary blob that carries
//! enough of the graph to detect a mismatch on load, plus two text dumps
//! that are easy to diff and can always be regenerated from the blob.
//!
//! # Format
//!
//! ```text
//! [MAGIC "ARWD"] [VERSION u8]
//! [topology_hash u64] [vertex_count u32] [sink u32]
//! [sleep: u32 len, f64 * len]
//! [states: u32 count, (u32 len, u32 * len) * count]
//! [probabilities: u32 len, f64 * len]
//! ```
//!
//! All integers and floats are little-endian.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod text;
pub mod types;

pub use codec::{read_distribution, write_distribution};
pub use error::PersistError;
pub use text::{write_probabilities, write_states, write_text_dumps, TextDumps};
pub use types::StoredDistribution;

/// Magic bytes at the start of every blob.
pub const MAGIC: [u8; 4] = *b"ARWD";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
