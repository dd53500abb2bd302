//! Sequence motif scanning

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The N-glycosylation sequon: asparagine, anything but proline, then serine or threonine
pub const N_GLYCOSYLATION: &str = "N[^P][ST]";

static N_GLYCOSYLATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(N_GLYCOSYLATION).unwrap());

/// A single motif occurrence
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct MotifMatch {
    /// 0-based start position in the sequence
    pub start: usize,
    /// The matched residues
    pub matched: String,
}

/// All non-overlapping matches of a motif, scanning left to right
pub fn find_motif(motif: &Regex, sequence: &str) -> Vec<MotifMatch> {
    motif
        .find_iter(sequence)
        .map(|m| MotifMatch {
            start: m.start(),
            matched: m.as_str().to_string(),
        })
        .collect()
}

/// All N-glycosylation sequons in the sequence
pub fn n_glycosylation_sites(sequence: &str) -> Vec<MotifMatch> {
    find_motif(&N_GLYCOSYLATION_REGEX, sequence)
}
