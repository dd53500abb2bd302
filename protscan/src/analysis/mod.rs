//! Sequence based protein properties, equivalent to the classic ProtParam set: average molecular
//! weight, isoelectric point, aromaticity, instability index and the secondary structure fractions
//! estimated from the amino acid composition.
//!
//! [`ProteinProperties`] holds the unrounded values, [`AnalysisResult`] the rounded values as
//! presented to users.

mod amino_acid;
mod instability;
mod isoelectric;

pub use amino_acid::AminoAcid;

use context_error::*;
use serde::{Deserialize, Serialize};

use crate::ProtScanError;

/// The average mass of water in dalton, lost for every peptide bond
const WATER: f64 = 18.0153;

/// Proteins with an instability index below this value are predicted to be stable in vitro
pub const STABILITY_THRESHOLD: f64 = 40.0;

/// Parse a sequence, whitespace is ignored and lowercase letters are accepted.
/// # Errors
/// If the sequence is empty or contains any character outside the 20 standard amino acids, the
/// error points at the first offending character.
pub fn parse_sequence(sequence: &str) -> Result<Vec<AminoAcid>, BoxedError<'static, ProtScanError>> {
    let parsed = sequence
        .char_indices()
        .filter(|(_, c)| !c.is_whitespace())
        .map(|(index, c)| {
            AminoAcid::try_from(c).map_err(|()| {
                BoxedError::new(
                    ProtScanError::InvalidSequence,
                    "Invalid sequence",
                    format!(
                        "Character '{c}' at position {} is not one of the 20 standard amino acids",
                        index + 1
                    ),
                    Context::line(None, sequence, index, c.len_utf8()).to_owned(),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if parsed.is_empty() {
        return Err(BoxedError::small(
            ProtScanError::InvalidSequence,
            "Invalid sequence",
            "The sequence is empty",
        ));
    }
    Ok(parsed)
}

/// Analyze a sequence and round the properties for presentation.
/// # Errors
/// See [`parse_sequence`].
pub fn analyze(sequence: &str) -> Result<AnalysisResult, BoxedError<'static, ProtScanError>> {
    ProteinProperties::calculate(sequence).map(|p| p.rounded())
}

/// Round to the given number of decimal places, exact ties go to the even neighbour
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10.0_f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// The fraction of residues in each secondary structure class. The classes overlap (leucine counts
/// towards both helix and sheet) so they need not sum to one.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SecondaryStructure {
    /// V, I, Y, F, W and L
    pub helix: f64,
    /// E, M, A and L
    pub sheet: f64,
    /// N, P, G and S
    pub turn: f64,
}

impl SecondaryStructure {
    fn from_sequence(sequence: &[AminoAcid]) -> Self {
        use AminoAcid::*;
        Self {
            helix: fraction(
                sequence,
                &[Valine, Isoleucine, Tyrosine, Phenylalanine, Tryptophan, Leucine],
            ),
            sheet: fraction(sequence, &[GlutamicAcid, Methionine, Alanine, Leucine]),
            turn: fraction(sequence, &[Asparagine, Proline, Glycine, Serine]),
        }
    }

    /// As percentages rounded to one decimal
    #[must_use]
    pub fn percentages(self) -> Self {
        Self {
            helix: round_to(self.helix * 100.0, 1),
            sheet: round_to(self.sheet * 100.0, 1),
            turn: round_to(self.turn * 100.0, 1),
        }
    }
}

/// The stability prediction based on the instability index
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Stability {
    /// Instability index below 40
    Stable,
    /// Instability index of 40 or higher
    Unstable,
}

impl Stability {
    /// Classify an (unrounded) instability index
    pub fn from_instability_index(index: f64) -> Self {
        if index < STABILITY_THRESHOLD {
            Self::Stable
        } else {
            Self::Unstable
        }
    }
}

impl std::fmt::Display for Stability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stable => write!(f, "Stable"),
            Self::Unstable => write!(f, "Unstable"),
        }
    }
}

/// The unrounded properties of a sequence
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct ProteinProperties {
    /// Number of residues
    pub sequence_length: usize,
    /// Average molecular weight in dalton
    pub molecular_weight: f64,
    /// Isoelectric point in pH units
    pub isoelectric_point: f64,
    /// Fraction of F, W and Y
    pub aromaticity: f64,
    /// Guruprasad instability index
    pub instability_index: f64,
    /// Secondary structure fractions
    pub secondary_structure: SecondaryStructure,
}

impl ProteinProperties {
    /// Calculate all properties for a sequence.
    /// # Errors
    /// See [`parse_sequence`].
    pub fn calculate(sequence: &str) -> Result<Self, BoxedError<'static, ProtScanError>> {
        let sequence = parse_sequence(sequence)?;
        Ok(Self::from_amino_acids(&sequence))
    }

    /// Calculate all properties for an already parsed, non empty, sequence
    pub fn from_amino_acids(sequence: &[AminoAcid]) -> Self {
        use AminoAcid::*;
        let n = sequence.len();
        Self {
            sequence_length: n,
            molecular_weight: sequence.iter().map(|aa| aa.average_weight()).sum::<f64>()
                - n.saturating_sub(1) as f64 * WATER,
            isoelectric_point: isoelectric::isoelectric_point(sequence).unwrap_or_default(),
            aromaticity: fraction(sequence, &[Phenylalanine, Tryptophan, Tyrosine]),
            instability_index: instability::instability_index(sequence),
            secondary_structure: SecondaryStructure::from_sequence(sequence),
        }
    }

    /// The stability prediction, based on the unrounded instability index
    pub fn stability(&self) -> Stability {
        Stability::from_instability_index(self.instability_index)
    }

    /// Round all values for presentation
    pub fn rounded(&self) -> AnalysisResult {
        AnalysisResult {
            sequence_length: self.sequence_length,
            molecular_weight: round_to(self.molecular_weight, 2),
            isoelectric_point: round_to(self.isoelectric_point, 2),
            aromaticity: round_to(self.aromaticity, 4),
            instability_index: round_to(self.instability_index, 2),
            stability: self.stability(),
            secondary_structure: self.secondary_structure.percentages(),
        }
    }
}

/// The rounded properties of a sequence, secondary structure is given as percentages
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Number of residues
    pub sequence_length: usize,
    /// Average molecular weight in dalton, 2 decimals
    pub molecular_weight: f64,
    /// Isoelectric point, 2 decimals
    pub isoelectric_point: f64,
    /// Fraction of F, W and Y, 4 decimals
    pub aromaticity: f64,
    /// Instability index, 2 decimals
    pub instability_index: f64,
    /// Stable if the unrounded instability index is below 40
    pub stability: Stability,
    /// Percentages, 1 decimal
    pub secondary_structure: SecondaryStructure,
}

fn fraction(sequence: &[AminoAcid], set: &[AminoAcid]) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    sequence.iter().filter(|aa| set.contains(aa)).count() as f64 / sequence.len() as f64
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::float_cmp)]
mod tests {
    use super::*;

    const HBA_HUMAN: &str = "MVLSPADKTNVKAAWGKVGAHAGEYGAEALERMFLSFPTTKTYFPHFDLSHGSAQVKGHGKKVADALTNAVAHVDDMPNALSALSDLHAHKLRVDPVNFKLLSHCLLVTLAAHLPAEFTPAVHASLDKFLASVSTVLTSKYR";

    #[test]
    fn hemoglobin() {
        let result = analyze(HBA_HUMAN).unwrap();
        assert_eq!(result.sequence_length, 142);
        assert_eq!(result.molecular_weight, 15257.36);
        assert_eq!(result.isoelectric_point, 8.72);
        assert_eq!(result.aromaticity, 0.0775);
        assert_eq!(result.stability, Stability::Stable);
        assert_eq!(result.secondary_structure.helix, 29.6);
        assert_eq!(result.secondary_structure.sheet, 32.4);
        assert_eq!(result.secondary_structure.turn, 20.4);
    }

    #[test]
    fn single_residue() {
        let result = analyze("e").unwrap();
        assert_eq!(result.sequence_length, 1);
        assert_eq!(result.molecular_weight, 147.13);
        assert_eq!(result.isoelectric_point, 4.6);
        assert_eq!(result.instability_index, 0.0);
        assert_eq!(result.secondary_structure.sheet, 100.0);
    }

    #[test]
    fn whitespace_is_ignored() {
        let spaced = analyze("MKWV TFIS\nLLLL FSSA YS").unwrap();
        let plain = analyze("MKWVTFISLLLLFSSAYS").unwrap();
        assert_eq!(spaced, plain);
        assert_eq!(plain.aromaticity, 0.2222);
        assert_eq!(plain.isoelectric_point, 8.34);
    }

    #[test]
    fn invalid_characters() {
        let error = analyze("MKVXQ").unwrap_err();
        assert_eq!(error.get_kind(), ProtScanError::InvalidSequence);
        assert!(error.get_long_description().contains("'X' at position 4"));
        assert!(analyze("").is_err());
        assert!(analyze("  \n").is_err());
    }

    #[test]
    fn stability_threshold() {
        assert_eq!(Stability::from_instability_index(39.999), Stability::Stable);
        assert_eq!(Stability::from_instability_index(40.0), Stability::Unstable);
        assert_eq!(Stability::from_instability_index(40.001), Stability::Unstable);
        // RR has an index of 291.4
        assert_eq!(analyze("RR").unwrap().stability, Stability::Unstable);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(6.9123, 2), 6.91);
        assert_eq!(round_to(0.123_456, 4), 0.1235);
        let fractions = SecondaryStructure {
            helix: 0.3456,
            sheet: 0.0,
            turn: 1.0,
        };
        assert_eq!(
            fractions.percentages(),
            SecondaryStructure {
                helix: 34.6,
                sheet: 0.0,
                turn: 100.0
            }
        );
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(-2.5, 0), -2.0);

        let result = analyze(&format!("W{}", "G".repeat(15))).unwrap();
        assert_eq!(result.secondary_structure.helix, 6.2);
        assert_eq!(result.secondary_structure.turn, 93.8);
        let result = analyze(&format!("W{}", "G".repeat(31))).unwrap();
        assert_eq!(result.aromaticity, 0.0312);
    }

    #[test]
    fn properties_are_bounded() {
        for sequence in ["W", "GGGG", "ACDEFGHIKLMNPQRSTVWY", HBA_HUMAN] {
            let properties = ProteinProperties::calculate(sequence).unwrap();
            assert_eq!(properties.sequence_length, sequence.len());
            assert!((0.0..=1.0).contains(&properties.aromaticity));
            let ss = properties.secondary_structure;
            for value in [ss.helix, ss.sheet, ss.turn] {
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn serialized_names() {
        let json = serde_json::to_value(analyze("RR").unwrap()).unwrap();
        assert_eq!(json["stability"], "Unstable");
        assert_eq!(json["sequence_length"], 2);
        assert!(json["secondary_structure"]["turn"].is_number());
    }
}
