//! The 20 standard amino acids with the data needed for the sequence properties

use serde::{Deserialize, Serialize};

/// One of the 20 standard amino acids. The discriminants follow the alphabetical order of the one
/// letter codes, which is the order of the dipeptide instability table.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
pub enum AminoAcid {
    /// Ala, A
    #[default]
    Alanine = 0,
    /// Cys, C
    Cysteine,
    /// Asp, D
    AsparticAcid,
    /// Glu, E
    GlutamicAcid,
    /// Phe, F
    Phenylalanine,
    /// Gly, G
    Glycine,
    /// His, H
    Histidine,
    /// Ile, I
    Isoleucine,
    /// Lys, K
    Lysine,
    /// Leu, L
    Leucine,
    /// Met, M
    Methionine,
    /// Asn, N
    Asparagine,
    /// Pro, P
    Proline,
    /// Gln, Q
    Glutamine,
    /// Arg, R
    Arginine,
    /// Ser, S
    Serine,
    /// Thr, T
    Threonine,
    /// Val, V
    Valine,
    /// Trp, W
    Tryptophan,
    /// Tyr, Y
    Tyrosine,
}

impl AminoAcid {
    /// All amino acids in discriminant order
    pub const ALL: [Self; 20] = [
        Self::Alanine,
        Self::Cysteine,
        Self::AsparticAcid,
        Self::GlutamicAcid,
        Self::Phenylalanine,
        Self::Glycine,
        Self::Histidine,
        Self::Isoleucine,
        Self::Lysine,
        Self::Leucine,
        Self::Methionine,
        Self::Asparagine,
        Self::Proline,
        Self::Glutamine,
        Self::Arginine,
        Self::Serine,
        Self::Threonine,
        Self::Valine,
        Self::Tryptophan,
        Self::Tyrosine,
    ];

    /// The one letter code
    pub const fn one_letter_code(self) -> char {
        match self {
            Self::Alanine => 'A',
            Self::Cysteine => 'C',
            Self::AsparticAcid => 'D',
            Self::GlutamicAcid => 'E',
            Self::Phenylalanine => 'F',
            Self::Glycine => 'G',
            Self::Histidine => 'H',
            Self::Isoleucine => 'I',
            Self::Lysine => 'K',
            Self::Leucine => 'L',
            Self::Methionine => 'M',
            Self::Asparagine => 'N',
            Self::Proline => 'P',
            Self::Glutamine => 'Q',
            Self::Arginine => 'R',
            Self::Serine => 'S',
            Self::Threonine => 'T',
            Self::Valine => 'V',
            Self::Tryptophan => 'W',
            Self::Tyrosine => 'Y',
        }
    }

    /// The average mass of the free amino acid (including one water) in dalton
    pub const fn average_weight(self) -> f64 {
        match self {
            Self::Alanine => 89.0932,
            Self::Cysteine => 121.1582,
            Self::AsparticAcid => 133.1027,
            Self::GlutamicAcid => 147.1293,
            Self::Phenylalanine => 165.1891,
            Self::Glycine => 75.0666,
            Self::Histidine => 155.1546,
            Self::Isoleucine | Self::Leucine => 131.1729,
            Self::Lysine => 146.1876,
            Self::Methionine => 149.2113,
            Self::Asparagine => 132.1179,
            Self::Proline => 115.1305,
            Self::Glutamine => 146.1445,
            Self::Arginine => 174.201,
            Self::Serine => 105.0926,
            Self::Threonine => 119.1192,
            Self::Valine => 117.1463,
            Self::Tryptophan => 204.2252,
            Self::Tyrosine => 181.1885,
        }
    }
}

impl std::fmt::Display for AminoAcid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.one_letter_code())
    }
}

impl TryFrom<char> for AminoAcid {
    type Error = ();
    fn try_from(value: char) -> Result<Self, Self::Error> {
        if value.is_ascii() {
            let num = value as u8;
            num.try_into()
        } else {
            Err(())
        }
    }
}

impl TryFrom<&u8> for AminoAcid {
    type Error = ();
    fn try_from(value: &u8) -> Result<Self, Self::Error> {
        match value {
            b'A' | b'a' => Ok(Self::Alanine),
            b'C' | b'c' => Ok(Self::Cysteine),
            b'D' | b'd' => Ok(Self::AsparticAcid),
            b'E' | b'e' => Ok(Self::GlutamicAcid),
            b'F' | b'f' => Ok(Self::Phenylalanine),
            b'G' | b'g' => Ok(Self::Glycine),
            b'H' | b'h' => Ok(Self::Histidine),
            b'I' | b'i' => Ok(Self::Isoleucine),
            b'K' | b'k' => Ok(Self::Lysine),
            b'L' | b'l' => Ok(Self::Leucine),
            b'M' | b'm' => Ok(Self::Methionine),
            b'N' | b'n' => Ok(Self::Asparagine),
            b'P' | b'p' => Ok(Self::Proline),
            b'Q' | b'q' => Ok(Self::Glutamine),
            b'R' | b'r' => Ok(Self::Arginine),
            b'S' | b's' => Ok(Self::Serine),
            b'T' | b't' => Ok(Self::Threonine),
            b'V' | b'v' => Ok(Self::Valine),
            b'W' | b'w' => Ok(Self::Tryptophan),
            b'Y' | b'y' => Ok(Self::Tyrosine),
            _ => Err(()),
        }
    }
}

impl TryFrom<u8> for AminoAcid {
    type Error = ();
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(&value)
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_in_order() {
        for (index, aa) in AminoAcid::ALL.iter().enumerate() {
            assert_eq!(*aa as usize, index);
            assert_eq!(AminoAcid::try_from(aa.one_letter_code()), Ok(*aa));
            assert_eq!(
                AminoAcid::try_from(aa.one_letter_code().to_ascii_lowercase()),
                Ok(*aa)
            );
        }
    }

    #[test]
    fn non_standard() {
        for c in ['B', 'J', 'O', 'U', 'X', 'Z', '*', '-', 'é'] {
            assert_eq!(AminoAcid::try_from(c), Err(()), "{c}");
        }
    }
}
