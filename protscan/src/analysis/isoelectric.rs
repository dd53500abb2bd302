//! Isoelectric point by charge balance, using the Bjellqvist pKa values with terminal residue
//! specific overrides.

use super::AminoAcid;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ChargeClass {
    Positive,
    Negative,
}

const N_TERMINAL_PKA: f64 = 9.0;
const C_TERMINAL_PKA: f64 = 2.0;

/// The side chain charge class and pKa, if the side chain is ionizable
const fn side_chain(aa: AminoAcid) -> Option<(ChargeClass, f64)> {
    match aa {
        AminoAcid::Lysine => Some((ChargeClass::Positive, 10.0)),
        AminoAcid::Arginine => Some((ChargeClass::Positive, 12.0)),
        AminoAcid::Histidine => Some((ChargeClass::Positive, 5.98)),
        AminoAcid::AsparticAcid => Some((ChargeClass::Negative, 4.05)),
        AminoAcid::GlutamicAcid => Some((ChargeClass::Negative, 4.45)),
        AminoAcid::Cysteine => Some((ChargeClass::Negative, 9.0)),
        AminoAcid::Tyrosine => Some((ChargeClass::Negative, 10.0)),
        _ => None,
    }
}

/// The pKa of the free amine when this residue is at the N-terminus
const fn n_terminal(aa: AminoAcid) -> f64 {
    match aa {
        AminoAcid::Alanine => 7.59,
        AminoAcid::Methionine => 7.0,
        AminoAcid::Serine => 6.93,
        AminoAcid::Proline => 8.36,
        AminoAcid::Threonine => 6.82,
        AminoAcid::Valine => 7.44,
        AminoAcid::GlutamicAcid => 7.7,
        _ => N_TERMINAL_PKA,
    }
}

/// The pKa of the free carboxyl when this residue is at the C-terminus
const fn c_terminal(aa: AminoAcid) -> f64 {
    match aa {
        AminoAcid::AsparticAcid => 4.55,
        AminoAcid::GlutamicAcid => 4.75,
        _ => C_TERMINAL_PKA,
    }
}

/// Get the isoelectric point of the sequence, or None if the sequence is empty.
///
/// The net charge is balanced by bisection between pH 4.05 and 12, starting at pH 7.775, until
/// the interval is at most 0.0001 wide.
pub(super) fn isoelectric_point(sequence: &[AminoAcid]) -> Option<f64> {
    const EPSILON: f64 = 0.0001;

    let first = sequence.first()?;
    let last = sequence.last()?;

    let mut ionizable = Vec::with_capacity(sequence.len() + 2);
    ionizable.push((ChargeClass::Positive, n_terminal(*first)));
    ionizable.push((ChargeClass::Negative, c_terminal(*last)));
    ionizable.extend(sequence.iter().filter_map(|aa| side_chain(*aa)));

    let mut low = 4.05;
    let mut high = 12.0;
    let mut pi = 7.775;

    #[allow(clippy::while_float)]
    while (high - low) > EPSILON {
        if calculate_charge(pi, &ionizable) > 0.0 {
            low = pi;
        } else {
            high = pi;
        }
        pi = (low + high) / 2.0;
    }

    Some(pi)
}

#[allow(non_snake_case)]
fn calculate_charge(pH: f64, ionizable: &[(ChargeClass, f64)]) -> f64 {
    let mut charge = 0.0;

    for (class, pka) in ionizable {
        match class {
            ChargeClass::Positive => charge += 1.0 / (10.0_f64.powf(pH - pka) + 1.0),
            ChargeClass::Negative => charge -= 1.0 / (10.0_f64.powf(pka - pH) + 1.0),
        }
    }

    charge
}
