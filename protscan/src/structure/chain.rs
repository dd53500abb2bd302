//! Selecting and writing out a single protein chain from PDB coordinate text.
//!
//! `pdbtbx` reads files by path, so the downloaded text goes through a named temporary file that
//! is removed when it goes out of scope, on every exit path. The selected chain is written back
//! directly in the fixed column layout of the PDB format.

use std::{io::Write, path::Path};

use context_error::*;
use itertools::Itertools;
use log::debug;
use pdbtbx::{Atom, Chain, Conformer, Format, PDB, PDBError, ReadOptions, Residue, StrictnessLevel};
use tempfile::NamedTempFile;

use super::{ChainDocument, StructureOutcome};
use crate::ProtScanError;

/// Extract the first protein chain of an already downloaded PDB file. Models are scanned in order,
/// then chains in order; the first chain with at least one standard (non `HETATM`) residue is kept
/// and every other chain is removed before writing the structure back to PDB text.
///
/// Temporary files are created in `scratch_dir`, or in the system temporary directory if that is
/// not given, and are always removed before this function returns.
pub fn extract_first_protein_chain(
    structure_id: &str,
    pdb_text: &str,
    scratch_dir: Option<&Path>,
) -> StructureOutcome {
    match extract(structure_id, pdb_text, scratch_dir) {
        Ok(Some(document)) => StructureOutcome::Found(document),
        Ok(None) => StructureOutcome::Unavailable(super::NO_PROTEIN_CHAIN.to_string()),
        Err(error) => StructureOutcome::Unavailable(format!(
            "Error parsing PDB: {}",
            error.get_long_description()
        )),
    }
}

/// List the `(model serial number, chain id)` pairs of a PDB file in file order.
/// # Errors
/// If the file could not be parsed.
pub fn list_chains(path: &Path) -> Result<Vec<(usize, String)>, BoxedError<'static, ProtScanError>> {
    let pdb = read_pdb(path)?;
    Ok(pdb
        .models()
        .flat_map(|model| {
            model
                .chains()
                .map(move |chain| (model.serial_number(), chain.id().to_string()))
        })
        .collect())
}

/// The id of the first chain containing a standard polymer residue, scanning stops at the first hit
fn first_protein_chain(pdb: &PDB) -> Option<String> {
    pdb.models()
        .flat_map(|model| model.chains())
        .find(|chain| {
            chain
                .residues()
                .any(|residue| residue.atoms().any(|atom| !atom.hetero()))
        })
        .map(|chain| chain.id().to_string())
}

fn extract(
    structure_id: &str,
    pdb_text: &str,
    scratch_dir: Option<&Path>,
) -> Result<Option<ChainDocument>, BoxedError<'static, ProtScanError>> {
    let dir = scratch_dir.map_or_else(std::env::temp_dir, Path::to_path_buf);

    let mut input = scratch_file(&dir)?;
    let written = input
        .write_all(pdb_text.as_bytes())
        .and_then(|()| input.flush());
    written.map_err(|e| io_error("Could not write temporary PDB file", &e, input.path()))?;
    let mut pdb = read_pdb(input.path())?;

    let Some(chain_id) = first_protein_chain(&pdb) else {
        return Ok(None);
    };
    debug!("Selected chain {chain_id} of {structure_id}");
    pdb.remove_chains_by(|chain| chain.id() != chain_id);

    Ok(Some(ChainDocument {
        structure_id: structure_id.to_string(),
        chain_id,
        text: write_pdb(&pdb),
    }))
}

/// Write the coordinate records of a structure as PDB text. Models are only delimited by
/// `MODEL`/`ENDMDL` when there is more than one of them.
fn write_pdb(pdb: &PDB) -> String {
    let multiple_models = pdb.model_count() > 1;
    let mut text = String::new();
    for model in pdb.models().filter(|model| model.chain_count() > 0) {
        if multiple_models {
            text.push_str(&format!("MODEL     {:>4}\n", model.serial_number()));
        }
        for chain in model.chains() {
            write_chain(&mut text, chain);
        }
        if multiple_models {
            text.push_str("ENDMDL\n");
        }
    }
    text.push_str("END\n");
    text
}

/// Write the atoms of a chain in order, with a `TER` record after the last polymer atom
fn write_chain(text: &mut String, chain: &Chain) {
    let atoms: Vec<(&Residue, &Conformer, &Atom)> = chain
        .residues()
        .flat_map(|residue| {
            residue.conformers().flat_map(move |conformer| {
                conformer.atoms().map(move |atom| (residue, conformer, atom))
            })
        })
        .collect();
    let last_polymer = atoms.iter().rposition(|(_, _, atom)| !atom.hetero());

    for (index, (residue, conformer, atom)) in atoms.iter().enumerate() {
        text.push_str(&atom_record(chain.id(), residue, conformer, atom));
        if Some(index) == last_polymer {
            text.push_str(&format!(
                "TER   {:>5}      {:>3} {}{:>4}{}\n",
                atom.serial_number() + 1,
                conformer.name(),
                chain.id(),
                residue.serial_number(),
                residue.insertion_code().unwrap_or(" "),
            ));
        }
    }
}

/// A single `ATOM` or `HETATM` line, 80 columns wide
fn atom_record(chain_id: &str, residue: &Residue, conformer: &Conformer, atom: &Atom) -> String {
    let element = atom
        .element()
        .map_or_else(String::new, |element| element.symbol().to_ascii_uppercase());
    // Names of one letter elements start in column 14, two letter elements in column 13
    let name = if atom.name().len() < 4 && element.len() < 2 {
        format!(" {:<3}", atom.name())
    } else {
        format!("{:<4}", atom.name())
    };
    format!(
        "{:<6}{:>5} {name}{}{:>3} {chain_id}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {element:>2}{:<2}\n",
        if atom.hetero() { "HETATM" } else { "ATOM" },
        atom.serial_number(),
        conformer.alternative_location().unwrap_or(" "),
        conformer.name(),
        residue.serial_number(),
        residue.insertion_code().unwrap_or(" "),
        atom.x(),
        atom.y(),
        atom.z(),
        atom.occupancy(),
        atom.b_factor(),
        atom.pdb_charge(),
    )
}

fn read_pdb(path: &Path) -> Result<PDB, BoxedError<'static, ProtScanError>> {
    let (pdb, warnings) = ReadOptions::default()
        .set_format(Format::Pdb)
        .set_level(StrictnessLevel::Loose)
        .read(path.to_string_lossy())
        .map_err(|errors| pdb_errors("Could not parse PDB file", &errors, path))?;
    if !warnings.is_empty() {
        debug!(
            "{} warnings while parsing {}",
            warnings.len(),
            path.to_string_lossy()
        );
    }
    Ok(pdb)
}

fn scratch_file(dir: &Path) -> Result<NamedTempFile, BoxedError<'static, ProtScanError>> {
    tempfile::Builder::new()
        .prefix("protscan-")
        .suffix(".pdb")
        .tempfile_in(dir)
        .map_err(|e| io_error("Could not create temporary PDB file", &e, dir))
}

fn io_error(short: &str, error: &std::io::Error, path: &Path) -> BoxedError<'static, ProtScanError> {
    BoxedError::new(
        ProtScanError::Io,
        short.to_string(),
        error.to_string(),
        Context::none().source(path.to_string_lossy()).to_owned(),
    )
}

fn pdb_errors(short: &str, errors: &[PDBError], path: &Path) -> BoxedError<'static, ProtScanError> {
    BoxedError::new(
        ProtScanError::StructureUnavailable,
        short.to_string(),
        errors
            .iter()
            .map(|e| format!("{}: {}", e.short_description(), e.long_description()))
            .join("; "),
        Context::none().source(path.to_string_lossy()).to_owned(),
    )
}
