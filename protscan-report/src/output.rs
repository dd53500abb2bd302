//! Files written by a report run

use std::path::{Path, PathBuf};

use context_error::*;
use protscan::{
    Endpoints, ProtScanError, ProteinProperties, SecondaryStructure, Transport,
    validate_identifier,
};
use serde::{Deserialize, Serialize};

/// The unrounded analysis as saved to `analysis_results.json`
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct SavedAnalysis {
    pub(crate) uniprot_id: String,
    pub(crate) sequence_length: usize,
    pub(crate) molecular_weight: f64,
    pub(crate) isoelectric_point: f64,
    pub(crate) aromaticity: f64,
    pub(crate) instability_index: f64,
    pub(crate) secondary_structure: SecondaryStructure,
}

impl SavedAnalysis {
    pub(crate) fn new(uniprot_id: &str, properties: &ProteinProperties) -> Self {
        Self {
            uniprot_id: uniprot_id.to_string(),
            sequence_length: properties.sequence_length,
            molecular_weight: properties.molecular_weight,
            isoelectric_point: properties.isoelectric_point,
            aromaticity: properties.aromaticity,
            instability_index: properties.instability_index,
            secondary_structure: properties.secondary_structure,
        }
    }
}

/// Write `contents` to `dir/name`, creating the directory if needed
pub(crate) fn write_file(
    dir: &Path,
    name: &str,
    contents: &str,
) -> Result<PathBuf, BoxedError<'static, ProtScanError>> {
    let path = dir.join(name);
    std::fs::create_dir_all(dir)
        .and_then(|()| std::fs::write(&path, contents))
        .map_err(|e| {
            BoxedError::new(
                ProtScanError::Io,
                "Could not write file",
                e.to_string(),
                Context::none().source(path.to_string_lossy()).to_owned(),
            )
        })?;
    Ok(path)
}

/// Save the analysis as pretty printed JSON
pub(crate) fn save_analysis(
    dir: &Path,
    analysis: &SavedAnalysis,
) -> Result<PathBuf, BoxedError<'static, ProtScanError>> {
    let json = serde_json::to_string_pretty(analysis).map_err(|e| {
        BoxedError::small(
            ProtScanError::Io,
            "Could not serialise the analysis",
            e.to_string(),
        )
    })?;
    write_file(dir, "analysis_results.json", &json)
}

/// Download a PDB entry to `dir/pdb<id>.ent`, the id in lowercase
pub(crate) fn download_structure(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    structure_id: &str,
    dir: &Path,
) -> Result<PathBuf, BoxedError<'static, ProtScanError>> {
    validate_identifier(structure_id)?;
    let text = transport.get(&endpoints.rcsb_download_url(structure_id))?;
    write_file(
        dir,
        &format!("pdb{}.ent", structure_id.to_ascii_lowercase()),
        &text,
    )
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use protscan::CannedTransport;

    use super::*;

    #[test]
    fn analysis_file() {
        let dir = tempfile::tempdir().unwrap();
        let properties = ProteinProperties::calculate("MKWVTFISLLLLFSSAYS").unwrap();
        let path = save_analysis(
            &dir.path().join("results"),
            &SavedAnalysis::new("P02768", &properties),
        )
        .unwrap();
        assert!(path.ends_with("results/analysis_results.json"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"uniprot_id\": \"P02768\""));
        let saved: SavedAnalysis = serde_json::from_str(&text).unwrap();
        assert_eq!(saved.sequence_length, 18);
        assert!((saved.aromaticity - properties.aromaticity).abs() < 1e-12);
        assert!(saved.secondary_structure.helix < 1.0);
    }

    #[test]
    fn structure_download() {
        let dir = tempfile::tempdir().unwrap();
        let endpoints = Endpoints::default();
        let transport = CannedTransport::new()
            .with_response(endpoints.rcsb_download_url("1A3N"), "END\n");
        let path = download_structure(&transport, &endpoints, "1A3N", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("pdb1a3n.ent"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "END\n");

        assert!(download_structure(&transport, &endpoints, "2XYZ", dir.path()).is_err());
        assert!(!dir.path().join("pdb2xyz.ent").exists());
    }
}
