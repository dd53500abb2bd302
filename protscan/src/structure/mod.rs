//! Locating a 3D structure for a protein and extracting its first protein chain.
//!
//! The locator follows a first-match policy throughout: the first PDB cross reference listed for
//! the protein is downloaded, and the first chain holding standard residues is kept. Every failure
//! is reported as a reason string on [`StructureOutcome::Unavailable`], never as an error.

mod chain;

pub use chain::{extract_first_protein_chain, list_chains};

use std::path::Path;

use context_error::*;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{Endpoints, ProtScanError, Transport, fetch::validate_identifier};

const NO_STRUCTURE: &str = "No PDB structure found";
const NO_PROTEIN_CHAIN: &str = "No protein chain found in PDB";

/// A PDB entry cross referenced from a protein record
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct StructureReference {
    /// The PDB identifier, e.g. `1A3N`
    pub structure_id: String,
    /// The first chain named in the `Chains` property (`A/C=2-142` gives `A`), informational only
    pub chain_id: Option<char>,
}

/// A single chain written out as PDB text
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChainDocument {
    /// The PDB identifier the chain was taken from
    pub structure_id: String,
    /// The selected chain
    pub chain_id: String,
    /// The PDB formatted text containing only the selected chain
    pub text: String,
}

/// The result of looking for a structure
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StructureOutcome {
    /// A protein chain was extracted
    Found(ChainDocument),
    /// No structure could be provided, with the reason why
    Unavailable(String),
}

impl StructureOutcome {
    /// The extracted chain, if any
    pub const fn document(&self) -> Option<&ChainDocument> {
        match self {
            Self::Found(document) => Some(document),
            Self::Unavailable(_) => None,
        }
    }

    /// The reason no chain was extracted, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Found(_) => None,
            Self::Unavailable(reason) => Some(reason),
        }
    }
}

#[derive(Deserialize)]
struct UniProtEntry {
    #[serde(rename = "uniProtKBCrossReferences", default)]
    cross_references: Vec<UniProtCrossReference>,
}

#[derive(Deserialize)]
struct UniProtCrossReference {
    #[serde(default)]
    database: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    properties: Vec<UniProtProperty>,
}

#[derive(Deserialize)]
struct UniProtProperty {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: String,
}

/// Parse the PDB cross references out of a UniProtKB JSON entry, in listed order.
/// # Errors
/// If the text is not a JSON object in the UniProtKB entry shape.
pub fn parse_structure_references(
    json: &str,
) -> Result<Vec<StructureReference>, BoxedError<'static, ProtScanError>> {
    let entry: UniProtEntry = serde_json::from_str(json).map_err(|e| {
        BoxedError::small(
            ProtScanError::StructureUnavailable,
            "Invalid UniProt JSON",
            e.to_string(),
        )
    })?;
    Ok(entry
        .cross_references
        .into_iter()
        .filter(|reference| reference.database == "PDB")
        .map(|reference| StructureReference {
            chain_id: reference
                .properties
                .iter()
                .find(|p| p.key == "Chains")
                .and_then(|p| p.value.chars().next())
                .filter(char::is_ascii_alphanumeric),
            structure_id: reference.id,
        })
        .collect())
}

/// Finds, downloads and reduces a structure for a protein. All lookups use the given transport,
/// temporary files go to the scratch directory if one is set.
#[derive(Clone, Copy)]
pub struct StructureLocator<'a> {
    transport: &'a dyn Transport,
    endpoints: &'a Endpoints,
    scratch_dir: Option<&'a Path>,
}

impl std::fmt::Debug for StructureLocator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureLocator")
            .field("endpoints", self.endpoints)
            .field("scratch_dir", &self.scratch_dir)
            .finish_non_exhaustive()
    }
}

impl<'a> StructureLocator<'a> {
    /// Create a locator
    pub fn new(
        transport: &'a dyn Transport,
        endpoints: &'a Endpoints,
        scratch_dir: Option<&'a Path>,
    ) -> Self {
        Self {
            transport,
            endpoints,
            scratch_dir,
        }
    }

    /// Get the PDB cross references for a protein from its UniProtKB JSON entry.
    /// # Errors
    /// If the identifier is invalid, the request failed, or the answer was not a valid entry.
    pub fn structure_references(
        &self,
        identifier: &str,
    ) -> Result<Vec<StructureReference>, BoxedError<'static, ProtScanError>> {
        validate_identifier(identifier)?;
        let json = self
            .transport
            .get(&self.endpoints.uniprot_json_url(identifier))?;
        parse_structure_references(&json)
    }

    /// Find the first listed structure for this protein and extract its first protein chain. This
    /// never fails, any problem is described by the returned reason.
    pub fn locate_and_extract(&self, identifier: &str) -> StructureOutcome {
        let outcome = self.locate(identifier);
        match &outcome {
            StructureOutcome::Found(document) => info!(
                "Extracted chain {} of {} for {identifier}",
                document.chain_id, document.structure_id
            ),
            StructureOutcome::Unavailable(reason) => {
                warn!("No structure for {identifier}: {reason}");
            }
        }
        outcome
    }

    fn locate(&self, identifier: &str) -> StructureOutcome {
        let references = match self.structure_references(identifier) {
            Ok(references) => references,
            Err(error) => return fetch_failure(&error),
        };
        let Some(reference) = references.first() else {
            return StructureOutcome::Unavailable(NO_STRUCTURE.to_string());
        };
        let text = match validate_identifier(&reference.structure_id).and_then(|()| {
            self.transport
                .get(&self.endpoints.rcsb_download_url(&reference.structure_id))
        }) {
            Ok(text) => text,
            Err(error) => return fetch_failure(&error),
        };
        extract_first_protein_chain(&reference.structure_id, &text, self.scratch_dir)
    }
}

fn fetch_failure(error: &BoxedError<'static, ProtScanError>) -> StructureOutcome {
    StructureOutcome::Unavailable(format!(
        "Error fetching PDB: {}",
        error.get_long_description()
    ))
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::CannedTransport;

    const ENTRY: &str = include_str!("../../tests/data/P69905.json");

    #[test]
    fn references_in_order() {
        let references = parse_structure_references(ENTRY).unwrap();
        assert_eq!(
            references,
            [
                StructureReference {
                    structure_id: "1A3N".to_string(),
                    chain_id: Some('A')
                },
                StructureReference {
                    structure_id: "1A00".to_string(),
                    chain_id: Some('A')
                }
            ]
        );
        assert!(parse_structure_references("{}").unwrap().is_empty());
        assert!(parse_structure_references("not json").is_err());
    }

    #[test]
    fn no_references_no_download() {
        let endpoints = Endpoints::default();
        let transport = CannedTransport::new().with_response(
            endpoints.uniprot_json_url("P00000"),
            r#"{"uniProtKBCrossReferences": [{"database": "EMBL", "id": "X1"}]}"#,
        );
        let outcome = StructureLocator::new(&transport, &endpoints, None).locate_and_extract("P00000");
        assert_eq!(
            outcome,
            StructureOutcome::Unavailable("No PDB structure found".to_string())
        );
        assert_eq!(
            transport.requested(),
            ["https://rest.uniprot.org/uniprotkb/P00000?format=json"]
        );
    }

    #[test]
    fn lookup_failure() {
        let endpoints = Endpoints::default();
        let transport = CannedTransport::new()
            .with_failure(endpoints.uniprot_json_url("P69905"), "operation timed out");
        let outcome = StructureLocator::new(&transport, &endpoints, None).locate_and_extract("P69905");
        assert_eq!(
            outcome.reason(),
            Some("Error fetching PDB: operation timed out")
        );
    }

    #[test]
    fn download_failure_uses_first_reference_only() {
        let endpoints = Endpoints::default();
        let transport = CannedTransport::new()
            .with_response(endpoints.uniprot_json_url("P69905"), ENTRY)
            .with_failure(endpoints.rcsb_download_url("1A3N"), "404 Not Found");
        let outcome = StructureLocator::new(&transport, &endpoints, None).locate_and_extract("P69905");
        assert_eq!(outcome.reason(), Some("Error fetching PDB: 404 Not Found"));
        assert!(
            !transport
                .requested()
                .contains(&endpoints.rcsb_download_url("1A00"))
        );
    }

    #[test]
    fn found() {
        let scratch = tempfile::tempdir().unwrap();
        let endpoints = Endpoints::default();
        let transport = CannedTransport::new()
            .with_response(endpoints.uniprot_json_url("P69905"), ENTRY)
            .with_response(
                endpoints.rcsb_download_url("1A3N"),
                include_str!("../../tests/data/three_chains.pdb"),
            );
        let outcome = StructureLocator::new(&transport, &endpoints, Some(scratch.path()))
            .locate_and_extract("P69905");
        let document = outcome.document().unwrap();
        assert_eq!(document.structure_id, "1A3N");
        assert_eq!(document.chain_id, "B");
        assert!(std::fs::read_dir(scratch.path()).unwrap().next().is_none());
    }
}
