//! Upstream URL templates, overridable from a JSON configuration file.

use std::path::Path;

use context_error::{BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};

use crate::ProtScanError;

/// Every upstream URL used by the pipeline. Templates contain an `{id}` placeholder that is
/// replaced by the (already validated) identifier. Missing keys in a configuration file fall back
/// to the public defaults.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Endpoints {
    /// Primary flat-text UniProtKB record
    pub uniprot_text: String,
    /// Fallback flat-text UniProtKB record on the legacy host
    pub uniprot_legacy_text: String,
    /// UniProtKB JSON record, used for the PDB cross references
    pub uniprot_json: String,
    /// RCSB PDB coordinate file download
    pub rcsb_download: String,
    /// PFAM domain annotation
    pub pfam: String,
    /// NCBI BLAST URL API, no placeholder
    pub blast: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            uniprot_text: "https://rest.uniprot.org/uniprotkb/{id}.txt".to_string(),
            uniprot_legacy_text: "https://www.uniprot.org/uniprot/{id}.txt".to_string(),
            uniprot_json: "https://rest.uniprot.org/uniprotkb/{id}?format=json".to_string(),
            rcsb_download: "https://files.rcsb.org/download/{id}.pdb".to_string(),
            pfam: "https://pfam.xfam.org/protein/{id}?output=json".to_string(),
            blast: "https://blast.ncbi.nlm.nih.gov/Blast.cgi".to_string(),
        }
    }
}

impl Endpoints {
    /// Read endpoint overrides from a JSON file.
    /// # Errors
    /// If the file could not be read or is not a valid JSON object of endpoint templates.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BoxedError<'static, ProtScanError>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BoxedError::new(
                ProtScanError::Config,
                "Could not read endpoint configuration",
                e.to_string(),
                Context::none().source(path.to_string_lossy()).to_owned(),
            )
        })?;
        serde_json::from_str(&text).map_err(|e| {
            BoxedError::new(
                ProtScanError::Config,
                "Invalid endpoint configuration",
                e.to_string(),
                Context::none().source(path.to_string_lossy()).to_owned(),
            )
        })
    }

    /// The primary flat-text record URL for this identifier
    pub fn uniprot_text_url(&self, id: &str) -> String {
        fill(&self.uniprot_text, id)
    }

    /// The fallback flat-text record URL for this identifier
    pub fn uniprot_legacy_text_url(&self, id: &str) -> String {
        fill(&self.uniprot_legacy_text, id)
    }

    /// The JSON record URL for this identifier
    pub fn uniprot_json_url(&self, id: &str) -> String {
        fill(&self.uniprot_json, id)
    }

    /// The coordinate file URL for this structure
    pub fn rcsb_download_url(&self, structure_id: &str) -> String {
        fill(&self.rcsb_download, structure_id)
    }

    /// The domain annotation URL for this accession
    pub fn pfam_url(&self, accession: &str) -> String {
        fill(&self.pfam, accession)
    }
}

fn fill(template: &str, id: &str) -> String {
    template.replace("{id}", id)
}
