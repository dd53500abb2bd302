//! Combining the sequence record, its properties and a structure into one report.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use context_error::*;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    AnalysisResult, Endpoints, HttpTransport, ProtScanError, ProteinProperties, SequenceFetcher,
    SequenceRecord, StructureLocator, StructureOutcome, Transport,
};

/// Everything known about one protein. Only the sequence is required, a missing structure is
/// carried as a reason.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// The identifier as requested
    pub identifier: String,
    /// The parsed record
    pub record: SequenceRecord,
    /// The unrounded sequence properties
    pub properties: ProteinProperties,
    /// The extracted chain, or why there is none
    pub structure: StructureOutcome,
}

impl AnalysisReport {
    /// The rounded sequence properties
    pub fn analysis(&self) -> AnalysisResult {
        self.properties.rounded()
    }
}

/// The configured set of collaborators used to build reports. The primary transport validates
/// certificates and is used for the main record request and BLAST, the fallback transport is used
/// for the legacy record request, the cross reference lookup, the PDB download and PFAM.
#[derive(Debug)]
pub struct Pipeline<Primary: Transport = HttpTransport, Fallback: Transport = HttpTransport> {
    primary: Primary,
    fallback: Fallback,
    endpoints: Endpoints,
    scratch_dir: Option<PathBuf>,
}

impl Pipeline {
    /// A pipeline over HTTP(S) with the given timeout per request.
    /// # Errors
    /// If the HTTP clients could not be created.
    pub fn http(
        timeout: Duration,
        endpoints: Endpoints,
    ) -> Result<Self, BoxedError<'static, ProtScanError>> {
        Ok(Self::new(
            HttpTransport::new(timeout)?,
            HttpTransport::insecure(timeout)?,
            endpoints,
        ))
    }
}

impl<Primary: Transport, Fallback: Transport> Pipeline<Primary, Fallback> {
    /// Create a pipeline from two transports
    pub fn new(primary: Primary, fallback: Fallback, endpoints: Endpoints) -> Self {
        Self {
            primary,
            fallback,
            endpoints,
            scratch_dir: None,
        }
    }

    /// Place temporary files in this directory instead of the system temporary directory
    #[must_use]
    pub fn with_scratch_dir(self, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            scratch_dir,
            ..self
        }
    }

    /// The scratch directory for temporary files, if set
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch_dir.as_deref()
    }

    /// The record fetcher
    pub fn fetcher(&self) -> SequenceFetcher<'_> {
        SequenceFetcher::new(&self.primary, &self.fallback, &self.endpoints)
    }

    /// The structure locator
    pub fn locator(&self) -> StructureLocator<'_> {
        StructureLocator::new(&self.fallback, &self.endpoints, self.scratch_dir())
    }

    /// Build the full report for one identifier. The structure branch never fails the report.
    /// # Errors
    /// * [`ProtScanError::FetchFailed`] if the record could not be obtained.
    /// * [`ProtScanError::InvalidSequence`] if the record's sequence could not be analysed.
    pub fn assemble(&self, identifier: &str) -> Result<AnalysisReport, BoxedError<'static, ProtScanError>> {
        let record = self.fetcher().fetch(identifier)?;
        info!(
            "Fetched {identifier} ({}, {} residues)",
            record.entry_name,
            record.sequence.len()
        );
        let properties = ProteinProperties::calculate(&record.sequence)?;
        let structure = self.locator().locate_and_extract(identifier);
        Ok(AnalysisReport {
            identifier: identifier.to_string(),
            record,
            properties,
            structure,
        })
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::CannedTransport;

    #[test]
    fn invalid_sequence_is_not_a_fetch_failure() {
        let endpoints = Endpoints::default();
        let text = "ID   ODD_HUMAN   Reviewed;   4 AA.\nAC   P00001;\nSQ   SEQUENCE   4 AA;\n     MKUX\n//\n";
        let transport = CannedTransport::new().with_response(endpoints.uniprot_text_url("P00001"), text);
        let pipeline = Pipeline::new(&transport, &transport, endpoints);
        let error = pipeline.assemble("P00001").unwrap_err();
        assert_eq!(error.get_kind(), ProtScanError::InvalidSequence);
        assert_eq!(transport.requested().len(), 1);
    }

    #[test]
    fn structure_failure_keeps_analysis() {
        let endpoints = Endpoints::default();
        let text = "ID   TINY_HUMAN   Reviewed;   5 AA.\nAC   P00002;\nSQ   SEQUENCE   5 AA;\n     MKVLA\n//\n";
        let transport = CannedTransport::new().with_response(endpoints.uniprot_text_url("P00002"), text);
        let pipeline = Pipeline::new(&transport, &transport, endpoints);
        let report = pipeline.assemble("P00002").unwrap();
        assert_eq!(report.analysis().sequence_length, 5);
        assert!(
            report
                .structure
                .reason()
                .unwrap()
                .starts_with("Error fetching PDB: ")
        );
    }
}
