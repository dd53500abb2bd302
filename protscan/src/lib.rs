#![doc = include_str!("../README.md")]

pub mod analysis;
pub mod blast;
mod endpoints;
mod error;
mod fetch;
pub mod motif;
pub mod pfam;
mod record;
mod report;
pub mod structure;
mod transport;

pub use analysis::{
    AminoAcid, AnalysisResult, ProteinProperties, SecondaryStructure, Stability, analyze,
};
pub use endpoints::Endpoints;
pub use error::ProtScanError;
pub use fetch::{SequenceFetcher, validate_identifier};
pub use record::{CrossReference, SequenceRecord};
pub use report::{AnalysisReport, Pipeline};
pub use structure::{ChainDocument, StructureLocator, StructureOutcome, StructureReference};
pub use transport::{CannedTransport, HttpTransport, Transport};

/// The types that are needed for most uses of the crate
pub mod prelude {
    pub use crate::{
        AnalysisReport, AnalysisResult, Endpoints, HttpTransport, Pipeline, ProtScanError,
        ProteinProperties, SequenceRecord, StructureOutcome, Transport,
    };
}
