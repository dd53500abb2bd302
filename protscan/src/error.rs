//! The [`ProtScanError`] kind which makes it easy for downstream users of the error type to match on the failing stage.

use context_error::ErrorKind;

/// The stage of the pipeline an error originates from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ProtScanError {
    /// The sequence record could not be obtained from either transport, or the identifier was invalid
    #[default]
    FetchFailed,
    /// A flat-text record could not be parsed
    InvalidRecord,
    /// The sequence contains characters outside the supported alphabet, or is empty
    InvalidSequence,
    /// No usable structure could be found, downloaded, or parsed
    StructureUnavailable,
    /// A single network request failed
    Transport,
    /// A best effort side report (PFAM, BLAST, chain listing) failed
    SideReport,
    /// A local file could not be read or written
    Io,
    /// A configuration file could not be read or parsed
    Config,
}

impl ErrorKind for ProtScanError {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        "error"
    }
    fn ignored(&self, _settings: Self::Settings) -> bool {
        false
    }
    fn is_error(&self, _settings: Self::Settings) -> bool {
        true
    }
}
