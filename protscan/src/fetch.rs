//! Obtaining a [`SequenceRecord`] for an identifier, with a single fallback transport.

use context_error::*;
use log::{info, warn};

use crate::{Endpoints, ProtScanError, SequenceRecord, Transport};

/// Check that an identifier only contains ASCII letters, digits, `-` and `_`, so that it can be
/// placed in a URL as is.
/// # Errors
/// If the identifier is empty or contains any other character.
pub fn validate_identifier(identifier: &str) -> Result<(), BoxedError<'static, ProtScanError>> {
    if identifier.is_empty() {
        return Err(BoxedError::small(
            ProtScanError::FetchFailed,
            "Invalid identifier",
            "Identifier is empty",
        ));
    }
    if let Some((index, _)) = identifier
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(BoxedError::new(
            ProtScanError::FetchFailed,
            "Invalid identifier",
            "Identifier contains invalid characters",
            Context::line(None, identifier, index, 1).to_owned(),
        ));
    }
    Ok(())
}

/// Fetches flat-text records, first over the primary transport and on any failure once over the
/// fallback transport.
#[derive(Clone, Copy)]
pub struct SequenceFetcher<'a> {
    primary: &'a dyn Transport,
    fallback: &'a dyn Transport,
    endpoints: &'a Endpoints,
}

impl std::fmt::Debug for SequenceFetcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceFetcher")
            .field("endpoints", self.endpoints)
            .finish_non_exhaustive()
    }
}

impl<'a> SequenceFetcher<'a> {
    /// Create a fetcher. The primary transport is used against [`Endpoints::uniprot_text`] and the
    /// fallback against [`Endpoints::uniprot_legacy_text`].
    pub fn new(
        primary: &'a dyn Transport,
        fallback: &'a dyn Transport,
        endpoints: &'a Endpoints,
    ) -> Self {
        Self {
            primary,
            fallback,
            endpoints,
        }
    }

    /// Fetch and parse the record for this identifier.
    /// # Errors
    /// A [`ProtScanError::FetchFailed`] error if the identifier is invalid or if both transports
    /// failed. In the latter case the long description names both causes and both are attached as
    /// underlying errors.
    pub fn fetch(&self, identifier: &str) -> Result<SequenceRecord, BoxedError<'static, ProtScanError>> {
        validate_identifier(identifier)?;

        let primary = match Self::attempt(self.primary, &self.endpoints.uniprot_text_url(identifier)) {
            Ok(record) => return Ok(record),
            Err(error) => error,
        };
        warn!(
            "Primary UniProt fetch for {identifier} failed, trying the legacy endpoint: {}: {}",
            primary.get_short_description(),
            primary.get_long_description()
        );

        match Self::attempt(
            self.fallback,
            &self.endpoints.uniprot_legacy_text_url(identifier),
        ) {
            Ok(record) => {
                info!("Fetched {identifier} from the legacy endpoint");
                Ok(record)
            }
            Err(fallback) => Err(BoxedError::new(
                ProtScanError::FetchFailed,
                "Could not fetch UniProt record",
                format!(
                    "primary: {}: {}; fallback: {}: {}",
                    primary.get_short_description(),
                    primary.get_long_description(),
                    fallback.get_short_description(),
                    fallback.get_long_description()
                ),
                Context::none().source(identifier).to_owned(),
            )
            .add_underlying_errors(vec![primary, fallback])),
        }
    }

    fn attempt(
        transport: &dyn Transport,
        url: &str,
    ) -> Result<SequenceRecord, BoxedError<'static, ProtScanError>> {
        transport
            .get(url)
            .and_then(|text| SequenceRecord::parse_swissprot(&text))
    }
}
