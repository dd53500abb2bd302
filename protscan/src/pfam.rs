//! PFAM domain annotation lookup

use context_error::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Endpoints, ProtScanError, Transport};

/// A single annotated region, every field is optional in the upstream JSON
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct DomainRegion {
    /// The region type, e.g. `pfama`
    pub kind: Option<String>,
    /// 1-based start position
    pub start: Option<u64>,
    /// 1-based end position (inclusive)
    pub end: Option<u64>,
}

impl std::fmt::Display for DomainRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: Option<u64>| v.map_or_else(|| "?".to_string(), |v| v.to_string());
        write!(
            f,
            "{} from {} to {}",
            self.kind.as_deref().unwrap_or("?"),
            show(self.start),
            show(self.end)
        )
    }
}

/// Parse the `regions` list of a PFAM protein JSON document. A missing list is no regions.
/// # Errors
/// If the text is not valid JSON.
pub fn parse_regions(json: &str) -> Result<Vec<DomainRegion>, BoxedError<'static, ProtScanError>> {
    let value: Value = serde_json::from_str(json).map_err(|e| {
        BoxedError::small(
            ProtScanError::SideReport,
            "Invalid PFAM JSON",
            e.to_string(),
        )
    })?;
    Ok(value
        .get("regions")
        .and_then(Value::as_array)
        .map(|regions| {
            regions
                .iter()
                .map(|region| DomainRegion {
                    kind: region
                        .get("type")
                        .and_then(Value::as_str)
                        .map(ToString::to_string),
                    start: region.get("start").and_then(position),
                    end: region.get("end").and_then(position),
                })
                .collect()
        })
        .unwrap_or_default())
}

/// Positions are given as numbers or as numeric strings
fn position(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Look up the domains for a UniProt accession.
/// # Errors
/// A [`ProtScanError::SideReport`] error if the request failed or the answer was not valid JSON.
pub fn fetch_domains(
    transport: &dyn Transport,
    endpoints: &Endpoints,
    accession: &str,
) -> Result<Vec<DomainRegion>, BoxedError<'static, ProtScanError>> {
    let url = endpoints.pfam_url(accession);
    let json = transport.get(&url).map_err(|e| {
        BoxedError::new(
            ProtScanError::SideReport,
            "Could not fetch PFAM data",
            e.get_long_description().to_string(),
            Context::none().source(url.clone()).to_owned(),
        )
        .add_underlying_errors(vec![e])
    })?;
    parse_regions(&json)
}
