//! Remote protein similarity search through the NCBI BLAST URL API.
//!
//! A search is submitted (`CMD=Put`), its status polled (`FORMAT_OBJECT=SearchInfo`) until it is
//! ready, and the results retrieved as XML. The XML is kept as is and can be summarised.

use std::time::Duration;

use context_error::*;
use log::{debug, info};
use roxmltree::{Document, Node, ParsingOptions};
use serde::{Deserialize, Serialize};

use crate::{ProtScanError, Transport};

/// Settings for a single search
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct BlastSettings {
    /// The BLAST program
    pub program: String,
    /// The database to search
    pub database: String,
    /// Time between two status requests
    pub poll_interval: Duration,
    /// Maximal number of status requests before giving up
    pub max_polls: usize,
}

impl Default for BlastSettings {
    fn default() -> Self {
        Self {
            program: "blastp".to_string(),
            database: "nr".to_string(),
            poll_interval: Duration::from_secs(60),
            max_polls: 30,
        }
    }
}

/// The request id and estimated time as given in the `QBlastInfo` block of a submission
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct QueryInfo {
    /// Request id
    pub rid: String,
    /// Estimated seconds until the results are ready
    pub estimated_seconds: u64,
}

/// The status of a submitted search
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum SearchStatus {
    /// Still running
    Waiting,
    /// Results can be retrieved
    Ready,
    /// The search failed on the server
    Failed,
    /// The request id is not known (anymore)
    Unknown,
}

fn qblast_info(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.split_once("QBlastInfoBegin")
        .and_then(|(_, rest)| rest.split_once("QBlastInfoEnd"))
        .map(|(block, _)| block)
        .unwrap_or_default()
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
}

/// Read the request id (`RID`) and estimated time (`RTOE`) from a submission response.
/// # Errors
/// If there is no `QBlastInfo` block with an `RID`.
pub fn parse_query_info(text: &str) -> Result<QueryInfo, BoxedError<'static, ProtScanError>> {
    let mut rid = None;
    let mut estimated_seconds = 0;
    for (key, value) in qblast_info(text) {
        match key {
            "RID" if !value.is_empty() => rid = Some(value.to_string()),
            "RTOE" => estimated_seconds = value.parse().unwrap_or_default(),
            _ => (),
        }
    }
    rid.map(|rid| QueryInfo {
        rid,
        estimated_seconds,
    })
    .ok_or_else(|| {
        BoxedError::small(
            ProtScanError::SideReport,
            "Invalid BLAST submission response",
            "The response does not contain a request id (RID)",
        )
    })
}

/// Read the `Status` from a `SearchInfo` response, `None` if there is no status
pub fn parse_search_status(text: &str) -> Option<SearchStatus> {
    qblast_info(text).find_map(|(key, value)| {
        (key == "Status").then_some(match value {
            "WAITING" => SearchStatus::Waiting,
            "READY" => SearchStatus::Ready,
            "FAILED" => SearchStatus::Failed,
            _ => SearchStatus::Unknown,
        })
    })
}

/// A client for one BLAST endpoint
#[derive(Clone, Copy)]
pub struct BlastClient<'a> {
    transport: &'a dyn Transport,
    endpoint: &'a str,
}

impl std::fmt::Debug for BlastClient<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlastClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl<'a> BlastClient<'a> {
    /// Create a client for the given endpoint, e.g. `https://blast.ncbi.nlm.nih.gov/Blast.cgi`
    pub fn new(transport: &'a dyn Transport, endpoint: &'a str) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    /// The URL of the status request for a request id
    pub fn status_url(&self, rid: &str) -> String {
        format!("{}?CMD=Get&FORMAT_OBJECT=SearchInfo&RID={rid}", self.endpoint)
    }

    /// The URL of the XML results for a request id
    pub fn results_url(&self, rid: &str) -> String {
        format!("{}?CMD=Get&FORMAT_TYPE=XML&RID={rid}", self.endpoint)
    }

    /// Submit a search.
    /// # Errors
    /// If the request failed or the response did not contain a request id.
    pub fn submit(
        &self,
        sequence: &str,
        settings: &BlastSettings,
    ) -> Result<QueryInfo, BoxedError<'static, ProtScanError>> {
        let response = self
            .transport
            .post_form(
                self.endpoint,
                &[
                    ("CMD", "Put"),
                    ("PROGRAM", &settings.program),
                    ("DATABASE", &settings.database),
                    ("QUERY", sequence),
                ],
            )
            .map_err(|e| side_report("Could not submit BLAST search", e))?;
        parse_query_info(&response)
    }

    /// Submit a search, wait for it to finish and return the raw XML results. The `wait` function
    /// is called with the time to wait before the first and between all following status requests.
    /// # Errors
    /// If any request failed, the search failed or is unknown on the server, or the search did not
    /// finish within [`BlastSettings::max_polls`] status requests.
    pub fn search(
        &self,
        sequence: &str,
        settings: &BlastSettings,
        mut wait: impl FnMut(Duration),
    ) -> Result<String, BoxedError<'static, ProtScanError>> {
        let query = self.submit(sequence, settings)?;
        info!(
            "BLAST search submitted as {} (estimated {} s)",
            query.rid, query.estimated_seconds
        );
        wait(Duration::from_secs(query.estimated_seconds));

        for poll in 1..=settings.max_polls {
            let response = self
                .transport
                .get(&self.status_url(&query.rid))
                .map_err(|e| side_report("Could not get BLAST status", e))?;
            match parse_search_status(&response) {
                Some(SearchStatus::Ready) => {
                    return self
                        .transport
                        .get(&self.results_url(&query.rid))
                        .map_err(|e| side_report("Could not get BLAST results", e));
                }
                Some(SearchStatus::Failed) => {
                    return Err(BoxedError::small(
                        ProtScanError::SideReport,
                        "BLAST search failed",
                        format!("The search {} failed on the server", query.rid),
                    ));
                }
                Some(SearchStatus::Unknown) => {
                    return Err(BoxedError::small(
                        ProtScanError::SideReport,
                        "BLAST search failed",
                        format!("The search {} is unknown on the server", query.rid),
                    ));
                }
                Some(SearchStatus::Waiting) | None => {
                    debug!("BLAST search {} not ready after poll {poll}", query.rid);
                    if poll < settings.max_polls {
                        wait(settings.poll_interval);
                    }
                }
            }
        }
        Err(BoxedError::small(
            ProtScanError::SideReport,
            "BLAST search timed out",
            format!(
                "The search {} was not ready after {} status requests",
                query.rid, settings.max_polls
            ),
        ))
    }
}

fn side_report(
    short: &'static str,
    error: BoxedError<'static, ProtScanError>,
) -> BoxedError<'static, ProtScanError> {
    BoxedError::small(
        ProtScanError::SideReport,
        short,
        error.get_long_description().to_string(),
    )
    .add_underlying_errors(vec![error])
}

/// A single database hit
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BlastHit {
    /// The accession of the hit
    pub accession: String,
    /// The definition line of the hit
    pub definition: String,
    /// The lowest e-value over all HSPs of the hit
    pub evalue: Option<f64>,
}

/// The hits of a BLAST XML report, in report order
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BlastSummary {
    /// All hits
    pub hits: Vec<BlastHit>,
}

impl BlastSummary {
    /// Summarise a BLAST XML report.
    /// # Errors
    /// If the text is not valid XML.
    pub fn from_xml(xml: &str) -> Result<Self, BoxedError<'static, ProtScanError>> {
        let document = Document::parse_with_options(
            xml,
            ParsingOptions {
                allow_dtd: true,
                ..Default::default()
            },
        )
        .map_err(|e| {
            BoxedError::small(
                ProtScanError::SideReport,
                "Invalid BLAST XML",
                e.to_string(),
            )
        })?;
        let child_text = |node: Node<'_, '_>, tag: &str| {
            node.children()
                .find(|c| c.has_tag_name(tag))
                .and_then(|c| c.text())
                .unwrap_or_default()
                .trim()
                .to_string()
        };
        let hits = document
            .descendants()
            .filter(|node| node.has_tag_name("Hit"))
            .map(|hit| BlastHit {
                accession: child_text(hit, "Hit_accession"),
                definition: child_text(hit, "Hit_def"),
                evalue: hit
                    .descendants()
                    .filter(|node| node.has_tag_name("Hsp_evalue"))
                    .filter_map(|node| node.text().and_then(|t| t.trim().parse::<f64>().ok()))
                    .reduce(f64::min),
            })
            .collect();
        Ok(Self { hits })
    }

    /// The number of hits
    pub fn hit_count(&self) -> usize {
        self.hits.len()
    }

    /// The first `n` hits
    pub fn top(&self, n: usize) -> &[BlastHit] {
        &self.hits[..n.min(self.hits.len())]
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::CannedTransport;

    const ENDPOINT: &str = "https://blast.ncbi.nlm.nih.gov/Blast.cgi";
    const SUBMITTED: &str = "<html><!--QBlastInfoBegin\n    RID = 7XKPZ6A2016\n    RTOE = 17\nQBlastInfoEnd\n--></html>";
    const WAITING: &str = "<!--QBlastInfoBegin\n\tStatus=WAITING\nQBlastInfoEnd\n-->";
    const READY: &str = "<!--QBlastInfoBegin\n\tStatus=READY\nQBlastInfoEnd\n-->\n<!--QBlastInfoBegin\n\tThereAreHits=yes\nQBlastInfoEnd\n-->";
    const XML: &str = include_str!("../tests/data/blast.xml");

    #[test]
    fn query_info() {
        assert_eq!(
            parse_query_info(SUBMITTED).unwrap(),
            QueryInfo {
                rid: "7XKPZ6A2016".to_string(),
                estimated_seconds: 17
            }
        );
        let error = parse_query_info("<html>Error</html>").unwrap_err();
        assert_eq!(error.get_kind(), ProtScanError::SideReport);
    }

    #[test]
    fn status() {
        assert_eq!(parse_search_status(WAITING), Some(SearchStatus::Waiting));
        assert_eq!(parse_search_status(READY), Some(SearchStatus::Ready));
        assert_eq!(
            parse_search_status("<!--QBlastInfoBegin\n\tStatus=UNKNOWN\nQBlastInfoEnd\n-->"),
            Some(SearchStatus::Unknown)
        );
        assert_eq!(parse_search_status("<html></html>"), None);
    }

    #[test]
    fn search() {
        let client_transport = CannedTransport::new()
            .with_response(ENDPOINT, SUBMITTED)
            .with_response(
                format!("{ENDPOINT}?CMD=Get&FORMAT_OBJECT=SearchInfo&RID=7XKPZ6A2016"),
                READY,
            )
            .with_response(
                format!("{ENDPOINT}?CMD=Get&FORMAT_TYPE=XML&RID=7XKPZ6A2016"),
                XML,
            );
        let mut waited = Vec::new();
        let xml = BlastClient::new(&client_transport, ENDPOINT)
            .search("MVLSPADKTNVKAAW", &BlastSettings::default(), |d| {
                waited.push(d);
            })
            .unwrap();
        assert_eq!(xml, XML);
        assert_eq!(waited, [Duration::from_secs(17)]);
    }

    #[test]
    fn search_times_out() {
        let transport = CannedTransport::new()
            .with_response(ENDPOINT, SUBMITTED)
            .with_response(
                format!("{ENDPOINT}?CMD=Get&FORMAT_OBJECT=SearchInfo&RID=7XKPZ6A2016"),
                WAITING,
            );
        let settings = BlastSettings {
            poll_interval: Duration::from_secs(5),
            max_polls: 3,
            ..BlastSettings::default()
        };
        let mut waited = Vec::new();
        let error = BlastClient::new(&transport, ENDPOINT)
            .search("MVLSPADKTNVKAAW", &settings, |d| waited.push(d))
            .unwrap_err();
        assert_eq!(error.get_short_description(), "BLAST search timed out");
        assert_eq!(
            waited,
            [
                Duration::from_secs(17),
                Duration::from_secs(5),
                Duration::from_secs(5)
            ]
        );
        assert_eq!(transport.requested().len(), 4);
    }

    #[test]
    fn summary() {
        let summary = BlastSummary::from_xml(XML).unwrap();
        assert_eq!(summary.hit_count(), 2);
        assert_eq!(summary.top(1)[0].accession, "P69905");
        assert_eq!(summary.top(1)[0].evalue, Some(1.2e-98));
        assert_eq!(summary.hits[1].definition, "hemoglobin subunit alpha [Pan troglodytes]");
        assert_eq!(summary.top(10).len(), 2);
        assert!(BlastSummary::from_xml("<BlastOutput>").is_err());
    }
}
