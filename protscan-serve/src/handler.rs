//! Routing and request handling, independent of the HTTP server

use std::path::Path;

use context_error::*;
use log::{error, info};
use protscan::{AnalysisResult, Pipeline, ProtScanError, Transport};
use serde::Serialize;
use serde_json::{Value, json};

const WEBAPP: &str = include_str!("../static/webapp.html");
const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";

/// A complete response, every response allows any origin
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Reply {
    pub(crate) status: u16,
    pub(crate) headers: Vec<(&'static str, &'static str)>,
    pub(crate) body: String,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: String) -> Self {
        Self {
            status,
            headers: vec![
                ("Content-Type", content_type),
                ("Access-Control-Allow-Origin", "*"),
            ],
            body,
        }
    }

    fn json(status: u16, body: &impl Serialize) -> Self {
        match serde_json::to_string(body) {
            Ok(text) => Self::new(status, JSON, text),
            Err(e) => Self::error(500, &e.to_string()),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::new(status, JSON, json!({ "error": message }).to_string())
    }

    fn preflight() -> Self {
        let mut reply = Self::new(204, "text/plain", String::new());
        reply.headers.extend([
            ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
            ("Access-Control-Allow-Headers", "Content-Type"),
        ]);
        reply
    }

    /// The value of a header, if present
    pub(crate) fn header(&self, name: &str) -> Option<&'static str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }
}

#[derive(Serialize)]
struct AnalyzeResponse<'a> {
    uniprot_id: &'a str,
    protein_name: &'a str,
    description: &'a str,
    organism: &'a str,
    sequence: &'a str,
    analysis: AnalysisResult,
    pdb_structure: Option<&'a str>,
    pdb_id: Option<&'a str>,
    pdb_error: Option<&'a str>,
}

/// Handle a single request. The body is the raw request body, or the error that occurred while
/// reading it.
pub(crate) fn handle<Primary: Transport, Fallback: Transport>(
    method: &str,
    url: &str,
    body: Result<&str, &str>,
    pipeline: &Pipeline<Primary, Fallback>,
    static_dir: Option<&Path>,
) -> Reply {
    let path = url.split_once('?').map_or(url, |(path, _)| path);
    match (method, path) {
        ("OPTIONS", _) => Reply::preflight(),
        ("GET", "/") => webapp(static_dir),
        ("POST", "/api/analyze") => match body {
            Ok(body) => analyze(body, pipeline),
            Err(e) => Reply::error(500, e),
        },
        (_, "/" | "/api/analyze") => Reply::error(405, "Method not allowed"),
        _ => Reply::error(404, "Not found"),
    }
}

fn webapp(static_dir: Option<&Path>) -> Reply {
    match static_dir {
        None => Reply::new(200, HTML, WEBAPP.to_string()),
        Some(dir) => std::fs::read_to_string(dir.join("webapp.html")).map_or_else(
            |_| Reply::error(404, "Not found"),
            |page| Reply::new(200, HTML, page),
        ),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn analyze<Primary: Transport, Fallback: Transport>(
    body: &str,
    pipeline: &Pipeline<Primary, Fallback>,
) -> Reply {
    let request: Value = if body.trim().is_empty() {
        json!({})
    } else {
        match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => return Reply::error(500, &e.to_string()),
        }
    };
    // Empty values stand for an empty request, any other non object body cannot be read
    let fields = match request {
        Value::Object(fields) => fields,
        value if is_empty_value(&value) => serde_json::Map::new(),
        value => return Reply::error(500, &format!("Expected a JSON object, got {value}")),
    };
    let Some(identifier) = fields
        .get("uniprot_id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_ascii_uppercase)
    else {
        return Reply::error(400, "UniProt ID is required");
    };

    info!("Analysing {identifier}");
    match pipeline.assemble(&identifier) {
        Ok(report) => {
            let chain = report.structure.document();
            Reply::json(
                200,
                &AnalyzeResponse {
                    uniprot_id: &identifier,
                    protein_name: &report.record.entry_name,
                    description: &report.record.description,
                    organism: &report.record.organism,
                    sequence: &report.record.sequence,
                    analysis: report.analysis(),
                    pdb_structure: chain.map(|c| c.text.as_str()),
                    pdb_id: chain.map(|c| c.structure_id.as_str()),
                    pdb_error: report.structure.reason(),
                },
            )
        }
        Err(e) if e.get_kind() == ProtScanError::FetchFailed => Reply::error(
            400,
            &format!(
                "Invalid UniProt ID or fetch failed: {}",
                e.get_long_description()
            ),
        ),
        Err(e) => {
            error!("Analysis of {identifier} failed: {e}");
            Reply::error(500, &e.get_long_description())
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use protscan::{CannedTransport, Endpoints};

    use super::*;

    const RECORD: &str = include_str!("../../protscan/tests/data/P69905.txt");
    const ENTRY: &str = include_str!("../../protscan/tests/data/P69905.json");
    const STRUCTURE: &str = include_str!("../../protscan/tests/data/three_chains.pdb");

    fn canned() -> CannedTransport {
        let endpoints = Endpoints::default();
        CannedTransport::new()
            .with_response(endpoints.uniprot_text_url("P69905"), RECORD)
            .with_response(endpoints.uniprot_json_url("P69905"), ENTRY)
            .with_response(endpoints.rcsb_download_url("1A3N"), STRUCTURE)
            .with_response(
                endpoints.uniprot_text_url("P00001"),
                "ID   ODD_HUMAN   Reviewed;   4 AA.\nAC   P00001;\nSQ   SEQUENCE   4 AA;\n     MKUX\n//\n",
            )
    }

    fn post(transport: &CannedTransport, body: &str) -> (u16, Value) {
        let pipeline = Pipeline::new(transport, transport, Endpoints::default());
        let reply = handle(
            "POST",
            "/api/analyze",
            Ok(body),
            &pipeline,
            None,
        );
        assert_eq!(reply.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(reply.header("Content-Type"), Some(JSON));
        (reply.status, serde_json::from_str(&reply.body).unwrap())
    }

    #[test]
    fn analyze_hemoglobin() {
        let scratch = tempfile::tempdir().unwrap();
        let transport = canned();
        let pipeline = Pipeline::new(&transport, &transport, Endpoints::default())
            .with_scratch_dir(Some(scratch.path().to_path_buf()));
        let reply = handle(
            "POST",
            "/api/analyze",
            Ok(r#"{"uniprot_id": " p69905 "}"#),
            &pipeline,
            None,
        );
        assert_eq!(reply.status, 200, "{}", reply.body);
        let body: Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(body["uniprot_id"], "P69905");
        assert_eq!(body["protein_name"], "HBA_HUMAN");
        assert_eq!(body["organism"], "Homo sapiens (Human).");
        assert_eq!(body["analysis"]["sequence_length"], 142);
        assert_eq!(body["analysis"]["stability"], "Stable");
        assert_eq!(body["pdb_id"], "1A3N");
        assert!(body["pdb_structure"].as_str().unwrap().contains("ATOM"));
        assert!(body["pdb_error"].is_null());
    }

    #[test]
    fn missing_identifier() {
        let transport = canned();
        for body in [
            "",
            "{}",
            r#"{"uniprot_id": "   "}"#,
            r#"{"uniprot_id": 5}"#,
            "[]",
            "null",
            "false",
            "0",
            "\"\"",
        ] {
            let (status, value) = post(&transport, body);
            assert_eq!(status, 400, "{body}");
            assert_eq!(value["error"], "UniProt ID is required");
        }
        assert!(transport.requested().is_empty());
    }

    #[test]
    fn body_not_an_object() {
        let transport = canned();
        for body in ["\"P69905\"", "42", "true", r#"["P69905"]"#] {
            let (status, value) = post(&transport, body);
            assert_eq!(status, 500, "{body}");
            assert!(
                value["error"]
                    .as_str()
                    .unwrap()
                    .starts_with("Expected a JSON object")
            );
        }
        assert!(transport.requested().is_empty());
    }

    #[test]
    fn fetch_failure() {
        let (status, value) = post(&canned(), r#"{"uniprot_id": "Q00000"}"#);
        assert_eq!(status, 400);
        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid UniProt ID or fetch failed: ")
        );
    }

    #[test]
    fn server_errors() {
        let (status, value) = post(&canned(), "{uniprot_id");
        assert_eq!(status, 500);
        assert!(value["error"].is_string());

        let (status, value) = post(&canned(), r#"{"uniprot_id": "P00001"}"#);
        assert_eq!(status, 500);
        assert!(value["error"].as_str().unwrap().contains("'U'"));
    }

    #[test]
    fn routes() {
        let transport = CannedTransport::new();
        let pipeline = Pipeline::new(&transport, &transport, Endpoints::default());
        let call = |method: &str, url: &str| handle(method, url, Ok(""), &pipeline, None);

        let page = call("GET", "/");
        assert_eq!(page.status, 200);
        assert_eq!(page.header("content-type"), Some(HTML));
        assert!(page.body.contains("/api/analyze"));

        assert_eq!(call("GET", "/?lang=en").status, 200);
        assert_eq!(call("GET", "/api/analyze").status, 405);
        assert_eq!(call("DELETE", "/").status, 405);
        let missing = call("GET", "/favicon.ico");
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body, r#"{"error":"Not found"}"#);

        let preflight = call("OPTIONS", "/api/analyze");
        assert_eq!(preflight.status, 204);
        assert_eq!(preflight.header("Access-Control-Allow-Origin"), Some("*"));
        assert!(preflight.header("Access-Control-Allow-Methods").is_some());
        assert!(transport.requested().is_empty());
    }

    #[test]
    fn static_directory() {
        let dir = tempfile::tempdir().unwrap();
        let transport = CannedTransport::new();
        let pipeline = Pipeline::new(&transport, &transport, Endpoints::default());
        let reply = handle("GET", "/", Ok(""), &pipeline, Some(dir.path()));
        assert_eq!(reply.status, 404);

        std::fs::write(dir.path().join("webapp.html"), "<html>custom</html>").unwrap();
        let reply = handle("GET", "/", Ok(""), &pipeline, Some(dir.path()));
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, "<html>custom</html>");
    }

    #[test]
    fn unreadable_body() {
        let transport = CannedTransport::new();
        let pipeline = Pipeline::new(&transport, &transport, Endpoints::default());
        let reply = handle(
            "POST",
            "/api/analyze",
            Err("stream did not contain valid UTF-8"),
            &pipeline,
            None,
        );
        assert_eq!(reply.status, 500);
    }
}
