//! The network seam: every upstream request goes through a [`Transport`].

use std::{cell::RefCell, collections::HashMap, time::Duration};

use context_error::{BoxedError, Context, CreateError};
use log::debug;

use crate::ProtScanError;

/// A plain request/response fetcher. Implementations return the full body as text and treat any
/// non-success status as an error.
pub trait Transport {
    /// Fetch the body at the given URL.
    /// # Errors
    /// If the request could not be made, timed out, or the server answered with an error status.
    fn get(&self, url: &str) -> Result<String, BoxedError<'static, ProtScanError>>;

    /// Post the given form (`application/x-www-form-urlencoded`) to the given URL and return the body.
    /// # Errors
    /// If the request could not be made, timed out, or the server answered with an error status.
    fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<String, BoxedError<'static, ProtScanError>>;
}

/// A blocking HTTP(S) transport with a fixed timeout for the whole request.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    verify_certificates: bool,
}

impl HttpTransport {
    /// Create a transport that validates TLS certificates.
    /// # Errors
    /// If the underlying client could not be built (for example no TLS backend is available).
    pub fn new(timeout: Duration) -> Result<Self, BoxedError<'static, ProtScanError>> {
        Self::build(timeout, true)
    }

    /// Create a transport that does not validate TLS certificates. Only used for the endpoints that
    /// are known to be served from misconfigured mirrors.
    /// # Errors
    /// If the underlying client could not be built (for example no TLS backend is available).
    pub fn insecure(timeout: Duration) -> Result<Self, BoxedError<'static, ProtScanError>> {
        Self::build(timeout, false)
    }

    fn build(
        timeout: Duration,
        verify_certificates: bool,
    ) -> Result<Self, BoxedError<'static, ProtScanError>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("protscan/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!verify_certificates)
            .build()
            .map_err(|e| {
                BoxedError::new(
                    ProtScanError::Transport,
                    "Could not create HTTP client",
                    e.to_string(),
                    Context::none(),
                )
            })?;
        Ok(Self {
            client,
            verify_certificates,
        })
    }

    /// If this transport validates TLS certificates
    pub const fn verifies_certificates(&self) -> bool {
        self.verify_certificates
    }

    fn finish(
        url: &str,
        response: reqwest::Result<reqwest::blocking::Response>,
    ) -> Result<String, BoxedError<'static, ProtScanError>> {
        let error = |e: reqwest::Error| {
            BoxedError::new(
                ProtScanError::Transport,
                "Request failed",
                e.to_string(),
                Context::none().source(url).to_owned(),
            )
        };
        response
            .map_err(error)?
            .error_for_status()
            .map_err(error)?
            .text()
            .map_err(error)
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<String, BoxedError<'static, ProtScanError>> {
        debug!("GET {url} (verify certificates: {})", self.verify_certificates);
        Self::finish(url, self.client.get(url).send())
    }

    fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<String, BoxedError<'static, ProtScanError>> {
        debug!("POST {url} (verify certificates: {})", self.verify_certificates);
        Self::finish(url, self.client.post(url).form(form).send())
    }
}

/// A transport answering from a fixed table of URL to response, for offline use and tests.
/// Every requested URL is recorded in order.
#[derive(Debug, Default)]
pub struct CannedTransport {
    responses: HashMap<String, Result<String, String>>,
    requested: RefCell<Vec<String>>,
}

impl CannedTransport {
    /// An empty table, every request fails
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for this exact URL with the given body
    #[must_use]
    pub fn with_response(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Ok(body.into()));
        self
    }

    /// Answer requests for this exact URL with a transport error carrying the given message
    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses.insert(url.into(), Err(message.into()));
        self
    }

    /// All URLs requested so far, in order
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }

    fn answer(&self, url: &str) -> Result<String, BoxedError<'static, ProtScanError>> {
        self.requested.borrow_mut().push(url.to_string());
        match self.responses.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(message)) => Err(BoxedError::new(
                ProtScanError::Transport,
                "Request failed",
                message.clone(),
                Context::none().source(url).to_owned(),
            )),
            None => Err(BoxedError::new(
                ProtScanError::Transport,
                "Request failed",
                "No canned response",
                Context::none().source(url).to_owned(),
            )),
        }
    }
}

impl Transport for CannedTransport {
    fn get(&self, url: &str) -> Result<String, BoxedError<'static, ProtScanError>> {
        self.answer(url)
    }

    fn post_form(
        &self,
        url: &str,
        _form: &[(&str, &str)],
    ) -> Result<String, BoxedError<'static, ProtScanError>> {
        self.answer(url)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<String, BoxedError<'static, ProtScanError>> {
        (**self).get(url)
    }

    fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<String, BoxedError<'static, ProtScanError>> {
        (**self).post_form(url, form)
    }
}
