//! Blocking HTTP executor for core requests.
//!
//! ureq is configured to hand back 4xx/5xx responses as data, leaving status
//! interpretation to the core client. Only failures to complete the exchange
//! surface as errors here.

use std::time::Duration;

use task_core::{HttpMethod, HttpRequest, HttpResponse};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Transport {
    agent: ureq::Agent,
}

impl Transport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn execute(&self, req: HttpRequest) -> Result<HttpResponse, ureq::Error> {
        debug!(method = %req.method, url = %req.url, "sending request");
        let mut response = match (req.method, req.body) {
            (HttpMethod::Get, _) => self.agent.get(&req.url).call(),
            (HttpMethod::Delete, _) => self.agent.delete(&req.url).call(),
            (HttpMethod::Post, Some(body)) => self
                .agent
                .post(&req.url)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Post, None) => self.agent.post(&req.url).send_empty(),
            (HttpMethod::Put, Some(body)) => self
                .agent
                .put(&req.url)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Put, None) => self.agent.put(&req.url).send_empty(),
        }?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        debug!(status, "response received");
        Ok(HttpResponse::new(status, body))
    }
}
