//! Stateless HTTP request builder and response parser for the task API.
//!
//! # Design
//! `TaskClient` holds only a `base_url`. Each CRUD operation is split into a
//! `build_*` method producing an `HttpRequest` and a `parse_*` method
//! consuming an `HttpResponse`. Any 2xx status is success; anything else
//! becomes `ApiError::RequestFailed` before the body is looked at. Task ids
//! are opaque, so they are percent-encoded as a single path segment.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, Operation};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTask, Task, TaskId, UpdateTask};

/// Characters that may not appear raw inside one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Stateless client for the task API.
#[derive(Debug, Clone)]
pub struct TaskClient {
    base_url: String,
}

impl TaskClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/tasks", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create(&self, title: &str) -> Result<HttpRequest, ApiError> {
        let input = CreateTask {
            title: title.to_string(),
        };
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/tasks", self.base_url),
            headers: json_headers(),
            body: Some(encode(Operation::Create, &input)?),
        })
    }

    pub fn build_update(&self, id: &TaskId, input: &UpdateTask) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            url: self.task_url(id),
            headers: json_headers(),
            body: Some(encode(Operation::Update, input)?),
        })
    }

    pub fn build_remove(&self, id: &TaskId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.task_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<Task>, ApiError> {
        decode(Operation::List, response)
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<Task, ApiError> {
        decode(Operation::Create, response)
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<Task, ApiError> {
        decode(Operation::Update, response)
    }

    /// The delete response body is ignored.
    pub fn parse_remove(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(Operation::Delete, &response)
    }

    fn task_url(&self, id: &TaskId) -> String {
        let segment = id.to_string();
        format!(
            "{}/tasks/{}",
            self.base_url,
            utf8_percent_encode(&segment, PATH_SEGMENT)
        )
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn encode<T: Serialize>(op: Operation, input: &T) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::Serialization {
        op,
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(op: Operation, response: HttpResponse) -> Result<T, ApiError> {
    check_status(op, &response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization {
        op,
        message: e.to_string(),
    })
}

fn check_status(op: Operation, response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::RequestFailed {
        op,
        status: response.status,
    })
}
