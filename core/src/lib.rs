//! Client core for the task-list service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and layers a view controller
//! on top that owns the task collection and the transient UI state.
//!
//! # Design
//! - `TaskClient` is stateless; it holds only `base_url`.
//! - `TaskListController` is the single owner of mutable state. Actions hand
//!   back a `Pending` request; the host executes it and calls `complete`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod controller;
pub mod error;
pub mod filter;
pub mod http;
pub mod types;

pub use client::TaskClient;
pub use controller::{Completion, EditDraft, Pending, Refused, TaskListController, Ticket};
pub use error::{ApiError, Operation};
pub use filter::{Counts, Filter, ParseFilterError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use types::{CreateTask, Task, TaskId, UpdateTask};
