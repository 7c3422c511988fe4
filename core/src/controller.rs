//! View controller for the task list.
//!
//! # Design
//! `TaskListController` owns the task collection plus the transient view
//! state and never performs I/O. A user action either gets refused, gets
//! handled locally, or yields a `Pending` request. The host executes the
//! request and hands the outcome back through `complete`, together with the
//! `Ticket` that came with it. Nothing is applied to the collection until the
//! server has answered, so failures never need a rollback.
//!
//! A single `busy_id` slot and a single edit slot cover the whole list. The
//! initial load is tagged with a mount generation; its result is dropped if the
//! controller was unmounted or re-mounted in the meantime.

use thiserror::Error;
use tracing::{debug, warn};

use crate::client::TaskClient;
use crate::error::{ApiError, Operation};
use crate::filter::{Counts, Filter};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Task, TaskId, UpdateTask};

/// Why an action did not produce a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Refused {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("still loading")]
    Loading,
    #[error("another task is busy")]
    Busy,
    #[error("no such task")]
    UnknownTask,
    #[error("no task is being edited")]
    NotEditing,
    #[error("request could not be built: {0}")]
    Build(ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TicketKind {
    Load { generation: u64 },
    Create,
    Toggle(TaskId),
    Rename(TaskId),
    Delete(TaskId),
}

/// Identifies which action an in-flight request belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket(TicketKind);

impl Ticket {
    pub fn operation(&self) -> Operation {
        match self.0 {
            TicketKind::Load { .. } => Operation::List,
            TicketKind::Create => Operation::Create,
            TicketKind::Toggle(_) | TicketKind::Rename(_) => Operation::Update,
            TicketKind::Delete(_) => Operation::Delete,
        }
    }

    /// Wraps a host-side failure to reach the server.
    pub fn transport_error(&self, message: impl Into<String>) -> ApiError {
        ApiError::Transport {
            op: self.operation(),
            message: message.into(),
        }
    }
}

/// A request the host must execute, paired with its ticket.
#[derive(Debug, Clone)]
pub struct Pending {
    pub request: HttpRequest,
    pub ticket: Ticket,
}

/// What `complete` did with an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed(String),
    /// A load that outlived its mount generation.
    Discarded,
}

/// Inline-edit slot: the task being edited and its draft title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub id: TaskId,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct TaskListController {
    client: TaskClient,
    tasks: Vec<Task>,
    loading: bool,
    busy_id: Option<TaskId>,
    error: String,
    filter: Filter,
    editing: Option<EditDraft>,
    new_title: String,
    mounted: bool,
    generation: u64,
}

impl TaskListController {
    pub fn new(client: TaskClient) -> Self {
        Self {
            client,
            tasks: Vec::new(),
            loading: false,
            busy_id: None,
            error: String::new(),
            filter: Filter::All,
            editing: None,
            new_title: String::new(),
            mounted: false,
            generation: 0,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks passing the active filter, in collection order.
    pub fn visible(&self) -> Vec<&Task> {
        self.filter.apply(&self.tasks)
    }

    pub fn counts(&self) -> Counts {
        Counts::of(&self.tasks)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn busy_id(&self) -> Option<&TaskId> {
        self.busy_id.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy_id.is_some()
    }

    /// Last failure message, or empty.
    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn editing(&self) -> Option<&EditDraft> {
        self.editing.as_ref()
    }

    pub fn new_title(&self) -> &str {
        &self.new_title
    }

    pub fn set_new_title(&mut self, title: impl Into<String>) {
        self.new_title = title.into();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Starts a fresh load generation. Any older load still in flight will
    /// be discarded when it completes.
    pub fn mount(&mut self) -> Pending {
        self.mounted = true;
        self.generation += 1;
        self.loading = true;
        self.error.clear();
        debug!(generation = self.generation, "loading tasks");
        Pending {
            request: self.client.build_list(),
            ticket: Ticket(TicketKind::Load {
                generation: self.generation,
            }),
        }
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    /// Submits the add-form buffer.
    pub fn add(&mut self) -> Result<Pending, Refused> {
        let title = self.new_title.trim();
        if title.is_empty() {
            return Err(Refused::EmptyTitle);
        }
        if self.loading {
            return Err(Refused::Loading);
        }
        let request = self.client.build_create(title).map_err(Refused::Build)?;
        self.loading = true;
        self.error.clear();
        debug!(title, "creating task");
        Ok(Pending {
            request,
            ticket: Ticket(TicketKind::Create),
        })
    }

    pub fn toggle(&mut self, id: &TaskId) -> Result<Pending, Refused> {
        self.ensure_idle()?;
        let current = self.find(id).ok_or(Refused::UnknownTask)?;
        let request = self
            .client
            .build_update(id, &UpdateTask::completed(!current.completed))
            .map_err(Refused::Build)?;
        Ok(self.start_busy(id, request, TicketKind::Toggle(id.clone())))
    }

    pub fn delete(&mut self, id: &TaskId) -> Result<Pending, Refused> {
        self.ensure_idle()?;
        self.find(id).ok_or(Refused::UnknownTask)?;
        let request = self.client.build_remove(id);
        Ok(self.start_busy(id, request, TicketKind::Delete(id.clone())))
    }

    /// Puts `id` into edit mode, replacing any other draft.
    pub fn start_edit(&mut self, id: &TaskId) -> Result<(), Refused> {
        let task = self.find(id).ok_or(Refused::UnknownTask)?;
        self.editing = Some(EditDraft {
            id: id.clone(),
            title: task.title.clone(),
        });
        Ok(())
    }

    pub fn set_editing_title(&mut self, title: impl Into<String>) -> Result<(), Refused> {
        let draft = self.editing.as_mut().ok_or(Refused::NotEditing)?;
        draft.title = title.into();
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Returns `Ok(None)` when the draft is empty or unchanged; that case
    /// leaves edit mode without a request.
    pub fn save_edit(&mut self) -> Result<Option<Pending>, Refused> {
        let draft = self.editing.as_ref().ok_or(Refused::NotEditing)?;
        let title = draft.title.trim().to_string();
        let id = draft.id.clone();
        let unchanged = self.find(&id).map_or(true, |t| t.title == title);
        if title.is_empty() || unchanged {
            self.cancel_edit();
            return Ok(None);
        }
        self.ensure_idle()?;
        let request = self
            .client
            .build_update(&id, &UpdateTask::title(title))
            .map_err(Refused::Build)?;
        Ok(Some(self.start_busy(&id, request, TicketKind::Rename(id.clone()))))
    }

    /// Reconciles a finished request. `outcome` is the response, or the
    /// error the host hit while trying to get one.
    pub fn complete(&mut self, ticket: Ticket, outcome: Result<HttpResponse, ApiError>) -> Completion {
        match ticket.0 {
            TicketKind::Load { generation } => {
                if !self.mounted || generation != self.generation {
                    debug!(generation, current = self.generation, "discarding stale load");
                    return Completion::Discarded;
                }
                self.loading = false;
                match outcome.and_then(|r| self.client.parse_list(r)) {
                    Ok(tasks) => self.tasks = tasks,
                    Err(err) => return self.fail(err),
                }
            }
            TicketKind::Create => {
                self.loading = false;
                match outcome.and_then(|r| self.client.parse_create(r)) {
                    Ok(task) => {
                        self.tasks.insert(0, task);
                        self.new_title.clear();
                    }
                    Err(err) => return self.fail(err),
                }
            }
            TicketKind::Toggle(id) => {
                self.busy_id = None;
                match outcome.and_then(|r| self.client.parse_update(r)) {
                    Ok(task) => self.replace(&id, task),
                    Err(err) => return self.fail(err),
                }
            }
            TicketKind::Rename(id) => {
                self.busy_id = None;
                match outcome.and_then(|r| self.client.parse_update(r)) {
                    Ok(task) => {
                        self.replace(&id, task);
                        self.leave_edit(&id);
                    }
                    Err(err) => return self.fail(err),
                }
            }
            TicketKind::Delete(id) => {
                self.busy_id = None;
                match outcome.and_then(|r| self.client.parse_remove(r)) {
                    Ok(()) => {
                        if let Some(pos) = self.position(&id) {
                            self.tasks.remove(pos);
                        }
                        self.leave_edit(&id);
                    }
                    Err(err) => return self.fail(err),
                }
            }
        }
        Completion::Applied
    }

    fn fail(&mut self, err: ApiError) -> Completion {
        warn!(operation = %err.operation(), error = %err, "task request failed");
        self.error = err.to_string();
        Completion::Failed(self.error.clone())
    }

    fn leave_edit(&mut self, id: &TaskId) {
        if self.editing.as_ref().is_some_and(|d| &d.id == id) {
            self.editing = None;
        }
    }

    fn ensure_idle(&self) -> Result<(), Refused> {
        if self.busy_id.is_some() {
            return Err(Refused::Busy);
        }
        Ok(())
    }

    fn start_busy(&mut self, id: &TaskId, request: HttpRequest, kind: TicketKind) -> Pending {
        self.busy_id = Some(id.clone());
        self.error.clear();
        debug!(%id, method = %request.method, "task request dispatched");
        Pending {
            request,
            ticket: Ticket(kind),
        }
    }

    fn find(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    fn replace(&mut self, id: &TaskId, task: Task) {
        if let Some(pos) = self.position(id) {
            self.tasks[pos] = task;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn controller() -> TaskListController {
        TaskListController::new(TaskClient::new("http://localhost:3000"))
    }

    fn task(id: u64, title: &str, completed: bool) -> Task {
        Task {
            id: TaskId::from(id),
            title: title.to_string(),
            completed,
        }
    }

    fn ok(status: u16, body: serde_json::Value) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse::new(status, body.to_string()))
    }

    fn status(status: u16) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse::new(status, ""))
    }

    /// A mounted controller holding `tasks`.
    fn loaded(tasks: Vec<Task>) -> TaskListController {
        let mut c = controller();
        let pending = c.mount();
        let body = serde_json::to_value(&tasks).unwrap();
        assert_eq!(c.complete(pending.ticket, ok(200, body)), Completion::Applied);
        c
    }

    #[test]
    fn mount_sets_loading_and_requests_list() {
        let mut c = controller();
        let pending = c.mount();
        assert!(c.is_loading());
        assert_eq!(pending.request.method, HttpMethod::Get);
        assert_eq!(pending.request.url, "http://localhost:3000/tasks");
        assert_eq!(pending.ticket.operation(), Operation::List);
    }

    #[test]
    fn load_success_replaces_collection() {
        let c = loaded(vec![task(1, "A", false), task(2, "B", true)]);
        assert!(!c.is_loading());
        assert_eq!(c.tasks().len(), 2);
        assert!(c.error().is_empty());
    }

    #[test]
    fn load_failure_sets_error_and_clears_loading() {
        let mut c = controller();
        let pending = c.mount();
        let completion = c.complete(pending.ticket, status(503));
        assert_eq!(completion, Completion::Failed("Failed to load tasks (HTTP 503)".to_string()));
        assert!(!c.is_loading());
        assert_eq!(c.error(), "Failed to load tasks (HTTP 503)");
    }

    #[test]
    fn load_after_unmount_is_discarded() {
        let mut c = controller();
        let pending = c.mount();
        c.unmount();
        let body = serde_json::json!([{"id": 1, "title": "A", "completed": false}]);
        assert_eq!(c.complete(pending.ticket, ok(200, body)), Completion::Discarded);
        assert!(c.tasks().is_empty());
        assert!(c.is_loading());
    }

    #[test]
    fn superseded_load_is_discarded() {
        let mut c = controller();
        let first = c.mount();
        let second = c.mount();
        let stale = serde_json::json!([{"id": 1, "title": "old", "completed": false}]);
        assert_eq!(c.complete(first.ticket, ok(200, stale)), Completion::Discarded);
        assert!(c.is_loading());

        let fresh = serde_json::json!([{"id": 2, "title": "new", "completed": false}]);
        assert_eq!(c.complete(second.ticket, ok(200, fresh)), Completion::Applied);
        assert_eq!(c.tasks(), &[task(2, "new", false)]);
    }

    #[test]
    fn add_rejects_blank_titles_without_a_request() {
        let mut c = loaded(vec![task(1, "A", false)]);
        for blank in ["", "   ", "\t\n"] {
            c.set_new_title(blank);
            assert_eq!(c.add().unwrap_err(), Refused::EmptyTitle);
        }
        assert!(!c.is_loading());
        assert_eq!(c.tasks().len(), 1);
    }

    #[test]
    fn add_sends_trimmed_title_and_prepends_result() {
        let mut c = loaded(vec![task(1, "A", false)]);
        c.set_new_title("  Walk dog  ");
        let pending = c.add().unwrap();
        assert!(c.is_loading());
        let body: serde_json::Value = serde_json::from_str(pending.request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"title": "Walk dog"}));

        let created = serde_json::json!({"id": 2, "title": "Walk dog", "completed": false});
        assert_eq!(c.complete(pending.ticket, ok(201, created)), Completion::Applied);
        assert_eq!(c.tasks()[0], task(2, "Walk dog", false));
        assert_eq!(c.tasks().len(), 2);
        assert!(c.new_title().is_empty());
        assert!(!c.is_loading());
    }

    #[test]
    fn add_failure_keeps_input_buffer() {
        let mut c = loaded(vec![task(1, "A", false)]);
        c.set_new_title("Walk dog");
        let pending = c.add().unwrap();
        c.complete(pending.ticket, status(500));
        assert_eq!(c.tasks(), &[task(1, "A", false)]);
        assert_eq!(c.new_title(), "Walk dog");
        assert_eq!(c.error(), "Failed to create task (HTTP 500)");
        assert!(!c.is_loading());
    }

    #[test]
    fn add_refused_while_loading() {
        let mut c = controller();
        let _load = c.mount();
        c.set_new_title("x");
        assert_eq!(c.add().unwrap_err(), Refused::Loading);
    }

    #[test]
    fn toggle_trusts_server_value() {
        let mut c = loaded(vec![task(1, "A", false)]);
        let pending = c.toggle(&TaskId::from(1u64)).unwrap();
        assert_eq!(c.busy_id(), Some(&TaskId::from(1u64)));
        let body: serde_json::Value = serde_json::from_str(pending.request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"completed": true}));

        // The server decided otherwise; its answer wins.
        let server = serde_json::json!({"id": 1, "title": "A", "completed": false});
        c.complete(pending.ticket, ok(200, server));
        assert_eq!(c.tasks(), &[task(1, "A", false)]);
        assert!(c.busy_id().is_none());
    }

    #[test]
    fn toggle_scenario_marks_task_completed() {
        let mut c = loaded(vec![task(1, "A", false)]);
        let pending = c.toggle(&TaskId::from(1u64)).unwrap();
        let server = serde_json::json!({"id": 1, "title": "A", "completed": true});
        c.complete(pending.ticket, ok(200, server));
        assert_eq!(c.tasks(), &[task(1, "A", true)]);
        assert!(!c.is_busy());
    }

    #[test]
    fn failed_toggle_leaves_task_unchanged() {
        let mut c = loaded(vec![task(1, "A", false)]);
        let pending = c.toggle(&TaskId::from(1u64)).unwrap();
        c.complete(pending.ticket, status(500));
        assert_eq!(c.tasks(), &[task(1, "A", false)]);
        assert!(!c.error().is_empty());
        assert!(!c.is_busy());
    }

    #[test]
    fn second_mutation_refused_while_busy() {
        let mut c = loaded(vec![task(1, "A", false), task(2, "B", false)]);
        let _pending = c.toggle(&TaskId::from(1u64)).unwrap();
        assert_eq!(c.toggle(&TaskId::from(2u64)).unwrap_err(), Refused::Busy);
        assert_eq!(c.delete(&TaskId::from(2u64)).unwrap_err(), Refused::Busy);
        c.start_edit(&TaskId::from(2u64)).unwrap();
        c.set_editing_title("B2").unwrap();
        assert_eq!(c.save_edit().unwrap_err(), Refused::Busy);
    }

    #[test]
    fn unknown_task_is_refused() {
        let mut c = loaded(vec![task(1, "A", false)]);
        assert_eq!(c.toggle(&TaskId::from(9u64)).unwrap_err(), Refused::UnknownTask);
        assert_eq!(c.delete(&TaskId::from(9u64)).unwrap_err(), Refused::UnknownTask);
        assert_eq!(c.start_edit(&TaskId::from(9u64)).unwrap_err(), Refused::UnknownTask);
        assert!(!c.is_busy());
    }

    #[test]
    fn delete_removes_exactly_one_task() {
        let mut c = loaded(vec![task(1, "A", false), task(2, "B", true), task(3, "C", false)]);
        let pending = c.delete(&TaskId::from(2u64)).unwrap();
        assert_eq!(pending.request.method, HttpMethod::Delete);
        assert_eq!(c.complete(pending.ticket, status(204)), Completion::Applied);
        assert_eq!(c.tasks(), &[task(1, "A", false), task(3, "C", false)]);
        assert!(!c.is_busy());
    }

    #[test]
    fn delete_failure_keeps_task() {
        let mut c = loaded(vec![task(1, "A", false)]);
        let pending = c.delete(&TaskId::from(1u64)).unwrap();
        c.complete(pending.ticket, status(404));
        assert_eq!(c.tasks().len(), 1);
        assert_eq!(c.error(), "Failed to delete task (HTTP 404)");
    }

    #[test]
    fn deleting_the_edited_task_drops_the_draft() {
        let mut c = loaded(vec![task(1, "A", false), task(2, "B", false)]);
        c.start_edit(&TaskId::from(1u64)).unwrap();
        c.set_editing_title("A2").unwrap();
        let pending = c.delete(&TaskId::from(1u64)).unwrap();
        assert!(c.editing().is_some());

        assert_eq!(c.complete(pending.ticket, status(204)), Completion::Applied);
        assert!(c.editing().is_none());
        assert_eq!(c.tasks(), &[task(2, "B", false)]);
        assert_eq!(c.save_edit().unwrap_err(), Refused::NotEditing);
    }

    #[test]
    fn deleting_another_task_keeps_the_draft() {
        let mut c = loaded(vec![task(1, "A", false), task(2, "B", false)]);
        c.start_edit(&TaskId::from(1u64)).unwrap();
        let pending = c.delete(&TaskId::from(2u64)).unwrap();
        c.complete(pending.ticket, status(204));
        assert_eq!(c.editing().map(|d| d.title.as_str()), Some("A"));
    }

    #[test]
    fn start_edit_seeds_draft_and_cancel_clears_it() {
        let mut c = loaded(vec![task(1, "A", false)]);
        c.start_edit(&TaskId::from(1u64)).unwrap();
        assert_eq!(
            c.editing(),
            Some(&EditDraft {
                id: TaskId::from(1u64),
                title: "A".to_string()
            })
        );
        c.cancel_edit();
        assert!(c.editing().is_none());
    }

    #[test]
    fn save_unchanged_or_empty_draft_acts_as_cancel() {
        let mut c = loaded(vec![task(1, "A", false)]);
        for draft in [" A ", "", "   "] {
            c.start_edit(&TaskId::from(1u64)).unwrap();
            c.set_editing_title(draft).unwrap();
            assert!(c.save_edit().unwrap().is_none());
            assert!(c.editing().is_none());
            assert!(!c.is_busy());
        }
    }

    #[test]
    fn save_edit_success_replaces_and_exits_edit_mode() {
        let mut c = loaded(vec![task(1, "A", false)]);
        c.start_edit(&TaskId::from(1u64)).unwrap();
        c.set_editing_title("  Renamed ").unwrap();
        let pending = c.save_edit().unwrap().unwrap();
        let body: serde_json::Value = serde_json::from_str(pending.request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"title": "Renamed"}));
        assert_eq!(c.busy_id(), Some(&TaskId::from(1u64)));

        let server = serde_json::json!({"id": 1, "title": "Renamed", "completed": false});
        c.complete(pending.ticket, ok(200, server));
        assert_eq!(c.tasks(), &[task(1, "Renamed", false)]);
        assert!(c.editing().is_none());
        assert!(!c.is_busy());
    }

    #[test]
    fn save_edit_failure_stays_in_edit_mode() {
        let mut c = loaded(vec![task(1, "A", false)]);
        c.start_edit(&TaskId::from(1u64)).unwrap();
        c.set_editing_title("Renamed").unwrap();
        let pending = c.save_edit().unwrap().unwrap();
        c.complete(pending.ticket, status(500));
        assert_eq!(c.tasks(), &[task(1, "A", false)]);
        assert_eq!(c.editing().map(|d| d.title.as_str()), Some("Renamed"));
        assert_eq!(c.error(), "Failed to update task (HTTP 500)");
        assert!(!c.is_busy());
    }

    #[test]
    fn next_request_clears_error_banner() {
        let mut c = loaded(vec![task(1, "A", false)]);
        let pending = c.toggle(&TaskId::from(1u64)).unwrap();
        c.complete(pending.ticket, status(500));
        assert!(!c.error().is_empty());
        let _pending = c.toggle(&TaskId::from(1u64)).unwrap();
        assert!(c.error().is_empty());
    }

    #[test]
    fn transport_errors_surface_in_banner() {
        let mut c = controller();
        let pending = c.mount();
        let err = pending.ticket.transport_error("connection refused");
        c.complete(pending.ticket, Err(err));
        assert_eq!(c.error(), "Failed to load tasks: connection refused");
    }

    #[test]
    fn filter_does_not_touch_collection() {
        let mut c = loaded(vec![task(1, "A", false), task(2, "B", true)]);
        c.set_filter(Filter::Completed);
        assert_eq!(c.visible(), vec![&task(2, "B", true)]);
        c.set_filter(Filter::Active);
        assert_eq!(c.visible(), vec![&task(1, "A", false)]);
        assert_eq!(c.tasks().len(), 2);
        assert_eq!(c.counts().active, 1);
    }
}
