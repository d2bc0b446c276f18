//! Typed resource client for the project-management backend.
//!
//! Every operation reads the bearer token from the session store, issues
//! one HTTP request, and returns either the decoded entity or an
//! [`ApiError`]. Expected HTTP failure statuses are mapped into the error
//! taxonomy and never panic; only transport faults and unexpected
//! statuses become `Network`.

use reqwest::blocking::{multipart, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::board::MoveBackend;
use crate::models::{
    Label, Project, Task, TaskStatus, Tokens, User, Workspace, WorkspaceDetail,
};
use crate::page::{PageInfo, Pager};
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("not authenticated; run 'taskdeck login'")]
    Unauthenticated,
    #[error("not found")]
    NotFound,
    #[error("forbidden: insufficient role")]
    Forbidden,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("network error: {0}")]
    Network(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// One page of a server-side listing.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

/// Django REST Framework pagination envelope.
#[derive(Debug, Deserialize)]
struct PageEnvelope<T> {
    count: u64,
    #[allow(dead_code)]
    next: Option<String>,
    #[allow(dead_code)]
    previous: Option<String>,
    results: Vec<T>,
}

/// Body the backend returns for expected failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Partial task update. Only present fields are serialized, so the
/// backend merges and everything omitted stays untouched. The display
/// name goes out under the backend's `name` key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<i64>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.order.is_none()
            && self.assignees.is_none()
            && self.label.is_none()
    }
}

/// Fields the caller supplies when creating a task. The server assigns
/// id and timestamp; omitted optionals take their documented defaults.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDraft {
    #[serde(rename = "name")]
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub order: i64,
    pub assignees: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<i64>,
}

/// Requested workspace changes. Workspaces update via `PUT`, which
/// replaces the record, so unset fields are seeded from the current
/// representation before the request goes out.
#[derive(Debug, Clone, Default)]
pub struct WorkspacePatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl WorkspacePatch {
    /// Full replacement body, current values filling the gaps.
    fn over(&self, current: &WorkspaceDetail) -> serde_json::Value {
        json!({
            "name": self.name.as_deref().unwrap_or(&current.name),
            "description": self.description.as_deref().unwrap_or(&current.description),
        })
    }
}

/// Requested project changes. Same `PUT` replacement rules as
/// [`WorkspacePatch`].
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub goal: Option<String>,
}

impl ProjectPatch {
    fn over(&self, current: &Project) -> serde_json::Value {
        json!({
            "name": self.name.as_deref().unwrap_or(&current.name),
            "description": self.description.as_deref().unwrap_or(&current.description),
            "goal": self.goal.as_deref().unwrap_or(&current.goal),
        })
    }
}

pub struct Client {
    http: reqwest::blocking::Client,
    base: String,
    session: SessionStore,
}

impl Client {
    pub fn new(base_url: &str, session: SessionStore) -> Client {
        Client {
            http: reqwest::blocking::Client::new(),
            base: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    // ---- auth ----

    /// `POST /login/`. On success the token pair is stored and the
    /// current user is fetched and cached.
    pub fn login(&mut self, username: &str, password: &str) -> ApiResult<User> {
        let tokens: Tokens = self.send(
            self.http
                .post(self.url("/login/"))
                .json(&json!({ "username": username, "password": password })),
        )?;
        if let Err(e) = self.session.set_tokens(tokens.access, tokens.refresh) {
            warn!("could not persist session: {e:#}");
        }
        self.me()
    }

    /// `POST /register/` (201 on success).
    pub fn register(&mut self, username: &str, full_name: &str, password: &str) -> ApiResult<User> {
        self.send(self.http.post(self.url("/register/")).json(&json!({
            "username": username,
            "full_name": full_name,
            "password": password,
        })))
    }

    /// `POST /logout/`. The session is cleared whatever the backend
    /// says; a dead token should never keep a user logged in locally.
    pub fn logout(&mut self) -> ApiResult<()> {
        if self.session.token().is_some() {
            if let Err(e) = self.authed(Method::POST, "/logout/").and_then(|r| self.run(r)) {
                warn!("logout request failed: {e}");
            }
        }
        if let Err(e) = self.session.clear() {
            warn!("could not clear session: {e:#}");
        }
        Ok(())
    }

    /// `GET /users/me/`. Refreshes the cached current user.
    pub fn me(&mut self) -> ApiResult<User> {
        let user: User = self.send(self.authed(Method::GET, "/users/me/")?)?;
        if let Err(e) = self.session.set_user(user.clone()) {
            warn!("could not persist session: {e:#}");
        }
        Ok(user)
    }

    /// `PATCH /users/me/`.
    pub fn update_profile(&mut self, full_name: &str) -> ApiResult<User> {
        let user: User = self.send(
            self.authed(Method::PATCH, "/users/me/")?
                .json(&json!({ "full_name": full_name })),
        )?;
        if let Err(e) = self.session.set_user(user.clone()) {
            warn!("could not persist session: {e:#}");
        }
        Ok(user)
    }

    /// `POST /users/me/avatar/`, multipart form field `avatar`.
    pub fn upload_avatar(&mut self, path: &Path) -> ApiResult<User> {
        let form = multipart::Form::new()
            .file("avatar", path)
            .map_err(|e| ApiError::Validation(format!("avatar file: {}", e)))?;
        let user: User = self.send(self.authed(Method::POST, "/users/me/avatar/")?.multipart(form))?;
        if let Err(e) = self.session.set_user(user.clone()) {
            warn!("could not persist session: {e:#}");
        }
        Ok(user)
    }

    // ---- workspaces ----

    /// `GET /workspaces/?page=&page_size=`. A page past the end is an
    /// empty listing, not an error.
    pub fn list_workspaces(&self, pager: Pager) -> ApiResult<Listing<Workspace>> {
        let req = self
            .authed(Method::GET, "/workspaces/")?
            .query(&[("page", pager.page), ("page_size", pager.limit)]);
        match self.send::<PageEnvelope<Workspace>>(req) {
            Ok(envelope) => Ok(Listing {
                info: PageInfo::new(pager, envelope.count),
                items: envelope.results,
            }),
            // The backend answers 404 for a page past the end. Page 1 is
            // re-requested to recover the true totals, so "page N of M"
            // stays accurate even off the end.
            Err(ApiError::NotFound) => {
                let first = self
                    .authed(Method::GET, "/workspaces/")?
                    .query(&[("page", 1u64), ("page_size", pager.limit)]);
                let envelope = self.send::<PageEnvelope<Workspace>>(first)?;
                Ok(out_of_range(pager, envelope.count))
            }
            Err(e) => Err(e),
        }
    }

    pub fn get_workspace(&self, id: i64) -> ApiResult<WorkspaceDetail> {
        self.send(self.authed(Method::GET, &format!("/workspaces/{}/", id))?)
    }

    pub fn create_workspace(&self, name: &str, description: &str) -> ApiResult<Workspace> {
        self.send(
            self.authed(Method::POST, "/workspaces/")?
                .json(&json!({ "name": name, "description": description })),
        )
    }

    /// `PUT /workspaces/{id}/`. The current record is fetched first and
    /// unset fields are carried over, since PUT replaces.
    pub fn update_workspace(&self, id: i64, patch: &WorkspacePatch) -> ApiResult<Workspace> {
        let current = self.get_workspace(id)?;
        self.send(
            self.authed(Method::PUT, &format!("/workspaces/{}/", id))?
                .json(&patch.over(&current)),
        )
    }

    pub fn delete_workspace(&self, id: i64) -> ApiResult<()> {
        self.run(self.authed(Method::DELETE, &format!("/workspaces/{}/", id))?)?;
        Ok(())
    }

    /// `POST /workspaces/{id}/add_project/`.
    pub fn add_project(
        &self,
        workspace: i64,
        name: &str,
        description: &str,
        goal: &str,
    ) -> ApiResult<Project> {
        self.send(
            self.authed(Method::POST, &format!("/workspaces/{}/add_project/", workspace))?
                .json(&json!({ "name": name, "description": description, "goal": goal })),
        )
    }

    /// `POST /workspaces/{id}/invite/`.
    pub fn invite(&self, workspace: i64, username: &str) -> ApiResult<()> {
        self.run(
            self.authed(Method::POST, &format!("/workspaces/{}/invite/", workspace))?
                .json(&json!({ "username": username })),
        )?;
        Ok(())
    }

    /// `POST /workspaces/{id}/kick/`.
    pub fn kick(&self, workspace: i64, username: &str) -> ApiResult<()> {
        self.run(
            self.authed(Method::POST, &format!("/workspaces/{}/kick/", workspace))?
                .json(&json!({ "username": username })),
        )?;
        Ok(())
    }

    /// `POST /workspaces/{id}/change_role/`.
    pub fn change_role(&self, workspace: i64, username: &str, role: &str) -> ApiResult<()> {
        self.run(
            self.authed(Method::POST, &format!("/workspaces/{}/change_role/", workspace))?
                .json(&json!({ "username": username, "role": role })),
        )?;
        Ok(())
    }

    // ---- labels ----

    /// `GET /workspaces/{id}/labels/`.
    pub fn list_labels(&self, workspace: i64) -> ApiResult<Vec<Label>> {
        self.send(self.authed(Method::GET, &format!("/workspaces/{}/labels/", workspace))?)
    }

    /// `POST /workspaces/{id}/labels/`.
    pub fn create_label(&self, workspace: i64, text: &str, color: &str) -> ApiResult<Label> {
        self.send(
            self.authed(Method::POST, &format!("/workspaces/{}/labels/", workspace))?
                .json(&json!({ "text": text, "color": color })),
        )
    }

    /// `PUT /labels/{id}/`. Replaces the label, so callers pass the full
    /// text/color pair (the command layer seeds from the current label).
    pub fn update_label(&self, id: i64, text: &str, color: &str) -> ApiResult<Label> {
        self.send(
            self.authed(Method::PUT, &format!("/labels/{}/", id))?
                .json(&json!({ "text": text, "color": color })),
        )
    }

    /// `DELETE /labels/{id}/`. Tasks referencing the label fall back to
    /// having none; the backend owns that cascade.
    pub fn delete_label(&self, id: i64) -> ApiResult<()> {
        self.run(self.authed(Method::DELETE, &format!("/labels/{}/", id))?)?;
        Ok(())
    }

    // ---- projects ----

    pub fn get_project(&self, id: i64) -> ApiResult<Project> {
        self.send(self.authed(Method::GET, &format!("/projects/{}/", id))?)
    }

    /// `PUT /projects/{id}/`. Replacement semantics as for workspaces:
    /// fetch, carry unset fields over, send the full record.
    pub fn update_project(&self, id: i64, patch: &ProjectPatch) -> ApiResult<Project> {
        let current = self.get_project(id)?;
        self.send(
            self.authed(Method::PUT, &format!("/projects/{}/", id))?
                .json(&patch.over(&current)),
        )
    }

    pub fn delete_project(&self, id: i64) -> ApiResult<()> {
        self.run(self.authed(Method::DELETE, &format!("/projects/{}/", id))?)?;
        Ok(())
    }

    // ---- tasks ----

    /// `POST /projects/{id}/create_task/`.
    pub fn create_task(&self, project: i64, draft: &TaskDraft) -> ApiResult<Task> {
        self.send(
            self.authed(Method::POST, &format!("/projects/{}/create_task/", project))?
                .json(draft),
        )
    }

    /// `PATCH /tasks/{id}/`, partial merge on the server side.
    pub fn update_task(&self, id: i64, patch: &TaskPatch) -> ApiResult<Task> {
        self.send(
            self.authed(Method::PATCH, &format!("/tasks/{}/", id))?
                .json(patch),
        )
    }

    /// `DELETE /tasks/{id}/`. Deleting an id that is already gone comes
    /// back as `NotFound`.
    pub fn delete_task(&self, id: i64) -> ApiResult<()> {
        self.run(self.authed(Method::DELETE, &format!("/tasks/{}/", id))?)?;
        Ok(())
    }

    /// Archival is a status value on the wire.
    pub fn archive_task(&self, id: i64) -> ApiResult<Task> {
        self.send(
            self.authed(Method::PATCH, &format!("/tasks/{}/", id))?
                .json(&json!({ "status": "archived" })),
        )
    }

    /// Unarchived tasks re-enter the board at NOT_STARTED.
    pub fn unarchive_task(&self, id: i64) -> ApiResult<Task> {
        self.send(
            self.authed(Method::PATCH, &format!("/tasks/{}/", id))?
                .json(&json!({ "status": TaskStatus::NotStarted.as_str() })),
        )
    }

    // ---- plumbing ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Builds an authenticated request. A missing token short-circuits
    /// to `Unauthenticated` without touching the network.
    fn authed(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let token = self.session.token().ok_or(ApiError::Unauthenticated)?;
        debug!(%method, path, "issuing request");
        Ok(self
            .http
            .request(method, self.url(path))
            .bearer_auth(token))
    }

    fn run(&self, req: RequestBuilder) -> ApiResult<Response> {
        let resp = req
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(error_for(status, &body))
    }

    fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        self.run(req)?
            .json()
            .map_err(|e| ApiError::Network(format!("invalid response body: {}", e)))
    }
}

impl MoveBackend for Client {
    fn move_task(&self, id: i64, status: TaskStatus, order: i64) -> ApiResult<Task> {
        self.update_task(
            id,
            &TaskPatch {
                status: Some(status),
                order: Some(order),
                ..TaskPatch::default()
            },
        )
    }
}

/// Listing for a page past the end: no items, true totals preserved.
fn out_of_range<T>(pager: Pager, total: u64) -> Listing<T> {
    Listing {
        info: PageInfo::new(pager, total),
        items: Vec::new(),
    }
}

/// Maps an expected HTTP failure status onto the error taxonomy. The
/// backend puts human-readable context under `detail`.
fn error_for(status: StatusCode, body: &str) -> ApiError {
    match status.as_u16() {
        401 => ApiError::Unauthenticated,
        403 => ApiError::Forbidden,
        404 => ApiError::NotFound,
        400 | 422 => ApiError::Validation(detail_of(body, status)),
        _ => ApiError::Network(detail_of(body, status)),
    }
}

fn detail_of(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_statuses_map_into_taxonomy() {
        assert_eq!(
            error_for(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthenticated
        );
        assert_eq!(error_for(StatusCode::FORBIDDEN, ""), ApiError::Forbidden);
        assert_eq!(error_for(StatusCode::NOT_FOUND, ""), ApiError::NotFound);
        assert!(matches!(
            error_for(StatusCode::BAD_REQUEST, r#"{"detail": "name too long"}"#),
            ApiError::Validation(msg) if msg == "name too long"
        ));
    }

    #[test]
    fn test_unexpected_statuses_are_network_errors() {
        assert!(matches!(
            error_for(StatusCode::INTERNAL_SERVER_ERROR, ""),
            ApiError::Network(msg) if msg.contains("500")
        ));
        assert!(matches!(
            error_for(StatusCode::BAD_GATEWAY, "not json"),
            ApiError::Network(_)
        ));
    }

    #[test]
    fn test_detail_falls_back_to_status_line() {
        let msg = detail_of("<html>oops</html>", StatusCode::BAD_REQUEST);
        assert_eq!(msg, "request failed with status 400");
    }

    #[test]
    fn test_task_patch_serializes_only_present_fields() {
        let patch = TaskPatch {
            status: Some(TaskStatus::Ongoing),
            order: Some(3),
            ..TaskPatch::default()
        };
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "in_progress", "order": 3 }));
    }

    #[test]
    fn test_workspace_update_sends_full_replacement_body() {
        let current = WorkspaceDetail {
            id: 5,
            name: "Old name".to_string(),
            description: "keep this".to_string(),
            created_at: None,
            memberships: vec![],
            projects: vec![],
        };
        let patch = WorkspacePatch {
            name: Some("New name".to_string()),
            ..WorkspacePatch::default()
        };
        // PUT replaces the record, so the unset description must ride
        // along from the current representation.
        assert_eq!(
            patch.over(&current),
            serde_json::json!({ "name": "New name", "description": "keep this" })
        );
    }

    #[test]
    fn test_project_update_sends_full_replacement_body() {
        let current = Project {
            id: 5,
            name: "Site".to_string(),
            description: "the site".to_string(),
            goal: "launch".to_string(),
            workspace: 1,
            tasks: vec![],
        };
        let patch = ProjectPatch {
            name: Some("Relaunch".to_string()),
            ..ProjectPatch::default()
        };
        assert_eq!(
            patch.over(&current),
            serde_json::json!({
                "name": "Relaunch",
                "description": "the site",
                "goal": "launch",
            })
        );
    }

    #[test]
    fn test_out_of_range_listing_keeps_true_totals() {
        let listing: Listing<Workspace> = out_of_range(Pager::new(9, 5), 12);
        assert!(listing.items.is_empty());
        assert_eq!(listing.info.page, 9);
        assert_eq!(listing.info.total, 12);
        assert_eq!(listing.info.total_pages, 3);
    }

    #[test]
    fn test_task_draft_uses_backend_name_key() {
        let draft = TaskDraft {
            title: "Ship it".to_string(),
            description: String::new(),
            status: TaskStatus::NotStarted,
            order: 0,
            assignees: vec![],
            label: None,
        };
        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(body["name"], "Ship it");
        assert!(body.get("title").is_none());
        assert!(body.get("label").is_none());
    }

    #[test]
    fn test_unauthenticated_without_token_is_local() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionStore::open(dir.path());
        // TEST-NET-1 address: if the check were not local this would hang
        // or fail with a network error instead.
        let client = Client::new("http://192.0.2.1", session);
        assert_eq!(
            client.authed(Method::GET, "/users/me/").err(),
            Some(ApiError::Unauthenticated)
        );
    }

    #[test]
    fn test_page_envelope_decodes() {
        let raw = r#"{"count": 12, "next": "http://x/?page=2", "previous": null,
                      "results": [{"id": 1, "name": "W", "member_count": 3}]}"#;
        let envelope: PageEnvelope<crate::models::Workspace> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.count, 12);
        assert_eq!(envelope.results.len(), 1);
        assert_eq!(envelope.results[0].member_count, 3);
    }
}
