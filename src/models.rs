use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Active board statuses. Archival is a separate flag on [`Task`], even
/// though the wire protocol encodes it as a fourth status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "not_started", alias = "NOT_STARTED")]
    NotStarted,
    #[serde(
        rename = "in_progress",
        alias = "ongoing",
        alias = "ONGOING",
        alias = "IN_PROGRESS"
    )]
    Ongoing,
    #[serde(rename = "in_review", alias = "IN_REVIEW")]
    InReview,
}

impl TaskStatus {
    /// Column order on the board.
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::NotStarted,
        TaskStatus::Ongoing,
        TaskStatus::InReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::Ongoing => "in_progress",
            TaskStatus::InReview => "in_review",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::Ongoing => "Ongoing",
            TaskStatus::InReview => "In Review",
        }
    }

    /// Parses user-facing input. Accepts both wire spellings and the
    /// hyphenated forms people type on a command line.
    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "not_started" | "todo" => Some(TaskStatus::NotStarted),
            "ongoing" | "in_progress" => Some(TaskStatus::Ongoing),
            "in_review" | "review" => Some(TaskStatus::InReview),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s.to_ascii_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical task record. The wire shape has drifted over time (display
/// name under `name` or `title`, label under `label` or `labelId`,
/// archived as a status value or a flag), so deserialization goes through
/// an intermediate wire struct and normalizes exactly once. Nothing
/// downstream sees a legacy key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskWire")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub order: i64,
    pub assignees: Vec<i64>,
    pub label: Option<i64>,
    pub project: i64,
    pub archived: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct TaskWire {
    id: i64,
    #[serde(alias = "name")]
    title: String,
    #[serde(default)]
    description: String,
    status: String,
    #[serde(default)]
    order: i64,
    #[serde(default)]
    assignees: Vec<i64>,
    #[serde(default, alias = "labelId")]
    label: Option<i64>,
    #[serde(default, alias = "projectId")]
    project: i64,
    #[serde(default)]
    archived: bool,
    #[serde(default, alias = "createdAt")]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskWire> for Task {
    type Error = String;

    fn try_from(wire: TaskWire) -> Result<Self, Self::Error> {
        let (status, archived_status) = match wire.status.to_ascii_lowercase().as_str() {
            "not_started" => (TaskStatus::NotStarted, false),
            "in_progress" | "ongoing" => (TaskStatus::Ongoing, false),
            "in_review" => (TaskStatus::InReview, false),
            // Archived tasks have no live column; they re-enter the board
            // at NOT_STARTED on unarchive.
            "archived" => (TaskStatus::NotStarted, true),
            other => return Err(format!("unknown task status '{}'", other)),
        };

        Ok(Task {
            id: wire.id,
            title: wire.title,
            description: wire.description,
            status,
            order: wire.order,
            assignees: wire.assignees,
            label: wire.label,
            project: wire.project,
            archived: wire.archived || archived_status,
            created_at: wire.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(alias = "name")]
    pub full_name: String,
    #[serde(default, alias = "avatarUrl")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub member_count: u64,
    #[serde(default)]
    pub project_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    #[serde(alias = "username")]
    pub user_name: String,
    #[serde(default)]
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goal: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceDetail {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub memberships: Vec<Member>,
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default, alias = "workspaceId")]
    pub workspace: i64,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    #[serde(alias = "name")]
    pub text: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub workspace: Option<i64>,
}

/// Token pair returned by `POST /login/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub access: String,
    pub refresh: String,
}
