use serde::{Deserialize, Serialize};

// --- Raw backend shapes (Todoist REST v2) ---

/// A project exactly as the REST API returns it. Ids on the v2 surface are
/// strings of digits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiProject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_inbox_project: bool,
}

/// Due object on a raw task. Kept whole for the raw-passthrough tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Due {
    pub date: String,
    #[serde(default)]
    pub string: String,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// A task exactly as the REST API returns it. Several tools pass this
/// through unprojected, so the shape is serialized back verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTask {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<Due>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub created_at: String,
}

fn default_priority() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLabel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiComment {
    pub id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub posted_at: String,
    #[serde(default)]
    pub posted_uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_state: Option<String>,
}

/// One entry from the id-mapping lookup endpoint (legacy numeric id to the
/// unified-API opaque id).
#[derive(Debug, Clone, Deserialize)]
pub struct IdMapping {
    pub old_id: String,
    pub new_id: String,
}

// --- Canonical shapes returned by query tools ---

/// Canonical project shape: numeric id, classification-ready name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub is_favorite: bool,
    pub is_inbox: bool,
}

impl From<ApiProject> for Project {
    fn from(raw: ApiProject) -> Self {
        Project {
            id: raw.id.parse().unwrap_or_default(),
            name: raw.name,
            url: raw.url,
            is_favorite: raw.is_favorite,
            is_inbox: raw.is_inbox_project,
        }
    }
}

/// Canonical task shape: a lossy projection of [`ApiTask`]. The richer due
/// object collapses to its date and `project_id` is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub content: String,
    pub description: String,
    pub is_completed: bool,
    pub labels: Vec<String>,
    pub priority: u8,
    pub due_date: Option<String>,
    pub url: String,
    pub comment_count: u32,
}

impl From<ApiTask> for Task {
    fn from(raw: ApiTask) -> Self {
        Task {
            id: raw.id.parse().unwrap_or_default(),
            content: raw.content,
            description: raw.description,
            is_completed: raw.is_completed,
            labels: raw.labels,
            priority: raw.priority,
            due_date: raw.due.map(|d| d.date),
            url: raw.url,
            comment_count: raw.comment_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub order: i32,
    pub is_favorite: bool,
}

impl From<ApiLabel> for Label {
    fn from(raw: ApiLabel) -> Self {
        Label {
            id: raw.id.parse().unwrap_or_default(),
            name: raw.name,
            color: raw.color,
            order: raw.order,
            is_favorite: raw.is_favorite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub posted: String,
    pub posted_uid: String,
    pub attachment: Option<Attachment>,
}

impl From<ApiComment> for Comment {
    fn from(raw: ApiComment) -> Self {
        Comment {
            id: raw.id.parse().unwrap_or_default(),
            content: raw.content,
            posted: raw.posted_at,
            posted_uid: raw.posted_uid,
            attachment: raw.attachment,
        }
    }
}

// --- Result envelopes ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentList {
    pub comments: Vec<Comment>,
    pub total_count: usize,
}

/// Disk-cached project directory plus the capture timestamp. A fresh cache
/// file is returned verbatim, embedded `cached_at` included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectList {
    pub projects: Vec<Project>,
    pub cached_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelList {
    pub labels: Vec<Label>,
    pub cached_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectGroup {
    pub projects: Vec<Project>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelGroup {
    pub labels: Vec<Label>,
    pub total_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_projection_collapses_due_to_date() {
        let raw: ApiTask = serde_json::from_value(serde_json::json!({
            "id": "7025",
            "content": "Buy milk",
            "project_id": "2203",
            "labels": ["context:errands"],
            "priority": 3,
            "due": {"date": "2024-01-15", "string": "Jan 15", "is_recurring": false},
            "url": "https://todoist.com/showTask?id=7025",
            "comment_count": 2
        }))
        .unwrap();

        let task = Task::from(raw);
        assert_eq!(task.id, 7025);
        assert_eq!(task.due_date.as_deref(), Some("2024-01-15"));
        assert_eq!(task.labels, vec!["context:errands"]);
        assert!(!task.is_completed);
    }

    #[test]
    fn comment_id_is_numeric_coerced() {
        let raw: ApiComment = serde_json::from_value(serde_json::json!({
            "id": "99",
            "content": "done",
            "posted_at": "2024-01-15T08:00:00Z"
        }))
        .unwrap();
        let comment = Comment::from(raw);
        assert_eq!(comment.id, 99);
        assert!(comment.attachment.is_none());
    }

    #[test]
    fn raw_task_round_trips_unknown_priority_default() {
        let raw: ApiTask = serde_json::from_value(serde_json::json!({
            "id": "1",
            "content": "x"
        }))
        .unwrap();
        assert_eq!(raw.priority, 1);
        assert!(raw.due.is_none());
    }
}
