//! The operations behind every tool: named task views, mutations, and the
//! cross-person workflows, all built on one filter primitive and the two
//! caches.

use serde::Serialize;

use crate::cache::{DiskCache, TaskNameCache};
use crate::client::{IdKind, TodoistClient};
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::filters::{self, Filter};
use crate::models::{
    ApiComment, ApiTask, Comment, CommentList, LabelGroup, Project, ProjectGroup, Task, TaskList,
};
use crate::taxonomy;

/// Suffix appended to every human-authored comment so they read as
/// agent-authored in the Todoist UI.
pub const COMMENT_SIGNATURE: &str = "\n\n(added by the Todoist assistant)";

/// Fixed wording of the status comment the cross-person completion leaves.
const BECKY_COMPLETION_NOTE: &str = "Completed by Brian";

#[derive(Debug, Clone, Default)]
pub struct CreateTaskArgs {
    pub title: String,
    pub description: Option<String>,
    pub project_id: Option<i64>,
    pub labels: Option<Vec<String>>,
    pub priority: Option<u8>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskArgs {
    pub task_id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
    pub priority: Option<u8>,
    pub due_date: Option<String>,
    pub due_string: Option<String>,
    pub project_id: Option<i64>,
}

/// Absent fields stay out of the wire payload entirely.
#[derive(Debug, Default, Serialize)]
struct TaskPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_string: Option<String>,
}

#[derive(Debug, Serialize)]
struct CommentPayload {
    task_id: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct MovePayload {
    project_id: String,
}

pub struct Todoist {
    client: TodoistClient,
    directory: Directory,
    names: TaskNameCache,
}

impl Todoist {
    pub fn new(client: TodoistClient, cache: DiskCache) -> Self {
        Todoist {
            directory: Directory::new(client.clone(), cache),
            client,
            names: TaskNameCache::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(TodoistClient::from_env()?, DiskCache::default()))
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    // --- Query engine ---

    /// The single filter primitive. Empty result sets come back as an
    /// empty vec, never as an error.
    async fn fetch_by_filter(&self, filter: &Filter) -> Result<Vec<ApiTask>> {
        let rendered = filter.render();
        tracing::debug!(filter = %rendered, "fetching tasks");
        self.client
            .get_rest("tasks", &[("filter", rendered.as_str())])
            .await
    }

    /// Project raw tasks to the canonical shape, feeding the name cache
    /// along the way. Every structured view goes through here.
    fn project_tasks(&self, raw: Vec<ApiTask>) -> TaskList {
        let tasks: Vec<Task> = raw.into_iter().map(Task::from).collect();
        for task in &tasks {
            self.names.set(task.id, task.content.clone());
        }
        TaskList {
            total_count: tasks.len(),
            tasks,
        }
    }

    async fn structured(&self, filter: Filter) -> Result<TaskList> {
        Ok(self.project_tasks(self.fetch_by_filter(&filter).await?))
    }

    // Structured views.

    pub async fn tasks_due_today(&self) -> Result<TaskList> {
        self.structured(filters::due_today())
            .await
            .map_err(Error::wrap("get tasks due today"))
    }

    pub async fn waiting_tasks(&self) -> Result<TaskList> {
        self.structured(filters::waiting())
            .await
            .map_err(Error::wrap("get waiting tasks"))
    }

    pub async fn next_actions(&self) -> Result<TaskList> {
        self.structured(filters::next_actions())
            .await
            .map_err(Error::wrap("list next actions"))
    }

    pub async fn personal_inbox_tasks(&self) -> Result<TaskList> {
        self.structured(filters::personal_inbox())
            .await
            .map_err(Error::wrap("list personal inbox tasks"))
    }

    pub async fn brian_inbox_per_becky_tasks(&self) -> Result<TaskList> {
        self.structured(filters::brian_inbox_per_becky())
            .await
            .map_err(Error::wrap("list Brian inbox tasks"))
    }

    pub async fn becky_inbox_per_brian_tasks(&self) -> Result<TaskList> {
        self.structured(filters::becky_inbox_per_brian())
            .await
            .map_err(Error::wrap("list Becky inbox tasks"))
    }

    pub async fn brian_time_sensitive_tasks(&self) -> Result<TaskList> {
        self.structured(filters::brian_time_sensitive())
            .await
            .map_err(Error::wrap("list Brian time sensitive tasks"))
    }

    pub async fn becky_time_sensitive_tasks(&self) -> Result<TaskList> {
        self.structured(filters::becky_time_sensitive())
            .await
            .map_err(Error::wrap("list Becky time sensitive tasks"))
    }

    pub async fn areas_of_focus(&self) -> Result<TaskList> {
        self.structured(filters::areas_of_focus())
            .await
            .map_err(Error::wrap("get areas of focus"))
    }

    pub async fn shopping_list(&self) -> Result<TaskList> {
        self.structured(filters::shopping_list())
            .await
            .map_err(Error::wrap("get shopping list"))
    }

    /// Tasks across the GTD project trees, fetched tree by tree in a fixed
    /// order, strictly sequentially.
    pub async fn gtd_projects(&self) -> Result<TaskList> {
        let mut all = Vec::new();
        for tree in filters::GTD_PROJECT_TREES {
            let batch = self
                .fetch_by_filter(&filters::gtd_project_tree(tree))
                .await
                .map_err(Error::wrap("list GTD projects"))?;
            all.extend(batch);
        }
        Ok(self.project_tasks(all))
    }

    pub async fn tasks_with_label(&self, label: &str) -> Result<TaskList> {
        self.structured(filters::label_search(label))
            .await
            .map_err(Error::wrap("get tasks with label"))
    }

    pub async fn search_tasks(&self, query: &str) -> Result<TaskList> {
        let filter = filters::plain_search(query)?;
        self.structured(filter)
            .await
            .map_err(Error::wrap("search tasks"))
    }

    pub async fn search_tasks_using_and(&self, terms: &[String]) -> Result<TaskList> {
        let filter = filters::and_search(terms)?;
        self.structured(filter)
            .await
            .map_err(Error::wrap("search tasks"))
    }

    pub async fn search_tasks_using_or(&self, terms: &[String]) -> Result<TaskList> {
        let filter = filters::or_search(terms)?;
        self.structured(filter)
            .await
            .map_err(Error::wrap("search tasks"))
    }

    // Raw-passthrough views. These return the unprojected backend shape;
    // downstream consumers of these particular tools expect it.

    pub async fn chores_due_today(&self) -> Result<Vec<ApiTask>> {
        self.fetch_by_filter(&filters::chores_due_today())
            .await
            .map_err(Error::wrap("get chores due today"))
    }

    pub async fn tickler_tasks(&self) -> Result<Vec<ApiTask>> {
        self.fetch_by_filter(&filters::tickler())
            .await
            .map_err(Error::wrap("get tickler tasks"))
    }

    pub async fn tasks_due_tomorrow(&self) -> Result<Vec<ApiTask>> {
        self.fetch_by_filter(&filters::due_tomorrow())
            .await
            .map_err(Error::wrap("get tasks due tomorrow"))
    }

    pub async fn tasks_due_this_week(&self) -> Result<Vec<ApiTask>> {
        self.fetch_by_filter(&filters::due_this_week())
            .await
            .map_err(Error::wrap("get tasks due this week"))
    }

    pub async fn recent_media(&self) -> Result<Vec<ApiTask>> {
        self.fetch_by_filter(&filters::recent_media())
            .await
            .map_err(Error::wrap("get recent media"))
    }

    // Single-task reads.

    async fn get_raw_task(&self, id: i64) -> Result<ApiTask> {
        self.client.get_rest(&format!("tasks/{id}"), &[]).await
    }

    pub async fn get_task(&self, id: i64) -> Result<Task> {
        let raw = self
            .get_raw_task(id)
            .await
            .map_err(Error::wrap("get task"))?;
        let task = Task::from(raw);
        self.names.set(task.id, task.content.clone());
        Ok(task)
    }

    // --- Task name cache ---

    /// Last-known title for a task, fetching through on a miss. A
    /// fetch-through failure propagates as-is; the cache adds no wrapping.
    pub async fn task_name(&self, id: i64) -> Result<String> {
        if let Some(name) = self.names.get(id) {
            return Ok(name);
        }
        Ok(self.get_task(id).await?.content)
    }

    pub fn set_task_name(&self, id: i64, name: impl Into<String>) {
        self.names.set(id, name);
    }

    pub fn clear_task_names(&self) {
        self.names.clear();
    }

    // --- Directory-backed groupings ---

    async fn project_group(&self, keep: fn(&str) -> bool) -> Result<ProjectGroup> {
        let list = self.directory.list_projects().await?;
        let projects: Vec<Project> = list.projects.into_iter().filter(|p| keep(&p.name)).collect();
        Ok(ProjectGroup {
            total_count: projects.len(),
            projects,
        })
    }

    pub async fn brian_only_projects(&self) -> Result<ProjectGroup> {
        self.project_group(taxonomy::is_brian_only_project)
            .await
            .map_err(Error::wrap("get Brian-only projects"))
    }

    pub async fn brian_shared_projects(&self) -> Result<ProjectGroup> {
        self.project_group(taxonomy::is_brian_shared_project)
            .await
            .map_err(Error::wrap("get Brian shared projects"))
    }

    pub async fn becky_shared_projects(&self) -> Result<ProjectGroup> {
        self.project_group(taxonomy::is_becky_shared_project)
            .await
            .map_err(Error::wrap("get Becky shared projects"))
    }

    pub async fn inbox_projects(&self) -> Result<ProjectGroup> {
        self.project_group(taxonomy::is_inbox_project)
            .await
            .map_err(Error::wrap("get inbox projects"))
    }

    pub async fn context_labels(&self) -> Result<LabelGroup> {
        let labels = self
            .directory
            .context_labels()
            .await
            .map_err(Error::wrap("get context labels"))?;
        Ok(LabelGroup {
            total_count: labels.len(),
            labels,
        })
    }

    // --- Mutations ---

    pub async fn create_task(&self, args: CreateTaskArgs) -> Result<String> {
        self.create_task_inner(args)
            .await
            .map_err(Error::wrap("create task"))
    }

    async fn create_task_inner(&self, args: CreateTaskArgs) -> Result<String> {
        if args.title.trim().is_empty() {
            return Err(Error::Validation("Task title is required".into()));
        }
        let payload = TaskPayload {
            content: Some(args.title),
            description: args.description,
            project_id: args.project_id.map(|id| id.to_string()),
            labels: args.labels,
            priority: args.priority,
            due_date: args.due_date,
            due_string: None,
        };
        let created: ApiTask = self.client.post_rest("tasks", &payload).await?;
        let task = Task::from(created);
        self.names.set(task.id, task.content.clone());
        Ok(format!("Created task \"{}\"", task.content))
    }

    pub async fn update_task(&self, args: UpdateTaskArgs) -> Result<String> {
        self.update_task_inner(args)
            .await
            .map_err(Error::wrap("update task"))
    }

    async fn update_task_inner(&self, args: UpdateTaskArgs) -> Result<String> {
        // The rename side-protocol needs the old title before the update
        // lands. A failure anywhere in the protocol fails the whole update,
        // even though the field mutation itself may have gone through.
        let old_title = match &args.title {
            Some(_) => Some(self.task_name(args.task_id).await?),
            None => None,
        };

        let payload = TaskPayload {
            content: args.title.clone(),
            description: args.description,
            project_id: args.project_id.map(|id| id.to_string()),
            labels: args.labels,
            priority: args.priority,
            due_date: args.due_date,
            due_string: args.due_string,
        };
        let updated: ApiTask = self
            .client
            .post_rest(&format!("tasks/{}", args.task_id), &payload)
            .await?;

        if let (Some(old), Some(new)) = (old_title, args.title) {
            self.post_audit_comment(
                args.task_id,
                &format!("Task renamed from \"{old}\" to \"{new}\""),
            )
            .await?;
            self.names.set(args.task_id, new);
        }

        Ok(format!("Updated task \"{}\"", updated.content))
    }

    /// Machine-authored audit trail; posted without the signature suffix.
    async fn post_audit_comment(&self, task_id: i64, content: &str) -> Result<()> {
        let payload = CommentPayload {
            task_id: task_id.to_string(),
            content: content.to_string(),
        };
        let _: ApiComment = self.client.post_rest("comments", &payload).await?;
        Ok(())
    }

    pub async fn complete_task(&self, task_id: i64) -> Result<String> {
        self.complete_task_inner(task_id)
            .await
            .map_err(Error::wrap("complete task"))
    }

    async fn complete_task_inner(&self, task_id: i64) -> Result<String> {
        // Ownership guard: tasks in Brian shared projects go through the
        // cross-person workflow, never through a plain close.
        let task = self.get_raw_task(task_id).await?;
        let projects = self.directory.list_projects().await?;
        if let Some(owner) = projects
            .projects
            .iter()
            .find(|p| p.id.to_string() == task.project_id)
        {
            if taxonomy::is_brian_shared_project(&owner.name) {
                return Err(Error::Guard(format!(
                    "Task \"{}\" belongs to the Brian shared project \"{}\"; \
                     use complete_becky_task instead",
                    task.content, owner.name
                )));
            }
        }
        self.client
            .post_rest_empty(&format!("tasks/{task_id}/close"))
            .await?;
        Ok(format!("Completed task {task_id}"))
    }

    pub async fn uncomplete_task(&self, task_id: i64) -> Result<()> {
        self.client
            .post_rest_empty(&format!("tasks/{task_id}/reopen"))
            .await
            .map_err(Error::wrap("uncomplete task"))
    }

    /// Move a task between projects. Both ids arrive in the legacy numeric
    /// space; the move endpoint only exists on the unified surface, so both
    /// are translated first.
    pub async fn move_task(&self, task_id: i64, project_id: i64) -> Result<String> {
        self.move_task_inner(task_id, project_id)
            .await
            .map_err(Error::wrap("move task"))
    }

    async fn move_task_inner(&self, task_id: i64, project_id: i64) -> Result<String> {
        let task_uid = self.client.translate_id(IdKind::Tasks, task_id).await?;
        let project_uid = self.client.translate_id(IdKind::Projects, project_id).await?;
        self.client
            .post_api_empty(
                &format!("tasks/{task_uid}/move"),
                &MovePayload {
                    project_id: project_uid,
                },
            )
            .await?;
        Ok(format!("Moved task {task_id} to project {project_id}"))
    }

    pub async fn create_task_comment(&self, task_id: i64, content: &str) -> Result<Comment> {
        self.create_task_comment_inner(task_id, content)
            .await
            .map_err(Error::wrap("create comment"))
    }

    async fn create_task_comment_inner(&self, task_id: i64, content: &str) -> Result<Comment> {
        let payload = CommentPayload {
            task_id: task_id.to_string(),
            content: format!("{content}{COMMENT_SIGNATURE}"),
        };
        let raw: ApiComment = self.client.post_rest("comments", &payload).await?;
        Ok(Comment::from(raw))
    }

    pub async fn get_task_comments(&self, task_id: i64) -> Result<CommentList> {
        let raw: Vec<ApiComment> = self
            .client
            .get_rest("comments", &[("task_id", task_id.to_string().as_str())])
            .await
            .map_err(Error::wrap("get comments"))?;
        let comments: Vec<Comment> = raw.into_iter().map(Comment::from).collect();
        Ok(CommentList {
            total_count: comments.len(),
            comments,
        })
    }

    // --- Cross-person workflow ---

    /// Complete a task on Becky's behalf: reschedule it to today, leave the
    /// status comment, then move it to her per-Brian inbox. Steps run in
    /// that fixed order; a later failure leaves earlier steps in place.
    pub async fn complete_becky_task(&self, task_id: i64) -> Result<String> {
        let destination = self
            .directory
            .find_project(taxonomy::BECKY_INBOX_PER_BRIAN)
            .await
            .map_err(Error::wrap("complete Becky task"))?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Project \"{}\" not found",
                    taxonomy::BECKY_INBOX_PER_BRIAN
                ))
            })?;
        self.complete_becky_steps(task_id, &destination)
            .await
            .map_err(Error::wrap("complete Becky task"))
    }

    async fn complete_becky_steps(&self, task_id: i64, destination: &Project) -> Result<String> {
        let reschedule = TaskPayload {
            due_string: Some("today".into()),
            ..TaskPayload::default()
        };
        let _: ApiTask = self
            .client
            .post_rest(&format!("tasks/{task_id}"), &reschedule)
            .await?;
        self.create_task_comment(task_id, BECKY_COMPLETION_NOTE)
            .await?;
        self.move_task(task_id, destination.id).await?;
        Ok(format!(
            "Completed task {task_id} for Becky and moved it to \"{}\"",
            destination.name
        ))
    }
}
