use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use todoist_core::{CreateTaskArgs, Todoist, UpdateTaskArgs};

// --- Request types ---

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
struct TaskIdRequest {
    /// Todoist task id (numeric)
    task_id: i64,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
struct CreateProjectLabelRequest {
    /// Label name; must start with exactly "PROJECT: " (colon-space)
    project_name: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
struct CreateTaskCommentRequest {
    /// Todoist task id (numeric)
    task_id: i64,
    /// Comment text; an agent signature is appended automatically
    content: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
struct CreateTaskRequest {
    /// Task title
    title: String,
    /// Longer free-form description
    description: Option<String>,
    /// Project to create the task in; the personal inbox when omitted
    project_id: Option<i64>,
    /// Label names to attach
    labels: Option<Vec<String>>,
    /// Priority 1 (normal) to 4 (urgent)
    priority: Option<u8>,
    /// Due date as YYYY-MM-DD
    due_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
struct UpdateTaskRequest {
    /// Todoist task id (numeric)
    task_id: i64,
    /// New title. Renames leave an audit comment on the task.
    title: Option<String>,
    /// New description
    description: Option<String>,
    /// Replacement label set
    labels: Option<Vec<String>>,
    /// Priority 1 (normal) to 4 (urgent)
    priority: Option<u8>,
    /// Due date as YYYY-MM-DD
    due_date: Option<String>,
    /// Natural-language due date, e.g. "every monday" or "today"
    due_string: Option<String>,
    /// Destination project id (numeric)
    project_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
struct MoveTaskRequest {
    /// Todoist task id (numeric)
    task_id: i64,
    /// Destination project id (numeric)
    project_id: i64,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
struct GetTasksWithLabelRequest {
    /// Label name, with or without the "context:" prefix
    label: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
struct SearchTasksRequest {
    /// Free-text query; supports Todoist wildcard `*` and quoted phrases
    query: String,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
struct SearchTermsRequest {
    /// Search terms; every term must be non-empty
    search_terms: Vec<String>,
}

// --- Response helpers ---

fn json_response<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Ok(CallToolResult::success(vec![Content::text(json)])),
        Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
            "Error: {e}"
        ))])),
    }
}

fn error_response(e: todoist_core::Error) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(format!(
        "Error: {e}"
    ))]))
}

fn respond<T: Serialize>(result: todoist_core::Result<T>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => json_response(&value),
        Err(e) => error_response(e),
    }
}

fn respond_text(result: todoist_core::Result<String>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) => error_response(e),
    }
}

fn log_tool<T: Serialize>(name: &str, args: &T) {
    let json = serde_json::to_string_pretty(args).unwrap_or_else(|_| "<unserializable>".into());
    tracing::debug!(tool = name, args = %json, "tool call");
}

// --- Server ---

#[derive(Clone)]
pub struct TodoistServer {
    todoist: Arc<Todoist>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TodoistServer {
    pub fn new(todoist: Todoist) -> Self {
        Self {
            todoist: Arc::new(todoist),
            tool_router: Self::tool_router(),
        }
    }

    // Inbox buckets

    #[tool(description = "List tasks in the personal Inbox project")]
    async fn list_personal_inbox_tasks(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "list_personal_inbox_tasks", "tool call");
        respond(self.todoist.personal_inbox_tasks().await)
    }

    #[tool(description = "List tasks Becky has dropped into Brian's inbox")]
    async fn list_brian_inbox_per_becky_tasks(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "list_brian_inbox_per_becky_tasks", "tool call");
        respond(self.todoist.brian_inbox_per_becky_tasks().await)
    }

    #[tool(description = "List tasks Brian has dropped into Becky's inbox")]
    async fn list_becky_inbox_per_brian_tasks(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "list_becky_inbox_per_brian_tasks", "tool call");
        respond(self.todoist.becky_inbox_per_brian_tasks().await)
    }

    // GTD views

    #[tool(description = "List tasks in the Next actions project")]
    async fn list_next_actions(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "list_next_actions", "tool call");
        respond(self.todoist.next_actions().await)
    }

    #[tool(description = "List all tasks across the GTD project trees (Projects and Brian projects)")]
    async fn list_gtd_projects(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "list_gtd_projects", "tool call");
        respond(self.todoist.gtd_projects().await)
    }

    #[tool(description = "List tasks in the Waiting project (delegated, blocked on someone else)")]
    async fn get_waiting_tasks(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_waiting_tasks", "tool call");
        respond(self.todoist.waiting_tasks().await)
    }

    #[tool(description = "List tasks in the Tickler project (deferred to a future trigger date)")]
    async fn get_tickler_tasks(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_tickler_tasks", "tool call");
        respond(self.todoist.tickler_tasks().await)
    }

    #[tool(description = "List tasks in the Areas of focus project")]
    async fn get_areas_of_focus(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_areas_of_focus", "tool call");
        respond(self.todoist.areas_of_focus().await)
    }

    #[tool(description = "List the shopping list")]
    async fn get_shopping_list(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_shopping_list", "tool call");
        respond(self.todoist.shopping_list().await)
    }

    #[tool(description = "List media added in the last 30 days")]
    async fn get_recent_media(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_recent_media", "tool call");
        respond(self.todoist.recent_media().await)
    }

    // Date-driven views

    #[tool(description = "List tasks due today or overdue (household date views exclude the baby projects)")]
    async fn get_tasks_due_today(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_tasks_due_today", "tool call");
        respond(self.todoist.tasks_due_today().await)
    }

    #[tool(description = "List chores due today or overdue")]
    async fn get_chores_due_today(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_chores_due_today", "tool call");
        respond(self.todoist.chores_due_today().await)
    }

    #[tool(description = "List tasks due tomorrow")]
    async fn get_tasks_due_tomorrow(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_tasks_due_tomorrow", "tool call");
        respond(self.todoist.tasks_due_tomorrow().await)
    }

    #[tool(description = "List tasks due in the next 7 days")]
    async fn get_tasks_due_this_week(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_tasks_due_this_week", "tool call");
        respond(self.todoist.tasks_due_this_week().await)
    }

    #[tool(description = "List Brian's time-sensitive tasks")]
    async fn list_brian_time_sensitive_tasks(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "list_brian_time_sensitive_tasks", "tool call");
        respond(self.todoist.brian_time_sensitive_tasks().await)
    }

    #[tool(description = "List Becky's time-sensitive tasks")]
    async fn list_becky_time_sensitive_tasks(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "list_becky_time_sensitive_tasks", "tool call");
        respond(self.todoist.becky_time_sensitive_tasks().await)
    }

    // Project and label directory

    #[tool(description = "List Brian's private GTD projects")]
    async fn get_brian_only_projects(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_brian_only_projects", "tool call");
        respond(self.todoist.brian_only_projects().await)
    }

    #[tool(description = "List the shared projects owned by Brian")]
    async fn get_brian_shared_projects(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_brian_shared_projects", "tool call");
        respond(self.todoist.brian_shared_projects().await)
    }

    #[tool(description = "List the shared projects owned by Becky")]
    async fn get_becky_shared_projects(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_becky_shared_projects", "tool call");
        respond(self.todoist.becky_shared_projects().await)
    }

    #[tool(description = "List the three inbox projects")]
    async fn get_inbox_projects(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_inbox_projects", "tool call");
        respond(self.todoist.inbox_projects().await)
    }

    #[tool(description = "List all context labels (names starting with \"context:\")")]
    async fn get_context_labels(&self) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_context_labels", "tool call");
        respond(self.todoist.context_labels().await)
    }

    #[tool(
        description = "Create a project-marker label. The name must start with exactly \"PROJECT: \"."
    )]
    async fn create_project_label(
        &self,
        Parameters(req): Parameters<CreateProjectLabelRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("create_project_label", &req);
        respond(self.todoist.directory().create_project_label(&req.project_name).await)
    }

    // Label and text search

    #[tool(
        description = "List tasks carrying a label. Context labels (\"context:...\") search everywhere; other labels exclude the GTD project trees."
    )]
    async fn get_tasks_with_label(
        &self,
        Parameters(req): Parameters<GetTasksWithLabelRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("get_tasks_with_label", &req);
        respond(self.todoist.tasks_with_label(&req.label).await)
    }

    #[tool(description = "Free-text task search. Supports `*` wildcards and quoted phrases.")]
    async fn search_tasks(
        &self,
        Parameters(req): Parameters<SearchTasksRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("search_tasks", &req);
        respond(self.todoist.search_tasks(&req.query).await)
    }

    #[tool(description = "Search for tasks matching ALL of the given terms")]
    async fn search_tasks_using_and(
        &self,
        Parameters(req): Parameters<SearchTermsRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("search_tasks_using_and", &req);
        respond(self.todoist.search_tasks_using_and(&req.search_terms).await)
    }

    #[tool(description = "Search for tasks matching ANY of the given terms")]
    async fn search_tasks_using_or(
        &self,
        Parameters(req): Parameters<SearchTermsRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("search_tasks_using_or", &req);
        respond(self.todoist.search_tasks_using_or(&req.search_terms).await)
    }

    // Comments

    #[tool(description = "List all comments on a task")]
    async fn get_task_comments(
        &self,
        Parameters(req): Parameters<TaskIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("get_task_comments", &req);
        respond(self.todoist.get_task_comments(req.task_id).await)
    }

    #[tool(description = "Add a comment to a task (signed as agent-authored)")]
    async fn create_task_comment(
        &self,
        Parameters(req): Parameters<CreateTaskCommentRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("create_task_comment", &req);
        respond(self.todoist.create_task_comment(req.task_id, &req.content).await)
    }

    // Mutations

    #[tool(description = "Create a new task")]
    async fn create_task(
        &self,
        Parameters(req): Parameters<CreateTaskRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("create_task", &req);
        respond_text(
            self.todoist
                .create_task(CreateTaskArgs {
                    title: req.title,
                    description: req.description,
                    project_id: req.project_id,
                    labels: req.labels,
                    priority: req.priority,
                    due_date: req.due_date,
                })
                .await,
        )
    }

    #[tool(description = "Update fields on an existing task; only supplied fields change")]
    async fn update_task(
        &self,
        Parameters(req): Parameters<UpdateTaskRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("update_task", &req);
        respond_text(
            self.todoist
                .update_task(UpdateTaskArgs {
                    task_id: req.task_id,
                    title: req.title,
                    description: req.description,
                    labels: req.labels,
                    priority: req.priority,
                    due_date: req.due_date,
                    due_string: req.due_string,
                    project_id: req.project_id,
                })
                .await,
        )
    }

    #[tool(
        description = "Complete a task. Tasks in Brian shared projects are refused; use complete_becky_task for those."
    )]
    async fn complete_task(
        &self,
        Parameters(req): Parameters<TaskIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("complete_task", &req);
        respond_text(self.todoist.complete_task(req.task_id).await)
    }

    #[tool(description = "Reopen a completed task")]
    async fn uncomplete_task(
        &self,
        Parameters(req): Parameters<TaskIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("uncomplete_task", &req);
        match self.todoist.uncomplete_task(req.task_id).await {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text("Task reopened")])),
            Err(e) => error_response(e),
        }
    }

    #[tool(description = "Move a task to another project")]
    async fn move_task(
        &self,
        Parameters(req): Parameters<MoveTaskRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("move_task", &req);
        respond_text(self.todoist.move_task(req.task_id, req.project_id).await)
    }

    #[tool(
        description = "Complete a task on Becky's behalf: reschedule it to today, leave a status comment, and move it to \"Becky inbox - per Brian\". Earlier steps stand if a later one fails."
    )]
    async fn complete_becky_task(
        &self,
        Parameters(req): Parameters<TaskIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        log_tool("complete_becky_task", &req);
        respond_text(self.todoist.complete_becky_task(req.task_id).await)
    }
}

const INSTRUCTIONS: &str = r#"Household Todoist assistant.

The household runs a shared GTD setup: Brian's private buckets (Projects,
Next actions, Waiting, Tickler, Someday, ...), shared projects owned by each
person (e.g. "Brian errands", "Becky time sensitive"), and three inboxes
(Inbox, "Brian inbox - per Becky", "Becky inbox - per Brian").

Use the list_*/get_* tools for the named views rather than composing your own
searches; they encode the household's exclusion rules. Completing a task in a
Brian shared project requires complete_becky_task, which reschedules the task
to today, leaves a status comment, and routes it to Becky's per-Brian inbox
for review."#;

#[tool_handler]
impl ServerHandler for TodoistServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        // stdout carries the MCP transport; logs go to stderr
        .with_writer(std::io::stderr)
        .init();

    let todoist = Todoist::from_env()?;
    let service = TodoistServer::new(todoist)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use todoist_core::{DiskCache, TodoistClient};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Every tool name the catalog promises, argument-taking and not.
    const TOOL_CATALOG: [&str; 34] = [
        "list_personal_inbox_tasks",
        "list_brian_inbox_per_becky_tasks",
        "list_becky_inbox_per_brian_tasks",
        "list_next_actions",
        "get_brian_only_projects",
        "get_brian_shared_projects",
        "get_becky_shared_projects",
        "get_inbox_projects",
        "get_context_labels",
        "get_tasks_due_today",
        "get_chores_due_today",
        "get_task_comments",
        "create_project_label",
        "create_task_comment",
        "update_task",
        "create_task",
        "move_task",
        "get_tasks_with_label",
        "complete_task",
        "uncomplete_task",
        "search_tasks",
        "search_tasks_using_and",
        "search_tasks_using_or",
        "complete_becky_task",
        "get_tasks_due_tomorrow",
        "get_tasks_due_this_week",
        "get_tickler_tasks",
        "list_gtd_projects",
        "get_waiting_tasks",
        "get_recent_media",
        "get_areas_of_focus",
        "get_shopping_list",
        "list_brian_time_sensitive_tasks",
        "list_becky_time_sensitive_tasks",
    ];

    fn server_with(server: &MockServer, tmp: &tempfile::TempDir) -> TodoistServer {
        let client = TodoistClient::with_base_urls("t", server.uri(), server.uri());
        TodoistServer::new(Todoist::new(
            client,
            DiskCache::new(tmp.path().into(), Duration::from_secs(600)),
        ))
    }

    fn text_of(result: &CallToolResult) -> &str {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    #[tokio::test]
    async fn every_catalog_tool_is_routed() {
        let mock = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();
        let server = server_with(&mock, &tmp);
        for name in TOOL_CATALOG {
            assert!(
                server.tool_router.map.contains_key(name),
                "{name} is not routed"
            );
        }
        assert_eq!(server.tool_router.map.len(), TOOL_CATALOG.len());
        assert!(!server.tool_router.map.contains_key("unknown_tool_xyz"));
    }

    #[tokio::test]
    async fn query_tools_return_one_text_content_item() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "1", "content": "Buy milk"}
            ])))
            .mount(&mock)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let server = server_with(&mock, &tmp);
        let result = server.get_waiting_tasks().await.unwrap();
        assert_eq!(result.content.len(), 1);
        assert_eq!(result.is_error, Some(false));

        let parsed: serde_json::Value = serde_json::from_str(text_of(&result)).unwrap();
        assert_eq!(parsed["total_count"], 1);
        assert_eq!(parsed["tasks"][0]["id"], 1);
    }

    #[tokio::test]
    async fn validation_failures_become_error_text() {
        let mock = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();
        let server = server_with(&mock, &tmp);

        let result = server
            .search_tasks(Parameters(SearchTasksRequest { query: "".into() }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Error: Search query cannot be empty");
        assert!(mock.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_becky_inbox_surfaces_the_not_found_message() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let server = server_with(&mock, &tmp);
        let result = server
            .complete_becky_task(Parameters(TaskIdRequest { task_id: 4 }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            text_of(&result),
            "Error: Project \"Becky inbox - per Brian\" not found"
        );
    }

    #[tokio::test]
    async fn bad_label_prefix_is_rejected_before_any_request() {
        let mock = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();
        let server = server_with(&mock, &tmp);

        let result = server
            .create_project_label(Parameters(CreateProjectLabelRequest {
                project_name: "Garden".into(),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            text_of(&result),
            "Error: Project label name must start with \"PROJECT: \""
        );
        assert!(mock.received_requests().await.unwrap().is_empty());
    }
}
