//! Disk-cached project and label directory.

use serde::Serialize;

use crate::cache::DiskCache;
use crate::client::TodoistClient;
use crate::error::{Error, Result};
use crate::models::{ApiLabel, ApiProject, Label, LabelList, Project, ProjectList};

const PROJECTS_FILE: &str = "projects.json";
const LABELS_FILE: &str = "labels.json";

/// Required prefix (colon-space) when creating a project-marker label.
pub const PROJECT_MARKER_PREFIX: &str = "PROJECT: ";
/// The marker view matches on the bare prefix, space not required.
const PROJECT_VIEW_PREFIX: &str = "PROJECT:";
/// Label name prefix for situational context tags.
pub const CONTEXT_PREFIX: &str = "context:";

const PROJECT_LABEL_COLOR: &str = "charcoal";

#[derive(Debug, Serialize)]
struct CreateLabelPayload<'a> {
    name: &'a str,
    color: &'a str,
}

#[derive(Debug, Clone)]
pub struct Directory {
    client: TodoistClient,
    cache: DiskCache,
}

impl Directory {
    pub fn new(client: TodoistClient, cache: DiskCache) -> Self {
        Directory { client, cache }
    }

    /// Full project list, from the cache file when it is fresh. A fresh
    /// file is returned verbatim, its embedded `cached_at` included; any
    /// read or parse problem falls through to a live fetch and overwrite.
    pub async fn list_projects(&self) -> Result<ProjectList> {
        if let Some(cached) = self.cache.read_if_fresh::<ProjectList>(PROJECTS_FILE) {
            return Ok(cached);
        }
        self.refresh_projects()
            .await
            .map_err(Error::wrap("get projects"))
    }

    async fn refresh_projects(&self) -> Result<ProjectList> {
        let raw: Vec<ApiProject> = self.client.get_rest("projects", &[]).await?;
        let list = ProjectList {
            projects: raw.into_iter().map(Project::from).collect(),
            cached_at: chrono::Utc::now().to_rfc3339(),
        };
        tracing::debug!(count = list.projects.len(), "refreshed project cache");
        if let Err(e) = self.cache.write(PROJECTS_FILE, &list) {
            tracing::warn!(error = %e, "could not persist project cache");
        }
        Ok(list)
    }

    /// Full label list; same caching algorithm, independent file.
    pub async fn list_labels(&self) -> Result<LabelList> {
        if let Some(cached) = self.cache.read_if_fresh::<LabelList>(LABELS_FILE) {
            return Ok(cached);
        }
        self.refresh_labels()
            .await
            .map_err(Error::wrap("get labels"))
    }

    async fn refresh_labels(&self) -> Result<LabelList> {
        let raw: Vec<ApiLabel> = self.client.get_rest("labels", &[]).await?;
        let list = LabelList {
            labels: raw.into_iter().map(Label::from).collect(),
            cached_at: chrono::Utc::now().to_rfc3339(),
        };
        tracing::debug!(count = list.labels.len(), "refreshed label cache");
        if let Err(e) = self.cache.write(LABELS_FILE, &list) {
            tracing::warn!(error = %e, "could not persist label cache");
        }
        Ok(list)
    }

    /// Labels acting as project markers (`PROJECT: ` prefix). Derived from
    /// the full set on every call, never cached separately.
    pub async fn project_labels(&self) -> Result<Vec<Label>> {
        let list = self.list_labels().await?;
        Ok(list
            .labels
            .into_iter()
            .filter(|l| l.name.starts_with(PROJECT_VIEW_PREFIX))
            .collect())
    }

    /// Situational context labels (`context:` prefix).
    pub async fn context_labels(&self) -> Result<Vec<Label>> {
        let list = self.list_labels().await?;
        Ok(list
            .labels
            .into_iter()
            .filter(|l| l.name.starts_with(CONTEXT_PREFIX))
            .collect())
    }

    /// Create a project-marker label. Names must start with exactly
    /// `"PROJECT: "`; anything else is rejected before any request is made.
    pub async fn create_project_label(&self, name: &str) -> Result<Label> {
        if !name.starts_with(PROJECT_MARKER_PREFIX) {
            return Err(Error::Validation(format!(
                "Project label name must start with \"{PROJECT_MARKER_PREFIX}\""
            )));
        }
        let payload = CreateLabelPayload {
            name,
            color: PROJECT_LABEL_COLOR,
        };
        let raw: ApiLabel = self
            .client
            .post_rest("labels", &payload)
            .await
            .map_err(Error::wrap("create project label"))?;
        Ok(Label::from(raw))
    }

    /// Exact-name lookup against the (cached) directory.
    pub async fn find_project(&self, name: &str) -> Result<Option<Project>> {
        let list = self.list_projects().await?;
        Ok(list.projects.into_iter().find(|p| p.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn directory(server: &MockServer, dir: &tempfile::TempDir, ttl: Duration) -> Directory {
        let client = TodoistClient::with_base_urls("t", server.uri(), server.uri());
        Directory::new(client, DiskCache::new(dir.path().into(), ttl))
    }

    fn project_body() -> serde_json::Value {
        serde_json::json!([
            {"id": "1", "name": "Inbox", "url": "u1", "is_inbox_project": true},
            {"id": "2", "name": "Chores", "url": "u2", "is_favorite": true}
        ])
    }

    #[tokio::test]
    async fn second_call_within_ttl_hits_the_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_body()))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dir = directory(&server, &tmp, Duration::from_secs(60));

        let first = dir.list_projects().await.unwrap();
        let second = dir.list_projects().await.unwrap();
        assert_eq!(first.projects.len(), 2);
        // verbatim replay, embedded timestamp included
        assert_eq!(first.cached_at, second.cached_at);
        assert!(second.projects[0].is_inbox);
    }

    #[tokio::test]
    async fn stale_cache_refetches_and_overwrites() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_body()))
            .expect(2)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dir = directory(&server, &tmp, Duration::ZERO);

        dir.list_projects().await.unwrap();
        dir.list_projects().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_cache_file_falls_through_to_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_body()))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("projects.json"), "{broken").unwrap();
        let dir = directory(&server, &tmp, Duration::from_secs(60));
        let list = dir.list_projects().await.unwrap();
        assert_eq!(list.projects.len(), 2);
    }

    #[tokio::test]
    async fn label_views_filter_by_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "10", "name": "PROJECT: Garden", "color": "charcoal"},
                {"id": "11", "name": "context:home", "color": "blue"},
                {"id": "12", "name": "errand", "color": "red"}
            ])))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dir = directory(&server, &tmp, Duration::from_secs(60));

        let markers = dir.project_labels().await.unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "PROJECT: Garden");

        let contexts = dir.context_labels().await.unwrap();
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].name, "context:home");
    }

    #[tokio::test]
    async fn create_project_label_rejects_bad_prefix_without_calling_out() {
        let server = MockServer::start().await;
        // no mock mounted: any request would 404 and fail the test body below
        let tmp = tempfile::tempdir().unwrap();
        let dir = directory(&server, &tmp, Duration::from_secs(60));

        let err = dir.create_project_label("Garden").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Project label name must start with \"PROJECT: \""
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_project_label_posts_fixed_color() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/labels"))
            .and(body_json(serde_json::json!({
                "name": "PROJECT: Garden",
                "color": "charcoal"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(
                {"id": "10", "name": "PROJECT: Garden", "color": "charcoal", "order": 1}
            )))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dir = directory(&server, &tmp, Duration::from_secs(60));
        let label = dir.create_project_label("PROJECT: Garden").await.unwrap();
        assert_eq!(label.id, 10);
        assert_eq!(label.color, "charcoal");
    }
}
