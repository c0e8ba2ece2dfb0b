use async_trait::async_trait;
use chrono::NaiveDate;
use kanban::{
    Assignee, NewTask, Priority, Project, StoreError, StoreResult, Task, TaskStatus, TaskStore,
    clamp_progress,
};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

/// Client for the hosted database's REST endpoint (PostgREST dialect).
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
    }

    /// Send a request and decode the row array PostgREST answers with.
    async fn rows<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> StoreResult<Vec<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    pub async fn health_check(&self) -> StoreResult<()> {
        let request = self
            .request(reqwest::Method::GET, "projects")
            .query(&[("select", "id"), ("limit", "1")]);
        self.rows::<serde_json::Value>(request).await.map(|_| ())
    }
}

#[async_trait]
impl TaskStore for ApiClient {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let request = self
            .request(reqwest::Method::GET, "projects")
            .query(&[("select", "*"), ("order", "name.asc")]);
        let rows: Vec<ProjectRow> = self.rows(request).await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn list_tasks(&self, project_id: &str) -> StoreResult<Vec<Task>> {
        let request = self.request(reqwest::Method::GET, "tasks").query(&[
            ("project_id", format!("eq.{}", project_id)),
            ("select", "*".to_string()),
            ("order", "code.asc".to_string()),
        ]);
        let rows: Vec<TaskRow> = self.rows(request).await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn update_task_status(&self, task_id: &str, status: &TaskStatus) -> StoreResult<()> {
        let request = self
            .request(reqwest::Method::PATCH, "tasks")
            .query(&[("id", format!("eq.{}", task_id))])
            .json(&serde_json::json!({ "status": status }));

        let rows: Vec<serde_json::Value> = self.rows(request).await?;
        if rows.is_empty() {
            return Err(StoreError::task_not_found(task_id));
        }
        Ok(())
    }

    async fn create_task(&self, task: NewTask) -> StoreResult<Task> {
        let request = self
            .request(reqwest::Method::POST, "tasks")
            .json(&NewTaskRow::from(task));

        let rows: Vec<TaskRow> = self.rows(request).await?;
        rows.into_iter()
            .next()
            .map(Task::from)
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    async fn delete_task(&self, task_id: &str) -> StoreResult<()> {
        let request = self
            .request(reqwest::Method::DELETE, "tasks")
            .query(&[("id", format!("eq.{}", task_id))]);

        let rows: Vec<serde_json::Value> = self.rows(request).await?;
        if rows.is_empty() {
            return Err(StoreError::task_not_found(task_id));
        }
        Ok(())
    }
}

/// PostgREST errors look like `{"message": "...", "code": "..."}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Ids are uuids in some tables and serial integers in others.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct ProjectRow {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
    code: Option<String>,
    client: Option<String>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            code: row.code,
            client: row.client,
        }
    }
}

/// Flat row of the `tasks` table.
#[derive(Debug, Deserialize)]
struct TaskRow {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    code: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    project_id: String,
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    assignee_name: Option<String>,
    assignee_avatar: Option<String>,
    assignee_role: Option<String>,
    tags: Option<Vec<String>>,
    progress: Option<i64>,
    start_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let priority = match row.priority.as_deref() {
            None => Priority::default(),
            Some(raw) => Priority::parse(raw).unwrap_or_else(|| {
                tracing::debug!(task_id = %row.id, priority = raw, "unknown priority, using Medium");
                Priority::default()
            }),
        };

        let assignee = row.assignee_name.filter(|n| !n.trim().is_empty()).map(|name| Assignee {
            name,
            avatar: row.assignee_avatar,
            role: row.assignee_role,
        });

        Task {
            code: row.code.unwrap_or_else(|| row.id.clone()),
            id: row.id,
            project_id: row.project_id,
            title: row.title.unwrap_or_default(),
            description: row.description.filter(|d| !d.is_empty()),
            status: TaskStatus::parse(row.status.as_deref().unwrap_or_default()),
            priority,
            assignee,
            tags: row.tags.unwrap_or_default().into_iter().collect(),
            progress: clamp_progress(row.progress.unwrap_or(0)),
            start_date: row.start_date,
            due_date: row.due_date,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewTaskRow {
    project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    priority: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_role: Option<String>,
    tags: Vec<String>,
    progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
}

impl From<NewTask> for NewTaskRow {
    fn from(task: NewTask) -> Self {
        let (assignee_name, assignee_avatar, assignee_role) = match task.assignee {
            Some(a) => (Some(a.name), a.avatar, a.role),
            None => (None, None, None),
        };

        Self {
            project_id: task.project_id,
            code: task.code,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority.label(),
            assignee_name,
            assignee_avatar,
            assignee_role,
            tags: task.tags.into_iter().collect(),
            progress: task.progress.min(100),
            start_date: task.start_date,
            due_date: task.due_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&format!("{}/", server.uri()), "secret")
    }

    #[tokio::test]
    async fn test_list_tasks_maps_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("project_id", "eq.42"))
            .and(header("apikey", "secret"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": 7,
                    "code": "T007",
                    "project_id": 42,
                    "title": "Coordinate MEP clashes",
                    "description": "",
                    "status": "S1",
                    "priority": "High",
                    "assignee_name": "Linh Tran",
                    "assignee_avatar": null,
                    "assignee_role": "BIM Coordinator",
                    "tags": ["mep", "clash"],
                    "progress": 130,
                    "start_date": "2024-03-01",
                    "due_date": null
                },
                {
                    "id": "b8e0",
                    "project_id": "42",
                    "title": "Old row",
                    "status": "Archived"
                }
            ])))
            .mount(&server)
            .await;

        let tasks = client(&server).list_tasks("42").await.unwrap();

        assert_eq!(tasks.len(), 2);
        let first = &tasks[0];
        assert_eq!(first.id, "7");
        assert_eq!(first.status, TaskStatus::S1);
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.progress, 100);
        assert_eq!(first.description, None);
        assert_eq!(first.assignee.as_ref().map(|a| a.name.as_str()), Some("Linh Tran"));
        assert!(first.tags.contains("clash"));
        assert_eq!(first.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));

        let second = &tasks[1];
        assert_eq!(second.code, "b8e0");
        assert_eq!(second.status, TaskStatus::Unrecognized("Archived".to_string()));
        assert_eq!(second.priority, Priority::Medium);
        assert!(second.assignee.is_none());
    }

    #[tokio::test]
    async fn test_update_status_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/tasks"))
            .and(query_param("id", "eq.t1"))
            .and(body_json(serde_json::json!({ "status": "Completed" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": "t1" }])))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .update_task_status("t1", &TaskStatus::Completed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let result = client(&server).update_task_status("gone", &TaskStatus::S0).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_rejected_request_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/tasks"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "code": "42501",
                "message": "permission denied for table tasks"
            })))
            .mount(&server)
            .await;

        let result = client(&server).update_task_status("t1", &TaskStatus::S0).await;
        match result {
            Err(StoreError::Rejected { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "permission denied for table tasks");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_task_returns_inserted_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/tasks"))
            .and(header("prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{
                "id": "new-1",
                "code": "T010",
                "project_id": "p1",
                "title": "Issue IFC model",
                "status": "Open",
                "progress": 0
            }])))
            .mount(&server)
            .await;

        let task = client(&server)
            .create_task(NewTask::new("p1", "Issue IFC model"))
            .await
            .unwrap();

        assert_eq!(task.id, "new-1");
        assert_eq!(task.status, TaskStatus::Open);
    }

    #[tokio::test]
    async fn test_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:1", "secret");
        let result = client.list_tasks("p1").await;
        assert!(matches!(result, Err(StoreError::Transport(_))));
    }

    #[test]
    fn test_error_message_falls_back_to_body() {
        assert_eq!(error_message("upstream timeout\n"), "upstream timeout");
        assert_eq!(error_message(r#"{"message":"bad"}"#), "bad");
    }
}
