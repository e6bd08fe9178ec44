// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Five-step request submission wizard.
//!
//! Each step consumes the previous one, so the only way to reach submit is
//! through project selection, type selection, a non-empty description, and
//! impact/urgency. Dropping a step mid-flight discards everything entered;
//! there is no draft state. Requires a bearer-authenticated [`ApiClient`].

use vestibule_core::types::{Attachment, Project, RequestType};
use vestibule_core::VestibuleError;

use crate::api::{ApiClient, NewRequest};

/// Step 1: pick a project from the account's list.
pub struct ProjectStep {
    api: ApiClient,
    projects: Vec<Project>,
}

/// Step 2: classify the request.
#[derive(Debug)]
pub struct TypeStep {
    api: ApiClient,
    project: Project,
}

/// Step 3: describe the request.
pub struct DescriptionStep {
    api: ApiClient,
    project: Project,
    request_type: RequestType,
}

/// Step 4: rate impact and urgency.
#[derive(Debug)]
pub struct LevelsStep {
    api: ApiClient,
    project: Project,
    request_type: RequestType,
    description: String,
}

/// Step 5: attach files, then submit.
pub struct AttachStep {
    api: ApiClient,
    project: Project,
    request_type: RequestType,
    description: String,
    impact: String,
    urgency: String,
    attachments: Vec<Attachment>,
}

/// Start the wizard by loading the account's projects.
pub async fn begin(api: ApiClient) -> Result<ProjectStep, VestibuleError> {
    let projects = api.list_projects().await?;
    Ok(ProjectStep { api, projects })
}

impl ProjectStep {
    /// The projects available to the authenticated account.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn select(self, project_id: &str) -> Result<TypeStep, VestibuleError> {
        let project = self
            .projects
            .into_iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| VestibuleError::NotFound(format!("project {project_id}")))?;
        Ok(TypeStep {
            api: self.api,
            project,
        })
    }
}

impl TypeStep {
    pub fn select(self, request_type: RequestType) -> DescriptionStep {
        DescriptionStep {
            api: self.api,
            project: self.project,
            request_type,
        }
    }
}

impl DescriptionStep {
    /// The description must be non-empty after trimming.
    pub fn describe(self, description: &str) -> Result<LevelsStep, VestibuleError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(VestibuleError::InvalidInput(
                "description must not be empty".to_string(),
            ));
        }
        Ok(LevelsStep {
            api: self.api,
            project: self.project,
            request_type: self.request_type,
            description: description.to_string(),
        })
    }
}

impl LevelsStep {
    pub fn rate(self, impact: &str, urgency: &str) -> AttachStep {
        AttachStep {
            api: self.api,
            project: self.project,
            request_type: self.request_type,
            description: self.description,
            impact: impact.to_string(),
            urgency: urgency.to_string(),
            attachments: Vec::new(),
        }
    }
}

impl AttachStep {
    /// Attach an uploaded file descriptor. Zero attachments is fine.
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// The single terminal call: creates one request and returns its id.
    pub async fn submit(self) -> Result<String, VestibuleError> {
        let request = NewRequest {
            project_id: self.project.id,
            request_type: self.request_type,
            description: self.description,
            impact: self.impact,
            urgency: self.urgency,
            attachments: self.attachments,
        };
        self.api.create_request(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vestibule_config::ClientConfig;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn authed_api(server: &MockServer) -> ApiClient {
        ApiClient::new(&ClientConfig {
            api_base_url: server.uri(),
            poll_interval_secs: 5,
            booking_url: None,
            captcha_token: None,
        })
        .unwrap()
        .with_bearer_token("tok-1".to_string())
    }

    async fn mount_projects(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/projects"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "projects": [
                    { "id": "p1", "name": "Site redesign", "status": "active" },
                    { "id": "p2", "name": "Brand refresh", "status": "active" },
                ]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn wizard_walks_all_five_steps_and_submits_once() {
        let server = MockServer::start().await;
        mount_projects(&server).await;
        Mock::given(method("POST"))
            .and(path("/requests"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_partial_json(serde_json::json!({
                "project_id": "p1",
                "request_type": "bug",
                "description": "Checkout button 404s",
                "impact": "High",
                "urgency": "Urgent",
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "req-1" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let step = begin(authed_api(&server)).await.unwrap();
        assert_eq!(step.projects().len(), 2);

        let id = step
            .select("p1")
            .unwrap()
            .select(RequestType::Bug)
            .describe("Checkout button 404s")
            .unwrap()
            .rate("High", "Urgent")
            .submit()
            .await
            .unwrap();
        assert_eq!(id, "req-1");
    }

    #[tokio::test]
    async fn attachments_are_forwarded_on_submit() {
        let server = MockServer::start().await;
        mount_projects(&server).await;
        Mock::given(method("POST"))
            .and(path("/requests"))
            .and(body_partial_json(serde_json::json!({
                "attachments": [{
                    "file_name": "shot.png",
                    "content_type": "image/png",
                    "size": 64,
                    "url": "http://files.example/uploads/abc/shot.png",
                    "key": "uploads/abc/shot.png",
                }]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "req-2" })),
            )
            .mount(&server)
            .await;

        let id = begin(authed_api(&server))
            .await
            .unwrap()
            .select("p2")
            .unwrap()
            .select(RequestType::Change)
            .describe("Swap hero image")
            .unwrap()
            .rate("Low", "Normal")
            .attach(Attachment {
                file_name: "shot.png".to_string(),
                content_type: "image/png".to_string(),
                size: 64,
                url: "http://files.example/uploads/abc/shot.png".to_string(),
                key: "uploads/abc/shot.png".to_string(),
            })
            .submit()
            .await
            .unwrap();
        assert_eq!(id, "req-2");
    }

    #[tokio::test]
    async fn unknown_project_selection_fails() {
        let server = MockServer::start().await;
        mount_projects(&server).await;

        let step = begin(authed_api(&server)).await.unwrap();
        let err = step.select("p9").unwrap_err();
        assert!(matches!(err, VestibuleError::NotFound(_)), "got: {err}");
    }

    #[tokio::test]
    async fn empty_description_is_rejected_locally() {
        let server = MockServer::start().await;
        mount_projects(&server).await;

        let err = begin(authed_api(&server))
            .await
            .unwrap()
            .select("p1")
            .unwrap()
            .select(RequestType::New)
            .describe("   ")
            .unwrap_err();
        assert!(matches!(err, VestibuleError::InvalidInput(_)), "got: {err}");
    }
}
