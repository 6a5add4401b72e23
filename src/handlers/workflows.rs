//! # Workflow API Handlers
//!
//! This module contains handlers for submitting a document to the analysis
//! pipeline and polling the resulting job. Submission answers immediately;
//! the pipeline itself runs on a spawned task and reports progress through
//! the job registry and its durable session mirror.

use async_trait::async_trait;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::UserExtension;
use crate::error::{ApiError, validation_error};
use crate::repositories::WorkflowSessionRepository;
use crate::server::AppState;
use crate::workflow::{
    Job, JobStatus, StageHook, StageKey, StageRecord, StageStatus, WorkflowInput,
    WorkflowJobStore,
};

/// Multipart form accepted by the upload endpoint
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// Document file to analyze
    #[schema(value_type = String, format = Binary)]
    pub document: String,
}

/// Acknowledgement returned when a document is accepted for processing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobAccepted {
    /// Identifier to poll on the status endpoint
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub job_id: Uuid,
    /// Job status at acceptance (always running)
    pub status: JobStatus,
    /// Stage records at acceptance, all pending
    pub stages: Vec<StageRecord>,
}

/// The `document` part of the multipart body, fully read.
struct DocumentUpload {
    file_name: String,
    bytes: Vec<u8>,
}

/// Wires pipeline transitions into the job registry and its durable mirror.
///
/// The registry mutation is the source of truth; the mirror refresh is
/// best-effort and a failed write only logs.
struct JobProgressHook {
    jobs: WorkflowJobStore,
    sessions: WorkflowSessionRepository,
    job_id: Uuid,
    user_id: Uuid,
}

#[async_trait]
impl StageHook for JobProgressHook {
    async fn on_stage(&self, stage: StageKey, status: StageStatus, message: &str) {
        self.jobs.mark_stage(self.job_id, stage, status, message);
        self.mirror().await;
    }
}

impl JobProgressHook {
    /// Copy the latest registry snapshot into the session row.
    async fn mirror(&self) {
        let Some(job) = self.jobs.get(self.job_id, self.user_id) else {
            return;
        };
        if let Err(err) = self.sessions.upsert_snapshot(&job).await {
            tracing::warn!(
                job_id = %self.job_id,
                "Failed to mirror workflow session: {}",
                err.message
            );
        }
    }
}

/// Submit a document for asynchronous analysis
#[utoipa::path(
    post,
    path = "/upload-async",
    security(("bearer_auth" = [])),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Document accepted; poll the status endpoint with the returned job id", body = JobAccepted),
        (status = 400, description = "No document file in the request", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn upload_async(
    State(state): State<AppState>,
    UserExtension(user): UserExtension,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JobAccepted>), ApiError> {
    let upload = read_document_field(multipart).await?;

    let job = state.jobs.create(user.0, upload.file_name.clone());
    // The durable row must exist before the caller is told to poll; a
    // failure here fails the whole submission.
    state.sessions.insert_new(&job).await?;

    tracing::info!(
        job_id = %job.job_id,
        user_id = %user.0,
        file_name = %job.file_name,
        "Workflow job accepted"
    );

    let input = WorkflowInput {
        user_id: user.0,
        file_name: upload.file_name,
        bytes: upload.bytes,
    };
    let hook = JobProgressHook {
        jobs: state.jobs.clone(),
        sessions: state.sessions.clone(),
        job_id: job.job_id,
        user_id: user.0,
    };
    let runner = state.runner.clone();

    tokio::spawn(async move {
        match runner.run(input, &hook).await {
            Ok(outcome) => {
                hook.jobs.complete(hook.job_id, outcome.into_result());
                hook.mirror().await;
            }
            Err(err) => {
                tracing::error!(job_id = %hook.job_id, "Workflow run failed: {}", err);
                // Stage failures already moved the job to failed through the
                // hook, where fail() is a no-op; this records the errors no
                // stage bracket captured.
                hook.jobs.fail(hook.job_id, err.to_string());
                hook.mirror().await;
            }
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id: job.job_id,
            status: job.status,
            stages: job.stages,
        }),
    ))
}

/// Poll the current snapshot of a workflow job
#[utoipa::path(
    get,
    path = "/workflow-status/{job_id}",
    security(("bearer_auth" = [])),
    params(
        ("job_id" = String, Path, description = "Job identifier returned at submission")
    ),
    responses(
        (status = 200, description = "Current job snapshot", body = Job),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "No such job for this user", body = ApiError)
    ),
    tag = "workflows"
)]
pub async fn workflow_status(
    State(state): State<AppState>,
    UserExtension(user): UserExtension,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    let not_found =
        || ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Workflow job not found");

    // A malformed id cannot name a job, so it reads the same as an unknown
    // one; callers cannot tell the two apart.
    let job_id = Uuid::parse_str(&job_id).map_err(|_| not_found())?;

    state
        .jobs
        .get(job_id, user.0)
        .map(Json)
        .ok_or_else(not_found)
}

/// Pull the `document` part out of the multipart body. The first matching
/// part wins; anything else in the form is ignored.
async fn read_document_field(mut multipart: Multipart) -> Result<DocumentUpload, ApiError> {
    let malformed = |detail: String| {
        validation_error(
            "Malformed multipart body",
            json!({ "document": detail }),
        )
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| malformed(err.to_string()))?
    {
        if field.name() != Some("document") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(ToString::to_string)
            .unwrap_or_else(|| "document".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|err| malformed(err.to_string()))?;

        return Ok(DocumentUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Err(validation_error(
        "Missing document file",
        json!({ "document": "Required file field is missing" }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{
        AgentRunOutput, AgentRunRequest, DocumentProcessor, ProcessorError, ReportGenerated,
        ReportRequest,
    };
    use crate::config::AppConfig;
    use crate::repositories::{ComplianceRuleRepository, DocumentRepository};
    use crate::server::{AppState, create_app};
    use crate::workflow::PipelineRunner;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};
    use sea_orm::{Database, DatabaseConnection};
    use std::sync::Arc;
    use tokio::sync::Semaphore;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "test-secret-key";
    const BOUNDARY: &str = "workflow-test-boundary";

    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        use migration::MigratorTrait;
        migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn agent_output() -> AgentRunOutput {
        serde_json::from_value(json!({
            "structured_data": {"parties": ["ACME Corp"]},
            "compliance": {"summary": {"status": "PASS", "violations_count": 0}, "violations": []},
            "decision": {"score": 0.87, "risk_category": "LOW", "confidence": 0.91},
            "alerts": [],
            "models_used": ["deepseek-chat"],
        }))
        .unwrap()
    }

    /// Processor stub: optionally gated on a semaphore so a run can be held
    /// open while the test inspects the running job.
    struct StubProcessor {
        gate: Option<Arc<Semaphore>>,
        run_result: Result<AgentRunOutput, String>,
    }

    impl StubProcessor {
        fn succeeding() -> Self {
            Self {
                gate: None,
                run_result: Ok(agent_output()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                gate: None,
                run_result: Err(message.to_string()),
            }
        }

        fn gated(gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                run_result: Ok(agent_output()),
            }
        }
    }

    #[async_trait]
    impl DocumentProcessor for StubProcessor {
        async fn run_agents(
            &self,
            _request: AgentRunRequest,
        ) -> Result<AgentRunOutput, ProcessorError> {
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.ok();
            }
            self.run_result.clone().map_err(ProcessorError::Transport)
        }

        async fn generate_report(
            &self,
            _request: ReportRequest,
        ) -> Result<ReportGenerated, ProcessorError> {
            Ok(ReportGenerated {
                report_path: "reports/generated/test.pdf".to_string(),
            })
        }
    }

    async fn setup_app(processor: Arc<dyn DocumentProcessor>) -> (Router, AppState) {
        let db = setup_test_db().await;
        let config = AppConfig {
            jwt_secret: TEST_SECRET.to_string(),
            ..AppConfig::default()
        };
        let state = AppState {
            config: Arc::new(config),
            db: db.clone(),
            jobs: WorkflowJobStore::new(Duration::minutes(60)),
            runner: PipelineRunner::new(
                processor,
                ComplianceRuleRepository::new(db.clone()),
                DocumentRepository::new(db.clone()),
            ),
            sessions: WorkflowSessionRepository::new(db.clone()),
        };
        (create_app(state.clone()), state)
    }

    fn mint_token(sub: Uuid) -> String {
        let claims = crate::auth::Claims {
            sub,
            exp: (chrono::Utc::now() + Duration::hours(1)).timestamp() as usize,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn multipart_upload(field_name: &str, file_name: &str, bytes: &[u8]) -> Body {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{file_name}\"\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn upload_request(token: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload-async")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(body)
            .unwrap()
    }

    fn status_request(token: &str, job_id: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(format!("/workflow-status/{job_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn poll_until_terminal(app: &Router, token: &str, job_id: &str) -> serde_json::Value {
        for _ in 0..200 {
            let response = app
                .clone()
                .oneshot(status_request(token, job_id))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let job = json_body(response).await;
            if job["status"] != "running" {
                return job;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("job never reached a terminal status");
    }

    async fn wait_for_terminal_row(
        state: &AppState,
        job_id: Uuid,
        user_id: Uuid,
    ) -> crate::models::workflow_session::Model {
        for _ in 0..200 {
            if let Some(row) = state
                .sessions
                .find_for_user(job_id, user_id)
                .await
                .unwrap()
            {
                if row.status != "running" {
                    return row;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("session row never reached a terminal status");
    }

    #[tokio::test]
    async fn upload_requires_authentication() {
        let (app, _state) = setup_app(Arc::new(StubProcessor::succeeding())).await;

        let request = Request::builder()
            .method("POST")
            .uri("/upload-async")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(multipart_upload("document", "filing.pdf", b"contract body"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn upload_without_document_field_is_rejected() {
        let (app, _state) = setup_app(Arc::new(StubProcessor::succeeding())).await;
        let token = mint_token(Uuid::new_v4());

        let response = app
            .oneshot(upload_request(
                &token,
                multipart_upload("attachment", "filing.pdf", b"contract body"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["message"], "Missing document file");
    }

    #[tokio::test]
    async fn accepted_response_lists_every_stage_pending() {
        let gate = Arc::new(Semaphore::new(0));
        let (app, state) = setup_app(Arc::new(StubProcessor::gated(gate.clone()))).await;
        let user_id = Uuid::new_v4();
        let token = mint_token(user_id);

        let response = app
            .clone()
            .oneshot(upload_request(
                &token,
                multipart_upload("document", "filing.pdf", b"contract body"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        assert_eq!(body["status"], "running");
        let stages = body["stages"].as_array().unwrap();
        assert_eq!(stages.len(), 7);
        assert!(stages.iter().all(|stage| stage["status"] == "pending"));

        // The durable row exists before the caller is told to poll.
        let job_id = Uuid::parse_str(body["job_id"].as_str().unwrap()).unwrap();
        let row = state
            .sessions
            .find_for_user(job_id, user_id)
            .await
            .unwrap()
            .expect("session row should exist at acceptance");
        assert_eq!(row.status, "running");

        gate.add_permits(1);
    }

    #[tokio::test]
    async fn job_runs_to_completion_after_acceptance() {
        let (app, state) = setup_app(Arc::new(StubProcessor::succeeding())).await;
        let user_id = Uuid::new_v4();
        let token = mint_token(user_id);

        let response = app
            .clone()
            .oneshot(upload_request(
                &token,
                multipart_upload("document", "filing.pdf", b"contract body"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let accepted = json_body(response).await;
        let job_id = accepted["job_id"].as_str().unwrap().to_string();

        let job = poll_until_terminal(&app, &token, &job_id).await;
        assert_eq!(job["status"], "completed");
        assert_eq!(job["current_stage"], "DONE");
        assert!(job["result"]["document_id"].is_string());
        assert_eq!(job["result"]["report_path"], "reports/generated/test.pdf");
        assert!(
            job["stages"]
                .as_array()
                .unwrap()
                .iter()
                .all(|stage| stage["status"] == "completed")
        );
        assert!(job["error"].is_null());

        let row =
            wait_for_terminal_row(&state, Uuid::parse_str(&job_id).unwrap(), user_id).await;
        assert_eq!(row.status, "completed");
        assert_eq!(row.current_stage, "DONE");
        assert!(row.result.is_some());
        assert!(row.error_text.is_none());
    }

    #[tokio::test]
    async fn failed_run_reports_the_stage_and_error() {
        let (app, state) =
            setup_app(Arc::new(StubProcessor::failing("agent service unreachable"))).await;
        let user_id = Uuid::new_v4();
        let token = mint_token(user_id);

        let response = app
            .clone()
            .oneshot(upload_request(
                &token,
                multipart_upload("document", "filing.pdf", b"contract body"),
            ))
            .await
            .unwrap();
        let accepted = json_body(response).await;
        let job_id = accepted["job_id"].as_str().unwrap().to_string();

        let job = poll_until_terminal(&app, &token, &job_id).await;
        assert_eq!(job["status"], "failed");
        assert!(
            job["error"]
                .as_str()
                .unwrap()
                .contains("agent service unreachable")
        );
        assert!(job["result"].is_null());

        let stages = job["stages"].as_array().unwrap();
        assert_eq!(stages[0]["key"], "INGESTION");
        assert_eq!(stages[0]["status"], "completed");
        assert_eq!(stages[1]["key"], "DOCUMENT_AGENT");
        assert_eq!(stages[1]["status"], "failed");
        assert_eq!(stages[2]["status"], "pending");

        let row =
            wait_for_terminal_row(&state, Uuid::parse_str(&job_id).unwrap(), user_id).await;
        assert_eq!(row.status, "failed");
        assert!(
            row.error_text
                .unwrap()
                .contains("agent service unreachable")
        );
    }

    #[tokio::test]
    async fn upload_fails_when_the_session_row_cannot_be_recorded() {
        let (app, state) = setup_app(Arc::new(StubProcessor::succeeding())).await;
        use sea_orm::ConnectionTrait;
        state
            .db
            .execute_unprepared("DROP TABLE workflow_sessions")
            .await
            .unwrap();
        let token = mint_token(Uuid::new_v4());

        let response = app
            .oneshot(upload_request(
                &token,
                multipart_upload("document", "filing.pdf", b"contract body"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn status_of_unknown_job_is_not_found() {
        let (app, _state) = setup_app(Arc::new(StubProcessor::succeeding())).await;
        let token = mint_token(Uuid::new_v4());

        let response = app
            .oneshot(status_request(&token, &Uuid::new_v4().to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "Workflow job not found");
    }

    #[tokio::test]
    async fn status_hides_jobs_of_other_users() {
        let gate = Arc::new(Semaphore::new(0));
        let (app, _state) = setup_app(Arc::new(StubProcessor::gated(gate.clone()))).await;
        let owner_token = mint_token(Uuid::new_v4());
        let stranger_token = mint_token(Uuid::new_v4());

        let response = app
            .clone()
            .oneshot(upload_request(
                &owner_token,
                multipart_upload("document", "filing.pdf", b"contract body"),
            ))
            .await
            .unwrap();
        let accepted = json_body(response).await;
        let job_id = accepted["job_id"].as_str().unwrap().to_string();

        let own = app
            .clone()
            .oneshot(status_request(&owner_token, &job_id))
            .await
            .unwrap();
        assert_eq!(own.status(), StatusCode::OK);

        // A foreign job answers exactly like a missing one.
        let foreign = app
            .clone()
            .oneshot(status_request(&stranger_token, &job_id))
            .await
            .unwrap();
        assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
        let body = json_body(foreign).await;
        assert_eq!(body["message"], "Workflow job not found");

        gate.add_permits(1);
    }

    #[tokio::test]
    async fn malformed_job_id_reads_as_not_found() {
        let (app, _state) = setup_app(Arc::new(StubProcessor::succeeding())).await;
        let token = mint_token(Uuid::new_v4());

        let response = app
            .oneshot(status_request(&token, "not-a-uuid"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Workflow job not found");
    }
}
