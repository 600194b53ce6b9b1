//! End-to-end integration tests for the Cardwise agent.
//!
//! These tests exercise the full pipeline from user input to agent output:
//! fact extraction, prompt building, step parsing, tool execution against the
//! in-memory card backend, and the HTTP gateway.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cardwise_agent::{AgentService, IterationController, LabeledStepParser, Termination};
use cardwise_core::error::ProviderError;
use cardwise_core::event::EventBus;
use cardwise_core::provider::{Provider, ProviderRequest, ProviderResponse};
use cardwise_core::tool::ToolRegistry;
use cardwise_memory::InMemorySessionStore;
use cardwise_tools::{ApplicationStatus, CardBackend, InMemoryBackend};
use http_body_util::BodyExt;
use tower::ServiceExt;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted completions in sequence and
/// records every prompt it was sent.
struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, index: usize) -> String {
        self.prompts.lock().unwrap()[index].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let mut replies = self.replies.lock().unwrap();
        // the last reply repeats
        let content = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
        .expect("ScriptedProvider needs at least one reply");
        Ok(ProviderResponse {
            content,
            model: "mock".into(),
            usage: None,
        })
    }
}

struct Desk {
    service: AgentService,
    backend: Arc<InMemoryBackend>,
    tools: Arc<ToolRegistry>,
}

fn desk(provider: Arc<ScriptedProvider>) -> Desk {
    let backend = Arc::new(InMemoryBackend::default());
    let tools = Arc::new(cardwise_tools::registry(backend.clone()));
    let bus = Arc::new(EventBus::default());
    let controller = IterationController::new(
        provider,
        "mock",
        tools.clone(),
        Arc::new(LabeledStepParser),
        bus.clone(),
    );
    Desk {
        service: AgentService::new(controller, Arc::new(InMemorySessionStore::new()), bus),
        backend,
        tools,
    }
}

// ── E2E: Returning customer ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_returning_customer_sees_pending_application() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "Think: The customer gave her name, check her applications first.\n\
         Action: getCustomerApplications(\"Jane Smith\")",
        "Think: One pending application for the Chase Sapphire Preferred.\n\
         Action: respond: \"Welcome back, Jane! Your Chase Sapphire Preferred application APP-001 is pending.\"",
    ]));
    let desk = desk(provider.clone());
    desk.tools
        .invoke(
            "submitApplication",
            r#""Jane", "Smith", 60000, 1990-03-22, 1, "Chase Sapphire Preferred""#,
        )
        .await
        .unwrap();

    let outcome = desk.service.process_turn("web-1", "Hi, I'm Jane Smith.").await.unwrap();

    assert_eq!(
        outcome.answer,
        "Welcome back, Jane! Your Chase Sapphire Preferred application APP-001 is pending."
    );
    assert_eq!(outcome.termination, Termination::Answered);
    assert_eq!(outcome.tool_calls_made, 1);
    assert_eq!(provider.calls(), 2);

    // the tool result is handed to the model verbatim
    let second = provider.prompt(1);
    assert!(second.contains("Result: [{\"applicationId\":\"APP-001\""));
    assert!(second.contains("\"status\":\"PENDING\""));

    let trace = desk.service.get_trace("web-1").await.unwrap();
    assert_eq!(trace.matches("Action: ").count(), 2);

    let conversation = desk.service.get_conversation("web-1").await.unwrap().unwrap();
    assert_eq!(conversation.len(), 2);
}

// ── E2E: Apply, then cancel, across turns ────────────────────────────────

#[tokio::test]
async fn e2e_application_lifecycle_across_turns() {
    let provider = Arc::new(ScriptedProvider::new(&[
        // turn 1
        "Think: New customer, look them up.\nAction: getCustomerApplications(\"Jane Smith\")",
        "Think: No applications yet.\nAction: respond: Nice to meet you, Jane! How can I help?",
        // turn 2
        "Think: Find the card id for Venture X.\nAction: getCards()",
        "Think: Venture X is card 3. Name is in Known Facts.\n\
         Action: submitApplication({\"name\": \"Jane\", \"surname\": \"Smith\", \"salary\": 95000, \
         \"birthday\": \"1990-03-22\", \"cardId\": 3, \"cardName\": \"Venture X\"})",
        "Think: Submitted.\nAction: respond: Done! Your application ID is APP-001.",
        // turn 3
        "Think: Cancel the application from earlier.\nAction: cancelApplication(\"APP-001\")",
        "Think: Cancelled.\nAction: respond: Application APP-001 has been cancelled.",
    ]));
    let desk = desk(provider.clone());

    desk.service.process_turn("s1", "Hi, I'm Jane Smith.").await.unwrap();

    let outcome = desk
        .service
        .process_turn(
            "s1",
            "I'd like to apply for the Venture X. I earn 95000 a year, born 1990-03-22.",
        )
        .await
        .unwrap();
    assert_eq!(outcome.answer, "Done! Your application ID is APP-001.");
    assert_eq!(outcome.tool_calls_made, 2);

    // the second turn still knows who the customer is
    let first_of_turn_two = provider.prompt(2);
    assert!(first_of_turn_two.contains("- name: Jane\n- surname: Smith\n"));
    assert!(first_of_turn_two.contains("assistant: Nice to meet you, Jane! How can I help?"));

    let applications = desk.backend.customer_applications("Jane Smith").await;
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0].card_name, "Venture X");
    assert_eq!(applications[0].credit_score, 725);

    let outcome = desk.service.process_turn("s1", "Actually, please cancel it.").await.unwrap();
    assert_eq!(outcome.answer, "Application APP-001 has been cancelled.");
    assert_eq!(
        desk.backend.application("APP-001").await.unwrap().status,
        ApplicationStatus::Cancelled
    );

    let conversation = desk.service.get_conversation("s1").await.unwrap().unwrap();
    assert_eq!(conversation.len(), 6);
    assert_eq!(
        conversation.tools_used.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["cancelApplication", "getCards", "getCustomerApplications", "submitApplication"]
    );
}

// ── E2E: Recovery ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_tool_error_is_recovered() {
    let provider = Arc::new(ScriptedProvider::new(&[
        "Think: Look up card 99.\nAction: getCard(99)",
        "Think: That card does not exist, list the real ones.\nAction: getBonuses()",
        "Think: Answer with what we have.\nAction: respond: We don't have card 99, but here are our bonuses.",
    ]));
    let desk = desk(provider.clone());

    let outcome = desk.service.process_turn("s1", "Tell me about card 99").await.unwrap();

    assert_eq!(outcome.answer, "We don't have card 99, but here are our bonuses.");
    assert!(provider.prompt(1).contains("Error: getCard failed: Card not found: 99\n"));
    assert!(provider.prompt(2).contains("\"bonus\":"));
}

#[tokio::test]
async fn e2e_unparseable_model_exhausts_budget() {
    let provider = Arc::new(ScriptedProvider::new(&["Happy to help!"]));
    let desk = desk(provider.clone());

    let outcome = desk.service.process_turn("s1", "hello").await.unwrap();

    assert_eq!(outcome.answer, "");
    assert_eq!(outcome.termination, Termination::BudgetExhausted);
    assert_eq!(provider.calls(), 8);
    let trace = desk.service.get_trace("s1").await.unwrap();
    assert_eq!(trace.matches("Error: Format error:").count(), 8);
}

// ── E2E: HTTP gateway over an OpenAI-compatible endpoint ─────────────────

/// Serve a fake `/v1/chat/completions` that replays `replies`.
async fn fake_completions(replies: &[&str]) -> String {
    use axum::{Json, Router, extract::State, routing::post};

    type Replies = Arc<Mutex<VecDeque<String>>>;
    let replies: Replies = Arc::new(Mutex::new(replies.iter().map(|r| r.to_string()).collect()));

    let router = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                |State(replies): State<Replies>, Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["messages"][1]["content"], "Always respond in English.");
                    let content = replies.lock().unwrap().pop_front().unwrap_or_default();
                    Json(serde_json::json!({
                        "model": "fake-model",
                        "choices": [{"message": {"role": "assistant", "content": content}}]
                    }))
                },
            ),
        )
        .with_state(replies);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1")
}

#[tokio::test]
async fn e2e_http_chat_through_openai_compatible_provider() {
    let base_url = fake_completions(&[
        "Think: Show the catalogue.\nAction: getCards()",
        "Think: Summarise.\nAction: respond: \"We offer three cards.\"",
    ])
    .await;

    let mut config = cardwise_config::AppConfig::default();
    config.api_key = Some("sk-test".into());
    config.provider.base_url = base_url;

    let store = Arc::new(cardwise_gateway::session_store(&config));
    let service = cardwise_gateway::build_agent_service(&config, store).unwrap();
    let app = cardwise_gateway::build_router(Arc::new(service), config.gateway.max_body_bytes);

    let request = Request::builder()
        .method("POST")
        .uri("/api/agent/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({"sessionId": "http-1", "message": "What cards do you have?"})
                .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["response"], "We offer three cards.");
    assert_eq!(json["sessionId"], "http-1");
    assert_eq!(json["iterations"], 2);
    assert_eq!(json["toolCalls"], 1);

    let logs = Request::builder()
        .uri("/api/agent/logs/http-1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(logs).await.unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("Think: Show the catalogue.\nAction: getCards()\nResult: [{"));
    assert!(text.ends_with("Action: respond\nResult: We offer three cards.\n"));
}
