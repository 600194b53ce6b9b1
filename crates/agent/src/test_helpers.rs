//! Shared test helpers for agent tests.

use async_trait::async_trait;
use cardwise_core::args::ToolArgs;
use cardwise_core::error::{ProviderError, ToolError};
use cardwise_core::provider::{Provider, ProviderRequest, ProviderResponse};
use cardwise_core::tool::Tool;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A provider that replays scripted completions in order.
///
/// Once the script runs out it repeats the fallback, if one was set, and
/// otherwise panics.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback: Option<String>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Self {
        Self::with_results(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `reply`.
    pub fn repeating(reply: &str) -> Self {
        Self {
            fallback: Some(reply.to_string()),
            ..Self::new(vec![])
        }
    }

    /// Sleep before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.prompts.lock().unwrap().push(request.prompt);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        let content = match (next, &self.fallback) {
            (Some(result), _) => result?,
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => panic!("ScriptedProvider: script exhausted"),
        };

        Ok(ProviderResponse {
            content,
            model: "scripted-model".into(),
            usage: None,
        })
    }
}

/// A tool that returns a fixed value and ignores its arguments.
pub struct StubTool {
    name: String,
    value: Value,
}

impl StubTool {
    pub fn new(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Returns a fixed value"
    }

    fn params(&self) -> &[&str] {
        &["id"]
    }

    async fn execute(&self, _args: ToolArgs) -> Result<Value, ToolError> {
        Ok(self.value.clone())
    }
}
