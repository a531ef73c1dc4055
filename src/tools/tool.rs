//! Tool trait and closure-based tool wrappers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::types::{AgentToolParameters, ToolDefinition};
use crate::error::ParleyError;

/// Context available during tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    pub tool_call_id: Option<String>,
    pub tool_name: Option<String>,
    /// Additional metadata for the tool.
    pub metadata: serde_json::Value,
}

/// Core tool trait — implement to create custom tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> &AgentToolParameters;

    /// Whether the user must approve each call before it runs.
    fn needs_approval(&self) -> bool {
        false
    }

    /// Whether this tool can run here. Client tools return `false`.
    fn has_execute(&self) -> bool {
        true
    }

    /// Execute the tool with parsed arguments.
    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ParleyError>;

    /// Definition advertised to adapters.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters().schema.clone(),
            needs_approval: self.needs_approval(),
        }
    }
}

type ToolHandler = dyn Fn(
        ToolArguments,
        ToolExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ParleyError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct AgentTool {
    name: String,
    description: String,
    parameters: AgentToolParameters,
    needs_approval: bool,
    handler: Arc<ToolHandler>,
}

impl AgentTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, ParleyError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            needs_approval: false,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }

    /// Require user approval before each execution.
    pub fn with_approval(mut self) -> Self {
        self.needs_approval = true;
        self
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    fn needs_approval(&self) -> bool {
        self.needs_approval
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ParleyError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("needs_approval", &self.needs_approval)
            .finish()
    }
}

/// A tool the client executes. The server only advertises it.
#[derive(Debug, Clone)]
pub struct ClientTool {
    name: String,
    description: String,
    parameters: AgentToolParameters,
}

impl ClientTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[async_trait]
impl Tool for ClientTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    fn has_execute(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        _args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ParleyError> {
        Err(ParleyError::tool(
            &self.name,
            format!("Tool {} does not have an execute function", self.name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn agent_tool_runs_its_handler() {
        let tool = AgentTool::new(
            "greet",
            "Greet a person",
            AgentToolParameters::object().string("name", "Name", true).build(),
            |args, _ctx| async move {
                let name = args.get_str("name")?;
                Ok(serde_json::json!({ "greeting": format!("Hello, {name}!") }))
            },
        );
        let result = tool
            .execute(
                &ToolArguments::new(serde_json::json!({"name": "World"})),
                &ToolExecutionContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(result["greeting"], "Hello, World!");
        assert!(tool.has_execute());
        assert!(!tool.needs_approval());
    }

    #[test]
    fn definition_reflects_approval_flag() {
        let tool = AgentTool::new("rm", "Delete", AgentToolParameters::empty(), |_, _| async {
            Ok(serde_json::Value::Null)
        })
        .with_approval();
        let definition = tool.definition();
        assert_eq!(definition.name, "rm");
        assert!(definition.needs_approval);
    }

    #[tokio::test]
    async fn client_tool_cannot_execute() {
        let tool = ClientTool::new("pickColor", "Ask the user", AgentToolParameters::empty());
        assert!(!tool.has_execute());
        let err = tool
            .execute(&ToolArguments::new(serde_json::json!({})), &ToolExecutionContext::default())
            .await
            .unwrap_err();
        assert!(err.user_message().contains("does not have an execute function"));
    }
}
