//! Chat completions against `OpenAI` through `async-openai`.
//!
//! The base URL can be overridden, which also covers Azure deployments and
//! local proxies that speak the same protocol.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatChoice, ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
    ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestSystemMessageContent,
    ChatCompletionRequestToolMessage, ChatCompletionRequestToolMessageContent,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
    ChatCompletionTool, ChatCompletionToolType, CompletionUsage, CreateChatCompletionRequest,
    FunctionCall, FunctionObject, ResponseFormat, ResponseFormatJsonSchema,
};
use async_trait::async_trait;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::agent::tool::{ToolCall, ToolDefinition};
use crate::error::AgentError;

/// Provider backed by the `OpenAI` chat completions endpoint.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    /// Builds a client from the key and optional base URL in `config`.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        let base = OpenAIConfig::new().with_api_key(&config.api_key);
        let openai = match config.base_url.as_deref() {
            Some(url) => base.with_api_base(url),
            None => base,
        };
        Self {
            client: Client::with_config(openai),
        }
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let completion = self
            .client
            .chat()
            .create(to_completion_request(request))
            .await
            .map_err(|e| AgentError::ApiRequest {
                message: e.to_string(),
                status: None,
            })?;

        let usage = completion.usage.map(to_usage).unwrap_or_default();
        Ok(first_choice(completion.choices)?.with_usage(usage))
    }
}

/// Maps a provider-agnostic request onto the SDK request type.
///
/// A JSON schema wins over plain JSON mode. A zero temperature is omitted so
/// reasoning models that reject the parameter still accept the request.
fn to_completion_request(request: &ChatRequest) -> CreateChatCompletionRequest {
    let response_format = if let Some(output) = &request.structured_output {
        Some(ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: None,
                name: output.name.clone(),
                schema: Some(output.schema.clone()),
                strict: Some(true),
            },
        })
    } else if request.json_mode {
        Some(ResponseFormat::JsonObject)
    } else {
        None
    };

    let tools: Vec<ChatCompletionTool> = request.tools.iter().map(to_function_tool).collect();

    CreateChatCompletionRequest {
        model: request.model.clone(),
        messages: request.messages.iter().map(to_sdk_message).collect(),
        temperature: request.temperature.filter(|t| *t != 0.0),
        max_completion_tokens: request.max_tokens,
        response_format,
        tools: (!tools.is_empty()).then_some(tools),
        ..Default::default()
    }
}

fn to_function_tool(definition: &ToolDefinition) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: definition.name.clone(),
            description: Some(definition.description.clone()),
            parameters: Some(definition.parameters.clone()),
            strict: None,
        },
    }
}

fn to_sdk_message(message: &ChatMessage) -> ChatCompletionRequestMessage {
    let text = message.content.clone();
    match message.role {
        Role::System => ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
            content: ChatCompletionRequestSystemMessageContent::Text(text),
            name: None,
        }),
        Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(text),
            name: None,
        }),
        Role::Tool => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
            content: ChatCompletionRequestToolMessageContent::Text(text),
            tool_call_id: message.tool_call_id.clone().unwrap_or_default(),
        }),
        Role::Assistant => {
            let calls: Vec<ChatCompletionMessageToolCall> = message
                .tool_calls
                .iter()
                .map(|call| ChatCompletionMessageToolCall {
                    id: call.id.clone(),
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect();

            #[allow(deprecated)]
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: (!text.is_empty())
                    .then_some(ChatCompletionRequestAssistantMessageContent::Text(text)),
                name: None,
                tool_calls: (!calls.is_empty()).then_some(calls),
                refusal: None,
                audio: None,
                function_call: None,
            })
        }
    }
}

/// Takes the first choice, failing when there is none or the model refused.
fn first_choice(choices: Vec<ChatChoice>) -> Result<ChatResponse, AgentError> {
    let choice = choices
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::ResponseParse {
            message: "completion returned no choices".to_string(),
            content: String::new(),
        })?;

    if let (None, Some(refusal)) = (&choice.message.content, &choice.message.refusal) {
        return Err(AgentError::ResponseParse {
            message: format!("model refused: {refusal}"),
            content: refusal.clone(),
        });
    }
    Ok(from_choice(choice))
}

fn from_choice(choice: ChatChoice) -> ChatResponse {
    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();

    ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        usage: TokenUsage::default(),
        tool_calls,
        finish_reason: choice
            .finish_reason
            .map(|reason| format!("{reason:?}").to_lowercase()),
    }
}

fn to_usage(usage: CompletionUsage) -> TokenUsage {
    TokenUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message::{self, StructuredOutput};

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![message::user_message("how are warranties defined?")],
            temperature: Some(0.0),
            max_tokens: Some(100),
            json_mode: false,
            structured_output: None,
            tools: Vec::new(),
        }
    }

    fn choice(message: serde_json::Value) -> ChatChoice {
        serde_json::from_value(serde_json::json!({
            "index": 0,
            "message": message,
            "finish_reason": "stop",
            "logprobs": null
        }))
        .unwrap_or_else(|e| panic!("bad choice fixture: {e}"))
    }

    #[test]
    fn refusal_surfaces_as_parse_error() {
        let refused = choice(serde_json::json!({
            "role": "assistant",
            "content": null,
            "refusal": "I can't help with that."
        }));
        match first_choice(vec![refused]) {
            Err(AgentError::ResponseParse { message, content }) => {
                assert!(message.contains("I can't help with that."));
                assert_eq!(content, "I can't help with that.");
            }
            other => panic!("expected a refusal error, got {other:?}"),
        }
    }

    #[test]
    fn empty_choices_are_an_error() {
        assert!(matches!(
            first_choice(Vec::new()),
            Err(AgentError::ResponseParse { .. })
        ));
    }

    #[test]
    fn text_choice_maps_to_response() {
        let answered = choice(serde_json::json!({
            "role": "assistant",
            "content": "{\"report\": \"ok\", \"source_citations\": []}"
        }));
        let response = first_choice(vec![answered]).unwrap_or_else(|e| panic!("{e}"));
        assert!(response.content.starts_with("{\"report\""));
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert!(response.tool_calls.is_empty());
    }

    #[test]
    fn system_and_tool_messages_map_to_their_roles() {
        assert!(matches!(
            to_sdk_message(&message::system_message("You are Retrieval Agent.")),
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            to_sdk_message(&message::tool_message("call_123", "[]")),
            ChatCompletionRequestMessage::Tool(_)
        ));
    }

    #[test]
    fn assistant_tool_call_turn_has_no_text() {
        let turn = message::assistant_tool_calls_message(vec![ToolCall {
            id: "call_1".to_string(),
            name: "weaviate_vector_search".to_string(),
            arguments: r#"{"query":"warranty"}"#.to_string(),
        }]);
        let ChatCompletionRequestMessage::Assistant(assistant) = to_sdk_message(&turn) else {
            panic!("assistant turn mapped to another role");
        };
        assert_eq!(assistant.tool_calls.as_ref().map_or(0, Vec::len), 1);
        assert!(assistant.content.is_none());
    }

    #[test]
    fn plain_request_has_no_format_or_tools() {
        let built = to_completion_request(&request());
        assert!(built.response_format.is_none());
        assert!(built.tools.is_none());
        assert!(built.temperature.is_none());
    }

    #[test]
    fn json_mode_requests_json_object() {
        let mut req = request();
        req.json_mode = true;
        assert!(matches!(
            to_completion_request(&req).response_format,
            Some(ResponseFormat::JsonObject)
        ));
    }

    #[test]
    fn report_schema_overrides_json_mode() {
        let mut req = request();
        req.json_mode = true;
        req.structured_output = Some(StructuredOutput {
            name: "Report".to_string(),
            schema: serde_json::json!({"type": "object"}),
        });
        match to_completion_request(&req).response_format {
            Some(ResponseFormat::JsonSchema { json_schema }) => {
                assert_eq!(json_schema.name, "Report");
                assert_eq!(json_schema.strict, Some(true));
            }
            other => panic!("expected a strict JSON schema, got {other:?}"),
        }
    }

    #[test]
    fn bound_search_tool_is_advertised() {
        let mut req = request();
        req.tools = vec![ToolDefinition {
            name: "weaviate_vector_search".to_string(),
            description: "Search contracts".to_string(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }];
        let built = to_completion_request(&req);
        let names: Vec<&str> = built
            .tools
            .iter()
            .flatten()
            .map(|tool| tool.function.name.as_str())
            .collect();
        assert_eq!(names, ["weaviate_vector_search"]);
    }
}
