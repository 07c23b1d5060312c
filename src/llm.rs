use crate::config::{Config, Credentials};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

const DEVELOPER_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Where `generateContent` is served and how requests authenticate.
#[derive(Clone)]
pub enum Backend {
    /// Gemini Developer API, keyed by `GOOGLE_API_KEY`.
    DeveloperApi { api_key: String },
    /// Vertex AI in a Google Cloud project, with an OAuth bearer token.
    Vertex {
        project_id: String,
        location: String,
        access_token: String,
    },
}

impl Backend {
    fn label(&self) -> &'static str {
        match self {
            Self::DeveloperApi { .. } => "gemini",
            Self::Vertex { .. } => "vertex",
        }
    }
}

pub struct LlmClient {
    backend: Backend,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    base_url: Option<String>,
    http: HttpClient,
}

// -- Conversation types --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// `thought_signature` is opaque and must go back unchanged with the call.
    FunctionCall {
        name: String,
        args: Value,
        thought_signature: Option<String>,
    },
    FunctionResponse { name: String, response: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationMessage {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl ConversationMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text parts. Gemini splits long answers across several parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A function the model may call, described with a JSON schema.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Tools attached to a request.
#[derive(Debug, Clone)]
pub enum ToolSet {
    None,
    Functions(Vec<FunctionDeclaration>),
    /// Hosted Google Search grounding; the model runs searches itself.
    GoogleSearch,
}

impl ToolSet {
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::Functions(decls) => decls.iter().map(|d| d.name.clone()).collect(),
            Self::GoogleSearch => vec!["google_search".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    Safety,
    Other(String),
}

impl StopReason {
    fn from_finish_reason(reason: Option<&str>) -> Self {
        match reason {
            None | Some("STOP") => Self::EndTurn,
            Some("MAX_TOKENS") => Self::MaxTokens,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => Self::Safety,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSource {
    pub title: String,
    pub uri: String,
}

/// Web grounding attached to an answer when Google Search ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grounding {
    pub search_queries: Vec<String>,
    pub sources: Vec<WebSource>,
}

#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: ConversationMessage,
    pub stop_reason: StopReason,
    pub usage: Usage,
    pub grounding: Grounding,
}

impl ModelResponse {
    pub fn function_calls(&self) -> Vec<(String, Value)> {
        self.message
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall { name, args, .. } => Some((name.clone(), args.clone())),
                _ => None,
            })
            .collect()
    }
}

// -- Gemini wire format --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: WireContent,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    function_declarations: Option<&'a [FunctionDeclaration]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    google_search: Option<Value>,
}

#[derive(Serialize, Deserialize, Default)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
    #[serde(default, skip_serializing)]
    thought: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<WireContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    web_search_queries: Vec<String>,
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

impl From<&ConversationMessage> for WireContent {
    fn from(msg: &ConversationMessage) -> Self {
        let parts = msg
            .parts
            .iter()
            .map(|p| match p {
                Part::Text(text) => WirePart {
                    text: Some(text.clone()),
                    ..Default::default()
                },
                Part::FunctionCall {
                    name,
                    args,
                    thought_signature,
                } => WirePart {
                    function_call: Some(WireFunctionCall {
                        name: name.clone(),
                        args: args.clone(),
                    }),
                    thought_signature: thought_signature.clone(),
                    ..Default::default()
                },
                Part::FunctionResponse { name, response } => WirePart {
                    function_response: Some(WireFunctionResponse {
                        name: name.clone(),
                        response: response.clone(),
                    }),
                    ..Default::default()
                },
            })
            .collect();
        Self {
            role: Some(msg.role),
            parts,
        }
    }
}

impl WirePart {
    fn into_part(self) -> Option<Part> {
        if self.thought {
            return None;
        }
        if let Some(call) = self.function_call {
            let args = if call.args.is_null() { json!({}) } else { call.args };
            return Some(Part::FunctionCall {
                name: call.name,
                args,
                thought_signature: self.thought_signature,
            });
        }
        if let Some(resp) = self.function_response {
            return Some(Part::FunctionResponse {
                name: resp.name,
                response: resp.response,
            });
        }
        self.text.map(Part::Text)
    }
}

impl LlmClient {
    pub fn new(
        backend: Backend,
        model: String,
        temperature: f32,
        max_output_tokens: u32,
        base_url: Option<String>,
        http: HttpClient,
    ) -> Self {
        Self {
            backend,
            model,
            temperature,
            max_output_tokens,
            base_url,
            http,
        }
    }

    /// Build from config and resolved credentials. Vertex needs an access token first.
    pub async fn from_config(config: &Config, credentials: Credentials) -> Result<Self> {
        let backend = match credentials {
            Credentials::ApiKey(api_key) => Backend::DeveloperApi { api_key },
            Credentials::Project { project_id } => Backend::Vertex {
                project_id,
                location: config.model.location.clone(),
                access_token: vertex_access_token().await?,
            },
        };
        let http = HttpClient::new(&config.http)?;
        Ok(Self::new(
            backend,
            config.model_name().to_string(),
            config.model.temperature,
            config.max_output_tokens(),
            config.model.base_url.clone(),
            http,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        match &self.backend {
            Backend::DeveloperApi { .. } => format!(
                "{}/models/{}:generateContent",
                self.base_url.as_deref().unwrap_or(DEVELOPER_API_BASE),
                self.model
            ),
            Backend::Vertex {
                project_id,
                location,
                ..
            } => {
                let base = self
                    .base_url
                    .clone()
                    .unwrap_or_else(|| format!("https://{location}-aiplatform.googleapis.com/v1"));
                format!(
                    "{base}/projects/{project_id}/locations/{location}/publishers/google/models/{}:generateContent",
                    self.model
                )
            }
        }
    }

    /// Send the whole conversation and return the model's next message.
    pub async fn converse(
        &self,
        system: &str,
        messages: &[ConversationMessage],
        tools: &ToolSet,
    ) -> Result<ModelResponse> {
        debug!(
            backend = self.backend.label(),
            model = %self.model,
            messages = messages.len(),
            "sending Gemini request"
        );

        let body = build_request_body(
            system,
            messages,
            tools,
            self.temperature,
            self.max_output_tokens,
        )?;

        let auth = match &self.backend {
            Backend::DeveloperApi { api_key } => ("x-goog-api-key", api_key.clone()),
            Backend::Vertex { access_token, .. } => {
                ("Authorization", format!("Bearer {access_token}"))
            }
        };

        let response_text = self
            .http
            .post_json_raw(&self.endpoint(), &body, &[(auth.0, auth.1.as_str())])
            .await
            .map_err(|e| {
                warn!("Gemini API error: {e}");
                e
            })?;

        parse_response(&response_text)
    }
}

fn build_request_body(
    system: &str,
    messages: &[ConversationMessage],
    tools: &ToolSet,
    temperature: f32,
    max_output_tokens: u32,
) -> Result<String> {
    let tools = match tools {
        ToolSet::None => Vec::new(),
        ToolSet::Functions(decls) => vec![WireTool {
            function_declarations: Some(decls.as_slice()),
            google_search: None,
        }],
        ToolSet::GoogleSearch => vec![WireTool {
            function_declarations: None,
            google_search: Some(json!({})),
        }],
    };

    let request = GenerateRequest {
        system_instruction: WireContent {
            role: None,
            parts: vec![WirePart {
                text: Some(system.to_string()),
                ..Default::default()
            }],
        },
        contents: messages.iter().map(WireContent::from).collect(),
        tools,
        generation_config: GenerationConfig {
            temperature,
            max_output_tokens,
        },
    };

    serde_json::to_string(&request).map_err(|e| Error::parse(format!("serialize request: {e}")))
}

fn parse_response(text: &str) -> Result<ModelResponse> {
    let resp: GenerateResponse = serde_json::from_str(text)
        .map_err(|e| Error::parse(format!("parse Gemini response: {e}")))?;

    let usage = resp
        .usage_metadata
        .map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    let Some(candidate) = resp.candidates.into_iter().next() else {
        if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Error::api("gemini", format!("prompt blocked: {reason}")));
        }
        return Err(Error::parse("no candidates in Gemini response"));
    };

    let parts = candidate
        .content
        .unwrap_or_default()
        .parts
        .into_iter()
        .filter_map(WirePart::into_part)
        .collect();

    let grounding = candidate
        .grounding_metadata
        .map(|g| Grounding {
            search_queries: g.web_search_queries,
            sources: g
                .grounding_chunks
                .into_iter()
                .filter_map(|c| c.web)
                .filter_map(|w| {
                    let uri = w.uri?;
                    Some(WebSource {
                        title: w.title.unwrap_or_else(|| uri.clone()),
                        uri,
                    })
                })
                .collect(),
        })
        .unwrap_or_default();

    Ok(ModelResponse {
        message: ConversationMessage {
            role: Role::Model,
            parts,
        },
        stop_reason: StopReason::from_finish_reason(candidate.finish_reason.as_deref()),
        usage,
        grounding,
    })
}

/// Bearer token for Vertex: `GOOGLE_OAUTH_ACCESS_TOKEN`, else `gcloud auth print-access-token`.
async fn vertex_access_token() -> Result<String> {
    if let Some(token) = usable_token(std::env::var(ACCESS_TOKEN_ENV).ok()) {
        debug!("using access token from {ACCESS_TOKEN_ENV}");
        return Ok(token);
    }

    debug!("requesting access token from gcloud");
    let output = tokio::process::Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| {
            Error::config(format!(
                "cannot run gcloud for a Vertex access token ({e}); set {ACCESS_TOKEN_ENV} or GOOGLE_API_KEY"
            ))
        })?;

    if !output.status.success() {
        return Err(Error::config(format!(
            "gcloud auth print-access-token failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::config("gcloud returned an empty access token"));
    }
    Ok(token)
}

fn usable_token(raw: Option<String>) -> Option<String> {
    let token = raw?.trim().to_string();
    (!token.is_empty()).then_some(token)
}
