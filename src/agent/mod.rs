//! The World Cup agent: a Gemini client paired with a system prompt and a
//! tool set.
//!
//! A turn sends the conversation to the model, answers any function calls
//! with the knowledge stubs, and repeats until the model produces text or the
//! round limit is hit.

pub mod session;

pub use session::{Session, SessionStats};

use crate::config::{Config, Credentials, Variant};
use crate::error::{Error, Result};
use crate::llm::{
    ConversationMessage, LlmClient, Part, Role, StopReason, ToolSet, Usage, WebSource,
};
use crate::{prompt, tools};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Static description of an agent, for hosting runtimes and `card` output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub version: String,
    pub variant: Variant,
    pub model: String,
    pub tools: Vec<String>,
}

impl AgentCard {
    pub fn from_config(config: &Config) -> Self {
        let variant = config.variant();
        Self {
            name: variant.agent_name().into(),
            description: variant.description().into(),
            version: variant.version().into(),
            variant,
            model: config.model_name().into(),
            tools: tool_set(variant).names(),
        }
    }
}

/// The answer to one question.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub text: String,
    /// Web pages the answer was grounded on, most relevant first.
    pub sources: Vec<WebSource>,
    pub search_queries: Vec<String>,
    pub usage: Usage,
    pub tool_calls: u32,
}

impl Reply {
    /// Answer text followed by a numbered source list when there is one.
    pub fn render(&self) -> String {
        let mut out = self.text.trim().to_string();
        if !self.sources.is_empty() {
            out.push_str("\n\n📚 Fuentes:");
            for (i, s) in self.sources.iter().enumerate() {
                out.push_str(&format!("\n  {}. {} <{}>", i + 1, s.title, s.uri));
            }
        }
        out
    }
}

pub fn tool_set(variant: Variant) -> ToolSet {
    match variant {
        Variant::Classic => ToolSet::Functions(tools::function_declarations()),
        Variant::Plus => ToolSet::GoogleSearch,
    }
}

pub struct FifaAgent {
    card: AgentCard,
    system_prompt: String,
    tools: ToolSet,
    llm: LlmClient,
    max_tool_rounds: u32,
    max_sources: usize,
}

impl FifaAgent {
    pub fn new(config: &Config, llm: LlmClient) -> Self {
        let variant = config.variant();
        let today = chrono::Local::now().date_naive();
        Self {
            card: AgentCard::from_config(config),
            system_prompt: prompt::system_prompt(variant, today),
            tools: tool_set(variant),
            llm,
            max_tool_rounds: config.agent.max_tool_rounds,
            max_sources: config.search.max_sources,
        }
    }

    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    /// Answer `query` in the context of `session`.
    ///
    /// The exchange is only recorded in the session when the turn succeeds,
    /// so a failed question leaves the history untouched.
    pub async fn respond(&self, session: &mut Session, query: &str) -> Result<Reply> {
        if !tools::is_football_related(query) {
            debug!(query, "question has no football keywords");
        }

        let history = session.history();
        let mut turn = vec![ConversationMessage::user_text(query)];
        let mut usage = Usage::default();
        let mut tool_calls = 0u32;
        let mut rounds = 0u32;

        loop {
            let messages: Vec<ConversationMessage> =
                history.iter().chain(turn.iter()).cloned().collect();
            let response = self
                .llm
                .converse(&self.system_prompt, &messages, &self.tools)
                .await?;

            session.stats.accumulate(&response.usage);
            usage.prompt_tokens += response.usage.prompt_tokens;
            usage.output_tokens += response.usage.output_tokens;

            let calls = response.function_calls();
            if calls.is_empty() {
                let text = response.message.text();
                if text.trim().is_empty() {
                    return Err(Error::parse(format!(
                        "empty response from Gemini (stop reason: {:?})",
                        response.stop_reason
                    )));
                }
                if response.stop_reason != StopReason::EndTurn {
                    warn!(stop = ?response.stop_reason, "answer may be incomplete");
                }

                turn.push(response.message);
                session.commit(turn);

                let sources = rank_sources(response.grounding.sources, query, self.max_sources);
                info!(
                    agent = %self.card.name,
                    tool_calls,
                    sources = sources.len(),
                    prompt_tokens = usage.prompt_tokens,
                    output_tokens = usage.output_tokens,
                    "turn complete"
                );
                return Ok(Reply {
                    text,
                    sources,
                    search_queries: response.grounding.search_queries,
                    usage,
                    tool_calls,
                });
            }

            if rounds >= self.max_tool_rounds {
                warn!(rounds, "model still calling tools, giving up");
                return Err(Error::ToolLoop { rounds });
            }
            rounds += 1;

            turn.push(response.message);
            let mut results = Vec::with_capacity(calls.len());
            for (name, args) in calls {
                tool_calls += 1;
                session.stats.tool_calls += 1;
                let (response, is_error) = tools::dispatch(&name, &args);
                if is_error {
                    warn!(tool = %name, %response, "tool call rejected");
                }
                results.push(Part::FunctionResponse { name, response });
            }
            turn.push(ConversationMessage {
                role: Role::User,
                parts: results,
            });
        }
    }
}

/// Dedupe by URI, order by relevance to the question (stable), keep `limit`.
fn rank_sources(sources: Vec<WebSource>, query: &str, limit: usize) -> Vec<WebSource> {
    let mut seen = HashSet::new();
    let mut unique: Vec<WebSource> = sources
        .into_iter()
        .filter(|s| seen.insert(s.uri.clone()))
        .collect();
    unique.sort_by_key(|s| std::cmp::Reverse(tools::relevance(&s.title, query)));
    unique.truncate(limit);
    unique
}

/// Build an agent from `config`, with credentials taken from the environment.
pub async fn build_agent(config: &Config) -> Result<FifaAgent> {
    config.validate()?;
    let credentials = Credentials::from_env()?;
    debug!(?credentials, variant = ?config.variant(), "building agent");
    let llm = LlmClient::from_config(config, credentials).await?;
    Ok(FifaAgent::new(config, llm))
}

/// Entry point for hosting runtimes: the default configuration for `variant`.
pub async fn get_agent(variant: Variant) -> Result<FifaAgent> {
    let mut config = Config::default();
    config.agent.variant = variant;
    build_agent(&config).await
}
