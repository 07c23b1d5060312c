use crate::llm::{ConversationMessage, Usage};
use std::collections::VecDeque;
use tracing::debug;

/// Cumulative usage across the turns of one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub model_calls: u32,
    pub tool_calls: u32,
    pub prompt_tokens: u32,
    pub output_tokens: u32,
}

impl SessionStats {
    pub(crate) fn accumulate(&mut self, usage: &Usage) {
        self.model_calls += 1;
        self.prompt_tokens += usage.prompt_tokens;
        self.output_tokens += usage.output_tokens;
    }
}

/// Conversation memory for an interactive run.
///
/// History is stored as whole exchanges (question, any function-call round
/// trips, answer) so trimming never leaves a dangling function response at
/// the front of the conversation.
#[derive(Debug)]
pub struct Session {
    exchanges: VecDeque<Vec<ConversationMessage>>,
    max_exchanges: usize,
    pub stats: SessionStats,
}

impl Session {
    pub fn new(max_exchanges: usize) -> Self {
        Self {
            exchanges: VecDeque::new(),
            max_exchanges,
            stats: SessionStats::default(),
        }
    }

    /// Flattened history, oldest first.
    pub fn history(&self) -> Vec<ConversationMessage> {
        self.exchanges.iter().flatten().cloned().collect()
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.len()
    }

    /// Record a completed exchange, dropping the oldest ones past the limit.
    pub fn commit(&mut self, exchange: Vec<ConversationMessage>) {
        if self.max_exchanges == 0 {
            return;
        }
        self.exchanges.push_back(exchange);
        while self.exchanges.len() > self.max_exchanges {
            self.exchanges.pop_front();
            debug!(kept = self.max_exchanges, "trimmed oldest exchange");
        }
    }
}
