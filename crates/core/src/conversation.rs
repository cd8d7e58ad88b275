//! Conversation turns and the bounded dialogue context
//!
//! The context always starts with exactly one System turn (the persona
//! prompt). After every append it keeps that turn plus the most recent
//! `max_recent` turns, so the model never sees more than `max_recent + 1`
//! messages.
//!
//! One exchange (user turn, tool round, reply) is built on a staged copy
//! from [`ConversationContext::stage`] and committed as a whole. Staged
//! appends are not trimmed, so an exchange never loses its own question.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm_types::{Message, Role, ToolCall};
use crate::{Error, Result};

/// Default number of non-system turns kept in the context
pub const DEFAULT_MAX_RECENT_TURNS: usize = 20;

/// One entry of the dialogue history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Set on Tool turns, matches the requesting call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Set on Assistant turns that requested tools
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant turn carrying the tool calls the model asked for
    pub fn tool_request(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Tool result answering `call_id`
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// Convert to the message shape sent to the model
    pub fn to_message(&self) -> Message {
        Message {
            role: self.role,
            content: self.content.clone(),
            tool_call_id: self.tool_call_id.clone(),
            tool_calls: self.tool_calls.clone(),
        }
    }
}

/// Bounded, ordered dialogue history owned by one session
#[derive(Debug, Clone)]
pub struct ConversationContext {
    turns: Vec<Turn>,
    max_recent: usize,
    outstanding: HashSet<String>,
    staged: bool,
}

impl ConversationContext {
    /// Start a conversation with the persona prompt as its System turn
    pub fn new(system_prompt: impl Into<String>, max_recent: usize) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
            max_recent: max_recent.max(1),
            outstanding: HashSet::new(),
            staged: false,
        }
    }

    /// Restore a context from persisted turns.
    ///
    /// The first turn must be the only System turn. Tool turns are kept
    /// as they were logged; call ids requested but never answered become
    /// outstanding again.
    pub fn from_turns(turns: Vec<Turn>, max_recent: usize) -> Result<Self> {
        match turns.first() {
            Some(first) if first.role == Role::System => {}
            _ => {
                return Err(Error::InvalidTurn(
                    "restored conversation must start with a system turn".to_string(),
                ))
            }
        }
        if turns.iter().skip(1).any(|t| t.role == Role::System) {
            return Err(Error::InvalidTurn(
                "restored conversation has more than one system turn".to_string(),
            ));
        }

        let mut outstanding: HashSet<String> = turns
            .iter()
            .flat_map(|t| t.tool_calls.iter().map(|c| c.id.clone()))
            .collect();
        for turn in &turns {
            if let Some(id) = &turn.tool_call_id {
                outstanding.remove(id);
            }
        }

        let mut context = Self {
            turns,
            max_recent: max_recent.max(1),
            outstanding,
            staged: false,
        };
        context.trim();
        Ok(context)
    }

    /// Append a turn, then trim to the retention window unless staged.
    ///
    /// Rejects a second System turn, blank User turns, blank Assistant
    /// turns without tool calls and Tool turns that do not answer an
    /// outstanding call.
    pub fn append(&mut self, turn: Turn) -> Result<()> {
        match turn.role {
            Role::System => {
                return Err(Error::InvalidTurn(
                    "conversation already has a system turn".to_string(),
                ));
            }
            Role::User => {
                if turn.content.trim().is_empty() {
                    return Err(Error::InvalidTurn("user turn is empty".to_string()));
                }
            }
            Role::Assistant => {
                if turn.tool_calls.is_empty() && turn.content.trim().is_empty() {
                    return Err(Error::InvalidTurn("assistant turn is empty".to_string()));
                }
                let mut seen = HashSet::new();
                for call in &turn.tool_calls {
                    if call.id.is_empty() || !seen.insert(call.id.as_str()) {
                        return Err(Error::InvalidTurn(format!(
                            "tool call id '{}' is empty or repeated",
                            call.id
                        )));
                    }
                }
                for call in &turn.tool_calls {
                    self.outstanding.insert(call.id.clone());
                }
            }
            Role::Tool => {
                let id = turn.tool_call_id.as_deref().unwrap_or_default();
                if !self.outstanding.remove(id) {
                    return Err(Error::InvalidTurn(format!(
                        "tool turn answers unknown call id '{}'",
                        id
                    )));
                }
            }
        }

        self.turns.push(turn);
        if !self.staged {
            self.trim();
        }
        Ok(())
    }

    /// Working copy for one exchange; `self` is unchanged until
    /// [`commit`](Self::commit)
    pub fn stage(&self) -> Self {
        Self {
            staged: true,
            ..self.clone()
        }
    }

    /// Adopt a finished exchange and trim to the retention window
    pub fn commit(&mut self, exchange: Self) {
        self.turns = exchange.turns;
        self.outstanding = exchange.outstanding;
        self.trim();
    }

    /// Drop the oldest non-system turns beyond the retention window
    pub fn trim(&mut self) {
        let limit = self.max_recent + 1;
        if self.turns.len() > limit {
            let excess = self.turns.len() - limit;
            self.turns.drain(1..1 + excess);
        }
    }

    /// Ordered messages for the next model call.
    ///
    /// Tool results whose requesting Assistant turn has been trimmed away
    /// are left out.
    pub fn render_for_model(&self) -> Vec<Message> {
        let requested: HashSet<&str> = self
            .turns
            .iter()
            .flat_map(|t| t.tool_calls.iter().map(|c| c.id.as_str()))
            .collect();

        self.turns
            .iter()
            .filter(|t| match (t.role, t.tool_call_id.as_deref()) {
                (Role::Tool, Some(id)) => requested.contains(id),
                _ => true,
            })
            .map(Turn::to_message)
            .collect()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Turns after the System turn, oldest first
    pub fn history(&self) -> &[Turn] {
        &self.turns[1..]
    }

    pub fn system_prompt(&self) -> &str {
        &self.turns[0].content
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Never true: the System turn is always present
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn max_recent(&self) -> usize {
        self.max_recent
    }

    /// Call ids requested by the model and not yet answered
    pub fn outstanding_calls(&self) -> impl Iterator<Item = &str> {
        self.outstanding.iter().map(String::as_str)
    }

    pub fn has_outstanding_calls(&self) -> bool {
        !self.outstanding.is_empty()
    }

    /// Forget everything except the System turn
    pub fn reset(&mut self) {
        self.turns.truncate(1);
        self.outstanding.clear();
    }
}
