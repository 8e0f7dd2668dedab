use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::errors::EngineError;
use crate::history;
use crate::llm::{to_wire_messages, CompletionClient, CompletionRequest, ToolInvocation, ToolSchema};
use crate::models::{new_id, Message, MessageBody};
use crate::workspace_tools::{log_tool_call, workspace_tool_schemas, ToolDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// This call ran the turn, and any turns queued behind it.
    Started,
    /// Another turn is active; the text runs after the ones ahead of it.
    Queued { position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    ProcessingTurn,
}

#[derive(Debug, Default)]
struct TurnQueue {
    active: bool,
    pending: VecDeque<String>,
}

#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub system_prompt: String,
    pub max_tool_rounds: usize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the message log and the turn queue, and drives completion calls and
/// tool dispatch.
pub struct Conversation {
    client: Arc<dyn CompletionClient>,
    dispatcher: ToolDispatcher,
    db: Option<Database>,
    session_id: String,
    settings: ConversationSettings,
    tools: Vec<ToolSchema>,
    log: Mutex<Vec<Message>>,
    queue: Mutex<TurnQueue>,
}

impl Conversation {
    /// An in-memory conversation starting from the greeting.
    pub fn new(client: Arc<dyn CompletionClient>, dispatcher: ToolDispatcher, settings: ConversationSettings) -> Self {
        Self {
            client,
            dispatcher,
            db: None,
            session_id: new_id(),
            settings,
            tools: workspace_tool_schemas(),
            log: Mutex::new(vec![Message::greeting()]),
            queue: Mutex::new(TurnQueue::default()),
        }
    }

    /// A conversation persisted to `db`, restored from what is stored there.
    pub fn restore(
        client: Arc<dyn CompletionClient>,
        dispatcher: ToolDispatcher,
        settings: ConversationSettings,
        db: Database,
    ) -> Self {
        let messages = history::load_messages(&db);
        let mut conversation = Self::new(client, dispatcher, settings);
        match history::load_session_id(&db) {
            Ok(id) => conversation.session_id = id,
            Err(e) => warn!(error = %e, "could not restore session id; audit starts fresh"),
        }
        *lock(&conversation.log) = messages;
        conversation.db = Some(db);
        conversation
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> Vec<Message> {
        lock(&self.log).clone()
    }

    pub fn state(&self) -> TurnState {
        if lock(&self.queue).active {
            TurnState::ProcessingTurn
        } else {
            TurnState::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state() == TurnState::ProcessingTurn
    }

    pub fn queued(&self) -> usize {
        lock(&self.queue).pending.len()
    }

    /// Replace the log with a fresh greeting. Refused while a turn runs.
    pub fn reset(&self) -> Result<(), EngineError> {
        if self.is_busy() {
            return Err(EngineError::validation("cannot reset while a turn is running"));
        }
        let fresh = match &self.db {
            Some(db) => history::reset_history(db)?,
            None => vec![Message::greeting()],
        };
        *lock(&self.log) = fresh;
        Ok(())
    }

    pub async fn submit(&self, text: impl Into<String>) -> SubmitOutcome {
        let text = text.into();
        {
            let mut queue = lock(&self.queue);
            if queue.active {
                queue.pending.push_back(text);
                let position = queue.pending.len();
                debug!(position, "turn queued");
                return SubmitOutcome::Queued { position };
            }
            queue.active = true;
        }

        let mut next = Some(text);
        while let Some(text) = next {
            self.run_turn(text).await;
            let mut queue = lock(&self.queue);
            next = queue.pending.pop_front();
            if next.is_none() {
                queue.active = false;
            }
        }
        SubmitOutcome::Started
    }

    fn append(&self, message: Message) {
        let snapshot = {
            let mut log = lock(&self.log);
            log.push(message);
            log.clone()
        };
        if let Some(db) = &self.db {
            if let Err(e) = history::save_messages(db, &snapshot) {
                warn!(error = %e, "failed to persist message log");
            }
        }
    }

    async fn run_turn(&self, text: String) {
        info!(session = %self.session_id, "turn started");
        self.append(Message::user(text));

        let mut answered: HashSet<String> = HashSet::new();

        for round in 0..self.settings.max_tool_rounds {
            let request = CompletionRequest {
                system: self.settings.system_prompt.clone(),
                messages: to_wire_messages(&self.messages()),
                tools: self.tools.clone(),
            };

            debug!(round, "requesting completion");
            let response = match self.client.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "completion failed; ending turn");
                    self.append(Message::assistant(format!("Sorry, the request to the model failed: {}", e)));
                    return;
                }
            };

            let (text, invocations) = response.into_parts();
            if let Some(text) = text {
                self.append(Message::assistant(text));
            }
            if invocations.is_empty() {
                info!(session = %self.session_id, rounds = round + 1, "turn finished");
                return;
            }

            for invocation in invocations {
                self.run_tool(invocation, &mut answered).await;
            }
        }

        warn!(limit = self.settings.max_tool_rounds, "tool round limit reached");
        self.append(Message::assistant(format!(
            "Stopped after {} tool rounds without a final answer.",
            self.settings.max_tool_rounds
        )));
    }

    async fn run_tool(&self, invocation: ToolInvocation, answered: &mut HashSet<String>) {
        let ToolInvocation { id, name, input } = invocation;
        let id = if id.is_empty() { new_id() } else { id };
        if !answered.insert(id.clone()) || self.has_result_for(&id) {
            warn!(tool_call_id = %id, "duplicate tool call id; skipping");
            return;
        }

        self.append(Message::tool_call(&id, &name, input.clone()));
        let result = self.dispatcher.dispatch(&name, &input).await;

        if let Some(db) = &self.db {
            if let Err(e) = log_tool_call(db, &self.session_id, &name, &input, &result) {
                warn!(error = %e, "failed to record tool call");
            }
        }
        self.append(Message::tool_result(id, result));
    }

    fn has_result_for(&self, id: &str) -> bool {
        lock(&self.log)
            .iter()
            .any(|m| matches!(&m.body, MessageBody::ToolResult { tool_call_id, .. } if tool_call_id == id))
    }
}
