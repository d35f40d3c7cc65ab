//! Stream decoding and session event state machine.
//!
//! Turns the assistant CLI's line-oriented stdout (stream-json mode, or
//! bare text in fallback mode) into ordered, typed stream events per
//! session, accumulates the assistant reply for history persistence, and
//! scans stderr for usage telemetry and permission prompts.
//!
//! Architecture:
//! - Chunks are reassembled into lines per session, then each line is
//!   decoded and dispatched synchronously, so emission order matches
//!   line arrival order
//! - Sessions are independent entries in one registry; a decode anomaly
//!   in one session cannot touch another's state
//! - The only async boundary is the fire-and-forget history persistence

use crate::emitter::{EventBus, SessionEvent};
use crate::history::{ChangeTracker, HistoryStore, SyncTrigger};
use crate::parser::{parse_envelope, LineBuffer};
use crate::{permissions, telemetry, Result, TetherError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tether_types::{
    AgentEvent, ApprovalMode, BlockDelta, BlockInfo, HistoryMessage, PermissionRequest,
    ResultEvent, StreamEvent, StreamPayload,
};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Marker emitted as a `thinking` event when a message starts.
const THINKING_MARKER: &str = "Thinking...";

/// Marker emitted as a `tool_use` event when a tool result arrives.
const TOOL_RESULT_MARKER: &str = "Tool completed";

/// Tools whose invocation is reported to the change tracker.
const TRACKED_TOOLS: &[&str] = &["Edit", "Write", "Bash"];

/// Decoder configuration.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Model recorded with saved messages when the caller names none.
    pub default_model: String,
    /// Capacity of both broadcast channels.
    pub channel_capacity: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            default_model: "sonnet".to_string(),
            channel_capacity: 256,
        }
    }
}

/// Options for initializing a session.
#[derive(Debug, Clone, Default)]
pub struct InitSessionOptions {
    /// The originating user prompt.
    pub user_message: String,
    /// Workspace directory associated with the session.
    pub project_path: Option<PathBuf>,
    /// Model identifier; defaults to [`DecoderConfig::default_model`].
    pub model: Option<String>,
    pub approval_mode: ApprovalMode,
}

/// Per-session mutable state. Created on init (or lazily on first chunk),
/// destroyed on terminal flush or explicit clear.
#[derive(Debug)]
struct SessionState {
    user_message: String,
    assistant_message: String,
    project_path: Option<PathBuf>,
    model: String,
    approval_mode: ApprovalMode,
    line_buffer: LineBuffer,
}

impl SessionState {
    fn new(default_model: &str) -> Self {
        Self {
            user_message: String::new(),
            assistant_message: String::new(),
            project_path: None,
            model: default_model.to_string(),
            approval_mode: ApprovalMode::default(),
            line_buffer: LineBuffer::new(),
        }
    }
}

/// Decodes subprocess output streams into typed events per session.
pub struct StreamDecoder {
    sessions: Arc<RwLock<HashMap<Uuid, SessionState>>>,
    bus: EventBus,
    history: Option<Arc<dyn HistoryStore>>,
    tracker: Option<Arc<dyn ChangeTracker>>,
    sync: Option<Arc<dyn SyncTrigger>>,
    config: DecoderConfig,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl StreamDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        let bus = EventBus::new(config.channel_capacity);
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            bus,
            history: None,
            tracker: None,
            sync: None,
            config,
        }
    }

    /// Attach a history store for message persistence.
    pub fn with_history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    /// Attach a change tracker notified of tracked tool invocations.
    pub fn with_tracker(mut self, tracker: Arc<dyn ChangeTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Attach a sync trigger notified once per finished turn.
    pub fn with_sync(mut self, sync: Arc<dyn SyncTrigger>) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Subscribe to the stream-event channel.
    pub fn subscribe_stream(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe_stream()
    }

    /// Subscribe to the permission-request channel.
    pub fn subscribe_permissions(&self) -> broadcast::Receiver<PermissionRequest> {
        self.bus.subscribe_permissions()
    }

    /// Initialize a session: store the prompt and metadata, and persist
    /// the user message immediately. Persistence failure is logged, not
    /// propagated; the session continues either way.
    pub async fn init_session(&self, session_id: Uuid, opts: InitSessionOptions) {
        let model = opts
            .model
            .unwrap_or_else(|| self.config.default_model.clone());

        {
            let mut sessions = self.sessions.write().await;
            let state = sessions
                .entry(session_id)
                .or_insert_with(|| SessionState::new(&self.config.default_model));
            state.user_message = opts.user_message.clone();
            state.project_path = opts.project_path.clone();
            state.model = model.clone();
            state.approval_mode = opts.approval_mode;
        }

        info!(target: "tether::decoder", "Session {} initialized (model: {})", session_id, model);

        if !opts.user_message.trim().is_empty() {
            self.persist(HistoryMessage::user(
                session_id,
                opts.user_message,
                opts.project_path,
                model,
            ));
        }
    }

    /// Feed a chunk of primary-channel output for a session.
    ///
    /// Complete lines are decoded and emitted in arrival order; a trailing
    /// partial line is held back until its newline arrives.
    pub async fn handle_output(&self, session_id: Uuid, chunk: &str) {
        let lines = {
            let mut sessions = self.sessions.write().await;
            let state = sessions
                .entry(session_id)
                .or_insert_with(|| SessionState::new(&self.config.default_model));
            state.line_buffer.push(chunk)
        };

        for line in lines {
            self.process_line(session_id, &line).await;
        }
    }

    /// Feed a chunk of secondary-channel (stderr) output: scan for usage
    /// telemetry and, in manual-approval mode, permission prompts.
    pub async fn handle_stderr(&self, session_id: Uuid, chunk: &str) {
        if let Some(usage) = telemetry::scan_usage(chunk) {
            debug!(target: "tether::telemetry", "Usage reported on stderr for {}: {:?}", session_id, usage);
            self.bus
                .emit_stream(session_id, StreamEvent::done(Some(usage)));
        }

        let manual = self
            .sessions
            .read()
            .await
            .get(&session_id)
            .map(|state| state.approval_mode)
            == Some(ApprovalMode::Manual);

        if manual {
            if let Some(prompt) = permissions::detect_prompt(chunk) {
                info!(
                    target: "tether::permissions",
                    "Permission prompt detected for {} (tool: {})", session_id, prompt.tool_name
                );
                self.bus.emit_permission(PermissionRequest::new(
                    session_id,
                    prompt.tool_name,
                    prompt.matched,
                ));
            }
        }
    }

    /// Propagate an upstream failure (e.g. the subprocess crashed, as
    /// reported by its owner) as an `error` stream event, verbatim.
    pub fn emit_error(&self, session_id: Uuid, message: impl Into<String>) {
        self.bus.emit_stream(session_id, StreamEvent::error(message));
    }

    /// Discard a session's state without flushing. A buffered
    /// unterminated line is dropped with it.
    pub async fn clear_session(&self, session_id: Uuid) {
        if self.sessions.write().await.remove(&session_id).is_some() {
            debug!(target: "tether::decoder", "Session {} cleared", session_id);
        }
    }

    /// Current accumulated assistant text for a session.
    pub async fn assistant_snapshot(&self, session_id: Uuid) -> Result<String> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .map(|state| state.assistant_message.clone())
            .ok_or(TetherError::SessionNotFound(session_id))
    }

    /// The originating user prompt for a session.
    pub async fn user_snapshot(&self, session_id: Uuid) -> Result<String> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .map(|state| state.user_message.clone())
            .ok_or(TetherError::SessionNotFound(session_id))
    }

    /// Whether a session currently holds state.
    pub async fn has_session(&self, session_id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&session_id)
    }

    async fn process_line(&self, session_id: Uuid, line: &str) {
        match parse_envelope(line) {
            Some(event) => self.process_envelope(session_id, event).await,
            None => {
                // Fallback mode: the subprocess is not emitting structured
                // records. Forward the line as-is, newline restored.
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    self.bus
                        .emit_stream(session_id, StreamEvent::text(format!("{}\n", line)));
                }
            }
        }
    }

    async fn process_envelope(&self, session_id: Uuid, event: AgentEvent) {
        match event {
            AgentEvent::System(system) => {
                debug!(
                    target: "tether::decoder",
                    "System event for {}: subtype={} model={}", session_id, system.subtype, system.model
                );
            }
            AgentEvent::StreamEvent(envelope) => {
                self.process_stream_payload(session_id, envelope.event).await;
            }
            AgentEvent::Assistant(_) => {
                // The authoritative text already arrived via streaming
                // deltas; re-emitting here would duplicate it.
                debug!(target: "tether::decoder", "Complete assistant message for {} (already streamed)", session_id);
            }
            AgentEvent::User(user) => {
                self.process_tool_results(session_id, &user.message);
            }
            AgentEvent::Result(result) => {
                self.finish_session(session_id, &result).await;
            }
            AgentEvent::Unknown => {
                debug!(target: "tether::decoder", "Dropping unrecognized envelope for {}", session_id);
            }
        }
    }

    async fn process_stream_payload(&self, session_id: Uuid, payload: StreamPayload) {
        match payload {
            StreamPayload::MessageStart { .. } => {
                self.bus
                    .emit_stream(session_id, StreamEvent::thinking(THINKING_MARKER));
            }
            StreamPayload::ContentBlockStart { content_block, .. } => match content_block {
                BlockInfo::ToolUse { name, .. } => {
                    self.bus.emit_stream(
                        session_id,
                        StreamEvent::tool_use(format!("Using tool: {}", name)),
                    );

                    if TRACKED_TOOLS.contains(&name.as_str()) {
                        let project_path = self
                            .sessions
                            .read()
                            .await
                            .get(&session_id)
                            .and_then(|state| state.project_path.clone());
                        if let (Some(tracker), Some(path)) = (&self.tracker, project_path) {
                            tracker.record_tool_call(&path, session_id, &name);
                        }
                    }
                }
                BlockInfo::Text { .. } => {}
                BlockInfo::Unknown => {
                    debug!(target: "tether::decoder", "Unrecognized content block for {}", session_id);
                }
            },
            StreamPayload::ContentBlockDelta { delta, .. } => match delta {
                BlockDelta::TextDelta { text } => {
                    {
                        let mut sessions = self.sessions.write().await;
                        let state = sessions
                            .entry(session_id)
                            .or_insert_with(|| SessionState::new(&self.config.default_model));
                        state.assistant_message.push_str(&text);
                    }
                    // One event per delta; no buffering or coalescing.
                    self.bus.emit_stream(session_id, StreamEvent::text(text));
                }
                BlockDelta::InputJsonDelta { partial_json } => {
                    // Suppressed: partial tool arguments are UI noise.
                    trace!(
                        target: "tether::decoder",
                        "Tool input fragment for {} ({} bytes)", session_id, partial_json.len()
                    );
                }
                BlockDelta::Unknown => {
                    debug!(target: "tether::decoder", "Unrecognized delta for {}", session_id);
                }
            },
            StreamPayload::ContentBlockStop { .. } | StreamPayload::MessageStop => {}
            StreamPayload::Unknown => {
                debug!(target: "tether::decoder", "Dropping unrecognized stream sub-event for {}", session_id);
            }
        }
    }

    /// Walk a user envelope's message for `tool_result` content blocks and
    /// emit one completion marker per block.
    fn process_tool_results(&self, session_id: Uuid, message: &serde_json::Value) {
        let Some(content) = message.get("content").and_then(|value| value.as_array()) else {
            return;
        };

        for block in content {
            if block.get("type").and_then(|value| value.as_str()) == Some("tool_result") {
                self.bus
                    .emit_stream(session_id, StreamEvent::tool_use(TOOL_RESULT_MARKER));
            }
        }
    }

    /// Terminal path: emit `done` with extracted usage, notify the sync
    /// trigger when a project path is known, flush the accumulator to
    /// history, and destroy all session state.
    async fn finish_session(&self, session_id: Uuid, result: &ResultEvent) {
        let usage = result.usage.as_ref().map(telemetry::usage_from_result);
        if let Some(usage) = &usage {
            info!(
                target: "tether::telemetry",
                "Session {} finished: cache hit rate {:.1}%", session_id, usage.cache_hit_rate()
            );
        }
        self.bus.emit_stream(session_id, StreamEvent::done(usage));

        let Some(state) = self.sessions.write().await.remove(&session_id) else {
            return;
        };

        if let (Some(sync), Some(path)) = (&self.sync, state.project_path.as_ref()) {
            sync.record_message(path, session_id);
        }

        if state.assistant_message.trim().is_empty() {
            debug!(target: "tether::decoder", "Session {} produced no assistant text; skipping history save", session_id);
            return;
        }

        let token_count = usage.and_then(|u| u.output_tokens);
        self.persist(HistoryMessage::assistant(
            session_id,
            state.assistant_message,
            state.project_path,
            state.model,
            token_count,
        ));
    }

    /// Fire-and-forget history append. Failures are logged, never
    /// propagated, and already-emitted events are never retracted.
    fn persist(&self, message: HistoryMessage) {
        if let Some(store) = &self.history {
            let store = store.clone();
            tokio::spawn(async move {
                if let Err(e) = store.append(message).await {
                    warn!(target: "tether::history", "Failed to persist message: {}", e);
                }
            });
        }
    }
}
