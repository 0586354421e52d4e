//! The run orchestrator.
//!
//! Drives the bounded iteration loop that turns a run input into one or
//! more inference calls:
//!
//! 1. **Collect tools** — answer every `tool_use` in the thread's last
//!    message (frontend result, acknowledgment, or server-side execution)
//! 2. **Append user input** — first iteration, text inputs only
//! 3. **Infer** — trim the history to budget, call the provider
//!    (streaming or not), persist exactly one assistant message
//! 4. **Decide** — hand back to the user on pure text or a displayable
//!    call; otherwise loop
//!
//! Messages are yielded through a bounded channel as they become
//! available. Dropping the receiving stream cancels the run at its next
//! yield point without committing the in-flight iteration.

use std::sync::Arc;

use colloquy_config::AppConfig;
use colloquy_core::error::{Error, RunError};
use colloquy_core::inference::{InferenceProvider, InferenceRequest};
use colloquy_core::message::{Message, MessageContent};
use colloquy_core::run::RunInput;
use colloquy_core::store::{MessageStore, ThreadStore};
use colloquy_core::thread::ThreadId;
use colloquy_core::tool::{Tool, ToolCatalog, ToolExecutor, ToolKind};
use colloquy_mcp::McpToolBridge;
use colloquy_telemetry::{RunTrace, SpanKind, TelemetrySink, flush_best_effort};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::context::{CounterKind, trim};
use crate::streaming::StreamingAccumulator;

/// Acknowledgment recorded for a displayable call the frontend has not
/// answered yet. Providers require a result for every call.
pub const DISPLAY_ACK: &str = "Tool displayed successfully.";

/// Fallback text when a tool failure must stay hidden from the model.
const HIDDEN_FAILURE_TEXT: &str = "Tool execution failed due to an internal error.";

/// Settings distilled from `AppConfig` for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Maximum loop iterations (and inference calls) per run
    pub max_iterations: u32,

    /// Token budget for the trimmed inference window
    pub context_budget_tokens: usize,

    /// Tool results longer than this are truncated with a notice
    pub tool_result_max_chars: usize,

    /// Token counting algorithm used for trimming
    pub counter: CounterKind,
}

impl RunSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, RunError> {
        let counter = CounterKind::from_name(&config.run.token_counter).ok_or_else(|| {
            RunError::Configuration(format!(
                "unknown token counter '{}'",
                config.run.token_counter
            ))
        })?;
        Ok(Self {
            max_iterations: config.run.max_iterations,
            context_budget_tokens: config.run.context_budget_tokens,
            tool_result_max_chars: config.run.tool_result_max_chars,
            counter,
        })
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            context_budget_tokens: 128_000,
            tool_result_max_chars: 20_000,
            counter: CounterKind::CharHeuristic,
        }
    }
}

/// Drives the run loop. One run owns its thread's message sequence for
/// its duration; concurrent runs on the same thread are serialized by the
/// caller.
#[derive(Clone)]
pub struct RunOrchestrator {
    threads: Arc<dyn ThreadStore>,
    messages: Arc<dyn MessageStore>,
    inference: Arc<dyn InferenceProvider>,
    catalog: Arc<ToolCatalog>,
    local_tools: Arc<dyn ToolExecutor>,
    mcp: Arc<McpToolBridge>,
    telemetry: Arc<dyn TelemetrySink>,
    settings: RunSettings,
    /// Authenticated org identity, passed to local tool executions
    org_id: String,
}

impl RunOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        threads: Arc<dyn ThreadStore>,
        messages: Arc<dyn MessageStore>,
        inference: Arc<dyn InferenceProvider>,
        catalog: Arc<ToolCatalog>,
        local_tools: Arc<dyn ToolExecutor>,
        mcp: Arc<McpToolBridge>,
        telemetry: Arc<dyn TelemetrySink>,
        settings: RunSettings,
        org_id: impl Into<String>,
    ) -> Self {
        Self {
            threads,
            messages,
            inference,
            catalog,
            local_tools,
            mcp,
            telemetry,
            settings,
            org_id: org_id.into(),
        }
    }

    /// Execute a run, yielding each message as it becomes available.
    ///
    /// Domain-typed `RunError`s arrive as the final stream item; any other
    /// failure is wrapped into `RunError::ExecutionFailed` at this
    /// boundary. Dropping the stream cancels the run.
    pub fn execute(
        &self,
        thread_id: ThreadId,
        input: RunInput,
        streaming: bool,
    ) -> ReceiverStream<Result<Message, RunError>> {
        let (tx, rx) = mpsc::channel(32);
        let this = self.clone();
        tokio::spawn(async move {
            let mut trace = RunTrace::new(thread_id.0.clone());
            let result = this
                .run(&thread_id, input, streaming, &tx, &mut trace)
                .await;
            trace.end(result.is_ok());
            flush_best_effort(this.telemetry.as_ref(), &trace);
            if let Err(err) = result {
                let _ = tx.send(Err(RunError::wrap(err))).await;
            }
        });
        ReceiverStream::new(rx)
    }

    async fn run(
        &self,
        thread_id: &ThreadId,
        input: RunInput,
        streaming: bool,
        tx: &mpsc::Sender<Result<Message, RunError>>,
        trace: &mut RunTrace,
    ) -> Result<(), Error> {
        input.validate().map_err(Error::Run)?;

        let thread = self
            .threads
            .get(thread_id)
            .await?
            .ok_or_else(|| {
                Error::Run(RunError::InvalidInput(format!(
                    "thread not found: {thread_id}"
                )))
            })?;
        let model = thread
            .resolve_model()
            .ok_or_else(|| Error::Run(RunError::NoModelFound(thread.id.clone())))?
            .to_string();
        let instructions = thread.instructions().map(String::from);

        info!(
            run_id = %trace.run_id,
            thread_id = %thread.id,
            model = %model,
            streaming,
            "run started"
        );

        let mut history = self.messages.find_many_by_thread_id(&thread.id).await?;
        let tool_definitions = self.catalog.definitions();

        for iteration in 1..=self.settings.max_iterations {
            if tx.is_closed() {
                return Ok(());
            }
            trace.record(SpanKind::Iteration, iteration.to_string(), true);
            debug!(run_id = %trace.run_id, iteration, "run loop iteration");

            // ── Collect tools ──
            // Owned copies: executing tools appends to `history` below.
            let calls: Vec<(String, String, serde_json::Value)> = history
                .last()
                .map(|message| {
                    message
                        .tool_calls()
                        .iter()
                        .map(|c| (c.id.to_string(), c.name.to_string(), c.input.clone()))
                        .collect()
                })
                .unwrap_or_default();

            let mut results: Vec<MessageContent> = Vec::new();
            for (call_id, name, params) in &calls {
                let tool = self
                    .catalog
                    .get(name)
                    .ok_or_else(|| Error::Run(RunError::ToolNotFound(name.clone())))?;

                let text = if classify(tool).displayable {
                    match input.result_for(call_id) {
                        Some(result) => result.to_string(),
                        None => DISPLAY_ACK.to_string(),
                    }
                } else {
                    self.dispatch_tool(tool, params, trace).await
                };
                results.push(MessageContent::tool_result(
                    call_id.as_str(),
                    name.as_str(),
                    self.truncate_result(text),
                ));
            }
            if !results.is_empty() {
                // Not committed when the run was cancelled mid-iteration.
                if tx.is_closed() {
                    return Ok(());
                }
                let message = self
                    .messages
                    .create(Message::tool_results(thread.id.clone(), results))
                    .await?;
                history.push(message.clone());
                if !Self::yield_message(tx, message).await {
                    return Ok(());
                }
            }

            // ── Append user input ──
            if iteration == 1 {
                if let RunInput::Text { text } = &input {
                    let message = self
                        .messages
                        .create(Message::user(thread.id.clone(), text.clone()))
                        .await?;
                    history.push(message.clone());
                    if !Self::yield_message(tx, message).await {
                        return Ok(());
                    }
                }
            }

            // ── Infer ──
            let window = trim(
                &history,
                self.settings.context_budget_tokens,
                self.settings.counter,
            );
            let request = InferenceRequest {
                model: model.clone(),
                messages: window,
                tools: tool_definitions.clone(),
                instructions: instructions.clone(),
            };

            let assistant = if streaming {
                match self.infer_streaming(&thread.id, request, tx, trace).await? {
                    Some(message) => message,
                    // Receiver dropped mid-stream
                    None => return Ok(()),
                }
            } else {
                let content = match self.inference.infer(request).await {
                    Ok(content) => {
                        trace.record(SpanKind::Inference, model.as_str(), true);
                        content
                    }
                    Err(e) => {
                        trace.record(SpanKind::Inference, model.as_str(), false);
                        return Err(e.into());
                    }
                };
                if tx.is_closed() {
                    return Ok(());
                }
                self.messages
                    .create(Message::assistant(thread.id.clone(), content))
                    .await?
            };
            history.push(assistant.clone());
            if !Self::yield_message(tx, assistant.clone()).await {
                return Ok(());
            }

            // ── Decide ──
            if !assistant.has_tool_calls() {
                info!(run_id = %trace.run_id, iteration, "run finished: text response");
                return Ok(());
            }
            let wants_display = assistant.tool_calls().iter().any(|call| {
                self.catalog
                    .get(call.name)
                    .map(|tool| classify(tool).displayable)
                    .unwrap_or(false)
            });
            if wants_display {
                info!(
                    run_id = %trace.run_id,
                    iteration,
                    "run finished: awaiting frontend tool result"
                );
                return Ok(());
            }
            // Executable calls only: loop back to collect them.
        }

        Err(Error::Run(RunError::MaxIterationsReached {
            max: self.settings.max_iterations,
        }))
    }

    /// Stream one inference call, yielding every snapshot, and persist the
    /// finalized assistant message. `None` means the receiver went away.
    async fn infer_streaming(
        &self,
        thread_id: &ThreadId,
        request: InferenceRequest,
        tx: &mpsc::Sender<Result<Message, RunError>>,
        trace: &mut RunTrace,
    ) -> Result<Option<Message>, Error> {
        let model = request.model.clone();
        let mut rx = match self.inference.stream_infer(request).await {
            Ok(rx) => rx,
            Err(e) => {
                trace.record(SpanKind::Inference, model.as_str(), false);
                return Err(e.into());
            }
        };

        let mut accumulator = StreamingAccumulator::new(thread_id.clone());
        while let Some(item) = rx.recv().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    trace.record(SpanKind::Inference, model.as_str(), false);
                    return Err(e.into());
                }
            };
            if accumulator.apply(&chunk) && !Self::yield_message(tx, accumulator.snapshot()).await
            {
                return Ok(None);
            }
        }

        let final_message = accumulator.finalize().map_err(Error::Run)?;
        trace.record(SpanKind::Inference, model.as_str(), true);
        // Partially streamed content is never persisted for a cancelled run.
        if tx.is_closed() {
            return Ok(None);
        }
        let persisted = self.messages.create(final_message).await?;
        Ok(Some(persisted))
    }

    /// Execute one tool call, isolated: every failure mode becomes
    /// tool-result text.
    async fn dispatch_tool(
        &self,
        tool: &Tool,
        params: &serde_json::Value,
        trace: &mut RunTrace,
    ) -> String {
        match &tool.kind {
            ToolKind::McpBacked { .. } => {
                let result = self.mcp.execute_tool(tool, params).await;
                trace.record(SpanKind::ToolDispatch, tool.name.as_str(), !result.is_error);
                McpToolBridge::render_result(&result)
            }
            _ => match self.local_tools.execute(tool, params, &self.org_id).await {
                Ok(output) => {
                    trace.record(SpanKind::ToolDispatch, tool.name.as_str(), true);
                    output
                }
                Err(e) => {
                    trace.record(SpanKind::ToolDispatch, tool.name.as_str(), false);
                    warn!(tool = %tool.name, error = %e, "tool execution failed");
                    if e.model_visible() {
                        format!("Tool execution failed: {e}")
                    } else {
                        HIDDEN_FAILURE_TEXT.to_string()
                    }
                }
            },
        }
    }

    /// Truncate an over-long tool result on a char boundary, appending a
    /// notice the model can see.
    fn truncate_result(&self, text: String) -> String {
        let cap = self.settings.tool_result_max_chars;
        if text.chars().count() <= cap {
            return text;
        }
        let truncated: String = text.chars().take(cap).collect();
        format!("{truncated}\n[tool result truncated: exceeded {cap} characters]")
    }

    /// Send a message downstream. `false` means the receiver is gone and
    /// the run should stop without committing anything further.
    async fn yield_message(
        tx: &mpsc::Sender<Result<Message, RunError>>,
        message: Message,
    ) -> bool {
        tx.send(Ok(message)).await.is_ok()
    }
}
