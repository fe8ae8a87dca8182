// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Chat widget controller.
//
// Wires the session, transport, and rendering surface together: opens
// the conversation (restoring history when one is stored), sends user
// messages through the stream processor, runs the order-tracking
// sub-flow, and drives the auth popup/poll/resume cycle.
//
// The widget holds a single cancellable stream handle: starting a new
// send aborts any previous read loop before the new one begins, so a
// stale stream can never write into the transcript after a newer
// conversation starts.

use crate::auth::TokenPoller;
use crate::client::{ChatRequest, HistoryResponse, Transport};
use crate::config::WidgetConfig;
use crate::render::Surface;
use crate::session::ChatSession;
use crate::stream::{StreamEventProcessor, GENERIC_FAILURE};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

pub const AUTH_IN_PROGRESS: &str =
    "Authentication in progress. Please complete the process in the popup window.";
pub const AUTH_SUCCESS: &str = "Authorization successful! I'm now continuing with your request.";

const ORDER_TRACKING_PROMPT: &str =
    "Please provide your order number and email address to track your order.";
const ORDER_TRACKING_MISSING: &str = "Please provide both order number and email address.";

const SUPPORT_EMAIL: &str = "support@example.com";
const SUPPORT_PHONE: &str = "919999999999";

/// Quick actions shown on the widget's home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    OrderTracking,
    Whatsapp,
    Email,
    Support,
}

// ---------------------------------------------------------------------------
// Stream slot
// ---------------------------------------------------------------------------

/// Holder for at most one spawned task, cancelled on replacement.
#[derive(Default)]
struct TaskSlot {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskSlot {
    fn cancel(&self) {
        if let Some(previous) = self.handle.lock().expect("task slot lock").take() {
            previous.abort();
        }
    }

    fn set(&self, new: JoinHandle<()>) {
        let mut guard = self.handle.lock().expect("task slot lock");
        if let Some(previous) = guard.take() {
            previous.abort();
        }
        *guard = Some(new);
    }

    fn take(&self) -> Option<JoinHandle<()>> {
        self.handle.lock().expect("task slot lock").take()
    }
}

// ---------------------------------------------------------------------------
// ChatWidget
// ---------------------------------------------------------------------------

pub struct ChatWidget {
    transport: Arc<dyn Transport>,
    session: Arc<ChatSession>,
    surface: Arc<dyn Surface>,
    config: Arc<WidgetConfig>,
    stream_task: Arc<TaskSlot>,
    auth_task: TaskSlot,
}

impl ChatWidget {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<ChatSession>,
        surface: Arc<dyn Surface>,
        config: Arc<WidgetConfig>,
    ) -> Self {
        Self {
            transport,
            session,
            surface,
            config,
            stream_task: Arc::new(TaskSlot::default()),
            auth_task: TaskSlot::default(),
        }
    }

    /// Open the chat: restore a stored conversation or greet.
    pub async fn open(&self) {
        let Some(conversation_id) = self.session.conversation_id() else {
            self.surface.notice(&self.config.welcome_message);
            return;
        };
        match self.transport.fetch_history(&conversation_id).await {
            Ok(history) if history.messages.is_empty() => {
                self.surface.notice(&self.config.welcome_message);
            }
            Ok(history) => self.render_history(&history),
            Err(err) => {
                tracing::warn!(error = %err, "history fetch failed");
                self.surface.notice(&self.config.welcome_message);
                self.session.clear_conversation_id();
            }
        }
    }

    fn render_history(&self, history: &HistoryResponse) {
        for message in &history.messages {
            for text in message.text_blocks() {
                if message.role == "user" {
                    self.surface.user_message(&text);
                } else {
                    let id = self.surface.begin_assistant_message();
                    self.surface.set_text(id, &text);
                    self.surface.finalize_message(id);
                }
            }
        }
    }

    /// Send a user message.
    ///
    /// "order tracking" anywhere in the input switches to the
    /// order-tracking sub-flow instead of sending.
    pub fn send(&self, input: &str) {
        let message = input.trim();
        if message.is_empty() {
            return;
        }
        if !self.session.order_tracking_mode()
            && message.to_lowercase().contains("order tracking")
        {
            self.enter_order_tracking();
            return;
        }

        self.surface.user_message(message);
        self.surface.show_typing();
        self.start_stream(message.to_string());
    }

    /// Switch the input into order-tracking mode.
    pub fn enter_order_tracking(&self) {
        self.session.set_order_tracking_mode(true);
        self.surface.user_message("Order Tracking");
        self.surface.notice(ORDER_TRACKING_PROMPT);
    }

    /// Submit the order-tracking form; both fields are required.
    pub fn send_order_tracking(&self, order_number: &str, email: &str) {
        let order_number = order_number.trim();
        let email = email.trim();
        if order_number.is_empty() || email.is_empty() {
            self.surface.notice(ORDER_TRACKING_MISSING);
            return;
        }

        let message =
            format!("Order Tracking Request: Order No. {order_number}, Email: {email}");
        self.session.set_order_tracking_mode(false);
        self.surface.user_message(&message);
        self.surface.show_typing();
        self.start_stream(message);
    }

    /// Leave order-tracking mode without sending.
    pub fn cancel_order_tracking(&self) {
        self.session.set_order_tracking_mode(false);
    }

    pub fn quick_action(&self, action: QuickAction) {
        match action {
            QuickAction::OrderTracking => self.enter_order_tracking(),
            QuickAction::Whatsapp => {
                self.surface.notice(&format!(
                    "Chat with us on WhatsApp: https://wa.me/{SUPPORT_PHONE}?text=Hello%2C%20I%20need%20help%20with%20my%20order."
                ));
            }
            QuickAction::Email => {
                self.surface.notice(&format!(
                    "Email us: mailto:{SUPPORT_EMAIL}?subject=Support%20Request&body=Hello%2C%20I%20need%20help%20with..."
                ));
            }
            QuickAction::Support => self.send("Support"),
        }
    }

    /// Open the remembered auth URL and start polling for completion.
    ///
    /// On success the stored user message is re-sent through the
    /// streaming path, exactly once.
    pub fn trigger_auth(&self) {
        let Some(url) = self.session.auth_url() else {
            tracing::debug!("auth trigger without a remembered auth url");
            return;
        };
        self.surface.open_auth(&url);

        let Some(conversation_id) = self.session.conversation_id() else {
            return;
        };
        self.surface.notice(AUTH_IN_PROGRESS);

        let poller = TokenPoller::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.session),
            self.config.polling.clone(),
        );
        let transport = Arc::clone(&self.transport);
        let session = Arc::clone(&self.session);
        let surface = Arc::clone(&self.surface);
        let config = Arc::clone(&self.config);
        let stream_task = Arc::clone(&self.stream_task);

        self.auth_task.set(tokio::spawn(async move {
            if let Some(message) = poller.run(&conversation_id).await {
                surface.notice(AUTH_SUCCESS);
                surface.show_typing();
                spawn_stream(&stream_task, transport, session, surface, config, message);
            }
        }));
    }

    fn start_stream(&self, message: String) {
        spawn_stream(
            &self.stream_task,
            Arc::clone(&self.transport),
            Arc::clone(&self.session),
            Arc::clone(&self.surface),
            Arc::clone(&self.config),
            message,
        );
    }

    /// Wait for any in-flight auth poll and stream to finish.
    pub async fn flush(&self) {
        if let Some(handle) = self.auth_task.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.stream_task.take() {
            let _ = handle.await;
        }
    }

    /// Abandon the conversation: cancel tasks and wipe session state.
    pub fn abandon(&self) {
        self.auth_task.cancel();
        self.stream_task.cancel();
        self.session.reset();
    }
}

impl Drop for ChatWidget {
    fn drop(&mut self) {
        self.auth_task.cancel();
        self.stream_task.cancel();
    }
}

/// Cancel the previous read loop, then start a new one.
fn spawn_stream(
    slot: &TaskSlot,
    transport: Arc<dyn Transport>,
    session: Arc<ChatSession>,
    surface: Arc<dyn Surface>,
    config: Arc<WidgetConfig>,
    message: String,
) {
    slot.cancel();

    let request = ChatRequest {
        message: message.clone(),
        conversation_id: session.conversation_id(),
        prompt_type: config.prompt_type.clone(),
    };

    slot.set(tokio::spawn(async move {
        match transport.send_chat(&request).await {
            Ok(stream) => {
                StreamEventProcessor::new(surface, session)
                    .process(stream, &message)
                    .await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "chat request failed");
                surface.hide_typing();
                surface.notice(GENERIC_FAILURE);
            }
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ByteStream, HistoryMessage, TokenStatus, TransportError};
    use crate::config::PollingConfig;
    use crate::render::TranscriptSurface;
    use crate::session::MemoryStore;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Transport double: scripted stream bodies, recorded chat sends.
    struct FakeTransport {
        bodies: Mutex<Vec<StreamBody>>,
        sent: Mutex<Vec<ChatRequest>>,
        history: Mutex<Option<Result<HistoryResponse, TransportError>>>,
        token_calls: AtomicU32,
    }

    enum StreamBody {
        Records(&'static str),
        /// A stream that never yields; stands in for a hung response.
        Hang,
    }

    impl FakeTransport {
        fn new(bodies: Vec<StreamBody>) -> Arc<Self> {
            Arc::new(Self {
                bodies: Mutex::new(bodies),
                sent: Mutex::new(Vec::new()),
                history: Mutex::new(None),
                token_calls: AtomicU32::new(0),
            })
        }

        fn with_history(self: Arc<Self>, history: Result<HistoryResponse, TransportError>) -> Arc<Self> {
            *self.history.lock().unwrap() = Some(history);
            self
        }

        fn sent_messages(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|r| r.message.clone()).collect()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send_chat(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
            self.sent.lock().unwrap().push(request.clone());
            let mut bodies = self.bodies.lock().unwrap();
            if bodies.is_empty() {
                return Err(TransportError::Status(500));
            }
            match bodies.remove(0) {
                StreamBody::Records(text) => {
                    let chunks: Vec<Result<Bytes, TransportError>> =
                        vec![Ok(Bytes::from(text.as_bytes().to_vec()))];
                    Ok(Box::pin(tokio_stream::iter(chunks)))
                }
                StreamBody::Hang => Ok(Box::pin(futures_util::stream::pending())),
            }
        }

        async fn fetch_history(
            &self,
            _conversation_id: &str,
        ) -> Result<HistoryResponse, TransportError> {
            match self.history.lock().unwrap().take() {
                Some(result) => result,
                None => Ok(HistoryResponse::default()),
            }
        }

        async fn token_status(
            &self,
            _conversation_id: &str,
        ) -> Result<TokenStatus, TransportError> {
            self.token_calls.fetch_add(1, Ordering::Relaxed);
            Ok(TokenStatus {
                status: "authorized".into(),
            })
        }
    }

    struct Harness {
        transport: Arc<FakeTransport>,
        session: Arc<ChatSession>,
        surface: Arc<TranscriptSurface>,
        widget: ChatWidget,
    }

    fn harness(transport: Arc<FakeTransport>) -> Harness {
        let session = Arc::new(ChatSession::new(Arc::new(MemoryStore::new())));
        let surface = Arc::new(TranscriptSurface::new(Arc::clone(&session)));
        let config = Arc::new(WidgetConfig {
            polling: PollingConfig {
                initial_delay_secs: 0,
                interval_secs: 0,
                max_attempts: 3,
            },
            ..WidgetConfig::for_endpoint("http://unused.example")
        });
        let widget = ChatWidget::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&session),
            Arc::clone(&surface) as Arc<dyn Surface>,
            config,
        );
        Harness {
            transport,
            session,
            surface,
            widget,
        }
    }

    #[tokio::test]
    async fn send_streams_response_into_transcript() {
        let transport = FakeTransport::new(vec![StreamBody::Records(
            "data: {\"type\":\"id\",\"conversation_id\":\"c-1\"}\n\n\
             data: {\"type\":\"chunk\",\"chunk\":\"Hello\"}\n\n\
             data: {\"type\":\"chunk\",\"chunk\":\" there\"}\n\n\
             data: {\"type\":\"message_complete\"}\n\n",
        )]);
        let h = harness(transport);

        h.widget.send("hi");
        h.widget.flush().await;

        let html = h.surface.to_html();
        assert!(html.contains("hi"));
        assert!(html.contains("Hello there"));
        assert_eq!(h.session.conversation_id().as_deref(), Some("c-1"));
    }

    #[tokio::test]
    async fn new_send_cancels_previous_stream() {
        let transport = FakeTransport::new(vec![
            StreamBody::Hang,
            StreamBody::Records("data: {\"type\":\"chunk\",\"chunk\":\"second\"}\n\n"),
        ]);
        let h = harness(transport);

        h.widget.send("first question");
        // Let the first read loop issue its request and park on the hung
        // body before the second send aborts it.
        tokio::task::yield_now().await;
        h.widget.send("second question");
        h.widget.flush().await;

        let html = h.surface.to_html();
        assert!(html.contains("second"));
        // Both requests went out, but only the second stream produced output.
        assert_eq!(
            h.transport.sent_messages(),
            vec!["first question", "second question"]
        );
    }

    #[tokio::test]
    async fn open_restores_history() {
        let transport = FakeTransport::new(Vec::new()).with_history(Ok(HistoryResponse {
            messages: vec![
                HistoryMessage {
                    role: "user".into(),
                    content: "where is my order".into(),
                },
                HistoryMessage {
                    role: "assistant".into(),
                    content: r#"[{"type":"text","text":"Let me **check**"}]"#.into(),
                },
            ],
        }));
        let h = harness(transport);
        h.session.set_conversation_id("c-1");

        h.widget.open().await;

        let html = h.surface.to_html();
        assert!(html.contains("where is my order"));
        assert!(html.contains("<strong>check</strong>"));
    }

    #[tokio::test]
    async fn history_failure_falls_back_to_welcome_and_clears_id() {
        let transport =
            FakeTransport::new(Vec::new()).with_history(Err(TransportError::Status(500)));
        let h = harness(transport);
        h.session.set_conversation_id("c-gone");

        h.widget.open().await;

        assert!(h.surface.to_html().contains("How can I help you today?"));
        assert!(h.session.conversation_id().is_none());
    }

    #[tokio::test]
    async fn open_without_conversation_greets() {
        let h = harness(FakeTransport::new(Vec::new()));
        h.widget.open().await;
        assert!(h.surface.to_html().contains("How can I help you today?"));
    }

    #[tokio::test]
    async fn order_tracking_keyword_enters_mode() {
        let h = harness(FakeTransport::new(Vec::new()));
        h.widget.send("I need order tracking please");
        assert!(h.session.order_tracking_mode());
        assert!(h.surface.to_html().contains(ORDER_TRACKING_PROMPT));
        // Nothing was sent to the backend.
        assert!(h.transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn order_tracking_requires_both_fields() {
        let h = harness(FakeTransport::new(Vec::new()));
        h.widget.enter_order_tracking();
        h.widget.send_order_tracking("1001", "");
        assert!(h.surface.to_html().contains(ORDER_TRACKING_MISSING));
        assert!(h.session.order_tracking_mode());
    }

    #[tokio::test]
    async fn order_tracking_composes_request_message() {
        let transport = FakeTransport::new(vec![StreamBody::Records(
            "data: {\"type\":\"chunk\",\"chunk\":\"On its way\"}\n\ndata: {\"type\":\"end_turn\"}\n\n",
        )]);
        let h = harness(transport);

        h.widget.enter_order_tracking();
        h.widget.send_order_tracking("1001", "jo@example.com");
        h.widget.flush().await;

        assert!(!h.session.order_tracking_mode());
        assert_eq!(
            h.transport.sent_messages(),
            vec!["Order Tracking Request: Order No. 1001, Email: jo@example.com"]
        );
    }

    #[tokio::test]
    async fn failed_request_shows_generic_failure() {
        // No scripted bodies: send_chat errors.
        let h = harness(FakeTransport::new(Vec::new()));
        h.widget.send("hello?");
        h.widget.flush().await;
        assert!(h.surface.to_html().contains(GENERIC_FAILURE));
    }

    #[tokio::test]
    async fn auth_trigger_resumes_stored_message_once() {
        let transport = FakeTransport::new(vec![StreamBody::Records(
            "data: {\"type\":\"chunk\",\"chunk\":\"resumed\"}\n\n",
        )]);
        let h = harness(transport);
        h.session.set_conversation_id("c-1");
        h.session.set_auth_url("https://x.shopify.com/authentication/oauth/authorize");
        h.session.set_last_user_message("buy the mug");

        h.widget.trigger_auth();
        h.widget.flush().await;

        let html = h.surface.to_html();
        assert!(html.contains(AUTH_SUCCESS));
        assert!(html.contains("resumed"));
        assert_eq!(h.transport.sent_messages(), vec!["buy the mug"]);
        // Consumed: a second trigger has nothing to resume.
        assert!(h.session.take_last_user_message().is_none());
    }

    #[tokio::test]
    async fn auth_trigger_without_url_does_nothing() {
        let h = harness(FakeTransport::new(Vec::new()));
        h.widget.trigger_auth();
        h.widget.flush().await;
        assert!(h.transport.sent_messages().is_empty());
        assert_eq!(h.surface.to_html(), "");
    }

    #[tokio::test]
    async fn abandon_wipes_session() {
        let h = harness(FakeTransport::new(Vec::new()));
        h.session.set_conversation_id("c-1");
        h.widget.enter_order_tracking();
        h.widget.abandon();
        assert!(h.session.conversation_id().is_none());
        assert!(!h.session.order_tracking_mode());
    }
}
