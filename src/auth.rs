// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

// Token polling for the authentication flow.
//
// When the server asks for authentication, the widget opens the auth
// URL and starts polling the token-status endpoint. Each polling run is
// identified by a generated id stored in the session; starting a new
// run supersedes any older one, which then stops at its next wakeup.
// Exhausting the attempt cap stops polling silently.

use crate::client::Transport;
use crate::config::PollingConfig;
use crate::session::ChatSession;
use std::sync::Arc;
use tokio::time::Duration;

/// Polls token status until authorized, superseded, or out of attempts.
pub struct TokenPoller {
    transport: Arc<dyn Transport>,
    session: Arc<ChatSession>,
    config: PollingConfig,
}

impl TokenPoller {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<ChatSession>,
        config: PollingConfig,
    ) -> Self {
        Self {
            transport,
            session,
            config,
        }
    }

    /// Run one polling session for the given conversation.
    ///
    /// Returns the pending user message when authorization succeeds and
    /// a message was stored; the message is removed from the session in
    /// the same step, so a resume happens at most once. Returns `None`
    /// on supersession or attempt exhaustion.
    pub async fn run(&self, conversation_id: &str) -> Option<String> {
        let polling_id = uuid::Uuid::new_v4().to_string();
        self.session.set_polling_id(&polling_id);

        tokio::time::sleep(Duration::from_secs(self.config.initial_delay_secs)).await;

        let mut attempts = 0;
        loop {
            // A newer polling session owns the id now; stop quietly.
            if self.session.polling_id().as_deref() != Some(&polling_id) {
                tracing::debug!("superseded by a newer polling session");
                return None;
            }

            if attempts >= self.config.max_attempts {
                tracing::debug!(attempts, "token polling attempts exhausted");
                return None;
            }
            attempts += 1;

            match self.transport.token_status(conversation_id).await {
                Ok(status) if status.authorized() => {
                    tracing::info!("token available, resuming conversation");
                    self.session.clear_polling_id();
                    return self.session.take_last_user_message();
                }
                Ok(_) => {}
                Err(err) => {
                    // Poll failures are retried on the same schedule.
                    tracing::warn!(error = %err, "token status check failed");
                }
            }

            tokio::time::sleep(Duration::from_secs(self.config.interval_secs)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ByteStream, ChatRequest, HistoryResponse, TokenStatus, TransportError};
    use crate::session::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Transport double whose token-status answers are scripted.
    struct ScriptedTransport {
        answers: Mutex<Vec<Result<TokenStatus, TransportError>>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(answers: Vec<Result<TokenStatus, TransportError>>) -> Self {
            Self {
                answers: Mutex::new(answers),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send_chat(&self, _request: &ChatRequest) -> Result<ByteStream, TransportError> {
            Err(TransportError::Status(500))
        }

        async fn fetch_history(
            &self,
            _conversation_id: &str,
        ) -> Result<HistoryResponse, TransportError> {
            Ok(HistoryResponse::default())
        }

        async fn token_status(
            &self,
            _conversation_id: &str,
        ) -> Result<TokenStatus, TransportError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                Ok(TokenStatus {
                    status: "pending".into(),
                })
            } else {
                answers.remove(0)
            }
        }
    }

    fn pending() -> Result<TokenStatus, TransportError> {
        Ok(TokenStatus {
            status: "pending".into(),
        })
    }

    fn authorized() -> Result<TokenStatus, TransportError> {
        Ok(TokenStatus {
            status: "authorized".into(),
        })
    }

    // Real cadence; tests run under paused time so sleeps are instant.
    fn schedule(max_attempts: u32) -> PollingConfig {
        PollingConfig {
            initial_delay_secs: 2,
            interval_secs: 10,
            max_attempts,
        }
    }

    fn session_with_message(message: &str) -> Arc<ChatSession> {
        let session = Arc::new(ChatSession::new(Arc::new(MemoryStore::new())));
        session.set_last_user_message(message);
        session
    }

    #[tokio::test(start_paused = true)]
    async fn resumes_after_n_polls_exactly_once() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            pending(),
            pending(),
            authorized(),
        ]));
        let session = session_with_message("show me mugs");
        let poller = TokenPoller::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&session),
            schedule(30),
        );

        let resumed = poller.run("c-1").await;
        assert_eq!(resumed.as_deref(), Some("show me mugs"));
        assert_eq!(transport.calls(), 3);
        // The stored message is consumed; nothing left to resume twice.
        assert!(session.take_last_user_message().is_none());
        assert!(session.polling_id().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_silently_after_attempt_cap() {
        let transport = Arc::new(ScriptedTransport::new(Vec::new()));
        let session = session_with_message("show me mugs");
        let poller = TokenPoller::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&session),
            schedule(5),
        );

        assert!(poller.run("c-1").await.is_none());
        assert_eq!(transport.calls(), 5);
        // The pending message stays stored; nothing was resumed.
        assert_eq!(
            session.take_last_user_message().as_deref(),
            Some("show me mugs")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn poll_errors_consume_attempts_and_retry() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(TransportError::Status(500)),
            authorized(),
        ]));
        let session = session_with_message("resume me");
        let poller = TokenPoller::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&session),
            schedule(30),
        );

        assert_eq!(poller.run("c-1").await.as_deref(), Some("resume me"));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_polling_session_supersedes_older() {
        let transport = Arc::new(ScriptedTransport::new(Vec::new()));
        let session = session_with_message("stale");

        // Start a run, then claim the polling id while it waits out the
        // initial delay. The old run must stop at its first wakeup.
        let poller = TokenPoller::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&session),
            schedule(30),
        );
        let handle = tokio::spawn(async move { poller.run("c-1").await });
        // Let the spawned run register its polling id and start sleeping.
        tokio::task::yield_now().await;
        session.set_polling_id("newer-session");

        assert!(handle.await.unwrap().is_none());
        // The superseded run saw the replaced id before ever polling.
        assert_eq!(transport.calls(), 0);
    }
}
