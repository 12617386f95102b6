use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::embeds::Reply;
use crate::events::{
    default_dispatcher, EventContext, EventDispatcher, HandlerResult, InteractionEnvelope,
    InteractionEvent,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport reply failed: {0}")]
    Respond(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Connection-level boundary to Discord. Session management, command
/// registration and the interaction wire format live behind this trait.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<InteractionEnvelope>, TransportError>;
    async fn acknowledge(&self, interaction_id: &str) -> Result<(), TransportError>;
    async fn respond(&self, interaction_id: &str, reply: &Reply) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopGatewayTransport;

#[async_trait]
impl GatewayTransport for NoopGatewayTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<InteractionEnvelope>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(&self, _interaction_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn respond(&self, _interaction_id: &str, _reply: &Reply) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

pub struct GatewayRunner {
    transport: Arc<dyn GatewayTransport>,
    dispatcher: Arc<EventDispatcher>,
    reconnect_policy: ReconnectPolicy,
}

impl Default for GatewayRunner {
    fn default() -> Self {
        Self {
            transport: Arc::new(NoopGatewayTransport),
            dispatcher: Arc::new(default_dispatcher()),
            reconnect_policy: ReconnectPolicy::default(),
        }
    }
}

impl GatewayRunner {
    pub fn new(
        transport: Arc<dyn GatewayTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher: Arc::new(dispatcher), reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "gateway transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "gateway retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening gateway transport connection");
        self.transport.connect().await?;
        info!(attempt, "gateway transport connected");

        let mut inflight: JoinSet<()> = JoinSet::new();

        let outcome = loop {
            match self.transport.next_envelope().await {
                Ok(Some(envelope)) => {
                    info!(
                        event_name = "ingress.discord.envelope_received",
                        interaction_id = %envelope.interaction_id,
                        event_type = ?envelope.event.event_type(),
                        command = command_name(&envelope).unwrap_or("unknown"),
                        "received interaction envelope"
                    );

                    // Acknowledge before any handling so the platform's
                    // response deadline holds even when the lookup is slow.
                    if let Err(error) = self.transport.acknowledge(&envelope.interaction_id).await
                    {
                        warn!(
                            event_name = "ingress.discord.ack_sent",
                            interaction_id = %envelope.interaction_id,
                            error = %error,
                            "failed to acknowledge interaction envelope"
                        );
                    } else {
                        debug!(
                            event_name = "ingress.discord.ack_sent",
                            interaction_id = %envelope.interaction_id,
                            "acknowledged interaction envelope"
                        );
                    }

                    // Each interaction runs on its own task so one slow
                    // metadata lookup never stalls the envelope pump.
                    inflight.spawn(handle_envelope(
                        Arc::clone(&self.transport),
                        Arc::clone(&self.dispatcher),
                        envelope,
                    ));
                }
                Ok(None) => break Ok(()),
                Err(error) => break Err(error),
            }
        };

        // In-flight handlers still owe their single reply; drain them before
        // tearing the connection down.
        while inflight.join_next().await.is_some() {}

        match outcome {
            Ok(()) => {
                info!(attempt, "gateway transport stream closed");
                self.transport.disconnect().await?;
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}

async fn handle_envelope(
    transport: Arc<dyn GatewayTransport>,
    dispatcher: Arc<EventDispatcher>,
    envelope: InteractionEnvelope,
) {
    let context = EventContext { correlation_id: envelope.interaction_id.clone() };

    let result = match dispatcher.dispatch(&envelope, &context).await {
        Ok(result) => result,
        Err(error) => {
            warn!(
                interaction_id = %envelope.interaction_id,
                error = %error,
                "event dispatch failed; continuing gateway loop"
            );
            return;
        }
    };

    let HandlerResult::Responded(reply) = result else {
        return;
    };

    if let Err(error) = transport.respond(&envelope.interaction_id, &reply).await {
        warn!(
            event_name = "egress.discord.reply_sent",
            interaction_id = %envelope.interaction_id,
            error = %error,
            "failed to send interaction reply"
        );
    } else {
        debug!(
            event_name = "egress.discord.reply_sent",
            interaction_id = %envelope.interaction_id,
            "sent interaction reply"
        );
    }
}

fn command_name(envelope: &InteractionEnvelope) -> Option<&str> {
    match &envelope.event {
        InteractionEvent::SlashCommand(payload) => Some(payload.command.as_str()),
        InteractionEvent::Unsupported { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::{
        GatewayRunner, GatewayTransport, ReconnectPolicy, TransportError,
    };
    use crate::commands::SlashCommandPayload;
    use crate::embeds::Reply;
    use crate::events::{default_dispatcher, InteractionEnvelope, InteractionEvent};

    #[derive(Default)]
    struct ScriptedTransport {
        state: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        connect_results: VecDeque<Result<(), TransportError>>,
        envelopes: VecDeque<Result<Option<InteractionEnvelope>, TransportError>>,
        connect_attempts: usize,
        // Ordered log of acknowledgments and replies, for ordering asserts.
        operations: Vec<String>,
        replies: Vec<(String, Reply)>,
        disconnect_calls: usize,
    }

    impl ScriptedTransport {
        fn with_script(
            connect_results: Vec<Result<(), TransportError>>,
            envelopes: Vec<Result<Option<InteractionEnvelope>, TransportError>>,
        ) -> Self {
            Self {
                state: Mutex::new(ScriptedState {
                    connect_results: connect_results.into(),
                    envelopes: envelopes.into(),
                    ..ScriptedState::default()
                }),
            }
        }

        async fn connect_attempts(&self) -> usize {
            self.state.lock().await.connect_attempts
        }

        async fn operations(&self) -> Vec<String> {
            self.state.lock().await.operations.clone()
        }

        async fn replies(&self) -> Vec<(String, Reply)> {
            self.state.lock().await.replies.clone()
        }

        async fn disconnect_calls(&self) -> usize {
            self.state.lock().await.disconnect_calls
        }
    }

    #[async_trait]
    impl GatewayTransport for ScriptedTransport {
        async fn connect(&self) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.connect_attempts += 1;
            state.connect_results.pop_front().unwrap_or(Ok(()))
        }

        async fn next_envelope(&self) -> Result<Option<InteractionEnvelope>, TransportError> {
            let mut state = self.state.lock().await;
            state.envelopes.pop_front().unwrap_or(Ok(None))
        }

        async fn acknowledge(&self, interaction_id: &str) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.operations.push(format!("ack:{interaction_id}"));
            Ok(())
        }

        async fn respond(
            &self,
            interaction_id: &str,
            reply: &Reply,
        ) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.operations.push(format!("reply:{interaction_id}"));
            state.replies.push((interaction_id.to_owned(), reply.clone()));
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.disconnect_calls += 1;
            Ok(())
        }
    }

    fn greet_envelope(interaction_id: &str) -> InteractionEnvelope {
        InteractionEnvelope {
            interaction_id: interaction_id.to_owned(),
            event: InteractionEvent::SlashCommand(SlashCommandPayload {
                command: "greet".to_owned(),
                option: None,
                channel_id: "C1".to_owned(),
                user_id: "U1".to_owned(),
                user_display_name: "Ada".to_owned(),
            }),
        }
    }

    #[tokio::test]
    async fn reconnects_after_initial_connect_failure() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Err(TransportError::Connect("network down".to_owned())), Ok(())],
            vec![Ok(Some(greet_envelope("int-1"))), Ok(None)],
        ));

        let runner = GatewayRunner::new(
            transport.clone(),
            default_dispatcher(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should not fail");

        assert_eq!(transport.connect_attempts().await, 2);
        let replies = transport.replies().await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "int-1");
        assert_eq!(transport.disconnect_calls().await, 1);
    }

    #[tokio::test]
    async fn exhausts_retries_without_crashing() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![
                Err(TransportError::Connect("fail-1".to_owned())),
                Err(TransportError::Connect("fail-2".to_owned())),
                Err(TransportError::Connect("fail-3".to_owned())),
            ],
            vec![],
        ));

        let runner = GatewayRunner::new(
            transport.clone(),
            default_dispatcher(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should degrade gracefully");
        assert_eq!(transport.connect_attempts().await, 3);
    }

    #[tokio::test]
    async fn every_envelope_is_acknowledged_before_its_reply() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Ok(())],
            vec![
                Ok(Some(greet_envelope("int-1"))),
                Ok(Some(greet_envelope("int-2"))),
                Ok(None),
            ],
        ));

        let runner = GatewayRunner::new(
            transport.clone(),
            default_dispatcher(),
            ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should not fail");

        let operations = transport.operations().await;
        for interaction_id in ["int-1", "int-2"] {
            let ack = operations.iter().position(|op| op == &format!("ack:{interaction_id}"));
            let reply =
                operations.iter().position(|op| op == &format!("reply:{interaction_id}"));
            assert!(ack.is_some(), "{interaction_id} should be acknowledged");
            assert!(reply.is_some(), "{interaction_id} should get one reply");
            assert!(ack < reply, "{interaction_id} ack should precede its reply");
        }
    }

    #[tokio::test]
    async fn unsupported_envelopes_produce_no_reply() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Ok(())],
            vec![
                Ok(Some(InteractionEnvelope {
                    interaction_id: "int-3".to_owned(),
                    event: InteractionEvent::Unsupported {
                        event_type: "message_update".to_owned(),
                    },
                })),
                Ok(None),
            ],
        ));

        let runner = GatewayRunner::new(
            transport.clone(),
            default_dispatcher(),
            ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should not fail");

        assert!(transport.replies().await.is_empty());
        assert_eq!(transport.operations().await, vec!["ack:int-3".to_owned()]);
    }

    #[test]
    fn command_name_is_extracted_for_correlation() {
        assert_eq!(super::command_name(&greet_envelope("int-4")), Some("greet"));
    }
}
