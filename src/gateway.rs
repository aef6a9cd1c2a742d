//! Command orchestrator
//!
//! Ties transcription, intent classification, ERP dispatch, history
//! updates, and spoken replies together behind a single session lock.
//! Public operations always resolve; failures become session state and
//! spoken feedback instead of propagating to the caller.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::enhance::TextEnhancer;
use crate::erp::{ErpBackend, ResponseEnvelope, SalesPeriod};
use crate::intent::{CommandKind, classify};
use crate::session::{Action, Command, CommandStatus, SessionState, reduce};
use crate::speech::{Synthesizer, Transcriber};

/// Gateway lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPhase {
    Uninitialized,
    Initializing,
    Ready,
}

/// Orchestrates the voice-command pipeline
pub struct Gateway {
    erp: Option<Arc<dyn ErpBackend>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    enhancer: Option<Arc<dyn TextEnhancer>>,
    reply_language: String,
    phase: Mutex<GatewayPhase>,
    state: Mutex<SessionState>,
}

impl Gateway {
    /// Create a gateway with no capabilities attached
    ///
    /// Listening is rejected until [`Gateway::initialize`] completes.
    #[must_use]
    pub fn new(reply_language: impl Into<String>) -> Self {
        Self {
            erp: None,
            transcriber: None,
            synthesizer: None,
            enhancer: None,
            reply_language: reply_language.into(),
            phase: Mutex::new(GatewayPhase::Uninitialized),
            state: Mutex::new(SessionState {
                is_initializing: true,
                ..SessionState::default()
            }),
        }
    }

    /// Attach the ERP backend
    #[must_use]
    pub fn with_erp(mut self, erp: Arc<dyn ErpBackend>) -> Self {
        self.erp = Some(erp);
        self
    }

    /// Attach the speech-to-text capability
    #[must_use]
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Attach the text-to-speech capability
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Attach the text enhancer
    #[must_use]
    pub fn with_enhancer(mut self, enhancer: Arc<dyn TextEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    /// Bring the gateway to the Ready phase
    ///
    /// Attempts an ERP login when a backend is attached. Login failure is
    /// recorded as a session error but does not block readiness; later
    /// calls may still succeed or fail on their own. Calling again, or
    /// concurrently while a first call is mid-login, is a no-op.
    pub async fn initialize(&self) {
        {
            let mut phase = self.phase.lock().await;
            // Initializing means another caller already owns the login
            if *phase != GatewayPhase::Uninitialized {
                return;
            }
            *phase = GatewayPhase::Initializing;
        }
        self.dispatch(Action::SetInitializing(true)).await;

        if let Some(erp) = &self.erp {
            match erp.login().await {
                Ok(true) => tracing::info!("ERP login succeeded"),
                Ok(false) => tracing::warn!("ERP credentials incomplete, login skipped"),
                Err(e) => {
                    tracing::warn!(error = %e, "ERP login failed");
                    self.dispatch(Action::SetError(e.to_string())).await;
                }
            }
        }

        self.dispatch(Action::SetInitializing(false)).await;
        *self.phase.lock().await = GatewayPhase::Ready;
        tracing::info!("gateway ready");
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> GatewayPhase {
        *self.phase.lock().await
    }

    /// Listen for one utterance and execute whatever was heard
    ///
    /// Rejected while initializing. A second start while a capture is in
    /// flight is a no-op. Transcription failure is recorded as a session
    /// error and the listening flag is always cleared.
    pub async fn start_listening(&self, locale: &str) {
        if *self.phase.lock().await != GatewayPhase::Ready {
            self.dispatch(Action::SetError(
                "الخدمات قيد التهيئة، حاول مرة أخرى".to_string(),
            ))
            .await;
            return;
        }

        let Some(transcriber) = self.transcriber.clone() else {
            self.dispatch(Action::SetError("خدمة الصوت غير مهيأة".to_string()))
                .await;
            return;
        };

        {
            let mut state = self.state.lock().await;
            if state.is_listening {
                tracing::debug!("capture already in flight, ignoring start request");
                return;
            }
            reduce(&mut state, Action::StartListening);
        }

        match transcriber.transcribe(locale).await {
            Ok(text) => {
                self.dispatch(Action::StopListening).await;
                if !text.is_empty() {
                    self.execute_command(&text).await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                self.dispatch(Action::SetError(e.to_string())).await;
                self.dispatch(Action::StopListening).await;
            }
        }
    }

    /// Stop listening, idempotently
    pub async fn stop_listening(&self) {
        if let Some(transcriber) = &self.transcriber {
            transcriber.stop();
        }
        self.dispatch(Action::StopListening).await;
    }

    /// Run one command through the pipeline
    ///
    /// Never returns an error; every outcome lands in the command history
    /// and is answered with speech when a synthesizer is attached.
    pub async fn execute_command(&self, text: &str) {
        let Some(erp) = self.erp.clone() else {
            let message = "خدمة Odoo غير مهيأة";
            self.dispatch(Action::SetError(message.to_string())).await;
            self.speak_reply(message).await;
            return;
        };

        let text = match &self.enhancer {
            Some(enhancer) => enhancer.correct_text(text).await,
            None => text.to_string(),
        };

        let parsed = classify(&text);
        tracing::info!(
            kind = %parsed.kind,
            confidence = parsed.confidence,
            "dispatching command"
        );

        let mut command = Command::new(text.clone(), parsed.clone());
        command.status = CommandStatus::Executing;
        let command_id = command.id.clone();
        self.dispatch(Action::AddCommand(command)).await;

        let envelope = match parsed.kind {
            CommandKind::SalesToday => erp.sales_today().await,
            CommandKind::SalesThisMonth => erp.sales_this_month().await,
            CommandKind::UnpaidInvoices => erp.unpaid_invoices().await,
            CommandKind::LowStock => erp.low_stock_products().await,
            CommandKind::TopCustomers => {
                let period = parsed
                    .parameters
                    .get("period")
                    .map_or_else(SalesPeriod::default, |value| SalesPeriod::parse(value));
                erp.top_customers(period).await
            }
            CommandKind::CustomerInfo => match parsed.parameters.get("customerName") {
                Some(name) => erp.search_customer(name).await,
                None => ResponseEnvelope::failure("لم يتم تحديد اسم العميل"),
            },
            kind => ResponseEnvelope::failure(kind.fallback_error_message()),
        };

        let (status, error) = match &envelope {
            ResponseEnvelope::Success { .. } => (CommandStatus::Success, None),
            ResponseEnvelope::Failure { error } => (CommandStatus::Error, Some(error.clone())),
        };

        let reply_envelope = envelope.clone();
        self.dispatch(Action::UpdateCommand {
            id: command_id,
            status: Some(status),
            result: Some(envelope),
            error: error.clone(),
        })
        .await;

        let reply = if status == CommandStatus::Success {
            self.success_reply(&text, &reply_envelope).await
        } else {
            format!("حدث خطأ: {}", error.unwrap_or_default())
        };
        self.speak_reply(&reply).await;
    }

    /// Clear the command history
    pub async fn clear_commands(&self) {
        self.dispatch(Action::ClearCommands).await;
    }

    /// Clear the session-level error
    pub async fn clear_error(&self) {
        self.dispatch(Action::ClearError).await;
    }

    /// Snapshot of the session state
    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    async fn dispatch(&self, action: Action) {
        let mut state = self.state.lock().await;
        reduce(&mut state, action);
    }

    async fn success_reply(&self, command_text: &str, envelope: &ResponseEnvelope) -> String {
        if let Some(enhancer) = &self.enhancer {
            let result = serde_json::to_value(envelope).unwrap_or_default();
            return enhancer.narrate(command_text, &result).await;
        }

        envelope.count().filter(|&count| count > 0).map_or_else(
            || "تم تنفيذ الأمر بنجاح.".to_string(),
            |count| format!("تم تنفيذ الأمر بنجاح. عدد النتائج: {count}"),
        )
    }

    async fn speak_reply(&self, text: &str) {
        if let Some(synthesizer) = &self.synthesizer
            && let Err(e) = synthesizer.speak(text, &self.reply_language).await
        {
            tracing::warn!(error = %e, "failed to speak reply");
        }
    }
}
