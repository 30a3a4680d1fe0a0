//! Question submission
//!
//! [`ChatController`] ties the session store and usage gate to a guidance
//! backend. A submission is split into [`ChatController::begin`], which
//! records the user's message and captures the target session, and
//! [`ChatController::complete`], which routes the outcome back to that same
//! session even if the user has switched threads in between.

use crate::api::types::{AskRequest, GuidanceResponse};
use crate::api::ApiClient;
use crate::chat::session::{Message, MessageMetadata};
use crate::chat::store::SessionStore;
use crate::chat::usage::{UsageGate, UsageSource, DEFAULT_LIMIT_MESSAGE};
use crate::error::{find_vaani_error, Result, VaaniError};
use async_trait::async_trait;

/// Something that answers guidance questions
#[async_trait]
pub trait GuidanceBackend: Send + Sync {
    async fn ask(&self, request: &AskRequest) -> Result<GuidanceResponse>;
}

#[async_trait]
impl GuidanceBackend for ApiClient {
    async fn ask(&self, request: &AskRequest) -> Result<GuidanceResponse> {
        ApiClient::ask(self, request).await
    }
}

/// A question that has been recorded and is awaiting its answer
#[derive(Debug)]
pub struct PendingSubmission {
    session_id: String,
    request: AskRequest,
}

impl PendingSubmission {
    /// Session the answer belongs to
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Request to send to the backend
    pub fn request(&self) -> &AskRequest {
        &self.request
    }
}

/// How a submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The backend answered
    Answered,
    /// The request failed; the error text was recorded in the thread
    Failed(String),
    /// The backend refused for plan or usage reasons
    LimitReached(String),
}

/// Chat state for one signed-in user
pub struct ChatController {
    sessions: SessionStore,
    usage: UsageGate,
    pending: bool,
    include_context: bool,
}

impl ChatController {
    /// Controller over already-loaded `sessions`
    pub fn new(sessions: SessionStore, include_context: bool) -> Self {
        Self {
            sessions,
            usage: UsageGate::new(),
            pending: false,
            include_context,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionStore {
        &mut self.sessions
    }

    pub fn usage(&self) -> &UsageGate {
        &self.usage
    }

    pub fn usage_mut(&mut self) -> &mut UsageGate {
        &mut self.usage
    }

    /// Whether a question is awaiting its answer
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Ask `question` and record the answer
    ///
    /// A closed usage gate is rechecked with `usage` first, so a gate closed
    /// by a local estimate opens again once the server allows questions.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ChatController::begin`], and
    /// `VaaniError::Unauthorized` when the backend rejects the session.
    /// Other request failures are recorded in the thread instead.
    pub async fn submit(
        &mut self,
        question: &str,
        backend: &dyn GuidanceBackend,
        usage: &dyn UsageSource,
    ) -> Result<SubmitOutcome> {
        if !question.trim().is_empty() && !self.pending {
            self.recheck_usage(usage).await;
        }
        let pending = self.begin(question)?;
        let result = backend.ask(pending.request()).await;
        self.complete(pending, result, usage).await
    }

    /// Ask the server again while the gate is closed
    ///
    /// Returns whether a question may be asked. An open gate is left as is;
    /// a failed refresh keeps the closed state.
    pub async fn recheck_usage(&mut self, usage: &dyn UsageSource) -> bool {
        if self.usage.can_ask() {
            return true;
        }
        if let Err(e) = self.usage.refresh(usage).await {
            tracing::warn!("Usage recheck failed: {}", e);
        }
        self.usage.can_ask()
    }

    /// Record the user's question and capture its session
    ///
    /// Creates a session first if there is no valid current one.
    ///
    /// # Errors
    ///
    /// * `VaaniError::Validation` for a blank question
    /// * `VaaniError::SubmissionPending` while another question is in flight
    /// * `VaaniError::QuotaExceeded` when the usage gate is closed
    pub fn begin(&mut self, question: &str) -> Result<PendingSubmission> {
        let question = question.trim();
        if question.is_empty() {
            return Err(VaaniError::Validation("Question cannot be empty".to_string()).into());
        }
        if self.pending {
            return Err(VaaniError::SubmissionPending.into());
        }
        if !self.usage.can_ask() {
            let message = self
                .usage
                .limit_message()
                .unwrap_or(DEFAULT_LIMIT_MESSAGE)
                .to_string();
            return Err(VaaniError::QuotaExceeded(message).into());
        }

        let session_id = self.sessions.resolve_or_create_current();
        self.sessions.append_message(&session_id, Message::user(question));
        self.pending = true;

        let mut request = AskRequest::new(question);
        request.include_context = self.include_context;

        tracing::debug!("Submitting question to session {}", session_id);
        Ok(PendingSubmission {
            session_id,
            request,
        })
    }

    /// Record the outcome of `pending` and re-evaluate usage
    ///
    /// # Errors
    ///
    /// Only `VaaniError::Unauthorized` is returned; the caller is expected to
    /// send the user back to login.
    pub async fn complete(
        &mut self,
        pending: PendingSubmission,
        result: Result<GuidanceResponse>,
        usage: &dyn UsageSource,
    ) -> Result<SubmitOutcome> {
        self.pending = false;
        let session_id = pending.session_id;

        let outcome = match result {
            Ok(response) => {
                let metadata = MessageMetadata {
                    validation_passed: response.validation_passed(),
                    data_points_used: response.data_points_used,
                };
                self.sessions.append_message(
                    &session_id,
                    Message::assistant(response.full_response, metadata),
                );
                SubmitOutcome::Answered
            }
            Err(e) => {
                if matches!(find_vaani_error(&e), Some(VaaniError::Unauthorized(_))) {
                    return Err(e);
                }

                let quota_message = match find_vaani_error(&e) {
                    Some(VaaniError::QuotaExceeded(message)) => Some(message.clone()),
                    _ => None,
                };

                match quota_message {
                    Some(message) => {
                        tracing::info!("Question refused: {}", message);
                        self.usage.mark_exhausted(message.clone());
                        self.sessions
                            .append_message(&session_id, Message::assistant_error(&message));
                        SubmitOutcome::LimitReached(message)
                    }
                    None => {
                        tracing::warn!("Guidance request failed: {}", e);
                        self.sessions
                            .append_message(&session_id, Message::assistant_error(&e));
                        SubmitOutcome::Failed(e.to_string())
                    }
                }
            }
        };

        self.usage.after_question(usage).await;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Tier, UsageCheckResponse, UsageSnapshot, ValidationResult};
    use crate::chat::session::MessageRole;
    use crate::storage::MemoryStore;
    use std::sync::{Arc, Mutex};

    struct StaticBackend {
        answer: Mutex<Option<Result<GuidanceResponse>>>,
        questions: Mutex<Vec<String>>,
    }

    impl StaticBackend {
        fn answering(text: &str) -> Self {
            Self::with(Ok(GuidanceResponse {
                empathy_line: String::new(),
                reasons: Vec::new(),
                direction: String::new(),
                caution: None,
                data_points_used: vec!["moon_sign".into(), "current_dasha".into()],
                validation: Some(ValidationResult {
                    passed: false,
                    issues: vec!["vague".into()],
                    was_regenerated: true,
                }),
                full_response: text.to_string(),
            }))
        }

        fn with(result: Result<GuidanceResponse>) -> Self {
            Self {
                answer: Mutex::new(Some(result)),
                questions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GuidanceBackend for StaticBackend {
        async fn ask(&self, request: &AskRequest) -> Result<GuidanceResponse> {
            self.questions.lock().unwrap().push(request.question.clone());
            self.answer
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted answer")))
        }
    }

    struct DownUsage;

    #[async_trait]
    impl UsageSource for DownUsage {
        async fn check_usage(&self) -> Result<UsageCheckResponse> {
            Err(VaaniError::Api {
                status: 502,
                message: "Bad gateway".into(),
            }
            .into())
        }
    }

    struct FixedUsage(bool);

    #[async_trait]
    impl UsageSource for FixedUsage {
        async fn check_usage(&self) -> Result<UsageCheckResponse> {
            Ok(UsageCheckResponse {
                allowed: self.0,
                usage: UsageSnapshot {
                    tier: Tier::Starter,
                    daily_limit: 5,
                    daily_used: 1,
                    daily_remaining: 4,
                    monthly_limit: 50,
                    monthly_used: 1,
                    monthly_remaining: 49,
                    lifetime_limit: None,
                    lifetime_used: None,
                    lifetime_remaining: None,
                    max_response_chars: 1500,
                    can_ask_question: self.0,
                    limit_message: None,
                    use_validator: true,
                    use_memory: false,
                },
                message: None,
            })
        }
    }

    fn controller() -> ChatController {
        let mut store = SessionStore::new(Arc::new(MemoryStore::new()));
        store.load("user-1");
        ChatController::new(store, true)
    }

    #[tokio::test]
    async fn test_first_question_creates_titled_session() {
        let mut chat = controller();
        let backend = StaticBackend::answering("Saturn favours steady effort this year.");
        let question =
            "What does my chart say about my career and how should I plan the next year?";

        let outcome = chat
            .submit(question, &backend, &FixedUsage(true))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Answered);

        let session = chat.sessions().current().unwrap();
        assert_eq!(session.title, "What does my chart say about m...");
        assert_eq!(session.len(), 2);
        assert_eq!(chat.sessions().sessions()[0].id, session.id);

        let answer = &session.messages[1];
        assert_eq!(answer.role, MessageRole::Assistant);
        let meta = answer.metadata.as_ref().unwrap();
        assert_eq!(meta.data_points_used, vec!["moon_sign", "current_dasha"]);
        assert!(!meta.validation_passed);
        assert!(!chat.is_pending());
    }

    #[tokio::test]
    async fn test_blank_question_rejected_without_side_effects() {
        let mut chat = controller();
        let err = chat.begin("   ").unwrap_err();
        assert!(matches!(
            find_vaani_error(&err),
            Some(VaaniError::Validation(_))
        ));
        assert!(chat.sessions().sessions().is_empty());
    }

    #[tokio::test]
    async fn test_second_submission_while_pending_rejected() {
        let mut chat = controller();
        let _pending = chat.begin("first").unwrap();
        let err = chat.begin("second").unwrap_err();
        assert!(matches!(
            find_vaani_error(&err),
            Some(VaaniError::SubmissionPending)
        ));
        assert_eq!(chat.sessions().current().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_routed_to_session_captured_at_submit() {
        let mut chat = controller();
        let pending = chat.begin("Question for thread A").unwrap();
        let thread_a = pending.session_id().to_string();

        let thread_b = chat.sessions_mut().create_session();
        assert_eq!(chat.sessions().current_id(), Some(thread_b.as_str()));

        let backend = StaticBackend::answering("Answer for A");
        let result = backend.ask(pending.request()).await;
        chat.complete(pending, result, &FixedUsage(true))
            .await
            .unwrap();

        assert_eq!(chat.sessions().get(&thread_a).unwrap().len(), 2);
        assert!(chat.sessions().get(&thread_b).unwrap().is_empty());
        assert_eq!(chat.sessions().current_id(), Some(thread_b.as_str()));
    }

    #[tokio::test]
    async fn test_transport_failure_recorded_as_assistant_message() {
        let mut chat = controller();
        let backend = StaticBackend::with(Err(VaaniError::Api {
            status: 500,
            message: "Internal Server Error".into(),
        }
        .into()));

        let outcome = chat
            .submit("Will I travel abroad?", &backend, &FixedUsage(true))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(_)));

        let session = chat.sessions().current().unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages[1].role, MessageRole::Assistant);
        assert!(session.messages[1].content.contains("Internal Server Error"));
        assert!(chat.usage().can_ask());
    }

    #[tokio::test]
    async fn test_quota_refusal_closes_gate() {
        let mut chat = controller();
        let backend = StaticBackend::with(Err(VaaniError::QuotaExceeded(
            "Daily limit of 1 question reached".into(),
        )
        .into()));

        let outcome = chat
            .submit("One more?", &backend, &DownUsage)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::LimitReached("Daily limit of 1 question reached".into())
        );
        assert!(!chat.usage().can_ask());

        let err = chat.begin("And another").unwrap_err();
        assert!(find_vaani_error(&err).unwrap().is_quota());
    }

    #[tokio::test]
    async fn test_unauthorized_propagates() {
        let mut chat = controller();
        let backend = StaticBackend::with(Err(VaaniError::Unauthorized(
            "Could not validate credentials".into(),
        )
        .into()));

        let err = chat
            .submit("Hello?", &backend, &FixedUsage(true))
            .await
            .unwrap_err();
        assert!(matches!(
            find_vaani_error(&err),
            Some(VaaniError::Unauthorized(_))
        ));
        assert!(!chat.is_pending());
    }

    #[tokio::test]
    async fn test_server_usage_closes_gate_after_answer() {
        let mut chat = controller();
        let backend = StaticBackend::answering("ok");
        chat.submit("Last one", &backend, &FixedUsage(false))
            .await
            .unwrap();
        assert!(!chat.usage().can_ask());
    }

    #[tokio::test]
    async fn test_locally_closed_gate_reopens_when_server_allows() {
        let mut chat = controller();
        chat.usage_mut().mark_exhausted("Daily limit reached");
        assert!(!chat.usage().can_ask());

        let backend = StaticBackend::answering("The gate is open again.");
        let outcome = chat
            .submit("Can I ask now?", &backend, &FixedUsage(true))
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Answered);
        assert_eq!(backend.questions.lock().unwrap().len(), 1);
        assert!(chat.usage().can_ask());
    }

    #[tokio::test]
    async fn test_recheck_keeps_gate_closed_when_server_unreachable() {
        let mut chat = controller();
        chat.usage_mut().mark_exhausted("Daily limit reached");

        assert!(!chat.recheck_usage(&DownUsage).await);

        let backend = StaticBackend::answering("unused");
        let err = chat
            .submit("Still there?", &backend, &DownUsage)
            .await
            .unwrap_err();
        assert!(find_vaani_error(&err).unwrap().is_quota());
        assert!(backend.questions.lock().unwrap().is_empty());
        assert_eq!(chat.usage().limit_message(), Some("Daily limit reached"));
    }

    #[tokio::test]
    async fn test_include_context_forwarded() {
        let mut store = SessionStore::new(Arc::new(MemoryStore::new()));
        store.load("user-1");
        let mut chat = ChatController::new(store, false);
        let pending = chat.begin("  padded question  ").unwrap();
        assert!(!pending.request().include_context);
        assert_eq!(pending.request().question, "padded question");
    }
}
