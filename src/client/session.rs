use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::time::Instant;

use crate::domain::credits::CreditState;
use crate::domain::ticket::{Ticket, TicketRequest};
use crate::error::{AppError, AppResult};
use crate::services::{Clipboard, LocalStorage, TicketService};

pub const COOLDOWN_TICKS: u32 = 4;
pub const COOLDOWN_TICK: Duration = Duration::from_secs(1);
pub const COPIED_DURATION: Duration = Duration::from_secs(2);

pub const GENERIC_FAILURE: &str = "Error generating ticket.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

/// Calendar day in the form the credit store keys on, e.g. `Sun Oct 18 2026`.
pub fn today() -> String {
    Local::now().format("%a %b %d %Y").to_string()
}

/// Form state, quota and cooldown of one client.
pub struct ClientSession {
    text: String,
    image: Option<String>,
    ticket: Option<Ticket>,
    phase: Phase,
    cooldown: u32,
    copied_until: Option<Instant>,
    credits: CreditState,
    storage: Arc<dyn LocalStorage>,
}

impl ClientSession {
    pub fn open(storage: Arc<dyn LocalStorage>, today: &str, daily_limit: u32) -> AppResult<Self> {
        let credits = CreditState::load(storage.as_ref(), today, daily_limit)?;
        Ok(Self {
            text: String::new(),
            image: None,
            ticket: None,
            phase: Phase::Idle,
            cooldown: 0,
            copied_until: None,
            credits,
            storage,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn append_line(&mut self, line: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(line);
    }

    pub fn attach_image(&mut self, data_url: String) {
        self.image = Some(data_url);
    }

    pub fn detach_image(&mut self) {
        self.image = None;
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        self.ticket.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn copied(&self) -> bool {
        self.copied_until.is_some()
    }

    /// When the copied confirmation should go away, if it is showing.
    pub fn copied_deadline(&self) -> Option<Instant> {
        self.copied_until
    }

    pub fn credits(&self) -> u32 {
        self.credits.credits
    }

    pub fn daily_limit(&self) -> u32 {
        self.credits.daily_limit
    }

    /// Mirrors the enabled state of the generate control.
    pub fn can_generate(&self) -> bool {
        self.credits.has_credits()
            && !self.text.is_empty()
            && self.phase != Phase::Loading
            && self.cooldown == 0
    }

    fn begin(&mut self) -> AppResult<TicketRequest> {
        if !self.credits.has_credits() {
            return Err(AppError::QuotaExhausted);
        }
        if self.phase == Phase::Loading {
            return Err(AppError::Blocked("a request is already in flight".to_string()));
        }
        if self.cooldown > 0 {
            return Err(AppError::Blocked(format!("Cooldown: {}s", self.cooldown)));
        }
        if self.text.is_empty() {
            return Err(AppError::Blocked("describe the issue first".to_string()));
        }

        self.ticket = None;
        self.copied_until = None;
        self.phase = Phase::Loading;
        Ok(TicketRequest {
            email_text: self.text.clone(),
            image_base64: self.image.clone(),
        })
    }

    /// Runs one generation. Failures consume no credit and collapse into one message.
    pub async fn generate(&mut self, service: &dyn TicketService) -> AppResult<&Ticket> {
        let request = self.begin()?;

        match service.analyze(&request).await {
            Ok(ticket) => {
                self.phase = Phase::Success;
                self.cooldown = COOLDOWN_TICKS;
                let ticket = &*self.ticket.insert(ticket);
                self.credits.consume(self.storage.as_ref())?;
                tracing::info!(credits = self.credits.credits, "ticket generated");
                Ok(ticket)
            }
            Err(err) => {
                tracing::error!(error = %err, "generation failed");
                self.phase = Phase::Error;
                Err(AppError::Client(GENERIC_FAILURE.to_string()))
            }
        }
    }

    /// Advances the cooldown by one tick and returns what is left.
    pub fn tick(&mut self) -> u32 {
        self.cooldown = self.cooldown.saturating_sub(1);
        self.cooldown
    }

    /// Copies the current ticket as Markdown. Returns false when there is none.
    pub async fn copy(&mut self, clipboard: &dyn Clipboard) -> AppResult<bool> {
        let Some(ticket) = &self.ticket else {
            return Ok(false);
        };
        clipboard.write_text(&ticket.to_markdown()).await?;
        self.copied_until = Some(Instant::now() + COPIED_DURATION);
        Ok(true)
    }

    /// Drops the copied confirmation once its deadline has passed.
    /// Returns true when it was cleared by this call.
    pub fn expire_copied(&mut self) -> bool {
        match self.copied_until {
            Some(deadline) if Instant::now() >= deadline => {
                self.copied_until = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::credits::CREDITS_KEY;
    use crate::services::local_storage::MemoryStorage;

    const TODAY: &str = "Sun Oct 18 2026";

    pub(crate) struct FakeTicketService {
        pub fail: bool,
        pub calls: AtomicUsize,
        pub requests: Mutex<Vec<TicketRequest>>,
    }

    impl FakeTicketService {
        pub(crate) fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TicketService for FakeTicketService {
        async fn analyze(&self, request: &TicketRequest) -> AppResult<Ticket> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(AppError::Client("API Failed".to_string()));
            }
            Ok(Ticket {
                title: "Checkout frozen".to_string(),
                severity: "Critical".to_string(),
                summary: "Tapping checkout does nothing.".to_string(),
                steps: vec!["A".to_string(), "B".to_string()],
                fix: "Re-enable the button".to_string(),
            })
        }

        async fn check_models(&self) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeClipboard {
        pub contents: Mutex<Option<String>>,
    }

    #[async_trait]
    impl Clipboard for FakeClipboard {
        async fn write_text(&self, text: &str) -> AppResult<()> {
            *self.contents.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    pub(crate) fn session(limit: u32) -> (ClientSession, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::default());
        let session = ClientSession::open(storage.clone(), TODAY, limit).unwrap();
        (session, storage)
    }

    #[tokio::test]
    async fn success_consumes_one_credit_and_persists() {
        let (mut session, storage) = session(10);
        session.set_text("checkout is frozen");

        let ticket = session.generate(&FakeTicketService::new(false)).await.unwrap();
        assert_eq!(ticket.title, "Checkout frozen");

        assert_eq!(session.credits(), 9);
        assert_eq!(session.phase(), Phase::Success);
        assert_eq!(storage.get_item(CREDITS_KEY).unwrap().as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn failure_keeps_credits_and_reports_generic_message() {
        let (mut session, storage) = session(10);
        session.set_text("checkout is frozen");

        let err = session.generate(&FakeTicketService::new(true)).await.unwrap_err();

        assert_eq!(err.to_string(), format!("ticket service error: {GENERIC_FAILURE}"));
        assert_eq!(session.credits(), 10);
        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(session.cooldown(), 0);
        assert!(session.ticket().is_none());
        assert_eq!(storage.get_item(CREDITS_KEY).unwrap().as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn cooldown_disables_generation_for_four_ticks() {
        let (mut session, _) = session(10);
        session.set_text("checkout is frozen");
        session.generate(&FakeTicketService::new(false)).await.unwrap();

        for remaining in (1..=COOLDOWN_TICKS).rev() {
            assert_eq!(session.cooldown(), remaining);
            assert!(!session.can_generate());
            session.tick();
        }

        assert_eq!(session.cooldown(), 0);
        assert!(session.can_generate());
        assert_eq!(session.tick(), 0);
    }

    #[tokio::test]
    async fn generating_during_cooldown_is_blocked() {
        let (mut session, _) = session(10);
        session.set_text("checkout is frozen");
        let service = FakeTicketService::new(false);
        session.generate(&service).await.unwrap();

        let err = session.generate(&service).await.unwrap_err();
        assert!(matches!(err, AppError::Blocked(_)));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_quota_blocks_without_calling_the_server() {
        let (mut session, _) = session(0);
        session.set_text("checkout is frozen");
        let service = FakeTicketService::new(false);

        let err = session.generate(&service).await.unwrap_err();

        assert!(matches!(err, AppError::QuotaExhausted));
        assert_eq!(err.to_string(), "Daily limit reached.");
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_text_cannot_generate() {
        let (mut session, _) = session(10);
        assert!(!session.can_generate());
        let err = session.generate(&FakeTicketService::new(false)).await.unwrap_err();
        assert!(matches!(err, AppError::Blocked(_)));
    }

    #[tokio::test]
    async fn request_carries_text_and_image() {
        let (mut session, _) = session(10);
        session.append_line("line one");
        session.append_line("line two");
        session.attach_image("data:image/png;base64,AAAA".to_string());
        let service = FakeTicketService::new(false);

        session.generate(&service).await.unwrap();

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests[0].email_text, "line one\nline two");
        assert_eq!(
            requests[0].image_base64.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[tokio::test]
    async fn copy_writes_markdown_and_sets_flag() {
        let (mut session, _) = session(10);
        let clipboard = FakeClipboard::default();
        assert!(!session.copy(&clipboard).await.unwrap());

        session.set_text("checkout is frozen");
        session.generate(&FakeTicketService::new(false)).await.unwrap();
        assert!(session.copy(&clipboard).await.unwrap());
        assert!(session.copied());

        let copied = clipboard.contents.lock().unwrap().clone().unwrap();
        assert!(copied.contains("- A\n- B"));
        assert!(copied.contains("```\nRe-enable the button\n```"));
    }

    #[tokio::test(start_paused = true)]
    async fn copied_flag_expires_after_its_duration() {
        let (mut session, _) = session(10);
        let clipboard = FakeClipboard::default();
        session.set_text("checkout is frozen");
        session.generate(&FakeTicketService::new(false)).await.unwrap();

        assert!(session.copy(&clipboard).await.unwrap());
        assert!(session.copied());
        assert_eq!(
            session.copied_deadline(),
            Some(Instant::now() + COPIED_DURATION)
        );

        tokio::time::advance(COPIED_DURATION - Duration::from_millis(1)).await;
        assert!(!session.expire_copied());
        assert!(session.copied());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(session.expire_copied());
        assert!(!session.copied());
        assert!(session.copied_deadline().is_none());
    }

    #[tokio::test]
    async fn new_generation_clears_the_copied_flag() {
        let (mut session, _) = session(10);
        let clipboard = FakeClipboard::default();
        let service = FakeTicketService::new(false);
        session.set_text("checkout is frozen");
        session.generate(&service).await.unwrap();
        session.copy(&clipboard).await.unwrap();

        while session.cooldown() > 0 {
            session.tick();
        }
        session.generate(&service).await.unwrap();
        assert!(!session.copied());
    }
}
