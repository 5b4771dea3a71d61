//! Interactive session
//!
//! Owns the navigation state and the floor page, and maps typed commands
//! onto client operations.

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use floorboard_client::{
    AuthService, ClientConfig, ComposeError, Composer, ComposerStatus, FeedController, FeedView,
    FloorPage, Freshness, LiveSource, NavAction, Navigation, Page, PasscodeGate, ScrollViewport,
    StaticSource, SubmitOutcome, Transition, VirtualViewport,
};
use floorboard_core::{Floor, IdentityProvider, MemoryBackend};
use floorboard_logging::ResidentContextGuard;
use tracing::debug;

use crate::display::*;
use crate::view::{feed_lines, visible};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell {
    backend: Arc<MemoryBackend>,
    config: ClientConfig,
    auth: AuthService<MemoryBackend, MemoryBackend>,
    nav: Navigation,
    page: FloorPage<VirtualViewport>,
    /// Draft state for the open floor; a failed post stays here for `/retry`
    composer: Option<Composer<MemoryBackend, MemoryBackend>>,
    context: Option<ResidentContextGuard>,
    gate: Option<PasscodeGate<MemoryBackend>>,
    unlocked: bool,
}

impl Shell {
    pub fn new(backend: Arc<MemoryBackend>, config: ClientConfig, rows: usize) -> Self {
        let feed = FeedController::new(
            Arc::new(LiveSource::new(backend.clone())),
            Arc::new(StaticSource::building_fallback()),
            &config,
        );
        let mut page = FloorPage::new(feed, &config);
        page.scroll_mut().mount(VirtualViewport::new(0.0, rows as f64));

        Self {
            auth: AuthService::new(backend.clone(), backend.clone(), config.clone()),
            backend,
            config,
            nav: Navigation::new(),
            page,
            composer: None,
            context: None,
            gate: None,
            unlocked: true,
        }
    }

    /// Require the building passcode before anyone can sign in
    pub fn with_passcode_gate(mut self) -> Self {
        self.gate = Some(PasscodeGate::new(self.backend.clone()));
        self.unlocked = false;
        self
    }

    /// Prompt label for the current page
    pub fn location(&self) -> String {
        match self.nav.page() {
            Page::Login => "login".to_string(),
            Page::Home => "home".to_string(),
            Page::Floor(floor) => floor.short_label(),
            Page::Compose(floor) => format!("{} compose", floor.short_label()),
            Page::Account => "account".to_string(),
        }
    }

    /// Wait for the next feed event on the open floor
    pub async fn next_transition(&mut self) -> Transition {
        self.page.next_transition().await
    }

    pub fn on_transition(&mut self, transition: Transition) {
        match transition {
            Transition::Ready => self.render_floor(),
            Transition::FallbackRequested(error) => {
                debug!(%error, "live feed failed");
            }
            Transition::Failed(error) => {
                debug!(%error, "fallback failed");
                self.render_floor();
            }
            Transition::Ignored => {}
        }
    }

    pub async fn handle(&mut self, input: &str) -> Result<Flow> {
        let (command, rest) = match input.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (input, ""),
        };

        match command.to_lowercase().as_str() {
            "/quit" | "/exit" | "/q" => {
                print_info("Goodbye!");
                return Ok(Flow::Quit);
            }
            "/help" | "/?" => print_interactive_help(),
            "/unlock" => self.unlock(rest).await,
            "/login" => self.login(rest).await,
            "/logout" => self.logout().await,
            "/home" | "/floors" => self.navigate(NavAction::OpenHome),
            "/floor" => match parse_floor(rest) {
                Some(floor) => self.navigate(NavAction::OpenFloor(floor)),
                None => print_error("Usage: /floor <number|general>"),
            },
            "/post" => self.post(rest).await,
            "/retry" => self.retry().await,
            "/up" => match parse_lines(rest) {
                Some(lines) => self.scroll_up(lines),
                None => print_error("Usage: /up [lines]"),
            },
            "/jump" | "/down" => {
                self.page.scroll_mut().jump_to_bottom();
                self.print_window();
            }
            "/account" => self.account().await,
            "/password" => self.change_password(rest).await,
            _ if input.starts_with('/') => print_error(&format!("Unknown command: {}", command)),
            _ => self.post(input).await,
        }
        Ok(Flow::Continue)
    }

    async fn unlock(&mut self, input: &str) {
        let Some(gate) = &self.gate else {
            print_info("This building has no passcode");
            return;
        };
        match gate.unlock(input).await {
            Ok(()) => {
                self.unlocked = true;
                print_success("Welcome in! Sign in with /login <email> <password>");
            }
            Err(e) => print_error(&e.user_message()),
        }
    }

    async fn login(&mut self, args: &str) {
        if !self.unlocked {
            print_error("Enter the building passcode first with /unlock <passcode>");
            return;
        }
        let mut parts = args.split_whitespace();
        let (email, password) = (parts.next().unwrap_or(""), parts.next().unwrap_or(""));
        match self.auth.sign_in(email, password).await {
            Ok(principal) => {
                print_success(&format!("Signed in as {}", principal.author_label()));
                // The old guard must restore before the new one is set.
                self.context = None;
                self.context = Some(ResidentContextGuard::new(&principal.id));
                self.navigate(NavAction::SignedIn);
            }
            Err(e) => print_error(&e.user_message()),
        }
    }

    async fn logout(&mut self) {
        match self.auth.sign_out().await {
            Ok(()) => {
                self.context = None;
                self.navigate(NavAction::SignedOut);
                print_success("Signed out");
            }
            Err(e) => print_error(&e.user_message()),
        }
    }

    fn navigate(&mut self, action: NavAction) {
        let page = *self.nav.dispatch(action);
        match page {
            Page::Login => {
                self.page.close();
                self.composer = None;
                print_info("Sign in with /login <email> <password>");
            }
            Page::Home => {
                self.page.close();
                self.composer = None;
                print_floor_directory(self.nav.selected_floor());
            }
            Page::Floor(floor) if self.page.floor() != Some(floor) => {
                self.page.open(floor);
                self.composer = Some(Composer::new(
                    self.backend.clone(),
                    self.backend.clone(),
                    floor,
                    &self.config,
                ));
                self.rescope(floor);
            }
            Page::Floor(_) => self.render_floor(),
            Page::Compose(_) => {}
            Page::Account => {
                self.page.close();
                self.composer = None;
            }
        }
    }

    fn rescope(&mut self, floor: Floor) {
        if let Some(principal) = self.backend.current_principal() {
            let instance = ResidentContextGuard::current_instance_id();
            self.context = None;
            self.context = Some(match instance {
                Some(id) => ResidentContextGuard::with_instance_id(&principal.id, id).with_floor(floor),
                None => ResidentContextGuard::new(&principal.id).with_floor(floor),
            });
        }
    }

    async fn post(&mut self, text: &str) {
        let Some(composer) = &self.composer else {
            print_error("Open a floor first with /floor <n>");
            return;
        };
        composer.set_draft(text);
        self.submit().await;
    }

    /// Resubmit the draft kept from a failed post
    async fn retry(&mut self) {
        let failed = match &self.composer {
            Some(composer) => matches!(composer.status(), ComposerStatus::Failed(_)),
            None => {
                print_error("Open a floor first with /floor <n>");
                return;
            }
        };
        if failed {
            self.submit().await;
        } else {
            print_info("Nothing to retry");
        }
    }

    async fn submit(&mut self) {
        let Some(composer) = &self.composer else {
            return;
        };
        self.nav.dispatch(NavAction::Compose(composer.floor()));
        if composer.over_warn_len() {
            print_warning(&format!("Long message ({})", composer.counter_label()));
        }

        match composer.submit().await {
            Ok(SubmitOutcome::Posted { floor, .. }) => {
                self.nav.dispatch(NavAction::Posted(floor));
            }
            Ok(SubmitOutcome::AlreadySubmitting) => {
                self.nav.dispatch(NavAction::CancelCompose);
                print_warning("Still posting your last message");
            }
            Err(e) => {
                self.nav.dispatch(NavAction::CancelCompose);
                print_error(&e.user_message());
                if matches!(e, ComposeError::Write(_)) {
                    let draft = composer.draft();
                    print_info(&format!("Kept your message: \"{}\" (/retry to send it)", draft));
                }
            }
        }
    }

    fn scroll_up(&mut self, lines: f64) {
        let scroll = self.page.scroll_mut();
        if let Some(viewport) = scroll.viewport_mut() {
            viewport.scroll_by(-lines);
        }
        scroll.on_scroll();
        scroll.on_frame();
        self.print_window();
    }

    async fn account(&mut self) {
        self.navigate(NavAction::OpenAccount);
        let Some(principal) = self.auth.current() else {
            return;
        };
        let username = match self.auth.username_of(&principal.id).await {
            Ok(username) => username,
            Err(e) => {
                print_error(&e.user_message());
                None
            }
        };
        print_account(principal.email.as_deref().unwrap_or("-"), username.as_deref());
    }

    async fn change_password(&mut self, new_password: &str) {
        match self.auth.update_password(new_password).await {
            Ok(()) => print_success("Password updated successfully!"),
            Err(e) => print_error(&e.user_message()),
        }
    }

    /// Lay out the feed, size the viewport to it, and snap to the newest message
    fn render_floor(&mut self) {
        let Some(title) = self.page.title() else {
            return;
        };
        let line_count = match self.page.view() {
            FeedView::Populated(messages) => {
                feed_lines(messages, None, &Local::now()).len() as f64
            }
            _ => 0.0,
        };
        if let Some(viewport) = self.page.scroll_mut().viewport_mut() {
            viewport.set_content_height(line_count);
        }
        self.page.rendered();
        self.page.scroll_mut().on_frame();

        let degraded = self.page.freshness() == Some(Freshness::Fallback);
        print_floor_header(&title, &self.page.count_label(), degraded);
        self.print_window();
    }

    fn print_window(&self) {
        match self.page.view() {
            FeedView::Loading => print_info("Loading..."),
            FeedView::Empty => print_empty_floor(),
            FeedView::Unavailable(_) => print_error("Unable to load messages. Please try again"),
            FeedView::Populated(messages) => {
                let me = self.backend.current_principal().map(|p| p.id);
                let lines = feed_lines(messages, me.as_ref(), &Local::now());
                let metrics = self.page.scroll().viewport().and_then(|v| v.measure());
                print_feed_lines(visible(&lines, metrics));
                if self.page.scroll().show_jump_to_bottom() {
                    print_jump_affordance();
                }
            }
        }
    }
}

/// Lines for `/up`: 5 when omitted, otherwise a finite number
fn parse_lines(input: &str) -> Option<f64> {
    if input.is_empty() {
        return Some(5.0);
    }
    input.parse::<f64>().ok().filter(|lines| lines.is_finite())
}

/// "general", "g" or a floor number
pub fn parse_floor(input: &str) -> Option<Floor> {
    match input.trim().to_lowercase().as_str() {
        "general" | "g" => Some(Floor::GENERAL),
        other => other.parse::<u32>().ok().map(Floor::new),
    }
}
