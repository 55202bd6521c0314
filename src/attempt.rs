//! The per-(player, code) redemption state machine: six steps in strict
//! linear order, short-circuiting to a single failure terminal state.

use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::browser::page::{PageError, PageSurface, selectors};
use crate::report;
use crate::roster::{GiftCode, PlayerRecord};

/// The fixed UI step sequence. Ordering is load-bearing: the two explicit
/// post-submit waits (overlay clear, confirm clickable) guard against the
/// portal's asynchronous lookups, and reordering reintroduces races.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemStep {
    NavigateToForm,
    EnterPlayerId,
    EnterCode,
    SubmitLogin,
    AwaitOverlayClear,
    ConfirmExchange,
}

impl RedeemStep {
    pub const SEQUENCE: [Self; 6] = [
        Self::NavigateToForm,
        Self::EnterPlayerId,
        Self::EnterCode,
        Self::SubmitLogin,
        Self::AwaitOverlayClear,
        Self::ConfirmExchange,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NavigateToForm => "navigate-to-form",
            Self::EnterPlayerId => "enter-player-id",
            Self::EnterCode => "enter-code",
            Self::SubmitLogin => "submit-login",
            Self::AwaitOverlayClear => "await-overlay-clear",
            Self::ConfirmExchange => "confirm-exchange",
        }
    }

    #[must_use]
    pub const fn failure_reason(self) -> &'static str {
        match self {
            Self::NavigateToForm => "redemption page did not load",
            Self::EnterPlayerId => "player id field not found",
            Self::EnterCode => "code field not found",
            Self::SubmitLogin => "login control not clickable",
            Self::AwaitOverlayClear => "loading overlay did not clear in time",
            Self::ConfirmExchange => "confirm control not actionable",
        }
    }
}

/// Result of one attempt. There is no partial-success state: any
/// interruption before the confirm click completes is recorded as total
/// failure, even if the portal accepted the code server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failure {
        reason: String,
        screenshot: Option<PathBuf>,
    },
}

impl AttemptOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone)]
pub struct AttemptConfig {
    pub form_url: String,
    pub screenshot_dir: PathBuf,
    /// Pause before the confirm click; the portal animates the dialog in.
    pub settle_delay: Duration,
}

pub struct RedemptionAttempt<'a, P: PageSurface + ?Sized> {
    page: &'a P,
    cfg: &'a AttemptConfig,
    player: &'a PlayerRecord,
    code: &'a GiftCode,
}

impl<'a, P: PageSurface + ?Sized> RedemptionAttempt<'a, P> {
    pub const fn new(
        page: &'a P,
        cfg: &'a AttemptConfig,
        player: &'a PlayerRecord,
        code: &'a GiftCode,
    ) -> Self {
        Self {
            page,
            cfg,
            player,
            code,
        }
    }

    pub async fn run(&self) -> AttemptOutcome {
        for step in RedeemStep::SEQUENCE {
            if let Err(err) = self.execute(step).await {
                return self.fail(step, &err).await;
            }
            log::debug!(
                "step {} done for player {} ({})",
                step.label(),
                self.player.id,
                self.player.display_name
            );
        }
        AttemptOutcome::Success
    }

    async fn execute(&self, step: RedeemStep) -> Result<(), PageError> {
        match step {
            RedeemStep::NavigateToForm => self.page.goto(&self.cfg.form_url).await,
            RedeemStep::EnterPlayerId => {
                self.page.wait_for(selectors::PLAYER_ID_INPUT).await?;
                self.page
                    .clear_and_type(selectors::PLAYER_ID_INPUT, &self.player.id)
                    .await
            }
            // The player-id wait already confirmed page readiness.
            RedeemStep::EnterCode => {
                self.page
                    .clear_and_type(selectors::CODE_INPUT, self.code.value())
                    .await
            }
            RedeemStep::SubmitLogin => self.page.click_clickable(selectors::LOGIN_BUTTON).await,
            RedeemStep::AwaitOverlayClear => {
                self.page.wait_gone(selectors::LOADING_OVERLAY).await
            }
            RedeemStep::ConfirmExchange => {
                tokio::time::sleep(self.cfg.settle_delay).await;
                self.page.click_scripted(selectors::CONFIRM_BUTTON).await
            }
        }
    }

    async fn fail(&self, step: RedeemStep, err: &PageError) -> AttemptOutcome {
        warn!(
            "step {} failed for player {} ({}): {err}",
            step.label(),
            self.player.id,
            self.player.display_name
        );

        let path = report::screenshot_path(&self.cfg.screenshot_dir, &self.player.id, self.code);
        let screenshot = match self.page.save_screenshot(&path).await {
            Ok(()) => Some(path),
            Err(shot_err) => {
                warn!("screenshot capture failed at {}: {shot_err}", path.display());
                None
            }
        };

        AttemptOutcome::Failure {
            reason: format!("{}: {err}", step.failure_reason()),
            screenshot,
        }
    }
}
