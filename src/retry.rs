use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::attempt::{AttemptConfig, AttemptOutcome, RedemptionAttempt};
use crate::browser::page::PageSurface;
use crate::roster::{GiftCode, PlayerRecord};

/// Bounded retry around the redemption attempt. Each retry is a fresh
/// attempt that re-navigates to the form, so no page state leaks between
/// tries. After exhaustion the job carries the last failure outcome;
/// earlier reasons survive only in the run log.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub player: PlayerRecord,
    pub code: GiftCode,
    pub attempts_made: u32,
    pub final_outcome: AttemptOutcome,
}

impl RetryPolicy {
    pub async fn run<P: PageSurface + ?Sized>(
        &self,
        page: &P,
        cfg: &AttemptConfig,
        player: &PlayerRecord,
        code: &GiftCode,
    ) -> JobResult {
        let ceiling = self.max_attempts.max(1);

        for attempt_no in 1..=ceiling {
            let outcome = RedemptionAttempt::new(page, cfg, player, code).run().await;

            if outcome.is_success() || attempt_no == ceiling {
                return JobResult {
                    player: player.clone(),
                    code: code.clone(),
                    attempts_made: attempt_no,
                    final_outcome: outcome,
                };
            }

            if let AttemptOutcome::Failure { reason, .. } = &outcome {
                warn!(
                    "attempt {attempt_no}/{ceiling} failed for player {} ({}) on code {code}: {reason}",
                    player.id, player.display_name
                );
            }
            tokio::time::sleep(self.retry_delay).await;
        }

        unreachable!("retry loop always returns within the attempt ceiling")
    }
}
