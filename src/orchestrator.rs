//! Drives the full job set: every gift code against every player, codes
//! outer so each code runs against the complete roster before the next one
//! starts. Per-job failures never stop the run; only setup-level errors do.

use colored::Colorize;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::attempt::{AttemptConfig, AttemptOutcome};
use crate::browser::page::PageSurface;
use crate::error::RunError;
use crate::report;
use crate::retry::RetryPolicy;
use crate::roster::{GiftCode, PlayerRecord};

/// Per-code tally. A player lands in exactly one of the two lists because
/// each (player, code) pair is processed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeReport {
    pub code: GiftCode,
    pub succeeded: Vec<PlayerRecord>,
    pub failed: Vec<PlayerRecord>,
}

impl CodeReport {
    fn new(code: GiftCode) -> Self {
        Self {
            code,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub per_code: Vec<CodeReport>,
    pub total_processed: usize,
    pub total_succeeded: usize,
    #[serde(with = "report::duration_serde")]
    pub elapsed: Duration,
}

pub struct BatchOrchestrator {
    pub retry: RetryPolicy,
    /// Courtesy delay between jobs, applied regardless of outcome.
    pub pacing: Duration,
    pub manifest_dir: PathBuf,
}

impl BatchOrchestrator {
    pub async fn run<P: PageSurface + ?Sized>(
        &self,
        page: &P,
        cfg: &AttemptConfig,
        players: &[PlayerRecord],
        codes: &[GiftCode],
    ) -> Result<RunSummary, RunError> {
        if players.is_empty() {
            return Err(RunError::Configuration("no players loaded".into()));
        }

        let started = Instant::now();
        let mut per_code = Vec::with_capacity(codes.len());
        let mut total_processed = 0;
        let mut total_succeeded = 0;

        for code in codes {
            println!(
                "{}",
                format!("🎁 Redeeming code {code} for {} players", players.len())
                    .bright_cyan()
                    .bold()
            );

            let mut tally = CodeReport::new(code.clone());

            for player in players {
                let result = self.retry.run(page, cfg, player, code).await;
                total_processed += 1;

                match &result.final_outcome {
                    AttemptOutcome::Success => {
                        total_succeeded += 1;
                        tally.succeeded.push(player.clone());
                        println!(
                            "✅ {} ({}) — redeemed on attempt {}",
                            player.id.green(),
                            player.display_name,
                            result.attempts_made
                        );
                        info!(
                            "code {code} redeemed for player {} ({}) after {} attempt(s)",
                            player.id, player.display_name, result.attempts_made
                        );
                    }
                    AttemptOutcome::Failure { reason, screenshot } => {
                        tally.failed.push(player.clone());
                        println!(
                            "❌ {} ({}) — {} after {} attempts",
                            player.id.red(),
                            player.display_name,
                            reason,
                            result.attempts_made
                        );
                        info!(
                            "code {code} failed for player {} ({}) after {} attempt(s): {reason}{}",
                            player.id,
                            player.display_name,
                            result.attempts_made,
                            screenshot
                                .as_ref()
                                .map(|p| format!(" (screenshot {})", p.display()))
                                .unwrap_or_default()
                        );
                    }
                }

                tokio::time::sleep(self.pacing).await;
            }

            if !tally.failed.is_empty() {
                match report::write_failure_manifest(&self.manifest_dir, code, &tally.failed) {
                    Ok(path) => info!("wrote failure manifest {}", path.display()),
                    Err(err) => error!("failed to write manifest for code {code}: {err}"),
                }
            }

            per_code.push(tally);
        }

        Ok(RunSummary {
            per_code,
            total_processed,
            total_succeeded,
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeSurface;

    fn test_cfg(screenshot_dir: &std::path::Path) -> AttemptConfig {
        AttemptConfig {
            form_url: "http://portal.test/".to_string(),
            screenshot_dir: screenshot_dir.to_path_buf(),
            settle_delay: Duration::ZERO,
        }
    }

    fn orchestrator(manifest_dir: PathBuf) -> BatchOrchestrator {
        BatchOrchestrator {
            retry: RetryPolicy {
                max_attempts: 3,
                retry_delay: Duration::ZERO,
            },
            pacing: Duration::ZERO,
            manifest_dir,
        }
    }

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "redeemer-orch-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn roster() -> Vec<PlayerRecord> {
        vec![
            PlayerRecord {
                id: "A".to_string(),
                display_name: "Alice".to_string(),
            },
            PlayerRecord {
                id: "B".to_string(),
                display_name: "Bob".to_string(),
            },
        ]
    }

    #[test]
    fn empty_roster_fails_fast_without_browser_calls() {
        let page = FakeSurface::new();
        let dir = temp_dir("empty");
        let cfg = test_cfg(&dir);
        let orch = orchestrator(dir.clone());

        let err = tokio_test::block_on(orch.run(&page, &cfg, &[], &[GiftCode::new("X")]))
            .expect_err("empty roster");

        assert!(matches!(err, RunError::Configuration(_)));
        assert_eq!(page.call_count(), 0);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn processes_every_pair_once() {
        let page = FakeSurface::new();
        let dir = temp_dir("pairs");
        let cfg = test_cfg(&dir);
        let orch = orchestrator(dir.clone());
        let codes = vec![GiftCode::new("X1"), GiftCode::new("X2")];

        let summary = tokio_test::block_on(orch.run(&page, &cfg, &roster(), &codes))
            .expect("run completes");

        assert_eq!(summary.total_processed, 4);
        assert_eq!(summary.total_succeeded, 4);
        assert_eq!(summary.per_code.len(), 2);
        for tally in &summary.per_code {
            assert_eq!(tally.succeeded.len(), 2);
            assert!(tally.failed.is_empty());
        }
        // No failures, so no manifests.
        assert!(!report::manifest_path(&dir, &codes[0]).exists());
        assert!(!report::manifest_path(&dir, &codes[1]).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn manifest_written_only_for_failing_code() {
        let page = FakeSurface::new();
        // Player A is rejected for X1 on every attempt, succeeds on X2.
        page.poison_pair("A", "X1");
        let dir = temp_dir("manifest");
        let cfg = test_cfg(&dir);
        let orch = orchestrator(dir.clone());
        let codes = vec![GiftCode::new("X1"), GiftCode::new("X2")];

        let summary = tokio_test::block_on(orch.run(&page, &cfg, &roster(), &codes))
            .expect("run completes");

        assert_eq!(summary.total_processed, 4);
        assert_eq!(summary.total_succeeded, 3);

        let x1 = &summary.per_code[0];
        assert_eq!(x1.failed.len(), 1);
        assert_eq!(x1.failed[0].id, "A");
        assert!(x1.succeeded.iter().all(|p| p.id != "A"));

        let manifest = std::fs::read_to_string(report::manifest_path(&dir, &codes[0]))
            .expect("manifest for X1");
        assert_eq!(manifest, "A\tAlice\n");
        assert!(!report::manifest_path(&dir, &codes[1]).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn success_and_failure_sets_are_disjoint() {
        let page = FakeSurface::new();
        page.poison_pair("B", "X1");
        let dir = temp_dir("disjoint");
        let cfg = test_cfg(&dir);
        let orch = orchestrator(dir.clone());
        let codes = vec![GiftCode::new("X1")];

        let summary = tokio_test::block_on(orch.run(&page, &cfg, &roster(), &codes))
            .expect("run completes");

        let tally = &summary.per_code[0];
        for player in &tally.succeeded {
            assert!(tally.failed.iter().all(|f| f.id != player.id));
        }
        assert_eq!(tally.succeeded.len() + tally.failed.len(), 2);
        let _ = std::fs::remove_dir_all(dir);
    }
}
