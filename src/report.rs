use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::orchestrator::RunSummary;
use crate::roster::{GiftCode, PlayerRecord};

/// Deterministic failure-screenshot path for one (player, code) pair.
pub fn screenshot_path(dir: &Path, player_id: &str, code: &GiftCode) -> PathBuf {
    dir.join(format!(
        "debug_{}_{}.png",
        sanitize(player_id),
        code.file_token()
    ))
}

pub fn manifest_path(dir: &Path, code: &GiftCode) -> PathBuf {
    dir.join(format!("failed_{}.txt", code.file_token()))
}

/// Write the per-code failure manifest: one `id<TAB>display name` line per
/// player that exhausted retries. Intended for operator-driven re-runs.
pub fn write_failure_manifest(
    dir: &Path,
    code: &GiftCode,
    failed: &[PlayerRecord],
) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = manifest_path(dir, code);

    let mut body = String::new();
    for player in failed {
        body.push_str(&player.id);
        body.push('\t');
        body.push_str(&player.display_name);
        body.push('\n');
    }
    std::fs::write(&path, body)?;
    Ok(path)
}

pub fn write_console_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Redemption Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=====================".cyan())?;

    for report in &summary.per_code {
        writeln!(
            out,
            "Code {}: {} succeeded, {} failed",
            report.code.value().bold(),
            report.succeeded.len().to_string().green(),
            report.failed.len().to_string().red()
        )?;
        if !report.failed.is_empty() {
            writeln!(out, "   Failed:")?;
            for player in &report.failed {
                writeln!(
                    out,
                    "     • {} ({})",
                    player.id.red(),
                    player.display_name
                )?;
            }
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "Processed {} jobs ({} succeeded) in {:?}",
        summary.total_processed, summary.total_succeeded, summary.elapsed
    )?;
    Ok(())
}

pub fn write_json_summary<W: Write>(out: &mut W, summary: &RunSummary) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, summary)?;
    writeln!(out)?;
    Ok(())
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
