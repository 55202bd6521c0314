use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::error::RunError;

/// One row of the player roster. Identity is the opaque site-assigned `id`;
/// the display name only appears in logs and failure manifests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub display_name: String,
}

/// An opaque redemption token. Order of codes matters only for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiftCode(String);

impl GiftCode {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Filename-safe form of the code, used for screenshots and manifests.
    #[must_use]
    pub fn file_token(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for GiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse roster text: one player per line, id followed by display name,
/// split on the first whitespace run. Malformed lines are skipped with a
/// warning rather than failing the run.
pub fn parse_players(text: &str) -> Vec<PlayerRecord> {
    let mut players = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(char::is_whitespace) {
            Some((id, name)) if !name.trim().is_empty() => {
                players.push(PlayerRecord {
                    id: id.to_string(),
                    display_name: name.trim().to_string(),
                });
            }
            _ => {
                warn!("skipping malformed player line {}: {line:?}", index + 1);
            }
        }
    }

    players
}

pub fn load_players(path: &Path) -> Result<Vec<PlayerRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read player list {}", path.display()))?;
    Ok(parse_players(&text))
}

/// Resolve the gift codes for this run. A codes file takes precedence over
/// the single-code flag; with neither, the operator is prompted on stdin.
pub fn load_codes(file: Option<&Path>, flag: Option<&str>) -> Result<Vec<GiftCode>, RunError> {
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)?;
        let codes: Vec<GiftCode> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(GiftCode::new)
            .collect();
        if codes.is_empty() {
            return Err(RunError::Configuration(format!(
                "codes file {} contains no codes",
                path.display()
            )));
        }
        return Ok(codes);
    }

    if let Some(code) = flag {
        let code = code.trim();
        if !code.is_empty() {
            return Ok(vec![GiftCode::new(code)]);
        }
    }

    prompt_for_code()
}

fn prompt_for_code() -> Result<Vec<GiftCode>, RunError> {
    print!("Enter the gift code to redeem: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    let code = line.trim();
    if code.is_empty() {
        return Err(RunError::Configuration("no gift code provided".into()));
    }
    Ok(vec![GiftCode::new(code)])
}
