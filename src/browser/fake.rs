//! Scripted stand-in for the live page surface, used by unit tests across
//! the attempt, retry, and orchestrator modules.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::page::{PageError, PageSurface};

#[derive(Default)]
pub struct FakeSurface {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, usize>>,
    poisoned_pairs: Mutex<Vec<(String, String)>>,
    last_typed: Mutex<Option<String>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` invocations of `op` fail.
    pub fn fail_times(&self, op: &'static str, times: usize) {
        self.failures.lock().unwrap().insert(op, times);
    }

    /// Make every attempt for this (player id, code) pair fail at the
    /// code-entry step. Relies on the fixed type order: player id first,
    /// then the code.
    pub fn poison_pair(&self, player_id: &str, code: &str) {
        self.poisoned_pairs
            .lock()
            .unwrap()
            .push((player_id.to_string(), code.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn touch(&self, op: &'static str, detail: &str) -> Result<(), PageError> {
        self.calls.lock().unwrap().push(format!("{op}:{detail}"));

        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(op)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(PageError::Wait(format!("scripted failure of {op}")));
        }
        Ok(())
    }
}

#[async_trait]
impl PageSurface for FakeSurface {
    async fn goto(&self, url: &str) -> Result<(), PageError> {
        self.touch("goto", url)
    }

    async fn wait_for(&self, selector: &str) -> Result<(), PageError> {
        self.touch("wait_for", selector)
    }

    async fn clear_and_type(&self, selector: &str, text: &str) -> Result<(), PageError> {
        let previous = self.last_typed.lock().unwrap().replace(text.to_string());
        self.touch("clear_and_type", text)?;

        let pairs = self.poisoned_pairs.lock().unwrap();
        let poisoned = pairs
            .iter()
            .any(|(pid, code)| code == text && previous.as_deref() == Some(pid));
        if poisoned {
            return Err(PageError::Wait(format!(
                "scripted rejection of {text} at {selector}"
            )));
        }
        Ok(())
    }

    async fn click_clickable(&self, selector: &str) -> Result<(), PageError> {
        self.touch("click_clickable", selector)
    }

    async fn click_scripted(&self, selector: &str) -> Result<(), PageError> {
        self.touch("click_scripted", selector)
    }

    async fn wait_gone(&self, selector: &str) -> Result<(), PageError> {
        self.touch("wait_gone", selector)
    }

    async fn save_screenshot(&self, path: &Path) -> Result<(), PageError> {
        self.touch("save_screenshot", &path.display().to_string())
    }
}
