use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, Instant};
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;

/// XPath locators for the redemption form. These are brittle coupling points
/// to the target page and must be revalidated whenever the portal changes.
pub mod selectors {
    pub const PLAYER_ID_INPUT: &str = r#"//input[@placeholder="Player ID"]"#;
    pub const CODE_INPUT: &str = r#"//input[@placeholder="Enter Gift Code"]"#;
    pub const LOGIN_BUTTON: &str =
        r#"//div[contains(@class, "login_btn") and contains(@class, "btn")]"#;
    pub const LOADING_OVERLAY: &str = r#"//div[contains(@class, "loading-overlay-class")]"#;
    pub const CONFIRM_BUTTON: &str =
        r#"//div[contains(@class, "exchange_btn") and contains(text(), "Confirm")]"#;
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("timed out waiting for {0}")]
    Wait(String),

    #[error(transparent)]
    Driver(#[from] WebDriverError),

    #[error("screenshot write failed: {0}")]
    Artifact(#[from] std::io::Error),
}

/// The browser primitives the redemption state machine drives. All waits are
/// bounded by the session's single configured timeout; every method maps a
/// missed wait into `PageError::Wait` with the selector in the message.
#[async_trait]
pub trait PageSurface: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), PageError>;

    /// Block until an element matching `selector` is present.
    async fn wait_for(&self, selector: &str) -> Result<(), PageError>;

    /// Locate immediately (no wait), clear the field, type `text` into it.
    async fn clear_and_type(&self, selector: &str, text: &str) -> Result<(), PageError>;

    /// Block until clickable, then click through the UI.
    async fn click_clickable(&self, selector: &str) -> Result<(), PageError>;

    /// Block until clickable, then click through script execution. Used where
    /// a plain click is unreliable against overlapping or animated elements.
    async fn click_scripted(&self, selector: &str) -> Result<(), PageError>;

    /// Block until no visible element matches `selector`.
    async fn wait_gone(&self, selector: &str) -> Result<(), PageError>;

    async fn save_screenshot(&self, path: &Path) -> Result<(), PageError>;
}

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Live implementation over one WebDriver tab, reused across all jobs.
pub struct WebPage {
    driver: WebDriver,
    timeout: Duration,
}

impl WebPage {
    #[must_use]
    pub const fn new(driver: WebDriver, timeout: Duration) -> Self {
        Self { driver, timeout }
    }

    async fn first_match(&self, selector: &str) -> Result<Option<WebElement>, WebDriverError> {
        let mut found = self.driver.find_all(By::XPath(selector)).await?;
        if found.is_empty() {
            Ok(None)
        } else {
            Ok(Some(found.remove(0)))
        }
    }

    async fn wait_clickable(&self, selector: &str) -> Result<WebElement, PageError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(elem) = self.first_match(selector).await?
                && elem.is_clickable().await.unwrap_or(false)
            {
                return Ok(elem);
            }
            if Instant::now() >= deadline {
                return Err(PageError::Wait(format!("{selector} to become clickable")));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl PageSurface for WebPage {
    async fn goto(&self, url: &str) -> Result<(), PageError> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str) -> Result<(), PageError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if self.first_match(selector).await?.is_some() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PageError::Wait(format!("{selector} to appear")));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn clear_and_type(&self, selector: &str, text: &str) -> Result<(), PageError> {
        let elem = self.driver.find(By::XPath(selector)).await?;
        elem.clear().await?;
        elem.send_keys(text).await?;
        Ok(())
    }

    async fn click_clickable(&self, selector: &str) -> Result<(), PageError> {
        let elem = self.wait_clickable(selector).await?;
        elem.click().await?;
        Ok(())
    }

    async fn click_scripted(&self, selector: &str) -> Result<(), PageError> {
        let elem = self.wait_clickable(selector).await?;
        self.driver
            .execute("arguments[0].click();", vec![elem.to_json()?])
            .await?;
        Ok(())
    }

    async fn wait_gone(&self, selector: &str) -> Result<(), PageError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let visible = match self.first_match(selector).await? {
                // A stale handle here means the element left the page mid-check.
                Some(elem) => elem.is_displayed().await.unwrap_or(false),
                None => false,
            };
            if !visible {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PageError::Wait(format!("{selector} to disappear")));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn save_screenshot(&self, path: &Path) -> Result<(), PageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let png = self.driver.screenshot_as_png().await?;
        std::fs::write(path, &png)?;
        Ok(())
    }
}
