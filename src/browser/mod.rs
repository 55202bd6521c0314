pub mod page;
pub mod session;

#[cfg(test)]
pub mod fake;

pub use page::{PageError, PageSurface, WebPage, selectors};
pub use session::{BrowserConfig, BrowserKind, new_session};
