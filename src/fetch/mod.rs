//! The three ways of turning a business into email candidates.

pub mod dynamic;
pub mod fallback;
pub mod static_site;

pub use dynamic::{
    fetch_dynamic, BrowserDriver, BrowserPage, BrowserSession, NetworkResponse, WebDriverBrowser,
};
pub use fallback::fallback_resolve;
pub use static_site::{fetch_static, HttpPageSource, PageSource};
