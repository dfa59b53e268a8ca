//! Browser surface port.
//!
//! The task agent consumes a live page through two primitives only:
//! navigation and script injection. Element queries, event dispatch and
//! content extraction are all expressed as injected scripts, so any host
//! that can run JavaScript in the page can implement [`BrowserSurface`].
//!
//! [`InMemoryBrowser`] is the deterministic implementation used by tests
//! and the offline demo.

pub mod errors;
pub mod memory;
pub mod ports;
pub mod script;

pub use errors::BrowserError;
pub use memory::{ElementModel, InMemoryBrowser, PageModel, ScriptCall};
pub use ports::BrowserSurface;
pub use script::{parse_tag, tag_script, ScriptTag};
