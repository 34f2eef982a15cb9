// src/browser/mod.rs
pub mod http;

#[cfg(test)]
pub mod fake;

use crate::models::Result;
use std::time::Duration;

pub use http::HttpDocumentProvider;

/// Opaque handle to an element the provider has located. Handles stay valid
/// until the provider drops them; they are snapshots, not live DOM nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element(pub u64);

/// The navigation/reading substrate the crawler drives. Element absence is
/// always `Option::None`, never an error: a query with no match is a normal
/// outcome that callers turn into a sentinel or a skipped step.
#[async_trait::async_trait]
pub trait DocumentProvider {
    /// Load `url` and make it the current document.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// First match for `selector` in the current document.
    fn find(&mut self, selector: &str) -> Option<Element>;

    /// All matches for `selector` in the current document, in document order.
    fn find_all(&mut self, selector: &str) -> Vec<Element>;

    /// First match for `selector` scoped to `parent`.
    fn find_in(&mut self, parent: Element, selector: &str) -> Option<Element>;

    /// All matches for `selector` scoped to `parent`, in document order.
    fn find_all_in(&mut self, parent: Element, selector: &str) -> Vec<Element>;

    /// Visible text of an element; `None` when the handle is stale or the
    /// element has no readable text.
    fn text(&self, element: Element) -> Option<String>;

    /// An attribute value of an element.
    fn attr(&self, element: Element, name: &str) -> Option<String>;

    /// Interact with an element. Implementations scroll the element into
    /// view and fall back to a forced interaction when the plain one is
    /// blocked; a click with no navigable effect is not an error.
    async fn click(&mut self, element: Element) -> Result<()>;

    /// Bounded wait for `selector` to have a match; yields `None` once the
    /// timeout elapses instead of blocking forever.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Option<Element>;
}
