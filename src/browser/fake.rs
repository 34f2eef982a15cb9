// src/browser/fake.rs
//
// Deterministic scripted DocumentProvider for tests. Pages are declared up
// front; each element lists the selectors it answers to, its text, its
// attributes and its children. A click either follows an `href`, jumps to
// the page named by a `goto` attribute, or does nothing.

use crate::browser::{DocumentProvider, Element};
use crate::models::Result;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub matches: Vec<String>,
    pub text: Option<String>,
    pub attrs: HashMap<String, String>,
    pub children: Vec<FakeElement>,
}

impl FakeElement {
    pub fn new(selector: &str) -> Self {
        Self {
            matches: vec![selector.to_string()],
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Clicking this element switches the current page to `page`.
    pub fn with_goto(self, page: &str) -> Self {
        self.with_attr("goto", page)
    }

    pub fn with_child(mut self, child: FakeElement) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub elements: Vec<FakeElement>,
}

impl FakePage {
    pub fn new(elements: Vec<FakeElement>) -> Self {
        Self { elements }
    }
}

pub struct FakeDocumentProvider {
    pages: HashMap<String, FakePage>,
    current: String,
    handles: HashMap<u64, FakeElement>,
    next_id: u64,
    pub visited: Vec<String>,
}

impl FakeDocumentProvider {
    pub fn new(pages: HashMap<String, FakePage>) -> Self {
        Self {
            pages,
            current: String::new(),
            handles: HashMap::new(),
            next_id: 0,
            visited: Vec::new(),
        }
    }

    fn register(&mut self, element: &FakeElement) -> Element {
        let id = self.next_id;
        self.next_id += 1;
        self.handles.insert(id, element.clone());
        Element(id)
    }

    fn collect<'a>(roots: &'a [FakeElement], selector: &str, out: &mut Vec<&'a FakeElement>) {
        for el in roots {
            if el.matches.iter().any(|m| m == selector) {
                out.push(el);
            }
            Self::collect(&el.children, selector, out);
        }
    }

    fn query(&mut self, roots: Vec<FakeElement>, selector: &str) -> Vec<Element> {
        let mut found = Vec::new();
        Self::collect(&roots, selector, &mut found);
        let found: Vec<FakeElement> = found.into_iter().cloned().collect();
        found.iter().map(|el| self.register(el)).collect()
    }

    fn current_elements(&self) -> Vec<FakeElement> {
        self.pages
            .get(&self.current)
            .map(|p| p.elements.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl DocumentProvider for FakeDocumentProvider {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.handles.clear();
        self.current = url.to_string();
        self.visited.push(url.to_string());
        Ok(())
    }

    fn find(&mut self, selector: &str) -> Option<Element> {
        self.find_all(selector).into_iter().next()
    }

    fn find_all(&mut self, selector: &str) -> Vec<Element> {
        let roots = self.current_elements();
        self.query(roots, selector)
    }

    fn find_in(&mut self, parent: Element, selector: &str) -> Option<Element> {
        self.find_all_in(parent, selector).into_iter().next()
    }

    fn find_all_in(&mut self, parent: Element, selector: &str) -> Vec<Element> {
        let Some(roots) = self.handles.get(&parent.0).map(|el| el.children.clone()) else {
            return Vec::new();
        };
        self.query(roots, selector)
    }

    fn text(&self, element: Element) -> Option<String> {
        self.handles.get(&element.0)?.text.clone()
    }

    fn attr(&self, element: Element, name: &str) -> Option<String> {
        self.handles.get(&element.0)?.attrs.get(name).cloned()
    }

    async fn click(&mut self, element: Element) -> Result<()> {
        let Some(el) = self.handles.get(&element.0).cloned() else {
            return Ok(());
        };
        if let Some(href) = el.attrs.get("href") {
            let href = href.clone();
            return self.navigate(&href).await;
        }
        if let Some(page) = el.attrs.get("goto") {
            // In-page interaction (tab/dropdown): swap content without
            // recording a navigation.
            self.current = page.clone();
            self.handles.clear();
        }
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Option<Element> {
        self.find(selector)
    }
}
