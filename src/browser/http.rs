// src/browser/http.rs
use crate::browser::{DocumentProvider, Element};
use crate::config::BrowserConfig;
use crate::models::Result;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// How often `wait_for` re-fetches the current page while polling.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Snapshot of one matched element: enough to read it later and to run
/// scoped subqueries without holding borrows into the parsed document.
struct Snapshot {
    text: String,
    attrs: HashMap<String, String>,
    fragment: String,
}

/// `DocumentProvider` over plain HTTP + server-rendered HTML. Fetches with a
/// reqwest client, answers CSS queries against the parsed page, and treats a
/// click on a link as navigation (a click on anything else has no effect in
/// static mode and is logged, not failed).
pub struct HttpDocumentProvider {
    client: Client,
    current_url: String,
    html: String,
    snapshots: HashMap<u64, Snapshot>,
    next_id: u64,
    verbose: bool,
}

impl HttpDocumentProvider {
    pub fn new(config: &BrowserConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            current_url: String::new(),
            html: String::new(),
            snapshots: HashMap::new(),
            next_id: 0,
            verbose: config.verbose,
        })
    }

    async fn fetch(&mut self, url: &str) -> Result<()> {
        if self.verbose {
            debug!("Fetching: {}", url);
        }
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(format!("HTTP error {} for {}", response.status(), url).into());
        }
        self.html = response.text().await?;
        self.current_url = url.to_string();
        if self.verbose {
            debug!("Fetched {} bytes from {}", self.html.len(), url);
        }
        Ok(())
    }

    fn parse_selector(selector: &str) -> Option<Selector> {
        match Selector::parse(selector) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Invalid selector '{}': {:?}", selector, e);
                None
            }
        }
    }

    fn snapshot(&mut self, element: scraper::ElementRef<'_>) -> Element {
        let text = element.text().collect::<String>().trim().to_string();
        let attrs = element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let id = self.next_id;
        self.next_id += 1;
        self.snapshots.insert(
            id,
            Snapshot {
                text,
                attrs,
                fragment: element.html(),
            },
        );
        Element(id)
    }

    fn query_document(&mut self, selector: &str, limit: usize) -> Vec<Element> {
        let Some(sel) = Self::parse_selector(selector) else {
            return Vec::new();
        };
        let document = Html::parse_document(&self.html);
        let matches: Vec<_> = document.select(&sel).take(limit).collect();
        matches.into_iter().map(|el| self.snapshot(el)).collect()
    }

    fn query_fragment(&mut self, parent: Element, selector: &str, limit: usize) -> Vec<Element> {
        let Some(sel) = Self::parse_selector(selector) else {
            return Vec::new();
        };
        let Some(fragment) = self.snapshots.get(&parent.0).map(|s| s.fragment.clone()) else {
            return Vec::new();
        };
        let document = Html::parse_fragment(&fragment);
        let matches: Vec<_> = document.select(&sel).take(limit).collect();
        matches.into_iter().map(|el| self.snapshot(el)).collect()
    }

    fn resolve_url(&self, href: &str) -> Option<String> {
        if let Ok(absolute) = Url::parse(href) {
            return Some(absolute.to_string());
        }
        let base = Url::parse(&self.current_url).ok()?;
        base.join(href).ok().map(|u| u.to_string())
    }
}

#[async_trait::async_trait]
impl DocumentProvider for HttpDocumentProvider {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        // Handles into the previous document are dropped wholesale.
        self.snapshots.clear();
        self.fetch(url).await
    }

    fn find(&mut self, selector: &str) -> Option<Element> {
        self.query_document(selector, 1).into_iter().next()
    }

    fn find_all(&mut self, selector: &str) -> Vec<Element> {
        self.query_document(selector, usize::MAX)
    }

    fn find_in(&mut self, parent: Element, selector: &str) -> Option<Element> {
        self.query_fragment(parent, selector, 1).into_iter().next()
    }

    fn find_all_in(&mut self, parent: Element, selector: &str) -> Vec<Element> {
        self.query_fragment(parent, selector, usize::MAX)
    }

    fn text(&self, element: Element) -> Option<String> {
        let snapshot = self.snapshots.get(&element.0)?;
        if snapshot.text.is_empty() {
            None
        } else {
            Some(snapshot.text.clone())
        }
    }

    fn attr(&self, element: Element, name: &str) -> Option<String> {
        self.snapshots.get(&element.0)?.attrs.get(name).cloned()
    }

    async fn click(&mut self, element: Element) -> Result<()> {
        // The static substrate has no scrolling or JS handlers; the only
        // interaction it can honor is following a link.
        let href = self.attr(element, "href");
        match href.as_deref().and_then(|h| self.resolve_url(h)) {
            Some(target) => self.navigate(&target).await,
            None => {
                debug!("Click without navigable target; no effect in static mode");
                Ok(())
            }
        }
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Option<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.find(selector) {
                return Some(element);
            }
            if Instant::now() >= deadline {
                debug!("wait_for('{}') timed out, treating as absent", selector);
                return None;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            // A static page only changes if the server renders differently;
            // re-fetch so the poll is not a no-op.
            if !self.current_url.is_empty() {
                let url = self.current_url.clone();
                if let Err(e) = self.fetch(&url).await {
                    warn!("Re-fetch during wait_for failed: {}", e);
                }
            }
        }
    }
}
