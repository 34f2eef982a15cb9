// src/navigator.rs
use crate::browser::DocumentProvider;
use crate::dedup::{DuplicateGate, GateDecision};
use crate::database::PersistenceSink;
use crate::extract::RecordExtractor;
use crate::models::{CrawlCheckpoint, Result, TaxonomyContext, NO_TEXT_FOUND};
use std::time::Duration;
use tracing::{debug, error, info, warn};

// Site structure. The directory renders category tabs on the root page,
// subsidiary links inside the visible tab panel, a selectize province
// filter on each subsidiary page, and paginated listing cards below it.
const CATEGORY_ITEMS: &str = "#directory > div:first-child > ul > li";
const SUBCATEGORY_BUTTONS: &str = "ul.topic li button";
const SUBSIDIARY_LINKS: &str = "#tab-wrapper div:not([hidden]) li a";
const PROVINCE_DROPDOWN: &str = "div.selectize-input";
const PROVINCE_OPTIONS: &str = "div.selectize-dropdown-content div";
const FILTER_SUBMIT: &str = "button.filter-submit";
const SEARCH_COUNT: &str = "p.search-count";
const LISTING_CARDS: &str = "div.content";
const PAGINATION_LINKS: &str = "ul.pagination li a";
const RATE_LIMIT_INDICATOR: &str = "div.attention";

/// Persian UI markers the site uses for "no results" and the next-page link.
const NO_RESULTS_TEXT: &str = "نتیجه‌ای یافت نشد";
const NEXT_PAGE_LABEL: &str = "بعد";

/// Outcome of one next-page attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageAdvance {
    Advanced,
    NoNextPage,
    /// The site answered with its access-limitation page instead of the next
    /// results; the subsidiary page has been reloaded.
    RateLimited,
}

/// How a (subsidiary, province) scope ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeOutcome {
    Exhausted,
    Aborted,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlStats {
    pub persisted: u64,
    pub skipped: u64,
    pub failed_inserts: u64,
    pub aborted_scopes: u64,
    pub subsidiaries: u64,
}

#[derive(Debug, Clone)]
struct SubsidiaryLink {
    subcategory: String,
    name: String,
    url: String,
}

/// The traversal controller: Category → Subcategory → Subsidiary → Province
/// → ResultPage, strictly sequential over one navigation session. Element
/// lists are re-resolved on every iteration because navigation invalidates
/// them; resume floors skip already-completed prefixes.
pub struct Navigator<D: DocumentProvider, S: PersistenceSink> {
    provider: D,
    sink: S,
    gate: DuplicateGate,
    extractor: RecordExtractor,
    start_url: String,
    checkpoint: CrawlCheckpoint,
    wait_timeout: Duration,
    stats: CrawlStats,
}

impl<D: DocumentProvider, S: PersistenceSink> Navigator<D, S> {
    pub fn new(
        provider: D,
        sink: S,
        gate: DuplicateGate,
        start_url: String,
        checkpoint: CrawlCheckpoint,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            sink,
            gate,
            extractor: RecordExtractor::new(),
            start_url,
            checkpoint,
            wait_timeout,
            stats: CrawlStats::default(),
        }
    }

    pub async fn run(&mut self) -> Result<CrawlStats> {
        self.provider.navigate(&self.start_url).await?;

        if self
            .provider
            .wait_for(CATEGORY_ITEMS, self.wait_timeout)
            .await
            .is_none()
        {
            return Err("Cannot load categories from the directory root".into());
        }

        let category_count = self.provider.find_all(CATEGORY_ITEMS).len();
        info!("📂 Category count: {}", category_count);

        // The subsidiary floor only applies to the category being resumed.
        let mut subsidiary_floor = self.checkpoint.subsidiary_floor;

        for c_idx in 0..category_count {
            if c_idx < self.checkpoint.category_floor {
                continue;
            }

            // Re-resolve: the list mutates structurally on navigation.
            if self
                .provider
                .wait_for(CATEGORY_ITEMS, self.wait_timeout)
                .await
                .is_none()
            {
                warn!("Category list no longer present, stopping");
                break;
            }
            let categories = self.provider.find_all(CATEGORY_ITEMS);
            let Some(&category) = categories.get(c_idx) else {
                warn!("Category {} disappeared, stopping", c_idx);
                break;
            };

            let category_name = self
                .provider
                .text(category)
                .unwrap_or_else(|| NO_TEXT_FOUND.to_string());
            info!("======== CATEGORY: {} ({}) ========", category_name, c_idx + 1);

            self.provider.click(category).await?;

            let links = self.collect_subsidiary_links().await?;
            for (idx, link) in links.iter().enumerate() {
                // Skip counts are 1-based: a floor of N skips the first N links.
                if idx + 1 <= subsidiary_floor {
                    continue;
                }

                info!(
                    "      ➜ Subsidiary: {} ({}) of {}",
                    link.name,
                    idx + 1,
                    link.subcategory
                );

                // Error boundary: a broken subsidiary is logged and skipped;
                // the session and the store stay open for the next one.
                if let Err(e) = self.scrape_subsidiary(&category_name, link).await {
                    error!("❌ Subsidiary '{}' failed: {}", link.name, e);
                }
            }
            subsidiary_floor = 0;

            self.provider.navigate(&self.start_url).await?;
        }

        info!(
            "✅ Crawl finished: {} subsidiaries, {} persisted, {} skipped, {} insert failures, {} aborted scopes, {} known numbers",
            self.stats.subsidiaries,
            self.stats.persisted,
            self.stats.skipped,
            self.stats.failed_inserts,
            self.stats.aborted_scopes,
            self.gate.seen_count()
        );
        Ok(self.stats)
    }

    /// Enumerate subcategories under the current category and flatten their
    /// subsidiary links into one list. Subcategories with an unreadable or
    /// empty label are skipped.
    async fn collect_subsidiary_links(&mut self) -> Result<Vec<SubsidiaryLink>> {
        let subcategory_count = self.provider.find_all(SUBCATEGORY_BUTTONS).len();
        let mut links = Vec::new();

        for s_idx in 0..subcategory_count {
            let buttons = self.provider.find_all(SUBCATEGORY_BUTTONS);
            let Some(&button) = buttons.get(s_idx) else {
                break;
            };

            let Some(label) = self.provider.text(button) else {
                continue;
            };
            if label.is_empty() || label == NO_TEXT_FOUND {
                continue;
            }

            self.provider.click(button).await?;

            for link in self.provider.find_all(SUBSIDIARY_LINKS) {
                let Some(href) = self.provider.attr(link, "href") else {
                    continue;
                };
                let name = self
                    .provider
                    .text(link)
                    .unwrap_or_else(|| NO_TEXT_FOUND.to_string());
                links.push(SubsidiaryLink {
                    subcategory: label.clone(),
                    name,
                    url: href,
                });
            }
        }

        debug!("Flattened {} subsidiary links", links.len());
        Ok(links)
    }

    /// Walk every province of one subsidiary. The subsidiary page is
    /// reloaded before each province because selecting a filter replaces the
    /// document and with it the dropdown's identity.
    async fn scrape_subsidiary(&mut self, category_name: &str, link: &SubsidiaryLink) -> Result<()> {
        self.stats.subsidiaries += 1;
        self.provider.navigate(&link.url).await?;

        let ctx = TaxonomyContext {
            category_name: category_name.to_string(),
            subcategory_name: link.subcategory.clone(),
            subsidiary_name: link.name.clone(),
        };

        let Some(dropdown) = self
            .provider
            .wait_for(PROVINCE_DROPDOWN, self.wait_timeout)
            .await
        else {
            warn!("⚠ No province selector on '{}', scanning unfiltered", link.name);
            if self.scan_result_pages(&ctx, &link.url).await? == ScopeOutcome::Aborted {
                self.stats.aborted_scopes += 1;
            }
            return Ok(());
        };

        self.provider.click(dropdown).await?;
        let province_count = self.provider.find_all(PROVINCE_OPTIONS).len();
        info!("📍 Provinces found: {}", province_count);

        for i in 0..province_count {
            self.provider.navigate(&link.url).await?;

            let Some(dropdown) = self
                .provider
                .wait_for(PROVINCE_DROPDOWN, self.wait_timeout)
                .await
            else {
                break;
            };
            self.provider.click(dropdown).await?;

            let options = self.provider.find_all(PROVINCE_OPTIONS);
            let Some(&option) = options.get(i) else {
                break;
            };
            let province_name = self.provider.text(option).unwrap_or_default();
            info!("➡ Selecting province: {}", province_name);
            self.provider.click(option).await?;

            match self.provider.find(FILTER_SUBMIT) {
                Some(button) => self.provider.click(button).await?,
                None => warn!("⚠ Filter button not found, skipping filter submit"),
            }

            if self.no_results_for_scope() {
                info!("ℹ️ No results for province: {}, skipping", province_name);
                continue;
            }

            if self.scan_result_pages(&ctx, &link.url).await? == ScopeOutcome::Aborted {
                self.stats.aborted_scopes += 1;
            }
        }

        Ok(())
    }

    fn no_results_for_scope(&mut self) -> bool {
        self.provider
            .find(SEARCH_COUNT)
            .and_then(|el| self.provider.text(el))
            .map_or(false, |t| t.contains(NO_RESULTS_TEXT))
    }

    /// Consume every result page of the current scope, extracting and
    /// persisting card by card until the pages run out, the site rate-limits
    /// the pagination, or the duplicate gate abandons the scope.
    async fn scan_result_pages(
        &mut self,
        ctx: &TaxonomyContext,
        subsidiary_url: &str,
    ) -> Result<ScopeOutcome> {
        loop {
            self.gate.start_page();

            let cards = self.provider.find_all(LISTING_CARDS);
            info!("📦 Cards found: {}", cards.len());

            for card in cards {
                let record = self.extractor.extract(&mut self.provider, card, ctx);
                match self.gate.evaluate(&record.phone_key) {
                    GateDecision::Persist => {
                        if let Err(e) = self.sink.insert(&record).await {
                            // Row already rolled back; the record is lost,
                            // the crawl is not.
                            error!("❌ Failed to save '{}': {}", record.name, e);
                            self.stats.failed_inserts += 1;
                        } else {
                            self.stats.persisted += 1;
                        }
                    }
                    GateDecision::Skip => {
                        self.stats.skipped += 1;
                    }
                    GateDecision::AbortScope => {
                        return Ok(ScopeOutcome::Aborted);
                    }
                }
            }

            match self.advance_page(subsidiary_url).await? {
                PageAdvance::Advanced => continue,
                PageAdvance::NoNextPage | PageAdvance::RateLimited => {
                    return Ok(ScopeOutcome::Exhausted)
                }
            }
        }
    }

    /// Try to move to the next result page. Finding the access-limitation
    /// indicator after the click counts as a failure to advance: the
    /// subsidiary page is reloaded and the scope treated as exhausted.
    async fn advance_page(&mut self, subsidiary_url: &str) -> Result<PageAdvance> {
        let links = self.provider.find_all(PAGINATION_LINKS);
        let next = links.into_iter().find(|&el| {
            self.provider
                .text(el)
                .map_or(false, |t| t.contains(NEXT_PAGE_LABEL))
        });
        let Some(next) = next else {
            debug!("ℹ️ No next page button");
            return Ok(PageAdvance::NoNextPage);
        };

        self.provider.click(next).await?;

        if self.provider.find_all(RATE_LIMIT_INDICATOR).len() > 1 {
            warn!("🚫 Access limitation page, reloading subsidiary");
            self.provider.navigate(subsidiary_url).await?;
            return Ok(PageAdvance::RateLimited);
        }

        debug!("➡ Moved to next page");
        Ok(PageAdvance::Advanced)
    }
}
