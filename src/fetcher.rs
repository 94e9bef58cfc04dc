use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use url::Url;

use crate::category::Category;
use crate::config::{PageErrorPolicy, Settings};
use crate::error::{PipelineError, Result};
use crate::parser::{self, RawListing};

/// Transport for listing pages. The HTTP client is the real one; tests plug
/// in canned HTML.
pub trait PageSource {
    fn get(&self, url: &Url) -> std::result::Result<String, String>;
}

pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(HttpSource { client })
    }
}

impl PageSource for HttpSource {
    fn get(&self, url: &Url) -> std::result::Result<String, String> {
        self.client
            .get(url.clone())
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Ok { listings: usize },
    Empty,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub page: u32,
    pub url: String,
    pub status: PageStatus,
}

/// Listings in page-then-card order, plus what happened on every page.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub category: Category,
    pub listings: Vec<RawListing>,
    pub pages: Vec<PageOutcome>,
}

impl FetchReport {
    pub fn failed_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p.status, PageStatus::Failed(_)))
            .count()
    }

    pub fn empty_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.status == PageStatus::Empty).count()
    }
}

/// `{base}/categorie/{slug}?page={n}`
pub fn page_url(base: &Url, category: Category, page: u32) -> Result<Url> {
    let mut url = base.join(&format!("categorie/{}", category.spec().slug))?;
    url.query_pairs_mut().append_pair("page", &page.to_string());
    Ok(url)
}

pub struct Fetcher<S> {
    source: S,
    base: Url,
    max_pages: u32,
    on_page_error: PageErrorPolicy,
    stop_on_empty_page: bool,
}

impl Fetcher<HttpSource> {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Fetcher::new(HttpSource::new(settings)?, settings)
    }
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S, settings: &Settings) -> Result<Self> {
        Ok(Fetcher {
            source,
            base: Url::parse(&settings.base_url)?,
            max_pages: settings.max_pages,
            on_page_error: settings.on_page_error,
            stop_on_empty_page: settings.stop_on_empty_page,
        })
    }

    /// Fetch pages `1..=page_count` one after another.
    ///
    /// A failed page is recorded and skipped, or aborts the whole run,
    /// depending on `on_page_error`. Empty pages do not end the run unless
    /// `stop_on_empty_page` is set.
    pub fn fetch(&self, category: Category, page_count: u32) -> Result<FetchReport> {
        if page_count == 0 || page_count > self.max_pages {
            return Err(PipelineError::InvalidPageCount {
                got: page_count,
                max: self.max_pages,
            });
        }

        let start = Instant::now();
        let pb = ProgressBar::new(page_count as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} pages ({msg})")
        {
            pb.set_style(style.progress_chars("=> "));
        }

        let mut listings = Vec::new();
        let mut pages = Vec::with_capacity(page_count as usize);

        for page in 1..=page_count {
            let url = page_url(&self.base, category, page)?;
            info!(%category, page, url = %url, "Fetching listing page");

            let status = match self.source.get(&url) {
                Ok(html) => {
                    let found = parser::parse_listing_page(&html, &url);
                    let n = found.len();
                    listings.extend(found);
                    if n == 0 {
                        PageStatus::Empty
                    } else {
                        PageStatus::Ok { listings: n }
                    }
                }
                Err(reason) => {
                    if self.on_page_error == PageErrorPolicy::Abort {
                        pb.finish_and_clear();
                        return Err(PipelineError::Fetch {
                            page,
                            url: url.to_string(),
                            reason,
                        });
                    }
                    warn!(%category, page, error = %reason, "Skipping failed page");
                    PageStatus::Failed(reason)
                }
            };

            let stop = status == PageStatus::Empty && self.stop_on_empty_page;
            if status == PageStatus::Empty {
                info!(%category, page, "No listings on page");
            }
            pages.push(PageOutcome {
                page,
                url: url.to_string(),
                status,
            });
            pb.set_message(format!("{} listings", listings.len()));
            pb.inc(1);

            if stop {
                info!(%category, page, "Stopping at first empty page");
                break;
            }
        }

        pb.finish_and_clear();
        let report = FetchReport {
            category,
            listings,
            pages,
        };
        info!(
            %category,
            listings = report.listings.len(),
            failed_pages = report.failed_pages(),
            empty_pages = report.empty_pages(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetch finished"
        );
        Ok(report)
    }
}
