pub mod cleaner;
pub mod error;
pub mod http_client;
pub mod query;
pub mod sites;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::models::{Gym, SectionOutcome, SectionReport};

use self::query::{DocumentQuery, Page};
use self::sites::GymSite;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable page source: live HTTP in the binary, fixtures in tests.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Run every section of `site` against one parsed page.
///
/// Never fails as a whole: each section is located and extracted on its own,
/// and its outcome is recorded whether it produced packages or not.
pub fn aggregate(site: &dyn GymSite, page: &dyn DocumentQuery, link: Option<&str>) -> Gym {
    let mut packages = Vec::new();
    let mut sections = Vec::new();

    for extractor in site.sections() {
        let section = extractor.section();
        let extracted = extractor
            .locate(page)
            .and_then(|fragment| extractor.extract(fragment.as_ref()));

        let outcome = match extracted {
            Ok(variants) => {
                let mut kept = 0usize;
                let mut skipped = Vec::new();
                for variant in variants {
                    match variant {
                        Ok(package) => {
                            debug!("{} / {}: {}", site.name(), section, package);
                            packages.push(package);
                            kept += 1;
                        }
                        Err(e) => {
                            warn!("{} / {}: skipping variant: {}", site.name(), section, e);
                            skipped.push(e.to_string());
                        }
                    }
                }
                SectionOutcome::Extracted {
                    packages: kept,
                    skipped,
                }
            }
            Err(e) => {
                warn!("{} / {}: section failed: {}", site.name(), section, e);
                SectionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        sections.push(SectionReport {
            section: section.to_string(),
            outcome,
        });
    }

    info!(
        "{}: {} packages from {} sections",
        site.name(),
        packages.len(),
        sections.len()
    );

    Gym {
        name: site.name().to_string(),
        link: link.map(str::to_string),
        scraped_at: Utc::now().naive_utc(),
        packages,
        sections,
    }
}

/// Parse raw HTML and aggregate it. The parsed tree is dropped before return.
pub fn aggregate_html(site: &dyn GymSite, html: &str, link: Option<&str>) -> Gym {
    let page = Page::parse(html);
    aggregate(site, &page.root(), link)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
