use std::path::Path;

use tracing::info;

use crate::category::Category;
use crate::dataset::{self, Dataset};
use crate::error::Result;
use crate::fetcher::{Fetcher, PageOutcome, PageSource, PageStatus};
use crate::normalize::{self, DropCounts};
use crate::parser::RawListing;

/// Outcome of one scrape-normalize-save run for a category.
#[derive(Debug, Clone)]
pub struct ScrapeStats {
    pub category: Category,
    pub pages: usize,
    pub failed_pages: usize,
    pub empty_pages: usize,
    pub failures: Vec<PageOutcome>,
    pub scraped: usize,
    pub dropped: DropCounts,
    pub dataset: Dataset,
    pub raw: Vec<RawListing>,
}

/// Fetch then normalize. Nothing is written here.
pub fn scrape<S: PageSource>(fetcher: &Fetcher<S>, category: Category, pages: u32) -> Result<ScrapeStats> {
    let report = fetcher.fetch(category, pages)?;
    let normalized = normalize::normalize(&report.listings, category);

    let failures = report
        .pages
        .iter()
        .filter(|p| matches!(p.status, PageStatus::Failed(_)))
        .cloned()
        .collect();

    Ok(ScrapeStats {
        category: report.category,
        pages: report.pages.len(),
        failed_pages: report.failed_pages(),
        empty_pages: report.empty_pages(),
        failures,
        scraped: report.listings.len(),
        dropped: normalized.dropped,
        dataset: Dataset::new(normalized.category, normalized.records),
        raw: report.listings,
    })
}

/// Scrape and replace the dataset at `out` once the whole run succeeded.
/// `raw_out` additionally keeps the unnormalized listings.
pub fn scrape_to_file<S: PageSource>(
    fetcher: &Fetcher<S>,
    category: Category,
    pages: u32,
    out: &Path,
    raw_out: Option<&Path>,
) -> Result<ScrapeStats> {
    let stats = scrape(fetcher, category, pages)?;
    stats.dataset.save(out)?;
    if let Some(raw_path) = raw_out {
        dataset::save_raw(&stats.raw, raw_path)?;
    }
    info!(
        %category,
        rows = stats.dataset.records.len(),
        dropped = stats.dropped.total(),
        path = %out.display(),
        "Scrape complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::fetcher::tests::FixtureSource;

    #[test]
    fn two_pages_with_one_bad_price() {
        let source = FixtureSource::new().page(1, "villas_page1").page(2, "villas_page2");
        let fetcher = Fetcher::new(source, &Settings::default()).unwrap();
        let stats = scrape(&fetcher, Category::Villas, 2).unwrap();

        assert_eq!(stats.scraped, 5);
        assert_eq!(stats.dropped.missing_price, 1);
        let rows = &stats.dataset.records;
        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].adresse, "Almadies, Dakar, Sénégal");
        assert_eq!(rows[0].prix, 250_000_000);
        assert_eq!(rows[0].superficie, Some(400.0));
        assert_eq!(rows[0].pieces, Some(5));
        assert_eq!(rows[0].salles_bain, Some(3));

        assert_eq!(rows[1].adresse, "Ngor, Dakar, Sénégal");
        assert_eq!(rows[1].superficie, Some(300.0));
        assert_eq!(rows[1].pieces, Some(4));
        assert_eq!(rows[1].salles_bain, Some(2));

        assert_eq!(rows[2].prix, 95_000_000);
        assert_eq!(rows[2].superficie, None);

        assert_eq!(rows[3].adresse, "Keur-Massar, Dakar, Sénégal");
        assert_eq!(rows[3].prix, 45_000_000);
        assert_eq!(rows[3].pieces, Some(3));
        assert_eq!(rows[3].salles_bain, Some(1));
        assert_eq!(rows[3].superficie, Some(150.0));
    }

    #[test]
    fn raw_dump_reprocesses_to_the_same_rows() {
        use crate::dashboard::reprocess;
        use crate::dataset::{write_raw, Table};

        let source = FixtureSource::new().page(1, "villas_page1").page(2, "villas_page2");
        let fetcher = Fetcher::new(source, &Settings::default()).unwrap();
        let stats = scrape(&fetcher, Category::Villas, 2).unwrap();

        let mut buf = Vec::new();
        write_raw(&stats.raw, &mut buf).unwrap();
        let table = Table::read_from(buf.as_slice()).unwrap();
        let again = reprocess(&table, Category::Villas);

        assert_eq!(again.records, stats.dataset.records);
        assert_eq!(again.dropped, stats.dropped);
    }

    #[test]
    fn terrains_keep_surface_only() {
        let source = FixtureSource::new().page(1, "terrains_page1");
        let fetcher = Fetcher::new(source, &Settings::default()).unwrap();
        let stats = scrape(&fetcher, Category::Terrains, 1).unwrap();

        let rows = &stats.dataset.records;
        assert_eq!(rows.len(), 2);
        assert_eq!(stats.dropped.missing_address, 1);
        assert_eq!(rows[0].superficie, Some(300.0));
        assert_eq!(rows[1].superficie, Some(20_000.0));
        assert_eq!(rows[1].adresse, "Thies, Sénégal");
        assert!(rows.iter().all(|r| r.pieces.is_none() && r.salles_bain.is_none()));
    }

    #[test]
    fn apartments_keep_rooms_only() {
        let source = FixtureSource::new().page(1, "appartements_page1");
        let fetcher = Fetcher::new(source, &Settings::default()).unwrap();
        let stats = scrape(&fetcher, Category::Appartements, 1).unwrap();

        let rows = &stats.dataset.records;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pieces, Some(4));
        assert_eq!(rows[0].superficie, None);
        assert_eq!(rows[1].pieces, None);
        assert_eq!(rows[1].prix, 32_500_000);
    }
}
