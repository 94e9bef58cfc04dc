use serde::Serialize;
use tracing::{debug, info};

use crate::category::{Category, CategorySpec, Field};
use crate::parser::fields;
use crate::parser::RawListing;

/// A typed listing. Fields the category does not carry stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub adresse: String,
    pub prix: u64,
    pub superficie: Option<f64>,
    pub pieces: Option<u32>,
    pub salles_bain: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingPrice,
    MissingAddress,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropCounts {
    pub missing_price: usize,
    pub missing_address: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.missing_price + self.missing_address
    }

    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::MissingPrice => self.missing_price += 1,
            DropReason::MissingAddress => self.missing_address += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeReport {
    pub category: Category,
    pub records: Vec<NormalizedRecord>,
    pub dropped: DropCounts,
}

/// Anything a record can be derived from: a scraped card or a saved row.
pub trait ListingSource {
    fn address_text(&self) -> &str;
    fn price_text(&self) -> &str;
    fn surface(&self) -> Option<f64>;
    fn rooms(&self) -> Option<u32>;
    fn bathrooms(&self) -> Option<u32>;
}

impl<T: ListingSource> ListingSource for &T {
    fn address_text(&self) -> &str {
        (**self).address_text()
    }
    fn price_text(&self) -> &str {
        (**self).price_text()
    }
    fn surface(&self) -> Option<f64> {
        (**self).surface()
    }
    fn rooms(&self) -> Option<u32> {
        (**self).rooms()
    }
    fn bathrooms(&self) -> Option<u32> {
        (**self).bathrooms()
    }
}

// Attributes line first, the ad title as fallback.
impl ListingSource for RawListing {
    fn address_text(&self) -> &str {
        &self.location_text
    }
    fn price_text(&self) -> &str {
        &self.price_text
    }
    fn surface(&self) -> Option<f64> {
        fields::extract_surface(&self.attributes_text).or_else(|| fields::extract_surface(&self.title))
    }
    fn rooms(&self) -> Option<u32> {
        fields::extract_rooms(&self.attributes_text).or_else(|| fields::extract_rooms(&self.title))
    }
    fn bathrooms(&self) -> Option<u32> {
        fields::extract_bathrooms(&self.attributes_text)
            .or_else(|| fields::extract_bathrooms(&self.title))
    }
}

pub fn normalize_one<S: ListingSource>(
    src: &S,
    spec: &CategorySpec,
) -> Result<NormalizedRecord, DropReason> {
    let prix = fields::parse_price(src.price_text()).ok_or(DropReason::MissingPrice)?;
    let adresse = fields::clean_address(src.address_text()).ok_or(DropReason::MissingAddress)?;

    Ok(NormalizedRecord {
        adresse,
        prix,
        superficie: if spec.has(Field::Superficie) { src.surface() } else { None },
        pieces: if spec.has(Field::Pieces) { src.rooms() } else { None },
        salles_bain: if spec.has(Field::SallesBain) { src.bathrooms() } else { None },
    })
}

/// Normalize rows in order, dropping (and counting) rows without a usable
/// price or address.
pub fn normalize_rows<I>(rows: I, category: Category) -> NormalizeReport
where
    I: IntoIterator,
    I::Item: ListingSource,
{
    let spec = category.spec();
    let mut records = Vec::new();
    let mut dropped = DropCounts::default();

    for (idx, row) in rows.into_iter().enumerate() {
        match normalize_one(&row, spec) {
            Ok(rec) => records.push(rec),
            Err(reason) => {
                debug!(row = idx, ?reason, price = row.price_text(), "Dropping row");
                dropped.record(reason);
            }
        }
    }

    info!(
        category = %category,
        kept = records.len(),
        dropped = dropped.total(),
        "Normalized listings"
    );

    NormalizeReport { category, records, dropped }
}

pub fn normalize(raws: &[RawListing], category: Category) -> NormalizeReport {
    normalize_rows(raws, category)
}
