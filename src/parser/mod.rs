pub mod cards;
pub mod fields;

use serde::Serialize;
use url::Url;

/// One listing card as scraped, before any typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawListing {
    pub title: String,
    pub price_text: String,
    pub location_text: String,
    pub attributes_text: String,
    pub image_url: Option<String>,
}

/// Listing page HTML → raw listings, in card order.
pub fn parse_listing_page(html: &str, base: &Url) -> Vec<RawListing> {
    cards::extract_cards(html, base)
}
