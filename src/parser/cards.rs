use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::RawListing;

static CARD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.ad__card").unwrap());
static PRICE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.ad__card-price").unwrap());
static DESCRIPTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.ad__card-description").unwrap());
static DESCRIPTION_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.ad__card-description a").unwrap());
static LOCATION_SPAN_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.ad__card-location span").unwrap());
static LOCATION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.ad__card-location").unwrap());
static IMAGE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img.ad__card-img").unwrap());

/// One `RawListing` per listing card, in document order.
pub fn extract_cards(html: &str, base: &Url) -> Vec<RawListing> {
    let doc = Html::parse_document(html);
    doc.select(&CARD_SEL).map(|card| parse_card(card, base)).collect()
}

fn parse_card(card: ElementRef<'_>, base: &Url) -> RawListing {
    let attributes_text = first_text(card, &DESCRIPTION_SEL);

    // The link title carries the full ad title; the visible text may be cut.
    let title = card
        .select(&DESCRIPTION_LINK_SEL)
        .next()
        .and_then(|a| a.value().attr("title"))
        .map(normalize_ws)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| attributes_text.clone());

    let image_url = card.select(&IMAGE_SEL).next().and_then(|img| {
        let v = img.value();
        v.attr("src")
            .filter(|s| !s.trim().is_empty())
            .or_else(|| v.attr("data-src"))
            .and_then(|src| resolve(base, src))
    });

    RawListing {
        title,
        price_text: first_text(card, &PRICE_SEL),
        // the paragraph also holds the pin icon's ligature text
        location_text: card
            .select(&LOCATION_SPAN_SEL)
            .next()
            .or_else(|| card.select(&LOCATION_SEL).next())
            .map(element_text)
            .unwrap_or_default(),
        attributes_text,
        image_url,
    }
}

fn first_text(card: ElementRef<'_>, sel: &Selector) -> String {
    card.select(sel).next().map(element_text).unwrap_or_default()
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_ws(&el.text().collect::<String>())
}

fn resolve(base: &Url, src: &str) -> Option<String> {
    base.join(src.trim()).ok().map(String::from)
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://sn.coinafrique.com").unwrap()
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn villas_page_cards() {
        let cards = extract_cards(&fixture("villas_page1"), &base());
        assert_eq!(cards.len(), 3);

        let first = &cards[0];
        assert_eq!(first.title, "Villa 5 pièces à vendre aux Almadies");
        assert_eq!(first.price_text, "250 000 000 CFA");
        assert_eq!(first.location_text, "Almadies, Dakar, Sénégal");
        assert_eq!(first.attributes_text, "Villa 5 pièces, 3 salles de bain, 400 m²");
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://images.coinafrique.com/4412801_uploaded_image1.jpg")
        );
    }

    #[test]
    fn relative_and_lazy_images_resolve() {
        let cards = extract_cards(&fixture("villas_page1"), &base());
        assert_eq!(
            cards[1].image_url.as_deref(),
            Some("https://sn.coinafrique.com/static/images/4412802.jpg")
        );
        assert_eq!(
            cards[2].image_url.as_deref(),
            Some("https://images.coinafrique.com/4412803.jpg")
        );
    }

    #[test]
    fn title_falls_back_to_description() {
        let cards = extract_cards(&fixture("villas_page2"), &base());
        assert_eq!(cards[1].title, cards[1].attributes_text);
    }

    #[test]
    fn page_without_cards() {
        let cards = extract_cards("<html><body><p>Aucune annonce</p></body></html>", &base());
        assert!(cards.is_empty());
    }
}
