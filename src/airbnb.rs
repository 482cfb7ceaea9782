use crate::models::{ItemHandle, ListingRecord, PriceSighting};
use crate::parser;
use crate::source::{ExtractionError, ExtractionErrorKind, FetchError, ItemExtractor, PageFetcher};
use crate::{debug_eprintln, debug_println};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const BASE_URL: &str = "https://www.airbnb.com/s/";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Base search URL for a market, e.g. `search_url("boca-raton", "Entire home/apt")`.
pub fn search_url(location: &str, room_type: &str) -> String {
    format!(
        "{}{}?room_types%5B%5D={}",
        BASE_URL,
        urlencoding::encode(location),
        urlencoding::encode(room_type)
    )
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("Failed to parse selector {}: {:?}", css, e))
}

/// Blocking HTTP client for search result pages.
pub struct SearchClient {
    client: Client,
    item_selector: Selector,
    pagination_selector: Selector,
}

impl SearchClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            item_selector: selector(r#"div[itemprop="itemListElement"]"#)?,
            pagination_selector: selector("li.buttonContainer_1am0dt")?,
        })
    }

    fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            debug_eprintln!("HTTP error {}: {}", status, url);
            return Err(FetchError::Status(status.as_u16()));
        }
        response.text().map_err(classify)
    }

    pub fn items_in_document(&self, body: &str) -> Vec<ItemHandle> {
        let document = Html::parse_document(body);
        document
            .select(&self.item_selector)
            .map(|element| ItemHandle::new(element.html()))
            .collect()
    }

    /// The last pagination button carries the highest page number.
    pub fn page_count_in_document(&self, body: &str) -> Option<u32> {
        let document = Html::parse_document(body);
        let last = document
            .select(&self.pagination_selector)
            .flat_map(|element| element.text())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .last()?;
        last.parse().ok()
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(error.to_string())
    }
}

impl PageFetcher for SearchClient {
    fn name(&self) -> &str {
        "airbnb.com"
    }

    fn fetch_page(&self, url: &str) -> Result<Vec<ItemHandle>, FetchError> {
        let body = self.get(url)?;
        let items = self.items_in_document(&body);
        debug_println!("Found {} items on {}", items.len(), url);
        Ok(items)
    }

    fn probe_page_count(&self, url: &str) -> Result<Option<u32>, FetchError> {
        let body = self.get(url)?;
        Ok(self.page_count_in_document(&body))
    }
}

/// Reads listing fields out of one search-result card.
pub struct ListingCardExtractor {
    name: Selector,
    card: Selector,
    info: Selector,
    rating_container: Selector,
    rating_label: Selector,
    review_count: Selector,
}

impl ListingCardExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            name: selector(r#"meta[itemprop="name"]"#)?,
            card: selector("div.listingCardWrapper_9kg52c > div.listingContainer_f21qs6")?,
            info: selector("div.infoContainer_v72lrv")?,
            rating_container: selector("div.ratingContainer_inline_36rlri")?,
            rating_label: selector(r#"span[role="img"]"#)?,
            review_count: selector("span.text_5mbkop-o_O-size_micro_16wifzf-o_O-inline_g86r3e")?,
        })
    }

    /// Card id attribute is `listing-<id>`.
    fn listing_id(&self, card: ElementRef<'_>) -> Result<String, ExtractionErrorKind> {
        let id = card
            .value()
            .attr("id")
            .and_then(|id| id.get(8..))
            .filter(|id| !id.is_empty())
            .ok_or(ExtractionErrorKind::MissingId)?;
        if !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ExtractionErrorKind::Unparseable(format!("listing id {:?}", id)));
        }
        Ok(id.to_string())
    }

    fn card_and_info<'a>(&self, fragment: &'a Html) -> Result<(ElementRef<'a>, ElementRef<'a>), ExtractionErrorKind> {
        let card = fragment.select(&self.card).next().ok_or(ExtractionErrorKind::MissingCard)?;
        let info = card.select(&self.info).next().ok_or(ExtractionErrorKind::MissingCard)?;
        Ok((card, info))
    }

    fn rating_and_reviews(&self, info: ElementRef<'_>, texts: &[&str]) -> (Option<f32>, Option<u32>) {
        if let Some(container) = info.select(&self.rating_container).next() {
            let rating = container
                .select(&self.rating_label)
                .next()
                .and_then(|label| label.value().attr("aria-label"))
                .and_then(parser::extract_rating);
            let reviews = container
                .select(&self.review_count)
                .next()
                .and_then(|span| span.text().collect::<String>().trim().parse().ok());
            if rating.is_some() && reviews.is_some() {
                return (rating, reviews);
            }
        }
        let reviews = texts.iter().find_map(|text| parser::extract_review_count(text));
        (None, reviews)
    }
}

fn info_texts<'a>(info: ElementRef<'a>) -> Vec<&'a str> {
    info.text().map(str::trim).filter(|text| !text.is_empty()).collect()
}

impl ItemExtractor for ListingCardExtractor {
    fn extract(&self, item: &ItemHandle) -> Result<ListingRecord, ExtractionError> {
        let fragment = Html::parse_fragment(item.markup());

        let content = fragment
            .select(&self.name)
            .next()
            .and_then(|meta| meta.value().attr("content"))
            .ok_or(ExtractionErrorKind::MissingName)?;
        let (name, property_type, city) = parser::split_name_type_city(content)?;

        let (card, info) = self.card_and_info(&fragment)?;
        let id = self.listing_id(card)?;
        let texts = info_texts(info);

        // later matches win
        let price = texts.iter().filter_map(|text| parser::extract_price(text)).last();
        let beds = texts.iter().filter_map(|text| parser::extract_beds(text)).last();
        let (rating, review_count) = self.rating_and_reviews(info, &texts);

        let (price, beds) = match (price, beds) {
            (Some(price), Some(beds)) => (price, beds),
            (None, _) => {
                debug_eprintln!("No price for {}: {:?}", id, texts);
                return Err(ExtractionErrorKind::MissingPrice.into());
            }
            (_, None) => {
                debug_eprintln!("No bed count for {}: {:?}", id, texts);
                return Err(ExtractionErrorKind::MissingBeds.into());
            }
        };

        Ok(ListingRecord {
            id,
            name,
            property_type,
            city,
            price,
            beds,
            rating,
            review_count,
        })
    }

    fn extract_price(&self, item: &ItemHandle) -> Result<PriceSighting, ExtractionError> {
        let fragment = Html::parse_fragment(item.markup());
        let (card, info) = self.card_and_info(&fragment)?;
        let id = self.listing_id(card)?;
        let price = info_texts(info)
            .into_iter()
            .find_map(parser::extract_price)
            .ok_or(ExtractionErrorKind::MissingPrice)?;
        Ok(PriceSighting { id, price })
    }
}
