use url::Url;

use crate::domain::query::Query;

const PARAM_SEARCH_TEXT: &str = "?SearchText=";
const PARAM_PAGE: &str = "&page=";
const PARAM_MIN_PRICE: &str = "&minPrice=";
const PARAM_MAX_PRICE: &str = "&maxPrice=";

const PATH_SEARCH_IN_STORE: &str = "/search?origin=y&SearchText=";

/// Builds the marketplace search url for one result page. A malformed url is
/// logged and drops only that page, never the whole run.
pub fn build_search_url(base_path: &str, query: &Query, page: Option<u32>) -> Option<Url> {
    let spec = search_url_spec(base_path, query, page);

    match Url::parse(&spec) {
        Ok(url) => Some(url),
        Err(e) => {
            log::warn!("Url [{}] parse error: {}", spec, e);
            None
        }
    }
}

fn search_url_spec(base_path: &str, query: &Query, page: Option<u32>) -> String {
    let mut spec = format!(
        "{}{}{}",
        base_path,
        PARAM_SEARCH_TEXT,
        urlencoding::encode(&query.search_text)
    );
    if let Some(page) = page {
        spec.push_str(&format!("{}{}", PARAM_PAGE, page));
    }
    if let Some(min_price) = query.min_price {
        spec.push_str(&format!("{}{}", PARAM_MIN_PRICE, min_price));
    }
    if let Some(max_price) = query.max_price {
        spec.push_str(&format!("{}{}", PARAM_MAX_PRICE, max_price));
    }

    spec
}

/// Builds the in-store search url used to confirm a query against one store.
/// Store links scraped from the marketplace are protocol-relative; anything
/// else is used as-is, no scheme inference.
pub fn build_confirmation_url(store_link: &str, query: &Query) -> anyhow::Result<Url> {
    let prepared_link = match store_link.starts_with("//") {
        true => format!("http:{}", store_link),
        false => store_link.to_string(),
    };
    let spec = format!(
        "{}{}{}",
        prepared_link,
        PATH_SEARCH_IN_STORE,
        urlencoding::encode(&query.search_text)
    );

    Url::parse(&spec).map_err(|e| anyhow::anyhow!("Url [{}] parse error: {}", spec, e))
}
