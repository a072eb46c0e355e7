use std::collections::HashSet;

use scraper::{Html, Selector};

use crate::domain::store::Store;

const SELECTOR_LIST_ITEM_STORE: &str = ".list-item .store";

/// Pulls every store link out of a rendered search result page. A page with
/// no matching elements is an empty set, not an error.
pub fn extract_stores(page_source: &str) -> HashSet<Store> {
    let store_selector = Selector::parse(SELECTOR_LIST_ITEM_STORE).unwrap();
    let document = Html::parse_document(page_source);

    document
        .select(&store_selector)
        .map(|store_node| {
            let link = store_node.value().attr("href").unwrap_or("");
            let name: String = store_node.text().collect();
            Store::new(link, &name)
        })
        .collect()
}
