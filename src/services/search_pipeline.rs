use std::{collections::HashSet, sync::Arc};

use tokio::task::JoinHandle;

use crate::{
    domain::{query::Query, store::Store},
    services::{
        browser_pool::{BrowserPool, DocumentFetcher},
        confirmation::ConfirmationChecker,
        store_extractor::extract_stores,
        url_builder::build_search_url,
    },
};

/// Two-stage store search: expand the seed query over its result pages, then
/// keep only the stores that confirm every remaining query.
pub struct SearchPipeline<F: DocumentFetcher = BrowserPool> {
    browsers: Arc<F>,
    checker: Arc<ConfirmationChecker>,
    base_path: String,
}

impl<F: DocumentFetcher> SearchPipeline<F> {
    pub fn new(browsers: Arc<F>, checker: ConfirmationChecker, base_path: String) -> Self {
        SearchPipeline {
            browsers,
            checker: Arc::new(checker),
            base_path,
        }
    }

    /// The first query seeds store discovery, the rest are confirmed per
    /// store and AND-reduced. No queries yields an empty set; a lone seed
    /// query yields the deduplicated seed stores unfiltered.
    pub async fn find_in_stores(&self, queries: &[Query]) -> HashSet<Store> {
        let Some((seed, confirmations)) = queries.split_first() else {
            return HashSet::new();
        };

        let stores = self.stores_by_query(seed).await;

        confirm_stores(&self.checker, stores, confirmations).await
    }

    /// Stage A: one task per result page, merged into a set deduplicated by
    /// store link. A page that fails to build, fetch or parse contributes
    /// nothing; the other pages are unaffected.
    async fn stores_by_query(&self, query: &Query) -> HashSet<Store> {
        let handles: Vec<JoinHandle<HashSet<Store>>> = (1..=query.pages)
            .map(|page| {
                let browsers = self.browsers.clone();
                let query = query.clone();
                let base_path = self.base_path.clone();
                tokio::spawn(async move {
                    let Some(url) = build_search_url(&base_path, &query, Some(page)) else {
                        return HashSet::new();
                    };
                    match browsers.fetch_page(&url).await {
                        Some(page_source) => extract_stores(&page_source),
                        None => HashSet::new(),
                    }
                })
            })
            .collect();

        let mut stores = HashSet::new();
        for handle in handles {
            match handle.await {
                Ok(page_stores) => stores.extend(page_stores),
                Err(e) => log::warn!("Seed page task failed: {:?}", e),
            }
        }

        stores
    }
}

/// Stage B: one task per store and confirmation query, AND-reduced per store
/// once all of its tasks finished. A store with no confirmation queries
/// passes vacuously; a failed task only excludes its own store.
pub async fn confirm_stores(
    checker: &Arc<ConfirmationChecker>,
    stores: HashSet<Store>,
    confirmations: &[Query],
) -> HashSet<Store> {
    let mut pending: Vec<(Store, Vec<JoinHandle<bool>>)> = Vec::with_capacity(stores.len());
    for store in stores {
        let handles = confirmations
            .iter()
            .map(|query| {
                let checker = checker.clone();
                let store = store.clone();
                let query = query.clone();
                tokio::spawn(async move { checker.confirms(&store, &query).await })
            })
            .collect();
        pending.push((store, handles));
    }

    let mut matched = HashSet::new();
    for (store, handles) in pending {
        let mut confirmed = true;
        for handle in handles {
            match handle.await {
                Ok(result) => confirmed &= result,
                Err(e) => {
                    log::warn!("Confirmation task failed [STORE] {}: {:?}", store.link, e);
                    confirmed = false;
                }
            }
        }
        if confirmed {
            matched.insert(store);
        }
    }

    matched
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use url::Url;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    /// Serves canned page sources keyed by the page parameter; pages without
    /// an entry behave like a failed fetch.
    struct PageSourceStub {
        sources: HashMap<u32, String>,
    }

    #[async_trait]
    impl DocumentFetcher for PageSourceStub {
        async fn fetch_page(&self, url: &Url) -> Option<String> {
            let page: Option<u32> = url
                .query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse().ok());

            page.and_then(|page| self.sources.get(&page).cloned())
        }
    }

    fn store_page(link: &str, name: &str) -> String {
        format!(
            r#"<div class="list-item"><a class="store" href="{}">{}</a></div>"#,
            link, name
        )
    }

    fn pipeline_over(sources: HashMap<u32, String>) -> SearchPipeline<PageSourceStub> {
        SearchPipeline::new(
            Arc::new(PageSourceStub { sources }),
            ConfirmationChecker::new(None).unwrap(),
            "http://domain.com".to_string(),
        )
    }

    #[tokio::test]
    async fn failed_seed_page_does_not_drop_other_pages_stores() {
        // Page 2 has no source, so its fetch fails.
        let sources = HashMap::from([
            (1, store_page("//storeone.example.com", "Store One")),
            (3, store_page("//storethree.example.com", "Store Three")),
        ]);
        let mut seed = Query::from_text("query1");
        seed.pages = 3;

        let stores = pipeline_over(sources).find_in_stores(&[seed]).await;

        let expected: HashSet<Store> = [
            Store::new("//storeone.example.com", ""),
            Store::new("//storethree.example.com", ""),
        ]
        .into_iter()
        .collect();
        assert_eq!(stores, expected);
    }

    #[tokio::test]
    async fn overlapping_seed_pages_deduplicate_by_link() {
        let second_page = format!(
            "{}{}",
            store_page("//storeone.example.com", "store one (official)"),
            store_page("//storetwo.example.com", "Store Two"),
        );
        let sources = HashMap::from([
            (1, store_page("//storeone.example.com", "Store One")),
            (2, second_page),
        ]);
        let mut seed = Query::from_text("query1");
        seed.pages = 2;

        let stores = pipeline_over(sources).find_in_stores(&[seed]).await;

        assert_eq!(stores.len(), 2);
        assert!(stores.contains(&Store::new("//storeone.example.com", "")));
        assert!(stores.contains(&Store::new("//storetwo.example.com", "")));
    }

    const LISTING_BODY: &str = r#"<div class="items-list util-clearfix"><div class="item"></div></div>"#;

    async fn store_server(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn checker() -> Arc<ConfirmationChecker> {
        Arc::new(ConfirmationChecker::new(None).unwrap())
    }

    #[tokio::test]
    async fn keeps_only_stores_confirming_the_query() {
        let matching = store_server(LISTING_BODY).await;
        let empty = store_server("no listings here").await;

        let store_a = Store::new(&matching.uri(), "store a");
        let store_b = Store::new(&empty.uri(), "store b");
        let stores: HashSet<Store> = [store_a.clone(), store_b].into_iter().collect();

        let matched = confirm_stores(&checker(), stores, &[Query::from_text("query2")]).await;

        assert_eq!(matched, [store_a].into_iter().collect());
    }

    #[tokio::test]
    async fn store_must_confirm_every_query() {
        // Listings for query2 only; query3 comes back empty.
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("SearchText", "query2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING_BODY))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("SearchText", "query3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("nothing"))
            .mount(&server)
            .await;

        let store = Store::new(&server.uri(), "store");
        let stores: HashSet<Store> = [store.clone()].into_iter().collect();
        let checker = checker();

        let matched = confirm_stores(
            &checker,
            stores.clone(),
            &[Query::from_text("query2"), Query::from_text("query3")],
        )
        .await;
        assert!(matched.is_empty());

        let matched = confirm_stores(&checker, stores, &[Query::from_text("query2")]).await;
        assert_eq!(matched, [store].into_iter().collect());
    }

    #[tokio::test]
    async fn every_store_passes_without_confirmation_queries() {
        let stores: HashSet<Store> = [
            Store::new("//storeone.example.com", "one"),
            Store::new("//storetwo.example.com", "two"),
        ]
        .into_iter()
        .collect();

        let matched = confirm_stores(&checker(), stores.clone(), &[]).await;

        assert_eq!(matched, stores);
    }

    #[tokio::test]
    async fn unreachable_store_does_not_affect_the_others() {
        let matching = store_server(LISTING_BODY).await;

        let store_a = Store::new(&matching.uri(), "store a");
        let store_b = Store::new("http://127.0.0.1:1", "unreachable store");
        let stores: HashSet<Store> = [store_a.clone(), store_b].into_iter().collect();

        let matched = confirm_stores(&checker(), stores, &[Query::from_text("query2")]).await;

        assert_eq!(matched, [store_a].into_iter().collect());
    }
}
