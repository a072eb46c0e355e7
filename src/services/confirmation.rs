use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::{
    configuration::ProxySettings,
    domain::{query::Query, store::Store},
    services::url_builder::build_confirmation_url,
};

const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(15);

const MARKER_NON_EMPTY_LISTING: &str = "items-list util-clearfix";

/// A non-empty in-store result page carries the listing container classes.
pub fn store_has_item(response_body: &str) -> bool {
    response_body.contains(MARKER_NON_EMPTY_LISTING)
}

/// Issues the in-store confirmation searches. One client instance is shared
/// across every store and query of a run.
pub struct ConfirmationChecker {
    client: Client,
}

impl ConfirmationChecker {
    pub fn new(proxy: Option<&ProxySettings>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(proxy) = proxy {
            let proxy_url = format!("http://{}:{}", proxy.host, proxy.port);
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }
        let client = builder.build()?;

        Ok(ConfirmationChecker { client })
    }

    /// Whether `store` has at least one listing for `query`. Never fails:
    /// a bad url, a non-200 status or a request error all resolve to `false`
    /// and exclude only this store/query pair. Single attempt, no retries.
    pub async fn confirms(&self, store: &Store, query: &Query) -> bool {
        let url = match build_confirmation_url(&store.link, query) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("[INVALID URL] {} [STORE] {:?} [QUERY] {:?}", e, store, query);
                return false;
            }
        };

        match self
            .client
            .get(url)
            .timeout(CONFIRMATION_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                match status {
                    StatusCode::OK => match response.text().await {
                        Ok(body) => store_has_item(&body),
                        Err(e) => {
                            log::warn!("[EXCEPTION] {} [QUERY] {:?}", e, query);
                            log::debug!("[EXCEPTION] {:?} [QUERY] {:?}", e, query);
                            false
                        }
                    },
                    _ => {
                        log::warn!(
                            "Not 200 status code {} [STORE] {:?} [QUERY] {:?}",
                            status,
                            store,
                            query
                        );
                        false
                    }
                }
            }
            Err(e) => {
                log::warn!("[EXCEPTION] {} [QUERY] {:?}", e, query);
                log::debug!("[EXCEPTION] {:?} [QUERY] {:?}", e, query);
                false
            }
        }
    }
}
