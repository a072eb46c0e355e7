use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use thirtyfour::{
    error::WebDriverResult, CapabilitiesHelper, Cookie, DesiredCapabilities, Proxy, WebDriver,
};
use tokio::sync::{Mutex, Semaphore};
use url::Url;

/// The rendered-page seam the search pipeline fetches through.
#[async_trait]
pub trait DocumentFetcher: Send + Sync + 'static {
    async fn fetch_page(&self, url: &Url) -> Option<String>;
}

const COOKIE_DISPLAY_PREFS: &str = "aep_usuc_f";
const COOKIE_DISPLAY_PREFS_VALUE: &str = "site=glo&region=RU&b_locale=en_US&c_tp=RUB";

/// The cookie set the marketplace expects before it serves a stable,
/// english-language result page.
pub fn search_cookies() -> Vec<(String, String)> {
    vec![(
        COOKIE_DISPLAY_PREFS.to_string(),
        COOKIE_DISPLAY_PREFS_VALUE.to_string(),
    )]
}

/// Read-only per-run fetch settings: proxy endpoint, cookie set and timeouts.
pub struct FetchConfig {
    pub proxy_host: String,
    pub proxy_port: u16,
    pub cookies: Vec<(String, String)>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

/// A fixed pool of webdriver sessions, created once at startup and reused for
/// every rendered-page fetch. Session startup is expensive, so the pool lives
/// for the whole process and is quit during teardown.
pub struct BrowserPool {
    drivers: Mutex<VecDeque<WebDriver>>,
    slots: Semaphore,
    cookies: Vec<(String, String)>,
}

impl BrowserPool {
    pub async fn new(
        webdriver_url: &str,
        pool_size: usize,
        config: FetchConfig,
    ) -> WebDriverResult<Self> {
        let proxy_url = format!("http://{}:{}", config.proxy_host, config.proxy_port);

        let mut drivers = VecDeque::with_capacity(pool_size);
        for _ in 0..pool_size {
            let mut caps = DesiredCapabilities::chrome();
            caps.set_proxy(Proxy::Manual {
                ftp_proxy: None,
                http_proxy: Some(proxy_url.clone()),
                ssl_proxy: Some(proxy_url.clone()),
                socks_proxy: None,
                socks_version: None,
                socks_username: None,
                socks_password: None,
                no_proxy: None,
            })?;

            let driver = WebDriver::new(webdriver_url, caps).await?;
            driver
                .set_page_load_timeout(config.connect_timeout + config.read_timeout)
                .await?;
            drivers.push_back(driver);
        }

        Ok(BrowserPool {
            slots: Semaphore::new(pool_size),
            drivers: Mutex::new(drivers),
            cookies: config.cookies,
        })
    }

    /// Renders the page behind `url` and returns its source. Every failure
    /// resolves to `None` so one bad page never aborts a search run.
    pub async fn fetch(&self, url: &Url) -> Option<String> {
        let _permit = match self.slots.acquire().await {
            Ok(permit) => permit,
            // Closed semaphore means the pool was already shut down.
            Err(_) => return None,
        };
        // The permit guarantees a session is available.
        let driver = self.drivers.lock().await.pop_front()?;

        let result = self.render(&driver, url).await;

        let mut drivers = self.drivers.lock().await;
        if self.slots.is_closed() {
            drop(drivers);
            // Shutdown drained the pool while this fetch was in flight; the
            // session is no longer tracked, so it must be quit here.
            if let Err(e) = driver.quit().await {
                log::error!("Failed to quit webdriver session: {:?}", e);
            }
        } else {
            drivers.push_back(driver);
        }

        match result {
            Ok(page_source) => Some(page_source),
            Err(e) => {
                log::warn!("[DOCUMENT ERROR] {} | {:?}", url, e);
                None
            }
        }
    }

    async fn render(&self, driver: &WebDriver, url: &Url) -> WebDriverResult<String> {
        driver.goto(url.as_str()).await?;
        for (name, value) in &self.cookies {
            driver
                .add_cookie(Cookie::new(name.clone(), value.clone()))
                .await?;
        }
        // Cookies only take effect on the next load.
        driver.refresh().await?;

        driver.source().await
    }

    pub async fn shutdown(&self) {
        self.slots.close();

        let mut drivers = self.drivers.lock().await;
        while let Some(driver) = drivers.pop_front() {
            if let Err(e) = driver.quit().await {
                log::error!("Failed to quit webdriver session: {:?}", e);
            }
        }
    }
}

#[async_trait]
impl DocumentFetcher for BrowserPool {
    async fn fetch_page(&self, url: &Url) -> Option<String> {
        self.fetch(url).await
    }
}
