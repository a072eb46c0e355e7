use std::{net::TcpListener, sync::Arc, time::Duration};

use env_logger::Env;
use storescout::{
    configuration::get_configuration,
    services::{search_cookies, BrowserPool, ConfirmationChecker, FetchConfig, SearchPipeline},
    startup::run,
};

const FETCH_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const FETCH_READ_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;

    let fetch_config = FetchConfig {
        proxy_host: configuration.proxy.host.clone(),
        proxy_port: configuration.proxy.port,
        cookies: search_cookies(),
        connect_timeout: FETCH_CONNECT_TIMEOUT,
        read_timeout: FETCH_READ_TIMEOUT,
    };
    let browsers = BrowserPool::new(
        &configuration.webdriver.url,
        configuration.webdriver.pool_size,
        fetch_config,
    )
    .await
    .expect("Failed to start the browser pool.");
    let browsers = Arc::new(browsers);

    let checker = ConfirmationChecker::new(Some(&configuration.proxy))
        .expect("Failed to build the confirmation http client.");
    let pipeline = SearchPipeline::new(
        browsers.clone(),
        checker,
        configuration.search.base_path.clone(),
    );

    // The pool must be quit even when the server exits with an error.
    let server = match run(listener, pipeline) {
        Ok(server) => server,
        Err(e) => {
            browsers.shutdown().await;
            return Err(e);
        }
    };
    let server_result = server.await;

    browsers.shutdown().await;

    server_result
}
