use crate::config::Endpoints;
use crate::errors::FetchError;
use crate::http::HttpFetcher;
use crate::models::MarketRow;
use async_trait::async_trait;

pub mod echelon;
pub mod justlend;
pub mod kamino;
pub mod lista;
pub mod wlfi;

/// A lending protocol that can report its USD1 market.
///
/// Implementations return `Ok` with an unavailable row when the market is
/// simply not listed; `Err` is reserved for transport and envelope failures.
#[async_trait]
pub trait LendingAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_market(&self, http: &HttpFetcher) -> Result<MarketRow, FetchError>;
}

/// Fetches one protocol's row, never failing: errors are logged and turned
/// into a row of `N/A` values so every protocol keeps its line in the report.
pub async fn fetch_row(adapter: &dyn LendingAdapter, http: &HttpFetcher) -> MarketRow {
    match adapter.fetch_market(http).await {
        Ok(row) => {
            tracing::info!("  OK {}", adapter.name());
            row
        }
        Err(e) => {
            tracing::warn!("  FAIL {}: {}", adapter.name(), e);
            MarketRow::unavailable(adapter.name())
        }
    }
}

/// All adapters in report order.
pub fn registry(endpoints: &Endpoints) -> Vec<Box<dyn LendingAdapter>> {
    vec![
        Box::new(wlfi::Wlfi::new(endpoints)),
        Box::new(echelon::Echelon::new(endpoints)),
        Box::new(justlend::JustLend::new(endpoints)),
        Box::new(kamino::Kamino::new(endpoints)),
        Box::new(lista::Lista::new(endpoints)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RetryPolicy;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// How the local fixture server answers every request.
    #[derive(Clone, Copy)]
    enum Reply {
        Raw(&'static str),
        Stall,
    }

    /// Serves `reply` on an ephemeral port and returns its base URL.
    async fn serve(reply: Reply) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    match reply {
                        Reply::Raw(response) => {
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        }
                        Reply::Stall => tokio::time::sleep(Duration::from_secs(30)).await,
                    }
                });
            }
        });

        format!("http://{addr}")
    }

    fn endpoints_at(base: &str) -> Endpoints {
        Endpoints {
            wlfi_tokens: format!("{base}/tokens"),
            wlfi_rates: format!("{base}/rates"),
            echelon_markets: format!("{base}/markets"),
            justlend_yields: format!("{base}/yields"),
            kamino_base: base.to_string(),
            lista_vault_list: format!("{base}/vault/list"),
            lista_vault_allocation: format!("{base}/vault/allocation"),
            stablecoins: format!("{base}/stablecoins"),
            exchange_pairs: format!("{base}/pairs"),
            telegram_api: base.to_string(),
        }
    }

    fn single_shot(timeout: Duration) -> HttpFetcher {
        HttpFetcher::new(reqwest::Client::new(), timeout).with_retry(RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        })
    }

    async fn assert_all_unavailable(endpoints: &Endpoints, http: &HttpFetcher) {
        for adapter in registry(endpoints) {
            let row = fetch_row(adapter.as_ref(), http).await;
            assert_eq!(row, MarketRow::unavailable(adapter.name()), "{}", adapter.name());
        }
    }

    #[test]
    fn registry_order_is_fixed() {
        let names: Vec<_> = registry(&Endpoints::default())
            .iter()
            .map(|a| a.name())
            .collect();
        assert_eq!(names, vec!["WLFI Markets", "Echelon", "JustLend", "Kamino", "Lista"]);
    }

    #[tokio::test]
    async fn unreachable_protocols_degrade_to_unavailable_rows() {
        let http = single_shot(Duration::from_secs(2));
        assert_all_unavailable(&endpoints_at("http://127.0.0.1:9"), &http).await;
    }

    #[tokio::test]
    async fn non_json_body_degrades_to_unavailable_rows() {
        let base = serve(Reply::Raw(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot json!",
        ))
        .await;
        assert_all_unavailable(&endpoints_at(&base), &single_shot(Duration::from_secs(2))).await;
    }

    #[tokio::test]
    async fn server_error_degrades_to_unavailable_rows() {
        let base = serve(Reply::Raw(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        ))
        .await;
        assert_all_unavailable(&endpoints_at(&base), &single_shot(Duration::from_secs(2))).await;
    }

    #[tokio::test]
    async fn stalled_server_times_out_to_unavailable_rows() {
        let base = serve(Reply::Stall).await;
        assert_all_unavailable(&endpoints_at(&base), &single_shot(Duration::from_millis(300))).await;
    }
}
