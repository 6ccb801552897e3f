//! Backoff for dataset HTTP fetches.
//!
//! One load attempt may issue several requests. A request is repeated when
//! it fails in transport or the server answers 5xx; any other response ends
//! the loop. Once retries run out the last outcome is handed back unchanged,
//! so a persistent 503 still surfaces as a status failure.

use std::future::Future;

use cduty_core::RetryConfig;

/// Send with backoff. `send` runs at most `policy.max_retries + 1` times and
/// the dataset stays `Loading` throughout.
pub(crate) async fn send_with_backoff<F, Fut>(
    policy: &RetryConfig,
    location: &str,
    send: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut retry = 0;
    loop {
        let result = send().await;
        let reason = match &result {
            Ok(resp) if resp.status().is_server_error() => format!("HTTP {}", resp.status()),
            Ok(_) => return result,
            Err(e) if e.is_builder() => return result,
            Err(e) => e.to_string(),
        };
        if retry >= policy.max_retries {
            return result;
        }
        let delay = policy.delay_for(retry);
        retry += 1;
        tracing::warn!(
            location,
            retry,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            %reason,
            "dataset fetch will be retried"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn server_error_then_success_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("h\n1\n"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/PriceValue.csv", server.uri());
        let resp = send_with_backoff(&fast(2), "PriceValue.csv", || client.get(&url).send())
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn persistent_server_error_returns_last_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/PriceValue.csv", server.uri());
        let resp = send_with_backoff(&fast(2), "PriceValue.csv", || client.get(&url).send())
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 502);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/ConsumerSupport.csv", server.uri());
        let resp = send_with_backoff(&fast(5), "ConsumerSupport.csv", || client.get(&url).send())
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn refused_connection_uses_every_retry() {
        let calls = AtomicU32::new(0);
        let client = reqwest::Client::new();

        let result = send_with_backoff(&fast(3), "ProductPerformance.csv", || {
            calls.fetch_add(1, Ordering::SeqCst);
            client.get("http://127.0.0.1:1/ProductPerformance.csv").send()
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn zero_retries_sends_once() {
        let calls = AtomicU32::new(0);
        let client = reqwest::Client::new();

        let result = send_with_backoff(&fast(0), "ProductPerformance.csv", || {
            calls.fetch_add(1, Ordering::SeqCst);
            client.get("http://127.0.0.1:1/ProductPerformance.csv").send()
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
