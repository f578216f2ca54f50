// Proxy-aware HTTP plumbing for the thumbnail fetch

use std::time::Duration;

use super::errors::DownloadError;
use super::models::NetworkConfig;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a client honoring the configured proxy. No proxy configured
/// means a direct connection.
pub fn http_client(net: &NetworkConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().timeout(HTTP_TIMEOUT);
    if let Some(proxy_url) = net.proxy.as_deref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }
    builder.build()
}

/// Fetch the thumbnail image bytes over the configured proxy.
pub async fn fetch_thumbnail(url: &str, net: &NetworkConfig) -> Result<Vec<u8>, DownloadError> {
    let client = http_client(net).map_err(|e| DownloadError::Thumbnail(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| DownloadError::Thumbnail(e.to_string()))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| DownloadError::Thumbnail(e.to_string()))?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_and_proxied_clients_build() {
        assert!(http_client(&NetworkConfig::default()).is_ok());
        let net = NetworkConfig {
            proxy: Some("http://127.0.0.1:10809".to_string()),
        };
        assert!(http_client(&net).is_ok());
    }

    #[tokio::test]
    async fn unreachable_thumbnail_is_a_thumbnail_error() {
        let err = fetch_thumbnail("http://127.0.0.1:1/thumb.jpg", &NetworkConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Thumbnail(_)));
    }
}
