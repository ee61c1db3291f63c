//! HTTP implementation of the connectivity health probe.

use std::time::Duration;

use futures::future::BoxFuture;

use vigil_sync::HealthProbe;

use crate::errors::ClientError;

/// `GET /health` with a bounded timeout.
///
/// Probes go out unauthenticated - reachability is a transport question,
/// and the health endpoint answers regardless of session state.
pub struct HttpHealthProbe {
    http: reqwest::Client,
    url: reqwest::Url,
}

impl HttpHealthProbe {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = reqwest::Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        let url = base.join("health").map_err(|e| ClientError::InvalidPath {
            path: "health".to_string(),
            message: e.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::HttpInit {
                message: e.to_string(),
            })?;
        Ok(Self { http, url })
    }
}

impl HealthProbe for HttpHealthProbe {
    fn probe(&self) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(async move {
            match self.http.get(self.url.clone()).send().await {
                Ok(response) if response.status().is_success() => Ok(()),
                Ok(response) => Err(format!(
                    "service returned HTTP {}",
                    response.status().as_u16()
                )),
                Err(e) if e.is_timeout() => Err("health probe timed out".to_string()),
                Err(e) => Err(e.to_string()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_health(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf).await;
            let body = r#"{"status":"ok"}"#;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body,
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_healthy_service_probes_ok() {
        let base_url = serve_health("200 OK").await;
        let probe = HttpHealthProbe::new(&base_url, Duration::from_secs(5)).unwrap();
        assert_eq!(probe.probe().await, Ok(()));
    }

    #[tokio::test]
    async fn test_non_2xx_is_offline_with_status_in_reason() {
        let base_url = serve_health("503 Service Unavailable").await;
        let probe = HttpHealthProbe::new(&base_url, Duration::from_secs(5)).unwrap();
        let reason = probe.probe().await.unwrap_err();
        assert!(reason.contains("503"), "got: {}", reason);
    }

    #[tokio::test]
    async fn test_transport_failure_is_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe =
            HttpHealthProbe::new(&format!("http://{}", addr), Duration::from_secs(1)).unwrap();
        assert!(probe.probe().await.is_err());
    }
}
