//! HTTP synthesis client.

use std::time::Duration;

use super::{SpeechError, SpeechRequest, SynthesisFuture, Synthesizer};
use crate::config::SpeechConfig;

/// POSTs `{model, voice, input}` with a bearer key and returns the body bytes
pub struct HttpSynthesizer {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpSynthesizer {
    pub fn new(config: &SpeechConfig, api_key: String) -> Result<Self, SpeechError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| SpeechError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }

    async fn post(&self, request: &SpeechRequest) -> Result<Vec<u8>, SpeechError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| SpeechError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Speech endpoint rejected request");
            return Err(SpeechError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::transport(e.to_string()))?;

        tracing::debug!("Received {} bytes of audio", bytes.len());
        Ok(bytes.to_vec())
    }
}

impl Synthesizer for HttpSynthesizer {
    fn synthesize<'a>(&'a self, request: &'a SpeechRequest) -> SynthesisFuture<'a> {
        Box::pin(self.post(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(response: &'static [u8]) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            // Read headers, then the declared body
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + length || n == 0 {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{}/v1/audio/speech", addr), handle)
    }

    fn client(endpoint: String) -> HttpSynthesizer {
        let config = SpeechConfig {
            endpoint,
            ..Default::default()
        };
        HttpSynthesizer::new(&config, "sk-test".to_string()).unwrap()
    }

    fn request() -> SpeechRequest {
        SpeechRequest {
            model: "gpt-4o-mini-tts".to_string(),
            voice: "alloy".to_string(),
            input: "Three people inside.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let (endpoint, server) =
            serve_once(b"HTTP/1.1 200 OK\r\ncontent-type: audio/mpeg\r\ncontent-length: 4\r\nconnection: close\r\n\r\nID3!")
                .await;

        let audio = client(endpoint).synthesize(&request()).await.unwrap();
        assert_eq!(audio, b"ID3!".to_vec());

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /v1/audio/speech"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(raw.contains(r#""input":"Three people inside.""#));
        assert!(raw.contains(r#""voice":"alloy""#));
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let (endpoint, server) =
            serve_once(b"HTTP/1.1 429 Too Many Requests\r\ncontent-length: 0\r\nconnection: close\r\n\r\n").await;

        let err = client(endpoint).synthesize(&request()).await.unwrap_err();
        assert_eq!(err, SpeechError::Status(429));
        assert_eq!(err.to_string(), "TTS request failed: 429");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind and drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}/v1/audio/speech", addr))
            .synthesize(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::Transport(ref m) if !m.is_empty()));
    }
}
