//! Remote text transformation client

use crate::error::{DiaryError, Result, TransformFailure};
use crate::infrastructure::config::TransformConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Rewrites raw diary text into prose.
///
/// One call is one attempt; implementations must not retry.
pub trait Transformer: Send + Sync + 'static {
    fn transform(
        &self,
        text: &str,
    ) -> impl Future<Output = std::result::Result<String, TransformFailure>> + Send;
}

#[derive(Debug, Serialize)]
struct TransformRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransformResponse {
    Direct {
        #[serde(rename = "transformedText")]
        transformed_text: String,
    },
    Completion {
        choices: Vec<CompletionChoice>,
    },
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// HTTP client for the transformation endpoint
#[derive(Debug, Clone)]
pub struct TransformationClient {
    http: reqwest::Client,
    endpoint: String,
    credential: String,
    max_tokens: u32,
}

impl TransformationClient {
    /// Build a client with HTTP/1.1 only and the configured timeouts.
    ///
    /// reqwest has no separate write timeout, so the write budget is folded
    /// into an overall request deadline of connect + read + write.
    pub fn new(config: TransformConfig) -> Result<Self> {
        let timeouts = config.timeouts;
        let http = reqwest::Client::builder()
            .http1_only()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .timeout(timeouts.connect + timeouts.read + timeouts.write)
            .build()
            .map_err(|e| DiaryError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(TransformationClient {
            http,
            endpoint: config.endpoint,
            credential: config.credential,
            max_tokens: config.max_tokens,
        })
    }

    async fn send(&self, text: &str) -> std::result::Result<String, TransformFailure> {
        let request = TransformRequest {
            prompt: text,
            max_tokens: self.max_tokens,
        };
        debug!("POST {} max_tokens={}", self.endpoint, self.max_tokens);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.credential)
            .json(&request)
            .send()
            .await
            .map_err(network_failure)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(network_failure)?;
        debug!("Response {}: {}", status, body);

        interpret_response(status, &body)
    }
}

impl Transformer for TransformationClient {
    fn transform(
        &self,
        text: &str,
    ) -> impl Future<Output = std::result::Result<String, TransformFailure>> + Send {
        self.send(text)
    }
}

fn network_failure(err: reqwest::Error) -> TransformFailure {
    let message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        err.to_string()
    };
    TransformFailure::Network { message }
}

/// Map a status code and body to the transformed text or a failure
pub fn interpret_response(status: u16, body: &str) -> std::result::Result<String, TransformFailure> {
    if !(200..300).contains(&status) {
        return Err(TransformFailure::RemoteError {
            status_code: status,
            body: body.to_string(),
        });
    }

    let parsed: TransformResponse =
        serde_json::from_str(body).map_err(|e| TransformFailure::Protocol {
            message: format!("Failed to parse response: {}", e),
        })?;

    let text = match parsed {
        TransformResponse::Direct { transformed_text } => transformed_text,
        TransformResponse::Completion { choices } => choices
            .into_iter()
            .next()
            .map(|choice| choice.text.trim().to_string())
            .ok_or_else(|| TransformFailure::Protocol {
                message: "Response contained no choices".to_string(),
            })?,
    };

    // An empty result would leave the entry awaiting input after being saved
    if text.is_empty() {
        return Err(TransformFailure::Protocol {
            message: "Response contained no text".to_string(),
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::Timeouts;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config_for(endpoint: String) -> TransformConfig {
        TransformConfig {
            credential: "test-key".to_string(),
            endpoint,
            max_tokens: 4,
            timeouts: Timeouts {
                connect: Duration::from_secs(2),
                read: Duration::from_secs(2),
                write: Duration::from_secs(2),
            },
        }
    }

    /// Accept one connection, capture the raw request and reply with `status` and `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{}/v1/engines/davinci/completions", addr), handle)
    }

    #[test]
    fn test_interpret_direct_shape() {
        let text = interpret_response(200, r#"{"transformedText":"Today was a good day."}"#).unwrap();
        assert_eq!(text, "Today was a good day.");
    }

    #[test]
    fn test_interpret_completion_shape() {
        let text = interpret_response(200, r#"{"id":"x","choices":[{"text":" It rained.\n"}]}"#).unwrap();
        assert_eq!(text, "It rained.");
    }

    #[test]
    fn test_interpret_non_success_status() {
        let failure = interpret_response(500, "server error").unwrap_err();
        assert_eq!(
            failure,
            TransformFailure::RemoteError {
                status_code: 500,
                body: "server error".to_string()
            }
        );
    }

    #[test]
    fn test_interpret_unparseable_body() {
        assert!(matches!(
            interpret_response(200, "<html>oops</html>"),
            Err(TransformFailure::Protocol { .. })
        ));
        assert!(matches!(
            interpret_response(200, r#"{"unexpected":true}"#),
            Err(TransformFailure::Protocol { .. })
        ));
        assert!(matches!(
            interpret_response(200, r#"{"choices":[]}"#),
            Err(TransformFailure::Protocol { .. })
        ));
    }

    #[test]
    fn test_interpret_empty_text_is_protocol_failure() {
        assert!(matches!(
            interpret_response(200, r#"{"transformedText":""}"#),
            Err(TransformFailure::Protocol { .. })
        ));
        assert!(matches!(
            interpret_response(200, r#"{"choices":[{"text":"  \n"}]}"#),
            Err(TransformFailure::Protocol { .. })
        ));
    }

    #[tokio::test]
    async fn test_transform_sends_prompt_and_bearer() {
        let (endpoint, server) =
            serve_once("200 OK", r#"{"transformedText":"Today was a good day."}"#).await;
        let client = TransformationClient::new(config_for(endpoint)).unwrap();

        let result = client.transform("Had a good day").await;
        assert_eq!(result, Ok("Today was a good day.".to_string()));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/engines/davinci/completions HTTP/1.1"));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer test-key"));
        assert!(request.contains(r#""prompt":"Had a good day""#));
        assert!(request.contains(r#""max_tokens":4"#));
    }

    #[tokio::test]
    async fn test_transform_remote_error() {
        let (endpoint, server) = serve_once("500 Internal Server Error", "server error").await;
        let client = TransformationClient::new(config_for(endpoint)).unwrap();

        let result = client.transform("text").await;
        assert_eq!(
            result,
            Err(TransformFailure::RemoteError {
                status_code: 500,
                body: "server error".to_string()
            })
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_transform_connection_refused_is_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = TransformationClient::new(config_for(format!("http://{}/", addr))).unwrap();
        let result = client.transform("text").await;

        assert!(matches!(result, Err(TransformFailure::Network { .. })));
    }

    #[tokio::test]
    async fn test_transform_silent_server_times_out_as_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept and hold the connection without ever answering
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let mut config = config_for(format!("http://{}/", addr));
        config.timeouts = Timeouts {
            connect: Duration::from_secs(1),
            read: Duration::from_secs(1),
            write: Duration::from_secs(1),
        };
        let client = TransformationClient::new(config).unwrap();

        let started = std::time::Instant::now();
        let result = client.transform("text").await;

        match result {
            Err(TransformFailure::Network { message }) => assert!(message.contains("timed out")),
            other => panic!("Expected Network failure, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }
}
