use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::Value;

use crate::failures::{truncate_text, MissingApiKey};
use crate::service::{GenerateContentRequest, GenerationService};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];
pub const REQUEST_TIMEOUT_VAR: &str = "MOCKUP_STUDIO_REQUEST_TIMEOUT";

const MIN_TIMEOUT_S: f64 = 5.0;
const MAX_TIMEOUT_S: f64 = 600.0;

/// Where the API key comes from. `Environment` is looked up again on every
/// request so a key selected mid-session is picked up without a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeySource {
    Environment,
    Fixed(String),
}

impl ApiKeySource {
    pub fn resolve(&self) -> Option<String> {
        match self {
            ApiKeySource::Environment => API_KEY_VARS.iter().find_map(|key| non_empty_env(key)),
            ApiKeySource::Fixed(key) => Some(key.trim().to_string()).filter(|key| !key.is_empty()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: ApiKeySource,
    /// `None` leaves requests unbounded: a hung call keeps its workflow busy.
    pub request_timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            api_key: ApiKeySource::Environment,
            request_timeout: None,
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        Self {
            api_base: normalize_api_base(env::var("GEMINI_API_BASE").ok().as_deref()),
            api_key: ApiKeySource::Environment,
            request_timeout: parse_timeout_seconds(env::var(REQUEST_TIMEOUT_VAR).ok().as_deref()),
        }
    }
}

pub struct GeminiService {
    config: GeminiConfig,
    http: HttpClient,
}

impl GeminiService {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build Gemini HTTP client")?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env())
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.config.api_base, model_path)
    }
}

impl GenerationService for GeminiService {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate_content(&self, request: &GenerateContentRequest) -> Result<Value> {
        let Some(api_key) = self.config.api_key.resolve() else {
            return Err(MissingApiKey(API_KEY_VARS).into());
        };
        let endpoint = self.endpoint_for_model(&request.model);
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key.as_str())])
            .json(&request.to_payload())
            .send()
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        response_json_or_error("Gemini", response)
    }
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

fn normalize_api_base(raw: Option<&str>) -> String {
    raw.map(|value| value.trim().trim_end_matches('/').to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string())
}

fn parse_timeout_seconds(raw: Option<&str>) -> Option<Duration> {
    let seconds = raw?.trim().parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(
        seconds.clamp(MIN_TIMEOUT_S, MAX_TIMEOUT_S),
    ))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::{
        normalize_api_base, parse_timeout_seconds, ApiKeySource, GeminiConfig, GeminiService,
        DEFAULT_GEMINI_API_BASE,
    };
    use crate::failures::{classify_failure, FailureClass};
    use crate::service::{ContentPart, GenerateContentRequest, GenerationService};

    /// Serves one canned HTTP response and hands back the request line and body.
    fn serve_once(
        status: &str,
        body: &str,
    ) -> anyhow::Result<(String, thread::JoinHandle<(String, String)>)> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let base = format!("http://{}", listener.local_addr()?);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let Ok((stream, _)) = listener.accept() else {
                return (String::new(), String::new());
            };
            let mut reader = BufReader::new(stream);
            let mut request_line = String::new();
            let _ = reader.read_line(&mut request_line);
            let mut content_length = 0usize;
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap_or(0) == 0 || header == "\r\n" {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut body = vec![0u8; content_length];
            let _ = reader.read_exact(&mut body);
            let mut stream = reader.into_inner();
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
            (request_line, String::from_utf8_lossy(&body).to_string())
        });
        Ok((base, handle))
    }

    fn service_for(base: &str) -> anyhow::Result<GeminiService> {
        GeminiService::new(GeminiConfig {
            api_base: base.to_string(),
            api_key: ApiKeySource::Fixed("test-key".to_string()),
            request_timeout: Some(Duration::from_secs(10)),
        })
    }

    fn text_request(model: &str) -> GenerateContentRequest {
        GenerateContentRequest::new(model, vec![ContentPart::Text("a red cube".to_string())])
    }

    #[test]
    fn endpoint_accepts_bare_and_prefixed_model_names() -> anyhow::Result<()> {
        let service = service_for("https://example.test/v1beta")?;
        assert_eq!(
            service.endpoint_for_model("gemini-2.5-flash-image"),
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(
            service.endpoint_for_model(" models/gemini-3-pro-image-preview "),
            "https://example.test/v1beta/models/gemini-3-pro-image-preview:generateContent"
        );
        Ok(())
    }

    #[test]
    fn config_helpers_normalize_and_clamp() {
        assert_eq!(normalize_api_base(None), DEFAULT_GEMINI_API_BASE);
        assert_eq!(normalize_api_base(Some(" http://local/v1/ ")), "http://local/v1");
        assert_eq!(normalize_api_base(Some("  ")), DEFAULT_GEMINI_API_BASE);

        assert_eq!(parse_timeout_seconds(None), None);
        assert_eq!(parse_timeout_seconds(Some("nope")), None);
        assert_eq!(parse_timeout_seconds(Some("0")), None);
        assert_eq!(parse_timeout_seconds(Some("1")), Some(Duration::from_secs(5)));
        assert_eq!(parse_timeout_seconds(Some("90")), Some(Duration::from_secs(90)));
        assert_eq!(parse_timeout_seconds(Some("9000")), Some(Duration::from_secs(600)));
        assert!(GeminiConfig::default().request_timeout.is_none());
    }

    #[test]
    fn fixed_key_source_ignores_blank_keys() {
        assert_eq!(ApiKeySource::Fixed(" k ".to_string()).resolve().as_deref(), Some("k"));
        assert_eq!(ApiKeySource::Fixed("   ".to_string()).resolve(), None);
    }

    #[test]
    fn missing_key_fails_before_any_request() -> anyhow::Result<()> {
        let service = GeminiService::new(GeminiConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            api_key: ApiKeySource::Fixed(String::new()),
            request_timeout: None,
        })?;
        let err = service
            .generate_content(&text_request("gemini-3-pro-image-preview"))
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
        assert_eq!(classify_failure(&err), FailureClass::Credential);
        Ok(())
    }

    #[test]
    fn posts_payload_with_key_and_parses_json() -> anyhow::Result<()> {
        let (base, handle) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"aW1n"}}]}}]}"#,
        )?;
        let service = service_for(&base)?;
        let response = service.generate_content(&text_request("gemini-3-pro-image-preview"))?;
        assert_eq!(
            response["candidates"][0]["content"]["parts"][0]["inlineData"]["data"],
            json!("aW1n")
        );

        let (request_line, body) = handle.join().map_err(|_| anyhow::anyhow!("server panicked"))?;
        assert!(request_line.starts_with(
            "POST /models/gemini-3-pro-image-preview:generateContent?key=test-key"
        ));
        let sent: Value = serde_json::from_str(&body)?;
        assert_eq!(sent["contents"][0]["parts"][0]["text"], json!("a red cube"));
        Ok(())
    }

    #[test]
    fn error_status_surfaces_body_for_classification() -> anyhow::Result<()> {
        let (base, handle) = serve_once(
            "404 Not Found",
            r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#,
        )?;
        let service = service_for(&base)?;
        let err = service
            .generate_content(&text_request("gemini-3-pro-image-preview"))
            .unwrap_err();
        let _ = handle.join();

        assert!(err.to_string().contains("Gemini request failed (404)"));
        assert_eq!(classify_failure(&err), FailureClass::Credential);
        Ok(())
    }
}
