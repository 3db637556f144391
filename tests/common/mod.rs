/*!
 * Common test utilities for the pagetrans test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use pagetrans::database::{JobStore, Repository};
use pagetrans::layout::LayoutDocument;
use pagetrans::providers::mock::{MockMachineTranslator, MockTranslationMemory};
use pagetrans::translation::{FullMatchResolver, SubmitRequest, TranslationOrchestrator};

/// Route library logs to the test output; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A two-region page: a sentence wrapped over two lines, then two short sentences
pub fn sample_document() -> LayoutDocument {
    LayoutDocument::from_region_lines(&[
        vec!["This is a", "test sentence."],
        vec!["Good morning.", "See you later."],
    ])
}

/// Writes `sample_document` as JSON into the directory
pub fn create_test_document(dir: &Path, filename: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    sample_document().save(&path)?;
    Ok(path)
}

pub fn submit_request(document: LayoutDocument, use_tm: bool) -> SubmitRequest {
    SubmitRequest {
        document,
        source_language: "en".to_string(),
        target_language: "nl".to_string(),
        use_tm,
    }
}

/// Orchestrator over the given mocks and an in-memory SQLite repository
pub fn sqlite_orchestrator(
    mt: Arc<MockMachineTranslator>,
    tm: Arc<MockTranslationMemory>,
) -> Result<(TranslationOrchestrator, Arc<Repository>)> {
    let repository = Arc::new(Repository::new_in_memory()?);
    let store: Arc<dyn JobStore> = repository.clone();
    let resolver = FullMatchResolver::new(tm, "", 4);

    Ok((TranslationOrchestrator::new(mt, resolver, store), repository))
}

/// One-connection-per-response HTTP stub; records every raw request it receives
pub struct StubServer {
    pub base_url: String,
    requests: Arc<parking_lot::Mutex<Vec<String>>>,
}

impl StubServer {
    /// Serve `responses` in order, one per connection, as `(status line, body)`
    pub async fn start(responses: Vec<(&'static str, String)>) -> Result<Self> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}/api", listener.local_addr()?);
        let requests = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let recorded = requests.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };

                let mut raw = Vec::new();
                let mut buf = [0u8; 4096];
                while !request_complete(&raw) {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => raw.extend_from_slice(&buf[..n]),
                    }
                }
                recorded.lock().push(String::from_utf8_lossy(&raw).into_owned());

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Ok(Self { base_url, requests })
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };

    let headers = text[..header_end].to_lowercase();
    let body_len = raw.len() - (header_end + 4);

    if headers.contains("transfer-encoding: chunked") {
        return text.ends_with("0\r\n\r\n");
    }

    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    body_len >= content_length
}
