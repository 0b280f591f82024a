/*!
 * Common test utilities for the csvbridge test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use csvbridge::app_config::{Config, LogConfig};
use csvbridge::providers::mock::MockProvider;
use csvbridge::providers::TranslationBackend;
use csvbridge::Controller;

/// Initialize a test logger once; output is captured by the test harness
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// `text` encoded as GBK
pub fn gbk(text: &str) -> Vec<u8> {
    let (bytes, _, unmappable) = encoding_rs::GBK.encode(text);
    assert!(!unmappable, "fixture text must be representable in GBK");
    bytes.into_owned()
}

/// `text` encoded as ISO-8859-9
pub fn latin5(text: &str) -> Vec<u8> {
    let (bytes, _, unmappable) = encoding_rs::WINDOWS_1254.encode(text);
    assert!(!unmappable, "fixture text must be representable in ISO-8859-9");
    bytes.into_owned()
}

/// Decode GBK output written by the pipeline
pub fn read_gbk(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let (text, _, _) = encoding_rs::GBK.decode(&bytes);
    Ok(text.into_owned())
}

/// A configuration for tests: no pauses, no log file, checkpoints inside `dir`
pub fn fast_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.progress_file = dir
        .join("translation_progress.json")
        .to_string_lossy()
        .to_string();
    config.rows_per_batch = 2;
    config.translation.retry_count = 2;
    config.translation.retry_delay_ms = 0;
    config.translation.request_delay_ms = 0;
    config.log = LogConfig {
        file: String::new(),
        ..LogConfig::default()
    };
    config
}

/// Translation that leaves no Chinese behind, so a second run has nothing to do
pub fn ascii_translation(text: &str, target_language: &str) -> String {
    format!("{}:{}", target_language, text.chars().count())
}

/// Controller over `backends` with progress bars hidden
pub fn controller_with(config: Config, backends: Vec<Box<dyn TranslationBackend>>) -> Controller {
    Controller::with_backends(config, backends).with_progress_bars(false)
}

/// Controller with one working mock backend producing ASCII translations
pub fn ascii_controller(config: Config) -> (Controller, MockProvider) {
    let mock = MockProvider::working().with_custom_response(ascii_translation);
    let controller = controller_with(config, vec![Box::new(mock.clone())]);
    (controller, mock)
}

/// Serve `body` with `status` to every request on a local port
///
/// Returns the base URL and the request lines received so far.
pub async fn spawn_http_stub(
    status: u16,
    body: &'static str,
) -> Result<(String, std::sync::Arc<parking_lot::Mutex<Vec<String>>>)> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}/translate", listener.local_addr()?);
    let requests = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buffer = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                }
            }
            let request = String::from_utf8_lossy(&buffer);
            if let Some(line) = request.lines().next() {
                seen.lock().push(line.to_string());
            }

            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    Ok((url, requests))
}
