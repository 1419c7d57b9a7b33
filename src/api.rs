// API client module: a small blocking HTTP client for the audio library
// backend. `LibraryApi` is the seam the controller is written against so
// the flows can be exercised without a server.

use crate::config::Config;
use crate::model::{media_url, AudioUpload, DeleteRequest, Mode, Record};
use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client, Response};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Operations the backend offers. Every call is one request, no retry.
pub trait LibraryApi {
    /// `GET /get_library?mode=<mode>`.
    fn list(&self, mode: Mode) -> Result<Vec<Record>>;

    /// `POST /upload_audio` as multipart form data.
    fn upload(&self, upload: &AudioUpload) -> Result<()>;

    /// `POST /delete_audio` with `{"path": ...}`.
    fn delete(&self, path: &str) -> Result<()>;

    /// Fetch `/static/<path>` into `dest`, returning the bytes written.
    fn download(&self, path: &str, dest: &Path) -> Result<u64>;
}

/// Holds a reqwest blocking client and the base URL of the backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        // The backend keeps its session in a cookie; keep it between calls.
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route.trim_start_matches('/'))
    }

    /// Absolute URL of a record's media file.
    pub fn media_url(&self, path: &str) -> String {
        self.endpoint(&media_url(path))
    }
}

/// Turn a non-2xx response into an error carrying status and body.
fn ensure_success(res: Response, what: &str) -> Result<Response> {
    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().unwrap_or_else(|_| "".into());
        anyhow::bail!("{} failed: {} - {}", what, status, txt);
    }
    Ok(res)
}

/// Content type sent for an uploaded file, guessed from its extension.
pub fn mime_for(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

/// File name used for the multipart part; falls back to `audio`.
pub fn upload_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("audio")
        .to_string()
}

impl LibraryApi for ApiClient {
    fn list(&self, mode: Mode) -> Result<Vec<Record>> {
        let url = self.endpoint("get_library");
        tracing::debug!(%mode, %url, "listing library");
        let res = self
            .client
            .get(&url)
            .query(&[("mode", mode.as_str())])
            .send()
            .context("Failed to send library request")?;
        let res = ensure_success(res, "Listing")?;
        let records: Vec<Record> = res.json().context("Parsing library response json")?;
        tracing::debug!(%mode, count = records.len(), "library listed");
        Ok(records)
    }

    fn upload(&self, upload: &AudioUpload) -> Result<()> {
        let url = self.endpoint("upload_audio");

        let file = File::open(&upload.file)
            .with_context(|| format!("Failed to open audio file {}", upload.file.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat audio file {}", upload.file.display()))?
            .len();
        let part = multipart::Part::reader_with_length(file, len)
            .file_name(upload_file_name(&upload.file))
            .mime_str(&mime_for(&upload.file))
            .context("Invalid content type for upload")?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("category", upload.category.clone())
            .text("public", upload.public.to_string());

        tracing::debug!(file = %upload.file.display(), public = upload.public, "uploading");
        let res = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .context("Failed to send upload request")?;
        ensure_success(res, "Upload")?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let url = self.endpoint("delete_audio");
        tracing::debug!(path, "deleting");
        let res = self
            .client
            .post(&url)
            .json(&DeleteRequest { path })
            .send()
            .context("Failed to send delete request")?;
        ensure_success(res, "Delete")?;
        Ok(())
    }

    fn download(&self, path: &str, dest: &Path) -> Result<u64> {
        let url = self.media_url(path);
        tracing::debug!(%url, dest = %dest.display(), "downloading");
        let res = self
            .client
            .get(&url)
            .send()
            .context("Failed to send download request")?;
        let mut res = ensure_success(res, "Download")?;
        let mut out = File::create(dest)
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        let written = res.copy_to(&mut out).context("Failed to write downloaded file")?;
        Ok(written)
    }
}

/// Where a download of `path` lands inside `dir`: the last segment of the
/// server path.
pub fn download_target(dir: &Path, path: &str) -> PathBuf {
    let name = path
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("download");
    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use tempfile::TempDir;

    /// Accept one connection, answer it with `status` and `body`, and hand
    /// back the raw request, lowercased.
    fn serve_once(status: &'static str, body: &'static [u8]) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();
            let request = read_request(&mut stream);
            let head = format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                status,
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
            String::from_utf8_lossy(&request).to_ascii_lowercase()
        });
        (base, handle)
    }

    fn read_request(stream: &mut impl Read) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(end) = find(&buf, b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok());
                let done = match body_len {
                    Some(len) => buf.len() >= end + 4 + len,
                    None if head.contains("transfer-encoding: chunked") => {
                        buf.ends_with(b"0\r\n\r\n")
                    }
                    None => true,
                };
                if done {
                    return buf;
                }
            }
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                return buf;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn client(base: &str) -> ApiClient {
        let config = Config {
            base_url: base.into(),
            ..Config::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let api = client("http://localhost:5000/");
        assert_eq!(api.base_url(), "http://localhost:5000");
        assert_eq!(api.endpoint("/get_library"), "http://localhost:5000/get_library");
        assert_eq!(api.endpoint("delete_audio"), "http://localhost:5000/delete_audio");
    }

    #[test]
    fn test_media_url_is_absolute() {
        let api = client("http://music.local");
        assert_eq!(api.media_url("a.mp3"), "http://music.local/static/a.mp3");
    }

    #[test]
    fn test_mime_for_audio_files() {
        assert_eq!(mime_for(Path::new("song.mp3")), "audio/mpeg");
        assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_upload_file_name() {
        assert_eq!(upload_file_name(Path::new("/music/take 1.mp3")), "take 1.mp3");
        assert_eq!(upload_file_name(Path::new("/")), "audio");
    }

    #[test]
    fn test_download_target_uses_last_segment() {
        let dir = Path::new("/tmp/dl");
        assert_eq!(download_target(dir, "uploads/private/3/a.mp3"), dir.join("a.mp3"));
        assert_eq!(download_target(dir, "a.mp3/"), dir.join("a.mp3"));
        assert_eq!(download_target(dir, ""), dir.join("download"));
    }

    #[test]
    fn test_list_sends_mode_query() {
        let (base, server) = serve_once(
            "200 OK",
            br#"[{"name":"Song A","category":"jazz","path":"a.mp3"}]"#,
        );
        let records = client(&base).list(Mode::Private).unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("get /get_library?mode=private http/1.1"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "a.mp3");
    }

    #[test]
    fn test_list_rejects_malformed_json() {
        let (base, server) = serve_once("200 OK", b"<html>");
        assert!(client(&base).list(Mode::Public).is_err());
        server.join().unwrap();
    }

    #[test]
    fn test_upload_sends_multipart_fields_with_length() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("x.mp3");
        std::fs::write(&file, b"ID3 audio bytes").unwrap();

        let (base, server) = serve_once("200 OK", b"");
        let upload = AudioUpload {
            file,
            category: "jazz".into(),
            public: true,
        };
        client(&base).upload(&upload).unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("post /upload_audio http/1.1"));
        assert!(request.contains("content-type: multipart/form-data; boundary="));
        assert!(request.contains("content-length:"));
        assert!(!request.contains("transfer-encoding: chunked"));
        assert!(request.contains(r#"name="file"; filename="x.mp3""#));
        assert!(request.contains("content-type: audio/mpeg"));
        assert!(request.contains("id3 audio bytes"));
        assert!(request.contains("name=\"category\"\r\n\r\njazz\r\n"));
        assert!(request.contains("name=\"public\"\r\n\r\ntrue\r\n"));
    }

    #[test]
    fn test_upload_missing_file_sends_nothing() {
        let upload = AudioUpload {
            file: PathBuf::from("/definitely/not/here.mp3"),
            category: "jazz".into(),
            public: false,
        };
        // Nothing listens on this address; the open fails first.
        let err = client("http://127.0.0.1:9").upload(&upload).unwrap_err();
        assert!(err.to_string().contains("Failed to open audio file"));
    }

    #[test]
    fn test_delete_sends_json_path() {
        let (base, server) = serve_once("200 OK", b"");
        client(&base).delete("a.mp3").unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("post /delete_audio http/1.1"));
        assert!(request.contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"path":"a.mp3"}"#));
    }

    #[test]
    fn test_non_success_status_is_error() {
        let (base, server) = serve_once("500 Internal Server Error", b"nope");
        let err = client(&base).delete("a.mp3").unwrap_err();
        server.join().unwrap();

        assert_eq!(err.to_string(), "Delete failed: 500 Internal Server Error - nope");
    }

    #[test]
    fn test_download_writes_body() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.mp3");

        let (base, server) = serve_once("200 OK", b"ID3");
        let written = client(&base).download("a.mp3", &dest).unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("get /static/a.mp3 http/1.1"));
        assert_eq!(written, 3);
        assert_eq!(std::fs::read(&dest).unwrap(), b"ID3");
    }

    #[test]
    fn test_download_not_found_is_error() {
        let dir = TempDir::new().unwrap();
        let (base, server) = serve_once("404 Not Found", b"missing");
        let err = client(&base)
            .download("gone.mp3", &dir.path().join("gone.mp3"))
            .unwrap_err();
        server.join().unwrap();

        assert!(err.to_string().starts_with("Download failed: 404 Not Found"));
        assert!(!dir.path().join("gone.mp3").exists());
    }
}
