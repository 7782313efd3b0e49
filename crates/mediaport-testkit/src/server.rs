use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A response the server hands out.
#[derive(Debug, Clone)]
pub struct CannedResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
  pub delay: Option<Duration>,
}

impl CannedResponse {
  pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status,
      content_type: None,
      body: body.into(),
      delay: None,
    }
  }

  pub fn json(status: u16, body: &str) -> Self {
    Self::new(status, body).with_content_type("application/json")
  }

  pub fn with_content_type(mut self, content_type: &str) -> Self {
    self.content_type = Some(content_type.to_string());
    self
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }
}

/// A request the server received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
  pub method: String,
  pub path: String,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl RecordedRequest {
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(k, _)| k.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }

  pub fn body_text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}

/// A one-connection-per-request HTTP/1.1 server on localhost.
///
/// Responses are served in order; once exhausted the last one repeats.
pub struct TestServer {
  base_url: String,
  requests: Arc<Mutex<Vec<RecordedRequest>>>,
  handle: JoinHandle<()>,
}

impl TestServer {
  pub async fn start(responses: Vec<CannedResponse>) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0")
      .await
      .expect("failed to bind test server");
    let addr = listener.local_addr().expect("no local addr");
    let requests = Arc::new(Mutex::new(Vec::new()));

    let recorded = requests.clone();
    let handle = tokio::spawn(async move {
      let mut served = 0usize;
      loop {
        let Ok((stream, _)) = listener.accept().await else {
          break;
        };
        let response = responses
          .get(served)
          .or_else(|| responses.last())
          .cloned()
          .unwrap_or_else(|| CannedResponse::new(500, "no canned response"));
        served += 1;

        let recorded = recorded.clone();
        tokio::spawn(handle_connection(stream, response, recorded));
      }
    });

    Self {
      base_url: format!("http://{}", addr),
      requests,
      handle,
    }
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn url(&self, path: &str) -> String {
    format!("{}/{}", self.base_url, path.trim_start_matches('/'))
  }

  pub fn requests(&self) -> Vec<RecordedRequest> {
    self.requests.lock().unwrap().clone()
  }
}

impl Drop for TestServer {
  fn drop(&mut self) {
    self.handle.abort();
  }
}

async fn handle_connection(
  mut stream: TcpStream,
  response: CannedResponse,
  recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) {
  // Record before answering so the client never observes a response first.
  let Some(request) = read_request(&mut stream).await else {
    return;
  };
  recorded.lock().unwrap().push(request);

  if let Some(delay) = response.delay {
    tokio::time::sleep(delay).await;
  }

  let mut head = format!(
    "HTTP/1.1 {} {}\r\ncontent-length: {}\r\nconnection: close\r\n",
    response.status,
    reason(response.status),
    response.body.len()
  );
  if let Some(ct) = &response.content_type {
    head.push_str(&format!("content-type: {}\r\n", ct));
  }
  head.push_str("\r\n");

  // The client may have given up already (timeouts); that is fine.
  let _ = stream.write_all(head.as_bytes()).await;
  let _ = stream.write_all(&response.body).await;
  let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
  let mut buf = Vec::new();
  let mut chunk = [0u8; 4096];

  let header_end = loop {
    if let Some(pos) = find(&buf, b"\r\n\r\n") {
      break pos + 4;
    }
    let n = stream.read(&mut chunk).await.ok()?;
    if n == 0 {
      return None;
    }
    buf.extend_from_slice(&chunk[..n]);
  };

  let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
  let mut lines = head.split("\r\n");
  let mut request_line = lines.next()?.split_whitespace();
  let method = request_line.next()?.to_string();
  let path = request_line.next()?.to_string();

  let headers: Vec<(String, String)> = lines
    .filter_map(|line| line.split_once(':'))
    .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
    .collect();
  let header = |name: &str| headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());

  let mut body = buf[header_end..].to_vec();
  if let Some(len) = header("content-length").and_then(|v| v.parse::<usize>().ok()) {
    while body.len() < len {
      let n = stream.read(&mut chunk).await.ok()?;
      if n == 0 {
        break;
      }
      body.extend_from_slice(&chunk[..n]);
    }
  } else if header("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked")) {
    while find(&body, b"0\r\n\r\n").is_none() {
      let n = stream.read(&mut chunk).await.ok()?;
      if n == 0 {
        break;
      }
      body.extend_from_slice(&chunk[..n]);
    }
    body = decode_chunked(&body);
  }

  Some(RecordedRequest {
    method,
    path,
    headers,
    body,
  })
}

fn decode_chunked(raw: &[u8]) -> Vec<u8> {
  let mut out = Vec::new();
  let mut rest = raw;
  while let Some(line_end) = find(rest, b"\r\n") {
    let size_line = String::from_utf8_lossy(&rest[..line_end]);
    let size = usize::from_str_radix(size_line.split(';').next().unwrap_or("0").trim(), 16).unwrap_or(0);
    if size == 0 {
      break;
    }
    let start = line_end + 2;
    let end = (start + size).min(rest.len());
    out.extend_from_slice(&rest[start..end]);
    rest = &rest[(end + 2).min(rest.len())..];
  }
  out
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason(status: u16) -> &'static str {
  match status {
    200 => "OK",
    201 => "Created",
    204 => "No Content",
    400 => "Bad Request",
    401 => "Unauthorized",
    403 => "Forbidden",
    404 => "Not Found",
    500 => "Internal Server Error",
    502 => "Bad Gateway",
    503 => "Service Unavailable",
    _ => "Status",
  }
}
