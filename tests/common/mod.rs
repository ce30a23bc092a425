//! テスト用の簡易HTTPサーバー
//!
//! 1接続だけ受け付け、リクエストを最後まで読んでから決まった応答を返す。

#![allow(dead_code)]

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// 受信したリクエスト
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub head: String,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

pub struct CannedServer {
    pub base: String,
    handle: JoinHandle<CapturedRequest>,
}

impl CannedServer {
    /// 応答を返し終えた後、受信内容を取り出す
    pub async fn request(self) -> CapturedRequest {
        self.handle.await.expect("サーバータスク失敗")
    }
}

/// JSON応答を1回だけ返すサーバー
pub async fn serve_once(status: u16, body: &str) -> CannedServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind失敗");
    let base = format!("http://{}", listener.local_addr().unwrap());
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept失敗");
        let request = read_request(&mut stream).await;

        let response = format!(
            "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        request
    });

    CannedServer { base, handle }
}

/// 受け付けるが応答しないサーバー（タイムアウト確認用）
pub async fn serve_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind失敗");
    let base = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept失敗");
        let _ = read_request(&mut stream).await;
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        drop(stream);
    });

    base
}

/// 接続を拒否されるURL
pub async fn refused_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind失敗");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn read_request(stream: &mut TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break buf.len();
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let lower = head.to_ascii_lowercase();
    let mut body = buf[head_end..].to_vec();

    if let Some(length) = header_value(&lower, "content-length").and_then(|v| v.parse().ok()) {
        while body.len() < length {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    } else if header_value(&lower, "transfer-encoding").is_some_and(|v| v.contains("chunked")) {
        while find(&body, b"0\r\n\r\n").is_none() {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
    }

    CapturedRequest { head, body }
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == name).then(|| value.trim())
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
