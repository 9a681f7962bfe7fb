// tests/common/mod.rs
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use offer_curator::ai::TextGenerator;
use offer_curator::notify::MessageDelivery;
use offer_curator::sources::{LinkChecker, OfferSource, SourceSelector};
use offer_curator::Candidate;

/// Pages per selector; missing pages are empty. Selectors listed in `failing` error out.
#[derive(Default)]
pub struct StubSource {
    pub pages: HashMap<String, Vec<Vec<Candidate>>>,
    pub failing: HashSet<String>,
    pub calls: Mutex<Vec<(String, u32)>>,
}

impl StubSource {
    pub fn with_page(mut self, selector: &SourceSelector, items: Vec<Candidate>) -> Self {
        self.pages.entry(selector.to_string()).or_default().push(items);
        self
    }

    pub fn failing(mut self, selector: &SourceSelector) -> Self {
        self.failing.insert(selector.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OfferSource for StubSource {
    async fn fetch(&self, selector: &SourceSelector, page: u32) -> Result<Vec<Candidate>> {
        let key = selector.to_string();
        self.calls.lock().unwrap().push((key.clone(), page));
        if self.failing.contains(&key) {
            return Err(anyhow!("boom"));
        }
        Ok(self
            .pages
            .get(&key)
            .and_then(|p| p.get(page as usize - 1))
            .cloned()
            .unwrap_or_default())
    }
    fn name(&self) -> &'static str {
        "stub"
    }
}

pub struct AllLive;

#[async_trait]
impl LinkChecker for AllLive {
    async fn is_live(&self, _url: &str) -> bool {
        true
    }
}

pub struct DeadLinks(pub Vec<&'static str>);

#[async_trait]
impl LinkChecker for DeadLinks {
    async fn is_live(&self, url: &str) -> bool {
        !self.0.iter().any(|dead| *dead == url)
    }
}

pub struct FixedText(pub &'static str);

#[async_trait]
impl TextGenerator for FixedText {
    async fn generate(&self, candidate: &Candidate) -> Result<String> {
        Ok(format!("{} {}", self.0, candidate.name))
    }
    fn provider_name(&self) -> &'static str {
        "fixed"
    }
}

pub struct FailingText;

#[async_trait]
impl TextGenerator for FailingText {
    async fn generate(&self, _candidate: &Candidate) -> Result<String> {
        Err(anyhow!("quota exceeded"))
    }
    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

/// Records every message; fails for messages containing any of `fail_on`.
#[derive(Default)]
pub struct RecordingDelivery {
    pub fail_on: Vec<String>,
    pub sent: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingDelivery {
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: vec![needle.to_string()],
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, Option<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageDelivery for RecordingDelivery {
    async fn deliver(&self, text: &str, image_url: Option<&str>) -> bool {
        if self.fail_on.iter().any(|n| text.contains(n.as_str())) {
            return false;
        }
        self.sent
            .lock()
            .unwrap()
            .push((text.to_string(), image_url.map(str::to_string)));
        true
    }
    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn offer(id: u64, name: &str, price: f64, rating: f64, discount: f64, sales: u64) -> Candidate {
    Candidate::new(id, name, price)
        .with_rating(rating)
        .with_discount(discount)
        .with_sales(sales)
        .with_link(format!("https://s.shopee.com.br/{id}"))
        .with_shop("Loja Teste")
}

/// One request seen by [`HttpStub`].
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Minimal local HTTP/1.1 server: one request per connection, answered by `respond`.
pub struct HttpStub {
    pub base: String,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl HttpStub {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();
        let respond = Arc::new(respond);

        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let log = log.clone();
                let respond = respond.clone();
                tokio::spawn(async move {
                    let Some(req) = read_request(&mut sock).await else {
                        return;
                    };
                    let (status, body) = (*respond)(&req.method, &req.path);
                    let head_only = req.method == "HEAD";
                    log.lock().unwrap().push(req);
                    let mut resp = format!(
                        "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        body.len()
                    );
                    if !head_only {
                        resp.push_str(&body);
                    }
                    let _ = sock.write_all(resp.as_bytes()).await;
                    let _ = sock.shutdown().await;
                });
            }
        });

        Self {
            base: format!("http://{addr}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(sock: &mut TcpStream) -> Option<StubRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = sock.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let len = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + len {
        let n = sock.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut first = head.split_whitespace();
    Some(StubRequest {
        method: first.next()?.to_string(),
        path: first.next()?.to_string(),
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    })
}

/// Plain client for local stubs (no proxy from the environment).
pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
