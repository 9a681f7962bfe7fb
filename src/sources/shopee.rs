//! Shopee affiliate Open API (GraphQL `productOfferV2`).
//!
//! Requests are signed with `SHA256(partner_id + timestamp + payload + api_key)` and
//! sent as `Authorization: SHA256 Credential=.., Timestamp=.., Signature=..`.
//! Response nodes are parsed leniently (numbers often arrive as strings) and turned
//! into typed `Candidate`s here, so nothing past this boundary touches raw JSON.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use tracing::debug;

use super::{OfferSource, SourceSelector};
use crate::candidate::Candidate;

pub const DEFAULT_ENDPOINT: &str = "https://open-api.affiliate.shopee.com.br/graphql";

const NODE_FIELDS: &str = "itemId productName priceMin priceMax priceDiscountRate ratingStar \
                           sales offerLink productLink shopName imageUrl";

pub struct ShopeeAffiliateSource {
    http: Client,
    endpoint: String,
    partner_id: u64,
    api_key: String,
    page_size: u32,
}

impl ShopeeAffiliateSource {
    pub fn new(http: Client, partner_id: u64, api_key: String) -> Self {
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            partner_id,
            api_key,
            page_size: 20,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_page_size(mut self, limit: u32) -> Self {
        self.page_size = limit.max(1);
        self
    }
}

#[async_trait::async_trait]
impl OfferSource for ShopeeAffiliateSource {
    async fn fetch(&self, selector: &SourceSelector, page: u32) -> Result<Vec<Candidate>> {
        let query = build_query(selector, page, self.page_size);
        let payload = serde_json::to_string(&serde_json::json!({ "query": query, "variables": {} }))
            .context("encode graphql payload")?;
        let ts = chrono::Utc::now().timestamp();
        let signature = sign(self.partner_id, ts, &payload, &self.api_key);
        let auth = format!(
            "SHA256 Credential={}, Timestamp={}, Signature={}",
            self.partner_id, ts, signature
        );

        let resp = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, auth)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .context("shopee request")?;
        let status = resp.status();
        let body = resp.text().await.context("read shopee body")?;
        if !status.is_success() {
            bail!("shopee HTTP {status}: {}", truncate(&body, 200));
        }

        let offers = parse_offer_response(&body)?;
        debug!(%selector, page, offers = offers.len(), "shopee page fetched");
        Ok(offers)
    }

    fn name(&self) -> &'static str {
        "shopee"
    }
}

/// GraphQL document for one page. Keywords are embedded as JSON string literals,
/// which is also valid GraphQL string escaping.
pub fn build_query(selector: &SourceSelector, page: u32, limit: u32) -> String {
    let filter = match selector {
        SourceSelector::Keyword(k) => format!(
            "keyword: {}",
            serde_json::to_string(k).unwrap_or_else(|_| "\"\"".to_string())
        ),
        SourceSelector::Store(id) => format!("shopId: {id}"),
    };
    format!(
        "query {{ productOfferV2({filter}, page: {page}, limit: {limit}) {{ nodes {{ {NODE_FIELDS} }} }} }}"
    )
}

/// Lowercase hex SHA-256 of `partner_id ‖ timestamp ‖ payload ‖ api_key`.
pub fn sign(partner_id: u64, timestamp: i64, payload: &str, api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{partner_id}{timestamp}{payload}{api_key}").as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[derive(Debug, Deserialize)]
struct GqlResponse {
    #[serde(default)]
    data: Option<GqlData>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct GqlData {
    #[serde(rename = "productOfferV2")]
    product_offer: Option<OfferConnection>,
}

#[derive(Debug, Deserialize)]
struct OfferConnection {
    #[serde(default)]
    nodes: Vec<RawOffer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOffer {
    item_id: Option<Value>,
    product_name: Option<String>,
    price_min: Option<Value>,
    price_max: Option<Value>,
    price_discount_rate: Option<Value>,
    rating_star: Option<Value>,
    sales: Option<Value>,
    offer_link: Option<String>,
    product_link: Option<String>,
    shop_name: Option<String>,
    image_url: Option<String>,
}

/// Parse a `productOfferV2` response body. A non-empty `errors` array is an error;
/// malformed nodes are skipped.
pub fn parse_offer_response(body: &str) -> Result<Vec<Candidate>> {
    let resp: GqlResponse = serde_json::from_str(body)
        .with_context(|| format!("parse shopee JSON: {}", truncate(body, 200)))?;

    if let Some(errors) = resp.errors.filter(|e| !e.is_empty()) {
        bail!("shopee graphql errors: {}", Value::Array(errors));
    }

    let nodes = resp
        .data
        .and_then(|d| d.product_offer)
        .map(|c| c.nodes)
        .unwrap_or_default();

    let total = nodes.len();
    let out: Vec<Candidate> = nodes.into_iter().filter_map(into_candidate).collect();
    if out.len() < total {
        debug!(skipped = total - out.len(), "shopee nodes without id/name/price/link");
    }
    Ok(out)
}

fn into_candidate(raw: RawOffer) -> Option<Candidate> {
    let item_id = raw.item_id.as_ref().and_then(lenient_u64)?;
    let name = raw
        .product_name
        .map(|n| n.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|n| !n.is_empty())?;
    let price_min = raw
        .price_min
        .as_ref()
        .and_then(lenient_f64)
        .filter(|p| *p >= 0.0)?;
    let offer_link = [raw.offer_link, raw.product_link]
        .into_iter()
        .flatten()
        .map(|l| l.trim().to_string())
        .find(|l| !l.is_empty())?;

    Some(Candidate {
        item_id,
        name,
        price_min,
        price_max: raw
            .price_max
            .as_ref()
            .and_then(lenient_f64)
            .filter(|p| *p >= price_min),
        // Integer percentage on the wire.
        discount_rate: raw
            .price_discount_rate
            .as_ref()
            .and_then(lenient_f64)
            .map(|pct| (pct / 100.0).clamp(0.0, 1.0)),
        rating: raw.rating_star.as_ref().and_then(lenient_f64),
        sales: raw.sales.as_ref().and_then(lenient_u64),
        offer_link,
        shop_name: raw.shop_name.unwrap_or_default().trim().to_string(),
        image_url: raw.image_url.filter(|u| !u.trim().is_empty()),
    })
}

/// Number or numeric string; anything else (or non-finite) is absent.
pub(crate) fn lenient_f64(v: &Value) -> Option<f64> {
    let x = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}

pub(crate) fn lenient_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.is_finite()).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
