//! Telegram HTML message builders, one per classification.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::candidate::{Candidate, Classification, ClassifiedCandidate};

/// Dispatch on the classification tag.
pub fn build_message(item: &ClassifiedCandidate) -> String {
    match &item.kind {
        Classification::New { .. } => new_offer_message(&item.candidate, item.marketing_text.as_deref()),
        Classification::PriceDrop {
            previous_price,
            discount_pct,
        } => price_drop_message(&item.candidate, *previous_price, *discount_pct),
    }
}

pub fn new_offer_message(c: &Candidate, marketing_text: Option<&str>) -> String {
    let mut out = String::new();
    match marketing_text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => {
            out.push_str(&encode_text(text));
            out.push_str("\n\n");
            out.push_str(&format!("<b>{}</b>\n\n", encode_text(&c.name)));
        }
        None => out.push_str(&format!("<b>✨ {} ✨</b>\n\n", encode_text(&c.name))),
    }

    match c.price_max.filter(|max| (max - c.price_min).abs() >= 0.005) {
        Some(max) => out.push_str(&format!(
            "💰 De <b>{}</b> a <b>{}</b>\n",
            brl(c.price_min),
            brl(max)
        )),
        None => out.push_str(&format!("💰 Por apenas <b>{}</b>\n", brl(c.price_min))),
    }
    if let Some(d) = c.discount_rate.filter(|d| *d > 0.0) {
        out.push_str(&format!("🏷️ {}% OFF\n", (d * 100.0).round() as u32));
    }
    if let Some(r) = c.rating.filter(|r| *r > 0.0) {
        out.push_str(&format!("⭐ Avaliação: {r:.1}\n"));
    }
    push_shop_and_link(&mut out, c, "👉 Ver Oferta Agora");
    out
}

pub fn price_drop_message(c: &Candidate, previous_price: f64, discount_pct: u32) -> String {
    let mut out = String::from("<b>🚨 ALERTA DE PREÇO BAIXO 🚨</b>\n\n");
    out.push_str(&format!("<b>{}</b>\n\n", encode_text(&c.name)));
    out.push_str(&format!(
        "📉 De <s>{}</s> por <b>{}</b> ({}% mais barato)\n",
        brl(previous_price),
        brl(c.price_min),
        discount_pct
    ));
    push_shop_and_link(&mut out, c, "🛒 Aproveitar Agora");
    out
}

fn push_shop_and_link(out: &mut String, c: &Candidate, cta: &str) {
    if !c.shop_name.is_empty() {
        out.push_str(&format!("🏪 Loja: {}\n", encode_text(&c.shop_name)));
    }
    out.push_str(&format!(
        "\n<a href=\"{}\"><b>{}</b></a>",
        encode_double_quoted_attribute(&c.offer_link),
        cta
    ));
}

/// `R$ 1.234,56`
pub fn brl(value: f64) -> String {
    let cents = (value.max(0.0) * 100.0).round() as u64;
    let (int, frac) = (cents / 100, cents % 100);
    let digits = int.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("R$ {grouped},{frac:02}")
}
