// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

use crate::domain::models::product::{Availability, ProductData};

/// 文本最大长度（字符）
pub const MAX_TEXT_CHARS: usize = 5000;
/// 每个商品最多保留的图片数
pub const MAX_IMAGES: usize = 20;

/// 质量分可达到的最大原始分
const MAX_QUALITY_SCORE: f64 = 1.15;

static SKU_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)\bSKU[:#\s]+([A-Z0-9][A-Z0-9\-_]*)").ok());

static PRICE_NUMBER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?|\.\d+").ok());

/// 解码 HTML 实体、折叠空白并截断
pub fn normalize_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_TEXT_CHARS {
        let truncated: String = collapsed.chars().take(MAX_TEXT_CHARS).collect();
        format!("{}...", truncated)
    } else {
        collapsed
    }
}

/// 非空时返回规范化文本
pub fn clean_optional(raw: Option<String>) -> Option<String> {
    raw.map(|value| normalize_text(&value))
        .filter(|value| !value.is_empty())
}

/// 从价格文本中解析出金额
///
/// 去掉货币符号和千分位，只接受大于 0 的值。
/// 文本中有多个金额时取第一个。
pub fn parse_price(raw: &str) -> Option<f64> {
    let pattern = PRICE_NUMBER.as_ref()?;
    let text = normalize_decimal_comma(raw.trim());
    pattern
        .find(&text)
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .filter(|price| price.is_finite() && *price > 0.0)
}

/// 所有金额，用于同一元素里同时出现原价和现价的情况
pub fn parse_prices(raw: &str) -> Vec<f64> {
    let Some(pattern) = PRICE_NUMBER.as_ref() else {
        return Vec::new();
    };
    let text = normalize_decimal_comma(raw.trim());
    pattern
        .find_iter(&text)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .filter(|price| price.is_finite() && *price > 0.0)
        .collect()
}

/// `12,99 €` 这种以逗号作小数点的写法转换为 `12.99`
fn normalize_decimal_comma(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if *c == ',' {
            let digits_after = chars[i + 1..].iter().take_while(|d| d.is_ascii_digit()).count();
            let has_dot = chars.iter().any(|d| *d == '.');
            if digits_after == 2 && !has_dot {
                result.push('.');
                continue;
            }
        }
        result.push(*c);
    }
    result
}

/// 根据货币符号或代码识别币种，默认 USD
pub fn detect_currency(raw: &str) -> String {
    let text = raw.trim();
    let upper = text.to_uppercase();
    for code in ["USD", "EUR", "GBP", "JPY", "INR", "CAD", "AUD", "CNY"] {
        if upper.contains(code) {
            return code.to_string();
        }
    }
    let symbol = [
        ("C$", "CAD"),
        ("A$", "AUD"),
        ("€", "EUR"),
        ("£", "GBP"),
        ("¥", "JPY"),
        ("₹", "INR"),
        ("$", "USD"),
    ]
    .into_iter()
    .find(|(symbol, _)| text.contains(symbol));
    if let Some((_, code)) = symbol {
        return code.to_string();
    }
    match upper.as_str() {
        "EURO" | "EUROS" => "EUR",
        "POUND" | "POUNDS" => "GBP",
        "YEN" => "JPY",
        _ => "USD",
    }
    .to_string()
}

/// 库存状态文本或 schema.org URL 映射为枚举
pub fn normalize_availability(raw: &str) -> Option<Availability> {
    let lower = raw.trim().to_lowercase();
    // schema.org 形式，例如 https://schema.org/InStock
    let text = if lower.starts_with("http") {
        lower.rsplit('/').next().unwrap_or(&lower)
    } else {
        lower.as_str()
    };

    if contains_any(text, &["out of stock", "outofstock", "sold out", "soldout", "unavailable", "discontinued"]) {
        Some(Availability::OutOfStock)
    } else if contains_any(text, &["pre-order", "preorder", "coming soon", "backorder", "back order"]) {
        Some(Availability::PreOrder)
    } else if contains_any(text, &["limited", "low stock", "few left", "left in stock"]) {
        Some(Availability::LimitedStock)
    } else if contains_any(text, &["in stock", "instock", "available", "ready", "ships", "add to cart"]) {
        Some(Availability::InStock)
    } else {
        None
    }
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(term))
}

/// 转换为绝对地址，无法解析时返回 None
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("data:") || href.starts_with("javascript:") {
        return None;
    }
    let resolved = match Url::parse(base) {
        Ok(base) => base.join(href).ok()?,
        Err(_) => Url::parse(href).ok()?,
    };
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// 图片地址去重、绝对化并限制数量，保持原顺序
pub fn normalize_images<I, S>(base: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(|candidate| absolutize(base, candidate.as_ref()))
        .filter(|url| seen.insert(url.clone()))
        .take(MAX_IMAGES)
        .collect()
}

/// 从正文里找 `SKU: XXX`
pub fn find_sku(text: &str) -> Option<String> {
    SKU_PATTERN
        .as_ref()?
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

/// 面包屑拼接为分类路径
pub fn join_breadcrumbs<I, S>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = parts
        .into_iter()
        .map(|p| normalize_text(p.as_ref()))
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" > "))
    }
}

/// 折扣百分比，保留一位小数
pub fn discount_percentage(price: f64, original_price: f64) -> Option<f64> {
    if original_price > price && price > 0.0 {
        Some(((original_price - price) / original_price * 1000.0).round() / 10.0)
    } else {
        None
    }
}

/// 数据质量分
///
/// 按字段完整度加权：名称 .20，价格 .15，描述 .15，品牌 .10，图片 .10，
/// 分类/库存/规格/属性/评价/SKU 各 .05，另有多图、长描述、结构化数据各 .05 的加分，
/// 除以满分 1.15 后限制在 [0, 1]。
pub fn quality_score(data: &ProductData) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let present = |opt: &Option<String>| opt.as_deref().is_some_and(|s| !s.trim().is_empty());
    let mut score = 0.0;

    let weighted = [
        (present(&data.name), 0.20),
        (data.price.is_some(), 0.15),
        (present(&data.description), 0.15),
        (present(&data.brand), 0.10),
        (!data.images.is_empty(), 0.10),
        (present(&data.category), 0.05),
        (data.availability.is_some(), 0.05),
        (!data.variants.is_empty(), 0.05),
        (!data.attributes.is_empty(), 0.05),
        (data.reviews.is_some(), 0.05),
        (present(&data.sku), 0.05),
        (data.images.len() > 1, 0.05),
        (
            data.description
                .as_deref()
                .is_some_and(|d| d.chars().count() > 100),
            0.05,
        ),
        (data.has_structured_data, 0.05),
    ];
    for (hit, weight) in weighted {
        if hit {
            score += weight;
        }
    }

    (score / MAX_QUALITY_SCORE).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::product::{ReviewSummary, Variant};

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Blue&nbsp;&amp;\n\t Green  "), "Blue & Green");
        let long = "a".repeat(MAX_TEXT_CHARS + 10);
        assert_eq!(normalize_text(&long).chars().count(), MAX_TEXT_CHARS + 3);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$1,299.99"), Some(1299.99));
        assert_eq!(parse_price("Price: 24.00 USD"), Some(24.0));
        assert_eq!(parse_price("12,99 €"), Some(12.99));
        assert_eq!(parse_price("£0.00"), None);
        assert_eq!(parse_price("Free"), None);
        assert_eq!(parse_prices("Was $30.00 Now $20.00"), vec![30.0, 20.0]);
    }

    #[test]
    fn test_detect_currency() {
        assert_eq!(detect_currency("$10"), "USD");
        assert_eq!(detect_currency("€10"), "EUR");
        assert_eq!(detect_currency("£10"), "GBP");
        assert_eq!(detect_currency("¥1000"), "JPY");
        assert_eq!(detect_currency("₹499"), "INR");
        assert_eq!(detect_currency("C$15"), "CAD");
        assert_eq!(detect_currency("eur"), "EUR");
        assert_eq!(detect_currency("10"), "USD");
    }

    #[test]
    fn test_normalize_availability() {
        assert_eq!(normalize_availability("In Stock"), Some(Availability::InStock));
        assert_eq!(normalize_availability("https://schema.org/InStock"), Some(Availability::InStock));
        assert_eq!(normalize_availability("http://schema.org/OutOfStock"), Some(Availability::OutOfStock));
        assert_eq!(normalize_availability("Currently unavailable"), Some(Availability::OutOfStock));
        assert_eq!(normalize_availability("PreOrder"), Some(Availability::PreOrder));
        assert_eq!(normalize_availability("Only 3 left in stock"), Some(Availability::LimitedStock));
        assert_eq!(normalize_availability("Call us"), None);
    }

    #[test]
    fn test_normalize_images() {
        let images = normalize_images(
            "https://shop.example.com/products/mug",
            ["/img/a.jpg", "//cdn.example.com/b.jpg", "/img/a.jpg", "data:image/png;base64,xx", ""],
        );
        assert_eq!(
            images,
            vec![
                "https://shop.example.com/img/a.jpg".to_string(),
                "https://cdn.example.com/b.jpg".to_string(),
            ]
        );

        let many: Vec<String> = (0..30).map(|i| format!("/img/{}.jpg", i)).collect();
        assert_eq!(normalize_images("https://shop.example.com/", many).len(), MAX_IMAGES);
    }

    #[test]
    fn test_find_sku_and_breadcrumbs() {
        assert_eq!(find_sku("Details SKU: mug-001 ceramic").as_deref(), Some("MUG-001"));
        assert!(find_sku("no code here").is_none());
        assert_eq!(
            join_breadcrumbs(["Home", " Kitchen ", "", "Mugs"]).as_deref(),
            Some("Home > Kitchen > Mugs")
        );
        assert!(join_breadcrumbs(Vec::<String>::new()).is_none());
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(discount_percentage(75.0, 100.0), Some(25.0));
        assert_eq!(discount_percentage(100.0, 75.0), None);
    }

    #[test]
    fn test_quality_score_bounds() {
        assert_eq!(quality_score(&ProductData::default()), 0.0);

        let full = ProductData {
            name: Some("Mug".into()),
            price: Some(10.0),
            description: Some("d".repeat(150)),
            brand: Some("Acme".into()),
            sku: Some("MUG-1".into()),
            category: Some("Home > Mugs".into()),
            availability: Some(Availability::InStock),
            images: vec!["https://a/1.jpg".into(), "https://a/2.jpg".into()],
            variants: vec![Variant {
                name: "Size".into(),
                options: vec!["S".into()],
            }],
            reviews: Some(ReviewSummary {
                rating: Some(4.5),
                count: Some(10),
            }),
            attributes: [("material".to_string(), "ceramic".to_string())].into(),
            has_structured_data: true,
            ..Default::default()
        };
        assert!((quality_score(&full) - 1.0).abs() < 1e-9);

        let name_only = ProductData {
            name: Some("Mug".into()),
            ..Default::default()
        };
        assert!((quality_score(&name_only) - 0.2 / 1.15).abs() < 1e-9);
    }
}
