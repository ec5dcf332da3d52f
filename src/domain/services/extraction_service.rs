// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use url::Url;

use crate::domain::models::platform::Platform;
use crate::domain::models::product::{ProductData, ReviewSummary, Variant};
use crate::domain::services::dom::{
    element_text, first_text, meta_content, select_all, select_first, select_first_group,
    select_within,
};
use crate::domain::services::normalizer::{
    clean_optional, detect_currency, discount_percentage, find_sku, join_breadcrumbs,
    normalize_availability, normalize_images, normalize_text, parse_price, parse_prices,
};
use crate::domain::services::platform_detector::{
    PlatformDetection, SelectorSet, GENERIC_SELECTORS, PRODUCT_URL_PATTERNS,
};
use crate::domain::services::scrape_error::ScrapeError;

/// 参与比价的价格元素数量上限，避免把推荐商品的价格算进来
const MAX_PRICE_ELEMENTS: usize = 3;
const MAX_ATTRIBUTES: usize = 50;
const IMAGE_ATTRIBUTES: &[&str] = &["data-src", "data-lazy", "data-original", "src", "content", "href"];

static RATING_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)(\d(?:\.\d+)?)\s*(?:/\s*5\b|out\s+of\s+5|stars?)").ok()
});

static REVIEW_COUNT_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*(?:reviews?|ratings?)").ok());

/// 按平台选择器提取商品数据
///
/// JSON-LD 优先，DOM 选择器填补空缺。非通用平台上既没有名称、价格，
/// 也没有结构化数据时返回 [`ScrapeError::Parse`]，调用方应改用 [`extract_generic`]。
pub fn extract(
    html: &str,
    url: &str,
    detection: &PlatformDetection,
) -> Result<ProductData, ScrapeError> {
    let document = Html::parse_document(html);
    let mut data = extract_document(&document, url, detection.selectors);

    if detection.platform != Platform::Generic
        && data.name.is_none()
        && data.price.is_none()
        && !data.has_structured_data
    {
        return Err(ScrapeError::Parse(format!(
            "{} selectors matched neither name nor price",
            detection.platform
        )));
    }

    apply_meta_fallbacks(&document, url, &mut data);
    Ok(finalize(data))
}

/// 使用通用选择器提取，不会失败
pub fn extract_generic(html: &str, url: &str) -> ProductData {
    let document = Html::parse_document(html);
    let mut data = extract_document(&document, url, &GENERIC_SELECTORS);
    apply_meta_fallbacks(&document, url, &mut data);
    finalize(data)
}

/// 页面是否含有 schema.org Product 的 JSON-LD
pub fn has_json_ld_product(document: &Html) -> bool {
    let blocks = json_ld_blocks(document);
    let mut nodes = Vec::new();
    for block in &blocks {
        collect_products(block, &mut nodes);
    }
    !nodes.is_empty()
}

/// 同站点的商品详情链接，去重并去掉锚点，不含页面自身
pub fn discover_product_links(html: &str, base_url: &str, limit: usize) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let mut own = base.clone();
    own.set_fragment(None);

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in select_all(&document, "a[href]") {
        if links.len() >= limit {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut link) = base.join(href.trim()) else {
            continue;
        };
        link.set_fragment(None);

        if !matches!(link.scheme(), "http" | "https") || link.host_str() != base.host_str() {
            continue;
        }
        let path = link.path().to_lowercase();
        if !PRODUCT_URL_PATTERNS.iter().any(|pattern| path.contains(pattern)) {
            continue;
        }
        if link == own {
            continue;
        }

        let link = link.to_string();
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

fn extract_document(document: &Html, url: &str, selectors: &SelectorSet) -> ProductData {
    let mut data = structured_product(document, url).unwrap_or_default();
    data.merge_missing(extract_with_selectors(document, url, selectors));
    data
}

/// 选择器的查找范围：先在商品容器内找，找不到再查整页
struct Scope<'a> {
    document: &'a Html,
    container: Option<ElementRef<'a>>,
}

impl<'a> Scope<'a> {
    fn new(document: &'a Html, containers: &[&str]) -> Self {
        Self {
            document,
            container: select_first(document, containers),
        }
    }

    fn elements(&self, selectors: &[&str]) -> Vec<ElementRef<'a>> {
        if let Some(container) = &self.container {
            let found = selectors
                .iter()
                .map(|css| select_within(container, css))
                .find(|found| !found.is_empty());
            if let Some(found) = found {
                return found;
            }
        }
        select_first_group(self.document, selectors)
    }

    fn text(&self, selectors: &[&str]) -> Option<String> {
        self.container
            .as_ref()
            .and_then(|container| {
                selectors.iter().find_map(|css| {
                    select_within(container, css)
                        .iter()
                        .map(element_text)
                        .find(|text| !text.is_empty())
                })
            })
            .or_else(|| first_text(self.document, selectors))
    }

    /// 文本为空时取 content/value 属性，兼容 meta 和 input
    fn value(&self, selectors: &[&str]) -> Option<String> {
        self.text(selectors).or_else(|| {
            self.elements(selectors).iter().find_map(|element| {
                let element = element.value();
                element
                    .attr("content")
                    .or_else(|| element.attr("value"))
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
        })
    }
}

fn extract_with_selectors(document: &Html, url: &str, selectors: &SelectorSet) -> ProductData {
    let scope = Scope::new(document, selectors.product_container);
    let body_text = visible_text(document);

    let price_elements = scope.elements(selectors.price);
    let candidates = price_candidates(&price_elements);
    let price = candidates.iter().copied().reduce(f64::min);
    let original_price = scope
        .text(selectors.original_price)
        .and_then(|text| parse_price(&text))
        .or_else(|| {
            let highest = candidates.iter().copied().reduce(f64::max)?;
            price.filter(|low| highest > *low).map(|_| highest)
        });

    let currency = price.map(|_| {
        meta_content(document, "product:price:currency")
            .or_else(|| meta_content(document, "og:price:currency"))
            .or_else(|| meta_content(document, "priceCurrency"))
            .unwrap_or_else(|| {
                let text = price_elements
                    .iter()
                    .take(MAX_PRICE_ELEMENTS)
                    .map(element_text)
                    .collect::<Vec<_>>()
                    .join(" ");
                detect_currency(&text)
            })
    });

    let availability = scope
        .value(selectors.availability)
        .and_then(|text| normalize_availability(&text))
        .or_else(|| {
            scope
                .elements(selectors.availability)
                .iter()
                .find_map(|element| element.value().attr("href"))
                .and_then(normalize_availability)
        });

    let sku = scope
        .value(selectors.sku)
        .and_then(|raw| find_sku(&raw).or_else(|| bare_sku(&raw)))
        .or_else(|| find_sku(&body_text));

    let breadcrumbs: Vec<String> = select_first_group(document, selectors.breadcrumbs)
        .iter()
        .map(element_text)
        .filter(|crumb| !crumb.eq_ignore_ascii_case("home"))
        .collect();

    ProductData {
        name: scope.text(selectors.name),
        price,
        original_price,
        currency,
        discount_percentage: None,
        description: scope.text(selectors.description),
        brand: scope.value(selectors.brand),
        sku,
        category: join_breadcrumbs(breadcrumbs),
        availability,
        images: extract_images(&scope, url, selectors.images),
        variants: extract_variants(&scope, selectors.variants),
        reviews: extract_reviews(document, &scope, selectors.reviews),
        attributes: extract_attributes(document),
        text: Some(body_text).filter(|text| !text.is_empty()),
        has_structured_data: false,
    }
}

fn price_candidates(elements: &[ElementRef<'_>]) -> Vec<f64> {
    elements
        .iter()
        .take(MAX_PRICE_ELEMENTS)
        .flat_map(|element| {
            let text = element_text(element);
            if text.is_empty() {
                element
                    .value()
                    .attr("content")
                    .map(parse_prices)
                    .unwrap_or_default()
            } else {
                parse_prices(&text)
            }
        })
        .collect()
}

/// 形如 `SKU: AB-1` 之外的裸编号
fn bare_sku(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let candidate = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("sku") => &trimmed[3..],
        _ => trimmed,
    };
    let candidate = candidate.trim_start_matches([':', '#']).trim();
    if candidate.is_empty() || candidate.len() > 64 || candidate.contains(char::is_whitespace) {
        None
    } else {
        Some(candidate.to_uppercase())
    }
}

fn extract_images(scope: &Scope<'_>, url: &str, selectors: &[&str]) -> Vec<String> {
    let mut candidates = Vec::new();
    for element in scope.elements(selectors) {
        let images = if element.value().name() == "img" {
            vec![element]
        } else {
            let nested = select_within(&element, "img");
            if nested.is_empty() {
                vec![element]
            } else {
                nested
            }
        };
        for image in images {
            let attrs = image.value();
            let source = IMAGE_ATTRIBUTES.iter().find_map(|name| {
                attrs
                    .attr(name)
                    .map(str::trim)
                    .filter(|value| !value.is_empty() && !value.starts_with("data:"))
            });
            if let Some(source) = source {
                candidates.push(source.to_string());
            }
        }
    }
    normalize_images(url, candidates)
}

fn extract_variants(scope: &Scope<'_>, selectors: &[&str]) -> Vec<Variant> {
    let mut variants: Vec<Variant> = Vec::new();

    for container in scope.elements(selectors) {
        let selects = if container.value().name() == "select" {
            vec![container]
        } else {
            select_within(&container, "select")
        };

        if selects.is_empty() {
            // 色块形式的规格，例如 Magento 的 swatch
            let options: Vec<String> = select_within(&container, "[data-value]")
                .iter()
                .filter_map(|option| option.value().attr("data-value"))
                .map(normalize_text)
                .filter(|option| is_real_option(option))
                .collect();
            if !options.is_empty() {
                let name = variant_name(&container)
                    .unwrap_or_else(|| format!("Option {}", variants.len() + 1));
                push_variant(&mut variants, name, options);
            }
            continue;
        }

        for select in selects {
            let options: Vec<String> = select_within(&select, "option")
                .iter()
                .map(element_text)
                .filter(|option| is_real_option(option))
                .collect();
            if options.is_empty() {
                continue;
            }
            let name =
                variant_name(&select).unwrap_or_else(|| format!("Option {}", variants.len() + 1));
            push_variant(&mut variants, name, options);
        }
    }

    variants
}

fn push_variant(variants: &mut Vec<Variant>, name: String, mut options: Vec<String>) {
    let mut seen = HashSet::new();
    options.retain(|option| seen.insert(option.clone()));
    if variants.iter().all(|variant| variant.name != name) {
        variants.push(Variant { name, options });
    }
}

fn is_real_option(option: &str) -> bool {
    let lower = option.to_lowercase();
    !lower.is_empty() && !lower.starts_with("choose") && !lower.starts_with("select")
}

/// `options[Size]`、`attribute_pa_color` 这类表单名转换为规格名
fn variant_name(element: &ElementRef<'_>) -> Option<String> {
    let attrs = element.value();
    let raw = ["data-attribute-name", "data-attribute-code", "aria-label", "name", "id"]
        .iter()
        .find_map(|name| attrs.attr(name))
        .map(str::trim)
        .filter(|raw| !raw.is_empty())?;

    let inner = match (raw.find('['), raw.rfind(']')) {
        (Some(start), Some(end)) if end > start + 1 => &raw[start + 1..end],
        _ => raw,
    };
    let inner = inner
        .trim_start_matches("attribute_pa_")
        .trim_start_matches("attribute_")
        .trim_start_matches("pa_");
    let name = normalize_text(&inner.replace(['_', '-'], " "));
    Some(name).filter(|name| !name.is_empty())
}

fn extract_reviews(
    document: &Html,
    scope: &Scope<'_>,
    selectors: &[&str],
) -> Option<ReviewSummary> {
    let itemprop = |key: &str| {
        select_first(document, &[key]).and_then(|element| {
            let text = element_text(&element);
            if text.is_empty() {
                element.value().attr("content").map(str::to_string)
            } else {
                Some(text)
            }
        })
    };

    let review_text = scope.text(selectors).unwrap_or_default();

    let rating = itemprop("[itemprop=ratingValue]")
        .and_then(|raw| parse_price(&raw))
        .or_else(|| {
            RATING_PATTERN
                .as_ref()?
                .captures(&review_text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
        })
        .filter(|rating| (0.0..=5.0).contains(rating));

    let count = itemprop("[itemprop=reviewCount]")
        .or_else(|| itemprop("[itemprop=ratingCount]"))
        .and_then(|raw| parse_count(&raw))
        .or_else(|| {
            REVIEW_COUNT_PATTERN
                .as_ref()?
                .captures(&review_text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| parse_count(m.as_str()))
        });

    if rating.is_none() && count.is_none() {
        None
    } else {
        Some(ReviewSummary { rating, count })
    }
}

fn parse_count(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// 规格参数表：`th/td` 行和 `dt/dd` 列表
fn extract_attributes(document: &Html) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();

    for row in select_all(document, "table tr") {
        let key = select_within(&row, "th").first().map(element_text);
        let value = select_within(&row, "td").first().map(element_text);
        if let (Some(key), Some(value)) = (key, value) {
            insert_attribute(&mut attributes, key, value);
        }
    }

    for list in select_all(document, "dl") {
        let terms = select_within(&list, "dt");
        let definitions = select_within(&list, "dd");
        for (term, definition) in terms.iter().zip(definitions.iter()) {
            insert_attribute(&mut attributes, element_text(term), element_text(definition));
        }
    }

    attributes
}

fn insert_attribute(attributes: &mut BTreeMap<String, String>, key: String, value: String) {
    let key = key.trim().trim_end_matches(':').trim().to_string();
    if key.is_empty() || key.len() > 64 || value.is_empty() || attributes.len() >= MAX_ATTRIBUTES {
        return;
    }
    attributes.entry(key).or_insert(value);
}

/// body 中可见的文本，跳过脚本和样式
fn visible_text(document: &Html) -> String {
    let Some(body) = select_all(document, "body").into_iter().next() else {
        return String::new();
    };
    let mut parts: Vec<&str> = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| {
                parent
                    .value()
                    .as_element()
                    .map(|element| matches!(element.name(), "script" | "style" | "noscript" | "template"))
            })
            .unwrap_or(false);
        if !hidden {
            parts.push(&**text);
        }
    }
    normalize_text(&parts.join(" "))
}

/// 选择器没命中时用 Open Graph / meta 标签兜底
fn apply_meta_fallbacks(document: &Html, url: &str, data: &mut ProductData) {
    let fallback = ProductData {
        name: meta_content(document, "og:title")
            .or_else(|| meta_content(document, "twitter:title"))
            .or_else(|| first_text(document, &["title"])),
        price: meta_content(document, "product:price:amount")
            .or_else(|| meta_content(document, "og:price:amount"))
            .and_then(|raw| parse_price(&raw)),
        currency: meta_content(document, "product:price:currency")
            .or_else(|| meta_content(document, "og:price:currency")),
        description: meta_content(document, "og:description")
            .or_else(|| meta_content(document, "description")),
        brand: meta_content(document, "product:brand"),
        availability: meta_content(document, "product:availability")
            .or_else(|| meta_content(document, "og:availability"))
            .and_then(|raw| normalize_availability(&raw)),
        images: normalize_images(
            url,
            meta_content(document, "og:image")
                .or_else(|| meta_content(document, "twitter:image")),
        ),
        ..Default::default()
    };
    data.merge_missing(fallback);
}

fn finalize(mut data: ProductData) -> ProductData {
    data.name = clean_optional(data.name.map(|name| strip_tags(&name)));
    data.description = clean_optional(data.description.map(|text| strip_tags(&text)));
    data.brand = clean_optional(data.brand);
    data.category = clean_optional(data.category);
    data.sku = clean_optional(data.sku);

    if let (Some(price), Some(original)) = (data.price, data.original_price) {
        if original <= price {
            data.original_price = None;
        }
    }
    data.discount_percentage = match (data.price, data.original_price) {
        (Some(price), Some(original)) => discount_percentage(price, original),
        _ => None,
    };

    data.currency = match data.currency.take() {
        Some(currency) if currency.trim().len() == 3 => Some(currency.trim().to_uppercase()),
        Some(currency) => Some(detect_currency(&currency)),
        None => data.price.map(|_| "USD".to_string()),
    };

    data
}

fn strip_tags(raw: &str) -> String {
    if raw.contains('<') {
        Html::parse_fragment(raw)
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        raw.to_string()
    }
}

fn json_ld_blocks(document: &Html) -> Vec<Value> {
    select_all(document, r#"script[type="application/ld+json"]"#)
        .into_iter()
        .filter_map(|script| {
            let raw: String = script.text().collect();
            serde_json::from_str::<Value>(raw.trim()).ok()
        })
        .collect()
}

fn collect_products<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_products(item, out);
            }
        }
        Value::Object(map) => {
            if is_product_type(map.get("@type")) {
                out.push(value);
            }
            if let Some(graph) = map.get("@graph") {
                collect_products(graph, out);
            }
            if let Some(entity) = map.get("mainEntity") {
                collect_products(entity, out);
            }
        }
        _ => {}
    }
}

fn is_product_type(value: Option<&Value>) -> bool {
    fn is_product(name: &str) -> bool {
        let name = name.rsplit('/').next().unwrap_or(name);
        name.eq_ignore_ascii_case("Product") || name.eq_ignore_ascii_case("ProductGroup")
    }

    match value {
        Some(Value::String(name)) => is_product(name),
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).any(is_product),
        _ => false,
    }
}

fn structured_product(document: &Html, url: &str) -> Option<ProductData> {
    let blocks = json_ld_blocks(document);
    let mut nodes = Vec::new();
    for block in &blocks {
        collect_products(block, &mut nodes);
    }

    let mut nodes = nodes.into_iter();
    let mut data = product_from_json_ld(nodes.next()?, url);
    for node in nodes {
        data.merge_missing(product_from_json_ld(node, url));
    }
    Some(data)
}

fn product_from_json_ld(node: &Value, url: &str) -> ProductData {
    let offers = offer_nodes(node.get("offers"));

    let mut prices = Vec::new();
    let mut currency = None;
    let mut availability = None;
    for offer in &offers {
        let specification = offer.get("priceSpecification");
        let amount = offer
            .get("price")
            .or_else(|| offer.get("lowPrice"))
            .or_else(|| specification.and_then(|spec| spec.get("price")))
            .and_then(json_number);
        if let Some(amount) = amount {
            prices.push(amount);
        }
        if currency.is_none() {
            currency = offer
                .get("priceCurrency")
                .or_else(|| specification.and_then(|spec| spec.get("priceCurrency")))
                .and_then(json_text);
        }
        if availability.is_none() {
            availability = offer
                .get("availability")
                .and_then(json_text)
                .and_then(|raw| normalize_availability(&raw));
        }
    }

    let reviews = node.get("aggregateRating").and_then(|rating| {
        let value = rating.get("ratingValue").and_then(json_number);
        let count = rating
            .get("reviewCount")
            .or_else(|| rating.get("ratingCount"))
            .and_then(json_number)
            .map(|count| count as u32);
        if value.is_none() && count.is_none() {
            None
        } else {
            Some(ReviewSummary {
                rating: value.filter(|value| (0.0..=5.0).contains(value)),
                count,
            })
        }
    });

    ProductData {
        name: node.get("name").and_then(json_text),
        price: prices.into_iter().reduce(f64::min),
        currency,
        description: node.get("description").and_then(json_text),
        brand: node
            .get("brand")
            .or_else(|| node.get("manufacturer"))
            .and_then(json_text),
        sku: node
            .get("sku")
            .or_else(|| node.get("mpn"))
            .or_else(|| node.get("productID"))
            .and_then(json_text),
        category: node.get("category").and_then(json_text),
        availability,
        images: normalize_images(url, json_images(node.get("image"))),
        reviews,
        has_structured_data: true,
        ..Default::default()
    }
}

/// offers 可以是单个 Offer、AggregateOffer 或列表
fn offer_nodes(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().filter(|item| item.is_object()).collect(),
        Some(offer) if offer.is_object() => {
            let mut nodes = vec![offer];
            if let Some(nested) = offer.get("offers") {
                nodes.extend(offer_nodes(Some(nested)));
            }
            nodes
        }
        _ => Vec::new(),
    }
}

fn json_images(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(url)) => vec![url.clone()],
        Some(Value::Array(items)) => items.iter().flat_map(|item| json_images(Some(item))).collect(),
        Some(Value::Object(map)) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(Value::as_str)
            .map(|url| vec![url.to_string()])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
        Value::Number(number) => Some(number.to_string()),
        Value::Object(map) => map.get("name").and_then(json_text),
        Value::Array(items) => items.iter().find_map(json_text),
        _ => None,
    }
}

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|n| n.is_finite() && *n > 0.0),
        Value::String(text) => parse_price(text),
        _ => None,
    }
}

#[cfg(test)]
#[path = "extraction_service_test.rs"]
mod tests;
