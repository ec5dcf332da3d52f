// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::Html;

use crate::domain::models::platform::Platform;
use crate::domain::services::dom::{any_match, select_all};

/// 低于该置信度时回退为通用平台
pub const MIN_CONFIDENCE: f64 = 0.2;

const META_WEIGHT: u32 = 3;
const SCRIPT_WEIGHT: u32 = 2;
const CSS_WEIGHT: u32 = 2;
const HTML_WEIGHT: u32 = 1;
const URL_WEIGHT: u32 = 1;

/// 平台特征
struct PlatformSignature {
    platform: Platform,
    generators: &'static [&'static str],
    scripts: &'static [&'static str],
    css: &'static [&'static str],
    html_markers: &'static [&'static str],
    url_patterns: &'static [&'static str],
}

static SIGNATURES: &[PlatformSignature] = &[
    PlatformSignature {
        platform: Platform::Shopify,
        generators: &["shopify"],
        scripts: &["cdn.shopify.com", "shopifycdn.com"],
        css: &["shopify"],
        html_markers: &["shopify-section", "shopify-pay"],
        url_patterns: &["/cart/add", "/products/", "/collections/"],
    },
    PlatformSignature {
        platform: Platform::WooCommerce,
        generators: &["woocommerce"],
        scripts: &["woocommerce", "wc-"],
        css: &["woocommerce", "wc-"],
        html_markers: &["woocommerce", "wc-"],
        url_patterns: &["/cart/", "/checkout/", "/my-account/"],
    },
    PlatformSignature {
        platform: Platform::BigCommerce,
        generators: &["bigcommerce"],
        scripts: &["bigcommerce.com", "bc-sf-filter"],
        css: &["bigcommerce"],
        html_markers: &["bigcommerce"],
        url_patterns: &["/cart.php", "/checkout/"],
    },
    PlatformSignature {
        platform: Platform::Magento,
        generators: &["magento"],
        scripts: &["mage/", "magento"],
        css: &["magento"],
        html_markers: &["magento", "mage-"],
        url_patterns: &["/checkout/cart/", "/customer/account/"],
    },
    PlatformSignature {
        platform: Platform::PrestaShop,
        generators: &["prestashop"],
        scripts: &["prestashop", "ps_"],
        css: &["prestashop"],
        html_markers: &["prestashop"],
        url_patterns: &["/order", "/authentication"],
    },
    PlatformSignature {
        platform: Platform::Squarespace,
        generators: &["squarespace"],
        scripts: &["squarespace.com", "static1.squarespace.com"],
        css: &["squarespace"],
        html_markers: &["squarespace"],
        url_patterns: &[],
    },
    PlatformSignature {
        platform: Platform::Wix,
        generators: &["wix"],
        scripts: &["wix.com", "wixstatic.com"],
        css: &["wix"],
        html_markers: &["wix"],
        url_patterns: &[],
    },
    PlatformSignature {
        platform: Platform::Square,
        generators: &["square"],
        scripts: &["squareup.com", "square"],
        css: &["square"],
        html_markers: &["square"],
        url_patterns: &[],
    },
];

/// 平台相关的商品字段选择器，每个字段按顺序尝试
#[derive(Debug)]
pub struct SelectorSet {
    pub product_container: &'static [&'static str],
    pub name: &'static [&'static str],
    pub price: &'static [&'static str],
    pub original_price: &'static [&'static str],
    pub description: &'static [&'static str],
    pub images: &'static [&'static str],
    pub variants: &'static [&'static str],
    pub availability: &'static [&'static str],
    pub reviews: &'static [&'static str],
    pub brand: &'static [&'static str],
    pub sku: &'static [&'static str],
    pub breadcrumbs: &'static [&'static str],
}

pub static SHOPIFY_SELECTORS: SelectorSet = SelectorSet {
    product_container: &[".product", ".product-form", "[data-product-id]"],
    name: &[".product-title", ".product__title", "h1.product-single__title"],
    price: &[".product__price", ".product-price", "[data-price]", ".price"],
    original_price: &[".product__price--compare", ".compare-at-price", ".price--compare", "s.price"],
    description: &[".product-description", ".product__description", ".rte"],
    images: &[".product-image img", ".product__media img", ".product-photo img"],
    variants: &[".product-variants", ".product-form__variants", "[data-variant]"],
    availability: &[".product-availability", "[data-inventory]"],
    reviews: &[".reviews", ".product-reviews", "[data-reviews]"],
    brand: &[".product__vendor", ".product-vendor", "[itemprop=brand]"],
    sku: &[".product__sku", ".product-sku", "[itemprop=sku]"],
    breadcrumbs: &[".breadcrumb a", ".breadcrumbs a"],
};

pub static WOOCOMMERCE_SELECTORS: SelectorSet = SelectorSet {
    product_container: &[".product", ".single-product"],
    name: &[".product_title", ".entry-title"],
    price: &[".price ins .woocommerce-Price-amount", ".price .woocommerce-Price-amount", ".price"],
    original_price: &[".price del .woocommerce-Price-amount", ".price del"],
    description: &[".woocommerce-product-details__short-description", ".woocommerce-Tabs-panel--description", ".product_meta"],
    images: &[".woocommerce-product-gallery img", ".product-image img"],
    variants: &[".variations", ".variable-product"],
    availability: &[".stock", ".out-of-stock"],
    reviews: &[".woocommerce-reviews", "#reviews"],
    brand: &[".product_meta .brand a", "[itemprop=brand]"],
    sku: &[".product_meta .sku", ".sku"],
    breadcrumbs: &[".woocommerce-breadcrumb a"],
};

pub static BIGCOMMERCE_SELECTORS: SelectorSet = SelectorSet {
    product_container: &[".product", ".productView"],
    name: &[".productView-title", ".product-title"],
    price: &[".productView-price .price--withoutTax", ".productView-price", ".price"],
    original_price: &[".price--rrp", ".price--non-sale"],
    description: &[".productView-description", ".product-description"],
    images: &[".productView-image img", ".product-image img"],
    variants: &[".productView-options", ".product-options", ".form-field"],
    availability: &[".product-availability", "[data-product-stock]"],
    reviews: &[".productView-reviews", ".reviews"],
    brand: &[".productView-brand a", ".productView-brand"],
    sku: &["[data-product-sku]", ".productView-info-value--sku"],
    breadcrumbs: &[".breadcrumbs a"],
};

pub static MAGENTO_SELECTORS: SelectorSet = SelectorSet {
    product_container: &[".product-info-main", ".product.info"],
    name: &[".page-title", ".product-item-name"],
    price: &[".price-box .special-price .price", ".price-box .price", ".price"],
    original_price: &[".price-box .old-price .price"],
    description: &[".product.attribute.description", ".product-info-description"],
    images: &[".product-image-main img", ".gallery-image img", ".fotorama__img"],
    variants: &[".swatch-attribute", ".product-options-wrapper"],
    availability: &[".stock", ".availability"],
    reviews: &[".reviews", ".product-reviews"],
    brand: &[".product-brand", "[itemprop=brand]"],
    sku: &[".product.attribute.sku .value", "[itemprop=sku]"],
    breadcrumbs: &[".breadcrumbs a", ".breadcrumbs strong"],
};

pub static GENERIC_SELECTORS: SelectorSet = SelectorSet {
    product_container: &[".product", "[data-product]", ".item"],
    name: &["h1", ".product-title", ".product-name", ".title", ".name"],
    price: &[".price", "[data-price]", ".product-price", ".cost", ".amount", "[itemprop=price]"],
    original_price: &[".original-price", ".was-price", ".regular-price", ".list-price", ".compare-price", "del", "s"],
    description: &[".description", ".product-description", ".details", ".summary", "[itemprop=description]"],
    images: &[".product-image img", ".gallery img", ".main-image img", "[itemprop=image]"],
    variants: &[".options", ".variants", ".attributes", "select[name*=variant]"],
    availability: &[".stock", ".availability", ".in-stock", "[itemprop=availability]"],
    reviews: &[".reviews", ".ratings", ".rating", ".testimonials"],
    brand: &[".brand", ".manufacturer", "[itemprop=brand]"],
    sku: &[".sku", ".product-sku", "[itemprop=sku]", "[data-sku]"],
    breadcrumbs: &[".breadcrumb a", ".breadcrumbs a", "nav[aria-label=breadcrumb] a"],
};

impl Platform {
    /// 平台对应的选择器集合，没有专用集合的平台使用通用集合
    pub fn selectors(&self) -> &'static SelectorSet {
        match self {
            Platform::Shopify => &SHOPIFY_SELECTORS,
            Platform::WooCommerce => &WOOCOMMERCE_SELECTORS,
            Platform::BigCommerce => &BIGCOMMERCE_SELECTORS,
            Platform::Magento => &MAGENTO_SELECTORS,
            _ => &GENERIC_SELECTORS,
        }
    }
}

/// 平台识别结果
#[derive(Debug, Clone)]
pub struct PlatformDetection {
    pub platform: Platform,
    /// [0, 1]
    pub confidence: f64,
    pub selectors: &'static SelectorSet,
    /// 命中的特征，便于排查
    pub features: Vec<String>,
}

impl PlatformDetection {
    fn generic() -> Self {
        Self {
            platform: Platform::Generic,
            confidence: 0.0,
            selectors: &GENERIC_SELECTORS,
            features: Vec::new(),
        }
    }
}

/// 识别页面背后的电商平台
///
/// 对每个平台按特征打分：generator meta +3，脚本地址 +2，样式表 +2，
/// HTML 片段和 URL 片段各 +1。得分最高者胜出，置信度为 `min(score / 10, 1)`，
/// 低于 [`MIN_CONFIDENCE`] 时返回通用平台。
pub fn detect_platform(html: &str, url: &str) -> PlatformDetection {
    let document = Html::parse_document(html);
    detect_platform_in(&document, html, url)
}

/// 在已解析的文档上识别平台
pub fn detect_platform_in(document: &Html, html: &str, url: &str) -> PlatformDetection {
    let html_lower = html.to_lowercase();
    let url_lower = url.to_lowercase();

    let generators: Vec<String> = select_all(document, "meta[name]")
        .into_iter()
        .filter(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("generator"))
        })
        .filter_map(|meta| meta.value().attr("content").map(str::to_lowercase))
        .collect();
    let script_srcs: Vec<String> = select_all(document, "script[src]")
        .into_iter()
        .filter_map(|s| s.value().attr("src").map(str::to_lowercase))
        .collect();
    let css_hrefs: Vec<String> = select_all(document, "link[href]")
        .into_iter()
        .filter_map(|l| l.value().attr("href").map(str::to_lowercase))
        .collect();

    let mut best: Option<(u32, &PlatformSignature, Vec<String>)> = None;

    for signature in SIGNATURES {
        let mut score = 0;
        let mut features = Vec::new();

        for pattern in signature.generators {
            if generators.iter().any(|g| g.contains(pattern)) {
                score += META_WEIGHT;
                features.push(format!("meta_{}", pattern));
            }
        }
        for pattern in signature.scripts {
            if script_srcs.iter().any(|src| src.contains(pattern)) {
                score += SCRIPT_WEIGHT;
                features.push(format!("script_{}", pattern));
            }
        }
        for pattern in signature.css {
            if css_hrefs.iter().any(|href| href.contains(pattern)) {
                score += CSS_WEIGHT;
                features.push(format!("css_{}", pattern));
            }
        }
        for pattern in signature.html_markers {
            if html_lower.contains(pattern) {
                score += HTML_WEIGHT;
                features.push(format!("html_{}", pattern));
            }
        }
        for pattern in signature.url_patterns {
            if url_lower.contains(pattern) {
                score += URL_WEIGHT;
                features.push(format!("url_{}", pattern));
            }
        }

        // 同分时保留先声明的平台
        if score > 0 && best.as_ref().map_or(true, |(top, _, _)| score > *top) {
            best = Some((score, signature, features));
        }
    }

    match best {
        Some((score, signature, features)) => {
            let confidence = (score as f64 / 10.0).min(1.0);
            if confidence < MIN_CONFIDENCE {
                return PlatformDetection::generic();
            }
            PlatformDetection {
                platform: signature.platform,
                confidence,
                selectors: signature.platform.selectors(),
                features,
            }
        }
        None => PlatformDetection::generic(),
    }
}

/// 商品页判定结果
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPageSignal {
    pub is_product: bool,
    /// [0, 1]
    pub confidence: f64,
    pub signals: Vec<String>,
}

pub(crate) const PRODUCT_URL_PATTERNS: &[&str] = &["/product/", "/products/", "/item/", "/p/", "/dp/", "/gp/product/"];
const PRICE_SELECTORS: &[&str] = &[".price", "[data-price]", ".cost", ".amount", ".product-price", ".price-current"];
const CART_SELECTORS: &[&str] = &["[data-add-to-cart]", ".add-to-cart", ".buy-now", "button[name=add]", ".purchase-button"];
const VARIANT_SELECTORS: &[&str] = &[".variants", ".options", ".attributes", "select[name*=variant]", ".product-options"];
const GALLERY_SELECTORS: &[&str] = &[".product-gallery", ".product-images", ".image-gallery", ".product-photos"];

/// 判断页面是否为商品详情页
///
/// URL 模式 +2，价格元素 +1，加购按钮 +2，规格选项 +1，图集 +1，
/// JSON-LD Product +3；得分不低于 3 视为商品页
pub fn detect_product_page(html: &str, url: &str) -> ProductPageSignal {
    let document = Html::parse_document(html);
    detect_product_page_in(&document, url)
}

pub fn detect_product_page_in(document: &Html, url: &str) -> ProductPageSignal {
    let url_lower = url.to_lowercase();
    let mut score = 0u32;
    let mut signals = Vec::new();

    for pattern in PRODUCT_URL_PATTERNS {
        if url_lower.contains(pattern) {
            score += 2;
            signals.push(format!("url_{}", pattern));
        }
    }
    if product_id_suffix(&url_lower) {
        score += 2;
        signals.push("url_product_id".to_string());
    }

    let checks: [(&[&str], u32, &str); 4] = [
        (PRICE_SELECTORS, 1, "price_element"),
        (CART_SELECTORS, 2, "cart_button"),
        (VARIANT_SELECTORS, 1, "variants"),
        (GALLERY_SELECTORS, 1, "gallery"),
    ];
    for (selectors, weight, name) in checks {
        if any_match(document, selectors) {
            score += weight;
            signals.push(name.to_string());
        }
    }

    if crate::domain::services::extraction_service::has_json_ld_product(document) {
        score += 3;
        signals.push("schema_product".to_string());
    }

    ProductPageSignal {
        is_product: score >= 3,
        confidence: (score as f64 / 10.0).min(1.0),
        signals,
    }
}

/// `-p-123` 形式的商品ID后缀
fn product_id_suffix(url: &str) -> bool {
    url.match_indices("-p-").any(|(idx, _)| {
        url[idx + 3..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}
