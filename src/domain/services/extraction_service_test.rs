// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::*;
use crate::domain::models::product::Availability;
use crate::domain::services::normalizer::quality_score;
use crate::domain::services::platform_detector::{
    detect_platform, SHOPIFY_SELECTORS, WOOCOMMERCE_SELECTORS,
};

const SHOPIFY_PRODUCT: &str = r#"<html><head>
<title>Ceramic Mug | Acme</title>
<script src="https://cdn.shopify.com/s/files/1/theme.js"></script>
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@type": "Product",
  "name": "Ceramic Mug",
  "description": "A hand-glazed stoneware mug that holds 350ml, keeps coffee warm for longer and survives the dishwasher without losing its shine.",
  "brand": {"@type": "Brand", "name": "Acme"},
  "sku": "MUG-001",
  "image": ["https://cdn.shopify.com/mug-1.jpg", "https://cdn.shopify.com/mug-2.jpg"],
  "offers": {
    "@type": "Offer",
    "price": "24.00",
    "priceCurrency": "USD",
    "availability": "https://schema.org/InStock"
  },
  "aggregateRating": {"@type": "AggregateRating", "ratingValue": "4.6", "reviewCount": "128"}
}
</script>
</head><body>
<div id="shopify-section-main" class="shopify-section">
  <nav class="breadcrumb"><a href="/">Home</a><a href="/collections/kitchen">Kitchen</a><a href="/collections/mugs">Mugs</a></nav>
  <div class="product" data-product-id="42">
    <h1 class="product-title">Ceramic Mug</h1>
    <span class="product__price">$24.00</span>
    <span class="compare-at-price">$30.00</span>
    <div class="product-variants">
      <select name="options[Size]"><option>Choose a size</option><option>Small</option><option>Large</option></select>
    </div>
  </div>
</div>
</body></html>"#;

fn detection_for(platform: Platform, selectors: &'static SelectorSet) -> PlatformDetection {
    PlatformDetection {
        platform,
        confidence: 0.5,
        selectors,
        features: Vec::new(),
    }
}

#[test]
fn test_shopify_product_scores_high() {
    let url = "https://shop.example.com/products/ceramic-mug";
    let detection = detect_platform(SHOPIFY_PRODUCT, url);
    assert_eq!(detection.platform, Platform::Shopify);

    let data = extract(SHOPIFY_PRODUCT, url, &detection).unwrap();

    assert_eq!(data.name.as_deref(), Some("Ceramic Mug"));
    assert_eq!(data.price, Some(24.0));
    assert_eq!(data.original_price, Some(30.0));
    assert_eq!(data.discount_percentage, Some(20.0));
    assert_eq!(data.currency.as_deref(), Some("USD"));
    assert_eq!(data.brand.as_deref(), Some("Acme"));
    assert_eq!(data.sku.as_deref(), Some("MUG-001"));
    assert_eq!(data.category.as_deref(), Some("Kitchen > Mugs"));
    assert_eq!(data.availability, Some(Availability::InStock));
    assert_eq!(data.images.len(), 2);
    assert_eq!(data.variants.len(), 1);
    assert_eq!(data.variants[0].name, "Size");
    assert_eq!(data.variants[0].options, vec!["Small", "Large"]);
    let reviews = data.reviews.clone().unwrap();
    assert_eq!(reviews.rating, Some(4.6));
    assert_eq!(reviews.count, Some(128));
    assert!(data.has_structured_data);

    assert!(quality_score(&data) > 0.6);
}

#[test]
fn test_woocommerce_sale_price_from_dom() {
    let html = r#"<html><body><div class="product">
        <h1 class="product_title">Linen Apron</h1>
        <p class="price">
          <del><span class="woocommerce-Price-amount">&pound;40.00</span></del>
          <ins><span class="woocommerce-Price-amount">&pound;30.00</span></ins>
        </p>
        <p class="stock in-stock">In stock</p>
        <div class="product_meta"><span class="sku">apr-77</span></div>
        <table class="shop_attributes">
          <tr><th>Material</th><td>Linen</td></tr>
          <tr><th>Colour:</th><td>Sand</td></tr>
        </table>
    </div></body></html>"#;
    let detection = detection_for(Platform::WooCommerce, &WOOCOMMERCE_SELECTORS);

    let data = extract(html, "https://shop.example.co.uk/product/apron", &detection).unwrap();

    assert_eq!(data.name.as_deref(), Some("Linen Apron"));
    assert_eq!(data.price, Some(30.0));
    assert_eq!(data.original_price, Some(40.0));
    assert_eq!(data.discount_percentage, Some(25.0));
    assert_eq!(data.currency.as_deref(), Some("GBP"));
    assert_eq!(data.availability, Some(Availability::InStock));
    assert_eq!(data.sku.as_deref(), Some("APR-77"));
    assert_eq!(data.attributes.get("Material").map(String::as_str), Some("Linen"));
    assert_eq!(data.attributes.get("Colour").map(String::as_str), Some("Sand"));
    assert!(!data.has_structured_data);
}

#[test]
fn test_parse_error_when_platform_selectors_miss() {
    let html = r#"<html><head><meta property="og:title" content="Gift Card"></head>
        <body><div class="banner">Welcome</div></body></html>"#;
    let detection = detection_for(Platform::Shopify, &SHOPIFY_SELECTORS);

    let error = extract(html, "https://shop.example.com/products/gift", &detection).unwrap_err();
    assert_eq!(error.kind(), "parse");

    let data = extract_generic(html, "https://shop.example.com/products/gift");
    assert_eq!(data.name.as_deref(), Some("Gift Card"));
}

#[test]
fn test_empty_page_yields_empty_product() {
    let data = extract_generic("<html><body></body></html>", "https://example.com/");
    assert!(data.is_empty());
    assert_eq!(quality_score(&data), 0.0);
}

#[test]
fn test_json_ld_graph_with_offer_list() {
    let html = r#"<html><head><script type="application/ld+json">
    {"@context":"https://schema.org","@graph":[
      {"@type":"WebSite","name":"Example"},
      {"@type":["Product"],"name":"Trail Shoe &amp; Sock",
       "image":{"@type":"ImageObject","url":"/img/shoe.jpg"},
       "offers":[
         {"@type":"Offer","price":129.5,"priceCurrency":"EUR","availability":"https://schema.org/PreOrder"},
         {"@type":"Offer","price":"99,90","priceCurrency":"EUR"}
       ]}
    ]}
    </script></head><body></body></html>"#;
    let document = Html::parse_document(html);
    assert!(has_json_ld_product(&document));

    let data = extract_generic(html, "https://store.example.de/p/shoe");
    assert_eq!(data.name.as_deref(), Some("Trail Shoe & Sock"));
    assert_eq!(data.price, Some(99.9));
    assert_eq!(data.currency.as_deref(), Some("EUR"));
    assert_eq!(data.availability, Some(Availability::PreOrder));
    assert_eq!(data.images, vec!["https://store.example.de/img/shoe.jpg"]);
}

#[test]
fn test_aggregate_offer_low_price() {
    let html = r#"<script type="application/ld+json">
    {"@type":"Product","name":"Desk","offers":{"@type":"AggregateOffer","lowPrice":"199.00","highPrice":"349.00","priceCurrency":"USD"}}
    </script>"#;
    let data = extract_generic(html, "https://example.com/products/desk");
    assert_eq!(data.price, Some(199.0));
    assert_eq!(data.original_price, None);
}

#[test]
fn test_malformed_json_ld_is_ignored() {
    let html = r#"<html><head><script type="application/ld+json">{"@type": "Product", </script></head>
        <body><h1>Plain Title</h1><span class="price">$5.00</span></body></html>"#;
    let document = Html::parse_document(html);
    assert!(!has_json_ld_product(&document));

    let data = extract_generic(html, "https://example.com/item/1");
    assert_eq!(data.name.as_deref(), Some("Plain Title"));
    assert_eq!(data.price, Some(5.0));
    assert!(!data.has_structured_data);
}

#[test]
fn test_lazy_images_are_resolved() {
    let html = r#"<html><body><div class="gallery">
        <img src="data:image/gif;base64,R0lGOD" data-src="/img/a.jpg">
        <img data-lazy="/img/b.jpg">
        <img src="/img/a.jpg">
    </div></body></html>"#;
    let data = extract_generic(html, "https://shop.example.com/p/1");
    assert_eq!(
        data.images,
        vec![
            "https://shop.example.com/img/a.jpg",
            "https://shop.example.com/img/b.jpg"
        ]
    );
}

#[test]
fn test_reviews_from_text() {
    let html = r#"<html><body><h1>Lamp</h1>
        <div class="reviews">Rated 4.5 out of 5 based on 1,212 reviews</div></body></html>"#;
    let data = extract_generic(html, "https://example.com/products/lamp");
    let reviews = data.reviews.unwrap();
    assert_eq!(reviews.rating, Some(4.5));
    assert_eq!(reviews.count, Some(1212));
}

#[test]
fn test_sku_from_body_text() {
    let html = r#"<html><body><h1>Lamp</h1><p>Item details. SKU: lmp-204 ships fast</p></body></html>"#;
    let data = extract_generic(html, "https://example.com/products/lamp");
    assert_eq!(data.sku.as_deref(), Some("LMP-204"));
}

#[test]
fn test_body_text_skips_scripts() {
    let html = r#"<html><body><p>Visible copy</p><script>var hidden = 1;</script></body></html>"#;
    let data = extract_generic(html, "https://example.com/");
    assert_eq!(data.text.as_deref(), Some("Visible copy"));
}

#[test]
fn test_discover_product_links() {
    let html = r##"<html><body>
        <a href="/products/mug#reviews">Mug</a>
        <a href="/products/mug">Mug again</a>
        <a href="https://shop.example.com/products/plate">Plate</a>
        <a href="https://other.example.com/products/bowl">Elsewhere</a>
        <a href="/collections/all">All</a>
        <a href="/products/cup">Cup</a>
        <a href="mailto:hi@example.com">Mail</a>
    </body></html>"##;

    let links = discover_product_links(html, "https://shop.example.com/collections/all", 10);
    assert_eq!(
        links,
        vec![
            "https://shop.example.com/products/mug",
            "https://shop.example.com/products/plate",
            "https://shop.example.com/products/cup",
        ]
    );

    let limited = discover_product_links(html, "https://shop.example.com/collections/all", 1);
    assert_eq!(limited.len(), 1);
}

#[test]
fn test_discover_excludes_current_page() {
    let html = r#"<a href="/products/mug">self</a><a href="/products/cup">cup</a>"#;
    let links = discover_product_links(html, "https://shop.example.com/products/mug", 5);
    assert_eq!(links, vec!["https://shop.example.com/products/cup"]);
}
