// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 从页面中提取的商品字段
///
/// 所有字段均为可选，部分提取是正常情况
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub currency: Option<String>,
    pub discount_percentage: Option<f64>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub availability: Option<Availability>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    pub reviews: Option<ReviewSummary>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// 页面正文摘要
    pub text: Option<String>,
    /// 是否来自 JSON-LD 结构化数据
    #[serde(default)]
    pub has_structured_data: bool,
}

impl ProductData {
    /// 是否没有提取到任何字段
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.brand.is_none()
            && self.sku.is_none()
            && self.category.is_none()
            && self.availability.is_none()
            && self.images.is_empty()
            && self.variants.is_empty()
            && self.reviews.is_none()
            && self.attributes.is_empty()
    }

    /// 用 `other` 填补当前缺失的字段，已有值保持不变
    pub fn merge_missing(&mut self, other: ProductData) {
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }

        fill(&mut self.name, other.name);
        fill(&mut self.price, other.price);
        fill(&mut self.original_price, other.original_price);
        fill(&mut self.currency, other.currency);
        fill(&mut self.discount_percentage, other.discount_percentage);
        fill(&mut self.description, other.description);
        fill(&mut self.brand, other.brand);
        fill(&mut self.sku, other.sku);
        fill(&mut self.category, other.category);
        fill(&mut self.availability, other.availability);
        fill(&mut self.reviews, other.reviews);
        fill(&mut self.text, other.text);
        if self.images.is_empty() {
            self.images = other.images;
        }
        if self.variants.is_empty() {
            self.variants = other.variants;
        }
        for (key, value) in other.attributes {
            self.attributes.entry(key).or_insert(value);
        }
        self.has_structured_data |= other.has_structured_data;
    }
}

/// 库存状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    OutOfStock,
    PreOrder,
    LimitedStock,
}

/// 商品规格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// 规格名，例如 Size
    pub name: String,
    pub options: Vec<String>,
}

/// 评价汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// 0-5 分
    pub rating: Option<f64>,
    pub count: Option<u32>,
}
