// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 电商平台类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Shopify,
    WooCommerce,
    BigCommerce,
    Magento,
    PrestaShop,
    Squarespace,
    Wix,
    Square,
    /// 无法识别时的通用回退
    #[default]
    Generic,
}

impl Platform {
    /// 平台建议的每秒请求上限
    pub fn politeness(&self) -> f64 {
        match self {
            Platform::Shopify => 2.0,
            _ => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Shopify => "shopify",
            Platform::WooCommerce => "woocommerce",
            Platform::BigCommerce => "bigcommerce",
            Platform::Magento => "magento",
            Platform::PrestaShop => "prestashop",
            Platform::Squarespace => "squarespace",
            Platform::Wix => "wix",
            Platform::Square => "square",
            Platform::Generic => "generic",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shopify" => Ok(Platform::Shopify),
            "woocommerce" => Ok(Platform::WooCommerce),
            "bigcommerce" => Ok(Platform::BigCommerce),
            "magento" => Ok(Platform::Magento),
            "prestashop" => Ok(Platform::PrestaShop),
            "squarespace" => Ok(Platform::Squarespace),
            "wix" => Ok(Platform::Wix),
            "square" => Ok(Platform::Square),
            "generic" => Ok(Platform::Generic),
            _ => Err(()),
        }
    }
}
