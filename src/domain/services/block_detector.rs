// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// 反爬防护厂商
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockVendor {
    Cloudflare,
    Recaptcha,
    Hcaptcha,
    Imperva,
    Datadome,
    Akamai,
    PerimeterX,
    /// 无法归类的访问拒绝页
    AccessDenied,
}

impl BlockVendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockVendor::Cloudflare => "cloudflare",
            BlockVendor::Recaptcha => "recaptcha",
            BlockVendor::Hcaptcha => "hcaptcha",
            BlockVendor::Imperva => "imperva",
            BlockVendor::Datadome => "datadome",
            BlockVendor::Akamai => "akamai",
            BlockVendor::PerimeterX => "perimeterx",
            BlockVendor::AccessDenied => "access_denied",
        }
    }

    /// 需要执行 JS 才能通过的挑战
    pub fn is_js_challenge(&self) -> bool {
        matches!(
            self,
            BlockVendor::Cloudflare | BlockVendor::Datadome | BlockVendor::PerimeterX | BlockVendor::Imperva
        )
    }
}

/// 拦截信号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockSignal {
    Http403,
    Http429,
    /// 验证码或反爬挑战页
    Captcha { vendor: BlockVendor },
    /// 跳转到了目标站点之外或挑战路径
    AbnormalRedirect { final_url: String },
}

impl BlockSignal {
    pub fn as_str(&self) -> String {
        match self {
            BlockSignal::Http403 => "http_403".to_string(),
            BlockSignal::Http429 => "http_429".to_string(),
            BlockSignal::Captcha { vendor } => format!("captcha_{}", vendor.as_str()),
            BlockSignal::AbnormalRedirect { .. } => "abnormal_redirect".to_string(),
        }
    }

    pub fn is_js_challenge(&self) -> bool {
        matches!(self, BlockSignal::Captcha { vendor } if vendor.is_js_challenge())
    }
}

impl fmt::Display for BlockSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSignal::AbnormalRedirect { final_url } => {
                write!(f, "abnormal_redirect to {}", final_url)
            }
            other => f.write_str(&other.as_str()),
        }
    }
}

/// 拦截后的规避策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvasionStrategy {
    pub rotate_proxy: bool,
    pub rotate_identity: bool,
    pub escalate_to_browser: bool,
    /// 在常规间隔之外额外等待的毫秒数
    pub extra_delay_ms: u64,
}

/// 根据拦截信号选择规避策略
pub fn evasion_strategy(signal: &BlockSignal) -> EvasionStrategy {
    match signal {
        BlockSignal::Http403 => EvasionStrategy {
            rotate_proxy: true,
            rotate_identity: true,
            escalate_to_browser: false,
            extra_delay_ms: 0,
        },
        BlockSignal::Http429 => EvasionStrategy {
            rotate_proxy: true,
            rotate_identity: false,
            escalate_to_browser: false,
            extra_delay_ms: 10_000,
        },
        BlockSignal::Captcha { vendor } => EvasionStrategy {
            rotate_proxy: true,
            rotate_identity: true,
            escalate_to_browser: vendor.is_js_challenge()
                || matches!(vendor, BlockVendor::Recaptcha | BlockVendor::Hcaptcha),
            extra_delay_ms: if vendor.is_js_challenge() { 5_000 } else { 0 },
        },
        BlockSignal::AbnormalRedirect { .. } => EvasionStrategy {
            rotate_proxy: true,
            rotate_identity: true,
            escalate_to_browser: false,
            extra_delay_ms: 0,
        },
    }
}

/// 挑战页特征，2xx 页面也会检查，只收录不会出现在正常商品页里的片段
const CHALLENGE_MARKERS: &[(BlockVendor, &[&str])] = &[
    (
        BlockVendor::Cloudflare,
        &["cf-chl-", "checking your browser before accessing", "cf_chl_opt", "attention required! | cloudflare"],
    ),
    (BlockVendor::Datadome, &["captcha-delivery.com", "blocked by security policy"]),
    (BlockVendor::PerimeterX, &["px-captcha"]),
    (BlockVendor::Imperva, &["incapsula incident id"]),
    (BlockVendor::Akamai, &["reference&#32;&#35;18", "reference #18"]),
    (BlockVendor::Hcaptcha, &["hcaptcha.com/1/api.js", "h-captcha"]),
    (BlockVendor::Recaptcha, &["i'm not a robot", "verify you are human", "please complete the security check"]),
];

/// 拒绝页宽松特征，只在 4xx/5xx 响应上使用
const DENIAL_MARKERS: &[(BlockVendor, &[&str])] = &[
    (BlockVendor::Cloudflare, &["cloudflare", "cf-ray", "ddos protection"]),
    (BlockVendor::Datadome, &["datadome"]),
    (BlockVendor::Imperva, &["imperva", "incapsula", "_incap_"]),
    (BlockVendor::PerimeterX, &["perimeterx", "_pxhd"]),
    (BlockVendor::Akamai, &["akamai"]),
    (BlockVendor::Recaptcha, &["g-recaptcha", "grecaptcha", "recaptcha"]),
    (BlockVendor::Hcaptcha, &["hcaptcha"]),
    (
        BlockVendor::AccessDenied,
        &["access denied", "your request has been blocked", "suspicious activity", "request blocked"],
    ),
];

const REDIRECT_PATH_MARKERS: &[&str] = &["challenge", "captcha", "blocked", "denied", "/cdn-cgi/"];

/// 检查响应是否被拦截
///
/// # 参数
///
/// * `status` - HTTP 状态码
/// * `body` - 响应体
/// * `headers` - 响应头
/// * `requested_url` - 请求的URL
/// * `final_url` - 跟随跳转后的URL
pub fn detect_block(
    status: u16,
    body: &str,
    headers: &HashMap<String, String>,
    requested_url: &str,
    final_url: &str,
) -> Option<BlockSignal> {
    let body_lower = body.to_lowercase();

    if let Some(vendor) = find_vendor(&body_lower, CHALLENGE_MARKERS) {
        return Some(BlockSignal::Captcha { vendor });
    }

    if status == 403 || status == 429 || status == 503 {
        let vendor = find_vendor(&body_lower, DENIAL_MARKERS).or_else(|| header_vendor(headers));
        match (status, vendor) {
            (429, _) => return Some(BlockSignal::Http429),
            (_, Some(vendor)) if vendor != BlockVendor::AccessDenied || status == 503 => {
                return Some(BlockSignal::Captcha { vendor });
            }
            (403, _) => return Some(BlockSignal::Http403),
            _ => {}
        }
    }

    if is_abnormal_redirect(requested_url, final_url) {
        return Some(BlockSignal::AbnormalRedirect {
            final_url: final_url.to_string(),
        });
    }

    None
}

fn find_vendor(body_lower: &str, table: &[(BlockVendor, &[&str])]) -> Option<BlockVendor> {
    table
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| body_lower.contains(m)))
        .map(|(vendor, _)| *vendor)
}

fn header_vendor(headers: &HashMap<String, String>) -> Option<BlockVendor> {
    headers.iter().find_map(|(name, value)| {
        let name = name.to_lowercase();
        let value = value.to_lowercase();
        if name == "cf-ray" || (name == "server" && value.contains("cloudflare")) {
            Some(BlockVendor::Cloudflare)
        } else if name.starts_with("x-akamai") {
            Some(BlockVendor::Akamai)
        } else if name == "x-datadome" || name == "x-dd-b" {
            Some(BlockVendor::Datadome)
        } else if name == "x-iinfo" || value.contains("incap_ses") {
            Some(BlockVendor::Imperva)
        } else {
            None
        }
    })
}

/// 最终地址落在请求域名之外，或路径带有挑战标记
pub fn is_abnormal_redirect(requested_url: &str, final_url: &str) -> bool {
    let (Ok(requested), Ok(landed)) = (Url::parse(requested_url), Url::parse(final_url)) else {
        return false;
    };
    if requested == landed {
        return false;
    }

    let (Some(requested_host), Some(landed_host)) = (requested.host_str(), landed.host_str()) else {
        return false;
    };
    if registrable_domain(requested_host) != registrable_domain(landed_host) {
        return true;
    }

    let requested_path = requested.path().to_lowercase();
    let landed_path = landed.path().to_lowercase();
    REDIRECT_PATH_MARKERS
        .iter()
        .any(|marker| landed_path.contains(marker) && !requested_path.contains(marker))
}

/// 可注册域名的近似：取最后两段，二级后缀（co.uk 之类）取最后三段
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 || host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }
    let second_level = labels[labels.len() - 2];
    let keep = if matches!(second_level, "co" | "com" | "net" | "org" | "gov" | "ac" | "edu")
        && labels[labels.len() - 1].len() == 2
    {
        3
    } else {
        2
    };
    labels[labels.len().saturating_sub(keep)..].join(".")
}
