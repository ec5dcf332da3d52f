// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::models::platform::Platform;
use crate::domain::models::product::ProductData;

/// 抓取页面实体
///
/// 一个任务内单个URL的提取结果，写入后不可修改。
/// 即使没有提取到任何字段，也会以 0 质量分记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPage {
    /// 页面唯一标识符
    pub id: Uuid,
    /// 所属任务ID
    pub job_id: Uuid,
    /// 请求的URL
    pub url: String,
    /// 跳转后的最终URL
    pub final_url: Option<String>,
    /// HTTP状态码，从未成功获取时为空
    pub http_status: Option<u16>,
    /// 识别出的平台
    pub platform: Platform,
    /// 平台识别置信度 [0, 1]
    pub platform_confidence: f64,
    /// 是否为商品页
    pub is_product_page: bool,
    /// 提取出的字段
    pub fields: ProductData,
    /// 数据质量分 [0, 1]
    pub quality_score: f64,
    /// 响应体 sha256
    pub content_hash: Option<String>,
    /// 使用的引擎名
    pub fetched_with: Option<String>,
    /// 响应时间（毫秒）
    pub response_time_ms: Option<u64>,
    /// 每次尝试的记录
    pub attempts: Vec<AttemptRecord>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 单次抓取尝试记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 第几次尝试，从 1 开始
    pub attempt: u32,
    pub engine: String,
    /// 使用的代理标识，直连为空
    pub proxy: Option<String>,
    /// 请求前等待的毫秒数
    pub delay_ms: f64,
    pub outcome: AttemptOutcome,
}

/// 尝试结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// 获取并完成提取
    Extracted { quality_score: f64, fallback: bool },
    /// 被目标站点拦截
    Blocked { signal: String },
    /// 网络或服务端错误
    NetworkError { message: String },
    /// 不可重试的 HTTP 状态
    HttpError { status: u16 },
}

impl ScrapedPage {
    /// 创建一个尚未填充抓取结果的页面
    ///
    /// # 参数
    ///
    /// * `job_id` - 所属任务ID
    /// * `url` - 请求的URL
    pub fn new(job_id: Uuid, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            url: url.into(),
            final_url: None,
            http_status: None,
            platform: Platform::Generic,
            platform_confidence: 0.0,
            is_product_page: false,
            fields: ProductData::default(),
            quality_score: 0.0,
            content_hash: None,
            fetched_with: None,
            response_time_ms: None,
            attempts: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// 计算响应体哈希
    pub fn hash_content(content: &str) -> String {
        hex::encode(Sha256::digest(content.as_bytes()))
    }
}
