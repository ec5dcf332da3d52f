// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::proxy::ProxyRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 代理状态DTO
///
/// 只暴露是否带认证，不含用户名和密码
#[derive(Debug, Deserialize, Serialize)]
pub struct ProxyStatusDto {
    pub id: String,
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub authenticated: bool,
    pub available: bool,
    pub success_count: i64,
    pub failure_count: i64,
    pub consecutive_failures: i32,
    pub success_rate: f64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl ProxyStatusDto {
    pub fn from_record(record: ProxyRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id(),
            available: record.is_available(now),
            scheme: record.endpoint.scheme,
            host: record.endpoint.host,
            port: record.endpoint.port,
            authenticated: record.endpoint.credentials.is_some(),
            success_count: record.success_count,
            failure_count: record.failure_count,
            consecutive_failures: record.consecutive_failures,
            success_rate: record.success_rate,
            last_used_at: record.last_used_at,
            cooldown_until: record.cooldown_until,
        }
    }
}

/// 代理池状态响应DTO
#[derive(Debug, Deserialize, Serialize)]
pub struct ProxyPoolResponseDto {
    pub success: bool,
    pub total: usize,
    pub available: usize,
    pub data: Vec<ProxyStatusDto>,
}
