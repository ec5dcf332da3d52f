// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{extract::Extension, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::application::dto::proxy_response::{ProxyPoolResponseDto, ProxyStatusDto};
use crate::domain::services::proxy_pool::ProxyPool;

/// 代理池状态，不含认证信息
pub async fn list_proxies(Extension(proxy_pool): Extension<Arc<ProxyPool>>) -> Json<ProxyPoolResponseDto> {
    let now = Utc::now();
    let data: Vec<ProxyStatusDto> = proxy_pool
        .snapshot()
        .into_iter()
        .map(|record| ProxyStatusDto::from_record(record, now))
        .collect();

    Json(ProxyPoolResponseDto {
        success: true,
        total: data.len(),
        available: data.iter().filter(|proxy| proxy.available).count(),
        data,
    })
}
