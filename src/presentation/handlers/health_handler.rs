// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{extract::Extension, Json};
use std::sync::Arc;

use crate::application::dto::health_response::HealthResponseDto;
use crate::domain::services::anti_detection::AntiDetectionManager;
use crate::domain::services::proxy_pool::ProxyPool;

/// 健康检查端点
///
/// 汇总内存中的域名统计和代理池状态
pub async fn health_check(
    Extension(anti_detection): Extension<Arc<AntiDetectionManager>>,
    Extension(proxy_pool): Extension<Arc<ProxyPool>>,
) -> Json<HealthResponseDto> {
    let domains = anti_detection.snapshot();
    Json(HealthResponseDto::summarize(
        &domains,
        proxy_pool.len(),
        proxy_pool.available_count(),
    ))
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
