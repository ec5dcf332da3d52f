// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;

use crate::domain::models::domain_health::DomainHealth;
use crate::domain::repositories::domain_health_repository::DomainHealthRepository;
use crate::domain::services::anti_detection::AntiDetectionManager;
use crate::presentation::errors::{ApiError, AppError};

/// 单个域名的健康统计
///
/// 优先返回内存中的最新值，其次是持久化的记录
pub async fn get_domain(
    Extension(anti_detection): Extension<Arc<AntiDetectionManager>>,
    Extension(repo): Extension<Arc<dyn DomainHealthRepository>>,
    Path(domain): Path<String>,
) -> Result<Json<DomainHealth>, AppError> {
    let domain = domain.trim().to_ascii_lowercase();
    if let Some(health) = anti_detection.health(&domain) {
        return Ok(Json(health));
    }
    repo.find_by_domain(&domain)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("domain {}", domain)).into())
}
