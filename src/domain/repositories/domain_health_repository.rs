// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use crate::domain::models::domain_health::DomainHealth;
use crate::utils::errors::RepositoryError;

/// 域名健康仓库特质
#[async_trait]
pub trait DomainHealthRepository: Send + Sync {
    /// 按域名插入或覆盖
    async fn upsert(&self, health: &DomainHealth) -> Result<(), RepositoryError>;
    async fn find_by_domain(&self, domain: &str) -> Result<Option<DomainHealth>, RepositoryError>;
    async fn list(&self) -> Result<Vec<DomainHealth>, RepositoryError>;
}
