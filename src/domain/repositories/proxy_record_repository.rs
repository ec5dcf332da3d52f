// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use crate::domain::models::proxy::ProxyRecord;
use crate::utils::errors::RepositoryError;

/// 代理记录仓库特质
#[async_trait]
pub trait ProxyRecordRepository: Send + Sync {
    /// 按代理标识插入或覆盖
    async fn upsert(&self, record: &ProxyRecord) -> Result<(), RepositoryError>;
    async fn list(&self) -> Result<Vec<ProxyRecord>, RepositoryError>;
}
