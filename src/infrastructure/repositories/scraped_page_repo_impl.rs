// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::scraped_page::ScrapedPage;
use crate::domain::repositories::scraped_page_repository::ScrapedPageRepository;
use crate::infrastructure::database::entities::scraped_page as page_entity;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 抓取页面仓库实现
pub struct ScrapedPageRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl ScrapedPageRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<page_entity::Model> for ScrapedPage {
    type Error = RepositoryError;

    fn try_from(model: page_entity::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            job_id: model.job_id,
            url: model.url,
            final_url: model.final_url,
            http_status: model.http_status.and_then(|status| u16::try_from(status).ok()),
            platform: model.platform.parse().unwrap_or_default(),
            platform_confidence: model.platform_confidence,
            is_product_page: model.is_product_page,
            fields: serde_json::from_value(model.fields)?,
            quality_score: model.quality_score,
            content_hash: model.content_hash,
            fetched_with: model.fetched_with,
            response_time_ms: model.response_time_ms.and_then(|ms| u64::try_from(ms).ok()),
            attempts: serde_json::from_value(model.attempts)?,
            created_at: model.created_at,
        })
    }
}

#[async_trait]
impl ScrapedPageRepository for ScrapedPageRepositoryImpl {
    async fn save(&self, page: &ScrapedPage) -> Result<ScrapedPage, RepositoryError> {
        let active_model = page_entity::ActiveModel {
            id: Set(page.id),
            job_id: Set(page.job_id),
            url: Set(page.url.clone()),
            final_url: Set(page.final_url.clone()),
            http_status: Set(page.http_status.map(i32::from)),
            platform: Set(page.platform.to_string()),
            platform_confidence: Set(page.platform_confidence),
            is_product_page: Set(page.is_product_page),
            fields: Set(serde_json::to_value(&page.fields)?),
            quality_score: Set(page.quality_score),
            content_hash: Set(page.content_hash.clone()),
            fetched_with: Set(page.fetched_with.clone()),
            response_time_ms: Set(page.response_time_ms.map(|ms| ms.min(i64::MAX as u64) as i64)),
            attempts: Set(serde_json::to_value(&page.attempts)?),
            created_at: Set(page.created_at),
        };

        let inserted = active_model.insert(self.db.as_ref()).await?;
        inserted.try_into()
    }

    async fn find_by_job_id(&self, job_id: Uuid) -> Result<Vec<ScrapedPage>, RepositoryError> {
        page_entity::Entity::find()
            .filter(page_entity::Column::JobId.eq(job_id))
            .order_by_asc(page_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(ScrapedPage::try_from)
            .collect()
    }
}
