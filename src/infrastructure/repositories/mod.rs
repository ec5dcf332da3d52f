// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 领域仓库接口的 SeaORM 实现
pub mod domain_health_repo_impl;
pub mod proxy_record_repo_impl;
pub mod scrape_job_repo_impl;
pub mod scraped_page_repo_impl;
