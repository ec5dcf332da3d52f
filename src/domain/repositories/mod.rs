// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 领域层只依赖这些接口，具体实现由基础设施层的 SeaORM 仓库提供。
///
/// - 抓取任务仓库（scrape_job_repository）：任务的持久化与租约领取
/// - 抓取页面仓库（scraped_page_repository）：页面提取结果
/// - 代理记录仓库（proxy_record_repository）：代理健康状态
/// - 域名健康仓库（domain_health_repository）：按域名的请求统计
pub mod domain_health_repository;
pub mod proxy_record_repository;
pub mod scrape_job_repository;
pub mod scraped_page_repository;
