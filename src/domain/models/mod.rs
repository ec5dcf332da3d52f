// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了抓取子系统的核心实体：
/// - 抓取任务（scrape_job）：一次抓取运行及其状态机
/// - 抓取页面（scraped_page）：单个URL的不可变提取结果
/// - 代理记录（proxy）：代理端点及其健康状态
/// - 域名健康（domain_health）：按域名滚动统计的请求结果
pub mod domain_health;
pub mod platform;
pub mod product;
pub mod proxy;
pub mod scrape_job;
pub mod scraped_page;
