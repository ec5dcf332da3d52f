// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 反检测（anti_detection）：请求间隔和浏览器身份
/// - 拦截检测（block_detector）：识别验证码、限流和拒绝页
/// - 提取服务（extraction_service）：JSON-LD 和选择器提取商品字段
/// - 规范化（normalizer）：价格、文本、可用性清洗和质量评分
/// - 平台识别（platform_detector）：识别电商平台和商品页
/// - 代理池（proxy_pool / proxy_provider / proxy_health）：代理选择、冷却、来源和健康检查
/// - 恢复编排（recovery_orchestrator）：单个任务的抓取状态机
pub mod anti_detection;
pub mod block_detector;
pub mod dom;
pub mod extraction_service;
pub mod normalizer;
pub mod platform_detector;
pub mod proxy_health;
pub mod proxy_pool;
pub mod proxy_provider;
pub mod recovery_orchestrator;
pub mod scrape_error;
