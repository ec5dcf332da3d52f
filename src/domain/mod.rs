// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// - 领域模型（models）：任务、页面、商品、代理和域名统计
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：抓取、提取和反检测逻辑
///
/// 领域层不依赖具体的数据库和 HTTP 实现
pub mod models;
pub mod repositories;
pub mod services;
