// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 集成测试主模块
///
/// 基于内存 SQLite 和迁移后的真实表结构，覆盖仓库、HTTP 接口和 worker 全流程
mod api_tests;
mod health_check;
mod helpers;
mod proxy_health_tests;
mod repository_tests;
mod worker_tests;
