// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use async_trait::async_trait;

/// 后台工作器
///
/// `run` 是常驻循环，单个任务的失败在循环内部记录，只有无法继续时才返回错误
#[async_trait]
pub trait Worker: Send + Sync {
    async fn run(&self) -> Result<(), WorkerError>;

    /// 日志中使用的工作器名称
    fn name(&self) -> &str;
}
