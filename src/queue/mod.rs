// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 基于数据库的抓取任务队列，负责入队、租约领取和终态写回
pub mod job_queue;
