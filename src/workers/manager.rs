// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::recovery_orchestrator::RecoveryOrchestrator;
use crate::queue::job_queue::JobQueue;
use crate::workers::scrape_worker::ScrapeWorker;
use crate::workers::worker::Worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
pub struct WorkerManager {
    queue: Arc<dyn JobQueue>,
    orchestrator: Arc<RecoveryOrchestrator>,
    idle_poll: Duration,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        orchestrator: Arc<RecoveryOrchestrator>,
        idle_poll: Duration,
    ) -> Self {
        Self {
            queue,
            orchestrator,
            idle_poll,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量，至少为 1
    pub fn start_workers(&mut self, count: usize) {
        for _ in 0..count.max(1) {
            let worker = ScrapeWorker::new(self.queue.clone(), self.orchestrator.clone(), self.idle_poll);
            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!(worker = worker.name(), error = %e, "Worker exited");
                }
            });
            self.handles.push(handle);
        }
        info!(count = self.handles.len(), "Scrape workers started");
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        self.shutdown();
    }

    /// 中止所有工作进程，执行中的任务在租约过期后会被重新领取
    pub fn shutdown(&mut self) {
        info!("Shutting down workers...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Workers shut down successfully");
    }
}
