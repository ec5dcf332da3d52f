// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, Utc};
use metrics::gauge;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::settings::AntiDetectionSettings;
use crate::domain::models::proxy::{CooldownPolicy, ProxyEndpoint, ProxyRecord};
use crate::utils::clock::Clock;

/// 从代理池中挑选下一个代理
///
/// 只考虑冷却已结束且不在 `exclude` 中的代理，成功率最高者优先，
/// 成功率相同时选最久未使用的（从未使用过的最先）。
pub fn select_proxy<'a, I>(records: I, now: DateTime<Utc>, exclude: &[String]) -> Option<&'a ProxyRecord>
where
    I: IntoIterator<Item = &'a ProxyRecord>,
{
    records
        .into_iter()
        .filter(|record| record.is_available(now))
        .filter(|record| {
            let id = record.id();
            !exclude.iter().any(|excluded| *excluded == id)
        })
        .min_by(|a, b| {
            b.success_rate
                .total_cmp(&a.success_rate)
                .then_with(|| a.last_used_at.cmp(&b.last_used_at))
                .then_with(|| a.id().cmp(&b.id()))
        })
}

/// 进程内共享的代理池
///
/// 统计在内存中更新，调用方负责把返回的记录写回存储
pub struct ProxyPool {
    records: RwLock<HashMap<String, ProxyRecord>>,
    clock: Arc<dyn Clock>,
    cooldown: CooldownPolicy,
}

impl ProxyPool {
    pub fn new(clock: Arc<dyn Clock>, cooldown: CooldownPolicy) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            clock,
            cooldown,
        }
    }

    pub fn from_settings(settings: &AntiDetectionSettings, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            clock,
            CooldownPolicy {
                base: Duration::seconds(settings.proxy_cooldown_secs.max(1)),
                max: Duration::seconds(settings.proxy_max_cooldown_secs.max(1)),
            },
        )
    }

    /// 加入新端点，已存在的端点保留原有统计，返回新增数量
    pub fn add_endpoints(&self, endpoints: impl IntoIterator<Item = ProxyEndpoint>) -> usize {
        let mut records = self.records.write();
        let mut added = 0;
        for endpoint in endpoints {
            let id = endpoint.id();
            match records.get_mut(&id) {
                Some(existing) => existing.endpoint = endpoint,
                None => {
                    records.insert(id, ProxyRecord::new(endpoint));
                    added += 1;
                }
            }
        }
        drop(records);
        self.report_available();
        added
    }

    /// 恢复持久化的健康状态，只更新池中已有的端点
    pub fn restore(&self, persisted: impl IntoIterator<Item = ProxyRecord>) {
        let mut records = self.records.write();
        for record in persisted {
            if let Some(existing) = records.get_mut(&record.id()) {
                let endpoint = existing.endpoint.clone();
                *existing = ProxyRecord { endpoint, ..record };
            }
        }
        drop(records);
        self.report_available();
    }

    /// 选出代理并标记为已使用，没有可用代理时返回 None，请求直连
    pub fn acquire(&self, exclude: &[String]) -> Option<ProxyEndpoint> {
        let now = self.clock.now();
        let mut records = self.records.write();
        if records.is_empty() {
            return None;
        }

        let id = select_proxy(records.values(), now, exclude).map(ProxyRecord::id);
        match id.and_then(|id| records.get_mut(&id)) {
            Some(record) => {
                record.mark_used(now);
                debug!(proxy = %record.id(), success_rate = record.success_rate, "Selected proxy");
                Some(record.endpoint.clone())
            }
            None => {
                warn!(
                    pool_size = records.len(),
                    excluded = exclude.len(),
                    "No healthy proxy available, falling back to direct connection"
                );
                None
            }
        }
    }

    pub fn record_success(&self, id: &str) -> Option<ProxyRecord> {
        let now = self.clock.now();
        self.update(id, |record| record.record_success(now))
    }

    pub fn record_failure(&self, id: &str) -> Option<ProxyRecord> {
        let now = self.clock.now();
        let policy = self.cooldown;
        self.update(id, |record| record.record_failure(now, &policy))
    }

    /// 代理被拦截，立即进入冷却
    pub fn record_block(&self, id: &str) -> Option<ProxyRecord> {
        let now = self.clock.now();
        let policy = self.cooldown;
        let updated = self.update(id, |record| record.record_block(now, &policy));
        if let Some(record) = &updated {
            warn!(
                proxy = %record.id(),
                consecutive_failures = record.consecutive_failures,
                cooldown_until = ?record.cooldown_until,
                "Proxy blocked, cooling down"
            );
        }
        updated
    }

    fn update(&self, id: &str, apply: impl FnOnce(&mut ProxyRecord)) -> Option<ProxyRecord> {
        let updated = {
            let mut records = self.records.write();
            let record = records.get_mut(id)?;
            apply(record);
            record.clone()
        };
        self.report_available();
        Some(updated)
    }

    pub fn get(&self, id: &str) -> Option<ProxyRecord> {
        self.records.read().get(id).cloned()
    }

    /// 按 id 排序的全部代理记录
    pub fn snapshot(&self) -> Vec<ProxyRecord> {
        let mut records: Vec<ProxyRecord> = self.records.read().values().cloned().collect();
        records.sort_by_key(|record| record.id());
        records
    }

    /// 当前不在冷却中的代理
    pub fn available(&self) -> Vec<ProxyRecord> {
        let now = self.clock.now();
        self.snapshot()
            .into_iter()
            .filter(|record| record.is_available(now))
            .collect()
    }

    pub fn available_count(&self) -> usize {
        let now = self.clock.now();
        self.records
            .read()
            .values()
            .filter(|record| record.is_available(now))
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn report_available(&self) {
        gauge!("proxy_pool_available").set(self.available_count() as f64);
    }
}
