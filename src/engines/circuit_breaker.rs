// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, gauge};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// 熔断器配置
#[derive(Clone, Debug)]
pub struct CircuitConfig {
    /// 时间窗口内的失败阈值
    pub failure_threshold: u32,
    /// 打开后多久进入半开状态
    pub recovery_timeout: Duration,
    /// 失败时间窗口
    pub failure_window: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            failure_window: Duration::from_secs(60),
        }
    }
}

/// 熔断器状态枚举
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Closed,
    Open,
    /// 放行一次探测请求
    HalfOpen,
}

#[derive(Debug)]
struct EngineCircuit {
    status: Status,
    failures: VecDeque<Instant>,
    opened_at: Option<Instant>,
    total_failures: u64,
    total_successes: u64,
}

impl EngineCircuit {
    fn new() -> Self {
        Self {
            status: Status::Closed,
            failures: VecDeque::new(),
            opened_at: None,
            total_failures: 0,
            total_successes: 0,
        }
    }
}

/// 熔断器统计信息
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CircuitStats {
    pub is_open: bool,
    /// 时间窗口内的失败次数
    pub failure_count: u32,
    pub total_failures: u64,
    pub total_successes: u64,
}

/// 按引擎划分的熔断器
///
/// 引擎在窗口内连续失败达到阈值后打开，恢复超时后放行一次探测
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<&'static str, EngineCircuit>>,
    config: CircuitConfig,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// 检查熔断器是否打开
    ///
    /// 打开状态超过恢复时间后转为半开并返回 false
    pub fn is_open(&self, engine: &'static str) -> bool {
        let mut circuits = self.circuits.lock();
        let circuit = circuits.entry(engine).or_insert_with(EngineCircuit::new);

        match circuit.status {
            Status::Closed | Status::HalfOpen => false,
            Status::Open => {
                let recovered = circuit
                    .opened_at
                    .is_some_and(|opened| opened.elapsed() >= self.config.recovery_timeout);
                if recovered {
                    circuit.status = Status::HalfOpen;
                    publish_status(engine, Status::HalfOpen);
                    return false;
                }
                counter!("circuit_breaker_rejected_total", "engine" => engine).increment(1);
                true
            }
        }
    }

    pub fn record_success(&self, engine: &'static str) {
        let mut circuits = self.circuits.lock();
        let circuit = circuits.entry(engine).or_insert_with(EngineCircuit::new);
        circuit.total_successes += 1;
        counter!("circuit_breaker_successes_total", "engine" => engine).increment(1);

        if circuit.status != Status::Closed {
            circuit.status = Status::Closed;
            circuit.failures.clear();
            circuit.opened_at = None;
            publish_status(engine, Status::Closed);
        }
    }

    pub fn record_failure(&self, engine: &'static str) {
        let now = Instant::now();
        let mut circuits = self.circuits.lock();
        let circuit = circuits.entry(engine).or_insert_with(EngineCircuit::new);
        circuit.total_failures += 1;
        circuit.failures.push_back(now);
        counter!("circuit_breaker_failures_total", "engine" => engine).increment(1);

        while let Some(front) = circuit.failures.front() {
            if now.duration_since(*front) > self.config.failure_window {
                circuit.failures.pop_front();
            } else {
                break;
            }
        }

        let trip = match circuit.status {
            Status::Closed => circuit.failures.len() >= self.config.failure_threshold as usize,
            Status::HalfOpen => true,
            Status::Open => false,
        };
        if trip {
            circuit.status = Status::Open;
            circuit.opened_at = Some(now);
            publish_status(engine, Status::Open);
        }
    }

    pub fn status(&self, engine: &'static str) -> Status {
        self.circuits
            .lock()
            .get(engine)
            .map_or(Status::Closed, |c| c.status)
    }

    pub fn stats(&self, engine: &'static str) -> CircuitStats {
        self.circuits
            .lock()
            .get(engine)
            .map(|c| CircuitStats {
                is_open: c.status == Status::Open,
                failure_count: c.failures.len() as u32,
                total_failures: c.total_failures,
                total_successes: c.total_successes,
            })
            .unwrap_or_default()
    }
}

fn publish_status(engine: &'static str, status: Status) {
    let value = match status {
        Status::Closed => 0.0,
        Status::Open => 1.0,
        Status::HalfOpen => 0.5,
    };
    gauge!("circuit_breaker_status", "engine" => engine).set(value);
}
