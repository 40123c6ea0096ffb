//! 配置模块
//! 默认常量与运行时可覆盖的基准测试配置

use crate::error::{AppError, Result};
use std::time::Duration;

/// 缓存容量配置
pub const CACHE_CAPACITY: u64 = 7500;

/// 总Key数量
pub const TOTAL_KEYS: usize = 10_000;

/// 每次测试的操作数量
pub const WORKLOAD_SIZE: usize = 1_000;

/// Zipf分布参数
pub const ZIPF_S: f64 = 1.6;

/// 读操作比例
pub const READ_RATIO: f64 = 0.95;

/// 后端延迟范围（微秒）
pub const MIN_DELAY_US: u64 = 1000;
pub const MAX_DELAY_US: u64 = 2000;

/// 缓存容量上限，保证预分配与 `2 × capacity` 的预热 key 空间都不会溢出
pub const MAX_CACHE_CAPACITY: u64 = 10_000_000;

/// 覆盖缓存容量的环境变量
pub const CAPACITY_ENV: &str = "CACHE_CAPACITY";
pub const WORKLOAD_SIZE_ENV: &str = "LRU_BENCH_WORKLOAD_SIZE";
pub const ZIPF_S_ENV: &str = "LRU_BENCH_ZIPF_S";

/// 基准测试配置
pub mod bench {
    use super::*;

    /// 采样数量
    pub const SAMPLE_SIZE: usize = 20;

    /// 测量时间（秒）
    pub const MEASUREMENT_TIME_SECS: u64 = 10;

    /// 预热操作数量
    pub const WARMUP_SIZE: u64 = CACHE_CAPACITY;

    /// 预热种子
    pub const WARMUP_SEED: u64 = 123;

    /// 工作负载种子
    pub const WORKLOAD_SEED: u64 = 42;

    /// 模拟延迟种子
    pub const LATENCY_SEED: u64 = 7;

    /// 最小命中率目标（百分比）
    pub const MIN_HIT_RATE_TARGET: f64 = 85.0;

    /// criterion 要求的最小采样数
    pub const MIN_SAMPLE_SIZE: usize = 10;

    /// criterion 基准测试组名
    pub const GROUP_NAME: &str = "Single-Thread Cache + Compio Async IO";
}

/// 错误消息常量
pub mod messages {
    pub const RUNTIME_CREATE_FAILED: &str = "Failed to create Compio runtime";
    pub const WORKLOAD_GEN_FAILED: &str = "Failed to generate workload";
    pub const WARMUP_FAILED: &str = "Warmup operation failed";
    pub const CACHE_OPERATION_FAILED: &str = "Cache operation failed";
    pub const CONFIG_LOAD_FAILED: &str = "Failed to load benchmark configuration";
    pub const REPORT_FAILED: &str = "Failed to build benchmark report";
}

/// 运行时基准测试配置
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub cache_capacity: u64,
    pub total_keys: usize,
    pub workload_size: usize,
    pub zipf_s: f64,
    pub read_ratio: f64,
    pub min_delay_us: u64,
    pub max_delay_us: u64,
    pub sample_size: usize,
    pub measurement_time: Duration,
    pub warmup_size: u64,
    pub warmup_seed: u64,
    pub workload_seed: u64,
    pub latency_seed: u64,
    pub min_hit_rate_target: f64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            cache_capacity: CACHE_CAPACITY,
            total_keys: TOTAL_KEYS,
            workload_size: WORKLOAD_SIZE,
            zipf_s: ZIPF_S,
            read_ratio: READ_RATIO,
            min_delay_us: MIN_DELAY_US,
            max_delay_us: MAX_DELAY_US,
            sample_size: bench::SAMPLE_SIZE,
            measurement_time: Duration::from_secs(bench::MEASUREMENT_TIME_SECS),
            warmup_size: bench::WARMUP_SIZE,
            warmup_seed: bench::WARMUP_SEED,
            workload_seed: bench::WORKLOAD_SEED,
            latency_seed: bench::LATENCY_SEED,
            min_hit_rate_target: bench::MIN_HIT_RATE_TARGET,
        }
    }
}

impl BenchConfig {
    /// 从进程环境变量读取配置
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 使用给定的查找函数读取覆盖项，未设置的保持默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(capacity) = parse_var::<u64, _>(&lookup, CAPACITY_ENV)? {
            config.cache_capacity = capacity;
            // 预热量跟随容量
            config.warmup_size = capacity;
        }
        if let Some(size) = parse_var::<usize, _>(&lookup, WORKLOAD_SIZE_ENV)? {
            config.workload_size = size;
        }
        if let Some(s) = parse_var::<f64, _>(&lookup, ZIPF_S_ENV)? {
            config.zipf_s = s;
        }

        config.validate()?;
        Ok(config)
    }

    /// 校验配置取值范围
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(AppError::Config("cache capacity must be positive".into()));
        }
        if self.cache_capacity > MAX_CACHE_CAPACITY {
            return Err(AppError::Config(format!(
                "cache capacity must be at most {MAX_CACHE_CAPACITY}, got {}",
                self.cache_capacity
            )));
        }
        if self.warmup_size > MAX_CACHE_CAPACITY {
            return Err(AppError::Config(format!(
                "warmup size must be at most {MAX_CACHE_CAPACITY}, got {}",
                self.warmup_size
            )));
        }
        if self.total_keys == 0 {
            return Err(AppError::Config("total keys must be positive".into()));
        }
        if self.workload_size == 0 {
            return Err(AppError::Config("workload size must be positive".into()));
        }
        if self.zipf_s.is_nan() || self.zipf_s <= 0.0 {
            return Err(AppError::Config(format!(
                "zipf exponent must be positive, got {}",
                self.zipf_s
            )));
        }
        if !(0.0..=1.0).contains(&self.read_ratio) {
            return Err(AppError::Config(format!(
                "read ratio must be within [0, 1], got {}",
                self.read_ratio
            )));
        }
        if self.min_delay_us > self.max_delay_us {
            return Err(AppError::Config(format!(
                "delay range is inverted: {}us > {}us",
                self.min_delay_us, self.max_delay_us
            )));
        }
        if self.sample_size < bench::MIN_SAMPLE_SIZE {
            return Err(AppError::Config(format!(
                "sample size must be at least {}, got {}",
                bench::MIN_SAMPLE_SIZE,
                self.sample_size
            )));
        }
        Ok(())
    }

    /// 后端延迟范围（纳秒，闭区间）
    pub fn delay_range_ns(&self) -> std::ops::RangeInclusive<u64> {
        self.min_delay_us * 1000..=self.max_delay_us * 1000
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("invalid {key}={raw:?}: {e}"))),
    }
}
