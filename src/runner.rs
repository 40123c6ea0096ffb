//! 缓存运行模块
//! 在 compio 运行时上驱动工作负载，并统计命中率

use crate::cache::{Backend, CacheOps};
use crate::config::{BenchConfig, messages};
use crate::error::{AppError, ErrorContext, Result};
use crate::workload::Op;
use rand::prelude::*;
use rand::rngs::SmallRng;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// 模拟后端延迟
#[inline]
pub async fn simulate_backend_latency(rng: &mut SmallRng, config: &BenchConfig) {
    let delay_ns = rng.random_range(config.delay_range_ns());
    compio::time::sleep(Duration::from_nanos(delay_ns)).await;
}

/// 创建新的 compio 运行时
pub fn new_runtime() -> Result<compio::runtime::Runtime> {
    compio::runtime::Runtime::new().map_err(|e| AppError::RuntimeCreate(e.to_string()))
}

/// 命中统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitStats {
    pub hits: u64,
    pub misses: u64,
}

impl HitStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// 命中率（百分比），无读操作时为 0
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

/// 通用缓存运行器
pub struct CacheRunner;

impl CacheRunner {
    /// 运行工作负载：读未命中和写操作都要经过模拟后端
    pub async fn run<C: CacheOps + ?Sized>(
        cache: &mut C,
        ops: &[Op],
        config: &BenchConfig,
    ) -> HitStats {
        let mut backend_rng = SmallRng::seed_from_u64(config.latency_seed);
        let mut stats = HitStats::default();

        for op in ops {
            match *op {
                Op::Read(key) => {
                    if cache.get(&key).is_some() {
                        stats.hits += 1;
                    } else {
                        stats.misses += 1;
                        simulate_backend_latency(&mut backend_rng, config).await;
                        cache.insert(key, key);
                    }
                }
                Op::Write(key, value) => {
                    simulate_backend_latency(&mut backend_rng, config).await;
                    cache.insert(key, value);
                }
            }
        }

        stats
    }
}

/// 单个后端的校准结果
#[derive(Debug, Clone)]
pub struct CalibrationEntry {
    pub backend: Backend,
    pub stats: HitStats,
}

/// 命中率校准检查
#[derive(Debug, Clone)]
pub struct Calibration {
    pub entries: Vec<CalibrationEntry>,
    pub target: f64,
}

impl Calibration {
    /// 每个后端用全新缓存跑一遍工作负载（不预热）
    pub fn run(config: &BenchConfig, ops: &[Op]) -> Result<Self> {
        let runtime = new_runtime().with_context(messages::RUNTIME_CREATE_FAILED)?;

        let mut entries = Vec::with_capacity(Backend::ALL.len());
        for backend in Backend::ALL {
            let mut cache = backend.build(config)?;
            let stats = runtime.block_on(CacheRunner::run(&mut cache, ops, config));
            debug!(
                backend = backend.bench_id(),
                hits = stats.hits,
                misses = stats.misses,
                "calibration run finished"
            );
            entries.push(CalibrationEntry { backend, stats });
        }

        let calibration = Self {
            entries,
            target: config.min_hit_rate_target,
        };
        if calibration.below_target() {
            warn!(target_rate = calibration.target, "hit rate below target");
        }
        Ok(calibration)
    }

    pub fn below_target(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.stats.hit_rate() < self.target)
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Warmup & Calibration Check ===")?;
        for entry in &self.entries {
            writeln!(
                f,
                "{} Hit Rate: {:.2}% (Hits: {}, Misses: {})",
                entry.backend.label(),
                entry.stats.hit_rate(),
                entry.stats.hits,
                entry.stats.misses
            )?;
        }
        if self.below_target() {
            writeln!(
                f,
                "WARNING: Hit rate is below target. Adjust ZIPF_S or CACHE_CAPACITY."
            )?;
        }
        write!(f, "==================================")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::WorkloadGenerator;

    fn instant_config() -> BenchConfig {
        BenchConfig {
            cache_capacity: 100,
            warmup_size: 100,
            total_keys: 500,
            workload_size: 300,
            min_delay_us: 0,
            max_delay_us: 0,
            ..BenchConfig::default()
        }
    }

    #[test]
    fn hit_rate_of_empty_stats_is_zero() {
        assert_eq!(HitStats::default().hit_rate(), 0.0);
        let stats = HitStats { hits: 3, misses: 1 };
        assert_eq!(stats.hit_rate(), 75.0);
    }

    #[test]
    fn repeated_reads_hit_after_first_miss() {
        let cfg = instant_config();
        let ops = [Op::Read(7), Op::Read(7), Op::Read(7), Op::Write(8, 1), Op::Read(8)];
        let runtime = new_runtime().unwrap();
        let mut cache = Backend::Lru.build(&cfg).unwrap();

        let stats = runtime.block_on(CacheRunner::run(&mut cache, &ops, &cfg));

        assert_eq!(stats, HitStats { hits: 3, misses: 1 });
        // 未命中后回填的值等于 key
        assert_eq!(cache.get(&7), Some(&7));
        assert_eq!(cache.get(&8), Some(&1));
    }

    #[test]
    fn reads_are_fully_accounted() {
        let cfg = instant_config();
        let ops = WorkloadGenerator::new(5).generate(&cfg).unwrap();
        let reads = ops.iter().filter(|op| op.is_read()).count() as u64;
        let runtime = new_runtime().unwrap();

        for backend in Backend::ALL {
            let mut cache = backend.build(&cfg).unwrap();
            let stats = runtime.block_on(CacheRunner::run(&mut cache, &ops, &cfg));
            assert_eq!(stats.total(), reads, "{backend}");
        }
    }

    #[test]
    fn latency_is_applied_on_misses() {
        let cfg = BenchConfig {
            min_delay_us: 2_000,
            max_delay_us: 2_000,
            ..instant_config()
        };
        let ops = [Op::Read(1), Op::Read(2)];
        let runtime = new_runtime().unwrap();
        let mut cache = Backend::HashlinkLru.build(&cfg).unwrap();

        let started = std::time::Instant::now();
        runtime.block_on(CacheRunner::run(&mut cache, &ops, &cfg));
        assert!(started.elapsed() >= Duration::from_millis(4));
    }

    #[test]
    fn calibration_covers_every_backend() {
        let cfg = instant_config();
        let ops = WorkloadGenerator::new(cfg.workload_seed).generate(&cfg).unwrap();
        let calibration = Calibration::run(&cfg, &ops).unwrap();

        assert_eq!(calibration.entries.len(), Backend::ALL.len());
        let text = calibration.to_string();
        assert!(text.starts_with("=== Warmup & Calibration Check ==="));
        assert!(text.contains("Hashlink Hit Rate:"));
    }

    #[test]
    fn impossible_target_is_flagged() {
        let calibration = Calibration {
            entries: vec![CalibrationEntry {
                backend: Backend::Lru,
                stats: HitStats { hits: 1, misses: 1 },
            }],
            target: 85.0,
        };
        assert!(calibration.below_target());
        assert!(calibration.to_string().contains("WARNING"));
    }
}
