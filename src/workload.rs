//! 工作负载模块
//! Zipf 分布的读写序列与缓存预热

use crate::cache::CacheOps;
use crate::config::{BenchConfig, MAX_CACHE_CAPACITY};
use crate::error::{AppError, Result};
use rand::prelude::*;
use rand_distr::Zipf;

/// 预热阶段追加读操作的概率
const WARMUP_READ_PROBABILITY: f64 = 0.2;

/// 操作类型枚举
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Read(usize),
    Write(usize, usize),
}

impl Op {
    pub fn key(&self) -> usize {
        match *self {
            Op::Read(key) | Op::Write(key, _) => key,
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Op::Read(_))
    }
}

fn zipf(n: f64, s: f64) -> Result<Zipf<f64>> {
    Zipf::new(n, s).map_err(|e| AppError::ZipfCreate(e.to_string()))
}

/// 工作负载生成器
pub struct WorkloadGenerator {
    rng: StdRng,
}

impl WorkloadGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 生成工作负载操作序列，key 取值 `1..=total_keys`
    pub fn generate(&mut self, config: &BenchConfig) -> Result<Vec<Op>> {
        let dist = zipf(config.total_keys as f64, config.zipf_s)?;

        let ops = (0..config.workload_size)
            .map(|_| {
                let key = dist.sample(&mut self.rng) as usize;
                if self.rng.random::<f64>() < config.read_ratio {
                    Op::Read(key)
                } else {
                    Op::Write(key, self.rng.random::<u32>() as usize)
                }
            })
            .collect();

        Ok(ops)
    }
}

/// 预热计划
#[derive(Debug, Clone)]
pub struct WarmupPlan {
    ops: Vec<Op>,
}

impl WarmupPlan {
    /// 在 `2 × capacity` 的 key 空间上生成写入为主的预热序列
    pub fn generate(config: &BenchConfig) -> Result<Self> {
        let key_space = config.cache_capacity.checked_mul(2).ok_or_else(|| {
            AppError::Config(format!(
                "warmup key space overflows for capacity {}",
                config.cache_capacity
            ))
        })?;
        let reserve = usize::try_from(config.warmup_size)
            .ok()
            .filter(|&n| n as u64 <= MAX_CACHE_CAPACITY)
            .ok_or_else(|| {
                AppError::Config(format!(
                    "warmup size must be at most {MAX_CACHE_CAPACITY}, got {}",
                    config.warmup_size
                ))
            })?;

        let mut rng = StdRng::seed_from_u64(config.warmup_seed);
        let dist = zipf(key_space as f64, config.zipf_s)?;

        let mut ops = Vec::with_capacity(reserve);
        for _ in 0..config.warmup_size {
            let key = dist.sample(&mut rng) as usize;
            ops.push(Op::Write(key, rng.random::<u32>() as usize));

            if rng.random::<f64>() < WARMUP_READ_PROBABILITY {
                ops.push(Op::Read(key));
            }
        }

        Ok(Self { ops })
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// 执行缓存预热，不经过模拟后端
    pub fn apply<C: CacheOps + ?Sized>(&self, cache: &mut C) {
        for op in &self.ops {
            match *op {
                Op::Read(key) => {
                    cache.get(&key);
                    // 模拟读取后的相邻访问
                    if key % 10 == 0 {
                        cache.insert(key + 1000, key + 1000);
                    }
                }
                Op::Write(key, value) => cache.insert(key, value),
            }
        }
    }
}
