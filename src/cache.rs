//! 缓存抽象模块
//! 定义缓存操作的统一接口

use crate::config::{BenchConfig, MAX_CACHE_CAPACITY};
use crate::error::{AppError, Result};
use hashlink::LruCache as HashlinkLruCache;
use lru::LruCache;
use mini_moka::unsync::Cache as MokaCache;
use std::num::NonZeroUsize;
use std::time::Duration;

/// 缓存操作trait，统一接口
pub trait CacheOps {
    /// 获取缓存值
    fn get(&mut self, key: &usize) -> Option<&usize>;

    /// 插入键值对
    fn insert(&mut self, key: usize, value: usize);

    /// 当前条目数
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取缓存名称（用于日志）
    fn name(&self) -> &'static str;
}

impl CacheOps for HashlinkLruCache<usize, usize> {
    #[inline]
    fn get(&mut self, key: &usize) -> Option<&usize> {
        self.get(key)
    }

    #[inline]
    fn insert(&mut self, key: usize, value: usize) {
        self.insert(key, value);
    }

    #[inline]
    fn len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn name(&self) -> &'static str {
        "Hashlink LRU"
    }
}

impl CacheOps for LruCache<usize, usize> {
    #[inline]
    fn get(&mut self, key: &usize) -> Option<&usize> {
        self.get(key)
    }

    #[inline]
    fn insert(&mut self, key: usize, value: usize) {
        self.push(key, value);
    }

    #[inline]
    fn len(&self) -> usize {
        self.len()
    }

    #[inline]
    fn name(&self) -> &'static str {
        "LRU"
    }
}

impl CacheOps for MokaCache<usize, usize> {
    #[inline]
    fn get(&mut self, key: &usize) -> Option<&usize> {
        self.get(key)
    }

    #[inline]
    fn insert(&mut self, key: usize, value: usize) {
        self.insert(key, value);
    }

    #[inline]
    fn len(&self) -> usize {
        self.entry_count() as usize
    }

    #[inline]
    fn name(&self) -> &'static str {
        "Mini-Moka Unsync"
    }
}

impl<C: CacheOps + ?Sized> CacheOps for Box<C> {
    #[inline]
    fn get(&mut self, key: &usize) -> Option<&usize> {
        (**self).get(key)
    }

    #[inline]
    fn insert(&mut self, key: usize, value: usize) {
        (**self).insert(key, value);
    }

    #[inline]
    fn len(&self) -> usize {
        (**self).len()
    }

    #[inline]
    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// 单个条目的权重（字节）
const ENTRY_WEIGHT: u32 = std::mem::size_of::<(usize, usize)>() as u32;

/// Mini-Moka 缓存构建器
pub struct MokaBuilder;

/// 条目数换算成权重容量
fn weighted_capacity(capacity: u64) -> Result<u64> {
    capacity.checked_mul(ENTRY_WEIGHT as u64).ok_or_else(|| {
        AppError::Config(format!("weighted capacity overflows for {capacity} entries"))
    })
}

impl MokaBuilder {
    /// 权重感知缓存，容量按条目字节数计算
    pub fn weighted(capacity: u64) -> Result<MokaCache<usize, usize>> {
        Ok(MokaCache::builder()
            .initial_capacity((capacity / 2) as usize)
            .weigher(|_key, _value: &usize| -> u32 { ENTRY_WEIGHT })
            .max_capacity(weighted_capacity(capacity)?)
            .build())
    }

    /// 带过期策略的缓存（适用于长时间运行的场景）
    pub fn expiring(capacity: u64) -> Result<MokaCache<usize, usize>> {
        Ok(MokaCache::builder()
            .initial_capacity((capacity / 2) as usize)
            .weigher(|_key, _value: &usize| -> u32 { ENTRY_WEIGHT })
            .max_capacity(weighted_capacity(capacity)?)
            .time_to_live(Duration::from_secs(600))
            .time_to_idle(Duration::from_secs(120))
            .build())
    }

    /// 高性能缓存，只按条目计数，避免权重计算开销
    pub fn high_performance(capacity: u64) -> MokaCache<usize, usize> {
        MokaCache::builder()
            .initial_capacity((capacity / 2) as usize)
            .max_capacity(capacity)
            .build()
    }
}

/// 参与对比的缓存后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    HashlinkLru,
    Lru,
    MiniMoka,
    MiniMokaWeigher,
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::HashlinkLru,
        Backend::Lru,
        Backend::MiniMoka,
        Backend::MiniMokaWeigher,
    ];

    /// criterion 中的函数名，也是报告目录名
    pub fn bench_id(&self) -> &'static str {
        match self {
            Backend::HashlinkLru => "hashlink_lru",
            Backend::Lru => "lru",
            Backend::MiniMoka => "mini_moka_unsync_optimized",
            Backend::MiniMokaWeigher => "mini_moka_unsync_weigher",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Backend::HashlinkLru => "Hashlink",
            Backend::Lru => "LRU",
            Backend::MiniMoka => "Mini-Moka",
            Backend::MiniMokaWeigher => "Mini-Moka (weigher)",
        }
    }

    /// 按配置容量构建一个新的空缓存
    pub fn build(&self, config: &BenchConfig) -> Result<Box<dyn CacheOps>> {
        // 过大的容量会让 lru / hashlink 在预分配时直接中止进程
        if config.cache_capacity > MAX_CACHE_CAPACITY {
            return Err(AppError::Config(format!(
                "cache capacity must be at most {MAX_CACHE_CAPACITY}, got {}",
                config.cache_capacity
            )));
        }
        let capacity = NonZeroUsize::new(config.cache_capacity as usize)
            .ok_or_else(|| AppError::Config("cache capacity must be positive".into()))?;

        let cache: Box<dyn CacheOps> = match self {
            Backend::HashlinkLru => Box::new(HashlinkLruCache::<usize, usize>::new(capacity.get())),
            Backend::Lru => Box::new(LruCache::<usize, usize>::new(capacity)),
            Backend::MiniMoka => Box::new(MokaBuilder::high_performance(config.cache_capacity)),
            Backend::MiniMokaWeigher => Box::new(MokaBuilder::weighted(config.cache_capacity)?),
        };
        Ok(cache)
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.bench_id())
    }
}
