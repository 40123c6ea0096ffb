//! 缓存基准测试库
//!
//! 这个项目提供了多种LRU缓存实现的性能基准测试，
//! 包括Hashlink、LRU和Mini-Moka三种实现，
//! 以及运行 clippy、测试和基准测试并整理报告的命令行工具。
//!
//! 特性：
//! - 使用Compio异步运行时模拟后端延迟
//! - Zipf分布模拟真实访问模式
//! - 预热与命中率校准
//! - criterion 报告整理与文本摘要

pub mod cache;
pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod tasks;
pub mod telemetry;
pub mod workload;

pub use cache::{Backend, CacheOps};
pub use config::BenchConfig;
pub use error::{AppError, ErrorContext, Result};
pub use runner::{CacheRunner, Calibration, HitStats};
pub use workload::{Op, WarmupPlan, WorkloadGenerator};
