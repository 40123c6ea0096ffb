//! 日志初始化
//!
//! 日志写到 stderr，stdout 留给摘要和 criterion 输出。
//! `RUST_LOG` 优先于命令行给出的默认级别，重复调用会被忽略。

use tracing::Level;
use tracing_subscriber::EnvFilter;

pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .ok();
}
