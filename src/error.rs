//! 错误处理模块
//! 定义了所有应用级别的错误类型

use thiserror::Error;

/// 应用主错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 运行时创建错误
    #[error("Runtime create error: {0}")]
    RuntimeCreate(String),

    /// Zipf分布创建错误
    #[error("Zipf distribution create error: {0}")]
    ZipfCreate(String),

    /// 缓存操作错误
    #[error("Cache operation error: {0}")]
    CacheOperation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// criterion 报告解析错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 外部命令失败，`code` 为 None 表示被信号终止
    #[error("Step `{step}` failed with exit code {code:?}")]
    Command { step: String, code: Option<i32> },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<AppError>,
    },
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 错误上下文扩展trait
pub trait ErrorContext<T> {
    /// 添加上下文信息
    fn with_context(self, context: &str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context(self, context: &str) -> Result<T> {
        self.map_err(|e| AppError::Context {
            context: context.to_string(),
            source: Box::new(e.into()),
        })
    }
}
