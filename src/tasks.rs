//! 开发任务模块
//! clippy / bench / test 三条流水线，按顺序执行外部命令，遇错即停

use crate::config::BenchConfig;
use crate::error::{AppError, ErrorContext, Result};
use crate::report::{self, Summary};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

pub const BENCH_NAME: &str = "cache_comparison";

/// 单个外部命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    /// 失败时继续执行
    pub tolerate_failure: bool,
}

impl Step {
    pub fn new(name: &str, program: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            tolerate_failure: false,
        }
    }

    pub fn tolerated(mut self) -> Self {
        self.tolerate_failure = true;
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 命令执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub success: bool,
    pub code: Option<i32>,
}

impl StepOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failed(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }
}

/// 命令执行器
pub trait StepRunner {
    fn run(&mut self, root: &Path, step: &Step) -> Result<StepOutcome>;
}

/// 以子进程方式执行，继承标准输入输出
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl StepRunner for ProcessRunner {
    fn run(&mut self, root: &Path, step: &Step) -> Result<StepOutcome> {
        let status = Command::new(&step.program)
            .args(&step.args)
            .current_dir(root)
            .status()
            .with_context(&format!("spawning `{}`", step.command_line()))?;

        Ok(StepOutcome {
            success: status.success(),
            code: status.code(),
        })
    }
}

pub fn clippy_steps() -> Vec<Step> {
    vec![
        Step::new("stage", "git", &["add", "-u"]),
        // 没有改动时 commit 会失败
        Step::new("commit", "git", &["commit", "-m", "clippy"]).tolerated(),
        Step::new(
            "clippy",
            "cargo",
            &[
                "clippy",
                "--fix",
                "--allow-dirty",
                "--allow-staged",
                "--all-targets",
            ],
        ),
    ]
}

pub fn bench_steps() -> Vec<Step> {
    vec![
        Step::new("bench-build", "cargo", &["bench", "--bench", BENCH_NAME, "--no-run"]),
        Step::new("bench-run", "cargo", &["bench", "--bench", BENCH_NAME]),
    ]
}

pub fn test_step() -> Step {
    Step::new("test", "cargo", &["test"])
}

/// 任务流水线
pub struct Pipeline<'a, R: StepRunner + ?Sized> {
    root: PathBuf,
    criterion_dir: PathBuf,
    config: &'a BenchConfig,
    runner: &'a mut R,
}

impl<'a, R: StepRunner + ?Sized> Pipeline<'a, R> {
    pub fn new(root: impl Into<PathBuf>, config: &'a BenchConfig, runner: &'a mut R) -> Self {
        let root = root.into();
        Self {
            criterion_dir: report::criterion_dir(&root),
            root,
            config,
            runner,
        }
    }

    /// 覆盖 criterion 输出目录
    pub fn with_criterion_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.criterion_dir = dir.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 依次执行，遇到不可容忍的失败立即返回
    pub fn run_steps(&mut self, steps: &[Step]) -> Result<()> {
        for step in steps {
            info!("+ {}", step.command_line());
            let outcome = self.runner.run(&self.root, step)?;
            if outcome.success {
                continue;
            }
            if step.tolerate_failure {
                warn!(step = %step.name, code = ?outcome.code, "step failed, continuing");
                continue;
            }
            return Err(AppError::Command {
                step: step.command_line(),
                code: outcome.code,
            });
        }
        Ok(())
    }

    pub fn clippy(&mut self) -> Result<()> {
        self.run_steps(&clippy_steps())
    }

    /// 运行基准测试并整理报告
    pub fn bench(&mut self) -> Result<Summary> {
        self.run_steps(&bench_steps())?;
        self.report()
    }

    /// 只整理已有的 criterion 输出并重写摘要
    pub fn report(&mut self) -> Result<Summary> {
        let reports_dir = self.root.join(report::REPORTS_DIR);
        report::relocate(&self.criterion_dir, &reports_dir)?;
        report::write_summary(&self.root, self.config)
    }

    pub fn test(&mut self) -> Result<Summary> {
        self.clippy()?;
        self.run_steps(&[test_step()])?;
        self.bench()
    }
}

/// 向上查找包含 Cargo.toml 的目录
pub fn find_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("Cargo.toml").is_file())
        .map(Path::to_path_buf)
}

/// 确定项目根目录并转成绝对路径
///
/// 显式给出的相对路径按 `cwd` 解析；否则从 `cwd` 向上查找 Cargo.toml，找不到时用 `cwd`。
pub fn resolve_root(explicit: Option<PathBuf>, cwd: &Path) -> Result<PathBuf> {
    let root = match explicit {
        Some(root) if root.is_absolute() => root,
        Some(root) => cwd.join(root),
        None => find_root(cwd).unwrap_or_else(|| cwd.to_path_buf()),
    };
    root.canonicalize()
        .with_context(&format!("resolving project root {}", root.display()))
}
