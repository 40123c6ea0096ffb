//! 报告模块
//! 读取 criterion 输出，整理到 reports/ 并生成文本摘要

use crate::config::BenchConfig;
use crate::error::{ErrorContext, Result};
use serde::Deserialize;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const REPORTS_DIR: &str = "reports";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const CRITERION_SUBDIR: &str = "criterion";
pub const HTML_LINK: &str = "html";

/// 摘要中缺少数据时的占位文本
pub const NO_DATA_PLACEHOLDER: &str = "N/A (no criterion estimates found)";

/// criterion 输出目录，优先使用 `CARGO_TARGET_DIR`
pub fn criterion_dir(root: &Path) -> PathBuf {
    criterion_dir_in(root, std::env::var_os("CARGO_TARGET_DIR"))
}

/// 相对的 target 目录按 root 解析
pub fn criterion_dir_in(root: &Path, target_dir: Option<OsString>) -> PathBuf {
    let target = target_dir
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .map(|dir| if dir.is_absolute() { dir } else { root.join(dir) })
        .unwrap_or_else(|| root.join("target"));
    target.join(CRITERION_SUBDIR)
}

#[derive(Debug, Deserialize)]
struct ConfidenceInterval {
    lower_bound: f64,
    upper_bound: f64,
}

#[derive(Debug, Deserialize)]
struct RawEstimate {
    confidence_interval: ConfidenceInterval,
    point_estimate: f64,
}

#[derive(Debug, Deserialize)]
struct RawEstimates {
    mean: RawEstimate,
    median: RawEstimate,
    std_dev: RawEstimate,
}

#[derive(Debug, Deserialize)]
struct RawBenchmark {
    group_id: String,
    function_id: Option<String>,
    full_id: String,
}

/// 单个统计量（纳秒）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub point_ns: f64,
    pub lower_ns: f64,
    pub upper_ns: f64,
}

impl From<RawEstimate> for Estimate {
    fn from(raw: RawEstimate) -> Self {
        Self {
            point_ns: raw.point_estimate,
            lower_ns: raw.confidence_interval.lower_bound,
            upper_ns: raw.confidence_interval.upper_bound,
        }
    }
}

/// 一个基准测试函数的结果
#[derive(Debug, Clone, PartialEq)]
pub struct BenchEstimate {
    pub group: String,
    pub id: String,
    pub mean: Estimate,
    pub median: Estimate,
    pub std_dev: Estimate,
}

#[inline]
pub fn ns_to_ms(ns: f64) -> f64 {
    ns / 1_000_000.0
}

/// 读取 `<bench>/new/` 目录下的 estimates.json 与 benchmark.json
pub fn read_estimate(new_dir: &Path) -> Result<BenchEstimate> {
    let estimates: RawEstimates =
        serde_json::from_slice(&fs::read(new_dir.join("estimates.json"))?)
            .with_context(&format!("parsing {}", new_dir.display()))?;

    let benchmark = match fs::read(new_dir.join("benchmark.json")) {
        Ok(bytes) => Some(serde_json::from_slice::<RawBenchmark>(&bytes)?),
        Err(e) => {
            debug!(dir = %new_dir.display(), error = %e, "benchmark.json unavailable");
            None
        }
    };

    // 没有 benchmark.json 时退回目录名
    let (group, id) = match benchmark {
        Some(b) => {
            let id = b.function_id.unwrap_or(b.full_id);
            (b.group_id, id)
        }
        None => {
            let bench_dir = new_dir.parent();
            let name = |p: Option<&Path>| {
                p.and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            };
            (name(bench_dir.and_then(Path::parent)), name(bench_dir))
        }
    };

    Ok(BenchEstimate {
        group,
        id,
        mean: estimates.mean.into(),
        median: estimates.median.into(),
        std_dev: estimates.std_dev.into(),
    })
}

/// 收集目录下所有最新一次的估计值，按 id 排序；无法解析的条目跳过
pub fn collect_estimates(criterion_dir: &Path) -> Vec<BenchEstimate> {
    if !criterion_dir.is_dir() {
        warn!(dir = %criterion_dir.display(), "criterion output not found");
        return Vec::new();
    }

    let mut estimates: Vec<BenchEstimate> = WalkDir::new(criterion_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_name() == "estimates.json"
                && entry
                    .path()
                    .parent()
                    .and_then(Path::file_name)
                    .is_some_and(|dir| dir == "new")
        })
        .filter_map(|entry| {
            let new_dir = entry.path().parent()?;
            match read_estimate(new_dir) {
                Ok(estimate) => Some(estimate),
                Err(e) => {
                    warn!(dir = %new_dir.display(), error = %e, "skipping unreadable estimate");
                    None
                }
            }
        })
        .collect();

    estimates.sort_by(|a, b| (&a.group, &a.id).cmp(&(&b.group, &b.id)));
    estimates
}

/// 基准测试文本摘要
#[derive(Debug, Clone)]
pub struct Summary {
    pub generated_at: chrono::DateTime<chrono::Local>,
    pub config: BenchConfig,
    pub estimates: Vec<BenchEstimate>,
    pub html_index: PathBuf,
}

impl Summary {
    pub fn new(config: BenchConfig, estimates: Vec<BenchEstimate>, html_index: PathBuf) -> Self {
        Self {
            generated_at: chrono::Local::now(),
            config,
            estimates,
            html_index,
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    /// HTML 索引存在时返回其路径
    pub fn existing_html_index(&self) -> Option<&Path> {
        Some(self.html_index.as_path()).filter(|path| path.is_file())
    }

    /// 在浏览器中打开 HTML 报告，索引不存在时只记录警告
    pub fn open_html(&self) -> bool {
        match self.existing_html_index() {
            Some(index) => open_in_browser(index),
            None => {
                warn!(path = %self.html_index.display(), "html report not found");
                false
            }
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        info!(path = %path.display(), "summary written");
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = &self.config;

        writeln!(f, "Cache Comparison Benchmark Summary")?;
        writeln!(f, "==================================")?;
        writeln!(f, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Cache capacity: {}", cfg.cache_capacity)?;
        writeln!(
            f,
            "Workload: Zipf (s={}) over {} keys, {} ops/iteration, {:.0}% reads",
            cfg.zipf_s,
            cfg.total_keys,
            cfg.workload_size,
            cfg.read_ratio * 100.0
        )?;
        writeln!(f, "Hit-rate target: >= {:.0}%", cfg.min_hit_rate_target)?;
        writeln!(f, "Backend latency: {}-{} us", cfg.min_delay_us, cfg.max_delay_us)?;
        writeln!(f)?;
        writeln!(f, "Mean time per iteration (ms, 95% CI):")?;

        if self.estimates.is_empty() {
            writeln!(f, "  {NO_DATA_PLACEHOLDER}")?;
        }
        for estimate in &self.estimates {
            let mean = &estimate.mean;
            writeln!(
                f,
                "  {:<32} {:>10.3}  [{:.3} .. {:.3}]  median {:.3}  std-dev {:.3}",
                estimate.id,
                ns_to_ms(mean.point_ns),
                ns_to_ms(mean.lower_ns),
                ns_to_ms(mean.upper_ns),
                ns_to_ms(estimate.median.point_ns),
                ns_to_ms(estimate.std_dev.point_ns),
            )?;
        }

        writeln!(f)?;
        writeln!(f, "HTML report: {}", self.html_index.display())
    }
}

/// 递归复制目录，目标已存在时先删除
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    if dst.exists() {
        fs::remove_dir_all(dst)?;
    }
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// 把 criterion 输出复制到 reports/criterion，并建立 reports/html 链接
///
/// 返回 HTML 索引路径。源目录不存在时只记录警告。
pub fn relocate(criterion_dir: &Path, reports_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(reports_dir)?;
    let copy = reports_dir.join(CRITERION_SUBDIR);
    let link = reports_dir.join(HTML_LINK);

    if criterion_dir.is_dir() {
        copy_dir(criterion_dir, &copy)
            .with_context(&format!("copying {}", criterion_dir.display()))?;
        info!(from = %criterion_dir.display(), to = %copy.display(), "criterion report copied");
    } else {
        warn!(dir = %criterion_dir.display(), "no criterion output to copy");
    }

    replace_link(&link)?;
    Ok(link.join("index.html"))
}

fn replace_link(link: &Path) -> Result<()> {
    if let Ok(meta) = fs::symlink_metadata(link) {
        if meta.is_dir() {
            fs::remove_dir_all(link)?;
        } else {
            fs::remove_file(link)?;
        }
    }

    let relative_target = Path::new(CRITERION_SUBDIR).join("report");

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&relative_target, link)?;
        debug!(link = %link.display(), target = %relative_target.display(), "html link created");
    }
    #[cfg(not(unix))]
    warn!(
        link = %link.display(),
        target = %relative_target.display(),
        "symlinks unsupported here, html link skipped"
    );

    Ok(())
}

/// 浏览器打开命令
fn browser_command() -> (&'static str, &'static [&'static str]) {
    const NO_ARGS: &[&str] = &[];
    const WINDOWS_ARGS: &[&str] = &["/C", "start", ""];

    if cfg!(target_os = "macos") {
        ("open", NO_ARGS)
    } else if cfg!(windows) {
        ("cmd", WINDOWS_ARGS)
    } else {
        ("xdg-open", NO_ARGS)
    }
}

/// 尝试在浏览器中打开报告，失败只记录日志
pub fn open_in_browser(path: &Path) -> bool {
    let (program, args) = browser_command();
    info!(program, path = %path.display(), "opening report");
    match Command::new(program).args(args).arg(path).status() {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warn!(program, code = ?status.code(), "browser command failed");
            false
        }
        Err(e) => {
            warn!(program, error = %e, "could not launch browser");
            false
        }
    }
}

/// 生成并写入 reports/summary.txt
pub fn write_summary(root: &Path, config: &BenchConfig) -> Result<Summary> {
    let reports_dir = root.join(REPORTS_DIR);
    let estimates = collect_estimates(&reports_dir.join(CRITERION_SUBDIR));
    let summary = Summary::new(
        config.clone(),
        estimates,
        reports_dir.join(HTML_LINK).join("index.html"),
    );
    summary.write_to(&reports_dir.join(SUMMARY_FILE))?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ESTIMATES: &str = r#"{
        "mean": {"confidence_interval": {"confidence_level": 0.95, "lower_bound": 1500000.0, "upper_bound": 1700000.0}, "point_estimate": 1600000.0, "standard_error": 1000.0},
        "median": {"confidence_interval": {"confidence_level": 0.95, "lower_bound": 1400000.0, "upper_bound": 1600000.0}, "point_estimate": 1550000.0, "standard_error": 1000.0},
        "median_abs_dev": {"confidence_interval": {"confidence_level": 0.95, "lower_bound": 1.0, "upper_bound": 2.0}, "point_estimate": 1.5, "standard_error": 0.1},
        "slope": null,
        "std_dev": {"confidence_interval": {"confidence_level": 0.95, "lower_bound": 10000.0, "upper_bound": 30000.0}, "point_estimate": 20000.0, "standard_error": 100.0}
    }"#;

    #[test]
    fn criterion_dir_resolves_target_dir() {
        let root = Path::new("/work/proj");
        assert_eq!(
            criterion_dir_in(root, None),
            PathBuf::from("/work/proj/target/criterion")
        );
        assert_eq!(
            criterion_dir_in(root, Some(OsString::from("build/out"))),
            PathBuf::from("/work/proj/build/out/criterion")
        );
        assert_eq!(
            criterion_dir_in(root, Some(OsString::from("/var/cache/target"))),
            PathBuf::from("/var/cache/target/criterion")
        );
        assert_eq!(
            criterion_dir_in(root, Some(OsString::new())),
            PathBuf::from("/work/proj/target/criterion")
        );
    }

    #[test]
    fn missing_html_index_is_not_opened() {
        let dir = tempfile::tempdir().unwrap();
        let summary = Summary::new(
            BenchConfig::default(),
            Vec::new(),
            dir.path().join("reports/html/index.html"),
        );
        assert!(summary.existing_html_index().is_none());
        assert!(!summary.open_html());
    }

    #[test]
    fn ns_convert_to_ms() {
        assert_eq!(ns_to_ms(1_500_000.0), 1.5);
        assert_eq!(ns_to_ms(0.0), 0.0);
    }

    #[test]
    fn reads_estimate_without_benchmark_json() {
        let dir = tempfile::tempdir().unwrap();
        let new_dir = dir.path().join("group").join("lru").join("new");
        fs::create_dir_all(&new_dir).unwrap();
        fs::write(new_dir.join("estimates.json"), ESTIMATES).unwrap();

        let estimate = read_estimate(&new_dir).unwrap();
        assert_eq!(estimate.group, "group");
        assert_eq!(estimate.id, "lru");
        assert_eq!(estimate.mean.point_ns, 1_600_000.0);
        assert_eq!(estimate.std_dev.upper_ns, 30_000.0);
    }

    #[test]
    fn malformed_estimates_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("estimates.json"), "{\"mean\": 1}").unwrap();
        assert!(read_estimate(dir.path()).is_err());
    }

    #[test]
    fn empty_summary_uses_placeholder() {
        let summary = Summary {
            generated_at: chrono::Local::now(),
            config: BenchConfig::default(),
            estimates: Vec::new(),
            html_index: PathBuf::from("reports/html/index.html"),
        };
        let text = summary.render();
        assert!(text.contains("Cache capacity: 7500"));
        assert!(text.contains(NO_DATA_PLACEHOLDER));
        assert!(text.contains("Zipf (s=1.6) over 10000 keys, 1000 ops/iteration, 95% reads"));
        assert!(text.contains("Backend latency: 1000-2000 us"));
    }

    #[test]
    fn summary_lists_means_in_ms() {
        let estimate = Estimate {
            point_ns: 1_234_567_000.0,
            lower_ns: 1_200_000_000.0,
            upper_ns: 1_300_000_000.0,
        };
        let summary = Summary {
            generated_at: chrono::Local::now(),
            config: BenchConfig {
                cache_capacity: 100,
                warmup_size: 100,
                ..BenchConfig::default()
            },
            estimates: vec![BenchEstimate {
                group: "g".into(),
                id: "hashlink_lru".into(),
                mean: estimate,
                median: estimate,
                std_dev: estimate,
            }],
            html_index: PathBuf::from("reports/html/index.html"),
        };
        let text = summary.render();
        assert!(text.contains("Cache capacity: 100\n"));
        assert!(text.contains("hashlink_lru"));
        assert!(text.contains("1234.567"));
        assert!(text.contains("[1200.000 .. 1300.000]"));
        assert!(!text.contains(NO_DATA_PLACEHOLDER));
    }

    #[test]
    fn copy_dir_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("a/b/file.txt"), "x").unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("stale.txt"), "old").unwrap();

        copy_dir(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a/b/file.txt")).unwrap(), "x");
        assert!(!dst.join("stale.txt").exists());
    }

    #[test]
    fn browser_command_is_known() {
        let (program, _) = browser_command();
        assert!(["open", "cmd", "xdg-open"].contains(&program));
    }
}
