#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const GROUP: &str = "Single-Thread Cache + Compio Async IO";

pub fn estimates_json(mean_ns: f64) -> String {
    let stat = |point: f64| {
        format!(
            r#"{{"confidence_interval": {{"confidence_level": 0.95, "lower_bound": {lo}, "upper_bound": {hi}}}, "point_estimate": {point}, "standard_error": 1.0}}"#,
            lo = point * 0.9,
            hi = point * 1.1,
        )
    };
    format!(
        r#"{{"mean": {mean}, "median": {median}, "median_abs_dev": {mad}, "slope": null, "std_dev": {sd}}}"#,
        mean = stat(mean_ns),
        median = stat(mean_ns),
        mad = stat(10.0),
        sd = stat(1000.0),
    )
}

/// 按 criterion 的目录布局写一个基准测试结果
pub fn write_bench(criterion_dir: &Path, function_id: &str, mean_ns: f64) {
    let bench_dir = criterion_dir.join(GROUP).join(function_id);
    let new_dir = bench_dir.join("new");
    fs::create_dir_all(&new_dir).unwrap();
    fs::write(new_dir.join("estimates.json"), estimates_json(mean_ns)).unwrap();
    fs::write(
        new_dir.join("benchmark.json"),
        format!(
            r#"{{"group_id": "{GROUP}", "function_id": "{function_id}", "value_str": null, "throughput": {{"Elements": 1000}}, "full_id": "{GROUP}/{function_id}", "directory_name": "{GROUP}/{function_id}", "title": "{GROUP}/{function_id}"}}"#
        ),
    )
    .unwrap();

    // 上一次运行的结果不应被读取
    let base_dir = bench_dir.join("base");
    fs::create_dir_all(&base_dir).unwrap();
    fs::write(base_dir.join("estimates.json"), estimates_json(1.0)).unwrap();
}

pub fn write_html_index(criterion_dir: &Path) {
    let report = criterion_dir.join("report");
    fs::create_dir_all(&report).unwrap();
    fs::write(report.join("index.html"), "<html></html>").unwrap();
}
