//! 把 `log` 门面的输出写到标准错误

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

/// 日志级别环境变量，取值同 `LevelFilter`（`off`、`warn`、`debug` 等）
pub const LOG_ENV: &str = "QNXFS_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

/// `-v` 出现次数对应的级别
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// 读取 `QNXFS_LOG`，无法解析时忽略
pub fn level_from_env() -> Option<LevelFilter> {
    std::env::var(LOG_ENV).ok()?.trim().parse().ok()
}

/// 安装日志器
///
/// 环境变量优先于命令行给出的级别。重复调用时保留第一次的设置。
pub fn init(level: LevelFilter) {
    let level = level_from_env().unwrap_or(level);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
