//! 浏览器侧工具：panic 钩子与输出到控制台的 `log` 后端。

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;
use wasm_bindgen::JsValue;
use web_sys::console;

static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger;
static LOGGER_INSTALLED: OnceCell<bool> = OnceCell::new();

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => console::error_1(&message),
            Level::Warn => console::warn_1(&message),
            Level::Info => console::info_1(&message),
            Level::Debug | Level::Trace => console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}

/// 将 `log` 日志转发到浏览器控制台，只在首次调用时安装。
pub fn init_logging(level: LevelFilter) -> bool {
    *LOGGER_INSTALLED.get_or_init(|| {
        let installed = log::set_logger(&CONSOLE_LOGGER).is_ok();
        if installed {
            log::set_max_level(level);
        }
        installed
    })
}

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}
