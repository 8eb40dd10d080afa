use crate::config::settings::APP_NAME;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE_NAME: &str = "mal-organizer.log";

// 檔案永遠記錄到 debug，畫面輸出才受 -v / -d 控制
const FILE_DIRECTIVE: &str = "mal_organizer=debug,info";

fn default_directive(verbose: bool, debug: bool) -> &'static str {
    if debug {
        "mal_organizer=debug,info"
    } else if verbose {
        "mal_organizer=info"
    } else {
        "mal_organizer=warn"
    }
}

/// 日誌檔位置：`<data_local_dir>/mal-organizer/mal-organizer.log`
pub fn log_file_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(LOG_FILE_NAME)
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// 初始化 CLI 日誌：stderr 依參數過濾，另外附加寫入日誌檔。
/// 回傳實際寫入的日誌檔路徑；檔案無法開啟時只輸出到 stderr
pub fn init_cli_logger(verbose: bool, debug: bool) -> Option<PathBuf> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, debug)));

    let path = log_file_path();
    let (file_layer, log_path, open_error) = match open_log_file(&path) {
        Ok(file) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_filter(EnvFilter::new(FILE_DIRECTIVE));
            (Some(layer), Some(path), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(debug)
                .compact()
                .with_filter(console_filter),
        )
        .with(file_layer)
        .init();

    if let Some(e) = open_error {
        tracing::warn!("Unable to open log file {}: {}", log_file_path().display(), e);
    }

    log_path
}
