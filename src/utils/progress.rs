#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressStyle};

/// 批次更新時的進度條，`enabled = false` 時不輸出任何東西
#[cfg(feature = "cli")]
pub struct BatchProgress {
    bar: ProgressBar,
}

#[cfg(feature = "cli")]
impl BatchProgress {
    pub fn new(total: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total as u64);
        match ProgressStyle::with_template(
            "{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ) {
            Ok(style) => bar.set_style(style.progress_chars("#>-")),
            Err(e) => tracing::debug!("Falling back to default progress style: {}", e),
        }

        Self { bar }
    }

    pub fn start_item(&self, name: &str) {
        self.bar.set_message(format!("Processing [{}]", name));
    }

    pub fn finish_item(&self) {
        self.bar.inc(1);
    }

    /// 在進度條上方輸出一行，避免畫面錯亂
    pub fn println(&self, line: &str) {
        self.bar.println(line);
    }

    /// 暫時清除進度條再執行 `f`（例如輸出日誌），之後重畫
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

// 為非CLI環境提供空實現
#[cfg(not(feature = "cli"))]
pub struct BatchProgress {
    position: std::sync::atomic::AtomicU64,
}

#[cfg(not(feature = "cli"))]
impl BatchProgress {
    pub fn new(_total: usize, _enabled: bool) -> Self {
        Self {
            position: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn start_item(&self, _name: &str) {}

    pub fn finish_item(&self) {
        self.position
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn println(&self, line: &str) {
        tracing::info!("{}", line);
    }

    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        f()
    }

    pub fn finish(&self) {}

    pub fn position(&self) -> u64 {
        self.position.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_counts_items() {
        let progress = BatchProgress::new(3, false);
        progress.start_item("Cowboy Bebop");
        progress.finish_item();
        progress.start_item("Berserk");
        progress.finish_item();
        assert_eq!(progress.position(), 2);
        progress.finish();
    }

    #[test]
    fn test_suspend_returns_closure_value() {
        let progress = BatchProgress::new(1, false);
        let reason = progress.suspend(|| format!("'{}' couldn't be updated", "Monster"));
        assert_eq!(reason, "'Monster' couldn't be updated");
    }
}
