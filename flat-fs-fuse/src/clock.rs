use std::time::{SystemTime, UNIX_EPOCH};

use flat_fs::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as i64,
            // 系统时间早于纪元
            Err(e) => -(e.duration().as_secs() as i64),
        }
    }
}
