//! System clock.

use chrono::{DateTime, Utc};

use crate::ports::clock::Clock;

/// Clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_wall_time() {
        let before = Utc::now();
        let now = SystemClock.now();
        assert!(now >= before);
        assert!(now <= Utc::now());
    }
}
