//! Wall clock backed by the local time zone and a blocking sleep.

use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::ports::clock_port::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
