//! Wall clock port trait.

use chrono::NaiveDateTime;
use std::time::Duration;

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
    fn sleep(&self, duration: Duration);
}
