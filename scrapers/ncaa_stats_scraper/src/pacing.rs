use std::{thread, time::Duration};

/// Blocking wait used between requests and between retry attempts.
pub trait Pause {
    fn pause(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

impl<P: Pause + ?Sized> Pause for &P {
    fn pause(&self, duration: Duration) {
        (**self).pause(duration)
    }
}
