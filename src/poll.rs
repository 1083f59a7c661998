// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cancellable periodic polling task.
//!
//! Each device owns one [`Poller`]; independent pollers may run
//! concurrently and all serialize through the session's exchange gate.
//! Stopping a poller prevents future ticks but never cancels an exchange
//! that has already started.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Default)]
pub(crate) struct Poller {
    active: Mutex<Option<(Arc<Notify>, JoinHandle<()>)>>,
}

impl Poller {
    /// Start ticking with the given period, replacing any running task.
    /// The callback returns `false` when its target is gone and the task
    /// should end itself.
    pub fn start<F, Fut>(&self, period: Duration, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send,
    {
        let stop = Arc::new(Notify::new());
        let stop_signal = stop.clone();

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = stop_signal.notified() => break,
                    _ = interval.tick() => {}
                }
                // Once a tick starts it runs to completion; stop requests
                // take effect at the next loop iteration.
                if !tick().await {
                    break;
                }
            }
        });

        if let Some((old_stop, _)) = self.active.lock().replace((stop, handle)) {
            old_stop.notify_one();
        }
    }

    /// Stop future ticks. In-flight ticks complete normally.
    pub fn stop(&self) {
        if let Some((stop, _)) = self.active.lock().take() {
            stop.notify_one();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_period() {
        let poller = Poller::default();
        let count = Arc::new(AtomicU32::new(0));

        let counter = count.clone();
        poller.start(Duration::from_millis(100), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_future_ticks() {
        let poller = Poller::default();
        let count = Arc::new(AtomicU32::new(0));

        let counter = count.clone();
        poller.start(Duration::from_millis(100), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        poller.stop();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_task() {
        let poller = Poller::default();
        let count = Arc::new(AtomicU32::new(0));

        let counter = count.clone();
        poller.start(Duration::from_millis(100), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        });

        // Restart with a much longer period before the first tick fires.
        let counter = count.clone();
        poller.start(Duration::from_secs(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(100, Ordering::SeqCst);
                true
            }
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_returning_false_ends_task() {
        let poller = Poller::default();
        let count = Arc::new(AtomicU32::new(0));

        let counter = count.clone();
        poller.start(Duration::from_millis(100), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            }
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
