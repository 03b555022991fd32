//! Named, per-actor reminders.
//!
//! A reminder is a durable-intent timer addressed by `(actor, name)`.
//! Registering under an existing name replaces the pending reminder;
//! unregistering cancels it. When a reminder comes due it re-enters the
//! owning actor through the host under the normal turn discipline.
//!
//! Delivery failures are logged and swallowed; a failed reminder is not
//! rescheduled. Payloads are versioned, explicitly-tagged records so that
//! in-flight reminders survive upgrades.

use std::pin::pin;
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::host::ActorAddress;

/// Repeat behavior. `Never` is a one-shot reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderPeriod {
    Never,
    EverySeconds(i64),
}

/// What the actor receives when a reminder fires.
#[derive(Debug, Clone)]
pub struct ReminderEnvelope {
    pub name: String,
    pub payload: Value,
    pub due_time: DateTime<Utc>,
    pub period: ReminderPeriod,
}

/// Time source seam.
///
/// Retention windows are measured in days; tests drive them with a
/// manual clock instead of waiting on the wall clock.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
    fn sleep_until(&self, deadline: DateTime<Utc>) -> BoxFuture<'_, ()>;
}

/// Wall-clock implementation.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep_until(&self, deadline: DateTime<Utc>) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let now = Utc::now();
            if deadline > now {
                let wait = (deadline - now).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;
            }
        })
    }
}

/// Manually advanced clock for tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    changed: Notify,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            changed: Notify::new(),
        }
    }

    pub fn advance(&self, by: Duration) {
        {
            let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            *now = *now + by;
        }
        self.changed.notify_waiters();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .now
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn sleep_until(&self, deadline: DateTime<Utc>) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            loop {
                let mut notified = pin!(self.changed.notified());
                notified.as_mut().enable();
                if self.now() >= deadline {
                    return;
                }
                notified.await;
            }
        })
    }
}

type DeliveryFn = Box<dyn Fn(ActorAddress, ReminderEnvelope) -> BoxFuture<'static, ()> + Send + Sync>;

struct PendingReminder {
    payload: Value,
    due_time: DateTime<Utc>,
    period: ReminderPeriod,
}

/// The reminder scheduler.
///
/// A single background task sleeps until the earliest pending due time
/// (or until a registration changes the picture) and fires everything
/// due, sequentially, through the bound delivery function.
pub struct ReminderService {
    clock: Arc<dyn Clock>,
    pending: DashMap<(ActorAddress, String), PendingReminder>,
    wakeup: Notify,
    delivery: OnceLock<DeliveryFn>,
    shutdown: CancellationToken,
}

impl ReminderService {
    /// Create the service and start its scheduler task.
    ///
    /// Must be called from within a tokio runtime. Delivery is bound by
    /// the actor host when the host is constructed.
    pub fn start(clock: Arc<dyn Clock>) -> Arc<Self> {
        let service = Arc::new(Self {
            clock,
            pending: DashMap::new(),
            wakeup: Notify::new(),
            delivery: OnceLock::new(),
            shutdown: CancellationToken::new(),
        });
        tokio::spawn(Arc::clone(&service).run());
        service
    }

    /// Bind the delivery path. Called once by the actor host.
    pub fn bind_delivery(&self, delivery: DeliveryFn) {
        if self.delivery.set(delivery).is_err() {
            warn!("reminder delivery already bound; ignoring rebind");
        }
    }

    /// Register (or replace) a named reminder for an actor.
    pub fn register(
        &self,
        address: ActorAddress,
        name: &str,
        payload: Value,
        due_in: Duration,
        period: ReminderPeriod,
    ) {
        let due_time = self.clock.now() + due_in;
        debug!(%address, name, %due_time, "registering reminder");
        self.pending.insert(
            (address, name.to_string()),
            PendingReminder {
                payload,
                due_time,
                period,
            },
        );
        self.wakeup.notify_waiters();
    }

    /// Cancel a pending reminder. Returns true when one existed.
    pub fn unregister(&self, address: &ActorAddress, name: &str) -> bool {
        let removed = self
            .pending
            .remove(&(address.clone(), name.to_string()))
            .is_some();
        if removed {
            debug!(%address, name, "unregistered reminder");
            self.wakeup.notify_waiters();
        }
        removed
    }

    /// Number of reminders not yet fired.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Stop the scheduler task.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    async fn run(self: Arc<Self>) {
        loop {
            // Arm the wakeup before scanning, so a registration that lands
            // between the scan and the select is not lost.
            let mut wakeup = pin!(self.wakeup.notified());
            wakeup.as_mut().enable();

            let next_due = self
                .pending
                .iter()
                .map(|entry| entry.value().due_time)
                .min();

            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                _ = &mut wakeup => {}
                _ = async {
                    match next_due {
                        Some(due) => self.clock.sleep_until(due).await,
                        // Nothing pending: park until a registration wakes us.
                        None => futures::future::pending::<()>().await,
                    }
                } => {
                    self.fire_due().await;
                }
            }
        }
    }

    async fn fire_due(&self) {
        let now = self.clock.now();
        let due: Vec<(ActorAddress, String)> = self
            .pending
            .iter()
            .filter(|entry| entry.value().due_time <= now)
            .map(|entry| entry.key().clone())
            .collect();

        for key in due {
            let Some(((address, name), reminder)) = self.pending.remove(&key) else {
                continue;
            };

            if let ReminderPeriod::EverySeconds(seconds) = reminder.period {
                self.pending.insert(
                    (address.clone(), name.clone()),
                    PendingReminder {
                        payload: reminder.payload.clone(),
                        due_time: reminder.due_time + Duration::seconds(seconds),
                        period: reminder.period,
                    },
                );
            }

            let Some(delivery) = self.delivery.get() else {
                warn!(%address, name, "reminder due but no delivery bound; dropping");
                continue;
            };

            let envelope = ReminderEnvelope {
                name,
                payload: reminder.payload,
                due_time: reminder.due_time,
                period: reminder.period,
            };
            // Sequential delivery: a reminder turn finishes before the
            // next fires. Handler failures are logged inside the host.
            delivery(address, envelope).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    fn address(id: &str) -> ActorAddress {
        ActorAddress::new("Reference", id)
    }

    fn counting_delivery(counter: Arc<AtomicUsize>) -> DeliveryFn {
        Box::new(move |_, _| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test]
    async fn fires_after_manual_clock_advance() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = ReminderService::start(clock.clone() as Arc<dyn Clock>);
        let fired = Arc::new(AtomicUsize::new(0));
        service.bind_delivery(counting_delivery(Arc::clone(&fired)));

        service.register(
            address("r-1"),
            "PhysicalDeletion",
            json!({"version": 1}),
            Duration::days(30),
            ReminderPeriod::Never,
        );
        assert_eq!(service.pending_count(), 1);

        clock.advance(Duration::days(29));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        clock.advance(Duration::days(2));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(service.pending_count(), 0);

        service.stop();
    }

    #[tokio::test]
    async fn reregistration_replaces_pending_reminder() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = ReminderService::start(clock.clone() as Arc<dyn Clock>);
        let fired = Arc::new(AtomicUsize::new(0));
        service.bind_delivery(counting_delivery(Arc::clone(&fired)));

        let actor = address("r-2");
        service.register(
            actor.clone(),
            "PhysicalDeletion",
            json!(1),
            Duration::days(1),
            ReminderPeriod::Never,
        );
        service.register(
            actor.clone(),
            "PhysicalDeletion",
            json!(2),
            Duration::days(10),
            ReminderPeriod::Never,
        );
        assert_eq!(service.pending_count(), 1);

        clock.advance(Duration::days(2));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "replaced reminder kept the later due time");

        clock.advance(Duration::days(9));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        service.stop();
    }

    #[tokio::test]
    async fn unregister_cancels() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = ReminderService::start(clock.clone() as Arc<dyn Clock>);
        let fired = Arc::new(AtomicUsize::new(0));
        service.bind_delivery(counting_delivery(Arc::clone(&fired)));

        let actor = address("r-3");
        service.register(
            actor.clone(),
            "PhysicalDeletion",
            json!(null),
            Duration::days(1),
            ReminderPeriod::Never,
        );
        assert!(service.unregister(&actor, "PhysicalDeletion"));
        assert!(!service.unregister(&actor, "PhysicalDeletion"));

        clock.advance(Duration::days(2));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        service.stop();
    }
}
