//! Scripted [`OrderClient`] for execution tests.
//!
//! Each submission pops the next [`OrderBehavior`]; fills are delivered on
//! the update stream from spawned tasks, so tests driving the clock with
//! `start_paused` see them at exact virtual times. Every published update
//! is also recorded so [`OrderClient::order_status`] reflects it.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::domain::{Fill, Order, OrderId, Price, Usd, Volume};
use crate::error::VenueError;
use crate::port::{OrderClient, OrderStatusReport, OrderUpdate};

/// What the venue does with one submitted order.
#[derive(Debug, Clone)]
pub enum OrderBehavior {
    /// Fill `size` (the whole order when `None`) after `delay`, at `price`
    /// (the limit when `None`).
    Fill {
        delay: Duration,
        size: Option<Volume>,
        price: Option<Price>,
    },
    /// Fill the whole order after `delay`, surrounded by `noise` unrelated
    /// updates on each side so a small channel overflows.
    FillAmidNoise { delay: Duration, noise: usize },
    /// Accept the order and never fill it.
    Silent,
    /// Refuse the submission.
    Reject,
}

impl OrderBehavior {
    pub fn fill_after(ms: u64) -> Self {
        Self::Fill {
            delay: Duration::from_millis(ms),
            size: None,
            price: None,
        }
    }

    pub fn fill_at(ms: u64, price: Price) -> Self {
        Self::Fill {
            delay: Duration::from_millis(ms),
            size: None,
            price: Some(price),
        }
    }

    pub fn partial(ms: u64, size: Volume) -> Self {
        Self::Fill {
            delay: Duration::from_millis(ms),
            size: Some(size),
            price: None,
        }
    }
}

/// How the venue answers a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelBehavior {
    /// Acknowledge immediately.
    Ack,
    /// Fill the remainder first, then acknowledge.
    FillThenAck,
    /// Acknowledge, then report a fill `late_ms` later.
    AckThenLateFill { late_ms: u64 },
    /// Never answer.
    Ignore,
}

struct Resting {
    price: Price,
    remaining: Volume,
}

/// What the venue has published for one order.
#[derive(Debug, Clone, Copy, Default)]
struct Published {
    filled: Volume,
    notional: Usd,
    closed: bool,
}

/// Update sender that records what it publishes.
#[derive(Clone)]
struct Stream {
    tx: broadcast::Sender<OrderUpdate>,
    published: Arc<Mutex<HashMap<OrderId, Published>>>,
}

impl Stream {
    fn send(&self, update: OrderUpdate) {
        {
            let mut published = self.published.lock();
            let entry = published.entry(update.order_id().clone()).or_default();
            match &update {
                OrderUpdate::Filled(fill) => {
                    entry.filled += fill.size;
                    entry.notional += fill.size * fill.price;
                }
                OrderUpdate::CancelAcknowledged { .. } | OrderUpdate::Rejected { .. } => {
                    entry.closed = true;
                }
            }
        }
        let _ = self.tx.send(update);
    }

    fn noise(&self, count: usize) {
        for i in 0..count {
            let _ = self.tx.send(OrderUpdate::CancelAcknowledged {
                order_id: OrderId::new(format!("noise-{i}")),
            });
        }
    }
}

/// Order client driven by a script.
pub struct ScriptedVenue {
    stream: Stream,
    status_available: bool,
    behaviors: Mutex<VecDeque<OrderBehavior>>,
    cancel: CancelBehavior,
    resting: Mutex<HashMap<OrderId, Resting>>,
    submitted: Mutex<Vec<Order>>,
    cancelled: Mutex<Vec<OrderId>>,
    next_id: AtomicU32,
}

impl ScriptedVenue {
    pub fn new(behaviors: Vec<OrderBehavior>) -> Self {
        Self::with_capacity(behaviors, 64)
    }

    /// Like [`new`](Self::new) with a custom update channel capacity.
    pub fn with_capacity(behaviors: Vec<OrderBehavior>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            stream: Stream {
                tx,
                published: Arc::new(Mutex::new(HashMap::new())),
            },
            status_available: true,
            behaviors: Mutex::new(behaviors.into()),
            cancel: CancelBehavior::Ack,
            resting: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelBehavior) -> Self {
        self.cancel = cancel;
        self
    }

    /// Make every status query fail.
    pub fn without_status(mut self) -> Self {
        self.status_available = false;
        self
    }

    /// Orders accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<Order> {
        self.submitted.lock().clone()
    }

    /// Order ids a cancel was requested for.
    pub fn cancelled(&self) -> Vec<OrderId> {
        self.cancelled.lock().clone()
    }

    /// Push an update onto the stream directly.
    pub fn emit(&self, update: OrderUpdate) {
        self.stream.send(update);
    }

    fn take_remaining(&self, order_id: &OrderId) -> Option<Resting> {
        self.resting.lock().remove(order_id)
    }
}

#[async_trait]
impl OrderClient for ScriptedVenue {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn submit(&self, order: &Order) -> Result<OrderId, VenueError> {
        let behavior = self
            .behaviors
            .lock()
            .pop_front()
            .unwrap_or(OrderBehavior::Silent);

        if matches!(behavior, OrderBehavior::Reject) {
            return Err(VenueError::Rejected {
                venue: order.venue().to_string(),
                reason: "scripted rejection".into(),
            });
        }

        let id = OrderId::new(format!("o-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        let mut accepted = order.clone();
        accepted.mark_submitted(id.clone());
        self.submitted.lock().push(accepted);

        let mut remaining = order.size();
        match behavior {
            OrderBehavior::Fill { delay, size, price } => {
                let size = size.unwrap_or(order.size()).min(order.size());
                let price = price.unwrap_or(order.limit_price());
                remaining -= size;
                let fill = Fill::new(id.clone(), price, size);
                let stream = self.stream.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    stream.send(OrderUpdate::Filled(fill));
                });
            }
            OrderBehavior::FillAmidNoise { delay, noise } => {
                remaining = Volume::ZERO;
                let fill = Fill::new(id.clone(), order.limit_price(), order.size());
                let stream = self.stream.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    stream.noise(noise);
                    stream.send(OrderUpdate::Filled(fill));
                    stream.noise(noise);
                });
            }
            OrderBehavior::Silent | OrderBehavior::Reject => {}
        }
        self.resting.lock().insert(
            id.clone(),
            Resting {
                price: order.limit_price(),
                remaining,
            },
        );
        Ok(id)
    }

    async fn cancel(&self, order_id: &OrderId) -> Result<(), VenueError> {
        self.cancelled.lock().push(order_id.clone());
        let resting = self.take_remaining(order_id);
        let ack = OrderUpdate::CancelAcknowledged {
            order_id: order_id.clone(),
        };

        match self.cancel {
            CancelBehavior::Ack => self.emit(ack),
            CancelBehavior::FillThenAck => {
                if let Some(r) = resting.filter(|r| r.remaining > Volume::ZERO) {
                    self.emit(OrderUpdate::Filled(Fill::new(
                        order_id.clone(),
                        r.price,
                        r.remaining,
                    )));
                }
                self.emit(ack);
            }
            CancelBehavior::AckThenLateFill { late_ms } => {
                self.emit(ack);
                if let Some(r) = resting.filter(|r| r.remaining > Volume::ZERO) {
                    let fill = Fill::new(order_id.clone(), r.price, r.remaining);
                    let stream = self.stream.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(late_ms)).await;
                        stream.send(OrderUpdate::Filled(fill));
                    });
                }
            }
            CancelBehavior::Ignore => {}
        }
        Ok(())
    }

    async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatusReport, VenueError> {
        if !self.status_available {
            return Err(VenueError::Unavailable("scripted status outage".into()));
        }
        let published = self
            .stream
            .published
            .lock()
            .get(order_id)
            .copied()
            .unwrap_or_default();
        let remaining = self
            .resting
            .lock()
            .get(order_id)
            .map_or(Volume::ZERO, |r| r.remaining);
        Ok(OrderStatusReport {
            filled: published.filled,
            average_price: (published.filled > Volume::ZERO)
                .then(|| published.notional / published.filled),
            open: !published.closed && (remaining > Volume::ZERO || published.filled.is_zero()),
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<OrderUpdate> {
        self.stream.tx.subscribe()
    }
}
