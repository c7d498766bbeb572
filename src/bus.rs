//! Synchronous publish/subscribe for normalized events.
//!
//! Subscribers run in registration order on the bot's single event task.
//! They receive the event mutably so a command handler can claim its
//! command; once claimed, later subscribers see plain text. Anything a
//! subscriber sends through [`Outbound`] is queued and dispatched after the
//! current event, never re-entrantly.

use crate::event::{EventCategory, NormalizedEvent};
use crate::outbound::Outbound;
use tracing::trace;

/// Event handler. Receives the outbound handle so it can respond.
pub type Handler = Box<dyn FnMut(&Outbound, &mut NormalizedEvent) + Send>;

enum Filter {
    Category(EventCategory),
    Any,
}

struct Subscriber {
    filter: Filter,
    handler: Handler,
}

/// The per-connection event bus.
pub struct EventBus {
    outbound: Outbound,
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new(outbound: Outbound) -> Self {
        Self {
            outbound,
            subscribers: Vec::new(),
        }
    }

    /// Outbound handle bound to this bus.
    pub fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    /// Subscribe to one category.
    ///
    /// Subscribing to [`EventCategory::Unknown`] receives nothing; use
    /// [`EventBus::on_any`] to observe unmapped events.
    pub fn on<F>(&mut self, category: EventCategory, handler: F)
    where
        F: FnMut(&Outbound, &mut NormalizedEvent) + Send + 'static,
    {
        self.subscribers.push(Subscriber {
            filter: Filter::Category(category),
            handler: Box::new(handler),
        });
    }

    /// Subscribe to every event, including unknown ones.
    pub fn on_any<F>(&mut self, handler: F)
    where
        F: FnMut(&Outbound, &mut NormalizedEvent) + Send + 'static,
    {
        self.subscribers.push(Subscriber {
            filter: Filter::Any,
            handler: Box::new(handler),
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` to matching subscribers and hand it back afterwards.
    pub fn dispatch(
        &mut self,
        category: EventCategory,
        mut event: NormalizedEvent,
    ) -> NormalizedEvent {
        trace!(category = %category, kind = %event.kind, "dispatching event");
        for subscriber in &mut self.subscribers {
            let wanted = match subscriber.filter {
                Filter::Any => true,
                Filter::Category(c) => c == category && category != EventCategory::Unknown,
            };
            if wanted {
                (subscriber.handler)(&self.outbound, &mut event);
            }
        }
        event
    }
}
