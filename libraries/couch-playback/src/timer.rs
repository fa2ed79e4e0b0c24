//! Cancellable timer slots
//!
//! Engines never sleep. They arm a [`TimerSlot`] with a deadline and the
//! host (or [`crate::driver`]) calls `poll(now)`, which asks each slot
//! whether it is due. A slot holds at most one armed ticket: arming always
//! cancels whatever was armed before.

use std::time::{Duration, Instant};

/// Opaque handle identifying one arming of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerTicket(u64);

#[derive(Debug, Clone, Copy)]
struct Armed {
    ticket: TimerTicket,
    deadline: Instant,
    period: Option<Duration>,
}

/// One logical timer
#[derive(Debug)]
pub struct TimerSlot {
    name: &'static str,
    next_generation: u64,
    armed: Option<Armed>,
}

impl TimerSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_generation: 0,
            armed: None,
        }
    }

    /// Fire once, `delay` after `now`
    pub fn arm_once(&mut self, now: Instant, delay: Duration) -> TimerTicket {
        self.arm(now + delay, None)
    }

    /// Fire every `period`, first at `now + period`
    pub fn arm_interval(&mut self, now: Instant, period: Duration) -> TimerTicket {
        self.arm(now + period, Some(period))
    }

    fn arm(&mut self, deadline: Instant, period: Option<Duration>) -> TimerTicket {
        if let Some(previous) = self.armed.take() {
            tracing::trace!(slot = self.name, ticket = ?previous.ticket, "replacing armed timer");
        }
        let ticket = TimerTicket(self.next_generation);
        self.next_generation += 1;
        self.armed = Some(Armed {
            ticket,
            deadline,
            period,
        });
        ticket
    }

    /// Disarm; returns the ticket that was armed, if any
    pub fn cancel(&mut self) -> Option<TimerTicket> {
        self.armed.take().map(|armed| armed.ticket)
    }

    /// Consume one due firing
    ///
    /// One-shot timers disarm; interval timers advance their deadline by one
    /// period, so a late poll can be drained with `while let`.
    pub fn fire_due(&mut self, now: Instant) -> Option<TimerTicket> {
        let armed = self.armed.as_mut()?;
        if armed.deadline > now {
            return None;
        }
        let ticket = armed.ticket;
        match armed.period {
            Some(period) => armed.deadline += period,
            None => self.armed = None,
        }
        Some(ticket)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Whether `ticket` is still the armed one
    pub fn is_current(&self, ticket: TimerTicket) -> bool {
        self.armed.is_some_and(|armed| armed.ticket == ticket)
    }

    pub fn ticket(&self) -> Option<TimerTicket> {
        self.armed.map(|armed| armed.ticket)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|armed| armed.deadline)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Earliest of several optional deadlines
pub fn earliest(deadlines: impl IntoIterator<Item = Option<Instant>>) -> Option<Instant> {
    deadlines.into_iter().flatten().min()
}
