//! Generation tickets for asynchronous loads.
//!
//! Every load started through a [`LoadSlot`] gets a fresh [`LoadTicket`].
//! Only the completion carrying the slot's current ticket is accepted, so a
//! slow first load can never overwrite a faster second one.

/// Identifies one load. Generations increase monotonically per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading(LoadTicket),
    Ready { ticket: LoadTicket, value: T },
    Failed { ticket: LoadTicket, message: String },
}

#[derive(Debug, Clone)]
pub struct LoadSlot<T> {
    next_generation: u64,
    state: LoadState<T>,
}

impl<T> Default for LoadSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LoadSlot<T> {
    pub fn new() -> Self {
        Self {
            next_generation: 1,
            state: LoadState::Idle,
        }
    }

    /// Start a new load, discarding whatever the slot held before.
    pub fn begin(&mut self) -> LoadTicket {
        let ticket = LoadTicket {
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.state = LoadState::Loading(ticket);
        ticket
    }

    /// Record the outcome of the load identified by `ticket`.
    ///
    /// Returns `false` (and leaves the slot untouched) when `ticket` is not
    /// the load currently in flight.
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<T, String>) -> bool {
        match self.state {
            LoadState::Loading(current) if current == ticket => {
                self.state = match result {
                    Ok(value) => LoadState::Ready { ticket, value },
                    Err(message) => LoadState::Failed { ticket, message },
                };
                true
            }
            _ => {
                log::debug!(
                    "Dropping stale completion of load {}",
                    ticket.generation
                );
                false
            }
        }
    }

    /// Forget the current value and invalidate any load in flight.
    pub fn clear(&mut self) {
        self.next_generation += 1;
        self.state = LoadState::Idle;
    }

    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, LoadState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match &self.state {
            LoadState::Ready { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match &mut self.state {
            LoadState::Ready { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn ready_ticket(&self) -> Option<LoadTicket> {
        match &self.state {
            LoadState::Ready { ticket, .. } => Some(*ticket),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_latest_ticket_completes() {
        let mut slot: LoadSlot<&str> = LoadSlot::new();
        let first = slot.begin();
        let second = slot.begin();
        assert!(!slot.complete(first, Ok("first")));
        assert!(slot.is_loading());
        assert!(slot.complete(second, Ok("second")));
        assert_eq!(slot.ready(), Some(&"second"));
        // late arrival after the second finished
        assert!(!slot.complete(first, Ok("first")));
        assert_eq!(slot.ready(), Some(&"second"));
    }

    #[test]
    fn clear_invalidates_in_flight_loads() {
        let mut slot: LoadSlot<u8> = LoadSlot::new();
        let ticket = slot.begin();
        slot.clear();
        assert!(!slot.complete(ticket, Ok(1)));
        assert!(slot.is_idle());
    }

    #[test]
    fn failures_are_kept() {
        let mut slot: LoadSlot<u8> = LoadSlot::new();
        let ticket = slot.begin();
        assert!(slot.complete(ticket, Err("404".to_string())));
        assert_eq!(slot.error(), Some("404"));
        assert_eq!(slot.ready(), None);
    }
}
