//! Request generation tagging.
//!
//! Fetches run on background threads and may complete out of order. Each request
//! takes a ticket from a [`RequestGate`]; a response is applied only if its
//! ticket is still the newest one issued by that gate.

/// Monotonic tag attached to a request and echoed back with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestGate {
    latest: u64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier one.
    pub fn issue(&mut self) -> RequestTicket {
        self.latest += 1;
        RequestTicket(self.latest)
    }

    /// Whether a response carrying `ticket` should be applied.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Supersede any in-flight request without starting a new one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_ticket_is_current() {
        let mut gate = RequestGate::new();
        let first = gate.issue();
        assert!(gate.is_current(first));

        let second = gate.issue();
        assert!(second > first);
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }

    #[test]
    fn stale_response_arriving_last_is_discarded() {
        let mut gate = RequestGate::new();
        let slow = gate.issue();
        let fast = gate.issue();

        let mut applied = Vec::new();
        // The newer response lands first, then the superseded one.
        for (ticket, payload) in [(fast, "new"), (slow, "old")] {
            if gate.is_current(ticket) {
                applied.push(payload);
            }
        }
        assert_eq!(applied, vec!["new"]);
    }

    #[test]
    fn invalidate_drops_in_flight_ticket() {
        let mut gate = RequestGate::new();
        let t = gate.issue();
        gate.invalidate();
        assert!(!gate.is_current(t));
    }
}
