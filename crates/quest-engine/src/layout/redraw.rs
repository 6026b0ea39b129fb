/// Proof that a map redraw is in flight. Not `Clone`: only the holder can
/// finish the redraw.
#[derive(Debug, PartialEq, Eq)]
pub struct RedrawToken(u64);

/// Single-flight guard around map redraws.
///
/// A redraw requested while another is in flight is dropped, not queued,
/// and the in-flight one is never cancelled.
#[derive(Debug, Default)]
pub struct RedrawGuard {
    in_flight: Option<u64>,
    next: u64,
}

impl RedrawGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the redraw slot, or `None` if a redraw is already running.
    pub fn begin(&mut self) -> Option<RedrawToken> {
        if self.in_flight.is_some() {
            return None;
        }
        let id = self.next;
        self.next += 1;
        self.in_flight = Some(id);
        Some(RedrawToken(id))
    }

    /// Release the slot. Returns false if `token` does not hold it.
    pub fn finish(&mut self, token: RedrawToken) -> bool {
        if self.in_flight == Some(token.0) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }
}
