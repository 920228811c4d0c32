//! Credential/payload rotation cursors

/// Two independent round-robin cursors
///
/// Credentials and payloads advance together but wrap independently, so when
/// the list lengths differ the (credential, payload) pairing drifts from one
/// cycle to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    credential_cursor: usize,
    payload_cursor: usize,
    credentials_len: usize,
    payloads_len: usize,
}

impl Rotation {
    /// Create cursors at (0, 0)
    ///
    /// Both lengths must be non-zero; task validation guarantees it.
    pub fn new(credentials_len: usize, payloads_len: usize) -> Self {
        debug_assert!(credentials_len > 0 && payloads_len > 0);
        Self {
            credential_cursor: 0,
            payload_cursor: 0,
            credentials_len: credentials_len.max(1),
            payloads_len: payloads_len.max(1),
        }
    }

    /// (credential index, payload index) for the next send
    pub fn current(&self) -> (usize, usize) {
        (self.credential_cursor, self.payload_cursor)
    }

    pub fn credential_cursor(&self) -> usize {
        self.credential_cursor
    }

    pub fn payload_cursor(&self) -> usize {
        self.payload_cursor
    }

    /// Move both cursors forward by one
    ///
    /// Returns `true` when the payload cursor wrapped back to 0.
    pub fn advance(&mut self) -> bool {
        self.credential_cursor = (self.credential_cursor + 1) % self.credentials_len;
        self.payload_cursor = (self.payload_cursor + 1) % self.payloads_len;
        self.payload_cursor == 0
    }
}
