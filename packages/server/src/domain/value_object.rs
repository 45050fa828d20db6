//! Value objects of the signaling relay.
//!
//! Every identifier and every piece of client text is validated once, at
//! construction, so the rest of the crate can rely on the invariants.

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

/// Minimum room id length in characters
pub const ROOM_ID_MIN_CHARS: usize = 3;
/// Maximum room id length in characters
pub const ROOM_ID_MAX_CHARS: usize = 50;
/// Maximum display name length in characters
pub const DISPLAY_NAME_MAX_CHARS: usize = 50;
/// Display name used when a client does not provide one
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous";
/// Maximum chat text length in characters
pub const CHAT_TEXT_MAX_CHARS: usize = 2000;

/// Length of the canonical 8-4-4-4-12 UUID form
const PEER_ID_LEN: usize = 36;
const PEER_ID_HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// Client-supplied peer identifier.
///
/// Only the hyphenated 8-4-4-4-12 form is accepted. The validated text is
/// kept as sent, so it is echoed back byte for byte and ids differing only in
/// letter case are distinct peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId([u8; PEER_ID_LEN]);

impl PeerId {
    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        let invalid = || ValueObjectError::InvalidPeerId(value.to_string());
        let bytes: [u8; PEER_ID_LEN] = value.as_bytes().try_into().map_err(|_| invalid())?;
        let well_formed = bytes.iter().enumerate().all(|(i, b)| {
            if PEER_ID_HYPHENS.contains(&i) {
                *b == b'-'
            } else {
                b.is_ascii_hexdigit()
            }
        });
        if !well_formed || Uuid::try_parse(value).is_err() {
            return Err(invalid());
        }
        Ok(Self(bytes))
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII is ever stored
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl From<Uuid> for PeerId {
    fn from(value: Uuid) -> Self {
        let mut bytes = [0u8; PEER_ID_LEN];
        value.hyphenated().encode_lower(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Room identifier, 3 to 50 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let actual = value.chars().count();
        if !(ROOM_ID_MIN_CHARS..=ROOM_ID_MAX_CHARS).contains(&actual) {
            return Err(ValueObjectError::RoomIdLength {
                actual,
                min: ROOM_ID_MIN_CHARS,
                max: ROOM_ID_MAX_CHARS,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display name shown to other participants, at most 50 characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let actual = value.chars().count();
        if actual > DISPLAY_NAME_MAX_CHARS {
            return Err(ValueObjectError::DisplayNameTooLong {
                actual,
                max: DISPLAY_NAME_MAX_CHARS,
            });
        }
        Ok(Self(value))
    }

    /// Build a display name from an optional client value, falling back to "Anonymous"
    pub fn or_default(value: Option<String>) -> Result<Self, ValueObjectError> {
        match value {
            Some(value) => Self::new(value),
            None => Ok(Self::default()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for DisplayName {
    fn default() -> Self {
        Self(DEFAULT_DISPLAY_NAME.to_string())
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chat text, at most 2000 characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatText(String);

impl ChatText {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let actual = value.chars().count();
        if actual > CHAT_TEXT_MAX_CHARS {
            return Err(ValueObjectError::ChatTextTooLong {
                actual,
                max: CHAT_TEXT_MAX_CHARS,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Server-minted chat message id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-frame correlation token echoed back to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one physical WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix timestamp in milliseconds (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier` (negative if `earlier` is in the future)
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }
}
