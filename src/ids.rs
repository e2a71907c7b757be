//! Entity and request identifiers

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Network-level account identifier in `shard.realm.num` form.
///
/// Nodes are addressed by the same identifier shape, so node identities
/// are `AccountId` values too.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// Shorthand for `0.0.num`, the common case on every public profile.
    pub const fn from_num(num: u64) -> Self {
        Self::new(0, 0, num)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for AccountId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut next = |label: &str| -> Result<u64, Error> {
            parts
                .next()
                .ok_or_else(|| Error::InvalidId(format!("`{s}` is missing its {label} part")))?
                .parse::<u64>()
                .map_err(|_| Error::InvalidId(format!("`{s}` has a non-numeric {label} part")))
        };
        let shard = next("shard")?;
        let realm = next("realm")?;
        let num = next("num")?;
        if parts.next().is_some() {
            return Err(Error::InvalidId(format!("`{s}` has trailing parts")));
        }
        Ok(Self { shard, realm, num })
    }
}

/// Instant with explicit second/nanosecond parts.
///
/// Stored split rather than as a `DateTime` so the wire form is a stable
/// pair of integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn from_nanos(total: i64) -> Self {
        Self {
            seconds: total.div_euclid(1_000_000_000),
            nanos: total.rem_euclid(1_000_000_000) as u32,
        }
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.seconds, self.nanos).single()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self {
            seconds: value.timestamp(),
            nanos: value.timestamp_subsec_nanos(),
        }
    }
}

/// Request identifier: the paying account plus the instant the request
/// becomes valid. Unique per submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    pub account_id: AccountId,
    pub valid_start: Timestamp,
}

// Last valid-start handed out by `generate`, in nanoseconds. Guarantees
// uniqueness when many ids are generated inside one clock tick.
static LAST_VALID_START_NANOS: AtomicI64 = AtomicI64::new(0);

impl TransactionId {
    pub const fn new(account_id: AccountId, valid_start: Timestamp) -> Self {
        Self {
            account_id,
            valid_start,
        }
    }

    /// Generate a fresh identifier for `account_id` with a strictly
    /// monotonic valid-start, even under rapid successive calls.
    pub fn generate(account_id: AccountId) -> Self {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX - 1);
        let mut candidate = now;
        loop {
            let last = LAST_VALID_START_NANOS.load(Ordering::Acquire);
            candidate = candidate.max(last + 1);
            if LAST_VALID_START_NANOS
                .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
        Self {
            account_id,
            valid_start: Timestamp::from_nanos(candidate),
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.account_id, self.valid_start.seconds, self.valid_start.nanos
        )
    }
}

/// Opaque identifier of the ledger a network profile points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerId(Vec<u8>);

impl LedgerId {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, Error> {
        hex::decode(s)
            .map(Self)
            .map_err(|_| Error::InvalidId(format!("`{s}` is not a hex ledger id")))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_display_and_parse() {
        let id = AccountId::from_num(7);
        assert_eq!(id.to_string(), "0.0.7");
        assert_eq!("0.0.7".parse::<AccountId>().unwrap(), id);
        assert_eq!("1.2.3".parse::<AccountId>().unwrap(), AccountId::new(1, 2, 3));
    }

    #[test]
    fn account_id_rejects_garbage() {
        assert!("".parse::<AccountId>().is_err());
        assert!("0.0".parse::<AccountId>().is_err());
        assert!("0.0.x".parse::<AccountId>().is_err());
        assert!("0.0.1.2".parse::<AccountId>().is_err());
    }

    #[test]
    fn generated_ids_are_unique_and_monotonic() {
        let payer = AccountId::from_num(2);
        let mut previous = TransactionId::generate(payer);
        for _ in 0..1000 {
            let next = TransactionId::generate(payer);
            assert!(next.valid_start > previous.valid_start);
            previous = next;
        }
    }

    #[test]
    fn timestamp_nanos_split() {
        let ts = Timestamp::from_nanos(1_500_000_001);
        assert_eq!(ts.seconds, 1);
        assert_eq!(ts.nanos, 500_000_001);
    }

    #[test]
    fn ledger_id_hex_round_trip() {
        let id = LedgerId::from_hex("00ff").unwrap();
        assert_eq!(id.as_bytes(), &[0x00, 0xff]);
        assert_eq!(id.to_string(), "00ff");
        assert!(LedgerId::from_hex("zz").is_err());
    }
}
