//! Snowflake ID Generator
//!
//! Twitter-style time-ordered unique ID generation.
//!
//! ```text
//! 63                          22          12           0
//! +----------------------------+-----------+-----------+
//! |  ms since epoch (41 bits)  | machine   | sequence  |
//! |                            | (10 bits) | (12 bits) |
//! +----------------------------+-----------+-----------+
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const MACHINE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const MACHINE_MASK: u64 = (1 << MACHINE_BITS) - 1;

/// Snowflake ID generator
pub struct SnowflakeGenerator {
    machine_id: u64,
    epoch: u64,
    /// Packed `(timestamp << SEQUENCE_BITS) | sequence` of the last issued ID.
    state: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u64, epoch: u64) -> Self {
        Self {
            machine_id: machine_id & MACHINE_MASK,
            epoch,
            state: AtomicU64::new(0),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let last_ts = current >> SEQUENCE_BITS;
            let last_seq = current & SEQUENCE_MASK;
            let now = self.current_timestamp().max(last_ts);

            let (ts, seq) = if now == last_ts {
                if last_seq == SEQUENCE_MASK {
                    // Sequence exhausted for this millisecond, borrow the next one.
                    (last_ts + 1, 0)
                } else {
                    (last_ts, last_seq + 1)
                }
            } else {
                (now, 0)
            };

            let next = (ts << SEQUENCE_BITS) | seq;
            match self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    let id = ((ts - self.epoch) << (MACHINE_BITS + SEQUENCE_BITS))
                        | (self.machine_id << SEQUENCE_BITS)
                        | seq;
                    return id as i64;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Extract the millisecond timestamp embedded in an ID from this generator.
    pub fn extract_timestamp(&self, snowflake: i64) -> u64 {
        ((snowflake as u64) >> (MACHINE_BITS + SEQUENCE_BITS)) + self.epoch
    }

    fn current_timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(self.epoch)
            .max(self.epoch)
    }
}
