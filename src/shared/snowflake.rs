//! Snowflake ID Generator
//!
//! Twitter-style time-ordered unique ID generation.
//!
//! ```text
//! 63                        22         17          12           0
//! +--------------------------+----------+-----------+-----------+
//! |  ms since epoch (41 bits)|  machine |   node    |  sequence |
//! +--------------------------+----------+-----------+-----------+
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Custom epoch (2015-01-01T00:00:00.000Z)
pub const EPOCH_MS: u64 = 1420070400000;

const SEQUENCE_MASK: u64 = 0xFFF;

/// Snowflake ID generator
pub struct SnowflakeGenerator {
    machine_id: u64,
    node_id: u64,
    /// (last timestamp, sequence within that millisecond)
    state: Mutex<(u64, u64)>,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u64, node_id: u64) -> Self {
        Self {
            machine_id: machine_id & 0x1F,
            node_id: node_id & 0x1F,
            state: Mutex::new((0, 0)),
        }
    }

    /// Generate a new snowflake ID.
    ///
    /// IDs are strictly increasing per generator; when the sequence overflows
    /// within one millisecond the timestamp is advanced logically.
    pub fn generate(&self) -> i64 {
        let now = current_millis();
        let mut state = self.state.lock();
        let (last, sequence) = *state;

        let (timestamp, sequence) = if now > last {
            (now, 0)
        } else if sequence < SEQUENCE_MASK {
            (last, sequence + 1)
        } else {
            (last + 1, 0)
        };
        *state = (timestamp, sequence);

        (((timestamp - EPOCH_MS) << 22) | (self.machine_id << 17) | (self.node_id << 12) | sequence)
            as i64
    }
}

fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(EPOCH_MS)
}

/// Parse snowflake from its string form
pub fn from_string(s: &str) -> Result<i64, std::num::ParseIntError> {
    s.trim().parse()
}

/// Deserialize an id sent either as a JSON string or a JSON number.
///
/// The raw text is kept so callers decide what an unparseable id means.
pub fn deserialize_raw_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match serde::Deserialize::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_strictly_increasing() {
        let gen = SnowflakeGenerator::new(1, 1);
        let mut previous = gen.generate();
        for _ in 0..10_000 {
            let next = gen.generate();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_id_encodes_generation_time() {
        let gen = SnowflakeGenerator::new(1, 1);
        let id = gen.generate();
        let ts = ((id as u64) >> 22) + EPOCH_MS;
        let now = current_millis();
        assert!(ts <= now + 5);
        assert!(ts > now - 1000);
    }

    #[test]
    fn test_raw_id_accepts_string_or_number() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            #[serde(deserialize_with = "deserialize_raw_id")]
            id: String,
        }

        let text: Wrapper = serde_json::from_str(r#"{"id":"17"}"#).unwrap();
        let number: Wrapper = serde_json::from_str(r#"{"id":17}"#).unwrap();
        assert_eq!(text.id, "17");
        assert_eq!(number.id, "17");
    }

    #[test]
    fn test_from_string() {
        assert_eq!(from_string(" 42 "), Ok(42));
        assert!(from_string("general").is_err());
    }
}
