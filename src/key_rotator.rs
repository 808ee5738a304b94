use anyhow::{anyhow, Result};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A credential handed out by [`KeyRotator::next`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotatedKey<'a> {
    /// Process-wide call number before the modulo; unique per call
    pub ticket: usize,
    /// Position of the key in the configured list
    pub slot: usize,
    pub key: &'a str,
}

/// Round-robin over a fixed, non-empty list of API keys for one provider.
///
/// Clones share the same counter, so every holder of a rotator observes one
/// global sequence.
#[derive(Clone)]
pub struct KeyRotator {
    keys: Arc<[String]>,
    counter: Arc<AtomicUsize>,
}

impl KeyRotator {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(anyhow!("At least one API key is required for key rotation"));
        }

        Ok(Self {
            keys: keys.into(),
            counter: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The K-th call returns key `K mod N`
    pub fn next(&self) -> RotatedKey<'_> {
        let ticket = self.counter.fetch_add(1, Ordering::Relaxed);
        let slot = ticket % self.keys.len();
        RotatedKey {
            ticket,
            slot,
            key: &self.keys[slot],
        }
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

// Keys stay out of logs
impl fmt::Debug for KeyRotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRotator")
            .field("keys", &self.keys.len())
            .field("counter", &self.counter.load(Ordering::Relaxed))
            .finish()
    }
}
