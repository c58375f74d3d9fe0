//! Logical clock supplied by the surrounding ledger.

/// Block context handed to every state transition.
///
/// `block` drives the voting clock (snapshots, deadlines); `timestamp`
/// drives the timelock (ready times, grace periods). Both are supplied by
/// the host and only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Env {
    /// Current block number
    pub block: u64,
    /// Current block timestamp (seconds)
    pub timestamp: u64,
}

impl Env {
    pub const fn new(block: u64, timestamp: u64) -> Self {
        Self { block, timestamp }
    }

    /// Advance by `blocks` blocks of `block_time` seconds each.
    pub fn advance_blocks(&mut self, blocks: u64, block_time: u64) {
        self.block = self.block.saturating_add(blocks);
        self.timestamp = self
            .timestamp
            .saturating_add(blocks.saturating_mul(block_time));
    }

    /// Advance the timestamp only, mining a single block.
    pub fn advance_time(&mut self, seconds: u64) {
        self.block = self.block.saturating_add(1);
        self.timestamp = self.timestamp.saturating_add(seconds);
    }

    /// Last completed block, the latest point a historical query may target.
    pub fn last_block(&self) -> Option<u64> {
        self.block.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_blocks() {
        let mut env = Env::new(10, 1_000);
        env.advance_blocks(5, 12);
        assert_eq!(env, Env::new(15, 1_060));
    }

    #[test]
    fn test_advance_time_mines_one_block() {
        let mut env = Env::new(10, 1_000);
        env.advance_time(3_600);
        assert_eq!(env.block, 11);
        assert_eq!(env.timestamp, 4_600);
    }

    #[test]
    fn test_last_block_at_genesis() {
        assert_eq!(Env::new(0, 0).last_block(), None);
        assert_eq!(Env::new(7, 0).last_block(), Some(6));
    }
}
