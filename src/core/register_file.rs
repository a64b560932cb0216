//! Register pools and allocation.
//!
//! The RegisterFile hands out physical registers from three disjoint pools
//! (temporaries, saved, arguments). Each pool is consumed strictly in order and
//! nothing is ever freed: a register handed out once stays taken for the rest of
//! the compilation unit. When a pool runs dry allocation fails; there is no
//! eviction and no spilling.

use std::fmt;

/// Number of register pools.
pub const NUM_POOLS: usize = 3;

/// Maximum number of registers in a single pool.
pub const MAX_REGISTERS_PER_POOL: u8 = 64;

/// Register pool a physical register belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegPool {
    Temporary = 0,
    Saved = 1,
    Argument = 2,
}

impl RegPool {
    pub const ALL: [RegPool; NUM_POOLS] = [RegPool::Temporary, RegPool::Saved, RegPool::Argument];

    /// Letter used in the register spelling (`$t3`, `$s0`, `$a1`).
    pub const fn prefix(self) -> char {
        match self {
            RegPool::Temporary => 't',
            RegPool::Saved => 's',
            RegPool::Argument => 'a',
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            RegPool::Temporary => "temporary",
            RegPool::Saved => "saved",
            RegPool::Argument => "argument",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// A physical register: pool plus index within the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AsmReg {
    pub pool: RegPool,
    pub id: u8,
}

impl AsmReg {
    pub const fn new(pool: RegPool, id: u8) -> Self {
        Self { pool, id }
    }
}

impl fmt::Display for AsmReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}{}", self.pool.prefix(), self.id)
    }
}

/// Bit set for tracking registers per pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegBitSet {
    pools: [u64; NUM_POOLS],
}

impl RegBitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set with the first `count` registers of `pool` marked.
    pub fn first_n(pool: RegPool, count: u8) -> Self {
        let mut set = Self::new();
        set.pools[pool.index()] = match count {
            0 => 0,
            n if n >= 64 => u64::MAX,
            n => (1u64 << n) - 1,
        };
        set
    }

    pub fn contains(&self, reg: AsmReg) -> bool {
        reg.id < 64 && (self.pools[reg.pool.index()] & (1u64 << reg.id)) != 0
    }

    pub fn set(&mut self, reg: AsmReg) {
        if reg.id < 64 {
            self.pools[reg.pool.index()] |= 1u64 << reg.id;
        }
    }

    pub fn union(&mut self, other: &RegBitSet) {
        for i in 0..NUM_POOLS {
            self.pools[i] |= other.pools[i];
        }
    }

    /// Lowest register of `pool` in this set that is not in `exclude`.
    pub fn find_first_in_pool(&self, pool: RegPool, exclude: &RegBitSet) -> Option<u8> {
        let available = self.pools[pool.index()] & !exclude.pools[pool.index()];
        if available == 0 {
            return None;
        }
        Some(available.trailing_zeros() as u8)
    }

    pub fn count_in_pool(&self, pool: RegPool) -> u32 {
        self.pools[pool.index()].count_ones()
    }
}

/// Error types for register allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegAllocError {
    /// Every register of the pool has already been handed out.
    PoolExhausted(RegPool),
}

impl fmt::Display for RegAllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegAllocError::PoolExhausted(pool) => write!(f, "no {} registers left", pool.name()),
        }
    }
}

impl std::error::Error for RegAllocError {}

/// RegisterFile manages the three pools for one compilation unit.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    /// Registers that may be handed out.
    allocatable: RegBitSet,
    /// Registers already handed out.
    used: RegBitSet,
}

impl RegisterFile {
    /// Create a register file with the given pool sizes, in
    /// [temporary, saved, argument] order.
    pub fn new(sizes: [u8; NUM_POOLS]) -> Self {
        let mut allocatable = RegBitSet::new();
        for pool in RegPool::ALL {
            let count = sizes[pool.index()].min(MAX_REGISTERS_PER_POOL);
            allocatable.union(&RegBitSet::first_n(pool, count));
        }
        Self {
            allocatable,
            used: RegBitSet::new(),
        }
    }

    /// Take the next free register of `pool`.
    pub fn allocate(&mut self, pool: RegPool) -> Result<AsmReg, RegAllocError> {
        let id = self
            .allocatable
            .find_first_in_pool(pool, &self.used)
            .ok_or(RegAllocError::PoolExhausted(pool))?;
        let reg = AsmReg::new(pool, id);
        self.used.set(reg);
        log::trace!("allocated {} from {} pool", reg, pool.name());
        Ok(reg)
    }

    /// (used, total) for a pool.
    pub fn pool_usage(&self, pool: RegPool) -> (u32, u32) {
        (
            self.used.count_in_pool(pool),
            self.allocatable.count_in_pool(pool),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regbitset_operations() {
        let mut set = RegBitSet::new();
        let reg = AsmReg::new(RegPool::Saved, 5);

        assert!(!set.contains(reg));
        set.set(reg);
        assert!(set.contains(reg));
        assert!(!set.contains(AsmReg::new(RegPool::Temporary, 5)));
    }

    #[test]
    fn test_allocation_is_in_order() {
        let mut regfile = RegisterFile::new([3, 2, 1]);

        let t0 = regfile.allocate(RegPool::Temporary).unwrap();
        let t1 = regfile.allocate(RegPool::Temporary).unwrap();
        let s0 = regfile.allocate(RegPool::Saved).unwrap();

        assert_eq!(t0.to_string(), "$t0");
        assert_eq!(t1.to_string(), "$t1");
        assert_eq!(s0.to_string(), "$s0");
        assert_eq!(regfile.pool_usage(RegPool::Temporary), (2, 3));
    }

    #[test]
    fn test_pool_exhaustion() {
        let mut regfile = RegisterFile::new([2, 0, 1]);

        regfile.allocate(RegPool::Temporary).unwrap();
        regfile.allocate(RegPool::Temporary).unwrap();
        assert_eq!(
            regfile.allocate(RegPool::Temporary),
            Err(RegAllocError::PoolExhausted(RegPool::Temporary))
        );
        assert_eq!(
            regfile.allocate(RegPool::Saved),
            Err(RegAllocError::PoolExhausted(RegPool::Saved))
        );
        // Other pools are unaffected.
        assert!(regfile.allocate(RegPool::Argument).is_ok());
    }

    #[test]
    fn test_pool_usage_stats() {
        let mut regfile = RegisterFile::new([10, 8, 4]);
        regfile.allocate(RegPool::Saved).unwrap();
        regfile.allocate(RegPool::Saved).unwrap();

        assert_eq!(regfile.pool_usage(RegPool::Saved), (2, 8));
        assert_eq!(regfile.pool_usage(RegPool::Temporary), (0, 10));
    }
}
