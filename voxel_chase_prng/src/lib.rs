// Seeded pseudo-random number generator for chase agents.
//
// xoshiro256++ (Blackman & Vigna, 2019) expanded from a single `u64` seed
// with SplitMix64. Every `ChaseAgent` owns one `ChaseRng`, so an agent's
// wandering, direction-change dice and oscillation fallbacks replay exactly
// given the same seed and the same world.
//
// The generator is hand-rolled rather than pulled from `rand` so the
// sequence is pinned to this source file and cannot drift with a dependency
// upgrade.
//
// See also: `voxel_chase_nav::chase` for the direction selector that draws
// from this generator.
//
// **Critical constraint: determinism.** No floating point inside the core
// generator, no OS entropy, no platform-dependent integer widths.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ state. A clone replays the same stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaseRng {
    s: [u64; 4],
}

impl ChaseRng {
    /// Seed a generator. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform integer in `[0, bound)` without modulo bias.
    ///
    /// Panics if `bound == 0`.
    pub fn below(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "below: bound must be positive");
        if bound.is_power_of_two() {
            return self.next_u64() & (bound - 1);
        }
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return r % bound;
            }
        }
    }

    /// Uniform index into a collection of `len` items.
    ///
    /// Panics if `len == 0`.
    pub fn index(&mut self, len: usize) -> usize {
        self.below(len as u64) as usize
    }

    /// Roll a die with `odds` faces and report whether it came up zero.
    /// `one_in(1)` is always true; `one_in(0)` is treated as `one_in(1)`.
    pub fn one_in(&mut self, odds: u32) -> bool {
        self.below(u64::from(odds.max(1))) == 0
    }

    /// Pick a uniformly random element, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.index(items.len())])
        }
    }
}

/// SplitMix64 step, used only to expand seeds.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
