//! Power-of-two size histogram maintained alongside every tree mutation.

/// Counts of live segments by power-of-two size bucket.
///
/// Bucket `i` counts segments whose size `s` satisfies
/// `2^i <= s < 2^(i+1)`, i.e. `i == floor(log2(s))`. The tree records and
/// forgets segments as it mutates, so reporting is O(1); the full table can
/// be recomputed from the container for verification.
#[derive(Clone)]
pub struct SizeHistogram {
    buckets: [u64; SizeHistogram::BUCKETS],
}

impl SizeHistogram {
    /// One bucket per possible bit position of a 64-bit segment size.
    pub const BUCKETS: usize = 64;

    pub fn new() -> SizeHistogram {
        SizeHistogram {
            buckets: [0; Self::BUCKETS],
        }
    }

    /// Returns the bucket index for a segment of `size` bytes.
    #[inline]
    pub fn bucket_of(size: u64) -> usize {
        assert_ne!(size, 0);
        (63 - size.leading_zeros()) as usize
    }

    /// Accounts for a newly present segment of `size` bytes.
    #[inline]
    pub fn record(&mut self, size: u64) {
        let idx = Self::bucket_of(size);
        self.buckets[idx] += 1;
        debug_assert_ne!(self.buckets[idx], 0);
    }

    /// Accounts for a removed or resized-away segment of `size` bytes.
    #[inline]
    pub fn forget(&mut self, size: u64) {
        let idx = Self::bucket_of(size);
        debug_assert_ne!(self.buckets[idx], 0);
        self.buckets[idx] -= 1;
    }

    /// Total number of segments accounted for, summed over all buckets.
    pub fn count_segments(&self) -> u64 {
        self.buckets.iter().sum()
    }

    #[inline]
    pub fn buckets(&self) -> &[u64; Self::BUCKETS] {
        &self.buckets
    }

    pub fn clear(&mut self) {
        self.buckets = [0; Self::BUCKETS];
    }
}

impl Default for SizeHistogram {
    fn default() -> Self {
        SizeHistogram::new()
    }
}

impl PartialEq for SizeHistogram {
    fn eq(&self, other: &Self) -> bool {
        self.buckets == other.buckets
    }
}

impl Eq for SizeHistogram {}

impl std::fmt::Debug for SizeHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Print only the populated buckets.
        f.debug_map()
            .entries(
                self.buckets
                    .iter()
                    .enumerate()
                    .filter(|&(_, &count)| count != 0),
            )
            .finish()
    }
}
