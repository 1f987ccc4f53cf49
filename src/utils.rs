/// Escalating list of table capacities.
///
/// Each entry is a prime roughly twice the previous one, so that growing the
/// hash-consing table keeps its load factor well below one half.
pub const BIG_PRIMES: [usize; 21] = [
    1543, 3079, 6151, 12289, 24593, 49157, 98317, 196613, 393241, 786433, 1572869, 3145739, 6291469,
    12582917, 25165843, 50331653, 100663319, 201326611, 402653189, 805306457, 1610612741,
];

/// Smallest prime from [`BIG_PRIMES`] that is strictly larger than `need`.
///
/// # Panics
///
/// Panics if `need` exceeds the largest known prime.
pub fn next_prime(need: usize) -> usize {
    BIG_PRIMES
        .iter()
        .copied()
        .find(|&p| p > need)
        .unwrap_or_else(|| panic!("Table capacity {} is too large", need))
}

/// Thomas Wang's 32-bit integer mix.
pub fn hash_u32(key: u32) -> u32 {
    let mut key = (!key).wrapping_add(key << 15);
    key ^= key >> 12;
    key = key.wrapping_add(key << 2);
    key ^= key >> 4;
    key = key.wrapping_mul(2057);
    key ^= key >> 16;
    key
}

/// 64-bit mix folded down through [`hash_u32`].
pub fn hash_u64(key: u64) -> u64 {
    let lo = hash_u32(key as u32);
    let hi = hash_u32((key >> 32) as u32);
    let mut acc = lo;
    hash_combine(&mut acc, hi);
    acc as u64
}

/// Boost-style hash combination.
pub fn hash_combine(acc: &mut u32, other: u32) {
    *acc ^= other
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(*acc << 6)
        .wrapping_add(*acc >> 2);
}

pub trait MyHash {
    /// Hash value used by the hand-rolled tables of this crate.
    fn hash(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primes_are_increasing() {
        assert!(BIG_PRIMES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_next_prime() {
        assert_eq!(next_prime(0), 1543);
        assert_eq!(next_prime(1543), 3079);
        assert_eq!(next_prime(5000), 6151);
    }

    #[test]
    #[should_panic(expected = "is too large")]
    fn test_next_prime_overflow() {
        next_prime(usize::MAX);
    }

    #[test]
    fn test_hash_u32_spreads() {
        assert_ne!(hash_u32(1), hash_u32(2));
        assert_ne!(hash_u32(0), 0);
        assert_eq!(hash_u32(12345), hash_u32(12345));
    }

    #[test]
    fn test_hash_combine_order_matters() {
        let mut a = 1;
        hash_combine(&mut a, 2);
        let mut b = 2;
        hash_combine(&mut b, 1);
        assert_ne!(a, b);
    }
}
