//! Seeded linear congruential generator for reproducible sampling.

/// GCC's LCG: `state = (a * state + c) mod 2^31`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    state: u64,
}

const MODULUS: u64 = 1 << 31;
const MULTIPLIER: u64 = 1_103_515_245;
const INCREMENT: u64 = 12_345;

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self {
            state: u64::from(seed) % MODULUS,
        }
    }

    /// Next raw value in `0..2^31`.
    pub fn next_int(&mut self) -> u32 {
        self.state = (MULTIPLIER * self.state + INCREMENT) % MODULUS;
        self.state as u32
    }

    /// Next value in `[0, 1]`.
    pub fn random(&mut self) -> f64 {
        f64::from(self.next_int()) / (MODULUS - 1) as f64
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = ((self.random() * (i + 1) as f64).floor() as usize).min(i);
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sequence() {
        let mut rng = Lcg::new(42);
        assert_eq!(rng.next_int(), 1_250_496_027);
        assert_eq!(rng.next_int(), 1_116_302_264);
    }

    #[test]
    fn test_random_range() {
        let mut rng = Lcg::new(7);
        for _ in 0..1000 {
            let value = rng.random();
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_shuffle_is_reproducible_permutation() {
        let mut a: Vec<u32> = (0..50).collect();
        let mut b = a.clone();
        Lcg::new(42).shuffle(&mut a);
        Lcg::new(42).shuffle(&mut b);
        assert_eq!(a, b);
        assert_ne!(a, (0..50).collect::<Vec<_>>());

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());

        let mut c: Vec<u32> = (0..50).collect();
        Lcg::new(43).shuffle(&mut c);
        assert_ne!(a, c);
    }
}
