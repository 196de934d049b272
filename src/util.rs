//! Shared utilities

/// Seeded xorshift64* generator
///
/// Every emitter owns one so a particle sequence replays exactly from its
/// seed. The seed is scrambled first, so neighbouring seeds (0, 1, 2, ..)
/// still start far apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        // splitmix64 finalizer; xorshift state must be non-zero
        let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        Self { state: z.max(1) }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform in [0, 1), from the high 24 bits
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in [min, max). Reversed bounds give [max, min).
    #[inline]
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Uniform integer in [min, max]
    ///
    /// Reversed bounds are swapped rather than rejected.
    #[inline]
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        let (min, max) = if min > max { (max, min) } else { (min, max) };
        if min == max {
            return min;
        }
        let range = (i64::from(max) - i64::from(min) + 1) as u64;
        (i64::from(min) + (self.next_u64() % range) as i64) as i32
    }

    /// Random index in [0, len). Returns 0 for an empty range.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() % len as u64) as usize
    }

    /// Random element of a slice, `None` when it is empty
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.index(items.len()))
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(0x5EED_CAFE)
    }
}

/// Pack an RGB tuple into a 24-bit tint
#[inline]
pub fn rgb_to_tint(rgb: (u8, u8, u8)) -> u32 {
    (u32::from(rgb.0) << 16) | (u32::from(rgb.1) << 8) | u32::from(rgb.2)
}

/// Split a 24-bit tint into its red, green and blue channels
#[inline]
pub fn tint_to_rgb(tint: u32) -> (u8, u8, u8) {
    ((tint >> 16) as u8, (tint >> 8) as u8, tint as u8)
}

/// Combine a 24-bit tint and an alpha in [0, 1] into a packed ARGB color
#[inline]
pub fn pack_color(tint: u32, alpha: f32) -> u32 {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u32;
    (tint & 0x00FF_FFFF) | (a << 24)
}

#[inline]
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees.to_radians()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_rng_ranges() {
        let mut rng = Rng::new(7);
        for _ in 0..1000 {
            let f = rng.range_f32(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&f));
            let i = rng.range_i32(5, 1);
            assert!((1..=5).contains(&i));
            assert!(rng.index(3) < 3);
        }
        assert_eq!(rng.index(0), 0);
    }

    #[test]
    fn test_pack_color() {
        assert_eq!(pack_color(0xffffff, 1.0), 0xffff_ffff);
        assert_eq!(pack_color(0x12345678, 0.0), 0x0034_5678);
        assert_eq!(pack_color(0xff0000, 0.5) >> 24, 128);
    }

    #[test]
    fn test_neighbouring_seeds_diverge() {
        let a = Rng::new(0).next_u64();
        let b = Rng::new(1).next_u64();
        assert_ne!(a, b);
        assert_ne!(a ^ b, 1);
    }

    #[test]
    fn test_pick() {
        let mut rng = Rng::new(5);
        let empty: [u32; 0] = [];
        assert!(rng.pick(&empty).is_none());
        for _ in 0..50 {
            assert!([1, 2, 3].contains(rng.pick(&[1, 2, 3]).unwrap()));
        }
    }

    #[test]
    fn test_tint_channels() {
        assert_eq!(tint_to_rgb(0x12_34_56), (0x12, 0x34, 0x56));
        assert_eq!(rgb_to_tint(tint_to_rgb(0xAB_CD_EF)), 0xAB_CD_EF);
    }
}
