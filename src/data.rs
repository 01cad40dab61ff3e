use std::num::NonZeroU64;

use rustc_hash::FxHashMap;

/// Running statistics for one key. All readings are scaled by ten.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct Data {
    pub total: i64,
    pub count: NonZeroU64,
    pub min: i16,
    pub max: i16,
}

/// Key bytes to their statistics. Keys are opaque and compared byte-wise.
pub type AggregationMap = FxHashMap<Box<[u8]>, Data>;

impl Data {
    pub fn new(reading: i16) -> Self {
        Data {
            total: reading as i64,
            count: NonZeroU64::MIN,
            min: reading,
            max: reading,
        }
    }

    /// Fold a single reading into the entry.
    #[inline]
    pub fn record(&mut self, reading: i16) {
        self.total += reading as i64;
        self.count = self.count.saturating_add(1);
        self.min = self.min.min(reading);
        self.max = self.max.max(reading);
    }

    /// Fold another entry for the same key, as one batch observation.
    #[inline]
    pub fn merge(&mut self, other: &Data) {
        self.total += other.total;
        self.count = self.count.saturating_add(other.count.get());
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Mean of the scaled readings, still scaled by ten.
    pub fn mean(&self) -> f64 {
        self.total as f64 / self.count.get() as f64
    }
}

/// Record `reading` under `key`, allocating the key only on first sight.
#[inline]
pub fn record(map: &mut AggregationMap, key: &[u8], reading: i16) {
    match map.get_mut(key) {
        Some(data) => data.record(reading),
        None => {
            map.insert(key.into(), Data::new(reading));
        }
    }
}

/// Drain `next` into `base`.
pub fn merge_into(base: &mut AggregationMap, next: AggregationMap) {
    for (k, v) in next {
        base.entry(k).and_modify(|e| e.merge(&v)).or_insert(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(readings: &[i16]) -> Data {
        let mut data = Data::new(readings[0]);
        for &r in &readings[1..] {
            data.record(r);
        }
        data
    }

    #[test]
    fn first_reading_seeds_every_field() {
        let data = Data::new(-25);
        assert_eq!(data.min, -25);
        assert_eq!(data.max, -25);
        assert_eq!(data.total, -25);
        assert_eq!(data.count.get(), 1);
    }

    #[test]
    fn record_tracks_extremes_and_totals() {
        let data = entry(&[10, -25, 30]);
        assert_eq!(data.min, -25);
        assert_eq!(data.max, 30);
        assert_eq!(data.total, 15);
        assert_eq!(data.count.get(), 3);
        assert_eq!(data.mean(), 5.0);
    }

    #[test]
    fn merge_matches_recording_everything_in_one_entry() {
        let mut left = entry(&[10, 20]);
        left.merge(&entry(&[-5, 40, 0]));
        assert_eq!(left, entry(&[10, 20, -5, 40, 0]));
    }

    #[test]
    fn merge_into_inserts_unseen_keys() {
        let mut base = AggregationMap::default();
        record(&mut base, b"A", 10);

        let mut next = AggregationMap::default();
        record(&mut next, b"A", 30);
        record(&mut next, b"B", -25);

        merge_into(&mut base, next);

        assert_eq!(base.len(), 2);
        assert_eq!(base[&b"A"[..]], entry(&[10, 30]));
        assert_eq!(base[&b"B"[..]], Data::new(-25));
    }

    fn arb_data() -> impl Strategy<Value = Data> {
        prop::collection::vec(-999i16..=999, 1..20).prop_map(|r| entry(&r))
    }

    proptest! {
        #[test]
        fn merge_is_commutative(a in arb_data(), b in arb_data()) {
            let mut ab = a;
            ab.merge(&b);
            let mut ba = b;
            ba.merge(&a);
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn merge_is_associative(a in arb_data(), b in arb_data(), c in arb_data()) {
            let mut left = a;
            left.merge(&b);
            left.merge(&c);

            let mut bc = b;
            bc.merge(&c);
            let mut right = a;
            right.merge(&bc);

            prop_assert_eq!(left, right);
        }
    }
}
