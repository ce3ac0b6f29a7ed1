// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Counting-sort ordering properties.

use proptest::prelude::*;
use vista_client::counting_sort;

proptest! {
    #[test]
    fn order_is_a_back_to_front_permutation(
        zs in prop::collection::vec(-500i16..500, 1..256),
    ) {
        let centers: Vec<[f32; 3]> = zs.iter().map(|z| [0.25, -1.0, f32::from(*z)]).collect();
        let order = counting_sort(&centers, [0.0, 0.0, 1.0]);

        let mut seen = order.clone();
        seen.sort_unstable();
        let expected: Vec<u32> = (0..).take(centers.len()).collect();
        prop_assert_eq!(seen, expected);

        for pair in order.windows(2) {
            let (a, b) = (pair[0] as usize, pair[1] as usize);
            prop_assert!(zs[a] >= zs[b], "{} before {}", zs[a], zs[b]);
            if zs[a] == zs[b] {
                prop_assert!(a < b, "ties keep index order");
            }
        }
    }
}
