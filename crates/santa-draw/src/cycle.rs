//! Shuffle-then-rotate: the pure half of the engine.
//!
//! The roster is shuffled uniformly (Fisher–Yates via
//! [`SliceRandom::shuffle`]) and each person gives to whoever follows
//! them in the shuffled order, wrapping at the end:
//!
//! ```text
//! shuffled:  [C, A, B]
//! pairs:     C → A,  A → B,  B → C
//! ```
//!
//! The result is always one cycle through everybody. That gives the
//! three properties a draw needs without any rejection sampling: nobody
//! draws themselves (for `n >= 2`), everybody gives exactly once, and
//! everybody receives exactly once.
//!
//! # Distribution
//!
//! This is NOT a uniformly random derangement. It is uniform over the
//! `(n-1)!` single-cycle permutations only; derangements made of several
//! smaller cycles (e.g. `A ↔ B, C ↔ D`) are never produced. Every
//! recipient is still reachable from every giver, which is the fairness
//! the game cares about.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use santa_model::Identity;

use crate::{DrawError, MIN_PARTICIPANTS};

/// One giver → recipient edge of a computed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pairing {
    pub giver: Identity,
    pub recipient: Identity,
}

/// Shuffles `participants` with `rng` and returns the gift cycle.
///
/// The returned pairs are in cycle order: each pair's recipient is the
/// next pair's giver.
///
/// # Errors
/// - [`DrawError::InsufficientParticipants`] if fewer than two people
/// - [`DrawError::DuplicateParticipant`] if an identity repeats
pub fn compute_assignments<R>(
    participants: &[Identity],
    rng: &mut R,
) -> Result<Vec<Pairing>, DrawError>
where
    R: Rng + ?Sized,
{
    if participants.len() < MIN_PARTICIPANTS {
        return Err(DrawError::InsufficientParticipants {
            required: MIN_PARTICIPANTS,
            found: participants.len(),
        });
    }

    let mut seen = HashSet::with_capacity(participants.len());
    if let Some(dup) = participants.iter().find(|id| !seen.insert(**id)) {
        return Err(DrawError::DuplicateParticipant(*dup));
    }

    let mut order = participants.to_vec();
    order.shuffle(rng);
    Ok(cycle_from_order(&order))
}

/// Pairs position `i` with position `(i + 1) % n`.
///
/// Deterministic; [`compute_assignments`] feeds it a shuffled order.
/// Returns an empty list for an empty input and a self-loop for a single
/// identity, so callers must check the size first.
pub fn cycle_from_order(order: &[Identity]) -> Vec<Pairing> {
    let n = order.len();
    (0..n)
        .map(|i| Pairing {
            giver: order[i],
            recipient: order[(i + 1) % n],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn ids(raw: &[u64]) -> Vec<Identity> {
        raw.iter().copied().map(Identity).collect()
    }

    fn pair(giver: u64, recipient: u64) -> Pairing {
        Pairing {
            giver: Identity(giver),
            recipient: Identity(recipient),
        }
    }

    /// Walks the mapping from the first giver and returns how many steps
    /// it takes to come back. A single cycle returns `n`.
    fn cycle_length(pairs: &[Pairing]) -> usize {
        let next: HashMap<Identity, Identity> =
            pairs.iter().map(|p| (p.giver, p.recipient)).collect();
        let start = pairs[0].giver;
        let mut current = next[&start];
        let mut steps = 1;
        while current != start {
            current = next[&current];
            steps += 1;
            assert!(steps <= pairs.len(), "walk did not return to start");
        }
        steps
    }

    // =====================================================================
    // cycle_from_order()
    // =====================================================================

    #[test]
    fn test_cycle_from_order_three_people() {
        // [A, B, C] shuffled to [C, A, B] → C→A, A→B, B→C.
        let (a, b, c) = (1, 2, 3);
        let pairs = cycle_from_order(&ids(&[c, a, b]));
        assert_eq!(pairs, vec![pair(c, a), pair(a, b), pair(b, c)]);
    }

    #[test]
    fn test_cycle_from_order_two_people_swap() {
        // [A, B] shuffled to [B, A] → B→A, A→B.
        let (a, b) = (1, 2);
        let pairs = cycle_from_order(&ids(&[b, a]));
        assert_eq!(pairs, vec![pair(b, a), pair(a, b)]);
    }

    #[test]
    fn test_cycle_from_order_empty_is_empty() {
        assert!(cycle_from_order(&[]).is_empty());
    }

    // =====================================================================
    // compute_assignments()
    // =====================================================================

    #[test]
    fn test_compute_assignments_zero_or_one_is_insufficient() {
        let mut rng = StdRng::seed_from_u64(1);
        for roster in [ids(&[]), ids(&[7])] {
            let err = compute_assignments(&roster, &mut rng).unwrap_err();
            assert!(matches!(
                err,
                DrawError::InsufficientParticipants { required: 2, found }
                    if found == roster.len()
            ));
        }
    }

    #[test]
    fn test_compute_assignments_duplicate_identity_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err =
            compute_assignments(&ids(&[1, 2, 1]), &mut rng).unwrap_err();
        assert!(matches!(err, DrawError::DuplicateParticipant(Identity(1))));
    }

    #[test]
    fn test_compute_assignments_is_single_cycle_bijection() {
        // Many seeds and sizes: every result must be a permutation of the
        // roster on both sides, with no fixed points, forming one cycle.
        for n in 2..=12u64 {
            let roster: Vec<Identity> = (100..100 + n).map(Identity).collect();
            for seed in 0..50 {
                let mut rng = StdRng::seed_from_u64(seed);
                let pairs = compute_assignments(&roster, &mut rng).unwrap();

                assert_eq!(pairs.len(), roster.len());
                let mut givers: Vec<Identity> =
                    pairs.iter().map(|p| p.giver).collect();
                let mut recipients: Vec<Identity> =
                    pairs.iter().map(|p| p.recipient).collect();
                givers.sort();
                recipients.sort();
                assert_eq!(givers, roster);
                assert_eq!(recipients, roster);
                assert!(pairs.iter().all(|p| p.giver != p.recipient));
                assert_eq!(cycle_length(&pairs), roster.len());
            }
        }
    }

    #[test]
    fn test_compute_assignments_same_seed_same_result() {
        let roster = ids(&[1, 2, 3, 4, 5]);
        let first =
            compute_assignments(&roster, &mut StdRng::seed_from_u64(9));
        let second =
            compute_assignments(&roster, &mut StdRng::seed_from_u64(9));
        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[test]
    fn test_compute_assignments_matches_shuffle_then_rotate() {
        // The engine is exactly "shuffle with this rng, then rotate".
        let roster = ids(&[10, 20, 30, 40]);
        let pairs =
            compute_assignments(&roster, &mut StdRng::seed_from_u64(3))
                .unwrap();

        let mut order = roster.clone();
        order.shuffle(&mut StdRng::seed_from_u64(3));
        assert_eq!(pairs, cycle_from_order(&order));
    }

    #[test]
    fn test_compute_assignments_every_recipient_reachable() {
        // Over enough draws, each giver should be seen with every other
        // participant as recipient at least once.
        let roster = ids(&[1, 2, 3, 4]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen: HashSet<Pairing> = HashSet::new();
        for _ in 0..500 {
            seen.extend(compute_assignments(&roster, &mut rng).unwrap());
        }
        // 4 givers × 3 possible recipients.
        assert_eq!(seen.len(), 12);
    }
}
