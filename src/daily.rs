// Daily task sequencing and leaderboard ranking
// Pure functions over rows already read from the database, so the ordering
// and selection rules are testable without a live module.

use std::collections::HashSet;

use spacetimedb::Timestamp;

use crate::{Challenge, ChallengeKind, Player};

/// Daily reset at midnight MSK (9pm UTC). Challenges and quest days roll
/// over at local midnight for the participants, not at UTC midnight.
const RESET_HOUR_UTC: u64 = 21;

const HOUR_MICROS: u64 = 60 * 60 * 1_000_000;
const DAY_MICROS: u64 = 24 * HOUR_MICROS;

/// Bounds `[start, end)` in micros of the calendar day containing `now`.
pub fn day_bounds(now: Timestamp) -> (u64, u64) {
    let offset_micros = RESET_HOUR_UTC * HOUR_MICROS;
    let now_micros = now.to_micros_since_unix_epoch() as u64;
    let day_index = now_micros.saturating_sub(offset_micros) / DAY_MICROS;
    let day_start = day_index * DAY_MICROS + offset_micros;
    (day_start, day_start + DAY_MICROS)
}

/// A challenge counts as active on a day when its window touches any part
/// of that day: `starts_at` before the day ends and `ends_at` at or after
/// the day starts.
pub fn is_active_on(challenge: &Challenge, day_start: u64, day_end: u64) -> bool {
    let starts = challenge.starts_at.to_micros_since_unix_epoch() as u64;
    let ends = challenge.ends_at.to_micros_since_unix_epoch() as u64;
    starts < day_end && ends >= day_start
}

/// Order a day's active challenges into the fixed three-stage sequence and
/// keep one challenge per kind. Admin writes reject overlapping same-kind
/// windows, so the dedup only matters for historical or bulk-restored
/// catalogs - the lowest id wins, matching what the admin created first.
pub fn daily_challenges(mut active: Vec<Challenge>) -> Vec<Challenge> {
    active.sort_by(|a, b| {
        a.kind
            .stage()
            .cmp(&b.kind.stage())
            .then(a.id.cmp(&b.id))
    });

    let mut ordered: Vec<Challenge> = Vec::with_capacity(active.len());
    for challenge in active {
        if !ordered.iter().any(|c| c.kind == challenge.kind) {
            ordered.push(challenge);
        }
    }
    ordered
}

/// The current challenge is the first one, in stage order, the participant
/// has no award for. `None` means either everything is done or nothing is
/// scheduled - callers render the "all done" state in both cases.
pub fn current_challenge<'a>(
    ordered: &'a [Challenge],
    completed_ids: &HashSet<u64>,
) -> Option<&'a Challenge> {
    ordered.iter().find(|c| !completed_ids.contains(&c.id))
}

/// Per-kind completion state for the day, in stage order.
pub struct TaskStatus {
    pub challenge_id: u64,
    pub kind: ChallengeKind,
    pub completed: bool,
    pub is_current: bool,
}

pub fn statuses(ordered: &[Challenge], completed_ids: &HashSet<u64>) -> Vec<TaskStatus> {
    let current_id = current_challenge(ordered, completed_ids).map(|c| c.id);
    ordered
        .iter()
        .map(|c| TaskStatus {
            challenge_id: c.id,
            kind: c.kind.clone(),
            completed: completed_ids.contains(&c.id),
            is_current: current_id == Some(c.id),
        })
        .collect()
}

/// Rank players for the leaderboard: score descending, ascending player id
/// as the deterministic tie-break. Tied scores share a display position and
/// the next distinct score skips ahead (1, 1, 3, ...).
pub fn rank_players(mut players: Vec<Player>) -> Vec<(u32, Player)> {
    players.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));

    let mut ranked: Vec<(u32, Player)> = Vec::with_capacity(players.len());
    let mut display_position = 1u32;
    for (i, player) in players.into_iter().enumerate() {
        if i > 0 && ranked[i - 1].1.score != player.score {
            display_position = (i + 1) as u32;
        }
        ranked.push((display_position, player));
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(micros: u64) -> Timestamp {
        Timestamp::from_micros_since_unix_epoch(micros as i64)
    }

    fn challenge(id: u64, kind: ChallengeKind, starts: u64, ends: u64) -> Challenge {
        Challenge {
            id,
            starts_at: ts(starts),
            ends_at: ts(ends),
            kind,
            description: None,
            answer: "True".to_string(),
            points: 10,
            created_at: ts(starts),
        }
    }

    fn player(id: &str, score: i64) -> Player {
        Player {
            id: id.to_string(),
            first_name: "Test".to_string(),
            last_name: id.to_string(),
            score,
            registered_at: ts(0),
        }
    }

    // Day 1000 relative to the reset offset, well past the epoch
    const DAY: u64 = DAY_MICROS;
    const DAY_1000_START: u64 = 1000 * DAY + RESET_HOUR_UTC * HOUR_MICROS;

    #[test]
    fn test_day_bounds_cover_a_full_day() {
        let noon = DAY_1000_START + 12 * HOUR_MICROS;
        let (start, end) = day_bounds(ts(noon));
        assert_eq!(start, DAY_1000_START);
        assert_eq!(end, DAY_1000_START + DAY);

        // First and last instant of the day resolve to the same bounds
        assert_eq!(day_bounds(ts(start)), (start, end));
        assert_eq!(day_bounds(ts(end - 1)), (start, end));
        // The next instant rolls over
        assert_eq!(day_bounds(ts(end)).0, end);
    }

    #[test]
    fn test_window_overlap_edges() {
        let (start, end) = (DAY_1000_START, DAY_1000_START + DAY);

        // Spans the whole day
        assert!(is_active_on(&challenge(1, ChallengeKind::TrueFalse, start - DAY, end + DAY), start, end));
        // Ends exactly at day start - still touches the day
        assert!(is_active_on(&challenge(2, ChallengeKind::TrueFalse, start - DAY, start), start, end));
        // Starts at the last instant of the day
        assert!(is_active_on(&challenge(3, ChallengeKind::TrueFalse, end - 1, end + DAY), start, end));
        // Ended the instant before the day started
        assert!(!is_active_on(&challenge(4, ChallengeKind::TrueFalse, start - DAY, start - 1), start, end));
        // Starts once the day is over
        assert!(!is_active_on(&challenge(5, ChallengeKind::TrueFalse, end, end + DAY), start, end));
    }

    #[test]
    fn test_fixed_stage_order_regardless_of_insertion() {
        let (start, end) = (DAY_1000_START, DAY_1000_START + DAY);
        let active = vec![
            challenge(3, ChallengeKind::FreeAnswer, start, end),
            challenge(1, ChallengeKind::TrueFalse, start, end),
            challenge(2, ChallengeKind::PosterGuess, start, end),
        ];
        let ordered = daily_challenges(active);
        let kinds: Vec<_> = ordered.iter().map(|c| c.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                ChallengeKind::TrueFalse,
                ChallengeKind::PosterGuess,
                ChallengeKind::FreeAnswer
            ]
        );
    }

    #[test]
    fn test_one_challenge_per_kind_lowest_id_wins() {
        let (start, end) = (DAY_1000_START, DAY_1000_START + DAY);
        let active = vec![
            challenge(7, ChallengeKind::TrueFalse, start, end),
            challenge(2, ChallengeKind::TrueFalse, start, end),
            challenge(5, ChallengeKind::FreeAnswer, start, end),
        ];
        let ordered = daily_challenges(active);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].id, 2);
        assert_eq!(ordered[1].id, 5);
    }

    #[test]
    fn test_current_advances_through_stages() {
        let (start, end) = (DAY_1000_START, DAY_1000_START + DAY);
        let ordered = daily_challenges(vec![
            challenge(1, ChallengeKind::TrueFalse, start, end),
            challenge(2, ChallengeKind::PosterGuess, start, end),
            challenge(3, ChallengeKind::FreeAnswer, start, end),
        ]);

        let mut completed = HashSet::new();
        assert_eq!(current_challenge(&ordered, &completed).unwrap().id, 1);

        completed.insert(1);
        assert_eq!(current_challenge(&ordered, &completed).unwrap().id, 2);

        // Answering out of order is fine - current skips completed ids
        completed.insert(3);
        assert_eq!(current_challenge(&ordered, &completed).unwrap().id, 2);

        completed.insert(2);
        assert!(current_challenge(&ordered, &completed).is_none());
    }

    #[test]
    fn test_current_is_none_without_challenges() {
        assert!(current_challenge(&[], &HashSet::new()).is_none());
    }

    #[test]
    fn test_statuses_mark_exactly_one_current() {
        let (start, end) = (DAY_1000_START, DAY_1000_START + DAY);
        let ordered = daily_challenges(vec![
            challenge(1, ChallengeKind::TrueFalse, start, end),
            challenge(2, ChallengeKind::PosterGuess, start, end),
            challenge(3, ChallengeKind::FreeAnswer, start, end),
        ]);
        let completed: HashSet<u64> = [1].into_iter().collect();

        let status = statuses(&ordered, &completed);
        assert_eq!(status.len(), 3);
        assert!(status[0].completed && !status[0].is_current);
        assert!(!status[1].completed && status[1].is_current);
        assert!(!status[2].completed && !status[2].is_current);
        assert_eq!(status.iter().filter(|s| s.is_current).count(), 1);
    }

    #[test]
    fn test_rank_players_tie_break_and_positions() {
        let ranked = rank_players(vec![
            player("3001", 20),
            player("1001", 50),
            player("2001", 20),
            player("4001", 5),
        ]);
        let view: Vec<(u32, &str, i64)> = ranked
            .iter()
            .map(|(pos, p)| (*pos, p.id.as_str(), p.score))
            .collect();
        assert_eq!(
            view,
            vec![
                (1, "1001", 50),
                (2, "2001", 20), // tied pair ordered by ascending id
                (2, "3001", 20),
                (4, "4001", 5), // position skips past the tie
            ]
        );
    }
}
