//! Contested-gym ranking.
//!
//! Gyms are ranked by how many change rows they have within the window
//! (first observations included), ties broken by the newest change. Each
//! ranked gym carries its most recent real transitions: rows whose old and
//! new owner differ once a missing old owner is read as neutral.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use gymwatch_types::{ChangeEvent, ContestedGym, GymId, RecentChange, Team};

/// Number of gyms in the ranking.
pub const CONTESTED_LIMIT: usize = 20;

/// Recent transitions attached to each ranked gym.
pub const RECENT_CHANGES_LIMIT: usize = 5;

/// Change count of one gym within the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTally {
    /// The gym.
    pub gym_id: GymId,
    /// Current display name.
    pub name: Option<String>,
    /// Current owner.
    pub team: Team,
    /// Change rows within the window.
    pub change_count: u32,
    /// Newest change within the window, Unix seconds.
    pub last_changed: i64,
}

/// Order tallies by `(change_count DESC, last_changed DESC)` and keep the
/// first `limit`. Remaining ties fall back to gym id so the order is stable.
pub fn rank_contested(mut tallies: Vec<ChangeTally>, limit: usize) -> Vec<ChangeTally> {
    tallies.sort_by(|a, b| {
        (Reverse(a.change_count), Reverse(a.last_changed), &a.gym_id).cmp(&(
            Reverse(b.change_count),
            Reverse(b.last_changed),
            &b.gym_id,
        ))
    });
    tallies.truncate(limit);
    tallies
}

/// Group events by gym, keeping at most `limit` real transitions each.
///
/// `events` must be ordered newest first within each gym.
pub fn recent_transitions(
    events: &[ChangeEvent],
    limit: usize,
) -> BTreeMap<GymId, Vec<RecentChange>> {
    let mut by_gym: BTreeMap<GymId, Vec<RecentChange>> = BTreeMap::new();
    for event in events.iter().filter(|e| e.is_transition()) {
        let recent = by_gym.entry(event.gym_id.clone()).or_default();
        if recent.len() < limit {
            recent.push(RecentChange::from(event));
        }
    }
    by_gym
}

/// Attach recent transitions to ranked tallies.
pub fn assemble(
    ranked: Vec<ChangeTally>,
    mut recent: BTreeMap<GymId, Vec<RecentChange>>,
) -> Vec<ContestedGym> {
    ranked
        .into_iter()
        .map(|tally| {
            let recent_changes = recent.remove(&tally.gym_id).unwrap_or_default();
            ContestedGym {
                id: tally.gym_id,
                name: tally.name,
                team: tally.team,
                change_count: tally.change_count,
                last_changed: tally.last_changed,
                recent_changes,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(id: &str, change_count: u32, last_changed: i64) -> ChangeTally {
        ChangeTally {
            gym_id: GymId::from(id),
            name: None,
            team: Team::Mystic,
            change_count,
            last_changed,
        }
    }

    fn event(id: &str, old: Option<Team>, new: Team, at: i64) -> ChangeEvent {
        ChangeEvent {
            gym_id: GymId::from(id),
            old_team: old,
            new_team: new,
            changed_at: at,
        }
    }

    fn ids(ranked: &[ChangeTally]) -> Vec<&str> {
        ranked.iter().map(|t| t.gym_id.as_str()).collect()
    }

    #[test]
    fn ranks_by_count_then_recency() {
        let ranked = rank_contested(
            vec![tally("a", 2, 100), tally("b", 5, 50), tally("c", 2, 300)],
            CONTESTED_LIMIT,
        );
        assert_eq!(ids(&ranked), vec!["b", "c", "a"]);
    }

    #[test]
    fn equal_counts_order_by_last_changed_descending() {
        let ranked = rank_contested(vec![tally("x", 3, 10), tally("y", 3, 20)], CONTESTED_LIMIT);
        assert_eq!(ids(&ranked), vec!["y", "x"]);
    }

    #[test]
    fn ranking_is_truncated() {
        let tallies = (0..30).map(|i| tally(&format!("g{i:02}"), 1, i)).collect();
        let ranked = rank_contested(tallies, CONTESTED_LIMIT);
        assert_eq!(ranked.len(), CONTESTED_LIMIT);
        assert_eq!(ranked.first().map(|t| t.last_changed), Some(29));
    }

    #[test]
    fn recent_transitions_skip_normalized_noops() {
        let events = vec![
            event("a", Some(Team::Valor), Team::Mystic, 500),
            event("a", Some(Team::Neutral), Team::Valor, 400),
            event("a", None, Team::Neutral, 100),
            event("b", None, Team::Instinct, 50),
        ];
        let recent = recent_transitions(&events, RECENT_CHANGES_LIMIT);

        let a = recent.get(&GymId::from("a")).cloned().unwrap_or_default();
        assert_eq!(
            a.iter().map(|c| c.changed_at).collect::<Vec<_>>(),
            vec![500, 400]
        );

        // A first sighting of an owned gym reads as neutral -> owner.
        let b = recent.get(&GymId::from("b")).cloned().unwrap_or_default();
        assert_eq!(b.len(), 1);
        assert_eq!(b.first().and_then(|c| c.old_team), None);
    }

    #[test]
    fn recent_transitions_are_capped() {
        let events: Vec<ChangeEvent> = (0..8)
            .map(|i| {
                let (old, new) = if i % 2 == 0 {
                    (Team::Mystic, Team::Valor)
                } else {
                    (Team::Valor, Team::Mystic)
                };
                event("a", Some(old), new, 1_000 - i)
            })
            .collect();
        let recent = recent_transitions(&events, RECENT_CHANGES_LIMIT);
        let a = recent.get(&GymId::from("a")).cloned().unwrap_or_default();
        assert_eq!(a.len(), RECENT_CHANGES_LIMIT);
        assert_eq!(a.first().map(|c| c.changed_at), Some(1_000));
    }

    #[test]
    fn assemble_keeps_rank_order_and_attaches_history() {
        let ranked = vec![tally("b", 4, 9), tally("a", 1, 3)];
        let recent = recent_transitions(
            &[event("b", Some(Team::Mystic), Team::Valor, 9)],
            RECENT_CHANGES_LIMIT,
        );
        let gyms = assemble(ranked, recent);
        assert_eq!(gyms.len(), 2);
        assert_eq!(gyms.first().map(|g| g.recent_changes.len()), Some(1));
        assert_eq!(gyms.get(1).map(|g| g.recent_changes.is_empty()), Some(true));
    }
}
