//! Faction tallies and ownership diffing.
//!
//! Both functions are pure: the collector feeds them what it read inside its
//! transaction and writes back what they return.

use std::collections::BTreeMap;

use gymwatch_types::{ChangeEvent, GymId, HistorySample, Team};

/// Count gyms per faction.
///
/// Every observed gym counts toward `total`; neutral gyms count toward
/// nothing else. An empty observation yields an all-zero sample.
pub fn tally<'a, I>(teams: I, timestamp: i64) -> HistorySample
where
    I: IntoIterator<Item = &'a Team>,
{
    let mut sample = HistorySample {
        timestamp,
        mystic: 0,
        valor: 0,
        instinct: 0,
        total: 0,
    };

    for team in teams {
        let slot = match team {
            Team::Mystic => Some(&mut sample.mystic),
            Team::Valor => Some(&mut sample.valor),
            Team::Instinct => Some(&mut sample.instinct),
            Team::Neutral => None,
        };
        if let Some(count) = slot {
            *count = count.saturating_add(1);
        }
        sample.total = sample.total.saturating_add(1);
    }

    sample
}

/// Compare current owners against last known owners.
///
/// For each observed gym:
/// - no last known owner: one first-observation event (`old_team: None`),
///   even when the gym is neutral;
/// - owner differs: one event from the last known owner to the current one;
/// - owner unchanged: nothing.
///
/// Gyms that have a last known owner but were not observed are left alone.
pub fn diff_ownership(
    current: &[(GymId, Team)],
    last_known: &BTreeMap<GymId, Team>,
    now: i64,
) -> Vec<ChangeEvent> {
    current
        .iter()
        .filter_map(|(gym_id, team)| match last_known.get(gym_id) {
            None => Some(ChangeEvent {
                gym_id: gym_id.clone(),
                old_team: None,
                new_team: *team,
                changed_at: now,
            }),
            Some(last) if last != team => Some(ChangeEvent {
                gym_id: gym_id.clone(),
                old_team: Some(*last),
                new_team: *team,
                changed_at: now,
            }),
            Some(_) => None,
        })
        .collect()
}
