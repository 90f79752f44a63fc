//! Defender payload parsing and per-faction composition.
//!
//! The scanner stores each gym's defenders as a JSON-encoded list. A payload
//! that does not parse is logged and skipped; it never aborts the
//! aggregation or the snapshot it belongs to.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use gymwatch_types::{Defender, DefenderComposition, DefenderUsage, GymId, OverallStats, Team, TeamStat};

use crate::buckets::rounded_mean;

/// Defender keys listed per faction.
pub const TOP_DEFENDERS_LIMIT: usize = 10;

/// Parse a gym's defender payload.
///
/// A missing, blank or `null` payload is an empty list. A payload that is
/// not a JSON list of defenders yields `None` after a warning.
pub fn parse_defenders(gym_id: &GymId, raw: Option<&str>) -> Option<Vec<Defender>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Some(Vec::new());
    };

    match serde_json::from_str::<Option<Vec<Defender>>>(raw) {
        Ok(defenders) => Some(defenders.unwrap_or_default()),
        Err(e) => {
            tracing::warn!(gym_id = %gym_id, error = %e, "Skipping malformed defender payload");
            None
        }
    }
}

/// Grouping key: species, form, costume.
type DefenderKey = (u32, u32, u32);

#[derive(Debug, Default)]
struct KeyStats {
    count: u32,
    power: u64,
}

#[derive(Debug, Default)]
struct TeamAccumulator {
    species: BTreeSet<u32>,
    units: u32,
    power: u64,
    keys: BTreeMap<DefenderKey, KeyStats>,
}

impl TeamAccumulator {
    fn add(&mut self, defender: &Defender) {
        let power = u64::from(defender.power());
        self.species.insert(defender.pokemon_id);
        self.units = self.units.saturating_add(1);
        self.power = self.power.saturating_add(power);

        let key = (defender.pokemon_id, defender.form, defender.costume);
        let stats = self.keys.entry(key).or_default();
        stats.count = stats.count.saturating_add(1);
        stats.power = stats.power.saturating_add(power);
    }

    fn finish(self, team: Team) -> TeamStat {
        let mut usage: Vec<DefenderUsage> = self
            .keys
            .into_iter()
            .map(|((pokemon_id, form, costume), stats)| DefenderUsage {
                pokemon_id,
                form,
                costume,
                count: stats.count,
                average_power: rounded_mean(stats.power, u64::from(stats.count)),
            })
            .collect();
        // Stable sort: equal counts keep key order from the BTreeMap.
        usage.sort_by_key(|u| Reverse(u.count));
        usage.truncate(TOP_DEFENDERS_LIMIT);

        TeamStat {
            team,
            unique_species: u32::try_from(self.species.len()).unwrap_or(u32::MAX),
            total_units: self.units,
            total_power: self.power,
            average_power: rounded_mean(self.power, u64::from(self.units)),
            top_defenders: usage,
        }
    }
}

/// Fold gyms' defenders into per-faction statistics.
///
/// Input is `(owner, defenders)` per gym. Neutral gyms contribute nothing.
/// The result always lists the three factions in team id order.
pub fn compose<I>(gyms: I, timestamp: i64) -> DefenderComposition
where
    I: IntoIterator<Item = (Team, Vec<Defender>)>,
{
    let mut accumulators: BTreeMap<Team, TeamAccumulator> = Team::FACTIONS
        .iter()
        .map(|team| (*team, TeamAccumulator::default()))
        .collect();

    for (team, defenders) in gyms {
        let Some(acc) = accumulators.get_mut(&team) else {
            continue;
        };
        for defender in &defenders {
            acc.add(defender);
        }
    }

    let teams: Vec<TeamStat> = accumulators
        .into_iter()
        .map(|(team, acc)| acc.finish(team))
        .collect();
    let total_units = teams
        .iter()
        .fold(0_u32, |sum, t| sum.saturating_add(t.total_units));

    DefenderComposition {
        teams,
        overall: OverallStats {
            total_units,
            timestamp,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defender(pokemon_id: u32, form: u32, cp: u32) -> Defender {
        Defender {
            pokemon_id,
            form,
            costume: 0,
            gender: None,
            shiny: None,
            cp_now: Some(cp),
            cp_when_deployed: None,
            deployed_ms: None,
        }
    }

    fn stat(composition: &DefenderComposition, team: Team) -> Option<&TeamStat> {
        composition.teams.iter().find(|t| t.team == team)
    }

    #[test]
    fn parse_valid_payload() {
        let raw = r#"[{"pokemon_id": 143, "form": 0, "cp_now": 2500}, {"pokemon_id": 242}]"#;
        let parsed = parse_defenders(&GymId::from("g"), Some(raw));
        assert_eq!(parsed.map(|d| d.len()), Some(2));
    }

    #[test]
    fn missing_or_null_payload_is_empty() {
        let id = GymId::from("g");
        assert_eq!(parse_defenders(&id, None), Some(Vec::new()));
        assert_eq!(parse_defenders(&id, Some("  ")), Some(Vec::new()));
        assert_eq!(parse_defenders(&id, Some("null")), Some(Vec::new()));
    }

    #[test]
    fn malformed_payload_is_skipped() {
        let id = GymId::from("g");
        assert_eq!(parse_defenders(&id, Some("[{broken")), None);
        assert_eq!(parse_defenders(&id, Some(r#"{"pokemon_id": 1}"#)), None);
    }

    #[test]
    fn composition_groups_per_team() {
        let gyms = vec![
            (
                Team::Mystic,
                vec![defender(143, 0, 3000), defender(143, 0, 2000), defender(242, 0, 1000)],
            ),
            (Team::Valor, vec![defender(149, 0, 3500)]),
            (Team::Neutral, vec![defender(1, 0, 10)]),
        ];
        let composition = compose(gyms, 1_700_000_000);

        assert_eq!(composition.teams.len(), 3);
        assert_eq!(composition.overall.total_units, 4);
        assert_eq!(composition.overall.timestamp, 1_700_000_000);

        let mystic = stat(&composition, Team::Mystic);
        assert_eq!(mystic.map(|s| s.unique_species), Some(2));
        assert_eq!(mystic.map(|s| s.total_units), Some(3));
        assert_eq!(mystic.map(|s| s.total_power), Some(6000));
        assert_eq!(mystic.map(|s| s.average_power), Some(2000));

        let top = mystic.and_then(|s| s.top_defenders.first());
        assert_eq!(top.map(|u| (u.pokemon_id, u.count, u.average_power)), Some((143, 2, 2500)));

        let instinct = stat(&composition, Team::Instinct);
        assert_eq!(instinct.map(|s| s.total_units), Some(0));
        assert_eq!(instinct.map(|s| s.average_power), Some(0));
    }

    #[test]
    fn forms_are_distinct_keys_but_same_species() {
        let gyms = vec![(Team::Instinct, vec![defender(26, 0, 1), defender(26, 50, 1)])];
        let composition = compose(gyms, 0);
        let instinct = stat(&composition, Team::Instinct);
        assert_eq!(instinct.map(|s| s.unique_species), Some(1));
        assert_eq!(instinct.map(|s| s.top_defenders.len()), Some(2));
    }

    #[test]
    fn top_defenders_are_capped() {
        let defenders = (1..=15).map(|id| defender(id, 0, 100)).collect();
        let composition = compose(vec![(Team::Valor, defenders)], 0);
        let valor = stat(&composition, Team::Valor);
        assert_eq!(valor.map(|s| s.top_defenders.len()), Some(TOP_DEFENDERS_LIMIT));
        assert_eq!(valor.map(|s| s.unique_species), Some(15));
    }
}
