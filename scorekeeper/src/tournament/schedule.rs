//! Round-robin fixture generation.

use uuid::Uuid;

use super::models::{Match, Team};

/// Every pair of teams meets once, ordered round by round with the circle method.
///
/// With an odd roster one team sits out each round.
pub fn generate_round_robin(teams: &[Team]) -> Vec<Match> {
    if teams.len() < 2 {
        return Vec::new();
    }

    let mut slots: Vec<Option<&Team>> = teams.iter().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    let mut matches = Vec::with_capacity(teams.len() * (teams.len() - 1) / 2);

    for _ in 0..n - 1 {
        for i in 0..n / 2 {
            if let (Some(home), Some(away)) = (slots[i], slots[n - 1 - i]) {
                matches.push(Match::new(Uuid::new_v4().to_string(), home.id.as_str(), away.id.as_str()));
            }
        }
        // First slot stays fixed, the rest rotate
        slots[1..].rotate_right(1);
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn roster(n: usize) -> Vec<Team> {
        (0..n).map(|i| Team::new(format!("t{i}"), format!("Team {i}"))).collect()
    }

    fn pairings(matches: &[Match]) -> HashSet<(String, String)> {
        matches
            .iter()
            .map(|m| {
                let mut pair = [m.team1_id.clone(), m.team2_id.clone()];
                pair.sort();
                let [a, b] = pair;
                (a, b)
            })
            .collect()
    }

    #[test]
    fn test_every_pair_once() {
        for n in 2..=7 {
            let matches = generate_round_robin(&roster(n));
            assert_eq!(matches.len(), n * (n - 1) / 2);
            assert_eq!(pairings(&matches).len(), matches.len());
            assert!(matches.iter().all(|m| m.team1_id != m.team2_id));
        }
    }

    #[test]
    fn test_first_round_has_everyone_once() {
        let matches = generate_round_robin(&roster(4));
        let first_round: Vec<&str> = matches[..2]
            .iter()
            .flat_map(|m| [m.team1_id.as_str(), m.team2_id.as_str()])
            .collect();
        let unique: HashSet<&str> = first_round.iter().copied().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_too_few_teams() {
        assert!(generate_round_robin(&roster(1)).is_empty());
        assert!(generate_round_robin(&[]).is_empty());
    }

    #[test]
    fn test_ids_unique() {
        let matches = generate_round_robin(&roster(6));
        let ids: HashSet<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), matches.len());
    }
}
