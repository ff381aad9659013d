use pena_shared::models::{Crew, CrewGame, CrewStatus};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub position: usize,
    pub crew_id: String,
    pub slug: String,
    pub title: String,
    pub points: i64,
    pub games_played: usize,
}

/// Ranks active crews by total points over their games subcollection,
/// optionally restricted to one season. Ties share a position and the next
/// position skips accordingly (1, 1, 3). Tied crews are listed by title.
pub fn compute_ranking(
    crews: &[Crew],
    crew_games: &[CrewGame],
    season: Option<&str>,
) -> Vec<RankingEntry> {
    let mut totals: HashMap<&str, (i64, usize)> = HashMap::new();

    for game in crew_games {
        if let Some(season) = season {
            if game.season.as_deref() != Some(season) {
                continue;
            }
        }
        let entry = totals.entry(game.crew_id.as_str()).or_default();
        entry.0 += game.points;
        if game.participated {
            entry.1 += 1;
        }
    }

    let mut entries: Vec<RankingEntry> = crews
        .iter()
        .filter(|c| c.status == CrewStatus::Active)
        .map(|c| {
            let (points, games_played) = totals.get(c.id.as_str()).copied().unwrap_or_default();
            RankingEntry {
                position: 0,
                crew_id: c.id.clone(),
                slug: c.slug.clone(),
                title: c.title.clone(),
                points,
                games_played,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.crew_id.cmp(&b.crew_id))
    });

    let mut previous_points = None;
    let mut position = 0;
    for (index, entry) in entries.iter_mut().enumerate() {
        if previous_points != Some(entry.points) {
            position = index + 1;
            previous_points = Some(entry.points);
        }
        entry.position = position;
    }

    entries
}
