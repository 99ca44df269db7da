use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// One participant as fed into the ranking: engine-computed points plus the
/// display name used for tie-breaking. The name must be present; callers
/// own that guarantee.
#[derive(Debug, Clone)]
pub struct Contender {
    pub id: String,
    pub name: String,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedContender {
    pub id: String,
    pub name: String,
    pub points: i64,
    pub rank: i64,
}

/// Where one participant sits in the ranking. `rank == 0` means the id was
/// not ranked at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankSummary {
    pub rank: i64,
    pub total: i64,
    pub points: i64,
}

/// Accent-insensitive, case-insensitive key approximating pt-BR alphabetical
/// expectations: "Álvaro" sorts with "Alvaro", "ç" with "c".
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Points descending, then name ascending (collated first, raw as the final
/// disambiguator). The sort is stable, so entries with identical points AND
/// identical names keep their input order. Ranks are dense 1-based
/// positions; tied scores still occupy distinct consecutive ranks.
pub fn build_ranking(contenders: Vec<Contender>) -> Vec<RankedContender> {
    let mut keyed: Vec<(String, Contender)> = contenders
        .into_iter()
        .map(|c| (collation_key(&c.name), c))
        .collect();

    keyed.sort_by(|(key_a, a), (key_b, b)| {
        b.points
            .cmp(&a.points)
            .then_with(|| key_a.cmp(key_b))
            .then_with(|| a.name.cmp(&b.name))
    });

    keyed
        .into_iter()
        .enumerate()
        .map(|(i, (_, c))| RankedContender {
            id: c.id,
            name: c.name,
            points: c.points,
            rank: i as i64 + 1,
        })
        .collect()
}

pub fn locate(ranking: &[RankedContender], id: &str) -> RankSummary {
    let total = ranking.len() as i64;

    ranking
        .iter()
        .find(|r| r.id == id)
        .map(|r| RankSummary {
            rank: r.rank,
            total,
            points: r.points,
        })
        .unwrap_or(RankSummary {
            rank: 0,
            total,
            points: 0,
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scoring::level::{self, Level};
    use crate::scoring::points::total_points;
    use crate::scoring::{Category, CheckInStatus, ScoringRecord};

    fn contender(id: &str, name: &str, points: i64) -> Contender {
        Contender {
            id: id.to_string(),
            name: name.to_string(),
            points,
        }
    }

    #[test]
    fn ranks_are_dense_one_based_positions() {
        let ranked = build_ranking(vec![
            contender("a", "Ana", 5),
            contender("b", "Bruno", 5),
            contender("c", "Caio", 5),
            contender("d", "Duda", 1),
        ]);

        let ranks: Vec<i64> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn ties_break_on_name_regardless_of_input_order() {
        let forward = build_ranking(vec![
            contender("1", "Beatriz", 4),
            contender("2", "Artur", 4),
        ]);
        let swapped = build_ranking(vec![
            contender("2", "Artur", 4),
            contender("1", "Beatriz", 4),
        ]);

        assert_eq!(forward[0].name, "Artur");
        assert_eq!(forward[1].name, "Beatriz");
        assert_eq!(swapped[0].name, "Artur");
        assert_eq!(swapped[1].name, "Beatriz");
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let ranked = build_ranking(vec![
            contender("1", "Érica", 2),
            contender("2", "Eduardo", 2),
            contender("3", "Fabiana", 2),
            contender("4", "Álvaro", 2),
        ]);

        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Álvaro", "Eduardo", "Érica", "Fabiana"]);
    }

    #[test]
    fn absent_id_gets_the_zero_sentinel() {
        let ranked = build_ranking(vec![contender("a", "Ana", 3)]);

        let summary = locate(&ranked, "ghost");
        assert_eq!(
            summary,
            RankSummary {
                rank: 0,
                total: 1,
                points: 0
            }
        );
    }

    // The worked scenario: Alice with 4 classes and one share, Bob with 4
    // classes of which one was voided, Carol carried entirely by a manual
    // bonus. Six classes on the calendar.
    #[test]
    fn event_scenario_end_to_end() {
        fn attendance(invalidated: bool) -> ScoringRecord {
            ScoringRecord {
                category: Category::Attendance,
                status: CheckInStatus::Approved,
                invalidated,
            }
        }

        let alice: Vec<ScoringRecord> = (0..4)
            .map(|_| attendance(false))
            .chain([ScoringRecord {
                category: Category::SocialPost,
                status: CheckInStatus::Approved,
                invalidated: false,
            }])
            .collect();
        let bob: Vec<ScoringRecord> = (0..3)
            .map(|_| attendance(false))
            .chain([attendance(true)])
            .collect();
        let carol: Vec<ScoringRecord> = Vec::new();

        let ranked = build_ranking(vec![
            contender("alice", "Alice", total_points(&alice, &[])),
            contender("bob", "Bob", total_points(&bob, &[])),
            contender("carol", "Carol", total_points(&carol, &[5])),
        ]);

        assert_eq!(locate(&ranked, "alice").rank, 1);
        assert_eq!(locate(&ranked, "alice").points, 7);
        assert_eq!(locate(&ranked, "carol").rank, 2);
        assert_eq!(locate(&ranked, "carol").points, 5);
        assert_eq!(locate(&ranked, "bob").rank, 3);
        assert_eq!(locate(&ranked, "bob").points, 3);

        use crate::scoring::points::completed_count;
        assert_eq!(level::classify(completed_count(&alice), 6), Level::Runner);
        assert_eq!(level::classify(completed_count(&bob), 6), Level::Runner);
        assert_eq!(
            level::classify(completed_count(&carol), 6),
            Level::NotStarted
        );
    }
}
