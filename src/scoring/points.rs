use super::{Category, ScoringRecord};

/// Weighted point total for one participant: every approved, non-invalidated
/// check-in at its category weight, plus the unconditional sum of manual
/// adjustments. Adjustments are never filtered and may drive the total
/// negative; no floor is applied.
pub fn total_points(records: &[ScoringRecord], adjustments: &[i64]) -> i64 {
    let earned: i64 = records
        .iter()
        .filter(|r| r.is_scoring())
        .map(|r| r.category.weight())
        .sum();

    earned + adjustments.iter().sum::<i64>()
}

/// Number of classes actually completed. Only approved, non-invalidated
/// attendance records count; social posts and adjustments cannot buy
/// completion.
pub fn completed_count(records: &[ScoringRecord]) -> usize {
    category_count(records, Category::Attendance)
}

/// Scoring-record count for a single category, under the same validity
/// filter as the point total.
pub fn category_count(records: &[ScoringRecord], category: Category) -> usize {
    records
        .iter()
        .filter(|r| r.is_scoring() && r.category == category)
        .count()
}

/// One full engine pass over a participant's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub points: i64,
    pub completed: usize,
    pub social_posts: usize,
}

pub fn score_participant(records: &[ScoringRecord], adjustments: &[i64]) -> ScoreBreakdown {
    ScoreBreakdown {
        points: total_points(records, adjustments),
        completed: completed_count(records),
        social_posts: category_count(records, Category::SocialPost),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scoring::CheckInStatus;

    fn approved(category: Category) -> ScoringRecord {
        ScoringRecord {
            category,
            status: CheckInStatus::Approved,
            invalidated: false,
        }
    }

    fn with_status(category: Category, status: CheckInStatus) -> ScoringRecord {
        ScoringRecord {
            category,
            status,
            invalidated: false,
        }
    }

    #[test]
    fn weights_attendance_one_and_social_post_three() {
        let records = vec![
            approved(Category::Attendance),
            approved(Category::Attendance),
            approved(Category::Attendance),
            approved(Category::Attendance),
            approved(Category::SocialPost),
        ];

        assert_eq!(total_points(&records, &[]), 7);
        assert_eq!(total_points(&records, &[2, -1]), 8);
    }

    #[test]
    fn empty_history_scores_zero() {
        assert_eq!(total_points(&[], &[]), 0);
        assert_eq!(completed_count(&[]), 0);
    }

    #[test]
    fn pending_and_rejected_records_score_nothing() {
        let records = vec![
            with_status(Category::Attendance, CheckInStatus::Pending),
            with_status(Category::SocialPost, CheckInStatus::Rejected),
            approved(Category::Attendance),
        ];

        assert_eq!(total_points(&records, &[]), 1);
        assert_eq!(completed_count(&records), 1);
    }

    #[test]
    fn invalidation_removes_exactly_the_record_weight() {
        let mut records = vec![
            approved(Category::Attendance),
            approved(Category::SocialPost),
        ];

        assert_eq!(total_points(&records, &[]), 4);
        assert_eq!(completed_count(&records), 1);

        records[1].invalidated = true;
        assert_eq!(total_points(&records, &[]), 1);
        assert_eq!(completed_count(&records), 1);

        records[0].invalidated = true;
        assert_eq!(total_points(&records, &[]), 0);
        assert_eq!(completed_count(&records), 0);

        records[0].invalidated = false;
        records[1].invalidated = false;
        assert_eq!(total_points(&records, &[]), 4);
        assert_eq!(completed_count(&records), 1);
    }

    #[test]
    fn adjustments_always_apply_and_allow_negative_totals() {
        let records = vec![approved(Category::Attendance)];

        assert_eq!(total_points(&records, &[-10]), -9);
        assert_eq!(total_points(&[], &[5]), 5);
    }

    #[test]
    fn completion_ignores_social_posts_and_adjustments() {
        let records = vec![
            approved(Category::Attendance),
            approved(Category::Attendance),
            approved(Category::SocialPost),
            approved(Category::SocialPost),
        ];

        assert_eq!(completed_count(&records), 2);
        assert_eq!(category_count(&records, Category::SocialPost), 2);

        // a breakdown with an enormous bonus still reports 2 classes done
        let breakdown = score_participant(&records, &[1_000_000]);
        assert_eq!(breakdown.completed, 2);
        assert_eq!(breakdown.points, 2 + 6 + 1_000_000);
    }

    #[test]
    fn engine_is_deterministic_over_unchanged_input() {
        let records = vec![
            approved(Category::Attendance),
            approved(Category::SocialPost),
            with_status(Category::Attendance, CheckInStatus::Rejected),
        ];
        let adjustments = [3, -1];

        let first = score_participant(&records, &adjustments);
        let second = score_participant(&records, &adjustments);

        assert_eq!(first, second);
    }
}
