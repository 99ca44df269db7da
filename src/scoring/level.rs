use serde::Serialize;

/// Progress tier, ordered from the floor up so tiers can be compared
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    NotStarted,
    Starter,
    Runner,
    Finisher,
}

impl Level {
    pub const fn label(self) -> &'static str {
        match self {
            Level::Finisher => "Maratonista",
            Level::Runner => "Corredor",
            Level::Starter => "Iniciante",
            Level::NotStarted => "Na largada",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Level::Finisher => "🥇",
            Level::Runner => "🥈",
            Level::Starter => "🥉",
            Level::NotStarted => "🏁",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Level::Finisher => "#FACC15",
            Level::Runner => "#D1D5DB",
            Level::Starter => "#F59E0B",
            Level::NotStarted => "#6B7280",
        }
    }

    pub fn info(self) -> LevelInfo {
        LevelInfo {
            tier: self,
            label: self.label(),
            icon: self.icon(),
            color: self.color(),
        }
    }
}

/// Tier plus its fixed presentation triple, shipped together so every
/// surface renders the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelInfo {
    pub tier: Level,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

/// Top-down classification; first match wins. An empty schedule can never be
/// finished, so the top tier is guarded on `total_lives > 0`.
pub fn classify(completed: usize, total_lives: usize) -> Level {
    if total_lives > 0 && completed >= total_lives {
        Level::Finisher
    } else if completed >= 3 {
        Level::Runner
    } else if completed >= 1 {
        Level::Starter
    } else {
        Level::NotStarted
    }
}

/// Extra badges earned from social posts alone, additive to the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Badge {
    SocialMarathon,
    SocialShared,
}

impl Badge {
    pub const fn label(self) -> &'static str {
        match self {
            Badge::SocialMarathon => "Embaixador",
            Badge::SocialShared => "Divulgador",
        }
    }

    pub fn info(self) -> BadgeInfo {
        BadgeInfo {
            badge: self,
            label: self.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeInfo {
    pub badge: Badge,
    pub label: &'static str,
}

pub fn supplementary_badges(social_posts: usize) -> Vec<Badge> {
    if social_posts >= 6 {
        vec![Badge::SocialMarathon]
    } else if social_posts >= 1 {
        vec![Badge::SocialShared]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn finisher_requires_a_full_schedule() {
        assert_eq!(classify(6, 6), Level::Finisher);
        assert_eq!(classify(9, 6), Level::Finisher);
        assert_eq!(classify(5, 6), Level::Runner);
    }

    #[test]
    fn empty_schedule_never_finishes() {
        assert_eq!(classify(0, 0), Level::NotStarted);
        assert_eq!(classify(2, 0), Level::Starter);
        assert_eq!(classify(100, 0), Level::Runner);
    }

    #[test]
    fn count_thresholds() {
        assert_eq!(classify(0, 8), Level::NotStarted);
        assert_eq!(classify(1, 8), Level::Starter);
        assert_eq!(classify(2, 8), Level::Starter);
        assert_eq!(classify(3, 8), Level::Runner);
        assert_eq!(classify(7, 8), Level::Runner);
        assert_eq!(classify(8, 8), Level::Finisher);
    }

    #[test]
    fn tiers_are_totally_ordered() {
        assert!(Level::NotStarted < Level::Starter);
        assert!(Level::Starter < Level::Runner);
        assert!(Level::Runner < Level::Finisher);
    }

    #[test]
    fn social_badges_by_threshold() {
        assert!(supplementary_badges(0).is_empty());
        assert_eq!(supplementary_badges(1), vec![Badge::SocialShared]);
        assert_eq!(supplementary_badges(5), vec![Badge::SocialShared]);
        assert_eq!(supplementary_badges(6), vec![Badge::SocialMarathon]);
        assert_eq!(supplementary_badges(12), vec![Badge::SocialMarathon]);
    }
}
