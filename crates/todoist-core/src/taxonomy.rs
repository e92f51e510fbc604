//! The household project taxonomy. Classification is exact-name membership
//! in fixed disjoint tables; nothing here talks to the network.

/// Brian's private GTD buckets and project trees.
pub const BRIAN_ONLY_PROJECTS: [&str; 10] = [
    "Projects",
    "Brian projects",
    "Next actions",
    "Waiting",
    "Tickler",
    "Someday",
    "Areas of focus",
    "Media",
    "Shopping list",
    "Chores",
];

/// Projects owned by Brian but worked by both people.
pub const BRIAN_SHARED_PROJECTS: [&str; 4] = [
    "Brian time sensitive",
    "Brian house projects",
    "Brian errands",
    "Brian waiting on Becky",
];

/// Projects owned by Becky but worked by both people.
pub const BECKY_SHARED_PROJECTS: [&str; 4] = [
    "Becky time sensitive",
    "Becky house projects",
    "Becky errands",
    "Becky waiting on Brian",
];

pub const PERSONAL_INBOX: &str = "Inbox";
pub const BRIAN_INBOX_PER_BECKY: &str = "Brian inbox - per Becky";
pub const BECKY_INBOX_PER_BRIAN: &str = "Becky inbox - per Brian";

/// The three unsorted-intake projects.
pub const INBOX_PROJECTS: [&str; 3] = [PERSONAL_INBOX, BRIAN_INBOX_PER_BECKY, BECKY_INBOX_PER_BRIAN];

/// Which category a project name falls into. Categories are mutually
/// exclusive because a name appears in at most one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectCategory {
    BrianOnly,
    BrianShared,
    BeckyShared,
    Inbox,
    Uncategorized,
}

pub fn is_brian_only_project(name: &str) -> bool {
    BRIAN_ONLY_PROJECTS.contains(&name)
}

pub fn is_brian_shared_project(name: &str) -> bool {
    BRIAN_SHARED_PROJECTS.contains(&name)
}

pub fn is_becky_shared_project(name: &str) -> bool {
    BECKY_SHARED_PROJECTS.contains(&name)
}

pub fn is_inbox_project(name: &str) -> bool {
    INBOX_PROJECTS.contains(&name)
}

pub fn categorize(name: &str) -> ProjectCategory {
    if is_inbox_project(name) {
        ProjectCategory::Inbox
    } else if is_brian_only_project(name) {
        ProjectCategory::BrianOnly
    } else if is_brian_shared_project(name) {
        ProjectCategory::BrianShared
    } else if is_becky_shared_project(name) {
        ProjectCategory::BeckyShared
    } else {
        ProjectCategory::Uncategorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 27 sample names: the full fixed taxonomy plus six strays.
    fn sample_names() -> Vec<&'static str> {
        let mut names: Vec<&str> = Vec::new();
        names.extend(BRIAN_ONLY_PROJECTS);
        names.extend(BRIAN_SHARED_PROJECTS);
        names.extend(BECKY_SHARED_PROJECTS);
        names.extend(INBOX_PROJECTS);
        names.extend([
            "Baby",
            "Baby someday",
            "Holiday planning",
            "Old archive",
            "brian projects", // case matters
            "Inbox 2",
        ]);
        names
    }

    #[test]
    fn classification_is_a_disjoint_partition() {
        let names = sample_names();
        assert_eq!(names.len(), 27);
        for name in names {
            let hits = [
                is_inbox_project(name),
                is_brian_only_project(name),
                is_brian_shared_project(name),
                is_becky_shared_project(name),
            ]
            .iter()
            .filter(|b| **b)
            .count();
            assert!(hits <= 1, "{name} fell into {hits} categories");
        }
    }

    #[test]
    fn exactly_three_inbox_projects() {
        let inbox: Vec<&str> = sample_names()
            .into_iter()
            .filter(|n| is_inbox_project(n))
            .collect();
        assert_eq!(
            inbox,
            vec![PERSONAL_INBOX, BRIAN_INBOX_PER_BECKY, BECKY_INBOX_PER_BRIAN]
        );
    }

    #[test]
    fn categorize_matches_the_membership_tests() {
        assert_eq!(categorize("Tickler"), ProjectCategory::BrianOnly);
        assert_eq!(categorize("Brian errands"), ProjectCategory::BrianShared);
        assert_eq!(categorize("Becky errands"), ProjectCategory::BeckyShared);
        assert_eq!(categorize("Inbox"), ProjectCategory::Inbox);
        assert_eq!(categorize("Baby"), ProjectCategory::Uncategorized);
    }
}
