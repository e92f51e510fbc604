//! Composable Todoist filter expressions plus the fixed catalog of named
//! views. The backend owns the query grammar (`&`, `|`, `!`, `#`, `##`,
//! `@`, relative dates, `search:`); this module only builds and joins
//! fragments so near-duplicate filter strings cannot drift apart.

use crate::error::{Error, Result};
use crate::taxonomy;

/// A filter-expression tree rendered to the Todoist query grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// A verbatim fragment, e.g. `today` or `created after: -30 days`.
    Raw(String),
    /// `@label`
    Label(String),
    /// `#project` (tasks directly in the project)
    Project(String),
    /// `##project` (the project and its whole subtree)
    ProjectTree(String),
    /// `search:term`
    Search(String),
    Not(Box<Filter>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn raw(s: impl Into<String>) -> Filter {
        Filter::Raw(s.into())
    }

    pub fn label(s: impl Into<String>) -> Filter {
        Filter::Label(s.into())
    }

    pub fn project(s: impl Into<String>) -> Filter {
        Filter::Project(s.into())
    }

    pub fn project_tree(s: impl Into<String>) -> Filter {
        Filter::ProjectTree(s.into())
    }

    pub fn not(f: Filter) -> Filter {
        Filter::Not(Box::new(f))
    }

    pub fn render(&self) -> String {
        match self {
            Filter::Raw(s) => s.clone(),
            Filter::Label(name) => format!("@{name}"),
            Filter::Project(name) => format!("#{name}"),
            Filter::ProjectTree(name) => format!("##{name}"),
            Filter::Search(term) => format!("search:{term}"),
            Filter::Not(inner) => format!("!{}", inner.render_grouped()),
            Filter::And(parts) => parts
                .iter()
                .map(|p| match p {
                    // `&` binds tighter than `|` in the backend grammar
                    Filter::Or(_) => format!("({})", p.render()),
                    _ => p.render(),
                })
                .collect::<Vec<_>>()
                .join(" & "),
            Filter::Or(parts) => parts
                .iter()
                .map(|p| match p {
                    Filter::And(_) => format!("({})", p.render()),
                    _ => p.render(),
                })
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    fn render_grouped(&self) -> String {
        match self {
            Filter::And(_) | Filter::Or(_) => format!("({})", self.render()),
            _ => self.render(),
        }
    }
}

/// Tasks that should never surface in date-driven household views. Reused
/// by due-today, due-tomorrow, due-this-week and both time-sensitive views.
fn baby_exclusions() -> Vec<Filter> {
    vec![
        Filter::not(Filter::project("Baby")),
        Filter::not(Filter::project("Baby someday")),
    ]
}

fn with_baby_exclusions(head: Filter) -> Filter {
    let mut parts = vec![head];
    parts.extend(baby_exclusions());
    Filter::And(parts)
}

// --- Named views (constants only, no caller input) ---

pub fn due_today() -> Filter {
    with_baby_exclusions(Filter::Or(vec![Filter::raw("today"), Filter::raw("overdue")]))
}

pub fn chores_due_today() -> Filter {
    Filter::And(vec![
        Filter::project("Chores"),
        Filter::Or(vec![Filter::raw("today"), Filter::raw("overdue")]),
    ])
}

pub fn due_tomorrow() -> Filter {
    with_baby_exclusions(Filter::raw("tomorrow"))
}

pub fn due_this_week() -> Filter {
    with_baby_exclusions(Filter::raw("7 days"))
}

pub fn waiting() -> Filter {
    Filter::project("Waiting")
}

pub fn tickler() -> Filter {
    Filter::project("Tickler")
}

pub fn next_actions() -> Filter {
    Filter::project("Next actions")
}

pub fn recent_media() -> Filter {
    Filter::And(vec![
        Filter::project("Media"),
        Filter::raw("created after: -30 days"),
    ])
}

pub fn areas_of_focus() -> Filter {
    Filter::project("Areas of focus")
}

pub fn shopping_list() -> Filter {
    Filter::project("Shopping list")
}

pub fn personal_inbox() -> Filter {
    Filter::project(taxonomy::PERSONAL_INBOX)
}

pub fn brian_inbox_per_becky() -> Filter {
    Filter::project(taxonomy::BRIAN_INBOX_PER_BECKY)
}

pub fn becky_inbox_per_brian() -> Filter {
    Filter::project(taxonomy::BECKY_INBOX_PER_BRIAN)
}

pub fn brian_time_sensitive() -> Filter {
    with_baby_exclusions(Filter::project("Brian time sensitive"))
}

pub fn becky_time_sensitive() -> Filter {
    with_baby_exclusions(Filter::project("Becky time sensitive"))
}

/// The project trees walked (in order) by the GTD-projects listing.
pub const GTD_PROJECT_TREES: [&str; 2] = ["Projects", "Brian projects"];

pub fn gtd_project_tree(name: &str) -> Filter {
    Filter::project_tree(name)
}

// --- Caller-driven filters ---

/// Context labels include project-scoped tasks; ordinary labels exclude the
/// GTD project trees so tasks already visible there do not surface twice.
pub fn label_search(label: &str) -> Filter {
    if label.starts_with("context:") {
        Filter::label(label)
    } else {
        Filter::And(vec![
            Filter::label(label),
            Filter::not(Filter::project_tree("Brian projects")),
            Filter::not(Filter::project_tree("Projects")),
        ])
    }
}

/// Plain free-text search. Backend wildcard `*` and quoted phrases pass
/// through verbatim.
pub fn plain_search(query: &str) -> Result<Filter> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("Search query cannot be empty".into()));
    }
    Ok(Filter::Search(trimmed.to_string()))
}

fn search_terms(terms: &[String]) -> Result<Vec<Filter>> {
    if terms.is_empty() {
        return Err(Error::Validation(
            "At least one search term is required".into(),
        ));
    }
    let mut parts = Vec::with_capacity(terms.len());
    for term in terms {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation(
                "All search terms must be non-empty".into(),
            ));
        }
        parts.push(Filter::Search(trimmed.to_string()));
    }
    Ok(parts)
}

/// `search:t1 & search:t2 & ...`
pub fn and_search(terms: &[String]) -> Result<Filter> {
    Ok(Filter::And(search_terms(terms)?))
}

/// `search:t1 | search:t2 | ...`
pub fn or_search(terms: &[String]) -> Result<Filter> {
    Ok(Filter::Or(search_terms(terms)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_today_reuses_the_exclusion_fragment() {
        assert_eq!(
            due_today().render(),
            "(today | overdue) & !#Baby & !#Baby someday"
        );
        assert_eq!(due_tomorrow().render(), "tomorrow & !#Baby & !#Baby someday");
        assert_eq!(due_this_week().render(), "7 days & !#Baby & !#Baby someday");
        assert_eq!(
            becky_time_sensitive().render(),
            "#Becky time sensitive & !#Baby & !#Baby someday"
        );
    }

    #[test]
    fn chores_view_scopes_dates_to_the_chores_project() {
        assert_eq!(chores_due_today().render(), "#Chores & (today | overdue)");
    }

    #[test]
    fn context_labels_search_without_project_exclusions() {
        assert_eq!(label_search("context:home").render(), "@context:home");
        assert_eq!(
            label_search("home").render(),
            "@home & !##Brian projects & !##Projects"
        );
    }

    #[test]
    fn plain_search_trims_and_rejects_empty() {
        assert_eq!(plain_search("  milk  ").unwrap().render(), "search:milk");
        let err = plain_search("   ").unwrap_err();
        assert_eq!(err.to_string(), "Search query cannot be empty");
    }

    #[test]
    fn and_search_joins_terms() {
        let terms = vec!["milk".to_string(), " bread ".to_string()];
        assert_eq!(
            and_search(&terms).unwrap().render(),
            "search:milk & search:bread"
        );
        assert_eq!(
            or_search(&terms).unwrap().render(),
            "search:milk | search:bread"
        );
    }

    #[test]
    fn term_search_validation() {
        assert_eq!(
            and_search(&[]).unwrap_err().to_string(),
            "At least one search term is required"
        );
        assert_eq!(
            and_search(&["ok".into(), "  ".into()]).unwrap_err().to_string(),
            "All search terms must be non-empty"
        );
    }

    #[test]
    fn not_groups_composite_children() {
        let f = Filter::not(Filter::Or(vec![
            Filter::project("A"),
            Filter::project("B"),
        ]));
        assert_eq!(f.render(), "!(#A | #B)");
    }
}
