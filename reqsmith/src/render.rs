//! Human-readable requirement summaries.

use std::collections::BTreeMap;

use crate::artifacts::RequirementsList;

/// Categories listed first, in this order. Everything else follows
/// alphabetically.
const PREFERRED: &[&str] = &["Functional", "Non-Functional"];

/// Render requirements as markdown bullets grouped by category.
///
/// Category names are title-cased, blank categories become
/// `Uncategorized`, blank descriptions are skipped and a description
/// repeated within one category is shown once.
pub fn requirements_by_category(list: &RequirementsList) -> String {
    let mut groups: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for req in &list.requirements {
        let description = req.description.trim();
        if description.is_empty() {
            continue;
        }
        let category = match req.category.trim() {
            "" => "Uncategorized".to_string(),
            c => title_case(c),
        };
        let bucket = groups.entry(category).or_default();
        if !bucket.contains(&description) {
            bucket.push(description);
        }
    }

    let mut categories: Vec<&String> = groups.keys().collect();
    categories.sort_by_key(|c| {
        let rank = PREFERRED
            .iter()
            .position(|p| *p == c.as_str())
            .unwrap_or(PREFERRED.len());
        (rank, *c)
    });

    let mut lines = Vec::new();
    for category in categories {
        lines.push(format!("### {category}"));
        for description in &groups[category] {
            lines.push(format!("- {description}"));
        }
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::Requirement;

    fn req(category: &str, description: &str) -> Requirement {
        Requirement {
            id: format!("REQ-{description}"),
            description: description.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn groups_preferred_categories_first_and_drops_duplicates() {
        let list = RequirementsList {
            requirements: vec![
                req("Functional", "A"),
                req("Non-Functional", "B"),
                req("Functional", "A"),
            ],
        };
        assert_eq!(
            requirements_by_category(&list),
            "### Functional\n- A\n\n### Non-Functional\n- B"
        );
    }

    #[test]
    fn other_categories_follow_alphabetically() {
        let list = RequirementsList {
            requirements: vec![
                req("user story", "As a user I log in"),
                req("non-functional", "Fast"),
                req("", "Misc"),
                req("Constraint", "Runs offline"),
                req("functional", "Sign up"),
                req("Functional", "   "),
            ],
        };
        let rendered = requirements_by_category(&list);
        let headings: Vec<&str> = rendered
            .lines()
            .filter(|l| l.starts_with("### "))
            .collect();
        assert_eq!(
            headings,
            [
                "### Functional",
                "### Non-Functional",
                "### Constraint",
                "### Uncategorized",
                "### User Story",
            ]
        );
        assert!(!rendered.contains("-    "));
    }

    #[test]
    fn empty_list_renders_nothing() {
        assert_eq!(requirements_by_category(&RequirementsList::default()), "");
    }

    #[test]
    fn title_cases_words() {
        assert_eq!(title_case("non-functional"), "Non-Functional");
        assert_eq!(title_case("USER story"), "User Story");
    }
}
