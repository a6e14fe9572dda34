use crate::models::portfolio::Project;
use crate::models::site_data::SiteData;

/// Filter value that selects every project.
pub const ALL: &str = "all";

/// Below this many same-category matches, related projects are backfilled
/// from other categories.
pub const RELATED_MIN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterControl {
    pub value: String,
    pub active: bool,
}

/// Category filter for the project grid. Categories are derived once per data
/// load, in first-seen order; the selection starts at [`ALL`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectFilter {
    categories: Vec<String>,
    selected: String,
}

impl ProjectFilter {
    pub fn from_projects(projects: &[Project]) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for project in projects {
            if !categories.iter().any(|c| c == &project.category) {
                categories.push(project.category.clone());
            }
        }
        ProjectFilter {
            categories,
            selected: ALL.to_string(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn is_known(&self, category: &str) -> bool {
        category == ALL || self.categories.iter().any(|c| c == category)
    }

    /// `ALL` first, then each category. At most one control is active.
    pub fn controls(&self) -> Vec<FilterControl> {
        std::iter::once(ALL.to_string())
            .chain(self.categories.iter().cloned())
            .map(|value| FilterControl {
                active: value == self.selected,
                value,
            })
            .collect()
    }

    /// Select `category` and return the matching projects in original order.
    pub fn set_category<'a>(&mut self, site: &'a SiteData, category: &str) -> Vec<&'a Project> {
        self.selected = category.to_string();
        self.visible(site)
    }

    pub fn visible<'a>(&self, site: &'a SiteData) -> Vec<&'a Project> {
        apply(&site.projects, &self.selected)
    }
}

pub fn apply<'a>(projects: &'a [Project], category: &str) -> Vec<&'a Project> {
    if category == ALL {
        projects.iter().collect()
    } else {
        projects.iter().filter(|p| p.category == category).collect()
    }
}

/// Projects to show next to `current`: same category first, excluding
/// `current`. With fewer than [`RELATED_MIN`] matches, other categories fill
/// in and the combined list is capped at `cap`.
pub fn related_projects<'a>(site: &'a SiteData, current: &Project, cap: usize) -> Vec<&'a Project> {
    let mut related: Vec<&Project> = site
        .projects
        .iter()
        .filter(|p| p.id != current.id && p.category == current.category)
        .collect();

    if related.len() < RELATED_MIN {
        related.extend(
            site.projects
                .iter()
                .filter(|p| p.id != current.id && p.category != current.category),
        );
        related.truncate(cap.max(RELATED_MIN));
    }

    related
}
