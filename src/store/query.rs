//! Batch selection of migration items.

use super::{MigrationItem, MigrationStatus};
use serde::{Deserialize, Serialize};

/// Selects the documents a batch works on.
///
/// Items are ordered by legacy update date (then pid), newest first unless
/// `descending` is cleared, and paginated.
///
/// ```
/// use isis_migration::{DocumentQuery, MigrationStatus};
///
/// let mut query = DocumentQuery::new();
/// query
///     .set_acron("abc")
///     .set_status(MigrationStatus::PendingMigration)
///     .set_updated_range(Some("20190101"), None);
/// assert_eq!(query.per_page, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentQuery {
    pub acron: Option<String>,
    pub issue_folder: Option<String>,
    pub pub_year: Option<String>,
    pub status: Option<MigrationStatus>,
    /// Inclusive lower bound of the legacy update date, `YYYYMMDD`
    pub updated_from: Option<String>,
    /// Inclusive upper bound of the legacy update date, `YYYYMMDD`
    pub updated_to: Option<String>,
    pub descending: bool,
    /// 1-based
    pub page: usize,
    pub per_page: usize,
}

impl Default for DocumentQuery {
    fn default() -> Self {
        Self {
            acron: None,
            issue_folder: None,
            pub_year: None,
            status: None,
            updated_from: None,
            updated_to: None,
            descending: true,
            page: 1,
            per_page: 50,
        }
    }
}

impl DocumentQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_acron(&mut self, acron: &str) -> &mut Self {
        self.acron = Some(acron.to_lowercase());
        self
    }

    pub fn set_issue_folder(&mut self, issue_folder: &str) -> &mut Self {
        self.issue_folder = Some(issue_folder.to_string());
        self
    }

    pub fn set_pub_year(&mut self, pub_year: &str) -> &mut Self {
        self.pub_year = Some(pub_year.to_string());
        self
    }

    pub fn set_status(&mut self, status: MigrationStatus) -> &mut Self {
        self.status = Some(status);
        self
    }

    pub fn set_updated_range(&mut self, from: Option<&str>, to: Option<&str>) -> &mut Self {
        self.updated_from = from.map(str::to_string);
        self.updated_to = to.map(str::to_string);
        self
    }

    pub fn set_descending(&mut self, descending: bool) -> &mut Self {
        self.descending = descending;
        self
    }

    pub fn set_page(&mut self, page: usize, per_page: usize) -> &mut Self {
        self.page = page.max(1);
        self.per_page = per_page;
        self
    }

    /// Whether `item` passes every filter.
    pub fn matches(&self, item: &MigrationItem) -> bool {
        fn same(filter: &Option<String>, value: Option<&str>) -> bool {
            filter.as_deref().is_none_or(|f| value == Some(f))
        }

        let updated = item.isis_updated_date.as_deref().unwrap_or_default();
        same(&self.acron, item.acron.as_deref())
            && same(&self.issue_folder, Some(item.issue_folder.as_str()))
            && same(&self.pub_year, item.pub_year.as_deref())
            && self.status.is_none_or(|status| item.status == status)
            && self.updated_from.as_deref().is_none_or(|from| updated >= from)
            && self.updated_to.as_deref().is_none_or(|to| updated <= to)
    }

    /// Filters, orders and paginates `items`.
    pub fn apply<I>(&self, items: I) -> Vec<MigrationItem>
    where
        I: IntoIterator<Item = MigrationItem>,
    {
        let mut selected: Vec<_> = items.into_iter().filter(|item| self.matches(item)).collect();
        selected.sort_by(|a, b| {
            a.isis_updated_date
                .cmp(&b.isis_updated_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        if self.descending {
            selected.reverse();
        }
        let skip = self.page.saturating_sub(1).saturating_mul(self.per_page);
        selected.into_iter().skip(skip).take(self.per_page).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn items() -> Vec<MigrationItem> {
        [
            ("S0001-00000000000001", "20190101", "abc", "2019"),
            ("S0001-00000000000002", "20200101", "abc", "2020"),
            ("S0001-00000000000003", "20210101", "xyz", "2020"),
        ]
        .into_iter()
        .map(|(id, updated, acron, year)| {
            let mut item = MigrationItem::minimum(id, updated);
            item.acron = Some(acron.to_string());
            item.pub_year = Some(year.to_string());
            item
        })
        .collect()
    }

    fn ids(items: &[MigrationItem]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_default_is_newest_first() {
        let selected = DocumentQuery::default().apply(items());
        assert_eq!(
            ids(&selected),
            vec![
                "S0001-00000000000003",
                "S0001-00000000000002",
                "S0001-00000000000001"
            ]
        );
    }

    #[rstest]
    #[case(Some("ABC"), None, None, None, vec!["S0001-00000000000002", "S0001-00000000000001"])]
    #[case(None, Some("2020"), None, None, vec!["S0001-00000000000003", "S0001-00000000000002"])]
    #[case(None, None, Some("20200101"), None, vec!["S0001-00000000000003", "S0001-00000000000002"])]
    #[case(None, None, None, Some("20200101"), vec!["S0001-00000000000002", "S0001-00000000000001"])]
    fn test_filters(
        #[case] acron: Option<&str>,
        #[case] pub_year: Option<&str>,
        #[case] from: Option<&str>,
        #[case] to: Option<&str>,
        #[case] expected: Vec<&str>,
    ) {
        let mut query = DocumentQuery::new();
        if let Some(acron) = acron {
            query.set_acron(acron);
        }
        if let Some(pub_year) = pub_year {
            query.set_pub_year(pub_year);
        }
        query.set_updated_range(from, to);

        assert_eq!(ids(&query.apply(items())), expected);
    }

    #[test]
    fn test_status_filter() {
        let mut query = DocumentQuery::new();
        query.set_status(MigrationStatus::PublishedComplete);
        assert!(query.apply(items()).is_empty());
    }

    #[test]
    fn test_pagination_ascending() {
        let mut query = DocumentQuery::new();
        query.set_descending(false).set_page(2, 2);
        assert_eq!(ids(&query.apply(items())), vec!["S0001-00000000000003"]);

        query.set_page(0, 2);
        assert_eq!(query.page, 1);
    }
}
