//! Client-side search and pagination for the resource tables.
//!
//! Lists are small and fully loaded, so filtering is a linear scan over every
//! top-level field of every record and pagination is a slice. Display order is
//! the order the backend returned.
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Text a field is matched against: raw text for strings, JSON text otherwise.
pub fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Default cell content: the text of field `key` of the serialized row.
pub fn cell_text<T: Serialize>(row: &T, key: &str) -> String {
    serde_json::to_value(row)
        .ok()
        .and_then(|value| value.get(key).map(field_text))
        .unwrap_or_default()
}

/// Case-insensitive substring match against any field of the record.
pub fn record_matches(record: &Value, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    match record {
        Value::Object(fields) => fields
            .values()
            .any(|value| field_text(value).to_lowercase().contains(needle_lower)),
        other => field_text(other).to_lowercase().contains(needle_lower),
    }
}

/// Indices of the rows matching `term`, in input order.
pub fn filter_indices<T: Serialize>(rows: &[T], term: &str) -> Vec<usize> {
    let needle = term.to_lowercase();
    rows.iter()
        .enumerate()
        .filter(|(_, row)| {
            // A row that cannot be serialized has no searchable text.
            serde_json::to_value(row)
                .map(|value| record_matches(&value, &needle))
                .unwrap_or(needle.is_empty())
        })
        .map(|(index, _)| index)
        .collect()
}

pub fn total_pages(total_rows: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total_rows.div_ceil(page_size)
}

/// Clamps a 1-based page number to `[1, max(1, total_pages)]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Search term and page of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    search: String,
    page: usize,
    page_size: usize,
}

impl Default for TableState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl TableState {
    pub fn new(page_size: usize) -> Self {
        Self {
            search: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Any change of the search term sends the table back to page 1.
    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.search {
            self.search = term;
            self.page = 1;
        }
    }

    /// Requests a page; the view clamps it against the filtered row count.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.page = clamp_page(self.page + 1, total_pages);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Filters and slices `rows` into what the table should show.
    pub fn view<'a, T: Serialize>(&self, rows: &'a [T]) -> TableView<'a, T> {
        let matching = filter_indices(rows, &self.search);
        let total_matches = matching.len();
        let total_pages = total_pages(total_matches, self.page_size);
        let page = clamp_page(self.page, total_pages);
        let start = (page - 1) * self.page_size;
        let rows = matching
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .map(|index| &rows[index])
            .collect();
        TableView {
            rows,
            page,
            total_pages,
            total_matches,
            first_row: if total_matches == 0 { 0 } else { start + 1 },
        }
    }
}

/// One rendered page of a table.
#[derive(Debug, PartialEq)]
pub struct TableView<'a, T> {
    pub rows: Vec<&'a T>,
    /// Clamped page actually shown.
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    /// 1-based position of the first shown row, 0 when nothing matches.
    pub first_row: usize,
}

impl<T> TableView<'_, T> {
    pub fn last_row(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            self.first_row + self.rows.len() - 1
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use serde::Serialize;

    #[derive(Serialize, Debug, PartialEq)]
    struct Row {
        id: usize,
        name: String,
        email: String,
        active: bool,
    }

    fn row(id: usize, name: &str) -> Row {
        Row {
            id,
            name: name.to_string(),
            email: format!("{}@shop.test", name.to_lowercase()),
            active: id % 2 == 0,
        }
    }

    #[fixture]
    fn twelve_rows() -> Vec<Row> {
        (1..=12).map(|i| row(i, &format!("User{i}"))).collect()
    }

    #[rstest]
    fn page_three_of_twelve_shows_two_rows(twelve_rows: Vec<Row>) {
        let mut state = TableState::new(5);
        state.set_page(3);
        let view = state.view(&twelve_rows);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].id, 11);
        assert_eq!(view.first_row, 11);
        assert_eq!(view.last_row(), 12);
        assert!(!view.has_next());
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(3, 3)]
    #[case(99, 3)]
    fn page_is_clamped_to_available_pages(
        twelve_rows: Vec<Row>,
        #[case] requested: usize,
        #[case] shown: usize,
    ) {
        let mut state = TableState::new(5);
        state.set_page(requested);
        assert_eq!(state.view(&twelve_rows).page, shown);
    }

    #[rstest]
    fn empty_list_stays_on_page_one() {
        let rows: Vec<Row> = Vec::new();
        let mut state = TableState::default();
        state.set_page(4);
        let view = state.view(&rows);
        assert_eq!(view.page, 1);
        assert_eq!(view.total_pages, 0);
        assert_eq!(view.first_row, 0);
        assert!(view.rows.is_empty());
    }

    #[rstest]
    fn changing_search_resets_page(twelve_rows: Vec<Row>) {
        let mut state = TableState::new(5);
        state.set_page(3);
        state.set_search("user1");
        assert_eq!(state.page(), 1);

        // Same term again is not a change.
        state.set_page(2);
        state.set_search("user1");
        assert_eq!(state.page(), 2);

        let view = state.view(&twelve_rows);
        // user1, user10, user11, user12
        assert_eq!(view.total_matches, 4);
    }

    #[rstest]
    fn search_matches_fields_that_are_not_displayed(twelve_rows: Vec<Row>) {
        let mut state = TableState::new(50);
        state.set_search("USER7@SHOP");
        let view = state.view(&twelve_rows);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].id, 7);
    }

    #[rstest]
    fn search_matches_non_string_fields(twelve_rows: Vec<Row>) {
        let mut state = TableState::new(50);
        state.set_search("false");
        assert_eq!(state.view(&twelve_rows).total_matches, 6);
    }

    #[rstest]
    fn whitespace_is_matched_literally(twelve_rows: Vec<Row>) {
        assert!(filter_indices(&twelve_rows, " ").is_empty());

        let rows = vec![row(1, "Ana Lopez"), row(2, "Bo")];
        assert_eq!(filter_indices(&rows, " "), vec![0]);
    }

    #[rstest]
    #[case("")]
    #[case(" ")]
    #[case("user")]
    #[case("2")]
    #[case("shop.test")]
    #[case("nobody")]
    fn filtered_rows_are_a_subset_containing_the_term(
        twelve_rows: Vec<Row>,
        #[case] term: &str,
    ) {
        let needle = term.to_lowercase();
        for index in filter_indices(&twelve_rows, term) {
            let record = serde_json::to_value(&twelve_rows[index]).unwrap();
            let fields = record.as_object().unwrap();
            assert!(fields
                .values()
                .any(|v| field_text(v).to_lowercase().contains(&needle)));
        }
    }

    #[rstest]
    fn order_follows_input(twelve_rows: Vec<Row>) {
        let reversed: Vec<Row> = twelve_rows.into_iter().rev().collect();
        let state = TableState::new(5);
        let ids: Vec<usize> = state.view(&reversed).rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![12, 11, 10, 9, 8]);
    }

    #[rstest]
    fn cells_show_raw_strings_and_json_for_the_rest(twelve_rows: Vec<Row>) {
        assert_eq!(cell_text(&twelve_rows[0], "name"), "User1");
        assert_eq!(cell_text(&twelve_rows[1], "active"), "true");
        assert_eq!(cell_text(&twelve_rows[0], "missing"), "");
    }

    #[test]
    fn next_and_prev_stay_in_bounds() {
        let mut state = TableState::new(5);
        state.prev_page();
        assert_eq!(state.page(), 1);
        state.next_page(2);
        state.next_page(2);
        assert_eq!(state.page(), 2);
    }
}
