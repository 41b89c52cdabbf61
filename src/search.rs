use std::ops::Range;

use crate::data::Country;

/// Country search box with suggestion list
pub struct Autocomplete {
    pub query: String,
    pub focused: bool,
    /// Indices into the country list, in list order
    suggestions: Vec<usize>,
    /// Highlighted suggestion
    cursor: usize,
    min_chars: usize,
    limit: usize,
}

impl Autocomplete {
    pub fn new(min_chars: usize, limit: usize) -> Self {
        Self {
            query: String::new(),
            focused: false,
            suggestions: Vec::new(),
            cursor: 0,
            min_chars,
            limit,
        }
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
        self.suggestions.clear();
    }

    pub fn push_char(&mut self, c: char, countries: &[Country]) {
        self.query.push(c);
        self.refresh(countries);
    }

    pub fn backspace(&mut self, countries: &[Country]) {
        self.query.pop();
        self.refresh(countries);
    }

    /// Recompute suggestions for the current query
    fn refresh(&mut self, countries: &[Country]) {
        self.suggestions = if self.query.chars().count() < self.min_chars {
            Vec::new()
        } else {
            matching(countries, &self.query, self.limit)
        };
        self.cursor = 0;
    }

    pub fn suggestions(&self) -> &[usize] {
        &self.suggestions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn move_down(&mut self) {
        if !self.suggestions.is_empty() {
            self.cursor = (self.cursor + 1) % self.suggestions.len();
        }
    }

    pub fn move_up(&mut self) {
        if !self.suggestions.is_empty() {
            self.cursor = (self.cursor + self.suggestions.len() - 1) % self.suggestions.len();
        }
    }

    /// Accept the highlighted suggestion, returning its country code
    pub fn accept(&mut self, countries: &[Country]) -> Option<String> {
        let country = countries.get(*self.suggestions.get(self.cursor)?)?;
        self.query = country.name.clone();
        self.blur();
        Some(country.code.clone())
    }
}

/// Countries whose name contains `query`, case-insensitively
pub fn matching(countries: &[Country], query: &str, limit: usize) -> Vec<usize> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    countries
        .iter()
        .enumerate()
        .filter(|(_, c)| c.name.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .take(limit)
        .collect()
}

/// Byte range of the first case-insensitive match of `query` in `name`
pub fn match_range(name: &str, query: &str) -> Option<Range<usize>> {
    let lower = name.to_lowercase();
    // Byte offsets only line up when lowercasing kept lengths
    if lower.len() != name.len() || query.is_empty() {
        return None;
    }
    let start = lower.find(&query.to_lowercase())?;
    let end = start + query.to_lowercase().len();
    (name.is_char_boundary(start) && name.is_char_boundary(end)).then_some(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countries() -> Vec<Country> {
        [("FR", "France"), ("DE", "Germany"), ("CA", "Canada"), ("JP", "Japan")]
            .into_iter()
            .map(|(code, name)| Country {
                code: code.into(),
                name: name.into(),
            })
            .collect()
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let list = countries();
        assert_eq!(matching(&list, "AN", 10), vec![0, 1, 2, 3]);
        assert_eq!(matching(&list, "can", 10), vec![2]);
        assert_eq!(matching(&list, "an", 2), vec![0, 1]);
        assert!(matching(&list, "", 10).is_empty());
    }

    #[test]
    fn test_min_chars() {
        let list = countries();
        let mut search = Autocomplete::new(2, 10);
        search.push_char('j', &list);
        assert!(search.suggestions().is_empty());
        search.push_char('a', &list);
        assert_eq!(search.suggestions(), &[3]);
        search.backspace(&list);
        assert!(search.suggestions().is_empty());
    }

    #[test]
    fn test_navigate_and_accept() {
        let list = countries();
        let mut search = Autocomplete::new(1, 10);
        search.focus();
        for c in "an".chars() {
            search.push_char(c, &list);
        }
        search.move_down();
        search.move_down();
        assert_eq!(search.cursor(), 2);
        search.move_up();
        search.move_up();
        search.move_up();
        assert_eq!(search.cursor(), 3);

        assert_eq!(search.accept(&list).as_deref(), Some("JP"));
        assert_eq!(search.query, "Japan");
        assert!(!search.focused);
        assert!(search.suggestions().is_empty());
    }

    #[test]
    fn test_accept_without_suggestions() {
        let list = countries();
        let mut search = Autocomplete::new(1, 10);
        assert_eq!(search.accept(&list), None);
    }

    #[test]
    fn test_match_range() {
        assert_eq!(match_range("Canada", "NAD"), Some(2..5));
        assert_eq!(match_range("Canada", "xyz"), None);
        assert_eq!(match_range("Canada", ""), None);
    }
}
