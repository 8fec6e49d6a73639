// In-memory browser history - NavigationPort without a DOM
use crate::application::filter_store::NavigationPort;

/// A stack of query strings with a cursor, behaving like a tab's history.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial_query: &str) -> Self {
        Self {
            entries: vec![initial_query.trim_start_matches('?').to_string()],
            index: 0,
        }
    }

    /// Navigates to a new entry, dropping any forward entries.
    pub fn push(&mut self, query: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(query.trim_start_matches('?').to_string());
        self.index = self.entries.len() - 1;
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NavigationPort for MemoryHistory {
    fn current_query(&self) -> String {
        self.entries[self.index].clone()
    }

    fn replace_query(&mut self, query: &str) {
        self.entries[self.index] = query.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_back_forward() {
        let mut history = MemoryHistory::new("?a=1");
        history.push("a=2");
        assert_eq!(history.current_query(), "a=2");
        assert!(history.back());
        assert_eq!(history.current_query(), "a=1");
        assert!(!history.back());
        assert!(history.forward());
        assert!(!history.forward());
    }

    #[test]
    fn test_replace_keeps_length() {
        let mut history = MemoryHistory::new("");
        history.replace_query("b=1");
        history.replace_query("b=2");
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_query(), "b=2");
    }
}
