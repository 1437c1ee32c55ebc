//! Page selection for annotations.
//!
//! A selection is one of the sentinels `all`, `even`, `odd`, or a
//! comma-separated list of 1-indexed page numbers. Resolution against a
//! document is lenient: entries that do not parse, are not positive, or lie
//! beyond the last page are dropped without error. Only an empty result is a
//! failure.

use crate::error::AnnotationError;
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageSelection {
    #[default]
    All,
    Even,
    Odd,
    /// Raw page numbers as given; may contain out-of-range values.
    List(Vec<i64>),
}

impl PageSelection {
    /// Resolve against a document with `page_count` pages.
    ///
    /// The result is sorted ascending, deduplicated, and contains only pages
    /// in `1..=page_count`. It may be empty.
    pub fn resolve(&self, page_count: u32) -> Vec<u32> {
        let all = 1..=page_count;
        match self {
            PageSelection::All => all.collect(),
            PageSelection::Even => all.filter(|n| n % 2 == 0).collect(),
            PageSelection::Odd => all.filter(|n| n % 2 == 1).collect(),
            PageSelection::List(numbers) => numbers
                .iter()
                .filter(|&&n| n > 0 && n <= i64::from(page_count))
                .map(|&n| n as u32)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }

    /// Like [`resolve`](Self::resolve) but fails with
    /// [`AnnotationError::NoValidPages`] when nothing is selected.
    pub fn resolve_non_empty(&self, page_count: u32) -> Result<Vec<u32>, AnnotationError> {
        let pages = self.resolve(page_count);
        if pages.is_empty() {
            return Err(AnnotationError::NoValidPages);
        }
        Ok(pages)
    }
}

impl FromStr for PageSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.to_ascii_lowercase().as_str() {
            "all" => PageSelection::All,
            "even" => PageSelection::Even,
            "odd" => PageSelection::Odd,
            _ => PageSelection::List(
                trimmed
                    .split(',')
                    .filter_map(|part| part.trim().parse::<i64>().ok())
                    .collect(),
            ),
        })
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSelection::All => write!(f, "all"),
            PageSelection::Even => write!(f, "even"),
            PageSelection::Odd => write!(f, "odd"),
            PageSelection::List(numbers) => {
                let parts: Vec<String> = numbers.iter().map(i64::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

/// Human description of resolved pages, e.g. `page 2` or `pages 1, 3`.
pub fn describe_pages(pages: &[u32]) -> String {
    let list: Vec<String> = pages.iter().map(u32::to_string).collect();
    match pages.len() {
        0 => "no pages".to_string(),
        1 => format!("page {}", list[0]),
        _ => format!("pages {}", list.join(", ")),
    }
}
