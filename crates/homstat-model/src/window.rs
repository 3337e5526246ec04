use serde::{Deserialize, Serialize};

use crate::error::{Result, StatError};

/// A closed year window `[start, end]`.
///
/// Construction rejects `end < start` so no downstream computation can see
/// a zero- or negative-length period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    start: i32,
    end: i32,
}

impl YearWindow {
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if end < start {
            return Err(StatError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of years in the window, always >= 1.
    pub fn len_years(&self) -> u32 {
        (self.end - self.start + 1) as u32
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

impl std::fmt::Display for YearWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_window() {
        let err = YearWindow::new(2010, 2000).unwrap_err();
        assert!(matches!(
            err,
            StatError::InvalidWindow {
                start: 2010,
                end: 2000
            }
        ));
    }

    #[test]
    fn single_year_window_has_length_one() {
        let window = YearWindow::new(2005, 2005).unwrap();
        assert_eq!(window.len_years(), 1);
        assert!(window.contains(2005));
        assert!(!window.contains(2006));
    }

    #[test]
    fn years_iterates_inclusive() {
        let window = YearWindow::new(2000, 2002).unwrap();
        let years: Vec<i32> = window.years().collect();
        assert_eq!(years, vec![2000, 2001, 2002]);
    }
}
