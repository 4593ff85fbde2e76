// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! One month laid out on a Sunday-first grid, for calendar displays.
//!
//! The grid has [`GRID_CELLS`] cells: five full weeks plus the two extra
//! cells a 31-day month starting on Saturday spills into. Cells before the
//! 1st and after the last day are empty.
//!
//! ```
//! use timekeep::calendar::MonthGrid;
//!
//! let march = MonthGrid::new(2025, 3).unwrap();
//! assert_eq!(march.cells()[6], Some(1));
//! assert_eq!(march.cells()[36], Some(31));
//! ```

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::codec::{BrokenDownTime, EN_US};

/// Cells in a month grid.
pub const GRID_CELLS: usize = 37;

/// Day numbers of one month placed under their weekday columns.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MonthGrid {
    year: i32,
    month: u32,
    first_weekday: Weekday,
    days: u8,
    cells: [Option<u8>; GRID_CELLS],
}

impl MonthGrid {
    /// Lay out `month` (1-12) of `year`. `None` for a month chrono cannot place.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let first_weekday = first.weekday();
        let lead = first_weekday.num_days_from_sunday() as usize;

        let mut cells = [None; GRID_CELLS];
        let mut days = 0u8;
        for (slot, date) in cells[lead..]
            .iter_mut()
            .zip(first.iter_days().take_while(|d| d.month() == month))
        {
            *slot = Some(date.day() as u8);
            days += 1;
        }

        Some(MonthGrid {
            year,
            month,
            first_weekday,
            days,
            cells,
        })
    }

    /// The month containing a broken-down time, e.g. the current local time.
    pub fn containing(tm: &BrokenDownTime) -> Option<Self> {
        let month = u32::try_from(tm.month + 1).ok()?;
        MonthGrid::new(tm.full_year(), month)
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month, 1-12.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Weekday of the 1st.
    pub fn first_weekday(&self) -> Weekday {
        self.first_weekday
    }

    /// Number of days in the month, leap years included.
    pub fn days_in_month(&self) -> u8 {
        self.days
    }

    /// The cells, row by row, Sunday first.
    pub fn cells(&self) -> &[Option<u8>; GRID_CELLS] {
        &self.cells
    }

    /// Rows that hold at least one day.
    pub fn weeks(&self) -> impl Iterator<Item = &[Option<u8>]> + '_ {
        let used = self.first_weekday.num_days_from_sunday() as usize + usize::from(self.days);
        self.cells[..used].chunks(7)
    }
}

/// Month name and year, a weekday header, then one line per week.
impl fmt::Display for MonthGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = EN_US.month_names[self.month as usize - 1];
        writeln!(f, "{:>20} {}", name, self.year)?;
        for day in EN_US.abbrev_weekday_names {
            write!(f, "{:>4}", day)?;
        }
        for week in self.weeks() {
            writeln!(f)?;
            for cell in week {
                match cell {
                    Some(day) => write!(f, "{:>4}", day)?,
                    None => f.write_str("    ")?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(grid: &MonthGrid) -> Vec<(usize, u8)> {
        grid.cells()
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|d| (i, d)))
            .collect()
    }

    #[test]
    fn february_leap_year() {
        let feb = MonthGrid::new(2024, 2).unwrap();
        assert_eq!(feb.first_weekday(), Weekday::Thu);
        assert_eq!(feb.days_in_month(), 29);
        let days = filled(&feb);
        assert_eq!(days.first(), Some(&(4, 1)));
        assert_eq!(days.last(), Some(&(32, 29)));
        assert!(feb.cells()[..4].iter().all(Option::is_none));
        assert!(feb.cells()[33..].iter().all(Option::is_none));
    }

    #[test]
    fn february_common_year() {
        let feb = MonthGrid::new(2023, 2).unwrap();
        assert_eq!(feb.first_weekday(), Weekday::Wed);
        assert_eq!(feb.days_in_month(), 28);
        assert_eq!(filled(&feb).last(), Some(&(30, 28)));
    }

    #[test]
    fn century_leap_rules() {
        assert_eq!(MonthGrid::new(2000, 2).unwrap().days_in_month(), 29);
        assert_eq!(MonthGrid::new(2100, 2).unwrap().days_in_month(), 28);
    }

    #[test]
    fn saturday_start_uses_every_cell() {
        for (year, month) in [(2025, 3), (2026, 8)] {
            let grid = MonthGrid::new(year, month).unwrap();
            assert_eq!(grid.first_weekday(), Weekday::Sat);
            assert_eq!(grid.cells()[6], Some(1));
            assert_eq!(grid.cells()[36], Some(31));
            assert_eq!(grid.weeks().count(), 6);
            assert_eq!(grid.weeks().last(), Some(&[Some(30), Some(31)][..]));
        }
    }

    #[test]
    fn sunday_start_in_four_rows() {
        let feb = MonthGrid::new(2015, 2).unwrap();
        assert_eq!(feb.cells()[0], Some(1));
        assert_eq!(feb.weeks().count(), 4);
        assert!(feb.cells()[28..].iter().all(Option::is_none));
    }

    #[test]
    fn invalid_month() {
        assert_eq!(MonthGrid::new(2024, 0), None);
        assert_eq!(MonthGrid::new(2024, 13), None);
    }

    #[test]
    fn from_broken_down_time() {
        // 2024-02-29 12:34:56 UTC
        let tm = BrokenDownTime::from_timestamp(1_709_210_096).unwrap();
        let grid = MonthGrid::containing(&tm).unwrap();
        assert_eq!((grid.year(), grid.month()), (2024, 2));
    }

    #[test]
    fn display_layout() {
        let text = MonthGrid::new(2015, 2).unwrap().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "            February 2015");
        assert_eq!(lines[1], " Sun Mon Tue Wed Thu Fri Sat");
        assert_eq!(lines[2], "   1   2   3   4   5   6   7");
        assert_eq!(lines[5], "  22  23  24  25  26  27  28");

        let text = MonthGrid::new(2025, 3).unwrap().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], format!("{}   1", " ".repeat(24)));
        assert_eq!(lines.last(), Some(&"  30  31"));
    }
}
