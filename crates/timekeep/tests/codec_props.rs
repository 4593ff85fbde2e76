// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use proptest::prelude::*;

use timekeep::codec::{asctime, format, parse, BrokenDownTime};

// 1970-01-01 through 2099-12-31.
const LATEST: i64 = 4_102_444_799;

// Last second a two-digit year reads back unchanged (2068-12-31T23:59:59Z).
const LAST_PIVOT_SECOND: i64 = 3_124_223_999;

// Complete date-time patterns and whether they carry a zone.
const FULL_PATTERNS: &[(&str, bool)] = &[
    ("%c", false),
    ("%C %T", false),
    ("%D %r", false),
    ("%x %R:%S %Z", true),
    ("%a %h %e %k:%M:%S %Y %z", true),
    ("%A %d %B %Y %l:%M:%S %p %Z", true),
    ("%Y-%m-%dT%H:%M:%S%z", true),
    ("%Y %j %X", false),
    ("%I%p %M:%S %m/%d/%Y", false),
    ("%n%Y%t%m%n%d %T %%", false),
];

const TIME_PATTERNS: &[&str] = &[
    "%T",
    "%X",
    "%r",
    "%R:%S",
    "%k:%M:%S",
    "%l:%M:%S %p",
    "%I%p %M %S",
];

fn zone_offset() -> impl Strategy<Value = i32> {
    prop_oneof![
        prop::sample::select(vec![0, -300, -360, -420, -480, -540, -600, 60, 120]),
        -720i32..=720,
    ]
}

proptest! {
    #[test]
    fn iso_like_pattern_roundtrips(secs in 0i64..=LATEST) {
        let tm = BrokenDownTime::from_timestamp(secs).unwrap();
        let text = format("%Y-%m-%d %H:%M:%S", &tm);
        let (parsed, rest) = parse(&text, "%Y-%m-%d %H:%M:%S").unwrap();
        prop_assert_eq!(rest, "");
        prop_assert_eq!(parsed.to_timestamp(), Some(secs));
        prop_assert_eq!(parsed.weekday, tm.weekday);
        prop_assert_eq!(parsed.year_day, tm.year_day);
    }

    #[test]
    fn asctime_layout_parses_back(secs in 0i64..=LATEST) {
        let tm = BrokenDownTime::from_timestamp(secs).unwrap();
        let text = asctime(&tm);
        prop_assert_eq!(&text, &format("%a %b %e %H:%M:%S %Y", &tm));
        let (parsed, _) = parse(&text, "%a %b %e %H:%M:%S %Y").unwrap();
        prop_assert_eq!(parsed.to_timestamp(), Some(secs));
        prop_assert_eq!(parsed.weekday, tm.weekday);
    }

    #[test]
    fn every_directive_roundtrips(
        secs in 0i64..=LAST_PIVOT_SECOND,
        (pattern, has_zone) in prop::sample::select(FULL_PATTERNS),
        offset in zone_offset()
    ) {
        let mut tm = BrokenDownTime::from_timestamp(secs).unwrap();
        tm.tz_offset_minutes = offset;
        let text = format(pattern, &tm);
        let (parsed, rest) = parse(&text, pattern).unwrap();
        prop_assert_eq!(rest, "");
        if !has_zone {
            tm.tz_offset_minutes = 0;
        }
        prop_assert_eq!(parsed, tm);
    }

    #[test]
    fn clock_patterns_roundtrip(
        secs in 0i64..=LATEST,
        pattern in prop::sample::select(TIME_PATTERNS)
    ) {
        let tm = BrokenDownTime::from_timestamp(secs).unwrap();
        let (parsed, _) = parse(&format(pattern, &tm), pattern).unwrap();
        prop_assert_eq!(
            (parsed.hour, parsed.minute, parsed.second),
            (tm.hour, tm.minute, tm.second)
        );
    }

    #[test]
    fn two_digit_year_folds_into_pivot_window(secs in 0i64..=LATEST) {
        let tm = BrokenDownTime::from_timestamp(secs).unwrap();
        let (parsed, _) = parse(&format("%D", &tm), "%D").unwrap();
        let year = tm.full_year();
        let expected = if year >= 2069 { year - 100 } else { year };
        prop_assert_eq!(parsed.full_year(), expected);
        prop_assert_eq!((parsed.month, parsed.day), (tm.month, tm.day));
    }

    #[test]
    fn formatted_numbers_are_fixed_width(secs in 0i64..=LATEST) {
        let tm = BrokenDownTime::from_timestamp(secs).unwrap();
        prop_assert_eq!(format("%Y%m%d%H%M%S", &tm).len(), 14);
        prop_assert_eq!(format("%j", &tm).len(), 3);
    }

    #[test]
    fn parse_never_panics(text in "\\PC{0,40}", pattern in "(%[a-zA-Z%]|[ :/-]){0,8}") {
        let _ = parse(&text, &pattern);
    }

    #[test]
    fn parse_reports_position_inside_text(text in "[0-9a-zA-Z :]{0,24}") {
        if let Err(e) = parse(&text, "%H:%M:%S %p") {
            prop_assert!(e.position <= text.len());
        }
    }
}
