//! Property tests for pagination and date-range validation

use feedback_core::{
    types::{MAX_EXPORT_LIMIT, MAX_PAGE_LIMIT},
    DateRange, FeedbackError, Pagination,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn valid_windows_accepted(skip in 0i64..1_000_000, limit in 1i64..=100) {
        let window = Pagination::new(skip, limit, MAX_PAGE_LIMIT).unwrap();
        prop_assert_eq!(i64::from(window.skip), skip);
        prop_assert_eq!(i64::from(window.limit), limit);
    }

    #[test]
    fn negative_skip_rejected(skip in i64::MIN..0, limit in 1i64..=100) {
        let err = Pagination::new(skip, limit, MAX_PAGE_LIMIT).unwrap_err();
        prop_assert!(matches!(err, FeedbackError::Validation(_)));
        prop_assert_eq!(err.to_string(), "Skip value cannot be negative");
    }

    #[test]
    fn out_of_range_limit_rejected(limit in prop_oneof![i64::MIN..1, 101i64..i64::MAX]) {
        prop_assert!(Pagination::new(0, limit, MAX_PAGE_LIMIT).is_err());
    }

    #[test]
    fn export_limit_bound(limit in 1i64..=1000) {
        prop_assert!(Pagination::new(0, limit, MAX_EXPORT_LIMIT).is_ok());
        prop_assert!(Pagination::new(0, limit + 1000, MAX_EXPORT_LIMIT).is_err());
    }

    #[test]
    fn page_numbers_map_to_offsets(page in 1i64..10_000, size in 1i64..=100) {
        let window = Pagination::from_page(page, size, MAX_PAGE_LIMIT).unwrap();
        prop_assert_eq!(i64::from(window.skip), (page - 1) * size);
        prop_assert_eq!(i64::from(window.limit), size);
    }

    #[test]
    fn ordered_dates_accepted(
        (y1, m1, d1) in (2000i32..2100, 1u32..=12, 1u32..=28),
        days in 0i64..3650,
    ) {
        let start = chrono::NaiveDate::from_ymd_opt(y1, m1, d1).unwrap();
        let end = start + chrono::Duration::days(days);
        let range = DateRange::parse(
            Some(&start.format("%Y-%m-%d").to_string()),
            Some(&end.format("%Y-%m-%d").to_string()),
        )
        .unwrap();
        prop_assert!(range.start.unwrap() <= range.end.unwrap());
    }

    #[test]
    fn reversed_dates_rejected(
        (y, m, d) in (2000i32..2100, 1u32..=12, 1u32..=28),
        days in 1i64..3650,
    ) {
        let start = chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let end = start - chrono::Duration::days(days);
        let result = DateRange::parse(
            Some(&start.format("%Y-%m-%d").to_string()),
            Some(&end.format("%Y-%m-%d").to_string()),
        );
        prop_assert!(result.is_err());
    }
}
