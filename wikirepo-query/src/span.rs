//! Validity spans of claims against the query window.

use chrono::NaiveDate;
use wikirepo_core::{
    Claim, DataValue, END_TIME, EntityId, START_TIME, TimeKey, TimeQuery, parse_wikidata_time,
};

/// Buckets of the query window during which `claim` holds.
///
/// The claim's span comes from its start and end time qualifiers. A qualifier
/// without a value leaves that side of the span open; a qualifier whose value
/// is not a readable date drops the whole intersection.
///
/// In most-recent mode a claim with any end qualifier is no longer current
/// and yields `None`; any other claim yields today's date. In windowed mode
/// the untruncated window dates are compared against the span and `None`
/// means the span lies entirely outside the window.
#[must_use]
pub fn intersect(claim: &Claim, time: &TimeQuery) -> Option<Vec<TimeKey>> {
    let start = span_bound(claim, START_TIME)?;
    let end = span_bound(claim, END_TIME)?;

    let axis = match time {
        TimeQuery::MostRecent { today } => {
            return (!claim.has_qualifier(END_TIME)).then(|| vec![time.bucket(*today)]);
        }
        TimeQuery::Windowed(axis) => axis,
    };

    let dates = axis.dates();
    let before_start = |date: &NaiveDate| start.is_some_and(|s| *date < s);
    let after_end = |date: &NaiveDate| end.is_some_and(|e| *date > e);

    if start.is_some() && dates.iter().all(before_start) {
        return None;
    }
    if end.is_some() && dates.iter().all(after_end) {
        return None;
    }

    Some(
        dates
            .iter()
            .filter(|date| !before_start(date) && !after_end(date))
            .map(|date| time.bucket(*date))
            .collect(),
    )
}

/// `Some(None)` for an open bound, `None` for an unreadable one.
fn span_bound(claim: &Claim, property: EntityId) -> Option<Option<NaiveDate>> {
    match claim.qualifier(property).and_then(|snak| snak.value.as_ref()) {
        None => Some(None),
        Some(DataValue::Time(raw)) => parse_wikidata_time(raw).map(Some),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use wikirepo_core::test_support::{item, time};
    use wikirepo_core::{Interval, Snak, Timespan};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[fixture]
    fn window() -> TimeQuery {
        TimeQuery::new(
            Some(Interval::Yearly),
            Some(Timespan::Range {
                start: date(2010, 1, 1),
                end: date(2014, 1, 1),
            }),
            date(2024, 1, 1),
        )
        .expect("windowed query")
    }

    #[fixture]
    fn most_recent() -> TimeQuery {
        TimeQuery::new(None, None, date(2024, 3, 2)).expect("most recent query")
    }

    fn claim(start: Option<&str>, end: Option<&str>) -> Claim {
        let with_start = start.into_iter().fold(Claim::new(item(1)), |c, s| {
            c.with_qualifier(START_TIME, time(s))
        });
        end.into_iter()
            .fold(with_start, |c, e| c.with_qualifier(END_TIME, time(e)))
    }

    fn buckets(keys: Option<Vec<TimeKey>>) -> Option<Vec<String>> {
        keys.map(|k| k.iter().map(ToString::to_string).collect())
    }

    #[rstest]
    #[case(None, None, Some(vec!["2014", "2013", "2012", "2011", "2010"]))]
    #[case(Some("2012-01-01"), None, Some(vec!["2014", "2013", "2012"]))]
    #[case(None, Some("2011-06-01"), Some(vec!["2011", "2010"]))]
    #[case(Some("2011-01-01"), Some("2012-01-01"), Some(vec!["2012", "2011"]))]
    #[case(Some("2015-01-01"), None, None)]
    #[case(None, Some("2009-01-01"), None)]
    #[case(Some("1990-01-01"), Some("2000-01-01"), None)]
    #[case::unreadable_start(Some("2015-13-45"), None, None)]
    #[case::unreadable_end(None, Some("2011-02-30"), None)]
    #[case::unreadable_inside(Some("2011-01-01"), Some("2012-00-99"), None)]
    fn windowed_spans_clip_to_the_window(
        window: TimeQuery,
        #[case] start: Option<&str>,
        #[case] end: Option<&str>,
        #[case] expected: Option<Vec<&str>>,
    ) {
        let result = buckets(intersect(&claim(start, end), &window));
        let wanted = expected.map(|b| b.into_iter().map(str::to_owned).collect());
        assert_eq!(result, wanted);
    }

    #[rstest]
    fn span_between_buckets_is_empty_not_none(window: TimeQuery) {
        let result = intersect(&claim(Some("2011-03-01"), Some("2011-09-01")), &window);
        assert_eq!(result, Some(Vec::new()));
    }

    #[rstest]
    #[case(None, None, Some(vec!["2024-03-02"]))]
    #[case(Some("2000-01-01"), None, Some(vec!["2024-03-02"]))]
    #[case(None, Some("2020-01-01"), None)]
    #[case(Some("2000-01-01"), Some("2020-01-01"), None)]
    #[case::unreadable_start(Some("2000-99-01"), None, None)]
    fn most_recent_keeps_only_open_claims(
        most_recent: TimeQuery,
        #[case] start: Option<&str>,
        #[case] end: Option<&str>,
        #[case] expected: Option<Vec<&str>>,
    ) {
        let result = buckets(intersect(&claim(start, end), &most_recent));
        let wanted = expected.map(|b| b.into_iter().map(str::to_owned).collect());
        assert_eq!(result, wanted);
    }

    #[rstest]
    fn open_bounds_without_values_do_not_clip(window: TimeQuery) {
        let open_end = claim(Some("2013-01-01"), None).with_qualifier(END_TIME, Snak::empty());

        let result = buckets(intersect(&open_end, &window));

        assert_eq!(result, Some(vec!["2014".to_owned(), "2013".to_owned()]));
    }

    #[rstest]
    fn valueless_end_ends_the_claim_in_most_recent_mode(most_recent: TimeQuery) {
        let ended = Claim::new(item(1)).with_qualifier(END_TIME, Snak::empty());

        assert_eq!(intersect(&ended, &most_recent), None);
    }
}
