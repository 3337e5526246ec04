//! Coverage scoring over observation tables.

use polars::prelude::{DataFrame, NamedFrom, Series};
use proptest::prelude::*;

use homstat_core::evaluate_coverage;
use homstat_model::schema::{COUNTRY, SEX, YEAR};
use homstat_model::{SegmentKey, YearWindow};

fn table(rows: &[(&str, i32)]) -> DataFrame {
    let countries: Vec<&str> = rows.iter().map(|(c, _)| *c).collect();
    let years: Vec<i32> = rows.iter().map(|(_, y)| *y).collect();
    DataFrame::new(vec![
        Series::new(COUNTRY.into(), countries).into(),
        Series::new(YEAR.into(), years).into(),
    ])
    .unwrap()
}

fn sex_table(rows: &[(&str, &str, i32)]) -> DataFrame {
    let countries: Vec<&str> = rows.iter().map(|(c, _, _)| *c).collect();
    let sexes: Vec<&str> = rows.iter().map(|(_, s, _)| *s).collect();
    let years: Vec<i32> = rows.iter().map(|(_, _, y)| *y).collect();
    DataFrame::new(vec![
        Series::new(COUNTRY.into(), countries).into(),
        Series::new(SEX.into(), sexes).into(),
        Series::new(YEAR.into(), years).into(),
    ])
    .unwrap()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn full_presence_scores_one() {
    let df = table(&[("Spain", 2000), ("Spain", 2001), ("Spain", 2002)]);
    let window = YearWindow::new(2000, 2002).unwrap();
    let report = evaluate_coverage(&df, &names(&["Spain"]), window, None).unwrap();
    assert_eq!(report.score("Spain"), Some(1.0));
}

#[test]
fn sparse_country_fails_default_threshold() {
    // A covers the whole decade, B only its first four years.
    let mut rows: Vec<(&str, i32)> = (2000..=2009).map(|y| ("A", y)).collect();
    rows.extend((2000..=2003).map(|y| ("B", y)));
    let df = table(&rows);
    let window = YearWindow::new(2000, 2009).unwrap();

    let report = evaluate_coverage(&df, &names(&["A", "B"]), window, None).unwrap();
    assert_eq!(report.score("A"), Some(1.0));
    assert_eq!(report.score("B"), Some(0.4));
    assert_eq!(report.passing(0.65), names(&["A"]));
    assert_eq!(report.excluded(0.65), names(&["B"]));
}

#[test]
fn threshold_is_inclusive() {
    // 13 of 20 years is exactly 0.65.
    let rows: Vec<(&str, i32)> = (2000..2013).map(|y| ("A", y)).collect();
    let df = table(&rows);
    let window = YearWindow::new(2000, 2019).unwrap();

    let report = evaluate_coverage(&df, &names(&["A"]), window, None).unwrap();
    assert_eq!(report.score("A"), Some(0.65));
    assert_eq!(report.passing(0.65), names(&["A"]));
}

#[test]
fn segmented_score_is_minimum_across_segments() {
    let mut rows: Vec<(&str, &str, i32)> = (2000..2009).map(|y| ("A", "Male", y)).collect();
    rows.push(("A", "Female", 2000));
    rows.push(("A", "Female", 2001));
    let df = sex_table(&rows);
    let window = YearWindow::new(2000, 2009).unwrap();

    let report =
        evaluate_coverage(&df, &names(&["A"]), window, Some(SegmentKey::Sex)).unwrap();
    let entry = &report.entries[0];
    assert_eq!(entry.segments["Male"], 0.9);
    assert_eq!(entry.segments["Female"], 0.2);
    assert_eq!(entry.score, 0.2);
}

#[test]
fn missing_segment_zeroes_the_country() {
    // B never reports Female rows, so its Female segment scores 0.0.
    let df = sex_table(&[
        ("A", "Male", 2000),
        ("A", "Female", 2000),
        ("B", "Male", 2000),
    ]);
    let window = YearWindow::new(2000, 2000).unwrap();

    let report =
        evaluate_coverage(&df, &names(&["A", "B"]), window, Some(SegmentKey::Sex)).unwrap();
    assert_eq!(report.score("A"), Some(1.0));
    assert_eq!(report.score("B"), Some(0.0));
}

#[test]
fn entries_keep_request_order() {
    let df = table(&[("B", 2000), ("A", 2000)]);
    let window = YearWindow::new(2000, 2000).unwrap();
    let report = evaluate_coverage(&df, &names(&["B", "A"]), window, None).unwrap();
    let order: Vec<&str> = report.entries.iter().map(|e| e.country.as_str()).collect();
    assert_eq!(order, vec!["B", "A"]);
}

proptest! {
    // Raising the threshold can only shrink the passing set.
    #[test]
    fn passing_set_shrinks_with_threshold(
        years in proptest::collection::btree_set(2000i32..2010, 0..10),
        low in 0.0f64..=1.0,
        high in 0.0f64..=1.0,
    ) {
        let rows: Vec<(&str, i32)> = years.iter().map(|&y| ("A", y)).collect();
        let df = table(&rows);
        let window = YearWindow::new(2000, 2009).unwrap();
        let report = evaluate_coverage(&df, &names(&["A"]), window, None).unwrap();

        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let at_low = report.passing(low);
        let at_high = report.passing(high);
        for country in &at_high {
            prop_assert!(at_low.contains(country));
        }
    }
}
