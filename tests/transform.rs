use chrono::NaiveDate;

use sokkai::{IngestError, Step};
use sokkai::fetch::parse_csv;
use sokkai::project::project;
use sokkai::schema::{FieldType, type_of};
use sokkai::table::Table;
use sokkai::transform::{
    IngestMode, TypedValue, coerce, drop_missing, filter_finished, materialize, transform,
    transform_reporting,
};

const HEADER: &str = "season,date,league_id,league,team1,team2,spi1,spi2,prob1,prob2,probtie,\
proj_score1,proj_score2,importance1,importance2,score1,score2";

/// Three Ligue 1 rows; `edit` can blank or replace cells by column name.
fn ligue1(edit: impl Fn(usize, &str) -> Option<&'static str>) -> Table {
    let rows = [
        "2016,2016-08-13,1843,French Ligue 1,Metz,Lille,54.34,66.1,0.3444,0.3479,0.3077,1.18,1.3,26.9,48.7,3.0,2.0",
        "2016,2016-08-13,1843,French Ligue 1,Montpellier,Angers,58.82,53.1,0.4939,0.2109,0.2952,1.51,0.89,22.5,27.7,1.0,0.0",
        "2016,2016-08-13,1843,French Ligue 1,Dijon FCO,Nantes,55.0,54.9,0.4471,0.249,0.3038,1.4,1.01,29.2,25.6,0.0,1.0",
    ];
    let names = HEADER.split(',').collect::<Vec<_>>();
    let mut csv = format!("{HEADER}\n");
    for (idx, row) in rows.iter().enumerate() {
        let cells = row
            .split(',')
            .zip(&names)
            .map(|(cell, name)| match edit(idx, name) {
                Some(replacement) => replacement.to_string(),
                None => cell.to_string(),
            })
            .collect::<Vec<_>>();
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    let table = parse_csv(&csv).expect("csv should parse");
    project(&table).expect("all fields present")
}

#[test]
fn finished_filter_keeps_rows_with_both_scores() {
    let mut table = ligue1(|row, name| match (row, name) {
        (0, "score1") | (1, "score2") => Some(""),
        _ => None,
    });
    assert_eq!(filter_finished(&mut table), 2);
    assert_eq!(table.row_count(), 1);
    let records = materialize(&coerce(&table).expect("coerce")).expect("materialize");
    assert_eq!(records[0].team1, "Dijon FCO");
}

#[test]
fn drop_missing_removes_rows_with_any_null() {
    let mut table = ligue1(|row, name| match (row, name) {
        (0, "team1") | (1, "spi2") => Some("NaN"),
        _ => None,
    });
    assert_eq!(drop_missing(&mut table), 2);
    assert_eq!(table.row_count(), 1);
}

#[test]
fn drop_missing_keeps_unplayed_matches_for_all_mode() {
    let mut table = ligue1(|row, name| match (row, name) {
        (0, "score1") | (0, "score2") => Some(""),
        _ => None,
    });
    assert_eq!(drop_missing(&mut table), 0);
    let records = transform(table.clone(), IngestMode::All).expect("transform");
    assert_eq!(records.len(), 3);
    assert!(!records[0].is_finished());

    let finished = transform(table, IngestMode::Finished).expect("transform");
    assert_eq!(finished.len(), 2);
    assert!(finished.iter().all(|m| m.is_finished()));
}

#[test]
fn coercion_applies_registry_types() {
    let typed = coerce(&ligue1(|_, _| None)).expect("coerce");
    for column in typed.columns() {
        let expected = type_of(&column.name).expect("known field");
        assert_eq!(column.field_type, expected, "{}", column.name);
        assert!(
            column
                .values
                .iter()
                .all(|v| v.field_type() == Some(expected)),
            "{} holds values of the wrong type",
            column.name
        );
    }
    assert_eq!(typed.column("season").map(|c| c.field_type), Some(FieldType::Integer));
    assert_eq!(typed.column("date").map(|c| c.field_type), Some(FieldType::Date));
    assert_eq!(typed.column("score1").map(|c| c.field_type), Some(FieldType::Integer));
    assert_eq!(typed.column("probtie").map(|c| c.field_type), Some(FieldType::Float));
    assert_eq!(
        typed.column("score2").map(|c| c.values[1].clone()),
        Some(TypedValue::Integer(0))
    );
}

#[test]
fn coercion_fails_on_non_numeric_float() {
    let table = ligue1(|row, name| (row == 2 && name == "prob1").then_some("high"));
    let err = coerce(&table).expect_err("prob1 is not a number");
    match err {
        IngestError::TypeCoercion {
            field,
            row,
            value,
            expected,
        } => {
            assert_eq!(field, "prob1");
            assert_eq!(row, 2);
            assert_eq!(value, "high");
            assert_eq!(expected, FieldType::Float);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn coercion_fails_on_bad_date_and_fractional_score() {
    let bad_date = ligue1(|row, name| (row == 0 && name == "date").then_some("13/08/2016"));
    assert!(matches!(
        coerce(&bad_date),
        Err(IngestError::TypeCoercion { ref field, .. }) if field == "date"
    ));

    let fractional = ligue1(|row, name| (row == 1 && name == "score1").then_some("1.5"));
    assert!(matches!(
        coerce(&fractional),
        Err(IngestError::TypeCoercion { ref field, row: 1, .. }) if field == "score1"
    ));
}

#[test]
fn coercion_rejects_null_in_required_field() {
    let table = ligue1(|row, name| (row == 0 && name == "league").then_some(""));
    assert!(matches!(
        coerce(&table),
        Err(IngestError::TypeCoercion { ref field, row: 0, .. }) if field == "league"
    ));
}

#[test]
fn materialize_preserves_row_order_and_values() {
    let records = transform(ligue1(|_, _| None), IngestMode::Finished).expect("transform");
    let teams = records.iter().map(|m| m.team1.as_str()).collect::<Vec<_>>();
    assert_eq!(teams, vec!["Metz", "Montpellier", "Dijon FCO"]);

    let first = &records[0];
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2016, 8, 13).expect("valid date"));
    assert_eq!(first.season, 2016);
    assert_eq!(first.league, "French Ligue 1");
    assert_eq!((first.score1, first.score2), (Some(3), Some(2)));
    assert!((first.prob1 + first.prob2 + first.probtie - 1.0).abs() < 1e-9);
    assert_eq!(first.outcome(), Some('H'));
}

#[test]
fn numeric_looking_names_keep_their_spelling() {
    let table = ligue1(|row, name| match (row, name) {
        (0, "league") => Some("007"),
        (0, "team1") => Some("1e3"),
        (0, "team2") => Some("0123"),
        _ => None,
    });
    let records = transform(table, IngestMode::Finished).expect("transform");
    assert_eq!(records[0].league, "007");
    assert_eq!(records[0].team1, "1e3");
    assert_eq!(records[0].team2, "0123");
}

#[test]
fn large_integers_are_exact_or_rejected() {
    let precise = ligue1(|row, name| (row == 0 && name == "score1").then_some("9007199254740993"));
    let records = transform(precise, IngestMode::Finished).expect("transform");
    assert_eq!(records[0].score1, Some(9_007_199_254_740_993));

    let overflow = ligue1(|row, name| (row == 1 && name == "season").then_some("9223372036854775809"));
    assert!(matches!(
        coerce(&overflow),
        Err(IngestError::TypeCoercion { ref field, row: 1, .. }) if field == "season"
    ));

    let inexact = ligue1(|row, name| (row == 2 && name == "score2").then_some("9007199254740993.0"));
    assert!(matches!(
        coerce(&inexact),
        Err(IngestError::TypeCoercion { ref field, row: 2, .. }) if field == "score2"
    ));
}

#[test]
fn transform_reports_each_step_with_row_counts() {
    let table = ligue1(|row, name| (row == 0 && name == "score1").then_some(""));
    let mut steps = Vec::new();
    let out = transform_reporting(table.clone(), IngestMode::Finished, &mut |step| steps.push(step))
        .expect("transform");
    assert_eq!(
        steps,
        vec![
            Step::FilteringFinished,
            Step::DroppingMissing,
            Step::SettingTypes,
            Step::GeneratingRecords,
        ]
    );
    assert_eq!((out.rows_after_filter, out.rows_after_drop), (2, 2));
    assert_eq!(out.records.len(), 2);

    steps.clear();
    let all = transform_reporting(table, IngestMode::All, &mut |step| steps.push(step))
        .expect("transform");
    assert_eq!(steps.first(), Some(&Step::DroppingMissing));
    assert_eq!(all.records.len(), 3);
}
