use metric_script::parse::{parse_records, parse_rule_text, records_from_metric_rows};
use metric_script::{
    ColumnConfig, Metric, Operator, Pipeline, PipelineConfig, Rule, Value,
};

const NUMERATOR_CELL: &str = "\
1. Exclude line where column \"Status (Ticket Status)\" = \"Cancelled\"
2. Filter column \"Priority\" contain \"P1\", \"P2\"
3. Filter column \"Met SLA\" = \"Yes\"
";

const DENOMINATOR_CELL: &str = "\
1. Exclude line where column \"Status (Ticket Status)\" = \"Cancelled\"
2. Filter column \"Priority\" contain \"P1\", \"P2\"
";

#[test]
fn workbook_cells_become_rules() {
    let columns = ColumnConfig::default();
    let text = records_from_metric_rows(
        [("Numerator", NUMERATOR_CELL), ("Denominator", DENOMINATOR_CELL)],
        &columns,
    );
    assert!(text.errors.is_empty(), "{:?}", text.errors);

    let outcome = parse_records(&text.records, &columns);
    assert!(outcome.is_clean());

    let numerator = outcome.rules.rules(Metric::Numerator);
    assert_eq!(numerator.len(), 3);
    assert_eq!(numerator[0].field(), "Status (Ticket Status)");
    assert_eq!(numerator[0].operator(), &Operator::Exclude(Value::from("Cancelled")));
    assert_eq!(
        numerator[1].operator(),
        &Operator::Contain(vec!["P1".into(), "P2".into()])
    );
    assert_eq!(numerator[2].operator(), &Operator::Filter(Value::from("Yes")));
    assert_eq!(outcome.rules.rules(Metric::Denominator).len(), 2);
}

#[test]
fn custom_columns_are_respected() {
    let columns = ColumnConfig {
        field_column: "Column".into(),
        operator_column: "Rule".into(),
        value_column: "Match".into(),
        metric_column: "Target".into(),
    };
    let text = parse_rule_text(Metric::Denominator, "Filter column \"x\" = \"1\"", &columns);
    let outcome = parse_records(&text.records, &columns);
    let rules: Vec<&Rule> = outcome.rules.iter().collect();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].metric(), Metric::Denominator);
}

#[test]
fn unfilter_line_cancels_earlier_filter() {
    let generation = Pipeline::default()
        .run_text([(
            "Numerator",
            "Filter column \"type\" = \"A\"\nUnfilter column \"type\"\nFilter column \"region\" = \"EU\"",
        )])
        .unwrap();
    assert!(!generation.document.map_script.contains("'type'"));
    assert!(generation.document.map_script.contains("'region'"));
}

#[test]
fn lines_with_errors_report_their_position() {
    let text = parse_rule_text(
        Metric::Numerator,
        "Filter column \"a\" = \"1\"\n\nFilter \"b\" = \"2\"\nExclude column \"c\" = \"3\"",
        &ColumnConfig::default(),
    );
    assert_eq!(text.records.len(), 2);
    assert_eq!(text.errors.len(), 1);
    assert_eq!(text.errors[0].line, 3);
    assert!(text.errors[0].to_string().starts_with("numerator rules, line 3:"));
}

#[test]
fn search_body_wraps_aggregation_with_query() {
    let generation = Pipeline::new(
        PipelineConfig::from_json(r#"{ "emitter": { "ratio_key": "Final_Performance" } }"#).unwrap(),
    )
    .run_text([("Numerator", NUMERATOR_CELL), ("Denominator", DENOMINATOR_CELL)])
    .unwrap();

    let query = serde_json::json!({
        "bool": { "must": [ { "match": { "useInComputation": true } } ] }
    });
    let body = generation.document.to_search_body("group_by_sl_met", Some(query));
    let reduce = body["aggs"]["group_by_sl_met"]["scripted_metric"]["reduce_script"]
        .as_str()
        .unwrap();
    assert!(reduce.contains("'Final_Performance': ratio"));
    assert_eq!(body["size"], 0);
    assert!(body["query"]["bool"]["must"].is_array());
}
