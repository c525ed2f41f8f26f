use metric_script::{Pipeline, PipelineConfig};

const NUMERATOR: &str = "\
1. Exclude line where column \"Status\" = \"Cancelled\"
2. Filter column \"Priority\" contain \"P1\", \"P2\"
3. Filter column \"Met SLA\" = \"Yes\"
";

const DENOMINATOR: &str = "\
1. Exclude line where column \"Status\" = \"Cancelled\"
2. Filter column \"Priority\" contain \"P1\", \"P2\"
";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = PipelineConfig::from_json(r#"{ "emitter": { "ratio_key": "performance" } }"#)
        .expect("valid config");
    let generation = Pipeline::new(config)
        .run_text([("Numerator", NUMERATOR), ("Denominator", DENOMINATOR)])
        .expect("failed to generate script");

    for warning in &generation.warnings {
        log::warn!("{warning}");
    }
    for error in &generation.text_errors {
        log::error!("{error}");
    }

    let body = generation.document.to_search_body("sla_met", None);
    match serde_json::to_string_pretty(&body) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("failed to serialize: {e}"),
    }
}
