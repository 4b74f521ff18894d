use breathwork_core::error::Result;
use breathwork_core::{PatternCatalog, PhaseSpec};
use serde::Serialize;

#[derive(Serialize)]
struct PatternSummary<'a> {
    id: &'static str,
    label: &'static str,
    description: &'static str,
    cycle_secs: f64,
    breaths_per_minute: f64,
    phases: &'a [PhaseSpec],
}

pub fn run(json: bool) -> Result<()> {
    let catalog = PatternCatalog::builtin();

    if json {
        let summaries: Vec<_> = catalog
            .iter()
            .map(|p| PatternSummary {
                id: p.id.as_str(),
                label: p.label(),
                description: p.description(),
                cycle_secs: p.cycle_secs(),
                breaths_per_minute: p.breaths_per_minute(),
                phases: p.phases(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for pattern in catalog.iter() {
        let phases: Vec<String> = pattern
            .phases()
            .iter()
            .map(|p| format!("{} {}s", p.kind.instruction(), p.duration_secs))
            .collect();
        println!(
            "{:<10} {:<12} {:>4}s  {}  -- {}",
            pattern.id.as_str(),
            pattern.label(),
            pattern.cycle_secs(),
            phases.join(", "),
            pattern.description()
        );
    }
    Ok(())
}
