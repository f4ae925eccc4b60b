//! Per-crop advice handlers.

use agrisage_core::{Advice, Advisor, CropId, FarmId, Recommendation};

use crate::cli::{AdviceArgs, AdviceCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

fn advice_detail(r: &Recommendation, color: bool) -> String {
    let mut pairs = vec![
        ("Advice", r.title.clone()),
        ("Priority", output::paint_priority(r.priority, color)),
    ];
    match &r.advice {
        Some(Advice::Irrigation {
            water_litres,
            frequency,
            best_time,
        }) => {
            pairs.push(("Water", format!("{water_litres:.0} L")));
            pairs.push(("Frequency", frequency.clone()));
            pairs.push(("Best time", best_time.clone()));
        }
        Some(Advice::Fertilizer {
            product,
            kg_per_acre,
            method,
            timing,
        }) => {
            pairs.push(("Product", product.clone()));
            pairs.push(("Rate", format!("{kg_per_acre:.1} kg/acre")));
            pairs.push(("Method", method.clone()));
            pairs.push(("Timing", timing.clone()));
        }
        None => {}
    }
    if !r.description.is_empty() {
        pairs.push(("Why", r.description.clone()));
    }
    output::detail_lines(&pairs)
}

pub async fn handle(advisor: &Advisor, args: AdviceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let recommendation = match args.command {
        AdviceCommand::Irrigation { farm, crop } => {
            advisor.irrigation(FarmId::new(farm), CropId::new(crop)).await?
        }
        AdviceCommand::Fertilizer { farm, crop } => {
            advisor.fertilizer(FarmId::new(farm), CropId::new(crop)).await?
        }
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &*recommendation,
        |r| advice_detail(r, color),
        |r| r.title.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
