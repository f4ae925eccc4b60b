//! Overview handlers: totals across farms, quick stats for one farm.

use tabled::Tabled;

use agrisage_core::{Advisor, Dashboard, FarmId, FarmOverview, FarmTotals};

use crate::cli::{GlobalOpts, OutputFormat, OverviewArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct FarmTotalsRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Acres")]
    acres: String,
    #[tabled(rename = "Crops")]
    crops: String,
    #[tabled(rename = "Planted")]
    planted: String,
}

impl From<&FarmTotals> for FarmTotalsRow {
    fn from(f: &FarmTotals) -> Self {
        Self {
            id: f.id.to_string(),
            name: f.name.clone(),
            acres: format!("{:.1}", f.size_acres),
            crops: f.crops.to_string(),
            planted: format!("{:.1}", f.planted_acres),
        }
    }
}

fn dashboard_totals(d: &Dashboard) -> String {
    output::detail_lines(&[
        ("Total farms", d.total_farms.to_string()),
        ("Total crops", d.total_crops.to_string()),
        ("Total acres", format!("{:.1}", d.total_acres)),
    ])
}

fn farm_overview_detail(o: &FarmOverview) -> String {
    let temperature = o
        .temperature_c
        .map_or_else(|| "N/A".to_owned(), |t| format!("{t:.1} °C"));
    output::detail_lines(&[
        ("Farm", format!("{} [{}]", o.name, o.id)),
        ("Size", format!("{:.1} acres", o.size_acres)),
        ("Active crops", o.crops.to_string()),
        (
            "Recommendations",
            format!("{} ({} pending)", o.recommendations, o.pending_recommendations),
        ),
        ("Current temp", temperature),
    ])
}

pub async fn handle(
    advisor: &Advisor,
    args: OverviewArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = match args.farm {
        Some(farm) => {
            let overview = advisor.farm_overview(FarmId::new(farm)).await?;
            output::render_single(&global.output, &overview, farm_overview_detail, |o| {
                format!("{}\t{}", o.crops, o.recommendations)
            })?
        }
        None => {
            let dashboard = advisor.dashboard().await?;
            match global.output {
                OutputFormat::Table if dashboard.farms.is_empty() => {
                    format!(
                        "{}\n\nNo farms yet. Add one with: agrisage farms create",
                        dashboard_totals(&dashboard)
                    )
                }
                OutputFormat::Table => {
                    let table = output::render_list(
                        &global.output,
                        dashboard.farms.as_slice(),
                        |f| FarmTotalsRow::from(f),
                        |f| f.id.to_string(),
                    )?;
                    format!("{}\n\n{table}", dashboard_totals(&dashboard))
                }
                _ => output::render_single(&global.output, &dashboard, dashboard_totals, |d| {
                    format!("{}\t{}", d.total_farms, d.total_crops)
                })?,
            }
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
