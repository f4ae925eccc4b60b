//! Farm command handlers.

use tabled::Tabled;

use agrisage_core::{Advisor, Farm, FarmId};

use crate::cli::{FarmsArgs, FarmsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FarmRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Acres")]
    acres: String,
    #[tabled(rename = "Soil")]
    soil: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Crops")]
    crops: String,
}

impl From<&Farm> for FarmRow {
    fn from(f: &Farm) -> Self {
        Self {
            id: f.id.to_string(),
            name: f.name.clone(),
            acres: format!("{:.1}", f.size_acres),
            soil: f.soil_type.to_string(),
            location: f.location.to_string(),
            crops: f.crops.len().to_string(),
        }
    }
}

pub(super) fn farm_detail(f: &Farm) -> String {
    let crops = if f.crops.is_empty() {
        "(none)".to_owned()
    } else {
        f.crops
            .iter()
            .map(|c| format!("{} [{}] {}", c.name, c.id, c.stage))
            .collect::<Vec<_>>()
            .join(", ")
    };
    output::detail_lines(&[
        ("ID", f.id.to_string()),
        ("Name", f.name.clone()),
        ("Size", format!("{:.1} acres", f.size_acres)),
        ("Planted", format!("{:.1} acres", f.planted_acres())),
        ("Soil", f.soil_type.to_string()),
        ("Location", f.location.to_string()),
        ("Created", util::date(&f.created_at)),
        ("Crops", crops),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(advisor: &Advisor, args: FarmsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        FarmsCommand::List => {
            let farms = advisor.farms().await?;
            let out = output::render_list(
                &global.output,
                farms.as_slice(),
                |f| FarmRow::from(f),
                |f| f.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FarmsCommand::Get { id } => {
            let farm = advisor.farm(FarmId::new(id)).await?;
            let out = output::render_single(&global.output, &*farm, farm_detail, |f| {
                f.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FarmsCommand::Create(fields) => {
            let farm = advisor.create_farm(util::farm_request(fields)).await?;
            let out = output::render_single(&global.output, &farm, farm_detail, |f| {
                f.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            if !global.quiet {
                eprintln!("✓ Farm created");
            }
            Ok(())
        }

        FarmsCommand::Update { id, fields } => {
            let farm = advisor
                .update_farm(FarmId::new(id), util::farm_request(fields))
                .await?;
            let out = output::render_single(&global.output, &farm, farm_detail, |f| {
                f.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            if !global.quiet {
                eprintln!("✓ Farm updated");
            }
            Ok(())
        }
    }
}
