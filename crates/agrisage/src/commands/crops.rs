//! Crop command handlers.

use chrono::Utc;
use tabled::Tabled;

use agrisage_core::{Advisor, CreateCropRequest, Crop, FarmId};

use crate::cli::{CropsArgs, CropsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CropRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Acres")]
    acres: String,
    #[tabled(rename = "Planted")]
    planted: String,
    #[tabled(rename = "Harvest")]
    harvest: String,
}

impl From<&Crop> for CropRow {
    fn from(c: &Crop) -> Self {
        let harvest = match (c.expected_harvest_date, c.days_to_harvest(Utc::now())) {
            (Some(date), Some(days)) if days >= 0 => format!("{} ({days}d)", util::date(&date)),
            (Some(date), _) => util::date(&date),
            (None, _) => String::new(),
        };
        Self {
            id: c.id.to_string(),
            name: c.name.clone(),
            stage: c.stage.to_string(),
            acres: format!("{:.1}", c.area_acres),
            planted: util::date(&c.planting_date),
            harvest,
        }
    }
}

async fn print_crops(advisor: &Advisor, farm: FarmId, global: &GlobalOpts) -> Result<(), CliError> {
    let crops = advisor.farm_crops(farm).await?;
    let out = output::render_list(
        &global.output,
        crops.as_slice(),
        |c| CropRow::from(c),
        |c| c.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(advisor: &Advisor, args: CropsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CropsCommand::List { farm } => print_crops(advisor, FarmId::new(farm), global).await,

        CropsCommand::Create {
            farm,
            name,
            planted,
            harvest,
            stage,
            area,
        } => {
            let farm = FarmId::new(farm);
            let request = CreateCropRequest {
                farm,
                name,
                planting_date: util::parse_date("planted", &planted)?,
                expected_harvest_date: harvest
                    .as_deref()
                    .map(|raw| util::parse_date("harvest", raw))
                    .transpose()?,
                stage: util::growth_stage(stage),
                area_acres: area,
            };
            let crop = advisor.create_crop(request).await?;
            if !global.quiet {
                eprintln!("✓ Crop '{}' created (id {})", crop.name, crop.id);
            }
            // The create invalidated this farm's crop list; this read refetches it.
            print_crops(advisor, farm, global).await
        }
    }
}
