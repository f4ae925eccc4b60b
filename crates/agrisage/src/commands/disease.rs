//! Disease detection handlers.

use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use agrisage_core::{Advisor, CoreError, CropId, Detection, FarmId, ImageUpload};

use crate::cli::{DiseaseArgs, DiseaseCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DetectionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Crop")]
    crop: String,
    #[tabled(rename = "Disease")]
    disease: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Detected")]
    detected: String,
}

fn row(d: &Detection, color: bool) -> DetectionRow {
    DetectionRow {
        id: d.id.map(|id| id.to_string()).unwrap_or_default(),
        crop: d.crop_id.to_string(),
        disease: d.disease.clone(),
        confidence: d.confidence.to_string(),
        severity: output::paint_severity(d.severity, color),
        detected: util::datetime_opt(d.detected_at.as_ref()),
    }
}

fn detection_detail(d: &Detection, color: bool) -> String {
    let mut pairs = vec![
        ("Disease", d.disease.clone()),
        ("Confidence", d.confidence.to_string()),
        ("Severity", output::paint_severity(d.severity, color)),
    ];
    if !d.treatments.is_empty() {
        pairs.push(("Treatment", d.treatments.join("; ")));
    }
    if !d.prevention.is_empty() {
        pairs.push(("Prevention", d.prevention.join("; ")));
    }
    output::detail_lines(&pairs)
}

fn spinner(message: String, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

pub async fn handle(
    advisor: &Advisor,
    args: DiseaseArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match args.command {
        DiseaseCommand::Detect { farm, crop, image } => {
            let upload = ImageUpload::from_path(&image)
                .await
                .map_err(CoreError::from)?;
            let size = ByteSize::b(u64::try_from(upload.len()).unwrap_or(u64::MAX));

            let bar = spinner(format!("Analyzing {} ({size})", upload.file_name), global.quiet);
            let result = advisor
                .detect_disease(FarmId::new(farm), CropId::new(crop), upload)
                .await;
            bar.finish_and_clear();

            let detection = result?;
            let out = output::render_single(
                &global.output,
                &detection,
                |d| detection_detail(d, color),
                |d| d.disease.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DiseaseCommand::History { farm } => {
            let history = advisor.disease_history(FarmId::new(farm)).await?;
            let out = output::render_list(
                &global.output,
                history.as_slice(),
                |d| row(d, color),
                |d| d.id.map(|id| id.to_string()).unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
