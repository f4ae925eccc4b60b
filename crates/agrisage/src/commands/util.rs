//! Shared helpers for command handlers.

use std::io::BufRead;

use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;

use agrisage_core::{FarmRequest, GrowthStage, SoilType};

use crate::cli::{FarmFields, SoilArg, StageArg};
use crate::error::CliError;

/// Parse a `YYYY-MM-DD` date flag.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("expected YYYY-MM-DD, got '{raw}' ({e})"),
    })
}

pub fn soil_type(arg: SoilArg) -> SoilType {
    match arg {
        SoilArg::Sandy => SoilType::Sandy,
        SoilArg::Loamy => SoilType::Loamy,
        SoilArg::Clay => SoilType::Clay,
        SoilArg::Silty => SoilType::Silty,
    }
}

pub fn growth_stage(arg: StageArg) -> GrowthStage {
    match arg {
        StageArg::Seedling => GrowthStage::Seedling,
        StageArg::Vegetative => GrowthStage::Vegetative,
        StageArg::Flowering => GrowthStage::Flowering,
        StageArg::Fruiting => GrowthStage::Fruiting,
        StageArg::Harvesting => GrowthStage::Harvesting,
    }
}

pub fn farm_request(fields: FarmFields) -> FarmRequest {
    FarmRequest {
        name: fields.name,
        size_acres: fields.size,
        soil_type: soil_type(fields.soil),
        latitude: fields.lat,
        longitude: fields.lon,
    }
}

/// Read a password from stdin or prompt for it without echo.
pub fn read_password(from_stdin: bool, prompt: &str) -> Result<SecretString, CliError> {
    let raw = if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password(prompt).map_err(CliError::prompt)?
    };
    if raw.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(raw))
}

pub fn date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

pub fn date_opt(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(date).unwrap_or_default()
}

pub fn datetime_opt(ts: Option<&DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
