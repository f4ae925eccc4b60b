//! Weather command handlers.

use tabled::Tabled;

use agrisage_core::{Advisor, FarmId, ForecastEntry, Weather, WeatherSource};

use crate::cli::{GlobalOpts, OutputFormat, WeatherArgs, WeatherCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Temp °C")]
    temperature: String,
    #[tabled(rename = "Humidity %")]
    humidity: String,
    #[tabled(rename = "Rain mm")]
    rainfall: String,
    #[tabled(rename = "Wind m/s")]
    wind: String,
    #[tabled(rename = "Conditions")]
    description: String,
}

impl From<&ForecastEntry> for ForecastRow {
    fn from(e: &ForecastEntry) -> Self {
        Self {
            time: util::datetime_opt(e.time.as_ref()),
            temperature: format!("{:.1}", e.temperature_c),
            humidity: format!("{:.0}", e.humidity_pct),
            rainfall: format!("{:.1}", e.rainfall_mm),
            wind: format!("{:.1}", e.wind_speed_ms),
            description: e.description.clone().unwrap_or_default(),
        }
    }
}

fn weather_detail(w: &Weather) -> String {
    let mut pairs = vec![
        ("Temperature", format!("{:.1} °C", w.temperature_c)),
        ("Humidity", format!("{:.0} %", w.humidity_pct)),
        ("Wind", format!("{:.1} m/s", w.wind_speed_ms)),
        ("Rainfall", format!("{:.1} mm", w.rainfall_mm)),
    ];
    if let Some(p) = w.pressure_hpa {
        pairs.push(("Pressure", format!("{p:.0} hPa")));
    }
    if let Some(ref d) = w.description {
        pairs.push(("Conditions", d.clone()));
    }
    pairs.push(("Observed", util::datetime_opt(w.observed_at.as_ref())));
    pairs.push(("Source", w.source.to_string()));
    output::detail_lines(&pairs)
}

fn warn_if_mock(source: WeatherSource, quiet: bool) {
    if source == WeatherSource::Mock && !quiet {
        eprintln!("note: the server has no live weather provider; values are simulated");
    }
}

pub async fn handle(
    advisor: &Advisor,
    args: WeatherArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        WeatherCommand::Current { farm } => {
            let weather = advisor.weather(FarmId::new(farm)).await?;
            let out = output::render_single(&global.output, &*weather, weather_detail, |w| {
                format!("{:.1}", w.temperature_c)
            })?;
            output::print_output(&out, global.quiet);
            warn_if_mock(weather.source, global.quiet);
            Ok(())
        }

        WeatherCommand::Forecast { farm, days } => {
            let forecast = advisor.forecast(FarmId::new(farm), days).await?;
            let out = match global.output {
                OutputFormat::Table => {
                    let table = output::render_list(
                        &global.output,
                        forecast.entries.as_slice(),
                        |e| ForecastRow::from(e),
                        |e| util::datetime_opt(e.time.as_ref()),
                    )?;
                    let place = match (&forecast.city, &forecast.country) {
                        (Some(city), Some(country)) => format!("{city}, {country}: "),
                        (Some(city), None) => format!("{city}: "),
                        _ => String::new(),
                    };
                    format!(
                        "{table}\n{place}{:.1} mm rain expected over {days} day(s)",
                        forecast.total_rainfall_mm()
                    )
                }
                _ => output::render_single(&global.output, &*forecast, |_| String::new(), |f| {
                    f.entries
                        .iter()
                        .map(|e| util::datetime_opt(e.time.as_ref()))
                        .collect::<Vec<_>>()
                        .join("\n")
                })?,
            };
            output::print_output(&out, global.quiet);
            warn_if_mock(forecast.source, global.quiet);
            Ok(())
        }
    }
}
