//! Human-readable rendering of pipeline results.

use std::process::ExitCode;

use chrono::Local;
use geoweather_core::{LocationEntry, WeatherOutcome, WeatherResult};

/// Print `outcome` and pick the process exit code for it.
pub fn print_outcome(outcome: &WeatherOutcome) -> ExitCode {
    match outcome {
        WeatherOutcome::Success(result) => {
            print!("{}", render_result(result));
            ExitCode::SUCCESS
        }
        WeatherOutcome::NeedsClientLocation => {
            println!("Your address cannot be located from here.");
            println!("Share your position instead, e.g.:");
            println!("  geoweather show --lat <LAT> --lon <LON>");
            ExitCode::SUCCESS
        }
        WeatherOutcome::Failure(failure) => {
            eprintln!("Error {}: {}", failure.code.http_status(), failure.message);
            ExitCode::FAILURE
        }
    }
}

fn render_result(result: &WeatherResult) -> String {
    let mut out = format!("Weather in {}\n", result.city_display_name);

    if let Some(description) = &result.description {
        out.push_str(&format!("  Condition:   {description} ({})\n", result.condition_code));
    } else {
        out.push_str(&format!("  Condition:   {}\n", result.condition_code));
    }
    if let Some(temp) = result.temperature_c {
        out.push_str(&format!("  Temperature: {temp:.1} °C\n"));
    }
    if let Some(observed) = result.observed_at {
        let local = observed.with_timezone(&Local);
        out.push_str(&format!("  Observed:    {}\n", local.format("%Y-%m-%d %H:%M")));
    }
    out.push_str(&format!("  Icon:        {}\n", result.icon_url));

    out
}

pub fn print_locations(entries: &[LocationEntry]) {
    if entries.is_empty() {
        println!("No locations available.");
        return;
    }
    for entry in entries {
        println!("{entry}");
    }
}
