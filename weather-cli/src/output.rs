use chrono::Local;
use weather_core::{HistoryEntry, SearchOutcome, WeatherResult};

pub fn print_weather(weather: &WeatherResult) {
    println!("{}", weather.display_name());
    if let Some(desc) = weather.description() {
        println!("  Conditions:  {desc}");
    }
    println!("  Temperature: {} °C", weather.normalized.temp_c);
    println!("  Visibility:  {} km", weather.normalized.visibility_km);
    if let Some(humidity) = weather.humidity_pct() {
        println!("  Humidity:    {humidity}%");
    }
    if let Some(wind) = weather.wind_speed_mps() {
        println!("  Wind:        {wind:.1} m/s");
    }
    if let Some(observed) = weather.observed_at() {
        let local = observed.with_timezone(&Local);
        println!("  Observed:    {}", local.format("%Y-%m-%d %H:%M"));
    }
}

/// Prints a finished search. Returns `false` if it did not succeed.
pub fn print_outcome(outcome: &SearchOutcome) -> bool {
    match outcome {
        SearchOutcome::Success(weather) => {
            print_weather(weather);
            true
        }
        SearchOutcome::Failed(err) => {
            eprintln!("{}", err.user_message());
            false
        }
        SearchOutcome::Superseded => false,
    }
}

pub fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No searches yet.");
        return;
    }
    for (idx, entry) in entries.iter().enumerate() {
        println!("{:>3}. {:<30} {}", idx + 1, entry.location, entry.id);
    }
}

/// Printed before dispatching, so it always precedes the result.
pub fn print_loading(location: &str) {
    eprintln!("{}", loading_line(location));
}

fn loading_line(location: &str) -> String {
    match location.trim() {
        "" => "Loading weather...".to_string(),
        loc => format!("Loading weather for {loc}..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_line_names_the_location() {
        assert_eq!(loading_line(" Paris "), "Loading weather for Paris...");
    }

    #[test]
    fn loading_line_without_location() {
        assert_eq!(loading_line("  "), "Loading weather...");
    }
}
