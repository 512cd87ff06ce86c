//! Icon/style enrichment.
//!
//! Attaches a presentation key to every weather descriptor according to
//! the configured style set. Pure transform with no rejection path, and
//! idempotent — applying it twice yields the same structure, which lets
//! cache hits from an older style configuration be repaired on read.

use common::types::{ForecastResult, StyleSet, WeatherDescriptor};

const NA_ICON_CLASS: &str = "wi-na";
const NA_ICON_NAME: &str = "not-available";

/// Icon code → Weather Icons font class, day/night variants.
fn icon_class_for(code: &str) -> &'static str {
    match code {
        "01d" => "wi-day-sunny",
        "01n" => "wi-night-clear",
        "02d" => "wi-day-cloudy",
        "02n" => "wi-night-alt-cloudy",
        "03d" | "03n" => "wi-cloud",
        "04d" | "04n" => "wi-cloudy",
        "09d" => "wi-showers",
        "09n" => "wi-night-alt-showers",
        "10d" => "wi-day-rain",
        "10n" => "wi-night-alt-rain",
        "11d" => "wi-thunderstorm",
        "11n" => "wi-night-alt-thunderstorm",
        "13d" => "wi-snow",
        "13n" => "wi-night-alt-snow",
        "50d" => "wi-fog",
        "50n" => "wi-night-fog",
        _ => NA_ICON_CLASS,
    }
}

/// Icon code → vector asset base name, shared by the fill and outline sets.
fn icon_name_for(code: &str) -> &'static str {
    match code {
        "01d" => "clear-day",
        "01n" => "clear-night",
        "02d" => "partly-cloudy-day",
        "02n" => "partly-cloudy-night",
        "03d" | "03n" => "cloudy",
        "04d" | "04n" => "overcast",
        "09d" | "09n" => "drizzle",
        "10d" => "partly-cloudy-day-rain",
        "10n" => "partly-cloudy-night-rain",
        "11d" => "thunderstorms-day",
        "11n" => "thunderstorms-night",
        "13d" | "13n" => "snow",
        "50d" => "fog-day",
        "50n" => "fog-night",
        _ => NA_ICON_NAME,
    }
}

/// Attach the style field for `style_set` to the current descriptor and
/// every daily descriptor. Plain images need no extra field: the renderer
/// derives the filename from the icon code.
pub fn enrich(result: &mut ForecastResult, style_set: StyleSet) {
    let apply: fn(&mut WeatherDescriptor) = match style_set {
        StyleSet::PlainImage => return,
        StyleSet::IconFont => |w| w.icon_class = Some(icon_class_for(&w.icon).to_string()),
        StyleSet::VectorFill | StyleSet::VectorOutline => {
            |w| w.icon_name = Some(icon_name_for(&w.icon).to_string())
        }
    };

    if let Some(w) = result.current.weather.first_mut() {
        apply(w);
    }
    for day in &mut result.daily {
        if let Some(w) = day.weather.first_mut() {
            apply(w);
        }
    }
}
