//! Bulletin text parsing.
//!
//! Pure functions over raw encoded report strings. Only the patterns needed
//! for display are extracted; anything malformed yields a documented
//! zero/unknown value instead of an error, so a bad bulletin never fails the
//! caller.

/// Weather phenomenon codes recognized for display, in priority order.
const PRECIP_CODES: [&str; 5] = ["SN", "TS", "RA", "BR", "FG"];

/// Extract wind direction, speed and gust (degrees, knots, knots).
///
/// The wind group is the first whitespace token ending in `KT`. Direction is
/// the first three characters, speed the next two; a `G` marker introduces a
/// two-character gust, otherwise the gust equals the speed.
///
/// Returns `(0, 0, 0)` when no wind group is present or any numeric part
/// fails to parse. Callers cannot distinguish that tuple from a genuinely
/// calm wind; the source encoding does not either.
pub fn parse_wind(text: &str) -> (i32, i32, i32) {
    for word in text.split_whitespace() {
        if !word.ends_with("KT") || word.len() < 5 {
            continue;
        }
        let direction = match word.get(0..3).and_then(|s| s.parse::<i32>().ok()) {
            Some(v) => v,
            None => return (0, 0, 0),
        };
        let speed = match word.get(3..5).and_then(|s| s.parse::<i32>().ok()) {
            Some(v) => v,
            None => return (0, 0, 0),
        };
        let gust = if word.as_bytes().get(5) == Some(&b'G') {
            match word.get(6..8).and_then(|s| s.parse::<i32>().ok()) {
                Some(v) => v,
                None => return (0, 0, 0),
            }
        } else {
            speed
        };
        return (direction, speed, gust);
    }
    (0, 0, 0)
}

/// Map a flight-category code to its marker color.
///
/// Total: every input maps to exactly one color, unknown categories to
/// `white`.
pub fn condition_color(category: &str) -> &'static str {
    match category {
        "VFR" => "#60FF60",
        "MVFR" => "#4040FF",
        "IFR" => "#FF3030",
        "LIFR" => "#FF60FF",
        _ => "white",
    }
}

/// First precipitation/obstruction token before the remarks section.
///
/// Tokens after the station identifier are scanned for `SN`, `TS`, `RA`,
/// `BR`, `FG` in that priority order; the first matching token wins.
/// Scanning stops with an empty result once a `RMK` token is reached.
pub fn extract_precip(text: &str) -> String {
    for word in text.split_whitespace().skip(1) {
        for code in PRECIP_CODES {
            if word.contains(code) {
                return word.to_string();
            }
        }
        if word.contains("RMK") {
            return String::new();
        }
    }
    String::new()
}

/// Temperature in whole degrees Fahrenheit, as a string.
///
/// The temperature/dewpoint group is the first token containing `/` that is
/// not a visibility (`SM` suffix). The encoded `M` negative marker becomes a
/// minus sign; magnitudes above 99 fold back the three-digit negative
/// encoding. Empty string when no group parses before the remarks section.
pub fn extract_temperature(text: &str) -> String {
    for word in text.split_whitespace().skip(1) {
        if word.contains('/') && !word.ends_with("SM") {
            let group = word.replace('M', "-");
            let celsius_part = match group.split('/').next() {
                Some(part) => part,
                None => return String::new(),
            };
            let mut celsius = match celsius_part.parse::<i32>() {
                Ok(v) => v,
                Err(_) => return String::new(),
            };
            if celsius > 99 {
                celsius = -(celsius - 1000);
            }
            let fahrenheit = (f64::from(celsius) * 9.0 / 5.0 + 32.0).round() as i32;
            return fahrenheit.to_string();
        }
        if word.contains("RMK") {
            break;
        }
    }
    String::new()
}

/// Whether any token after the station identifier reports lightning.
pub fn has_lightning(text: &str) -> bool {
    text.split_whitespace().skip(1).any(|word| word.contains("LTG"))
}
