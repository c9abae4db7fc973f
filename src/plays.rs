use regex::Regex;
use std::sync::OnceLock;

fn suffixed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+(?:[.,]\d+)?)\s*([km])(?:[^a-z]|$)").expect("plays pattern is valid")
    })
}

/// Convert a human-readable play count into an integer.
///
/// Accepts the forms VK shows on album pages (`"542"`, `"1.2K"`, `"3M"`,
/// `"1,2K прослушиваний"`) as well as already-numeric strings. Anything
/// unparseable yields 0; this never fails.
///
/// # Examples
///
/// ```rust
/// use vk_album_stats::parse_plays;
///
/// assert_eq!(parse_plays("1.2K"), 1200);
/// assert_eq!(parse_plays("3M"), 3_000_000);
/// assert_eq!(parse_plays("542"), 542);
/// assert_eq!(parse_plays(""), 0);
/// ```
pub fn parse_plays(text: &str) -> u64 {
    let lowered = text.trim().to_lowercase();

    if let Some(captures) = suffixed_pattern().captures(&lowered) {
        let number = captures[1].replace(',', ".");
        let multiplier = if &captures[2] == "k" { 1_000.0 } else { 1_000_000.0 };
        return number
            .parse::<f64>()
            .map(|value| (value * multiplier) as u64)
            .unwrap_or(0);
    }

    // Thousands separators and words are dropped, the digits are the count.
    let digits: String = lowered.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
