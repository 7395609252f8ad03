//! Duration text format for duration-typed configuration keys
//!
//! Accepts ISO-8601 durations with whole-number components (`PT5M`, `P30D`,
//! `P1W`, `PT1H30M`) and the legacy clock form `HH:MM:SS`. Output is always
//! ISO-8601.

use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// Parse a duration, returning `None` if the text is not a valid duration
pub fn parse(text: &str) -> Option<Duration> {
	let text = text.trim();
	if text.contains(':') {
		return parse_clock(text);
	}
	parse_iso(text)
}

fn parse_clock(text: &str) -> Option<Duration> {
	let mut parts = text.split(':');
	let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
	if parts.next().is_some() {
		return None;
	}
	let field = |p: &str| -> Option<u64> {
		if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
			return None;
		}
		p.parse().ok()
	};
	let (h, m, s) = (field(h)?, field(m)?, field(s)?);
	if m >= 60 || s >= 60 {
		return None;
	}
	Some(Duration::from_secs(h.checked_mul(HOUR)?.checked_add(m * MINUTE + s)?))
}

fn parse_iso(text: &str) -> Option<Duration> {
	let rest = text.strip_prefix('P').or_else(|| text.strip_prefix('p'))?;
	let mut secs: u64 = 0;
	let mut in_time = false;
	let mut seen_component = false;
	let mut seen_time_component = false;
	// Units must appear in this order; index of the last unit seen
	let mut last_unit = 0usize;
	let mut number = String::new();

	for c in rest.chars() {
		if c.is_ascii_digit() {
			number.push(c);
			continue;
		}
		let c = c.to_ascii_uppercase();
		if c == 'T' {
			if in_time || !number.is_empty() {
				return None;
			}
			in_time = true;
			continue;
		}
		let (unit_index, unit_secs) = match (in_time, c) {
			(false, 'W') => (1, WEEK),
			(false, 'D') => (2, DAY),
			(true, 'H') => (3, HOUR),
			(true, 'M') => (4, MINUTE),
			(true, 'S') => (5, 1),
			_ => return None,
		};
		if number.is_empty() || unit_index <= last_unit {
			return None;
		}
		let value: u64 = number.parse().ok()?;
		secs = secs.checked_add(value.checked_mul(unit_secs)?)?;
		number.clear();
		last_unit = unit_index;
		seen_component = true;
		seen_time_component |= in_time;
	}

	if !number.is_empty() || !seen_component || (in_time && !seen_time_component) {
		return None;
	}
	Some(Duration::from_secs(secs))
}

/// Format a duration as ISO-8601, dropping sub-second precision
pub fn format(duration: Duration) -> String {
	let total = duration.as_secs();
	if total == 0 {
		return "PT0S".to_string();
	}
	let days = total / DAY;
	let hours = (total % DAY) / HOUR;
	let minutes = (total % HOUR) / MINUTE;
	let seconds = total % MINUTE;

	let mut out = String::from("P");
	if days > 0 {
		out.push_str(&format!("{}D", days));
	}
	if hours > 0 || minutes > 0 || seconds > 0 {
		out.push('T');
		if hours > 0 {
			out.push_str(&format!("{}H", hours));
		}
		if minutes > 0 {
			out.push_str(&format!("{}M", minutes));
		}
		if seconds > 0 {
			out.push_str(&format!("{}S", seconds));
		}
	}
	out
}


// vim: ts=4
