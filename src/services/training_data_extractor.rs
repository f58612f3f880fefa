//! Label anchored extraction of training metrics from recognized console text.
//!
//! Each field owns a small list of case-insensitive patterns. The first
//! capturing group of the first pattern that matches wins; a field whose
//! patterns all miss stays `None`. Fields are independent of each other, so
//! missing or reordered readouts and partial OCR failures only affect the
//! fields they touch.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::models::ExtractedTrainingData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Duration,
    Calories,
    Distance,
    Floors,
    MaxHeartRate,
    AvgHeartRate,
    Power,
}

struct FieldRule {
    field: Field,
    patterns: &'static [&'static str],
}

// `\D{0,40}?` keeps a label from reaching a number that belongs to another readout.
// Floors and power read as either label or unit, so the same-line forms are
// tried before a label may look past a line break.
const RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::Duration,
        patterns: &[
            r"(?:dauer|duration)\D{0,40}?(\d+:\d+)",
            r"(?:zeit|time)\D{0,40}?(\d+:\d+)",
        ],
    },
    FieldRule {
        field: Field::Calories,
        patterns: &[
            r"(?:kalorien|calories)\D{0,40}?(\d+)",
            r"(\d+)\s*kcal",
        ],
    },
    FieldRule {
        field: Field::Distance,
        patterns: &[
            r"(?:entfernung|distanz|distance|strecke)\D{0,40}?(\d+(?:[.,]\d+)?)",
            r"(\d+(?:[.,]\d+)?)\s*km\b(?:[^/]|$)",
        ],
    },
    FieldRule {
        field: Field::Floors,
        patterns: &[
            r"(?:stockwerke|floors)[^\d\r\n]{0,40}?(\d+)",
            r"(\d+)[ \t]*(?:stockwerke|floors)",
            r"(?:stockwerke|floors)\D{0,40}?(\d+)",
        ],
    },
    FieldRule {
        field: Field::MaxHeartRate,
        patterns: &[
            r"maximale\s+herzfrequenz\D{0,40}?(\d+)",
            r"max(?:imum|\.)?\s*(?:heart\s*rate|hr|herzfrequenz|puls)\D{0,40}?(\d+)",
        ],
    },
    FieldRule {
        field: Field::AvgHeartRate,
        patterns: &[
            r"mittlere\s+herzfrequenz\D{0,40}?(\d+)",
            r"(?:avg|average|durchschnittliche)\.?\s*(?:heart\s*rate|hr|herzfrequenz|puls)\D{0,40}?(\d+)",
        ],
    },
    FieldRule {
        field: Field::Power,
        patterns: &[
            r"(?:leistung|power)[^\d\r\n]{0,40}?(\d+)",
            r"(\d+)[ \t]*watts?\b",
            r"(?:leistung|power|watts?)\D{0,40}?(\d+)",
        ],
    },
];

struct CompiledRule {
    field: Field,
    patterns: Vec<Regex>,
}

static COMPILED_RULES: Lazy<Vec<CompiledRule>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|rule| CompiledRule {
            field: rule.field,
            patterns: rule
                .patterns
                .iter()
                .map(|pattern| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .dot_matches_new_line(true)
                        .build()
                        .expect("extraction patterns are valid regular expressions")
                })
                .collect(),
        })
        .collect()
});

/// Extract every recognizable metric from OCR output.
pub fn extract(raw_text: &str) -> ExtractedTrainingData {
    let mut data = ExtractedTrainingData::default();

    for rule in COMPILED_RULES.iter() {
        let Some(value) = first_capture(&rule.patterns, raw_text) else {
            continue;
        };

        match rule.field {
            Field::Duration => data.duration = Some(value.to_string()),
            Field::Calories => data.calories = parse_integer(value),
            Field::Distance => data.distance_km = parse_decimal(value),
            Field::Floors => data.floors = parse_integer(value),
            Field::MaxHeartRate => data.max_heart_rate = parse_integer(value),
            Field::AvgHeartRate => data.avg_heart_rate = parse_integer(value),
            Field::Power => data.power_watts = parse_integer(value),
        }
    }

    data
}

fn first_capture<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map(|group| group.as_str())
    })
}

fn parse_integer(value: &str) -> Option<i32> {
    value.parse().ok()
}

fn parse_decimal(value: &str) -> Option<f64> {
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
