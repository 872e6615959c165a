//! Schema checks and raw-record conversion.

use log::trace;
use serde_json::Value;

use crate::{IncidentPoint, RawDataset, RawRecord};

/// Column carrying latitude in degrees.
pub const LAT_FIELD: &str = "lat";
/// Column carrying longitude in degrees.
pub const LNG_FIELD: &str = "lng";
/// Column carrying the incident weight.
pub const WEIGHT_FIELD: &str = "weight";

/// Every column a dataset schema must advertise.
pub const REQUIRED_FIELDS: [&str; 3] = [LAT_FIELD, LNG_FIELD, WEIGHT_FIELD];

/// Points converted from a raw dataset plus the number of dropped records.
#[derive(Debug, Default)]
pub(crate) struct Conversion {
    pub(crate) points: Vec<IncidentPoint>,
    pub(crate) skipped: usize,
}

/// Required columns absent from the schema.
///
/// A dataset that advertises no columns at all (an empty source) has
/// nothing to check and yields no missing fields.
pub(crate) fn missing_fields(raw: &RawDataset) -> Vec<&'static str> {
    if raw.columns.is_empty() {
        return Vec::new();
    }
    REQUIRED_FIELDS
        .into_iter()
        .filter(|field| !raw.has_column(field))
        .collect()
}

/// Convert records, skipping any that lack a field or fail validation.
pub(crate) fn convert_records(records: &[RawRecord]) -> Conversion {
    records
        .iter()
        .enumerate()
        .fold(Conversion::default(), |mut acc, (row, record)| {
            match convert_record(record) {
                Some(point) => acc.points.push(point),
                None => {
                    trace!("skipping malformed incident record {row}");
                    acc.skipped = acc.skipped.saturating_add(1);
                }
            }
            acc
        })
}

fn convert_record(record: &RawRecord) -> Option<IncidentPoint> {
    let lat = numeric_field(record, LAT_FIELD)?;
    let lng = numeric_field(record, LNG_FIELD)?;
    let weight = numeric_field(record, WEIGHT_FIELD)?;
    IncidentPoint::new(lat, lng, weight).ok()
}

/// Read a field as a float, accepting JSON numbers and numeric strings.
fn numeric_field(record: &RawRecord, name: &str) -> Option<f64> {
    match record.get(name)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record(value: &Value) -> RawRecord {
        value.as_object().cloned().expect("object literal")
    }

    #[rstest]
    fn accepts_numbers_and_numeric_strings() {
        let records = [
            record(&json!({"lat": 41.2, "lng": -111.9, "weight": 3})),
            record(&json!({"lat": " 41.2 ", "lng": "-111.9", "weight": "4.5"})),
        ];
        let converted = convert_records(&records);
        assert_eq!(converted.points.len(), 2);
        assert_eq!(converted.skipped, 0);
        assert_eq!(converted.points.last().map(|p| p.weight), Some(4.5));
    }

    #[rstest]
    #[case(json!({"lng": -111.9, "weight": 3}))]
    #[case(json!({"lat": 41.2, "lng": -111.9, "weight": null}))]
    #[case(json!({"lat": "north", "lng": -111.9, "weight": 3}))]
    #[case(json!({"lat": 141.2, "lng": -111.9, "weight": 3}))]
    #[case(json!({"lat": 41.2, "lng": -111.9, "weight": -2}))]
    fn skips_malformed_records(#[case] bad: Value) {
        let records = [
            record(&bad),
            record(&json!({"lat": 41.2, "lng": -111.9, "weight": 1})),
        ];
        let converted = convert_records(&records);
        assert_eq!(converted.points.len(), 1);
        assert_eq!(converted.skipped, 1);
    }

    #[rstest]
    fn reports_missing_schema_fields() {
        let raw = RawDataset::new(vec!["lat".to_owned(), "longitude".to_owned()], Vec::new());
        assert_eq!(missing_fields(&raw), vec![LNG_FIELD, WEIGHT_FIELD]);
    }

    #[rstest]
    fn empty_schema_has_nothing_missing() {
        assert!(missing_fields(&RawDataset::default()).is_empty());
    }
}
