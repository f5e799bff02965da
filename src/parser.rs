use std::collections::HashMap;

use tracing::{debug, instrument};

/// Lines starting with this marker carry headers or help text
const COMMENT_MARKER: char = '#';

/// Decode a KMA `typ01` text body into `station code -> value`.
///
/// Each non-comment line with more than two comma separated fields is a
/// record: field 1 is the station code and the second-to-last field is the
/// measured value (the last field is the `=` record terminator). Only codes
/// listed in `stations` are kept, and a later line for the same station
/// overwrites an earlier one, even when its value field is blank.
#[instrument(skip(body, stations), fields(body_size = body.len()))]
pub fn parse_station_values(body: &str, stations: &[String]) -> HashMap<String, String> {
    let mut values = HashMap::new();
    let mut record_count = 0;

    for line in body.lines() {
        if line.starts_with(COMMENT_MARKER) {
            continue;
        }

        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() <= 2 {
            continue;
        }
        record_count += 1;

        let code = parts[1].trim();
        if !stations.iter().any(|s| s == code) {
            continue;
        }

        let value = parts[parts.len() - 2].trim();
        values.insert(code.to_string(), value.to_string());
    }

    debug!(
        "Parsed {} records, {} matched requested stations",
        record_count,
        values.len()
    );
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations() -> Vec<String> {
        vec!["140".to_string(), "886".to_string()]
    }

    #[test]
    fn test_parse_realistic_body() {
        let body = "\
#START7777
# YYMMDDHHMI,STN,SD_TOT,=
202401010700,   90,   0.0,=
202401010700,  140,   3.2,=
202401010700,  886,   1.0,=
#7777END
";
        let values = parse_station_values(body, &stations());
        assert_eq!(values.len(), 2);
        assert_eq!(values["140"], "3.2");
        assert_eq!(values["886"], "1.0");
    }

    #[test]
    fn test_comment_lines_ignored_regardless_of_field_count() {
        let body = "#x,140,9,9,9\n140,140,5,3\n";
        let values = parse_station_values(body, &stations());
        assert_eq!(values["140"], "5");
    }

    #[test]
    fn test_lines_with_two_or_fewer_fields_ignored() {
        let body = "140,140\n140\n,140\n";
        let values = parse_station_values(body, &stations());
        assert!(values.is_empty());
    }

    #[test]
    fn test_three_field_record_takes_second_to_last_field() {
        let body = "x,886,2.5\n";
        let values = parse_station_values(body, &stations());
        assert_eq!(values["886"], "886");
    }

    #[test]
    fn test_last_matching_line_wins() {
        let body = "t,140,1.0,=\nt,140,2.0,=\nt,886,0.5,=\n";
        let values = parse_station_values(body, &stations());
        assert_eq!(values["140"], "2.0");
        assert_eq!(values["886"], "0.5");
    }

    #[test]
    fn test_unrequested_stations_dropped() {
        let body = "t,90,7.0,=\nt,140,1.0,=\n";
        let values = parse_station_values(body, &["140".to_string()]);
        assert_eq!(values.len(), 1);
        assert!(!values.contains_key("90"));
    }

    #[test]
    fn test_blank_value_still_overwrites_previous() {
        let body = "t,140,1.0,=\nt,140,,=\n";
        let values = parse_station_values(body, &stations());
        assert_eq!(values["140"], "");
    }

    #[test]
    fn test_crlf_line_endings() {
        let body = "#head\r\nt,140,4.0,=\r\n";
        let values = parse_station_values(body, &stations());
        assert_eq!(values["140"], "4.0");
    }

    #[test]
    fn test_empty_body() {
        assert!(parse_station_values("", &stations()).is_empty());
    }
}
