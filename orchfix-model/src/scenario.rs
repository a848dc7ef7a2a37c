/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Scenario name codec.
//!
//! Derived scenario names encode the key-field values that distinguish the
//! scenario: one `<FieldName>-<CodeNameOrNone>` part per key field, joined
//! with `_`. Parsing is the exact inverse of generation, so a document
//! written by one run classifies identically on the next.

use orchfix_core::field::BASE_SCENARIO;

/// Joins the parts of a derived scenario name.
pub const FIELD_SEPARATOR: char = '_';

/// Separates the field name from the code name within one part.
pub const VALUE_SEPARATOR: char = '-';

/// Placeholder for a key field absent from the message instance.
pub const ABSENT: &str = "None";

/// Generates a scenario name from key-field names and the observed code
/// names, in key order.
///
/// # Arguments
/// * `parts` - (field name, observed code name or absent) per key field
#[must_use]
pub fn generate_name(parts: &[(String, Option<String>)]) -> String {
    let mut name = String::new();
    for (i, (field, code)) in parts.iter().enumerate() {
        if i > 0 {
            name.push(FIELD_SEPARATOR);
        }
        name.push_str(field);
        name.push(VALUE_SEPARATOR);
        name.push_str(code.as_deref().unwrap_or(ABSENT));
    }
    name
}

/// Derives the key-value vector a scenario name encodes.
///
/// Returns one entry per key field, in key order: the code name the
/// scenario pins that field to, or the absent sentinel. The base scenario
/// (and any name that encodes nothing for a field) derives absent entries.
///
/// # Arguments
/// * `scenario` - The scenario name
/// * `field_names` - The key fields' names, in key order
#[must_use]
pub fn parse_name(scenario: &str, field_names: &[String]) -> Vec<Option<String>> {
    if scenario == BASE_SCENARIO {
        return vec![None; field_names.len()];
    }

    let parts: Vec<&str> = scenario.split(FIELD_SEPARATOR).collect();
    field_names
        .iter()
        .map(|field| {
            parts.iter().find_map(|part| {
                let rest = part.strip_prefix(field.as_str())?;
                let code = rest.strip_prefix(VALUE_SEPARATOR)?;
                if code == ABSENT {
                    Some(None)
                } else {
                    Some(Some(code.to_string()))
                }
            })?
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_generate_single_key() {
        let name = generate_name(&[("ExecType".to_string(), Some("Trade".to_string()))]);
        assert_eq!(name, "ExecType-Trade");
    }

    #[test]
    fn test_generate_multi_key_with_absent() {
        let name = generate_name(&[
            ("ExecType".to_string(), Some("Trade".to_string())),
            ("OrdStatus".to_string(), None),
        ]);
        assert_eq!(name, "ExecType-Trade_OrdStatus-None");
    }

    #[test]
    fn test_parse_is_inverse_of_generate() {
        let fields = names(&["ExecType", "OrdStatus"]);
        let values = vec![Some("Trade".to_string()), None];
        let parts: Vec<(String, Option<String>)> = fields
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect();

        let name = generate_name(&parts);
        assert_eq!(parse_name(&name, &fields), values);
    }

    #[test]
    fn test_parse_base_is_all_absent() {
        let fields = names(&["ExecType", "OrdStatus"]);
        assert_eq!(parse_name(BASE_SCENARIO, &fields), vec![None, None]);
    }

    #[test]
    fn test_parse_unencoded_field_is_absent() {
        let fields = names(&["ExecType", "OrdStatus"]);
        assert_eq!(
            parse_name("ExecType-Trade", &fields),
            vec![Some("Trade".to_string()), None]
        );
    }

    #[test]
    fn test_parse_foreign_name_is_all_absent() {
        let fields = names(&["ExecType"]);
        assert_eq!(parse_name("HighTouch", &fields), vec![None]);
    }
}
