/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 4/8/26
******************************************************************************/

//! Key-field configuration.
//!
//! Scenario classification compares the values of a few key fields per
//! msgType. The caller may supply a JSON document of the shape
//! `{"keys": [{"msgType": "8", "fieldIds": ["150", "39"]}, ...]}`; absent
//! configuration falls back to a built-in table covering the common
//! message types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Error type for key-field configuration parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON of the expected shape.
    #[error("invalid key configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A field id entry is not a positive integer.
    #[error("invalid field id '{value}' for msgType '{msg_type}'")]
    InvalidFieldId {
        /// The msgType the entry belongs to.
        msg_type: String,
        /// The offending field id text.
        value: String,
    },
}

/// Built-in key-field table applied when no configuration is supplied.
const DEFAULT_KEYS: &[(&str, &[u32])] = &[
    ("6", &[28]),        // IOI: IOITransType
    ("7", &[4]),         // Advertisement: AdvSide
    ("8", &[150, 39]),   // ExecutionReport: ExecType, OrdStatus
    ("9", &[434]),       // OrderCancelReject: CxlRejResponseTo
    ("D", &[40, 54]),    // NewOrderSingle: OrdType, Side
    ("E", &[394]),       // NewOrderList: BidType
    ("F", &[54]),        // OrderCancelRequest: Side
    ("G", &[40, 54]),    // OrderCancelReplaceRequest: OrdType, Side
    ("J", &[71]),        // AllocationInstruction: AllocTransType
    ("P", &[87]),        // AllocationInstructionAck: AllocStatus
    ("Q", &[127]),       // DontKnowTrade: DKReason
    ("R", &[303]),       // QuoteRequest: QuoteRequestType
    ("S", &[537]),       // Quote: QuoteType
    ("V", &[263]),       // MarketDataRequest: SubscriptionRequestType
    ("W", &[269]),       // MarketDataSnapshot: MDEntryType
    ("X", &[279]),       // MarketDataIncremental: MDUpdateAction
    ("Y", &[281]),       // MarketDataRequestReject: MDReqRejReason
    ("Z", &[298]),       // QuoteCancel: QuoteCancelType
    ("j", &[380]),       // BusinessMessageReject: BusinessRejectReason
    ("AE", &[856]),      // TradeCaptureReport: TradeReportType
    ("AR", &[939]),      // TradeCaptureReportAck: TrdRptStatus
];

/// JSON shape of the configuration document.
#[derive(Debug, Deserialize, Serialize)]
struct KeyDocument {
    keys: Vec<KeyEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
struct KeyEntry {
    #[serde(rename = "msgType")]
    msg_type: String,
    #[serde(rename = "fieldIds")]
    field_ids: Vec<String>,
}

/// Per-msgType ordered key-field ids.
#[derive(Debug, Clone)]
pub struct KeyFieldConfig {
    keys: HashMap<String, Vec<u32>>,
}

impl KeyFieldConfig {
    /// Creates a configuration with no keys: every message resolves to its
    /// base scenario.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Creates the built-in default table.
    #[must_use]
    pub fn default_table() -> Self {
        let keys = DEFAULT_KEYS
            .iter()
            .map(|(msg_type, ids)| ((*msg_type).to_string(), ids.to_vec()))
            .collect();
        Self { keys }
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the document is not valid JSON or a
    /// field id is not numeric.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let document: KeyDocument = serde_json::from_str(text)?;
        let mut keys = HashMap::new();
        for entry in document.keys {
            let mut ids = Vec::with_capacity(entry.field_ids.len());
            for value in &entry.field_ids {
                let id = value.parse().map_err(|_| ConfigError::InvalidFieldId {
                    msg_type: entry.msg_type.clone(),
                    value: value.clone(),
                })?;
                ids.push(id);
            }
            keys.insert(entry.msg_type, ids);
        }
        Ok(Self { keys })
    }

    /// Adds or replaces the key fields for a msgType.
    pub fn insert(&mut self, msg_type: impl Into<String>, field_ids: Vec<u32>) {
        self.keys.insert(msg_type.into(), field_ids);
    }

    /// Returns the ordered key-field ids for a msgType.
    #[must_use]
    pub fn get(&self, msg_type: &str) -> Option<&[u32]> {
        self.keys.get(msg_type).map(Vec::as_slice)
    }

    /// Returns the number of configured msgTypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no msgType is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for KeyFieldConfig {
    fn default() -> Self {
        Self::default_table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_execution_report() {
        let config = KeyFieldConfig::default_table();
        assert_eq!(config.get("8"), Some(&[150, 39][..]));
        assert!(config.len() >= 20);
        assert_eq!(config.get("0"), None);
    }

    #[test]
    fn test_from_json() {
        let config = KeyFieldConfig::from_json(
            r#"{"keys": [{"msgType": "8", "fieldIds": ["150", "39"]},
                         {"msgType": "D", "fieldIds": ["54"]}]}"#,
        )
        .unwrap();

        assert_eq!(config.get("8"), Some(&[150, 39][..]));
        assert_eq!(config.get("D"), Some(&[54][..]));
        assert_eq!(config.get("V"), None);
    }

    #[test]
    fn test_from_json_bad_field_id() {
        let result = KeyFieldConfig::from_json(
            r#"{"keys": [{"msgType": "8", "fieldIds": ["abc"]}]}"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidFieldId { msg_type, .. }) if msg_type == "8"
        ));
    }

    #[test]
    fn test_from_json_not_json() {
        assert!(matches!(
            KeyFieldConfig::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
