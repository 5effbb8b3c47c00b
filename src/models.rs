//! Data models for card entities (contact channels, social accounts, bank accounts, etc.)
//!
//! The renderer works on raw `serde_json::Value` trees so templates can reach any
//! field. The typed views here are what the icon resolver and the helpers consume.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A communication channel of the entity (phone, e-mail, WhatsApp, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Communication {
    /// Channel type, matched against communication icon slot ids.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub value: String,
    /// Optional display label overriding the slot label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A social media account of the entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SocialMedia {
    /// Platform id, matched against social icon slot ids.
    pub platform: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Tax office information block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TaxInfo {
    #[serde(default)]
    pub tax_office: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub tax_number: String,
}

impl TaxInfo {
    /// A tax block is present when any of its fields carries text.
    pub fn is_present(&self) -> bool {
        !self.tax_office.trim().is_empty() || !self.tax_number.trim().is_empty()
    }
}

/// One IBAN held at a bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BankSubAccount {
    #[serde(default)]
    pub iban: String,
    #[serde(default)]
    pub currency: String,
}

/// A bank with one or more accounts, as stored in the entity's embedded JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BankAccount {
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub bank_label: String,
    #[serde(default)]
    pub bank_logo: String,
    #[serde(default)]
    pub account_holder: String,
    #[serde(default)]
    pub accounts: Vec<BankSubAccount>,
}

impl BankAccount {
    /// A bank record counts only if it holds at least one account with an IBAN.
    pub fn is_valid(&self) -> bool {
        self.accounts.iter().any(|a| !a.iban.trim().is_empty())
    }
}

/// A warning produced while reading entity data or rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    pub message: String,
    /// Byte offset of the template tag that caused the warning, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), offset: None }
    }

    pub fn at(message: impl Into<String>, offset: usize) -> Self {
        Self { message: message.into(), offset: Some(offset) }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "offset {}: {}", offset, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Typed view of the parts of an entity record the icon resolver cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityData {
    pub communication: Vec<Communication>,
    pub social_media: Vec<SocialMedia>,
    /// URL of the uploaded catalog file.
    pub catalog: Option<String>,
    pub bank_accounts: Vec<BankAccount>,
    pub about_us: Option<String>,
    pub tax_info: Option<TaxInfo>,
}

impl EntityData {
    /// Build the typed view from a raw entity record.
    ///
    /// Never fails: records that do not match the expected shape are skipped
    /// and reported as warnings.
    pub fn from_value(value: &Value) -> (Self, Vec<Warning>) {
        let mut warnings = Vec::new();

        let data = Self {
            communication: records(value, "communication", &mut warnings),
            social_media: records(value, "social_media", &mut warnings),
            catalog: non_empty_str(value.get("catalog")),
            bank_accounts: crate::helpers::bank_accounts_from_value(value.get("bank_accounts")),
            about_us: non_empty_str(value.get("about_us")),
            tax_info: value
                .get("tax_info")
                .filter(|v| !v.is_null())
                .and_then(|v| match serde_json::from_value::<TaxInfo>(v.clone()) {
                    Ok(info) => Some(info),
                    Err(e) => {
                        warnings.push(Warning::new(format!("tax_info ignored: {}", e)));
                        None
                    }
                }),
        };

        (data, warnings)
    }

    /// True when at least one bank record holds a usable account.
    pub fn has_bank_accounts(&self) -> bool {
        self.bank_accounts.iter().any(BankAccount::is_valid)
    }

    pub fn has_tax_info(&self) -> bool {
        self.tax_info.as_ref().is_some_and(TaxInfo::is_present)
    }
}

/// Deserialize each element of the array at `key`, skipping malformed ones.
fn records<T: DeserializeOwned>(value: &Value, key: &str, warnings: &mut Vec<Warning>) -> Vec<T> {
    match value.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value(item.clone()) {
                Ok(record) => Some(record),
                Err(e) => {
                    warnings.push(Warning::new(format!("{}[{}] ignored: {}", key, i, e)));
                    None
                }
            })
            .collect(),
        Some(_) => {
            warnings.push(Warning::new(format!("'{}' is not a list", key)));
            Vec::new()
        }
    }
}

/// Accept a string, number or boolean as text; `null` is empty.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => {
            Err(de::Error::custom("expected a string, number or boolean"))
        }
        scalar => Ok(crate::scope::stringify(&scalar).into_owned()),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize legacy field names in an incoming entity record.
///
/// Older records name the communication type `tip`; the engine only knows
/// `type`. When both are present, `type` wins.
pub fn normalize_entity(mut value: Value) -> Value {
    if let Some(Value::Array(items)) = value.get_mut("communication") {
        for item in items.iter_mut() {
            if let Value::Object(record) = item {
                if let Some(tip) = record.remove("tip") {
                    record.entry("type").or_insert(tip);
                }
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full_record() {
        let value = json!({
            "company_name": "Acme",
            "communication": [
                {"type": "telefon", "value": "555 123"},
                {"type": "eposta", "value": "info@acme.test", "label": "Sales"}
            ],
            "social_media": [{"platform": "instagram", "url": "https://instagram.com/acme"}],
            "catalog": "/files/catalog.pdf",
            "bank_accounts":
                r#"[{"bank_name":"Ziraat","accounts":[{"iban":"TR00","currency":"TRY"}]}]"#,
            "about_us": "We make things.",
            "tax_info": {"tax_office": "Kadikoy", "tax_number": "123"}
        });

        let (data, warnings) = EntityData::from_value(&value);
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
        assert_eq!(data.communication.len(), 2);
        assert_eq!(data.communication[1].label.as_deref(), Some("Sales"));
        assert_eq!(data.social_media[0].platform, "instagram");
        assert_eq!(data.catalog.as_deref(), Some("/files/catalog.pdf"));
        assert!(data.has_bank_accounts());
        assert!(data.has_tax_info());
        assert_eq!(data.about_us.as_deref(), Some("We make things."));
    }

    #[test]
    fn test_from_value_skips_malformed_records() {
        let value = json!({
            "communication": [{"value": "no type"}, {"type": "telefon", "value": "1"}],
            "social_media": "not a list"
        });

        let (data, warnings) = EntityData::from_value(&value);
        assert_eq!(data.communication.len(), 1);
        assert!(data.social_media.is_empty());
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.contains("communication[0]"));
    }

    #[test]
    fn test_numeric_values_are_text() {
        let value = json!({
            "communication": [
                {"type": "telefon", "value": 5551234},
                {"type": "fax", "value": null},
                {"type": "eposta", "value": ["a@b.test"]}
            ],
            "tax_info": {"tax_office": "Konak", "tax_number": 1234567890}
        });

        let (data, warnings) = EntityData::from_value(&value);
        assert_eq!(data.communication.len(), 2);
        assert_eq!(data.communication[0].value, "5551234");
        assert_eq!(data.communication[1].value, "");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("communication[2]"));
        assert_eq!(data.tax_info.unwrap().tax_number, "1234567890");
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let value = json!({"catalog": "   ", "about_us": "", "tax_info": {"tax_office": " "}});
        let (data, _) = EntityData::from_value(&value);
        assert_eq!(data.catalog, None);
        assert_eq!(data.about_us, None);
        assert!(!data.has_tax_info());
    }

    #[test]
    fn test_bank_account_validity() {
        let empty = BankAccount { bank_name: "A".to_string(), ..Default::default() };
        assert!(!empty.is_valid());

        let blank_iban = BankAccount {
            accounts: vec![BankSubAccount { iban: String::new(), currency: "TRY".to_string() }],
            ..Default::default()
        };
        assert!(!blank_iban.is_valid());

        let ok = BankAccount {
            accounts: vec![BankSubAccount {
                iban: "TR12".to_string(),
                currency: "TRY".to_string(),
            }],
            ..Default::default()
        };
        assert!(ok.is_valid());
    }

    #[test]
    fn test_normalize_entity_renames_tip() {
        let value = json!({"communication": [
            {"tip": "telefon", "value": "1"},
            {"tip": "legacy", "type": "eposta", "value": "a@b"}
        ]});
        let normalized = normalize_entity(value);
        let items = normalized["communication"].as_array().unwrap();
        assert_eq!(items[0]["type"], "telefon");
        assert!(items[0].get("tip").is_none());
        assert_eq!(items[1]["type"], "eposta");
    }

    #[test]
    fn test_warning_display() {
        assert_eq!(Warning::at("bad", 7).to_string(), "offset 7: bad");
        assert_eq!(Warning::new("bad").to_string(), "bad");
    }
}
