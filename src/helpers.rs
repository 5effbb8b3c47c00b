//! Built-in template helpers
//!
//! The helper table is fixed: templates cannot register their own. Every helper
//! is a pure function of its resolved arguments.
//!
//! | Helper | Form | Result |
//! |---|---|---|
//! | `ifEquals a b` | block | renders the body when `a` equals `b` |
//! | `parseBankAccounts json` | inline / sub-expression | list of bank records |
//! | `getIconClass icon label` | inline | presentation icon class string |

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::models::BankAccount;
use crate::scope::stringify;

/// Fallback icon class when nothing more specific is known.
pub const DEFAULT_ICON_CLASS: &str = "fas fa-link";

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// A helper argument problem. Never fatal: the call resolves to an empty value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HelperError {
    #[error("{helper} expects {expected} argument(s), got {got}")]
    Arity { helper: &'static str, expected: &'static str, got: usize },
    #[error("{helper}: argument {index} must be {expected}")]
    ArgumentType { helper: &'static str, index: usize, expected: &'static str },
}

/// The registered helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Helper {
    IfEquals,
    ParseBankAccounts,
    GetIconClass,
}

impl Helper {
    pub const ALL: [Helper; 3] =
        [Helper::IfEquals, Helper::ParseBankAccounts, Helper::GetIconClass];

    /// Look a helper up by its template name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Helper::IfEquals => "ifEquals",
            Helper::ParseBankAccounts => "parseBankAccounts",
            Helper::GetIconClass => "getIconClass",
        }
    }

    /// All helper names, for suggestions.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|h| h.name()).collect()
    }

    /// Whether the helper may open a `{{#name ...}}` block.
    pub fn supports_block(self) -> bool {
        matches!(self, Helper::IfEquals)
    }

    fn arity(self) -> (usize, usize) {
        match self {
            Helper::IfEquals => (2, 2),
            Helper::ParseBankAccounts => (1, 1),
            Helper::GetIconClass => (1, 2),
        }
    }

    /// Invoke the helper on resolved arguments (`None` = undefined).
    pub fn call(self, args: &[Option<&Value>]) -> Result<Value, HelperError> {
        let (min, max) = self.arity();
        if args.len() < min || args.len() > max {
            let expected = match (min, max) {
                (2, 2) => "2",
                (1, 1) => "1",
                _ => "1 or 2",
            };
            return Err(HelperError::Arity { helper: self.name(), expected, got: args.len() });
        }

        match self {
            Helper::IfEquals => Ok(Value::Bool(if_equals(args[0], args[1]))),
            Helper::ParseBankAccounts => {
                if let Some(value) = args[0] {
                    if !matches!(value, Value::Null | Value::String(_) | Value::Array(_)) {
                        return Err(HelperError::ArgumentType {
                            helper: self.name(),
                            index: 1,
                            expected: "a JSON string or a list",
                        });
                    }
                }
                let accounts = bank_accounts_from_value(args[0]);
                Ok(serde_json::to_value(accounts).unwrap_or(Value::Array(Vec::new())))
            }
            Helper::GetIconClass => {
                let raw = match args[0] {
                    None | Some(Value::Null) => "",
                    Some(Value::String(s)) => s.as_str(),
                    Some(_) => {
                        return Err(HelperError::ArgumentType {
                            helper: self.name(),
                            index: 1,
                            expected: "a string",
                        })
                    }
                };
                let label = args.get(1).copied().flatten().map(stringify);
                Ok(Value::String(get_icon_class(raw, label.as_deref().unwrap_or(""))))
            }
        }
    }
}

/// Loose equality used by `ifEquals`.
///
/// Numbers compare numerically, a number equals a string with the same
/// printed form, and undefined equals `null`.
pub fn if_equals(a: Option<&Value>, b: Option<&Value>) -> bool {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Number(_), Value::String(s)) | (Value::String(s), Value::Number(_)) => {
            let number = if a.is_number() { a } else { b };
            stringify(number) == s.as_str()
        }
        _ => a == b,
    }
}

/// Parse the embedded bank-accounts JSON of an entity.
///
/// Never fails: empty input and malformed JSON give an empty list.
///
/// ```
/// use cardsrc::helpers::parse_bank_accounts;
///
/// assert!(parse_bank_accounts("").is_empty());
/// assert!(parse_bank_accounts("{not json").is_empty());
/// let json = r#"[{"bank_name":"Ziraat","accounts":[{"iban":"TR1","currency":"TRY"}]}]"#;
/// let banks = parse_bank_accounts(json);
/// assert_eq!(banks[0].accounts[0].iban, "TR1");
/// ```
pub fn parse_bank_accounts(json: &str) -> Vec<BankAccount> {
    let json = json.trim();
    if json.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(json) {
        Ok(value) => bank_accounts_from_value(Some(&value)),
        Err(_) => Vec::new(),
    }
}

/// Bank records from either an embedded JSON string or an already-decoded list.
///
/// Elements that are not bank records are skipped.
pub fn bank_accounts_from_value(value: Option<&Value>) -> Vec<BankAccount> {
    match value {
        Some(Value::String(s)) => parse_bank_accounts(s),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        Some(Value::Object(_)) => value
            .and_then(|v| serde_json::from_value::<BankAccount>(v.clone()).ok())
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

/// Map an icon to its presentation class.
///
/// `raw_icon` may already be a full class list (`"fab fa-instagram"`), a bare
/// Font Awesome name (`"fa-phone"`), or a semantic key (`"telefon"`). When it
/// is empty or unknown, the label is tried as a semantic key.
///
/// ```
/// use cardsrc::helpers::get_icon_class;
///
/// assert_eq!(get_icon_class("fab fa-instagram", ""), "fab fa-instagram");
/// assert_eq!(get_icon_class("fa-phone", ""), "fas fa-phone");
/// assert_eq!(get_icon_class("telefon", "Phone"), "fas fa-phone");
/// assert_eq!(get_icon_class("", "E-Posta"), "fas fa-envelope");
/// ```
pub fn get_icon_class(raw_icon: &str, label: &str) -> String {
    let raw = raw_icon.trim();

    if raw.split_whitespace().nth(1).is_some() {
        return raw.to_string();
    }
    if raw.starts_with("fa-") {
        return format!("fas {}", raw);
    }

    icon_for_key(&slug(raw))
        .or_else(|| icon_for_key(&slug(label)))
        .unwrap_or(DEFAULT_ICON_CLASS)
        .to_string()
}

/// Lowercase ASCII key with Turkish letters folded and punctuation removed.
fn slug(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| match c {
            'ı' | 'İ' => 'i',
            'ş' | 'Ş' => 's',
            'ğ' | 'Ğ' => 'g',
            'ü' | 'Ü' => 'u',
            'ö' | 'Ö' => 'o',
            'ç' | 'Ç' => 'c',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();
    NON_SLUG_CHARS.replace_all(&folded, "").into_owned()
}

fn icon_for_key(key: &str) -> Option<&'static str> {
    let class = match key {
        "" => return None,
        "telefon" | "phone" | "tel" | "gsm" | "cep" => "fas fa-phone",
        "eposta" | "email" | "mail" => "fas fa-envelope",
        "fax" | "faks" => "fas fa-fax",
        "website" | "web" | "websitesi" | "site" => "fas fa-globe",
        "konum" | "location" | "adres" | "address" | "harita" => "fas fa-location-dot",
        "whatsapp" => "fab fa-whatsapp",
        "telegram" => "fab fa-telegram",
        "instagram" => "fab fa-instagram",
        "facebook" => "fab fa-facebook",
        "linkedin" => "fab fa-linkedin",
        "x" | "twitter" => "fab fa-x-twitter",
        "youtube" => "fab fa-youtube",
        "tiktok" => "fab fa-tiktok",
        "pinterest" => "fab fa-pinterest",
        "qr" | "qrkod" | "qrcode" => "fas fa-qrcode",
        "paylas" | "share" => "fas fa-share-nodes",
        "katalog" | "catalog" => "fas fa-book-open",
        "banka" | "bank" | "bankahesaplari" | "bankaccounts" => "fas fa-building-columns",
        "vergi" | "tax" | "vergibilgileri" | "taxinfo" => "fas fa-file-invoice",
        "hakkimizda" | "about" | "aboutus" => "fas fa-circle-info",
        _ => return None,
    };
    Some(class)
}
