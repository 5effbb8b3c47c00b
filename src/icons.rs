//! Icon catalog and order resolution
//!
//! The admin-configured [`IconCatalog`] is the single ordering authority. For a
//! given entity, [`resolve_icons`] walks the catalog in order and keeps the
//! slots whose data is present. It is a stable filter: survivors keep their
//! configured positions. A slot matching several records (two phone numbers)
//! expands in place, one entry per record, in record order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::helpers::get_icon_class;
use crate::models::EntityData;

/// Grouping that decides which presence rule applies to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IconCategory {
    /// Matched against `social_media[].platform`.
    Social,
    /// Matched against `communication[].type`.
    Communication,
    /// Always shown (QR code, share).
    System,
    /// Derived from a single entity field (catalog, bank accounts, tax info, about us).
    #[default]
    Other,
}

impl IconCategory {
    /// Category implied by a slot id: known communication channels, social
    /// platforms and system actions. Everything else is `Other`.
    pub fn for_id(id: &str) -> Self {
        match id {
            "qr" | "qrkod" | "paylas" | "share" => IconCategory::System,
            "telefon" | "phone" | "gsm" | "fax" | "eposta" | "email" | "whatsapp" | "telegram"
            | "website" | "web" | "konum" | "location" | "adres" => IconCategory::Communication,
            "instagram" | "facebook" | "linkedin" | "x" | "twitter" | "youtube" | "tiktok"
            | "pinterest" => IconCategory::Social,
            _ => IconCategory::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IconCategory::Social => "social",
            IconCategory::Communication => "communication",
            IconCategory::System => "system",
            IconCategory::Other => "other",
        }
    }
}

/// One entry of the icon catalog.
///
/// Only `id` is required when deserializing. A missing `label` or `category`
/// is taken from the built-in slot with the same id; see [`IconSlot::for_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IconSlotEntry")]
pub struct IconSlot {
    pub id: String,
    pub label: String,
    /// Presentation icon class; derived from `id`/`label` when empty.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon: String,
    pub category: IconCategory,
    /// Admin switch in the catalog; after [`evaluate_slots`] it also reflects data presence.
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Catalog entry as written in JSON or `card.toml`.
#[derive(Deserialize)]
struct IconSlotEntry {
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    category: Option<IconCategory>,
    #[serde(default = "default_true")]
    enabled: bool,
}

impl From<IconSlotEntry> for IconSlot {
    fn from(entry: IconSlotEntry) -> Self {
        let mut slot = IconSlot::for_id(&entry.id);
        if let Some(label) = entry.label.filter(|l| !l.trim().is_empty()) {
            slot.label = label;
        }
        if let Some(category) = entry.category {
            slot.category = category;
        }
        slot.icon = entry.icon;
        slot.enabled = entry.enabled;
        slot
    }
}

impl IconSlot {
    pub fn new(id: &str, label: &str, category: IconCategory) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            icon: String::new(),
            category,
            enabled: true,
        }
    }

    /// A slot with the built-in label and category for `id`.
    ///
    /// Ids outside the default catalog are labelled with the id itself and
    /// categorized by the channel, platform or derived field they name.
    pub fn for_id(id: &str) -> Self {
        match DEFAULT_SLOTS.iter().find(|(default_id, _, _)| *default_id == id) {
            Some((_, label, category)) => IconSlot::new(id, label, *category),
            None => IconSlot::new(id, id, IconCategory::for_id(id)),
        }
    }

    /// The icon class to display for this slot.
    pub fn presentation_icon(&self) -> String {
        get_icon_class(&self.icon, &self.label)
    }
}

/// Entity fields an `Other` slot can be derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedField {
    Catalog,
    BankAccounts,
    TaxInfo,
    AboutUs,
}

impl DerivedField {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "katalog" | "catalog" => Some(DerivedField::Catalog),
            "banka" | "bank" | "bank_accounts" => Some(DerivedField::BankAccounts),
            "vergi" | "tax" | "tax_info" => Some(DerivedField::TaxInfo),
            "hakkimizda" | "about" | "about_us" => Some(DerivedField::AboutUs),
            _ => None,
        }
    }

    fn is_present(self, entity: &EntityData) -> bool {
        match self {
            DerivedField::Catalog => entity.catalog.is_some(),
            DerivedField::BankAccounts => entity.has_bank_accounts(),
            DerivedField::TaxInfo => entity.has_tax_info(),
            DerivedField::AboutUs => entity.about_us.is_some(),
        }
    }

    fn anchor(self) -> &'static str {
        match self {
            DerivedField::Catalog => "#catalog",
            DerivedField::BankAccounts => "#bank-accounts",
            DerivedField::TaxInfo => "#tax-info",
            DerivedField::AboutUs => "#about",
        }
    }
}

/// Slots of [`IconCatalog::default_catalog`], in order.
const DEFAULT_SLOTS: [(&str, &str, IconCategory); 17] = [
    ("qr", "QR Kod", IconCategory::System),
    ("paylas", "Paylaş", IconCategory::System),
    ("telefon", "Telefon", IconCategory::Communication),
    ("whatsapp", "WhatsApp", IconCategory::Communication),
    ("eposta", "E-Posta", IconCategory::Communication),
    ("website", "Web Sitesi", IconCategory::Communication),
    ("konum", "Konum", IconCategory::Communication),
    ("instagram", "Instagram", IconCategory::Social),
    ("facebook", "Facebook", IconCategory::Social),
    ("linkedin", "LinkedIn", IconCategory::Social),
    ("x", "X", IconCategory::Social),
    ("youtube", "YouTube", IconCategory::Social),
    ("tiktok", "TikTok", IconCategory::Social),
    ("katalog", "Katalog", IconCategory::Other),
    ("banka", "Banka Hesapları", IconCategory::Other),
    ("vergi", "Vergi Bilgileri", IconCategory::Other),
    ("hakkimizda", "Hakkımızda", IconCategory::Other),
];

/// The ordered, admin-editable list of icon slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct IconCatalog {
    slots: Vec<IconSlot>,
}

impl IconCatalog {
    pub fn new(slots: Vec<IconSlot>) -> Self {
        Self { slots }
    }

    /// Parse a catalog from a JSON array of slots.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The built-in catalog used when no configuration supplies one.
    pub fn default_catalog() -> Self {
        Self::new(
            DEFAULT_SLOTS
                .iter()
                .map(|(id, label, category)| IconSlot::new(id, label, *category))
                .collect(),
        )
    }

    pub fn slots(&self) -> &[IconSlot] {
        &self.slots
    }

    pub fn get(&self, id: &str) -> Option<&IconSlot> {
        self.slots.iter().find(|slot| slot.id == id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Structural problems: empty or duplicate ids, unknown derived slots.
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for (index, slot) in self.slots.iter().enumerate() {
            let mut issue = |message: String| issues.push(CatalogIssue { index, message });

            if slot.id.trim().is_empty() {
                issue("id must be a non-empty string".to_string());
                continue;
            }
            if !seen.insert(slot.id.as_str()) {
                issue(format!("duplicate id '{}'", slot.id));
            }
            if slot.category == IconCategory::Other && DerivedField::from_id(&slot.id).is_none() {
                issue(format!(
                    "'{}' is not a known derived slot (catalog, bank, tax, about)",
                    slot.id
                ));
            }
        }

        issues
    }
}

/// A structural problem with one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub index: usize,
    pub message: String,
}

impl std::fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "icons[{}]: {}", self.index, self.message)
    }
}

/// A slot ready to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIcon {
    pub slot: IconSlot,
    pub href: String,
    pub label: String,
    /// Presentation-layer action hook (`data-action`), for system slots.
    pub action: Option<String>,
}

impl ResolvedIcon {
    fn new(slot: &IconSlot, href: String, label: Option<&str>) -> Self {
        let label = label.map(str::trim).filter(|l| !l.is_empty()).unwrap_or(&slot.label);
        Self { slot: slot.clone(), href, label: label.to_string(), action: None }
    }

    /// Template-facing form exposed under the root `icons` key.
    pub fn to_value(&self) -> Value {
        json!({
            "id": self.slot.id,
            "label": self.label,
            "href": self.href,
            "icon": self.slot.presentation_icon(),
            "category": self.slot.category.as_str(),
            "action": self.action,
        })
    }
}

/// Evaluate every catalog slot against the entity, keeping catalog order.
///
/// `enabled` is true only when the admin left the slot on and the entity has
/// the data it needs.
pub fn evaluate_slots(catalog: &IconCatalog, entity: &EntityData) -> Vec<IconSlot> {
    catalog
        .slots()
        .iter()
        .map(|slot| IconSlot { enabled: slot.enabled && is_present(slot, entity), ..slot.clone() })
        .collect()
}

fn is_present(slot: &IconSlot, entity: &EntityData) -> bool {
    match slot.category {
        IconCategory::System => true,
        IconCategory::Social => entity
            .social_media
            .iter()
            .any(|s| s.platform == slot.id && !s.url.trim().is_empty()),
        IconCategory::Communication => entity
            .communication
            .iter()
            .any(|c| c.kind == slot.id && !c.value.trim().is_empty()),
        IconCategory::Other => {
            DerivedField::from_id(&slot.id).is_some_and(|field| field.is_present(entity))
        }
    }
}

/// Resolve the ordered list of icons to render for an entity.
///
/// # Example
///
/// ```
/// use cardsrc::icons::{resolve_icons, IconCatalog, IconCategory, IconSlot};
/// use cardsrc::models::{Communication, EntityData};
///
/// let catalog = IconCatalog::new(vec![
///     IconSlot::new("telefon", "Telefon", IconCategory::Communication),
///     IconSlot::new("eposta", "E-Posta", IconCategory::Communication),
/// ]);
/// let entity = EntityData {
///     communication: vec![Communication {
///         kind: "telefon".into(),
///         value: "555".into(),
///         label: None,
///     }],
///     ..Default::default()
/// };
///
/// let icons = resolve_icons(&catalog, &entity);
/// assert_eq!(icons.len(), 1);
/// assert_eq!(icons[0].slot.id, "telefon");
/// assert_eq!(icons[0].href, "tel:555");
/// ```
pub fn resolve_icons(catalog: &IconCatalog, entity: &EntityData) -> Vec<ResolvedIcon> {
    let mut icons = Vec::new();

    for slot in catalog.slots().iter().filter(|slot| slot.enabled) {
        match slot.category {
            IconCategory::System => {
                let action = system_action(&slot.id);
                let mut icon = ResolvedIcon::new(slot, format!("#{}", action), None);
                icon.action = Some(action.to_string());
                icons.push(icon);
            }
            IconCategory::Social => icons.extend(
                entity
                    .social_media
                    .iter()
                    .filter(|s| s.platform == slot.id && !s.url.trim().is_empty())
                    .map(|s| ResolvedIcon::new(slot, s.url.trim().to_string(), s.label.as_deref())),
            ),
            IconCategory::Communication => icons.extend(
                entity
                    .communication
                    .iter()
                    .filter(|c| c.kind == slot.id && !c.value.trim().is_empty())
                    .map(|c| {
                        let href = communication_href(&c.kind, &c.value);
                        ResolvedIcon::new(slot, href, c.label.as_deref())
                    }),
            ),
            IconCategory::Other => {
                let Some(field) = DerivedField::from_id(&slot.id) else {
                    continue;
                };
                if !field.is_present(entity) {
                    continue;
                }
                let href = match (field, &entity.catalog) {
                    (DerivedField::Catalog, Some(url)) => url.clone(),
                    _ => field.anchor().to_string(),
                };
                icons.push(ResolvedIcon::new(slot, href, None));
            }
        }
    }

    icons
}

fn system_action(id: &str) -> &str {
    match id {
        "paylas" | "share" => "share",
        "qr" | "qrkod" => "qr",
        other => other,
    }
}

/// Link target for a communication record.
pub fn communication_href(kind: &str, value: &str) -> String {
    let value = value.trim();
    match kind {
        "telefon" | "phone" | "gsm" | "fax" => {
            format!("tel:{}", value.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        }
        "eposta" | "email" => format!("mailto:{}", value),
        "whatsapp" => {
            let digits: String = value.chars().filter(char::is_ascii_digit).collect();
            format!("https://wa.me/{}", digits)
        }
        "telegram" => format!("https://t.me/{}", value.trim_start_matches('@')),
        "website" | "web" => {
            if value.contains("://") {
                value.to_string()
            } else {
                format!("https://{}", value)
            }
        }
        "konum" | "location" | "adres" => {
            if value.starts_with("http://") || value.starts_with("https://") {
                value.to_string()
            } else {
                let query: String =
                    url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
                format!("https://www.google.com/maps/search/?api=1&query={}", query)
            }
        }
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BankAccount, BankSubAccount, Communication, SocialMedia, TaxInfo};

    fn comm(kind: &str, value: &str) -> Communication {
        Communication { kind: kind.to_string(), value: value.to_string(), label: None }
    }

    fn social(platform: &str, url: &str) -> SocialMedia {
        SocialMedia { platform: platform.to_string(), url: url.to_string(), label: None }
    }

    fn bank(ibans: &[&str]) -> BankAccount {
        BankAccount {
            bank_name: "Ziraat".to_string(),
            accounts: ibans
                .iter()
                .map(|iban| BankSubAccount { iban: iban.to_string(), currency: "TRY".to_string() })
                .collect(),
            ..Default::default()
        }
    }

    fn ids(icons: &[ResolvedIcon]) -> Vec<&str> {
        icons.iter().map(|i| i.slot.id.as_str()).collect()
    }

    fn catalog(entries: &[(&str, IconCategory)]) -> IconCatalog {
        IconCatalog::new(entries.iter().map(|(id, cat)| IconSlot::new(id, id, *cat)).collect())
    }

    #[test]
    fn test_filter_preserves_configured_order() {
        let catalog = catalog(&[
            ("qr", IconCategory::System),
            ("instagram", IconCategory::Social),
            ("telefon", IconCategory::Communication),
            ("banka", IconCategory::Other),
        ]);
        let entity = EntityData {
            social_media: vec![social("instagram", "https://instagram.com/acme")],
            bank_accounts: vec![bank(&["TR11"])],
            ..Default::default()
        };

        assert_eq!(ids(&resolve_icons(&catalog, &entity)), vec!["qr", "instagram", "banka"]);
    }

    #[test]
    fn test_reordered_catalog_reorders_output() {
        let catalog = catalog(&[
            ("banka", IconCategory::Other),
            ("instagram", IconCategory::Social),
            ("qr", IconCategory::System),
        ]);
        let entity = EntityData {
            social_media: vec![social("instagram", "https://instagram.com/acme")],
            bank_accounts: vec![bank(&["TR11"])],
            ..Default::default()
        };

        assert_eq!(ids(&resolve_icons(&catalog, &entity)), vec!["banka", "instagram", "qr"]);
    }

    #[test]
    fn test_single_communication_match() {
        let catalog = catalog(&[
            ("telefon", IconCategory::Communication),
            ("eposta", IconCategory::Communication),
        ]);
        let entity =
            EntityData { communication: vec![comm("telefon", "555")], ..Default::default() };

        let icons = resolve_icons(&catalog, &entity);
        assert_eq!(ids(&icons), vec!["telefon"]);
    }

    #[test]
    fn test_multiple_records_expand_in_place() {
        let catalog = catalog(&[
            ("qr", IconCategory::System),
            ("telefon", IconCategory::Communication),
            ("eposta", IconCategory::Communication),
        ]);
        let entity = EntityData {
            communication: vec![
                comm("eposta", "a@acme.test"),
                comm("telefon", "111"),
                comm("telefon", "222"),
            ],
            ..Default::default()
        };

        let icons = resolve_icons(&catalog, &entity);
        assert_eq!(ids(&icons), vec!["qr", "telefon", "telefon", "eposta"]);
        assert_eq!(icons[1].href, "tel:111");
        assert_eq!(icons[2].href, "tel:222");
    }

    #[test]
    fn test_empty_values_are_absent() {
        let catalog = catalog(&[
            ("telefon", IconCategory::Communication),
            ("instagram", IconCategory::Social),
        ]);
        let entity = EntityData {
            communication: vec![comm("telefon", "  ")],
            social_media: vec![social("instagram", "")],
            ..Default::default()
        };

        assert!(resolve_icons(&catalog, &entity).is_empty());
    }

    #[test]
    fn test_bank_without_accounts_is_absent() {
        let catalog = catalog(&[("banka", IconCategory::Other)]);

        let no_accounts = EntityData { bank_accounts: vec![bank(&[])], ..Default::default() };
        assert!(resolve_icons(&catalog, &no_accounts).is_empty());

        let blank_iban = EntityData { bank_accounts: vec![bank(&[""])], ..Default::default() };
        assert!(resolve_icons(&catalog, &blank_iban).is_empty());

        let valid = EntityData { bank_accounts: vec![bank(&["", "TR22"])], ..Default::default() };
        let icons = resolve_icons(&catalog, &valid);
        assert_eq!(icons[0].href, "#bank-accounts");
    }

    #[test]
    fn test_derived_slots() {
        let catalog = catalog(&[
            ("katalog", IconCategory::Other),
            ("vergi", IconCategory::Other),
            ("hakkimizda", IconCategory::Other),
            ("unknown", IconCategory::Other),
        ]);
        let entity = EntityData {
            catalog: Some("/files/c.pdf".to_string()),
            tax_info: Some(TaxInfo { tax_office: "Konak".to_string(), tax_number: String::new() }),
            about_us: Some("Since 1990".to_string()),
            ..Default::default()
        };

        let icons = resolve_icons(&catalog, &entity);
        assert_eq!(ids(&icons), vec!["katalog", "vergi", "hakkimizda"]);
        assert_eq!(icons[0].href, "/files/c.pdf");
        assert_eq!(icons[1].href, "#tax-info");
        assert_eq!(icons[2].href, "#about");
    }

    #[test]
    fn test_system_slots_always_present() {
        let catalog = catalog(&[("qr", IconCategory::System), ("paylas", IconCategory::System)]);
        let icons = resolve_icons(&catalog, &EntityData::default());
        assert_eq!(icons[0].action.as_deref(), Some("qr"));
        assert_eq!(icons[0].href, "#qr");
        assert_eq!(icons[1].action.as_deref(), Some("share"));
    }

    #[test]
    fn test_admin_disabled_slot_is_skipped() {
        let mut catalog =
            catalog(&[("qr", IconCategory::System), ("paylas", IconCategory::System)]);
        catalog.slots[0].enabled = false;
        assert_eq!(ids(&resolve_icons(&catalog, &EntityData::default())), vec!["paylas"]);
    }

    #[test]
    fn test_record_label_overrides_slot_label() {
        let catalog = IconCatalog::new(vec![IconSlot::new(
            "telefon",
            "Telefon",
            IconCategory::Communication,
        )]);
        let entity = EntityData {
            communication: vec![
                Communication {
                    kind: "telefon".into(),
                    value: "1".into(),
                    label: Some("Office".into()),
                },
                comm("telefon", "2"),
            ],
            ..Default::default()
        };
        let icons = resolve_icons(&catalog, &entity);
        assert_eq!(icons[0].label, "Office");
        assert_eq!(icons[1].label, "Telefon");
    }

    #[test]
    fn test_evaluate_slots_keeps_every_slot() {
        let catalog = catalog(&[
            ("qr", IconCategory::System),
            ("telefon", IconCategory::Communication),
            ("instagram", IconCategory::Social),
        ]);
        let entity = EntityData { communication: vec![comm("telefon", "1")], ..Default::default() };

        let slots = evaluate_slots(&catalog, &entity);
        let states: Vec<(&str, bool)> = slots.iter().map(|s| (s.id.as_str(), s.enabled)).collect();
        assert_eq!(states, vec![("qr", true), ("telefon", true), ("instagram", false)]);
    }

    #[test]
    fn test_communication_hrefs() {
        assert_eq!(communication_href("telefon", "+90 555 111 22 33"), "tel:+905551112233");
        assert_eq!(communication_href("eposta", " info@acme.test "), "mailto:info@acme.test");
        assert_eq!(
            communication_href("whatsapp", "+90 (555) 111-22-33"),
            "https://wa.me/905551112233"
        );
        assert_eq!(communication_href("telegram", "@acme"), "https://t.me/acme");
        assert_eq!(communication_href("website", "acme.test"), "https://acme.test");
        assert_eq!(communication_href("website", "http://acme.test"), "http://acme.test");
        assert_eq!(
            communication_href("konum", "Alsancak, İzmir"),
            "https://www.google.com/maps/search/?api=1&query=Alsancak%2C+%C4%B0zmir"
        );
        assert_eq!(communication_href("custom", "x"), "x");
    }

    #[test]
    fn test_catalog_json_and_defaults() {
        let catalog = IconCatalog::from_json(
            r#"[{"id": "qr", "label": "QR", "category": "system"},
                {"id": "telefon", "label": "Telefon", "icon": "fa-mobile",
                 "category": "communication", "enabled": false}]"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.slots()[0].enabled);
        assert!(!catalog.slots()[1].enabled);
        assert_eq!(catalog.get("telefon").unwrap().presentation_icon(), "fas fa-mobile");
        assert_eq!(catalog.get("qr").unwrap().presentation_icon(), "fas fa-qrcode");
    }

    #[test]
    fn test_catalog_entries_with_only_ids() {
        let catalog = IconCatalog::from_json(r#"[{"id":"telefon"},{"id":"eposta"}]"#).unwrap();
        assert_eq!(catalog.slots()[0].label, "Telefon");
        assert_eq!(catalog.slots()[1].category, IconCategory::Communication);

        let entity =
            EntityData { communication: vec![comm("telefon", "555")], ..Default::default() };
        assert_eq!(ids(&resolve_icons(&catalog, &entity)), vec!["telefon"]);
    }

    #[test]
    fn test_missing_category_is_inferred_from_id() {
        let catalog = IconCatalog::from_json(
            r#"[{"id": "telefon", "label": "Ofis"},
                {"id": "phone"},
                {"id": "pinterest", "label": "Pins"},
                {"id": "share"},
                {"id": "bank"},
                {"id": "brochure"}]"#,
        )
        .unwrap();

        let categories: Vec<(&str, &str, IconCategory)> = catalog
            .slots()
            .iter()
            .map(|s| (s.id.as_str(), s.label.as_str(), s.category))
            .collect();
        assert_eq!(
            categories,
            vec![
                ("telefon", "Ofis", IconCategory::Communication),
                ("phone", "phone", IconCategory::Communication),
                ("pinterest", "Pins", IconCategory::Social),
                ("share", "share", IconCategory::System),
                ("bank", "bank", IconCategory::Other),
                ("brochure", "brochure", IconCategory::Other),
            ]
        );
        assert_eq!(catalog.validate().len(), 1);

        let entity = EntityData {
            communication: vec![comm("telefon", "555"), comm("phone", "556")],
            bank_accounts: vec![bank(&["TR11"])],
            ..Default::default()
        };
        let icons = resolve_icons(&catalog, &entity);
        assert_eq!(ids(&icons), vec!["telefon", "phone", "share", "bank"]);
        assert_eq!(icons[0].label, "Ofis");
    }

    #[test]
    fn test_explicit_category_wins_over_id() {
        let catalog =
            IconCatalog::from_json(r#"[{"id": "telefon", "category": "system"}]"#).unwrap();
        assert_eq!(catalog.slots()[0].category, IconCategory::System);
        assert_eq!(catalog.slots()[0].label, "Telefon");
    }

    #[test]
    fn test_validate_catalog() {
        assert!(IconCatalog::default_catalog().validate().is_empty());

        let catalog = catalog(&[
            ("qr", IconCategory::System),
            ("qr", IconCategory::System),
            ("", IconCategory::Social),
            ("brochure", IconCategory::Other),
        ]);
        let issues = catalog.validate();
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].index, 1);
        assert!(issues[0].message.contains("duplicate"));
        assert_eq!(issues[1].index, 2);
        assert!(issues[2].to_string().starts_with("icons[3]: 'brochure'"));
    }

    #[test]
    fn test_resolved_icon_value() {
        let catalog = catalog(&[("qr", IconCategory::System)]);
        let icons = resolve_icons(&catalog, &EntityData::default());
        let value = icons[0].to_value();
        assert_eq!(value["id"], "qr");
        assert_eq!(value["category"], "system");
        assert_eq!(value["icon"], "fas fa-qrcode");
        assert_eq!(value["action"], "qr");
    }
}
