//! Data model for quotation extraction.
//!
//! The model's reply is advisory: field names follow the schema in
//! [`crate::prompts::EXTRACTION_PROMPT`], but nothing forces the model to
//! honour it. Deserialisation here is therefore lenient wherever leniency
//! cannot change meaning:
//!
//! - missing keys and JSON `null` become empty values;
//! - scalar text fields accept numbers/booleans and keep their JSON text
//!   (`1` → `"1"`), while strings are kept byte-for-byte, so prices such as
//!   `"€1.000,00"` are never reformatted;
//! - keys the model adds to an item are kept in `extra` and written back out.
//!
//! Anything that is structurally wrong (an item that is not an object, a
//! reply that is not JSON) still fails and surfaces as
//! [`crate::error::ExtractError::MalformedResponse`].

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Free-form key → value mapping used for item specifications and
/// document metadata. Keys keep the order the model wrote them in.
pub type Metadata = IndexMap<String, MetadataValue>;

/// Key used when the model returns `specifications` as a bare value instead
/// of an object.
pub const SPECIFICATIONS_SUMMARY_KEY: &str = "summary";

// ── Page images ─────────────────────────────────────────────────────────────

/// One rasterised page, PNG-encoded and base64-wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 0-based page index in document order.
    pub index: usize,
    /// Base64 (standard alphabet) of the PNG bytes.
    pub png_base64: String,
}

impl PageImage {
    pub const MIME_TYPE: &'static str = "image/png";

    /// `data:image/png;base64,…` form of the page.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", Self::MIME_TYPE, self.png_base64)
    }

    /// Attachment for the VLM request. `detail: "high"` keeps small print in
    /// price tables legible to GPT-4-class models.
    pub fn to_image_data(&self) -> edgequake_llm::ImageData {
        edgequake_llm::ImageData::new(self.png_base64.clone(), Self::MIME_TYPE).with_detail("high")
    }
}

// ── Metadata values ─────────────────────────────────────────────────────────

/// Loosely-typed metadata value: string | number | boolean | list of strings.
///
/// `Other` holds anything outside that union (null, nested objects, mixed
/// arrays) so an unexpected metadata shape never aborts a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<String>),
    Other(Value),
}

impl From<Value> for MetadataValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => MetadataValue::Flag(b),
            Value::Number(n) => MetadataValue::Number(n),
            Value::String(s) => MetadataValue::Text(s),
            Value::Array(items) if items.iter().all(Value::is_string) => MetadataValue::List(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => MetadataValue::Other(other),
        }
    }
}

impl<'de> Deserialize<'de> for MetadataValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(MetadataValue::from)
    }
}

impl MetadataValue {
    /// Text rendering used in CLI summaries.
    pub fn display_text(&self) -> String {
        match self {
            MetadataValue::Flag(b) => b.to_string(),
            MetadataValue::Number(n) => n.to_string(),
            MetadataValue::Text(s) => s.clone(),
            MetadataValue::List(items) => items.join(", "),
            MetadataValue::Other(v) => v.to_string(),
        }
    }
}

// ── Records ─────────────────────────────────────────────────────────────────

/// One priced product/service entry from the quotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Grouping label. Empty until defaulted by the categoriser.
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub technical_description: String,
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub specifications: Metadata,
    /// Kept as text: "1", "2 pcs", "1 lot" are all valid in source documents.
    #[serde(default, deserialize_with = "lenient_string")]
    pub quantity: String,
    /// Verbatim, including currency symbol and locale separators.
    #[serde(default, deserialize_with = "lenient_string")]
    pub unit_price: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub total_price: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notes: String,
    /// Ids of [`ImageDescriptor`]s. Not checked against `images`.
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub related_images: Vec<String>,
    /// Keys outside the schema, preserved as returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of a technical section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Text(String),
    Bullets(Vec<String>),
}

impl Default for SectionContent {
    fn default() -> Self {
        SectionContent::Text(String::new())
    }
}

impl SectionContent {
    /// Discriminator written as the section's `type`.
    pub fn kind(&self) -> &'static str {
        match self {
            SectionContent::Text(_) => "text",
            SectionContent::Bullets(_) => "list",
        }
    }

    fn from_value(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => SectionContent::default(),
            Some(Value::String(s)) => SectionContent::Text(s),
            Some(Value::Array(items)) => {
                SectionContent::Bullets(items.into_iter().map(value_to_text).collect())
            }
            Some(other) => SectionContent::Text(other.to_string()),
        }
    }
}

/// A titled block of technical text: either prose or a bullet list.
///
/// The JSON `type` field is always derived from the shape of `content`; an
/// incoming `type` that disagrees with the shape is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub title: String,
    pub content: SectionContent,
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("Section", 3)?;
        st.serialize_field("title", &self.title)?;
        st.serialize_field("type", self.content.kind())?;
        match &self.content {
            SectionContent::Text(text) => st.serialize_field("content", text)?,
            SectionContent::Bullets(items) => st.serialize_field("content", items)?,
        }
        st.end()
    }
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawSection {
            #[serde(default, deserialize_with = "lenient_string")]
            title: String,
            #[serde(default)]
            content: Option<Value>,
        }

        let raw = RawSection::deserialize(deserializer)?;
        Ok(Section {
            title: raw.title,
            content: SectionContent::from_value(raw.content),
        })
    }
}

/// A picture or drawing the model noticed in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// Item names this image illustrates. Not checked against `items`.
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub related_items: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The parsed model reply. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<LineItem>,
    #[serde(default, deserialize_with = "nullable")]
    pub technical_sections: Vec<Section>,
    #[serde(default, deserialize_with = "nullable")]
    pub images: Vec<ImageDescriptor>,
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub document_metadata: Metadata,
}

/// The JSON document written to disk. Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedOutput {
    pub extraction_method: String,
    pub items: Vec<LineItem>,
    pub technical_sections: Vec<Section>,
    pub images: Vec<ImageDescriptor>,
    pub document_metadata: Metadata,
    /// Distinct item categories in first-seen order.
    pub categories: Vec<String>,
}

// ── Lenient field deserialisers ─────────────────────────────────────────────

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(value_to_text)
        .unwrap_or_default())
}

fn lenient_string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.into_iter().map(value_to_text).collect(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(single) => vec![value_to_text(single)],
    })
}

fn lenient_metadata<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Metadata, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Metadata::new()),
        Some(Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, MetadataValue::from(v)))
            .collect()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Metadata::new()),
        Some(Value::Array(_)) => Err(D::Error::custom(
            "expected an object of key/value pairs, found an array",
        )),
        Some(other) => Ok(Metadata::from([(
            SPECIFICATIONS_SUMMARY_KEY.to_string(),
            MetadataValue::from(other),
        )])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn line_item_keeps_prices_verbatim() {
        let item: LineItem = serde_json::from_value(json!({
            "item_name": "Pump X",
            "unit_price": "€1.000,00",
            "total_price": "1 234,50 zł"
        }))
        .unwrap();
        assert_eq!(item.unit_price, "€1.000,00");
        assert_eq!(item.total_price, "1 234,50 zł");
        assert_eq!(item.category, "");
    }

    #[test]
    fn line_item_numeric_quantity_becomes_text() {
        let item: LineItem =
            serde_json::from_value(json!({ "item_name": "Tank", "quantity": 2 })).unwrap();
        assert_eq!(item.quantity, "2");
    }

    #[test]
    fn line_item_nulls_become_empty() {
        let item: LineItem = serde_json::from_value(json!({
            "item_name": "Tank",
            "notes": null,
            "related_images": null,
            "specifications": null
        }))
        .unwrap();
        assert_eq!(item.notes, "");
        assert!(item.related_images.is_empty());
        assert!(item.specifications.is_empty());
    }

    #[test]
    fn line_item_unknown_keys_survive_serialisation() {
        let item: LineItem = serde_json::from_value(json!({
            "item_name": "Labeller",
            "item_number": 3,
            "is_optional": true
        }))
        .unwrap();
        assert_eq!(item.extra.get("item_number"), Some(&json!(3)));
        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["is_optional"], json!(true));
    }

    #[test]
    fn single_related_image_string_becomes_list() {
        let item: LineItem =
            serde_json::from_value(json!({ "related_images": "img_1" })).unwrap();
        assert_eq!(item.related_images, vec!["img_1".to_string()]);
    }

    #[test]
    fn specifications_string_is_kept_under_summary_key() {
        let item: LineItem =
            serde_json::from_value(json!({ "specifications": "Capacity 5000 L" })).unwrap();
        assert_eq!(
            item.specifications.get(SPECIFICATIONS_SUMMARY_KEY),
            Some(&MetadataValue::Text("Capacity 5000 L".into()))
        );
    }

    #[test]
    fn metadata_value_union() {
        let meta: Metadata = serde_json::from_value(json!({
            "currency": "EUR",
            "item_count": 7,
            "has_optional_items": true,
            "languages": ["it", "en"],
            "supplier": { "name": "ACME" },
            "vat": null
        }))
        .unwrap();
        assert_eq!(meta["currency"], MetadataValue::Text("EUR".into()));
        assert!(matches!(meta["item_count"], MetadataValue::Number(_)));
        assert_eq!(meta["has_optional_items"], MetadataValue::Flag(true));
        assert_eq!(
            meta["languages"],
            MetadataValue::List(vec!["it".into(), "en".into()])
        );
        assert!(matches!(meta["supplier"], MetadataValue::Other(_)));
        assert_eq!(meta["vat"], MetadataValue::Other(Value::Null));
    }

    #[test]
    fn metadata_keeps_model_key_order() {
        let record: ExtractionRecord = serde_json::from_str(
            r#"{
                "items": [{"item_name": "Filler",
                           "specifications": {"Velocità": "6000 bph", "Alimentazione": "400 V", "Bocchette": 24}}],
                "document_metadata": {"supplier": "ACME S.p.A.", "currency": "EUR", "date": "2024-03-01", "address": {"city": "Parma", "cap": "43100"}}
            }"#,
        )
        .unwrap();

        let keys: Vec<&str> = record.document_metadata.keys().map(String::as_str).collect();
        assert_eq!(keys, ["supplier", "currency", "date", "address"]);
        let spec_keys: Vec<&str> = record.items[0]
            .specifications
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(spec_keys, ["Velocità", "Alimentazione", "Bocchette"]);

        let text = serde_json::to_string(&record.document_metadata).unwrap();
        assert!(text.find("\"supplier\"").unwrap() < text.find("\"currency\"").unwrap());
        assert!(text.find("\"city\"").unwrap() < text.find("\"cap\"").unwrap(), "{text}");
    }

    #[test]
    fn section_type_follows_content_shape() {
        let text: Section =
            serde_json::from_value(json!({ "title": "Description", "content": "Rotary labeller." }))
                .unwrap();
        assert_eq!(text.content.kind(), "text");

        // Declared type disagrees with the shape: the shape wins.
        let list: Section = serde_json::from_value(json!({
            "title": "Features",
            "type": "text",
            "content": ["Stainless steel", "CE marked"]
        }))
        .unwrap();
        assert_eq!(
            list.content,
            SectionContent::Bullets(vec!["Stainless steel".into(), "CE marked".into()])
        );

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["type"], "list");
        assert_eq!(json["content"][1], "CE marked");
    }

    #[test]
    fn section_without_content_is_empty_text() {
        let s: Section = serde_json::from_value(json!({ "title": "Warranty" })).unwrap();
        assert_eq!(s.content, SectionContent::Text(String::new()));
    }

    #[test]
    fn record_keys_are_optional_and_nullable() {
        let r: ExtractionRecord =
            serde_json::from_value(json!({ "items": [{}], "images": null })).unwrap();
        assert_eq!(r.items.len(), 1);
        assert!(r.images.is_empty());
        assert!(r.technical_sections.is_empty());
        assert!(r.document_metadata.is_empty());
    }

    #[test]
    fn item_that_is_not_an_object_is_rejected() {
        let r: Result<ExtractionRecord, _> = serde_json::from_value(json!({ "items": ["Pump"] }));
        assert!(r.is_err());
    }

    #[test]
    fn page_image_data_uri() {
        let page = PageImage {
            index: 0,
            png_base64: "iVBORw0KGgo=".into(),
        };
        assert_eq!(page.data_uri(), "data:image/png;base64,iVBORw0KGgo=");
        let data = page.to_image_data();
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(data.data, "iVBORw0KGgo=");
    }
}
