//! Instruction text sent to the VLM with the page images.
//!
//! The prompt is the contract with the model: it fixes the JSON shape that
//! [`crate::model::ExtractionRecord`] reads back. Change the two together.
//! Callers can replace it via [`crate::config::ExtractionConfig::instructions`].

/// Default instructions for extracting a supplier quotation.
///
/// Sent unchanged on every run, followed by the page images in page order.
pub const EXTRACTION_PROMPT: &str = r#"You are reading a supplier quotation (commercial offer) supplied as page images, in page order. Extract EVERY priced or included item, the technical content that describes those items, the pictures in the document, and document-level metadata.

================================================================================
1. WHAT TO EXTRACT
================================================================================

LINE ITEMS
- Every row that has a price, or is marked "Included", "Optional", "On request", "N/A" or similar.
- Check ALL sections: main equipment, options, accessories, spare parts, services (installation, training, start-up), packing, transport.
- Keep extracting until the commercial terms or the end of the document. Items after the main table and items at the very end are easy to miss: do not skip them.
- Do not merge rows that are separate in the document. Do not split rows that are one line in the document.

TECHNICAL SECTIONS
- Every descriptive block: descriptions, construction details, specification lists, scope of supply, exclusions.
- Copy text VERBATIM. Do not summarise or shorten.

IMAGES
- Every photo, drawing or diagram. Give each one a short id ("img_1", "img_2", ...) in order of appearance.

================================================================================
2. OUTPUT FORMAT
================================================================================

Return ONLY one JSON object, with no commentary before or after it:

{
  "items": [
    {
      "category": "Main Equipment",
      "item_name": "MODULAR CM 576-9-SM-4B",
      "technical_description": "Automatic rotary labelling machine for self-adhesive labels ...",
      "specifications": { "Output": "6000 bph", "Label height": "20-180 mm" },
      "quantity": "1",
      "unit_price": "€150.320,00",
      "total_price": "€150.320,00",
      "notes": "",
      "related_images": ["img_1"]
    }
  ],
  "technical_sections": [
    { "title": "Machine description", "type": "text", "content": "Full paragraph text ..." },
    { "title": "Standard equipment", "type": "list", "content": ["Stainless steel frame", "Touch screen HMI"] }
  ],
  "images": [
    { "id": "img_1", "description": "Front view of the labelling machine", "related_items": ["MODULAR CM 576-9-SM-4B"] }
  ],
  "document_metadata": {
    "supplier": "Company name",
    "offer_number": "Q-2024-118",
    "offer_date": "12/03/2024",
    "currency": "EUR",
    "languages": ["it", "en"],
    "total_items": 1,
    "has_optional_items": false
  }
}

================================================================================
3. FIELD RULES
================================================================================

- category: the section the item belongs to, using the document's own heading where there is one ("Main Equipment", "Options", "Accessories", "Spare Parts", "Services", "Packing"). Use "Main Items" if the document has no sections.
- item_name: the COMPLETE name exactly as written, including model codes.
- technical_description: the descriptive text for this item, verbatim. Empty string if there is none.
- specifications: parameter -> value pairs (with units) that belong to this item. Empty object if there are none.
- quantity: a STRING, exactly as written ("1", "2 pcs", "1 lot").
- unit_price / total_price: STRINGS, copied EXACTLY as printed: keep the currency symbol or code, the thousand and decimal separators ("€1.000,00" stays "€1.000,00", "$1,000.00" stays "$1,000.00"), and words such as "Included" or "On request". Never convert, round or compute prices.
- notes: any remark attached to the item (optional, excluded, delivery note). Empty string if none.
- related_images: ids from "images" that show this item. Empty list if none.
- technical_sections[].type: "text" when content is one block of text, "list" when content is a list of bullet strings.
- Use "" for missing text, [] for missing lists and {} for missing objects. Do not use null. Do not invent data.

================================================================================
4. LANGUAGES
================================================================================

- Quotations may be written in any language, or mix several (for example Italian descriptions with English prices).
- Keep every text in its ORIGINAL language. Do not translate.
- Preserve accents and non-Latin characters exactly.
- List the languages you detected in document_metadata.languages as ISO 639-1 codes.

================================================================================
5. SELF-CHECK BEFORE ANSWERING
================================================================================

[ ] Every priced or "Included" row of every page is in "items".
[ ] The last items of the document (after the main table, before the terms) are included.
[ ] Every price string is copied character for character.
[ ] Every quantity is a string.
[ ] document_metadata.total_items equals the length of "items".
[ ] Every id in related_images exists in "images".
[ ] The answer is a single valid JSON object and nothing else."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_top_level_key() {
        for key in [
            "\"items\"",
            "\"technical_sections\"",
            "\"images\"",
            "\"document_metadata\"",
        ] {
            assert!(EXTRACTION_PROMPT.contains(key), "missing {key}");
        }
    }

    #[test]
    fn prompt_names_every_item_field() {
        for field in [
            "category",
            "item_name",
            "technical_description",
            "specifications",
            "quantity",
            "unit_price",
            "total_price",
            "notes",
            "related_images",
        ] {
            assert!(EXTRACTION_PROMPT.contains(field), "missing {field}");
        }
    }

    #[test]
    fn prompt_example_parses_as_a_record() {
        let start = EXTRACTION_PROMPT.find("{\n  \"items\"").unwrap();
        let end = EXTRACTION_PROMPT[start..].find("\n}\n").unwrap() + start + 2;
        let record: crate::model::ExtractionRecord =
            serde_json::from_str(&EXTRACTION_PROMPT[start..end]).unwrap();
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].unit_price, "€150.320,00");
        assert_eq!(record.technical_sections.len(), 2);
    }
}
