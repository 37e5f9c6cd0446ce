//! Persistence: write the output record as pretty-printed UTF-8 JSON.
//!
//! Writes go to `<path>.tmp` first and are renamed over the target, so a
//! reader never sees a half-written file and a failed run leaves any previous
//! output in place.

use crate::error::ExtractError;
use crate::model::PersistedOutput;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serialise `output` to `path`, creating parent directories as needed.
///
/// Two-space indentation, non-ASCII characters written as-is, trailing
/// newline. An existing file is replaced.
pub async fn write_output(path: &Path, output: &PersistedOutput) -> Result<(), ExtractError> {
    let write_failed = |source: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(write_failed)?;
    }

    let mut json = serde_json::to_string_pretty(output)
        .map_err(|e| ExtractError::Internal(format!("Failed to serialise output: {e}")))?;
    json.push('\n');

    let tmp_path = tmp_path_for(path);
    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(write_failed)?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }

    debug!("Wrote {} bytes to {}", json.len(), path.display());
    Ok(())
}

/// Read a file produced by [`write_output`].
///
/// Every failure, a missing file included, is `OutputReadFailed`;
/// `FileNotFound` is reserved for the input PDF.
pub async fn read_output(path: &Path) -> Result<PersistedOutput, ExtractError> {
    let read_failed = |detail: String| ExtractError::OutputReadFailed {
        path: path.to_path_buf(),
        detail,
    };

    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| read_failed(e.to_string()))?;

    serde_json::from_str(&text).map_err(|e| read_failed(e.to_string()))
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ExtractionRecord, ImageDescriptor, LineItem, MetadataValue, Section, SectionContent,
    };

    fn sample() -> PersistedOutput {
        let mut item = LineItem {
            category: "Opzioni".into(),
            item_name: "Stazione di etichettatura".into(),
            quantity: "1".into(),
            unit_price: "€12.500,00".into(),
            total_price: "€12.500,00".into(),
            related_images: vec!["img_1".into()],
            ..Default::default()
        };
        item.specifications
            .insert("Velocità".into(), MetadataValue::Text("6000 bph".into()));
        item.extra
            .insert("discount".into(), serde_json::json!("5%"));

        let mut record = ExtractionRecord {
            items: vec![item, LineItem::default()],
            technical_sections: vec![Section {
                title: "Dotazione".into(),
                content: SectionContent::Bullets(vec!["Telaio inox".into()]),
            }],
            images: vec![ImageDescriptor {
                id: "img_1".into(),
                description: "Vista frontale".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        record
            .document_metadata
            .insert("languages".into(), MetadataValue::List(vec!["it".into()]));
        PersistedOutput::from_record(record, "direct_vision_single_pass", "Main Items")
    }

    #[tokio::test]
    async fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items_offer1.json");
        let output = sample();
        write_output(&path, &output).await.unwrap();
        assert_eq!(read_output(&path).await.unwrap(), output);
    }

    #[tokio::test]
    async fn pretty_utf8_with_fixed_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_output(&path, &sample()).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n  \"items\": ["));
        assert!(text.contains("€12.500,00"));
        assert!(text.contains("Velocità"));
        assert!(!text.contains("\\u"));

        let keys = [
            "\"extraction_method\"",
            "\"items\"",
            "\"technical_sections\"",
            "\"images\"",
            "\"document_metadata\"",
            "\"categories\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| text.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[tokio::test]
    async fn creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outputs").join("items_offer1.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        write_output(&path, &sample()).await.unwrap();
        let back = read_output(&path).await.unwrap();
        assert_eq!(back.categories, vec!["Opzioni", "Main Items"]);
        assert!(!tmp_path_for(&path).exists());
    }

    #[tokio::test]
    async fn nested_parent_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c/out.json");
        write_output(&path, &sample()).await.unwrap();
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn missing_output_is_a_read_failure_not_a_missing_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outputs/items_offer1.json");
        let err = read_output(&path).await.unwrap_err();
        assert!(matches!(err, ExtractError::OutputReadFailed { .. }), "{err:?}");

        let msg = err.to_string();
        assert!(msg.contains("items_offer1.json"), "{msg}");
        assert!(!msg.contains("PDF"), "{msg}");
    }

    #[tokio::test]
    async fn unparseable_output_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read_output(&path).await,
            Err(ExtractError::OutputReadFailed { .. })
        ));
    }

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path_for(Path::new("outputs/items_offer1.json")),
            PathBuf::from("outputs/items_offer1.json.tmp")
        );
    }
}
