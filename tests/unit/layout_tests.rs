/*!
 * Tests for the layout document model
 */

use anyhow::Result;
use pagetrans::layout::{LayoutDocument, LayoutSink, LayoutSource};

use crate::common;

#[test]
fn test_fromFile_withHandWrittenJson_shouldKeepIdsAndOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "page.json",
        r#"{
            "regions": [
                { "id": "r1", "lines": [ { "id": "l1", "text": "First line" }, { "text": "second" } ] },
                { "lines": [] }
            ]
        }"#,
    )?;

    let document = LayoutDocument::from_file(&path)?;

    assert_eq!(document.regions.len(), 2);
    assert_eq!(document.regions[0].id.as_deref(), Some("r1"));
    assert_eq!(document.regions[0].lines[0].id.as_deref(), Some("l1"));
    assert_eq!(document.regions_lines_text(), vec![vec!["First line", "second"], vec![]]);
    assert_eq!(document.line_count(), 2);
    Ok(())
}

#[test]
fn test_writeRegion_thenSave_shouldPersistTranslations() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out.json");
    let mut document = common::sample_document();

    document.write_region(1, &["Goedemorgen.".to_string(), "Tot later.".to_string()])?;
    document.save(&path)?;
    let reloaded = LayoutDocument::from_file(&path)?;

    assert_eq!(reloaded.translated_lines(), vec!["", "", "Goedemorgen.", "Tot later."]);
    assert_eq!(reloaded.regions[1].lines[0].text, "Good morning.");
    Ok(())
}

#[test]
fn test_writeRegion_withWrongLineCount_shouldFail() {
    let mut document = common::sample_document();

    assert!(document.write_region(0, &["only one".to_string()]).is_err());
    assert!(document.write_region(5, &[]).is_err());
}
