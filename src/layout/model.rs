/*!
 * Region/line document model with JSON and PAGE XML persistence.
 */

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::page_xml;

/// Read access to the text of a layout document
pub trait LayoutSource {
    /// Line texts grouped per region, both in document order
    fn regions_lines_text(&self) -> Vec<Vec<String>>;
}

/// Write access for reconstructed (translated) lines
pub trait LayoutSink {
    /// Store the translated lines of one region.
    ///
    /// `lines` must have exactly as many entries as the region has lines.
    fn write_region(&mut self, region_index: usize, lines: &[String]) -> Result<()>;
}

/// A single text line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLine {
    /// Optional identifier carried over from the source format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Original text
    #[serde(default)]
    pub text: String,

    /// Translated text, once written back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl LayoutLine {
    /// Create an untranslated line without identifier
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            translation: None,
        }
    }
}

/// A block of lines that reads as one unit (paragraph, column, caption...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutRegion {
    /// Optional identifier carried over from the source format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Lines in reading order
    #[serde(default)]
    pub lines: Vec<LayoutLine>,
}

impl LayoutRegion {
    /// Create a region from plain line texts
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        Self {
            id: None,
            lines: texts.iter().map(|t| LayoutLine::new(t.as_ref())).collect(),
        }
    }
}

/// Layout document: ordered regions of ordered lines
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutDocument {
    /// Language of the original text, if the source format declares one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<String>,

    /// Language of the written translations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,

    /// Regions in reading order
    #[serde(default)]
    pub regions: Vec<LayoutRegion>,

    /// Source PAGE XML, kept so translations can be written back into it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_xml: Option<String>,
}

impl LayoutDocument {
    /// Build a document from line texts grouped per region
    pub fn from_region_lines<S: AsRef<str>>(regions: &[Vec<S>]) -> Self {
        Self {
            source_language: None,
            target_language: None,
            regions: regions.iter().map(|r| LayoutRegion::from_texts(r)).collect(),
            page_xml: None,
        }
    }

    /// Load a PAGE XML file when the extension is `.xml`, JSON otherwise
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !is_xml_path(path) {
            return Self::from_file(path);
        }

        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open layout document: {:?}", path))?;
        page_xml::read_page_xml(&xml)
            .with_context(|| format!("Failed to parse PAGE XML: {:?}", path))
    }

    /// Write PAGE XML when the extension is `.xml`, pretty JSON otherwise
    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !is_xml_path(path) {
            return self.save(path);
        }

        let source = self
            .page_xml
            .as_deref()
            .ok_or_else(|| anyhow!("Document was not read from PAGE XML, cannot write {:?}", path))?;
        let xml = page_xml::write_page_xml(source, self)?;

        std::fs::write(path, xml)
            .with_context(|| format!("Failed to write layout document: {:?}", path))
    }

    /// Load a document from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open layout document: {:?}", path))?;
        let reader = BufReader::new(file);

        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse layout document: {:?}", path))
    }

    /// Parse a document from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse layout document JSON")
    }

    /// Serialize the document to a JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize layout document")
    }

    /// Write the document as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize layout document")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write layout document: {:?}", path))
    }

    /// Total number of lines over all regions
    pub fn line_count(&self) -> usize {
        self.regions.iter().map(|r| r.lines.len()).sum()
    }

    /// Translations of all lines in document order (empty for untranslated lines)
    pub fn translated_lines(&self) -> Vec<String> {
        self.regions
            .iter()
            .flat_map(|r| r.lines.iter())
            .map(|l| l.translation.clone().unwrap_or_default())
            .collect()
    }
}

/// Whether `path` names a PAGE XML file
pub fn is_xml_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

impl LayoutSource for LayoutDocument {
    fn regions_lines_text(&self) -> Vec<Vec<String>> {
        self.regions
            .iter()
            .map(|r| r.lines.iter().map(|l| l.text.clone()).collect())
            .collect()
    }
}

impl LayoutSink for LayoutDocument {
    fn write_region(&mut self, region_index: usize, lines: &[String]) -> Result<()> {
        let region_count = self.regions.len();
        let region = self.regions.get_mut(region_index).ok_or_else(|| {
            anyhow!(
                "Region index {} out of range ({} regions)",
                region_index,
                region_count
            )
        })?;

        if region.lines.len() != lines.len() {
            return Err(anyhow!(
                "Region {} has {} lines but {} translations were given",
                region_index,
                region.lines.len(),
                lines.len()
            ));
        }

        for (line, translation) in region.lines.iter_mut().zip(lines) {
            line.translation = Some(translation.clone());
        }

        Ok(())
    }
}
