/*!
 * PAGE XML reading and translation write-back.
 *
 * Regions are `TextRegion` elements and lines are their `TextLine`
 * children, in document order. A line's text is the `Unicode` content of its
 * first direct `TextEquiv`; word and glyph level `TextEquiv`s are ignored.
 * Nested regions become regions of their own, and a line belongs to the
 * innermost region around it.
 *
 * Writing streams the original XML through unchanged and adds one
 * `TextEquiv` per translated line, marked with `dataType="translation"` and
 * the target language in `dataTypeDetails`, right after the line's source
 * `TextEquiv`.
 */

use anyhow::{Context, Result, anyhow};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::model::{LayoutDocument, LayoutLine, LayoutRegion};

const REGION: &[u8] = b"TextRegion";
const LINE: &[u8] = b"TextLine";
const EQUIV: &[u8] = b"TextEquiv";
const UNICODE: &[u8] = b"Unicode";

fn local_name(element: &BytesStart) -> Vec<u8> {
    element.local_name().as_ref().to_vec()
}

fn id_attribute(element: &BytesStart) -> Result<Option<String>> {
    Ok(element
        .try_get_attribute("id")?
        .map(|a| a.unescape_value().map(|v| v.into_owned()))
        .transpose()?)
}

/// Parse the regions and lines of a PAGE XML document
pub fn read_page_xml(xml: &str) -> Result<LayoutDocument> {
    let mut reader = Reader::from_str(xml);

    let mut regions: Vec<LayoutRegion> = Vec::new();
    let mut open_regions: Vec<usize> = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut line: Option<LayoutLine> = None;
    let mut line_equiv_done = false;
    let mut in_line_equiv = false;
    let mut in_unicode = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| anyhow!("Invalid PAGE XML at byte {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Start(e) => {
                let name = local_name(&e);
                let parent = path.last().map(Vec::as_slice);

                match name.as_slice() {
                    REGION => {
                        regions.push(LayoutRegion {
                            id: id_attribute(&e)?,
                            lines: Vec::new(),
                        });
                        open_regions.push(regions.len() - 1);
                    }
                    LINE => {
                        line = Some(LayoutLine {
                            id: id_attribute(&e)?,
                            ..LayoutLine::new("")
                        });
                        line_equiv_done = false;
                    }
                    EQUIV if parent == Some(LINE) && !line_equiv_done => in_line_equiv = true,
                    UNICODE if parent == Some(EQUIV) && in_line_equiv => in_unicode = true,
                    _ => {}
                }

                path.push(name);
            }
            Event::Empty(e) => match local_name(&e).as_slice() {
                REGION => regions.push(LayoutRegion {
                    id: id_attribute(&e)?,
                    lines: Vec::new(),
                }),
                LINE => {
                    let region = open_regions
                        .last()
                        .ok_or_else(|| anyhow!("TextLine outside of a TextRegion"))?;
                    regions[*region].lines.push(LayoutLine {
                        id: id_attribute(&e)?,
                        ..LayoutLine::new("")
                    });
                }
                _ => {}
            },
            Event::Text(t) if in_unicode => {
                if let Some(line) = line.as_mut() {
                    line.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) if in_unicode => {
                if let Some(line) = line.as_mut() {
                    line.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(_) => {
                let Some(name) = path.pop() else {
                    continue;
                };

                match name.as_slice() {
                    UNICODE => in_unicode = false,
                    EQUIV if in_line_equiv => {
                        in_line_equiv = false;
                        line_equiv_done = true;
                    }
                    LINE => {
                        let region = open_regions
                            .last()
                            .ok_or_else(|| anyhow!("TextLine outside of a TextRegion"))?;
                        if let Some(line) = line.take() {
                            regions[*region].lines.push(line);
                        }
                    }
                    REGION => {
                        open_regions.pop();
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(LayoutDocument {
        source_language: None,
        target_language: None,
        regions,
        page_xml: Some(xml.to_string()),
    })
}

/// Copy `xml` with a translation `TextEquiv` added to every translated line.
///
/// `document` must have been read from `xml`; its regions and lines are
/// matched to the XML by position.
pub fn write_page_xml(xml: &str, document: &LayoutDocument) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let language = document.target_language.as_deref();

    let mut region_count = 0;
    let mut open_regions: Vec<usize> = Vec::new();
    let mut line_counts: Vec<usize> = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    // Translation still to be written for the open line, with the element prefix
    let mut pending: Option<(String, String)> = None;
    let mut line_equiv_open = false;

    let next_line = |open_regions: &[usize], line_counts: &mut Vec<usize>| -> Result<Option<String>> {
        let region = *open_regions
            .last()
            .ok_or_else(|| anyhow!("TextLine outside of a TextRegion"))?;
        let line_index = line_counts[region];
        line_counts[region] += 1;

        let line = document
            .regions
            .get(region)
            .and_then(|r| r.lines.get(line_index))
            .ok_or_else(|| anyhow!("PAGE XML does not match the document: no line {} in region {}", line_index, region))?;
        Ok(line.translation.clone())
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|e| anyhow!("Invalid PAGE XML at byte {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Eof => break,
            Event::Start(e) => {
                let name = local_name(&e);
                let parent = path.last().map(Vec::as_slice);

                match name.as_slice() {
                    REGION => {
                        open_regions.push(region_count);
                        line_counts.push(0);
                        region_count += 1;
                    }
                    LINE => {
                        pending = next_line(&open_regions, &mut line_counts)?
                            .map(|translation| (translation, element_prefix(&e)));
                    }
                    EQUIV if parent == Some(LINE) && pending.is_some() => line_equiv_open = true,
                    _ => {}
                }

                path.push(name);
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                match local_name(&e).as_slice() {
                    REGION => {
                        line_counts.push(0);
                        region_count += 1;
                    }
                    LINE => {
                        if let Some(translation) = next_line(&open_regions, &mut line_counts)? {
                            writer.write_event(Event::Start(e.borrow()))?;
                            write_translation(&mut writer, &element_prefix(&e), &translation, language)?;
                            writer.write_event(Event::End(e.to_end()))?;
                            continue;
                        }
                    }
                    _ => {}
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                let name = path.pop().unwrap_or_default();

                match name.as_slice() {
                    EQUIV if line_equiv_open => {
                        writer.write_event(Event::End(e))?;
                        line_equiv_open = false;
                        if let Some((translation, prefix)) = pending.take() {
                            write_translation(&mut writer, &prefix, &translation, language)?;
                        }
                        continue;
                    }
                    LINE => {
                        if let Some((translation, prefix)) = pending.take() {
                            write_translation(&mut writer, &prefix, &translation, language)?;
                        }
                    }
                    REGION => {
                        open_regions.pop();
                    }
                    _ => {}
                }

                writer.write_event(Event::End(e))?;
            }
            other => writer.write_event(other)?,
        }
    }

    String::from_utf8(writer.into_inner()).context("Translated PAGE XML is not valid UTF-8")
}

/// `"pc:"` for `<pc:TextLine>`, empty without a prefix
fn element_prefix(element: &BytesStart) -> String {
    element
        .name()
        .prefix()
        .map(|p| format!("{}:", String::from_utf8_lossy(p.as_ref())))
        .unwrap_or_default()
}

fn write_translation<W: std::io::Write>(
    writer: &mut Writer<W>,
    prefix: &str,
    translation: &str,
    language: Option<&str>,
) -> Result<()> {
    let equiv_name = format!("{}TextEquiv", prefix);
    let unicode_name = format!("{}Unicode", prefix);

    let mut equiv = BytesStart::new(equiv_name.as_str());
    equiv.push_attribute(("dataType", "translation"));
    if let Some(language) = language {
        equiv.push_attribute(("dataTypeDetails", language));
    }

    writer.write_event(Event::Start(equiv))?;
    writer.write_event(Event::Start(BytesStart::new(unicode_name.as_str())))?;
    writer.write_event(Event::Text(BytesText::new(translation)))?;
    writer.write_event(Event::End(BytesEnd::new(unicode_name.as_str())))?;
    writer.write_event(Event::End(BytesEnd::new(equiv_name.as_str())))?;
    Ok(())
}
