/*!
 * Layout document model.
 *
 * A layout document is an ordered list of text regions, each holding an
 * ordered list of text lines. The translation pipeline only needs two things
 * from it: the line texts grouped per region (`LayoutSource`) and a way to
 * write reconstructed lines back (`LayoutSink`). `LayoutDocument` is stored
 * as JSON or read from and written back into PAGE XML.
 */

pub mod model;
pub mod page_xml;

pub use model::{LayoutDocument, LayoutLine, LayoutRegion, LayoutSink, LayoutSource, is_xml_path};
