use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotations::mapper::{page_index_from_number, quad_points, to_annotation_space};
use crate::core::types::{BBox, DocumentRelevance, RelevanceResult};

pub const SECTION_COLOR: &str = "#FFA700";
pub const SUBSECTION_COLOR: &str = "#FFFF99";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationSubtype {
    Highlight,
}

impl AnnotationSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Highlight => "highlight",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: String,
    pub document_id: String,
    pub subtype: AnnotationSubtype,
    pub page_index: u32,
    pub bounding_box: BBox,
    pub quad_points: [f64; 8],
    pub stroke_color: String,
    pub opacity: f64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Annotation {
    /// W3C web-annotation body understood by the embedded viewer.
    pub fn to_viewer_json(&self) -> Value {
        let timestamp = self.created.to_rfc3339_opts(SecondsFormat::Millis, true);
        let modified = self.modified.to_rfc3339_opts(SecondsFormat::Millis, true);
        serde_json::json!({
            "@context": [
                "https://www.w3.org/ns/anno.jsonld",
                "https://comments.acrobat.com/ns/anno.jsonld"
            ],
            "type": "Annotation",
            "id": self.id,
            "bodyValue": "Highlighting!",
            "motivation": "commenting",
            "creator": { "type": "Person", "name": "System" },
            "created": timestamp,
            "modified": modified,
            "target": {
                "source": self.document_id,
                "selector": {
                    "type": "AdobeAnnoSelector",
                    "subtype": self.subtype.as_str(),
                    "node": { "index": self.page_index },
                    "boundingBox": self.bounding_box,
                    "quadPoints": self.quad_points,
                    "strokeColor": self.stroke_color,
                    "opacity": self.opacity,
                    "styleClass": format!("{}-auto", self.subtype.as_str())
                }
            }
        })
    }
}

/// `page_number` is the 1-based page from the relevance payload.
#[allow(clippy::too_many_arguments)]
pub fn build_annotation(
    id: impl Into<String>,
    subtype: AnnotationSubtype,
    page_number: u32,
    bbox: BBox,
    color: &str,
    page_height: f64,
    document_id: &str,
    now: DateTime<Utc>,
) -> Annotation {
    let mapped = to_annotation_space(bbox, page_height);
    Annotation {
        id: id.into(),
        document_id: document_id.to_string(),
        subtype,
        page_index: page_index_from_number(page_number),
        bounding_box: mapped,
        quad_points: quad_points(mapped),
        stroke_color: color.to_string(),
        opacity: 1.0,
        created: now,
        modified: now,
    }
}

/// Highlights for one document of a relevance result.
///
/// Entries lacking a bbox or a page height are skipped. Ids are
/// `section{idx}` / `subsection{idx}` with the index taken from the source
/// sequence, so skipped entries leave gaps.
pub fn annotations_for_document(
    result: &RelevanceResult,
    document_id: &str,
    now: DateTime<Utc>,
) -> Vec<Annotation> {
    result
        .get(document_id)
        .map(|relevance| annotations_for(relevance, document_id, now))
        .unwrap_or_default()
}

fn annotations_for(relevance: &DocumentRelevance, document_id: &str, now: DateTime<Utc>) -> Vec<Annotation> {
    let sections = relevance.sections.iter().enumerate().filter_map(|(idx, section)| {
        let (bbox, page_height) = section.bbox.zip(section.page_height)?;
        Some(build_annotation(
            format!("section{idx}"),
            AnnotationSubtype::Highlight,
            section.page_number,
            bbox,
            SECTION_COLOR,
            page_height,
            document_id,
            now,
        ))
    });
    let subsections = relevance.subsections.iter().enumerate().filter_map(|(idx, sub)| {
        let (bbox, page_height) = sub.bbox.zip(sub.page_height)?;
        Some(build_annotation(
            format!("subsection{idx}"),
            AnnotationSubtype::Highlight,
            sub.page_number,
            bbox,
            SUBSECTION_COLOR,
            page_height,
            document_id,
            now,
        ))
    });
    sections.chain(subsections).collect()
}
