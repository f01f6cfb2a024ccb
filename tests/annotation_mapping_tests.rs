use chrono::{TimeZone, Utc};
use docsight_lib::{
    annotations::{
        annotations_for_document, build_annotation, from_annotation_space, page_index_from_number, quad_points,
        to_annotation_space, AnnotationSubtype,
    },
    core::types::{DocumentRelevance, RelevanceResult, RelevanceSection, RelevanceSubsection},
};

#[test]
fn maps_bottom_left_rectangles_to_top_left() {
    assert_eq!(to_annotation_space([10.0, 20.0, 50.0, 80.0], 100.0), [10.0, 20.0, 50.0, 80.0]);
    assert_eq!(to_annotation_space([10.0, 0.0, 50.0, 30.0], 100.0), [10.0, 70.0, 50.0, 100.0]);
}

#[test]
fn mapping_back_recovers_the_original_rectangle() {
    let original = [72.0, 612.5, 310.25, 640.0];
    let mapped = to_annotation_space(original, 792.0);
    assert_eq!(from_annotation_space(mapped, 792.0), original);
}

#[test]
fn quad_points_trace_the_mapped_rectangle() {
    assert_eq!(
        quad_points([10.0, 70.0, 50.0, 100.0]),
        [10.0, 70.0, 50.0, 70.0, 10.0, 100.0, 50.0, 100.0]
    );
}

#[test]
fn page_numbers_become_zero_based_indices() {
    assert_eq!(page_index_from_number(3), 2);
    assert_eq!(page_index_from_number(1), 0);
    assert_eq!(page_index_from_number(0), 0);
}

#[test]
fn entries_without_geometry_are_skipped() {
    let mut result = RelevanceResult::new();
    result.insert(
        "doc-1".to_string(),
        DocumentRelevance {
            original_name: "Paper.pdf".to_string(),
            sections: vec![RelevanceSection {
                title: "Methods".to_string(),
                page_number: 2,
                page_height: Some(792.0),
                bbox: None,
            }],
            subsections: vec![
                RelevanceSubsection {
                    refined_text: "We sample uniformly".to_string(),
                    page_number: 2,
                    page_height: Some(792.0),
                    bbox: Some([72.0, 600.0, 300.0, 640.0]),
                },
                RelevanceSubsection {
                    refined_text: "No height".to_string(),
                    page_number: 3,
                    page_height: None,
                    bbox: Some([72.0, 600.0, 300.0, 640.0]),
                },
            ],
        },
    );

    let now = Utc::now();
    let annotations = annotations_for_document(&result, "doc-1", now);

    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].id, "subsection0");
    assert_eq!(annotations[0].page_index, 1);
    assert_eq!(annotations[0].bounding_box, [72.0, 152.0, 300.0, 192.0]);
    assert_eq!(annotations[0].stroke_color, "#FFFF99");
    assert!(annotations_for_document(&result, "doc-2", now).is_empty());
}

#[test]
fn viewer_json_carries_selector_geometry() {
    let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let annotation = build_annotation(
        "section0",
        AnnotationSubtype::Highlight,
        3,
        [10.0, 0.0, 50.0, 30.0],
        "#FFA700",
        100.0,
        "doc-1",
        created,
    );

    let json = annotation.to_viewer_json();
    let selector = &json["target"]["selector"];
    assert_eq!(json["id"], "section0");
    assert_eq!(json["target"]["source"], "doc-1");
    assert_eq!(json["created"], "2024-05-01T12:00:00.000Z");
    assert_eq!(selector["subtype"], "highlight");
    assert_eq!(selector["node"]["index"], 2);
    assert_eq!(selector["boundingBox"], serde_json::json!([10.0, 70.0, 50.0, 100.0]));
    assert_eq!(selector["strokeColor"], "#FFA700");
}
