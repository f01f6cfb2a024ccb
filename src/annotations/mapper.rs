use crate::core::types::BBox;

/// Bottom-left-origin box → top-left-origin box on a page of `page_height`.
pub fn to_annotation_space(bbox: BBox, page_height: f64) -> BBox {
    let [x0, y0, x1, y1] = bbox;
    [x0, page_height - y1, x1, page_height - y0]
}

/// Inverse of [`to_annotation_space`]. The flip is its own inverse.
pub fn from_annotation_space(bbox: BBox, page_height: f64) -> BBox {
    to_annotation_space(bbox, page_height)
}

/// Corners of a mapped box: top-left, top-right, bottom-left, bottom-right.
pub fn quad_points(mapped: BBox) -> [f64; 8] {
    let [x0, y0, x1, y1] = mapped;
    [x0, y0, x1, y0, x0, y1, x1, y1]
}

/// 1-based page number → 0-based page index. Page 0 clamps to index 0.
pub fn page_index_from_number(page_number: u32) -> u32 {
    page_number.saturating_sub(1)
}
