pub mod annotation;
pub mod mapper;

pub use annotation::{annotations_for_document, build_annotation, Annotation, AnnotationSubtype};
pub use mapper::{from_annotation_space, page_index_from_number, quad_points, to_annotation_space};
