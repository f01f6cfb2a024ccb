use docsight_lib::{
    core::types::{HeadingNode, HeadingRecord},
    outline::{build_tree, find_node, flatten, HeadingLevel},
};

fn heading(id: &str, level: &str, page: u32) -> HeadingRecord {
    HeadingRecord {
        id: id.to_string(),
        text: format!("Heading {id}"),
        level: level.to_string(),
        page,
        bbox: None,
    }
}

fn ids(nodes: &[HeadingNode]) -> Vec<&str> {
    nodes.iter().map(|node| node.heading.id.as_str()).collect()
}

#[test]
fn nests_headings_by_level_in_source_order() {
    let records = vec![
        heading("1", "H1", 0),
        heading("2", "H2", 1),
        heading("3", "H2", 2),
        heading("4", "H3", 2),
        heading("5", "H1", 4),
    ];

    let forest = build_tree(&records);

    assert_eq!(ids(&forest), vec!["1", "5"]);
    assert_eq!(ids(&forest[0].children), vec!["2", "3"]);
    assert!(forest[0].children[0].children.is_empty());
    assert_eq!(ids(&forest[0].children[1].children), vec!["4"]);
    assert!(forest[1].children.is_empty());
}

#[test]
fn every_record_appears_exactly_once() {
    let records = vec![
        heading("a", "H2", 0),
        heading("b", "H1", 0),
        heading("c", "H3", 1),
        heading("d", "H2", 1),
        heading("e", "H4", 2),
        heading("f", "H1", 3),
    ];

    let forest = build_tree(&records);
    let order: Vec<&str> = flatten(&forest)
        .into_iter()
        .map(|(_, node)| node.heading.id.as_str())
        .collect();

    assert_eq!(order, vec!["a", "b", "c", "d", "e", "f"]);
}

#[test]
fn skipped_levels_nest_under_nearest_shallower_heading() {
    let forest = build_tree(&[heading("1", "H1", 0), heading("2", "H3", 0), heading("3", "H2", 1)]);

    assert_eq!(ids(&forest[0].children), vec!["2", "3"]);
}

#[test]
fn rebuilding_is_idempotent() {
    let records = vec![heading("1", "H1", 0), heading("2", "H2", 1), heading("3", "H1", 2)];
    assert_eq!(build_tree(&records), build_tree(&records));
}

#[test]
fn empty_input_yields_empty_forest() {
    assert!(build_tree(&[]).is_empty());
}

#[test]
fn malformed_level_becomes_a_root() {
    let records = vec![
        heading("1", "H2", 0),
        heading("2", "Title", 0),
        heading("3", "H3", 1),
    ];

    let forest = build_tree(&records);

    assert_eq!(ids(&forest), vec!["1", "2"]);
    assert_eq!(ids(&forest[1].children), vec!["3"]);
    assert_eq!(HeadingLevel::parse("Title"), HeadingLevel::Malformed);
    assert_eq!(HeadingLevel::parse("h3"), HeadingLevel::Numbered(3));
    assert_eq!(HeadingLevel::parse("2"), HeadingLevel::Numbered(2));
}

#[test]
fn find_and_flatten_walk_the_forest() {
    let forest = build_tree(&[heading("1", "H1", 0), heading("2", "H2", 3), heading("3", "H3", 5)]);

    let found = find_node(&forest, "3").expect("nested heading");
    assert_eq!(found.heading.page, 5);
    assert!(find_node(&forest, "missing").is_none());

    let depths: Vec<usize> = flatten(&forest).into_iter().map(|(depth, _)| depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
}
