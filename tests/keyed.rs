//! Child-list reconciliation: keyed moves, insertions, removals, positional reuse.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use spark_vdom::*;

fn setup() -> (Renderer<MemoryDocument>, NodeId) {
    let mut document = MemoryDocument::new();
    let container = document.create_container().unwrap();
    (Renderer::new(document), container)
}

fn list(keys: &[i64]) -> Option<Node> {
    Some(
        Node::element("ul")
            .children(
                keys.iter()
                    .map(|&key| Node::element("li").key(key).text(key.to_string())),
            )
            .into(),
    )
}

fn list_html(keys: &[i64]) -> String {
    let items: String = keys.iter().map(|key| format!("<li>{key}</li>")).collect();
    format!("<ul>{items}</ul>")
}

fn item_handles(renderer: &Renderer<MemoryDocument>, container: NodeId) -> Vec<NodeId> {
    renderer.document().find_by_tag(container, "li")
}

// =============================================================================
// Keyed
// =============================================================================

#[test]
fn test_keyed_reorder_only_moves() {
    let (mut renderer, container) = setup();
    renderer.render(list(&[1, 2, 3, 4, 5]), container).unwrap();
    let before = item_handles(&renderer, container);

    let log = renderer.render(list(&[5, 1, 3, 2, 4]), container).unwrap();
    assert_eq!(log.count(MutationKinds::all()), log.count(MutationKinds::MOVE));
    assert!(log.count(MutationKinds::MOVE) > 0);
    assert_eq!(html(&renderer, container), list_html(&[5, 1, 3, 2, 4]));

    // Same document nodes, new order
    let after = item_handles(&renderer, container);
    let expected: Vec<NodeId> = [4, 0, 2, 1, 3].iter().map(|&i| before[i]).collect();
    assert_eq!(after, expected);
}

#[test]
fn test_keyed_reverse() {
    let (mut renderer, container) = setup();
    renderer.render(list(&[1, 2, 3, 4]), container).unwrap();

    let log = renderer.render(list(&[4, 3, 2, 1]), container).unwrap();
    // First element stays, the other three move
    assert_eq!(log.count(MutationKinds::MOVE), 3);
    assert_eq!(log.len(), 3);
    assert_eq!(html(&renderer, container), list_html(&[4, 3, 2, 1]));
}

#[test]
fn test_keyed_insert_and_remove() {
    let (mut renderer, container) = setup();
    renderer.render(list(&[1, 2, 3]), container).unwrap();
    let before = item_handles(&renderer, container);

    let log = renderer.render(list(&[0, 1, 3, 4]), container).unwrap();
    assert_eq!(html(&renderer, container), list_html(&[0, 1, 3, 4]));
    assert_eq!(log.count(MutationKinds::MOVE), 0);
    assert_eq!(log.count(MutationKinds::REMOVE), 1);

    let after = item_handles(&renderer, container);
    assert_eq!(after[1], before[0]);
    assert_eq!(after[2], before[2]);
    assert!(!renderer.document().contains(before[1]) || !after.contains(&before[1]));
}

#[test]
fn test_keyed_mixed_with_type_change() {
    let (mut renderer, container) = setup();
    renderer.render(list(&[1, 2]), container).unwrap();

    let tree: Node = Node::element("ul")
        .child(Node::element("li").key(2).text("2"))
        .child(Node::element("p").key(1).text("p"))
        .into();
    renderer.render(Some(tree), container).unwrap();
    assert_eq!(html(&renderer, container), "<ul><li>2</li><p>p</p></ul>");
}

#[test]
fn test_duplicate_keys_best_effort() {
    let mut document = MemoryDocument::new();
    let container = document.create_container().unwrap();
    let mut renderer = Renderer::with_config(document, RendererConfig::new().dev_checks(true));

    renderer.render(list(&[1, 1, 2]), container).unwrap();
    assert_eq!(html(&renderer, container), list_html(&[1, 1, 2]));

    renderer.render(list(&[2, 1, 1]), container).unwrap();
    assert_eq!(html(&renderer, container), list_html(&[2, 1, 1]));
}

// =============================================================================
// Unkeyed / fragments
// =============================================================================

/// Holds a per-instance number assigned at creation.
struct Stamp {
    stamp: usize,
}

impl ComponentDef for Stamp {
    fn create(props: &Props, _updater: &Updater) -> Self {
        let next = props
            .get("counter")
            .and_then(|value| value.downcast_ref::<Rc<Cell<usize>>>())
            .map(|counter| {
                counter.set(counter.get() + 1);
                counter.get()
            })
            .unwrap_or(0);
        Stamp { stamp: next }
    }
}

impl Component for Stamp {
    fn render(&self, cx: &RenderCx<'_>) -> Node {
        Node::element("i")
            .text(format!("{}:{}", cx.props().str("label").unwrap_or_default(), self.stamp))
            .into()
    }
}

#[test]
fn test_unkeyed_reuses_by_position() {
    let (mut renderer, container) = setup();
    let counter = Rc::new(Cell::new(0usize));
    let stamps = |labels: &[&str]| -> Option<Node> {
        Some(
            Node::element("div")
                .children(labels.iter().map(|label| {
                    Node::component::<Stamp>(
                        Props::new()
                            .with("label", *label)
                            .with("counter", Value::opaque(counter.clone())),
                    )
                }))
                .into(),
        )
    };

    renderer.render(stamps(&["a", "b"]), container).unwrap();
    assert_eq!(html(&renderer, container), "<div><i>a:1</i><i>b:2</i></div>");

    // Reordered without keys: instances stay in place and take the new props
    renderer.render(stamps(&["b", "a", "c"]), container).unwrap();
    assert_eq!(
        html(&renderer, container),
        "<div><i>b:1</i><i>a:2</i><i>c:3</i></div>"
    );

    renderer.render(stamps(&["b"]), container).unwrap();
    assert_eq!(html(&renderer, container), "<div><i>b:1</i></div>");
    assert_eq!(renderer.instance_count(), 1);
}

#[test]
fn test_fragment_children_reorder_inside_parent() {
    let (mut renderer, container) = setup();
    let tree = |keys: &[i64]| -> Option<Node> {
        Some(
            Node::element("div")
                .child(Node::element("header"))
                .child(Node::fragment(
                    keys.iter().map(|&key| Node::element("b").key(key).text(key.to_string())),
                ))
                .child(Node::element("footer"))
                .into(),
        )
    };

    renderer.render(tree(&[1, 2, 3]), container).unwrap();
    assert_eq!(
        html(&renderer, container),
        "<div><header></header><b>1</b><b>2</b><b>3</b><footer></footer></div>"
    );

    let log = renderer.render(tree(&[3, 1]), container).unwrap();
    assert_eq!(
        html(&renderer, container),
        "<div><header></header><b>3</b><b>1</b><footer></footer></div>"
    );
    assert_eq!(log.count(MutationKinds::CREATE), 0);

    renderer.render(tree(&[]), container).unwrap();
    assert_eq!(
        html(&renderer, container),
        "<div><header></header><footer></footer></div>"
    );
}

#[test]
fn test_empty_to_content_and_back() {
    let (mut renderer, container) = setup();
    let tree = |show: bool| -> Option<Node> {
        Some(
            Node::element("div")
                .child(Node::text("a"))
                .child(show.then(|| Node::element("em").text("!")))
                .child(Node::text("b"))
                .into(),
        )
    };

    renderer.render(tree(false), container).unwrap();
    assert_eq!(html(&renderer, container), "<div>ab</div>");
    renderer.render(tree(true), container).unwrap();
    assert_eq!(html(&renderer, container), "<div>a<em>!</em>b</div>");
    renderer.render(tree(false), container).unwrap();
    assert_eq!(html(&renderer, container), "<div>ab</div>");
}

fn html(renderer: &Renderer<MemoryDocument>, container: NodeId) -> String {
    renderer.document().inner_html(container)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_keyed_permutation_only_moves(keys in Just((0..12i64).collect::<Vec<_>>()).prop_shuffle()) {
        let (mut renderer, container) = setup();
        let original: Vec<i64> = (0..12).collect();
        renderer.render(list(&original), container).unwrap();
        let before = item_handles(&renderer, container);

        let log = renderer.render(list(&keys), container).unwrap();

        prop_assert_eq!(log.count(MutationKinds::all()), log.count(MutationKinds::MOVE));
        prop_assert_eq!(html(&renderer, container), list_html(&keys));
        let after = item_handles(&renderer, container);
        let expected: Vec<NodeId> = keys.iter().map(|&key| before[key as usize]).collect();
        prop_assert_eq!(after, expected);
    }

    #[test]
    fn prop_keyed_subset_matches_html(keys in proptest::sample::subsequence((0..10i64).collect::<Vec<_>>(), 0..=10).prop_shuffle()) {
        let (mut renderer, container) = setup();
        renderer.render(list(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]), container).unwrap();

        renderer.render(list(&keys), container).unwrap();
        prop_assert_eq!(html(&renderer, container), list_html(&keys));
        prop_assert_eq!(renderer.document().live_nodes(), 1 + 1 + 2 * keys.len());
    }
}
