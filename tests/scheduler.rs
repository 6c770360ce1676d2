//! Update batching, window handling and flush ordering.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_vdom::*;

fn setup() -> (Renderer<MemoryDocument>, NodeId) {
    let mut document = MemoryDocument::new();
    let container = document.create_container().unwrap();
    (Renderer::new(document), container)
}

/// Shared tracker handed to components through an opaque prop.
#[derive(Default)]
struct Tracker {
    updaters: RefCell<Vec<Updater>>,
    renders: Cell<usize>,
    did_updates: Cell<usize>,
}

fn tracker_of(props: &Props) -> Rc<Tracker> {
    props
        .get("tracker")
        .and_then(|value| value.downcast_ref::<Rc<Tracker>>())
        .cloned()
        .unwrap_or_default()
}

struct Tally {
    tracker: Rc<Tracker>,
}

impl ComponentDef for Tally {
    fn create(props: &Props, updater: &Updater) -> Self {
        let tracker = tracker_of(props);
        tracker.updaters.borrow_mut().push(updater.clone());
        Tally { tracker }
    }

    fn initial_state(&self, _props: &Props) -> State {
        State::new().with("n", 0)
    }
}

impl Component for Tally {
    fn render(&self, cx: &RenderCx<'_>) -> Node {
        self.tracker.renders.set(self.tracker.renders.get() + 1);
        let state = cx.state();
        Node::element("p")
            .text(format!(
                "{} {}",
                state.int("n").unwrap_or_default(),
                state.str("tag").unwrap_or("-")
            ))
            .into()
    }

    fn did_update(&mut self, _prev_props: &Props, _prev_state: &State, _cx: &HookCx<'_>) {
        self.tracker.did_updates.set(self.tracker.did_updates.get() + 1);
    }
}

fn tally(tracker: &Rc<Tracker>) -> Option<Node> {
    Some(Node::component::<Tally>(Props::new().with("tracker", Value::opaque(tracker.clone()))).into())
}

#[test]
fn test_three_set_states_one_render() {
    let (mut renderer, container) = setup();
    let ticks = Rc::new(Cell::new(0));
    let counter = ticks.clone();
    renderer.set_tick_source(move || counter.set(counter.get() + 1));

    let tracker = Rc::new(Tracker::default());
    renderer.render(tally(&tracker), container).unwrap();
    assert_eq!(tracker.renders.get(), 1);

    let updater = tracker.updaters.borrow()[0].clone();
    updater.set_state(State::new().with("n", 1));
    updater.set_state(State::new().with("tag", "x"));
    updater.update_state(|state| State::new().with("n", state.int("n").unwrap_or(0) + 1));

    // Deferred: nothing rendered yet, one tick requested
    assert_eq!(tracker.renders.get(), 1);
    assert_eq!(ticks.get(), 1);
    assert_eq!(renderer.frame_signal().get(), 1);

    let report = renderer.flush().unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(tracker.renders.get(), 2);
    assert_eq!(tracker.did_updates.get(), 1);
    assert_eq!(renderer.document().inner_html(container), "<p>2 x</p>");
    assert!(!renderer.has_pending_updates());
}

#[test]
fn test_stale_updates_discarded() {
    let (mut renderer, container) = setup();
    let tracker = Rc::new(Tracker::default());
    renderer.render(tally(&tracker), container).unwrap();

    let updater = tracker.updaters.borrow()[0].clone();
    updater.set_state(State::new().with("n", 5));
    renderer.render(None, container).unwrap();

    let report = renderer.flush().unwrap();
    assert_eq!(report.updated, 0);
    assert_eq!(report.discarded, 1);
    assert!(report.mutations.is_empty());
    assert_eq!(tracker.renders.get(), 1);
}

#[test]
fn test_window_per_flush() {
    let (mut renderer, container) = setup();
    let tracker = Rc::new(Tracker::default());
    renderer.render(tally(&tracker), container).unwrap();
    let updater = tracker.updaters.borrow()[0].clone();

    updater.set_state(State::new().with("n", 1));
    renderer.flush().unwrap();
    updater.set_state(State::new().with("n", 2));
    renderer.flush().unwrap();

    assert_eq!(renderer.ticks_requested(), 2);
    assert_eq!(renderer.document().inner_html(container), "<p>2 -</p>");

    // Empty flush is a no-op
    let report = renderer.flush().unwrap();
    assert_eq!(report, FlushReport::default());
}

// =============================================================================
// Nested updates
// =============================================================================

struct Outer {
    tracker: Rc<Tracker>,
}

impl ComponentDef for Outer {
    fn create(props: &Props, updater: &Updater) -> Self {
        let tracker = tracker_of(props);
        tracker.updaters.borrow_mut().push(updater.clone());
        Outer { tracker }
    }
}

impl Component for Outer {
    fn render(&self, cx: &RenderCx<'_>) -> Node {
        Node::element("section")
            .attr("data-round", cx.state().int("round").unwrap_or(0))
            .child(Node::component::<Tally>(
                Props::new().with("tracker", Value::opaque(self.tracker.clone())),
            ))
            .into()
    }
}

#[test]
fn test_ancestor_consumes_child_update() {
    let (mut renderer, container) = setup();
    let tracker = Rc::new(Tracker::default());

    let tree = Node::component::<Outer>(Props::new().with("tracker", Value::opaque(tracker.clone())));
    renderer.render(Some(tree.into()), container).unwrap();

    // Outer hands its tracker to Tally: updaters are [outer, tally]
    let updaters = tracker.updaters.borrow().clone();
    assert_eq!(updaters.len(), 2);
    assert_eq!(tracker.renders.get(), 1);

    // Parent first: its re-render carries the child's staged state
    updaters[0].set_state(State::new().with("round", 1));
    updaters[1].set_state(State::new().with("n", 7));

    let report = renderer.flush().unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(tracker.renders.get(), 2);
    assert_eq!(
        renderer.document().inner_html(container),
        "<section data-round=\"1\"><p>7 -</p></section>"
    );
}

#[test]
fn test_child_first_renders_each_once() {
    let (mut renderer, container) = setup();
    let tracker = Rc::new(Tracker::default());

    let tree = Node::component::<Outer>(Props::new().with("tracker", Value::opaque(tracker.clone())));
    renderer.render(Some(tree.into()), container).unwrap();
    let updaters = tracker.updaters.borrow().clone();

    updaters[1].set_state(State::new().with("n", 3));
    updaters[0].set_state(State::new().with("round", 2));

    let report = renderer.flush().unwrap();
    assert_eq!(report.updated, 2);
    // Once for its own update, once more under the parent
    assert_eq!(tracker.renders.get(), 3);
    assert_eq!(
        renderer.document().inner_html(container),
        "<section data-round=\"2\"><p>3 -</p></section>"
    );
}

// =============================================================================
// Updates issued during a flush
// =============================================================================

/// Counts up to `limit` by scheduling from `did_update`.
struct Chain {
    updater: Updater,
}

impl ComponentDef for Chain {
    fn create(_props: &Props, updater: &Updater) -> Self {
        Chain {
            updater: updater.clone(),
        }
    }
}

impl Component for Chain {
    fn render(&self, cx: &RenderCx<'_>) -> Node {
        Node::text(cx.state().int("n").unwrap_or(0).to_string())
    }

    fn did_mount(&mut self, _cx: &HookCx<'_>) {
        self.updater.set_state(State::new().with("n", 1));
    }

    fn did_update(&mut self, _prev_props: &Props, _prev_state: &State, cx: &HookCx<'_>) {
        let n = cx.state().int("n").unwrap_or(0);
        let limit = cx.props().int("limit").unwrap_or(i64::MAX);
        if n < limit {
            self.updater.set_state(State::new().with("n", n + 1));
        }
    }
}

#[test]
fn test_updates_during_flush_go_to_next_window() {
    let (mut renderer, container) = setup();
    renderer
        .render(Some(Node::component::<Chain>(Props::new().with("limit", 3)).into()), container)
        .unwrap();
    assert_eq!(renderer.document().inner_html(container), "0");

    let report = renderer.flush().unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(renderer.document().inner_html(container), "1");
    assert!(renderer.has_pending_updates());

    let report = renderer.run_until_idle().unwrap();
    assert_eq!(report.updated, 2);
    assert_eq!(renderer.document().inner_html(container), "3");
}

#[test]
fn test_run_until_idle_gives_up() {
    let mut document = MemoryDocument::new();
    let container = document.create_container().unwrap();
    let mut renderer = Renderer::with_config(document, RendererConfig::new().idle_tick_limit(5));

    renderer
        .render(Some(Node::component::<Chain>(Props::new()).into()), container)
        .unwrap();

    let err = renderer.run_until_idle().unwrap_err();
    assert!(matches!(err, RenderError::Unsettled { ticks: 5 }));
    assert_eq!(renderer.document().inner_html(container), "5");
}
