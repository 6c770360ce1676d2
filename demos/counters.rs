//! Counters Example - Stateful components, events and batched flushes
//!
//! Renders a keyed list of counters into a MemoryDocument, clicks buttons,
//! and flushes whenever the frame signal reports a new update window.
//!
//! Run with: RUST_LOG=spark_vdom=debug cargo run --example counters

use std::cell::Cell;
use std::rc::Rc;

use spark_signals::effect;
use spark_vdom::*;
use tracing_subscriber::EnvFilter;

// =============================================================================
// Components
// =============================================================================

struct Counter {
    increment: Handler,
    reset: Handler,
}

impl ComponentDef for Counter {
    fn create(_props: &Props, updater: &Updater) -> Self {
        let inc = updater.clone();
        let reset = updater.clone();
        Counter {
            increment: Handler::new(move |_| {
                inc.update_state(|state| State::new().with("count", state.int("count").unwrap_or(0) + 1));
            }),
            reset: Handler::new(move |_| reset.set_state(State::new().with("count", 0))),
        }
    }

    fn initial_state(&self, props: &Props) -> State {
        State::new().with("count", props.int("start").unwrap_or(0))
    }
}

impl Component for Counter {
    fn render(&self, cx: &RenderCx<'_>) -> Node {
        let count = cx.state().int("count").unwrap_or(0);
        Node::element("li")
            .attr("class", if count > 2 { "counter hot" } else { "counter" })
            .text(format!("{}: {count} ", cx.props().str("label").unwrap_or("?")))
            .child(Node::element("button").attr("onclick", self.increment.clone()).text("+"))
            .child(
                Node::element("button")
                    .attr("onclick", self.reset.clone())
                    .attr("disabled", count == 0)
                    .text("reset"),
            )
            .into()
    }

    fn did_update(&mut self, _prev_props: &Props, prev_state: &State, cx: &HookCx<'_>) {
        tracing::info!(
            label = cx.props().str("label").unwrap_or("?"),
            from = prev_state.int("count").unwrap_or(0),
            to = cx.state().int("count").unwrap_or(0),
            "counter changed"
        );
    }
}

fn app(labels: &[&str]) -> Node {
    Node::element("ul")
        .children(labels.iter().enumerate().map(|(index, label)| {
            Node::component::<Counter>(Props::new().with("label", *label).with("start", index as i64))
                .key(*label)
        }))
        .into()
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<(), RenderError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== spark-vdom Counters Example ===\n");

    let mut document = MemoryDocument::new();
    let container = document.create_container()?;
    let mut renderer = Renderer::with_config(document, RendererConfig::new().trace_mutations(true));

    // The frame signal doubles as the tick source
    let tick_pending = Rc::new(Cell::new(false));
    let frame = renderer.frame_signal();
    let pending = tick_pending.clone();
    let stop = effect(move || {
        if frame.get() > 0 {
            pending.set(true);
        }
    });

    let log = renderer.render(Some(app(&["apples", "pears", "plums"])), container)?;
    println!("Initial render: {} mutations", log.len());
    println!("  {}\n", renderer.document().inner_html(container));

    // Click "+" on every counter twice
    for _ in 0..2 {
        for button in renderer.document().find_by_tag(container, "button") {
            if renderer.document().text_content(button) == "+" {
                renderer.document().dispatch(button, "click")?;
            }
        }
    }

    if tick_pending.replace(false) {
        let report = renderer.flush()?;
        println!(
            "Flush: {} updated, {} document mutations",
            report.updated,
            report.mutations.count(MutationKinds::DOCUMENT)
        );
        println!("  {}\n", renderer.document().inner_html(container));
    }

    // Reorder and drop one: keyed counters keep their state
    let log = renderer.render(Some(app(&["plums", "apples"])), container)?;
    println!(
        "Reorder: {} moves, {} removals",
        log.count(MutationKinds::MOVE),
        log.count(MutationKinds::REMOVE)
    );
    println!("  {}\n", renderer.document().inner_html(container));

    renderer.render(None, container)?;
    println!("Unmounted: {} live nodes", renderer.document().live_nodes());

    stop();
    Ok(())
}
