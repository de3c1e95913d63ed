//! A document review workflow: hooks gate submission, count review rounds
//! in the transport, and the finished machine is dehydrated to JSON.
//!
//! Run with: cargo run --example document_workflow

use phasic::{hook, StateMachineBuilder, StateSpec, TransitionSpec};
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let machine = StateMachineBuilder::new()
        .initial("DRAFT")
        .state("DRAFT", json!({ "editable": true }))
        .state("REVIEW", json!({ "editable": false }))
        .state("PUBLISHED", json!({ "editable": false }))
        .transition_spec(
            TransitionSpec::new("SUBMIT", "DRAFT", "REVIEW").before(hook(|ctx| async move {
                // Refuse submission until the draft has a title.
                ctx.transport.get("title").is_some()
            })),
        )
        .transition("REQUEST_CHANGES", "REVIEW", "DRAFT")
        .transition("APPROVE", "REVIEW", "PUBLISHED")
        .state_spec(StateSpec::new("ARCHIVED", json!({ "editable": false })))
        .transition("ARCHIVE", "PUBLISHED", "ARCHIVED")
        .after_each_transition(hook(|ctx| async move {
            let rounds = ctx
                .transport
                .get("rounds")
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            ctx.transport.insert("rounds", json!(rounds + 1));
            true
        }))
        .timeout(Duration::from_secs(2))
        .build()?;

    // The untitled draft is vetoed; the machine stays put.
    machine.transit_to("REVIEW").await?;
    println!("untitled submit left us in {}", machine.state());

    machine.transport().insert("title", json!("On Hooks"));
    machine.do_transition("SUBMIT").await?;
    println!("submitted, now in {}", machine.state());

    machine.do_transition("REQUEST_CHANGES").await?;
    machine.do_transition("SUBMIT").await?;
    machine.do_transition("APPROVE").await?;
    println!(
        "published after {} transitions",
        machine
            .transport()
            .get("rounds")
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
    );

    let snapshot = machine.dehydrated();
    println!("snapshot: {}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
