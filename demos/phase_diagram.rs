//! Walks water through its phase diagram, printing what the machine sees
//! at each step.
//!
//! Run with: cargo run --example phase_diagram

use phasic::{observer, Config, StateMachine, StateSpec, TransitionSpec, TransitionsSpec};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let machine = StateMachine::new(
        "SOLID",
        vec![
            StateSpec::new("SOLID", json!({ "temperature": -100 })),
            StateSpec::new("LIQUID", json!({ "temperature": 50 })),
            StateSpec::new("GAS", json!({ "temperature": 200 })),
        ],
        TransitionsSpec::new(vec![
            TransitionSpec::new("MELT", "SOLID", "LIQUID"),
            TransitionSpec::new("VAPORIZE", "LIQUID", "GAS"),
            TransitionSpec::new("CONDENSE", "GAS", "LIQUID"),
            TransitionSpec::new("FREEZE", "LIQUID", "SOLID"),
        ])
        .after(observer(|ctx| async move {
            println!("  {} took us from {} to {}", ctx.transition, ctx.from, ctx.to);
        })),
        Config::default(),
    )?;

    for step in ["LIQUID", "GAS"] {
        println!("at {} (data {}):", machine.state(), machine.data());
        println!("  can reach: {:?}", machine.states());
        println!("  via: {:?}", machine.transitions());
        machine.transit_to(step).await?;
    }

    println!("at {} (data {})", machine.state(), machine.data());

    // Illegal moves fail with a coded error and leave the machine intact.
    if let Err(error) = machine.do_transition("MELT").await {
        println!("MELT from GAS refused: {} [{}]", error, error.code());
    }
    println!("still at {}", machine.state());

    Ok(())
}
