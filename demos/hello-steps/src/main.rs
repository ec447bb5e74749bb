//! hello-steps
//!
//! Wires config, tracing and all four combinators together.
//!
//! ```text
//! LIGATURE_CONFIG=demos/hello-steps/ligature.toml cargo run -p hello-steps
//! ```

use anyhow::Result;
use ligature::config::CONFIG_ENV;
use ligature::prelude::*;
use ligature::steps::nodes::math::{MathNode, MathOperation};
use ligature::{LigatureConfig, observe};
use std::time::Duration;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> Result<()> {
    let config = LigatureConfig::load()?;
    if std::env::var_os(CONFIG_ENV).is_some() {
        observe::init_tracing(&config.telemetry)?;
    } else {
        observe::init_stdout_tracing();
    }
    let trace = config.telemetry.trace_steps;

    // Chain: (x * 3) + 1
    let triple = MathNode::new(MathOperation::Mul, 3).spec();
    let plus_one = MathNode::new(MathOperation::Add, 1).spec();
    let mut chain = Chain::new(maybe_traced(trace, steps::identity()));
    chain
        .append(maybe_traced(trace, triple))
        .append(maybe_traced(trace, plus_one));
    let value = chain.invoke(vec![json!(4)])?;
    tracing::info!(%value, "chain finished");

    // Dispatcher: area by shape
    let mut shapes = Dispatcher::new(steps::switch_on("shape"));
    shapes
        .add_option("square", area("square", |side| side * side))
        .add_option("circle", area("circle", |r| std::f64::consts::PI * r * r));
    let square = json!({"shape": "square", "size": 3});
    let circle = json!({"shape": "circle", "size": 1});
    for shape in [square, circle] {
        let value = shapes.invoke(vec![shape])?;
        tracing::info!(%value, "dispatched");
    }
    if let Err(err) = shapes.invoke(vec![json!({"shape": "hexagon", "size": 2})]) {
        tracing::warn!(error = %err, "dispatch rejected");
    }

    // Loop: count to five, one step at a time
    let below_five = steps::less_than(5).with_preset(vec![json!(0)]);
    let counting = Loop::new(below_five, steps::counter(1));
    let state = counting.invoke(vec![json!(0)])?;
    tracing::info!(?state, "loop finished");

    // Join: three sleepers, gathered in registration order
    let join = Join::new([
        sleeper(30).with_preset(vec![json!("tortoise")]),
        sleeper(10).with_preset(vec![json!("hare")]),
        sleeper(20).with_preset(vec![json!("fox")]),
    ])?;
    let (tx, rx) = oneshot::channel();
    let finish_line = Continuation::new("finish-line", move |values| {
        let _ = tx.send(values);
        Ok(())
    });
    join.invoke(finish_line)?;
    let arrivals = rx.await?;
    tracing::info!(?arrivals, "join finished");

    // The whole thing, nested: a loop whose body waits, then counts
    let slow_count = Chain::from_specs([sleeper(1), steps::counter(2)])?;
    let body = slow_count.to_spec("slow-count");
    let nested = Loop::new(steps::less_than(6).with_preset(vec![json!(0)]), body);
    let (tx, rx) = oneshot::channel();
    let done = Continuation::new("nested-done", move |values| {
        let _ = tx.send(values);
        Ok(())
    });
    nested.invoke_with(vec![json!(0)], done)?;
    tracing::info!(result = ?rx.await?, "nested loop finished");

    let schematic = nested.schematic("nested");
    println!("{}", serde_json::to_string_pretty(&schematic)?);

    Ok(())
}

/// Resumes with its arguments from a spawned task after `ms` milliseconds.
fn sleeper(ms: u64) -> StepSpec {
    StepSpec::continuation(format!("sleep{ms}ms"), move |args, next| {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            if let Err(err) = next.resume(args) {
                tracing::error!(continuation = %next.label(), error = %err, "resume failed");
            }
        });
        Ok(())
    })
}

fn maybe_traced(enabled: bool, spec: StepSpec) -> StepSpec {
    if enabled {
        let name = spec.label().to_string();
        Traced::new(spec, &name).into_spec()
    } else {
        spec
    }
}

/// Option step: reads `size` from the routed shape and applies `formula`.
fn area(label: &'static str, formula: fn(f64) -> f64) -> StepSpec {
    StepSpec::direct(label, move |args| {
        let size = args
            .first()
            .and_then(|shape| shape.get("size"))
            .and_then(Value::as_f64)
            .ok_or_else(|| StepError::custom(format!("{label} needs a size")))?;
        Ok(json!(formula(size)))
    })
}
