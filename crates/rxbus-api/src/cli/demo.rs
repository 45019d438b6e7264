//! `rxbus demo` walkthroughs.
//!
//! Each demo drives a fresh bus through one usage pattern and records what
//! every subscriber observed in a [`DemoReport`].

use std::time::Duration;

use anyhow::{ensure, Context, Result};
use comfy_table::{presets, Cell, ContentArrangement, Table};
use console::style;
use serde::Serialize;
use tokio::sync::mpsc;

use rxbus_core::{EventBus, Subscription};
use rxbus_types::Event;

use super::DemoCommand;
use crate::state::AppState;

/// How long the listener demo waits for its handler to catch up.
const LISTENER_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of one demo run.
#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub demo: &'static str,
    pub steps: Vec<String>,
    pub observations: Vec<Observation>,
    pub notes: Vec<String>,
}

/// What one subscriber saw.
#[derive(Debug, Serialize, PartialEq)]
pub struct Observation {
    pub subscriber: String,
    pub events: Vec<String>,
}

impl Observation {
    fn new(subscriber: impl Into<String>, events: Vec<String>) -> Self {
        Self {
            subscriber: subscriber.into(),
            events,
        }
    }
}

/// Sensor reading posted by the listener demo.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading(pub u32);

/// Run a demo against a fresh bus and print its report.
pub async fn run(state: &AppState, demo: DemoCommand, json: bool) -> Result<()> {
    let bus = state.new_bus();
    let report = match demo {
        DemoCommand::LateSubscriber => late_subscriber(&bus),
        DemoCommand::Sticky => sticky(&bus),
        DemoCommand::Overwrite => overwrite(&bus),
        DemoCommand::Fanout {
            events,
            producers,
            subscribers,
        } => fanout(&bus, events, producers, subscribers).await?,
        DemoCommand::Listener => listener(&bus).await?,
    };
    print_report(&report, json)
}

pub fn late_subscriber(bus: &EventBus) -> DemoReport {
    bus.post("a".to_string());
    let mut s1 = bus.subscribe::<String>();
    bus.post("b".to_string());
    let mut s2 = bus.subscribe::<String>();
    bus.post("c".to_string());

    DemoReport {
        demo: "late-subscriber",
        steps: steps(&[
            "post(\"a\")",
            "subscribe S1",
            "post(\"b\")",
            "subscribe S2",
            "post(\"c\")",
        ]),
        observations: vec![
            Observation::new("S1", drain(&mut s1)),
            Observation::new("S2", drain(&mut s2)),
        ],
        notes: vec!["plain subscriptions never replay earlier posts".to_string()],
    }
}

pub fn sticky(bus: &EventBus) -> DemoReport {
    bus.post_sticky("X".to_string());
    let mut sticky = bus.subscribe_sticky::<String>();
    let mut plain = bus.subscribe::<String>();

    let mut observations = vec![
        Observation::new("sticky (before post)", drain(&mut sticky)),
        Observation::new("plain (before post)", drain(&mut plain)),
    ];

    bus.post("Y".to_string());
    observations.push(Observation::new("sticky (after post)", drain(&mut sticky)));
    observations.push(Observation::new("plain (after post)", drain(&mut plain)));

    DemoReport {
        demo: "sticky",
        steps: steps(&[
            "postSticky(\"X\") with no subscribers",
            "subscribeSticky",
            "subscribe",
            "post(\"Y\")",
        ]),
        observations,
        notes: vec![format!(
            "sticky slot still holds {:?}",
            bus.get_sticky::<String>()
        )],
    }
}

pub fn overwrite(bus: &EventBus) -> DemoReport {
    let mut notes = Vec::new();

    bus.post_sticky("v1".to_string());
    bus.post_sticky("v2".to_string());
    notes.push(format!(
        "getSticky after two posts: {:?}",
        bus.get_sticky::<String>()
    ));

    let mut late = bus.subscribe_sticky::<String>();
    let late_seen = drain(&mut late);

    notes.push(format!("removeSticky: {:?}", bus.remove_sticky::<String>()));
    notes.push(format!(
        "getSticky after remove: {:?}",
        bus.get_sticky::<String>()
    ));

    bus.post_sticky("v3".to_string());
    bus.post_sticky(Reading(1));
    bus.clear_sticky();
    notes.push(format!(
        "after clearSticky: String={:?}, Reading={:?}",
        bus.get_sticky::<String>(),
        bus.get_sticky::<Reading>()
    ));

    match bus.post_erased(None) {
        Ok(_) => notes.push("absent event was accepted".to_string()),
        Err(e) => notes.push(format!("post(absent): {e}")),
    }

    DemoReport {
        demo: "overwrite",
        steps: steps(&[
            "postSticky(\"v1\")",
            "postSticky(\"v2\")",
            "subscribeSticky",
            "removeSticky",
            "postSticky(\"v3\"), postSticky(Reading(1))",
            "clearSticky",
            "post(absent)",
        ]),
        observations: vec![Observation::new("late sticky subscriber", late_seen)],
        notes,
    }
}

pub async fn fanout(
    bus: &EventBus,
    events: u32,
    producers: u8,
    subscribers: usize,
) -> Result<DemoReport> {
    ensure!(producers > 0, "at least one producer is required");

    let mut subs: Vec<Subscription<(u8, u32)>> =
        (0..subscribers).map(|_| bus.subscribe()).collect();

    let mut handles = Vec::with_capacity(producers as usize);
    for producer in 0..producers {
        let bus = bus.clone();
        handles.push(tokio::spawn(async move {
            for seq in 0..events {
                bus.post((producer, seq));
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.context("producer task failed")?;
    }

    let seen: Vec<Vec<(u8, u32)>> = subs.iter_mut().map(|sub| drain(sub)).collect();
    let total = u64::from(events) * u64::from(producers);
    let same_order = seen.windows(2).all(|pair| pair[0] == pair[1]);

    let observations = seen
        .iter()
        .enumerate()
        .map(|(i, events)| {
            let summary = vec![
                format!("{} of {total} events", events.len()),
                format!("first: {:?}", events.first()),
                format!("last: {:?}", events.last()),
            ];
            Observation::new(format!("S{}", i + 1), summary)
        })
        .collect();

    let mut notes = vec![format!("all subscribers saw one order: {same_order}")];
    if total > bus.config().effective_capacity() as u64 {
        notes.push(format!(
            "{total} events exceed channel_capacity {}; slow subscribers skip the oldest",
            bus.config().effective_capacity()
        ));
    }

    Ok(DemoReport {
        demo: "fanout",
        steps: vec![
            format!("subscribe {subscribers} subscribers"),
            format!("{producers} producers post {events} events each concurrently"),
        ],
        observations,
        notes,
    })
}

pub async fn listener(bus: &EventBus) -> Result<DemoReport> {
    let (processed_tx, mut processed_rx) = mpsc::unbounded_channel();

    let handle = bus.listen(move |reading: Reading| {
        let outcome = if reading.0 % 2 == 1 {
            Err(format!("odd reading {}", reading.0))
        } else {
            Ok(())
        };
        let _ = processed_tx.send((reading.0, outcome.is_ok()));
        outcome
    });

    for value in 1..=6 {
        bus.post(Reading(value));
    }

    let mut handled = Vec::new();
    let mut failed = Vec::new();
    for _ in 0..6 {
        let (value, ok) = tokio::time::timeout(LISTENER_TIMEOUT, processed_rx.recv())
            .await
            .context("listener did not process events in time")?
            .context("listener stopped unexpectedly")?;
        if ok {
            handled.push(value.to_string());
        } else {
            failed.push(value.to_string());
        }
    }

    handle.dispose();
    let disposed = handle.is_disposed();
    handle.join().await;
    let after_dispose = bus.post(Reading(7));

    Ok(DemoReport {
        demo: "listener",
        steps: steps(&[
            "listen(Reading) with a handler that fails on odd values",
            "post Reading(1..=6)",
            "dispose",
            "post Reading(7)",
        ]),
        observations: vec![
            Observation::new("handled", handled),
            Observation::new("handler failed", failed),
        ],
        notes: vec![
            format!("disposed: {disposed}"),
            format!("Reading(7) delivered to {after_dispose} subscribers"),
        ],
    })
}

fn drain<T: Event>(sub: &mut Subscription<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Some(event) = sub.try_recv() {
        out.push(event);
    }
    out
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn print_report(report: &DemoReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} demo {}",
        style("⚡").bold(),
        style(report.demo).cyan().bold()
    );
    println!();
    println!("  {}", style("── Steps ──").dim());
    for (i, step) in report.steps.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
    println!();

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Subscriber"), Cell::new("Observed")]);
    for observation in &report.observations {
        let observed = if observation.events.is_empty() {
            "(nothing)".to_string()
        } else {
            observation.events.join(", ")
        };
        table.add_row(vec![Cell::new(&observation.subscriber), Cell::new(observed)]);
    }
    println!("{table}");

    if !report.notes.is_empty() {
        println!();
        for note in &report.notes {
            println!("  {} {note}", style("•").dim());
        }
    }
    println!();
    Ok(())
}
