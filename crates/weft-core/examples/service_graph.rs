//! # service_graph — wiring a small application
//!
//! Registers a handful of components, previews the generation plan, wires
//! the container, and calls into the result.
//!
//! Named values come from the JSON file named by `WEFT_VALUES_FILE`, or
//! from built-in defaults.
//!
//! ```text
//! RUST_LOG=debug cargo run -p weft-core --example service_graph
//! ```

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use weft_common::config::WeftConfig;
use weft_core::container::Container;
use weft_core::definition::{Component, Definition, DefinitionBuilder, ParamSpec};

trait Notifier: Send + Sync {
    fn notify(&self, message: &str) -> String;
}

struct Clock;

impl Clock {
    const fn tick(&self) -> u64 {
        1_700_000_000
    }
}

struct EmailNotifier {
    sender: String,
}

impl Notifier for EmailNotifier {
    fn notify(&self, message: &str) -> String {
        format!("mail from {}: {message}", self.sender)
    }
}

struct Billing {
    clock: Arc<Clock>,
    notifier: Arc<dyn Notifier>,
    currency: String,
}

impl Billing {
    fn charge(&self, cents: i64) -> String {
        let note = format!("charged {cents} {} at {}", self.currency, self.clock.tick());
        self.notifier.notify(&note)
    }
}

impl Component for Clock {
    fn definition() -> DefinitionBuilder<Self> {
        Definition::of::<Self>().constructor(vec![], |_| Ok(Self))
    }
}

impl Component for EmailNotifier {
    fn definition() -> DefinitionBuilder<Self> {
        Definition::of::<Self>()
            .constructor(
                vec![ParamSpec::named::<String>("sender", "mail.sender")],
                |args| {
                    Ok(Self {
                        sender: args.take_cloned()?,
                    })
                },
            )
            .provides::<dyn Notifier>(|email| email)
    }
}

impl Component for Billing {
    fn definition() -> DefinitionBuilder<Self> {
        Definition::of::<Self>().constructor(
            vec![
                ParamSpec::of_type::<Clock>("clock"),
                ParamSpec::capability::<dyn Notifier>("notifier"),
                ParamSpec::named::<String>("currency", "billing.currency"),
            ],
            |args| {
                Ok(Self {
                    clock: args.take()?,
                    notifier: args.take_capability()?,
                    currency: args.take_cloned()?,
                })
            },
        )
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = WeftConfig {
        values_file: std::env::var_os(weft_common::constants::VALUES_FILE_ENV).map(Into::into),
        ..WeftConfig::default()
    };
    let mut container = Container::from_config(&config)?;
    if config.values_file.is_none() {
        container.register_values_from_json(&serde_json::json!({
            "mail": { "sender": "billing@example.com" },
            "billing": { "currency": "EUR" },
        }))?;
    }

    container.register::<Billing>()?;
    container.register::<EmailNotifier>()?;
    container.register::<Clock>()?;

    println!("Wiring plan");
    println!("{}", container.plan()?);

    container.wire()?;

    let billing = container
        .resolve::<Billing>()
        .ok_or_else(|| anyhow::anyhow!("billing was not built"))?;
    println!("{}", billing.charge(1250));

    Ok(())
}
