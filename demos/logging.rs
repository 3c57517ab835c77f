//! Example demonstrating registry logging
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development), including per-resolve events:
//! ```bash
//! RUST_LOG=service_registry=trace cargo run --example logging --features logging-pretty
//! ```

use service_registry::{Registry, SyncRegistry};
use std::sync::Arc;

#[allow(dead_code)]
struct Database {
    url: String,
}

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        1_700_000_000
    }
}

fn main() {
    // JSON if logging-json is enabled, pretty otherwise
    service_registry::logging::init();

    println!("=== Service Registry Logging Demo ===\n");

    // logs: "Creating new service registry"
    let registry = Registry::new();

    // logs: "Registering service" kind="instance"
    registry.register_instance(Arc::new(Database {
        url: "postgres://localhost/mydb".into(),
    }));
    registry.register_instance::<dyn Clock>(Arc::new(FixedClock));

    // logs: "Registering service" kind="singleton_factory"
    registry.register_singleton_factory(|| {
        println!("  [App] Request counter being created...");
        Arc::new(String::from("counter"))
    });

    // logs at trace: "Service resolved"
    let _db = registry.resolve::<Database>().unwrap();
    println!("  [App] clock reads {}", registry.resolve::<dyn Clock>().unwrap().now());

    // logs: "Promoting singleton factory to instance" on the first call only
    let _first = registry.resolve::<String>().unwrap();
    let _second = registry.resolve::<String>().unwrap();

    // logs at trace: "Service not registered"
    assert!(registry.resolve::<i32>().is_none());

    // logs: "Registering service" with replaced="instance"
    registry.register_factory(|| {
        Arc::new(Database {
            url: "postgres://replica/mydb".into(),
        })
    });

    // logs: "Clearing service"
    registry.clear::<Database>();

    // A registry shared between threads
    let shared = Arc::new(SyncRegistry::default());
    shared.register_instance(Arc::new(7u32));
    let worker = {
        let shared = Arc::clone(&shared);
        std::thread::spawn(move || *shared.resolve::<u32>().unwrap())
    };
    println!("  [App] worker resolved {}", worker.join().unwrap());

    // logs: "Clearing all services"
    registry.clear_all();
    shared.clear_all();

    println!("\n=== Demo Complete ===");
    println!("Tip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
