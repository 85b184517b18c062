//! Fuzz target for key management sequences
//!
//! # Strategy
//!
//! - Arbitrary sequences of model operations (install, delete, default
//!   change, traffic, MMIE) applied to an engine and to the model
//!
//! # Invariants
//!
//! - Engine and model agree on every result
//! - The standard invariants hold after every operation

#![no_main]

use libfuzzer_sys::fuzz_target;
use wlancrypt_harness::{EngineDriver, InvariantRegistry, ModelEngine, Operation};

fuzz_target!(|ops: Vec<Operation>| {
    let Ok(driver) = EngineDriver::new() else {
        return;
    };
    let mut model = ModelEngine::new();
    let registry = InvariantRegistry::standard();

    for (i, op) in ops.iter().take(64).enumerate() {
        assert_eq!(model.apply(op), driver.apply(op), "divergence at {i}: {op:?}");
        if let Ok(snapshot) = driver.snapshot() {
            registry.assert_all(&snapshot, &format!("after {op:?}"));
        }
    }
});
