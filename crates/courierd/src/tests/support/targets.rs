//! Targets with deliberately awkward methods.

use std::cell::Cell;
use std::convert::Infallible;

use crate::dispatch::{Dispatcher, MethodTable};

/// Target whose methods panic or block on request.
#[derive(Debug, Default)]
pub struct FaultyService {
    calls: Cell<u32>,
}

impl FaultyService {
    fn touch(&self) -> u32 {
        let calls = self.calls.get() + 1;
        self.calls.set(calls);
        calls
    }
}

/// Dispatcher exposing `explode()`, `tally()`, `nap(int)` and the internal
/// `maintenance()`.
pub fn faulty_dispatcher() -> Dispatcher<FaultyService> {
    let methods = MethodTable::builder()
        .method0("explode", |_: &FaultyService| -> Result<(), Infallible> {
            panic!("faulty service exploded")
        })
        .method0("tally", |service: &FaultyService| {
            Ok::<_, Infallible>(service.touch())
        })
        .method1("nap", |service: &FaultyService, millis: u64| {
            std::thread::sleep(std::time::Duration::from_millis(millis));
            Ok::<_, Infallible>(service.touch())
        })
        .internal0("maintenance", |_: &FaultyService| Ok::<_, Infallible>(()))
        .build()
        .expect("faulty method table");
    Dispatcher::new(FaultyService::default(), methods)
}
