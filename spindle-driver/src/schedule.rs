//! Sequential and parallel execution of registered generators.

use std::{
    panic,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use spindle_core::CompilationUnit;

use crate::{
    DriverOptions, GeneratorRunResult,
    barrier::{ExceptionBarrier, RunSettings},
    registry::RegisteredGenerator,
};

/// Execute every generator, slotting each result at its registration index.
///
/// Once the cancellation token is raised no further generator is started;
/// generators already running finish, and the slots of the ones never started
/// stay `None`.
pub(crate) fn execute_all(
    entries: &[RegisteredGenerator],
    compilation: &CompilationUnit,
    settings: RunSettings<'_>,
    options: &DriverOptions,
) -> Vec<Option<GeneratorRunResult>> {
    if options.parallel && entries.len() > 1 {
        execute_parallel(entries, compilation, settings, options.worker_count(entries.len()))
    } else {
        execute_sequential(entries, compilation, settings)
    }
}

fn execute_sequential(
    entries: &[RegisteredGenerator],
    compilation: &CompilationUnit,
    settings: RunSettings<'_>,
) -> Vec<Option<GeneratorRunResult>> {
    let mut slots = Vec::with_capacity(entries.len());
    for entry in entries {
        if settings.cancellation.is_cancelled() {
            slots.push(None);
            continue;
        }
        slots.push(Some(ExceptionBarrier::execute(entry, compilation, settings)));
    }
    slots
}

fn execute_parallel(
    entries: &[RegisteredGenerator],
    compilation: &CompilationUnit,
    settings: RunSettings<'_>,
    workers: usize,
) -> Vec<Option<GeneratorRunResult>> {
    let next = AtomicUsize::new(0);
    let mut slots: Vec<Option<GeneratorRunResult>> = vec![None; entries.len()];

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            handles.push(scope.spawn(|| worker(entries, compilation, settings, &next)));
        }
        for handle in handles {
            match handle.join() {
                Ok(finished) => {
                    for (index, result) in finished {
                        slots[index] = Some(result);
                    }
                }
                // Generator panics are caught by the barrier; anything
                // reaching here is a driver bug.
                Err(payload) => panic::resume_unwind(payload),
            }
        }
    });

    slots
}

fn worker(
    entries: &[RegisteredGenerator],
    compilation: &CompilationUnit,
    settings: RunSettings<'_>,
    next: &AtomicUsize,
) -> Vec<(usize, GeneratorRunResult)> {
    let mut finished = Vec::new();
    loop {
        if settings.cancellation.is_cancelled() {
            break;
        }
        let index = next.fetch_add(1, Ordering::Relaxed);
        let Some(entry) = entries.get(index) else {
            break;
        };
        finished.push((index, ExceptionBarrier::execute(entry, compilation, settings)));
    }
    finished
}
