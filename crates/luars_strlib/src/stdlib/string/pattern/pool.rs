// Per-thread reuse of capture tables so matching does not allocate.
// Nested use (a gsub callback calling gsub) finds the slot empty and
// falls back to a fresh table.

use std::cell::RefCell;

use tracing::trace;

use super::engine::CaptureTable;

thread_local! {
    static CACHED_TABLE: RefCell<Option<Box<CaptureTable>>> = const { RefCell::new(None) };
}

fn rent() -> Box<CaptureTable> {
    let cached = CACHED_TABLE
        .try_with(|slot| slot.borrow_mut().take())
        .ok()
        .flatten();
    match cached {
        Some(mut table) => {
            table.reset();
            table
        }
        None => {
            trace!("allocating capture table");
            Box::default()
        }
    }
}

fn give_back(mut table: Box<CaptureTable>) {
    table.reset();
    // During thread teardown the slot may be gone; the table is dropped.
    let _ = CACHED_TABLE.try_with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(table);
        }
    });
}

/// Run `f` with a clean capture table rented from this thread's pool.
pub fn with_capture_table<R>(f: impl FnOnce(&mut CaptureTable) -> R) -> R {
    let mut table = rent();
    let result = f(&mut table);
    give_back(table);
    result
}
