// Test module organization
pub mod test_gmatch;
pub mod test_gsub;

use crate::*;

/// Route `tracing` output to the test harness. Set `RUST_LOG=trace` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn vm() -> LuaVM {
    init_tracing();
    LuaVM::new(StrlibOption::default())
}

pub fn vm_for(version: LuaVersion) -> LuaVM {
    init_tracing();
    LuaVM::new(StrlibOption::with_version(version))
}

pub fn s(text: &str) -> LuaValue {
    LuaValue::from(text)
}

pub fn int(i: i64) -> LuaValue {
    LuaValue::integer(i)
}
