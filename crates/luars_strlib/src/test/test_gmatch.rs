// Tests for string.gmatch
use super::*;

/// Drain a gmatch iterator, collecting the values of each step.
fn collect(vm: &LuaVM, args: Vec<LuaValue>) -> Vec<MultiValue> {
    let r = vm.call("string.gmatch", args).unwrap();
    let iter = r[0].as_function().unwrap().clone();
    let mut steps = Vec::new();
    loop {
        let values = vm.call_function(&iter, Vec::new()).unwrap();
        if values.is_empty() {
            break;
        }
        steps.push(values);
    }
    steps
}

#[test]
fn test_gmatch_words() {
    let vm = vm();
    let steps = collect(&vm, vec![s("one two  three"), s("%a+")]);
    assert_eq!(steps, vec![vec![s("one")], vec![s("two")], vec![s("three")]]);
}

#[test]
fn test_gmatch_captures() {
    let vm = vm();
    let steps = collect(&vm, vec![s("a=1, b=2"), s("(%w+)=(%w+)")]);
    assert_eq!(steps, vec![vec![s("a"), s("1")], vec![s("b"), s("2")]]);
}

#[test]
fn test_gmatch_caret_is_literal() {
    let vm = vm();
    let steps = collect(&vm, vec![s("a^b^c"), s("^%a")]);
    assert_eq!(steps, vec![vec![s("^b")], vec![s("^c")]]);
}

#[test]
fn test_gmatch_empty_matches_progress() {
    let vm = vm();
    let steps = collect(&vm, vec![s("ab"), s("()")]);
    assert_eq!(steps, vec![vec![int(1)], vec![int(2)], vec![int(3)]]);
}

#[test]
fn test_gmatch_exhausted_iterator_stays_done() {
    let vm = vm();
    let r = vm.call("string.gmatch", ["x", "x"]).unwrap();
    let iter = r[0].as_function().unwrap().clone();
    assert_eq!(vm.call_function(&iter, Vec::new()).unwrap(), vec![s("x")]);
    assert!(vm.call_function(&iter, Vec::new()).unwrap().is_empty());
    assert!(vm.call_function(&iter, Vec::new()).unwrap().is_empty());
}

#[test]
fn test_gmatch_init_by_version() {
    let vm = vm();
    let steps = collect(&vm, vec![s("aa bb cc"), s("%a+"), int(4)]);
    assert_eq!(steps, vec![vec![s("bb")], vec![s("cc")]]);

    // Before 5.4 the third argument is ignored.
    let vm = vm_for(LuaVersion::Lua53);
    let steps = collect(&vm, vec![s("aa bb cc"), s("%a+"), int(4)]);
    assert_eq!(steps.len(), 3);
}

#[test]
fn test_gmatch_malformed_pattern_errors_on_call() {
    let vm = vm();
    let r = vm.call("string.gmatch", ["abc", "[a"]).unwrap();
    let iter = r[0].as_function().unwrap().clone();
    let err = vm.call_function(&iter, Vec::new()).unwrap_err();
    assert_eq!(err.message(), "malformed pattern (missing ']')");
}
