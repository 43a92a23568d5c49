// Tests for string.gsub
use super::*;

fn gsub(vm: &LuaVM, args: Vec<LuaValue>) -> (LuaValue, LuaValue) {
    let mut r = vm.call("string.gsub", args).unwrap().into_iter();
    (r.next().unwrap(), r.next().unwrap())
}

#[test]
fn test_gsub_template() {
    let vm = vm();
    assert_eq!(gsub(&vm, vec![s("hello world"), s("o"), s("0")]), (s("hell0 w0rld"), int(2)));
    assert_eq!(gsub(&vm, vec![s("abc"), s("%w"), s("%0%0")]), (s("aabbcc"), int(3)));
    assert_eq!(
        gsub(&vm, vec![s("hello world"), s("(%w+) (%w+)"), s("%2 %1")]),
        (s("world hello"), int(1))
    );
    assert_eq!(gsub(&vm, vec![s("50"), s("%d+"), s("%1%%")]), (s("50%"), int(1)));
}

#[test]
fn test_gsub_limit() {
    let vm = vm();
    let r = gsub(&vm, vec![s("hello"), s("l"), s("L"), int(1)]);
    assert_eq!(r, (s("heLlo"), int(1)));
    let r = gsub(&vm, vec![s("hello"), s("l"), s("L"), int(0)]);
    assert_eq!(r, (s("hello"), int(0)));
    let r = gsub(&vm, vec![s("hello"), s("l"), s("L"), int(-3)]);
    assert_eq!(r, (s("hello"), int(0)));
}

#[test]
fn test_gsub_empty_matches() {
    let vm = vm();
    assert_eq!(gsub(&vm, vec![s("abc"), s(""), s("-")]), (s("-a-b-c-"), int(4)));
    assert_eq!(gsub(&vm, vec![s(""), s(""), s("x")]), (s("x"), int(1)));
    assert_eq!(gsub(&vm, vec![s("abc"), s("x*"), s("-")]), (s("-a-b-c-"), int(4)));
}

#[test]
fn test_gsub_anchor() {
    let vm = vm();
    assert_eq!(gsub(&vm, vec![s("aaa"), s("^a"), s("b")]), (s("baa"), int(1)));
    assert_eq!(gsub(&vm, vec![s("xaa"), s("^a"), s("b")]), (s("xaa"), int(0)));
}

#[test]
fn test_gsub_frontier() {
    let vm = vm();
    let r = gsub(&vm, vec![s("THE (quick) fox"), s("%f[%a]%u+%f[%A]"), s("X")]);
    assert_eq!(r, (s("X (quick) fox"), int(1)));
    let r = gsub(&vm, vec![s("the cat sat"), s("%f[%w]%w+"), s("<%0>")]);
    assert_eq!(r, (s("<the> <cat> <sat>"), int(3)));
}

#[test]
fn test_gsub_function() {
    let vm = vm();
    let upper = LuaValue::function(|l: &mut LuaState| {
        let word = l.check_string(1, "upper")?;
        l.push_value(LuaValue::string_owned(word.to_ascii_uppercase()))?;
        Ok(1)
    });
    let r = gsub(&vm, vec![s("hello world"), s("%w+"), upper]);
    assert_eq!(r, (s("HELLO WORLD"), int(2)));
}

#[test]
fn test_gsub_function_keeps_original_on_nil_or_false() {
    let vm = vm();
    // Replace only the even digits.
    let even = LuaValue::function(|l: &mut LuaState| {
        let d = l.check_integer(1, "even")?;
        if d % 2 == 0 {
            l.push_value(s("#"))?;
        } else {
            l.push_value(LuaValue::boolean(false))?;
        }
        Ok(1)
    });
    let r = gsub(&vm, vec![s("1234"), s("%d"), even]);
    assert_eq!(r, (s("1#3#"), int(4)));

    let nothing = LuaValue::function(|_: &mut LuaState| Ok(0));
    let r = gsub(&vm, vec![s("abc"), s("b"), nothing]);
    assert_eq!(r, (s("abc"), int(1)));
}

#[test]
fn test_gsub_function_receives_captures() {
    let vm = vm();
    let join = LuaValue::function(|l: &mut LuaState| {
        let k = l.check_string(1, "join")?;
        let v = l.check_string(2, "join")?;
        let mut out = v.to_vec();
        out.push(b'=');
        out.extend_from_slice(&k);
        l.push_value(LuaValue::string_owned(out))?;
        Ok(1)
    });
    let r = gsub(&vm, vec![s("a:1, b:2"), s("(%w+):(%w+)"), join]);
    assert_eq!(r, (s("1=a, 2=b"), int(2)));
}

#[test]
fn test_gsub_nested_call() {
    let vm = vm();
    // The replacement function itself runs a pattern operation.
    let inner = LuaValue::function(|l: &mut LuaState| {
        let word = l.check_any(1, "inner")?;
        let f = match LuaVM::default().get_global("string.gsub") {
            LuaValue::Function(f) => f,
            _ => return Err(l.error("string.gsub missing")),
        };
        let mut r = l.call(&f, vec![word, s("."), s("%0%0")])?;
        l.push_value(r.swap_remove(0))?;
        Ok(1)
    });
    let r = gsub(&vm, vec![s("ab cd"), s("%a+"), inner]);
    assert_eq!(r, (s("aabb ccdd"), int(2)));
}

#[test]
fn test_gsub_table() {
    let vm = vm();
    let mut vars = LuaTable::new();
    vars.set(s("name"), s("Lua"));
    vars.set(s("ver"), int(54));
    let r = gsub(&vm, vec![s("$name $ver $other"), s("%$(%w+)"), LuaValue::table(vars)]);
    assert_eq!(r, (s("Lua 54 $other"), int(3)));
}

#[test]
fn test_gsub_invalid_replacement_value() {
    let vm = vm();
    let mut t = LuaTable::new();
    t.set(s("x"), LuaValue::table(LuaTable::new()));
    let err = vm
        .call("string.gsub", [s("x"), s("x"), LuaValue::table(t)])
        .unwrap_err();
    assert_eq!(err.message(), "invalid replacement value (a table)");

    let yes = LuaValue::function(|l: &mut LuaState| {
        l.push_value(LuaValue::boolean(true))?;
        Ok(1)
    });
    let err = vm.call("string.gsub", [s("x"), s("x"), yes]).unwrap_err();
    assert_eq!(err.message(), "invalid replacement value (a boolean)");
}

#[test]
fn test_gsub_bad_replacement_argument() {
    let vm = vm();
    let err = vm
        .call("string.gsub", [s("x"), s("x"), LuaValue::boolean(true)])
        .unwrap_err();
    assert!(err.is_bad_argument(3));
    assert_eq!(
        err.message(),
        "bad argument #3 to 'gsub' (string/function/table expected, got boolean)"
    );
}

#[test]
fn test_gsub_replacement_escapes() {
    let vm = vm();
    let err = vm.call("string.gsub", ["abc", "b", "%q"]).unwrap_err();
    assert_eq!(err.message(), "invalid use of '%' in replacement string");

    let err = vm.call("string.gsub", ["abc", "(b)", "%2"]).unwrap_err();
    assert_eq!(err.message(), "invalid capture index %2 in replacement string");

    // Lua 5.1 copies the escaped character through.
    let vm = vm_for(LuaVersion::Lua51);
    assert_eq!(gsub(&vm, vec![s("abc"), s("b"), s("%q")]), (s("aqc"), int(1)));
    // A trailing escape copies the terminating NUL.
    assert_eq!(
        gsub(&vm, vec![s("abc"), s("b"), s("%")]),
        (LuaValue::string(b"a\0c"), int(1))
    );
}

#[test]
fn test_gsub_position_capture_in_template() {
    let vm = vm();
    assert_eq!(gsub(&vm, vec![s("abc"), s("()b"), s("[%1]")]), (s("a[2]c"), int(1)));
}
