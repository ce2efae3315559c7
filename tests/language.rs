use fossil::{ArithmeticError, Error, Interpreter, Parser, RuntimeError, Scanner, Value, ValueKind};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn run(source: &str) -> Value {
    Interpreter::new().run_source(source).unwrap()
}

fn fail(source: &str) -> Error {
    match Interpreter::new().run_source(source) {
        Ok(value) => panic!("expected {:?} to fail, got {:?}", source, value),
        Err(e) => e,
    }
}

/// Runs `source` with a `print` native and returns everything it printed.
fn output(source: &str) -> Vec<String> {
    let interpreter = Interpreter::new();
    let printed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&printed);
    interpreter
        .define_native("print", move |args: &[Value]| {
            let words: Vec<String> = args.iter().map(Value::to_string).collect();
            sink.borrow_mut().push(words.join(" "));
            None
        })
        .unwrap();
    interpreter.run_source(source).unwrap();
    let lines = printed.borrow().clone();
    lines
}

#[test]
fn variables() {
    assert_eq!(run("var x = 3; x = x + 4; x;"), Value::Integer(7));
}

#[test]
fn function_call() {
    assert_eq!(run("function add(a,b) { a + b; } add(2,3);"), Value::Integer(5));
}

#[test]
fn string_repetition() {
    assert_eq!(run("var s = \"ab\"; s * 3;"), Value::from("ababab"));
}

#[test]
fn if_else() {
    assert_eq!(
        run("if (1 < 2) { \"yes\"; } else { \"no\"; }"),
        Value::from("yes")
    );
}

#[test]
fn while_loop() {
    let source = "var i = 0; var total = 0; while (i < 5) { total = total + i; i = i + 1; } total;";
    assert_eq!(run(source), Value::Integer(10));
}

#[test]
fn division_by_zero() {
    match fail("10 / 0;") {
        Error::Arithmetic { line, source } => {
            assert_eq!(line, 1);
            assert_eq!(source, ArithmeticError::DivideByZero);
        }
        other => panic!("expected an arithmetic error, got {:?}", other),
    }
}

#[test]
fn shadowing_in_nested_blocks() {
    let source = "
        var x = 1;
        {
            var x = 2;
            {
                x = 3;
            }
            print(x);
        }
        print(x);
    ";
    assert_eq!(output(source), vec!["3", "1"]);
}

#[test]
fn redefinition_fails_on_the_second_definition() {
    match fail("var x = 1;\nvar y = 2;\nvar x = 3;") {
        Error::Runtime { line, source } => {
            assert_eq!(line, 3);
            assert_eq!(source, RuntimeError::AlreadyDefined("x".to_string()));
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
    assert_eq!(
        run("var x = 1; function g() { var x = 2; x; } g();"),
        Value::Integer(2)
    );
}

#[test]
fn fibonacci() {
    let source = "
        function fib(n) {
            if (n < 2) n; else fib(n - 1) + fib(n - 2);
        }
        var results = \"\";
        for (var i = 0; i < 10; i = i + 1) {
            results = results + fib(i) + \" \";
        }
        results;
    ";
    assert_eq!(run(source), Value::from("0 1 1 2 3 5 8 13 21 34 "));
}

#[test]
fn calls_resolve_names_through_the_caller() {
    let source = "
        function greet() { print(greeting + \", \" + name); }
        function english(name) { var greeting = \"hello\"; greet(); }
        function french(name) { var greeting = \"bonjour\"; greet(); }
        english(\"ann\");
        french(\"luc\");
    ";
    assert_eq!(output(source), vec!["hello, ann", "bonjour, luc"]);
}

#[test]
fn parameters_are_bound_per_call() {
    let source = "
        function count(n) {
            if (n > 0) { print(n); count(n - 1); }
            print(\"back in\", n);
        }
        count(2);
    ";
    assert_eq!(
        output(source),
        vec!["2", "1", "back in 0", "back in 1", "back in 2"]
    );
}

#[test]
fn missing_and_extra_arguments() {
    assert_eq!(run("function f(a, b) { b; } f(1);"), Value::Void);
    assert_eq!(
        run("function f(a) { a; } f(1, undefined_name);"),
        Value::Integer(1)
    );
}

#[test]
fn print_renders_values() {
    let source = "
        function f(a) { }
        print(1, true, \"s\", void, f);
        print();
        print(\"\" + -5, 2 * true, \"x\" == \"x\");
    ";
    assert_eq!(output(source), vec!["1 true s void f", "", "-5 2 true"]);
}

#[test]
fn loose_integer_coercion() {
    assert_eq!(run("true + true;"), Value::Integer(2));
    assert_eq!(run("void + 5;"), Value::Integer(5));
    assert_eq!(run("3 * false;"), Value::Integer(0));
    assert_eq!(run("\"n\" + 1 + 2;"), Value::from("n12"));
    assert_eq!(run("1 + 2 + \"n\";"), Value::Integer(3));
}

#[test]
fn strict_operators_report_the_kinds() {
    let err = fail("var a = \"text\";\n\na - 1;");
    assert_eq!(
        err.to_string(),
        "[line 3] runtime error: operator '-' expects integer operands, found string and integer"
    );
    match fail("\"ab\" * -2;") {
        Error::Runtime { source, .. } => assert_eq!(source, RuntimeError::NegativeRepeat(-2)),
        other => panic!("expected a runtime error, got {:?}", other),
    }
    match fail("true(1);") {
        Error::Syntax { .. } => {}
        other => panic!("expected a syntax error, got {:?}", other),
    }
    match fail("var t = true; t(1);") {
        Error::Runtime { source, .. } => {
            assert_eq!(source, RuntimeError::NotCallable(ValueKind::Boolean))
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn integer_edge_cases() {
    assert_eq!(run("2147483647 + 1;"), Value::Integer(i32::MIN));
    assert_eq!(run("-7 / 2;"), Value::Integer(-3));
    assert_eq!(run("-7 % 2;"), Value::Integer(-1));
    match fail("var min = -2147483647 - 1; min / -1;") {
        Error::Arithmetic { source, .. } => assert_eq!(source, ArithmeticError::Overflow),
        other => panic!("expected an arithmetic error, got {:?}", other),
    }
    assert!(fail("2147483648;").is_syntax());
}

#[test]
fn undefined_variable_reports_its_line() {
    let err = fail("var a = 1;\n\n\nb;");
    assert_eq!(err.line(), Some(4));
    assert_eq!(err.to_string(), "[line 4] runtime error: undefined variable 'b'");
}

#[test]
fn syntax_errors_stop_before_later_statements_run() {
    let interpreter = Interpreter::new();
    let err = interpreter
        .run_source("var before = 1;\nvar = 2;\nvar after = 3;")
        .unwrap_err();
    assert_eq!(err.line(), Some(2));
    assert!(err.is_syntax());
    assert_eq!(interpreter.globals().get("before"), Ok(Value::Integer(1)));
    assert!(interpreter.globals().get("after").is_err());
}

#[test]
fn statements_are_observed_as_they_run() {
    let interpreter = Interpreter::new();
    let mut parser = Parser::new(Scanner::from_source(
        "var i = 0;\nwhile (i < 3) i = i + 1;\nif (i == 3) \"done\";",
    ));
    let mut seen = Vec::new();
    interpreter
        .run(&mut parser, |value| seen.push(format!("{:?}", value)))
        .unwrap();
    assert_eq!(seen, vec!["[int]0", "[int]3", "[string]done"]);
}

#[test]
fn globals_persist_between_runs() {
    let interpreter = Interpreter::new();
    interpreter.run_source("function inc(n) { n + 1; }").unwrap();
    interpreter.run_source("var x = inc(1);").unwrap();
    assert_eq!(interpreter.run_source("inc(x);").unwrap(), Value::Integer(3));
}
