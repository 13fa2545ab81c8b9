//! Method, function and constructor calls; namespaces; closures.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use exl_ir::{BinaryOp, TreeBuilder};

use super::{error_kind, eval, eval_with, strict_engine};
use crate::{
    BuiltinUberspect, Engine, ErrorCause, EvalErrorKind, HostClass, HostError, HostObject,
    MapContext, MapKey, Namespace, ParamType, Value,
};

/// A host class holding one integer, with typed members.
fn cell_class() -> Arc<HostClass> {
    fn state(obj: &HostObject) -> Result<&AtomicI64, HostError> {
        obj.downcast_ref::<AtomicI64>()
            .ok_or_else(|| HostError::new("not a cell"))
    }

    HostClass::builder("Cell")
        .constructor(&[ParamType::Int], |class, args| {
            let initial = args[0].as_i64().unwrap_or_default();
            Ok(Value::Object(HostObject::new(
                Arc::clone(class),
                AtomicI64::new(initial),
            )))
        })
        .method("twice", &[ParamType::Int], |_, args| {
            Ok(Value::integer(args[0].as_i64().unwrap_or_default() * 2))
        })
        .method("size", &[], |obj, _| {
            Ok(Value::Long(state(obj)?.load(Ordering::SeqCst)))
        })
        .getter("value", |obj| Ok(Value::Long(state(obj)?.load(Ordering::SeqCst))))
        .setter("value", ParamType::Int, |obj, value| {
            state(obj)?.store(value.as_i64().unwrap_or_default(), Ordering::SeqCst);
            Ok(())
        })
        .build()
}

fn cell(class: &Arc<HostClass>, initial: i64) -> Value {
    Value::Object(HostObject::new(Arc::clone(class), AtomicI64::new(initial)))
}

fn cell_engine(class: &Arc<HostClass>) -> Engine {
    let uberspect = BuiltinUberspect::new().with_class(Arc::clone(class));
    Engine::builder().uberspect(Arc::new(uberspect)).build()
}

mod method_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn calls_builtin_string_method() {
        let ctx = MapContext::new().with("s", "Hello");
        let mut b = TreeBuilder::new();
        let s = b.ident("s");
        let upper = b.method("toUpperCase", vec![]);
        let chain = b.reference(vec![s, upper]);
        let tree = b.finish(vec![chain]);

        assert_eq!(eval(tree, &ctx), Ok(Value::from("HELLO")));
    }

    #[test]
    fn long_argument_is_narrowed_to_reach_int_parameter() {
        let class = cell_class();
        let ctx = MapContext::new().with("c", cell(&class, 0));
        let mut b = TreeBuilder::new();
        let c = b.ident("c");
        let five = b.long(5);
        let twice = b.method("twice", vec![five]);
        let chain = b.reference(vec![c, twice]);
        let tree = b.finish(vec![chain]);

        assert_eq!(eval_with(&cell_engine(&class), tree, &ctx), Ok(Value::Int(10)));
    }

    #[test]
    fn long_value_is_narrowed_to_reach_int_setter() {
        let class = cell_class();
        let ctx = MapContext::new().with("c", cell(&class, 0));
        let mut b = TreeBuilder::new();
        let path = b.path(&["c", "value"]);
        let seven = b.long(7);
        let assign = b.assign(path, seven);
        let read = b.path(&["c", "value"]);
        let tree = b.finish(vec![assign, read]);

        assert_eq!(eval_with(&cell_engine(&class), tree, &ctx), Ok(Value::Long(7)));
    }

    #[test]
    fn missing_method_fails_even_when_lenient() {
        let ctx = MapContext::new().with("s", "abc");
        let mut b = TreeBuilder::new();
        let s = b.ident("s");
        let bogus = b.method("bogus", vec![]);
        let chain = b.reference(vec![s, bogus]);
        let tree = b.finish(vec![chain]);

        assert_eq!(
            error_kind(eval(tree, &ctx)),
            EvalErrorKind::NoSuchMethod {
                name: "bogus".into()
            }
        );
    }

    #[test]
    fn method_on_null_is_null_when_lenient() {
        let ctx = MapContext::new().with("n", Value::Null);
        let mut b = TreeBuilder::new();
        let n = b.ident("n");
        let call = b.method("foo", vec![]);
        let chain = b.reference(vec![n, call]);
        let tree = b.finish(vec![chain]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Null));
    }

    #[test]
    fn method_on_null_fails_when_strict() {
        let ctx = MapContext::new().with("n", Value::Null);
        let mut b = TreeBuilder::new();
        let n = b.ident("n");
        let call = b.method("foo", vec![]);
        let chain = b.reference(vec![n, call]);
        let tree = b.finish(vec![chain]);

        assert!(matches!(
            error_kind(eval_with(&strict_engine(), tree, &ctx)),
            EvalErrorKind::NullTarget { .. }
        ));
    }

    #[test]
    fn failing_host_function_is_null_when_lenient() {
        let ctx = MapContext::new().with(
            "f",
            Value::function("f", |_| Err(HostError::new("boom"))),
        );
        let mut b = TreeBuilder::new();
        let call = b.call("f", vec![]);
        let tree = b.finish(vec![call]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Null));
    }

    #[test]
    fn failing_host_function_keeps_cause_when_strict() {
        let ctx = MapContext::new().with(
            "f",
            Value::function("f", |_| Err(HostError::new("boom"))),
        );
        let mut b = TreeBuilder::new();
        let call = b.call("f", vec![]);
        let tree = b.finish(vec![call]);

        let Err(error) = eval_with(&strict_engine(), tree, &ctx) else {
            panic!("expected an error");
        };
        assert_eq!(error.kind, EvalErrorKind::Invocation { name: "f".into() });
        assert_eq!(error.cause, Some(ErrorCause::Host(HostError::new("boom"))));
    }
}

mod constructor_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn constructs_host_object_by_class_name() {
        let class = cell_class();
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let decl = b.var("c");
        let name = b.string("Cell");
        let three = b.int(3);
        let ctor = b.constructor(name, vec![three]);
        let assign = b.assign(decl, ctor);
        let read = b.path(&["c", "value"]);
        let tree = b.finish(vec![assign, read]);

        assert_eq!(eval_with(&cell_engine(&class), tree, &ctx), Ok(Value::Long(3)));
    }

    #[test]
    fn unknown_class_fails_even_when_lenient() {
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let name = b.string("Nope");
        let ctor = b.constructor(name, vec![]);
        let tree = b.finish(vec![ctor]);

        assert_eq!(
            error_kind(eval(tree, &ctx)),
            EvalErrorKind::NoSuchConstructor {
                class: "Nope".into()
            }
        );
    }
}

mod namespace_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn max_function() -> Value {
        Value::function("max", |args| {
            let max = args.iter().filter_map(Value::as_i64).max().unwrap_or_default();
            Ok(Value::integer(max))
        })
    }

    #[test]
    fn calls_function_of_value_namespace() {
        let math = Value::map([(MapKey::from("max"), max_function())]);
        let engine = Engine::builder().namespace("math", math).build();
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let call = b.function("math", "max", vec![one, two]);
        let tree = b.finish(vec![call]);

        assert_eq!(eval_with(&engine, tree, &ctx), Ok(Value::Int(2)));
    }

    #[test]
    fn factory_runs_once_per_evaluation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let factory = Namespace::factory(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::map([(
                MapKey::from("one"),
                Value::function("one", |_| Ok(Value::Int(1))),
            )]))
        });
        let engine = Engine::builder().namespace("ns", factory).build();
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let first = b.function("ns", "one", vec![]);
        let second = b.function("ns", "one", vec![]);
        let sum = b.binary(BinaryOp::Add, first, second);
        let script = engine.script(b.finish(vec![sum]));

        assert_eq!(script.execute(&ctx, &[]), Ok(Value::Int(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(script.execute(&ctx, &[]), Ok(Value::Int(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failing_factory_fails_even_when_lenient() {
        let factory = Namespace::factory(|_| Err(HostError::new("no database")));
        let engine = Engine::builder().namespace("db", factory).build();
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let call = b.function("db", "query", vec![]);
        let tree = b.finish(vec![call]);

        assert_eq!(
            error_kind(eval_with(&engine, tree, &ctx)),
            EvalErrorKind::NamespaceInstantiation {
                prefix: "db".into()
            }
        );
    }

    #[test]
    fn unknown_namespace_fails_even_when_lenient() {
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let call = b.function("nope", "f", vec![]);
        let tree = b.finish(vec![call]);

        assert_eq!(
            error_kind(eval(tree, &ctx)),
            EvalErrorKind::NoSuchNamespace {
                prefix: "nope".into()
            }
        );
    }

    #[test]
    fn global_namespace_serves_bare_calls() {
        let globals = Value::map([(MapKey::from("max"), max_function())]);
        let engine = Engine::builder().namespace("", globals).build();
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let four = b.int(4);
        let nine = b.int(9);
        let call = b.call("max", vec![four, nine]);
        let tree = b.finish(vec![call]);

        assert_eq!(eval_with(&engine, tree, &ctx), Ok(Value::Int(9)));
    }

    #[test]
    fn global_namespace_falls_back_to_context_functor() {
        let globals = Value::map([(MapKey::from("max"), max_function())]);
        let engine = Engine::builder().namespace("", globals).build();
        let ctx = MapContext::new().with("answer", Value::function("answer", |_| Ok(Value::Int(42))));
        let mut b = TreeBuilder::new();
        let call = b.call("answer", vec![]);
        let tree = b.finish(vec![call]);

        assert_eq!(eval_with(&engine, tree, &ctx), Ok(Value::Int(42)));
    }
}

mod closure_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lambda_captures_enclosing_local() {
        // var base = 10; var add = (x) -> x + base; add(5)
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let base_decl = b.var("base");
        let ten = b.int(10);
        let set_base = b.assign(base_decl, ten);
        let add_decl = b.var("add");
        b.begin_lambda(&["x"]);
        let x = b.ident("x");
        let base = b.ident("base");
        let sum = b.binary(BinaryOp::Add, x, base);
        let lambda = b.end_lambda(sum);
        let set_add = b.assign(add_decl, lambda);
        let five = b.int(5);
        let call = b.call("add", vec![five]);
        let tree = b.finish(vec![set_base, set_add, call]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(15)));
    }

    #[test]
    fn return_leaves_lambda_body() {
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let f_decl = b.var("f");
        b.begin_lambda(&["x"]);
        let x = b.ident("x");
        let ret = b.ret(x);
        let ignored = b.int(99);
        let body = b.block(vec![ret, ignored]);
        let lambda = b.end_lambda(body);
        let set_f = b.assign(f_decl, lambda);
        let three = b.int(3);
        let call = b.call("f", vec![three]);
        let tree = b.finish(vec![set_f, call]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(3)));
    }

    #[test]
    fn closure_from_one_script_runs_in_another() {
        let engine = Engine::new();
        let ctx = MapContext::new();

        let mut b = TreeBuilder::new();
        b.begin_lambda(&["x"]);
        let x = b.ident("x");
        let two = b.int(2);
        let product = b.binary(BinaryOp::Mul, x, two);
        let lambda = b.end_lambda(product);
        let result = engine.evaluate(b.finish(vec![lambda]), &ctx);
        let Ok(closure @ Value::Closure(_)) = result else {
            panic!("expected a closure");
        };
        ctx.insert("double", closure);

        let mut b = TreeBuilder::new();
        let four = b.int(4);
        let call = b.call("double", vec![four]);
        let tree = b.finish(vec![call]);

        assert_eq!(eval_with(&engine, tree, &ctx), Ok(Value::Int(8)));
    }

    #[test]
    fn script_is_callable_from_context() {
        let engine = Engine::new();
        let ctx = MapContext::new();

        let mut b = TreeBuilder::with_parameters(&["a", "b"]);
        let a = b.ident("a");
        let bb = b.ident("b");
        let sum = b.binary(BinaryOp::Add, a, bb);
        let script = engine.script(b.finish(vec![sum]));
        assert_eq!(script.parameters(), 2);
        ctx.insert("sum", script.as_callable());

        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let call = b.call("sum", vec![one, two]);
        let tree = b.finish(vec![call]);

        assert_eq!(eval_with(&engine, tree, &ctx), Ok(Value::Int(3)));
    }

    #[test]
    fn script_parameters_bind_arguments() {
        let engine = Engine::new();
        let ctx = MapContext::new();
        let mut b = TreeBuilder::with_parameters(&["n"]);
        let n = b.ident("n");
        let one = b.int(1);
        let sum = b.binary(BinaryOp::Add, n, one);
        let script = engine.script(b.finish(vec![sum]));

        assert_eq!(script.execute(&ctx, &[Value::Int(41)]), Ok(Value::Int(42)));
    }
}

mod cache_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upper_script(engine: &Engine) -> crate::Script {
        let mut b = TreeBuilder::new();
        let s = b.ident("s");
        let upper = b.method("toUpperCase", vec![]);
        let chain = b.reference(vec![s, upper]);
        engine.script(b.finish(vec![chain]))
    }

    #[test]
    fn resolved_method_is_cached_at_call_site() {
        let script = upper_script(&Engine::new());
        let ctx = MapContext::new().with("s", "abc");

        assert!(script.program().cache().is_empty());
        assert_eq!(script.execute(&ctx, &[]), Ok(Value::from("ABC")));
        assert_eq!(script.program().cache().len(), 1);
        assert_eq!(script.execute(&ctx, &[]), Ok(Value::from("ABC")));
    }

    #[test]
    fn disabled_cache_stays_empty() {
        let script = upper_script(&Engine::builder().cache(false).build());
        let ctx = MapContext::new().with("s", "abc");

        assert_eq!(script.execute(&ctx, &[]), Ok(Value::from("ABC")));
        assert!(script.program().cache().is_empty());
    }

    #[test]
    fn stale_handle_is_resolved_again() {
        let engine = Engine::new();
        let mut b = TreeBuilder::new();
        let x = b.ident("x");
        let size = b.method("size", vec![]);
        let chain = b.reference(vec![x, size]);
        let script = engine.script(b.finish(vec![chain]));

        let ctx = MapContext::new().with("x", "abcd");
        assert_eq!(script.execute(&ctx, &[]), Ok(Value::Int(4)));
        ctx.insert("x", Value::array(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(script.execute(&ctx, &[]), Ok(Value::Int(2)));
    }
}
