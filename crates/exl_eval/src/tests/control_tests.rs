//! Statements, `size`/`empty` and cooperative cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use exl_ir::{BinaryOp, TreeBuilder};

use super::{error_kind, eval, eval_with, init_tracing, strict_engine};
use crate::{
    CancelToken, Context, Engine, EvalErrorKind, HostClass, HostObject,
    MapContext, Value,
};

fn ints(items: &[i32]) -> Value {
    Value::array(items.iter().copied().map(Value::Int).collect())
}

mod branch_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn if_takes_else_branch() {
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let no = b.boolean(false);
        let one = b.int(1);
        let two = b.int(2);
        let branch = b.if_else(no, one, Some(two));
        let tree = b.finish(vec![branch]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(2)));
    }

    #[test]
    fn if_without_else_is_null() {
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let no = b.boolean(false);
        let one = b.int(1);
        let branch = b.if_else(no, one, None);
        let tree = b.finish(vec![branch]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Null));
    }

    #[test]
    fn elvis_keeps_truthy_condition() {
        let ctx = MapContext::new().with("five", 5).with("zero", 0);
        let mut b = TreeBuilder::new();
        let five = b.ident("five");
        let three = b.int(3);
        let kept = b.elvis(five, three);
        let zero = b.ident("zero");
        let other = b.int(3);
        let replaced = b.elvis(zero, other);
        let pair = b.array(vec![kept, replaced]);
        let tree = b.finish(vec![pair]);

        assert_eq!(eval(tree, &ctx), Ok(ints(&[5, 3])));
    }

    #[test]
    fn top_level_return_ends_script() {
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let ret = b.ret(one);
        let two = b.int(2);
        let tree = b.finish(vec![ret, two]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(1)));
    }
}

mod loop_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn while_counts_up() {
        // var i = 0; while (i < 5) i = i + 1; i
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let decl = b.var("i");
        let zero = b.int(0);
        let init = b.assign(decl, zero);
        let i = b.ident("i");
        let five = b.int(5);
        let cond = b.binary(BinaryOp::Lt, i, five);
        let target = b.ident("i");
        let current = b.ident("i");
        let one = b.int(1);
        let next = b.binary(BinaryOp::Add, current, one);
        let step = b.assign(target, next);
        let lp = b.while_loop(cond, Some(step));
        let result = b.ident("i");
        let tree = b.finish(vec![init, lp, result]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(5)));
    }

    #[test]
    fn foreach_sums_local_items() {
        // var sum = 0; for (var x : [1, 2, 3]) sum = sum + x; sum
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let decl = b.var("sum");
        let zero = b.int(0);
        let init = b.assign(decl, zero);
        let x = b.var("x");
        let items: Vec<_> = (1..=3).map(|n| b.int(n)).collect();
        let list = b.array(items);
        let target = b.ident("sum");
        let sum = b.ident("sum");
        let item = b.ident("x");
        let add = b.binary(BinaryOp::Add, sum, item);
        let body = b.assign(target, add);
        let lp = b.foreach(x, list, Some(body));
        let result = b.ident("sum");
        let tree = b.finish(vec![init, lp, result]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(6)));
    }

    #[test]
    fn foreach_binds_context_variable() {
        let ctx = MapContext::new()
            .with("items", ints(&[4, 5]))
            .with("total", 0);
        let mut b = TreeBuilder::new();
        let item = b.ident("item");
        let items = b.ident("items");
        let target = b.ident("total");
        let total = b.ident("total");
        let current = b.ident("item");
        let add = b.binary(BinaryOp::Add, total, current);
        let body = b.assign(target, add);
        let lp = b.foreach(item, items, Some(body));
        let tree = b.finish(vec![lp]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(9)));
        assert_eq!(ctx.get("total"), Some(Value::Int(9)));
        assert_eq!(ctx.get("item"), Some(Value::Int(5)));
    }

    #[test]
    fn foreach_over_null_runs_nothing() {
        let ctx = MapContext::new().with("items", Value::Null);
        let mut b = TreeBuilder::new();
        let item = b.ident("item");
        let items = b.ident("items");
        let body = b.int(1);
        let lp = b.foreach(item, items, Some(body));
        let tree = b.finish(vec![lp]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Null));
        assert!(!ctx.has("item"));
    }
}

mod size_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A host object whose only member is `size()`.
    fn bag(len: i64) -> Value {
        let class = HostClass::builder("Bag")
            .method("size", &[], |obj, _| {
                Ok(Value::integer(obj.downcast_ref::<i64>().copied().unwrap_or_default()))
            })
            .build();
        Value::Object(HostObject::new(class, len))
    }

    #[test]
    fn size_of_collections() {
        let ctx = MapContext::new().with("list", ints(&[1, 2, 3]));
        let mut b = TreeBuilder::new();
        let list = b.ident("list");
        let size = b.size(list);
        let tree = b.finish(vec![size]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(3)));
    }

    #[test]
    fn size_method_link() {
        let ctx = MapContext::new().with("word", "héllo");
        let mut b = TreeBuilder::new();
        let word = b.ident("word");
        let size = b.size_method();
        let chain = b.reference(vec![word, size]);
        let tree = b.finish(vec![chain]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(5)));
    }

    #[test]
    fn size_of_object_uses_its_size_method() {
        let ctx = MapContext::new().with("bag", bag(7));
        let mut b = TreeBuilder::new();
        let bag = b.ident("bag");
        let size = b.size(bag);
        let tree = b.finish(vec![size]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(7)));
    }

    #[test]
    fn size_of_unsized_value_fails_when_strict() {
        let ctx = MapContext::new().with("flag", true);
        let mut b = TreeBuilder::new();
        let flag = b.ident("flag");
        let size = b.size(flag);
        let tree = b.finish(vec![size]);

        assert_eq!(
            error_kind(eval_with(&strict_engine(), tree, &ctx)),
            EvalErrorKind::UnsupportedSize {
                type_name: "boolean".into()
            }
        );
    }

    #[test]
    fn size_of_null_fails_when_strict() {
        let ctx = MapContext::new().with("nothing", Value::Null);
        let mut b = TreeBuilder::new();
        let nothing = b.ident("nothing");
        let size = b.size(nothing);
        let tree = b.finish(vec![size]);

        assert!(matches!(
            error_kind(eval_with(&strict_engine(), tree, &ctx)),
            EvalErrorKind::NullTarget { .. }
        ));
    }

    #[test]
    fn empty_checks() {
        let ctx = MapContext::new()
            .with("blank", "")
            .with("word", "x")
            .with("none", ints(&[]))
            .with("bag", bag(0));
        let mut b = TreeBuilder::new();
        let checks: Vec<_> = ["blank", "word", "none", "bag"]
            .into_iter()
            .map(|name| {
                let operand = b.ident(name);
                b.empty(operand)
            })
            .collect();
        let all = b.array(checks);
        let tree = b.finish(vec![all]);

        assert_eq!(
            eval(tree, &ctx),
            Ok(Value::array(vec![
                Value::Bool(true),
                Value::Bool(false),
                Value::Bool(true),
                Value::Bool(true),
            ]))
        );
    }
}

mod cancel_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// `while (true) tick()`
    fn endless_loop() -> exl_ir::SyntaxTree {
        let mut b = TreeBuilder::new();
        let forever = b.boolean(true);
        let tick = b.call("tick", vec![]);
        let lp = b.while_loop(forever, Some(tick));
        b.finish(vec![lp])
    }

    fn ticking_context(token: &CancelToken, limit: usize) -> (MapContext, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let token = token.clone();
        let tick = Value::function("tick", move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 == limit {
                token.cancel();
            }
            Ok(Value::Null)
        });
        (MapContext::new().with("tick", tick), ticks)
    }

    #[test]
    fn cancelling_mid_loop_stops_evaluation() {
        init_tracing();
        let token = CancelToken::new();
        let (ctx, ticks) = ticking_context(&token, 3);
        let script = Engine::new().script(endless_loop());

        let Err(error) = script.execute_with_cancel(&ctx, &[], &token) else {
            panic!("expected cancellation");
        };
        assert!(error.is_cancelled());
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn silent_engine_still_reports_cancellation() {
        init_tracing();
        let token = CancelToken::new();
        let (ctx, _) = ticking_context(&token, 1);
        let script = Engine::builder().silent(true).build().script(endless_loop());

        assert_eq!(
            error_kind(script.execute_with_cancel(&ctx, &[], &token)),
            EvalErrorKind::Cancelled
        );
    }

    #[test]
    fn foreach_checks_cancellation_each_iteration() {
        init_tracing();
        let token = CancelToken::new();
        let (ctx, ticks) = ticking_context(&token, 2);
        let ctx = ctx.with("items", ints(&[1, 2, 3, 4]));
        let mut b = TreeBuilder::new();
        let item = b.ident("item");
        let items = b.ident("items");
        let tick = b.call("tick", vec![]);
        let lp = b.foreach(item, items, Some(tick));
        let script = Engine::new().script(b.finish(vec![lp]));

        assert_eq!(
            error_kind(script.execute_with_cancel(&ctx, &[], &token)),
            EvalErrorKind::Cancelled
        );
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        assert_eq!(ctx.get("item"), Some(Value::Int(2)));
    }

    #[test]
    fn call_checks_cancellation_before_its_arguments() {
        // record(tick(), record()): the inner call is never reached.
        init_tracing();
        let token = CancelToken::new();
        let (ctx, ticks) = ticking_context(&token, 1);
        let records = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&records);
        let record = Value::function("record", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        });
        let ctx = ctx.with("record", record);
        let mut b = TreeBuilder::new();
        let tick = b.call("tick", vec![]);
        let inner = b.call("record", vec![]);
        let outer = b.call("record", vec![tick, inner]);
        let script = Engine::new().script(b.finish(vec![outer]));

        assert_eq!(
            error_kind(script.execute_with_cancel(&ctx, &[], &token)),
            EvalErrorKind::Cancelled
        );
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        assert_eq!(records.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancelled_token_stops_before_first_read() {
        init_tracing();
        let token = CancelToken::new();
        token.cancel();
        let ctx = MapContext::new().with("x", 1);
        let mut b = TreeBuilder::new();
        let x = b.ident("x");
        let script = Engine::new().script(b.finish(vec![x]));

        assert_eq!(
            error_kind(script.execute_with_cancel(&ctx, &[], &token)),
            EvalErrorKind::Cancelled
        );
    }
}

mod silent_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn silent_strict_engine_returns_null_on_error() {
        let engine = Engine::builder().strict(true).silent(true).build();
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let missing = b.ident("missing");
        let tree = b.finish(vec![missing]);

        assert_eq!(eval_with(&engine, tree, &ctx), Ok(Value::Null));
    }
}
