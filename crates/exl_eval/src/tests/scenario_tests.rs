//! Short expressions evaluated against a context with a few variables.

use exl_ir::{BinaryOp, TreeBuilder};

use super::eval;
use crate::{Context, MapContext, Value};

fn ints(items: &[i32]) -> Value {
    Value::array(items.iter().copied().map(Value::Int).collect())
}

mod arithmetic_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn adds_context_variable() {
        let ctx = MapContext::new().with("foo", 2);
        let mut b = TreeBuilder::new();
        let foo = b.ident("foo");
        let two = b.int(2);
        let sum = b.binary(BinaryOp::Add, foo, two);
        let tree = b.finish(vec![sum]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(4)));
    }

    #[test]
    fn respects_precedence_of_built_tree() {
        // 3 * 3 - foo
        let ctx = MapContext::new().with("foo", 2);
        let mut b = TreeBuilder::new();
        let three = b.int(3);
        let three_again = b.int(3);
        let product = b.binary(BinaryOp::Mul, three, three_again);
        let foo = b.ident("foo");
        let difference = b.binary(BinaryOp::Sub, product, foo);
        let tree = b.finish(vec![difference]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(7)));
    }

    #[test]
    fn concatenates_strings() {
        let ctx = MapContext::new().with("name", "exl");
        let mut b = TreeBuilder::new();
        let greeting = b.string("hello ");
        let name = b.ident("name");
        let sum = b.binary(BinaryOp::Add, greeting, name);
        let tree = b.finish(vec![sum]);

        assert_eq!(eval(tree, &ctx), Ok(Value::from("hello exl")));
    }
}

mod collection_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn indexes_array_with_literal() {
        let ctx = MapContext::new().with("list", ints(&[1, 2, 3]));
        let mut b = TreeBuilder::new();
        let list = b.ident("list");
        let one = b.int(1);
        let access = b.array_access(list, vec![one]);
        let tree = b.finish(vec![access]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(2)));
    }

    #[test]
    fn indexes_array_with_expression() {
        let ctx = MapContext::new().with("list", ints(&[1, 2, 3]));
        let mut b = TreeBuilder::new();
        let list = b.ident("list");
        let one = b.int(1);
        let other = b.int(1);
        let index = b.binary(BinaryOp::Add, one, other);
        let access = b.array_access(list, vec![index]);
        let tree = b.finish(vec![access]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(3)));
    }

    #[test]
    fn builds_array_and_map_literals() {
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        let array = b.array(vec![one, two]);
        let key = b.string("items");
        let map = b.map(vec![(key, array)]);
        let tree = b.finish(vec![map]);

        let Ok(Value::Map(map)) = eval(tree, &ctx) else {
            panic!("expected a map");
        };
        assert_eq!(map.get(&"items".into()), Some(ints(&[1, 2])));
    }
}

mod builtin_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_variable_is_empty() {
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let nothing = b.ident("nullthing");
        let empty = b.empty(nothing);
        let tree = b.finish(vec![empty]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Bool(true)));
    }

    #[test]
    fn size_counts_characters() {
        let ctx = MapContext::new().with("string", "five!");
        let mut b = TreeBuilder::new();
        let string = b.ident("string");
        let size = b.size(string);
        let tree = b.finish(vec![size]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(5)));
    }
}

mod assignment_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dotted_assignment_creates_flat_variable() {
        let ctx = MapContext::new();
        let mut b = TreeBuilder::new();
        let target = b.path(&["foo", "bar"]);
        let five = b.int(5);
        let assign = b.assign(target, five);
        let tree = b.finish(vec![assign]);

        assert_eq!(eval(tree, &ctx), Ok(Value::Int(5)));
        assert_eq!(ctx.get("foo.bar"), Some(Value::Int(5)));
        assert!(!ctx.has("foo"));
    }
}
