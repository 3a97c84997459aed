use proptest::prelude::*;

use loopquest::{RunConfig, run, run_with_config, translator};

/// Shape of a generated program: prints, counted loops and if/else blocks.
#[derive(Debug, Clone)]
enum Node {
    Print(i64),
    Loop(i64, Vec<Node>),
    If(bool, Vec<Node>, Option<Vec<Node>>),
}

fn node_strategy() -> impl Strategy<Value = Node> {
    let leaf = (-50i64..50).prop_map(Node::Print);
    leaf.prop_recursive(4, 32, 4, |inner| {
        let body = prop::collection::vec(inner, 1..4);
        prop_oneof![
            (0i64..4, body.clone()).prop_map(|(count, body)| Node::Loop(count, body)),
            (any::<bool>(), body.clone(), prop::option::of(body))
                .prop_map(|(condition, then_body, else_body)| Node::If(
                    condition, then_body, else_body
                )),
        ]
    })
}

fn program_strategy() -> impl Strategy<Value = Vec<Node>> {
    prop::collection::vec(node_strategy(), 1..5)
}

fn render(nodes: &[Node], depth: usize, source: &mut String) {
    let indent = "    ".repeat(depth);
    for node in nodes {
        match node {
            Node::Print(value) => source.push_str(&format!("{indent}print({value})\n")),
            Node::Loop(count, body) => {
                source.push_str(&format!("{indent}for i{depth} in range({count}):\n"));
                render(body, depth + 1, source);
            }
            Node::If(condition, then_body, else_body) => {
                let condition = if *condition { "True" } else { "False" };
                source.push_str(&format!("{indent}if {condition}:\n"));
                render(then_body, depth + 1, source);
                if let Some(else_body) = else_body {
                    source.push_str(&format!("{indent}else:\n"));
                    render(else_body, depth + 1, source);
                }
            }
        }
    }
}

fn count_headers(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Print(_) => 0,
            Node::Loop(_, body) => 1 + count_headers(body),
            Node::If(_, then_body, else_body) => {
                let else_headers = else_body
                    .as_deref()
                    .map_or(0, |body| 1 + count_headers(body));
                1 + count_headers(then_body) + else_headers
            }
        })
        .sum()
}

fn expected_output(nodes: &[Node], output: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Print(value) => output.push(value.to_string()),
            Node::Loop(count, body) => {
                for _ in 0..*count {
                    expected_output(body, output);
                }
            }
            Node::If(condition, then_body, else_body) => {
                if *condition {
                    expected_output(then_body, output);
                } else if let Some(else_body) = else_body {
                    expected_output(else_body, output);
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn every_opened_block_is_closed(nodes in program_strategy()) {
        let mut source = String::new();
        render(&nodes, 0, &mut source);
        let translation = translator::translate(&source).expect("generated program translates");
        prop_assert_eq!(translation.blocks_opened, count_headers(&nodes));
        prop_assert_eq!(translation.blocks_opened, translation.blocks_closed);
    }

    #[test]
    fn indentation_decides_block_membership(nodes in program_strategy()) {
        let mut source = String::new();
        render(&nodes, 0, &mut source);
        let mut expected = Vec::new();
        expected_output(&nodes, &mut expected);
        let result = run(&source);
        prop_assert_eq!(result.error, None);
        prop_assert_eq!(result.output, expected);
    }

    #[test]
    fn runs_are_idempotent(nodes in program_strategy()) {
        let mut source = String::new();
        render(&nodes, 0, &mut source);
        prop_assert_eq!(run(&source), run(&source));
    }

    #[test]
    fn arbitrary_text_never_panics(source in "[a-z0-9 ():'\"\\[\\]=+\\-#\n]{0,80}") {
        let config = RunConfig::default()
            .with_step_limit(10_000)
            .with_range_limit(10_000);
        let result = run_with_config(&source, &config);
        prop_assert!(result.error.is_none() || result.output.is_empty());
    }
}
