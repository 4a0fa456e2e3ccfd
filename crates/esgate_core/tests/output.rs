use std::collections::BTreeSet;

use esgate_core::{ParseOptions, parse, tokenize};
use rstest::rstest;
use serde_json::{Value, json};

fn opts(json: &str) -> ParseOptions {
    ParseOptions::from_json(json).unwrap()
}

fn token_values(source: &str, options: &str) -> Vec<(String, String)> {
    tokenize(source, &opts(options))
        .unwrap()
        .tokens
        .into_iter()
        .map(|t| (t.kind.to_string(), t.value))
        .collect()
}

#[rstest]
#[case("0x1F", "31")]
#[case("017", "15")]
#[case("1e3", "1000")]
#[case(".5", "0.5")]
#[case("1.50", "1.5")]
#[case("1e21", "1e+21")]
fn test_numeric_value_is_decimal_form(#[case] source: &str, #[case] expected: &str) {
    let tokens = token_values(source, "{}");
    assert_eq!(tokens, vec![("Numeric".to_string(), expected.to_string())]);
}

#[test]
fn test_radix_literals_normalize_in_es2015() {
    let tokens = token_values(
        "0b101; 0O17",
        r#"{"ecmaFeatures": {"binaryLiterals": true, "octalLiterals": true}}"#,
    );
    let numbers: Vec<_> = tokens.iter().filter(|(k, _)| k == "Numeric").map(|(_, v)| v.as_str()).collect();
    assert_eq!(numbers, vec!["5", "15"]);
}

#[test]
fn test_string_value_is_json_rendering() {
    let tokens = token_values(r"'a\tb'", "{}");
    assert_eq!(tokens, vec![("String".to_string(), "\"a\\tb\"".to_string())]);

    let tokens = token_values(r#"'say "hi"'"#, "{}");
    assert_eq!(tokens[0].1, r#""say \"hi\"""#);
}

#[test]
fn test_token_categories() {
    let tokens = token_values(
        "if (a >= 1) { b += `t${c}`; } /x/gi; ...d",
        r#"{"ecmaFeatures": {"templateStrings": true, "spread": true}}"#,
    );
    let expected = [
        ("Keyword", "if"),
        ("Punctuator", "("),
        ("Identifier", "a"),
        ("Punctuator", ">="),
        ("Numeric", "1"),
        ("Punctuator", ")"),
        ("Punctuator", "{"),
        ("Identifier", "b"),
        ("Punctuator", "+="),
        ("Punctuator", "`"),
        ("Template", "t"),
        ("Punctuator", "${"),
        ("Identifier", "c"),
        ("Punctuator", "}"),
        ("Template", ""),
        ("Punctuator", "`"),
        ("Punctuator", ";"),
        ("Punctuator", "}"),
        ("RegularExpression", "/x/gi"),
        ("Punctuator", ";"),
        ("Punctuator", "..."),
        ("Identifier", "d"),
    ];
    let expected: Vec<_> = expected.iter().map(|&(k, v)| (k.to_string(), v.to_string())).collect();
    assert_eq!(tokens, expected);
}

#[test]
fn test_regex_token_carries_pattern_and_flags() {
    let list = tokenize("/a+b/g", &ParseOptions::default()).unwrap();
    let json = serde_json::to_value(&list.tokens).unwrap();
    assert_eq!(
        json,
        json!([{"type": "RegularExpression", "value": "/a+b/g", "regex": {"pattern": "a+b", "flags": "g"}}])
    );
}

#[test]
fn test_positions_only_when_requested() {
    let list = tokenize("a", &ParseOptions::default()).unwrap();
    let json = serde_json::to_value(&list).unwrap();
    assert_eq!(json, json!({"tokens": [{"type": "Identifier", "value": "a"}]}));

    let list = tokenize("a\n b", &opts(r#"{"range": true, "loc": true}"#)).unwrap();
    let json = serde_json::to_value(&list.tokens[1]).unwrap();
    assert_eq!(
        json,
        json!({
            "type": "Identifier",
            "value": "b",
            "range": [3, 4],
            "loc": {"start": {"line": 2, "column": 1}, "end": {"line": 2, "column": 2}}
        })
    );
}

#[test]
fn test_loc_source_recorded() {
    let program = parse("a", &opts(r#"{"loc": true, "source": "in.js", "tokens": true}"#)).unwrap();
    let json = serde_json::to_value(&program).unwrap();
    assert_eq!(json["loc"]["source"], "in.js");
    assert_eq!(json["body"][0]["loc"]["source"], "in.js");
    assert_eq!(json["tokens"][0]["loc"]["source"], "in.js");
}

#[rstest]
#[case("a;\n\n/* tail */\n")]
#[case("function f() {}   ")]
#[case("x = 1 // trailing")]
fn test_program_closes_at_last_token(#[case] source: &str) {
    let program = parse(source, &opts(r#"{"range": true, "loc": true, "tokens": true}"#)).unwrap();
    let tokens = program.tokens.as_ref().unwrap();
    let last = tokens.last().unwrap();
    assert_eq!(program.root.range.unwrap()[1], last.range.unwrap()[1]);
    let (program_loc, token_loc) = (program.root.loc.as_ref().unwrap(), last.loc.as_ref().unwrap());
    assert_eq!(program_loc.end, token_loc.end);
}

fn collect_ranges(value: &Value, out: &mut Vec<(String, [u64; 2])>) {
    match value {
        Value::Object(map) => {
            if let (Some(Value::String(kind)), Some(Value::Array(range))) = (map.get("type"), map.get("range"))
                && let [Some(start), Some(end)] = [range[0].as_u64(), range[1].as_u64()]
            {
                out.push((kind.clone(), [start, end]));
            }
            for (key, child) in map {
                if key != "tokens" && key != "comments" {
                    collect_ranges(child, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_ranges(item, out)),
        _ => {}
    }
}

#[rstest]
#[case("{}", "var a = [1, 2]; function f(b) { return b + a[0]; }")]
#[case("{}", "for (var i in o) if (o[i]) { x.y(i, 'z'); } else throw new Error(i);")]
#[case(r#"{"sourceType": "module"}"#, "export default class A { static m({p}, ...q) { return [p, ...q]; } }")]
#[case(r#"{"ecmaFeatures": {"jsx": true}}"#, "var el = <div id=\"a\"><b>{x}</b></div>;")]
fn test_node_ranges_align_with_tokens(#[case] options: &str, #[case] source: &str) {
    let mut options = opts(options);
    options.range = true;
    options.tokens = true;
    let program = parse(source, &options).unwrap();

    let tokens = program.tokens.as_ref().unwrap();
    let starts: BTreeSet<u64> = tokens.iter().map(|t| t.range.unwrap()[0] as u64).collect();
    let ends: BTreeSet<u64> = tokens.iter().map(|t| t.range.unwrap()[1] as u64).collect();

    let mut ranges = Vec::new();
    collect_ranges(&serde_json::to_value(&program).unwrap(), &mut ranges);
    assert!(ranges.len() > 5);
    for (kind, [start, end]) in ranges {
        assert!(starts.contains(&start), "{kind} starts at {start}, not on a token");
        assert!(ends.contains(&end), "{kind} ends at {end}, not on a token");
    }
}

#[test]
fn test_attached_comments_shape() {
    let program = parse(
        "// lead\nvar a = 1; /* trail */",
        &opts(r#"{"attachComment": true}"#),
    )
    .unwrap();
    let json = serde_json::to_value(&program).unwrap();
    let decl = &json["body"][0];
    assert_eq!(decl["leadingComments"], json!([{"type": "Line", "value": " lead", "range": [0, 7]}]));
    assert_eq!(decl["trailingComments"], json!([{"type": "Block", "value": " trail ", "range": [19, 30]}]));
    assert_eq!(json["comments"].as_array().map(Vec::len), Some(2));

    let text = serde_json::to_string(&program).unwrap();
    assert!(text.contains(r#""leadingComments":[{"type":"Line","value":" lead","range":[0,7]}]"#));
}

#[rstest]
#[case("x = [ /*c*/ ];", "/body/0/expression/right")]
#[case("x = { /*c*/ };", "/body/0/expression/right")]
#[case("f( /*c*/ );", "/body/0/expression")]
fn test_comment_inside_empty_node_is_not_attached(#[case] source: &str, #[case] pointer: &str) {
    let program = parse(source, &opts(r#"{"range": true, "attachComment": true}"#)).unwrap();
    let json = serde_json::to_value(&program).unwrap();
    let node = json.pointer(pointer).unwrap();
    assert!(node.get("leadingComments").is_none(), "{node}");
    assert!(node.get("trailingComments").is_none(), "{node}");
    assert_eq!(json["comments"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_comment_between_statements_trails_and_leads() {
    let program = parse("var a; /* mid */ var b;", &opts(r#"{"attachComment": true}"#)).unwrap();
    let json = serde_json::to_value(&program).unwrap();
    let mid = json!([{"type": "Block", "value": " mid ", "range": [7, 16]}]);
    assert_eq!(json["body"][0]["trailingComments"], mid);
    assert_eq!(json["body"][1]["leadingComments"], mid);
}

#[test]
fn test_comment_between_elements_leads_the_next() {
    let program = parse("[a, /*c*/ b];", &opts(r#"{"range": true, "attachComment": true}"#)).unwrap();
    let json = serde_json::to_value(&program).unwrap();
    let elements = &json["body"][0]["expression"]["elements"];
    assert_eq!(elements[1]["leadingComments"], json!([{"type": "Block", "value": "c", "range": [4, 9]}]));
    assert!(elements[0].get("trailingComments").is_none());
}

#[rstest]
#[case("if (a) /b/.test(c);", 1)]
#[case("while (x) /y/g.exec(z);", 1)]
#[case("if (a) {} /b/g.test(c);", 1)]
#[case("function f() {}\n/re/.exec(s);", 1)]
#[case("var x = {} / 2;", 0)]
#[case("x = function () {} / 2;", 0)]
#[case("x = (a) / b / c;", 0)]
#[case("x = {a: {}} / 2;", 0)]
fn test_slash_after_closing_bracket(#[case] source: &str, #[case] regexes: usize) {
    let list = tokenize(source, &ParseOptions::default()).unwrap();
    let found = list.tokens.iter().filter(|t| t.kind == "RegularExpression").count();
    assert_eq!(found, regexes, "{source}");
    if let Err(err) = parse(source, &ParseOptions::default()) {
        panic!("{source:?} should parse: {err}");
    }
}

#[test]
fn test_regex_after_if_head_is_one_token() {
    let tokens = token_values("if (a) /b/g.test(c);", "{}");
    assert_eq!(tokens[4], ("RegularExpression".to_string(), "/b/g".to_string()));
    assert_eq!(tokens.len(), 11);
}
