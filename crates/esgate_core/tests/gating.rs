use esgate_core::{Feature, FeatureSet, ParseOptions, parse, tokenize};
use rstest::rstest;

fn with_feature(feature: Feature, enabled: bool) -> ParseOptions {
    ParseOptions::default().with_feature(feature, enabled)
}

/// Every gated construct fails with its feature explicitly off and parses
/// with it on.  Explicitly switching the feature off keeps the ES2015
/// dialect, so the failure comes from gating rather than from the grammar.
#[rstest]
#[case(Feature::ArrowFunctions, "var f = x => x;")]
#[case(Feature::BlockBindings, "let x = 1;")]
#[case(Feature::BlockBindings, "const x = 1;")]
#[case(Feature::RegexUFlag, "/a/u;")]
#[case(Feature::RegexYFlag, "/a/y;")]
#[case(Feature::TemplateStrings, "`a${b}c`;")]
#[case(Feature::BinaryLiterals, "0b1;")]
#[case(Feature::OctalLiterals, "0o7;")]
#[case(Feature::SuperInFunctions, "super.x;")]
#[case(Feature::DefaultParams, "function f(a = 1) {}")]
#[case(Feature::RestParams, "function f(...a) {}")]
#[case(Feature::ForOf, "for (x of y);")]
#[case(Feature::ObjectLiteralComputedProperties, "({[a]: 1});")]
#[case(Feature::ObjectLiteralShorthandMethods, "({f() {}});")]
#[case(Feature::ObjectLiteralShorthandProperties, "({a});")]
#[case(Feature::Generators, "function* g() {}")]
#[case(Feature::Generators, "function* g() { yield 1; }")]
#[case(Feature::Destructuring, "var [a, b] = c;")]
#[case(Feature::Destructuring, "var {a: b} = c;")]
#[case(Feature::Destructuring, "[a, b] = c;")]
#[case(Feature::Classes, "class A {}")]
#[case(Feature::Classes, "(class {});")]
#[case(Feature::Modules, "export var a = 1;")]
#[case(Feature::Modules, "import a from 'a';")]
#[case(Feature::Spread, "f(...a);")]
#[case(Feature::Jsx, "<a />;")]
fn test_feature_gates_construct(#[case] feature: Feature, #[case] source: &str) {
    assert!(
        parse(source, &with_feature(feature, false)).is_err(),
        "{feature} off should reject {source:?}"
    );
    if let Err(err) = parse(source, &with_feature(feature, true)) {
        panic!("{feature} on should accept {source:?}: {err}");
    }
}

#[rstest]
#[case("=>", Feature::ArrowFunctions, "a => a")]
#[case("0o7", Feature::OctalLiterals, "0o7")]
#[case("`", Feature::TemplateStrings, "`a`")]
#[case("...", Feature::Spread, "...a")]
fn test_tokenize_gates_token(#[case] rejected: &str, #[case] feature: Feature, #[case] source: &str) {
    let err = tokenize(source, &with_feature(feature, false)).unwrap_err();
    assert_eq!(err.message, format!("Unexpected token {rejected}"));
    assert!(tokenize(source, &with_feature(feature, true)).is_ok());
}

#[test]
fn test_binary_literal_scenario() {
    let err = parse("0b101", &with_feature(Feature::BinaryLiterals, false)).unwrap_err();
    assert_eq!(err.index, 0);
    assert_eq!((err.line_number, err.column), (1, 1));

    let mut opts = with_feature(Feature::BinaryLiterals, true);
    opts.tokens = true;
    let tokens = parse("0b101", &opts).unwrap().tokens.unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, "Numeric");
    assert_eq!(tokens[0].value, "5");
}

#[test]
fn test_generator_scenario() {
    assert!(parse("function* g(){}", &with_feature(Feature::Generators, false)).is_err());
    let program = parse("function* g(){}", &with_feature(Feature::Generators, true)).unwrap();
    let json = serde_json::to_value(&program).unwrap();
    assert_eq!(json["body"][0]["type"], "FunctionDeclaration");
    assert_eq!(json["body"][0]["generator"], true);
}

#[rstest]
#[case(r#"{}"#)]
#[case(r#"{"sourceType": "module"}"#)]
#[case(r#"{"ecmaFeatures": {"blockBindings": false}}"#)]
#[case(r#"{"ecmaFeatures": {"jsx": true, "globalReturn": true}}"#)]
#[case(r#"{"range": true, "loc": true, "attachComment": true, "tokens": true}"#)]
fn test_var_declaration_always_parses(#[case] options: &str) {
    let opts = ParseOptions::from_json(options).unwrap();
    let program = parse("var x = 1;", &opts).unwrap();
    assert_eq!(program.body().len(), 1);
}

#[rstest]
#[case("import { a as b } from 'm'; export default function () {}")]
#[case("export const f = (x, ...rest) => `${x}`;")]
#[case("class A extends B { *g() { yield super.g(); } }")]
#[case("let [a, {b = 1}] = c; for (const d of a) {}")]
#[case("var o = {a, [b]: 1, c() {}, get d() { return 0b10 + 0o7; }};")]
fn test_module_source_type_equals_explicit_bundle(#[case] source: &str) {
    let module = ParseOptions::from_json(r#"{"sourceType": "module", "range": true, "tokens": true}"#)
        .unwrap();
    let explicit = ParseOptions {
        range: true,
        tokens: true,
        ecma_features: FeatureSet::module_bundle(),
        ..ParseOptions::default()
    };
    let a = serde_json::to_value(parse(source, &module).unwrap()).unwrap();
    let b = serde_json::to_value(parse(source, &explicit).unwrap()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a["sourceType"], "module");
}

#[test]
fn test_jsx_implies_spread() {
    let jsx = with_feature(Feature::Jsx, true);
    assert!(parse("f(...a);", &jsx).is_ok());
    assert!(parse("<a {...props} />;", &jsx).is_ok());

    let no_spread = jsx.with_feature(Feature::Spread, false);
    assert!(parse("f(...a);", &no_spread).is_err());
}

#[test]
fn test_dual_gates_accept_either_feature() {
    assert!(parse("function f(a = 1) {}", &with_feature(Feature::Destructuring, true)).is_ok());
    assert!(parse("super.x;", &with_feature(Feature::Classes, true)).is_ok());
    // The rest element is allowed by `destructuring`, but the `...` token
    // still needs `restParams` or `spread`.
    let destructuring = with_feature(Feature::Destructuring, true);
    assert!(parse("function f(...a) {}", &destructuring).is_err());
    assert!(parse("function f(...a) {}", &destructuring.with_feature(Feature::Spread, true)).is_ok());
}

#[test]
fn test_gating_error_message_names_the_construct() {
    let err = parse("var a;\nclass A {}", &with_feature(Feature::Classes, false)).unwrap_err();
    assert_eq!(err.message, "Unexpected token class");
    assert_eq!(err.index, 7);
    assert_eq!((err.line_number, err.column), (2, 1));
}
