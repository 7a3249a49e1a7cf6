use pretty_assertions::assert_eq;
use tagsplice_lib::config::Config;
use tagsplice_lib::host::{HostOptions, HostParser, TreeSitterHost};
use tagsplice_lib::reconcile::{DefaultTemplatePredicate, MatchRule};
use tagsplice_lib::rewriter::Placeholder;
use tagsplice_lib::{
    Dialect, HostNode, HostTree, SpliceError, SplicedDocument, Splicer, SyntaxKind, SyntaxNode, TemplateKind,
    TemplateNode, splice,
};

fn template_nodes(document: &SplicedDocument) -> Vec<&TemplateNode> {
    document.template_nodes().collect()
}

fn syntax_nodes(document: &SplicedDocument, kind: SyntaxKind) -> Vec<&SyntaxNode> {
    document
        .tree
        .root
        .pre_order()
        .filter_map(HostNode::as_syntax)
        .filter(|node| node.kind == kind)
        .collect()
}

#[test]
fn test_file_without_templates() {
    let document = splice("const a = { b: 1 };\n{ }\n", "plain.gts").unwrap();
    assert_eq!(document.templates, 0);
    assert!(template_nodes(&document).is_empty());
    assert_eq!(syntax_nodes(&document, SyntaxKind::ObjectExpression).len(), 1);
    assert_eq!(syntax_nodes(&document, SyntaxKind::BlockStatement).len(), 1);
}

#[test]
fn test_top_level_template_is_exact_match() {
    let source = "import Component from '@glimmer/component';\n\n<template>\n  <h1>Hello</h1>\n</template>\n";
    let document = splice(source, "hello.gts").unwrap();

    let start = source.find("<template>").unwrap();
    let end = source.rfind("</template>").unwrap() + "</template>".len();

    assert_eq!(document.templates, 1);
    assert_eq!(document.dialect, Dialect::TypeScript);
    assert_eq!(document.placeholders, vec![Placeholder::Block]);

    let nodes = template_nodes(&document);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].range, start..end);
    assert_eq!(nodes[0].replaced_kind, SyntaxKind::BlockStatement);
    assert_eq!(nodes[0].marker.rule, MatchRule::Exact);
    assert!(nodes[0].marker.is_default);
    assert_eq!(nodes[0].marker.template.contents, "\n  <h1>Hello</h1>\n");
    assert_eq!(nodes[0].marker.template.layout.as_ref().unwrap().indent, 2);
}

#[test]
fn test_satisfies_template_matches_through_parentheses() {
    let source = "import type { TOC } from '@ember/component/template-only';\n\nexport default <template>Hi</template> satisfies TOC<Sig>;\n";
    let document = splice(source, "typed.gts").unwrap();

    assert_eq!(document.placeholders, vec![Placeholder::ParenthesizedObject]);
    let nodes = template_nodes(&document);
    assert_eq!(nodes.len(), 1);

    let template_range = nodes[0].marker.template.range.clone();
    assert_eq!(nodes[0].range, template_range.start + 1..template_range.end - 1);
    assert!(nodes[0].parenthesized);
    assert_eq!(nodes[0].replaced_kind, SyntaxKind::ObjectExpression);
    assert_eq!(nodes[0].marker.rule, MatchRule::Parenthesized);
    assert!(nodes[0].marker.is_default);
}

#[test]
fn test_as_assertion_template() {
    let source = "const A = <template>Hi</template> as unknown as Component;\n";
    let document = splice(source, "cast.gts").unwrap();

    let nodes = template_nodes(&document);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].marker.rule, MatchRule::Parenthesized);
    assert!(!nodes[0].marker.is_default);
}

/// Host parser that moves the last top-level statement one byte to the right, the way a
/// placeholder of the wrong length would.
struct ShiftingHost;

impl HostParser for ShiftingHost {
    fn parse(&self, text: &str, options: &HostOptions) -> Result<HostTree, SpliceError> {
        let mut tree = TreeSitterHost.parse(text, options)?;
        if let HostNode::Syntax(program) = &mut tree.root
            && let Some(HostNode::Syntax(last)) = program.children.last_mut()
        {
            last.range = last.range.start + 1..last.range.end + 1;
        }
        Ok(tree)
    }
}

#[test]
fn test_shifted_placeholder_fails_reconciliation() {
    let source = "<template>a</template>\n<template>b</template>\n";
    let err = Splicer::default()
        .with_host_parser(ShiftingHost)
        .splice(source, "adjacent.gts")
        .unwrap_err();

    match err {
        SpliceError::Reconciliation { unconsumed, ranges } => {
            assert_eq!(unconsumed, 1);
            assert_eq!(ranges, vec![23..45]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_host_syntax_error_is_surfaced_with_location() {
    let source = "<template>Hi</template>\nconst a = ;\n";
    let err = splice(source, "broken.gts").unwrap_err();

    match &err {
        SpliceError::HostSyntax { file, location, .. } => {
            assert_eq!(file, "broken.gts");
            assert_eq!(location.line, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("broken.gts:2:"));
}

#[test]
fn test_scan_error_is_surfaced_with_location() {
    let err = splice("const a = 1;\n<template>oops", "unterminated.gts").unwrap_err();
    match err {
        SpliceError::Scan { location, .. } => assert_eq!(location.line, 2),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_class_member_template() {
    let source = "import Component from '@glimmer/component';\n\nexport default class Hello extends Component {\n  <template>Hello {{@name}}</template>\n}\n";
    let document = splice(source, "class.gts").unwrap();

    assert_eq!(document.placeholders, vec![Placeholder::StaticBlock]);
    let nodes = template_nodes(&document);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].replaced_kind, SyntaxKind::StaticBlock);
    assert_eq!(nodes[0].marker.template.kind, TemplateKind::ClassMember);
    assert_eq!(nodes[0].marker.template.contents, "Hello {{@name}}");
    assert!(!nodes[0].marker.is_default);
}

#[test]
fn test_several_templates_one_default() {
    let source = "\
const A = <template>a</template>;
const B = <template>b</template>;
export default <template><A /><B /></template>;
";
    let document = splice(source, "many.gts").unwrap();

    assert_eq!(document.templates, 3);
    let defaults: Vec<bool> = template_nodes(&document).iter().map(|n| n.marker.is_default).collect();
    assert_eq!(defaults, vec![false, false, true]);

    for node in template_nodes(&document) {
        assert_eq!(node.replaced_kind, SyntaxKind::ObjectExpression);
        assert_eq!(node.range, node.marker.template.range);
    }
}

#[test]
fn test_leading_comments_survive() {
    let source = "// The greeting\n<template>Hi</template>\n";
    let document = splice(source, "comment.gts").unwrap();

    let nodes = template_nodes(&document);
    assert_eq!(nodes[0].marker.leading_comments.len(), 1);
    assert_eq!(nodes[0].marker.leading_comments[0].text, "// The greeting");
    // The placeholder's own comment is not a host comment
    assert_eq!(document.tree.comments.len(), 1);
}

#[test]
fn test_ordinary_objects_and_blocks_stay_host_syntax() {
    let source = "const config = { a: 1 };\nif (config.a) { run(); }\n<template>Hi</template>\n";
    let document = splice(source, "mixed.gts").unwrap();

    assert_eq!(template_nodes(&document).len(), 1);
    let objects = syntax_nodes(&document, SyntaxKind::ObjectExpression);
    assert_eq!(objects.len(), 1);
    assert_eq!(&source[objects[0].range.clone()], "{ a: 1 }");
    let blocks = syntax_nodes(&document, SyntaxKind::BlockStatement);
    assert_eq!(blocks.len(), 1);
    assert_eq!(&source[blocks[0].range.clone()], "{ run(); }");
}

#[test]
fn test_template_text_cannot_escape_placeholder() {
    let source = "<template><a href=\"/docs/*/index\">*/ docs</a></template>\n";
    let document = splice(source, "slashes.gts").unwrap();
    assert_eq!(document.templates, 1);
    assert_eq!(document.rewritten.len(), source.len());
    assert!(!document.rewritten.contains("*/ docs"));
}

#[test]
fn test_javascript_dialect_from_extension() {
    let source = "const A = <template>a</template>;\nexport default class extends Base {\n  <template>b</template>\n}\n";
    let document = splice(source, "plain.gjs").unwrap();
    assert_eq!(document.dialect, Dialect::JavaScript);
    assert_eq!(document.templates, 2);
}

#[test]
fn test_utf16_ranges_account_for_surrogate_pairs() {
    let source = "const s = '😀';\n<template>ü</template>\n";
    let document = splice(source, "emoji.gts").unwrap();

    let template = &template_nodes(&document)[0].marker.template;
    let start = source.find("<template>").unwrap();
    // The emoji is four UTF-8 bytes but two UTF-16 code units
    assert_eq!(template.utf16_range.start, start - 2);
    // `ü` is two UTF-8 bytes but one UTF-16 code unit
    assert_eq!(template.utf16_range.len(), template.range.len() - 1);
}

#[test]
fn test_implicit_default_can_be_disabled() {
    let config = Config {
        implicit_default_template: false,
        ..Config::default()
    };
    let document = Splicer::new(config).splice("<template>Hi</template>\n", "a.gts").unwrap();
    assert!(!template_nodes(&document)[0].marker.is_default);

    let document = Splicer::new(Config {
        implicit_default_template: false,
        ..Config::default()
    })
    .splice("export default <template>Hi</template>;\n", "a.gts")
    .unwrap();
    assert!(template_nodes(&document)[0].marker.is_default);
}

#[test]
fn test_default_detection_is_positional() {
    struct InsideClass;

    impl DefaultTemplatePredicate for InsideClass {
        fn is_default(&self, _node: &SyntaxNode, ancestors: &[&SyntaxNode]) -> bool {
            ancestors.iter().any(|a| a.kind == SyntaxKind::ClassBody)
        }
    }

    let source = "<template>a</template>\nclass A {\n  <template>b</template>\n}\n";
    let document = Splicer::default()
        .with_default_predicate(InsideClass)
        .splice(source, "custom.gts")
        .unwrap();

    let defaults: Vec<(String, bool)> = template_nodes(&document)
        .iter()
        .map(|n| (n.marker.template.contents.clone(), n.marker.is_default))
        .collect();
    assert_eq!(defaults, vec![("a".to_string(), false), ("b".to_string(), true)]);
}

#[test]
fn test_dialect_override_from_config() {
    let config = Config {
        dialect: Some(Dialect::JavaScript),
        ..Config::default()
    };
    let splicer = Splicer::new(config);
    assert_eq!(splicer.config().dialect, Some(Dialect::JavaScript));

    let document = splicer.splice("<template>Hi</template>\n", "component.gts").unwrap();
    assert_eq!(document.dialect, Dialect::JavaScript);
}

#[test]
fn test_document_serializes_template_nodes() {
    let document = splice("export default <template>Hi</template>;\n", "json.gts").unwrap();
    let value = serde_json::to_value(&document).unwrap();

    assert_eq!(value["templates"], 1);
    assert_eq!(value["dialect"], "typescript");
    let export = &value["tree"]["root"]["children"][0];
    assert_eq!(export["kind"], "ExportDefaultDeclaration");
    let template = &export["children"][0];
    assert_eq!(template["type"], "Template");
    assert_eq!(template["marker"]["is_default"], true);
    assert_eq!(template["marker"]["rule"], "exact");
    assert_eq!(template["marker"]["template"]["contents"], "Hi");
}

#[test]
fn test_class_with_signature_type_argument() {
    let source = "import Component from '@glimmer/component';\n\nexport default class Hello extends Component<{ Args: { name: string } }> {\n  <template>Hi {{@name}}</template>\n}\n";
    let document = splice(source, "signature.gts").unwrap();

    assert_eq!(document.placeholders, vec![Placeholder::StaticBlock]);
    let nodes = template_nodes(&document);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].replaced_kind, SyntaxKind::StaticBlock);
    assert_eq!(nodes[0].marker.template.kind, TemplateKind::ClassMember);
}

#[test]
fn test_class_with_constrained_type_parameter() {
    let document = splice("class Box<T extends { a: 1 }> {\n  <template>x</template>\n}\n", "box.gts").unwrap();
    assert_eq!(template_nodes(&document)[0].replaced_kind, SyntaxKind::StaticBlock);
}

#[test]
fn test_file_without_semicolons() {
    let source = "\
import Component from '@glimmer/component'
import { tracked } from '@glimmer/tracking'

const Label = <template>label</template>

class Counter extends Component {
  @tracked count = 0
  <template>{{this.count}}</template>
}

<template>
  <Label />
</template>
";
    let document = splice(source, "no-semi.gts").unwrap();

    assert_eq!(document.templates, 3);
    let kinds: Vec<(SyntaxKind, bool)> = template_nodes(&document)
        .iter()
        .map(|n| (n.replaced_kind, n.marker.is_default))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (SyntaxKind::ObjectExpression, false),
            (SyntaxKind::StaticBlock, false),
            (SyntaxKind::BlockStatement, true),
        ]
    );
}

#[test]
fn test_regex_after_if_head() {
    let source = "if (ok) /x'/.test(s);\nconst A = <template>a</template>;\n";
    let document = splice(source, "regex.gts").unwrap();
    assert_eq!(document.templates, 1);
}

#[test]
fn test_several_standalone_templates_have_no_default() {
    let document = splice("<template>a</template>\n<template>b</template>\n", "two.gts").unwrap();

    let kinds: Vec<(SyntaxKind, bool)> = template_nodes(&document)
        .iter()
        .map(|n| (n.replaced_kind, n.marker.is_default))
        .collect();
    assert_eq!(
        kinds,
        vec![(SyntaxKind::BlockStatement, false), (SyntaxKind::BlockStatement, false)]
    );
    assert_eq!(document.report.default_count(), 0);
}

#[test]
fn test_report_is_exposed() {
    let source = "const A = <template>a</template>;\nexport default <template>b</template> satisfies TOC;\n";
    let document = splice(source, "report.gts").unwrap();

    assert_eq!(document.report.matched(), 2);
    assert_eq!(document.report.tolerant_matches(), 1);
    assert_eq!(document.report.default_count(), 1);
    assert_eq!(document.report.decisions[1].rule, MatchRule::Parenthesized);
}
