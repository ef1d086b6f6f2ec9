//! Cast-site discovery.
//!
//! Finds every `cast_expression` in a parsed translation unit and turns it into
//! a [`CastSite`] carrying exact byte positions, the verbatim destination type
//! spelling and the types needed for classification.
//!
//! Casts to a type name declared in the file parse as arithmetic or calls when
//! the operand starts with a prefix operator or a parenthesis: `(MyInt)*p` is a
//! `binary_expression` and `(Foo)(x)` a `call_expression`. Both shapes are
//! recovered when the parenthesized name is a known type.

use super::decls::{descriptor_type, DeclarationIndex};
use super::parser::CstTree;
use crate::plan::{CastOrigin, CastSite, Operand};
use crate::types::{CType, CTypeKind, CTypeModel, TypeModel, TypeShape};
use tree_sitter::Node;

/// Options controlling which casts count as macro-originated.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryOptions {
    /// Treat casts inside arguments of function-like macros defined in the
    /// same file as macro expansions.
    pub skip_macro_arguments: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            skip_macro_arguments: true,
        }
    }
}

/// Result of scanning one translation unit.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Well-formed sites, in document order.
    pub sites: Vec<CastSite>,
    /// Lines of cast expressions that contained syntax errors.
    pub malformed_lines: Vec<usize>,
}

/// Prefix operators that make `(Name) op x` a cast rather than arithmetic.
const PREFIX_OPERATORS: &[&str] = &["*", "&", "-", "+"];

/// Operand kinds binding at least as tightly as a cast.
const UNARY_OPERAND_KINDS: &[&str] = &[
    "identifier",
    "qualified_identifier",
    "field_expression",
    "subscript_expression",
    "call_expression",
    "parenthesized_expression",
    "pointer_expression",
    "unary_expression",
    "update_expression",
    "cast_expression",
    "sizeof_expression",
    "number_literal",
    "string_literal",
    "char_literal",
    "true",
    "false",
    "null",
    "this",
];

/// Collects the cast sites of `tree`.
#[must_use]
pub fn discover_casts(
    tree: &CstTree,
    index: &DeclarationIndex,
    model: &CTypeModel,
    options: DiscoveryOptions,
) -> Discovery {
    let mut discovery = Discovery::default();

    for node in tree.find_by_kind("cast_expression") {
        let line = node.start_position().row + 1;
        if node.has_error() {
            discovery.malformed_lines.push(line);
            continue;
        }
        match build_site(tree, index, model, node, options) {
            Some(site) => discovery.sites.push(site),
            None => discovery.malformed_lines.push(line),
        }
    }

    for node in tree.find_by_kind("binary_expression") {
        if !node.has_error() {
            if let Some(site) = build_prefix_site(tree, index, model, node, options) {
                discovery.sites.push(site);
            }
        }
    }
    for node in tree.find_by_kind("call_expression") {
        if !node.has_error() {
            if let Some(site) = build_call_site(tree, index, model, node, options) {
                discovery.sites.push(site);
            }
        }
    }

    discovery.sites.sort_by_key(|site| site.lparen);
    discovery.malformed_lines.sort_unstable();
    discovery
}

fn build_site(
    tree: &CstTree,
    index: &DeclarationIndex,
    model: &CTypeModel,
    node: Node<'_>,
    options: DiscoveryOptions,
) -> Option<CastSite> {
    let descriptor = node.child_by_field_name("type")?;
    let value = node.child_by_field_name("value")?;
    let lparen = delimiter_before(tree, descriptor, '(')?;
    let rparen = delimiter_after(tree, descriptor, ')')?;

    let dest_type = descriptor_type(tree, descriptor);
    let source_type = bind_reference(model, &dest_type, index.expr_type(tree, value));

    Some(CastSite {
        lparen,
        rparen,
        dest_type_text: tree.slice(lparen + 1, rparen).to_owned(),
        operand: Operand {
            start: value.start_byte(),
            end: value.end_byte(),
            parenthesized: value.kind() == "parenthesized_expression",
        },
        origin: origin_of(tree, index, model, node, &dest_type, options),
        source_type,
        dest_type,
        line: node.start_position().row + 1,
    })
}

/// `(Name) op x`, parsed as `binary_expression(left: (Name), op, right: x)`.
fn build_prefix_site(
    tree: &CstTree,
    index: &DeclarationIndex,
    model: &CTypeModel,
    node: Node<'_>,
    options: DiscoveryOptions,
) -> Option<CastSite> {
    let left = node.child_by_field_name("left")?;
    let operator = node.child_by_field_name("operator")?;
    let right = node.child_by_field_name("right")?;

    let op = tree.text(operator);
    // `(Name)-x * y` groups as `(Name) - (x * y)`; only a unary-level right
    // operand keeps the cast's own grouping.
    if !PREFIX_OPERATORS.contains(&op) || !UNARY_OPERAND_KINDS.contains(&right.kind()) {
        return None;
    }
    let name = index.parenthesized_type_name(tree, left)?;
    let (lparen, rparen) = paren_delimiters(tree, left)?;

    let dest_type = CType::named(name);
    let source_type = bind_reference(model, &dest_type, index.prefix_type(tree, op, right));

    Some(CastSite {
        lparen,
        rparen,
        dest_type_text: tree.slice(lparen + 1, rparen).to_owned(),
        operand: Operand {
            start: operator.start_byte(),
            end: right.end_byte(),
            parenthesized: false,
        },
        origin: origin_of(tree, index, model, node, &dest_type, options),
        source_type,
        dest_type,
        line: node.start_position().row + 1,
    })
}

/// `(Name)(x)`, parsed as `call_expression(function: (Name), arguments: (x))`.
fn build_call_site(
    tree: &CstTree,
    index: &DeclarationIndex,
    model: &CTypeModel,
    node: Node<'_>,
    options: DiscoveryOptions,
) -> Option<CastSite> {
    let function = node.child_by_field_name("function")?;
    let arguments = node.child_by_field_name("arguments")?;
    if arguments.kind() != "argument_list" || arguments.named_child_count() != 1 {
        return None;
    }
    let name = index.parenthesized_type_name(tree, function)?;
    let argument = arguments.named_child(0)?;
    let (lparen, rparen) = paren_delimiters(tree, function)?;

    let dest_type = CType::named(name);
    let source_type = bind_reference(model, &dest_type, index.expr_type(tree, argument));

    Some(CastSite {
        lparen,
        rparen,
        dest_type_text: tree.slice(lparen + 1, rparen).to_owned(),
        operand: Operand {
            start: arguments.start_byte(),
            end: arguments.end_byte(),
            parenthesized: true,
        },
        origin: origin_of(tree, index, model, node, &dest_type, options),
        source_type,
        dest_type,
        line: node.start_position().row + 1,
    })
}

/// Offsets of the `(` and `)` of a parenthesized type name.
fn paren_delimiters(tree: &CstTree, parenthesized: Node<'_>) -> Option<(usize, usize)> {
    let inner = parenthesized.named_child(0)?;
    Some((
        delimiter_before(tree, inner, '(')?,
        delimiter_after(tree, inner, ')')?,
    ))
}

/// A cast to a reference binds the operand as an lvalue.
fn bind_reference(model: &CTypeModel, dest_type: &CType, source_type: CType) -> CType {
    if model.shape(&model.canonical(dest_type)) == TypeShape::Reference
        && !matches!(source_type.kind, CTypeKind::Reference(_) | CTypeKind::Unknown)
    {
        CType::reference_to(source_type)
    } else {
        source_type
    }
}

fn origin_of(
    tree: &CstTree,
    index: &DeclarationIndex,
    model: &CTypeModel,
    node: Node<'_>,
    dest_type: &CType,
    options: DiscoveryOptions,
) -> CastOrigin {
    if in_macro_context(tree, index, node, options) {
        CastOrigin::MacroExpansion
    } else if model.canonical(dest_type).is_void() {
        CastOrigin::DiscardedValue
    } else {
        CastOrigin::Source
    }
}

/// Offset of the `delimiter` token directly preceding `node`.
fn delimiter_before(tree: &CstTree, node: Node<'_>, delimiter: char) -> Option<usize> {
    let prev = node.prev_sibling()?;
    (tree.text(prev).starts_with(delimiter)).then(|| prev.start_byte())
}

/// Offset of the `delimiter` token directly following `node`.
fn delimiter_after(tree: &CstTree, node: Node<'_>, delimiter: char) -> Option<usize> {
    let next = node.next_sibling()?;
    (tree.text(next).starts_with(delimiter)).then(|| next.start_byte())
}

/// Whether the cast sits where rewriting would corrupt preprocessing: inside
/// an argument of a function-like macro or inside an `#if` condition.
fn in_macro_context(
    tree: &CstTree,
    index: &DeclarationIndex,
    node: Node<'_>,
    options: DiscoveryOptions,
) -> bool {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        match ancestor.kind() {
            "call_expression" if options.skip_macro_arguments => {
                let is_macro_call = ancestor.child_by_field_name("function").is_some_and(|f| {
                    f.kind() == "identifier" && index.is_function_macro(tree.text(f))
                });
                let in_arguments = ancestor
                    .child_by_field_name("arguments")
                    .is_some_and(|args| contains(args, node));
                if is_macro_call && in_arguments {
                    return true;
                }
            }
            "preproc_if" | "preproc_elif" => {
                if ancestor
                    .child_by_field_name("condition")
                    .is_some_and(|condition| contains(condition, node))
                {
                    return true;
                }
            }
            _ => {}
        }
        current = ancestor.parent();
    }
    false
}

fn contains(outer: Node<'_>, inner: Node<'_>) -> bool {
    outer.start_byte() <= inner.start_byte() && inner.end_byte() <= outer.end_byte()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::CstParser;

    fn discover(source: &str) -> Discovery {
        let tree = CstParser::new().unwrap().parse(source).unwrap();
        let index = DeclarationIndex::build(&tree);
        let model = CTypeModel::new(index.aliases().clone());
        discover_casts(&tree, &index, &model, DiscoveryOptions::default())
    }

    #[test]
    fn test_site_positions() {
        let source = "int f(double x) { return (int) x; }\n";
        let discovery = discover(source);
        assert_eq!(discovery.sites.len(), 1);

        let site = &discovery.sites[0];
        assert_eq!(site.lparen, source.find("(int)").unwrap());
        assert_eq!(site.rparen, site.lparen + 4);
        assert_eq!(site.dest_type_text, "int");
        assert_eq!(site.operand.start, source.find("x;").unwrap());
        assert_eq!(site.operand.end, site.operand.start + 1);
        assert!(!site.operand.parenthesized);
        assert_eq!(site.source_type, CType::named("double"));
        assert_eq!(site.origin, CastOrigin::Source);
        assert_eq!(site.line, 1);
    }

    #[test]
    fn test_parenthesized_operand() {
        let discovery = discover("int f(int a, int b) { return (long)(a + b); }\n");
        assert!(discovery.sites[0].operand.parenthesized);
    }

    #[test]
    fn test_void_cast_is_discarded_value() {
        let discovery = discover("void f(int unused) { (void)unused; }\n");
        assert_eq!(discovery.sites[0].origin, CastOrigin::DiscardedValue);
    }

    #[test]
    fn test_macro_argument_is_macro_expansion() {
        let source = "#define CHECK(x) x\nvoid f(double d) { CHECK((int)d); }\n";
        let discovery = discover(source);
        assert_eq!(discovery.sites.len(), 1);
        assert_eq!(discovery.sites[0].origin, CastOrigin::MacroExpansion);
    }

    #[test]
    fn test_reference_cast_binds_operand() {
        let source = "struct W {};\nvoid f(const W w) { (W&)w; }\n";
        let discovery = discover(source);
        let site = &discovery.sites[0];
        assert_eq!(site.source_type.to_string(), "const W &");
        assert_eq!(site.dest_type.to_string(), "W &");
    }

    #[test]
    fn test_cast_to_typedef_before_dereference() {
        let source = "typedef int MyInt;\nMyInt f(const int *p) { return (MyInt)*p; }\n";
        let discovery = discover(source);
        assert_eq!(discovery.sites.len(), 1);

        let site = &discovery.sites[0];
        assert_eq!(site.lparen, source.find("(MyInt)").unwrap());
        assert_eq!(site.dest_type_text, "MyInt");
        assert_eq!(site.operand.start, source.find("*p;").unwrap());
        assert_eq!(site.operand.end, site.operand.start + 2);
        assert!(!site.operand.parenthesized);
        assert_eq!(site.source_type.to_string(), "const int");
        assert_eq!(site.line, 2);
    }

    #[test]
    fn test_cast_to_record_with_parenthesized_operand() {
        let source = "struct Foo { Foo(int) {} };\nvoid f(int x) { Foo y = (Foo)(x); }\n";
        let discovery = discover(source);
        assert_eq!(discovery.sites.len(), 1);

        let site = &discovery.sites[0];
        assert_eq!(site.dest_type, CType::named("Foo"));
        assert_eq!(site.operand.start, source.find("(x)").unwrap());
        assert!(site.operand.parenthesized);
        assert_eq!(site.source_type, CType::named("int"));
    }

    #[test]
    fn test_arithmetic_on_parenthesized_variables_is_not_a_cast() {
        let discovery = discover("int f(int a, int b) { return (a)*b + (a)(b); }\n");
        assert!(discovery.sites.is_empty());
    }

    #[test]
    fn test_binary_right_operand_is_not_a_cast_operand() {
        let source = "typedef int MyInt;\nint f(int x, int y) { return (MyInt)-x * y; }\n";
        let product = source.find(" * y").unwrap();
        assert!(discover(source)
            .sites
            .iter()
            .all(|site| site.operand.end <= product));
    }

    #[test]
    fn test_nested_casts_are_both_found() {
        let discovery = discover("int f(double d) { return (int)(char)d; }\n");
        assert_eq!(discovery.sites.len(), 2);
        assert_eq!(discovery.sites[0].dest_type_text, "int");
        assert_eq!(discovery.sites[1].dest_type_text, "char");
        assert_eq!(discovery.sites[0].source_type, CType::named("char"));
    }
}
