//! Declaration index and best-effort expression typing.
//!
//! Tree-sitter gives syntax only, so the types the classifier needs are
//! reconstructed from the declarations written in the same translation unit:
//! variables, parameters, fields, function return types and aliases. Anything
//! that cannot be resolved this way becomes [`CType::unknown`], which always
//! classifies as a general conversion.

use super::parser::CstTree;
use crate::types::{CType, CTypeKind, TypeAliases};
use rustc_hash::{FxHashMap, FxHashSet};
use std::ops::Range;
use tree_sitter::Node;

/// Node kinds that open a new block scope for declarations.
const SCOPE_KINDS: &[&str] = &[
    "compound_statement",
    "for_statement",
    "for_range_loop",
    "if_statement",
    "while_statement",
    "switch_statement",
    "catch_clause",
    "lambda_expression",
    "function_definition",
    "translation_unit",
];

#[derive(Debug, Clone)]
struct Declared {
    ty: CType,
    declared_at: usize,
    scope: Range<usize>,
}

/// Everything declared in one translation unit, indexed by name.
#[derive(Debug, Default)]
pub struct DeclarationIndex {
    variables: FxHashMap<String, Vec<Declared>>,
    fields: FxHashMap<String, CType>,
    aliases: TypeAliases,
    records: FxHashSet<String>,
    function_macros: FxHashSet<String>,
}

impl DeclarationIndex {
    /// Builds the index for a parsed translation unit.
    ///
    /// Nodes are visited in document order, so a later alias or field of the
    /// same name replaces an earlier one.
    #[must_use]
    pub fn build(tree: &CstTree) -> Self {
        let mut index = Self::default();
        let mut stack = vec![tree.root()];

        while let Some(node) = stack.pop() {
            match node.kind() {
                "declaration" => index.add_declaration(tree, node),
                "field_declaration" => index.add_fields(tree, node),
                "function_definition" => index.add_function(tree, node),
                "parameter_declaration" | "optional_parameter_declaration" => {
                    index.add_parameter(tree, node);
                }
                "for_range_loop" => index.add_range_variable(tree, node),
                "type_definition" => index.add_typedef(tree, node),
                "alias_declaration" => index.add_alias(tree, node),
                "struct_specifier" | "class_specifier" | "union_specifier" | "enum_specifier" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        index.records.insert(tree.text(name).to_owned());
                    }
                }
                "preproc_function_def" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        index.function_macros.insert(tree.text(name).to_owned());
                    }
                }
                _ => {}
            }

            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        index
    }

    /// Aliases collected from `typedef` and `using` declarations.
    #[must_use]
    pub fn aliases(&self) -> &TypeAliases {
        &self.aliases
    }

    /// Whether `name` is a function-like macro defined in this file.
    #[must_use]
    pub fn is_function_macro(&self, name: &str) -> bool {
        self.function_macros.contains(name)
    }

    /// Whether `name` names a type: an alias or a struct, class, union or enum.
    #[must_use]
    pub fn is_type_name(&self, name: &str) -> bool {
        self.aliases.get(name).is_some() || self.records.contains(name)
    }

    /// Type name wrapped in a parenthesized expression, as in `(MyInt)`.
    ///
    /// Tree-sitter cannot tell `(MyInt)*p` or `(Foo)(x)` from arithmetic or a
    /// call, so such prefixes reach us as `parenthesized_expression`. A name
    /// that is also a variable visible at that point is not a type.
    #[must_use]
    pub fn parenthesized_type_name<'t>(
        &self,
        tree: &'t CstTree,
        node: Node<'_>,
    ) -> Option<&'t str> {
        if node.kind() != "parenthesized_expression" || node.named_child_count() != 1 {
            return None;
        }
        let inner = first_named_child(node)?;
        if !matches!(inner.kind(), "identifier" | "type_identifier") {
            return None;
        }
        let name = tree.text(inner);
        (self.is_type_name(name) && self.lookup(name, node.start_byte()).is_none()).then_some(name)
    }

    /// Declared type of `name` as seen from byte `offset`.
    ///
    /// The innermost visible declaration wins; among declarations of the same
    /// scope the latest one before `offset` wins. Falls back to record fields
    /// so that members used inside methods still resolve.
    #[must_use]
    pub fn lookup(&self, name: &str, offset: usize) -> Option<&CType> {
        self.variables
            .get(name)
            .and_then(|decls| {
                decls
                    .iter()
                    .filter(|d| d.declared_at <= offset && d.scope.contains(&offset))
                    .min_by(|a, b| {
                        a.scope
                            .len()
                            .cmp(&b.scope.len())
                            .then(b.declared_at.cmp(&a.declared_at))
                    })
                    .map(|d| &d.ty)
            })
            .or_else(|| self.fields.get(name))
    }

    /// Type of a record field (or method) by its name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&CType> {
        self.fields.get(name)
    }

    /// Best-effort static type of an expression node.
    #[must_use]
    pub fn expr_type(&self, tree: &CstTree, node: Node<'_>) -> CType {
        match node.kind() {
            "identifier" => self
                .lookup(tree.text(node), node.start_byte())
                .cloned()
                .unwrap_or_else(CType::unknown),
            "qualified_identifier" => node
                .child_by_field_name("name")
                .map_or_else(CType::unknown, |name| self.expr_type(tree, name)),
            "parenthesized_expression" => first_named_child(node)
                .map_or_else(CType::unknown, |inner| self.expr_type(tree, inner)),
            "pointer_expression" => {
                let Some(argument) = node.child_by_field_name("argument") else {
                    return CType::unknown();
                };
                let operator = node
                    .child_by_field_name("operator")
                    .map(|op| tree.text(op))
                    .unwrap_or_default();
                self.prefix_type(tree, operator, argument)
            }
            "binary_expression" => node
                .child_by_field_name("left")
                .and_then(|left| self.parenthesized_type_name(tree, left))
                .map_or_else(CType::unknown, CType::named),
            "subscript_expression" => node
                .child_by_field_name("argument")
                .map_or_else(CType::unknown, |argument| {
                    element_of(strip_reference(self.expr_type(tree, argument)))
                }),
            "field_expression" => node
                .child_by_field_name("field")
                .and_then(|field| self.field(tree.text(field)))
                .cloned()
                .unwrap_or_else(CType::unknown),
            "call_expression" => {
                let Some(function) = node.child_by_field_name("function") else {
                    return CType::unknown();
                };
                match self.parenthesized_type_name(tree, function) {
                    Some(name) => CType::named(name),
                    None => return_type_of(self.expr_type(tree, function)),
                }
            }
            "cast_expression" => node
                .child_by_field_name("type")
                .map_or_else(CType::unknown, |ty| descriptor_type(tree, ty)),
            "string_literal" | "raw_string_literal" | "concatenated_string" => {
                CType::array_of(CType::named("char").with_const())
            }
            "char_literal" => CType::named("char"),
            "number_literal" => {
                let text = tree.text(node);
                let is_hex = text.starts_with("0x") || text.starts_with("0X");
                if !is_hex && (text.contains('.') || text.contains(['e', 'E'])) {
                    CType::named("double")
                } else {
                    CType::named("int")
                }
            }
            "true" | "false" => CType::named("bool"),
            "null" | "nullptr" => CType::named("std::nullptr_t"),
            _ => CType::unknown(),
        }
    }

    /// Type of a prefix operator applied to `argument`: `&`, `*`, `-` or `+`.
    #[must_use]
    pub fn prefix_type(&self, tree: &CstTree, operator: &str, argument: Node<'_>) -> CType {
        let operand = strip_reference(self.expr_type(tree, argument));
        match operator {
            "&" if !operand.is_unknown() => CType::pointer_to(operand),
            "*" => element_of(operand),
            "-" | "+" => operand,
            _ => CType::unknown(),
        }
    }

    fn add_declaration(&mut self, tree: &CstTree, node: Node<'_>) {
        let Some(base) = base_type(tree, node) else {
            return;
        };
        let scope = enclosing_scope(node, tree);
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            if let Some((name, ty)) = unwrap_declarator(tree, declarator, base.clone()) {
                self.insert_variable(name, ty, node.start_byte(), scope.clone());
            }
        }
    }

    fn add_fields(&mut self, tree: &CstTree, node: Node<'_>) {
        let Some(base) = base_type(tree, node) else {
            return;
        };
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            if let Some((name, ty)) = unwrap_declarator(tree, declarator, base.clone()) {
                self.fields.insert(name, ty);
            }
        }
    }

    fn add_function(&mut self, tree: &CstTree, node: Node<'_>) {
        let Some(base) = base_type(tree, node) else {
            return;
        };
        let Some(declarator) = node.child_by_field_name("declarator") else {
            return;
        };
        let Some((name, ty)) = unwrap_declarator(tree, declarator, base) else {
            return;
        };
        if node
            .parent()
            .is_some_and(|p| p.kind() == "field_declaration_list")
        {
            self.fields.insert(name, ty);
        } else {
            let scope = enclosing_scope(node, tree);
            self.insert_variable(name, ty, node.start_byte(), scope);
        }
    }

    fn add_parameter(&mut self, tree: &CstTree, node: Node<'_>) {
        let Some(scope) = parameter_scope(node) else {
            return;
        };
        let Some(base) = base_type(tree, node) else {
            return;
        };
        let Some(declarator) = node.child_by_field_name("declarator") else {
            return;
        };
        if let Some((name, ty)) = unwrap_declarator(tree, declarator, base) {
            self.insert_variable(name, ty, node.start_byte(), scope);
        }
    }

    fn add_range_variable(&mut self, tree: &CstTree, node: Node<'_>) {
        let Some(base) = base_type(tree, node) else {
            return;
        };
        let Some(declarator) = node.child_by_field_name("declarator") else {
            return;
        };
        if let Some((name, ty)) = unwrap_declarator(tree, declarator, base) {
            self.insert_variable(name, ty, node.start_byte(), node.byte_range());
        }
    }

    fn add_typedef(&mut self, tree: &CstTree, node: Node<'_>) {
        let Some(base) = base_type(tree, node) else {
            return;
        };
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            if let Some((name, ty)) = unwrap_declarator(tree, declarator, base.clone()) {
                self.aliases.insert(name, ty);
            }
        }
    }

    fn add_alias(&mut self, tree: &CstTree, node: Node<'_>) {
        let (Some(name), Some(ty)) = (
            node.child_by_field_name("name"),
            node.child_by_field_name("type"),
        ) else {
            return;
        };
        self.aliases
            .insert(tree.text(name), descriptor_type(tree, ty));
    }

    fn insert_variable(&mut self, name: String, ty: CType, at: usize, scope: Range<usize>) {
        self.variables.entry(name).or_default().push(Declared {
            ty,
            declared_at: at,
            scope,
        });
    }
}

/// Type named by a `type_descriptor` node, e.g. the `const char *` of a cast.
#[must_use]
pub fn descriptor_type(tree: &CstTree, descriptor: Node<'_>) -> CType {
    let Some(base) = base_type(tree, descriptor) else {
        return CType::unknown();
    };
    match descriptor.child_by_field_name("declarator") {
        Some(declarator) => abstract_type(tree, declarator, base),
        None => base,
    }
}

/// Base type of a declaration-like node: its `type` field plus the
/// `const`/`volatile` qualifiers written around it.
fn base_type(tree: &CstTree, node: Node<'_>) -> Option<CType> {
    let specifier = node.child_by_field_name("type")?;
    let mut ty = match specifier.kind() {
        "struct_specifier" | "class_specifier" | "union_specifier" | "enum_specifier" => {
            match specifier.child_by_field_name("name") {
                Some(name) => CType::named(normalize_spelling(tree.text(name))),
                None => CType::named("<anonymous>"),
            }
        }
        "placeholder_type_specifier" | "decltype" | "auto" => CType::unknown(),
        _ => {
            let spelling = normalize_spelling(tree.text(specifier));
            if spelling == "auto" {
                CType::unknown()
            } else {
                CType::named(spelling)
            }
        }
    };
    apply_qualifiers(tree, node, &mut ty);
    Some(ty)
}

/// Applies every `type_qualifier` child of `node` to `ty`.
fn apply_qualifiers(tree: &CstTree, node: Node<'_>, ty: &mut CType) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "type_qualifier" {
            match tree.text(child) {
                "const" => ty.is_const = true,
                "volatile" => ty.is_volatile = true,
                _ => {}
            }
        }
    }
}

/// Walks a named declarator from the outside in, wrapping `base` at each
/// level, and returns the declared name with its full type.
fn unwrap_declarator(tree: &CstTree, node: Node<'_>, base: CType) -> Option<(String, CType)> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" => {
            Some((tree.text(node).to_owned(), base))
        }
        "qualified_identifier" => {
            let name = node.child_by_field_name("name")?;
            unwrap_declarator(tree, name, base)
        }
        "init_declarator" => {
            let inner = node.child_by_field_name("declarator")?;
            unwrap_declarator(tree, inner, base)
        }
        "pointer_declarator" => {
            let mut pointer = CType::pointer_to(base);
            apply_qualifiers(tree, node, &mut pointer);
            let inner = node.child_by_field_name("declarator")?;
            unwrap_declarator(tree, inner, pointer)
        }
        "reference_declarator" => {
            let inner = last_named_child(node)?;
            unwrap_declarator(tree, inner, CType::reference_to(base))
        }
        "array_declarator" => {
            let inner = node.child_by_field_name("declarator")?;
            unwrap_declarator(tree, inner, CType::array_of(base))
        }
        "function_declarator" => {
            let inner = node.child_by_field_name("declarator")?;
            unwrap_declarator(tree, inner, CType::function_returning(base))
        }
        "parenthesized_declarator" => {
            let inner = first_named_child(node)?;
            unwrap_declarator(tree, inner, base)
        }
        _ => None,
    }
}

/// Same as [`unwrap_declarator`] for the nameless declarators of type
/// descriptors.
fn abstract_type(tree: &CstTree, node: Node<'_>, base: CType) -> CType {
    match node.kind() {
        "abstract_pointer_declarator" => {
            let mut pointer = CType::pointer_to(base);
            apply_qualifiers(tree, node, &mut pointer);
            match node.child_by_field_name("declarator") {
                Some(inner) => abstract_type(tree, inner, pointer),
                None => pointer,
            }
        }
        "abstract_reference_declarator" => {
            let reference = CType::reference_to(base);
            match last_named_child(node).filter(|n| n.kind().starts_with("abstract_")) {
                Some(inner) => abstract_type(tree, inner, reference),
                None => reference,
            }
        }
        "abstract_array_declarator" => {
            let array = CType::array_of(base);
            match node.child_by_field_name("declarator") {
                Some(inner) => abstract_type(tree, inner, array),
                None => array,
            }
        }
        "abstract_function_declarator" => {
            let function = CType::function_returning(base);
            match node.child_by_field_name("declarator") {
                Some(inner) => abstract_type(tree, inner, function),
                None => function,
            }
        }
        "abstract_parenthesized_declarator" => match first_named_child(node) {
            Some(inner) => abstract_type(tree, inner, base),
            None => base,
        },
        _ => base,
    }
}

/// Byte range of the innermost scope enclosing `node`.
fn enclosing_scope(node: Node<'_>, tree: &CstTree) -> Range<usize> {
    let mut current = node.parent();
    while let Some(candidate) = current {
        if SCOPE_KINDS.contains(&candidate.kind()) {
            return candidate.byte_range();
        }
        current = candidate.parent();
    }
    0..tree.source.len()
}

/// Scope of a function parameter: the function or lambda that owns the
/// parameter list. Parameters of bare prototypes have no scope.
fn parameter_scope(node: Node<'_>) -> Option<Range<usize>> {
    let list = node.parent().filter(|p| p.kind() == "parameter_list")?;
    let mut current = list.parent();
    while let Some(candidate) = current {
        let kind = candidate.kind();
        if kind == "function_definition" || kind == "lambda_expression" {
            return Some(candidate.byte_range());
        }
        if !kind.ends_with("declarator") {
            return None;
        }
        current = candidate.parent();
    }
    None
}

fn first_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let first = node.named_children(&mut cursor).next();
    first
}

fn last_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let last = node.named_children(&mut cursor).last();
    last
}

/// Collapses runs of whitespace so `unsigned   int` and `unsigned int` match.
fn normalize_spelling(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// An expression of reference type behaves as its referent.
fn strip_reference(ty: CType) -> CType {
    match ty.kind {
        CTypeKind::Reference(inner) => *inner,
        _ => ty,
    }
}

/// Result of dereferencing or subscripting a value of type `ty`.
fn element_of(ty: CType) -> CType {
    match ty.kind {
        CTypeKind::Pointer(inner) | CTypeKind::Array(inner) => *inner,
        _ => CType::unknown(),
    }
}

/// Result of calling a value of type `callee`.
fn return_type_of(callee: CType) -> CType {
    match strip_reference(callee).kind {
        CTypeKind::Function(ret) => *ret,
        CTypeKind::Pointer(inner) => match inner.kind {
            CTypeKind::Function(ret) => *ret,
            _ => CType::unknown(),
        },
        _ => CType::unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::CstParser;

    fn parse(source: &str) -> CstTree {
        CstParser::new().unwrap().parse(source).unwrap()
    }

    fn type_at(index: &DeclarationIndex, name: &str, offset: usize) -> String {
        index
            .lookup(name, offset)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    #[test]
    fn test_pointer_to_const_declaration() {
        let source = "const char *cp = 0;\nint x;\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        assert_eq!(type_at(&index, "cp", source.len() - 1), "const char *");
    }

    #[test]
    fn test_const_pointer_declaration() {
        let source = "int * const * pp;\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        assert_eq!(type_at(&index, "pp", source.len() - 1), "int * const *");
    }

    #[test]
    fn test_parameters_are_scoped_to_their_function() {
        let source = "void f(const char *s) { s; }\nvoid g() { s; }\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        let in_f = source.find("{ s").unwrap() + 2;
        let in_g = source.rfind("{ s").unwrap() + 2;
        assert_eq!(type_at(&index, "s", in_f), "const char *");
        assert!(index.lookup("s", in_g).is_none());
    }

    #[test]
    fn test_prototype_parameters_are_not_indexed() {
        let source = "void f(const char *s);\nint main() { return 0; }\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        assert!(index.lookup("s", source.len() - 2).is_none());
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let source = "double v;\nvoid f() { const int *v = 0; v; }\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        let use_site = source.rfind("v;").unwrap();
        assert_eq!(type_at(&index, "v", use_site), "const int *");
        assert_eq!(type_at(&index, "v", source.len() - 1), "double");
    }

    #[test]
    fn test_typedef_and_using_aliases() {
        let source = "typedef const char *cstr;\nusing byte = unsigned char;\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        assert_eq!(
            index.aliases().get("cstr").map(ToString::to_string),
            Some("const char *".to_owned())
        );
        assert_eq!(
            index.aliases().get("byte").map(ToString::to_string),
            Some("unsigned char".to_owned())
        );
    }

    #[test]
    fn test_later_alias_definition_wins() {
        let source = "typedef int handle;\nvoid f() {}\ntypedef const char *handle;\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        assert_eq!(
            index.aliases().get("handle").map(ToString::to_string),
            Some("const char *".to_owned())
        );
    }

    #[test]
    fn test_later_field_definition_wins() {
        let source = "struct A { int value; };\nstruct B { const char *value; };\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        assert_eq!(
            index.field("value").map(ToString::to_string),
            Some("const char *".to_owned())
        );
    }

    #[test]
    fn test_record_and_alias_names_are_type_names() {
        let source = "struct Foo {};\nenum class Color { Red };\ntypedef int MyInt;\nint count;\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        assert!(index.is_type_name("Foo"));
        assert!(index.is_type_name("Color"));
        assert!(index.is_type_name("MyInt"));
        assert!(!index.is_type_name("count"));
    }

    #[test]
    fn test_variable_shadows_parenthesized_type_name() {
        let source = "typedef int MyInt;\nint f(int *p) { int MyInt = 2; return (MyInt)*p; }\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        let parens = tree.find_by_kind("parenthesized_expression");
        assert_eq!(parens.len(), 1);
        assert!(index.parenthesized_type_name(&tree, parens[0]).is_none());
    }

    #[test]
    fn test_reference_declaration() {
        let source = "struct Widget {};\nvoid f(const Widget &w) { w; }\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        let use_site = source.rfind("w;").unwrap();
        assert_eq!(type_at(&index, "w", use_site), "const Widget &");
    }

    #[test]
    fn test_function_macros_are_collected() {
        let source = "#define WRAP(x) (x)\n#define PLAIN 1\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        assert!(index.is_function_macro("WRAP"));
        assert!(!index.is_function_macro("PLAIN"));
    }

    #[test]
    fn test_expression_types() {
        let source = "const char *name();\nvoid f(char *p, const char *cp) { &p; *cp; name(); \"lit\"; }\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        let statements = tree.find_by_kind("expression_statement");
        let types: Vec<String> = statements
            .iter()
            .filter_map(|s| first_named_child(*s))
            .map(|e| index.expr_type(&tree, e).to_string())
            .collect();
        assert_eq!(
            types,
            vec![
                "char * *".to_owned(),
                "const char".to_owned(),
                "const char *".to_owned(),
                "const char []".to_owned(),
            ]
        );
    }

    #[test]
    fn test_members_resolve_inside_methods() {
        let source = "struct S {\n  const char *name_;\n  char *get() { return name_; }\n};\n";
        let tree = parse(source);
        let index = DeclarationIndex::build(&tree);
        let use_site = source.find("name_; }").unwrap();
        assert_eq!(type_at(&index, "name_", use_site), "const char *");
    }
}
