//! Lowering of tree-sitter-java syntax trees into [`Unit`]s.

use std::path::Path;

use once_cell::sync::Lazy;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, Tree};

use super::ParseError;
use crate::model::{AnnotationTag, DeclId, DeclKind, Declaration, Header, Unit};

static JAVA: Lazy<Language> = Lazy::new(|| tree_sitter_java::LANGUAGE.into());

/// Tree-sitter query for the package declaration.
const PACKAGE_QUERY: &str = r#"
(package_declaration
  [(identifier) (scoped_identifier)] @package_name
)
"#;

/// Declarations that open a new type scope.
const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "record_declaration",
    "enum_declaration",
];

/// Node kinds a parameter type can take.
const TYPE_KINDS: &[&str] = &[
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "void_type",
];

/// Class used to host an annotation snippet while it is parsed.
const SNIPPET_HOST: &str = "AnnotationSnippetHost";

fn parse_tree(source: &str) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    parser.set_language(&JAVA)?;
    parser.parse(source, None).ok_or_else(|| ParseError::Syntax {
        line: 1,
        column: 1,
        near: String::new(),
    })
}

/// Parse Java source text into a [`Unit`].
pub fn parse_source(path: &Path, source: String) -> Result<Unit, ParseError> {
    let tree = parse_tree(&source)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(syntax_error(root, &source));
    }

    let package = extract_package(root, &source)?;
    let mut lowering = Lowering {
        source: &source,
        unit: Unit::new(path, String::new(), package),
    };
    let top_level: Vec<Node> = root.named_children(&mut root.walk()).collect();
    for node in top_level {
        lowering.lower_type(node, None);
    }

    let mut unit = lowering.unit;
    unit.replace_source(source);
    Ok(unit)
}

/// Parse a single annotation such as `@Column(name = "ID")`.
pub fn parse_annotation(snippet: &str) -> Result<AnnotationTag, ParseError> {
    let invalid = |reason: &str| ParseError::InvalidAnnotation {
        snippet: snippet.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = snippet.trim();
    if !trimmed.starts_with('@') {
        return Err(invalid("annotations start with '@'"));
    }

    let wrapped = format!("{}\nclass {} {{}}\n", trimmed, SNIPPET_HOST);
    let tree = parse_tree(&wrapped)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(invalid("not a well-formed annotation"));
    }

    let declarations: Vec<Node> = root
        .named_children(&mut root.walk())
        .filter(|n| !is_comment(n))
        .collect();
    let host = match declarations.as_slice() {
        [host] if host.kind() == "class_declaration" => *host,
        _ => return Err(invalid("expected exactly one annotation")),
    };
    let modifiers = modifiers_of(host).ok_or_else(|| invalid("expected exactly one annotation"))?;

    let mut tags = Vec::new();
    for child in modifiers.children(&mut modifiers.walk()) {
        match child.kind() {
            "marker_annotation" | "annotation" => match lower_annotation(child, &wrapped) {
                Some(tag) => tags.push(tag),
                None => return Err(invalid("annotation has no name")),
            },
            kind if is_comment_kind(kind) => {}
            _ => return Err(invalid("unexpected modifier outside the annotation")),
        }
    }

    match tags.len() {
        1 => Ok(tags.remove(0)),
        _ => Err(invalid("expected exactly one annotation")),
    }
}

struct Lowering<'s> {
    source: &'s str,
    unit: Unit,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn lower_type(&mut self, node: Node, parent: Option<DeclId>) {
        let kind = match node.kind() {
            "class_declaration" | "interface_declaration" | "record_declaration" => DeclKind::Class,
            "enum_declaration" => DeclKind::Enum,
            _ => return,
        };
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };

        let decl = self.declaration(node, kind, self.text(name), parent);
        let id = self.unit.add_declaration(decl);
        if let Some(body) = node.child_by_field_name("body") {
            self.lower_body(body, id);
        }
    }

    fn lower_body(&mut self, body: Node, owner: DeclId) {
        let members: Vec<Node> = body.named_children(&mut body.walk()).collect();
        for member in members {
            match member.kind() {
                "field_declaration" | "constant_declaration" => self.lower_field(member, owner),
                "method_declaration" => self.lower_method(member, owner),
                "enum_body_declarations" => self.lower_body(member, owner),
                // Constant bodies contribute their members to the enum.
                "enum_constant" => {
                    if let Some(body) = member.child_by_field_name("body") {
                        self.lower_body(body, owner);
                    }
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => self.lower_type(member, Some(owner)),
                "constructor_declaration"
                | "compact_constructor_declaration"
                | "static_initializer"
                | "block" => self.lower_local_types(member, owner),
                _ => {}
            }
        }
    }

    fn lower_field(&mut self, node: Node, owner: DeclId) {
        let variables: Vec<String> = node
            .children_by_field_name("declarator", &mut node.walk())
            .filter_map(|d| d.child_by_field_name("name"))
            .map(|n| self.text(n).to_string())
            .collect();
        let Some(first) = variables.first().cloned() else {
            return;
        };

        let decl = self
            .declaration(node, DeclKind::Field, &first, Some(owner))
            .with_variables(variables);
        self.unit.add_declaration(decl);
        // Anonymous classes in initializers.
        self.lower_local_types(node, owner);
    }

    fn lower_method(&mut self, node: Node, owner: DeclId) {
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.parameter_types(p))
            .unwrap_or_default();

        let decl = self
            .declaration(node, DeclKind::Method, self.text(name), Some(owner))
            .with_params(params);
        let id = self.unit.add_declaration(decl);
        if let Some(body) = node.child_by_field_name("body") {
            self.lower_local_types(body, id);
        }
    }

    /// Parameter types as spelled, in declaration order.
    fn parameter_types(&self, params: Node) -> Vec<String> {
        let mut types = Vec::new();
        for param in params.named_children(&mut params.walk()) {
            match param.kind() {
                "formal_parameter" => {
                    let Some(ty) = param.child_by_field_name("type") else {
                        continue;
                    };
                    let mut spelled = self.text(ty).to_string();
                    if let Some(dims) = param.child_by_field_name("dimensions") {
                        spelled.push_str(self.text(dims));
                    }
                    types.push(spelled);
                }
                "spread_parameter" => {
                    let ty = param
                        .named_children(&mut param.walk())
                        .find(|n| TYPE_KINDS.contains(&n.kind()));
                    if let Some(ty) = ty {
                        types.push(format!("{}...", self.text(ty)));
                    }
                }
                _ => {}
            }
        }
        types
    }

    /// Find type declarations nested in statement bodies. Members of
    /// anonymous class bodies are attached to `owner`.
    fn lower_local_types(&mut self, node: Node, owner: DeclId) {
        let children: Vec<Node> = node.named_children(&mut node.walk()).collect();
        for child in children {
            match child.kind() {
                kind if TYPE_DECLARATIONS.contains(&kind) => self.lower_type(child, Some(owner)),
                "class_body" => self.lower_body(child, owner),
                _ => self.lower_local_types(child, owner),
            }
        }
    }

    fn declaration(
        &self,
        node: Node,
        kind: DeclKind,
        name: &str,
        parent: Option<DeclId>,
    ) -> Declaration {
        let start = node.start_byte();
        let mut annotations = Vec::new();
        let mut residue = Vec::new();
        let mut end = start;
        let has_modifiers = match modifiers_of(node) {
            Some(modifiers) => {
                end = modifiers.end_byte();
                let mut keywords: Vec<&str> = Vec::new();
                for child in modifiers.children(&mut modifiers.walk()) {
                    match child.kind() {
                        "marker_annotation" | "annotation" => {
                            if let Some(tag) = lower_annotation(child, self.source) {
                                annotations.push(tag);
                            }
                        }
                        kind if is_comment_kind(kind) => {
                            if !keywords.is_empty() {
                                residue.push(keywords.join(" "));
                                keywords.clear();
                            }
                            residue.push(self.text(child).to_string());
                        }
                        _ => keywords.push(self.text(child)),
                    }
                }
                if !keywords.is_empty() {
                    residue.push(keywords.join(" "));
                }
                true
            }
            None => false,
        };

        let mut decl = Declaration::new(kind, name, parent).with_annotations(annotations);
        decl.header = Some(Header {
            start,
            end,
            has_modifiers,
            residue,
            separator: separator_at(self.source, start),
            line_break: line_break_at(self.source, start),
        });
        decl
    }
}

fn modifiers_of(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|n| n.kind() == "modifiers");
    found
}

fn is_comment_kind(kind: &str) -> bool {
    matches!(kind, "line_comment" | "block_comment")
}

fn is_comment(node: &Node) -> bool {
    is_comment_kind(node.kind())
}

fn lower_annotation(node: Node, source: &str) -> Option<AnnotationTag> {
    let bytes = source.as_bytes();
    let name_node = node.child_by_field_name("name")?;
    let name: String = name_node
        .utf8_text(bytes)
        .ok()?
        .split_whitespace()
        .collect();

    if node.kind() == "marker_annotation" {
        return Some(AnnotationTag::marker(name));
    }

    let Some(arguments) = node.child_by_field_name("arguments") else {
        return Some(AnnotationTag::marker(name));
    };
    let mut pairs = Vec::new();
    let mut single = None;
    for child in arguments.named_children(&mut arguments.walk()) {
        match child.kind() {
            kind if is_comment_kind(kind) => {}
            "element_value_pair" => {
                let key = child.child_by_field_name("key")?.utf8_text(bytes).ok()?;
                let value = child.child_by_field_name("value")?.utf8_text(bytes).ok()?;
                pairs.push((key.to_string(), value.to_string()));
            }
            _ => single = Some(child.utf8_text(bytes).ok()?.to_string()),
        }
    }

    Some(match single {
        Some(value) if pairs.is_empty() => AnnotationTag::single(name, value),
        _ => AnnotationTag::named(name, pairs),
    })
}

fn extract_package(root: Node, source: &str) -> Result<Option<String>, ParseError> {
    let query = Query::new(&JAVA, PACKAGE_QUERY).map_err(|e| ParseError::Syntax {
        line: 0,
        column: 0,
        near: e.message,
    })?;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, root, source.as_bytes());

    if let Some(m) = matches.next() {
        for capture in m.captures {
            let name = query.capture_names()[capture.index as usize];
            if name == "package_name" {
                let text = capture.node.utf8_text(source.as_bytes()).unwrap_or("");
                return Ok(Some(text.split_whitespace().collect()));
            }
        }
    }
    Ok(None)
}

/// Newline plus indentation of the line a declaration starts on, or a single
/// space when the declaration does not start its line.
fn separator_at(source: &str, start: usize) -> String {
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &source[line_start..start];
    if !prefix.chars().all(char::is_whitespace) {
        return " ".to_string();
    }
    let newline = if source[..line_start].ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    };
    format!("{}{}", newline, prefix)
}

/// Line ending used on the line a declaration starts on.
fn line_break_at(source: &str, start: usize) -> String {
    match source[start..].find('\n') {
        Some(i) if source[..start + i].ends_with('\r') => "\r\n".to_string(),
        _ => "\n".to_string(),
    }
}

fn syntax_error(root: Node, source: &str) -> ParseError {
    let node = first_error(root).unwrap_or(root);
    let position = node.start_position();
    let near: String = node
        .utf8_text(source.as_bytes())
        .unwrap_or("")
        .chars()
        .take(40)
        .collect();
    ParseError::Syntax {
        line: position.row + 1,
        column: position.column + 1,
        near,
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}
