//! Java source type syntax.
//!
//! Signatures are written the way they appear in source: `java.util.Map<K, List<? extends V>>`,
//! `int[]`, `T...`, `Outer<String>.Inner`. Names resolve against the visible type variables
//! first, then primitive keywords, then classes (simple names of `java.lang` types included).

use std::collections::HashMap;

use genera_types::{ClassId, PrimitiveType, Type, TypeEnv, TypeVarId, WildcardType};

use crate::error::{LoadError, Result};

/// Type variables visible from a declaration. Later entries shadow earlier ones, so method
/// variables are pushed after class variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeVariables {
    entries: Vec<(String, TypeVarId)>,
}

impl TypeVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, id: TypeVarId) {
        self.entries.push((name.into(), id));
    }

    pub fn extended(&self, more: impl IntoIterator<Item = (String, TypeVarId)>) -> Self {
        let mut out = self.clone();
        out.entries.extend(more);
        out
    }

    pub fn get(&self, name: &str) -> Option<TypeVarId> {
        self.entries
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, id)| *id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse `text` into a type, resolving class names through `env` only.
pub fn parse_signature(env: &dyn TypeEnv, variables: &TypeVariables, text: &str) -> Result<Type> {
    let imports = HashMap::new();
    Parser::new(env, &imports, variables, text, "signature").parse_type_ref()
}

/// Like [`parse_signature`], with extra simple-name imports tried before `env` lookups.
pub(crate) fn parse_with_imports(
    env: &dyn TypeEnv,
    imports: &HashMap<String, ClassId>,
    variables: &TypeVariables,
    text: &str,
    context: &str,
) -> Result<Type> {
    Parser::new(env, imports, variables, text, context).parse_type_ref()
}

/// Resolve a dotted class name, trying `$`-separated nested names for trailing segments.
pub(crate) fn resolve_class_name(
    env: &dyn TypeEnv,
    imports: &HashMap<String, ClassId>,
    name: &str,
) -> Option<ClassId> {
    let lookup = |name: &str| imports.get(name).copied().or_else(|| env.lookup_class(name));
    if let Some(id) = lookup(name) {
        return Some(id);
    }

    let segments: Vec<&str> = name.split('.').collect();
    for split in (1..segments.len()).rev() {
        let Some(outer) = lookup(&segments[..split].join(".")) else {
            continue;
        };
        let Some(outer_def) = env.class(outer) else {
            continue;
        };
        let nested = format!("{}${}", outer_def.name, segments[split..].join("$"));
        if let Some(id) = env.lookup_class(&nested) {
            return Some(id);
        }
    }
    None
}

struct Parser<'a> {
    env: &'a dyn TypeEnv,
    imports: &'a HashMap<String, ClassId>,
    variables: &'a TypeVariables,
    text: &'a str,
    context: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(
        env: &'a dyn TypeEnv,
        imports: &'a HashMap<String, ClassId>,
        variables: &'a TypeVariables,
        text: &'a str,
        context: &'a str,
    ) -> Self {
        Self {
            env,
            imports,
            variables,
            text,
            context,
            pos: 0,
        }
    }

    fn parse_type_ref(&mut self) -> Result<Type> {
        let ty = self.parse_type()?;
        self.skip_ws();
        if !self.is_eof() {
            return Err(self.malformed("unexpected trailing input"));
        }
        Ok(ty)
    }

    fn parse_type(&mut self) -> Result<Type> {
        self.skip_ws();
        if self.consume_char('?') {
            return self.parse_wildcard();
        }
        let ty = self.parse_reference()?;
        self.parse_suffixes(ty)
    }

    /// A type that may not be a wildcard (wildcard bounds, intersection members).
    fn parse_bound(&mut self) -> Result<Type> {
        self.skip_ws();
        if self.peek_char() == Some('?') {
            return Err(self.malformed("wildcard is not allowed here"));
        }
        self.parse_type()
    }

    fn parse_wildcard(&mut self) -> Result<Type> {
        let object = self.env.well_known().object;
        self.skip_ws();
        if self.consume_keyword("extends") {
            let mut bounds = vec![self.parse_bound()?];
            loop {
                self.skip_ws();
                if !self.consume_char('&') {
                    break;
                }
                bounds.push(self.parse_bound()?);
            }
            Ok(Type::wildcard_extends(bounds))
        } else if self.consume_keyword("super") {
            let lower = self.parse_bound()?;
            Ok(Type::wildcard_super(lower, object))
        } else {
            Ok(Type::Wildcard(WildcardType::unbounded(object)))
        }
    }

    fn parse_reference(&mut self) -> Result<Type> {
        self.skip_ws();
        let start = self.pos;
        let name = self.parse_qualified_name()?;

        if !name.contains('.') {
            if let Some(var) = self.variables.get(&name) {
                self.reject_arguments(&name)?;
                return Ok(Type::Variable(var));
            }
            if let Some(primitive) = PrimitiveType::from_keyword(&name) {
                self.reject_arguments(&name)?;
                return Ok(Type::primitive(primitive));
            }
        }

        let Some(mut class) = resolve_class_name(self.env, self.imports, &name) else {
            self.pos = start;
            return Err(self.unresolved(name));
        };
        let mut owner = None;
        loop {
            let args = if self.peek_non_ws_char() == Some('<') {
                self.skip_ws();
                self.parse_arguments(class)?
            } else {
                Vec::new()
            };
            let ty = match owner.take() {
                Some(owner) => Type::parameterized_with_owner(owner, class, args),
                None if args.is_empty() => Type::class(class),
                None => Type::parameterized(class, args),
            };

            // `Outer<String>.Inner`: the owner carries arguments, so the nested name is
            // resolved relative to it.
            let rest = self.text[self.pos..].trim_start();
            if !matches!(ty, Type::Parameterized(_))
                || !rest.starts_with('.')
                || rest.starts_with("...")
            {
                return Ok(ty);
            }
            self.skip_ws();
            self.consume_char('.');
            self.skip_ws();
            let nested_start = self.pos;
            let nested = self.parse_ident()?;
            let outer_name = self
                .env
                .class(class)
                .map(|def| def.name.clone())
                .unwrap_or_default();
            let binary = format!("{outer_name}${nested}");
            class = match self.env.lookup_class(&binary) {
                Some(id) => id,
                None => {
                    self.pos = nested_start;
                    return Err(self.unresolved(binary));
                }
            };
            owner = Some(ty);
        }
    }

    fn parse_arguments(&mut self, class: ClassId) -> Result<Vec<Type>> {
        let open = self.pos;
        self.expect_char('<')?;
        let mut args = Vec::new();
        loop {
            let arg_start = self.pos;
            let arg = self.parse_type()?;
            if matches!(arg, Type::Class(ref c) if c.is_primitive()) {
                self.pos = arg_start;
                return Err(self.malformed("primitive types can't be type arguments"));
            }
            args.push(arg);
            self.skip_ws();
            if self.consume_char(',') {
                continue;
            }
            self.expect_char('>')?;
            break;
        }

        let expected = self
            .env
            .class(class)
            .map(|def| def.type_params.len())
            .unwrap_or_default();
        if expected != args.len() {
            self.pos = open;
            let name = self
                .env
                .class(class)
                .map(|def| def.name.clone())
                .unwrap_or_default();
            return Err(self.malformed(format!(
                "`{name}` expects {expected} type argument(s), found {}",
                args.len()
            )));
        }
        Ok(args)
    }

    fn parse_suffixes(&mut self, mut ty: Type) -> Result<Type> {
        loop {
            let checkpoint = self.pos;
            self.skip_ws();
            if self.consume_char('[') {
                self.expect_char(']')?;
            } else if self.text[self.pos..].starts_with("...") {
                self.pos += 3;
            } else {
                self.pos = checkpoint;
                return Ok(ty);
            }
            if ty == Type::primitive(PrimitiveType::Void) {
                return Err(self.malformed("`void` can't be an array component"));
            }
            ty = Type::array(ty);
        }
    }

    fn parse_qualified_name(&mut self) -> Result<String> {
        self.skip_ws();
        let mut name = self.parse_ident()?;
        loop {
            let checkpoint = self.pos;
            self.skip_ws();
            if !self.consume_char('.') || self.text[self.pos..].starts_with("..") {
                self.pos = checkpoint;
                return Ok(name);
            }
            self.skip_ws();
            name.push('.');
            name.push_str(&self.parse_ident()?);
        }
    }

    fn parse_ident(&mut self) -> Result<String> {
        let start = self.pos;
        let mut chars = self.text[start..].char_indices();
        match chars.next() {
            Some((_, c)) if c.is_alphabetic() || c == '_' || c == '$' => {}
            _ => return Err(self.malformed("expected an identifier")),
        }
        let len = chars
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
            .map(|(offset, _)| offset)
            .unwrap_or(self.text.len() - start);
        self.pos = start + len;
        Ok(self.text[start..self.pos].to_owned())
    }

    fn reject_arguments(&self, name: &str) -> Result<()> {
        if self.peek_non_ws_char() == Some('<') {
            return Err(self.malformed(format!("`{name}` can't have type arguments")));
        }
        Ok(())
    }

    fn unresolved(&self, name: String) -> LoadError {
        let context = format!("{} `{}`", self.context, self.text);
        // Unresolvable single upper-case names are almost always out-of-scope variables.
        if looks_like_variable(&name) {
            LoadError::UnknownVariable { name, context }
        } else {
            LoadError::UnknownClass { name, context }
        }
    }

    fn malformed(&self, message: impl Into<String>) -> LoadError {
        LoadError::MalformedSignature {
            signature: self.text.to_owned(),
            offset: self.pos,
            message: message.into(),
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        self.skip_ws();
        if self.consume_char(expected) {
            Ok(())
        } else {
            Err(self.malformed(format!("expected `{expected}`")))
        }
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume `keyword` only when it isn't the prefix of a longer identifier.
    fn consume_keyword(&mut self, keyword: &str) -> bool {
        let rest = &self.text[self.pos..];
        if !rest.starts_with(keyword) {
            return false;
        }
        let next = rest[keyword.len()..].chars().next();
        if next.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            return false;
        }
        self.pos += keyword.len();
        true
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_non_ws_char(&self) -> Option<char> {
        self.text[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn skip_ws(&mut self) {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }
}

fn looks_like_variable(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
