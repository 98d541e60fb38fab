//! Reader for the `.usda` text format.
//!
//! Only the subset needed to look up prims and read their properties is
//! understood. Layer and prim metadata, variant sets, and property metadata
//! are skipped over without being interpreted.

use crate::{
    stage::{child_path, Prim, Property, Specifier, Stage, Value},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Str(String),
    Number(String),
    Asset(String),
    Path(String),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
}

impl TokenKind {
    fn source_text(&self) -> String {
        match self {
            Self::Ident(value) | Self::Number(value) => value.clone(),
            Self::Str(value) => format!("{:?}", value),
            Self::Asset(value) => format!("@{}@", value),
            Self::Path(value) => format!("<{}>", value),
            Self::Punct(c) => c.to_string(),
        }
    }
}

const QUALIFIERS: &[&str] = &["custom", "uniform", "varying", "config"];

pub(crate) fn parse(text: &str) -> Result<Stage> {
    let tokens = tokenize(text)?;
    Parser {
        tokens,
        pos: 0,
        stage: Stage::new(),
    }
    .parse_layer()
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':' || c == '.'
}

#[allow(clippy::too_many_lines)]
fn tokenize(text: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                line += 1;
                i += 1;
            }
            c if c.is_whitespace() => i += 1,
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '"' | '\'' => {
                let start_line = line;
                let triple = i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c;
                i += if triple { 3 } else { 1 };
                let mut value = String::new();
                loop {
                    if i >= chars.len() {
                        return Err(parse_error(start_line, "unterminated string"));
                    }
                    let ch = chars[i];
                    if ch == c
                        && (!triple
                            || (i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c))
                    {
                        i += if triple { 3 } else { 1 };
                        break;
                    }
                    if ch == '\n' {
                        if !triple {
                            return Err(parse_error(start_line, "unterminated string"));
                        }
                        line += 1;
                    }
                    if ch == '\\' && i + 1 < chars.len() {
                        i += 1;
                        value.push(match chars[i] {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            other => other,
                        });
                    } else {
                        value.push(ch);
                    }
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    line: start_line,
                });
            }
            '@' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&ch| ch == '@' || ch == '\n')
                    .map(|offset| start + offset)
                    .filter(|&end| chars[end] == '@')
                    .ok_or_else(|| parse_error(line, "unterminated asset path"))?;
                tokens.push(Token {
                    kind: TokenKind::Asset(chars[start..end].iter().collect()),
                    line,
                });
                i = end + 1;
            }
            '<' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&ch| ch == '>' || ch == '\n')
                    .map(|offset| start + offset)
                    .filter(|&end| chars[end] == '>')
                    .ok_or_else(|| parse_error(line, "unterminated path"))?;
                tokens.push(Token {
                    kind: TokenKind::Path(chars[start..end].iter().collect()),
                    line,
                });
                i = end + 1;
            }
            '{' | '}' | '(' | ')' | '[' | ']' | '=' | ',' | ';' | ':' => {
                tokens.push(Token {
                    kind: TokenKind::Punct(c),
                    line,
                });
                i += 1;
            }
            c if c.is_ascii_digit()
                || ((c == '-' || c == '+' || c == '.')
                    && chars
                        .get(i + 1)
                        .map_or(false, |next| next.is_ascii_digit() || *next == '.')) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() {
                    let ch = chars[i];
                    let exponent_sign =
                        (ch == '-' || ch == '+') && matches!(chars[i - 1], 'e' | 'E');
                    if ch.is_ascii_digit() || ch == '.' || ch == 'e' || ch == 'E' || exponent_sign
                    {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Number(chars[start..i].iter().collect()),
                    line,
                });
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(chars[start..i].iter().collect()),
                    line,
                });
            }
            other => {
                return Err(parse_error(
                    line,
                    format!("unexpected character '{}'", other),
                ))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    stage: Stage,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|token| &token.kind)
    }

    fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|token| &token.kind)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |token| token.line)
    }

    fn advance(&mut self) -> Result<TokenKind> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| parse_error(self.line(), "unexpected end of document"))?;
        self.pos += 1;
        Ok(token.kind.clone())
    }

    fn is_punct(&self, c: char) -> bool {
        self.peek() == Some(&TokenKind::Punct(c))
    }

    fn expect_punct(&mut self, c: char) -> Result<()> {
        let line = self.line();
        match self.advance()? {
            TokenKind::Punct(p) if p == c => Ok(()),
            other => Err(parse_error(
                line,
                format!("expected '{}', found '{}'", c, other.source_text()),
            )),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        let line = self.line();
        match self.advance()? {
            TokenKind::Ident(ident) => Ok(ident),
            other => Err(parse_error(
                line,
                format!("expected identifier, found '{}'", other.source_text()),
            )),
        }
    }

    fn expect_str(&mut self) -> Result<String> {
        let line = self.line();
        match self.advance()? {
            TokenKind::Str(value) => Ok(value),
            other => Err(parse_error(
                line,
                format!("expected string, found '{}'", other.source_text()),
            )),
        }
    }

    /// Consumes a bracketed group starting at the current token and returns
    /// its source text.
    fn skip_group(&mut self) -> Result<String> {
        let line = self.line();
        let mut depth = 0usize;
        let mut text = Vec::new();
        loop {
            let token = self
                .advance()
                .map_err(|_e| parse_error(line, "unbalanced brackets"))?;
            match token {
                TokenKind::Punct('(' | '[' | '{') => depth += 1,
                TokenKind::Punct(')' | ']' | '}') => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| parse_error(line, "unbalanced brackets"))?;
                }
                _ => {}
            }
            text.push(token.source_text());
            if depth == 0 {
                return Ok(text.join(" "));
            }
        }
    }

    fn parse_layer(mut self) -> Result<Stage> {
        if self.is_punct('(') {
            self.skip_group()?;
        }
        while self.peek().is_some() {
            self.parse_prim("/")?;
        }
        Ok(self.stage)
    }

    fn parse_prim(&mut self, parent: &str) -> Result<()> {
        let line = self.line();
        let keyword = self.expect_ident()?;
        let specifier = Specifier::from_keyword(&keyword).ok_or_else(|| {
            parse_error(line, format!("expected prim specifier, found '{}'", keyword))
        })?;

        let type_name = match self.peek() {
            Some(TokenKind::Ident(_)) => Some(self.expect_ident()?),
            _ => None,
        };
        let name = self.expect_str()?;
        if name.is_empty() || name.contains('/') {
            return Err(parse_error(line, format!("invalid prim name '{}'", name)));
        }

        let path = child_path(parent, &name);
        if self.stage.prim_at_path(&path).is_some() {
            return Err(parse_error(line, format!("prim '{}' defined twice", path)));
        }

        if self.is_punct('(') {
            self.skip_group()?;
        }
        self.expect_punct('{')?;

        self.stage
            .insert_prim(parent, Prim::new(path.clone(), specifier, type_name))?;

        loop {
            match self.peek() {
                Some(TokenKind::Punct('}')) => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(TokenKind::Punct(';')) => self.pos += 1,
                Some(TokenKind::Ident(ident)) if Specifier::from_keyword(ident).is_some() => {
                    self.parse_prim(&path)?;
                }
                Some(TokenKind::Ident(ident)) if ident == "variantSet" => {
                    self.pos += 1;
                    self.expect_str()?;
                    self.expect_punct('=')?;
                    self.skip_group()?;
                }
                Some(TokenKind::Ident(_)) => self.parse_property(&path)?,
                Some(other) => {
                    return Err(parse_error(
                        self.line(),
                        format!("unexpected '{}' in prim body", other.source_text()),
                    ))
                }
                None => return Err(parse_error(line, format!("unterminated prim '{}'", path))),
            }
        }
    }

    fn parse_property(&mut self, prim_path: &str) -> Result<()> {
        let mut custom = false;
        let mut keyword = self.expect_ident()?;
        while QUALIFIERS.contains(&keyword.as_str()) {
            custom |= keyword == "custom";
            keyword = self.expect_ident()?;
        }

        let mut type_name = keyword;
        if type_name != "rel"
            && self.is_punct('[')
            && self.peek_at(1) == Some(&TokenKind::Punct(']'))
        {
            self.pos += 2;
            type_name.push_str("[]");
        }

        let name = self.expect_ident()?;
        let value = if self.is_punct('=') {
            self.pos += 1;
            Some(self.parse_value(&type_name)?)
        } else {
            None
        };
        if self.is_punct('(') {
            self.skip_group()?;
        }

        let prim = self
            .stage
            .prim_at_path_mut(prim_path)
            .ok_or_else(|| Error::InvalidPath(prim_path.to_owned()))?;
        prim.insert_property(
            name,
            Property {
                type_name,
                value,
                custom,
            },
        );
        Ok(())
    }

    fn parse_value(&mut self, type_name: &str) -> Result<Value> {
        let line = self.line();
        let value = match self.peek().cloned() {
            Some(TokenKind::Punct('(' | '[' | '{')) => return Ok(Value::Raw(self.skip_group()?)),
            Some(token) => {
                self.pos += 1;
                token
            }
            None => return Err(parse_error(line, "missing value")),
        };

        Ok(match value {
            TokenKind::Str(value) => match type_name {
                "token" => Value::Token(value),
                "asset" => Value::Asset(value),
                _ => Value::String(value),
            },
            TokenKind::Asset(value) => Value::Asset(value),
            TokenKind::Path(value) => Value::Path(value),
            TokenKind::Number(number) => {
                if type_name == "bool" {
                    Value::Bool(number != "0")
                } else if let Ok(value) = number.parse::<i64>() {
                    if type_name.starts_with("float")
                        || type_name.starts_with("double")
                        || type_name.starts_with("half")
                    {
                        Value::Float(value as f64)
                    } else {
                        Value::Int(value)
                    }
                } else {
                    Value::Float(number.parse::<f64>().map_err(|_e| {
                        parse_error(line, format!("invalid number '{}'", number))
                    })?)
                }
            }
            TokenKind::Ident(ident) => match ident.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Raw(ident),
            },
            TokenKind::Punct(c) => {
                return Err(parse_error(line, format!("unexpected '{}' as value", c)))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHYSICS_MATERIAL: &str = r#"#usda 1.0
(
    defaultPrim = "Root"
    metersPerUnit = 0.01
    upAxis = "Y"
)

def Xform "Root" (
    kind = "component"
    prepend apiSchemas = ["PhysicsMaterialAPI"]
)
{
    string uid = "01234567-89ab-cdef-0123-456789abcdef"
    custom string comment = "stone \"slab\""
    uniform token purpose = "default"
    float physics:density = 2.5
    float physics:staticFriction = 1
    int layer = -3
    bool enabled = 1
    float3[] extent = [(-1, -1, -1), (1, 1, 1)]
    asset texture = @./stone.png@
    rel material:binding = </Root/Material>
    double3 xformOp:translate.timeSamples = {
        0: (0, 0, 0),
        10: (0, 1e-3, 0),
    }

    def Cube "Collider"
    {
        double size = 2.0 (
            doc = "edge length"
        )
    }

    variantSet "lod" = {
        "high" {
            def Scope "Unused" {}
        }
    }
}

over "Overrides"
{
    string note
}
"#;

    #[test]
    fn parse_physics_material() {
        let stage = parse(PHYSICS_MATERIAL).unwrap();

        assert_eq!(
            stage.root_prims(),
            ["/Root".to_owned(), "/Overrides".to_owned()]
        );

        let root = stage.prim_at_path("/Root").unwrap();
        assert_eq!(root.specifier(), Specifier::Def);
        assert_eq!(root.type_name(), Some("Xform"));
        assert_eq!(
            root.get_string("uid"),
            Some("01234567-89ab-cdef-0123-456789abcdef")
        );
        assert_eq!(root.get_string("comment"), Some("stone \"slab\""));
        assert!(root.property("comment").unwrap().custom);
        assert_eq!(root.get_string("purpose"), None);
        assert_eq!(
            root.property("purpose").unwrap().value,
            Some(Value::Token("default".to_owned()))
        );
        assert_eq!(
            root.property("physics:density").unwrap().value,
            Some(Value::Float(2.5))
        );
        assert_eq!(
            root.property("physics:staticFriction").unwrap().value,
            Some(Value::Float(1.0))
        );
        assert_eq!(
            root.property("layer").unwrap().value,
            Some(Value::Int(-3))
        );
        assert_eq!(
            root.property("enabled").unwrap().value,
            Some(Value::Bool(true))
        );
        assert_eq!(root.property("extent").unwrap().type_name, "float3[]");
        assert_eq!(
            root.property("texture").unwrap().value,
            Some(Value::Asset("./stone.png".to_owned()))
        );
        assert_eq!(
            root.property("material:binding").unwrap().value,
            Some(Value::Path("/Root/Material".to_owned()))
        );
        assert!(root.property("xformOp:translate.timeSamples").is_some());

        let collider = stage.prim_at_path("/Root/Collider").unwrap();
        assert_eq!(collider.type_name(), Some("Cube"));
        assert_eq!(
            collider.property("size").unwrap().value,
            Some(Value::Float(2.0))
        );
        assert_eq!(root.children(), ["/Root/Collider".to_owned()]);

        // variant content is not composed.
        assert!(stage.prim_at_path("/Root/Unused").is_none());

        let overrides = stage.prim_at_path("/Overrides").unwrap();
        assert_eq!(overrides.specifier(), Specifier::Over);
        assert_eq!(overrides.type_name(), None);
        assert_eq!(overrides.property("note").unwrap().value, None);
    }

    #[test]
    fn empty_document() {
        let stage = parse("#usda 1.0\n").unwrap();
        assert!(stage.root_prims().is_empty());
    }

    #[test]
    fn triple_quoted_strings() {
        let stage = parse(
            "def \"Root\" {\n    string doc = \"\"\"first\nsecond\"\"\"\n    string after = 'x'\n}\n",
        )
        .unwrap();
        let root = stage.prim_at_path("/Root").unwrap();
        assert_eq!(root.get_string("doc"), Some("first\nsecond"));
        assert_eq!(root.get_string("after"), Some("x"));
    }

    #[test]
    fn error_lines() {
        let err = parse("#usda 1.0\ndef Xform \"Root\"\n{\n    string uid = \"abc\n}\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 4, .. }), "{:?}", err);

        let err = parse("#usda 1.0\n\ndef Xform \"Root\"\n{\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }), "{:?}", err);

        let err = parse("def Xform \"Root\" {}\ndef Xform \"Root\" {}\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "{:?}", err);

        let err = parse("string uid = \"abc\"\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }), "{:?}", err);
    }

    #[test]
    fn metadata_groups_are_skipped() {
        let stage = parse(
            "#usda 1.0\n(\n    doc = \"layer\"\n    customLayerData = { int a = 1 }\n)\n\
             def Xform \"Root\" (kind = \"component\")\n{\n    \
             string uid = \"abc\" (doc = \"id\")\n    int[] xs = [1, [2, 3]]\n}\n",
        )
        .unwrap();
        let root = stage.prim_at_path("/Root").unwrap();
        assert_eq!(root.get_string("uid"), Some("abc"));

        let err = parse("def \"Root\" (\n    kind = \"component\"\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }), "{:?}", err);
    }
}
