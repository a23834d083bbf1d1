use crate::error::{CodecError, Result};
use crate::registry::{SerializerKind, SerializerRegistry};
use crate::serializer::Serializer;

/// Batch size used when a `batched(...)` expression omits the parameter.
pub const DEFAULT_BATCH_SIZE: i64 = 1024;

/// Build a serializer from a nested constructor-call expression.
///
/// Names resolve through the registry (case-insensitive, aliases included)
/// and may nest arbitrarily deep:
///
/// ```
/// use taskwire_codec::{build, Serializer, SerializerRegistry};
///
/// let registry = SerializerRegistry::default();
/// let codec = build(&registry, "batched(compressed(plain), 10)").unwrap();
/// assert_eq!(
///     codec,
///     Serializer::batched(Serializer::compressed(Serializer::Plain), 10)
/// );
/// assert_eq!(build(&registry, "base").unwrap(), Serializer::Plain);
/// ```
pub fn build(registry: &SerializerRegistry, expr: &str) -> Result<Serializer> {
    let mut parser = Parser {
        registry,
        src: expr,
        pos: 0,
    };
    let serializer = parser.parse_expr()?;
    parser.skip_whitespace();
    if parser.pos != parser.src.len() {
        return Err(CodecError::Build(format!(
            "trailing input at byte {}: {expr:?}",
            parser.pos
        )));
    }
    Ok(serializer)
}

struct Parser<'a> {
    registry: &'a SerializerRegistry,
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn parse_expr(&mut self) -> Result<Serializer> {
        let name = self.parse_name()?;
        let kind = self.registry.find_strict(&name)?;
        let (wants_inner, wants_size) = kind.arity();

        self.skip_whitespace();
        let has_args = self.eat(b'(');

        let inner = if wants_inner {
            if !has_args {
                return Err(CodecError::Build(format!(
                    "{name} requires an inner serializer argument"
                )));
            }
            Some(self.parse_expr()?)
        } else {
            None
        };

        let size = if wants_size && has_args && {
            self.skip_whitespace();
            self.eat(b',')
        } {
            Some(self.parse_int()?)
        } else {
            None
        };

        if has_args {
            self.skip_whitespace();
            if !self.eat(b')') {
                return Err(CodecError::Build(format!(
                    "expected ')' at byte {} in {:?}",
                    self.pos, self.src
                )));
            }
        }

        Ok(match kind {
            SerializerKind::Plain => Serializer::Plain,
            // arity() guarantees inner is present for wrapping kinds
            SerializerKind::Compressed => Serializer::compressed(inner.unwrap()),
            SerializerKind::Batched => {
                Serializer::batched(inner.unwrap(), size.unwrap_or(DEFAULT_BATCH_SIZE))
            }
        })
    }

    fn parse_name(&mut self) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(CodecError::Build(format!(
                "expected a serializer name at byte {} in {:?}",
                self.pos, self.src
            )));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_int(&mut self) -> Result<i64> {
        self.skip_whitespace();
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.src[start..self.pos].parse().map_err(|_| {
            CodecError::Build(format!(
                "expected an integer at byte {start} in {:?}",
                self.src
            ))
        })
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}
