//! Java lexer
//!
//! Splits Java source into tokens without resolving unicode escapes first, so `\u0041` outside
//! of a literal is an illegal character rather than an `A`. Comments and whitespace are skipped.
//! Callers that want the escapes resolved, as javac does, run `translate_unicode_escapes` first.
//! Like most Java lexers, `>>` and `>>>` come out as separate `>` tokens so generics close
//! properly; the parser is expected to glue shifts back together.
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{char, satisfy};
use nom::combinator::recognize;
use nom::error::{ErrorKind, ParseError};
use nom::multi::many0;
use nom::sequence::pair;
use nom::IResult;
use std::borrow::Cow;
use std::error;
use std::fmt;

const KEYWORDS: &[&str] = &[
    "assert", "break", "case", "catch", "class", "const", "continue", "do", "else", "enum",
    "extends", "finally", "for", "goto", "if", "implements", "import", "instanceof",
    "interface", "new", "package", "return", "super", "switch", "this", "throw", "throws",
    "try", "void", "while",
];

const MODIFIERS: &[&str] = &[
    "abstract", "default", "final", "native", "private", "protected", "public", "static",
    "strictfp", "synchronized", "transient", "volatile",
];

const BASIC_TYPES: &[&str] = &["boolean", "byte", "char", "double", "float", "int", "long", "short"];

/// Longest first, so the first prefix match wins
const OPERATORS: &[&str] = &[
    ">>>=", ">>=", "<<=", "...", "->", "::", "++", "--", "&&", "||", "==", "!=", "<=", ">=",
    "+=", "-=", "*=", "/=", "&=", "|=", "^=", "%=", "<<", "=", ">", "<", "!", "~", "?", ":",
    "+", "-", "*", "/", "&", "|", "^", "%",
];

const SEPARATORS: &str = "()[]{};,.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Modifier,
    BasicType,
    Boolean,
    Null,
    Identifier,
    Integer,
    FloatingPoint,
    Character,
    String,
    Separator,
    Operator,
    Annotation,
}

/// 1-based line and column (columns count chars, not bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub value: &'a str,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedString,
    UnterminatedCharacter,
    UnterminatedComment,
    MalformedTextBlock,
    MalformedNumber,
    MalformedUnicodeEscape,
    IllegalCharacter(char),
}

/// Why and where the source stopped making sense
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
}

impl LexError {
    /// `at` must be a suffix of `code`
    fn at(code: &str, at: &str, kind: LexErrorKind) -> Self {
        let mut cursor = Cursor::default();
        cursor.advance(&code[..code.len() - at.len()]);
        LexError { kind, position: cursor.position }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            LexErrorKind::UnterminatedString => write!(f, "unterminated string at {}", self.position),
            LexErrorKind::UnterminatedCharacter => {
                write!(f, "unterminated character literal at {}", self.position)
            }
            LexErrorKind::UnterminatedComment => write!(f, "unterminated comment at {}", self.position),
            LexErrorKind::MalformedTextBlock => {
                write!(f, "text block opening must end the line, at {}", self.position)
            }
            LexErrorKind::MalformedNumber => write!(f, "malformed number at {}", self.position),
            LexErrorKind::MalformedUnicodeEscape => {
                write!(f, "unicode escape needs four hex digits, at {}", self.position)
            }
            LexErrorKind::IllegalCharacter(c) => {
                write!(f, "illegal character {:?} at {}", c, self.position)
            }
        }
    }
}

impl error::Error for LexError {}

/// Parser error: `kind` is only set for failures that should stop lexing altogether.
#[derive(Debug, PartialEq)]
struct Failure<'a> {
    input: &'a str,
    kind: Option<LexErrorKind>,
}

impl<'a> ParseError<&'a str> for Failure<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Failure { input, kind: None }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type Lex<'a, O> = IResult<&'a str, O, Failure<'a>>;

fn failure(input: &str, kind: LexErrorKind) -> nom::Err<Failure> {
    nom::Err::Failure(Failure { input, kind: Some(kind) })
}

fn mismatch(input: &str) -> nom::Err<Failure> {
    nom::Err::Error(Failure { input, kind: None })
}

/// Tracks line and column while the input is consumed
#[derive(Default)]
struct Cursor {
    position: Position,
    after_cr: bool,
}

impl Cursor {
    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' if self.after_cr => self.after_cr = false,
                '\n' | '\r' => {
                    self.position.line += 1;
                    self.position.column = 1;
                    self.after_cr = c == '\r';
                }
                _ => {
                    self.position.column += 1;
                    self.after_cr = false;
                }
            }
        }
    }
}

//
// Whitespace and comments
//

fn whitespace(input: &str) -> Lex<&str> {
    take_while1(|c: char| matches!(c, ' ' | '\t' | '\x0C' | '\n' | '\r'))(input)
}

fn line_comment(input: &str) -> Lex<&str> {
    recognize(pair(tag("//"), take_while(|c: char| c != '\n' && c != '\r')))(input)
}

fn block_comment(input: &str) -> Lex<&str> {
    let (rest, _) = tag("/*")(input)?;
    match rest.find("*/") {
        Some(end) => {
            let len = input.len() - rest.len() + end + 2;
            Ok((&input[len..], &input[..len]))
        }
        None => Err(failure(input, LexErrorKind::UnterminatedComment)),
    }
}

fn trivia(input: &str) -> Lex<&str> {
    recognize(many0(alt((whitespace, line_comment, block_comment))))(input)
}

//
// Literals
//

/// A quoted literal on a single line, honoring backslash escapes
fn quoted(input: &str, quote: char, unterminated: LexErrorKind) -> Lex<&str> {
    let (rest, _) = char(quote)(input)?;
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                None | Some((_, '\n')) | Some((_, '\r')) => break,
                Some(_) => {}
            },
            '\n' | '\r' => break,
            c if c == quote => {
                let len = input.len() - rest.len() + i + c.len_utf8();
                return Ok((&input[len..], &input[..len]));
            }
            _ => {}
        }
    }
    Err(failure(input, unterminated))
}

fn text_block(input: &str) -> Lex<(TokenKind, &str)> {
    let (rest, _) = tag("\"\"\"")(input)?;
    let (rest, _) = take_while(|c: char| matches!(c, ' ' | '\t' | '\x0C'))(rest)?;
    if !(rest.starts_with('\n') || rest.starts_with('\r')) {
        return Err(failure(input, LexErrorKind::MalformedTextBlock));
    }
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' if rest[i..].starts_with("\"\"\"") => {
                let len = input.len() - rest.len() + i + 3;
                return Ok((&input[len..], (TokenKind::String, &input[..len])));
            }
            _ => {}
        }
    }
    Err(failure(input, LexErrorKind::UnterminatedString))
}

fn string_literal(input: &str) -> Lex<(TokenKind, &str)> {
    let (rest, value) = quoted(input, '"', LexErrorKind::UnterminatedString)?;
    Ok((rest, (TokenKind::String, value)))
}

fn char_literal(input: &str) -> Lex<(TokenKind, &str)> {
    let (rest, value) = quoted(input, '\'', LexErrorKind::UnterminatedCharacter)?;
    Ok((rest, (TokenKind::Character, value)))
}

/// End of a run of digits (underscores allowed between them), starting at `from`
fn digits(bytes: &[u8], from: usize, is_digit: fn(u8) -> bool) -> usize {
    let mut end = from;
    while end < bytes.len() && (is_digit(bytes[end]) || bytes[end] == b'_') {
        end += 1;
    }
    end
}

fn is_dec(b: u8) -> bool {
    b.is_ascii_digit()
}

fn is_hex(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

fn is_bin(b: u8) -> bool {
    b == b'0' || b == b'1'
}

/// Exponent with a mandatory digit run, e.g. `e-10` or `p3`
fn exponent<'a>(input: &'a str, bytes: &[u8], at: usize) -> Result<usize, nom::Err<Failure<'a>>> {
    let mut start = at + 1;
    if matches!(bytes.get(start), Some(b'+') | Some(b'-')) {
        start += 1;
    }
    let end = digits(bytes, start, is_dec);
    if end == start {
        Err(failure(input, LexErrorKind::MalformedNumber))
    } else {
        Ok(end)
    }
}

/// Returns the token kind and length of a numeric literal
fn numeric_extent(input: &str) -> Result<(TokenKind, usize), nom::Err<Failure>> {
    let bytes = input.as_bytes();
    let prefix = bytes.get(..2).map(|p| [p[0], p[1].to_ascii_lowercase()]);
    let mut float = false;
    let mut end;
    match prefix {
        Some([b'0', b'x']) => {
            end = digits(bytes, 2, is_hex);
            let mut mantissa = end > 2;
            if bytes.get(end) == Some(&b'.') {
                let frac_end = digits(bytes, end + 1, is_hex);
                mantissa |= frac_end > end + 1;
                end = frac_end;
                float = true;
            }
            if !mantissa {
                return Err(failure(input, LexErrorKind::MalformedNumber));
            }
            if matches!(bytes.get(end), Some(b'p') | Some(b'P')) {
                end = exponent(input, bytes, end)?;
                float = true;
            } else if float {
                // hex floats need a binary exponent
                return Err(failure(input, LexErrorKind::MalformedNumber));
            }
        }
        Some([b'0', b'b']) => {
            end = digits(bytes, 2, is_bin);
            if end == 2 {
                return Err(failure(input, LexErrorKind::MalformedNumber));
            }
        }
        _ => {
            end = digits(bytes, 0, is_dec);
            if bytes.get(end) == Some(&b'.') && bytes.get(end + 1) != Some(&b'.') {
                end = digits(bytes, end + 1, is_dec);
                float = true;
            }
            if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
                end = exponent(input, bytes, end)?;
                float = true;
            }
        }
    }
    let binary = prefix == Some([b'0', b'b']);
    match bytes.get(end) {
        Some(b'f') | Some(b'F') | Some(b'd') | Some(b'D') if !binary => {
            float = true;
            end += 1;
        }
        Some(b'l') | Some(b'L') if !float => end += 1,
        _ => {}
    }
    let kind = if float { TokenKind::FloatingPoint } else { TokenKind::Integer };
    Ok((kind, end))
}

fn number(input: &str) -> Lex<(TokenKind, &str)> {
    let bytes = input.as_bytes();
    let starts_number = match bytes {
        [b'0'..=b'9', ..] => true,
        [b'.', b'0'..=b'9', ..] => true,
        _ => false,
    };
    if !starts_number {
        return Err(mismatch(input));
    }
    let (kind, len) = numeric_extent(input)?;
    Ok((&input[len..], (kind, &input[..len])))
}

//
// Words and punctuation
//

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Decide what kind of word an identifier-shaped token is
pub fn classify(word: &str) -> TokenKind {
    if MODIFIERS.contains(&word) {
        TokenKind::Modifier
    } else if BASIC_TYPES.contains(&word) {
        TokenKind::BasicType
    } else if word == "true" || word == "false" {
        TokenKind::Boolean
    } else if word == "null" {
        TokenKind::Null
    } else if KEYWORDS.contains(&word) {
        TokenKind::Keyword
    } else {
        TokenKind::Identifier
    }
}

fn word(input: &str) -> Lex<(TokenKind, &str)> {
    let (rest, word) =
        recognize(pair(satisfy(is_identifier_start), take_while(is_identifier_part)))(input)?;
    Ok((rest, (classify(word), word)))
}

fn annotation(input: &str) -> Lex<(TokenKind, &str)> {
    let (rest, value) = tag("@")(input)?;
    Ok((rest, (TokenKind::Annotation, value)))
}

fn operator(input: &str) -> Lex<(TokenKind, &str)> {
    OPERATORS
        .iter()
        .find(|op| input.starts_with(*op))
        .map(|op| (&input[op.len()..], (TokenKind::Operator, &input[..op.len()])))
        .ok_or_else(|| mismatch(input))
}

fn separator(input: &str) -> Lex<(TokenKind, &str)> {
    match input.chars().next() {
        Some(c) if SEPARATORS.contains(c) => Ok((&input[1..], (TokenKind::Separator, &input[..1]))),
        _ => Err(mismatch(input)),
    }
}

fn token(input: &str) -> Lex<(TokenKind, &str)> {
    alt((text_block, string_literal, char_literal, number, word, annotation, operator, separator))(
        input,
    )
}

/// Replace `\uXXXX` escapes (any number of `u`s) with the characters they stand for.
///
/// A backslash only starts an escape if it is preceded by an even number of backslashes, so
/// `\\u0041` stays as written. Surrogate halves that don't pair up become U+FFFD. Text without
/// escapes is returned as is.
pub fn translate_unicode_escapes(code: &str) -> Result<Cow<str>, LexError> {
    if !code.contains("\\u") {
        return Ok(Cow::Borrowed(code));
    }
    let bytes = code.as_bytes();
    let mut out = String::with_capacity(code.len());
    let mut pending_high: Option<u16> = None;
    let mut copied = 0;
    let mut backslashes = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            backslashes = 0;
            i += 1;
            continue;
        }
        backslashes += 1;
        if backslashes % 2 == 0 || bytes.get(i + 1) != Some(&b'u') {
            i += 1;
            continue;
        }
        let mut hex_start = i + 1;
        while bytes.get(hex_start) == Some(&b'u') {
            hex_start += 1;
        }
        let unit = code.get(hex_start..hex_start + 4)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u16::from_str_radix(hex, 16).ok())
            .ok_or_else(|| LexError::at(code, &code[i..], LexErrorKind::MalformedUnicodeEscape))?;

        // A high surrogate waits for its low half, which must be the very next escape
        let adjacent = copied == i;
        if let Some(high) = pending_high.take() {
            if adjacent && (0xDC00..0xE000).contains(&unit) {
                let c = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                out.push(char::from_u32(c).unwrap_or('\u{fffd}'));
                copied = hex_start + 4;
                i = copied;
                backslashes = 0;
                continue;
            }
            out.push('\u{fffd}');
        }
        out.push_str(&code[copied..i]);
        if (0xD800..0xDC00).contains(&unit) {
            pending_high = Some(unit);
        } else {
            out.push(char::from_u32(u32::from(unit)).unwrap_or('\u{fffd}'));
        }
        copied = hex_start + 4;
        i = copied;
        backslashes = 0;
    }
    if pending_high.is_some() {
        out.push('\u{fffd}');
    }
    out.push_str(&code[copied..]);
    Ok(Cow::Owned(out))
}

/// Tokenize a whole compilation unit
pub fn tokenize(code: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut cursor = Cursor::default();
    let mut rest = code;
    loop {
        let (after, skipped) = trivia(rest).map_err(|err| lex_error(code, rest, err))?;
        cursor.advance(skipped);
        rest = after;
        if rest.is_empty() {
            return Ok(tokens);
        }
        let (after, (kind, value)) = token(rest).map_err(|err| lex_error(code, rest, err))?;
        tokens.push(Token { kind, value, position: cursor.position });
        cursor.advance(value);
        rest = after;
    }
}

/// Turn a parser error into a positioned lexer error
fn lex_error(code: &str, rest: &str, err: nom::Err<Failure>) -> LexError {
    match err {
        nom::Err::Failure(Failure { input, kind: Some(kind) }) => LexError::at(code, input, kind),
        _ => {
            let c = rest.chars().next().unwrap_or('\0');
            LexError::at(code, rest, LexErrorKind::IllegalCharacter(c))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(code: &str) -> Vec<&str> {
        tokenize(code).unwrap().into_iter().map(|t| t.value).collect()
    }

    fn kinds(code: &str) -> Vec<TokenKind> {
        tokenize(code).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn error_kind(code: &str) -> LexErrorKind {
        tokenize(code).unwrap_err().kind
    }

    #[test]
    fn class_declaration() {
        let code = "public class Foo extends Bar<T> { int x = 1; }";
        assert_eq!(
            values(code),
            vec!["public", "class", "Foo", "extends", "Bar", "<", "T", ">", "{", "int", "x", "=",
                 "1", ";", "}"]
        );
        assert_eq!(
            kinds("public class Foo { int x; boolean b = true; Object o = null; }"),
            vec![
                TokenKind::Modifier, TokenKind::Keyword, TokenKind::Identifier,
                TokenKind::Separator, TokenKind::BasicType, TokenKind::Identifier,
                TokenKind::Separator, TokenKind::BasicType, TokenKind::Identifier,
                TokenKind::Operator, TokenKind::Boolean, TokenKind::Separator,
                TokenKind::Identifier, TokenKind::Identifier, TokenKind::Operator,
                TokenKind::Null, TokenKind::Separator, TokenKind::Separator,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let code = "/** doc */\n// line\nint /* inline */ a; // trailing";
        assert_eq!(values(code), vec!["int", "a", ";"]);
        assert!(tokenize("// nothing but a comment").unwrap().is_empty());
        assert!(tokenize("").unwrap().is_empty());
        assert_eq!(values("/**/x"), vec!["x"]);
    }

    #[test]
    fn shifts_split_for_generics() {
        assert_eq!(values("a >> b"), vec!["a", ">", ">", "b"]);
        assert_eq!(values("a >>> b"), vec!["a", ">", ">", ">", "b"]);
        assert_eq!(values("a >>>= b"), vec!["a", ">>>=", "b"]);
        assert_eq!(values("a << b"), vec!["a", "<<", "b"]);
        assert_eq!(values("Map<String, List<Integer>> m"),
                   vec!["Map", "<", "String", ",", "List", "<", "Integer", ">", ">", "m"]);
    }

    #[test]
    fn lambdas_and_varargs() {
        assert_eq!(values("(a, b) -> a::b"), vec!["(", "a", ",", "b", ")", "->", "a", "::", "b"]);
        assert_eq!(values("void f(int... xs)"), vec!["void", "f", "(", "int", "...", "xs", ")"]);
        assert_eq!(values("x.y"), vec!["x", ".", "y"]);
    }

    #[test]
    fn annotations() {
        let tokens = tokenize("@Override\npublic void run() {}").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Annotation);
        assert_eq!(tokens[0].value, "@");
        assert_eq!(tokens[1].value, "Override");
        assert_eq!(tokens[2].position, Position { line: 2, column: 1 });
    }

    #[test]
    fn numbers() {
        let cases = [
            ("0", TokenKind::Integer),
            ("1_000L", TokenKind::Integer),
            ("0x1F", TokenKind::Integer),
            ("0b1010", TokenKind::Integer),
            ("017", TokenKind::Integer),
            ("3.14", TokenKind::FloatingPoint),
            ("3.14f", TokenKind::FloatingPoint),
            (".5e-3", TokenKind::FloatingPoint),
            ("1e10", TokenKind::FloatingPoint),
            ("2d", TokenKind::FloatingPoint),
            ("1.", TokenKind::FloatingPoint),
            ("0x1.8p3", TokenKind::FloatingPoint),
            ("0xFFp-2f", TokenKind::FloatingPoint),
        ];
        for &(code, kind) in cases.iter() {
            let tokens = tokenize(code).unwrap();
            assert_eq!(tokens.len(), 1, "{}", code);
            assert_eq!(tokens[0].value, code);
            assert_eq!(tokens[0].kind, kind, "{}", code);
        }
        assert_eq!(values("a[0].b"), vec!["a", "[", "0", "]", ".", "b"]);
        assert_eq!(values("0xCAFEL"), vec!["0xCAFEL"]);
    }

    #[test]
    fn malformed_numbers() {
        assert_eq!(error_kind("1e"), LexErrorKind::MalformedNumber);
        assert_eq!(error_kind("0x;"), LexErrorKind::MalformedNumber);
        assert_eq!(error_kind("0b2"), LexErrorKind::MalformedNumber);
    }

    #[test]
    fn string_and_char_literals() {
        let tokens = tokenize(r#"s = "hello \"world\""; c = '\''; d = 'x';"#).unwrap();
        assert_eq!(tokens[2].value, r#""hello \"world\"""#);
        assert_eq!(tokens[2].kind, TokenKind::String);
        assert_eq!(tokens[6].value, r"'\''");
        assert_eq!(tokens[6].kind, TokenKind::Character);
        assert_eq!(tokens[10].value, "'x'");
    }

    #[test]
    fn unicode_escapes_are_not_translated() {
        assert_eq!(values(r#""\u0041""#), vec![r#""\u0041""#]);
        assert_eq!(error_kind(r"int \u0041 = 1;"), LexErrorKind::IllegalCharacter('\\'));
    }

    #[test]
    fn translating_unicode_escapes() {
        assert_eq!(translate_unicode_escapes(r"int \u0041 = 1;").unwrap(), "int A = 1;");
        assert_eq!(translate_unicode_escapes(r"\uuu0041\u00e9").unwrap(), "A\u{e9}");
        // A backslash after an odd run of backslashes is itself escaped
        assert_eq!(translate_unicode_escapes(r#""\\u0041""#).unwrap(), r#""\\u0041""#);
        assert_eq!(translate_unicode_escapes(r"\\\u0041").unwrap(), r"\\A");
        assert_eq!(translate_unicode_escapes(r"\uD83D\uDE00!").unwrap(), "\u{1F600}!");
        assert_eq!(translate_unicode_escapes(r"\uD83D x").unwrap(), "\u{fffd} x");
        assert!(matches!(translate_unicode_escapes("no escapes"), Ok(Cow::Borrowed(_))));

        let err = translate_unicode_escapes("int a;\n  \\u12;").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::MalformedUnicodeEscape);
        assert_eq!(err.position, Position { line: 2, column: 3 });

        let code = translate_unicode_escapes(r"int \u0041 = 1;").unwrap();
        assert_eq!(values(&code), vec!["int", "A", "=", "1", ";"]);
    }

    #[test]
    fn text_blocks() {
        let code = "String s = \"\"\"\n    hello \"\"\n    world\"\"\";";
        let tokens = tokenize(code).unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[3].kind, TokenKind::String);
        assert!(tokens[3].value.ends_with("world\"\"\""));
        assert_eq!(tokens[4].position.line, 3);
        assert_eq!(error_kind("s = \"\"\"hello\"\"\";"), LexErrorKind::MalformedTextBlock);
        assert_eq!(error_kind("s = \"\"\"\nhello"), LexErrorKind::UnterminatedString);
    }

    #[test]
    fn unterminated_literals() {
        let err = tokenize("class A {\n  String s = \"oops;\n}").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.position, Position { line: 2, column: 14 });
        assert_eq!(error_kind("char c = 'a"), LexErrorKind::UnterminatedCharacter);
        assert_eq!(error_kind("int a; /* never closed"), LexErrorKind::UnterminatedComment);
    }

    #[test]
    fn illegal_characters() {
        let err = tokenize("int a = 1;\n#define").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::IllegalCharacter('#'));
        assert_eq!(err.position, Position { line: 2, column: 1 });
    }

    #[test]
    fn line_endings() {
        let tokens = tokenize("a\r\nb\rc\nd").unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.position.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
        let tokens = tokenize("  foo bar").unwrap();
        assert_eq!(tokens[1].position, Position { line: 1, column: 7 });
    }

    #[test]
    fn unicode_identifiers() {
        let tokens = tokenize("int größe = $x_1;").unwrap();
        assert_eq!(tokens[1].value, "größe");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].value, "$x_1");
        assert_eq!(tokens[4].position.column, 17);
    }
}
