//! Tokenizer shared by the rule and query notations.

use super::SyntaxError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `<iri>`.
    IriRef(String),
    /// `prefix:local`.
    PrefixedName(String, String),
    /// `?name` or `$name`.
    Variable(String),
    /// `_:label`.
    BlankNode(String),
    /// Quoted string, escapes resolved.
    StringLit(String),
    /// `@lang` following a string.
    LangTag(String),
    /// `^^`.
    DatatypeMarker,
    /// Integer literal, lexical form.
    Integer(String),
    /// Decimal literal, lexical form.
    Decimal(String),
    /// Double literal, lexical form.
    Double(String),
    /// Bare word: `a`, `true`, `SELECT`, `WHERE`, ...
    Word(String),
    /// `@prefix`.
    AtPrefix,
    /// `=>`.
    Implies,
    /// `{`.
    LBrace,
    /// `}`.
    RBrace,
    /// `[`.
    LBracket,
    /// `]`.
    RBracket,
    /// `.`.
    Dot,
    /// `;`.
    Semicolon,
    /// `,`.
    Comma,
    /// `*`.
    Star,
}

impl Token {
    /// Whether this token is the given bare word, case-insensitively.
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(word))
    }
}

/// A token with its source position (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Line number.
    pub line: usize,
    /// Column number.
    pub column: usize,
}

/// Tokenize a rule document or query.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, SyntaxError> {
    Lexer::new(input).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.line, self.column, message)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    fn run(mut self) -> Result<Vec<Spanned>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            // Skip whitespace and comments
            match self.peek() {
                None => break,
                Some(c) if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                Some('#') => {
                    self.take_while(|c| c != '\n');
                    continue;
                }
                Some(_) => {}
            }

            let (line, column) = (self.line, self.column);
            let token = self.next_token(&tokens)?;
            tokens.push(Spanned { token, line, column });
        }
        Ok(tokens)
    }

    fn next_token(&mut self, previous: &[Spanned]) -> Result<Token, SyntaxError> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Err(self.error("unexpected end of input")),
        };

        match c {
            '<' => {
                self.bump();
                let iri = self.take_while(|c| c != '>' && !c.is_whitespace());
                if self.bump() != Some('>') {
                    return Err(self.error("unterminated IRI reference"));
                }
                Ok(Token::IriRef(iri))
            }
            '?' | '$' => {
                self.bump();
                let name = self.take_while(is_name_char);
                if name.is_empty() {
                    return Err(self.error("empty variable name"));
                }
                Ok(Token::Variable(name))
            }
            '"' | '\'' => self.string(c),
            '@' => {
                self.bump();
                let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
                let after_string = matches!(
                    previous.last().map(|s| &s.token),
                    Some(Token::StringLit(_))
                );
                if word == "prefix" && !after_string {
                    Ok(Token::AtPrefix)
                } else if after_string && !word.is_empty() {
                    Ok(Token::LangTag(word))
                } else {
                    Err(self.error(format!("unexpected directive @{}", word)))
                }
            }
            '^' => {
                self.bump();
                if self.bump() != Some('^') {
                    return Err(self.error("expected ^^"));
                }
                Ok(Token::DatatypeMarker)
            }
            '=' => {
                self.bump();
                if self.bump() != Some('>') {
                    return Err(self.error("expected =>"));
                }
                Ok(Token::Implies)
            }
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            ';' => self.single(Token::Semicolon),
            ',' => self.single(Token::Comma),
            '*' => self.single(Token::Star),
            '.' => self.single(Token::Dot),
            '_' => {
                self.bump();
                if self.peek() == Some(':') {
                    self.bump();
                    let label = self.take_while(is_name_char);
                    if label.is_empty() {
                        return Err(self.error("empty blank node label"));
                    }
                    Ok(Token::BlankNode(label))
                } else {
                    let rest = self.take_while(is_name_char);
                    self.word_or_prefixed(format!("_{}", rest))
                }
            }
            c if c.is_ascii_digit() || c == '+' || c == '-' => self.number(),
            c if c.is_alphabetic() || c == ':' => {
                let word = self.take_while(is_name_char);
                self.word_or_prefixed(word)
            }
            other => Err(self.error(format!("unexpected character '{}'", other))),
        }
    }

    fn single(&mut self, token: Token) -> Result<Token, SyntaxError> {
        self.bump();
        Ok(token)
    }

    fn word_or_prefixed(&mut self, word: String) -> Result<Token, SyntaxError> {
        if self.peek() != Some(':') {
            return Ok(Token::Word(word));
        }
        self.bump();
        let mut local = String::new();
        loop {
            match self.peek() {
                Some(c) if is_name_char(c) || c == '%' => {
                    local.push(c);
                    self.bump();
                }
                Some('.') => {
                    // A local name cannot end with '.', so a dot only belongs to
                    // the name when another name character follows it.
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek().map_or(false, |c| is_name_char(*c)) {
                        local.push('.');
                        self.bump();
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(Token::PrefixedName(word, local))
    }

    fn string(&mut self, quote: char) -> Result<Token, SyntaxError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('"') => out.push('"'),
                    Some('\'') => out.push('\''),
                    Some('\\') => out.push('\\'),
                    other => {
                        return Err(self.error(format!("invalid escape sequence \\{}", other.unwrap_or(' '))))
                    }
                },
                Some(c) => out.push(c),
            }
        }
        Ok(Token::StringLit(out))
    }

    fn number(&mut self) -> Result<Token, SyntaxError> {
        let mut lexical = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            lexical.push(sign);
            self.bump();
        }
        let integral = self.take_while(|c| c.is_ascii_digit());
        if integral.is_empty() {
            return Err(self.error("expected digits"));
        }
        lexical.push_str(&integral);

        let mut is_decimal = false;
        if self.peek() == Some('.') {
            // Only a fraction if a digit follows; otherwise the dot terminates a statement.
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.bump();
                lexical.push('.');
                lexical.push_str(&self.take_while(|c| c.is_ascii_digit()));
                is_decimal = true;
            }
        }

        if let Some(e @ ('e' | 'E')) = self.peek() {
            self.bump();
            lexical.push(e);
            if let Some(sign @ ('+' | '-')) = self.peek() {
                lexical.push(sign);
                self.bump();
            }
            let exponent = self.take_while(|c| c.is_ascii_digit());
            if exponent.is_empty() {
                return Err(self.error("expected exponent digits"));
            }
            lexical.push_str(&exponent);
            return Ok(Token::Double(lexical));
        }

        if is_decimal {
            Ok(Token::Decimal(lexical))
        } else {
            Ok(Token::Integer(lexical))
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_rule_tokens() {
        let toks = tokens("{ ?x a untp:Claim } => { ?x inf:ok true } .");
        assert_eq!(toks[0], Token::LBrace);
        assert_eq!(toks[1], Token::Variable("x".into()));
        assert_eq!(toks[2], Token::Word("a".into()));
        assert_eq!(toks[3], Token::PrefixedName("untp".into(), "Claim".into()));
        assert_eq!(toks[5], Token::Implies);
        assert_eq!(toks.last(), Some(&Token::Dot));
    }

    #[test]
    fn test_literals() {
        let toks = tokens(r#""a\"b"@en "1"^^xsd:integer 42 3.5 1e3 -7 ."#);
        assert_eq!(toks[0], Token::StringLit("a\"b".into()));
        assert_eq!(toks[1], Token::LangTag("en".into()));
        assert_eq!(toks[3], Token::DatatypeMarker);
        assert_eq!(toks[5], Token::Integer("42".into()));
        assert_eq!(toks[6], Token::Decimal("3.5".into()));
        assert_eq!(toks[7], Token::Double("1e3".into()));
        assert_eq!(toks[8], Token::Integer("-7".into()));
        assert_eq!(toks[9], Token::Dot);
    }

    #[test]
    fn test_integer_before_terminator() {
        let toks = tokens("?x :p 1 .");
        assert_eq!(toks[2], Token::Integer("1".into()));
        assert_eq!(toks[3], Token::Dot);
    }

    #[test]
    fn test_prefixed_name_before_terminator() {
        let toks = tokens("?x a untp:Claim.");
        assert_eq!(toks[2], Token::PrefixedName("untp".into(), "Claim".into()));
        assert_eq!(toks[3], Token::Dot);

        let toks = tokens("ex:v1.2 .");
        assert_eq!(toks[0], Token::PrefixedName("ex".into(), "v1.2".into()));
    }

    #[test]
    fn test_comments_and_prefix() {
        let toks = tokens("# header\n@prefix ex: <http://ex.org/> . # trailing\n");
        assert_eq!(toks[0], Token::AtPrefix);
        assert_eq!(toks[1], Token::PrefixedName("ex".into(), "".into()));
        assert_eq!(toks[2], Token::IriRef("http://ex.org/".into()));
    }

    #[test]
    fn test_error_position() {
        let err = tokenize("{\n  ?x ! }").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 6);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize("\"open").is_err());
    }
}
