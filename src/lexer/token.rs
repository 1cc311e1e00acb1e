use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Keywords
    #[token("contract")]
    Contract,
    #[token("clause")]
    Clause,
    #[token("locks")]
    Locks,
    #[token("of")]
    Of,
    #[token("lock")]
    Lock,
    #[token("unlock")]
    Unlock,
    #[token("with")]
    With,
    #[token("verify")]
    Verify,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("define")]
    Define,
    #[token("assign")]
    Assign,
    #[token("import")]
    Import,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntLit(i64),
    #[regex(r"0x[0-9a-fA-F]*", |lex| decode_hex(&lex.slice()[2..]))]
    HexLit(Vec<u8>),
    #[regex(r"'([^'\\]|\\.)*'", |lex| unescape(lex.slice()))]
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    StringLit(Vec<u8>),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // Operators
    #[token("||")]
    PipePipe,
    #[token("&&")]
    AmpAmp,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("^")]
    Caret,
    #[token("|")]
    Pipe,
    #[token("&")]
    Amp,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("=")]
    Eq,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,

    // Comments (skip)
    #[regex(r"//[^\n]*")]
    Comment,
}

fn decode_hex(digits: &str) -> Option<Vec<u8>> {
    if digits.len() % 2 != 0 {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
        .collect()
}

/// Strips the surrounding quotes and resolves backslash escapes.
fn unescape(quoted: &str) -> Vec<u8> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        let c = if c == '\\' {
            match chars.next() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('0') => '\0',
                Some(other) => other,
                None => break,
            }
        } else {
            c
        };
        let mut buf = [0u8; 4];
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
    out
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Contract => write!(f, "contract"),
            Token::Clause => write!(f, "clause"),
            Token::Locks => write!(f, "locks"),
            Token::Of => write!(f, "of"),
            Token::Lock => write!(f, "lock"),
            Token::Unlock => write!(f, "unlock"),
            Token::With => write!(f, "with"),
            Token::Verify => write!(f, "verify"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::Define => write!(f, "define"),
            Token::Assign => write!(f, "assign"),
            Token::Import => write!(f, "import"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::IntLit(n) => write!(f, "{n}"),
            Token::HexLit(_) => write!(f, "hex literal"),
            Token::StringLit(_) => write!(f, "string literal"),
            Token::Ident => write!(f, "identifier"),
            Token::PipePipe => write!(f, "||"),
            Token::AmpAmp => write!(f, "&&"),
            Token::EqEq => write!(f, "=="),
            Token::BangEq => write!(f, "!="),
            Token::LtEq => write!(f, "<="),
            Token::GtEq => write!(f, ">="),
            Token::Shl => write!(f, "<<"),
            Token::Shr => write!(f, ">>"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Caret => write!(f, "^"),
            Token::Pipe => write!(f, "|"),
            Token::Amp => write!(f, "&"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Bang => write!(f, "!"),
            Token::Tilde => write!(f, "~"),
            Token::Eq => write!(f, "="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Comment => write!(f, "comment"),
        }
    }
}
