//! Tokeniser for a single statement line.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    None,
    And,
    Or,
    Not,
    Del,
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
    Comma,
    Assign,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

pub(crate) fn tokenize(line: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        match ch {
            '#' => break,
            c if c.is_whitespace() => {
                chars.next();
            }
            c if c.is_ascii_digit() || c == '.' => tokens.push(number(line, start, &mut chars)?),
            c if c.is_alphabetic() || c == '_' => tokens.push(word(line, start, &mut chars)),
            '\'' | '"' => tokens.push(string(&mut chars)?),
            _ => tokens.push(operator(&mut chars)?),
        }
    }

    Ok(tokens)
}

fn take_while(
    chars: &mut Peekable<CharIndices<'_>>,
    mut predicate: impl FnMut(char) -> bool,
) -> Option<usize> {
    let mut end = None;
    while let Some(&(index, ch)) = chars.peek() {
        if !predicate(ch) {
            break;
        }
        end = Some(index + ch.len_utf8());
        chars.next();
    }
    end
}

fn number(
    line: &str,
    start: usize,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<Token, EvalError> {
    let mut seen_dot = false;
    let mut seen_exponent = false;
    let mut previous = '\0';
    let end = take_while(chars, |ch| {
        let accept = match ch {
            '0'..='9' => true,
            '.' if !seen_dot && !seen_exponent => {
                seen_dot = true;
                true
            }
            'e' | 'E' if !seen_exponent => {
                seen_exponent = true;
                true
            }
            '+' | '-' => matches!(previous, 'e' | 'E'),
            _ => false,
        };
        previous = ch;
        accept
    })
    .unwrap_or(start);

    let text = line.get(start..end).unwrap_or_default();
    if seen_dot || seen_exponent {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| EvalError::syntax(format!("invalid number literal '{text}'")))
    } else {
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| EvalError::syntax(format!("integer literal '{text}' is out of range")))
    }
}

fn word(line: &str, start: usize, chars: &mut Peekable<CharIndices<'_>>) -> Token {
    let end = take_while(chars, |ch| ch.is_alphanumeric() || ch == '_').unwrap_or(start);
    match line.get(start..end).unwrap_or_default() {
        "true" => Token::True,
        "false" => Token::False,
        "none" => Token::None,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "del" => Token::Del,
        ident => Token::Ident(ident.to_owned()),
    }
}

fn string(chars: &mut Peekable<CharIndices<'_>>) -> Result<Token, EvalError> {
    let Some((_, quote)) = chars.next() else {
        return Err(EvalError::syntax("unterminated string literal"));
    };
    let mut text = String::new();
    loop {
        match chars.next() {
            Some((_, ch)) if ch == quote => return Ok(Token::Str(text)),
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, escaped)) => text.push(escaped),
                None => break,
            },
            Some((_, ch)) => text.push(ch),
            None => break,
        }
    }
    Err(EvalError::syntax("unterminated string literal"))
}

fn operator(chars: &mut Peekable<CharIndices<'_>>) -> Result<Token, EvalError> {
    let Some((_, ch)) = chars.next() else {
        return Err(EvalError::syntax("unexpected end of input"));
    };
    let next_is = |chars: &mut Peekable<CharIndices<'_>>, expected: char| {
        if chars.peek().is_some_and(|&(_, next)| next == expected) {
            chars.next();
            true
        } else {
            false
        }
    };

    let token = match ch {
        '+' => Token::Plus,
        '-' => Token::Minus,
        '*' if next_is(chars, '*') => Token::DoubleStar,
        '*' => Token::Star,
        '/' if next_is(chars, '/') => Token::DoubleSlash,
        '/' => Token::Slash,
        '%' => Token::Percent,
        '(' => Token::LParen,
        ')' => Token::RParen,
        ',' => Token::Comma,
        '=' if next_is(chars, '=') => Token::Eq,
        '=' => Token::Assign,
        '!' if next_is(chars, '=') => Token::Ne,
        '<' if next_is(chars, '=') => Token::Le,
        '<' => Token::Lt,
        '>' if next_is(chars, '=') => Token::Ge,
        '>' => Token::Gt,
        other => return Err(EvalError::syntax(format!("unexpected character '{other}'"))),
    };
    Ok(token)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn tokenizes_assignment_with_operators() {
        let tokens = tokenize("total = a ** 2 // 3").expect("tokenize");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("total".to_owned()),
                Token::Assign,
                Token::Ident("a".to_owned()),
                Token::DoubleStar,
                Token::Int(2),
                Token::DoubleSlash,
                Token::Int(3),
            ]
        );
    }

    #[rstest]
    #[case("1.5", Token::Float(1.5))]
    #[case("2e3", Token::Float(2000.0))]
    #[case("1e-2", Token::Float(0.01))]
    #[case("42", Token::Int(42))]
    fn tokenizes_numbers(#[case] input: &str, #[case] expected: Token) {
        assert_eq!(tokenize(input).expect("tokenize"), vec![expected]);
    }

    #[test]
    fn strings_support_escapes_and_both_quotes() {
        let tokens = tokenize(r#"'a\'b' "c\nd""#).expect("tokenize");
        assert_eq!(
            tokens,
            vec![Token::Str("a'b".to_owned()), Token::Str("c\nd".to_owned())]
        );
    }

    #[test]
    fn comments_end_the_line() {
        assert_eq!(tokenize("1 # ignored").expect("tokenize"), vec![Token::Int(1)]);
    }

    #[rstest]
    #[case("'open")]
    #[case("1 $ 2")]
    #[case("99999999999999999999")]
    fn rejects_malformed_input(#[case] input: &str) {
        assert!(matches!(tokenize(input), Err(EvalError::Syntax { .. })));
    }
}
