//! Integration tests for the CSS tokenizer.

use wombat_css::tokenizer::{CSSToken, CSSTokenizer};

/// Helper to tokenize a string and return the tokens
fn tokenize(input: &str) -> Vec<CSSToken> {
    let mut tokenizer = CSSTokenizer::new(input);
    tokenizer.run();
    tokenizer.into_tokens()
}

#[test]
fn test_whitespace() {
    let tokens = tokenize("   \t\n  ");
    assert_eq!(tokens, vec![CSSToken::Whitespace, CSSToken::EOF]);
}

#[test]
fn test_ident_and_function() {
    let tokens = tokenize("margin-inline-start calc(");
    assert_eq!(tokens[0], CSSToken::Ident("margin-inline-start".to_string()));
    assert_eq!(tokens[2], CSSToken::Function("calc".to_string()));
}

#[test]
fn test_custom_property_name_is_an_ident() {
    let tokens = tokenize("--main-color");
    assert_eq!(tokens[0], CSSToken::Ident("--main-color".to_string()));
}

#[test]
fn test_at_keyword() {
    let tokens = tokenize("@layer");
    assert_eq!(tokens[0], CSSToken::AtKeyword("layer".to_string()));
}

#[test]
fn test_hash_id_flag() {
    let tokens = tokenize("#main #123");
    assert_eq!(
        tokens[0],
        CSSToken::Hash {
            value: "main".to_string(),
            is_id: true
        }
    );
    assert_eq!(
        tokens[2],
        CSSToken::Hash {
            value: "123".to_string(),
            is_id: false
        }
    );
}

#[test]
fn test_numeric_tokens() {
    let tokens = tokenize("42 1.5 50% 2em -3px");
    assert_eq!(
        tokens[0],
        CSSToken::Number {
            value: 42.0,
            is_integer: true
        }
    );
    assert_eq!(
        tokens[2],
        CSSToken::Number {
            value: 1.5,
            is_integer: false
        }
    );
    assert_eq!(tokens[4], CSSToken::Percentage(50.0));
    assert_eq!(
        tokens[6],
        CSSToken::Dimension {
            value: 2.0,
            is_integer: true,
            unit: "em".to_string()
        }
    );
    assert_eq!(
        tokens[8],
        CSSToken::Dimension {
            value: -3.0,
            is_integer: true,
            unit: "px".to_string()
        }
    );
}

#[test]
fn test_strings() {
    let tokens = tokenize(r#""double" 'single'"#);
    assert_eq!(tokens[0], CSSToken::String("double".to_string()));
    assert_eq!(tokens[2], CSSToken::String("single".to_string()));
}

#[test]
fn test_unquoted_url() {
    let tokens = tokenize("url(fonts/a.woff2)");
    assert_eq!(tokens[0], CSSToken::Url("fonts/a.woff2".to_string()));
}

#[test]
fn test_comments_are_dropped() {
    let tokens = tokenize("a/* comment */b");
    assert_eq!(
        tokens,
        vec![
            CSSToken::Ident("a".to_string()),
            CSSToken::Ident("b".to_string()),
            CSSToken::EOF
        ]
    );
}

#[test]
fn test_delims_and_punctuation() {
    let tokens = tokenize("a>b{c:d;}");
    assert_eq!(tokens[1], CSSToken::Delim('>'));
    assert_eq!(tokens[3], CSSToken::LeftBrace);
    assert_eq!(tokens[5], CSSToken::Colon);
    assert_eq!(tokens[7], CSSToken::Semicolon);
    assert_eq!(tokens[8], CSSToken::RightBrace);
}

#[test]
fn test_escaped_ident() {
    let tokens = tokenize(r"\31 23");
    assert_eq!(tokens[0], CSSToken::Ident("123".to_string()));
}
