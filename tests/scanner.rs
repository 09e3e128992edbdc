#[cfg(test)]
mod scanner_tests {
    use quill::scanner::*;
    use quill::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let tokens: Vec<Token> = Scanner::new(source).collect();

        assert_eq!(tokens.len(), expected.len(), "tokens: {:?}", tokens);

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_two_char_operators_are_greedy() {
        assert_token_sequence(
            "== = != ! <= < >= > ===",
            &[
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::EQUAL, "="),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::BANG, "!"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::GREATER, ">"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::EQUAL, "="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class fn let print if else while return this true false nil classy _x f2",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::FN, "fn"),
                (TokenType::LET, "let"),
                (TokenType::PRINT, "print"),
                (TokenType::IF, "if"),
                (TokenType::ELSE, "else"),
                (TokenType::WHILE, "while"),
                (TokenType::RETURN, "return"),
                (TokenType::THIS, "this"),
                (TokenType::TRUE, "true"),
                (TokenType::FALSE, "false"),
                (TokenType::NIL, "nil"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::IDENTIFIER, "_x"),
                (TokenType::IDENTIFIER, "f2"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_numbers() {
        let tokens: Vec<Token> = Scanner::new("12 3.5 7. .5").collect();

        let kinds: Vec<&str> = tokens.iter().map(|t| t.token_type.name()).collect();
        assert_eq!(
            kinds,
            ["NUMBER", "NUMBER", "NUMBER", "DOT", "DOT", "NUMBER", "EOF"]
        );

        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 12.0));
        assert!(matches!(tokens[1].token_type, TokenType::NUMBER(n) if n == 3.5));
        assert_eq!(tokens[2].lexeme, "7");
        assert!(matches!(tokens[5].token_type, TokenType::NUMBER(n) if n == 5.0));
    }

    #[test]
    fn test_scanner_05_string_keeps_quotes_in_lexeme() {
        let tokens: Vec<Token> = Scanner::new("\"hello world\"").collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme, "\"hello world\"");
        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "hello world"));
    }

    #[test]
    fn test_scanner_06_multiline_string_counts_lines() {
        let tokens: Vec<Token> = Scanner::new("\"a\nb\"\nx").collect();

        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_scanner_07_unterminated_string_is_unknown_with_empty_text() {
        let tokens: Vec<Token> = Scanner::new("print \"oops\n").collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].token_type, TokenType::PRINT);
        assert!(tokens[1].is_unknown());
        assert_eq!(tokens[1].lexeme, "");
        assert_eq!(tokens[2].token_type, TokenType::EOF);
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_unexpected_chars_do_not_halt_scanning() {
        let tokens: Vec<Token> = Scanner::new(",.$(#").collect();

        // COMMA, DOT, UNKNOWN '$', LEFT_PAREN, UNKNOWN '#', EOF
        assert_eq!(tokens.len(), 6, "tokens: {:?}", tokens);

        assert_eq!(tokens[0].token_type, TokenType::COMMA);
        assert_eq!(tokens[1].token_type, TokenType::DOT);
        assert_eq!(tokens[3].token_type, TokenType::LEFT_PAREN);
        assert_eq!(tokens[5].token_type, TokenType::EOF);

        let unknown: Vec<&str> = tokens
            .iter()
            .filter(|t| t.is_unknown())
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(unknown, ["$", "#"]);
    }

    #[test]
    fn test_non_ascii_character_is_one_unknown_token() {
        let tokens: Vec<Token> = Scanner::new("a é b").collect();

        assert_eq!(tokens.len(), 4);
        assert!(tokens[1].is_unknown());
        assert_eq!(tokens[1].lexeme, "é");
        assert_eq!(tokens[2].lexeme, "b");
    }

    #[test]
    fn test_comments_and_whitespace_are_skipped() {
        let source = "// leading comment\nlet x = 1; // trailing\n\t// another\r\nprint x;";
        let tokens: Vec<Token> = Scanner::new(source).collect();

        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, ["let", "x", "=", "1", ";", "print", "x", ";", ""]);

        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[5].line, 4);
    }

    #[test]
    fn test_slash_alone_is_division() {
        assert_token_sequence(
            "6 / 3",
            &[
                (TokenType::NUMBER(0.0), "6"),
                (TokenType::SLASH, "/"),
                (TokenType::NUMBER(0.0), "3"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_lexemes_rebuild_source_modulo_whitespace() {
        let source = r#"
            class Counter {
                fn init(start) { this.count = start; }
                fn bump() { this.count = this.count + 1; return this.count; }
            }
            let c = Counter(10); // construct
            while (c.bump() <= 12) { print "tick" + "!"; }
            if (c.count != 13) print -1; else print 2.75 / 0.5;
        "#;

        let rebuilt: String = Scanner::new(source).map(|t| t.lexeme).collect();
        let stripped: String = source
            .lines()
            .map(|line| line.split("//").next().unwrap_or(""))
            .collect::<String>()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let rebuilt_stripped: String = rebuilt.chars().filter(|c| !c.is_whitespace()).collect();

        assert_eq!(rebuilt_stripped, stripped);
    }

    #[test]
    fn test_exactly_one_eof_then_fused() {
        let mut scanner = Scanner::new("x");

        assert_eq!(scanner.next().map(|t| t.lexeme), Some("x".to_string()));
        assert_eq!(
            scanner.next().map(|t| t.token_type),
            Some(TokenType::EOF)
        );
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_token_display() {
        let tokens: Vec<Token> = Scanner::new("let n = 3; let s = \"hi\"; 2.5").collect();
        let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(rendered[0], "LET let null");
        assert_eq!(rendered[3], "NUMBER 3 3.0");
        assert_eq!(rendered[8], "STRING \"hi\" hi");
        assert_eq!(rendered[10], "NUMBER 2.5 2.5");
        assert_eq!(rendered[11], "EOF  null");
    }
}
