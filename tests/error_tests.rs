use c0front::analyser::{compile_program, compile_statements, CompileError, ErrorKind, Ty};
use c0front::parser::lexer::{LexErrorKind, TokenKind};
use c0front::parser::source::SourceLocation;

fn program_error(source: &str) -> CompileError {
    compile_program(source).expect_err("Compilation should fail")
}

fn statements_error(source: &str) -> CompileError {
    compile_statements(source).expect_err("Compilation should fail")
}

#[test]
fn test_assign_to_constant() {
    let err = statements_error("const x: int = 1; x = 2;");
    assert_eq!(
        err,
        CompileError::AssignToConstant {
            name: "x".to_string(),
            location: SourceLocation::new(1, 19),
        }
    );
}

#[test]
fn test_use_before_initialization() {
    let err = statements_error("let y: int; y = y + 1;");
    assert_eq!(
        err,
        CompileError::NotInitialized {
            name: "y".to_string(),
            location: SourceLocation::new(1, 17),
        }
    );
}

#[test]
fn test_duplicate_and_undeclared() {
    assert_eq!(
        statements_error("let a: int; let a: int;"),
        CompileError::DuplicateDeclaration {
            name: "a".to_string(),
            location: SourceLocation::new(1, 17),
        }
    );
    assert_eq!(statements_error("a = 1;").kind(), ErrorKind::NotDeclared);

    // Shadowing in a nested scope is allowed
    assert!(compile_statements("let a: int = 1; { let a: int = 2; }").is_ok());
}

#[test]
fn test_first_error_wins() {
    let err = statements_error("let a: int;\nb = 1;\nconst c: int;");
    assert_eq!(err.kind(), ErrorKind::NotDeclared);
    assert_eq!(err.location().line, 2);
}

#[test]
fn test_tokenize_errors_propagate() {
    let err = program_error("let a: int = 1 # 2;");
    match err {
        CompileError::Tokenize(lex) => {
            assert_eq!(lex.kind, LexErrorKind::InvalidCharacter('#'));
            assert_eq!(lex.location, SourceLocation::new(1, 16));
        }
        other => panic!("Expected tokenize error, got {:?}", other),
    }

    let err = program_error("let a: int = 99999999999999999999999;");
    assert!(matches!(
        err,
        CompileError::Tokenize(ref lex) if matches!(lex.kind, LexErrorKind::IntegerOverflow(_))
    ));
}

#[test]
fn test_expected_token() {
    let err = program_error("let a int;");
    assert_eq!(
        err,
        CompileError::ExpectedToken {
            expected: vec![TokenKind::Colon],
            found: TokenKind::Ident,
            location: SourceLocation::new(1, 7),
        }
    );
    assert_eq!(
        err.to_string(),
        "Compile error at line 1, column 7: Expected ':', found identifier"
    );

    // A statement is not allowed at program level
    let err = program_error("let a: int = 1;\na = 2;");
    assert_eq!(err.kind(), ErrorKind::ExpectedToken);
    assert_eq!(err.location(), SourceLocation::new(2, 1));
}

#[test]
fn test_return_type_checks() {
    let err = program_error("fn f() -> void { return 1; }");
    assert_eq!(
        err,
        CompileError::TypeMismatch {
            expected: Ty::Void,
            found: Ty::Int,
            location: SourceLocation::new(1, 25),
        }
    );

    let err = program_error("fn f() -> int { return; }");
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    assert!(compile_program("fn f() -> void { return; }").is_ok());
}

#[test]
fn test_double_literals_unsupported() {
    let err = program_error("let d: double = 1.5;");
    assert_eq!(
        err,
        CompileError::UnsupportedLiteral {
            kind: TokenKind::DoubleLiteral,
            location: SourceLocation::new(1, 17),
        }
    );
}

#[test]
fn test_misplaced_assignment() {
    let err = statements_error("let a: int = 1;\nlet b: int = 2;\na * b = 3;");
    assert_eq!(
        err,
        CompileError::AssignmentInOperand {
            name: "b".to_string(),
            location: SourceLocation::new(3, 5),
        }
    );
    assert_eq!(
        err.to_string(),
        "Compile error at line 3, column 5: Assignment to 'b' cannot be used as an operand"
    );
}

#[test]
fn test_loop_control_outside_loop() {
    let err = program_error("fn main() -> void { continue; }");
    assert_eq!(
        err,
        CompileError::NotInLoop {
            keyword: TokenKind::ContinueKw,
            location: SourceLocation::new(1, 21),
        }
    );
    assert_eq!(
        err.to_string(),
        "Compile error at line 1, column 21: 'continue' outside of a loop"
    );
}
