//! faxc-par - Parser (Syntactic Analyzer)
//!
//! ============================================================================
//! PARSING THEORY
//! ============================================================================
//!
//! Parsing is the process of analyzing a string of tokens to determine
//! its grammatical structure according to a formal grammar. The output
//! is an Abstract Syntax Tree (AST).
//!
//! FORMAL DEFINITION:
//! ------------------
//! Given:
//! - G = (N, T, P, S) where
//!   N = non-terminal symbols
//!   T = terminal symbols (tokens)
//!   P = production rules
//!   S = start symbol
//!
//! Parsing is finding a derivation S ⇒* w where w is the input token sequence.
//!
//! GRAMMAR TYPES (Chomsky Hierarchy):
//! ----------------------------------
//!
//! Type 0: Unrestricted (Turing-complete)
//! Type 1: Context-sensitive
//! Type 2: Context-free (most programming languages)
//! Type 3: Regular (tokens/lexer)
//!
//! Most programming languages use context-free grammars (CFG) with some
//! context-sensitive elements (e.g., type checking) handled later.
//!
//! GRAMMAR NOTATION:
//! -----------------
//! We use Extended Backus-Naur Form (EBNF):
//!
//! ```ebnf
//! function = "fn" identifier "(" parameters ")" [ "->" type ] block ;
//!
//! parameters = [ parameter { "," parameter } ] ;
//!
//! parameter = identifier ":" type ;
//!
//! block = "{" { statement } "}" ;
//! ```
//!
//! Symbols:
//! - "literal" = exact token match
//! - [ optional ] = zero or one
//! - { repetition } = zero or more
//! - ( grouping ) = precedence
//! - | = alternation (choice)
//!
//! ============================================================================
//! PARSING ALGORITHMS
//! ============================================================================
//!
//! ALGORITHM 1: RECURSIVE DESCENT
//! ------------------------------
//!
//! A top-down parser where each non-terminal has a corresponding function.
//!
//! Structure:
//! ```
//! parse_function() {
//!     expect(Fn);
//!     name = parse_identifier();
//!     expect(LParen);
//!     params = parse_parameters();
//!     expect(RParen);
//!     ret = optional(parse_return_type);
//!     body = parse_block();
//!     return Function { name, params, ret, body };
//! }
//! ```
//!
//! REQUIREMENTS:
//! - Grammar must not be left-recursive
//! - Predictive (no backtracking) requires LL(1) grammar
//!
//! LEFT RECURSION ELIMINATION:
//! ---------------------------
//!
//! Problem:
//! ```
//! expr := expr + term | term
//! ```
//!
//! This causes infinite recursion in recursive descent!
//!
//! Solution - Transform to right recursion:
//! ```
//! expr := term { + term }
//! ```
//!
//! Or use iteration:
//! ```
//! parse_expr() {
//!     left = parse_term();
//!     while current == Plus {
//!         consume(Plus);
//!         right = parse_term();
//!         left = Binary(left, Plus, right);
//!     }
//!     return left;
//! }
//! ```
//!
//! ALGORITHM 2: PRATT PARSING (TOP-DOWN OPERATOR PRECEDENCE)
//! ---------------------------------------------------------
//!
//! Efficient expression parsing handling precedence and associativity.
//!
//! KEY IDEA:
//! Each token has two binding powers:
//! - Left binding power (lbp): How strongly it binds to the left
//! - Right binding power (rbp): How strongly it binds to the right
//!
//! Higher binding power = tighter grouping
//!
//! PRECEDENCE TABLE (higher number = tighter binding):
//! ```
//! Token       lbp     rbp     Associativity
//! -----------------------------------------
//! =           1       2       Right
//! ||          3       4       Left
//! &&          5       6       Left
//! ==, !=      7       8       Left
//! <, >, etc.  9       10      Left
//! +, -        11      12      Left
//! *, /, %     13      14      Left
//! !, - (unary)15      -       Prefix
//!
//! Literals    0       -       Atom
//! ```
//!
//! ALGORITHM:
//! ```
//! parse_expression(min_bp) {
//!     // Parse prefix (atom or prefix operator)
//!     lhs = parse_prefix();
//!     
//!     while lbp(current) >= min_bp {
//!         op = current;
//!         advance();
//!         rhs = parse_expression(rbp(op));
//!         lhs = Binary(lhs, op, rhs);
//!     }
//!     
//!     return lhs;
//! }
//! ```
//!
//! EXAMPLE:
//! ```
//! Input: a + b * c
//!
//! parse_expression(0):
//!   lhs = parse_prefix() → "a"
//!   
//!   lbp(+) = 11 >= 0, so:
//!     op = +
//!     advance()
//!     rhs = parse_expression(12)  // rbp(+) = 12
//!       parse_prefix() → "b"
//!       lbp(*) = 13 >= 12, so:
//!         op = *
//!         advance()
//!         rhs = parse_expression(14) → "c"
//!         lhs = Binary("b", *, "c")
//!       lbp(end) = 0 < 12, stop
//!       return Binary("b", *, "c")
//!     lhs = Binary("a", +, Binary("b", *, "c"))
//!   
//!   lbp(end) = 0 < 0, stop
//!   return Binary("a", +, Binary("b", *, "c"))
//! ```
//!
//! RESULT: Correct precedence: a + (b * c)
//!
//! ALGORITHM 3: LR PARSING (BOTTOM-UP)
//! -----------------------------------
//!
//! Not used in this implementation but important to understand.
//!
//! Uses a stack and state machine (DFA) to shift tokens and reduce
//! by production rules.
//!
//! Actions:
//! - Shift: Push token onto stack
//! - Reduce: Replace top N stack items with non-terminal
//!
//! Advantages:
//! - Handles left recursion naturally
//! - More powerful than LL (can parse more grammars)
//!
//! Disadvantages:
//! - Harder to write by hand
//! - Error messages less clear
//!
//! ============================================================================
//! ABSTRACT SYNTAX TREE (AST)
//! ============================================================================
//!
//! The AST represents the syntactic structure of code as a tree.
//! It abstracts away concrete syntax (parentheses, semicolons) and
//! focuses on semantic structure.
//!
//! DESIGN PRINCIPLES:
//! ------------------
//! 1. COMPLETENESS: Capture all semantic information
//! 2. ABSTRACTION: Remove syntactic sugar
//! 3. UNAMBIGUITY: One AST node per construct
//! 4. EXTENSIBILITY: Easy to add new node types
//!
//! AST vs CST (Concrete Syntax Tree):
//! ----------------------------------
//! CST includes all tokens (parentheses, braces, etc.).
//! AST is abstracted - only essential information.
//!
//! Example:
//! ```
//! Source: (a + b) * c
//!
//! CST:
//!   BinaryExpr
//!   ├── LParen "("
//!   ├── BinaryExpr
//!   │   ├── Ident "a"
//!   │   ├── Plus "+"
//!   │   └── Ident "b"
//!   ├── RParen ")"
//!   ├── Star "*"
//!   └── Ident "c"
//!
//! AST:
//!   BinaryExpr(*)
//!   ├── BinaryExpr(+)
//!   │   ├── Ident("a")
//!   │   └── Ident("b")
//!   └── Ident("c")
//! ```
//!
//! NODE TYPES:
//! -----------
//!
//! 1. ITEMS - Top-level declarations
//!    - Functions
//!    - Structs
//!    - Enums
//!    - Traits
//!    - Impl blocks
//!
//! 2. STATEMENTS - Executable code units
//!    - Let bindings
//!    - Expression statements
//!    - Control flow (if, while, for)
//!    - Return
//!
//! 3. EXPRESSIONS - Values and operations
//!    - Literals
//!    - Identifiers
//!    - Binary operations
//!    - Unary operations
//!    - Function calls
//!    - Field access
//!    - Block expressions
//!    - If/match expressions
//!    - Async block expressions
//!    - Await expressions
//!
//! 4. TYPES - Type expressions
//!    - Named types
//!    - Generic types
//!    - Reference types
//!    - Function types
//!    - Tuple types
//!
//! ============================================================================
//! ERROR RECOVERY
//! ============================================================================
//!
//! When parser encounters syntax error, it should:
//! 1. Report clear error message
//! 2. Recover to continue parsing
//! 3. Avoid cascading errors
//!
//! STRATEGY 1: PANIC MODE
//! ----------------------
//! Skip tokens until reaching synchronization point.
//!
//! Sync points:
//! - Statement separators (;)
//! - Block boundaries ({, })
//! - Top-level declarations
//!
//! ```
//! if x { y } else { z  // Missing }
//!
//! fn foo() { }         // Sync at 'fn'
//! ```
//!
//! STRATEGY 2: STATEMENT SKIPPING
//! ------------------------------
//! If error in statement, skip to next statement.
//!
//! STRATEGY 3: EXPECTED TOKEN INSERTION
//! ------------------------------------
//! Assume missing token exists and continue.
//!
//! ```
//! let x =           // Missing expression
//! let y = 10;
//!
//! Recovery: Insert dummy expression after '='
//! ```
//!
//! STRATEGY 4: DELIMITER MATCHING
//! ------------------------------
//! Match opening/closing delimiters intelligently.
//!
//! ```
//! { a + b           // Missing }
//!
//! Recovery: Insert } before next top-level item
//! ```
//!
//! ERROR MESSAGE QUALITY:
//! ----------------------
//! Good error messages should:
//! 1. Clearly state what was expected
//! 2. Show what was found instead
//! 3. Provide location (line, column)
//! 4. Suggest fix if obvious
//!
//! Example:
//! ```
//! error: expected `;`, found `let`
//!   --> main.fax:3:5
//!    |
//!  2 |     x = 5
//!    |          - help: consider adding `;` here
//!  3 |     let y = 10;
//!    |     ^^^ unexpected token
//! ```

// ============================================================================
// MACRO SYSTEM
// ============================================================================
//!
//! Fax supports three types of macros, similar to Rust:
//! 1. Declarative Macros (`macro_rules!`)
//! 2. Derive Macros (`#[derive(...)]`)
//! 3. Function-like Macros (`println!`, `vec![]`)
//!
//! ============================================================================
//! MACRO OVERVIEW
//! ============================================================================
//!
//! Macros provide compile-time code generation. They allow writing code
//! that writes other code, reducing boilerplate and enabling DSLs.
//!
//! KEY DIFFERENCE FROM FUNCTIONS:
//! - Functions: operate on values
//! - Macros: operate on code (tokens), expanded before compilation
//!
//! ============================================================================
//! DECLARATIVE MACROS (macro_rules!)
//! ============================================================================
//!
//! Declarative macros use pattern matching to generate code.
//!
//! SYNTAX:
//! -------
//! ```fax
//! macro_rules! macro_name {
//!     (pattern1) => { generated_code1 };
//!     (pattern2) => { generated_code2 };
//!     // ... more patterns
//! }
//! ```
//!
//! MACRO PATTERNS:
//! --------------
//! 1. LITERAL PATTERNS - Match exact tokens
//!    ```
//!    () => { ... }           // Match empty
//!    + => { ... }            // Match + operator
//!    fn => { ... }           // Match fn keyword
//!    ```
//!
//! 2. CAPTURE PATTERNS - Match and bind tokens
//!    ```
//!    $name:expr              // Match any expression, bind as "name"
//!    $name:ident             // Match any identifier
//!    $name:ty                // Match any type
//!    $name:pat              // Match any pattern
//!    $name:stmt             // Match any statement
//!    $name:block            // Match any block
//!    $name:meta             // Match any attribute/meta
//!    $name:item            // Match any item (fn, struct, etc.)
//!    $name:lifetime         // Match any lifetime
//!
//!    $name:tt               // Match any token tree
//!    $name:vis              // Match any visibility modifier
//!    ```
//!
//! 3. REPETITION PATTERNS - Match multiple tokens
//!    ```
//!    $($item:expr),*        // Zero or more, separated by comma
//!    $($item:expr)+         // One or more, separated by comma
//!    $($item:expr)?        // Optional (zero or one)
//!    $($item:expr),* $(,)? // Optional trailing comma
//!    ```
//!
//! EXAMPLE - vec![]:
//! -----------------
//! ```fax
//! macro_rules! vec {
//!     // vec![1, 2, 3]
//!     ($($item:expr),* $(,)?) => {
//!         {
//!             let mut temp_vec = ::std::Vec::new();
//!             $(
//!                 temp_vec.push($item);
//!             )*
//!             temp_vec
//!         }
//!     };
//! }
//! ```
//!
//! EXPANSION:
//! ----------
//! Given: `vec![1, 2, 3]`
//!
//! The macro expands to:
//! ```fax
//! {
//!     let mut temp_vec = ::std::Vec::new();
//!     temp_vec.push(1);
//!     temp_vec.push(2);
//!     temp_vec.push(3);
//!     temp_vec
//! }
//! ```
//!
//! EXAMPLE - map![]:
//! -----------------
//! ```fax
//! macro_rules! map {
//!     ($($key:expr => $value:expr),* $(,)?) => {{
//!         ::std::collections::HashMap::from([
//!             $(($key, $value)),*
//!         ])
//!     }};
//! }
//! ```
//!
//! Usage: `map!["a" => 1, "b" => 2]`
//!
//! EXAMPLE - html! DSL:
//! --------------------
//! ```fax
//! macro_rules! html {
//!     ($tag:ident $($attr:ident = $value:expr)*) => {{
//!         format!("<{}>", stringify!($tag))
//!     }};
//! }
//! ```
//!
//! ============================================================================
//! DERIVE MACROS
//! ============================================================================
//!
//! Derive macros generate trait implementations automatically.
//!
//! SYNTAX:
//! -------
//! ```fax
//! #[derive(Trait1, Trait2)]
//! struct MyStruct { ... }
//! ```
//!
//! BUILT-IN DERIVE TRAITS:
//! -----------------------
//!
//! 1. Clone - Generates `clone()` method
//!    ```fax
//!    #[derive(Clone)]
//!    struct Point { x: i32, y: i32 }
//!    ```
//!    Generates:
//!    ```fax
//!    impl Clone for Point {
//!        fn clone(&self) -> Point {
//!            Point { x: self.x, y: self.y }
//!        }
//!    }
//!    ```
//!
//! 2. Debug - Generates `fmt()` for debug formatting
//!    ```fax
//!    #[derive(Debug)]
//!    struct Point { x: i32, y: i32 }
//!    ```
//!    Generates:
//!    ```fax
//!    impl Debug for Point {
//!        fn fmt(&self, f: &mut Formatter) -> Result {
//!            write!(f, "Point {{ x: {}, y: {} }}", self.x, self.y)
//!        }
//!    }
//!    ```
//!
//! 3. PartialEq - Generates `==` and `!=` operators
//!    ```fax
//!    #[derive(PartialEq)]
//!    struct Point { x: i32, y: i32 }
//!    ```
//!
//! 4. Eq - Generates equality (requires PartialEq)
//!
//! 5. Default - Generates default constructor
//!    ```fax
//!    #[derive(Default)]
//!    struct Config { port: i32 = 8080 }
//!    ```
//!
//! 6. Copy - Generates bitwise copy (no heap allocation)
//!
//! ============================================================================
//! FUNCTION-LIKE MACROS
//! ============================================================================
//!
//! Macros that look like function calls but operate on tokens.
//!
//! BUILT-IN FUNCTION MACROS:
//! -------------------------
//!
//! 1. println! - Print with newline
//!    ```fax
//!    println!("Hello {}", name)
//!    println!("Number: {}", 42)
//!    println!("Multiple: {} and {}", a, b)
//!    ```
//!
//! 2. print! - Print without newline
//!    ```fax
//!    print!("Loading")
//!    print!("\rProgress: {}%", percent)
//!    ```
//!
//! 3. eprintln! - Print to stderr
//!    ```fax
//!    eprintln!("Error: {}", err)
//!    ```
//!
//! 4. format! - Create formatted string
//!    ```fax
//!    let s = format!("{} + {} = {}", a, b, a + b)
//!    ```
//!
//! 5. vec! - Create vector
//!    ```fax
//!    let v = vec![1, 2, 3]
//!    let empty: Vec<i32> = vec![]
//!    ```
//!
//! 6. assert! - Assert condition
//!    ```fax
//!    assert!(x > 0)
//!    assert!(result.is_ok(), "Error: {:?}", result)
//!    ```
//!
//! 7. assert_eq! - Assert equality
//!    ```fax
//!    assert_eq!(a, b)
//!    assert_eq!(result, expected, "custom message")
//!    ```
//!
//! 8. panic! - Panic with message
//!    ```fax
//!    panic!("Something went wrong")
//!    panic!("Expected {} but got {}", expected, got)
//!    ```
//!
//! ============================================================================
//! MACRO HYGIENE
//! ============================================================================
//!
//! Hygiene ensures macros don't accidentally capture or conflict with
//! variables from the calling context.
//!
//! THE PROBLEM:
//! ------------
//! Without hygiene, this macro would fail:
//! ```fax
//! macro_rules! double {
//!     ($x:expr) => { $x * 2 }
//! }
//!
//! fn main() {
//!     let x = 5;
//!     let result = double!(x);  // Should use the x above
//! }
//! ```
//!
//! HYGIENE SOLUTION:
//! -----------------
//! Each identifier created by a macro gets a unique "expansion context".
//! The macro's `x` is different from the caller's `x`.
//!
//! However, you can deliberately "break" hygiene using `$crate::variable`
//! or by passing identifiers that should refer to the caller's scope.
//!
//! ============================================================================
//! MACRO EXPANSION PIPELINE
//! ============================================================================
//!
//! ```
//! Source Code
//!      |
//!      v
//! +------------+
//! |   Lexer    |  Tokenize source
//! +------------+
//!      |
//!      v
//! +------------+
//! |   Parser   |  Parse tokens, recognize macro definitions
//! +------------+
//!      |
//!      v
//! +------------------+
//! | Macro Expansion |  Expand macros to generate code
//! +------------------+
//!      |  (recursive expansion until no macros left)
//!      v
//! +------------------+
//! |  Semantic (HIR) |  Continue normal compilation
//! +------------------+
//!      |
//!      v
//!     ...
//! ```
//!
//! ============================================================================
//! IMPLEMENTATION NOTES
//! ============================================================================
//!
//! 1. TOKEN TREE REPRESENTATION:
//!    - Macros work on token trees, not raw strings
//!    - TokenTree = Token | DelimitedGroup(TokenTree*)
//!    - Need to preserve parentheses, brackets, braces for grouping
//!
//! 2. MATCHING ALGORITHM:
//!    - Use recursive pattern matching
//!    - Handle repetitions with loop/recursion
//!    - Capture binding: store matched tokens per $name
//!
//! 3. EXPANSION:
//!    - Replace $name with captured tokens
//!    - Handle nested repetitions carefully
//!    - Output must be valid AST after expansion
//!
//! 4. ERROR HANDLING:
//!    - Report "no matching rule" clearly
//!    - Show which patterns were tried
//!    - Suggest corrections for common mistakes
//!
//! 5. RECURSIVE EXPANSION:
//!    - Macros can call other macros
//!    - Use worklist: keep expanding until no macros remain
//!    - Watch for infinite recursion (max expansion depth)


use faxc_lex::Token;
use faxc_util::{DiagnosticBuilder, Handler, Span, Symbol};

pub mod ast;
mod expr;
mod items;
mod pattern;
mod stmt;
mod types;

#[cfg(test)]
mod edge_cases;

pub use ast::*;

/// Recursive-descent parser with Pratt-parsed expressions.
///
/// Consumes a flat token stream (optionally carrying spans) and produces
/// an [`Ast`]. Parsing never panics: malformed input is reported through
/// the attached [`Handler`] and recovered from at statement/item
/// boundaries so later errors are still discovered in one pass.
pub struct Parser<'a> {
    tokens: Vec<TokenWithSpan>,
    position: usize,
    prev_position: usize,
    handler: &'a mut Handler,
    source: &'a str,
    no_struct_literal: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser from a bare token stream, with no span information.
    pub fn new(tokens: Vec<Token>, handler: &'a mut Handler) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|t| TokenWithSpan::new(t, Span::DUMMY))
            .collect();
        Self::from_tokens(tokens, handler, "")
    }

    /// Create a parser from a spanned token stream over `source`.
    pub fn from_tokens(tokens: Vec<TokenWithSpan>, handler: &'a mut Handler, source: &'a str) -> Self {
        Self {
            tokens,
            position: 0,
            prev_position: 0,
            handler,
            source,
            no_struct_literal: false,
        }
    }

    /// Source text this parser was constructed over (empty for bare-token parsers).
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Parse a complete source file into a list of top-level items.
    pub fn parse(&mut self) -> Ast {
        let mut items = Vec::new();

        while !self.is_at_end() {
            match self.parse_item() {
                Some(item) => items.push(item),
                None => self.recover_to_sync_point(),
            }
        }

        items
    }

    /// Parse a single expression, consuming as much input as precedence allows.
    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_expr_with_min_bp(expr::bp::MIN)
    }

    /// Parse a single expression with the struct-literal ambiguity suppressed.
    ///
    /// Used for `if`/`while`/`for`/`match` heads, where a trailing `{` opens
    /// the construct's body rather than a struct literal.
    pub fn parse_expr_no_struct_literal(&mut self) -> Option<Expr> {
        let prev = self.no_struct_literal;
        self.no_struct_literal = true;
        let result = self.parse_expr();
        self.no_struct_literal = prev;
        result
    }

    fn parse_expr_with_min_bp(&mut self, min_bp: u8) -> Option<Expr> {
        let atom = self.parse_prefix()?;
        let mut lhs = self.parse_postfix(atom)?;

        loop {
            if self.current_token() == Token::As {
                if expr::bp::CAST < min_bp {
                    break;
                }
                self.advance();
                let ty = self.parse_type()?;
                lhs = Expr::Cast(Box::new(lhs), ty);
                lhs = self.parse_postfix(lhs)?;
                continue;
            }

            let (lbp, rbp) = match self.infix_binding_power() {
                Some(bp) if bp.0 >= min_bp => bp,
                _ => break,
            };

            let op_token = self.current_token();
            self.advance();

            let rhs = self.parse_expr_with_min_bp(rbp)?;
            lhs = Expr::Binary(BinaryExpr {
                left: Box::new(lhs),
                op: self.token_to_binop(op_token)?,
                right: Box::new(rhs),
                span: Span::DUMMY,
            });
        }

        Some(lhs)
    }

    /// Parse a prefix position: a literal, path, grouped expression, or a
    /// prefix/unary operator applied to one.
    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.current_token() {
            Token::Minus => self.parse_unary(UnOp::Neg),
            Token::Bang => self.parse_unary(UnOp::Not),
            Token::Tilde => self.parse_unary(UnOp::BitNot),
            Token::Star => self.parse_unary(UnOp::Deref),
            Token::Ampersand => self.parse_reference(),

            Token::Number(n) => {
                self.advance();
                Some(Expr::Literal(Literal::Int(n as i64)))
            },
            Token::Float(f) => {
                self.advance();
                Some(Expr::Literal(Literal::Float(f)))
            },
            Token::String(s) => {
                self.advance();
                Some(Expr::Literal(Literal::String(s)))
            },
            Token::Char(c) => {
                self.advance();
                Some(Expr::Literal(Literal::Char(c)))
            },
            Token::True => {
                self.advance();
                Some(Expr::Literal(Literal::Bool(true)))
            },
            Token::False => {
                self.advance();
                Some(Expr::Literal(Literal::Bool(false)))
            },

            Token::Ident(_) | Token::Self_ | Token::SelfUpper | Token::Super | Token::Crate => {
                self.parse_path_or_call()
            },
            Token::LParen => self.parse_paren_or_tuple(),
            Token::LBracket => self.parse_array(),
            Token::LBrace => self.parse_block_expr(),
            Token::If => self.parse_if_expr(),
            Token::Match => self.parse_match_expr(),
            Token::Loop => self.parse_loop_expr(),
            Token::Async => self.parse_async_expr(),
            Token::Pipe | Token::OrOr => self.parse_closure_pipe(),
            Token::Fn => self.parse_closure_fn(),
            Token::Return => {
                self.advance();
                let value = if self.can_start_expr() {
                    Some(Box::new(self.parse_expr()?))
                } else {
                    None
                };
                Some(Expr::Return(value))
            },
            Token::Break => {
                self.advance();
                let value = if self.can_start_expr() {
                    Some(Box::new(self.parse_expr()?))
                } else {
                    None
                };
                Some(Expr::Break(value, None))
            },
            Token::Continue => {
                self.advance();
                Some(Expr::Continue(None))
            },

            _ => {
                self.error(format!("expected expression, found {:?}", self.current_token()));
                None
            },
        }
    }

    /// Chain of postfix operators (field/tuple-index access, method calls,
    /// indexing) applied to an already-parsed atom.
    fn parse_postfix(&mut self, mut expr: Expr) -> Option<Expr> {
        loop {
            match self.current_token() {
                Token::Dot => {
                    self.advance();
                    match self.current_token() {
                        Token::Number(n) => {
                            self.advance();
                            expr = Expr::Field(FieldExpr {
                                object: Box::new(expr),
                                field: Symbol::intern(&n.to_string()),
                                span: Span::DUMMY,
                            });
                        },
                        Token::Ident(_) | Token::Self_ | Token::SelfUpper => {
                            let name = self.parse_ident()?;
                            let generics = self.parse_optional_turbofish()?;

                            if self.match_token(Token::LParen) {
                                let call_args = self.parse_call_args()?;
                                expr = Expr::MethodCall(MethodCallExpr {
                                    receiver: Box::new(expr),
                                    method: name,
                                    args: generics,
                                    call_args,
                                });
                            } else {
                                expr = Expr::Field(FieldExpr {
                                    object: Box::new(expr),
                                    field: name,
                                    span: Span::DUMMY,
                                });
                            }
                        },
                        _ => {
                            self.error("expected field name or method call after '.'");
                            return None;
                        },
                    }
                },
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index(IndexExpr {
                        object: Box::new(expr),
                        index: Box::new(index),
                    });
                },
                _ => break,
            }
        }
        Some(expr)
    }

    /// Parses an optional `::<T, U>` turbofish generic argument list.
    fn parse_optional_turbofish(&mut self) -> Option<Option<Vec<Type>>> {
        if self.current_token() == Token::ColonColon && self.peek_token() == Token::Lt {
            self.advance();
            self.advance();
            let mut types = Vec::new();
            while !self.is_at_end() && self.current_token() != Token::Gt {
                if let Some(ty) = self.parse_type() {
                    types.push(ty);
                }
                if !self.match_token(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::Gt)?;
            Some(Some(types))
        } else {
            Some(None)
        }
    }

    fn parse_unary(&mut self, op: UnOp) -> Option<Expr> {
        self.advance();
        let operand = self.parse_expr_with_min_bp(expr::bp::MAX)?;
        Some(Expr::Unary(UnaryExpr {
            op,
            expr: Box::new(operand),
            span: Span::DUMMY,
        }))
    }

    fn parse_reference(&mut self) -> Option<Expr> {
        self.advance();
        let mutable = self.match_token(Token::Mut);
        let operand = self.parse_expr_with_min_bp(expr::bp::MAX)?;
        Some(Expr::Unary(UnaryExpr {
            op: UnOp::Ref(mutable),
            expr: Box::new(operand),
            span: Span::DUMMY,
        }))
    }

    /// Parse a path expression and, depending on what follows, resolve it
    /// into a plain path reference, a function call, a struct literal, or
    /// an enum variant construction.
    ///
    /// A bare multi-segment path (`A::B`) with no trailing `(`/`{` is taken
    /// to be a unit enum variant; this language has no other use for a
    /// qualified value path, so the ambiguity a real compiler resolves via
    /// name resolution is resolved here by shape alone.
    fn parse_path_or_call(&mut self) -> Option<Expr> {
        let path = self.parse_path();
        if path.segments.is_empty() {
            self.error("expected expression");
            return None;
        }

        if self.match_token(Token::LParen) {
            let args = self.parse_call_args()?;
            return Some(self.path_call_expr(path, args));
        }

        if self.current_token() == Token::LBrace && !self.no_struct_literal {
            self.advance();
            let (fields, base) = self.parse_struct_literal_body()?;
            return Some(self.path_struct_expr(path, fields, base));
        }

        if path.segments.len() > 1 {
            let (base, variant, generics) = self.split_variant_path(path);
            return Some(Expr::EnumVariant(Box::new(EnumVariantExpr {
                path: base,
                variant,
                generics,
                data: EnumVariantData::Unit,
            })));
        }

        Some(Expr::Path(path))
    }

    fn split_variant_path(&self, mut path: Path) -> (Path, Symbol, Option<Vec<Type>>) {
        let last = path.segments.pop().expect("non-empty path");
        (path, last.ident, last.args)
    }

    fn path_call_expr(&mut self, path: Path, args: Vec<Expr>) -> Expr {
        if path.segments.len() > 1 {
            let (base, variant, generics) = self.split_variant_path(path);
            Expr::EnumVariant(Box::new(EnumVariantExpr {
                path: base,
                variant,
                generics,
                data: EnumVariantData::Tuple(args),
            }))
        } else {
            let generics = path.segments[0].args.clone();
            Expr::Call(CallExpr {
                func: Box::new(Expr::Path(path)),
                args,
                span: Span::DUMMY,
                generics,
            })
        }
    }

    fn path_struct_expr(&mut self, path: Path, fields: Vec<StructField>, base: Option<Expr>) -> Expr {
        if path.segments.len() > 1 {
            let (enum_path, variant, generics) = self.split_variant_path(path);
            Expr::EnumVariant(Box::new(EnumVariantExpr {
                path: enum_path,
                variant,
                generics,
                data: EnumVariantData::Struct(fields),
            }))
        } else {
            let generics = path.segments[0].args.clone();
            Expr::StructLiteral(Box::new(StructLiteralExpr {
                path,
                generics,
                fields,
                base,
            }))
        }
    }

    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        while self.current_token() != Token::RParen && !self.is_at_end() {
            args.push(self.parse_expr()?);
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Some(args)
    }

    /// Parse struct literal fields and optional `..base`, after the opening
    /// `{` has already been consumed.
    fn parse_struct_literal_body(&mut self) -> Option<(Vec<StructField>, Option<Expr>)> {
        let mut fields = Vec::new();
        let mut base = None;

        while self.current_token() != Token::RBrace && !self.is_at_end() {
            if self.match_token(Token::DotDot) {
                base = Some(self.parse_expr()?);
                break;
            }

            let name = self.parse_ident()?;
            if self.match_token(Token::Colon) {
                let value = self.parse_expr()?;
                fields.push(StructField {
                    name,
                    expr: value,
                    is_shorthand: false,
                });
            } else {
                fields.push(StructField {
                    name,
                    expr: Expr::Path(Path {
                        segments: vec![PathSegment { ident: name, args: None }],
                    }),
                    is_shorthand: true,
                });
            }

            if !self.match_token(Token::Comma) {
                break;
            }
        }

        self.expect(Token::RBrace)?;
        Some((fields, base))
    }

    fn parse_paren_or_tuple(&mut self) -> Option<Expr> {
        self.expect(Token::LParen)?;

        if self.match_token(Token::RParen) {
            return Some(Expr::Literal(Literal::Unit));
        }

        let first = self.parse_expr()?;

        if self.match_token(Token::Comma) {
            let mut elems = vec![first];
            while self.current_token() != Token::RParen {
                elems.push(self.parse_expr()?);
                if !self.match_token(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
            Some(Expr::Tuple(elems))
        } else {
            self.expect(Token::RParen)?;
            Some(first)
        }
    }

    fn parse_array(&mut self) -> Option<Expr> {
        self.expect(Token::LBracket)?;
        let mut elems = Vec::new();
        while self.current_token() != Token::RBracket && !self.is_at_end() {
            elems.push(self.parse_expr()?);
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBracket)?;
        Some(Expr::Array(elems))
    }

    fn parse_block_expr(&mut self) -> Option<Expr> {
        let block = self.parse_block()?;
        Some(Expr::Block(block))
    }

    fn parse_closure_params(&mut self, terminator: Token) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        while self.current_token() != terminator {
            let mutable = self.match_token(Token::Mut);
            let name = self.parse_ident()?;
            let ty = if self.match_token(Token::Colon) {
                self.parse_type()?
            } else {
                Type::Inferred
            };
            params.push(Param { name, ty, mutable });
            if !self.match_token(Token::Comma) {
                break;
            }
        }
        Some(params)
    }

    /// `|x, y| body` / `|| body` closure syntax.
    fn parse_closure_pipe(&mut self) -> Option<Expr> {
        let params = if self.match_token(Token::OrOr) {
            Vec::new()
        } else {
            self.expect(Token::Pipe)?;
            let params = self.parse_closure_params(Token::Pipe)?;
            self.expect(Token::Pipe)?;
            params
        };

        let ret_type = if self.match_token(Token::Arrow) {
            self.parse_type()
        } else {
            None
        };

        let body = if self.current_token() == Token::LBrace {
            Box::new(Expr::Block(self.parse_block()?))
        } else {
            Box::new(self.parse_expr()?)
        };

        Some(Expr::Closure(ClosureExpr {
            params,
            ret_type,
            body,
            move_kw: false,
        }))
    }

    /// `fn(x: T) -> U { body }` anonymous-function closure syntax.
    fn parse_closure_fn(&mut self) -> Option<Expr> {
        self.expect(Token::Fn)?;
        self.expect(Token::LParen)?;
        let params = self.parse_closure_params(Token::RParen)?;
        self.expect(Token::RParen)?;

        let ret_type = if self.match_token(Token::Arrow) {
            self.parse_type()
        } else {
            None
        };

        let block = self.parse_block()?;

        Some(Expr::Closure(ClosureExpr {
            params,
            ret_type,
            body: Box::new(Expr::Block(block)),
            move_kw: false,
        }))
    }

    fn can_start_expr(&self) -> bool {
        !matches!(
            self.current_token(),
            Token::Semicolon | Token::RBrace | Token::RParen | Token::RBracket | Token::Comma
        ) && !self.is_at_end()
    }

    fn infix_binding_power(&self) -> Option<(u8, u8)> {
        let level = match self.current_token() {
            Token::OrOr => expr::bp::LOGICAL_OR,
            Token::AndAnd => expr::bp::LOGICAL_AND,
            Token::EqEq | Token::NotEq | Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => {
                expr::bp::COMPARISON
            },
            Token::Pipe => expr::bp::BITWISE_OR,
            Token::Caret => expr::bp::BITWISE_XOR,
            Token::Ampersand => expr::bp::BITWISE_AND,
            Token::Shl | Token::Shr => expr::bp::SHIFT,
            Token::Plus | Token::Minus => expr::bp::ADDITIVE,
            Token::Star | Token::Slash | Token::Percent => expr::bp::MULTIPLICATIVE,
            _ => return None,
        };
        Some((level, level + 1))
    }

    fn token_to_binop(&self, token: Token) -> Option<BinOp> {
        match token {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Percent => Some(BinOp::Mod),
            Token::EqEq => Some(BinOp::Eq),
            Token::NotEq => Some(BinOp::Ne),
            Token::Lt => Some(BinOp::Lt),
            Token::Gt => Some(BinOp::Gt),
            Token::LtEq => Some(BinOp::Le),
            Token::GtEq => Some(BinOp::Ge),
            Token::AndAnd => Some(BinOp::And),
            Token::OrOr => Some(BinOp::Or),
            Token::Ampersand => Some(BinOp::BitAnd),
            Token::Pipe => Some(BinOp::BitOr),
            Token::Caret => Some(BinOp::BitXor),
            Token::Shl => Some(BinOp::Shl),
            Token::Shr => Some(BinOp::Shr),
            _ => None,
        }
    }

    fn current_token(&self) -> Token {
        self.tokens
            .get(self.position)
            .map(|t| t.token.clone())
            .unwrap_or(Token::Eof)
    }

    fn peek_token(&self) -> Token {
        self.tokens
            .get(self.position + 1)
            .map(|t| t.token.clone())
            .unwrap_or(Token::Eof)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.prev_position = self.position;
            self.position += 1;
        }
    }

    fn expect(&mut self, expected: Token) -> Option<()> {
        if self.current_token() == expected {
            self.advance();
            Some(())
        } else {
            self.error(format!(
                "expected {:?}, found {:?}",
                expected,
                self.current_token()
            ));
            None
        }
    }

    fn match_token(&mut self, expected: Token) -> bool {
        if self.current_token() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.position)
            .map(|t| t.span)
            .unwrap_or(Span::DUMMY)
    }

    fn span_from_start(&self, start: Span) -> Span {
        let end = self
            .tokens
            .get(self.prev_position)
            .map(|t| t.span)
            .unwrap_or(start);
        Span::new(start.start, end.end, start.line, start.column)
    }

    fn error(&mut self, message: impl Into<String>) {
        let span = self.current_span();
        DiagnosticBuilder::error(message).span(span).emit(self.handler);
    }

    /// Skip tokens until a likely item boundary: a top-level keyword or a
    /// statement-terminating `;`. Used to keep parsing after a malformed item
    /// so later errors in the same file are still reported.
    fn recover_to_sync_point(&mut self) {
        while !self.is_at_end() {
            match self.current_token() {
                Token::Fn
                | Token::Struct
                | Token::Enum
                | Token::Trait
                | Token::Impl
                | Token::Use
                | Token::Const
                | Token::Static
                | Token::Mod
                | Token::Pub => return,
                Token::Semicolon => {
                    self.advance();
                    return;
                },
                _ => self.advance(),
            }
        }
    }

    /// Like [`recover_to_sync_point`](Self::recover_to_sync_point) but for
    /// statement and block contexts, where a `}` also ends recovery.
    fn recover_to_stmt_sync(&mut self) {
        while !self.is_at_end() {
            match self.current_token() {
                Token::Semicolon => {
                    self.advance();
                    return;
                },
                Token::RBrace => return,
                Token::Let | Token::If | Token::While | Token::For | Token::Return
                | Token::Break | Token::Continue | Token::Fn => return,
                _ => self.advance(),
            }
        }
    }
}
