//! A small subset of Java: classes with fields, constructors and methods,
//! the usual statements, and expressions over primitives and objects.
//!
//! Token kinds are named after the ANTLR Java lexer (`IDENTIFIER`, `LBRACE`, …),
//! whitespace and comments are hidden. Rules are named after the ANTLR Java parser.
//! Every place a rule is invoked from has its own rule id, and so has every
//! alternative of `expression`.

mod lexer;

use self::lexer::Kind;
use crate::{Channel, Diagnostic, Grammar, LineColumn, ParseOutput, RawToken, RuleEvent, RuleId};
use tracing::debug;

/// The bundled grammar, registered as `mini-java`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiniJava;

impl Grammar for MiniJava {
    fn name(&self) -> &'static str {
        "mini-java"
    }

    fn parse<'a>(&self, source: &'a str) -> ParseOutput<'a> {
        let (tokens, kinds) = lexer::lex(source);
        let events = Parser::new(&tokens, &kinds).parse();
        ParseOutput { tokens, events }
    }
}

type ParseResult = Result<(), Diagnostic>;

const PREFIX_BINDING_POWER: u8 = 23;

/// How many rules may be open at once before parsing gives up,
/// which keeps deeply nested input from exhausting the stack.
const MAX_RULE_DEPTH: usize = 256;

/// Left and right binding power plus rule id of a binary operator.
fn infix_binding_power(kind: Kind) -> Option<(u8, u8, RuleId)> {
    let power = match kind {
        Kind::Assign | Kind::AddAssign | Kind::SubAssign | Kind::MulAssign | Kind::DivAssign => {
            (2, 1, 70)
        }
        Kind::Question => (4, 3, 71),
        Kind::Or => (5, 6, 72),
        Kind::And => (7, 8, 73),
        Kind::BitOr => (9, 10, 74),
        Kind::Caret => (11, 12, 75),
        Kind::BitAnd => (13, 14, 76),
        Kind::Equal | Kind::NotEqual => (15, 16, 77),
        Kind::Lt | Kind::Gt | Kind::Le | Kind::Ge => (17, 18, 78),
        Kind::Add | Kind::Sub => (19, 20, 79),
        Kind::Mul | Kind::Div | Kind::Mod => (21, 22, 80),
        _ => return None,
    };
    Some(power)
}

struct Parser<'t> {
    tokens: &'t [RawToken<'t>],
    kinds: &'t [Kind],
    /// Index of the current visible token.
    pos: usize,
    /// Number of currently open rules.
    depth: usize,
    events: Vec<RuleEvent<'static>>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [RawToken<'t>], kinds: &'t [Kind]) -> Self {
        Self { tokens, kinds, pos: 0, depth: 0, events: Vec::new() }
    }

    fn parse(mut self) -> Vec<RuleEvent<'static>> {
        self.skip_hidden();
        if let Err(diagnostic) = self.compilation_unit() {
            debug!(%diagnostic, "mini-java syntax error");
            self.events.push(RuleEvent::Error(diagnostic));
        }
        self.events
    }

    fn compilation_unit(&mut self) -> ParseResult {
        self.rule("compilationUnit", 1, |p| {
            while !p.at(Kind::Eof) {
                p.type_declaration()?;
            }
            p.bump();
            Ok(())
        })
    }

    fn type_declaration(&mut self) -> ParseResult {
        self.rule("typeDeclaration", 2, |p| {
            if p.at(Kind::Semi) {
                p.bump();
                return Ok(());
            }
            while p.current().is_modifier() {
                p.modifier(3)?;
            }
            p.class_declaration(4)
        })
    }

    fn modifier(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("modifier", rule_id, |p| {
            p.bump();
            Ok(())
        })
    }

    fn class_declaration(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("classDeclaration", rule_id, |p| {
            p.expect(Kind::Class)?;
            p.expect(Kind::Identifier)?;
            if p.at(Kind::Extends) {
                p.bump();
                p.type_(5)?;
            }
            p.class_body(6)
        })
    }

    fn class_body(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("classBody", rule_id, |p| {
            p.expect(Kind::LBrace)?;
            while !p.at(Kind::RBrace) && !p.at(Kind::Eof) {
                p.class_body_declaration()?;
            }
            p.expect(Kind::RBrace)
        })
    }

    fn class_body_declaration(&mut self) -> ParseResult {
        self.rule("classBodyDeclaration", 7, |p| {
            if p.at(Kind::Semi) {
                p.bump();
                return Ok(());
            }
            while p.current().is_modifier() {
                p.modifier(8)?;
            }
            if p.at(Kind::Class) {
                p.class_declaration(9)
            } else if p.at(Kind::Identifier) && p.nth(1) == Kind::LParen {
                p.constructor_declaration()
            } else if p.at(Kind::Void) || p.is_method_ahead() {
                p.method_declaration()
            } else if p.at_type_start() {
                p.field_declaration()
            } else {
                Err(p.error("expected member declaration"))
            }
        })
    }

    fn constructor_declaration(&mut self) -> ParseResult {
        self.rule("constructorDeclaration", 10, |p| {
            p.expect(Kind::Identifier)?;
            p.formal_parameters(13)?;
            p.block(14)
        })
    }

    fn method_declaration(&mut self) -> ParseResult {
        self.rule("methodDeclaration", 11, |p| {
            if p.at(Kind::Void) {
                p.bump();
            } else {
                p.type_(15)?;
            }
            p.expect(Kind::Identifier)?;
            p.formal_parameters(16)?;
            if p.at(Kind::Semi) {
                p.bump();
                Ok(())
            } else {
                p.block(17)
            }
        })
    }

    fn field_declaration(&mut self) -> ParseResult {
        self.rule("fieldDeclaration", 12, |p| {
            p.type_(18)?;
            p.variable_declarator(19)?;
            while p.at(Kind::Comma) {
                p.bump();
                p.variable_declarator(20)?;
            }
            p.expect(Kind::Semi)
        })
    }

    fn formal_parameters(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("formalParameters", rule_id, |p| {
            p.expect(Kind::LParen)?;
            if !p.at(Kind::RParen) {
                p.formal_parameter(21)?;
                while p.at(Kind::Comma) {
                    p.bump();
                    p.formal_parameter(22)?;
                }
            }
            p.expect(Kind::RParen)
        })
    }

    fn formal_parameter(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("formalParameter", rule_id, |p| {
            if p.at(Kind::Final) {
                p.modifier(23)?;
            }
            p.type_(24)?;
            p.expect(Kind::Identifier)
        })
    }

    fn type_(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("type", rule_id, |p| {
            if p.current().is_primitive_type() {
                p.bump();
            } else {
                p.qualified_name()?;
            }
            while p.at(Kind::LBrack) {
                p.bump();
                p.expect(Kind::RBrack)?;
            }
            Ok(())
        })
    }

    fn variable_declarator(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("variableDeclarator", rule_id, |p| {
            p.expect(Kind::Identifier)?;
            if p.at(Kind::Assign) {
                p.bump();
                p.expression()?;
            }
            Ok(())
        })
    }

    fn block(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("block", rule_id, |p| {
            p.expect(Kind::LBrace)?;
            while !p.at(Kind::RBrace) && !p.at(Kind::Eof) {
                p.block_statement()?;
            }
            p.expect(Kind::RBrace)
        })
    }

    fn block_statement(&mut self) -> ParseResult {
        self.rule("blockStatement", 26, |p| {
            if p.is_local_variable_ahead() {
                p.local_variable_declaration(27)?;
                p.expect(Kind::Semi)
            } else if p.at(Kind::Class) {
                p.class_declaration(28)
            } else {
                p.statement(29)
            }
        })
    }

    fn local_variable_declaration(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("localVariableDeclaration", rule_id, |p| {
            if p.at(Kind::Final) {
                p.modifier(30)?;
            }
            p.type_(31)?;
            p.variable_declarator(32)?;
            while p.at(Kind::Comma) {
                p.bump();
                p.variable_declarator(33)?;
            }
            Ok(())
        })
    }

    fn statement(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("statement", rule_id, |p| match p.current() {
            Kind::LBrace => p.block(34),
            Kind::If => {
                p.bump();
                p.par_expression(35)?;
                p.statement(36)?;
                if p.at(Kind::Else) {
                    p.bump();
                    p.statement(37)?;
                }
                Ok(())
            }
            Kind::While => {
                p.bump();
                p.par_expression(38)?;
                p.statement(39)
            }
            Kind::Do => {
                p.bump();
                p.statement(40)?;
                p.expect(Kind::While)?;
                p.par_expression(41)?;
                p.expect(Kind::Semi)
            }
            Kind::For => {
                p.bump();
                p.expect(Kind::LParen)?;
                p.for_control(42)?;
                p.expect(Kind::RParen)?;
                p.statement(43)
            }
            Kind::Return => {
                p.bump();
                if !p.at(Kind::Semi) {
                    p.expression()?;
                }
                p.expect(Kind::Semi)
            }
            Kind::Break | Kind::Continue => {
                p.bump();
                p.expect(Kind::Semi)
            }
            Kind::Semi => {
                p.bump();
                Ok(())
            }
            _ => {
                p.expression()?;
                p.expect(Kind::Semi)
            }
        })
    }

    fn par_expression(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("parExpression", rule_id, |p| {
            p.expect(Kind::LParen)?;
            p.expression()?;
            p.expect(Kind::RParen)
        })
    }

    fn for_control(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("forControl", rule_id, |p| {
            if p.is_local_variable_ahead() {
                p.local_variable_declaration(47)?;
            } else if !p.at(Kind::Semi) {
                p.expression_list(48)?;
            }
            p.expect(Kind::Semi)?;
            if !p.at(Kind::Semi) {
                p.expression()?;
            }
            p.expect(Kind::Semi)?;
            if !p.at(Kind::RParen) {
                p.expression_list(50)?;
            }
            Ok(())
        })
    }

    fn expression_list(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("expressionList", rule_id, |p| {
            p.expression()?;
            while p.at(Kind::Comma) {
                p.bump();
                p.expression()?;
            }
            Ok(())
        })
    }

    fn expression(&mut self) -> ParseResult {
        self.expression_bp(0)
    }

    /// Operator precedence parsing. Operands are parsed first, and the
    /// `expression` node around an operator is entered after the fact
    /// by inserting its event in front of the left operand.
    fn expression_bp(&mut self, min_bp: u8) -> ParseResult {
        let start = self.events.len();

        if matches!(
            self.current(),
            Kind::Sub | Kind::Add | Kind::Bang | Kind::Tilde | Kind::Inc | Kind::Dec
        ) {
            self.rule("expression", 60, |p| {
                p.bump();
                p.expression_bp(PREFIX_BINDING_POWER)
            })?;
        } else {
            self.rule("expression", 61, |p| p.primary(62))?;
        }

        loop {
            let kind = self.current();
            match kind {
                Kind::Dot => {
                    self.precede(start, 63);
                    self.bump();
                    self.expect(Kind::Identifier)?;
                    if self.at(Kind::LParen) {
                        self.arguments(64)?;
                    }
                }
                Kind::LBrack => {
                    self.precede(start, 65);
                    self.bump();
                    self.expression()?;
                    self.expect(Kind::RBrack)?;
                }
                Kind::LParen => {
                    self.precede(start, 66);
                    self.arguments(67)?;
                }
                Kind::Inc | Kind::Dec => {
                    self.precede(start, 68);
                    self.bump();
                }
                _ => {
                    let Some((left_bp, right_bp, rule_id)) = infix_binding_power(kind) else {
                        break;
                    };
                    if left_bp < min_bp {
                        break;
                    }
                    self.precede(start, rule_id);
                    self.bump();
                    if kind == Kind::Question {
                        self.expression()?;
                        self.expect(Kind::Colon)?;
                    }
                    self.expression_bp(right_bp)?;
                }
            }
            self.events.push(RuleEvent::Exit);
        }

        Ok(())
    }

    fn primary(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("primary", rule_id, |p| match p.current() {
            Kind::LParen => {
                p.bump();
                p.expression()?;
                p.expect(Kind::RParen)
            }
            Kind::This | Kind::Identifier => {
                p.bump();
                Ok(())
            }
            Kind::New => {
                p.bump();
                p.creator(86)
            }
            kind if kind.is_literal() => p.literal(85),
            _ => Err(p.error("expected expression")),
        })
    }

    fn literal(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("literal", rule_id, |p| {
            p.bump();
            Ok(())
        })
    }

    fn creator(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("creator", rule_id, |p| {
            if p.current().is_primitive_type() {
                p.bump();
            } else {
                p.qualified_name()?;
            }
            if !p.at(Kind::LBrack) {
                return p.arguments(87);
            }
            while p.at(Kind::LBrack) {
                p.bump();
                if !p.at(Kind::RBrack) {
                    p.expression()?;
                }
                p.expect(Kind::RBrack)?;
            }
            Ok(())
        })
    }

    fn arguments(&mut self, rule_id: RuleId) -> ParseResult {
        self.rule("arguments", rule_id, |p| {
            p.expect(Kind::LParen)?;
            if !p.at(Kind::RParen) {
                p.expression_list(88)?;
            }
            p.expect(Kind::RParen)
        })
    }

    fn qualified_name(&mut self) -> ParseResult {
        self.expect(Kind::Identifier)?;
        while self.at(Kind::Dot) && self.nth(1) == Kind::Identifier {
            self.bump();
            self.bump();
        }
        Ok(())
    }

    /// Enters a rule, runs `f` and leaves the rule again if `f` succeeded.
    fn rule(
        &mut self,
        name: &'static str,
        rule_id: RuleId,
        f: impl FnOnce(&mut Self) -> ParseResult,
    ) -> ParseResult {
        if self.depth == MAX_RULE_DEPTH {
            let message = format!("`{name}` nested more than {MAX_RULE_DEPTH} rules deep");
            return Err(self.error(&message));
        }
        self.events.push(RuleEvent::Enter { name, rule_id });
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result?;
        self.events.push(RuleEvent::Exit);
        Ok(())
    }

    /// Enters an `expression` in front of the events from `start` on.
    fn precede(&mut self, start: usize, rule_id: RuleId) {
        self.events.insert(start, RuleEvent::Enter { name: "expression", rule_id });
    }

    fn is_method_ahead(&self) -> bool {
        self.type_end(0)
            .is_some_and(|end| self.nth(end) == Kind::Identifier && self.nth(end + 1) == Kind::LParen)
    }

    fn is_local_variable_ahead(&self) -> bool {
        let offset = usize::from(self.at(Kind::Final));
        self.type_end(offset).is_some_and(|end| self.nth(end) == Kind::Identifier)
    }

    /// The lookahead offset just past a type starting at `offset`, if one starts there.
    fn type_end(&self, offset: usize) -> Option<usize> {
        let kind = self.nth(offset);
        let mut end = offset + 1;
        if kind == Kind::Identifier {
            while self.nth(end) == Kind::Dot && self.nth(end + 1) == Kind::Identifier {
                end += 2;
            }
        } else if !kind.is_primitive_type() {
            return None;
        }
        while self.nth(end) == Kind::LBrack && self.nth(end + 1) == Kind::RBrack {
            end += 2;
        }
        Some(end)
    }

    fn at_type_start(&self) -> bool {
        self.at(Kind::Identifier) || self.current().is_primitive_type()
    }

    fn expect(&mut self, kind: Kind) -> ParseResult {
        if self.at(kind) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", kind.name())))
        }
    }

    fn error(&self, expected: &str) -> Diagnostic {
        let found = match self.tokens.get(self.pos) {
            Some(token) if self.current() != Kind::Eof => format!("`{}`", token.text),
            _ => "end of input".to_owned(),
        };
        let position = match self.tokens.get(self.pos).or(self.tokens.last()) {
            Some(token) => token.start,
            None => LineColumn::START,
        };
        Diagnostic { message: format!("{expected}, found {found}"), position }
    }

    fn at(&self, kind: Kind) -> bool {
        self.current() == kind
    }

    fn current(&self) -> Kind {
        self.kinds.get(self.pos).copied().unwrap_or(Kind::Eof)
    }

    /// The kind of the `n`th visible token after the current one.
    fn nth(&self, n: usize) -> Kind {
        self.kinds[self.pos..]
            .iter()
            .filter(|kind| kind.channel() == Channel::Visible)
            .nth(n)
            .copied()
            .unwrap_or(Kind::Eof)
    }

    fn bump(&mut self) {
        if self.pos < self.kinds.len() {
            self.events.push(RuleEvent::Token(self.pos));
            self.pos += 1;
            self.skip_hidden();
        }
    }

    fn skip_hidden(&mut self) {
        while self.kinds.get(self.pos).is_some_and(|kind| kind.channel() == Channel::Hidden) {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::{verify_inter_converting, verify_restoring};
    use crate::{Error, GrammarProcessor, ParseMode, Processor, Span, SyntaxTree};
    use expect_test::{expect, Expect};
    use indoc::indoc;
    use std::collections::HashMap;

    fn parse(source: &str, mode: ParseMode) -> crate::Result<SyntaxTree> {
        GrammarProcessor::new(MiniJava).tree_from_source(source, mode)
    }

    fn method_body(body: &str) -> String {
        format!("class A {{ void m() {{ {body} }} }}")
    }

    /// Renders the rule id and visible text of every `expression` node, in preorder.
    fn check_expressions(body: &str, expect: Expect) {
        let tree = parse(&method_body(body), ParseMode::Strict).unwrap();
        let mut rendered = String::new();
        for node in tree.root().descendants_named(&tree, "expression") {
            let text: String = node.visible_tokens(&tree).map(|token| token.text(&tree)).collect();
            rendered.push_str(&format!("{} {text}\n", node.rule_id(&tree)));
        }
        expect.assert_eq(&rendered);
    }

    #[test]
    fn class_with_method() {
        let source = "class K { void m() {} }";
        let tree = parse(source, ParseMode::Strict).unwrap();
        expect![[r#"
            compilationUnit#1@0..23
              typeDeclaration#2@0..23
                classDeclaration#4@0..23
                  CLASS@0..5 "class"
                  TOKENS#0@5..6
                    WS@5..6 " " (hidden)
                  IDENTIFIER@6..7 "K"
                  classBody#6@7..23
                    TOKENS#0@7..8
                      WS@7..8 " " (hidden)
                    LBRACE@8..9 "{"
                    classBodyDeclaration#7@9..21
                      methodDeclaration#11@9..21
                        TOKENS#0@9..10
                          WS@9..10 " " (hidden)
                        VOID@10..14 "void"
                        TOKENS#0@14..15
                          WS@14..15 " " (hidden)
                        IDENTIFIER@15..16 "m"
                        formalParameters#16@16..18
                          LPAREN@16..17 "("
                          RPAREN@17..18 ")"
                        block#17@18..21
                          TOKENS#0@18..19
                            WS@18..19 " " (hidden)
                          LBRACE@19..20 "{"
                          RBRACE@20..21 "}"
                    TOKENS#0@21..22
                      WS@21..22 " " (hidden)
                    RBRACE@22..23 "}"
              EOF@23..23 ""
        "#]]
        .assert_eq(&format!("{tree:#?}"));
        assert_eq!(tree.text(), source);
    }

    #[test]
    fn comment_before_closing_brace() {
        let source = "class K {\n  // test\n}";
        let tree = parse(source, ParseMode::Strict).unwrap();
        assert_eq!(tree.text(), source);

        let comment = tree
            .root()
            .hidden_tokens(&tree)
            .find(|token| token.kind(&tree) == "LINE_COMMENT")
            .unwrap();
        assert_eq!(comment.text(&tree), "// test\n");
        assert_eq!(comment.span(&tree), Span { start: LineColumn::new(2, 2), end: LineColumn::new(3, -1) });

        let class_body = tree.root().descendants_named(&tree, "classBody").next().unwrap();
        let group = class_body.child_nodes(&tree).last().unwrap();
        assert!(group.is_token_group(&tree));
        assert_eq!(group.text(&tree), "\n  // test\n");
    }

    #[test]
    fn trailing_comment_without_newline() {
        let source = "class A {}\n// end";
        let tree = verify_restoring(&GrammarProcessor::new(MiniJava), source).unwrap();
        let last = tree.root().hidden_tokens(&tree).last().unwrap();
        assert_eq!(last.kind(&tree), "LINE_COMMENT");
        assert_eq!(last.text(&tree), "// end");
        assert_eq!(last.span(&tree), Span { start: LineColumn::new(2, 0), end: LineColumn::new(2, 5) });
    }

    #[test]
    fn empty_source() {
        let tree = parse("", ParseMode::Strict).unwrap();
        expect![[r#"
            compilationUnit#1@0..0
              EOF@0..0 ""
        "#]]
        .assert_eq(&format!("{tree:#?}"));

        let tree = parse("  \n", ParseMode::Strict).unwrap();
        assert_eq!(tree.text(), "  \n");
    }

    #[test]
    fn call_sites_have_distinct_rule_ids() {
        let tree = parse(&method_body("if (true) stmt(); else stmt();"), ParseMode::Strict).unwrap();
        let statements: Vec<_> = tree
            .root()
            .descendants_named(&tree, "statement")
            .map(|node| (node.rule_id(&tree), node.visible_tokens(&tree).count()))
            .collect();
        assert_eq!(statements, [(29, 13), (36, 4), (37, 4)]);
    }

    #[test]
    fn rule_ids_identify_rules() {
        let source = indoc! {r#"
            public class Shapes extends java.lang.Object {
                private static final int[] sizes = new int[3], more;
                Shapes(int a, final String b) { this.a = a; }
                abstract double area();
                protected long count(java.util.List<T> items);
                ;
                class Inner { }
                void run() {
                    final int x = 0x1F, y;
                    for (int i = 0; i < 10; i++) { continue; }
                    for (; ; ) break;
                    for (i = 0, j = 1; i != j; i++, j--) ;
                    while (!done) { done = x >= y || y <= x && z; }
                    do x -= 1; while (x > 0);
                    s = "a" + 'b' + 1.5 + null + true;
                    o = new Shape(1, 2).area()[0];
                    v = c ? a : b % ~d;
                    return;
                }
            }
        "#};
        // generic types are not part of the grammar
        assert!(matches!(parse(source, ParseMode::Strict), Err(Error::Parse { .. })));

        let source = source.replace("java.util.List<T> items", "java.util.List items");
        let tree = verify_restoring(&GrammarProcessor::new(MiniJava), &source).unwrap();

        let mut names: HashMap<RuleId, &str> = HashMap::new();
        for node in tree.root().descendant_nodes(&tree) {
            let name = node.name(&tree);
            let rule_id = node.rule_id(&tree);
            let known = *names.entry(rule_id).or_insert(name);
            assert_eq!(known, name, "rule id {rule_id} is used by `{known}` and `{name}`");
        }
        assert_eq!(names[&0], "TOKENS");
        assert!(names.len() > 40);
    }

    #[test]
    fn expression_precedence() {
        check_expressions(
            "a = b + c * -d.e(f)[0];",
            expect![[r#"
                70 a=b+c*-d.e(f)[0]
                61 a
                79 b+c*-d.e(f)[0]
                61 b
                80 c*-d.e(f)[0]
                61 c
                60 -d.e(f)[0]
                65 d.e(f)[0]
                63 d.e(f)
                61 d
                61 f
                61 0
            "#]],
        );
    }

    #[test]
    fn associativity() {
        check_expressions(
            "a = b = c - d - e;",
            expect![[r#"
                70 a=b=c-d-e
                61 a
                70 b=c-d-e
                61 b
                79 c-d-e
                79 c-d
                61 c
                61 d
                61 e
            "#]],
        );
    }

    #[test]
    fn calls_and_ternaries() {
        check_expressions(
            "x = f(1) ? !a : b++;",
            expect![[r#"
                70 x=f(1)?!a:b++
                61 x
                71 f(1)?!a:b++
                66 f(1)
                61 f
                61 1
                60 !a
                61 a
                68 b++
                61 b
            "#]],
        );
    }

    #[test]
    fn syntax_error() {
        let source = "class A {{ }";

        let tree = parse(source, ParseMode::Lenient).unwrap();
        assert_eq!(tree.text(), source);

        let error = parse(source, ParseMode::Strict).unwrap_err();
        match error {
            Error::Parse { diagnostic } => {
                assert_eq!(diagnostic.message, "expected member declaration, found `{`");
                assert_eq!(diagnostic.position, LineColumn::new(1, 9));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn lenient_keeps_everything() {
        for source in [
            "class A {",
            "class A { int }",
            "class Ä {}\n",
            "class A { void m() { x = ; } } // done\n",
            "}}} /* */ class",
        ] {
            let tree = parse(source, ParseMode::Lenient).unwrap();
            assert_eq!(tree.text(), source);
            assert!(parse(source, ParseMode::Strict).is_err(), "{source:?} parsed strictly");
        }
    }

    #[test]
    fn deep_nesting() {
        let source = method_body(&format!("x = {};", "(".repeat(2000)));

        let error = parse(&source, ParseMode::Strict).unwrap_err();
        match error {
            Error::Parse { diagnostic } => {
                assert_eq!(
                    diagnostic.message,
                    "`primary` nested more than 256 rules deep, found `(`"
                );
            }
            other => panic!("unexpected error {other:?}"),
        }

        let tree = parse(&source, ParseMode::Lenient).unwrap();
        assert_eq!(tree.text(), source);

        let source = method_body(&format!("x = {}1{};", "(".repeat(50), ")".repeat(50)));
        verify_restoring(&GrammarProcessor::new(MiniJava), &source).unwrap();
    }

    #[test]
    fn block_comments() {
        let source = indoc! {"
            /* header */
            class K { /* c */ void m() {} /* open
        "};
        let tree = parse(source, ParseMode::Lenient).unwrap();
        let comments: Vec<_> = tree
            .root()
            .hidden_tokens(&tree)
            .filter(|token| token.kind(&tree) == "COMMENT")
            .map(|token| token.text(&tree))
            .collect();
        assert_eq!(comments, ["/* header */", "/* c */", "/* open\n"]);

        verify_restoring(&GrammarProcessor::new(MiniJava), "class K { /* c */ void m() {} }").unwrap();
    }

    #[test]
    fn unexpected_end_of_input() {
        let error = parse("class A {\n", ParseMode::Strict).unwrap_err();
        assert_eq!(error.to_string(), "parse failure at 2:0: expected RBRACE, found end of input");
    }

    #[test]
    fn xml_round_trip() {
        let processor = GrammarProcessor::new(MiniJava);
        let source = indoc! {"
            /** Doc <comment> & more */
            class K {
                int x = 1 < 2 ? 3 : 4;
            }
        "};
        let xml = processor.xml_from_source(source, ParseMode::Strict).unwrap();
        assert!(xml.contains("Doc &lt;comment&gt; &amp; more"));
        assert!(xml.contains("<compilationUnit rule-id=\"1\">"));
        assert_eq!(processor.source_from_xml(&xml).unwrap(), source);

        verify_restoring(&processor, source).unwrap();
        verify_inter_converting(&processor, source).unwrap();
    }
}
