//! XPath 1.0 parser
//!
//! Recursive descent parser producing the AST dispatched by
//! [`crate::xpath::eval`]. Precedence, low to high: `or` < `and` <
//! equality < relational < additive < multiplicative < unary-minus <
//! union < path.

use super::lexer::{Lexer, Token};

/// XPath expression AST node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// `/` alone.
    Root,
    /// `.`
    Context,
    /// `..`
    Parent,
    /// `expr | expr`
    Union(Box<Expr>, Box<Expr>),
    /// `expr/step` or `expr//step`
    Path(Box<Expr>, Box<Step>),
    /// `expr[predicate]`
    Filter(Box<Expr>, Box<Expr>),
    /// `name(args)`
    Function(String, Vec<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Negate(Box<Expr>),
    Number(f64),
    String(String),
    Variable(String),
    /// A bare location step used as a primary expression.
    Step(Box<Step>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Self_,
    Attribute,
    Namespace,
}

impl Axis {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            "namespace" => Some(Axis::Namespace),
            _ => None,
        }
    }
}

/// Node test in a location step. There are no attribute, namespace,
/// comment, or processing-instruction nodes in the projected tree, so
/// the test set is just a local-name match, `*`, or the
/// `node()`/`text()` type tests (the latter matching leaves only).
#[derive(Debug, Clone)]
pub enum NodeTest {
    Any,
    Name(String),
    Node,
    Text,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            peeked: None,
        }
    }

    pub fn parse(&mut self) -> Result<Expr, String> {
        let expr = self.parse_expr()?;
        if !matches!(self.current, Token::Eof) {
            return Err(format!("unexpected trailing token: {:?}", self.current));
        }
        Ok(expr)
    }

    fn advance(&mut self) {
        self.current = if let Some(t) = self.peeked.take() {
            t
        } else {
            self.lexer.next_token()
        };
    }

    fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token());
        }
        self.peeked.as_ref().unwrap()
    }

    fn parse_expr(&mut self) -> Result<Expr, String> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and_expr()?;
        while matches!(self.current, Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::Or, Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_equality_expr()?;
        while matches!(self.current, Token::And) {
            self.advance();
            let right = self.parse_equality_expr()?;
            left = Expr::Binary(Box::new(left), BinaryOp::And, Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_relational_expr()?;
        loop {
            let op = match &self.current {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let op = match &self.current {
                Token::Lt => BinaryOp::Lt,
                Token::LtEq => BinaryOp::LtEq,
                Token::Gt => BinaryOp::Gt,
                Token::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match &self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match &self.current {
                Token::Star => BinaryOp::Mul,
                Token::Div => BinaryOp::Div,
                Token::Mod => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, String> {
        if matches!(self.current, Token::Minus) {
            self.advance();
            let expr = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path_expr()?;
        while matches!(self.current, Token::Pipe) {
            self.advance();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// A bare `*` on the child axis — the only step shape the `//`
    /// rewrite treats as "all".
    fn is_all_step(step: &Step) -> bool {
        step.axis == Axis::Child && matches!(step.node_test, NodeTest::Any)
    }

    fn is_self_or_parent_step(step: &Step) -> bool {
        matches!(step.axis, Axis::Self_ | Axis::Parent)
    }

    /// Materializes the `//` shorthand in front of `step`, per the
    /// three-way rule: an all-step absorbs its predicates into the
    /// descendant step itself and disappears; a self/parent step keeps
    /// itself as a subsequent step behind an unpredicated descendant
    /// step (so `//self::`/`//parent::` don't pick up self); any other
    /// step collapses into a single descendant step carrying its node
    /// test and predicates.
    fn rewrite_descendant(left: Expr, step: Step) -> Expr {
        if Self::is_all_step(&step) {
            let descendant = Step {
                axis: Axis::Descendant,
                node_test: NodeTest::Any,
                predicates: step.predicates,
            };
            Expr::Path(Box::new(left), Box::new(descendant))
        } else if Self::is_self_or_parent_step(&step) {
            let descendant = Step {
                axis: Axis::Descendant,
                node_test: NodeTest::Any,
                predicates: Vec::new(),
            };
            Expr::Path(Box::new(Expr::Path(Box::new(left), Box::new(descendant))), Box::new(step))
        } else {
            let descendant = Step {
                axis: Axis::Descendant,
                node_test: step.node_test,
                predicates: step.predicates,
            };
            Expr::Path(Box::new(left), Box::new(descendant))
        }
    }

    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        let mut expr = match &self.current {
            Token::Slash => {
                self.advance();
                if matches!(
                    self.current,
                    Token::Eof | Token::RightBracket | Token::RightParen | Token::Pipe | Token::Comma
                ) {
                    return Ok(Expr::Root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(Expr::Root), Box::new(step))
            }
            Token::DoubleSlash => {
                self.advance();
                let step = self.parse_step()?;
                Self::rewrite_descendant(Expr::Root, step)
            }
            _ => return self.parse_filter_expr(),
        };

        loop {
            match &self.current {
                Token::Slash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Self::rewrite_descendant(expr, step);
                }
                Token::LeftBracket => {
                    self.advance();
                    let pred = self.parse_expr()?;
                    if !matches!(self.current, Token::RightBracket) {
                        return Err("expected ]".to_string());
                    }
                    self.advance();
                    expr = Expr::Filter(Box::new(expr), Box::new(pred));
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_filter_expr(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary_expr()?;
        loop {
            match &self.current {
                Token::LeftBracket => {
                    self.advance();
                    let pred = self.parse_expr()?;
                    if !matches!(self.current, Token::RightBracket) {
                        return Err("expected ]".to_string());
                    }
                    self.advance();
                    expr = Expr::Filter(Box::new(expr), Box::new(pred));
                }
                Token::Slash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Token::DoubleSlash => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Self::rewrite_descendant(expr, step);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, String> {
        match &self.current {
            Token::Number(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::String(s))
            }
            Token::Dollar => {
                self.advance();
                if let Token::Name(name) = &self.current {
                    let name = name.clone();
                    self.advance();
                    Ok(Expr::Variable(name))
                } else {
                    Err("expected variable name after $".to_string())
                }
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expr()?;
                if !matches!(self.current, Token::RightParen) {
                    return Err("expected )".to_string());
                }
                self.advance();
                Ok(expr)
            }
            Token::Name(name) => {
                let name = name.clone();
                if matches!(self.peek(), Token::LeftParen) {
                    self.advance();
                    self.advance();
                    let args = self.parse_function_args()?;
                    Ok(Expr::Function(name, args))
                } else {
                    let step = self.parse_step()?;
                    Ok(Expr::Step(Box::new(step)))
                }
            }
            Token::NodeType(name) => {
                let name = name.clone();
                self.advance();
                self.advance();
                if matches!(self.current, Token::String(..)) {
                    self.advance();
                }
                if !matches!(self.current, Token::RightParen) {
                    return Err("expected )".to_string());
                }
                self.advance();
                let node_test = match name.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" | "processing-instruction" => {
                        return Err(format!("{name}() has no counterpart in this tree model"))
                    }
                    _ => return Err(format!("unknown node type: {name}")),
                };
                Ok(Expr::Step(Box::new(Step {
                    axis: Axis::Child,
                    node_test,
                    predicates: Vec::new(),
                })))
            }
            Token::Star => {
                self.advance();
                Ok(Expr::Step(Box::new(Step {
                    axis: Axis::Child,
                    node_test: NodeTest::Any,
                    predicates: Vec::new(),
                })))
            }
            Token::At => Err("attribute axis is not part of this tree model".to_string()),
            Token::Dot => {
                self.advance();
                Ok(Expr::Context)
            }
            Token::DoubleDot => {
                self.advance();
                Ok(Expr::Parent)
            }
            Token::Axis(axis) => {
                let axis = Axis::from_str(axis).ok_or_else(|| format!("unknown axis: {axis}"))?;
                self.advance();
                if !matches!(self.current, Token::DoubleColon) {
                    return Err("expected :: after axis name".to_string());
                }
                self.advance();
                let step = self.parse_step_with_axis(axis)?;
                Ok(Expr::Step(Box::new(step)))
            }
            _ => Err(format!("unexpected token: {:?}", self.current)),
        }
    }

    fn parse_step(&mut self) -> Result<Step, String> {
        self.parse_step_with_axis(Axis::Child)
    }

    fn parse_step_with_axis(&mut self, mut axis: Axis) -> Result<Step, String> {
        if let Token::Axis(axis_name) = &self.current {
            axis = Axis::from_str(axis_name).ok_or_else(|| format!("unknown axis: {axis_name}"))?;
            self.advance();
            if !matches!(self.current, Token::DoubleColon) {
                return Err("expected :: after axis name".to_string());
            }
            self.advance();
        }

        // `.` / `..` as a non-initial step (`a/..`, `//b/.`) are the usual
        // `self::node()` / `parent::node()` abbreviations; any axis named
        // ahead of them is meaningless and overridden, same as the
        // primary-expression shorthand these mirror.
        if matches!(self.current, Token::Dot | Token::DoubleDot) {
            axis = if matches!(self.current, Token::Dot) { Axis::Self_ } else { Axis::Parent };
            self.advance();
            return Ok(Step { axis, node_test: NodeTest::Node, predicates: Vec::new() });
        }

        let node_test = match &self.current {
            Token::Star => {
                self.advance();
                NodeTest::Any
            }
            Token::Name(name) => {
                let name = name.clone();
                self.advance();
                NodeTest::Name(name)
            }
            Token::NodeType(name) => {
                let name = name.clone();
                self.advance();
                self.advance();
                if !matches!(self.current, Token::RightParen) {
                    return Err("expected )".to_string());
                }
                self.advance();
                match name.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    _ => return Err(format!("{name}() has no counterpart in this tree model")),
                }
            }
            _ => return Err(format!("expected node test, got {:?}", self.current)),
        };

        let mut predicates = Vec::new();
        while matches!(self.current, Token::LeftBracket) {
            self.advance();
            predicates.push(self.parse_expr()?);
            if !matches!(self.current, Token::RightBracket) {
                return Err("expected ]".to_string());
            }
            self.advance();
        }

        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        if !matches!(self.current, Token::RightParen) {
            args.push(self.parse_expr()?);
            while matches!(self.current, Token::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        if !matches!(self.current, Token::RightParen) {
            return Err("expected )".to_string());
        }
        self.advance();
        Ok(args)
    }
}

/// Parses an XPath 1.0 expression string into an AST.
pub fn parse(input: &str) -> Result<Expr, String> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_path() {
        let expr = parse("/a/b").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn descendant_shorthand() {
        let expr = parse("//item").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn function_call() {
        let expr = parse("count(//item)").unwrap();
        assert!(matches!(expr, Expr::Function(name, _) if name == "count"));
    }

    #[test]
    fn predicate_on_step() {
        let expr = parse("a/b[2]").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn attribute_axis_rejected() {
        assert!(parse("@id").is_err());
    }

    #[test]
    fn variable_reference() {
        let expr = parse("$x + 1").unwrap();
        assert!(matches!(expr, Expr::Binary(..)));
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        assert!(parse("1 2").is_err());
    }
}
