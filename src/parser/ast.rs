// AST (Abstract Syntax Tree) definitions for the minic front-end

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location information for error reporting (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Start and end of the source text a node was built from.
/// `end` points one column past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Span {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }
}

/// Types nameable in declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeName {
    Int,
    Float,
    Double,
    Boolean,
    Char,
    Void,
    Struct(String), // Struct name
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Int => write!(f, "int"),
            TypeName::Float => write!(f, "float"),
            TypeName::Double => write!(f, "double"),
            TypeName::Boolean => write!(f, "boolean"),
            TypeName::Char => write!(f, "char"),
            TypeName::Void => write!(f, "void"),
            TypeName::Struct(name) => write!(f, "struct {}", name),
        }
    }
}

/// Value of a numeric or string literal, shared by tokens and [`Expr::Literal`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(n) => write!(f, "{}", n),
            LiteralValue::Float(x) => write!(f, "{:?}", x),
            LiteralValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    // Assignment
    Assign,
    // Logical
    Or,
    And,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// How operators of equal precedence group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    /// `a < b < c` is rejected rather than grouped
    None,
}

impl BinOp {
    /// Binding strength, lowest first. Assignment sits below every level of
    /// the operator table; unary prefix (6) and postfix (7) are handled by
    /// the unary and postfix parsers.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Assign => 0,
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 3,
            BinOp::Add | BinOp::Sub => 4,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 5,
        }
    }

    pub fn associativity(self) -> Assoc {
        match self.precedence() {
            0 => Assoc::Right,
            3 => Assoc::None,
            _ => Assoc::Left,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Assign => "=",
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    Neg,     // -x
    Not,     // !x
    PostInc, // x++
    PostDec, // x--
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        span: Span,
    },
    Literal {
        value: LiteralValue,
        span: Span,
    },
    VarRef {
        name: String,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Call { span, .. }
            | Expr::Literal { span, .. }
            | Expr::VarRef { span, .. } => *span,
        }
    }

    fn node_count(&self) -> usize {
        match self {
            Expr::Binary { left, right, .. } => 1 + left.node_count() + right.node_count(),
            Expr::Unary { operand, .. } => 1 + operand.node_count(),
            Expr::Call { args, .. } => 1 + args.iter().map(Expr::node_count).sum::<usize>(),
            Expr::Literal { .. } | Expr::VarRef { .. } => 1,
        }
    }

    fn for_each_span(&self, f: &mut dyn FnMut(Span)) {
        f(self.span());
        match self {
            Expr::Binary { left, right, .. } => {
                left.for_each_span(f);
                right.for_each_span(f);
            }
            Expr::Unary { operand, .. } => operand.for_each_span(f),
            Expr::Call { args, .. } => args.iter().for_each(|a| a.for_each_span(f)),
            Expr::Literal { .. } | Expr::VarRef { .. } => {}
        }
    }
}

/// `type name [N] = init;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub var_type: TypeName,
    pub name: String,
    /// Length of a fixed-size array declaration (`int a[10];`)
    pub array_len: Option<u64>,
    pub init: Option<Expr>,
    pub span: Span,
}

/// Function parameter; `is_array` marks a trailing `[]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub param_type: TypeName,
    pub name: String,
    pub is_array: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub return_type: TypeName,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<VarDecl>,
    pub span: Span,
}

/// `{ statements }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    /// Either [`Stmt::Block`] or, for `else if`, [`Stmt::If`]
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    /// [`Stmt::VarDecl`] or [`Stmt::Expr`]
    pub init: Option<Box<Stmt>>,
    pub condition: Option<Expr>,
    pub step: Option<Expr>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CaseLabel {
    Case(LiteralValue),
    Default,
}

/// Switch case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseClause {
    pub label: CaseLabel,
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchStmt {
    pub scrutinee: Expr,
    pub cases: Vec<CaseClause>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    VarDecl(VarDecl),
    Expr { expr: Expr, span: Span },
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Switch(SwitchStmt),
    Break { span: Span },
    Continue { span: Span },
    Return(ReturnStmt),
    Block(Block),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl(decl) => decl.span,
            Stmt::Expr { span, .. } | Stmt::Break { span } | Stmt::Continue { span } => *span,
            Stmt::If(stmt) => stmt.span,
            Stmt::While(stmt) => stmt.span,
            Stmt::For(stmt) => stmt.span,
            Stmt::Switch(stmt) => stmt.span,
            Stmt::Return(stmt) => stmt.span,
            Stmt::Block(block) => block.span,
        }
    }

    fn node_count(&self) -> usize {
        match self {
            Stmt::VarDecl(decl) => var_decl_count(decl),
            Stmt::Expr { expr, .. } => 1 + expr.node_count(),
            Stmt::If(stmt) => {
                1 + stmt.condition.node_count()
                    + block_count(&stmt.then_block)
                    + stmt.else_branch.as_ref().map_or(0, |s| s.node_count())
            }
            Stmt::While(stmt) => 1 + stmt.condition.node_count() + block_count(&stmt.body),
            Stmt::For(stmt) => {
                1 + stmt.init.as_ref().map_or(0, |s| s.node_count())
                    + stmt.condition.as_ref().map_or(0, Expr::node_count)
                    + stmt.step.as_ref().map_or(0, Expr::node_count)
                    + block_count(&stmt.body)
            }
            Stmt::Switch(stmt) => {
                1 + stmt.scrutinee.node_count()
                    + stmt
                        .cases
                        .iter()
                        .map(|c| 1 + c.statements.iter().map(Stmt::node_count).sum::<usize>())
                        .sum::<usize>()
            }
            Stmt::Break { .. } | Stmt::Continue { .. } => 1,
            Stmt::Return(stmt) => 1 + stmt.value.as_ref().map_or(0, Expr::node_count),
            Stmt::Block(block) => block_count(block),
        }
    }

    fn for_each_span(&self, f: &mut dyn FnMut(Span)) {
        f(self.span());
        match self {
            Stmt::VarDecl(decl) => var_decl_spans(decl, f),
            Stmt::Expr { expr, .. } => expr.for_each_span(f),
            Stmt::If(stmt) => {
                stmt.condition.for_each_span(f);
                block_spans(&stmt.then_block, f);
                if let Some(else_branch) = &stmt.else_branch {
                    else_branch.for_each_span(f);
                }
            }
            Stmt::While(stmt) => {
                stmt.condition.for_each_span(f);
                block_spans(&stmt.body, f);
            }
            Stmt::For(stmt) => {
                if let Some(init) = &stmt.init {
                    init.for_each_span(f);
                }
                if let Some(cond) = &stmt.condition {
                    cond.for_each_span(f);
                }
                if let Some(step) = &stmt.step {
                    step.for_each_span(f);
                }
                block_spans(&stmt.body, f);
            }
            Stmt::Switch(stmt) => {
                stmt.scrutinee.for_each_span(f);
                for case in &stmt.cases {
                    f(case.span);
                    case.statements.iter().for_each(|s| s.for_each_span(f));
                }
            }
            Stmt::Break { .. } | Stmt::Continue { .. } => {}
            Stmt::Return(stmt) => {
                if let Some(value) = &stmt.value {
                    value.for_each_span(f);
                }
            }
            Stmt::Block(block) => block.statements.iter().for_each(|s| s.for_each_span(f)),
        }
    }
}

fn var_decl_count(decl: &VarDecl) -> usize {
    1 + decl.init.as_ref().map_or(0, Expr::node_count)
}

fn var_decl_spans(decl: &VarDecl, f: &mut dyn FnMut(Span)) {
    if let Some(init) = &decl.init {
        init.for_each_span(f);
    }
}

fn block_count(block: &Block) -> usize {
    1 + block.statements.iter().map(Stmt::node_count).sum::<usize>()
}

fn block_spans(block: &Block, f: &mut dyn FnMut(Span)) {
    f(block.span);
    block.statements.iter().for_each(|s| s.for_each_span(f));
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    Var(VarDecl),
    Func(FuncDecl),
    Struct(StructDecl),
}

impl Decl {
    pub fn name(&self) -> &str {
        match self {
            Decl::Var(decl) => &decl.name,
            Decl::Func(decl) => &decl.name,
            Decl::Struct(decl) => &decl.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Var(decl) => decl.span,
            Decl::Func(decl) => decl.span,
            Decl::Struct(decl) => decl.span,
        }
    }

    fn node_count(&self) -> usize {
        match self {
            Decl::Var(decl) => var_decl_count(decl),
            Decl::Func(decl) => 1 + decl.params.len() + block_count(&decl.body),
            Decl::Struct(decl) => 1 + decl.fields.iter().map(var_decl_count).sum::<usize>(),
        }
    }

    fn for_each_span(&self, f: &mut dyn FnMut(Span)) {
        f(self.span());
        match self {
            Decl::Var(decl) => var_decl_spans(decl, f),
            Decl::Func(decl) => {
                decl.params.iter().for_each(|p| f(p.span));
                block_spans(&decl.body, f);
            }
            Decl::Struct(decl) => {
                for field in &decl.fields {
                    f(field.span);
                    var_decl_spans(field, f);
                }
            }
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub declarations: Vec<Decl>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Number of AST nodes reachable from the root, the root excluded.
    pub fn node_count(&self) -> usize {
        self.declarations.iter().map(Decl::node_count).sum()
    }

    /// Visit the span of every node, parents before children.
    pub fn for_each_span(&self, mut f: impl FnMut(Span)) {
        for decl in &self.declarations {
            decl.for_each_span(&mut f);
        }
    }
}
