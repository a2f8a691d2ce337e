// パス: src/parser/expr.rs
// 役割: 式解析に関する `Parser` 実装をまとめる
// 意図: 中置演算・後置ナビゲーション・リテラルなど式の各層を専用モジュールに切り分ける
// 関連ファイル: src/parser/mod.rs, src/ast.rs, src/lexer.rs

use super::*;
use crate::stack::ensure_sufficient_stack;

impl Parser {
    pub(super) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        if self.peek().kind == TokenKind::EOF {
            let t = self.peek();
            return Err(ParseError::at("PAR010", "式がありません", t.pos, t.col));
        }
        self.parse_assign()
    }

    // 括弧・引数・添字など、式が入れ子になる入口はすべてここを通る。
    fn parse_assign(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let result = ensure_sufficient_stack(|| self.parse_assign_inner());
        self.leave(1);
        result
    }

    // 代入は右結合で最も弱い。
    fn parse_assign_inner(&mut self) -> Result<Expr, ParseError> {
        let target = self.parse_ternary()?;
        if self.peek().kind != TokenKind::ASSIGN {
            return Ok(target);
        }
        let eq_tok = self.pop_any();
        if !target.is_assignable() {
            return Err(ParseError::at(
                "PAR020",
                "代入できない左辺です",
                eq_tok.pos,
                eq_tok.col,
            ));
        }
        let value = self.parse_assign()?;
        Ok(Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_ternary(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_infix_level(0)?;
        if self.accept(TokenKind::QMARK).is_none() {
            return Ok(cond);
        }
        let then_branch = self.parse_assign()?;
        self.pop(TokenKind::COLON)?;
        let else_branch = self.parse_assign()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_infix_level(&mut self, level: usize) -> Result<Expr, ParseError> {
        if level >= INFIX_LEVELS.len() {
            return self.parse_unary();
        }
        let spec = &INFIX_LEVELS[level];
        let mut left = self.parse_infix_level(level + 1)?;
        match spec.assoc {
            Assoc::Left => {
                // 左結合の連鎖も木を深くするので 1 段ずつ数える。
                let mut chained = 0;
                while spec.contains(&self.peek().kind) {
                    self.enter()?;
                    chained += 1;
                    let op_token = self.pop_any();
                    let right = self.parse_infix_level(level + 1)?;
                    left = Self::mk_binop(left, &op_token, right);
                }
                self.leave(chained);
                Ok(left)
            }
            Assoc::Non => {
                if !spec.contains(&self.peek().kind) {
                    return Ok(left);
                }
                let op_token = self.pop_any();
                if op_token.kind == TokenKind::INSTANCEOF {
                    let type_name = self.parse_type_name()?;
                    return Ok(Expr::InstanceOf {
                        expr: Box::new(left),
                        type_name,
                    });
                }
                let right = self.parse_infix_level(level + 1)?;
                Ok(Self::mk_binop(left, &op_token, right))
            }
        }
    }

    fn mk_binop(left: Expr, op_token: &Token, right: Expr) -> Expr {
        // INFIX_LEVELS に載っているトークンはすべて binop_for で写像できる。
        let op = binop_for(op_token.kind).unwrap_or(BinOp::Eq);
        Expr::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::MINUS => UnaryOp::Neg,
            TokenKind::BANG | TokenKind::KW_NOT => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.pop_any();
        self.enter()?;
        let operand = ensure_sufficient_stack(|| self.parse_unary())?;
        self.leave(1);
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        let mut chained = 0;
        loop {
            if matches!(self.peek().kind, TokenKind::DOT | TokenKind::LBRACK) {
                self.enter()?;
                chained += 1;
            }
            if self.accept(TokenKind::DOT).is_some() {
                let name = self.pop(TokenKind::IDENT)?.value;
                let step = if self.peek().kind == TokenKind::LPAREN {
                    Expr::Call {
                        name,
                        args: self.parse_args()?,
                    }
                } else {
                    Expr::Property { name }
                };
                expr = Expr::Chain {
                    target: Box::new(expr),
                    step: Box::new(step),
                };
            } else if self.accept(TokenKind::LBRACK).is_some() {
                let index = self.parse_assign()?;
                self.pop(TokenKind::RBRACK)?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                self.leave(chained);
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::INT => {
                self.pop_any();
                let value = t.value.parse::<i64>().map_err(|_| {
                    ParseError::at("PAR030", "整数リテラルが範囲外です", t.pos, t.col)
                })?;
                Ok(Expr::IntLit { value })
            }
            TokenKind::HEX => {
                self.pop_any();
                let value = i64::from_str_radix(&t.value[2..], 16).map_err(|_| {
                    ParseError::at("PAR030", "整数リテラルが範囲外です", t.pos, t.col)
                })?;
                Ok(Expr::IntLit { value })
            }
            TokenKind::FLOAT => {
                self.pop_any();
                let value = t.value.parse::<f64>().map_err(|_| {
                    ParseError::at("PAR031", "浮動小数点リテラルが不正です", t.pos, t.col)
                })?;
                Ok(Expr::FloatLit { value })
            }
            TokenKind::STRING => {
                self.pop_any();
                Ok(Expr::StringLit { value: t.value })
            }
            TokenKind::TRUE | TokenKind::FALSE => {
                self.pop_any();
                Ok(Expr::BoolLit {
                    value: t.kind == TokenKind::TRUE,
                })
            }
            TokenKind::NULL => {
                self.pop_any();
                Ok(Expr::Null)
            }
            TokenKind::IDENT => {
                self.pop_any();
                if self.peek().kind == TokenKind::LPAREN {
                    Ok(Expr::Call {
                        name: t.value,
                        args: self.parse_args()?,
                    })
                } else {
                    Ok(Expr::Property { name: t.value })
                }
            }
            TokenKind::HASH => {
                self.pop_any();
                if self.peek().kind == TokenKind::LBRACE {
                    return self.parse_map_literal();
                }
                let name = self.pop(TokenKind::IDENT)?.value;
                Ok(Expr::Variable { name })
            }
            TokenKind::LBRACE => self.parse_list_literal(),
            TokenKind::LPAREN => {
                self.pop_any();
                let inner = self.parse_assign()?;
                self.pop(TokenKind::RPAREN)?;
                Ok(inner)
            }
            TokenKind::AT => self.parse_static(),
            TokenKind::NEW => {
                self.pop_any();
                let type_name = self.parse_qualified_name()?;
                let args = self.parse_args()?;
                Ok(Expr::New { type_name, args })
            }
            TokenKind::EOF => Err(ParseError::at("PAR010", "式がありません", t.pos, t.col)),
            _ => Err(self.unexpected("式を期待しました")),
        }
    }

    // `@型名@メンバ` または `@型名@メソッド(引数)`
    fn parse_static(&mut self) -> Result<Expr, ParseError> {
        self.pop(TokenKind::AT)?;
        let type_name = self.parse_qualified_name()?;
        self.pop(TokenKind::AT)?;
        let member = self.pop(TokenKind::IDENT)?.value;
        if self.peek().kind == TokenKind::LPAREN {
            Ok(Expr::StaticCall {
                type_name,
                method: member,
                args: self.parse_args()?,
            })
        } else {
            Ok(Expr::StaticField { type_name, member })
        }
    }

    fn parse_qualified_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.pop(TokenKind::IDENT)?.value;
        while self.peek().kind == TokenKind::DOT
            && self.peek_kind(1) == Some(TokenKind::IDENT)
        {
            self.pop_any();
            name.push('.');
            name.push_str(&self.pop_any().value);
        }
        Ok(name)
    }

    /// `instanceof` の右辺。配列型は `[]` を名前に含めたまま返す。
    fn parse_type_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.parse_qualified_name()?;
        let mut dims = 0;
        while self.peek().kind == TokenKind::LBRACK && self.peek_kind(1) == Some(TokenKind::RBRACK)
        {
            self.enter()?;
            dims += 1;
            self.pop_any();
            self.pop_any();
            name.push_str("[]");
        }
        self.leave(dims);
        Ok(name)
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.pop(TokenKind::LPAREN)?;
        let mut args = Vec::new();
        if self.accept(TokenKind::RPAREN).is_some() {
            return Ok(args);
        }
        loop {
            args.push(self.parse_assign()?);
            if self.accept(TokenKind::COMMA).is_some() {
                continue;
            }
            self.pop(TokenKind::RPAREN)?;
            return Ok(args);
        }
    }

    fn parse_list_literal(&mut self) -> Result<Expr, ParseError> {
        self.pop(TokenKind::LBRACE)?;
        let mut items = Vec::new();
        if self.accept(TokenKind::RBRACE).is_some() {
            return Ok(Expr::ListLit { items });
        }
        loop {
            items.push(self.parse_assign()?);
            if self.accept(TokenKind::COMMA).is_some() {
                continue;
            }
            self.pop(TokenKind::RBRACE)?;
            return Ok(Expr::ListLit { items });
        }
    }

    fn parse_map_literal(&mut self) -> Result<Expr, ParseError> {
        self.pop(TokenKind::LBRACE)?;
        let mut entries = Vec::new();
        if self.accept(TokenKind::RBRACE).is_some() {
            return Ok(Expr::MapLit { entries });
        }
        loop {
            let key = self.parse_ternary()?;
            self.pop(TokenKind::COLON)?;
            let value = self.parse_assign()?;
            entries.push((key, value));
            if self.accept(TokenKind::COMMA).is_some() {
                continue;
            }
            self.pop(TokenKind::RBRACE)?;
            return Ok(Expr::MapLit { entries });
        }
    }
}
