// パス: src/context.rs
// 役割: セッションを通じて共有される評価コンテキストを定義する
// 意図: `#name` で読み書きする変数と、型名解決の手段を一か所で保持する
// 関連ファイル: src/evaluator.rs, src/resolver/mod.rs, src/repl/session.rs

use std::collections::HashMap;
use std::rc::Rc;

use crate::resolver::NameResolver;
use crate::value::Value;

/// 式から `#this` / `#root` として参照される予約名。
pub const RESERVED_NAMES: &[&str] = &["this", "root"];

pub struct EvaluationContext {
    vars: HashMap<String, Value>,
    resolver: Rc<dyn NameResolver>,
}

impl EvaluationContext {
    /// 名前解決の手段だけを持つ空のコンテキスト。
    pub fn new(resolver: Rc<dyn NameResolver>) -> Self {
        Self {
            vars: HashMap::new(),
            resolver,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn resolver(&self) -> &Rc<dyn NameResolver> {
        &self.resolver
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
