// パス: src/root.rs
// 役割: 起動時のルート式を評価してセッションのルートを作る
// 意図: ルート式の失敗は行単位のエラーと違い、起動を中断する致命的なエラーとして扱う
// 関連ファイル: src/evaluator.rs, src/context.rs, src/repl/bootstrap.rs

use std::rc::Rc;

use crate::context::EvaluationContext;
use crate::errors::StartupError;
use crate::evaluator::evaluate;
use crate::resolver::NameResolver;
use crate::value::Value;

pub struct RootInitializer {
    resolver: Rc<dyn NameResolver>,
}

impl RootInitializer {
    pub fn new(resolver: Rc<dyn NameResolver>) -> Self {
        Self { resolver }
    }

    /// 未設定または空のルート式は評価器を呼ばずに null を返す。
    /// それ以外は名前解決だけを持つ空のコンテキストで、ルートなしに評価する。
    pub fn init_root(&self, expression: Option<&str>) -> Result<Value, StartupError> {
        let Some(expression) = expression.filter(|e| !e.is_empty()) else {
            return Ok(Value::Null);
        };
        let mut ctx = EvaluationContext::new(self.resolver.clone());
        let root = evaluate(expression, &mut ctx, &Value::Null).map_err(|source| {
            StartupError::RootExpression {
                expression: expression.to_string(),
                source,
            }
        })?;
        tracing::debug!(expression, root = %root, "root initialized");
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::BaseResolver;

    fn initializer() -> RootInitializer {
        RootInitializer::new(Rc::new(BaseResolver::new()))
    }

    #[test]
    /// 未設定と空文字列はどちらも null ルート。
    fn unset_or_empty_yields_null() {
        assert_eq!(initializer().init_root(None).unwrap(), Value::Null);
        assert_eq!(initializer().init_root(Some("")).unwrap(), Value::Null);
    }

    #[test]
    /// 空白だけの式は評価され、空の式として失敗する。
    fn blank_expression_is_evaluated() {
        let err = initializer().init_root(Some("  ")).unwrap_err();
        match err {
            StartupError::RootExpression { source, .. } => {
                assert_eq!(source.info().code, "PAR010")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    /// 式の値がそのままルートになる。
    fn expression_value_becomes_root() {
        let root = initializer()
            .init_root(Some("#{'greeting': 'hello'}"))
            .unwrap();
        assert_eq!(root.to_string(), "{greeting=hello}");
    }
}
