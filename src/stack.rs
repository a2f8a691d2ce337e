// パス: src/stack.rs
// 役割: 深い再帰（構文解析・評価）の前にスタックの残量を確保する
// 意図: 入れ子の深い 1 行でプロセスごと落ちないよう、必要に応じてスタックを伸ばす
// 関連ファイル: src/parser/expr.rs, src/evaluator.rs

/// 残りがこれを下回ったらスタックを伸ばす。
const RED_ZONE: usize = 100 * 1024;

/// 1 回の伸長で確保する量。
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// 残量が足りなければスタックを伸ばしてから `f` を呼ぶ。
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
