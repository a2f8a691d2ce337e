// パス: tests/name_resolution.rs
// 役割: classpath で拡張した名前解決と、型定義ファイルからのインスタンス生成を検証
// 意図: 拡張が基本規則を置き換えずに追加されること、起動時の classpath 検証を保証する
// 関連ファイル: src/resolver/layered.rs, src/resolver/base.rs, src/resolver/loader.rs, src/evaluator.rs
#[path = "test_support.rs"]
mod support;

use std::rc::Rc;

use ognl_repl::errors::StartupError;
use ognl_repl::resolver::{BaseResolver, LayeredResolver, NameResolver, SearchPath};
use ognl_repl::value::Value;
use support::{write_type, Session};
use tempfile::TempDir;

fn layered(dirs: &[&TempDir]) -> Rc<LayeredResolver> {
    let joined = std::env::join_paths(dirs.iter().map(|d| d.path())).unwrap();
    let classpath = joined.to_string_lossy().into_owned();
    Rc::new(LayeredResolver::from_classpath(&classpath).unwrap())
}

#[test]
/// 検索パス上の型をインスタンス化し、省略した引数は既定値の式で埋める。
fn defined_types_are_instantiable() {
    let dir = tempfile::tempdir().unwrap();
    write_type(
        dir.path(),
        "geo.Point",
        "x=0\ny=#root\nstatic.ORIGIN=new geo.Point(0, 0)\n",
    );
    let mut s = Session::with_resolver(layered(&[&dir]));
    assert_eq!(s.eval("new geo.Point(1, 2)").to_string(), "Point{x=1, y=2}");
    assert_eq!(s.eval("new geo.Point(5)").to_string(), "Point{x=5, y=null}");
    assert_eq!(s.eval("@geo.Point@ORIGIN.x"), Value::Int(0));
    assert_eq!(
        s.eval("new geo.Point() instanceof geo.Point"),
        Value::Bool(true)
    );
    assert_eq!(
        s.eval("new geo.Point().getClass().getName()"),
        Value::string("geo.Point")
    );
}

#[test]
/// フィールドはプロパティとして読み書きでき、未知の名前はエラーになる。
fn defined_type_fields_behave_as_properties() {
    let dir = tempfile::tempdir().unwrap();
    write_type(dir.path(), "Counter", "count=0\n");
    let mut s = Session::with_resolver(layered(&[&dir]));
    s.eval("#c = new Counter()");
    s.eval("#c.count = #c.count + 1");
    assert_eq!(s.eval("#c['count']"), Value::Int(1));
    assert_eq!(s.eval_result("#c.other").unwrap_err().info().code, "EVAL020");
    assert_eq!(s.eval_result("new Counter(1, 2)").unwrap_err().info().code, "EVAL031");
}

#[test]
/// 拡張は追加であり、基本規則（組み込み型・プリミティブ・配列・既定パッケージ）はそのまま残る。
fn extension_keeps_base_rules() {
    let dir = tempfile::tempdir().unwrap();
    write_type(dir.path(), "lang.Greeting", "text='hi'\n");
    let r = layered(&[&dir]);
    assert_eq!(r.resolve_name("Greeting").unwrap().name(), "lang.Greeting");
    assert_eq!(r.resolve_name("Math").unwrap().name(), "lang.Math");
    assert_eq!(r.resolve_name("util.HashMap").unwrap().name(), "util.HashMap");
    assert_eq!(r.resolve_name("double").unwrap().name(), "double");
    assert_eq!(r.resolve_name("Greeting[][]").unwrap().name(), "lang.Greeting[][]");
    assert!(r.resolve_name("Nope").is_err());

    let mut s = Session::with_resolver(r);
    assert_eq!(s.eval("new Greeting().text"), Value::string("hi"));
}

#[test]
/// 基本リゾルバだけでは検索パス上の型は見えない。
fn base_resolver_does_not_see_search_path() {
    let dir = tempfile::tempdir().unwrap();
    write_type(dir.path(), "Point", "x=0\n");
    let base = BaseResolver::new();
    assert!(base.resolve_name("Point").is_err());
    assert!(layered(&[&dir]).resolve_name("Point").is_ok());
}

#[test]
/// 検索パスの要素は指定順に調べる。
fn earlier_search_path_entries_win() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write_type(first.path(), "Pick", "from='first'\n");
    write_type(second.path(), "Pick", "from='second'\n");
    write_type(second.path(), "OnlySecond", "v=2\n");
    let mut s = Session::with_resolver(layered(&[&first, &second]));
    assert_eq!(s.eval("new Pick().from"), Value::string("first"));
    assert_eq!(s.eval("new OnlySecond().v"), Value::Int(2));
}

#[test]
/// 型定義の式が壊れている・自己参照で終わらない場合は評価エラー。
fn broken_definitions_are_evaluation_errors() {
    let dir = tempfile::tempdir().unwrap();
    write_type(dir.path(), "Broken", "x=1 +\n");
    write_type(dir.path(), "Loop", "next=new Loop()\n");
    let mut s = Session::with_resolver(layered(&[&dir]));
    assert_eq!(s.eval_result("new Broken()").unwrap_err().info().code, "EVAL072");
    assert_eq!(s.eval_result("new Loop()").unwrap_err().info().code, "EVAL073");
    assert_eq!(s.eval("1 + 1"), Value::Int(2));
}

#[test]
/// 既存のファイルを classpath の要素にすると起動時エラー。
fn file_entry_in_classpath_is_malformed() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let classpath = file.path().display().to_string();
    match LayeredResolver::from_classpath(&classpath) {
        Err(StartupError::MalformedSearchPath { entry, .. }) => assert_eq!(entry, classpath),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("file entry should be rejected"),
    }
}

#[test]
/// 存在しないディレクトリと空の要素は受け入れる。
fn missing_directories_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("not-yet-created");
    let classpath = format!("{}{}", missing.display(), if cfg!(windows) { ";" } else { ":" });
    let sp = SearchPath::parse_in(&classpath, dir.path()).unwrap();
    assert_eq!(sp.locations().len(), 2);
    assert!(SearchPath::parse("").unwrap().is_empty());
}
