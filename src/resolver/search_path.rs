// パス: src/resolver/search_path.rs
// 役割: classpath 文字列を検索場所の列へ変換する
// 意図: 不正な要素を起動時に検出し、セッション中に黙って無視しないようにする
// 関連ファイル: src/resolver/loader.rs, src/resolver/layered.rs, src/errors.rs

use std::env;
use std::path::{Path, PathBuf};

use url::Url;

use crate::errors::StartupError;

/// 検索場所 1 つ。`file:` URL と、それが指すディレクトリを持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
    dir: PathBuf,
}

impl Location {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    locations: Vec<Location>,
}

impl SearchPath {
    /// カレントディレクトリを基準に classpath 文字列を解釈する。
    pub fn parse(classpath: &str) -> Result<Self, StartupError> {
        if classpath.trim().is_empty() {
            return Ok(Self::default());
        }
        let cwd = env::current_dir().map_err(|e| StartupError::MalformedSearchPath {
            entry: classpath.to_string(),
            reason: format!("カレントディレクトリを取得できません: {e}"),
        })?;
        Self::parse_in(classpath, &cwd)
    }

    /// `base` を基準に classpath 文字列を解釈する。
    ///
    /// 区切りはプラットフォームのパス区切り（Unix では `:`）。空の要素（末尾の区切りを含む）は
    /// `base` 自身を表す。既存のファイルを指す要素や URL に変換できない要素はエラー。
    pub fn parse_in(classpath: &str, base: &Path) -> Result<Self, StartupError> {
        let trimmed = classpath.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let mut locations = Vec::new();
        for entry in env::split_paths(trimmed) {
            let location = Self::locate(&entry, base)?;
            tracing::debug!(url = %location.url, "search path entry");
            locations.push(location);
        }
        Ok(Self { locations })
    }

    fn locate(entry: &Path, base: &Path) -> Result<Location, StartupError> {
        let malformed = |reason: &str| StartupError::MalformedSearchPath {
            entry: entry.display().to_string(),
            reason: reason.to_string(),
        };
        if entry.to_string_lossy().contains('\0') {
            return Err(malformed("NUL 文字を含んでいます"));
        }
        let dir = base.join(entry);
        if dir.exists() && !dir.is_dir() {
            return Err(malformed("ディレクトリではありません"));
        }
        let url = Url::from_directory_path(&dir)
            .map_err(|_| malformed("file: URL に変換できません"))?;
        Ok(Location { url, dir })
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// 空文字列は要素なし。
    fn empty_string_has_no_entries() {
        let sp = SearchPath::parse_in("   ", Path::new("/base")).unwrap();
        assert!(sp.is_empty());
    }

    #[cfg(unix)]
    #[test]
    /// 末尾の区切りは基準ディレクトリを要素として含める。
    fn trailing_delimiter_adds_base_directory() {
        let sp = SearchPath::parse_in("/nonexistent/lib:", Path::new("/base")).unwrap();
        let dirs: Vec<_> = sp.locations().iter().map(|l| l.dir().to_path_buf()).collect();
        assert_eq!(
            dirs,
            vec![PathBuf::from("/nonexistent/lib"), PathBuf::from("/base")]
        );
        assert_eq!(sp.locations()[0].url().as_str(), "file:///nonexistent/lib/");
    }

    #[cfg(unix)]
    #[test]
    /// 相対パスは基準ディレクトリからの位置になる。
    fn relative_entries_join_base() {
        let sp = SearchPath::parse_in("types", Path::new("/work")).unwrap();
        assert_eq!(sp.locations()[0].dir(), Path::new("/work/types"));
    }

    #[test]
    /// 既存のファイルを指す要素は起動時エラーになる。
    fn existing_file_entry_is_malformed() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let base = std::env::temp_dir();
        let err = SearchPath::parse_in(&file.path().display().to_string(), &base).unwrap_err();
        assert!(matches!(err, StartupError::MalformedSearchPath { .. }));
    }
}
