//! Locale file discovery and loading.
use std::path::{
    Path,
    PathBuf,
};

use futures::StreamExt;
use ignore::WalkBuilder;

use crate::catalog::Catalog;
use crate::config::{
    ConfigManager,
    FileMatcher,
};
use crate::indexer::types::{
    IndexerError,
    LoadFailure,
    WorkspaceIndex,
};
use crate::input::error::ResourceError;
use crate::input::resource::LocaleResource;

/// Walks a workspace and loads every locale file it finds.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceIndexer;

impl WorkspaceIndexer {
    /// 新しいインデクサーを作成
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// ワークスペースをインデックス
    ///
    /// ロケールファイルを並列に読み込み、カタログを構築する。
    /// 読み込みに失敗したファイルは `failures` に記録し、処理を続行する。
    ///
    /// # Errors
    /// - ワークスペースがディレクトリでない
    /// - glob パターンが不正
    pub async fn index_workspace<F>(
        &self,
        workspace_path: &Path,
        config_manager: &ConfigManager,
        progress_callback: Option<F>,
    ) -> Result<WorkspaceIndex, IndexerError>
    where
        F: Fn(u32, u32) + Send + Sync,
    {
        tracing::debug!(workspace_path = %workspace_path.display(), "Indexing workspace");
        if !workspace_path.is_dir() {
            return Err(IndexerError::InvalidPath(workspace_path.to_path_buf()));
        }

        let settings = config_manager.get_settings();
        let matcher = FileMatcher::new(workspace_path.to_path_buf(), settings)?;
        let files = Self::find_locale_files(&matcher);

        let total = u32::try_from(files.len()).unwrap_or(u32::MAX);
        let num_threads = settings.indexing.effective_threads();
        tracing::debug!(total, num_threads, "Loading locale files");

        let mut results = futures::stream::iter(files)
            .map(|path| async move {
                let result = Self::load_file(workspace_path, &path).await;
                (path, result)
            })
            .buffer_unordered(num_threads);

        let mut loaded = Vec::new();
        let mut failures = Vec::new();
        let mut processed = 0_u32;
        while let Some((path, result)) = results.next().await {
            processed = processed.saturating_add(1);
            if let Some(callback) = &progress_callback {
                callback(processed, total);
            }

            match result {
                Ok(resource) => loaded.push((path, resource)),
                Err(error) => {
                    tracing::warn!("Failed to load locale file {:?}: {}", path, error);
                    failures.push(LoadFailure { path, error });
                }
            }
        }

        // 完了順は不定なのでパス順に揃える
        loaded.sort_by(|(a, _), (b, _)| a.cmp(b));
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        let mut catalog = Catalog::from_settings(settings);
        let mut loaded_paths = Vec::new();
        let mut shadowed = Vec::new();
        for (path, resource) in loaded {
            if let Some(existing) = catalog.resource(resource.locale()) {
                tracing::warn!(
                    locale = resource.locale(),
                    kept = ?existing.origin().map(|o| &o.path),
                    "Ignoring duplicate locale file {:?}",
                    path
                );
                shadowed.push(path);
                continue;
            }
            catalog.insert(resource);
            loaded_paths.push(path);
        }

        tracing::debug!(
            locales = ?catalog.locales(),
            failures = failures.len(),
            "Workspace indexing complete"
        );

        Ok(WorkspaceIndex { catalog, loaded: loaded_paths, shadowed, failures })
    }

    /// 単一ファイルを読み込む
    ///
    /// ロケールはワークスペース配下の相対パスからのみ検出する。
    async fn load_file(
        workspace_root: &Path,
        file_path: &Path,
    ) -> Result<LocaleResource, ResourceError> {
        let content = tokio::fs::read_to_string(file_path)
            .await
            .map_err(|source| ResourceError::Io { path: file_path.to_path_buf(), source })?;

        // tree-sitter の解析は CPU バウンドなのでブロッキングプールで実行
        let root = workspace_root.to_path_buf();
        let path = file_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            LocaleResource::from_workspace_file(&path, &root, &content)
        })
        .await?
    }

    /// ロケールファイルを検索
    fn find_locale_files(matcher: &FileMatcher) -> Vec<PathBuf> {
        let mut found_files = Vec::new();

        // ignore クレートでファイルを走査
        for result in WalkBuilder::new(matcher.workspace_root())
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            // ファイルのみを対象
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            if matcher.is_locale_file(path) {
                found_files.push(path.to_path_buf());
            }
        }

        found_files.sort();
        found_files
    }
}
