//! プレビュー参照の寿命管理
//!
//! プレビュー（ブラウザのObject URLやローカルパス）は、表示中のセッションと
//! 履歴エントリの両方から参照されうる。最後の参照が消えた時点で一度だけ解放する。

use std::fmt;
use std::sync::Arc;

type ReleaseHook = Box<dyn Fn(&str) + Send + Sync>;

struct PreviewInner {
    url: String,
    release: Option<ReleaseHook>,
}

impl Drop for PreviewInner {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::debug!(url = %self.url, "プレビュー解放");
            release(&self.url);
        }
    }
}

/// 参照カウント付きプレビューハンドル
#[derive(Clone)]
pub struct Preview {
    inner: Arc<PreviewInner>,
}

impl Preview {
    /// 解放処理付きで作成
    pub fn new<F>(url: impl Into<String>, release: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(PreviewInner {
                url: url.into(),
                release: Some(Box::new(release)),
            }),
        }
    }

    /// 解放不要な参照（ローカルファイルパスなど）
    pub fn unmanaged(url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(PreviewInner {
                url: url.into(),
                release: None,
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// 現在の保持者数
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// 同じリソースを指しているか
    pub fn same_resource(&self, other: &Preview) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Preview {
    fn eq(&self, other: &Self) -> bool {
        self.same_resource(other)
    }
}

impl fmt::Debug for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preview")
            .field("url", &self.inner.url)
            .field("shares", &self.share_count())
            .finish()
    }
}
